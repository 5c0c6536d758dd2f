pub mod draft_clock;
pub mod period_cell;
pub mod roster_slot;
pub mod view_kind;
