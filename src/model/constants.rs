// Leaderboard constants
pub const PAGE_SIZE: usize = 150;
pub const DEFAULT_CACHE_TTL_SECONDS: i64 = 1800;
pub const DEFAULT_MIN_DRAFTS: u32 = 20;
pub const TOP_DRAFTERS_LIMIT: usize = 25;
// Last regular-season period shown on a team's weekly scores
pub const TEAM_SCORE_LAST_PERIOD: i32 = 16;
// Summary statistics
pub const DEFAULT_OWNED_BASELINE_MIN_PCT: f64 = 95.0;
pub const DEFAULT_TEAM_POINTS_PERCENTILE: f64 = 95.0;
// Weekly baseline ranks for the fixed league format (12 teams)
pub const DEFAULT_PITCHER_BASELINE_RANK: usize = 36;
pub const DEFAULT_HITTER_BASELINE_RANK: usize = 84;
// Search
pub const SEARCH_MIN_TERM_LEN: usize = 2;
pub const SEARCH_LIMIT: usize = 10;
