pub mod db;
pub mod db_structs;
pub mod fact_store;
