pub mod baseline;
pub mod cache;
pub mod constants;
pub mod details;
pub mod exposure;
pub mod filter;
pub mod leaderboard;
pub mod ranking;
pub mod score_aggregator;
pub mod structures;
