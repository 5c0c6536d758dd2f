use clap::Parser;
use draft_leaderboard::{
    args::{Args, Command},
    config::{EngineConfig, ExclusionList},
    database::{db::DbClient, fact_store::MemoryFactStore},
    error::EngineError,
    model::leaderboard::{LeaderboardEngine, LeaderboardQuery}
};
use serde_json::to_string_pretty;
use std::{process::exit, sync::Arc};
use tracing::{error, info};
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let args = Args::parse();
    init_tracing(&args.log_level);

    if let Err(e) = run(args).await {
        error!("{}", e);
        exit(1);
    }
}

fn init_tracing(log_level: &str) {
    let indicatif_layer = IndicatifLayer::new();
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(indicatif_layer.get_stderr_writer()))
        .with(indicatif_layer)
        .init();
}

async fn run(args: Args) -> Result<(), EngineError> {
    let exclusions = match &args.exclusions_file {
        Some(path) => ExclusionList::from_json_file(path)?,
        None => ExclusionList::empty()
    };
    let config = EngineConfig {
        exclusions,
        cache_ttl: EngineConfig::cache_ttl_from_seconds(args.cache_ttl_seconds)?,
        ..Default::default()
    };

    let client = match DbClient::connect(&args.connection_string).await {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            error!("Application cannot start without a valid database connection");
            return Err(e.into());
        }
    };

    let tables = client.load_fact_tables().await?;
    let engine = LeaderboardEngine::with_ttl_cache(Arc::new(MemoryFactStore::new(tables)), config);
    info!(exclusion_version = %engine.config().exclusions.version, "Season loaded");

    let output = match args.command {
        Command::Leaderboard(leaderboard) => to_string_pretty(&engine.query(&LeaderboardQuery::from(leaderboard))?),
        Command::Player { player_id } => to_string_pretty(&engine.player_profile(player_id)?),
        Command::Team { draft_entry_id } => to_string_pretty(&engine.team_detail(&draft_entry_id)?),
        Command::User { username } => to_string_pretty(&engine.user_summary(&username)?),
        Command::Search { term, users: true } => to_string_pretty(&engine.search_users(&term)?),
        Command::Search { term, users: false } => to_string_pretty(&engine.search_players(&term)?)
    }?;

    println!("{}", output);
    Ok(())
}
