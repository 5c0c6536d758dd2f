use super::{
    db_structs::{
        AdvanceRateSnapshot, DraftEntry, EntryPeriodScore, Period, Pick, Player, RosterStructure, ScoreRecord, Team,
        UsablePoints
    },
    fact_store::FactTables
};
use crate::{
    error::EngineError,
    model::structures::{draft_clock::DraftClock, roster_slot::RosterSlot},
    utils::progress_utils::progress_bar
};
use std::{collections::HashMap, sync::Arc};
use tokio_postgres::{Client, Error, NoTls, Row};
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct DbClient {
    client: Arc<Client>
}

impl DbClient {
    // Connect to the database and return a DbClient instance
    pub async fn connect(connection_str: &str) -> Result<Self, Error> {
        let (client, connection) = tokio_postgres::connect(connection_str, NoTls).await?;

        // Spawn the connection object to run in the background
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("connection error: {}", e);
            }
        });

        Ok(DbClient {
            client: Arc::new(client)
        })
    }

    /// Loads the whole season into an indexed snapshot.
    pub async fn load_fact_tables(&self) -> Result<FactTables, EngineError> {
        let players = self.get_players().await?;
        let teams = self.get_teams().await?;
        let periods = self.get_periods().await?;
        let score_records = self.get_score_records().await?;
        let entries = self.get_entries().await?;
        let advance_rate_history = self.get_advance_rate_history().await?;

        Ok(FactTables::new(
            players,
            teams,
            periods,
            score_records,
            entries,
            advance_rate_history
        ))
    }

    pub async fn get_players(&self) -> Result<Vec<Player>, Error> {
        info!("Fetching players...");
        let rows = self
            .client
            .query(
                "SELECT id, first_name, last_name, slot_name, team_id, final_adp FROM players ORDER BY id",
                &[]
            )
            .await?;

        let players: Vec<Player> = rows.iter().filter_map(Self::player_from_row).collect();
        info!(count = players.len(), "Players fetched");

        Ok(players)
    }

    fn player_from_row(row: &Row) -> Option<Player> {
        let id: i32 = row.get("id");
        let slot_name: String = row.get("slot_name");

        let Ok(slot) = RosterSlot::try_from(slot_name.as_str()) else {
            warn!(player_id = id, slot = %slot_name, "Skipping player with unknown roster slot");
            return None;
        };

        Some(Player {
            id,
            first_name: row.get("first_name"),
            last_name: row.get("last_name"),
            slot,
            team_id: row.get("team_id"),
            adp: Self::parse_adp(id, row.get("final_adp"))
        })
    }

    /// ADP arrives as text. NULL, empty and '-' mean unknown.
    fn parse_adp(player_id: i32, raw: Option<String>) -> Option<f64> {
        let raw = raw?;
        let raw = raw.trim();
        if raw.is_empty() || raw == "-" {
            return None;
        }

        match raw.parse::<f64>() {
            Ok(adp) if adp.is_finite() => Some(adp),
            _ => {
                warn!(player_id, adp = %raw, "Unparsable ADP, treating as unknown");
                None
            }
        }
    }

    pub async fn get_teams(&self) -> Result<Vec<Team>, Error> {
        let rows = self
            .client
            .query("SELECT team_id, team_name, team_abbr FROM teams ORDER BY team_name", &[])
            .await?;

        Ok(rows
            .iter()
            .map(|row| Team {
                id: row.get("team_id"),
                name: row.get("team_name"),
                abbr: row.get("team_abbr")
            })
            .collect())
    }

    pub async fn get_periods(&self) -> Result<Vec<Period>, Error> {
        let rows = self
            .client
            .query("SELECT week_id, week_number FROM weeks ORDER BY week_number", &[])
            .await?;

        Ok(rows
            .iter()
            .map(|row| Period {
                period_id: row.get("week_id"),
                period_number: row.get("week_number")
            })
            .collect())
    }

    /// Hitter and pitcher game logs as one record set.
    pub async fn get_score_records(&self) -> Result<Vec<ScoreRecord>, Error> {
        info!("Fetching score records...");
        let rows = self
            .client
            .query(
                "
            SELECT player_id, game_date, week_id, tot::float8 AS tot, opponent FROM hitters
            UNION ALL
            SELECT player_id, game_date, week_id, tot::float8 AS tot, opponent FROM pitchers
            ORDER BY game_date, player_id",
                &[]
            )
            .await?;

        let records: Vec<ScoreRecord> = rows
            .iter()
            .map(|row| ScoreRecord {
                player_id: row.get("player_id"),
                date: row.get("game_date"),
                period_id: row.get("week_id"),
                raw_total: row.get("tot"),
                opponent: row.get("opponent")
            })
            .collect();

        info!(count = records.len(), "Score records fetched");
        Ok(records)
    }

    /// Leaderboard entries with their picks, period scores and usable points attached.
    pub async fn get_entries(&self) -> Result<Vec<DraftEntry>, Error> {
        info!("Fetching draft entries...");
        let rows = self
            .client
            .query(
                "
            SELECT draft_entry_id, username, draft_id, pick_order, draft_clock, draft_filled_time,
                   league_place, advancing, wild_card, team_score::float8 AS team_score
            FROM leaderboard
            ORDER BY draft_entry_id",
                &[]
            )
            .await?;

        let mut entries: Vec<DraftEntry> = rows.iter().filter_map(Self::entry_from_row).collect();
        let mut picks = self.get_picks().await?;
        let mut period_scores = self.get_entry_period_scores().await?;
        let mut usable_points = self.get_usable_points().await?;

        info!("Linking picks...");
        let bar = progress_bar(entries.len() as u64, "Linking picks to entries");
        for entry in entries.iter_mut() {
            entry.picks = picks.remove(&entry.id).unwrap_or_default();
            entry.period_scores = period_scores.remove(&entry.id).unwrap_or_default();
            entry.usable_points = usable_points.remove(&entry.id).unwrap_or_default();
            bar.inc(1);
        }
        bar.finish_and_clear();

        if !picks.is_empty() {
            warn!(entries = picks.len(), "Picks reference entries missing from the leaderboard");
        }

        info!(count = entries.len(), "Draft entries fetched");
        Ok(entries)
    }

    fn entry_from_row(row: &Row) -> Option<DraftEntry> {
        let id: String = row.get("draft_entry_id");
        let clock: String = row.get("draft_clock");

        let Ok(draft_clock) = DraftClock::try_from(clock.as_str()) else {
            warn!(draft_entry_id = %id, draft_clock = %clock, "Skipping entry with unknown draft clock");
            return None;
        };

        Some(DraftEntry {
            id,
            username: row.get("username"),
            draft_id: row.get("draft_id"),
            pick_order: row.get("pick_order"),
            draft_clock,
            draft_filled_time: row.get("draft_filled_time"),
            picks: Vec::new(),
            structure: RosterStructure::default(),
            league_place: row.get("league_place"),
            advancing: row.get("advancing"),
            wild_card: row.get("wild_card"),
            cumulative_points: row.get("team_score"),
            period_scores: Vec::new(),
            usable_points: Vec::new()
        })
    }

    async fn get_picks(&self) -> Result<HashMap<String, Vec<Pick>>, Error> {
        let rows = self
            .client
            .query(
                "SELECT draft_entry_id, player_id, overall_pick_number, pick_created_time FROM picks",
                &[]
            )
            .await?;

        let mut picks: HashMap<String, Vec<Pick>> = HashMap::new();
        for row in rows {
            let pick = Pick {
                draft_entry_id: row.get("draft_entry_id"),
                player_id: row.get("player_id"),
                overall_pick_number: row.get("overall_pick_number"),
                pick_created_time: row.get("pick_created_time")
            };
            picks.entry(pick.draft_entry_id.clone()).or_default().push(pick);
        }

        Ok(picks)
    }

    async fn get_entry_period_scores(&self) -> Result<HashMap<String, Vec<EntryPeriodScore>>, Error> {
        let rows = self
            .client
            .query(
                "SELECT draft_entry_id, week_id, total_points::float8 AS total_points FROM scores ORDER BY week_id",
                &[]
            )
            .await?;

        let mut scores: HashMap<String, Vec<EntryPeriodScore>> = HashMap::new();
        for row in rows {
            let score = EntryPeriodScore {
                draft_entry_id: row.get("draft_entry_id"),
                period_id: row.get("week_id"),
                total_points: row.get("total_points")
            };
            scores.entry(score.draft_entry_id.clone()).or_default().push(score);
        }

        Ok(scores)
    }

    /// NULL point columns read as zero.
    async fn get_usable_points(&self) -> Result<HashMap<String, Vec<UsablePoints>>, Error> {
        let rows = self
            .client
            .query(
                "
            SELECT draft_entry_id, player_id,
                   COALESCE(total_points, 0)::float8 AS total_points,
                   COALESCE(used_points, 0)::float8 AS used_points
            FROM usable_points",
                &[]
            )
            .await?;

        let mut points: HashMap<String, Vec<UsablePoints>> = HashMap::new();
        for row in rows {
            let usable = UsablePoints {
                draft_entry_id: row.get("draft_entry_id"),
                player_id: row.get("player_id"),
                total_points: row.get("total_points"),
                used_points: row.get("used_points")
            };
            points.entry(usable.draft_entry_id.clone()).or_default().push(usable);
        }

        Ok(points)
    }

    pub async fn get_advance_rate_history(&self) -> Result<Vec<AdvanceRateSnapshot>, Error> {
        let rows = self
            .client
            .query(
                "SELECT player_id, date, advance_rate::float8 AS advance_rate FROM advance_rate_history ORDER BY player_id, date",
                &[]
            )
            .await?;

        Ok(rows
            .iter()
            .map(|row| AdvanceRateSnapshot {
                player_id: row.get("player_id"),
                date: row.get("date"),
                advance_rate: row.get("advance_rate")
            })
            .collect())
    }
}
