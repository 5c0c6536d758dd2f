use lazy_static::lazy_static;
use std::sync::Arc;
use testcontainers::{clients::Cli, Container};
use testcontainers_modules::postgres::Postgres;
use tokio_postgres::{Client, NoTls};

pub struct TestDatabase {
    pub connection_string: String,
    _container: Container<'static, Postgres>
}

impl TestDatabase {
    pub async fn new() -> Result<Self, Box<dyn std::error::Error>> {
        lazy_static! {
            static ref DOCKER: Arc<Cli> = Arc::new(Cli::default());
        }

        let container = DOCKER.run(Postgres::default());
        let port = container.get_host_port_ipv4(5432);

        let connection_string = format!(
            "host=localhost port={} user=postgres password=postgres dbname=postgres",
            port
        );

        let client = connect(&connection_string).await?;
        client.batch_execute(include_str!("schema.sql")).await?;

        Ok(TestDatabase {
            connection_string,
            _container: container
        })
    }

    pub async fn get_client(&self) -> Result<Client, Box<dyn std::error::Error>> {
        connect(&self.connection_string).await
    }

    /// Two teams, four players, two weeks and three entries.
    ///
    /// Player 4 has an unknown slot and entry 'e-bad' an unknown draft clock;
    /// the loader skips both.
    pub async fn seed_test_data(&self) -> Result<(), Box<dyn std::error::Error>> {
        let client = self.get_client().await?;

        client
            .batch_execute(
                "
            INSERT INTO teams (team_id, team_name, team_abbr) VALUES
                (1, 'Harbor Hawks', 'HH'),
                (2, 'Valley Vipers', 'VV');

            INSERT INTO players (id, first_name, last_name, slot_name, team_id, final_adp) VALUES
                (1, 'Ace', 'Arm', 'P', 1, '12.5'),
                (2, 'Bat', 'Boss', 'IF', 1, '-'),
                (3, 'Cleat', 'Cruz', 'OF', 2, NULL),
                (4, 'Dee', 'Hay', 'DH', 2, '80');

            INSERT INTO weeks (week_id, week_number) VALUES
                (20, 2),
                (10, 1);

            INSERT INTO pitchers (player_id, game_date, week_id, tot, opponent) VALUES
                (1, '2024-04-01', 10, 21.5, 'VV'),
                (1, '2024-04-08', 20, -3.25, NULL);

            INSERT INTO hitters (player_id, game_date, week_id, tot, opponent) VALUES
                (2, '2024-04-02', 10, 8, 'VV'),
                (3, '2024-04-09', 20, 11.75, 'HH');

            INSERT INTO leaderboard (draft_entry_id, username, draft_id, pick_order, draft_clock,
                                     draft_filled_time, league_place, advancing, wild_card, team_score) VALUES
                ('e-1', 'alice', 'd-1', 3, 'fast', '2024-03-01 12:00:00', 1, TRUE, FALSE, 1204.5),
                ('e-2', 'bob', 'd-1', 7, 'SLOW', NULL, NULL, FALSE, TRUE, 998.25),
                ('e-bad', 'carol', 'd-2', 1, 'instant', NULL, NULL, FALSE, FALSE, 10);

            INSERT INTO picks (draft_entry_id, player_id, overall_pick_number, pick_created_time) VALUES
                ('e-1', 1, 3, '2024-03-01 12:01:00+00'),
                ('e-1', 2, 22, '2024-03-01 12:09:00+00'),
                ('e-2', 3, 7, '2024-03-01 12:03:00+00');

            INSERT INTO scores (draft_entry_id, week_id, total_points) VALUES
                ('e-1', 20, 131.25),
                ('e-1', 10, 140.5);

            INSERT INTO usable_points (draft_entry_id, player_id, total_points, used_points) VALUES
                ('e-1', 1, 18.25, 18.25),
                ('e-1', 2, 8, NULL);

            INSERT INTO advance_rate_history (player_id, date, advance_rate) VALUES
                (1, '2024-05-01', 0.18),
                (1, '2024-04-01', 0.12);
            "
            )
            .await?;

        Ok(())
    }
}

async fn connect(connection_string: &str) -> Result<Client, Box<dyn std::error::Error>> {
    let (client, connection) = tokio_postgres::connect(connection_string, NoTls).await?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            eprintln!("Database connection error: {}", e);
        }
    });

    Ok(client)
}
