use std::time::Duration;

use mongodb::{Client, Database, bson::doc, options::ClientOptions};
use tokio::time::sleep;
use tracing::warn;

use super::error::{MongoDaoError, MongoResult};

/// Ping attempts before the initial connection is abandoned.
const PING_ATTEMPTS: u32 = 10;
/// Delay after the first failed ping; doubles up to [`PING_BACKOFF_CEILING`].
const PING_BACKOFF_FLOOR: Duration = Duration::from_millis(250);
/// Longest wait between ping attempts.
const PING_BACKOFF_CEILING: Duration = Duration::from_secs(5);

/// Build a client and verify connectivity with a bounded, backed-off ping
/// loop before handing the database out. Scores cannot be accepted until a
/// ping has succeeded, so failing fast here beats pretending to be up.
pub async fn establish_connection(
    options: &ClientOptions,
    database_name: &str,
) -> MongoResult<(Client, Database)> {
    let client = Client::with_options(options.clone())
        .map_err(|source| MongoDaoError::ClientConstruction { source })?;
    let database = client.database(database_name);

    let mut backoff = PING_BACKOFF_FLOOR;
    let mut attempt = 0;

    loop {
        attempt += 1;
        match database.run_command(doc! { "ping": 1 }).await {
            Ok(_) => return Ok((client, database)),
            Err(source) if attempt >= PING_ATTEMPTS => {
                return Err(MongoDaoError::InitialPing {
                    attempts: attempt,
                    source,
                });
            }
            Err(source) => {
                warn!(attempt, error = %source, "initial MongoDB ping failed; backing off");
                sleep(backoff).await;
                backoff = (backoff * 2).min(PING_BACKOFF_CEILING);
            }
        }
    }
}
