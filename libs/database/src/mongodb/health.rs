use mongodb::{Client, bson::doc};

use crate::common::{DatabaseError, DatabaseResult};

/// Ping the `admin` database.
///
/// # Example
/// ```ignore
/// use database::mongodb::check_health;
///
/// check_health(&client).await?;
/// ```
pub async fn check_health(client: &Client) -> DatabaseResult<()> {
    client
        .database("admin")
        .run_command(doc! { "ping": 1 })
        .await
        .map(|_| ())
        .map_err(|e| DatabaseError::HealthCheckFailed(e.to_string()))
}
