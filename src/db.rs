use std::time::Duration;

use mongodb::bson::doc;
use mongodb::{options::ClientOptions, Client, Database};

/// Connect to MongoDB and verify the connection with a ping.
///
/// Timeouts are bounded so a dead database surfaces as an error instead of
/// hanging startup or requests.
pub async fn connect(database_url: &str) -> mongodb::error::Result<Database> {
    let mut client_options = ClientOptions::parse(database_url).await?;
    client_options.app_name = Some("account-api".to_owned());
    client_options.connect_timeout = Some(Duration::from_secs(5));
    client_options.server_selection_timeout = Some(Duration::from_secs(5));

    let client = Client::with_options(client_options)?;
    let db = client.database("auth_db");

    db.run_command(doc! { "ping": 1 }, None).await?;
    log::info!("connected to MongoDB");

    Ok(db)
}
