use std::error::Error;

use foodgram::{
    actions::{NewIngredient, PgStore},
    DEFAULT_MAX_CONNECTIONS,
};

/// Loads `[{"name": ..., "measurement_unit": ...}]` records into the ingredients table.
async fn run() -> Result<(), Box<dyn Error>> {
    let path = std::env::args()
        .nth(1)
        .ok_or("usage: load-ingredients <file.json>")?;

    if let Err(e) = dotenvy::dotenv() {
        log::debug!("No .env file loaded: {e}");
    }
    let database_url = std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL is not set")?;

    let data = tokio::fs::read_to_string(&path).await?;
    let ingredients: Vec<NewIngredient> = serde_json::from_str(&data)?;

    let store = PgStore::connect(&database_url, DEFAULT_MAX_CONNECTIONS).await?;
    store.migrate().await?;

    let inserted = store.insert_ingredients(&ingredients).await?;
    log::info!("Loaded {inserted} of {} ingredients from {path}", ingredients.len());

    Ok(())
}

#[tokio::main]
async fn main() {
    pretty_env_logger::formatted_builder()
        .filter_level(log::LevelFilter::Info)
        .init();

    if let Err(e) = run().await {
        log::error!("Loading ingredients failed: {e}");
        std::process::exit(1);
    }
}
