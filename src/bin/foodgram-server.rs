use std::{error::Error, sync::Arc};

use foodgram::{
    actions::PgStore,
    api::{self, AppState},
    config::Config,
    image::ImageStorage,
};

fn init_logger() {
    let mut builder = pretty_env_logger::formatted_timed_builder();
    builder.filter_level(log::LevelFilter::Info);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
}

async fn run() -> Result<(), Box<dyn Error>> {
    let config = Config::from_env()?;

    let store = PgStore::connect(&config.database_url, config.max_connections).await?;
    store.migrate().await?;
    log::info!("Database migrations applied");

    let images = ImageStorage::new(config.media_root.clone(), &config.media_url);
    let state = AppState::new(Arc::new(store), images, config.jwt_secret.as_bytes());

    log::info!("Listening on {}", config.bind_address);
    warp::serve(api::routes(state))
        .run(config.bind_address)
        .await;

    Ok(())
}

#[tokio::main]
async fn main() {
    init_logger();

    if let Err(e) = run().await {
        log::error!("Server failed: {e}");
        std::process::exit(1);
    }
}
