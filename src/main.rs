use anyhow::Result;
use tracing::info;
use translation_cache::backend::Backend;
use translation_cache::config::Config;
use translation_cache::store::Database;
use translation_cache::web::{self, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored when variables come from the environment)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("translation_cache=info".parse()?),
        )
        .init();

    // Load configuration from environment
    let config = Config::from_env()?;

    let db = Database::new(&config.database_path)?;
    let backend = Backend::from_config(&config);

    let app = web::router(AppState::new(db, backend));

    let addr = format!("0.0.0.0:{}", config.port);
    info!("Starting translation cache service on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
