use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront_api::db::{create_pool, orm_from_pool, run_migrations};

/// Apply the SQL files under `migrations/` and exit.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,storefront_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL is not set"))?;
    let pool = create_pool(&database_url).await?;
    run_migrations(&orm_from_pool(pool)).await?;

    tracing::info!("migrations applied");
    Ok(())
}
