use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crimpd::backup::AutoLoad;
use crimpd::config::Config;
use crimpd::db;
use crimpd::migrations::run_migrations;
use crimpd::routes::{build_app, AppOptions};
use crimpd::version::GIT_VERSION;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crimpd=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    tracing::info!(version = GIT_VERSION, "Connecting to database: {}", config.database_url);
    let pool = db::create_pool(&config.database_url)?;
    run_migrations(&pool)?;

    let app = build_app(
        pool,
        AppOptions {
            github_api_url: config.github_api_url.clone(),
            data_dir: config.data_dir.clone(),
            tick: config.tick_interval(),
        },
    );

    app.workout_repo.dedupe_activity_conflicts().await?;

    match app.backup.auto_load_on_startup().await {
        AutoLoad::LocalFile(path) => tracing::info!(path = %path.display(), "Restored local backup"),
        AutoLoad::GitHub => tracing::info!("Restored backup from GitHub"),
        AutoLoad::Skipped => {}
        AutoLoad::Failed(e) => tracing::warn!(error = %e, "Startup restore failed"),
    }

    let addr = config.server_addr();
    tracing::info!("Starting server at http://{}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app.router).await?;

    Ok(())
}
