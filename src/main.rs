use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use intake_core::{
    config::resolve_definitions_dir, constants::DEFAULT_SUBMISSION_DATA_DIR,
    phrasing::phrasing_from_env_values, CoreConfig, SymptomCatalog,
};

/// Main entry point for the intake application
///
/// Loads the symptom catalog once and serves the REST API (with Swagger UI at `/swagger-ui`).
///
/// # Environment Variables
/// - `INTAKE_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `INTAKE_DEFINITIONS_DIR`: Directory of symptom definitions (default: `definitions/`)
/// - `INTAKE_SUBMISSION_DIR`: Directory for stored submissions (default: "submission_data")
/// - `INTAKE_LOCALE`: Summary wording preset, `en` or `th` (default: `en`)
/// - `INTAKE_PHRASING_FILE`: YAML file overriding the wording preset
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration, catalog loading or the server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("intake_run=info".parse()?)
                .add_directive("intake_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("INTAKE_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let definitions_dir =
        resolve_definitions_dir(std::env::var("INTAKE_DEFINITIONS_DIR").ok().map(PathBuf::from))?;
    let submission_dir = std::env::var("INTAKE_SUBMISSION_DIR")
        .unwrap_or_else(|_| DEFAULT_SUBMISSION_DATA_DIR.into());
    let phrasing_file = std::env::var("INTAKE_PHRASING_FILE").ok().map(PathBuf::from);
    let phrasing =
        phrasing_from_env_values(std::env::var("INTAKE_LOCALE").ok(), phrasing_file.as_deref())?;

    let cfg = Arc::new(CoreConfig::new(
        definitions_dir,
        PathBuf::from(submission_dir),
        phrasing,
    )?);
    let catalog = SymptomCatalog::load_dir(cfg.definitions_dir())?;

    tracing::info!("++ Starting intake REST on {}", rest_addr);

    let app = api_rest::router(api_rest::AppState::new(cfg, catalog));
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
