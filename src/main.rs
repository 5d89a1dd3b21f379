use nfe_sheets_sync::sheets::{load_credentials, ServiceAccountTokens, TokenSource};
use nfe_sheets_sync::{api, AppConfig, GoogleSheetsClient, ProcessFetcher, SyncService};
use std::sync::Arc;
use tower::ServiceBuilder;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Local-time log lines, overridable through RUST_LOG
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    // Load configuration
    let config = AppConfig::from_env();
    info!("Starting server with config: {:?}", config);

    // Lookup output directory must exist before the first fetch
    std::fs::create_dir_all(&config.lookup.output_dir).map_err(|e| {
        format!(
            "failed to create output directory {:?}: {}",
            config.lookup.output_dir, e
        )
    })?;

    // Authenticated Sheets client
    let credentials = load_credentials(&config.sheets)?;
    let tokens: Arc<dyn TokenSource> = Arc::new(ServiceAccountTokens::from_key_bytes(&credentials).await?);
    let store = Arc::new(GoogleSheetsClient::new(
        config.sheets.spreadsheet_id.clone(),
        Some(tokens),
    )?);
    info!("Google Sheets client initialized");
    info!("Lookup program: {:?}", config.lookup.program);
    info!("Lookup output directory: {:?}", config.lookup.output_dir);

    let fetcher = Arc::new(ProcessFetcher::new(&config.lookup));
    let service = Arc::new(SyncService::new(
        store,
        fetcher,
        config.sheets.primary_sheet.clone(),
        config.timeouts,
    ));

    let app = api::router(service).layer(ServiceBuilder::new());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  POST /import-xml-data     - import raw NF-e XML");
    info!("  POST /importar-xml-chave  - fetch by access key and import");
    info!("  POST /fetch-sheet-data    - read a sheet");
    info!("  POST /update-sheet-data   - update one cell");
    info!("  POST /clear-sheet-data    - clear a range");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
