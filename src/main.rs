use chrono::Utc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use insider_alerts::config::Settings;
use insider_alerts::ledger::FileLedger;
use insider_alerts::pipeline::AlertPipeline;
use insider_alerts::sink::WebhookSink;
use insider_alerts::source::MarkupSource;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load .env before reading configuration.
    dotenv::dotenv().ok();

    let settings = match Settings::new() {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Required option: missing webhook is fatal before any work starts.
    let webhook_url = match settings.webhook_url() {
        Ok(url) => url.to_string(),
        Err(e) => {
            error!("Missing required configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        ledger = %settings.ledger.path,
        embed_mode = settings.sink.embed_mode,
        batch_size = settings.sink.effective_batch_size(),
        "Starting insider alerts run"
    );

    let source = MarkupSource::new(settings.source.clone());
    let sink = WebhookSink::new(webhook_url);
    let mut ledger = FileLedger::open(&settings.ledger.path);

    let pipeline = AlertPipeline::new(&settings, &source, &sink);
    match pipeline.run(&mut ledger, Utc::now()).await {
        Ok(summary) => summary.log(),
        Err(e) => {
            error!("Run failed: {}", e);
            std::process::exit(1);
        }
    }
}
