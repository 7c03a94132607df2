use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::info;

use crate::batch::order_and_truncate;
use crate::config::Settings;
use crate::dispatch::{DispatchError, Dispatcher};
use crate::extract::{extract_rows, ExtractError};
use crate::filter::{self, FilterConfig};
use crate::ledger::DedupLedger;
use crate::sink::NotificationSink;
use crate::source::{MarkupSource, SourceError};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// End-of-run report: counts plus the filter values that were in force.
#[derive(Debug)]
pub struct RunSummary {
    pub parsed: usize,
    pub matched: usize,
    pub sent: usize,
    pub filter: FilterConfig,
}

impl RunSummary {
    pub fn log(&self) {
        info!(
            parsed = self.parsed,
            matched = self.matched,
            sent = self.sent,
            types = %self.filter.types.join("+"),
            min_price = self.filter.min_price,
            min_value_k = self.filter.min_value_k,
            max_days_filed = self.filter.max_days_filed,
            max_days_trade = self.filter.max_days_trade,
            "Run complete"
        );
    }
}

/// usage:
/// let pipeline = AlertPipeline::new(&settings, &source, &sink);
/// let summary = pipeline.run(&mut ledger, Utc::now()).await?;
pub struct AlertPipeline<'a> {
    settings: &'a Settings,
    source: &'a MarkupSource,
    sink: &'a dyn NotificationSink,
}

impl<'a> AlertPipeline<'a> {
    pub fn new(
        settings: &'a Settings,
        source: &'a MarkupSource,
        sink: &'a dyn NotificationSink,
    ) -> Self {
        Self {
            settings,
            source,
            sink,
        }
    }

    /// One full run: fetch → extract → filter → dedup → order/truncate →
    /// dispatch. Sequential throughout; the ledger is only committed after
    /// the owning sink request succeeds.
    pub async fn run(
        &self,
        ledger: &mut dyn DedupLedger,
        now: DateTime<Utc>,
    ) -> Result<RunSummary, PipelineError> {
        let filter_config = self.settings.filter.to_filter_config();

        let html = self.source.fetch().await?;
        let records = extract_rows(&html)?;
        let parsed = records.len();
        info!(parsed, "Rows extracted");

        let surviving: Vec<_> = filter::apply(&filter_config, &records, now)
            .into_iter()
            .filter(|r| !ledger.has(&r.key()))
            .cloned()
            .collect();
        let matched = surviving.len();
        info!(
            matched,
            already_sent = ledger.len(),
            "Records matched filters and are unseen"
        );

        let ordered = order_and_truncate(surviving, self.settings.sink.max_per_run);

        let dispatcher = Dispatcher::new(self.sink, &self.settings.sink);
        let sent = dispatcher.deliver(ordered, ledger).await?;

        Ok(RunSummary {
            parsed,
            matched,
            sent,
            filter: filter_config,
        })
    }
}
