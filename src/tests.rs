#[cfg(test)]
mod tests {
    use crate::config::Settings;
    use crate::filter::FilterConfig;
    use crate::ledger::{DedupLedger, FileLedger, MemoryLedger};
    use crate::message::Embed;
    use crate::parse::parse_timestamp;
    use crate::pipeline::AlertPipeline;
    use crate::sink::{NotificationSink, SinkError};
    use crate::source::MarkupSource;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Capturing sink; optionally throttles the first N attempts.
    #[derive(Default)]
    struct CapturingSink {
        throttle_first: Mutex<u32>,
        batches: Mutex<Vec<Vec<String>>>,
        texts: Mutex<Vec<String>>,
    }

    impl CapturingSink {
        fn throttling(n: u32) -> Self {
            Self {
                throttle_first: Mutex::new(n),
                ..Default::default()
            }
        }

        fn check_throttle(&self) -> Result<(), SinkError> {
            let mut remaining = self.throttle_first.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(SinkError::Throttled { retry_after_ms: 0 });
            }
            Ok(())
        }

        fn delivered_descriptions(&self) -> Vec<String> {
            self.batches.lock().unwrap().iter().flatten().cloned().collect()
        }
    }

    #[async_trait]
    impl NotificationSink for CapturingSink {
        async fn send_embeds(&self, embeds: &[Embed]) -> Result<(), SinkError> {
            self.check_throttle()?;
            self.batches
                .lock()
                .unwrap()
                .push(embeds.iter().map(|e| e.description.clone()).collect());
            Ok(())
        }

        async fn send_text(&self, content: &str) -> Result<(), SinkError> {
            self.check_throttle()?;
            self.texts.lock().unwrap().push(content.to_string());
            Ok(())
        }
    }

    fn fixture_row(filing: &str, trade: &str, ticker: &str, tt: &str, price: &str, qty: &str, value: &str) -> String {
        format!(
            "<tr><td>X</td>\
             <td><a href=\"http://sec.gov/{ticker}\">{filing}</a></td>\
             <td>{trade}</td><td>{ticker}</td><td>{ticker} Inc</td>\
             <td>Smith Alex</td><td>Dir</td><td>{tt}</td>\
             <td>{price}</td><td>{qty}</td><td>500,000</td><td>3%</td>\
             <td>{value}</td><td>1%</td></tr>"
        )
    }

    fn fixture_doc(rows: &[String]) -> String {
        format!(
            "<html><body><table class=\"tinytable\"><tbody>{}</tbody></table></body></html>",
            rows.concat()
        )
    }

    /// Snapshot with four fresh rows (filed 2026-08-28, one day before the
    /// fixed "now"), deliberately out of chronological order, plus rows that
    /// each trip one filter.
    fn snapshot() -> String {
        fixture_doc(&[
            fixture_row("2026-08-28 10:00:00", "2026-08-25", "CCC", "P - Purchase", "$50.00", "+1,000", "$50,000"),
            fixture_row("2026-08-28 10:00:00", "2026-08-21", "AAA", "S - Sale", "$20.00", "-2,000", "-$40,000"),
            fixture_row("2026-08-28 10:00:00", "2026-08-27", "DDD", "P - Purchase", "$10.00", "+500", "$5,000"),
            fixture_row("2026-08-28 10:00:00", "2026-08-23", "BBB", "S - Sale+OE", "$30.00", "-3,000", "-$90,000"),
            // Filed 10 days ago: fails the filing-age filter.
            fixture_row("2026-08-19 10:00:00", "2026-08-18", "OLD", "P - Purchase", "$99.00", "+100", "$9,900"),
            // Penny stock: fails the price floor.
            fixture_row("2026-08-28 10:00:00", "2026-08-27", "PNY", "P - Purchase", "$0.40", "+9,000", "$3,600"),
            // Option exercise: not in the default P,S allow-list.
            fixture_row("2026-08-28 10:00:00", "2026-08-27", "OPT", "M - OptEx", "$45.00", "+700", "$31,500"),
        ])
    }

    fn write_snapshot(html: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("test_snapshot_{}.html", uuid::Uuid::new_v4()));
        std::fs::write(&path, html).unwrap();
        path
    }

    fn fixed_now() -> DateTime<Utc> {
        parse_timestamp("2026-08-29 00:00:00").unwrap()
    }

    fn test_settings(snapshot_path: &PathBuf) -> Settings {
        let mut settings = Settings::default();
        settings.source.local_html = Some(snapshot_path.display().to_string());
        settings.sink.rate_limit_ms = 0;
        settings.sink.throttle_floor_ms = 0;
        settings
    }

    fn ticker_of(description: &str) -> String {
        // Second line is "**$TICKER  value  (qty Stocks)**".
        let line = description.lines().nth(1).unwrap();
        line.trim_start_matches("**$")
            .split_whitespace()
            .next()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_filter_and_chronological_order() {
        let path = write_snapshot(&snapshot());
        let settings = test_settings(&path);
        let source = MarkupSource::new(settings.source.clone());
        let sink = CapturingSink::default();
        let mut ledger = MemoryLedger::new();

        let summary = AlertPipeline::new(&settings, &source, &sink)
            .run(&mut ledger, fixed_now())
            .await
            .unwrap();

        assert_eq!(summary.parsed, 7);
        assert_eq!(summary.matched, 4);
        assert_eq!(summary.sent, 4);

        // Oldest trade date first, filtered rows absent.
        let tickers: Vec<String> = sink
            .delivered_descriptions()
            .iter()
            .map(|d| ticker_of(d))
            .collect();
        assert_eq!(tickers, vec!["AAA", "BBB", "CCC", "DDD"]);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_second_run_is_idempotent() {
        let path = write_snapshot(&snapshot());
        let settings = test_settings(&path);
        let source = MarkupSource::new(settings.source.clone());
        let ledger_path =
            std::env::temp_dir().join(format!("test_ledger_{}.log", uuid::Uuid::new_v4()));

        let first_sink = CapturingSink::default();
        let mut ledger = FileLedger::open(&ledger_path);
        let first = AlertPipeline::new(&settings, &source, &first_sink)
            .run(&mut ledger, fixed_now())
            .await
            .unwrap();
        assert_eq!(first.sent, 4);

        // Fresh ledger instance over the same file, same snapshot: nothing
        // new to deliver.
        let second_sink = CapturingSink::default();
        let mut reloaded = FileLedger::open(&ledger_path);
        assert_eq!(reloaded.len(), 4);
        let second = AlertPipeline::new(&settings, &source, &second_sink)
            .run(&mut reloaded, fixed_now())
            .await
            .unwrap();
        assert_eq!(second.parsed, 7);
        assert_eq!(second.sent, 0);
        assert!(second_sink.batches.lock().unwrap().is_empty());

        let _ = std::fs::remove_file(&path);
        let _ = std::fs::remove_file(&ledger_path);
    }

    #[tokio::test]
    async fn test_determinism_across_runs() {
        let path = write_snapshot(&snapshot());
        let settings = test_settings(&path);
        let source = MarkupSource::new(settings.source.clone());

        let mut outputs = Vec::new();
        for _ in 0..2 {
            let sink = CapturingSink::default();
            let mut ledger = MemoryLedger::new();
            AlertPipeline::new(&settings, &source, &sink)
                .run(&mut ledger, fixed_now())
                .await
                .unwrap();
            outputs.push(sink.delivered_descriptions());
        }
        assert_eq!(outputs[0], outputs[1]);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_truncation_keeps_oldest_and_bounds_batches() {
        // 12 fresh rows with distinct trade dates, newest first in the doc.
        let rows: Vec<String> = (0..12)
            .map(|i| {
                fixture_row(
                    "2026-08-28 10:00:00",
                    &format!("2026-08-{:02}", 24 - i),
                    &format!("T{i:02}"),
                    "P - Purchase",
                    "$25.00",
                    "+100",
                    "$2,500",
                )
            })
            .collect();
        let path = write_snapshot(&fixture_doc(&rows));
        let mut settings = test_settings(&path);
        settings.sink.max_per_run = 5;
        settings.sink.embeds_per_request = 2;
        let source = MarkupSource::new(settings.source.clone());
        let sink = CapturingSink::default();
        let mut ledger = MemoryLedger::new();

        let summary = AlertPipeline::new(&settings, &source, &sink)
            .run(&mut ledger, fixed_now())
            .await
            .unwrap();

        assert_eq!(summary.matched, 12);
        assert_eq!(summary.sent, 5);

        // The five oldest trade dates (2026-08-13..17) survive truncation.
        let tickers: Vec<String> = sink
            .delivered_descriptions()
            .iter()
            .map(|d| ticker_of(d))
            .collect();
        assert_eq!(tickers, vec!["T11", "T10", "T09", "T08", "T07"]);

        // No request exceeded the configured batch size.
        let batches = sink.batches.lock().unwrap();
        assert_eq!(batches.len(), 3);
        assert!(batches.iter().all(|b| b.len() <= 2));

        // Only delivered records were committed.
        assert_eq!(ledger.len(), 5);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_throttle_once_then_recover() {
        let path = write_snapshot(&snapshot());
        let settings = test_settings(&path);
        let source = MarkupSource::new(settings.source.clone());
        let sink = CapturingSink::throttling(1);
        let mut ledger = MemoryLedger::new();

        let summary = AlertPipeline::new(&settings, &source, &sink)
            .run(&mut ledger, fixed_now())
            .await
            .unwrap();

        assert_eq!(summary.sent, 4);
        // Batch delivered exactly once despite the throttled first attempt.
        assert_eq!(sink.batches.lock().unwrap().len(), 1);
        assert_eq!(ledger.len(), 4);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_delivered_records_satisfy_filters() {
        let path = write_snapshot(&snapshot());
        let mut settings = test_settings(&path);
        settings.filter.min_value_k = 40.0; // $40k floor
        let source = MarkupSource::new(settings.source.clone());
        let sink = CapturingSink::default();
        let mut ledger = MemoryLedger::new();

        AlertPipeline::new(&settings, &source, &sink)
            .run(&mut ledger, fixed_now())
            .await
            .unwrap();

        // DDD ($5k) drops out once the value floor is active.
        let tickers: Vec<String> = sink
            .delivered_descriptions()
            .iter()
            .map(|d| ticker_of(d))
            .collect();
        assert_eq!(tickers, vec!["AAA", "BBB", "CCC"]);

        let config: FilterConfig = settings.filter.to_filter_config();
        assert_eq!(config.min_value_k, 40.0);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_unbatched_mode_end_to_end() {
        let path = write_snapshot(&snapshot());
        let mut settings = test_settings(&path);
        settings.sink.embed_mode = false;
        let source = MarkupSource::new(settings.source.clone());
        let sink = CapturingSink::default();
        let mut ledger = MemoryLedger::new();

        let summary = AlertPipeline::new(&settings, &source, &sink)
            .run(&mut ledger, fixed_now())
            .await
            .unwrap();

        assert_eq!(summary.sent, 4);
        let texts = sink.texts.lock().unwrap();
        assert_eq!(texts.len(), 4);
        assert!(texts.iter().all(|t| t.contains("SEC Form 4")));
        assert!(sink.batches.lock().unwrap().is_empty());

        let _ = std::fs::remove_file(&path);
    }
}
