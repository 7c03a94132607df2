use std::time::Duration;

use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::batch::into_batches;
use crate::config::SinkSettings;
use crate::ledger::{DedupLedger, LedgerError};
use crate::message::{build_embed, one_line, Embed};
use crate::model::TransactionRecord;
use crate::sink::{NotificationSink, SinkError};

/// Per-request attempt ceiling; exceeding it is fatal for the run.
pub const MAX_SEND_ATTEMPTS: u32 = 5;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error(transparent)]
    Sink(#[from] SinkError),
    #[error("Sink still throttling after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Lifecycle of one sink request. Fatal outcomes leave the loop through the
/// error path; Throttled always returns to Sending.
#[derive(Debug)]
enum SendState {
    Pending,
    Sending { attempt: u32 },
    Throttled { next_attempt: u32, wait_ms: u64 },
    Success,
}

enum Payload<'a> {
    Embeds(&'a [Embed]),
    Text(&'a str),
}

/// Sequential batch delivery against one sink: send, retry on throttling,
/// commit delivered keys, pace between requests. No concurrent sends.
pub struct Dispatcher<'a> {
    sink: &'a dyn NotificationSink,
    settings: &'a SinkSettings,
}

impl<'a> Dispatcher<'a> {
    pub fn new(sink: &'a dyn NotificationSink, settings: &'a SinkSettings) -> Self {
        Self { sink, settings }
    }

    /// Deliver `records` (already sorted and truncated) and commit each
    /// delivered key, in order. Returns the number of records delivered.
    ///
    /// Commit happens strictly after the owning request succeeds; a commit
    /// failure aborts the run rather than risk silently dropping a record.
    pub async fn deliver(
        &self,
        records: Vec<TransactionRecord>,
        ledger: &mut dyn DedupLedger,
    ) -> Result<usize, DispatchError> {
        let mut sent = 0usize;

        if self.settings.embed_mode {
            let batches = into_batches(records, self.settings.effective_batch_size());
            for (i, batch) in batches.iter().enumerate() {
                if i > 0 {
                    sleep(Duration::from_millis(self.settings.rate_limit_ms)).await;
                }
                let embeds: Vec<Embed> = batch.iter().map(build_embed).collect();
                self.send_one(Payload::Embeds(&embeds)).await?;
                for record in batch {
                    ledger.commit(&record.key())?;
                    sent += 1;
                }
                debug!(batch = i, size = batch.len(), "Batch delivered and committed");
            }
        } else {
            for (i, record) in records.iter().enumerate() {
                if i > 0 {
                    sleep(Duration::from_millis(self.settings.rate_limit_ms)).await;
                }
                let line = one_line(record);
                self.send_one(Payload::Text(&line)).await?;
                ledger.commit(&record.key())?;
                sent += 1;
            }
        }

        Ok(sent)
    }

    async fn send_one(&self, payload: Payload<'_>) -> Result<(), DispatchError> {
        let mut state = SendState::Pending;
        loop {
            state = match state {
                SendState::Pending => SendState::Sending { attempt: 1 },

                SendState::Sending { attempt } => {
                    let result = match &payload {
                        Payload::Embeds(embeds) => self.sink.send_embeds(embeds).await,
                        Payload::Text(content) => self.sink.send_text(content).await,
                    };
                    match result {
                        Ok(()) => SendState::Success,
                        Err(SinkError::Throttled { retry_after_ms }) => {
                            if attempt >= MAX_SEND_ATTEMPTS {
                                return Err(DispatchError::RetriesExhausted { attempts: attempt });
                            }
                            SendState::Throttled {
                                next_attempt: attempt + 1,
                                wait_ms: retry_after_ms.max(self.settings.throttle_floor_ms),
                            }
                        }
                        // Anything other than throttling is terminal.
                        Err(e) => return Err(e.into()),
                    }
                }

                SendState::Throttled {
                    next_attempt,
                    wait_ms,
                } => {
                    warn!(
                        wait_ms,
                        attempt = next_attempt,
                        "Sink throttled (429), backing off"
                    );
                    sleep(Duration::from_millis(wait_ms)).await;
                    SendState::Sending {
                        attempt: next_attempt,
                    }
                }

                SendState::Success => {
                    info!("Sink request delivered");
                    return Ok(());
                }
            };
        }
    }
}
