use crate::model::TransactionRecord;
use crate::parse::parse_timestamp;

/// Chronological sort key in epoch milliseconds: trade date when parseable,
/// else filing timestamp, else i64::MIN so otherwise-unsortable records are
/// flushed first rather than dropped.
pub fn sort_key(record: &TransactionRecord) -> i64 {
    parse_timestamp(&record.trade_date)
        .or_else(|| parse_timestamp(&record.filing_datetime))
        .map(|t| t.timestamp_millis())
        .unwrap_or(i64::MIN)
}

/// Sort ascending (oldest first) and keep at most `max_per_run` from the
/// front. Under overload this deliberately prioritizes older unseen events
/// over the newest; records cut here stay uncommitted and come back next
/// run. The sort is stable, so same-key records keep document order.
pub fn order_and_truncate(
    mut records: Vec<TransactionRecord>,
    max_per_run: usize,
) -> Vec<TransactionRecord> {
    records.sort_by_key(sort_key);
    records.truncate(max_per_run);
    records
}

/// Fixed-size, order-preserving partition. `batch_size` is the sink's
/// items-per-request cap; the last batch may be short.
pub fn into_batches(records: Vec<TransactionRecord>, batch_size: usize) -> Vec<Vec<TransactionRecord>> {
    assert!(batch_size > 0, "batch size must be positive");
    let mut batches = Vec::with_capacity(records.len().div_ceil(batch_size));
    let mut current = Vec::with_capacity(batch_size);
    for record in records {
        current.push(record);
        if current.len() == batch_size {
            batches.push(std::mem::replace(&mut current, Vec::with_capacity(batch_size)));
        }
    }
    if !current.is_empty() {
        batches.push(current);
    }
    batches
}
