use serde::{Deserialize, Serialize};

/// One insider transaction, built from a single screener table row.
/// Immutable after extraction; numeric fields that failed to parse carry
/// NAN rather than a silent zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// "YYYY-MM-DD HH:MM:SS" as printed by the source.
    pub filing_datetime: String,
    /// Link to the originating filing document, empty when absent.
    pub filing_link: String,
    /// "YYYY-MM-DD".
    pub trade_date: String,
    pub ticker: String,
    pub company: String,
    pub insider_name: String,
    pub insider_title: String,
    /// Full label, e.g. "P - Purchase" or "S - Sale+OE".
    pub trade_type_text: String,
    /// Leading token of the label, upper-cased: "P", "S", ...
    pub trade_code: String,

    // Raw cell texts, kept for display fidelity.
    pub price_text: String,
    pub qty_text: String,
    pub owned_text: String,
    pub delta_own_text: String,
    pub value_text: String,

    // Parsed values; NAN when the raw text was not a number.
    pub price: f64,
    pub qty: f64,
    pub value: f64,
    pub delta_own: f64,
}

impl TransactionRecord {
    /// Deterministic identity for dedup. Two rows with the same key are the
    /// same real-world transaction occurrence.
    pub fn key(&self) -> RecordKey {
        RecordKey(
            [
                self.filing_datetime.as_str(),
                self.ticker.as_str(),
                self.insider_name.as_str(),
                self.trade_code.as_str(),
                &fmt_num(self.price),
                &fmt_num(self.qty),
            ]
            .join("|"),
        )
    }

    pub fn is_purchase(&self) -> bool {
        self.trade_code == "P"
    }

    pub fn is_sale(&self) -> bool {
        self.trade_code == "S"
    }
}

/// Render a numeric key component the shortest way that round-trips the
/// value: integral values without a trailing ".0", NAN as "NaN".
fn fmt_num(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

/// Opaque persisted identity of a delivered record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordKey(pub String);

impl RecordKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
