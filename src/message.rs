use serde::Serialize;

use crate::model::TransactionRecord;
use crate::parse::parse_money;

pub const COLOR_PURCHASE: u32 = 0x2ecc71;
pub const COLOR_SALE: u32 = 0xe74c3c;
pub const COLOR_NEUTRAL: u32 = 0x95a5a6;

/// Transaction value above this gets the channel mention suffix.
const BIG_TRADE_THRESHOLD: f64 = 10_000_000.0;
const BIG_TRADE_TAG: &str = "@insider_trade";

#[derive(Debug, Clone, Serialize)]
pub struct Embed {
    pub description: String,
    pub color: u32,
}

#[derive(Debug, Serialize)]
pub struct AllowedMentions {
    pub parse: Vec<String>,
}

/// Batched request body: `{ "embeds": [...] }` with mention parsing off.
#[derive(Debug, Serialize)]
pub struct EmbedPayload {
    pub embeds: Vec<Embed>,
    pub allowed_mentions: AllowedMentions,
}

impl EmbedPayload {
    pub fn new(embeds: Vec<Embed>) -> Self {
        Self {
            embeds,
            allowed_mentions: AllowedMentions { parse: Vec::new() },
        }
    }
}

/// Unbatched request body: `{ "content": "..." }` with mention parsing off.
#[derive(Debug, Serialize)]
pub struct TextPayload {
    pub content: String,
    pub allowed_mentions: AllowedMentions,
}

impl TextPayload {
    pub fn new(content: String) -> Self {
        Self {
            content,
            allowed_mentions: AllowedMentions { parse: Vec::new() },
        }
    }
}

pub fn color_for_trade(code: &str) -> u32 {
    match code {
        "P" => COLOR_PURCHASE,
        "S" => COLOR_SALE,
        _ => COLOR_NEUTRAL,
    }
}

/// One-line markdown rendering of a record. Raw cell texts are used for the
/// numeric parts so the message shows exactly what the source printed.
pub fn one_line(r: &TransactionRecord) -> String {
    // Fall back to re-parsing the raw text when the parsed value is NAN.
    let value = if r.value.is_finite() {
        r.value
    } else {
        parse_money(&r.value_text)
    };
    let is_big = value.abs() > BIG_TRADE_THRESHOLD;

    let mut line = format!(
        "{}\n**${}  {}  ({} Stocks)**\n{}: {}  ({})\n{} (Title: {})",
        r.trade_date,
        r.ticker,
        r.value_text,
        r.qty_text,
        r.company,
        r.price_text,
        r.trade_type_text,
        r.insider_name,
        if r.insider_title.is_empty() {
            "—"
        } else {
            r.insider_title.as_str()
        },
    );

    if !r.filing_link.is_empty() {
        line.push_str(&format!(
            "\n[SEC Form 4 ({})]({})",
            r.filing_datetime, r.filing_link
        ));
    }

    if is_big {
        line.push(' ');
        line.push_str(BIG_TRADE_TAG);
    }
    line
}

pub fn build_embed(r: &TransactionRecord) -> Embed {
    Embed {
        description: one_line(r),
        color: color_for_trade(&r.trade_code),
    }
}
