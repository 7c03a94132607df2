use thiserror::Error;
use tracing::debug;

use crate::html::{first_href, inner_text_block, next_tag_block, row_cells, strip_tags};
use crate::model::TransactionRecord;
use crate::parse::{parse_money, parse_percent, parse_quantity};

/// Minimum cells for a transaction row. The screener appends performance
/// columns after these, so ">= 13" rather than "== 13".
const MIN_CELLS: usize = 13;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("No transaction table found in document")]
    NoTable,
}

/// Pull every well-formed transaction row out of the screener page, in
/// document order. Malformed rows are skipped, never fatal; only a document
/// with no table at all is an error.
///
/// Cell layout (positional): 0 X, 1 filing date + link, 2 trade date,
/// 3 ticker, 4 company, 5 insider, 6 title, 7 trade type, 8 price, 9 qty,
/// 10 owned, 11 delta own, 12 value, 13.. performance.
pub fn extract_rows(html_doc: &str) -> Result<Vec<TransactionRecord>, ExtractError> {
    let table = find_transaction_table(html_doc).ok_or(ExtractError::NoTable)?;

    let mut out = Vec::new();
    let mut tr_pos = 0usize;
    while let Some((tr_s, tr_e)) = next_tag_block(table, "<tr", "</tr>", tr_pos) {
        let tr_block = &table[tr_s..tr_e];
        tr_pos = tr_e;

        if let Some(record) = extract_row(tr_block) {
            out.push(record);
        }
    }

    debug!(rows = out.len(), "Extracted transaction rows");
    Ok(out)
}

/// The screener marks its results table with class "tinytable". Prefer that
/// block; fall back to the first table when the class is absent.
fn find_transaction_table(html_doc: &str) -> Option<&str> {
    let mut pos = 0usize;
    let mut first: Option<&str> = None;
    while let Some((s, e)) = next_tag_block(html_doc, "<table", "</table>", pos) {
        let block = &html_doc[s..e];
        pos = e;
        let opener_end = block.find('>').unwrap_or(block.len());
        if block[..opener_end].to_ascii_lowercase().contains("tinytable") {
            return Some(block);
        }
        first.get_or_insert(block);
    }
    first
}

fn extract_row(tr_block: &str) -> Option<TransactionRecord> {
    let tds = row_cells(tr_block);
    if tds.len() < MIN_CELLS {
        // Header rows, spacer rows, week separators.
        return None;
    }

    let cell_text = |i: usize| strip_tags(inner_text_block(tds[i]));

    let filing_datetime = cell_text(1);
    let filing_link = first_href(tds[1]);
    let trade_date = cell_text(2);
    let ticker = cell_text(3);
    let company = cell_text(4);
    let insider_name = cell_text(5);
    let insider_title = cell_text(6);
    let trade_type_text = cell_text(7);
    let price_text = cell_text(8);
    let qty_text = cell_text(9);
    let owned_text = cell_text(10);
    let delta_own_text = cell_text(11);
    let value_text = cell_text(12);

    // "P - Purchase" -> "P"; the label itself is kept for display.
    let trade_code = trade_type_text
        .split(|c: char| c == '-' || c.is_whitespace())
        .find(|t| !t.is_empty())
        .unwrap_or("")
        .to_ascii_uppercase();

    let price = parse_money(&price_text);
    let qty = parse_quantity(&qty_text);
    let value = parse_money(&value_text);
    let delta_own = parse_percent(&delta_own_text);

    Some(TransactionRecord {
        filing_datetime,
        filing_link,
        trade_date,
        ticker,
        company,
        insider_name,
        insider_title,
        trade_type_text,
        trade_code,
        price_text,
        qty_text,
        owned_text,
        delta_own_text,
        value_text,
        price,
        qty,
        value,
        delta_own,
    })
}
