//! Minimal tag-block scanning for the one screener table we consume.
//! Deliberately not a general HTML parser.

fn to_lower_ascii(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii() { c.to_ascii_lowercase() } else { c })
        .collect()
}

/// Find the next `<open ...> ... </close>` block at or after `from`,
/// case-insensitive on tag names. Returns byte offsets (start of the open
/// tag, end just past the close tag).
pub fn next_tag_block(s: &str, open: &str, close: &str, from: usize) -> Option<(usize, usize)> {
    let lc = to_lower_ascii(s);
    let open_lc = to_lower_ascii(open);
    let close_lc = to_lower_ascii(close);

    let start = lc.get(from..)?.find(&open_lc)? + from;
    let open_end = s[start..].find('>')? + start + 1;
    let end_rel = lc[open_end..].find(&close_lc)?;
    let end = open_end + end_rel + close.len();
    Some((start, end))
}

/// Content between the opening tag's `>` and the final `<` of the block.
pub fn inner_text_block(block: &str) -> &str {
    match (block.find('>'), block.rfind('<')) {
        (Some(oe), Some(cs)) if cs > oe => &block[oe + 1..cs],
        _ => "",
    }
}

/// Drop tags, collapse whitespace runs to single spaces, trim.
pub fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for ch in s.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First `href` attribute value inside the block, or empty string.
/// Handles double-quoted, single-quoted and unquoted forms.
pub fn first_href(block: &str) -> String {
    let lc = to_lower_ascii(block);
    let Some(pos) = lc.find("href=") else {
        return String::new();
    };
    let rest = &block[pos + "href=".len()..];
    let mut chars = rest.chars();
    match chars.next() {
        Some(q @ ('"' | '\'')) => {
            let val = chars.as_str();
            val.find(q).map(|e| val[..e].to_string()).unwrap_or_default()
        }
        Some(first) => {
            let mut val = String::new();
            val.push(first);
            val.extend(chars.take_while(|c| !c.is_whitespace() && *c != '>'));
            val
        }
        None => String::new(),
    }
}

/// All `<td>...</td>` blocks of a `<tr>` block, in order.
pub fn row_cells(tr_block: &str) -> Vec<&str> {
    let mut cells = Vec::new();
    let mut pos = 0usize;
    while let Some((s, e)) = next_tag_block(tr_block, "<td", "</td>", pos) {
        cells.push(&tr_block[s..e]);
        pos = e;
    }
    cells
}
