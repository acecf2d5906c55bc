//! Quote-aware CSV scanning for the world-cities dataset.
//!
//! Stage one of the gazetteer pipeline: raw text → rows keyed by header name.
//! Nothing here fails; malformed input just produces fewer or emptier rows.

use std::collections::HashMap;

/// One data row, addressed by header column name.
pub type Row = HashMap<String, String>;

/// Split a single CSV line into fields.
///
/// Outside quotes, `,` separates fields and `"` enters quote mode.
/// Inside quotes, `""` is one literal quote, a lone `"` leaves quote mode,
/// and everything else (commas included) is copied as-is.
pub fn split_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut cur = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    cur.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                cur.push(ch);
            }
        } else {
            match ch {
                '"' => in_quotes = true,
                ',' => fields.push(std::mem::take(&mut cur)),
                _ => cur.push(ch),
            }
        }
    }
    fields.push(cur);
    fields
}

/// Parse CSV text into rows keyed by the header line.
///
/// Accepts `\n` and `\r\n` endings and skips blank lines anywhere. A row shorter
/// than the header still yields a full map; its missing columns read as `""`.
/// Columns past the end of the header are ignored.
pub fn parse_rows(text: &str) -> Vec<Row> {
    let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());

    let header = match lines.next() {
        Some(line) => split_line(line),
        None => return Vec::new(),
    };

    lines
        .map(|line| {
            let mut cols = split_line(line).into_iter();
            header
                .iter()
                .map(|name| (name.clone(), cols.next().unwrap_or_default()))
                .collect()
        })
        .collect()
}
