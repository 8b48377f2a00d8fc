// src/sources/text.rs

use super::{CapacityRow, StockRow, SupplyRow, TableRow, parse_quantity};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

// Tables pulled out of PDFs arrive as one row per line, columns separated by
// runs of whitespace. Store names may contain spaces ("DUKE RO"), so the
// store column is always the leading remainder of the line.

static STOCK_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\S+)\s+(\d+)$").expect("stock line pattern"));

static SUPPLY_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*\S)\s+(\S+)\s+(\d+)$").expect("supply line pattern"));

// `BOMBAY 132`, `BOMBAY: 132` and `BOMBAY:132` all name the store "BOMBAY".
static CAPACITY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*?\S)\s*(?::\s*|\s+)(\d+)$").expect("capacity line pattern")
});

/// Article tokens in a `STORE: A1, A2` listing.
static ARTICLE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9][A-Za-z0-9\-/]*").expect("article token pattern"));

/// Plain text extracted from a PDF (or read from a `.txt` file).
#[derive(Debug)]
pub struct TextTable {
    text: String,
}

impl TextTable {
    pub fn new(text: String) -> Self {
        Self { text }
    }

    /// Parse every line, silently dropping the ones that don't fit.
    pub fn rows<R: TableRow>(&self) -> Vec<R> {
        let mut rows = Vec::new();
        let mut dropped = 0usize;
        for line in self.text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let parsed = R::from_line(line);
            if parsed.is_empty() {
                dropped += 1;
            }
            rows.extend(parsed);
        }
        debug!(table = R::TABLE, kept = rows.len(), dropped, "Text lines parsed");
        rows
    }
}

pub(super) fn stock_line(line: &str) -> Option<StockRow> {
    let cap = STOCK_LINE.captures(line)?;
    Some(StockRow {
        article: cap[1].to_string(),
        quantity: parse_quantity(&cap[2])?,
    })
}

pub(super) fn supply_line(line: &str) -> Vec<SupplyRow> {
    if let Some((store, articles)) = line.split_once(':') {
        let store = store.trim();
        if store.is_empty() {
            return Vec::new();
        }
        // `STORE: ARTICLE QTY` is one supply row, not a two-article listing.
        if let Some(row) = stock_line(articles.trim()) {
            return vec![SupplyRow {
                store: store.to_string(),
                article: row.article,
                quantity: row.quantity,
            }];
        }
        return ARTICLE_TOKEN
            .find_iter(articles)
            .map(|m| SupplyRow {
                store: store.to_string(),
                article: m.as_str().to_string(),
                quantity: 0,
            })
            .collect();
    }

    SUPPLY_LINE
        .captures(line)
        .and_then(|cap| {
            Some(SupplyRow {
                store: cap[1].trim().to_string(),
                article: cap[2].to_string(),
                quantity: parse_quantity(&cap[3])?,
            })
        })
        .into_iter()
        .collect()
}

pub(super) fn capacity_line(line: &str) -> Option<CapacityRow> {
    let cap = CAPACITY_LINE.captures(line)?;
    Some(CapacityRow {
        store: cap[1].trim().to_string(),
        max_quantity: parse_quantity(&cap[2])?,
    })
}
