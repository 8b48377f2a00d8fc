// src/sources/mod.rs

mod delimited;
mod text;

use crate::error::SourceError;
use crate::inventory::{ArticleStock, StoreCapacity, SupplyHistory};
use crate::pdf_extract;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub use delimited::{Column, DelimitedTable};
pub use text::TextTable;

/// One godown stock row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockRow {
    pub article: String,
    pub quantity: u32,
}

/// One historical supply row. `quantity` is 0 when the source only lists articles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupplyRow {
    pub store: String,
    pub article: String,
    pub quantity: u32,
}

/// One store capacity row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapacityRow {
    pub store: String,
    pub max_quantity: u32,
}

/// A row type that can be read from either text lines or a delimited file.
pub trait TableRow: Sized {
    /// Name used in log lines and schema errors.
    const TABLE: &'static str;
    /// Logical columns for delimited sources, in positional-fallback order.
    const SCHEMA: &'static [Column];

    /// Parse one text line. A single line may carry several rows.
    fn from_line(line: &str) -> Vec<Self>;

    /// Build a row from fields resolved against `SCHEMA`.
    fn from_fields(fields: &[Option<&str>]) -> Option<Self>;
}

impl TableRow for StockRow {
    const TABLE: &'static str = "stock";
    const SCHEMA: &'static [Column] = delimited::STOCK_SCHEMA;

    fn from_line(line: &str) -> Vec<Self> {
        text::stock_line(line).into_iter().collect()
    }

    fn from_fields(fields: &[Option<&str>]) -> Option<Self> {
        delimited::stock_from_fields(fields)
    }
}

impl TableRow for SupplyRow {
    const TABLE: &'static str = "supply";
    const SCHEMA: &'static [Column] = delimited::SUPPLY_SCHEMA;

    fn from_line(line: &str) -> Vec<Self> {
        text::supply_line(line)
    }

    fn from_fields(fields: &[Option<&str>]) -> Option<Self> {
        delimited::supply_from_fields(fields)
    }
}

impl TableRow for CapacityRow {
    const TABLE: &'static str = "capacity";
    const SCHEMA: &'static [Column] = delimited::CAPACITY_SCHEMA;

    fn from_line(line: &str) -> Vec<Self> {
        text::capacity_line(line).into_iter().collect()
    }

    fn from_fields(fields: &[Option<&str>]) -> Option<Self> {
        delimited::capacity_from_fields(fields)
    }
}

/// Supported input formats, picked by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Pdf,
    Csv,
    Text,
}

impl SourceFormat {
    pub fn detect(path: &Path) -> Result<Self, SourceError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("pdf") => Ok(Self::Pdf),
            Some("csv") => Ok(Self::Csv),
            Some("txt") => Ok(Self::Text),
            _ => Err(SourceError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// A loaded input document, ready to yield typed rows.
#[derive(Debug)]
pub enum Source {
    Text(TextTable),
    Delimited(DelimitedTable),
}

impl Source {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let format = SourceFormat::detect(path)?;
        debug!(path = %path.display(), ?format, "Opening source");
        match format {
            SourceFormat::Pdf => Ok(Self::Text(TextTable::new(pdf_extract::read_pdf_text(path)?))),
            SourceFormat::Text => Ok(Self::Text(TextTable::new(read_to_string(path)?))),
            SourceFormat::Csv => Ok(Self::Delimited(DelimitedTable::new(
                path.to_path_buf(),
                read_to_string(path)?,
            ))),
        }
    }

    pub fn rows<R: TableRow>(&self) -> Result<Vec<R>, SourceError> {
        match self {
            Self::Text(table) => Ok(table.rows()),
            Self::Delimited(table) => table.rows(),
        }
    }
}

fn read_to_string(path: &Path) -> Result<String, SourceError> {
    std::fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn load_rows<R: TableRow>(path: &Path) -> Result<Vec<R>, SourceError> {
    let span = tracing::info_span!("source", table = R::TABLE, path = %path.display());
    let _guard = span.enter();

    let rows = Source::open(path)?.rows::<R>()?;
    info!(rows = rows.len(), "Parsed table");
    Ok(rows)
}

pub fn load_stock(path: &Path) -> Result<ArticleStock, SourceError> {
    Ok(load_rows::<StockRow>(path)?
        .into_iter()
        .map(|r| (r.article, r.quantity))
        .collect())
}

pub fn load_supply(path: &Path) -> Result<SupplyHistory, SourceError> {
    let mut history = SupplyHistory::new();
    for row in load_rows::<SupplyRow>(path)? {
        history.record(row.store, row.article, row.quantity);
    }
    Ok(history)
}

pub fn load_capacity(path: &Path) -> Result<StoreCapacity, SourceError> {
    Ok(load_rows::<CapacityRow>(path)?
        .into_iter()
        .map(|r| (r.store, r.max_quantity))
        .collect())
}

/// Paths of the three input documents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourcePaths {
    pub stock: Option<PathBuf>,
    pub supply: Option<PathBuf>,
    pub capacity: Option<PathBuf>,
}

fn is_quantity(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

fn parse_quantity(token: &str) -> Option<u32> {
    let token = token.trim();
    if is_quantity(token) {
        token.parse().ok()
    } else {
        None
    }
}
