// src/sources/delimited.rs

use super::{CapacityRow, StockRow, SupplyRow, TableRow, parse_quantity};
use crate::error::SourceError;
use std::path::PathBuf;
use tracing::{debug, info};

/// A logical column in a delimited table and the header names it answers to.
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub required: bool,
}

const ARTICLE: &[&str] = &["article", "article_number", "article_no", "sku"];
const STORE: &[&str] = &["store", "store_location", "location"];

pub(super) const STOCK_SCHEMA: &[Column] = &[
    Column { name: "article", aliases: ARTICLE, required: true },
    Column {
        name: "quantity",
        aliases: &["quantity", "quantity_available", "qty", "available"],
        required: true,
    },
];

pub(super) const SUPPLY_SCHEMA: &[Column] = &[
    Column { name: "store", aliases: STORE, required: true },
    Column { name: "article", aliases: ARTICLE, required: true },
    Column {
        name: "quantity",
        aliases: &["quantity", "quantity_supplied", "quantity_supplied_2024", "qty"],
        required: false,
    },
];

pub(super) const CAPACITY_SCHEMA: &[Column] = &[
    Column { name: "store", aliases: STORE, required: true },
    Column {
        name: "capacity",
        aliases: &["capacity", "max_quantity", "max_pcs", "max"],
        required: true,
    },
];

/// Normalise a header cell: trimmed, lowercase, spaces as underscores.
fn normalise(header: &str) -> String {
    header.trim().to_ascii_lowercase().replace([' ', '-'], "_")
}

/// Map each schema column to a field index.
///
/// Named lookup wins when every required column is present in the header.
/// Otherwise columns are taken by position in schema order; an optional
/// column beyond the file's width resolves to `None`.
pub fn resolve_columns(
    table: &'static str,
    schema: &[Column],
    headers: &[&str],
) -> Result<Vec<Option<usize>>, SourceError> {
    let normalised: Vec<String> = headers.iter().map(|h| normalise(h)).collect();
    let by_name: Vec<Option<usize>> = schema
        .iter()
        .map(|col| normalised.iter().position(|h| col.aliases.contains(&h.as_str())))
        .collect();

    let all_required_named = schema
        .iter()
        .zip(&by_name)
        .all(|(col, idx)| !col.required || idx.is_some());
    if all_required_named {
        return Ok(by_name);
    }

    let needed = schema.iter().filter(|c| c.required).count();
    if headers.len() < needed {
        return Err(SourceError::Schema {
            table,
            needed,
            found: headers.len(),
        });
    }

    info!(table, ?headers, "Header names not recognised: mapping columns by position");
    let positional: Vec<Option<usize>> = (0..schema.len())
        .map(|pos| (pos < headers.len()).then_some(pos))
        .collect();
    for (col, idx) in schema.iter().zip(&positional) {
        debug!(table, column = col.name, index = ?idx, "Column mapped");
    }
    Ok(positional)
}

/// A comma-separated file with a header row.
#[derive(Debug)]
pub struct DelimitedTable {
    path: PathBuf,
    content: String,
}

impl DelimitedTable {
    pub fn new(path: PathBuf, content: String) -> Self {
        Self { path, content }
    }

    pub fn rows<R: TableRow>(&self) -> Result<Vec<R>, SourceError> {
        let csv_error = |source: csv::Error| SourceError::Csv {
            path: self.path.clone(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(self.content.as_bytes());

        let headers = reader.headers().map_err(csv_error)?.clone();
        let header_cells: Vec<&str> = headers.iter().collect();
        let columns = resolve_columns(R::TABLE, R::SCHEMA, &header_cells)?;

        let mut rows = Vec::new();
        let mut dropped = 0usize;
        for record in reader.records() {
            let record = record.map_err(csv_error)?;
            let fields: Vec<Option<&str>> = columns
                .iter()
                .map(|idx| idx.and_then(|i| record.get(i)).filter(|f| !f.is_empty()))
                .collect();
            match R::from_fields(&fields) {
                Some(row) => rows.push(row),
                None => dropped += 1,
            }
        }
        debug!(table = R::TABLE, kept = rows.len(), dropped, "CSV records parsed");
        Ok(rows)
    }
}

pub(super) fn stock_from_fields(fields: &[Option<&str>]) -> Option<StockRow> {
    Some(StockRow {
        article: fields.first().copied().flatten()?.to_string(),
        quantity: parse_quantity(fields.get(1).copied().flatten()?)?,
    })
}

pub(super) fn supply_from_fields(fields: &[Option<&str>]) -> Option<SupplyRow> {
    let quantity = match fields.get(2).copied().flatten() {
        Some(q) => parse_quantity(q)?,
        None => 0,
    };
    Some(SupplyRow {
        store: fields.first().copied().flatten()?.to_string(),
        article: fields.get(1).copied().flatten()?.to_string(),
        quantity,
    })
}

pub(super) fn capacity_from_fields(fields: &[Option<&str>]) -> Option<CapacityRow> {
    Some(CapacityRow {
        store: fields.first().copied().flatten()?.to_string(),
        max_quantity: parse_quantity(fields.get(1).copied().flatten()?)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(content: &str) -> DelimitedTable {
        DelimitedTable::new(PathBuf::from("test.csv"), content.to_string())
    }

    #[test]
    fn test_named_columns_any_order() {
        let rows: Vec<StockRow> = table("Qty, Article Number\n27,Z2393\n12,Z2263\n")
            .rows()
            .unwrap();
        assert_eq!(rows[0], StockRow { article: "Z2393".into(), quantity: 27 });
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_positional_fallback() {
        let rows: Vec<CapacityRow> = table("Location Name,Max Pieces,Notes\nBOMBAY,132,x\nMOGA,257,\n")
            .rows()
            .unwrap();
        assert_eq!(
            rows,
            vec![
                CapacityRow { store: "BOMBAY".into(), max_quantity: 132 },
                CapacityRow { store: "MOGA".into(), max_quantity: 257 },
            ]
        );
    }

    #[test]
    fn test_malformed_records_dropped() {
        let rows: Vec<StockRow> = table("article,quantity\nZ2393,27\nZ2263,lots\nZ2250\n,4\nZ2327,9\n")
            .rows()
            .unwrap();
        let articles: Vec<_> = rows.iter().map(|r| r.article.as_str()).collect();
        assert_eq!(articles, vec!["Z2393", "Z2327"]);
    }

    #[test]
    fn test_supply_quantity_optional() {
        let rows: Vec<SupplyRow> = table("store,article\nBOMBAY,Z2250\nMOGA,Z2252\n").rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.quantity == 0));

        let rows: Vec<SupplyRow> = table("store_location,article_number,quantity_supplied_2024\nDUKE RO,Z2250,3\n")
            .rows()
            .unwrap();
        assert_eq!(rows[0].quantity, 3);
    }

    #[test]
    fn test_too_few_columns() {
        let err = table("onlyone\nBOMBAY\n").rows::<CapacityRow>().unwrap_err();
        assert!(matches!(
            err,
            SourceError::Schema { table: "capacity", needed: 2, found: 1 }
        ));
    }

    #[test]
    fn test_resolve_prefers_names() {
        let cols = resolve_columns("supply", SUPPLY_SCHEMA, &["Article", "Store"]).unwrap();
        assert_eq!(cols, vec![Some(1), Some(0), None]);
    }
}
