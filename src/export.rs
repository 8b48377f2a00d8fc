// src/export.rs

use crate::allocation::{AllocationRecord, AllocationReport, AllocationResult};
use crate::error::AllocError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

const HEADER: [&str; 3] = ["article", "quantity", "available_in_godown"];
const REPORT_HEADER: [&str; 4] = ["store", "article", "quantity", "available_in_godown"];

/// Write one store's records as `article,quantity,available_in_godown`.
/// The header is written even when there are no records.
pub fn write_allocation<W: Write>(writer: W, records: &[AllocationRecord]) -> Result<(), csv::Error> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(HEADER)?;
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write every store of a report as `store,article,quantity,available_in_godown`.
pub fn write_report<W: Write>(writer: W, report: &AllocationReport) -> Result<(), csv::Error> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(REPORT_HEADER)?;
    for result in &report.stores {
        for record in &result.allocation {
            let quantity = record.quantity.to_string();
            let available = record.available_in_godown.to_string();
            wtr.write_record([
                result.store.as_str(),
                record.article.as_str(),
                quantity.as_str(),
                available.as_str(),
            ])?;
        }
    }
    wtr.flush()?;
    Ok(())
}

/// `<store>_allocation.csv`, with path separators in the store name replaced.
pub fn allocation_file_name(store: &str) -> String {
    let safe: String = store
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    format!("{safe}_allocation.csv")
}

/// Save a store allocation into `dir`, creating it if needed.
pub fn export_allocation(dir: &Path, result: &AllocationResult) -> Result<PathBuf, AllocError> {
    std::fs::create_dir_all(dir).map_err(|source| AllocError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = dir.join(allocation_file_name(&result.store));
    let file = std::fs::File::create(&path).map_err(|source| AllocError::Io {
        path: path.clone(),
        source,
    })?;
    write_allocation(file, &result.allocation).map_err(|source| AllocError::Export {
        path: path.clone(),
        source,
    })?;
    info!(path = %path.display(), rows = result.allocation.len(), "Allocation exported");
    Ok(path)
}

/// Save an all-store report to `path`.
pub fn export_report(path: &Path, report: &AllocationReport) -> Result<(), AllocError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| AllocError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let file = std::fs::File::create(path).map_err(|source| AllocError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    write_report(file, report).map_err(|source| AllocError::Export {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), stores = report.stores.len(), "Report exported");
    Ok(())
}
