// src/state.rs

use crate::error::AllocError;
use crate::inventory::{ArticleStock, StoreCapacity, SupplyHistory};
use crate::sources::{self, SourcePaths};
use std::path::Path;
use tracing::{info, warn};

/// Everything the allocate stage needs, produced once by the extract stage.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub stock: ArticleStock,
    pub history: SupplyHistory,
    pub capacities: StoreCapacity,
}

impl AppState {
    pub fn new(stock: ArticleStock, history: SupplyHistory, capacities: StoreCapacity) -> Self {
        Self {
            stock,
            history,
            capacities,
        }
    }

    /// Load all three tables. Any missing path blocks the whole load.
    pub fn load(paths: &SourcePaths) -> Result<Self, AllocError> {
        let missing: Vec<&str> = [
            ("stock", paths.stock.is_none()),
            ("supply history", paths.supply.is_none()),
            ("store capacity", paths.capacity.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();

        let (Some(stock_path), Some(supply_path), Some(capacity_path)) =
            (&paths.stock, &paths.supply, &paths.capacity)
        else {
            return Err(AllocError::InputMissing(format!(
                "no {} source given",
                missing.join(", ")
            )));
        };

        let stock = sources::load_stock(stock_path)?;
        require_rows("stock", stock.is_empty(), stock_path)?;

        let history = sources::load_supply(supply_path)?;
        if history.is_empty() {
            warn!(path = %supply_path.display(), "Supply history is empty: no articles will be excluded");
        }

        let capacities = sources::load_capacity(capacity_path)?;
        require_rows("store capacity", capacities.is_empty(), capacity_path)?;

        info!(
            articles = stock.len(),
            stock_units = stock.total_units(),
            history_stores = history.store_count(),
            stores = capacities.len(),
            "Input data loaded"
        );

        Ok(Self::new(stock, history, capacities))
    }

    /// Stores in capacity-table order.
    pub fn stores(&self) -> impl Iterator<Item = &str> {
        self.capacities.keys()
    }
}

fn require_rows(table: &str, empty: bool, path: &Path) -> Result<(), AllocError> {
    if empty {
        return Err(AllocError::InputMissing(format!(
            "no {table} rows could be parsed from {}",
            path.display()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_missing_paths_block_load() {
        let paths = SourcePaths {
            stock: Some(PathBuf::from("stock.csv")),
            supply: None,
            capacity: None,
        };
        let err = AppState::load(&paths).unwrap_err();
        let AllocError::InputMissing(msg) = err else {
            panic!("expected InputMissing, got {err:?}");
        };
        assert!(msg.contains("supply history"));
        assert!(msg.contains("store capacity"));
        assert!(!msg.contains("stock,"));
    }

    #[test]
    fn test_empty_stock_is_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let stock = dir.path().join("stock.txt");
        let supply = dir.path().join("sent.csv");
        let capacity = dir.path().join("max.txt");
        std::fs::write(&stock, "Article Quantity\n").unwrap();
        std::fs::write(&supply, "store,article\n").unwrap();
        std::fs::write(&capacity, "BOMBAY 132\n").unwrap();

        let paths = SourcePaths {
            stock: Some(stock),
            supply: Some(supply),
            capacity: Some(capacity),
        };
        assert!(matches!(AppState::load(&paths), Err(AllocError::InputMissing(_))));
    }

    #[test]
    fn test_load_all_tables() {
        let dir = tempfile::tempdir().unwrap();
        let stock = dir.path().join("stock.csv");
        let supply = dir.path().join("sent.txt");
        let capacity = dir.path().join("max.txt");
        std::fs::write(&stock, "article,quantity\nZ2393,27\nZ2263,12\n").unwrap();
        std::fs::write(&supply, "BOMBAY Z2393 1\n").unwrap();
        std::fs::write(&capacity, "BOMBAY 132\nDUKE NIT 70\n").unwrap();

        let state = AppState::load(&SourcePaths {
            stock: Some(stock),
            supply: Some(supply),
            capacity: Some(capacity),
        })
        .unwrap();

        assert_eq!(state.stores().collect::<Vec<_>>(), vec!["BOMBAY", "DUKE NIT"]);
        assert!(state.history.was_sent("BOMBAY", "Z2393"));
        assert_eq!(state.stock.get("Z2263"), Some(12));
    }

    #[test]
    fn test_colon_store_names_match_across_tables() {
        let dir = tempfile::tempdir().unwrap();
        let stock = dir.path().join("stock.txt");
        let supply = dir.path().join("sent.txt");
        let capacity = dir.path().join("max.txt");
        std::fs::write(&stock, "A 5\nB 3\n").unwrap();
        std::fs::write(&supply, "BOMBAY: A\n").unwrap();
        std::fs::write(&capacity, "BOMBAY: 2\n").unwrap();

        let state = AppState::load(&SourcePaths {
            stock: Some(stock),
            supply: Some(supply),
            capacity: Some(capacity),
        })
        .unwrap();
        assert_eq!(state.stores().collect::<Vec<_>>(), vec!["BOMBAY"]);

        let result = crate::allocation::plan_store(&state, "BOMBAY");
        let articles: Vec<_> = result.allocation.iter().map(|r| r.article.as_str()).collect();
        assert_eq!(articles, vec!["B"]);
        assert_eq!(result.max_capacity, 2);
    }
}
