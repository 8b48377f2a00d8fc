// src/allocation.rs

use crate::error::AllocError;
use crate::inventory::{ArticleStock, StoreCapacity, SupplyHistory};
use crate::state::AppState;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// One unit of one article assigned to a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocationRecord {
    pub article: String,
    /// Always 1: at most one unit of each article per store per run.
    pub quantity: u32,
    pub available_in_godown: u32,
}

/// The allocation computed for a single store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationResult {
    pub store: String,
    pub max_capacity: u32,
    pub allocation: Vec<AllocationRecord>,
    pub total_allocated: u32,
    pub capacity_percentage: f64,
    /// Eligible articles before the capacity cap was applied.
    pub available_articles_count: usize,
}

impl AllocationResult {
    fn empty(store: &str) -> Self {
        Self {
            store: store.to_string(),
            max_capacity: 0,
            allocation: Vec::new(),
            total_allocated: 0,
            capacity_percentage: 0.0,
            available_articles_count: 0,
        }
    }

    pub fn remaining_capacity(&self) -> u32 {
        self.max_capacity.saturating_sub(self.total_allocated)
    }
}

/// Whether stores draw from the same units or each see the full godown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AllocationMode {
    /// Every store is planned against the unmodified stock.
    #[default]
    Independent,
    /// Stores are planned in capacity-table order against one shared pool
    /// that is decremented as units are handed out.
    SharedPool,
}

/// Articles in stock (quantity > 0) that were never sent to `store`,
/// in stock iteration order. A store with no history excludes nothing.
pub fn available_articles(stock: &ArticleStock, history: &SupplyHistory, store: &str) -> Vec<String> {
    if history.sent_to(store).is_none() {
        debug!(store = %store, "No supply history for store: every in-stock article is eligible");
    }
    stock
        .iter()
        .filter(|&(article, qty)| qty > 0 && !history.was_sent(store, article))
        .map(|(article, _)| article.to_string())
        .collect()
}

/// Greedy single-unit allocation for one store.
///
/// Eligible articles are ranked by godown quantity, highest first, ties in
/// the order given. Each article contributes one unit until the store's
/// capacity is reached.
pub fn allocate(
    store: &str,
    stock: &ArticleStock,
    capacities: &StoreCapacity,
    available: &[String],
) -> Result<AllocationResult, AllocError> {
    let max_capacity = capacities
        .get(store)
        .ok_or_else(|| AllocError::StoreNotFound(store.to_string()))?;

    // Drop stale keys and repeats; keep the caller's order for the tie-break.
    let mut seen = HashSet::new();
    let mut ranked: Vec<(&str, u32)> = available
        .iter()
        .filter(|a| seen.insert(a.as_str()))
        .filter_map(|a| stock.get(a).map(|qty| (a.as_str(), qty)))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    let eligible = ranked.iter().filter(|(_, qty)| *qty > 0).count();

    let mut allocation = Vec::new();
    let mut total_allocated = 0u32;
    for (article, qty) in ranked {
        if total_allocated >= max_capacity {
            break;
        }
        if qty == 0 {
            continue;
        }
        allocation.push(AllocationRecord {
            article: article.to_string(),
            quantity: 1,
            available_in_godown: qty,
        });
        total_allocated += 1;
    }

    Ok(AllocationResult {
        store: store.to_string(),
        max_capacity,
        allocation,
        total_allocated,
        capacity_percentage: capacity_percentage(total_allocated, max_capacity),
        available_articles_count: eligible,
    })
}

/// `total / capacity * 100` rounded to one decimal; 0 when capacity is 0.
pub fn capacity_percentage(total: u32, capacity: u32) -> f64 {
    if capacity == 0 {
        return 0.0;
    }
    let pct = f64::from(total) / f64::from(capacity) * 100.0;
    // Halves round away from zero (1/16 -> 6.3), not to even.
    (pct * 10.0).round() / 10.0
}

/// Plan one store against the unmodified stock. An unknown store is
/// reported and treated as having zero capacity.
pub fn plan_store(state: &AppState, store: &str) -> AllocationResult {
    let available = available_articles(&state.stock, &state.history, store);
    match allocate(store, &state.stock, &state.capacities, &available) {
        Ok(result) => {
            info!(
                store = %store,
                capacity = result.max_capacity,
                allocated = result.total_allocated,
                percentage = result.capacity_percentage,
                eligible = result.available_articles_count,
                "Store allocation computed"
            );
            result
        }
        Err(e) => {
            warn!(error = %e, "Treating store as zero capacity");
            AllocationResult::empty(store)
        }
    }
}

/// Per-store figures in an `AllocationReport`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreStatistics {
    pub store: String,
    pub capacity_utilization: f64,
    pub unique_articles: usize,
    pub total_allocated: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationStatistics {
    pub total_unique_articles_in_godown: usize,
    pub total_stock_in_godown: u64,
    pub stores: Vec<StoreStatistics>,
}

/// Results for every store, in capacity-table order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationReport {
    pub mode: AllocationMode,
    pub stores: Vec<AllocationResult>,
    pub statistics: AllocationStatistics,
}

impl AllocationReport {
    pub fn total_allocated(&self) -> u64 {
        self.stores.iter().map(|r| u64::from(r.total_allocated)).sum()
    }
}

/// Plan every store.
///
/// In `SharedPool` mode each allocated unit is taken out of a private copy
/// of the stock before the next store is planned, so stores earlier in the
/// capacity table get first pick.
pub fn plan_all(state: &AppState, mode: AllocationMode) -> AllocationReport {
    let stores: Vec<AllocationResult> = match mode {
        AllocationMode::Independent => state.stores().map(|s| plan_store(state, s)).collect(),
        AllocationMode::SharedPool => {
            let mut pool = state.stock.clone();
            let mut results = Vec::with_capacity(state.capacities.len());
            for store in state.stores() {
                let span = tracing::info_span!("shared_pool", store = %store);
                let _guard = span.enter();

                let available = available_articles(&pool, &state.history, store);
                let result = match allocate(store, &pool, &state.capacities, &available) {
                    Ok(r) => r,
                    Err(e) => {
                        warn!(error = %e, "Treating store as zero capacity");
                        AllocationResult::empty(store)
                    }
                };
                for record in &result.allocation {
                    pool.take(&record.article, record.quantity);
                }
                info!(
                    allocated = result.total_allocated,
                    pool_units_left = pool.total_units(),
                    "Store drawn from shared pool"
                );
                results.push(result);
            }
            results
        }
    };

    let statistics = statistics(&state.stock, &stores);
    AllocationReport {
        mode,
        stores,
        statistics,
    }
}

pub fn statistics(stock: &ArticleStock, results: &[AllocationResult]) -> AllocationStatistics {
    AllocationStatistics {
        total_unique_articles_in_godown: stock.len(),
        total_stock_in_godown: stock.total_units(),
        stores: results
            .iter()
            .map(|r| StoreStatistics {
                store: r.store.clone(),
                capacity_utilization: r.capacity_percentage,
                unique_articles: r.allocation.len(),
                total_allocated: r.total_allocated,
            })
            .collect(),
    }
}
