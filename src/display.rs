// src/display.rs
//
// Terminal rendering. Everything here builds a String so main decides where
// it goes (stdout) and tests can look at it.

use crate::allocation::{AllocationReport, AllocationResult};
use crate::state::AppState;
use std::fmt::{self, Write};

const PREVIEW_ROWS: usize = 5;
const TOP_ARTICLES: usize = 10;
const BAR_WIDTH: u64 = 40;

fn render(f: impl FnOnce(&mut String) -> fmt::Result) -> String {
    let mut out = String::new();
    // fmt::Write for String never fails
    let _ = f(&mut out);
    out
}

fn heading(out: &mut String, title: &str) -> fmt::Result {
    writeln!(out, "\n=== {title} ===")
}

/// Proportional bar of at most `BAR_WIDTH` cells.
fn bar(value: u64, max: u64) -> String {
    if max == 0 {
        return String::new();
    }
    let cells = (value.min(max) * BAR_WIDTH + max / 2) / max;
    "#".repeat(cells as usize)
}

/// First rows of each loaded table.
pub fn render_preview(state: &AppState) -> String {
    render(|out| {
        heading(out, "Godown Stock")?;
        writeln!(out, "{:<16} {:>8}", "Article", "Quantity")?;
        for (article, qty) in state.stock.iter().take(PREVIEW_ROWS) {
            writeln!(out, "{article:<16} {qty:>8}")?;
        }

        heading(out, "Supply History")?;
        for (store, articles) in state.history.stores().take(PREVIEW_ROWS) {
            let list: Vec<&str> = articles.iter().map(String::as_str).collect();
            writeln!(out, "{store}: {}", list.join(", "))?;
        }

        heading(out, "Store Capacity")?;
        writeln!(out, "{:<24} {:>8}", "Store", "Max Pcs")?;
        for (store, capacity) in state.capacities.iter().take(PREVIEW_ROWS) {
            writeln!(out, "{store:<24} {capacity:>8}")?;
        }
        Ok(())
    })
}

/// Counts and highlights of the loaded data.
pub fn render_summary(state: &AppState) -> String {
    render(|out| {
        heading(out, "Data Summary")?;
        writeln!(
            out,
            "Unique articles in godown: {} ({} pcs)",
            state.stock.len(),
            state.stock.total_units()
        )?;

        let mut top: Vec<(&str, u32)> = state.stock.iter().collect();
        top.sort_by(|a, b| b.1.cmp(&a.1));
        writeln!(out, "Top articles by stock:")?;
        for (article, qty) in top.into_iter().take(PREVIEW_ROWS) {
            writeln!(out, "  {article:<16} {qty:>8}")?;
        }

        writeln!(out, "Stores with capacities: {}", state.capacities.len())?;
        for (store, capacity) in state.capacities.iter() {
            writeln!(out, "  {store:<24} {capacity:>8}")?;
        }

        writeln!(
            out,
            "Articles sent per store ({} pairs):",
            state.history.total_sent_articles()
        )?;
        for (store, articles) in state.history.stores() {
            writeln!(out, "  {store:<24} {:>8}", articles.len())?;
        }
        Ok(())
    })
}

/// Headline figures for one store.
pub fn render_store_metrics(state: &AppState, result: &AllocationResult) -> String {
    render(|out| {
        heading(out, &format!("Store: {}", result.store))?;
        writeln!(out, "Maximum capacity:    {} pcs", result.max_capacity)?;
        writeln!(
            out,
            "Allocated:           {} pcs ({:.1}% of capacity)",
            result.total_allocated, result.capacity_percentage
        )?;
        writeln!(out, "Remaining capacity:  {} pcs", result.remaining_capacity())?;
        writeln!(out, "Eligible articles:   {}", result.available_articles_count)?;
        let sent = state.history.sent_to(&result.store).map_or(0, |s| s.len());
        writeln!(
            out,
            "Previously sent:     {} articles ({} pcs)",
            sent,
            state.history.supplied_units(&result.store)
        )
    })
}

pub fn render_allocation_summary(store: &str) -> String {
    render(|out| {
        heading(out, "Allocation Summary")?;
        writeln!(out, "This allocation plan includes articles that:")?;
        writeln!(out, "- Are currently available in the godown")?;
        writeln!(out, "- Were NOT previously sent to {store}")?;
        writeln!(out, "- Prioritize the highest stock quantities")
    })
}

/// Advisory text, or the reason there is none.
pub fn render_advice(advice: &Result<String, String>) -> String {
    render(|out| {
        heading(out, "AI-Powered Allocation Insights")?;
        match advice {
            Ok(text) => writeln!(out, "{text}"),
            Err(message) => writeln!(out, "{message}"),
        }
    })
}

/// The per-article allocation table, or a notice when nothing is eligible.
pub fn render_allocation_table(result: &AllocationResult) -> String {
    render(|out| {
        heading(out, &format!("Recommended Allocation for {}", result.store))?;
        if result.allocation.is_empty() {
            return writeln!(
                out,
                "No articles available for allocation that weren't previously sent to {}.",
                result.store
            );
        }
        writeln!(
            out,
            "{:<16} {:>18} {:>20}",
            "Article No", "Allocated Quantity", "Available in Godown"
        )?;
        for record in &result.allocation {
            writeln!(
                out,
                "{:<16} {:>18} {:>20}",
                record.article, record.quantity, record.available_in_godown
            )?;
        }
        Ok(())
    })
}

/// Capacity utilization and top allocated articles as text bars.
/// Empty when nothing was allocated.
pub fn render_charts(result: &AllocationResult) -> String {
    if result.allocation.is_empty() {
        return String::new();
    }
    render(|out| {
        heading(out, "Capacity Utilization")?;
        let capacity = u64::from(result.max_capacity);
        let allocated = u64::from(result.total_allocated);
        let remaining = u64::from(result.remaining_capacity());
        writeln!(out, "{:<10} {:<40} {allocated}", "Allocated", bar(allocated, capacity))?;
        writeln!(out, "{:<10} {:<40} {remaining}", "Remaining", bar(remaining, capacity))?;

        heading(out, "Top Allocated Articles (Available Stock)")?;
        let top = &result.allocation[..result.allocation.len().min(TOP_ARTICLES)];
        let max = top
            .iter()
            .map(|r| u64::from(r.available_in_godown))
            .max()
            .unwrap_or(0);
        for record in top {
            writeln!(
                out,
                "{:<16} {:<40} {}",
                record.article,
                bar(u64::from(record.available_in_godown), max),
                record.available_in_godown
            )?;
        }
        Ok(())
    })
}

/// One line per store plus godown statistics.
pub fn render_report(report: &AllocationReport) -> String {
    render(|out| {
        heading(out, &format!("Allocation Report ({:?})", report.mode))?;
        writeln!(
            out,
            "{:<24} {:>9} {:>9} {:>8} {:>9}",
            "Store", "Capacity", "Allocated", "Used %", "Eligible"
        )?;
        for result in &report.stores {
            writeln!(
                out,
                "{:<24} {:>9} {:>9} {:>8.1} {:>9}",
                result.store,
                result.max_capacity,
                result.total_allocated,
                result.capacity_percentage,
                result.available_articles_count
            )?;
        }
        let stats = &report.statistics;
        writeln!(
            out,
            "\nGodown: {} unique articles, {} pcs. Units allocated across stores: {}",
            stats.total_unique_articles_in_godown,
            stats.total_stock_in_godown,
            report.total_allocated()
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::{AllocationMode, plan_all, plan_store};
    use crate::inventory::{ArticleStock, StoreCapacity, SupplyHistory};

    fn state() -> AppState {
        let stock: ArticleStock = [("Z1", 2), ("Z2", 9), ("Z3", 0), ("Z4", 4), ("Z5", 1), ("Z6", 7)]
            .into_iter()
            .collect();
        let caps: StoreCapacity = [("BOMBAY", 4), ("MOGA", 0)].into_iter().collect();
        let mut history = SupplyHistory::new();
        history.record("BOMBAY", "Z2", 3);
        AppState::new(stock, history, caps)
    }

    #[test]
    fn test_bar_scaling() {
        assert_eq!(bar(0, 0), "");
        assert_eq!(bar(10, 10).len(), 40);
        assert_eq!(bar(5, 10).len(), 20);
        assert_eq!(bar(50, 10).len(), 40);
    }

    #[test]
    fn test_preview_limits_rows() {
        let text = render_preview(&state());
        assert!(text.contains("Z5"));
        assert!(!text.contains("Z6"));
        assert!(text.contains("BOMBAY: Z2"));
    }

    #[test]
    fn test_summary_top_articles() {
        let text = render_summary(&state());
        assert!(text.contains("Unique articles in godown: 6 (23 pcs)"));
        let top = text.split("Top articles by stock:").nth(1).unwrap();
        let z2 = top.find("Z2").unwrap();
        let z6 = top.find("Z6").unwrap();
        assert!(z2 < z6);
        assert!(text.contains("Stores with capacities: 2"));
    }

    #[test]
    fn test_allocation_table_and_charts() {
        let state = state();
        let result = plan_store(&state, "BOMBAY");
        let table = render_allocation_table(&result);
        assert!(table.contains("Article No"));
        assert!(table.contains("Z6"));
        assert!(!table.contains("Z2 "));

        let metrics = render_store_metrics(&state, &result);
        assert!(metrics.contains("Allocated:           4 pcs (100.0% of capacity)"));
        assert!(metrics.contains("Previously sent:     1 articles (3 pcs)"));

        let charts = render_charts(&result);
        assert!(charts.contains("Capacity Utilization"));
        assert!(charts.contains(&format!("{:<16} {} 7", "Z6", "#".repeat(40))));
    }

    #[test]
    fn test_empty_allocation_notice() {
        let result = plan_store(&state(), "MOGA");
        assert!(render_allocation_table(&result).contains("No articles available for allocation"));
        assert!(render_charts(&result).is_empty());
    }

    #[test]
    fn test_advice_section() {
        let ok = render_advice(&Ok("- Push Z6".to_string()));
        assert!(ok.contains("AI-Powered Allocation Insights"));
        assert!(ok.contains("- Push Z6"));
        let err = render_advice(&Err("Advisory unavailable: timeout".to_string()));
        assert!(err.contains("Advisory unavailable: timeout"));
    }

    #[test]
    fn test_report_lines() {
        let report = plan_all(&state(), AllocationMode::SharedPool);
        let text = render_report(&report);
        assert!(text.contains("SharedPool"));
        assert!(text.contains("Units allocated across stores: 4"));
    }
}
