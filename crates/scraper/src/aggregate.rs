//! Per-market price aggregation
//!
//! Reduces raw scraped rows to one summary per distinct market: keep the
//! `top_k` most recent rows per market, average their prices with integer
//! rounding, and report the most recent date among them.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use mandi_core::{MarketPriceRow, MarketSummary};

/// Summarize rows into one entry per market.
///
/// Markets are grouped case- and whitespace-insensitively. Within a group
/// rows are ordered by date descending, then modal price descending, and
/// only the first `top_k` contribute to the averages. A market whose kept
/// rows carry no parseable prices still appears, with `None` aggregates.
pub fn summarize(rows: &[MarketPriceRow], top_k: usize) -> Vec<MarketSummary> {
    if rows.is_empty() {
        return Vec::new();
    }

    let mut groups: BTreeMap<String, Vec<&MarketPriceRow>> = BTreeMap::new();
    for row in rows {
        groups.entry(group_key(&row.market)).or_default().push(row);
    }

    groups
        .into_values()
        .map(|mut group| {
            // Display name from the raw rows, before truncation.
            let market = group
                .first()
                .map(|row| row.market.trim().to_string())
                .unwrap_or_default();

            group.sort_by(compare_recency);
            group.truncate(top_k);

            MarketSummary {
                market,
                avg_modal: rounded_mean(group.iter().filter_map(|row| row.modal_price)),
                avg_min: rounded_mean(group.iter().filter_map(|row| row.min_price)),
                avg_max: rounded_mean(group.iter().filter_map(|row| row.max_price)),
                latest_date: group.iter().filter_map(|row| row.date).max(),
            }
        })
        .collect()
}

fn group_key(market: &str) -> String {
    market
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Date descending, then modal price descending; rows without a date or
/// modal price sort last.
fn compare_recency(a: &&MarketPriceRow, b: &&MarketPriceRow) -> Ordering {
    b.date.cmp(&a.date).then_with(|| {
        b.modal_price
            .partial_cmp(&a.modal_price)
            .unwrap_or(Ordering::Equal)
    })
}

fn rounded_mean(values: impl Iterator<Item = f64>) -> Option<i64> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for value in values {
        sum += value;
        count += 1;
    }
    if count == 0 {
        None
    } else {
        Some((sum / count as f64).round() as i64)
    }
}
