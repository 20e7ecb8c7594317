//! Market price data types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One scraped price listing row for a market.
///
/// Prices are rupees per quintal. Fields are `None` when the source cell
/// was empty or not numeric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketPriceRow {
    pub market: String,
    pub commodity: String,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub modal_price: Option<f64>,
    pub date: Option<NaiveDate>,
}

/// One aggregated summary row per distinct market.
///
/// Averages are integer-rounded over the rows kept for the market; a market
/// whose kept rows carry no parseable prices still appears, with `None`
/// aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSummary {
    pub market: String,
    pub avg_modal: Option<i64>,
    pub avg_min: Option<i64>,
    pub avg_max: Option<i64>,
    pub latest_date: Option<NaiveDate>,
}

/// Fully resolved acquisition request handed to the price source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuery {
    /// Canonical calendar date to query.
    pub date: NaiveDate,
    /// External region code (e.g. "UP").
    pub region_code: String,
    /// External district code within the region.
    pub district_code: String,
    /// External commodity code.
    pub commodity_code: String,
}
