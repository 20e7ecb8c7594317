//! Deterministic synthetic fallback dataset
//!
//! When live acquisition yields nothing for a syntactically valid query,
//! downstream consumers still receive structurally valid rows. The data is
//! keyed purely on the commodity and city names with fixed offsets from a
//! reference price, so repeated calls return identical rows.

use chrono::NaiveDate;

use mandi_config::constants::fallback;
use mandi_core::MarketPriceRow;

/// Build placeholder rows for a commodity/city pair.
pub fn synthetic_rows(commodity: &str, city: &str, date: NaiveDate) -> Vec<MarketPriceRow> {
    let base = fallback::base_price_for(commodity);
    let row = |market: String, min_off: f64, max_off: f64, modal_off: f64| MarketPriceRow {
        market,
        commodity: commodity.to_string(),
        min_price: Some(base + min_off),
        max_price: Some(base + max_off),
        modal_price: Some(base + modal_off),
        date: Some(date),
    };

    if city.eq_ignore_ascii_case("lucknow") {
        vec![
            row("Lucknow".to_string(), -40.0, 60.0, 10.0),
            row("Banthara".to_string(), -30.0, 70.0, 20.0),
        ]
    } else {
        let city = title_case(city);
        vec![
            row(format!("{city} - Main Market"), -35.0, 65.0, 15.0),
            row(format!("{city} - Wholesale Market"), -25.0, 75.0, 25.0),
        ]
    }
}

fn title_case(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
