//! Result-table parsing
//!
//! The listing site serves its price grid under one of several known table
//! ids depending on the page variant. Cells are read by fixed column
//! offset; a row is accepted only if it is wide enough and its identifying
//! cell is non-empty and not a repeated header token.

use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};

use mandi_config::constants::scrape;
use mandi_core::MarketPriceRow;

/// Parse one market's result page into price rows.
///
/// Returns an empty vector when no known table is present; the caller
/// treats that as "no data for this market", not a fault.
pub fn parse_price_table(
    html: &str,
    market: &str,
    commodity: &str,
    date: NaiveDate,
) -> Vec<MarketPriceRow> {
    let document = Html::parse_document(html);

    for table_id in scrape::RESULT_TABLE_IDS {
        let Ok(selector) = Selector::parse(&format!("table#{table_id}")) else {
            continue;
        };
        if let Some(table) = document.select(&selector).next() {
            let rows = rows_from_table(table, market, commodity, date);
            tracing::debug!(table_id, market, rows = rows.len(), "Parsed result table");
            return rows;
        }
    }

    tracing::debug!(market, "No known result table in page");
    Vec::new()
}

fn rows_from_table(
    table: ElementRef<'_>,
    market: &str,
    commodity: &str,
    date: NaiveDate,
) -> Vec<MarketPriceRow> {
    let row_selector = Selector::parse("tr").unwrap();
    let cell_selector = Selector::parse("td, th").unwrap();

    let mut rows = Vec::new();
    for row in table.select(&row_selector).skip(1) {
        let cells: Vec<String> = row
            .select(&cell_selector)
            .map(|cell| cell.text().collect::<String>().trim().to_string())
            .collect();

        if cells.len() < scrape::MIN_ROW_CELLS {
            continue;
        }
        let identifier = &cells[scrape::MARKET_CELL];
        if identifier.is_empty() || identifier == scrape::HEADER_TOKEN {
            continue;
        }

        rows.push(MarketPriceRow {
            market: market.to_string(),
            commodity: commodity.to_string(),
            min_price: cells.get(scrape::MIN_PRICE_CELL).and_then(|c| parse_price(c)),
            max_price: cells.get(scrape::MAX_PRICE_CELL).and_then(|c| parse_price(c)),
            modal_price: cells
                .get(scrape::MODAL_PRICE_CELL)
                .and_then(|c| parse_price(c)),
            date: Some(date),
        });
    }
    rows
}

/// Parse a price cell; thousands separators are stripped, anything else
/// non-numeric yields `None`.
fn parse_price(cell: &str) -> Option<f64> {
    let cleaned = cell.replace(',', "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    fn page(table_id: &str, body_rows: &str) -> String {
        format!(
            "<html><body><table id=\"{table_id}\">\
             <tr><th>Sl</th><th>Market</th><th>Commodity</th><th>Variety</th>\
             <th>Grade</th><th>Arrivals</th><th>Min Price</th><th>Max Price</th>\
             <th>Modal Price</th></tr>{body_rows}</table></body></html>"
        )
    }

    const DATA_ROW: &str = "<tr><td>1</td><td>Agra</td><td>Wheat</td><td>Dara</td>\
         <td>FAQ</td><td>120</td><td>2,400</td><td>2,520</td><td>2,450</td></tr>";

    #[test]
    fn test_parses_rows_from_any_known_table_id() {
        for table_id in scrape::RESULT_TABLE_IDS {
            let html = page(table_id, DATA_ROW);
            let rows = parse_price_table(&html, "Agra", "Wheat", date());
            assert_eq!(rows.len(), 1, "table id {table_id}");
            assert_eq!(rows[0].min_price, Some(2400.0));
            assert_eq!(rows[0].max_price, Some(2520.0));
            assert_eq!(rows[0].modal_price, Some(2450.0));
            assert_eq!(rows[0].market, "Agra");
            assert_eq!(rows[0].date, Some(date()));
        }
    }

    #[test]
    fn test_unknown_table_id_yields_no_rows() {
        let html = page("someOtherGrid", DATA_ROW);
        assert!(parse_price_table(&html, "Agra", "Wheat", date()).is_empty());
    }

    #[test]
    fn test_skips_header_and_narrow_rows() {
        let body = "<tr><td>1</td><td>Market</td><td>Wheat</td><td>x</td><td>x</td>\
             <td>x</td><td>100</td><td>200</td><td>150</td></tr>\
             <tr><td>no data found</td></tr>";
        let html = page("DataGrid1", body);
        assert!(parse_price_table(&html, "Agra", "Wheat", date()).is_empty());
    }

    #[test]
    fn test_non_numeric_prices_become_none() {
        let body = "<tr><td>1</td><td>Agra</td><td>Wheat</td><td>Dara</td>\
             <td>FAQ</td><td>120</td><td>NR</td><td>-</td><td></td></tr>";
        let html = page("gvPriceData", body);
        let rows = parse_price_table(&html, "Agra", "Wheat", date());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].min_price, None);
        assert_eq!(rows[0].max_price, None);
        assert_eq!(rows[0].modal_price, None);
    }

    #[test]
    fn test_row_without_modal_cell_keeps_other_prices() {
        // Minimum-width row: modal column missing entirely.
        let body = "<tr><td>1</td><td>Agra</td><td>Wheat</td><td>Dara</td>\
             <td>FAQ</td><td>120</td><td>2400</td><td>2520</td></tr>";
        let html = page("DataGrid1", body);
        let rows = parse_price_table(&html, "Agra", "Wheat", date());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].min_price, Some(2400.0));
        assert_eq!(rows[0].modal_price, None);
    }
}
