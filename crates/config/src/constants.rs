//! Centralized constants for the mandi price agent
//!
//! Single source of truth for scrape protocol identifiers, retry bounds and
//! fallback pricing. Values that vary per deployment belong in
//! [`crate::settings`]; values tied to the external site's markup belong
//! here.

/// Scrape protocol constants for the external price-listing site.
pub mod scrape {
    /// Fixed listing endpoint.
    pub const LISTING_URL: &str = "https://agmarknet.gov.in/SearchCmmMkt.aspx";

    /// Maximum attempts for any retried automation step.
    pub const MAX_RETRY_ATTEMPTS: u32 = 3;

    /// Explicit wait timeout for element/page readiness, in seconds.
    pub const WAIT_TIMEOUT_SECS: u64 = 30;

    /// Settle buffer after the readiness poll reports complete, in
    /// milliseconds. The page keeps mutating the DOM briefly after
    /// `readyState` flips.
    pub const SETTLE_BUFFER_MS: u64 = 2000;

    /// Interval between readiness/presence polls, in milliseconds.
    pub const POLL_INTERVAL_MS: u64 = 250;

    /// Form control ids on the listing page.
    pub const COMMODITY_SELECT: &str = "#ddlCommodity";
    pub const STATE_SELECT: &str = "#ddlState";
    pub const MARKET_SELECT: &str = "#ddlMarket";
    pub const DATE_INPUT: &str = "#txtDate";
    pub const GO_BUTTON: &str = "#btnGo";

    /// Onload interstitial; absence is not an error.
    pub const POPUP_SELECTOR: &str = ".popup-onload .close";

    /// Result tables appear under one of these ids depending on the page
    /// variant being served.
    pub const RESULT_TABLE_IDS: [&str; 3] = ["cphBody_GridPriceData", "DataGrid1", "gvPriceData"];

    /// Placeholder entry in the market selector.
    pub const SELECT_PLACEHOLDER: &str = "--Select--";

    /// The supported region's display name in the state selector.
    pub const REGION_DISPLAY: &str = "Uttar Pradesh";

    /// Markets taken from the top of the selector when no city keyword
    /// matches.
    pub const FALLBACK_MARKET_COUNT: usize = 3;

    /// Result-table row layout: minimum cell count for a data row and the
    /// fixed column offsets read from it.
    pub const MIN_ROW_CELLS: usize = 8;
    pub const MARKET_CELL: usize = 1;
    pub const MIN_PRICE_CELL: usize = 6;
    pub const MAX_PRICE_CELL: usize = 7;
    pub const MODAL_PRICE_CELL: usize = 8;

    /// Repeated header token inside data rows.
    pub const HEADER_TOKEN: &str = "Market";

    /// Date format the listing site expects, e.g. `02-May-2024`.
    pub const EXTERNAL_DATE_FORMAT: &str = "%d-%b-%Y";
}

/// Aggregation defaults.
pub mod aggregate {
    /// Number of most recent rows averaged per market.
    pub const TOP_K_PER_MARKET: usize = 3;
}

/// Synthetic fallback pricing (rupees per quintal).
pub mod fallback {
    /// Reference price for commodities without an entry below.
    pub const DEFAULT_BASE_PRICE: f64 = 2000.0;

    const BASE_PRICES: [(&str, f64); 8] = [
        ("Wheat", 2450.0),
        ("Rice", 2800.0),
        ("Maize", 1950.0),
        ("Potato", 1200.0),
        ("Onion", 1800.0),
        ("Tomato", 2500.0),
        ("Gram", 5500.0),
        ("Arhar", 6200.0),
    ];

    /// Base price for a commodity display name, case-insensitive.
    pub fn base_price_for(commodity: &str) -> f64 {
        BASE_PRICES
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(commodity))
            .map(|(_, price)| *price)
            .unwrap_or(DEFAULT_BASE_PRICE)
    }
}
