//! Resilient acquisition engine
//!
//! Drives one fresh browser session per query through the listing site's
//! form flow, sweeps every market matching the district's city keywords,
//! and accumulates parsed price rows. A single market's failure never
//! aborts the query; exhaustion of every retry degrades to the synthetic
//! fallback dataset so a syntactically valid query always yields rows.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;

use mandi_config::constants::scrape;
use mandi_config::{city_keywords, commodity_display_name, district_city_name, ScraperSettings};
use mandi_core::{Error, MarketPriceRow, PriceQuery, PriceSource, Result};

use crate::error::ScrapeError;
use crate::fallback::synthetic_rows;
use crate::interact::{interact, wait_for_present, Action};
use crate::parse::parse_price_table;
use crate::retry::{with_backoff, RetryPolicy};
use crate::session::BrowserSession;

/// One entry in the market selector.
#[derive(Debug, Clone, PartialEq, Deserialize)]
struct MarketOption {
    index: usize,
    text: String,
}

pub struct AcquisitionEngine {
    settings: ScraperSettings,
}

impl AcquisitionEngine {
    pub fn new(settings: ScraperSettings) -> Self {
        Self { settings }
    }

    fn policy(&self) -> RetryPolicy {
        RetryPolicy::with_attempts(self.settings.max_attempts)
    }

    fn settle(&self) -> Duration {
        Duration::from_millis(self.settings.settle_ms)
    }

    /// Acquire price rows for `query`, honoring `cancel`.
    ///
    /// The session is torn down on every exit path; on cancellation the
    /// teardown completes before the failure propagates.
    pub async fn acquire(
        &self,
        query: &PriceQuery,
        cancel: CancellationToken,
    ) -> Result<Vec<MarketPriceRow>> {
        let commodity = commodity_display_name(&query.commodity_code).ok_or_else(|| {
            Error::Resolution {
                parameter: "commodity_code",
                value: query.commodity_code.clone(),
            }
        })?;
        let city = district_city_name(&query.district_code).ok_or_else(|| Error::Resolution {
            parameter: "district_code",
            value: query.district_code.clone(),
        })?;
        region_display(&query.region_code).ok_or_else(|| Error::Resolution {
            parameter: "region_code",
            value: query.region_code.clone(),
        })?;
        let external_date = query.date.format(scrape::EXTERNAL_DATE_FORMAT).to_string();

        tracing::info!(commodity, city, date = %external_date, "Starting price acquisition");

        let session = match BrowserSession::launch(&self.settings).await {
            Ok(session) => session,
            Err(fault) => {
                tracing::warn!(%fault, "Browser launch failed, serving synthetic data");
                return Ok(synthetic_rows(commodity, city, query.date));
            }
        };

        let outcome = tokio::select! {
            _ = cancel.cancelled() => Err(ScrapeError::Cancelled),
            outcome = self.sweep_markets(&session, commodity, city, &external_date, query) => outcome,
        };

        // Guaranteed release: the session dies before any result, including
        // cancellation, reaches the caller.
        session.close().await;

        resolve_outcome(outcome, commodity, city, query.date)
    }

    async fn sweep_markets(
        &self,
        session: &BrowserSession,
        commodity: &str,
        city: &str,
        external_date: &str,
        query: &PriceQuery,
    ) -> std::result::Result<Vec<MarketPriceRow>, ScrapeError> {
        let policy = self.policy();

        session.goto(&self.settings.listing_url).await?;
        session.wait_for_ready(self.settle()).await?;
        self.dismiss_interstitial(session).await;

        // The four form sub-steps; exhausting retries on any of them aborts
        // this invocation and the outer handler serves fallback data.
        interact(
            session,
            scrape::COMMODITY_SELECT,
            &Action::SelectByText(commodity.to_string()),
            policy,
        )
        .await?;
        interact(
            session,
            scrape::STATE_SELECT,
            &Action::SelectByText(scrape::REGION_DISPLAY.to_string()),
            policy,
        )
        .await?;
        interact(
            session,
            scrape::DATE_INPUT,
            &Action::ClearAndType(external_date.to_string()),
            policy,
        )
        .await?;
        interact(session, scrape::GO_BUTTON, &Action::Click, policy).await?;
        session.wait_for_ready(self.settle()).await?;

        let options = self.market_options(session).await?;
        let targets = select_targets(&options, city);
        tracing::info!(
            city,
            available = options.len(),
            selected = targets.len(),
            markets = ?targets.iter().map(|o| o.text.as_str()).collect::<Vec<_>>(),
            "Market selection"
        );

        let mut all_rows = Vec::new();
        let mut succeeded = 0usize;
        for option in &targets {
            if let Err(fault) = self.select_market(session, option).await {
                if !fault.is_retryable() {
                    return Err(fault);
                }
                tracing::warn!(market = %option.text, %fault, "Skipping market after exhausted retries");
                continue;
            }

            let html = match session.content().await {
                Ok(html) => html,
                Err(fault) => {
                    tracing::warn!(market = %option.text, %fault, "Failed to read result page");
                    continue;
                }
            };
            let rows = parse_price_table(&html, &option.text, commodity, query.date);
            if rows.is_empty() {
                tracing::debug!(market = %option.text, "No data rows for market");
            } else {
                tracing::info!(market = %option.text, rows = rows.len(), "Collected market rows");
                succeeded += 1;
                all_rows.extend(rows);
            }
        }

        tracing::info!(
            succeeded,
            attempted = targets.len(),
            rows = all_rows.len(),
            "Market sweep finished"
        );
        Ok(all_rows)
    }

    /// Dismiss the onload interstitial if present; absence is not an error.
    async fn dismiss_interstitial(&self, session: &BrowserSession) {
        let script = format!(
            r#"(() => {{
                const el = document.querySelector('{}');
                if (el) {{ el.click(); return true; }}
                return false;
            }})()"#,
            scrape::POPUP_SELECTOR
        );
        match session.evaluate(&script).await {
            Ok(value) if value.as_bool() == Some(true) => {
                tracing::debug!("Dismissed onload interstitial");
            }
            Ok(_) => tracing::debug!("No onload interstitial present"),
            Err(fault) => tracing::debug!(%fault, "Interstitial check failed, continuing"),
        }
    }

    /// Enumerate non-placeholder options in the market selector.
    async fn market_options(
        &self,
        session: &BrowserSession,
    ) -> std::result::Result<Vec<MarketOption>, ScrapeError> {
        wait_for_present(session, scrape::MARKET_SELECT).await?;

        // Serialized in-page: a JSON string always comes back by value.
        let script = format!(
            r#"(() => {{
                const el = document.querySelector('{select}');
                if (!el) return '[]';
                const options = Array.from(el.options || [])
                    .map((opt, index) => ({{ index, text: (opt.text || '').trim() }}))
                    .filter(o => o.text && o.text !== '{placeholder}');
                return JSON.stringify(options);
            }})()"#,
            select = scrape::MARKET_SELECT,
            placeholder = scrape::SELECT_PLACEHOLDER,
        );
        let value = session.evaluate(&script).await?;
        let listing = value.as_str().unwrap_or("[]");
        serde_json::from_str(listing)
            .map_err(|err| ScrapeError::Session(format!("market option listing: {err}")))
    }

    /// Per-market selection protocol. Any step's failure triggers a full
    /// page refresh and a retry of the whole sequence; exhaustion fails
    /// this market only.
    async fn select_market(
        &self,
        session: &BrowserSession,
        option: &MarketOption,
    ) -> std::result::Result<(), ScrapeError> {
        let policy = self.policy();
        let first_attempt = AtomicBool::new(true);
        let operation = format!("select market '{}'", option.text);

        with_backoff(policy, &operation, || async {
            if !first_attempt.swap(false, Ordering::Relaxed) {
                session.refresh().await?;
            }
            session.wait_for_ready(self.settle()).await?;
            interact(
                session,
                scrape::MARKET_SELECT,
                &Action::SelectByIndex(option.index),
                policy,
            )
            .await?;
            interact(session, scrape::GO_BUTTON, &Action::Click, policy).await?;
            self.wait_for_result_table(session).await?;
            session.wait_for_ready(self.settle()).await
        })
        .await
    }

    /// Wait until any of the known result-table ids appears.
    async fn wait_for_result_table(
        &self,
        session: &BrowserSession,
    ) -> std::result::Result<(), ScrapeError> {
        let ids = scrape::RESULT_TABLE_IDS
            .iter()
            .map(|id| format!("'{id}'"))
            .collect::<Vec<_>>()
            .join(",");
        let script = format!("[{ids}].some(id => document.getElementById(id) !== null)");

        let deadline = Instant::now() + session.wait_timeout();
        loop {
            if session.eval_bool(&script).await? {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(ScrapeError::Timeout("result table".to_string()));
            }
            sleep(session.poll_interval()).await;
        }
    }
}

#[async_trait]
impl PriceSource for AcquisitionEngine {
    async fn acquire_prices(&self, query: &PriceQuery) -> Result<Vec<MarketPriceRow>> {
        self.acquire(query, CancellationToken::new()).await
    }
}

/// Filter market options to the district's known city keywords.
///
/// When nothing matches, the first few listed markets stand in for the
/// district rather than returning nothing. That is a heuristic carried over
/// from observed site behavior with no stated confidence bound; treat its
/// output as approximate.
fn select_targets(options: &[MarketOption], city: &str) -> Vec<MarketOption> {
    let keywords = city_keywords(city);
    let matched: Vec<MarketOption> = options
        .iter()
        .filter(|option| {
            let name = option.text.to_lowercase();
            keywords.iter().any(|keyword| name.contains(keyword))
        })
        .cloned()
        .collect();

    if matched.is_empty() {
        options
            .iter()
            .take(scrape::FALLBACK_MARKET_COUNT)
            .cloned()
            .collect()
    } else {
        matched
    }
}

/// Display name for a supported region code.
fn region_display(code: &str) -> Option<&'static str> {
    code.eq_ignore_ascii_case("up").then_some(scrape::REGION_DISPLAY)
}

/// Map a sweep outcome to the caller's result: live rows pass through,
/// cancellation propagates, and everything else degrades to the synthetic
/// dataset so a valid query never yields an empty answer.
fn resolve_outcome(
    outcome: std::result::Result<Vec<MarketPriceRow>, ScrapeError>,
    commodity: &str,
    city: &str,
    date: chrono::NaiveDate,
) -> Result<Vec<MarketPriceRow>> {
    match outcome {
        Ok(rows) if !rows.is_empty() => Ok(rows),
        Ok(_) => {
            tracing::warn!(commodity, city, "No live rows collected, serving synthetic data");
            Ok(synthetic_rows(commodity, city, date))
        }
        Err(ScrapeError::Cancelled) => Err(Error::Cancelled),
        Err(fault) => {
            tracing::warn!(%fault, commodity, city, "Acquisition aborted, serving synthetic data");
            Ok(synthetic_rows(commodity, city, date))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option(index: usize, text: &str) -> MarketOption {
        MarketOption {
            index,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_keyword_filter_includes_aliases() {
        let options = vec![
            option(1, "Agra"),
            option(2, "Fatehpur Sikri"),
            option(3, "Etawah"),
            option(4, "Achhnera (Agra)"),
        ];
        let targets = select_targets(&options, "agra");
        let names: Vec<&str> = targets.iter().map(|o| o.text.as_str()).collect();
        assert_eq!(names, vec!["Agra", "Fatehpur Sikri", "Achhnera (Agra)"]);
    }

    #[test]
    fn test_no_match_falls_back_to_first_three() {
        let options = vec![
            option(1, "Etawah"),
            option(2, "Mainpuri"),
            option(3, "Budaun"),
            option(4, "Sambhal"),
        ];
        let targets = select_targets(&options, "agra");
        assert_eq!(targets.len(), scrape::FALLBACK_MARKET_COUNT);
        assert_eq!(targets[0].text, "Etawah");
    }

    #[test]
    fn test_fallback_with_fewer_options_than_cap() {
        let options = vec![option(1, "Etawah")];
        let targets = select_targets(&options, "agra");
        assert_eq!(targets.len(), 1);
    }

    #[test]
    fn test_unaliased_city_matches_on_own_name() {
        let options = vec![option(1, "Jhansi"), option(2, "Moth (Jhansi)")];
        let targets = select_targets(&options, "jhansi");
        assert_eq!(targets.len(), 2);
    }

    #[test]
    fn test_region_display_resolution() {
        assert_eq!(region_display("UP"), Some("Uttar Pradesh"));
        assert_eq!(region_display("up"), Some("Uttar Pradesh"));
        assert_eq!(region_display("MH"), None);
    }

    #[test]
    fn test_exhausted_acquisition_yields_synthetic_rows() {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let fault = Err(ScrapeError::Timeout("#btnGo".to_string()));

        let rows = resolve_outcome(fault, "Wheat", "agra", date).unwrap();
        assert_eq!(rows, crate::fallback::synthetic_rows("Wheat", "agra", date));
        assert!(!rows.is_empty());
    }

    #[test]
    fn test_empty_sweep_yields_synthetic_rows() {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let rows = resolve_outcome(Ok(Vec::new()), "Rice", "lucknow", date).unwrap();
        assert_eq!(rows, crate::fallback::synthetic_rows("Rice", "lucknow", date));
    }

    #[test]
    fn test_live_rows_pass_through() {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let live = vec![MarketPriceRow {
            market: "Agra".to_string(),
            commodity: "Wheat".to_string(),
            min_price: Some(2400.0),
            max_price: Some(2520.0),
            modal_price: Some(2450.0),
            date: Some(date),
        }];
        let rows = resolve_outcome(Ok(live.clone()), "Wheat", "agra", date).unwrap();
        assert_eq!(rows, live);
    }

    #[test]
    fn test_cancellation_propagates_instead_of_fallback() {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let outcome = resolve_outcome(Err(ScrapeError::Cancelled), "Wheat", "agra", date);
        assert!(matches!(outcome, Err(Error::Cancelled)));
    }
}
