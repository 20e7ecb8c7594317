//! Mandi price agent chat loop
//!
//! Wires the dialogue state machine, reference vocabulary and acquisition
//! engine into an interactive terminal session: free-text turns fill the
//! query slots, and a completed slot set triggers a live price fetch with
//! per-market summaries printed back.

mod classifier;

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use mandi_config::constants::aggregate::TOP_K_PER_MARKET;
use mandi_config::{load_settings, Settings, Vocabulary};
use mandi_core::{
    ConversationStore, InMemoryConversationStore, IntentClassifier, PriceQuery, PriceSource,
    SlotSet, TurnOutcome,
};
use mandi_dialogue::{to_external_date_format, SlotFiller};
use mandi_scraper::{summarize, AcquisitionEngine};

use classifier::KeywordIntentClassifier;

/// Single-user terminal session key in the conversation store.
const SESSION_ID: &str = "terminal";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = std::env::var("MANDI_AGENT_ENV").ok();
    let settings = match load_settings(env.as_deref()) {
        Ok(settings) => settings,
        Err(err) => {
            // Tracing not yet initialized, use eprintln for early logging
            eprintln!("Warning: failed to load config: {err}. Using defaults.");
            Settings::default()
        }
    };

    init_tracing(&settings);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = ?settings.environment,
        "Starting mandi agent"
    );

    let vocabulary = Arc::new(Vocabulary::load(&settings.vocabulary));
    if vocabulary.is_empty() {
        tracing::warn!("Reference vocabularies are empty; price queries cannot be resolved");
    }

    let filler = SlotFiller::new(vocabulary.clone());
    let intent_gate = KeywordIntentClassifier;
    let engine = AcquisitionEngine::new(settings.scraper.clone());
    let store = InMemoryConversationStore::new();

    println!("Welcome to the mandi price agent.");
    println!("Ask about commodity prices in Uttar Pradesh. Type 'exit' to quit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl+C, shutting down");
                break;
            }
        };
        let Some(line) = line else { break };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(input.to_lowercase().as_str(), "exit" | "quit" | "bye") {
            println!("Goodbye!");
            break;
        }

        let mut state = store.get(SESSION_ID).unwrap_or_default();

        // Gate only fresh conversations; once a price enquiry is underway
        // every turn feeds the slot filler.
        if state.raw_turns.is_empty() {
            let classification = intent_gate.classify(input);
            tracing::debug!(
                label = %classification.label,
                confidence = classification.confidence,
                "Classified opening turn"
            );
            if !classification.is_price_enquiry() {
                println!("I specialize in price enquiries. Please ask about commodity prices.");
                continue;
            }
        }

        match filler.handle_turn(input, &mut state) {
            TurnOutcome::Ask { prompt } => {
                store.put(SESSION_ID, state);
                println!("{prompt}");
            }
            TurnOutcome::Complete { slots } => {
                // The state is logically dead once complete; discard it so
                // the next turn starts a fresh conversation.
                store.delete(SESSION_ID);
                run_price_query(&engine, &vocabulary, &slots).await;
                println!("\nWhat else can I help you with?");
            }
        }
    }

    Ok(())
}

/// Resolve codes for the completed slot set, fetch prices and print the
/// per-market summary.
async fn run_price_query(engine: &AcquisitionEngine, vocabulary: &Vocabulary, slots: &SlotSet) {
    let (Some(commodity), Some(area), Some(time)) = (
        slots.commodity.as_deref(),
        slots.area.as_deref(),
        slots.time.as_deref(),
    ) else {
        // Completion guarantees all three; guard for the impossible anyway.
        println!("Something went wrong collecting your query, please start over.");
        return;
    };

    let Some(external_date) = to_external_date_format(time) else {
        println!("Sorry, I couldn't understand the date '{time}'. Please try again.");
        return;
    };
    let Ok(date) = time.parse::<chrono::NaiveDate>() else {
        println!("Sorry, I couldn't understand the date '{time}'. Please try again.");
        return;
    };

    let Some(commodity_code) = vocabulary.resolve_commodity_code(commodity) else {
        println!("Sorry, I couldn't find a commodity code for '{commodity}'.");
        return;
    };
    let Some(district_code) = vocabulary.resolve_area_code(area) else {
        println!("Sorry, I couldn't find a district code for '{area}'.");
        return;
    };

    println!(
        "Fetching {commodity} (code {commodity_code}) prices for {area} \
         (code {district_code}) on {external_date}..."
    );

    let query = PriceQuery {
        date,
        region_code: "UP".to_string(),
        district_code: district_code.to_string(),
        commodity_code: commodity_code.to_string(),
    };
    let rows = match engine.acquire_prices(&query).await {
        Ok(rows) => rows,
        Err(err) => {
            tracing::error!(%err, "Price acquisition failed");
            println!("Sorry, I couldn't fetch prices for that query: {err}");
            return;
        }
    };

    let summaries = summarize(&rows, TOP_K_PER_MARKET);
    println!("Market prices (averaged over the {TOP_K_PER_MARKET} most recent entries per market):");
    for summary in &summaries {
        println!(
            "  {}: modal {}/q | min {} | max {} | {}",
            summary.market,
            format_price(summary.avg_modal),
            format_price(summary.avg_min),
            format_price(summary.avg_max),
            summary
                .latest_date
                .map(|d| d.format("%d-%b-%Y").to_string())
                .unwrap_or_else(|| "n/a".to_string()),
        );
    }
}

fn format_price(value: Option<i64>) -> String {
    match value {
        Some(price) => format!("₹{price}"),
        None => "n/a".to_string(),
    }
}

/// Initialize tracing from the observability settings.
fn init_tracing(settings: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| settings.observability.log_level.clone().into());

    let fmt_layer = if settings.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
