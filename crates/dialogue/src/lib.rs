//! Slot-filling dialogue for price enquiries
//!
//! A text turn enters through [`SlotFiller::handle_turn`]; missing slots
//! produce a prompt for the caller, and a fully populated slot set is
//! returned as the terminal outcome. Extraction is pattern-based
//! ([`SlotExtractor`]), date expressions are normalized by [`temporal`],
//! and every stored value has already passed vocabulary/date validation.

pub mod extractor;
pub mod filler;
pub mod temporal;

pub use extractor::SlotExtractor;
pub use filler::SlotFiller;
pub use temporal::{normalize_time, to_external_date_format};
