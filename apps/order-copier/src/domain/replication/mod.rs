//! Replication Rules
//!
//! - `filter`: which source events are copied
//! - `translator`: how a source event becomes a destination order request

pub mod filter;
pub mod translator;

pub use filter::is_eligible;
pub use translator::{OrderTranslator, SymbolError, SymbolNormalizer, TranslationError};
