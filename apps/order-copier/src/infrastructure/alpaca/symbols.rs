//! Alpaca symbol normalization.

use crate::domain::order::Symbol;
use crate::domain::replication::{SymbolError, SymbolNormalizer};

/// Upper-cases and validates symbols for the Alpaca trading API.
///
/// Accepts equities (`AAPL`, `BRK.B`), crypto pairs (`BTC/USD`) and option
/// contracts (`AAPL240315C00172500`).
#[derive(Debug, Default, Clone, Copy)]
pub struct AlpacaSymbolNormalizer;

impl SymbolNormalizer for AlpacaSymbolNormalizer {
    fn normalize(&self, raw: &str) -> Result<Symbol, SymbolError> {
        let symbol = raw.trim().to_ascii_uppercase();
        if symbol.is_empty() {
            return Err(SymbolError::Empty);
        }
        if let Some(character) = symbol
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '/')))
        {
            return Err(SymbolError::InvalidCharacter { symbol, character });
        }
        Ok(Symbol::new(symbol))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("aapl", "AAPL" ; "lowercase equity")]
    #[test_case(" MSFT ", "MSFT" ; "padded")]
    #[test_case("brk.b", "BRK.B" ; "class share")]
    #[test_case("btc/usd", "BTC/USD" ; "crypto pair")]
    #[test_case("AAPL240315C00172500", "AAPL240315C00172500" ; "option contract")]
    fn normalizes(raw: &str, expected: &str) {
        assert_eq!(
            AlpacaSymbolNormalizer.normalize(raw).unwrap(),
            Symbol::new(expected)
        );
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(AlpacaSymbolNormalizer.normalize("   "), Err(SymbolError::Empty));
    }

    #[test]
    fn rejects_invalid_character() {
        let err = AlpacaSymbolNormalizer.normalize("BTC-USD").unwrap_err();
        assert_eq!(
            err,
            SymbolError::InvalidCharacter {
                symbol: "BTC-USD".to_string(),
                character: '-',
            }
        );
    }
}
