//! Event eligibility.

use crate::domain::order::{OrderEvent, OrderStatus};

/// Whether a source event should be replicated.
///
/// True only for `New` and `PartiallyFilled`. Every partial fill of the same
/// source order is eligible on its own, so one order that fills in several
/// increments is copied several times.
#[must_use]
pub fn is_eligible(event: &OrderEvent) -> bool {
    matches!(event.status, OrderStatus::New | OrderStatus::PartiallyFilled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use test_case::test_case;

    fn event_with_status(status: &str) -> OrderEvent {
        OrderEvent {
            order_id: "src-1".to_string(),
            symbol: "AAPL".to_string(),
            side: "buy".to_string(),
            quantity: Some(Decimal::ONE),
            price: None,
            stop_price: None,
            order_type: "market".to_string(),
            time_in_force: None,
            status: OrderStatus::from_token(status),
        }
    }

    #[test_case("new", true ; "new")]
    #[test_case("NEW", true ; "new uppercase")]
    #[test_case("partially_filled", true ; "partially filled")]
    #[test_case("PARTIALLY_FILLED", true ; "partially filled uppercase")]
    #[test_case("filled", false ; "filled")]
    #[test_case("canceled", false ; "canceled")]
    #[test_case("rejected", false ; "rejected")]
    #[test_case("expired", false ; "expired")]
    #[test_case("pending_new", false ; "pending new")]
    #[test_case("done_for_day", false ; "done for day")]
    #[test_case("", false ; "empty")]
    fn eligibility_by_status(status: &str, expected: bool) {
        assert_eq!(is_eligible(&event_with_status(status)), expected);
    }
}
