//! Alpaca Order Gateway
//!
//! [`OrderGateway`] over the trading REST API. Each order is posted exactly
//! once; failures are mapped to [`SubmissionError`] and never retried.
//!
//! # Status Mapping
//!
//! | HTTP | Error |
//! |---|---|
//! | 401 | `Unauthorized` |
//! | 403, 422 | `Rejected` |
//! | 429 | `RateLimited` |
//! | other non-2xx | `Api` |

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use super::api_types::{AlpacaErrorResponse, AlpacaOrderRequest, AlpacaOrderResponse};
use super::auth::Credentials;
use crate::application::ports::{OrderAck, OrderGateway, SubmissionError};
use crate::domain::order::OrderRequest;

const ORDERS_PATH: &str = "/v2/orders";

/// Destination account order placement.
#[derive(Debug, Clone)]
pub struct AlpacaOrderGateway {
    client: Client,
    credentials: Credentials,
    orders_url: String,
}

impl AlpacaOrderGateway {
    /// Create a gateway for the trading API at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        base_url: &str,
        credentials: Credentials,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            credentials,
            orders_url: format!("{}{ORDERS_PATH}", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl OrderGateway for AlpacaOrderGateway {
    async fn place_order(&self, request: OrderRequest) -> Result<OrderAck, SubmissionError> {
        let body = AlpacaOrderRequest::from(&request);
        tracing::debug!(
            symbol = %body.symbol,
            side = body.side,
            qty = %body.qty,
            order_type = body.order_type,
            "Posting order"
        );

        let response = self
            .client
            .post(&self.orders_url)
            .header("APCA-API-KEY-ID", self.credentials.key())
            .header("APCA-API-SECRET-KEY", self.credentials.secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| SubmissionError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| SubmissionError::Network(e.to_string()))?;

        if status.is_success() {
            let order: AlpacaOrderResponse = serde_json::from_str(&text)
                .map_err(|e| SubmissionError::InvalidResponse(e.to_string()))?;
            return Ok(order.to_order_ack());
        }

        Err(map_error_status(status, &text))
    }
}

fn map_error_status(status: StatusCode, body: &str) -> SubmissionError {
    let message = serde_json::from_str::<AlpacaErrorResponse>(body)
        .map_or_else(|_| body.to_string(), |err| err.message);

    match status {
        StatusCode::UNAUTHORIZED => SubmissionError::Unauthorized,
        StatusCode::FORBIDDEN | StatusCode::UNPROCESSABLE_ENTITY => {
            SubmissionError::Rejected { reason: message }
        }
        StatusCode::TOO_MANY_REQUESTS => SubmissionError::RateLimited,
        _ => SubmissionError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(401, "Unauthorized" ; "unauthorized")]
    #[test_case(403, "Rejected" ; "forbidden")]
    #[test_case(422, "Rejected" ; "unprocessable")]
    #[test_case(429, "RateLimited" ; "rate limited")]
    #[test_case(500, "Api" ; "server error")]
    #[test_case(404, "Api" ; "not found")]
    fn status_mapping(code: u16, expected: &str) {
        let status = StatusCode::from_u16(code).unwrap();
        let err = map_error_status(status, r#"{"code":40310000,"message":"insufficient buying power"}"#);
        let name = match err {
            SubmissionError::Unauthorized => "Unauthorized",
            SubmissionError::Rejected { .. } => "Rejected",
            SubmissionError::RateLimited => "RateLimited",
            SubmissionError::Api { .. } => "Api",
            SubmissionError::Network(_) | SubmissionError::InvalidResponse(_) => "other",
        };
        assert_eq!(name, expected);
    }

    #[test]
    fn rejection_reason_comes_from_body() {
        let err = map_error_status(
            StatusCode::FORBIDDEN,
            r#"{"code":40310000,"message":"insufficient buying power"}"#,
        );
        assert_eq!(
            err,
            SubmissionError::Rejected {
                reason: "insufficient buying power".to_string()
            }
        );
    }

    #[test]
    fn unparseable_body_is_kept_verbatim() {
        let err = map_error_status(StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(
            err,
            SubmissionError::Api {
                status: 502,
                message: "upstream down".to_string()
            }
        );
    }

    #[test]
    fn orders_url_trims_trailing_slash() {
        let gateway = AlpacaOrderGateway::new(
            "https://paper-api.alpaca.markets/",
            Credentials::new("k", "s").unwrap(),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(gateway.orders_url, "https://paper-api.alpaca.markets/v2/orders");
    }
}
