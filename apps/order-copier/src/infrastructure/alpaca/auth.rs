//! Trade Updates Authentication
//!
//! Alpaca terminates trading stream connections that do not authenticate
//! within 10 seconds.
//!
//! # Authentication Flow
//!
//! 1. Connect to the trading stream endpoint
//! 2. Send `{"action":"authenticate","data":{"key_id":"...","secret_key":"..."}}`
//! 3. Receive `{"stream":"authorization","data":{"status":"authorized",...}}`
//! 4. Send `{"action":"listen","data":{"streams":["trade_updates"]}}`
//!
//! # Error Codes
//!
//! - 401: Not authenticated
//! - 402: Authentication failed (invalid credentials)
//! - 403: Already authenticated
//! - 404: Authentication timeout (>10 seconds)
//! - 406: Connection limit exceeded

use std::time::Duration;

use thiserror::Error;

use super::messages::{AuthorizationMessage, ErrorMessage, ListenRequest, TradeAuthRequest};

/// Maximum time allowed for authentication after connection.
pub const AUTH_TIMEOUT: Duration = Duration::from_secs(10);

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during authentication.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Not authenticated (must authenticate before listening).
    #[error("not authenticated: must authenticate before making requests")]
    NotAuthenticated,

    /// Authentication failed (invalid credentials).
    #[error("authentication failed: invalid API key or secret")]
    InvalidCredentials,

    /// Already authenticated.
    #[error("already authenticated: connection is already authenticated")]
    AlreadyAuthenticated,

    /// Authentication took longer than 10 seconds.
    #[error("authentication timeout: must authenticate within 10 seconds")]
    Timeout,

    /// Connection limit exceeded.
    #[error("connection limit exceeded: too many concurrent connections")]
    ConnectionLimitExceeded,

    /// Empty key or secret.
    #[error("invalid credentials: {0}")]
    EmptyCredential(&'static str),

    /// Unexpected error from server.
    #[error("server error ({code}): {message}")]
    ServerError {
        /// Error code from server
        code: i32,
        /// Error message from server
        message: String,
    },
}

impl From<&ErrorMessage> for AuthError {
    fn from(err: &ErrorMessage) -> Self {
        match err.code {
            401 => Self::NotAuthenticated,
            402 => Self::InvalidCredentials,
            403 => Self::AlreadyAuthenticated,
            404 => Self::Timeout,
            406 => Self::ConnectionLimitExceeded,
            code => Self::ServerError {
                code,
                message: err.msg.clone(),
            },
        }
    }
}

// =============================================================================
// Authentication State
// =============================================================================

/// Current state of authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthState {
    /// Not connected, or connection closed.
    #[default]
    Disconnected,

    /// Authentication request sent, awaiting response.
    Authenticating,

    /// Successfully authenticated.
    Authenticated,

    /// Authentication refused.
    Failed,
}

impl AuthState {
    /// Check if currently authenticated.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated)
    }
}

// =============================================================================
// Credentials
// =============================================================================

/// Alpaca API credentials for one account.
///
/// `Debug` and `Display` never print the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    key: String,
    secret: String,
}

impl Credentials {
    /// Create new credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if either key or secret is empty.
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Result<Self, AuthError> {
        let key = key.into();
        let secret = secret.into();

        if key.is_empty() {
            return Err(AuthError::EmptyCredential("API key cannot be empty"));
        }
        if secret.is_empty() {
            return Err(AuthError::EmptyCredential("API secret cannot be empty"));
        }

        Ok(Self { key, secret })
    }

    /// Get the API key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Get the API secret.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Create an authentication request for the trade updates stream.
    #[must_use]
    pub fn to_trade_updates_auth(&self) -> TradeAuthRequest {
        TradeAuthRequest::new(self.key.clone(), self.secret.clone())
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("key", &self.key)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl std::fmt::Display for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Credentials(key={})", self.key)
    }
}

// =============================================================================
// Authentication Handler
// =============================================================================

/// Authentication state machine for the trade updates stream.
#[derive(Debug)]
pub struct AuthHandler {
    credentials: Credentials,
    state: AuthState,
}

impl AuthHandler {
    /// Create a new authentication handler.
    #[must_use]
    pub const fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            state: AuthState::Disconnected,
        }
    }

    /// Get the current authentication state.
    #[must_use]
    pub const fn state(&self) -> AuthState {
        self.state
    }

    /// Check if currently authenticated.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.state.is_authenticated()
    }

    /// Create the authentication request and move to `Authenticating`.
    #[must_use]
    pub fn create_auth_request(&mut self) -> TradeAuthRequest {
        self.state = AuthState::Authenticating;
        self.credentials.to_trade_updates_auth()
    }

    /// Process an authorization response.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if authorization was refused.
    pub fn on_authorization(&mut self, msg: &AuthorizationMessage) -> Result<(), AuthError> {
        if msg.is_authorized() {
            self.state = AuthState::Authenticated;
            Ok(())
        } else {
            self.state = AuthState::Failed;
            Err(AuthError::InvalidCredentials)
        }
    }

    /// Process an error message received while authenticating.
    pub fn on_error(&mut self, msg: &ErrorMessage) -> AuthError {
        self.state = AuthState::Failed;
        AuthError::from(msg)
    }

    /// Reset to disconnected state after the connection closes.
    pub const fn reset(&mut self) {
        self.state = AuthState::Disconnected;
    }

    /// Create the `listen` request.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotAuthenticated` before authorization succeeded.
    pub fn create_listen_request(&self) -> Result<ListenRequest, AuthError> {
        if self.is_authenticated() {
            Ok(ListenRequest::trade_updates())
        } else {
            Err(AuthError::NotAuthenticated)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::alpaca::messages::AuthorizationData;
    use test_case::test_case;

    fn authorization(status: &str) -> AuthorizationMessage {
        AuthorizationMessage {
            stream: "authorization".to_string(),
            data: AuthorizationData {
                status: status.to_string(),
                action: "authenticate".to_string(),
            },
        }
    }

    #[test]
    fn credentials_reject_empty_parts() {
        assert!(Credentials::new("", "secret").is_err());
        assert!(Credentials::new("key", "").is_err());
        assert!(Credentials::new("key", "secret").is_ok());
    }

    #[test]
    fn credentials_debug_redacts_secret() {
        let creds = Credentials::new("my_key", "super_secret").unwrap();
        let debug = format!("{creds:?}");
        assert!(debug.contains("my_key"));
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("super_secret"));
        assert!(!creds.to_string().contains("super_secret"));
    }

    #[test]
    fn handler_authorized_flow() {
        let mut handler = AuthHandler::new(Credentials::new("key", "secret").unwrap());
        assert_eq!(handler.state(), AuthState::Disconnected);
        assert_eq!(
            handler.create_listen_request().unwrap_err(),
            AuthError::NotAuthenticated
        );

        let request = handler.create_auth_request();
        assert_eq!(request.action, "authenticate");
        assert_eq!(request.data.key_id, "key");
        assert_eq!(handler.state(), AuthState::Authenticating);

        handler.on_authorization(&authorization("authorized")).unwrap();
        assert!(handler.is_authenticated());
        assert_eq!(handler.create_listen_request().unwrap().action, "listen");

        handler.reset();
        assert_eq!(handler.state(), AuthState::Disconnected);
    }

    #[test]
    fn handler_unauthorized_flow() {
        let mut handler = AuthHandler::new(Credentials::new("key", "secret").unwrap());
        let _ = handler.create_auth_request();

        let err = handler
            .on_authorization(&authorization("unauthorized"))
            .unwrap_err();
        assert_eq!(err, AuthError::InvalidCredentials);
        assert_eq!(handler.state(), AuthState::Failed);
    }

    #[test_case(401, AuthError::NotAuthenticated ; "not authenticated")]
    #[test_case(402, AuthError::InvalidCredentials ; "auth failed")]
    #[test_case(403, AuthError::AlreadyAuthenticated ; "already authenticated")]
    #[test_case(404, AuthError::Timeout ; "timeout")]
    #[test_case(406, AuthError::ConnectionLimitExceeded ; "connection limit")]
    fn auth_error_from_code(code: i32, expected: AuthError) {
        let msg = ErrorMessage {
            msg_type: "error".to_string(),
            code,
            msg: "test".to_string(),
        };
        let mut handler = AuthHandler::new(Credentials::new("key", "secret").unwrap());
        assert_eq!(handler.on_error(&msg), expected);
        assert_eq!(handler.state(), AuthState::Failed);
    }

    #[test]
    fn unknown_code_keeps_server_message() {
        let msg = ErrorMessage {
            msg_type: "error".to_string(),
            code: 500,
            msg: "internal error".to_string(),
        };
        assert_eq!(
            AuthError::from(&msg),
            AuthError::ServerError {
                code: 500,
                message: "internal error".to_string(),
            }
        );
    }
}
