use std::{convert::Infallible, fmt};

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::gate::Gate;

/// Claims
///
/// Payload expected inside a session token when JWT verification is enabled.
/// The token is issued by the storefront API; this layer only checks the
/// signature and the expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the API's identifier for the customer.
    pub sub: String,
    /// Expiration Time (exp).
    pub exp: usize,
    /// Issued At (iat).
    pub iat: usize,
}

/// SessionStatus
///
/// What the gate knows about the visitor. Derived from the session cookie on
/// every request and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Anonymous,
    Authenticated,
}

impl SessionStatus {
    pub fn is_authenticated(self) -> bool {
        self == SessionStatus::Authenticated
    }
}

/// SessionCheck
///
/// How much of the session cookie is inspected.
///
/// `Presence` treats any non-empty cookie as a logged-in visitor. A stale or
/// forged token passes here and has to be rejected by the storefront API.
/// `Jwt` additionally requires an HS256 token signed with `secret` that has
/// not expired; a failing token counts as no cookie at all.
#[derive(Clone, Default, PartialEq, Eq)]
pub enum SessionCheck {
    #[default]
    Presence,
    Jwt { secret: String },
}

impl fmt::Debug for SessionCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionCheck::Presence => f.write_str("Presence"),
            SessionCheck::Jwt { .. } => f.write_str("Jwt { secret: <redacted> }"),
        }
    }
}

impl SessionCheck {
    /// evaluate
    ///
    /// Maps the (possibly absent) cookie value to a session status.
    pub fn evaluate(&self, token: Option<&str>) -> SessionStatus {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return SessionStatus::Anonymous;
        };

        match self {
            SessionCheck::Presence => SessionStatus::Authenticated,
            SessionCheck::Jwt { secret } => {
                let decoding_key = DecodingKey::from_secret(secret.as_bytes());
                let mut validation = Validation::new(Algorithm::HS256);
                validation.validate_exp = true;

                match decode::<Claims>(token, &decoding_key, &validation) {
                    Ok(_) => SessionStatus::Authenticated,
                    Err(e) => {
                        tracing::debug!(error = %e, "session token rejected");
                        SessionStatus::Anonymous
                    }
                }
            }
        }
    }

    pub fn verifies_tokens(&self) -> bool {
        matches!(self, SessionCheck::Jwt { .. })
    }
}

/// session_token
///
/// Looks up the named cookie across all `Cookie` headers. Surrounding quotes
/// are removed and empty values are skipped, so the first non-empty pair with
/// that name wins.
pub fn session_token<'a>(headers: &'a HeaderMap, cookie_name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .filter(|(name, _)| name.trim() == cookie_name)
        .map(|(_, value)| value.trim().trim_matches('"'))
        .find(|value| !value.is_empty())
}

/// SessionStatus Extractor Implementation
///
/// Lets handlers behind the gate ask whether the visitor is logged in, using
/// the same cookie name and check mode the gate itself applies.
impl<S> FromRequestParts<S> for SessionStatus
where
    S: Send + Sync,
    Gate: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let gate = Gate::from_ref(state);
        Ok(gate.session_status(&parts.headers))
    }
}
