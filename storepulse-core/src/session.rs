//! Session claims lifecycle
//!
//! The session owns the token store and a snapshot of the claims decoded
//! from the current token. Claims are recomputed wholesale after every
//! credential-changing event (login, logout, explicit refresh); a token
//! that fails to decode degrades to empty claims rather than an error.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Deserialize;

use crate::api::AuthBackend;
use crate::error::Result;
use crate::token::TokenStore;
use crate::types::{Role, SessionClaims};

/// Claim fields carried in the token payload
#[derive(Deserialize)]
struct TokenPayload {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    role: Option<String>,
}

/// Decodes the payload segment of a JWT into session claims.
///
/// The signature is never verified here; the token is opaque proof for
/// the backend, and the claims are only display and gating hints.
pub fn decode_claims(token: &str) -> Option<SessionClaims> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return None;
    }

    let decoded = URL_SAFE_NO_PAD.decode(parts[1]).ok()?;
    let payload: TokenPayload = serde_json::from_slice(&decoded).ok()?;

    Some(SessionClaims {
        username: payload.username,
        email: payload.email,
        role_name: payload.role,
    })
}

/// The current user's session: token store plus decoded claims.
pub struct Session<S: TokenStore> {
    store: S,
    claims: SessionClaims,
}

impl<S: TokenStore> Session<S> {
    /// Create a session over a token store and load claims from any
    /// token already present.
    pub fn new(store: S) -> Self {
        let mut session = Self {
            store,
            claims: SessionClaims::default(),
        };
        session.refresh();
        session
    }

    /// Recompute claims from the current token.
    ///
    /// An absent token or a token whose payload does not decode yields
    /// empty claims; decoding failure is a named outcome, never an error.
    pub fn refresh(&mut self) {
        self.claims = match self.store.get() {
            Some(token) => match decode_claims(&token) {
                Some(claims) => claims,
                None => {
                    tracing::debug!("Stored token did not decode; treating as no session");
                    SessionClaims::default()
                }
            },
            None => SessionClaims::default(),
        };
    }

    /// The last-computed claims snapshot. Does not refresh; callers must
    /// call [`Session::refresh`] after any credential-changing event.
    pub fn claims(&self) -> &SessionClaims {
        &self.claims
    }

    /// The parsed role from the current claims snapshot.
    pub fn role(&self) -> Option<Role> {
        self.claims.role()
    }

    /// The raw token, if one is stored.
    pub fn token(&self) -> Option<String> {
        self.store.get()
    }

    /// Store a freshly issued token in the chosen durability tier and
    /// refresh claims from it.
    pub fn store_token(&mut self, token: &str, durable: bool) -> Result<()> {
        self.store.set(token, durable)?;
        self.refresh();
        Ok(())
    }

    /// Drop both token tiers and null the claims locally.
    pub fn logout(&mut self) -> Result<()> {
        self.store.clear()?;
        self.claims = SessionClaims::default();
        tracing::info!("Logged out");
        Ok(())
    }
}

/// Outcome of a login attempt.
///
/// Rejections carry the short user-facing message; transport faults are
/// the caller's `Err` path.
#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    /// Token stored and claims refreshed
    LoggedIn,
    /// Credentials rejected by the backend
    Rejected { message: String },
}

/// Exchange credentials for a token and store it.
///
/// The `remember` flag selects the durable tier, mirroring a remember-me
/// checkbox. Rejected credentials surface as [`LoginOutcome::Rejected`]
/// with the backend's message (or a fixed fallback).
pub async fn login<S, A>(
    backend: &A,
    session: &mut Session<S>,
    email: &str,
    password: &str,
    remember: bool,
) -> Result<LoginOutcome>
where
    S: TokenStore,
    A: AuthBackend + ?Sized,
{
    let response = backend.login(email, password).await?;

    match response.access_token {
        Some(token) if response.success => {
            session.store_token(&token, remember)?;
            tracing::info!(remember, "Login accepted");
            Ok(LoginOutcome::LoggedIn)
        }
        _ => {
            let message = response
                .message
                .unwrap_or_else(|| "Invalid email or password".to_string());
            tracing::info!(%message, "Login rejected");
            Ok(LoginOutcome::Rejected { message })
        }
    }
}
