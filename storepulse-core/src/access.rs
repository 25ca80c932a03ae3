//! Role-gated access decisions
//!
//! Before entering a protected view the caller asks the gate whether the
//! current identity qualifies. Authorization failures are navigation
//! outcomes (go back to login), never error values.

use crate::session::Session;
use crate::token::TokenStore;
use crate::types::Role;

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// Navigation may proceed
    Granted,
    /// No token, or the role is not on the allow-list; send the user to
    /// the login view
    RedirectToLogin,
}

impl AccessDecision {
    pub fn is_granted(&self) -> bool {
        matches!(self, AccessDecision::Granted)
    }
}

/// Authorize navigation to a view guarded by `required_roles`.
///
/// An empty allow-list means any authenticated identity passes. The
/// session is refreshed first so the decision reflects the current
/// token, not a cached role from an earlier session.
pub fn authorize<S: TokenStore>(
    session: &mut Session<S>,
    required_roles: &[Role],
) -> AccessDecision {
    if session.token().is_none() {
        tracing::debug!("Access denied: no token");
        return AccessDecision::RedirectToLogin;
    }

    session.refresh();

    if !required_roles.is_empty() {
        let role = session.role();
        if !role.is_some_and(|r| required_roles.contains(&r)) {
            tracing::debug!(
                role = role.map(|r| r.as_str()).unwrap_or("none"),
                required = ?required_roles,
                "Access denied: role not on allow-list"
            );
            return AccessDecision::RedirectToLogin;
        }
    }

    AccessDecision::Granted
}
