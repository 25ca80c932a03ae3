//! Core domain types for storepulse
//!
//! These types model the client side of the retail analytics console:
//! the identity decoded from a bearer token, the coarse roles that gate
//! features, and the conversation history produced by the query dispatcher.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Token** | Opaque bearer string proving identity to the backend |
//! | **Claims** | Identity attributes decoded from the token payload |
//! | **Role** | Coarse authorization category gating feature visibility |
//! | **Turn** | One question/response pair in the dispatcher history |

use serde::{Deserialize, Serialize};

// ============================================
// Role
// ============================================

/// Coarse authorization roles the console gates on.
///
/// The claim string is an open set on the wire; anything that does not
/// parse into one of these variants is treated as a guest (the most
/// restrictive behavior). The raw string is kept on
/// [`SessionClaims::role_name`] so unknown roles still display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Finance,
    SupplierManagement,
    Sales,
}

impl Role {
    /// Parse a role claim string; unknown strings yield None (guest).
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "Finance" => Some(Role::Finance),
            "Supplier Management" => Some(Role::SupplierManagement),
            "Sales" => Some(Role::Sales),
            _ => None,
        }
    }

    /// Returns the claim string for this role
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Finance => "Finance",
            Role::SupplierManagement => "Supplier Management",
            Role::Sales => "Sales",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================
// Session claims
// ============================================

/// Identity attributes decoded from the current token.
///
/// All fields are None when there is no token or the token payload did
/// not decode. Claims are recomputed wholesale on every refresh, never
/// updated incrementally.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Display name from the token payload
    pub username: Option<String>,
    /// Email from the token payload
    pub email: Option<String>,
    /// Raw role claim string (kept even when it is not a known [`Role`])
    pub role_name: Option<String>,
}

impl SessionClaims {
    /// The parsed role, or None for guests and unknown role strings.
    pub fn role(&self) -> Option<Role> {
        self.role_name.as_deref().and_then(Role::parse)
    }

    /// True when a token decoded into at least a username or email.
    pub fn is_authenticated(&self) -> bool {
        self.username.is_some() || self.email.is_some()
    }
}

// ============================================
// Conversation
// ============================================

/// One question/response pair in the dispatcher's history.
///
/// Turns are appended in submission order and never reordered or
/// deleted by the dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// The question as displayed (synthesized for subject modes)
    pub question: String,
    /// The formatted reply
    pub response: String,
}

// ============================================
// Request state
// ============================================

/// Single-flight request state shared by the layout model and the
/// recommendation panels.
///
/// A new request is rejected while one is in flight; there is no
/// queueing and no cancellation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RequestState {
    #[default]
    Idle,
    InFlight,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_round_trip() {
        for role in [Role::Finance, Role::SupplierManagement, Role::Sales] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("Admin"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn test_claims_role_unknown_is_guest() {
        let claims = SessionClaims {
            username: Some("amira".to_string()),
            email: Some("amira@example.com".to_string()),
            role_name: Some("Intern".to_string()),
        };
        assert!(claims.is_authenticated());
        assert_eq!(claims.role(), None);
    }

    #[test]
    fn test_default_claims_are_guest() {
        let claims = SessionClaims::default();
        assert!(!claims.is_authenticated());
        assert_eq!(claims.role(), None);
    }
}
