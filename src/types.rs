//! Ledger data model

use std::fmt;

use serde::{Deserialize, Serialize};

/// Amount of value held, paid or refunded by the ledger.
pub type Amount = u64;

/// Opaque identity of an issuer or solver.
///
/// Identity resolution happens before a call reaches the ledger, so the
/// ledger only compares identities for equality.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for AccountId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BountyState {
    Open,
    Closed,
    Solved,
}

impl BountyState {
    /// SOLVED and CLOSED have no outgoing transitions.
    pub fn is_terminal(self) -> bool {
        !matches!(self, BountyState::Open)
    }
}

impl fmt::Display for BountyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BountyState::Open => "OPEN",
            BountyState::Closed => "CLOSED",
            BountyState::Solved => "SOLVED",
        };
        f.pad(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounty {
    pub id: String,
    pub issuer: AccountId,
    pub value: Amount,
    /// True while `value` is held in escrow for this bounty.
    pub value_locked: bool,
    pub state: BountyState,
    pub metadata: String,
}

/// A solver's candidacy for a bounty, kept as an audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposition {
    pub solver: AccountId,
    pub metadata: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!BountyState::Open.is_terminal());
        assert!(BountyState::Closed.is_terminal());
        assert!(BountyState::Solved.is_terminal());
    }

    #[test]
    fn test_state_serializes_uppercase() {
        let json = serde_json::to_string(&BountyState::Solved).unwrap();
        assert_eq!(json, "\"SOLVED\"");
        let state: BountyState = serde_json::from_str("\"CLOSED\"").unwrap();
        assert_eq!(state, BountyState::Closed);
    }

    #[test]
    fn test_account_id_is_transparent() {
        let id = AccountId::from("alice");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"alice\"");
        assert_eq!(id.to_string(), "alice");
    }
}
