//! Ledger and custody errors

use serde::Serialize;
use thiserror::Error;

use crate::types::{AccountId, Amount, BountyState};

/// Failures reported by a [`Custody`](crate::custody::Custody) implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CustodyError {
    #[error("account {account} has {available}, needs {required}")]
    InsufficientFunds {
        account: AccountId,
        available: Amount,
        required: Amount,
    },

    #[error("escrow holds {held}, cannot release {requested}")]
    InsufficientEscrow { held: Amount, requested: Amount },

    #[error("account {0} is frozen")]
    AccountFrozen(AccountId),

    #[error("balance overflow crediting {0}")]
    Overflow(AccountId),
}

/// Broad category of a [`LedgerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    InvalidState,
    Unauthorized,
    Funding,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("bounty {0} not found")]
    BountyNotFound(String),

    #[error("bounty {0} already exists")]
    BountyAlreadyExists(String),

    #[error("bounty {0} is already funded")]
    BountyAlreadyFunded(String),

    #[error("{solver} already has a proposition on bounty {id}")]
    AlreadyParticipant { id: String, solver: AccountId },

    #[error("bounty {id} is {state}")]
    BountyAlreadyClosed { id: String, state: BountyState },

    #[error("{caller} is not the issuer of bounty {id}")]
    NotBountyIssuer { id: String, caller: AccountId },

    #[error("issuer {issuer} cannot propose on own bounty {id}")]
    BountyIssuer { id: String, issuer: AccountId },

    #[error("{solver} has no proposition on bounty {id}")]
    NotParticipant { id: String, solver: AccountId },

    #[error("attached {attached} does not match bounty value {value}")]
    InsufficientBalance { attached: Amount, value: Amount },

    #[error("bounty {id} needs exactly {value}, got {attached}")]
    FundsMismatch {
        id: String,
        value: Amount,
        attached: Amount,
    },

    #[error("bounty {0} has no locked value")]
    BountyNotFunded(String),

    #[error("transfer failed: {0}")]
    Transfer(#[from] CustodyError),
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::BountyNotFound(_) => ErrorKind::NotFound,
            LedgerError::BountyAlreadyExists(_)
            | LedgerError::BountyAlreadyFunded(_)
            | LedgerError::AlreadyParticipant { .. } => ErrorKind::Conflict,
            LedgerError::BountyAlreadyClosed { .. } => ErrorKind::InvalidState,
            LedgerError::NotBountyIssuer { .. }
            | LedgerError::BountyIssuer { .. }
            | LedgerError::NotParticipant { .. } => ErrorKind::Unauthorized,
            LedgerError::InsufficientBalance { .. }
            | LedgerError::FundsMismatch { .. }
            | LedgerError::BountyNotFunded(_)
            | LedgerError::Transfer(_) => ErrorKind::Funding,
        }
    }

    /// Stable variant name, used to match expected failures in replay scripts.
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::BountyNotFound(_) => "BountyNotFound",
            LedgerError::BountyAlreadyExists(_) => "BountyAlreadyExists",
            LedgerError::BountyAlreadyFunded(_) => "BountyAlreadyFunded",
            LedgerError::AlreadyParticipant { .. } => "AlreadyParticipant",
            LedgerError::BountyAlreadyClosed { .. } => "BountyAlreadyClosed",
            LedgerError::NotBountyIssuer { .. } => "NotBountyIssuer",
            LedgerError::BountyIssuer { .. } => "BountyIssuer",
            LedgerError::NotParticipant { .. } => "NotParticipant",
            LedgerError::InsufficientBalance { .. } => "InsufficientBalance",
            LedgerError::FundsMismatch { .. } => "FundsMismatch",
            LedgerError::BountyNotFunded(_) => "BountyNotFunded",
            LedgerError::Transfer(_) => "Transfer",
        }
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
