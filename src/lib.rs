//! Bounty Ledger - escrowed task bounties with exactly-once payouts
//!
//! An issuer posts a task with an optional escrowed reward, solvers submit
//! propositions, and the issuer selects a winning solver who is paid from
//! escrow.
//!
//! # How it works
//!
//! 1. Issuer creates a bounty, either unfunded or with its value locked
//! 2. Issuer may fund an unfunded bounty once, with exactly its value
//! 3. Solvers (anyone but the issuer) add one proposition each
//! 4. Issuer resolves to a proposing solver, who receives the escrowed value
//! 5. Or issuer closes the bounty, and any escrowed value is refunded
//!
//! # Guarantees
//!
//! - Bounty ids are never reused, even after a bounty is closed or solved
//! - SOLVED and CLOSED are terminal
//! - Escrowed value leaves the ledger at most once, and a failed transfer
//!   leaves the bounty exactly as it was

pub mod config;
pub mod custody;
pub mod error;
pub mod events;
pub mod ledger;
pub mod script;
pub mod types;

pub use config::Config;
pub use custody::{Custody, InMemoryCustody};
pub use error::{CustodyError, ErrorKind, LedgerError, LedgerResult};
pub use events::{EventRecord, LedgerEvent};
pub use ledger::BountyLedger;
pub use script::{ReplayReport, Script};
pub use types::{AccountId, Amount, Bounty, BountyState, Proposition};
