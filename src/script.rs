//! Replay scripts
//!
//! A script is a TOML file listing starting balances and a sequence of
//! ledger calls. Each step may state the outcome it expects, either `"ok"`
//! or an error code such as `"NotBountyIssuer"`:
//!
//! ```toml
//! [[accounts]]
//! id = "alice"
//! balance = 100
//!
//! [[steps]]
//! op = "create_bounty_with_locked_value"
//! caller = "alice"
//! id = "b1"
//! value = 100
//! attached = 100
//! expect = "ok"
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{AccountConfig, Config};
use crate::custody::{AccountBalance, InMemoryCustody};
use crate::error::LedgerError;
use crate::events::EventRecord;
use crate::ledger::BountyLedger;
use crate::types::{AccountId, Amount, Bounty};

pub const EXPECT_OK: &str = "ok";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    #[serde(flatten)]
    pub call: Call,
    #[serde(default)]
    pub expect: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Call {
    CreateBounty {
        caller: AccountId,
        id: String,
        value: Amount,
        #[serde(default)]
        metadata: String,
    },
    CreateBountyWithLockedValue {
        caller: AccountId,
        id: String,
        value: Amount,
        attached: Amount,
        #[serde(default)]
        metadata: String,
    },
    FundBounty {
        caller: AccountId,
        id: String,
        attached: Amount,
    },
    AddProposal {
        caller: AccountId,
        id: String,
        #[serde(default)]
        metadata: String,
    },
    MarkResolved {
        caller: AccountId,
        id: String,
        solver: AccountId,
    },
    CloseBounty {
        caller: AccountId,
        id: String,
    },
    /// Custody-side: make credits to `account` fail.
    Freeze { account: AccountId },
    Thaw { account: AccountId },
    Deposit { account: AccountId, amount: Amount },
}

impl Call {
    pub fn name(&self) -> &'static str {
        match self {
            Call::CreateBounty { .. } => "create_bounty",
            Call::CreateBountyWithLockedValue { .. } => "create_bounty_with_locked_value",
            Call::FundBounty { .. } => "fund_bounty",
            Call::AddProposal { .. } => "add_proposal",
            Call::MarkResolved { .. } => "mark_resolved",
            Call::CloseBounty { .. } => "close_bounty",
            Call::Freeze { .. } => "freeze",
            Call::Thaw { .. } => "thaw",
            Call::Deposit { .. } => "deposit",
        }
    }

    pub fn bounty_id(&self) -> Option<&str> {
        match self {
            Call::CreateBounty { id, .. }
            | Call::CreateBountyWithLockedValue { id, .. }
            | Call::FundBounty { id, .. }
            | Call::AddProposal { id, .. }
            | Call::MarkResolved { id, .. }
            | Call::CloseBounty { id, .. } => Some(id),
            Call::Freeze { .. } | Call::Thaw { .. } | Call::Deposit { .. } => None,
        }
    }

    fn apply(&self, ledger: &BountyLedger) -> Result<(), LedgerError> {
        match self {
            Call::CreateBounty {
                caller,
                id,
                value,
                metadata,
            } => ledger.create_bounty(id, *value, metadata, caller).map(drop),
            Call::CreateBountyWithLockedValue {
                caller,
                id,
                value,
                attached,
                metadata,
            } => ledger
                .create_bounty_with_locked_value(id, *value, metadata, caller, *attached)
                .map(drop),
            Call::FundBounty {
                caller,
                id,
                attached,
            } => ledger.fund_bounty(id, caller, *attached),
            Call::AddProposal {
                caller,
                id,
                metadata,
            } => ledger.add_proposal(id, metadata, caller).map(drop),
            Call::MarkResolved { caller, id, solver } => ledger.mark_resolved(id, solver, caller),
            Call::CloseBounty { caller, id } => ledger.close_bounty(id, caller),
            Call::Freeze { account } => {
                ledger.with_custody_mut(|c| c.freeze(account.clone()));
                Ok(())
            }
            Call::Thaw { account } => {
                ledger.with_custody_mut(|c| c.thaw(account));
                Ok(())
            }
            Call::Deposit { account, amount } => {
                ledger.with_custody_mut(|c| c.deposit(account.clone(), *amount));
                Ok(())
            }
        }
    }
}

/// Result of one replayed step.
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub index: usize,
    pub op: &'static str,
    pub bounty: Option<String>,
    /// `"ok"` or the error code
    pub outcome: String,
    pub error: Option<String>,
    pub expected: Option<String>,
    pub matched: bool,
}

impl StepOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub steps: Vec<StepOutcome>,
    pub bounties: Vec<Bounty>,
    pub balances: Vec<AccountBalance>,
    pub escrowed_total: Amount,
    pub events: Vec<EventRecord>,
}

impl ReplayReport {
    pub fn mismatches(&self) -> usize {
        mismatches(&self.steps)
    }
}

/// Steps whose outcome differs from their `expect`.
pub fn mismatches(steps: &[StepOutcome]) -> usize {
    steps.iter().filter(|s| !s.matched).count()
}

impl Script {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse script {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Fresh ledger seeded with the configured and scripted balances.
    pub fn ledger(&self, config: &Config) -> BountyLedger {
        let mut custody: InMemoryCustody = config.genesis_custody();
        for account in &self.accounts {
            custody.deposit(account.id.clone(), account.balance);
        }
        BountyLedger::with_config(custody, &config.ledger)
    }

    /// Apply every step in order. Failing steps do not stop the run.
    pub fn run(&self, ledger: &BountyLedger) -> Vec<StepOutcome> {
        self.steps
            .iter()
            .enumerate()
            .map(|(index, step)| {
                let result = step.call.apply(ledger);
                let outcome = match &result {
                    Ok(()) => EXPECT_OK.to_string(),
                    Err(e) => e.code().to_string(),
                };
                let matched = step
                    .expect
                    .as_deref()
                    .map_or(true, |expected| expected == outcome);
                debug!("Step {} {} -> {}", index, step.call.name(), outcome);

                StepOutcome {
                    index,
                    op: step.call.name(),
                    bounty: step.call.bounty_id().map(str::to_string),
                    outcome,
                    error: result.err().map(|e| e.to_string()),
                    expected: step.expect.clone(),
                    matched,
                }
            })
            .collect()
    }

    pub fn replay(&self, config: &Config) -> ReplayReport {
        let ledger = self.ledger(config);
        let steps = self.run(&ledger);

        let report = ReplayReport {
            steps,
            bounties: ledger.bounties(),
            balances: ledger.with_custody(|c| c.balances()),
            escrowed_total: ledger.escrowed_total(),
            events: ledger.events(),
        };
        info!(
            "Replayed {} steps ({} unexpected outcomes)",
            report.steps.len(),
            report.mismatches()
        );
        report
    }
}
