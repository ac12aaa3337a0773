//! Bounty ledger
//!
//! Owns every bounty and proposition, enforces the lifecycle
//! `OPEN -> SOLVED | CLOSED`, and moves escrowed value through [`Custody`].
//!
//! All state sits behind one lock, so operations are applied one at a time.
//! Each operation runs its precondition checks (existence, state,
//! authorization, funding, in that order) before touching anything. Value
//! released from escrow is credited last; if the credit fails the state
//! change is reverted and no event is published.

use std::collections::{BTreeMap, HashMap};

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::config::LedgerConfig;
use crate::custody::{Custody, InMemoryCustody};
use crate::error::{CustodyError, LedgerError, LedgerResult};
use crate::events::{EventJournal, EventRecord, LedgerEvent};
use crate::types::{AccountId, Amount, Bounty, BountyState, Proposition};

struct BountyEntry {
    bounty: Bounty,
    propositions: BTreeMap<AccountId, Proposition>,
}

struct LedgerState<C> {
    bounties: HashMap<String, BountyEntry>,
    escrowed_total: Amount,
    journal: EventJournal,
    custody: C,
}

pub struct BountyLedger<C: Custody = InMemoryCustody> {
    state: Mutex<LedgerState<C>>,
}

impl<C: Custody> BountyLedger<C> {
    pub fn new(custody: C) -> Self {
        Self::with_config(custody, &LedgerConfig::default())
    }

    pub fn with_config(custody: C, config: &LedgerConfig) -> Self {
        Self {
            state: Mutex::new(LedgerState {
                bounties: HashMap::new(),
                escrowed_total: 0,
                journal: EventJournal::new(config.journal, config.event_channel_capacity),
                custody,
            }),
        }
    }

    // ========================================================================
    // OPERATIONS
    // ========================================================================

    /// Register an unfunded bounty owned by `caller`.
    pub fn create_bounty(
        &self,
        id: &str,
        value: Amount,
        metadata: &str,
        caller: &AccountId,
    ) -> LedgerResult<Bounty> {
        self.state
            .lock()
            .create(id, value, metadata, caller, None)
            .inspect_err(|e| reject("create_bounty", id, e))
    }

    /// Register a bounty and escrow its value in one step.
    ///
    /// `attached` must equal `value` exactly.
    pub fn create_bounty_with_locked_value(
        &self,
        id: &str,
        value: Amount,
        metadata: &str,
        caller: &AccountId,
        attached: Amount,
    ) -> LedgerResult<Bounty> {
        self.state
            .lock()
            .create(id, value, metadata, caller, Some(attached))
            .inspect_err(|e| reject("create_bounty_with_locked_value", id, e))
    }

    /// Escrow the value of a bounty created unfunded. Funding is one-shot.
    pub fn fund_bounty(&self, id: &str, caller: &AccountId, attached: Amount) -> LedgerResult<()> {
        self.state
            .lock()
            .fund(id, caller, attached)
            .inspect_err(|e| reject("fund_bounty", id, e))
    }

    /// Record `caller` as a candidate solver.
    pub fn add_proposal(
        &self,
        id: &str,
        metadata: &str,
        caller: &AccountId,
    ) -> LedgerResult<Proposition> {
        self.state
            .lock()
            .propose(id, metadata, caller)
            .inspect_err(|e| reject("add_proposal", id, e))
    }

    /// Select `solver` as the winner and pay out the escrowed value.
    pub fn mark_resolved(
        &self,
        id: &str,
        solver: &AccountId,
        caller: &AccountId,
    ) -> LedgerResult<()> {
        self.state
            .lock()
            .resolve(id, solver, caller)
            .inspect_err(|e| reject("mark_resolved", id, e))
    }

    /// Cancel an open bounty, refunding the issuer if value was escrowed.
    pub fn close_bounty(&self, id: &str, caller: &AccountId) -> LedgerResult<()> {
        self.state
            .lock()
            .close(id, caller)
            .inspect_err(|e| reject("close_bounty", id, e))
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    pub fn bounty(&self, id: &str) -> Option<Bounty> {
        self.state
            .lock()
            .bounties
            .get(id)
            .map(|entry| entry.bounty.clone())
    }

    /// All bounties, ordered by id.
    pub fn bounties(&self) -> Vec<Bounty> {
        let state = self.state.lock();
        let mut bounties: Vec<_> = state
            .bounties
            .values()
            .map(|entry| entry.bounty.clone())
            .collect();
        bounties.sort_by(|a, b| a.id.cmp(&b.id));
        bounties
    }

    pub fn proposition(&self, id: &str, solver: &AccountId) -> Option<Proposition> {
        self.state
            .lock()
            .bounties
            .get(id)
            .and_then(|entry| entry.propositions.get(solver).cloned())
    }

    /// Propositions on a bounty, ordered by solver. Empty for unknown ids.
    pub fn propositions(&self, id: &str) -> Vec<Proposition> {
        self.state
            .lock()
            .bounties
            .get(id)
            .map(|entry| entry.propositions.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Sum of `value` over bounties with locked value.
    pub fn escrowed_total(&self) -> Amount {
        self.state.lock().escrowed_total
    }

    /// Journaled events in commit order (empty when the journal is disabled).
    pub fn events(&self) -> Vec<EventRecord> {
        self.state.lock().journal.records().to_vec()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventRecord> {
        self.state.lock().journal.subscribe()
    }

    /// Runs `f` with the ledger lock held; calling back into the ledger from
    /// `f` deadlocks.
    pub fn with_custody<R>(&self, f: impl FnOnce(&C) -> R) -> R {
        f(&self.state.lock().custody)
    }

    /// Same locking rule as [`with_custody`](Self::with_custody).
    pub fn with_custody_mut<R>(&self, f: impl FnOnce(&mut C) -> R) -> R {
        f(&mut self.state.lock().custody)
    }
}

impl<C: Custody> LedgerState<C> {
    /// `attached` is `Some` for a create that escrows its value up front.
    fn create(
        &mut self,
        id: &str,
        value: Amount,
        metadata: &str,
        caller: &AccountId,
        attached: Option<Amount>,
    ) -> LedgerResult<Bounty> {
        if self.bounties.contains_key(id) {
            return Err(LedgerError::BountyAlreadyExists(id.to_string()));
        }
        if let Some(attached) = attached {
            if attached != value {
                return Err(LedgerError::InsufficientBalance { attached, value });
            }
            self.escrowed_total =
                lock_value(&mut self.custody, self.escrowed_total, caller, attached)?;
        }

        let bounty = Bounty {
            id: id.to_string(),
            issuer: caller.clone(),
            value,
            value_locked: attached.is_some(),
            state: BountyState::Open,
            metadata: metadata.to_string(),
        };
        self.bounties.insert(
            id.to_string(),
            BountyEntry {
                bounty: bounty.clone(),
                propositions: BTreeMap::new(),
            },
        );
        self.journal.publish(LedgerEvent::BountyCreated {
            bounty: bounty.clone(),
        });

        if bounty.value_locked {
            info!("Bounty {} created by {} with {} locked", id, caller, value);
        } else {
            info!("Bounty {} created by {} (value {})", id, caller, value);
        }
        Ok(bounty)
    }

    fn fund(&mut self, id: &str, caller: &AccountId, attached: Amount) -> LedgerResult<()> {
        let entry = open_entry(&mut self.bounties, id)?;
        ensure_issuer(&entry.bounty, caller)?;
        if entry.bounty.value_locked {
            return Err(LedgerError::BountyAlreadyFunded(id.to_string()));
        }
        let value = entry.bounty.value;
        if attached != value {
            return Err(LedgerError::FundsMismatch {
                id: id.to_string(),
                value,
                attached,
            });
        }

        self.escrowed_total = lock_value(&mut self.custody, self.escrowed_total, caller, value)?;
        entry.bounty.value_locked = true;
        self.journal.publish(LedgerEvent::BountyFunded {
            id: id.to_string(),
            value,
        });

        info!("Bounty {} funded with {}", id, value);
        Ok(())
    }

    fn propose(
        &mut self,
        id: &str,
        metadata: &str,
        caller: &AccountId,
    ) -> LedgerResult<Proposition> {
        let entry = open_entry(&mut self.bounties, id)?;
        if entry.propositions.contains_key(caller) {
            return Err(LedgerError::AlreadyParticipant {
                id: id.to_string(),
                solver: caller.clone(),
            });
        }
        if entry.bounty.issuer == *caller {
            return Err(LedgerError::BountyIssuer {
                id: id.to_string(),
                issuer: caller.clone(),
            });
        }

        let proposition = Proposition {
            solver: caller.clone(),
            metadata: metadata.to_string(),
        };
        entry
            .propositions
            .insert(caller.clone(), proposition.clone());
        self.journal.publish(LedgerEvent::PropositionCreated {
            id: id.to_string(),
            proposition: proposition.clone(),
        });

        info!("Proposition on bounty {} from {}", id, caller);
        Ok(proposition)
    }

    fn resolve(&mut self, id: &str, solver: &AccountId, caller: &AccountId) -> LedgerResult<()> {
        let entry = open_entry(&mut self.bounties, id)?;
        ensure_issuer(&entry.bounty, caller)?;
        if !entry.propositions.contains_key(solver) {
            return Err(LedgerError::NotParticipant {
                id: id.to_string(),
                solver: solver.clone(),
            });
        }
        if !entry.bounty.value_locked {
            return Err(LedgerError::BountyNotFunded(id.to_string()));
        }

        let value = entry.bounty.value;
        release(
            entry,
            BountyState::Solved,
            &mut self.custody,
            &mut self.escrowed_total,
            solver,
        )?;
        self.journal.publish(LedgerEvent::BountyResolved {
            id: id.to_string(),
            solver: solver.clone(),
        });

        info!("Bounty {} resolved, paid {} to {}", id, value, solver);
        Ok(())
    }

    fn close(&mut self, id: &str, caller: &AccountId) -> LedgerResult<()> {
        let entry = open_entry(&mut self.bounties, id)?;
        ensure_issuer(&entry.bounty, caller)?;

        let refunded = entry.bounty.value_locked.then_some(entry.bounty.value);
        release(
            entry,
            BountyState::Closed,
            &mut self.custody,
            &mut self.escrowed_total,
            caller,
        )?;
        self.journal
            .publish(LedgerEvent::BountyClosed { id: id.to_string() });

        match refunded {
            Some(value) => info!("Bounty {} closed, refunded {} to {}", id, value, caller),
            None => info!("Bounty {} closed", id),
        }
        Ok(())
    }
}

/// Debit `from` into custody and return the new escrow total.
fn lock_value<C: Custody>(
    custody: &mut C,
    escrowed_total: Amount,
    from: &AccountId,
    amount: Amount,
) -> LedgerResult<Amount> {
    let total = escrowed_total
        .checked_add(amount)
        .ok_or_else(|| CustodyError::Overflow(from.clone()))?;
    custody.debit(from, amount)?;
    Ok(total)
}

/// Move an open bounty into a terminal state and hand any escrowed value to
/// `recipient`. The bounty is restored untouched if the credit fails.
fn release<C: Custody>(
    entry: &mut BountyEntry,
    terminal: BountyState,
    custody: &mut C,
    escrowed_total: &mut Amount,
    recipient: &AccountId,
) -> LedgerResult<()> {
    let before = entry.bounty.clone();
    let locked = before.value_locked;

    entry.bounty.state = terminal;
    entry.bounty.value_locked = false;

    if locked {
        if let Err(e) = custody.credit(recipient, before.value) {
            warn!(
                "Transfer of {} to {} failed, bounty {} stays {}",
                before.value, recipient, before.id, before.state
            );
            entry.bounty = before;
            return Err(e.into());
        }
        *escrowed_total = escrowed_total.saturating_sub(before.value);
    }
    Ok(())
}

/// Existence, then state.
fn open_entry<'a>(
    bounties: &'a mut HashMap<String, BountyEntry>,
    id: &str,
) -> LedgerResult<&'a mut BountyEntry> {
    let entry = bounties
        .get_mut(id)
        .ok_or_else(|| LedgerError::BountyNotFound(id.to_string()))?;
    if entry.bounty.state.is_terminal() {
        return Err(LedgerError::BountyAlreadyClosed {
            id: id.to_string(),
            state: entry.bounty.state,
        });
    }
    Ok(entry)
}

fn ensure_issuer(bounty: &Bounty, caller: &AccountId) -> LedgerResult<()> {
    if bounty.issuer != *caller {
        return Err(LedgerError::NotBountyIssuer {
            id: bounty.id.clone(),
            caller: caller.clone(),
        });
    }
    Ok(())
}

fn reject(op: &str, id: &str, err: &LedgerError) {
    warn!("{} rejected for bounty {}: {}", op, id, err);
}
