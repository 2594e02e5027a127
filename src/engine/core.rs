// 4.1 engine/core.rs: main engine struct. entity maps, the ledger, the audit
// trail, and the atomic commit path every operation funnels through.

use super::config::EngineConfig;
use super::results::{CommitError, EngineError};
use crate::account::Account;
use crate::audit::{
    AccountCreatedRecord, AuditId, AuditPayload, AuditRecord, DepositedRecord, EventCreatedRecord,
};
use crate::event::{Event, EventDraft};
use crate::ledger::{Ledger, LedgerError, LedgerInstruction, UnitOfWork};
use crate::types::{AccountId, EventId, Money, Timestamp};
use std::collections::HashMap;
use tracing::{debug, info};

#[derive(Debug)]
pub struct Engine {
    pub(super) config: EngineConfig,
    pub(super) events: HashMap<EventId, Event>,
    pub(super) accounts: HashMap<AccountId, Account>,
    pub(super) ledger: Ledger,
    pub(super) audit: Vec<AuditRecord>,
    pub(super) next_audit_id: u64,
    pub(super) current_time: Timestamp,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            events: HashMap::new(),
            accounts: HashMap::new(),
            ledger: Ledger::new(),
            audit: Vec::new(),
            next_audit_id: 1,
            current_time: Timestamp::from_millis(0),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn set_time(&mut self, timestamp: Timestamp) {
        self.current_time = timestamp;
    }

    pub fn advance_time(&mut self, millis: i64) {
        self.current_time = Timestamp::from_millis(self.current_time.as_millis() + millis);
    }

    pub fn time(&self) -> Timestamp {
        self.current_time
    }

    /// Open a new event with its full outcome set. Outcomes are fixed from
    /// this point on.
    pub fn create_event(&mut self, draft: EventDraft) -> Result<EventId, EngineError> {
        draft.validate()?;
        let event = draft.build();
        let event_id = event.id.clone();

        info!(event = %event_id, title = %event.title, outcomes = event.outcome_count(), "event created");
        self.emit_audit(AuditPayload::EventCreated(EventCreatedRecord {
            event_id: event_id.clone(),
            title: event.title.clone(),
            outcome_count: event.outcome_count(),
        }));

        self.events.insert(event_id.clone(), event);
        Ok(event_id)
    }

    pub fn get_event(&self, event_id: &EventId) -> Option<&Event> {
        self.events.get(event_id)
    }

    pub fn events_iter(&self) -> impl Iterator<Item = &Event> {
        self.events.values()
    }

    pub fn create_account(&mut self) -> AccountId {
        let id = AccountId::generate();
        let account = Account::new(id.clone(), self.current_time);
        self.accounts.insert(id.clone(), account);

        self.emit_audit(AuditPayload::AccountCreated(AccountCreatedRecord {
            account_id: id.clone(),
        }));
        id
    }

    /// Create an account pre-funded with the configured starting balance.
    pub fn create_funded_account(&mut self) -> AccountId {
        let id = self.create_account();
        let funding = self.config.default_funding;
        // account was just inserted
        if let Err(err) = self.deposit(&id, funding) {
            debug!(account = %id, %err, "funding freshly created account failed");
        }
        id
    }

    pub fn get_account(&self, account_id: &AccountId) -> Option<&Account> {
        self.accounts.get(account_id)
    }

    pub fn deposit(&mut self, account_id: &AccountId, amount: Money) -> Result<(), EngineError> {
        let account = self
            .accounts
            .get_mut(account_id)
            .ok_or_else(|| EngineError::AccountNotFound(account_id.clone()))?;

        account.deposit(amount);
        let new_balance = account.balance;

        self.emit_audit(AuditPayload::Deposited(DepositedRecord {
            account_id: account_id.clone(),
            amount,
            new_balance,
        }));
        Ok(())
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn audit_records(&self) -> &[AuditRecord] {
        &self.audit
    }

    pub fn recent_audit(&self, count: usize) -> &[AuditRecord] {
        let start = self.audit.len().saturating_sub(count);
        &self.audit[start..]
    }

    /// Atomically apply a unit of work: validate every instruction against
    /// current state, then apply all of them, then bump the event version.
    /// A failed validation applies nothing.
    pub(crate) fn apply(&mut self, uow: UnitOfWork) -> Result<(), CommitError> {
        if uow.is_empty() {
            return Err(CommitError::Rejected(EngineError::Ledger(
                LedgerError::EmptyUnitOfWork,
            )));
        }

        if self.ledger.version(&uow.event_id) != uow.expected_version {
            return Err(CommitError::Stale);
        }

        let event = self
            .events
            .get(&uow.event_id)
            .ok_or_else(|| {
                CommitError::Rejected(EngineError::Ledger(LedgerError::UnknownEvent(
                    uow.event_id.clone(),
                )))
            })?;

        // validate every instruction before touching anything
        for instruction in &uow.instructions {
            match instruction {
                LedgerInstruction::CreateShare(share) => {
                    if share.event_id != uow.event_id {
                        return Err(CommitError::Rejected(EngineError::Ledger(
                            LedgerError::UnknownEvent(share.event_id.clone()),
                        )));
                    }
                    if event.finalized {
                        return Err(CommitError::Rejected(EngineError::MarketUnavailable(
                            uow.event_id.clone(),
                        )));
                    }
                    if event.outcome(&share.outcome_id).is_none() {
                        return Err(CommitError::Rejected(EngineError::Ledger(
                            LedgerError::UnknownOutcome(share.outcome_id.clone()),
                        )));
                    }
                }
                LedgerInstruction::SetOutcomeCost { outcome_id, .. } => {
                    if event.outcome(outcome_id).is_none() {
                        return Err(CommitError::Rejected(EngineError::Ledger(
                            LedgerError::UnknownOutcome(outcome_id.clone()),
                        )));
                    }
                }
                LedgerInstruction::FinalizeEvent => {
                    if event.finalized {
                        return Err(CommitError::Rejected(EngineError::AlreadyFinalized(
                            uow.event_id.clone(),
                        )));
                    }
                }
                LedgerInstruction::DebitAccount { account_id, .. }
                | LedgerInstruction::CreditAccount { account_id, .. } => {
                    if !self.accounts.contains_key(account_id) {
                        return Err(CommitError::Rejected(EngineError::Ledger(
                            LedgerError::UnknownAccount(account_id.clone()),
                        )));
                    }
                }
            }
        }

        // commit-time balance recheck on the batch's net flows
        for (account_id, flow) in uow.net_flows() {
            if flow.is_negative() {
                let required = flow.mul(rust_decimal::Decimal::NEGATIVE_ONE);
                let account = &self.accounts[&account_id];
                if !account.can_cover(required) {
                    return Err(CommitError::Rejected(EngineError::InsufficientBalance {
                        required,
                        available: account.balance,
                    }));
                }
            }
        }

        // all validated, now apply. balance changes go through the net flows
        // so instruction ordering inside the batch cannot matter; the
        // account's own debit guard backs the recheck above.
        for (account_id, flow) in uow.net_flows() {
            if let Some(account) = self.accounts.get_mut(&account_id) {
                if flow.is_negative() {
                    account
                        .debit(flow.mul(rust_decimal::Decimal::NEGATIVE_ONE))
                        .map_err(|err| CommitError::Rejected(EngineError::Account(err)))?;
                } else {
                    account.credit(flow);
                }
            }
        }

        let event = self
            .events
            .get_mut(&uow.event_id)
            .ok_or(CommitError::Stale)?;

        for instruction in uow.instructions {
            match instruction {
                LedgerInstruction::CreateShare(share) => self.ledger.record_share(share),
                LedgerInstruction::SetOutcomeCost { outcome_id, cost } => {
                    if let Some(outcome) = event.outcome_mut(&outcome_id) {
                        outcome.cost = cost;
                    }
                }
                LedgerInstruction::FinalizeEvent => event.finalized = true,
                LedgerInstruction::DebitAccount { .. }
                | LedgerInstruction::CreditAccount { .. } => {}
            }
        }

        self.ledger.bump_version(&uow.event_id);
        debug!(event = %uow.event_id, version = self.ledger.version(&uow.event_id), "unit of work committed");
        Ok(())
    }

    pub(super) fn emit_audit(&mut self, payload: AuditPayload) {
        let record = AuditRecord::new(AuditId(self.next_audit_id), self.current_time, payload);
        self.next_audit_id += 1;
        self.audit.push(record);

        if self.audit.len() > self.config.max_audit_records {
            let drain_count = self.audit.len() - self.config.max_audit_records;
            self.audit.drain(0..drain_count);
        }
    }
}
