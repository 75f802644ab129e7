// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use serde::Serialize;
use std::thread;
use tracing::{debug, warn};

use crate::aggregator::{self, BranchStats, Stats};
use crate::backoffice::{BackOffice, OrderQuery};
use crate::balance_sheet::{self, BalanceSheetSnapshot};
use crate::bank_statement::BankTransaction;
use crate::error::Result;
use crate::models::{CogsSummary, Expense, Order, Period, PeriodKey, Product, PurchaseOrder};
use crate::reconcile::{self, PosPaymentForRecon, Reconciliation};
use crate::settlement::{LockState, SettlementApi, SettlementLifecycle};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFailure {
    pub source: &'static str,
    pub message: String,
}

fn settle<T>(
    source: &'static str,
    joined: thread::Result<Result<Vec<T>>>,
    failures: &mut Vec<SourceFailure>,
) -> Vec<T> {
    let message = match joined {
        Ok(Ok(v)) => return v,
        Ok(Err(e)) => e.to_string(),
        Err(_) => "fetch thread panicked".to_string(),
    };
    warn!(source, error = %message, "source unavailable; using empty data");
    failures.push(SourceFailure { source, message });
    Vec::new()
}

#[derive(Debug, Clone)]
pub struct PeriodData {
    pub key: PeriodKey,
    pub orders: Vec<Order>,
    pub cogs: Vec<CogsSummary>,
    pub expenses: Vec<Expense>,
    pub failures: Vec<SourceFailure>,
}

/// Orders, COGS and expenses for one branch and period, fetched concurrently.
pub fn gather(source: &dyn BackOffice, key: &PeriodKey) -> PeriodData {
    let query = OrderQuery::period(Some(&key.branch_id), &key.period);
    let (orders, cogs, expenses) = thread::scope(|s| {
        let orders = s.spawn(|| source.orders(&query));
        let cogs = s.spawn(|| source.cogs(&key.period));
        let expenses = s.spawn(|| source.expenses(&key.period));
        (orders.join(), cogs.join(), expenses.join())
    });
    let mut failures = Vec::new();
    PeriodData {
        key: key.clone(),
        orders: settle("orders", orders, &mut failures),
        cogs: settle("cogs", cogs, &mut failures),
        expenses: settle("expenses", expenses, &mut failures),
        failures,
    }
}

pub fn compare_branches(
    source: &dyn BackOffice,
    period: &Period,
) -> (Vec<BranchStats>, Vec<SourceFailure>) {
    let query = OrderQuery::period(None, period);
    let (orders, cogs, expenses) = thread::scope(|s| {
        let orders = s.spawn(|| source.orders(&query));
        let cogs = s.spawn(|| source.cogs(period));
        let expenses = s.spawn(|| source.expenses(period));
        (orders.join(), cogs.join(), expenses.join())
    });
    let mut failures = Vec::new();
    let orders = settle("orders", orders, &mut failures);
    let cogs = settle("cogs", cogs, &mut failures);
    let expenses = settle("expenses", expenses, &mut failures);
    (
        aggregator::branch_comparison(&orders, &cogs, &expenses, period),
        failures,
    )
}

pub fn balance_sheet(
    source: &dyn BackOffice,
    branch_id: &str,
    cutoff: NaiveDate,
) -> (BalanceSheetSnapshot, Vec<SourceFailure>) {
    let query = OrderQuery::up_to(branch_id, cutoff);
    let (orders, products, purchase_orders) = thread::scope(|s| {
        let orders = s.spawn(|| source.orders(&query));
        let products = s.spawn(|| source.products(branch_id));
        let pos = s.spawn(|| source.purchase_orders(branch_id));
        (orders.join(), products.join(), pos.join())
    });
    let mut failures = Vec::new();
    let orders: Vec<Order> = settle("orders", orders, &mut failures);
    let products: Vec<Product> = settle("products", products, &mut failures);
    let purchase_orders: Vec<PurchaseOrder> =
        settle("purchase_orders", purchase_orders, &mut failures);
    (
        balance_sheet::snapshot(branch_id, cutoff, &orders, &products, &purchase_orders),
        failures,
    )
}

pub struct Dashboard {
    current: PeriodKey,
    data: Option<PeriodData>,
    lock: Option<LockState>,
    lock_error: Option<String>,
}

impl Dashboard {
    pub fn new(key: PeriodKey) -> Self {
        Self {
            current: key,
            data: None,
            lock: None,
            lock_error: None,
        }
    }

    pub fn key(&self) -> &PeriodKey {
        &self.current
    }

    pub fn select(&mut self, key: PeriodKey) {
        if key != self.current {
            self.current = key;
            self.data = None;
            self.lock = None;
            self.lock_error = None;
        }
    }

    /// Returns `false` and keeps the current state when `data` was requested
    /// for a period that is no longer selected.
    pub fn accept(&mut self, data: PeriodData) -> bool {
        if data.key != self.current {
            debug!(requested = %data.key, current = %self.current, "discarding stale period data");
            return false;
        }
        self.data = Some(data);
        true
    }

    pub fn accept_lock(&mut self, key: &PeriodKey, state: Result<LockState>) -> bool {
        if *key != self.current {
            debug!(requested = %key, current = %self.current, "discarding stale settlement status");
            return false;
        }
        match state {
            Ok(s) => {
                self.lock = Some(s);
                self.lock_error = None;
            }
            Err(e) => {
                warn!(%key, error = %e, "settlement status unavailable");
                self.lock = None;
                self.lock_error = Some(e.to_string());
            }
        }
        true
    }

    pub fn refresh<A: SettlementApi>(
        &mut self,
        source: &dyn BackOffice,
        settlements: &SettlementLifecycle<A>,
    ) {
        let key = self.current.clone();
        let (data, lock) = thread::scope(|s| {
            let data = s.spawn(|| gather(source, &key));
            let lock = settlements.status(&key);
            (data.join(), lock)
        });
        match data {
            Ok(d) => {
                self.accept(d);
            }
            Err(_) => warn!(%key, "period fetch panicked"),
        }
        self.accept_lock(&key, lock);
    }

    pub fn data(&self) -> Option<&PeriodData> {
        self.data.as_ref()
    }

    pub fn lock_state(&self) -> Option<&LockState> {
        self.lock.as_ref()
    }

    pub fn is_locked(&self) -> bool {
        self.lock.as_ref().is_some_and(LockState::is_locked)
    }

    /// The backend stays authoritative; an unknown lock state does not block.
    pub fn can_submit(&self) -> bool {
        !self.is_locked()
    }

    pub fn failures(&self) -> Vec<SourceFailure> {
        let mut out = self
            .data
            .as_ref()
            .map(|d| d.failures.clone())
            .unwrap_or_default();
        if let Some(e) = &self.lock_error {
            out.push(SourceFailure {
                source: "settlement",
                message: e.clone(),
            });
        }
        out
    }

    pub fn stats(&self) -> Stats {
        match &self.data {
            Some(d) => aggregator::compute_stats(&d.orders, &d.cogs, &d.expenses, &self.current),
            None => Stats::default(),
        }
    }

    pub fn pos_payments(&self) -> Vec<PosPaymentForRecon> {
        match &self.data {
            Some(d) => reconcile::pos_payments(&d.orders, &self.current),
            None => Vec::new(),
        }
    }

    pub fn reconcile(&self, bank: Vec<BankTransaction>) -> Reconciliation {
        reconcile::reconcile(bank, &self.pos_payments())
    }
}
