// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::{CogsSummary, Expense, Order, Period, PeriodKey};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_revenue: Decimal,
    pub total_count: usize,
    pub methods: BTreeMap<String, Decimal>,
    pub cash_in_drawer: Decimal,
    pub total_tax: Decimal,
    pub taxable_sales: Decimal,
    pub cogs: Decimal,
    pub total_expenses: Decimal,
    pub gross_profit: Decimal,
    pub net_profit: Decimal,
    pub gross_margin: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchStats {
    pub branch_id: String,
    #[serde(flatten)]
    pub stats: Stats,
}

#[derive(Debug, Default)]
struct Accumulator {
    revenue: Decimal,
    count: usize,
    methods: BTreeMap<String, Decimal>,
    cash: Decimal,
    tax: Decimal,
    taxable: Decimal,
    expenses: Decimal,
}

impl Accumulator {
    fn add_order(&mut self, order: &Order) {
        self.revenue += order.total;
        self.count += 1;
        for p in &order.payments {
            *self.methods.entry(p.method.clone()).or_insert(Decimal::ZERO) += p.amount;
            if p.is_cash() {
                self.cash += p.amount;
            }
        }
        if !order.tax_amount.is_zero() {
            self.tax += order.tax_amount;
            self.taxable += order.subtotal - order.total_discount;
        }
    }

    fn finish(self, cogs: Decimal) -> Stats {
        let gross_profit = self.revenue - cogs;
        let net_profit = gross_profit - self.expenses;
        Stats {
            total_revenue: self.revenue,
            total_count: self.count,
            methods: self.methods,
            cash_in_drawer: self.cash,
            total_tax: self.tax,
            taxable_sales: self.taxable,
            cogs,
            total_expenses: self.expenses,
            gross_profit,
            net_profit,
            gross_margin: margin(gross_profit, self.revenue),
        }
    }
}

fn margin(gross_profit: Decimal, revenue: Decimal) -> Decimal {
    if revenue <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    gross_profit
        .checked_div(revenue)
        .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::ZERO)
}

pub fn in_period<'a>(orders: &'a [Order], period: &Period) -> impl Iterator<Item = &'a Order> {
    orders
        .iter()
        .filter(move |o| !o.is_void() && period.contains(o.accounting_date()))
}

pub fn cogs_for(cogs: &[CogsSummary], branch_id: &str) -> Decimal {
    cogs.iter()
        .find(|c| c.branch_id == branch_id)
        .map(CogsSummary::cogs)
        .unwrap_or(Decimal::ZERO)
}

fn expense_in(e: &Expense, period: &Period) -> bool {
    e.date.is_some_and(|d| period.contains(d))
}

pub fn compute_stats(
    orders: &[Order],
    cogs: &[CogsSummary],
    expenses: &[Expense],
    key: &PeriodKey,
) -> Stats {
    let mut acc = Accumulator::default();
    for order in in_period(orders, &key.period).filter(|o| o.branch_id == key.branch_id) {
        acc.add_order(order);
    }
    acc.expenses = expenses
        .iter()
        .filter(|e| e.branch_id == key.branch_id && expense_in(e, &key.period))
        .map(|e| e.amount)
        .sum();
    acc.finish(cogs_for(cogs, &key.branch_id))
}

/// Cross-branch comparison: one row per branch seen in any of the inputs,
/// highest revenue first.
pub fn branch_comparison(
    orders: &[Order],
    cogs: &[CogsSummary],
    expenses: &[Expense],
    period: &Period,
) -> Vec<BranchStats> {
    let mut by_branch: BTreeMap<String, Accumulator> = BTreeMap::new();
    for order in in_period(orders, period) {
        by_branch
            .entry(order.branch_id.clone())
            .or_default()
            .add_order(order);
    }
    for c in cogs {
        by_branch.entry(c.branch_id.clone()).or_default();
    }
    for e in expenses.iter().filter(|e| expense_in(e, period)) {
        by_branch.entry(e.branch_id.clone()).or_default().expenses += e.amount;
    }

    let mut rows: Vec<BranchStats> = by_branch
        .into_iter()
        .map(|(branch_id, acc)| {
            let stats = acc.finish(cogs_for(cogs, &branch_id));
            BranchStats { branch_id, stats }
        })
        .collect();
    rows.sort_by(|a, b| {
        b.stats
            .total_revenue
            .cmp(&a.stats.total_revenue)
            .then_with(|| a.branch_id.cmp(&b.branch_id))
    });
    rows
}
