// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashSet;

use crate::aggregator::in_period;
use crate::bank_statement::{BankTransaction, MatchStatus, PaymentRef};
use crate::models::{Order, PeriodKey};

/// Two amounts are the same when they differ by less than one cent.
pub const AMOUNT_EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PosPaymentForRecon {
    /// `{orderId}-{paymentIndex}`
    pub id: String,
    pub order_id: String,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub method: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconSummary {
    pub total_bank: Decimal,
    pub total_pos: Decimal,
    pub matched_bank_total: Decimal,
    pub unmatched_bank_total: Decimal,
    pub unmatched_pos_total: Decimal,
    pub matched_count: usize,
    pub unmatched_bank_count: usize,
    pub unmatched_pos_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reconciliation {
    pub transactions: Vec<BankTransaction>,
    pub unmatched_pos: Vec<PosPaymentForRecon>,
    pub summary: ReconSummary,
}

pub fn pos_payments(orders: &[Order], key: &PeriodKey) -> Vec<PosPaymentForRecon> {
    in_period(orders, &key.period)
        .filter(|o| o.branch_id == key.branch_id)
        .flat_map(|o| {
            o.payments
                .iter()
                .enumerate()
                .filter(|(_, p)| !p.is_cash())
                .map(move |(i, p)| PosPaymentForRecon {
                    id: format!("{}-{}", o.id, i),
                    order_id: o.id.clone(),
                    date: o.created_date(),
                    amount: p.amount,
                    method: p.method.clone(),
                })
        })
        .collect()
}

fn same_amount(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() < AMOUNT_EPSILON
}

fn find_candidate(
    tx: &BankTransaction,
    pos: &[PosPaymentForRecon],
    used: &HashSet<String>,
    same_day: bool,
) -> Option<usize> {
    pos.iter().position(|p| {
        !used.contains(&p.id) && (!same_day || p.date == tx.date) && same_amount(p.amount, tx.amount)
    })
}

// Greedy and order dependent; not a maximum matching.
pub fn reconcile(bank: Vec<BankTransaction>, pos: &[PosPaymentForRecon]) -> Reconciliation {
    let mut used: HashSet<String> = HashSet::new();
    let mut summary = ReconSummary {
        total_pos: pos.iter().map(|p| p.amount).sum(),
        ..Default::default()
    };

    let mut transactions = Vec::with_capacity(bank.len());
    for mut tx in bank {
        summary.total_bank += tx.amount;
        let hit = find_candidate(&tx, pos, &used, true)
            .or_else(|| find_candidate(&tx, pos, &used, false));
        match hit {
            Some(i) => {
                let p = &pos[i];
                used.insert(p.id.clone());
                tx.status = MatchStatus::Matched;
                tx.matched = Some(PaymentRef {
                    payment_id: p.id.clone(),
                    order_id: p.order_id.clone(),
                });
                summary.matched_bank_total += tx.amount;
                summary.matched_count += 1;
            }
            None => {
                tx.status = MatchStatus::Unmatched;
                tx.matched = None;
                summary.unmatched_bank_total += tx.amount;
                summary.unmatched_bank_count += 1;
            }
        }
        transactions.push(tx);
    }

    let unmatched_pos: Vec<PosPaymentForRecon> =
        pos.iter().filter(|p| !used.contains(&p.id)).cloned().collect();
    summary.unmatched_pos_total = unmatched_pos.iter().map(|p| p.amount).sum();
    summary.unmatched_pos_count = unmatched_pos.len();

    Reconciliation {
        transactions,
        unmatched_pos,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epsilon_is_one_cent() {
        assert_eq!(AMOUNT_EPSILON, Decimal::new(1, 2));
        assert!(same_amount(Decimal::new(50000, 2), Decimal::new(500009, 3)));
        assert!(!same_amount(Decimal::new(50000, 2), Decimal::new(50001, 2)));
    }
}
