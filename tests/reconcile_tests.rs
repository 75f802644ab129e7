// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::json;
use std::collections::HashSet;
use tillclose::bank_statement::{parse_statement, MatchStatus};
use tillclose::models::{Order, Period, PeriodKey};
use tillclose::reconcile::{pos_payments, reconcile, PosPaymentForRecon};

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn pos(id: &str, date: &str, amount: &str) -> PosPaymentForRecon {
    PosPaymentForRecon {
        id: id.to_string(),
        order_id: id.split('-').next().unwrap().to_string(),
        date: d(date),
        amount: dec(amount),
        method: "Card".to_string(),
    }
}

#[test]
fn same_day_same_amount_matches() {
    let bank = parse_statement("Date,Description,Amount\n2024-03-01,POS Settlement,500.00\n").unwrap();
    let recon = reconcile(bank, &[pos("o1-0", "2024-03-01", "500")]);

    assert_eq!(recon.transactions[0].status, MatchStatus::Matched);
    let m = recon.transactions[0].matched.as_ref().unwrap();
    assert_eq!(m.payment_id, "o1-0");
    assert_eq!(m.order_id, "o1");
    assert_eq!(recon.summary.matched_bank_total, dec("500"));
    assert_eq!(recon.summary.unmatched_bank_total, Decimal::ZERO);
    assert_eq!(recon.summary.matched_count, 1);
    assert!(recon.unmatched_pos.is_empty());
}

#[test]
fn falls_back_to_any_date() {
    let bank = parse_statement("Date,Description,Amount\n2024-03-01,POS Settlement,500.00\n").unwrap();
    let recon = reconcile(bank, &[pos("o1-0", "2024-03-02", "500")]);
    assert_eq!(recon.transactions[0].status, MatchStatus::Matched);
    assert_eq!(recon.summary.unmatched_pos_count, 0);
}

#[test]
fn amounts_within_a_cent_match() {
    let bank = parse_statement("Date,Description,Amount\n2024-03-01,a,100.004\n2024-03-01,b,50.02\n").unwrap();
    let recon = reconcile(
        bank,
        &[pos("o1-0", "2024-03-01", "100"), pos("o2-0", "2024-03-01", "50.01")],
    );
    assert_eq!(recon.transactions[0].status, MatchStatus::Matched);
    assert_eq!(recon.transactions[1].status, MatchStatus::Unmatched);
    assert_eq!(recon.unmatched_pos.len(), 1);
    assert_eq!(recon.unmatched_pos[0].id, "o2-0");
}

#[test]
fn same_day_candidate_is_preferred_over_earlier_pos() {
    let bank = parse_statement(concat!(
        "Date,Description,Amount\n",
        "2024-03-01,first,100\n",
        "2024-03-01,second,100\n",
    ))
    .unwrap();
    let pos = [pos("o1-0", "2024-03-02", "100"), pos("o2-0", "2024-03-01", "100")];
    let recon = reconcile(bank, &pos);

    let matched: Vec<&str> = recon
        .transactions
        .iter()
        .map(|t| t.matched.as_ref().unwrap().payment_id.as_str())
        .collect();
    assert_eq!(matched, vec!["o2-0", "o1-0"]);
}

#[test]
fn greedy_fallback_can_steal_a_later_same_day_match() {
    let bank = parse_statement(concat!(
        "Date,Description,Amount\n",
        "2024-03-05,late row,100\n",
        "2024-03-01,exact row,100\n",
    ))
    .unwrap();
    let recon = reconcile(bank, &[pos("o1-0", "2024-03-01", "100")]);
    assert_eq!(recon.transactions[0].status, MatchStatus::Matched);
    assert_eq!(recon.transactions[1].status, MatchStatus::Unmatched);
    assert_eq!(recon.summary.unmatched_bank_total, dec("100"));
}

#[test]
fn totals_partition_and_payments_are_used_once() {
    let bank = parse_statement(concat!(
        "Date,Description,Amount\n",
        "2024-03-01,a,10\n",
        "2024-03-01,b,10\n",
        "2024-03-01,c,10\n",
        "2024-03-02,d,-4.5\n",
        "2024-03-02,e,77\n",
    ))
    .unwrap();
    let pos = [
        pos("o1-0", "2024-03-01", "10"),
        pos("o1-1", "2024-03-01", "10"),
        pos("o2-0", "2024-03-02", "-4.5"),
        pos("o3-0", "2024-03-02", "12"),
    ];
    let recon = reconcile(bank, &pos);
    let s = &recon.summary;

    assert_eq!(s.total_bank, s.matched_bank_total + s.unmatched_bank_total);
    assert_eq!(s.total_bank, dec("102.5"));
    assert_eq!(s.total_pos, dec("27.5"));
    assert_eq!(s.matched_count, 3);
    assert_eq!(s.unmatched_bank_count, 2);
    assert_eq!(s.unmatched_pos_count, 1);
    assert_eq!(s.unmatched_pos_total, dec("12"));

    let ids: Vec<&str> = recon
        .transactions
        .iter()
        .filter_map(|t| t.matched.as_ref().map(|m| m.payment_id.as_str()))
        .collect();
    let unique: HashSet<&str> = ids.iter().copied().collect();
    assert_eq!(ids.len(), unique.len());
    for t in &recon.transactions {
        assert_eq!(t.status == MatchStatus::Matched, t.matched.is_some());
    }
}

#[test]
fn pos_payments_skip_cash_void_and_other_branches() {
    let orders: Vec<Order> = serde_json::from_value(json!([
        {
            "id": "o1", "branchId": "b1", "total": 30, "status": "COMPLETED",
            "payments": [{"method": "Cash", "amount": 10}, {"method": "Card", "amount": 20}],
            "createdAt": "2024-03-01T23:30:00Z"
        },
        {
            "id": "o2", "branchId": "b1", "total": 5, "status": "VOID",
            "payments": [{"method": "Card", "amount": 5}],
            "createdAt": "2024-03-01T10:00:00Z"
        },
        {
            "id": "o3", "branchId": "b2", "total": 8, "status": "COMPLETED",
            "payments": [{"method": "Card", "amount": 8}],
            "createdAt": "2024-03-01T10:00:00Z"
        },
        {
            "id": "o4", "branchId": "b1", "total": 9, "status": "COMPLETED",
            "payments": [{"method": "LINE Pay", "amount": 9}],
            "createdAt": "2024-03-03T10:00:00Z"
        }
    ]))
    .unwrap();
    let key = PeriodKey::new("b1", Period::new(d("2024-03-01"), d("2024-03-02")).unwrap());
    let payments = pos_payments(&orders, &key);

    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].id, "o1-1");
    assert_eq!(payments[0].order_id, "o1");
    assert_eq!(payments[0].date, d("2024-03-01"));
    assert_eq!(payments[0].amount, dec("20"));
    assert_eq!(payments[0].method, "Card");
}

#[test]
fn empty_inputs_reconcile_to_zero() {
    let recon = reconcile(Vec::new(), &[]);
    assert!(recon.transactions.is_empty());
    assert_eq!(recon.summary.total_bank, Decimal::ZERO);
    assert_eq!(recon.summary.matched_count, 0);
}
