// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::aggregator::in_period;
use crate::config::Settings;
use crate::dashboard::gather;
use crate::models::{Order, OrderStatus, PeriodKey};
use crate::reconcile::AMOUNT_EPSILON;
use crate::utils::{fmt_money, key_from_args, open_backoffice, pretty_table, report_failures};
use anyhow::Result;
use rusqlite::Connection;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub kind: &'static str,
    pub detail: String,
}

/// Orders whose figures disagree with themselves. These still aggregate (bad
/// numbers count as zero) but deserve a look before the period is settled.
pub fn check_orders<'a>(orders: impl IntoIterator<Item = &'a Order>) -> Vec<Issue> {
    let mut issues = Vec::new();
    for o in orders.into_iter().filter(|o| !o.is_void()) {
        let expected = o.expected_total();
        if (o.total - expected).abs() >= AMOUNT_EPSILON {
            issues.push(Issue {
                kind: "total_mismatch",
                detail: format!(
                    "{}: total {} != subtotal - discount + tax {}",
                    o.id,
                    fmt_money(&o.total),
                    fmt_money(&expected)
                ),
            });
        }
        let paid = o.paid();
        if o.status == OrderStatus::Completed && o.total - paid >= AMOUNT_EPSILON {
            issues.push(Issue {
                kind: "completed_underpaid",
                detail: format!(
                    "{}: paid {} of {}",
                    o.id,
                    fmt_money(&paid),
                    fmt_money(&o.total)
                ),
            });
        }
        if o.payments.iter().any(|p| p.amount.is_sign_negative()) {
            issues.push(Issue {
                kind: "negative_payment",
                detail: o.id.clone(),
            });
        }
        if o.status == OrderStatus::Unknown {
            issues.push(Issue {
                kind: "unknown_status",
                detail: o.id.clone(),
            });
        }
    }
    issues
}

pub fn check_period(orders: &[Order], key: &PeriodKey) -> Vec<Issue> {
    check_orders(in_period(orders, &key.period).filter(|o| o.branch_id == key.branch_id))
}

pub fn handle(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let settings = Settings::load(conn)?;
    let key = key_from_args(sub, &settings)?;
    let source = open_backoffice(sub, &settings)?;
    let data = gather(source.as_ref(), &key);
    report_failures(&data.failures);

    let mut rows: Vec<Vec<String>> = check_period(&data.orders, &key)
        .into_iter()
        .map(|i| vec![i.kind.to_string(), i.detail])
        .collect();
    for e in data
        .expenses
        .iter()
        .filter(|e| e.branch_id == key.branch_id && e.date.is_none())
    {
        rows.push(vec!["expense_without_date".into(), e.id.clone()]);
    }

    if rows.is_empty() {
        println!("doctor: no issues found for {}", key);
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
