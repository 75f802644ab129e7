// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{Order, Product, PurchaseOrder, PurchaseOrderStatus};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSheetSnapshot {
    pub as_of: Option<NaiveDate>,
    pub cash: Decimal,
    pub inventory: Decimal,
    pub receivable: Decimal,
    pub payable: Decimal,
}

impl BalanceSheetSnapshot {
    pub fn total_assets(&self) -> Decimal {
        self.cash + self.inventory + self.receivable
    }

    pub fn net_position(&self) -> Decimal {
        self.total_assets() - self.payable
    }
}

pub fn snapshot(
    branch_id: &str,
    cutoff: NaiveDate,
    orders: &[Order],
    products: &[Product],
    purchase_orders: &[PurchaseOrder],
) -> BalanceSheetSnapshot {
    let mut out = BalanceSheetSnapshot {
        as_of: Some(cutoff),
        ..Default::default()
    };

    let visible = orders
        .iter()
        .filter(|o| o.branch_id == branch_id && !o.is_void() && o.created_date() <= cutoff);
    for order in visible {
        out.cash += order
            .payments
            .iter()
            .filter(|p| p.is_cash())
            .map(|p| p.amount)
            .sum::<Decimal>();
        if order.status.is_open() {
            out.receivable += order.outstanding();
        }
    }

    // TODO: value inventory as of the cutoff once stock movements are available;
    // today this is current stock for every cutoff.
    out.inventory = products
        .iter()
        .filter(|p| p.track_stock && belongs(p.branch_id.as_deref(), branch_id))
        .map(|p| p.stock * p.cost)
        .sum();

    out.payable = purchase_orders
        .iter()
        .filter(|po| {
            po.status == PurchaseOrderStatus::Sent
                && belongs(po.branch_id.as_deref(), branch_id)
                && po.created_at.date_naive() <= cutoff
        })
        .map(|po| po.total_amount)
        .sum();

    out
}

// Records without a branch are shared across branches.
fn belongs(record_branch: Option<&str>, branch_id: &str) -> bool {
    record_branch.is_none_or(|b| b == branch_id)
}
