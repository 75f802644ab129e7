// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::Result;
use crate::models::{CogsSummary, Expense, Order, Period, Product, PurchaseOrder};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderQuery {
    /// `None` asks for every branch.
    pub branch_id: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: NaiveDate,
}

impl OrderQuery {
    pub fn period(branch_id: Option<&str>, period: &Period) -> Self {
        Self {
            branch_id: branch_id.map(str::to_string),
            from: Some(period.start),
            to: period.end,
        }
    }

    pub fn up_to(branch_id: &str, cutoff: NaiveDate) -> Self {
        Self {
            branch_id: Some(branch_id.to_string()),
            from: None,
            to: cutoff,
        }
    }

    fn admits(&self, order: &Order) -> bool {
        let branch_ok = self.branch_id.as_deref().is_none_or(|b| b == order.branch_id);
        let in_range = |d: NaiveDate| self.from.is_none_or(|f| f <= d) && d <= self.to;
        branch_ok && (in_range(order.accounting_date()) || in_range(order.created_date()))
    }
}

pub trait BackOffice: Sync {
    fn orders(&self, query: &OrderQuery) -> Result<Vec<Order>>;
    fn products(&self, branch_id: &str) -> Result<Vec<Product>>;
    fn purchase_orders(&self, branch_id: &str) -> Result<Vec<PurchaseOrder>>;
    fn cogs(&self, period: &Period) -> Result<Vec<CogsSummary>>;
    fn expenses(&self, period: &Period) -> Result<Vec<Expense>>;
}

pub fn decode_list<T: DeserializeOwned>(what: &str, v: Value) -> Vec<T> {
    let Value::Array(items) = v else {
        debug!(what, "non-array response treated as empty");
        return Vec::new();
    };
    items
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| match serde_json::from_value(item) {
            Ok(t) => Some(t),
            Err(e) => {
                warn!(what, index = i, error = %e, "dropping undecodable record");
                None
            }
        })
        .collect()
}

pub struct HttpBackOffice {
    client: reqwest::blocking::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpBackOffice {
    pub fn new(client: reqwest::blocking::Client, base_url: &str, token: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn get_list<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<Vec<T>> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(%url, "fetching");
        let mut req = self.client.get(url).query(query);
        if let Some(t) = &self.token {
            req = req.bearer_auth(t);
        }
        let body: Value = req.send()?.error_for_status()?.json()?;
        Ok(decode_list(path, body))
    }
}

impl BackOffice for HttpBackOffice {
    fn orders(&self, q: &OrderQuery) -> Result<Vec<Order>> {
        let mut params = vec![
            ("branch_id", q.branch_id.clone().unwrap_or_else(|| "ALL".into())),
            ("end_date", q.to.to_string()),
        ];
        if let Some(from) = q.from {
            params.push(("start_date", from.to_string()));
        }
        self.get_list("orders", &params)
    }

    fn products(&self, branch_id: &str) -> Result<Vec<Product>> {
        self.get_list("products", &[("branch_id", branch_id.to_string())])
    }

    fn purchase_orders(&self, branch_id: &str) -> Result<Vec<PurchaseOrder>> {
        self.get_list("purchase-orders", &[("branch_id", branch_id.to_string())])
    }

    fn cogs(&self, period: &Period) -> Result<Vec<CogsSummary>> {
        self.get_list(
            "cogs-summary",
            &[
                ("branch_id", "ALL".to_string()),
                ("start_date", period.start.to_string()),
                ("end_date", period.end.to_string()),
            ],
        )
    }

    fn expenses(&self, period: &Period) -> Result<Vec<Expense>> {
        self.get_list(
            "expenses",
            &[
                ("branch_id", "ALL".to_string()),
                ("start_date", period.start.to_string()),
                ("end_date", period.end.to_string()),
            ],
        )
    }
}

/// JSON export `{orders, products, purchaseOrders, cogs, expenses}`.
#[derive(Debug, Clone, Default)]
pub struct SnapshotFile {
    pub orders: Vec<Order>,
    pub products: Vec<Product>,
    pub purchase_orders: Vec<PurchaseOrder>,
    pub cogs: Vec<CogsSummary>,
    pub expenses: Vec<Expense>,
}

impl SnapshotFile {
    pub fn from_json(content: &str) -> Result<Self> {
        let mut doc: Value = serde_json::from_str(content)?;
        let mut take = |key: &str| doc.get_mut(key).map(Value::take).unwrap_or(Value::Null);
        Ok(Self {
            orders: decode_list("orders", take("orders")),
            products: decode_list("products", take("products")),
            purchase_orders: decode_list("purchaseOrders", take("purchaseOrders")),
            cogs: decode_list("cogs", take("cogs")),
            expenses: decode_list("expenses", take("expenses")),
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

impl BackOffice for SnapshotFile {
    fn orders(&self, q: &OrderQuery) -> Result<Vec<Order>> {
        Ok(self.orders.iter().filter(|o| q.admits(o)).cloned().collect())
    }

    fn products(&self, branch_id: &str) -> Result<Vec<Product>> {
        Ok(self
            .products
            .iter()
            .filter(|p| p.branch_id.as_deref().is_none_or(|b| b == branch_id))
            .cloned()
            .collect())
    }

    fn purchase_orders(&self, branch_id: &str) -> Result<Vec<PurchaseOrder>> {
        Ok(self
            .purchase_orders
            .iter()
            .filter(|po| po.branch_id.as_deref().is_none_or(|b| b == branch_id))
            .cloned()
            .collect())
    }

    fn cogs(&self, _period: &Period) -> Result<Vec<CogsSummary>> {
        Ok(self.cogs.clone())
    }

    fn expenses(&self, period: &Period) -> Result<Vec<Expense>> {
        Ok(self
            .expenses
            .iter()
            .filter(|e| e.date.is_some_and(|d| period.contains(d)))
            .cloned()
            .collect())
    }
}
