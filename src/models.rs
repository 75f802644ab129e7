// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Serde helpers for upstream records that may carry malformed numbers,
/// numeric ids or timestamp-shaped dates.
pub mod lenient {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use crate::utils::{date_prefix, decimal_from_value};

    pub fn decimal<'de, D: Deserializer<'de>>(d: D) -> Result<Decimal, D::Error> {
        let v = Value::deserialize(d)?;
        Ok(decimal_from_value(&v))
    }

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        let v = Value::deserialize(d)?;
        Ok(match v {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        })
    }

    pub fn optional_date<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let v = Value::deserialize(d)?;
        Ok(v.as_str().and_then(date_prefix))
    }

    pub fn date<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        let v = Value::deserialize(d)?;
        v.as_str()
            .and_then(date_prefix)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date {}", v)))
    }

    pub fn count<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
        use rust_decimal::prelude::ToPrimitive;
        let v = Value::deserialize(d)?;
        Ok(decimal_from_value(&v).trunc().to_u64().unwrap_or(0))
    }

    pub fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        let v = Value::deserialize(d)?;
        Ok(match v {
            Value::Bool(b) => b,
            Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
            Value::String(s) => matches!(s.trim(), "true" | "1"),
            _ => false,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Partial,
    Completed,
    Void,
    /// Legacy or unrecognised status; counted like a normal order but never
    /// treated as receivable.
    #[default]
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    pub fn is_open(self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Partial)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub unit_price: Decimal,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub discount: Decimal,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub quantity: Decimal,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub unit_cost: Decimal,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_return: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    #[serde(default, deserialize_with = "lenient::string")]
    pub method: String,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub amount: Decimal,
}

impl Payment {
    pub fn is_cash(&self) -> bool {
        self.method.contains("Cash")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(alias = "branch_id", deserialize_with = "lenient::string")]
    pub branch_id: String,
    #[serde(default)]
    pub items: Vec<LineItem>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub subtotal: Decimal,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub total_discount: Decimal,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub tax_amount: Decimal,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub tax_rate: Decimal,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub total: Decimal,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub payments: Vec<Payment>,
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "lenient::optional_date")]
    pub business_date: Option<NaiveDate>,
}

impl Order {
    pub fn is_void(&self) -> bool {
        self.status == OrderStatus::Void
    }

    pub fn created_date(&self) -> NaiveDate {
        self.created_at.date_naive()
    }

    /// Accounting date: the business date when a manager set one, otherwise
    /// the UTC calendar date of creation.
    pub fn accounting_date(&self) -> NaiveDate {
        self.business_date.unwrap_or_else(|| self.created_date())
    }

    pub fn paid(&self) -> Decimal {
        self.payments.iter().map(|p| p.amount).sum()
    }

    pub fn outstanding(&self) -> Decimal {
        (self.total - self.paid()).max(Decimal::ZERO)
    }

    pub fn expected_total(&self) -> Decimal {
        self.subtotal - self.total_discount + self.tax_amount
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(alias = "branch_id", deserialize_with = "lenient::string")]
    pub branch_id: String,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub amount: Decimal,
    #[serde(default, deserialize_with = "lenient::optional_date")]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CogsSummary {
    #[serde(deserialize_with = "lenient::string")]
    pub branch_id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub total_cogs: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub total_qty: String,
}

impl CogsSummary {
    pub fn cogs(&self) -> Decimal {
        crate::utils::decimal_or_zero(&self.total_cogs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "branch_id")]
    pub branch_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub cost: Decimal,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub stock: Decimal,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub track_stock: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PurchaseOrderStatus {
    Draft,
    Sent,
    Received,
    Cancelled,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrder {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(default, alias = "branch_id")]
    pub branch_id: Option<String>,
    #[serde(default)]
    pub status: PurchaseOrderStatus,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidPeriod { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeriodKey {
    pub branch_id: String,
    pub period: Period,
}

impl PeriodKey {
    pub fn new(branch_id: impl Into<String>, period: Period) -> Self {
        Self {
            branch_id: branch_id.into(),
            period,
        }
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.branch_id, self.period)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Staff,
    Cashier,
    Manager,
    Admin,
}

impl Role {
    pub fn can_unlock(self) -> bool {
        matches!(self, Role::Manager | Role::Admin)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Staff => "staff",
            Role::Cashier => "cashier",
            Role::Manager => "manager",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "staff" => Ok(Role::Staff),
            "cashier" => Ok(Role::Cashier),
            "manager" => Ok(Role::Manager),
            "admin" => Ok(Role::Admin),
            other => Err(anyhow::anyhow!(
                "Unknown role '{}', expected staff|cashier|manager|admin",
                other
            )),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
