// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::aggregator::Stats;
use crate::error::{Error, Result};
use crate::models::{lenient, PeriodKey, Role};
use crate::utils::decimal_or_zero;

pub const ALREADY_SUBMITTED: &str = "ALREADY_SUBMITTED";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SettlementStatus {
    #[default]
    #[serde(alias = "submitted", alias = "LOCKED", alias = "locked")]
    Submitted,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySettlement {
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub branch_id: String,
    #[serde(deserialize_with = "lenient::date")]
    pub start_date: NaiveDate,
    #[serde(deserialize_with = "lenient::date")]
    pub end_date: NaiveDate,
    #[serde(default, with = "money")]
    pub total_revenue: Decimal,
    #[serde(default, deserialize_with = "lenient::count")]
    pub total_orders: u64,
    #[serde(default, with = "money")]
    pub cash_in_drawer: Decimal,
    #[serde(default, with = "money")]
    pub total_cogs: Decimal,
    #[serde(default, with = "money")]
    pub total_expenses: Decimal,
    #[serde(default, with = "money")]
    pub gross_profit: Decimal,
    #[serde(default, with = "money")]
    pub net_profit: Decimal,
    #[serde(default, deserialize_with = "lenient::string")]
    pub created_by: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub status: SettlementStatus,
}

/// JSON numbers on the wire, lenient on the way in.
mod money {
    use rust_decimal::Decimal;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &Decimal, s: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(v, s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Decimal, D::Error> {
        crate::models::lenient::decimal(d)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettlementRequest {
    pub id: String,
    pub branch_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(with = "money")]
    pub total_revenue: Decimal,
    pub total_orders: u64,
    #[serde(with = "money")]
    pub cash_in_drawer: Decimal,
    #[serde(with = "money")]
    pub total_cogs: Decimal,
    #[serde(with = "money")]
    pub total_expenses: Decimal,
    #[serde(with = "money")]
    pub gross_profit: Decimal,
    #[serde(with = "money")]
    pub net_profit: Decimal,
    pub created_by: String,
}

impl SettlementRequest {
    pub fn from_stats(key: &PeriodKey, stats: &Stats, created_by: &str) -> Self {
        Self {
            id: format!(
                "stl-{}-{}-{}",
                key.branch_id, key.period.start, key.period.end
            ),
            branch_id: key.branch_id.clone(),
            start_date: key.period.start,
            end_date: key.period.end,
            total_revenue: stats.total_revenue,
            total_orders: stats.total_count as u64,
            cash_in_drawer: stats.cash_in_drawer,
            total_cogs: stats.cogs,
            total_expenses: stats.total_expenses,
            gross_profit: stats.gross_profit,
            net_profit: stats.net_profit,
            created_by: created_by.to_string(),
        }
    }

    fn into_record(self) -> DailySettlement {
        DailySettlement {
            id: self.id,
            branch_id: self.branch_id,
            start_date: self.start_date,
            end_date: self.end_date,
            total_revenue: self.total_revenue,
            total_orders: self.total_orders,
            cash_in_drawer: self.cash_in_drawer,
            total_cogs: self.total_cogs,
            total_expenses: self.total_expenses,
            gross_profit: self.gross_profit,
            net_profit: self.net_profit,
            created_by: self.created_by,
            created_at: None,
            status: SettlementStatus::Submitted,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnlockRequest {
    pub branch_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub role: Role,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettlementResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub settlement: Option<DailySettlement>,
    #[serde(default)]
    pub error: Option<String>,
}

impl SettlementResponse {
    fn ok(settlement: Option<DailySettlement>) -> Self {
        Self {
            success: true,
            settlement,
            ..Default::default()
        }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Default::default()
        }
    }

    fn already_submitted(existing: DailySettlement) -> Self {
        Self {
            code: Some(ALREADY_SUBMITTED.to_string()),
            settlement: Some(existing),
            ..Default::default()
        }
    }
}

pub trait SettlementApi {
    fn fetch(&self, key: &PeriodKey) -> Result<SettlementResponse>;
    fn submit(&self, req: &SettlementRequest) -> Result<SettlementResponse>;
    fn unlock(&self, req: &UnlockRequest) -> Result<SettlementResponse>;
}

impl<T: SettlementApi + ?Sized> SettlementApi for Box<T> {
    fn fetch(&self, key: &PeriodKey) -> Result<SettlementResponse> {
        (**self).fetch(key)
    }

    fn submit(&self, req: &SettlementRequest) -> Result<SettlementResponse> {
        (**self).submit(req)
    }

    fn unlock(&self, req: &UnlockRequest) -> Result<SettlementResponse> {
        (**self).unlock(req)
    }
}

pub struct HttpSettlementApi {
    client: reqwest::blocking::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpSettlementApi {
    pub fn new(client: reqwest::blocking::Client, base_url: &str, token: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn authorize(
        &self,
        req: reqwest::blocking::RequestBuilder,
    ) -> reqwest::blocking::RequestBuilder {
        match &self.token {
            Some(t) => req.bearer_auth(t),
            None => req,
        }
    }
}

// Conflict answers may arrive with a 4xx status and a JSON body, so the body
// is read before the status is judged.
fn read_response(resp: reqwest::blocking::Response) -> Result<SettlementResponse> {
    let status = resp.status();
    let body = resp.text()?;
    match serde_json::from_str::<SettlementResponse>(&body) {
        Ok(r) => Ok(r),
        Err(_) if !status.is_success() => Err(Error::Api(format!("HTTP {}", status))),
        Err(e) => Err(e.into()),
    }
}

impl SettlementApi for HttpSettlementApi {
    fn fetch(&self, key: &PeriodKey) -> Result<SettlementResponse> {
        let url = format!("{}/settlements", self.base_url);
        let req = self.client.get(url).query(&[
            ("branch_id", key.branch_id.clone()),
            ("start_date", key.period.start.to_string()),
            ("end_date", key.period.end.to_string()),
        ]);
        read_response(self.authorize(req).send()?)
    }

    fn submit(&self, body: &SettlementRequest) -> Result<SettlementResponse> {
        let url = format!("{}/settlements", self.base_url);
        read_response(self.authorize(self.client.post(url).json(body)).send()?)
    }

    fn unlock(&self, body: &UnlockRequest) -> Result<SettlementResponse> {
        let url = format!("{}/settlements/unlock", self.base_url);
        read_response(self.authorize(self.client.post(url).json(body)).send()?)
    }
}

pub struct LocalSettlementStore<'a> {
    conn: &'a Connection,
}

impl<'a> LocalSettlementStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn load(
        &self,
        branch_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<DailySettlement>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, branch_id, start_date, end_date, total_revenue, total_orders,
                        cash_in_drawer, total_cogs, total_expenses, gross_profit, net_profit,
                        created_by, created_at
                 FROM settlements WHERE branch_id=?1 AND start_date=?2 AND end_date=?3",
                params![branch_id, start.to_string(), end.to_string()],
                |r| {
                    let amount = |i: usize| -> rusqlite::Result<Decimal> {
                        Ok(decimal_or_zero(&r.get::<_, String>(i)?))
                    };
                    Ok(DailySettlement {
                        id: r.get(0)?,
                        branch_id: r.get(1)?,
                        start_date: start,
                        end_date: end,
                        total_revenue: amount(4)?,
                        total_orders: r.get::<_, i64>(5)?.max(0) as u64,
                        cash_in_drawer: amount(6)?,
                        total_cogs: amount(7)?,
                        total_expenses: amount(8)?,
                        gross_profit: amount(9)?,
                        net_profit: amount(10)?,
                        created_by: r.get(11)?,
                        created_at: r.get(12)?,
                        status: SettlementStatus::Submitted,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }
}

impl SettlementApi for LocalSettlementStore<'_> {
    fn fetch(&self, key: &PeriodKey) -> Result<SettlementResponse> {
        match self.load(&key.branch_id, key.period.start, key.period.end)? {
            Some(s) => Ok(SettlementResponse::ok(Some(s))),
            None => Ok(SettlementResponse::default()),
        }
    }

    fn submit(&self, req: &SettlementRequest) -> Result<SettlementResponse> {
        let inserted = self.conn.execute(
            "INSERT INTO settlements(id, branch_id, start_date, end_date, total_revenue, total_orders,
                cash_in_drawer, total_cogs, total_expenses, gross_profit, net_profit, created_by)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12)
             ON CONFLICT(branch_id, start_date, end_date) DO NOTHING",
            params![
                req.id,
                req.branch_id,
                req.start_date.to_string(),
                req.end_date.to_string(),
                req.total_revenue.to_string(),
                req.total_orders as i64,
                req.cash_in_drawer.to_string(),
                req.total_cogs.to_string(),
                req.total_expenses.to_string(),
                req.gross_profit.to_string(),
                req.net_profit.to_string(),
                req.created_by,
            ],
        )?;
        let stored = self.load(&req.branch_id, req.start_date, req.end_date)?;
        match (inserted, stored) {
            (0, Some(existing)) => Ok(SettlementResponse::already_submitted(existing)),
            (_, Some(s)) => Ok(SettlementResponse::ok(Some(s))),
            (_, None) => Ok(SettlementResponse::failed("settlement was not stored")),
        }
    }

    fn unlock(&self, req: &UnlockRequest) -> Result<SettlementResponse> {
        if !req.role.can_unlock() {
            return Ok(SettlementResponse::failed(format!(
                "role '{}' may not unlock settlements",
                req.role
            )));
        }
        let removed = self.conn.execute(
            "DELETE FROM settlements WHERE branch_id=?1 AND start_date=?2 AND end_date=?3",
            params![req.branch_id, req.start_date.to_string(), req.end_date.to_string()],
        )?;
        if removed == 0 {
            return Ok(SettlementResponse::failed("no settlement exists for this period"));
        }
        Ok(SettlementResponse::ok(None))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LockState {
    Open,
    Locked(DailySettlement),
}

impl LockState {
    pub fn is_locked(&self) -> bool {
        matches!(self, LockState::Locked(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Submitted(DailySettlement),
    AlreadySubmitted(DailySettlement),
}

impl SubmitOutcome {
    pub fn settlement(&self) -> &DailySettlement {
        match self {
            SubmitOutcome::Submitted(s) | SubmitOutcome::AlreadySubmitted(s) => s,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockOutcome {
    Unlocked,
    Cancelled,
}

pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

pub struct SettlementLifecycle<A> {
    api: A,
}

impl<A: SettlementApi> SettlementLifecycle<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    pub fn status(&self, key: &PeriodKey) -> Result<LockState> {
        let resp = self.api.fetch(key)?;
        Ok(match resp.settlement {
            Some(s) if resp.success => LockState::Locked(s),
            _ => LockState::Open,
        })
    }

    pub fn submit(&self, key: &PeriodKey, stats: &Stats, created_by: &str) -> Result<SubmitOutcome> {
        let req = SettlementRequest::from_stats(key, stats, created_by);
        let resp = self.api.submit(&req)?;
        if resp.success {
            info!(%key, "settlement submitted");
            let record = resp.settlement.unwrap_or_else(|| req.into_record());
            return Ok(SubmitOutcome::Submitted(record));
        }
        if resp.code.as_deref() == Some(ALREADY_SUBMITTED) {
            info!(%key, "settlement already submitted; loading existing record");
            let existing = match resp.settlement {
                Some(s) => Some(s),
                None => match self.status(key)? {
                    LockState::Locked(s) => Some(s),
                    LockState::Open => None,
                },
            };
            return existing
                .map(SubmitOutcome::AlreadySubmitted)
                .ok_or_else(|| Error::Api("already submitted but no record returned".into()));
        }
        let msg = resp.error.unwrap_or_else(|| "submission rejected".to_string());
        warn!(%key, error = %msg, "settlement submit failed");
        Err(Error::Api(msg))
    }

    /// Role check first, then confirmation; nothing reaches the backend
    /// unless both pass.
    pub fn unlock(
        &self,
        key: &PeriodKey,
        role: Role,
        confirm: &mut dyn Confirm,
    ) -> Result<UnlockOutcome> {
        if !role.can_unlock() {
            return Err(Error::Unauthorized {
                role: role.to_string(),
            });
        }
        let prompt = format!(
            "Unlock settlement for branch {} ({})? The period can then be changed and resubmitted.",
            key.branch_id, key.period
        );
        if !confirm.confirm(&prompt)? {
            return Ok(UnlockOutcome::Cancelled);
        }
        let req = UnlockRequest {
            branch_id: key.branch_id.clone(),
            start_date: key.period.start,
            end_date: key.period.end,
            role,
        };
        let resp = self.api.unlock(&req)?;
        if resp.success {
            info!(%key, %role, "settlement unlocked");
            Ok(UnlockOutcome::Unlocked)
        } else {
            let msg = resp.error.unwrap_or_else(|| "unlock rejected".to_string());
            warn!(%key, error = %msg, "settlement unlock failed");
            Err(Error::Api(msg))
        }
    }
}
