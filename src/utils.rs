// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde_json::Value;
use std::path::Path;
use std::str::FromStr;

use crate::backoffice::{BackOffice, HttpBackOffice, SnapshotFile};
use crate::config::Settings;
use crate::dashboard::SourceFailure;
use crate::models::{Period, PeriodKey};
use crate::settlement::{HttpSettlementApi, LocalSettlementStore, SettlementApi};

const UA: &str = concat!(
    "tillclose/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/alphavelocity/tillclose)"
);

pub fn http_client() -> Result<reqwest::blocking::Client> {
    let c = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(15))
        .user_agent(UA)
        .build()?;
    Ok(c)
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

/// Parses a decimal string, falling back to zero for anything that is not a
/// finite number.
pub fn decimal_or_zero(s: &str) -> Decimal {
    let s = s.trim();
    if s.is_empty() {
        return Decimal::ZERO;
    }
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .unwrap_or(Decimal::ZERO)
}

pub fn decimal_from_value(v: &Value) -> Decimal {
    match v {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Decimal::from(i)
            } else if let Some(u) = n.as_u64() {
                Decimal::from(u)
            } else {
                decimal_or_zero(&n.to_string())
            }
        }
        Value::String(s) => decimal_or_zero(s),
        _ => Decimal::ZERO,
    }
}

/// Accepts `YYYY-MM-DD` or anything starting with it (ISO timestamps).
pub fn date_prefix(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let head = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

pub fn fmt_money(d: &Decimal) -> String {
    format!("{:.2}", d.round_dp(2))
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(json_flag: bool, v: &T) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    Ok(false)
}

pub fn period_from_args(sub: &clap::ArgMatches) -> Result<Period> {
    let start = parse_date(sub.get_one::<String>("from").unwrap().trim())?;
    let end = match sub.get_one::<String>("to") {
        Some(raw) => parse_date(raw.trim())?,
        None => start,
    };
    Ok(Period::new(start, end)?)
}

pub fn branch_from_args(sub: &clap::ArgMatches, settings: &Settings) -> Result<String> {
    sub.get_one::<String>("branch")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| settings.branch.clone())
        .context("No branch given; pass --branch or run `config set branch <id>`")
}

pub fn key_from_args(sub: &clap::ArgMatches, settings: &Settings) -> Result<PeriodKey> {
    Ok(PeriodKey::new(
        branch_from_args(sub, settings)?,
        period_from_args(sub)?,
    ))
}

pub fn open_backoffice(sub: &clap::ArgMatches, settings: &Settings) -> Result<Box<dyn BackOffice>> {
    if let Some(path) = sub.try_get_one::<String>("data").ok().flatten() {
        let path = path.trim();
        let snap = SnapshotFile::load(Path::new(path))
            .with_context(|| format!("Read snapshot {}", path))?;
        return Ok(Box::new(snap));
    }
    let url = settings
        .api_url
        .as_deref()
        .context("No data source: pass --data <file> or run `config set api_url <url>`")?;
    Ok(Box::new(HttpBackOffice::new(
        http_client()?,
        url,
        settings.api_token.clone(),
    )))
}

pub fn settlement_api<'a>(
    conn: &'a Connection,
    settings: &Settings,
) -> Result<Box<dyn SettlementApi + 'a>> {
    match settings.api_url.as_deref() {
        Some(url) => Ok(Box::new(HttpSettlementApi::new(
            http_client()?,
            url,
            settings.api_token.clone(),
        ))),
        None => Ok(Box::new(LocalSettlementStore::new(conn))),
    }
}

pub fn report_failures(failures: &[SourceFailure]) {
    for f in failures {
        eprintln!("warning: {} unavailable ({}); shown as empty", f.source, f.message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn garbage_numbers_become_zero() {
        assert_eq!(decimal_or_zero("NaN"), Decimal::ZERO);
        assert_eq!(decimal_or_zero(""), Decimal::ZERO);
        assert_eq!(decimal_or_zero("12.5x"), Decimal::ZERO);
        assert_eq!(decimal_or_zero(" 12.50 "), Decimal::new(1250, 2));
        assert_eq!(decimal_from_value(&json!(null)), Decimal::ZERO);
        assert_eq!(decimal_from_value(&json!({"a": 1})), Decimal::ZERO);
        assert_eq!(decimal_from_value(&json!("7")), Decimal::from(7));
        assert_eq!(decimal_from_value(&json!(0.1)), Decimal::new(1, 1));
    }

    #[test]
    fn date_prefix_reads_timestamps() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(date_prefix("2024-03-01"), Some(d));
        assert_eq!(date_prefix("2024-03-01T23:10:00.000Z"), Some(d));
        assert_eq!(date_prefix("yesterday"), None);
    }
}
