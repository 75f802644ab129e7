// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use csv::ReaderBuilder;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use std::str::FromStr;
use tracing::debug;

use crate::error::{Error, Result};

const DATE_KEYS: &[&str] = &["date", "日期"];
const DESCRIPTION_KEYS: &[&str] = &[
    "description",
    "摘要",
    "說明",
    "備註",
    "交易描述",
    "transaction",
    "details",
];
const AMOUNT_KEYS: &[&str] = &["amount", "金額"];

static NON_AMOUNT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9.\-]").expect("static regex"));
static LEADING_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?(\d+\.?\d*|\.\d+)").expect("static regex"));

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%m-%Y", "%m-%d-%Y"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    Matched,
    Unmatched,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRef {
    pub payment_id: String,
    pub order_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BankTransaction {
    pub id: String,
    pub date: NaiveDate,
    pub description: String,
    pub amount: Decimal,
    pub status: MatchStatus,
    pub matched: Option<PaymentRef>,
}

#[derive(Debug, Clone, Copy)]
struct Columns {
    date: usize,
    description: Option<usize>,
    amount: usize,
}

fn find_column(headers: &[String], keys: &[&str], taken: &[usize]) -> Option<usize> {
    headers.iter().enumerate().position(|(i, h)| {
        !taken.contains(&i) && keys.iter().any(|k| h.contains(k))
    })
}

fn resolve_columns(raw: &csv::StringRecord) -> Result<Columns> {
    let headers: Vec<String> = raw
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_lowercase())
        .collect();
    let date = find_column(&headers, DATE_KEYS, &[]);
    let amount = find_column(&headers, AMOUNT_KEYS, &[]);
    match (date, amount) {
        (Some(date), Some(amount)) => {
            // "Transaction Date" must not double as the description column.
            let description = find_column(&headers, DESCRIPTION_KEYS, &[date, amount]);
            Ok(Columns {
                date,
                description,
                amount,
            })
        }
        _ => {
            let mut missing = Vec::new();
            if date.is_none() {
                missing.push("date");
            }
            if amount.is_none() {
                missing.push("amount");
            }
            Err(Error::ColumnsNotFound { missing })
        }
    }
}

/// Keeps digits, `.` and `-`, then reads the longest leading number, so
/// `500.00-` is 500 and `1.2.3` is 1.2. `None` when no number is left.
pub fn clean_amount(raw: &str) -> Option<Decimal> {
    let cleaned = NON_AMOUNT.replace_all(raw, "");
    let number = LEADING_NUMBER.find(&cleaned)?.as_str().trim_end_matches('.');
    let number = match number.strip_prefix('-') {
        Some(rest) if rest.starts_with('.') => format!("-0{}", rest),
        None if number.starts_with('.') => format!("0{}", number),
        _ => number.to_string(),
    };
    Decimal::from_str(&number).ok()
}

/// Year-first dates with `-`, `/` or `.` separators, optionally followed by a
/// time. Year-last dates are read day-first, then month-first.
pub fn normalize_date(raw: &str) -> Option<NaiveDate> {
    let head = raw.split_whitespace().next()?;
    let normalized = head.replace(['.', '/'], "-");
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(&normalized, f).ok())
}

// A quote toggles quoting wherever it appears, `""` inside quotes is a literal
// quote, and only unquoted commas separate fields.
fn split_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}

pub fn parse_statement(content: &str) -> Result<Vec<BankTransaction>> {
    let mut lines = content.lines().filter(|l| !l.trim().is_empty());
    let Some(header_line) = lines.next() else {
        return Err(Error::ColumnsNotFound { missing: vec!["date", "amount"] });
    };
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(header_line.as_bytes());
    let header = match rdr.records().next() {
        Some(h) => h?,
        None => return Err(Error::ColumnsNotFound { missing: vec!["date", "amount"] }),
    };
    let cols = resolve_columns(&header)?;

    let mut out = Vec::new();
    for (idx, line) in lines.enumerate() {
        let rec = split_line(line);
        let field = |i: usize| rec.get(i).map(String::as_str);
        let Some(amount) = field(cols.amount).and_then(clean_amount) else {
            debug!(row = idx + 1, "skipping bank row without a usable amount");
            continue;
        };
        let Some(date) = field(cols.date).and_then(normalize_date) else {
            debug!(row = idx + 1, "skipping bank row with unparsable date");
            continue;
        };
        let description = cols
            .description
            .and_then(field)
            .unwrap_or("")
            .trim()
            .to_string();
        out.push(BankTransaction {
            id: format!("bank-{}", idx),
            date,
            description,
            amount,
            status: MatchStatus::Unmatched,
            matched: None,
        });
    }

    if out.is_empty() {
        return Err(Error::NoTransactions);
    }
    Ok(out)
}

pub fn parse_statement_file(path: &std::path::Path) -> Result<Vec<BankTransaction>> {
    let content = std::fs::read_to_string(path)?;
    parse_statement(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_cleaning_strips_symbols() {
        assert_eq!(clean_amount("$1,234.56"), Some(Decimal::new(123456, 2)));
        assert_eq!(clean_amount("NT$ -500"), Some(Decimal::from(-500)));
        assert_eq!(clean_amount("n/a"), None);
        assert_eq!(clean_amount("1.2.3"), Some(Decimal::new(12, 1)));
        assert_eq!(clean_amount("500.00-"), Some(Decimal::from(500)));
        assert_eq!(clean_amount("-.5"), Some(Decimal::new(-5, 1)));
        assert_eq!(clean_amount("-"), None);
        assert_eq!(clean_amount("--5"), None);
    }

    #[test]
    fn dates_accept_common_separators() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(normalize_date("2024/03/01"), Some(d));
        assert_eq!(normalize_date("2024.03.01"), Some(d));
        assert_eq!(normalize_date("2024-3-1 14:22"), Some(d));
        assert_eq!(normalize_date("01/03/2024"), Some(d));
        assert_eq!(
            normalize_date("12/31/2024"),
            NaiveDate::from_ymd_opt(2024, 12, 31)
        );
        assert_eq!(normalize_date("31/31/2024"), None);
    }
}
