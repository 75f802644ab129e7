// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::io::Write;
use tempfile::NamedTempFile;
use tillclose::bank_statement::{parse_statement, parse_statement_file, MatchStatus};
use tillclose::error::Error;

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[test]
fn parses_simple_statement() {
    let csv = "Date,Description,Amount\n2024-03-01,POS Settlement,500.00\n";
    let txs = parse_statement(csv).unwrap();
    assert_eq!(txs.len(), 1);
    let tx = &txs[0];
    assert_eq!(tx.id, "bank-0");
    assert_eq!(tx.date, d("2024-03-01"));
    assert_eq!(tx.description, "POS Settlement");
    assert_eq!(tx.amount, Decimal::new(50000, 2));
    assert_eq!(tx.status, MatchStatus::Unmatched);
    assert!(tx.matched.is_none());
}

#[test]
fn quoted_fields_keep_commas_and_quotes() {
    let csv = concat!(
        "Transaction Date,Details,Amount\r\n",
        "2024/03/02,\"Payment, \"\"ref#123\"\"\",\"$1,234.56\"\r\n",
    );
    let txs = parse_statement(csv).unwrap();
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].description, "Payment, \"ref#123\"");
    assert_eq!(txs[0].amount, Decimal::new(123456, 2));
    assert_eq!(txs[0].date, d("2024-03-02"));
}

#[test]
fn headers_are_matched_case_insensitively_in_any_order() {
    let csv = "\u{feff}AMOUNT,memo,POSTING DATE\n-12.30,fee,2024.03.04\n";
    let txs = parse_statement(csv).unwrap();
    assert_eq!(txs[0].amount, Decimal::new(-1230, 2));
    assert_eq!(txs[0].date, d("2024-03-04"));
    assert_eq!(txs[0].description, "");
}

#[test]
fn chinese_headers_are_recognised() {
    let csv = "交易日期,摘要,金額\n2024-03-01,刷卡收入,\"NT$1,000\"\n";
    let txs = parse_statement(csv).unwrap();
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].description, "刷卡收入");
    assert_eq!(txs[0].amount, Decimal::from(1000));
}

#[test]
fn missing_columns_are_reported() {
    let err = parse_statement("Description,Value\nfoo,1\n").unwrap_err();
    match err {
        Error::ColumnsNotFound { missing } => assert_eq!(missing, vec!["date", "amount"]),
        other => panic!("unexpected error: {other}"),
    }
    let err = parse_statement("Date,Description\n2024-03-01,foo\n").unwrap_err();
    assert!(matches!(err, Error::ColumnsNotFound { ref missing } if missing == &vec!["amount"]));
    assert!(matches!(
        parse_statement("").unwrap_err(),
        Error::ColumnsNotFound { .. }
    ));
}

#[test]
fn header_only_statement_has_no_transactions() {
    let err = parse_statement("Date,Description,Amount\n").unwrap_err();
    assert!(matches!(err, Error::NoTransactions));
    assert_eq!(err.to_string(), "No transactions parsed from bank statement");
}

#[test]
fn unusable_rows_are_skipped() {
    let csv = concat!(
        "Date,Description,Amount\n",
        "2024-03-01,ok,10\n",
        "2024-03-01,no amount,n/a\n",
        "not a date,bad date,5\n",
        "\n",
        "2024-03-03,short\n",
        "2024-03-04,last,7.25\n",
    );
    let txs = parse_statement(csv).unwrap();
    let ids: Vec<&str> = txs.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids.len(), 2);
    assert_eq!(ids[0], "bank-0");
    assert_eq!(txs[1].description, "last");
    assert_eq!(txs[1].amount, Decimal::new(725, 2));
}

#[test]
fn only_unusable_rows_is_an_error() {
    let csv = "Date,Description,Amount\nsoon,x,1\n2024-03-01,y,--\n";
    assert!(matches!(
        parse_statement(csv).unwrap_err(),
        Error::NoTransactions
    ));
}

#[test]
fn parsing_is_deterministic() {
    let csv = "Date,Description,Amount\n2024-03-01,a,1\n2024-03-02,b,2\n";
    assert_eq!(parse_statement(csv).unwrap(), parse_statement(csv).unwrap());
}

#[test]
fn reads_statement_from_file() {
    let mut f = NamedTempFile::new().unwrap();
    writeln!(f, "Date,Description,Amount").unwrap();
    writeln!(f, "2024-03-01,Card batch,\"1,500.00\"").unwrap();
    let txs = parse_statement_file(f.path()).unwrap();
    assert_eq!(txs[0].amount, Decimal::from(1500));

    let missing = f.path().with_extension("does-not-exist");
    assert!(matches!(
        parse_statement_file(&missing).unwrap_err(),
        Error::Io(_)
    ));
}

#[test]
fn quotes_opening_mid_field_still_protect_commas() {
    let csv = concat!(
        "Date,Description,Amount\n",
        "2024-03-01,Ref \"A, B\",500\n",
        "2024-03-02,ok,1\n",
    );
    let txs = parse_statement(csv).unwrap();
    assert_eq!(txs.len(), 2);
    assert_eq!(txs[0].description, "Ref A, B");
    assert_eq!(txs[0].amount, Decimal::from(500));
    assert_eq!(txs[1].description, "ok");
}

#[test]
fn amounts_keep_their_leading_number() {
    let csv = concat!(
        "Date,Description,Amount\n",
        "2024-03-01,debit,500.00-\n",
        "2024-03-01,odd,1.2.3\n",
        "2024-03-01,plain,1\n",
    );
    let amounts: Vec<Decimal> = parse_statement(csv)
        .unwrap()
        .into_iter()
        .map(|t| t.amount)
        .collect();
    assert_eq!(
        amounts,
        vec![Decimal::from(500), Decimal::new(12, 1), Decimal::from(1)]
    );
}

#[test]
fn year_last_dates_read_day_first() {
    let csv = concat!(
        "Date,Description,Amount\n",
        "01/03/2024,day first,10\n",
        "12/31/2024,month first,20\n",
    );
    let txs = parse_statement(csv).unwrap();
    assert_eq!(txs[0].date, d("2024-03-01"));
    assert_eq!(txs[1].date, d("2024-12-31"));
}
