// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rusqlite::Connection;
use serde_json::json;
use tillclose::config::{get_setting, set_setting, Settings};
use tillclose::models::{Order, Period, PeriodKey, Role};

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    tillclose::db::init_schema(&conn).unwrap();
    conn
}

#[test]
fn period_defaults_to_a_single_day() {
    let m = tillclose::cli::build_cli().get_matches_from([
        "tillclose", "report", "stats", "--branch", "b1", "--from", "2024-03-01",
    ]);
    let (_, report) = m.subcommand().unwrap();
    let (name, sub) = report.subcommand().unwrap();
    assert_eq!(name, "stats");

    let key = tillclose::utils::key_from_args(sub, &Settings::default()).unwrap();
    let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    assert_eq!(key.branch_id, "b1");
    assert_eq!(key.period.start, day);
    assert_eq!(key.period.end, day);
    assert!(!sub.get_flag("json"));
}

#[test]
fn reversed_period_is_rejected() {
    let m = tillclose::cli::build_cli().get_matches_from([
        "tillclose", "settlement", "submit", "--branch", "b1", "--from", "2024-03-05", "--to",
        "2024-03-01",
    ]);
    let (_, settlement) = m.subcommand().unwrap();
    let (_, sub) = settlement.subcommand().unwrap();
    let err = tillclose::utils::period_from_args(sub).unwrap_err();
    assert!(err.to_string().contains("start is after end"));
}

#[test]
fn branch_falls_back_to_configured_one() {
    let conn = setup();
    let m = tillclose::cli::build_cli().get_matches_from([
        "tillclose", "settlement", "unlock", "--from", "2024-03-01", "--yes",
    ]);
    let (_, settlement) = m.subcommand().unwrap();
    let (_, sub) = settlement.subcommand().unwrap();
    assert!(sub.get_flag("yes"));

    assert!(tillclose::utils::branch_from_args(sub, &Settings::load(&conn).unwrap()).is_err());
    set_setting(&conn, "branch", "taipei-01").unwrap();
    let settings = Settings::load(&conn).unwrap();
    assert_eq!(
        tillclose::utils::branch_from_args(sub, &settings).unwrap(),
        "taipei-01"
    );
}

#[test]
fn settings_validate_keys_and_roles() {
    let conn = setup();
    assert!(set_setting(&conn, "colour", "blue").is_err());
    assert!(set_setting(&conn, "role", "owner").is_err());

    set_setting(&conn, "role", " Manager ").unwrap();
    set_setting(&conn, "user", "ana").unwrap();
    set_setting(&conn, "api_url", "").unwrap();
    let settings = Settings::load(&conn).unwrap();
    assert_eq!(settings.role, Role::Manager);
    assert_eq!(settings.created_by(), "ana");
    assert!(settings.api_url.is_none());
    assert_eq!(get_setting(&conn, "role").unwrap().as_deref(), Some("Manager"));

    set_setting(&conn, "user", "ben").unwrap();
    assert_eq!(Settings::load(&conn).unwrap().created_by(), "ben");
    assert_eq!(Settings::default().created_by(), "unknown");
}

#[test]
fn doctor_flags_inconsistent_orders() {
    let orders: Vec<Order> = serde_json::from_value(json!([
        {
            "id": "ok", "branchId": "b1", "subtotal": 100, "totalDiscount": 10,
            "taxAmount": 5, "total": 95, "status": "COMPLETED",
            "payments": [{"method": "Card", "amount": 95}],
            "createdAt": "2024-03-01T10:00:00Z"
        },
        {
            "id": "off", "branchId": "b1", "subtotal": 100, "total": 90, "status": "COMPLETED",
            "payments": [{"method": "Card", "amount": 50}, {"method": "Refund", "amount": -5}],
            "createdAt": "2024-03-01T10:00:00Z"
        },
        {
            "id": "legacy", "branchId": "b1", "subtotal": 1, "total": 1, "status": "CLOSED",
            "payments": [{"method": "Cash", "amount": 1}],
            "createdAt": "2024-03-01T10:00:00Z"
        },
        {
            "id": "void", "branchId": "b1", "subtotal": 0, "total": 999, "status": "VOID",
            "createdAt": "2024-03-01T10:00:00Z"
        }
    ]))
    .unwrap();

    let issues = tillclose::commands::doctor::check_orders(&orders);
    let kinds: Vec<(&str, &str)> = issues
        .iter()
        .map(|i| (i.kind, i.detail.split(':').next().unwrap()))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("total_mismatch", "off"),
            ("completed_underpaid", "off"),
            ("negative_payment", "off"),
            ("unknown_status", "legacy"),
        ]
    );
}

#[test]
fn doctor_only_checks_orders_in_the_period() {
    let orders: Vec<Order> = serde_json::from_value(json!([
        {
            "id": "backdated", "branchId": "b1", "subtotal": 100, "total": 1, "status": "COMPLETED",
            "createdAt": "2024-03-01T10:00:00Z", "businessDate": "2024-02-28"
        },
        {
            "id": "other-branch", "branchId": "b2", "subtotal": 100, "total": 1, "status": "COMPLETED",
            "createdAt": "2024-03-01T10:00:00Z"
        },
        {
            "id": "moved-in", "branchId": "b1", "subtotal": 100, "total": 1, "status": "PENDING",
            "createdAt": "2024-03-02T10:00:00Z", "businessDate": "2024-03-01"
        }
    ]))
    .unwrap();
    let key = PeriodKey::new("b1", Period::day(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()));

    let issues = tillclose::commands::doctor::check_period(&orders, &key);
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].kind, "total_mismatch");
    assert!(issues[0].detail.starts_with("moved-in:"));
}
