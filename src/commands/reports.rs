// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::aggregator::{BranchStats, Stats};
use crate::config::Settings;
use crate::dashboard::{self, Dashboard};
use crate::settlement::{LockState, SettlementLifecycle};
use crate::utils::{
    branch_from_args, fmt_money, key_from_args, maybe_print_json, open_backoffice, parse_date,
    period_from_args, pretty_table, report_failures, settlement_api,
};
use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let settings = Settings::load(conn)?;
    match m.subcommand() {
        Some(("stats", sub)) => stats(conn, &settings, sub)?,
        Some(("branches", sub)) => branches(&settings, sub)?,
        Some(("balance", sub)) => balance(&settings, sub)?,
        _ => {}
    }
    Ok(())
}

#[derive(Serialize)]
struct StatsReport<'a> {
    branch_id: &'a str,
    start_date: String,
    end_date: String,
    locked: bool,
    #[serde(flatten)]
    stats: &'a Stats,
}

pub fn stats_rows(stats: &Stats) -> Vec<Vec<String>> {
    let mut rows = vec![
        vec!["Revenue".into(), fmt_money(&stats.total_revenue)],
        vec!["Orders".into(), stats.total_count.to_string()],
        vec!["Cash in drawer".into(), fmt_money(&stats.cash_in_drawer)],
        vec!["Taxable sales".into(), fmt_money(&stats.taxable_sales)],
        vec!["Tax".into(), fmt_money(&stats.total_tax)],
        vec!["COGS".into(), fmt_money(&stats.cogs)],
        vec!["Gross profit".into(), fmt_money(&stats.gross_profit)],
        vec!["Gross margin %".into(), fmt_money(&stats.gross_margin)],
        vec!["Expenses".into(), fmt_money(&stats.total_expenses)],
        vec!["Net profit".into(), fmt_money(&stats.net_profit)],
    ];
    for (method, amount) in &stats.methods {
        rows.push(vec![format!("  {}", method), fmt_money(amount)]);
    }
    rows
}

fn stats(conn: &Connection, settings: &Settings, sub: &clap::ArgMatches) -> Result<()> {
    let key = key_from_args(sub, settings)?;
    let source = open_backoffice(sub, settings)?;
    let lifecycle = SettlementLifecycle::new(settlement_api(conn, settings)?);

    let mut board = Dashboard::new(key.clone());
    board.refresh(source.as_ref(), &lifecycle);
    report_failures(&board.failures());

    let stats = board.stats();
    let report = StatsReport {
        branch_id: &key.branch_id,
        start_date: key.period.start.to_string(),
        end_date: key.period.end.to_string(),
        locked: board.is_locked(),
        stats: &stats,
    };
    if !maybe_print_json(sub.get_flag("json"), &report)? {
        println!("{}", pretty_table(&["Metric", "Value"], stats_rows(&stats)));
        match board.lock_state() {
            Some(LockState::Locked(s)) => println!(
                "Period is settled (by {}, net profit {}).",
                s.created_by,
                fmt_money(&s.net_profit)
            ),
            Some(LockState::Open) => println!("Period is open."),
            None => println!("Settlement status unknown."),
        }
    }
    Ok(())
}

fn branches(settings: &Settings, sub: &clap::ArgMatches) -> Result<()> {
    let period = period_from_args(sub)?;
    let source = open_backoffice(sub, settings)?;
    let (rows, failures) = dashboard::compare_branches(source.as_ref(), &period);
    report_failures(&failures);
    if !maybe_print_json(sub.get_flag("json"), &rows)? {
        let data = rows.iter().map(branch_row).collect();
        println!(
            "{}",
            pretty_table(
                &["Branch", "Orders", "Revenue", "COGS", "Gross", "Margin %", "Expenses", "Net"],
                data,
            )
        );
    }
    Ok(())
}

fn branch_row(b: &BranchStats) -> Vec<String> {
    vec![
        b.branch_id.clone(),
        b.stats.total_count.to_string(),
        fmt_money(&b.stats.total_revenue),
        fmt_money(&b.stats.cogs),
        fmt_money(&b.stats.gross_profit),
        fmt_money(&b.stats.gross_margin),
        fmt_money(&b.stats.total_expenses),
        fmt_money(&b.stats.net_profit),
    ]
}

fn balance(settings: &Settings, sub: &clap::ArgMatches) -> Result<()> {
    let branch = branch_from_args(sub, settings)?;
    let cutoff = parse_date(sub.get_one::<String>("as_of").unwrap().trim())?;
    let source = open_backoffice(sub, settings)?;
    let (snap, failures) = dashboard::balance_sheet(source.as_ref(), &branch, cutoff);
    report_failures(&failures);
    if !maybe_print_json(sub.get_flag("json"), &snap)? {
        let rows = vec![
            vec!["Cash".into(), fmt_money(&snap.cash)],
            vec!["Inventory (current stock)".into(), fmt_money(&snap.inventory)],
            vec!["Receivable".into(), fmt_money(&snap.receivable)],
            vec!["Payable".into(), fmt_money(&snap.payable)],
            vec!["Net position".into(), fmt_money(&snap.net_position())],
        ];
        println!("{}", pretty_table(&["Item", "Amount"], rows));
        println!("Estimate from operational data as of end of {}; not audited.", cutoff);
    }
    Ok(())
}
