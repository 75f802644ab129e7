// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::reports::stats_rows;
use crate::config::Settings;
use crate::dashboard::Dashboard;
use crate::error;
use crate::settlement::{
    Confirm, DailySettlement, LockState, SettlementLifecycle, SubmitOutcome, UnlockOutcome,
};
use crate::utils::{
    fmt_money, key_from_args, maybe_print_json, open_backoffice, pretty_table, report_failures,
    settlement_api,
};
use anyhow::{anyhow, Result};
use rusqlite::Connection;
use std::io::{BufRead, Write};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let settings = Settings::load(conn)?;
    match m.subcommand() {
        Some(("status", sub)) => status(conn, &settings, sub)?,
        Some(("submit", sub)) => submit(conn, &settings, sub)?,
        Some(("unlock", sub)) => unlock(conn, &settings, sub)?,
        _ => {}
    }
    Ok(())
}

/// Interactive y/N prompt on the terminal; `--yes` answers for the operator.
pub struct TerminalConfirm {
    pub assume_yes: bool,
}

impl Confirm for TerminalConfirm {
    fn confirm(&mut self, prompt: &str) -> error::Result<bool> {
        if self.assume_yes {
            return Ok(true);
        }
        let mut out = std::io::stderr();
        write!(out, "{} [y/N] ", prompt)?;
        out.flush()?;
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
    }
}

fn print_settlement(s: &DailySettlement) {
    let rows = vec![
        vec!["Branch".into(), s.branch_id.clone()],
        vec!["Period".into(), format!("{}..{}", s.start_date, s.end_date)],
        vec!["Revenue".into(), fmt_money(&s.total_revenue)],
        vec!["Orders".into(), s.total_orders.to_string()],
        vec!["Cash in drawer".into(), fmt_money(&s.cash_in_drawer)],
        vec!["COGS".into(), fmt_money(&s.total_cogs)],
        vec!["Expenses".into(), fmt_money(&s.total_expenses)],
        vec!["Gross profit".into(), fmt_money(&s.gross_profit)],
        vec!["Net profit".into(), fmt_money(&s.net_profit)],
        vec!["Submitted by".into(), s.created_by.clone()],
        vec![
            "Submitted at".into(),
            s.created_at.clone().unwrap_or_default(),
        ],
    ];
    println!("{}", pretty_table(&["Settlement", ""], rows));
}

fn status(conn: &Connection, settings: &Settings, sub: &clap::ArgMatches) -> Result<()> {
    let key = key_from_args(sub, settings)?;
    let lifecycle = SettlementLifecycle::new(settlement_api(conn, settings)?);
    let state = lifecycle.status(&key)?;
    let record = match &state {
        LockState::Locked(s) => Some(s),
        LockState::Open => None,
    };
    if maybe_print_json(sub.get_flag("json"), &record)? {
        return Ok(());
    }
    match record {
        Some(s) => {
            println!("Locked: {} is settled.", key);
            print_settlement(s);
        }
        None => println!("Open: no settlement for {}.", key),
    }
    Ok(())
}

fn submit(conn: &Connection, settings: &Settings, sub: &clap::ArgMatches) -> Result<()> {
    let key = key_from_args(sub, settings)?;
    let source = open_backoffice(sub, settings)?;
    let lifecycle = SettlementLifecycle::new(settlement_api(conn, settings)?);

    let mut board = Dashboard::new(key.clone());
    board.refresh(source.as_ref(), &lifecycle);
    let failures = board.failures();

    if let Some(LockState::Locked(existing)) = board.lock_state() {
        if !maybe_print_json(sub.get_flag("json"), existing)? {
            println!("Locked: {} was already settled; nothing submitted.", key);
            print_settlement(existing);
        }
        return Ok(());
    }
    // Locking figures built from a partial fetch would close the books on
    // wrong numbers.
    if failures.iter().any(|f| f.source != "settlement") {
        report_failures(&failures);
        return Err(anyhow!(
            "Not submitting {}: some period data could not be loaded",
            key
        ));
    }

    let stats = board.stats();
    let outcome = lifecycle.submit(&key, &stats, settings.created_by())?;
    if maybe_print_json(sub.get_flag("json"), outcome.settlement())? {
        return Ok(());
    }
    match &outcome {
        SubmitOutcome::Submitted(s) => {
            println!("Submitted settlement for {}.", key);
            println!("{}", pretty_table(&["Metric", "Value"], stats_rows(&stats)));
            print_settlement(s);
        }
        SubmitOutcome::AlreadySubmitted(s) => {
            println!("Locked: {} had already been settled; showing that record.", key);
            print_settlement(s);
        }
    }
    Ok(())
}

fn unlock(conn: &Connection, settings: &Settings, sub: &clap::ArgMatches) -> Result<()> {
    let key = key_from_args(sub, settings)?;
    let lifecycle = SettlementLifecycle::new(settlement_api(conn, settings)?);
    let mut confirm = TerminalConfirm {
        assume_yes: sub.get_flag("yes"),
    };
    match lifecycle.unlock(&key, settings.role, &mut confirm)? {
        UnlockOutcome::Unlocked => println!("Unlocked {}; the period can be resubmitted.", key),
        UnlockOutcome::Cancelled => println!("Unlock cancelled."),
    }
    Ok(())
}
