// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::bank_statement::{parse_statement_file, MatchStatus};
use crate::config::Settings;
use crate::dashboard::{gather, Dashboard};
use crate::utils::{
    fmt_money, key_from_args, maybe_print_json, open_backoffice, pretty_table, report_failures,
};
use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;

pub fn handle(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let settings = Settings::load(conn)?;
    let path = sub.get_one::<String>("path").unwrap().trim();
    // Parse first: a bad file aborts before anything is fetched.
    let bank = parse_statement_file(Path::new(path))
        .with_context(|| format!("Import bank statement {}", path))?;

    let key = key_from_args(sub, &settings)?;
    let source = open_backoffice(sub, &settings)?;
    let mut board = Dashboard::new(key.clone());
    board.accept(gather(source.as_ref(), &key));
    report_failures(&board.failures());

    let mut recon = board.reconcile(bank);
    if sub.get_flag("unmatched") {
        recon
            .transactions
            .retain(|t| t.status == MatchStatus::Unmatched);
    }
    if maybe_print_json(sub.get_flag("json"), &recon)? {
        return Ok(());
    }

    let rows = recon
        .transactions
        .iter()
        .map(|t| {
            vec![
                t.date.to_string(),
                t.description.clone(),
                fmt_money(&t.amount),
                match t.status {
                    MatchStatus::Matched => "MATCHED".to_string(),
                    MatchStatus::Unmatched => "UNMATCHED".to_string(),
                },
                t.matched
                    .as_ref()
                    .map(|m| m.order_id.clone())
                    .unwrap_or_default(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Date", "Description", "Amount", "Status", "Order"], rows)
    );

    if !recon.unmatched_pos.is_empty() {
        let rows = recon
            .unmatched_pos
            .iter()
            .map(|p| {
                vec![
                    p.date.to_string(),
                    p.order_id.clone(),
                    p.method.clone(),
                    fmt_money(&p.amount),
                ]
            })
            .collect();
        println!("POS payments without a bank entry:");
        println!(
            "{}",
            pretty_table(&["Date", "Order", "Method", "Amount"], rows)
        );
    }

    let s = &recon.summary;
    let rows = vec![
        vec!["Bank total".into(), fmt_money(&s.total_bank)],
        vec!["POS non-cash total".into(), fmt_money(&s.total_pos)],
        vec![
            format!("Matched ({})", s.matched_count),
            fmt_money(&s.matched_bank_total),
        ],
        vec![
            format!("Unmatched bank ({})", s.unmatched_bank_count),
            fmt_money(&s.unmatched_bank_total),
        ],
        vec![
            format!("Unmatched POS ({})", s.unmatched_pos_count),
            fmt_money(&s.unmatched_pos_total),
        ],
    ];
    println!("{}", pretty_table(&["Summary", "Amount"], rows));
    Ok(())
}
