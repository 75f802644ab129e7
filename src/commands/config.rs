// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::{get_setting, set_setting, KEYS};
use crate::utils::pretty_table;
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => {
            let key = sub.get_one::<String>("key").unwrap().trim();
            let value = sub.get_one::<String>("value").unwrap();
            set_setting(conn, key, value)?;
            println!("Set {} = {}", key, value.trim());
        }
        Some(("show", _)) => {
            let mut rows = Vec::new();
            for key in KEYS {
                let v = get_setting(conn, key)?;
                let shown = match (*key, v) {
                    ("api_token", Some(_)) => "********".to_string(),
                    (_, Some(v)) => v,
                    (_, None) => String::new(),
                };
                rows.push(vec![key.to_string(), shown]);
            }
            println!("{}", pretty_table(&["Key", "Value"], rows));
        }
        _ => {}
    }
    Ok(())
}
