// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{anyhow, Result};
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::Role;

pub const KEYS: &[&str] = &["api_url", "api_token", "user", "role", "branch"];

#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub api_url: Option<String>,
    pub api_token: Option<String>,
    pub user: Option<String>,
    pub role: Role,
    pub branch: Option<String>,
}

impl Settings {
    pub fn load(conn: &Connection) -> Result<Self> {
        let role = match get_setting(conn, "role")? {
            Some(r) => r.parse()?,
            None => Role::default(),
        };
        Ok(Self {
            api_url: get_setting(conn, "api_url")?,
            api_token: get_setting(conn, "api_token")?,
            user: get_setting(conn, "user")?,
            role,
            branch: get_setting(conn, "branch")?,
        })
    }

    pub fn created_by(&self) -> &str {
        self.user.as_deref().unwrap_or("unknown")
    }
}

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let v: Option<String> = conn
        .query_row("SELECT value FROM settings WHERE key=?1", params![key], |r| {
            r.get(0)
        })
        .optional()?;
    Ok(v.filter(|s| !s.trim().is_empty()))
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    if !KEYS.contains(&key) {
        return Err(anyhow!(
            "Unknown setting '{}', expected one of {}",
            key,
            KEYS.join(", ")
        ));
    }
    let value = value.trim();
    if key == "role" {
        value.parse::<Role>()?;
    }
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value],
    )?;
    Ok(())
}
