// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Bank statement columns not found: {}", missing.join(", "))]
    ColumnsNotFound { missing: Vec<&'static str> },

    #[error("No transactions parsed from bank statement")]
    NoTransactions,

    #[error("Invalid period {start}..{end}: start is after end")]
    InvalidPeriod { start: NaiveDate, end: NaiveDate },

    #[error("Role '{role}' is not allowed to unlock settlements (manager or admin required)")]
    Unauthorized { role: String },

    #[error("Settlement API error: {0}")]
    Api(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Db(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
