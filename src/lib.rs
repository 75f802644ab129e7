// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod aggregator;
pub mod backoffice;
pub mod balance_sheet;
pub mod bank_statement;
pub mod cli;
pub mod commands;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod models;
pub mod reconcile;
pub mod settlement;
pub mod utils;
