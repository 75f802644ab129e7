// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command};

fn branch() -> Arg {
    Arg::new("branch")
        .long("branch")
        .help("Branch id (defaults to the configured branch)")
}

fn from() -> Arg {
    Arg::new("from")
        .long("from")
        .required(true)
        .help("Period start, YYYY-MM-DD (inclusive)")
}

fn to() -> Arg {
    Arg::new("to")
        .long("to")
        .help("Period end, YYYY-MM-DD (inclusive, defaults to --from)")
}

fn data() -> Arg {
    Arg::new("data")
        .long("data")
        .help("Read orders, products, COGS and expenses from a JSON snapshot instead of the API")
}

fn json() -> Arg {
    Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Print JSON")
}

pub fn build_cli() -> Command {
    Command::new("tillclose")
        .about("Branch settlement, period P&L and bank reconciliation")
        .version(clap::crate_version!())
        .subcommand(Command::new("init").about("Create the local database"))
        .subcommand(
            Command::new("config")
                .about("Local settings")
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("key").required(true))
                        .arg(Arg::new("value").required(true)),
                )
                .subcommand(Command::new("show")),
        )
        .subcommand(
            Command::new("report")
                .about("Period figures")
                .subcommand(
                    Command::new("stats")
                        .about("Profit and loss for one branch")
                        .arg(branch())
                        .arg(from())
                        .arg(to())
                        .arg(data())
                        .arg(json()),
                )
                .subcommand(
                    Command::new("branches")
                        .about("Compare every branch over a period")
                        .arg(from())
                        .arg(to())
                        .arg(data())
                        .arg(json()),
                )
                .subcommand(
                    Command::new("balance")
                        .about("Estimated balance position as of a date")
                        .arg(branch())
                        .arg(
                            Arg::new("as_of")
                                .long("as-of")
                                .required(true)
                                .help("Cutoff date, YYYY-MM-DD (end of day)"),
                        )
                        .arg(data())
                        .arg(json()),
                ),
        )
        .subcommand(
            Command::new("reconcile")
                .about("Match a bank statement CSV against non-cash POS payments")
                .arg(
                    Arg::new("path")
                        .long("path")
                        .required(true)
                        .help("Bank statement CSV"),
                )
                .arg(branch())
                .arg(from())
                .arg(to())
                .arg(data())
                .arg(json())
                .arg(
                    Arg::new("unmatched")
                        .long("unmatched")
                        .action(ArgAction::SetTrue)
                        .help("Only list unmatched rows"),
                ),
        )
        .subcommand(
            Command::new("settlement")
                .about("Close, inspect or reopen a branch period")
                .subcommand(
                    Command::new("status")
                        .arg(branch())
                        .arg(from())
                        .arg(to())
                        .arg(json()),
                )
                .subcommand(
                    Command::new("submit")
                        .arg(branch())
                        .arg(from())
                        .arg(to())
                        .arg(data())
                        .arg(json()),
                )
                .subcommand(
                    Command::new("unlock")
                        .arg(branch())
                        .arg(from())
                        .arg(to())
                        .arg(
                            Arg::new("yes")
                                .long("yes")
                                .action(ArgAction::SetTrue)
                                .help("Skip the interactive confirmation"),
                        ),
                ),
        )
        .subcommand(
            Command::new("doctor")
                .about("Check period data for inconsistent orders")
                .arg(branch())
                .arg(from())
                .arg(to())
                .arg(data()),
        )
}
