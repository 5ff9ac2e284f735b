//! `bloodbank` - CLI for the blood bank desk
//!
//! Runs one command against the local database, or an interactive shell.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::{self, BufRead, Write};

use anyhow::Context;
use clap::Parser;
use tracing::debug;

use bloodbank::cli::{print_toasts, Cli, Command, Session};
use bloodbank::{init_logging, shell, Config, FrontDesk, Notifier, SqliteStore};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone()).context("loading configuration")?;

    let db_path = config.database_path();
    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("opening database {}", db_path.display()))?;
    debug!(path = %db_path.display(), "Database ready");

    let desk = FrontDesk::new(store, Notifier::new(config.toast_timing()));
    let mut session = Session::new(config, desk);

    if matches!(cli.command, Command::Shell) {
        shell::run(&mut session)?;
        return Ok(());
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    session.execute(cli.command, &mut out, &mut ask_on_stdin)?;
    print_toasts(&session.desk().notifier().drain(), &mut out)?;
    Ok(())
}

/// Ask on stderr and read the answer from stdin. Anything but `y`/`yes` is no.
fn ask_on_stdin(prompt: &str) -> bool {
    eprint!("{prompt} [y/N] ");
    io::stderr().flush().ok();
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
