//! Darkpool command line client.
//!
//! Keeps commit secrets in a local data directory and drives the
//! commit → reveal → clear lifecycle. Transaction submission happens elsewhere:
//! `commit` prints the hash to submit and `reveal` prints the opening.
//!
//! Usage:
//!   darkpool commit --market 42 --outcome yes --amount 1000000000 --bettor 0x...
//!   darkpool reveal --market 42 --expiration 1700086400000 --bettor 0x...
//!   darkpool sweep --markets markets.json

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use darkpool::{
    commit::{format_time_remaining, verify_commit, RevealStatus},
    core::{clock::to_iso8601, Address, Amount, CommitHash, Salt, SystemClock, TimestampMs},
    Config, Darkpool, FileRepository, MarketExpiry, Outcome, SECURITY_WARNING, VERSION,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Commit-reveal darkpool betting client")]
struct Cli {
    /// Secret store directory [env: DARKPOOL_DATA_DIR]
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Bettor address [env: DARKPOOL_BETTOR]
    #[arg(long, global = true)]
    bettor: Option<Address>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Commit to an outcome and store the secret locally.
    Commit {
        #[arg(long)]
        market: String,
        #[arg(long)]
        outcome: Outcome,
        /// Stake in minor units.
        #[arg(long)]
        amount: Amount,
    },
    /// Check an opening against a commitment.
    Verify {
        #[arg(long)]
        hash: CommitHash,
        #[arg(long)]
        outcome: Outcome,
        #[arg(long)]
        salt: Salt,
    },
    /// Show the stored secret and reveal instructions for a market.
    Show {
        #[arg(long)]
        market: String,
    },
    /// List markets with unrevealed commitments.
    List {
        /// JSON file of `[{marketId, expiration}]` to annotate deadlines.
        #[arg(long)]
        markets: Option<PathBuf>,
    },
    /// Reveal deadline and window state for a market expiration.
    Deadline {
        /// Market expiration (epoch ms).
        #[arg(long)]
        expiration: TimestampMs,
    },
    /// Print the reveal parameters for a market.
    Reveal {
        #[arg(long)]
        market: String,
        /// Market expiration (epoch ms).
        #[arg(long)]
        expiration: TimestampMs,
        /// Clear the secret, once the chain accepted the reveal.
        #[arg(long)]
        complete: bool,
    },
    /// Export all secrets, or one market's reveal sheet.
    Export {
        #[arg(long)]
        market: Option<String>,
        #[arg(long, requires = "market")]
        title: Option<String>,
        /// Write to a file instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Import secrets from an export (`-` reads stdin).
    Import {
        file: PathBuf,
    },
    /// Discard secrets whose reveal window has closed.
    Sweep {
        /// JSON file of `[{marketId, expiration}]`.
        #[arg(long)]
        markets: PathBuf,
    },
    /// Repair the unrevealed-market registry.
    Reconcile,
    /// Print the security notes.
    Warning,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CommitOutput {
    market_id: String,
    commit_hash: CommitHash,
    amount: Amount,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeadlineOutput {
    expiration: TimestampMs,
    deadline: TimestampMs,
    deadline_iso: Option<String>,
    status: RevealStatus,
    time_remaining: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::from_env().context("invalid environment configuration")?;
    if let Some(dir) = cli.data_dir.clone() {
        config.data_dir = dir;
    }
    if cli.bettor.is_some() {
        config.bettor = cli.bettor;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    info!(version = VERSION, data_dir = %config.data_dir.display(), "Darkpool client");

    let repo = FileRepository::open(&config.data_dir)
        .with_context(|| format!("failed to open data dir {}", config.data_dir.display()))?;
    let pool = Darkpool::new(repo, SystemClock);

    run(&pool, &config, cli.command)
}

fn run(pool: &Darkpool<FileRepository, SystemClock>, config: &Config, command: Command) -> Result<()> {
    match command {
        Command::Commit { market, outcome, amount } => {
            let bettor = require_bettor(config)?;
            let commit = pool.commit_bet(&market, outcome, amount, &bettor)?;
            print_json(&CommitOutput {
                market_id: market,
                commit_hash: commit.commit_hash,
                amount,
            })?;
        }
        Command::Verify { hash, outcome, salt } => {
            let bettor = require_bettor(config)?;
            if !verify_commit(&hash, outcome, &salt, &bettor) {
                bail!("opening does not match commitment {hash}");
            }
            println!("valid");
        }
        Command::Show { market } => {
            let secret = pool
                .store()
                .retrieve(&market)?
                .ok_or_else(|| anyhow!("no commit secret stored for market {market}"))?;
            print_json(&secret)?;
            if let Some(text) = pool.reveal_instructions(&market)? {
                println!("\n{text}");
            }
        }
        Command::List { markets } => {
            let markets = match markets {
                Some(path) => load_markets(&path)?,
                None => Vec::new(),
            };
            for pending in pool.pending_reveals(&markets)? {
                let window = match (pending.deadline, pending.status) {
                    (Some(deadline), Some(status)) => format!(
                        "deadline {} ({})",
                        to_iso8601(deadline).unwrap_or_else(|| deadline.to_string()),
                        describe(status)
                    ),
                    _ => "expiration unknown".to_string(),
                };
                println!(
                    "{}\t{}\t{} tokens\t{}",
                    pending.market_id,
                    pending.secret.outcome,
                    pending.secret.amount.format_token(),
                    window
                );
            }
        }
        Command::Deadline { expiration } => {
            let window = pool.window();
            let deadline = window.deadline(expiration);
            print_json(&DeadlineOutput {
                expiration,
                deadline,
                deadline_iso: to_iso8601(deadline),
                status: window.status(expiration),
                time_remaining: pool.time_remaining_text(expiration),
            })?;
        }
        Command::Reveal { market, expiration, complete } => {
            let bettor = require_bettor(config)?;
            let ticket = pool.prepare_reveal(&market, expiration, &bettor)?;
            print_json(&ticket)?;
            if complete {
                pool.complete_reveal(&market)?;
            }
        }
        Command::Export { market, title, out } => {
            let blob = match market {
                Some(market) => pool
                    .export_reveal_data(&market, title.as_deref())?
                    .ok_or_else(|| anyhow!("no commit secret stored for market {market}"))?,
                None => pool.export_all()?,
            };
            match out {
                Some(path) => fs::write(&path, blob)
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => println!("{blob}"),
            }
        }
        Command::Import { file } => {
            let blob = read_input(&file)?;
            let summary = pool.import_all(&blob)?;
            for failure in &summary.failed {
                warn!(market_id = %failure.market_id, "Not imported: {}", failure.reason);
            }
            print_json(&summary)?;
        }
        Command::Sweep { markets } => {
            let report = pool.sweep_expired(&load_markets(&markets)?)?;
            print_json(&report)?;
        }
        Command::Reconcile => {
            let report = pool.reconcile()?;
            if report.is_clean() {
                info!("Registry already consistent");
            }
            print_json(&report)?;
        }
        Command::Warning => println!("{SECURITY_WARNING}"),
    }

    Ok(())
}

fn require_bettor(config: &Config) -> Result<Address> {
    config
        .bettor
        .ok_or_else(|| anyhow!("bettor address required (--bettor or DARKPOOL_BETTOR)"))
}

fn describe(status: RevealStatus) -> String {
    match status {
        RevealStatus::MarketOpen { until_expiration_ms } => {
            format!("market open, expires in {}", format_time_remaining(until_expiration_ms))
        }
        RevealStatus::Open { remaining_ms } => {
            format!("reveal now, {} left", format_time_remaining(remaining_ms))
        }
        RevealStatus::Closed => "reveal window closed".to_string(),
    }
}

fn load_markets(path: &Path) -> Result<Vec<MarketExpiry>> {
    let raw = read_input(path)?;
    serde_json::from_str(&raw).with_context(|| format!("invalid market list in {}", path.display()))
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf).context("failed to read stdin")?;
        return Ok(buf);
    }
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
