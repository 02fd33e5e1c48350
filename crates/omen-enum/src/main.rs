//! `omen-enum`: generates password guesses from a trained OMEN ruleset.
//!
//! Guesses stream to stdout one per line, most probable total level
//! first; all diagnostics go to stderr. Interruption (Ctrl-C or a closed
//! downstream pipe) saves the session so a later `--load` resumes exactly
//! where the stream stopped.

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use tracing::{error, info};

use omen_enum::{EnumError, MarkovEnumerator, SessionStore};
use omen_model::{load_rules, rule_directory};

/// Oldest trainer whose rulesets this enumerator understands.
const MIN_TRAINER_VERSION: &str = "0.1.0";

/// Autosave cadence during normal guess output.
const SAVE_EVERY: u64 = 1_000_000;

/// Diagnostic cadence in `--debug` mode.
const DEBUG_EVERY: u64 = 100_000;

/// OMEN guess generator: emits guesses in descending probability order.
#[derive(Parser, Debug)]
#[command(name = "omen-enum", version, about)]
struct Cli {
    /// Ruleset to load.
    #[arg(short = 'r', long = "rule", default_value = "Default", value_name = "NAME")]
    rule: String,

    /// Session name for saving/restoring progress.
    #[arg(short = 's', long = "session", default_value = "default", value_name = "NAME")]
    session: String,

    /// Resume the named session instead of starting fresh.
    #[arg(short = 'l', long = "load")]
    load: bool,

    /// Log rate/level diagnostics instead of emitting guesses.
    #[arg(short = 'd', long = "debug")]
    debug: bool,

    /// Interactive loop: type candidate strings, get their level parse.
    #[arg(short = 't', long = "test")]
    test: bool,

    /// Stop after this many guesses.
    #[arg(
        short = 'n',
        long = "limit",
        value_name = "COUNT",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    limit: Option<u64>,

    /// Directory holding the Rules/ tree and session files.
    #[arg(long = "base-dir", env = "OMEN_BASE_DIR", default_value = ".", value_name = "DIR")]
    base_dir: PathBuf,
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("OMEN_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        error!("{err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), EnumError> {
    info!("loading ruleset {}", cli.rule);
    let dir = rule_directory(&cli.base_dir, &cli.rule);
    let model = load_rules(&dir, Some(MIN_TRAINER_VERSION))?;

    let store = SessionStore::new(
        &cli.base_dir,
        &cli.session,
        model.version(),
        &cli.rule,
        model.uuid(),
    );
    let mut enumerator = if cli.load {
        info!("restoring session {}", cli.session);
        MarkovEnumerator::restore(&model, store.load()?)?
    } else {
        MarkovEnumerator::new(&model)?
    };

    if cli.test {
        return parse_loop(&enumerator);
    }

    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
        .map_err(|e| EnumError::Signal(e.to_string()))?;

    info!("starting guess generation");
    let outcome = generate(&cli, &mut enumerator, &store, &interrupted)?;
    match outcome {
        Outcome::Exhausted => info!("model exhausted, no guesses left"),
        Outcome::LimitReached => info!("guess limit reached"),
        Outcome::Interrupted => info!("interrupted, session saved to {}", store.path().display()),
    }
    Ok(())
}

enum Outcome {
    Exhausted,
    LimitReached,
    Interrupted,
}

fn generate(
    cli: &Cli,
    enumerator: &mut MarkovEnumerator<'_>,
    store: &SessionStore,
    interrupted: &AtomicBool,
) -> Result<Outcome, EnumError> {
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let started = Instant::now();
    let mut count: u64 = 0;

    loop {
        if interrupted.load(Ordering::SeqCst) {
            // The current guess has not been produced yet, so the saved
            // state resumes with it; nothing is emitted twice or skipped.
            let _ = out.flush();
            store.save(&enumerator.state())?;
            return Ok(Outcome::Interrupted);
        }

        let Some((guess, level)) = enumerator.next_guess() else {
            out.flush()?;
            return Ok(Outcome::Exhausted);
        };
        count += 1;

        if cli.debug {
            if count % DEBUG_EVERY == 0 {
                let rate = count as f64 / started.elapsed().as_secs_f64().max(f64::EPSILON);
                info!(guesses = count, level, rate = %format!("{rate:.0}/s"), "progress");
            }
        } else {
            if let Err(err) = writeln!(out, "{guess}") {
                if err.kind() == io::ErrorKind::BrokenPipe {
                    store.save(&enumerator.state())?;
                    return Ok(Outcome::Interrupted);
                }
                return Err(err.into());
            }
            if count % SAVE_EVERY == 0 {
                if let Err(err) = out.flush() {
                    if err.kind() == io::ErrorKind::BrokenPipe {
                        store.save(&enumerator.state())?;
                        return Ok(Outcome::Interrupted);
                    }
                    return Err(err.into());
                }
                store.save(&enumerator.state())?;
            }
        }

        if cli.limit.is_some_and(|limit| count >= limit) {
            out.flush()?;
            return Ok(Outcome::LimitReached);
        }
    }
}

/// `--test`: parse candidate strings typed on stdin.
fn parse_loop(enumerator: &MarkovEnumerator<'_>) -> Result<(), EnumError> {
    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        eprint!("Enter string to parse: ");
        line.clear();
        if stdin.read_line(&mut line)? == 0 {
            return Ok(());
        }
        let candidate = line.trim_end_matches(['\n', '\r']);
        println!("{}", enumerator.parse(candidate));
    }
}
