//! `omen-train`: builds an OMEN ruleset from a password corpus.
//!
//! One pass over the corpus counts initial prefixes, end prefixes,
//! conditional transitions, and lengths (optionally preceded by an
//! alphabet-learning pass), then the discretised level tables are written
//! under `<base>/Rules/<NAME>/`. Guesses are generated from that ruleset
//! by `omen-enum`.

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};
use uuid::Uuid;

use omen_model::{
    rule_directory, write_rules, Alphabet, ProgramDetails, RuleConfig, TrainingSettings,
    DEFAULT_MAX_LEVEL,
};
use omen_train::corpus::check_encoding;
use omen_train::{
    detect_file_encoding, AlphabetGenerator, DiscretisedTables, NgramCounter, PasswordReader,
    Result, TrainError, DEFAULT_MAX_LENGTH, MIN_ALPHABET_SIZE,
};

const PROGRESS_EVERY: u64 = 1_000_000;

/// OMEN trainer: creates the n-gram level tables used by the guess generator.
#[derive(Parser, Debug)]
#[command(name = "omen-train", version, about)]
struct Cli {
    /// Training corpus, one candidate password per line.
    #[arg(short = 't', long = "training", value_name = "FILE")]
    training: PathBuf,

    /// Corpus text encoding; autodetected when omitted.
    #[arg(short = 'e', long = "encoding", value_name = "ENCODING")]
    encoding: Option<String>,

    /// Learn an alphabet of this many symbols from the corpus instead of
    /// using the default printable set.
    #[arg(short = 'a', long = "alphabet", value_name = "SIZE")]
    alphabet: Option<usize>,

    /// Name of the generated ruleset.
    #[arg(short = 'r', long = "rule", default_value = "Default", value_name = "NAME")]
    rule: String,

    /// n-gram order.
    #[arg(
        short = 'n',
        long = "ngram",
        default_value_t = 4,
        value_parser = clap::value_parser!(u8).range(2..=5)
    )]
    ngram: u8,

    /// Longest password length trained on.
    #[arg(long = "max-length", default_value_t = DEFAULT_MAX_LENGTH, value_name = "LEN")]
    max_length: usize,

    /// Directory holding the Rules/ tree.
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

fn run(cli: Cli) -> Result<()> {
    if let Some(size) = cli.alphabet {
        if size < MIN_ALPHABET_SIZE {
            return Err(TrainError::AlphabetTooSmall {
                size,
                min: MIN_ALPHABET_SIZE,
            });
        }
    }

    let encoding = match cli.encoding.clone() {
        Some(encoding) => encoding,
        None => detect_file_encoding(&cli.training)?.remove(0),
    };
    check_encoding(&encoding)?;

    let ngram = usize::from(cli.ngram);
    let alphabet = match cli.alphabet {
        Some(size) => learn_alphabet(&cli, size)?,
        None => {
            info!("using default alphabet");
            Alphabet::default_set()
        }
    };

    info!("parsing passwords");
    let mut reader = PasswordReader::open(&cli.training)?;
    let mut counter = NgramCounter::new(alphabet, ngram, cli.max_length);
    let mut total: u64 = 0;
    while let Some(password) = reader.next_password()? {
        counter.observe(&password);
        total += 1;
        if total % PROGRESS_EVERY == 0 {
            info!("{} million passwords parsed", total / PROGRESS_EVERY);
        }
    }
    info!(
        trained = counter.admitted(),
        encoding_errors = reader.encoding_errors() + counter.skipped(),
        "finished parsing"
    );

    info!("applying probability smoothing and saving");
    let tables = DiscretisedTables::new(&counter, DEFAULT_MAX_LEVEL);
    let config = RuleConfig {
        program_details: ProgramDetails {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            author: "omen-rs contributors".to_string(),
            contact: String::new(),
        },
        training_settings: TrainingSettings {
            training_file: cli.training.display().to_string(),
            alphabet_encoding: encoding,
            ngram,
            max_level: DEFAULT_MAX_LEVEL,
            uuid: Uuid::new_v4().to_string(),
        },
    };
    let dir = rule_directory(&cli.base_dir, &cli.rule);
    write_rules(&dir, &config, &tables)?;

    info!(
        "ruleset saved; generate guesses with: omen-enum -r {}",
        cli.rule
    );
    Ok(())
}

/// First pass: learn the top-K alphabet from the corpus.
fn learn_alphabet(cli: &Cli, size: usize) -> Result<Alphabet> {
    info!("first pass over the training set to learn the alphabet");
    let mut reader = PasswordReader::open(&cli.training)?;
    let mut generator = AlphabetGenerator::new(size);
    let mut total: u64 = 0;
    while let Some(password) = reader.next_password()? {
        generator.observe(&password);
        total += 1;
        if total % PROGRESS_EVERY == 0 {
            info!("{} million passwords scanned", total / PROGRESS_EVERY);
        }
    }
    let alphabet = generator.into_alphabet()?;
    info!(symbols = alphabet.len(), "alphabet learned");
    Ok(alphabet)
}
