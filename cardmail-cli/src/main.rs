use anyhow::{bail, Context, Result};
use cardmail_core::{generate_candidates, UserPii};
use cardmail_extract::{GeminiExtractor, PdfDocumentReader, StatementPipeline};
use cardmail_ingest::{ImapSettings, MailboxScanner, SearchSettings};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;

mod config;
mod report;

#[derive(Parser, Debug)]
#[command(
    name = "cardmail",
    version,
    long_version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("CARDMAIL_BUILD_SHA"), ")"),
    about = "Find credit card statement details in your mailbox"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan the mailbox and extract statement details
    Scan {
        /// Cardholder full name, as embossed on the card
        #[arg(long)]
        name: String,

        /// Date of birth, YYYY-MM-DD
        #[arg(long)]
        dob: String,

        /// Mobile number registered with the bank
        #[arg(long, default_value = "")]
        mobile: String,

        /// Credit card number, full or at least the last 4 digits
        #[arg(long, default_value = "")]
        card: String,

        /// Cap on emails processed this run (default from config)
        #[arg(long)]
        limit: Option<usize>,

        /// Write the JSON results to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,

        /// Also export the results as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Print the PDF password candidates derived from a profile
    Passwords {
        /// Cardholder full name
        #[arg(long)]
        name: String,

        /// Date of birth, YYYY-MM-DD
        #[arg(long)]
        dob: String,

        /// Credit card number, full or last 4 digits
        #[arg(long, default_value = "")]
        card: String,
    },

    /// Write the default config to ~/.cardmail/config.toml
    Setup,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    // secrets may live in a .env next to the binary; load before
    // anything reads the environment
    match dotenv::dotenv() {
        Ok(path) => log::debug!("loaded .env from {}", path.display()),
        Err(_) => log::debug!("no .env file; relying on the environment"),
    }

    let cli = Cli::parse();

    match cli.command {
        Command::Scan {
            name,
            dob,
            mobile,
            card,
            limit,
            out,
            csv,
        } => {
            scan(name, dob, mobile, card, limit, out, csv)?;
        }

        Command::Passwords { name, dob, card } => {
            let pii = UserPii {
                full_name: name,
                date_of_birth: dob,
                mobile_number: String::new(),
                credit_card_number: card,
            };
            pii.validate()?;
            let candidates = generate_candidates(&pii);
            println!("{} candidate(s):", candidates.len());
            for candidate in &candidates {
                println!("  {candidate}");
            }
        }

        Command::Setup => {
            config::init_config()?;
        }
    }

    Ok(())
}

fn scan(
    name: String,
    dob: String,
    mobile: String,
    card: String,
    limit: Option<usize>,
    out: Option<PathBuf>,
    csv: Option<PathBuf>,
) -> Result<()> {
    let pii = UserPii {
        full_name: name,
        date_of_birth: dob,
        mobile_number: mobile,
        credit_card_number: card,
    };
    pii.validate()?;

    let mut cfg = config::load_config()?;
    config::apply_env_overrides(&mut cfg);

    let creds = config::credentials_from_env();
    if creds.imap_user.is_empty() || creds.imap_password.is_empty() {
        bail!("IMAP_USER and IMAP_PASSWORD must be set (environment or .env)");
    }
    if creds.gemini_api_key.is_empty() {
        log::warn!("GEMINI_API_KEY is not set; extraction will come up empty");
    }

    let imap = ImapSettings {
        host: cfg.imap.host.clone(),
        port: cfg.imap.port,
        username: creds.imap_user.clone(),
        password: creds.imap_password.clone(),
    };
    let search = SearchSettings {
        subject_keywords: cfg.search.subject_keywords.clone(),
        max_emails: limit.unwrap_or(cfg.search.max_emails_per_run),
    };

    let mut scanner = MailboxScanner::connect(&imap)?;
    let scan_outcome = scanner.scan(&search);
    scanner.logout();
    let emails = scan_outcome?;

    let extractor = GeminiExtractor::new(creds.gemini_api_key, cfg.extract.model.clone())?;
    let reader = PdfDocumentReader;
    let pipeline = StatementPipeline::new(
        &pii,
        cfg.search.subject_strip_prefixes.clone(),
        &extractor,
        &reader,
    );
    let results = pipeline.process(&emails);

    if results.is_empty() {
        println!("No relevant credit card statement details found or could be processed.");
        return Ok(());
    }

    report::print_summary(&results);

    let json = serde_json::to_string_pretty(&results).context("serialize results")?;
    match out {
        Some(path) => {
            fs::write(&path, json).with_context(|| format!("write {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => println!("{json}"),
    }

    if let Some(path) = csv {
        report::write_csv(&path, &results)?;
        println!("Wrote {}", path.display());
    }

    Ok(())
}
