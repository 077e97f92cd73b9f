use anyhow::{Context, Result};
use cardmail_core::default_subject_prefixes;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub imap: ImapSection,
    pub search: SearchSection,
    pub extract: ExtractSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImapSection {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSection {
    pub subject_keywords: Vec<String>,
    /// Known statement senders. Kept for reference and future
    /// filtering; the search itself matches subjects only.
    pub senders: Vec<String>,
    pub subject_strip_prefixes: Vec<String>,
    pub max_emails_per_run: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractSection {
    pub model: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            imap: ImapSection {
                host: "imap.gmail.com".to_string(),
                port: 993,
            },
            search: SearchSection {
                subject_keywords: vec![
                    "credit card statement".to_string(),
                    "e-statement".to_string(),
                    "card statement".to_string(),
                    "monthly statement".to_string(),
                    "hdfc bank".to_string(),
                    "diners club".to_string(),
                ],
                senders: vec![
                    "statement@examplebank.com".to_string(),
                    "noreply@creditcard.examplebank.com".to_string(),
                    "hdfcbank.com".to_string(),
                    "hdfc bank".to_string(),
                ],
                subject_strip_prefixes: default_subject_prefixes(),
                max_emails_per_run: 10,
            },
            extract: ExtractSection {
                model: "gemini-1.5-flash-latest".to_string(),
            },
        }
    }
}

pub fn cardmail_home() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".cardmail"))
}

pub fn ensure_cardmail_home() -> Result<PathBuf> {
    let dir = cardmail_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_cardmail_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).context("parse config.toml")
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

/// Secrets, environment-only. A `.env` file is honored because `main`
/// loads it before anything reads the environment.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub imap_user: String,
    pub imap_password: String,
    pub gemini_api_key: String,
}

pub fn credentials_from_env() -> Credentials {
    Credentials {
        imap_user: std::env::var("IMAP_USER").unwrap_or_default(),
        imap_password: std::env::var("IMAP_PASSWORD").unwrap_or_default(),
        gemini_api_key: std::env::var("GEMINI_API_KEY").unwrap_or_default(),
    }
}

/// `IMAP_HOST` / `IMAP_PORT` override the config file when set.
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(host) = std::env::var("IMAP_HOST") {
        if !host.is_empty() {
            cfg.imap.host = host;
        }
    }
    if let Ok(port) = std::env::var("IMAP_PORT") {
        match port.parse::<u16>() {
            Ok(parsed) => cfg.imap.port = parsed,
            Err(_) => log::warn!("ignoring invalid IMAP_PORT '{port}'"),
        }
    }
}
