use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use mail_autocomplete::auth::{token_manager::TokenManager, token_store};
use mail_autocomplete::clean::{Cleaner, RulePreset, RuleSet};
use mail_autocomplete::config::{Config, load_config, load_config_or_default};
use mail_autocomplete::dataset::{DatasetOptions, Strategy, format_dataset};
use mail_autocomplete::domain::email::RawEmail;
use mail_autocomplete::inference::{self, Completer, HttpCompleter};
use mail_autocomplete::mail::fetcher::{FetchOptions, fetch_initial_emails};
use mail_autocomplete::mail::gmail::GmailClient;
use mail_autocomplete::server::serve;
use mail_autocomplete::store::json::{inspect_file, read_records, write_records};
use mail_autocomplete::terminal::run_demo;

#[derive(Parser)]
#[command(name = "mail_autocomplete")]
#[command(about = "Email autocomplete: harvest sent mail, build datasets, serve suggestions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    WholeResponse,
    Incremental,
    Sentence,
}

#[derive(Subcommand)]
enum Command {
    /// Store the OAuth client secret in keyring
    SetClientSecret {
        #[arg(long)]
        client_id: String,
    },

    /// Download sent emails (first message per thread) to a JSON file
    Fetch {
        #[arg(long, default_value = "threads.json")]
        output: PathBuf,

        #[arg(long)]
        max_pages: Option<u32>,
    },

    /// Turn fetched emails into training pairs
    Format {
        #[arg(long, default_value = "threads.json")]
        input: PathBuf,

        /// Defaults to a file named after the strategy
        #[arg(long)]
        output: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = StrategyArg::Incremental)]
        strategy: StrategyArg,

        /// Words per output for the incremental strategy
        #[arg(long)]
        max_words: Option<usize>,

        #[arg(long)]
        min_tokens: Option<usize>,

        /// Cleaning preset; overrides `[cleaning]` in the config
        #[arg(long, value_enum)]
        rules: Option<RulePreset>,
    },

    /// Check a dataset file for encoding problems and empty fields
    Inspect { path: PathBuf },

    /// Print one suggestion for the given text
    Suggest {
        #[arg(long, default_value = "")]
        subject: String,

        text_so_far: Vec<String>,
    },

    /// Serve POST /autocomplete
    Serve {
        #[arg(long)]
        bind: Option<String>,
    },

    /// Type an email with live suggestions
    Demo {
        #[arg(long)]
        subject: Option<String>,
    },
}

fn cleaner_for(cfg: &Config, flag: Option<RulePreset>, fallback: RulePreset) -> Result<Cleaner> {
    match (flag, &cfg.cleaning) {
        (Some(preset), _) => Cleaner::from_preset(preset),
        (None, Some(rules)) => Cleaner::new(rules),
        (None, None) => Cleaner::new(&RuleSet::preset(fallback)),
    }
}

fn prompt_line(prompt: &str) -> Result<String> {
    print!("{prompt}");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::SetClientSecret { client_id } => {
            eprintln!("Paste client secret (end with Ctrl-D):");
            let mut secret = String::new();
            std::io::Read::read_to_string(&mut std::io::stdin(), &mut secret)?;
            let secret = secret.trim();
            token_store::save_client_secret(&client_id, secret)?;
            println!("Saved client secret for client_id {}", client_id);
            Ok(())
        }

        Command::Fetch { output, max_pages } => {
            let cfg = load_config().map_err(|e| anyhow!("Configuration error: {e}"))?;
            let token_mgr = TokenManager::from_config(&cfg)?;
            let gmail = GmailClient::new(token_mgr, cfg.fetch.query.clone(), cfg.fetch.page_size);
            let cleaner = cleaner_for(&cfg, None, RulePreset::Fetch)?;

            let opts = FetchOptions {
                max_pages: max_pages.unwrap_or(cfg.fetch.max_pages),
                skip_subject_containing: cfg.fetch.skip_subject_containing.clone(),
            };
            let (emails, report) = fetch_initial_emails(&gmail, &cleaner, &opts, &output)?;
            log::info!("fetch finished: {report:?}");
            println!("Saved {} emails to {}", emails.len(), output.display());
            Ok(())
        }

        Command::Format {
            input,
            output,
            strategy,
            max_words,
            min_tokens,
            rules,
        } => {
            let cfg = load_config_or_default()?;
            let strategy = match strategy {
                StrategyArg::WholeResponse => Strategy::WholeResponse,
                StrategyArg::Incremental => Strategy::Incremental {
                    max_words: max_words.unwrap_or(cfg.dataset.max_words),
                },
                StrategyArg::Sentence => Strategy::Sentence,
            };
            let cleaner = cleaner_for(&cfg, rules, strategy.default_rules())?;
            let opts = DatasetOptions {
                strategy,
                min_tokens: min_tokens.unwrap_or(cfg.dataset.min_tokens),
            };

            let records: Vec<RawEmail> = read_records(&input)?;
            let (pairs, _report) = format_dataset(&records, &opts, &cleaner);
            let output = output.unwrap_or_else(|| PathBuf::from(strategy.default_output()));
            write_records(&output, &pairs)?;
            println!("Formatted dataset saved to {}", output.display());
            Ok(())
        }

        Command::Inspect { path } => {
            let report = inspect_file(&path)?;
            println!("{} is valid UTF-8 with {} records", path.display(), report.records);
            if report.with_empty_fields > 0 {
                println!("{} records have empty fields", report.with_empty_fields);
            }
            Ok(())
        }

        Command::Suggest {
            subject,
            text_so_far,
        } => {
            let cfg = load_config_or_default()?;
            let completer = HttpCompleter::connect(&cfg.inference)?;
            let suggestion = inference::suggest(&completer, &subject, &text_so_far.join(" "))?;
            println!("{suggestion}");
            Ok(())
        }

        Command::Serve { bind } => {
            let cfg = load_config_or_default()?;
            let completer = HttpCompleter::connect(&cfg.inference)?;
            let bind = bind.unwrap_or(cfg.server.bind);
            serve(&bind, &completer)
        }

        Command::Demo { subject } => {
            let cfg = load_config_or_default()?;
            let completer: Arc<dyn Completer> = Arc::new(HttpCompleter::connect(&cfg.inference)?);
            let subject = match subject {
                Some(s) => s,
                None => prompt_line("Enter the subject of your email: ")?,
            };
            let body = run_demo(
                completer,
                &subject,
                Duration::from_millis(cfg.demo.refresh_ms),
            )?;
            println!("\nFinal Email Body:\n{body}");
            println!("\n--- End of Demo ---");
            Ok(())
        }
    }
}
