//! urlwash CLI
//!
//! CLI tool for validating rule documents and cleaning URLs against them.

use std::fs;
use std::io::{self, BufRead};

use clap::{Parser, Subcommand};

use uw_core::host::IdnaCanonicalizer;
use uw_core::url::UrlParts;
use uw_rules::{clean, compile, CompiledRuleset, RulesDocument};

#[derive(Parser)]
#[command(name = "uw-cli")]
#[command(about = "urlwash tracking-parameter cleaner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean URLs against a rule document
    Clean {
        /// Rule document (JSON)
        #[arg(short, long)]
        rules: String,

        /// URLs to clean; reads stdin when none are given
        urls: Vec<String>,

        /// Print matched rules and removed parameters
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate a rule document
    Check {
        /// Rule document (JSON)
        #[arg(short, long)]
        rules: String,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Clean {
            rules,
            urls,
            verbose,
        } => cmd_clean(&rules, &urls, verbose),
        Commands::Check { rules } => cmd_check(&rules),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn load_ruleset(path: &str) -> Result<CompiledRuleset, String> {
    let text = fs::read_to_string(path).map_err(|e| format!("{path}: {e}"))?;
    let doc: RulesDocument = serde_json::from_str(&text).map_err(|e| format!("{path}: {e}"))?;
    compile(&doc, &IdnaCanonicalizer).map_err(|e| e.to_string())
}

fn cmd_check(rules_path: &str) -> Result<(), String> {
    let ruleset = load_ruleset(rules_path)?;
    println!("{rules_path}: {} rule(s) OK", ruleset.len());
    Ok(())
}

fn cmd_clean(rules_path: &str, urls: &[String], verbose: bool) -> Result<(), String> {
    let ruleset = load_ruleset(rules_path)?;
    let canon = IdnaCanonicalizer;

    let inputs: Vec<String> = if urls.is_empty() {
        io::stdin()
            .lock()
            .lines()
            .collect::<Result<_, _>>()
            .map_err(|e| e.to_string())?
    } else {
        urls.to_vec()
    };

    for raw in &inputs {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }

        let parsed = UrlParts::parse(raw).map_err(|e| format!("{raw}: {e}"))?;
        let outcome = clean(&parsed, &ruleset, &canon);

        println!("{}", outcome.url.to_url_string());

        if verbose {
            for index in &outcome.matched {
                let rule = &ruleset.rules()[*index];
                let name = rule.rule.name.as_deref().unwrap_or("<unnamed>");
                eprintln!("  matched rules[{index}] {name}");
            }
            for token in &outcome.removed {
                eprintln!("  removed {}={}", token.decoded_key(), token.decoded_value());
            }
            for warning in &outcome.warnings {
                if warning.enabled {
                    let message = warning.message.as_deref().unwrap_or("flagged by rule");
                    eprintln!("  warning: {message}");
                }
            }
        }
    }

    Ok(())
}
