//! CLI entry point for the package scanner.

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use malscan::{
    analysis::packages::ReferencePackages,
    analysis::squatting::{check_combosquatting, check_typosquatting, TYPOSQUAT_THRESHOLD},
    cli::{Cli, Commands},
    config::{generate_default_config, Config},
    report::{report, FileReport, OutputFormat, Report},
    Engine, ScanResult, Severity,
};
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| log_level.into()))
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    // Load config file if specified, otherwise use defaults
    let config = if let Some(ref config_path) = cli.config {
        Config::load(config_path)?
    } else {
        Config::load_default()
    };

    let format: OutputFormat = cli.format.parse().map_err(|e| anyhow::anyhow!("{}", e))?;

    match cli.command {
        Commands::Scan {
            path,
            min_severity,
            fail_on,
            output,
        } => {
            let min_severity = match min_severity {
                Some(s) => parse_severity(&s)?,
                None => config.min_severity,
            };
            let fail_on_severity = fail_on.as_ref().map(|s| parse_severity(s)).transpose()?;

            let engine = Engine::with_text_patterns(config.text_patterns)?;
            let files = collect_files(&path, &config)?;
            if files.is_empty() {
                eprintln!("No matching files under {}", path.display());
            }

            let mut reports = Vec::new();
            for file in files {
                tracing::debug!(path = %file.display(), "scanning");
                let result = drop_below(engine.scan_file(&file)?, min_severity);
                reports.push(FileReport { path: file, result });
            }

            let scan_report = Report::from_files(reports);

            if let Some(output_path) = output {
                let mut file = std::fs::File::create(&output_path)?;
                report(&scan_report, format, &mut file)?;
                eprintln!("Report written to: {}", output_path.display());
            } else {
                let mut stdout = io::stdout().lock();
                report(&scan_report, format, &mut stdout)?;
            }

            if let Some(fail_severity) = fail_on_severity {
                if let Some(max_sev) = scan_report.max_severity() {
                    if max_sev >= fail_severity {
                        std::process::exit(1);
                    }
                }
            }
        }

        Commands::Rules { rule, json } => {
            let registry = malscan::RuleRegistry::builtin();

            if let Some(rule_id) = rule {
                match registry.rules().iter().find(|r| r.id == rule_id) {
                    Some(r) => print_rule(r, json)?,
                    None => {
                        eprintln!("Unknown rule: {rule_id}");
                        std::process::exit(1);
                    }
                }
            } else if json {
                let listing: Vec<serde_json::Value> = registry
                    .rules()
                    .iter()
                    .map(|r| {
                        serde_json::json!({
                            "id": r.id,
                            "category": r.category.to_string(),
                            "brief": r.brief,
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&listing)?);
            } else {
                println!("{} rules registered:\n", registry.len());
                for category in malscan::RuleCategory::ALL {
                    println!("{}", category.to_string().bold());
                    for r in registry.for_category(category) {
                        println!("  {:<28} {}", r.id, r.brief);
                    }
                    println!();
                }
            }
        }

        Commands::CheckName { name, json } => {
            let references = ReferencePackages::builtin();
            let typo = check_typosquatting(&name, references, TYPOSQUAT_THRESHOLD);
            let combo = check_combosquatting(&name, references);

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "name": name,
                        "typosquatting": {
                            "is_match": typo.is_match,
                            "similar": typo.similar,
                            "severity": typo.severity,
                            "homoglyphs": typo.homoglyphs.detected,
                        },
                        "combosquatting": {
                            "is_match": combo.is_match,
                            "base_name": combo.base_name,
                        },
                    }))?
                );
            } else {
                if typo.is_match {
                    let similar: Vec<&str> =
                        typo.similar.iter().map(|s| s.name.as_str()).collect();
                    println!(
                        "{} '{}' resembles: {}",
                        "typosquatting".red().bold(),
                        name,
                        similar.join(", ")
                    );
                    if typo.homoglyphs.detected {
                        println!(
                            "  confusable characters match: {}",
                            typo.homoglyphs.matches.join(", ")
                        );
                    }
                }
                if combo.is_match {
                    println!(
                        "{} '{}' builds on '{}'",
                        "combosquatting".yellow().bold(),
                        name,
                        combo.base_name.unwrap_or_default()
                    );
                }
                if !typo.is_match && !combo.is_match {
                    println!("{} no squatting indicators for '{}'", "ok".green(), name);
                }
            }
        }

        Commands::Init { output } => {
            if output.exists() {
                eprintln!("{} already exists, not overwriting", output.display());
                std::process::exit(1);
            }
            std::fs::write(&output, generate_default_config())?;
            eprintln!("Wrote default config to {}", output.display());
        }
    }

    Ok(())
}

fn parse_severity(s: &str) -> Result<Severity> {
    s.parse::<Severity>().map_err(|e| anyhow::anyhow!("{}", e))
}

/// Filter findings below `min`, re-deriving stats and verdict.
fn drop_below(result: ScanResult, min: Severity) -> ScanResult {
    if min == Severity::Info {
        return result;
    }
    let findings = result
        .findings
        .into_iter()
        .filter(|f| f.severity >= min)
        .collect();
    malscan::engine::aggregate::aggregate(findings)
}

/// Every in-scope file under `path`: the file itself, or a filtered walk of
/// the directory.
fn collect_files(path: &Path, config: &Config) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(path).into_iter().filter_entry(|entry| {
        !entry
            .file_name()
            .to_str()
            .map(|name| config.exclude_dirs.iter().any(|d| d == name))
            .unwrap_or(false)
    });

    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_file() && config.matches_extension(entry.path()) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

fn print_rule(rule: &malscan::RuleDescriptor, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "id": rule.id,
                "category": rule.category.to_string(),
                "brief": rule.brief,
            }))?
        );
    } else {
        println!("{}", format!("Rule: {}", rule.id).bold());
        println!("Category: {}", rule.category);
        println!("Brief:    {}", rule.brief);
    }
    Ok(())
}
