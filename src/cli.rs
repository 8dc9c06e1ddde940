// src/cli.rs
use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::{env, path::PathBuf};

use crate::{commands, infra::t, resolve_locale};

/// Pre-parses the command line arguments to find the language setting.
/// This allows i18n to be initialized before the full CLI is built.
/// It looks for a `--lang <VALUE>` or `--lang=<VALUE>` argument.
fn pre_parse_language() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    if let Some(pos) = args.iter().position(|arg| arg == "--lang") {
        if let Some(lang) = args.get(pos + 1) {
            return Some(lang.clone());
        }
    }
    args.iter()
        .find_map(|arg| arg.strip_prefix("--lang=").map(str::to_string))
}

fn build_cli(locale: &str) -> Command {
    Command::new("api-harness")
        .version(env!("CARGO_PKG_VERSION"))
        .about(t!("cli_about", locale = locale).to_string())
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("lang")
                .long("lang")
                .help(t!("cli_lang", locale = locale).to_string())
                .value_name("LANGUAGE")
                .global(true)
                .action(ArgAction::Set),
        )
        .subcommand(
            Command::new("run")
                .about(t!("cmd_run_about", locale = locale).to_string())
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .help(t!("arg_config", locale = locale).to_string())
                        .value_name("CONFIG")
                        .default_value("Harness.toml")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("jobs")
                        .short('j')
                        .long("jobs")
                        .help(t!("arg_jobs", locale = locale).to_string())
                        .value_name("JOBS")
                        .value_parser(clap::value_parser!(usize))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("report-dir")
                        .long("report-dir")
                        .help(t!("arg_report_dir", locale = locale).to_string())
                        .value_name("REPORT_DIR")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                ),
        )
        .subcommand(
            Command::new("preview")
                .about(t!("cmd_preview_about", locale = locale).to_string())
                .arg(
                    Arg::new("source")
                        .short('s')
                        .long("source")
                        .help(t!("arg_source", locale = locale).to_string())
                        .value_name("FILE")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("sheet")
                        .long("sheet")
                        .help(t!("arg_sheet", locale = locale).to_string())
                        .value_name("SHEET")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("delimiter")
                        .short('d')
                        .long("delimiter")
                        .help(t!("arg_delimiter", locale = locale).to_string())
                        .value_name("CHAR")
                        .value_parser(clap::value_parser!(char))
                        .action(ArgAction::Set),
                ),
        )
}

pub async fn run() -> Result<()> {
    // Pre-parse language and initialize i18n first.
    let language = match pre_parse_language() {
        Some(lang) => resolve_locale(&lang),
        None => crate::init(),
    };
    rust_i18n::set_locale(language);

    let matches = build_cli(language).get_matches();
    let explicit_lang = matches.get_one::<String>("lang").is_some();

    match matches.subcommand() {
        Some(("run", run_matches)) => {
            let options = run_options(run_matches, explicit_lang.then_some(language));
            commands::run::execute(options).await?;
        }
        Some(("preview", preview_matches)) => {
            let source = preview_matches
                .get_one::<PathBuf>("source")
                .cloned()
                .unwrap_or_default(); // Required by clap
            let sheet = preview_matches.get_one::<String>("sheet").cloned();
            let delimiter = preview_matches.get_one::<char>("delimiter").copied();
            commands::preview::execute(&source, sheet.as_deref(), delimiter, language)?;
        }
        _ => {
            // Clap has already printed the help text.
        }
    }
    Ok(())
}

fn run_options(matches: &ArgMatches, lang_override: Option<&str>) -> commands::run::RunOptions {
    commands::run::RunOptions {
        config: matches
            .get_one::<PathBuf>("config")
            .cloned()
            .unwrap_or_else(|| PathBuf::from("Harness.toml")),
        jobs: matches.get_one::<usize>("jobs").copied(),
        report_dir: matches.get_one::<PathBuf>("report-dir").cloned(),
        lang_override: lang_override.map(str::to_string),
    }
}
