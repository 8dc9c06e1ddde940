// src/commands/run.rs

use anyhow::{Context, Result};
use colored::*;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        config::{HarnessConfig, SuiteConfig},
        context::ExecutionContext,
        execution::{run_data_driven, ExecutionMode},
        matrix::TestCaseMatrix,
        suite::{describe_suite, ApiCheck},
    },
    infra::{
        fs::{config_base_dir, resolve_path},
        http::ApiClient,
        t,
    },
    reporting::{print_failure_details, print_summary, ReportAggregator},
    resolve_locale,
};

/// Grace period added on top of the HTTP timeout before a case is abandoned.
const CASE_TIMEOUT_GRACE: Duration = Duration::from_secs(5);

/// Options of the `run` subcommand.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub config: PathBuf,
    pub jobs: Option<usize>,
    pub report_dir: Option<PathBuf>,
    /// Locale given on the command line; overrides the config's `language`.
    pub lang_override: Option<String>,
}

/// A suite whose data source has been loaded successfully.
struct PreparedSuite<'a> {
    config: &'a SuiteConfig,
    matrix: Arc<TestCaseMatrix>,
    check: Arc<ApiCheck>,
}

pub async fn execute(options: RunOptions) -> Result<()> {
    let (config, config_path) = HarnessConfig::load(&options.config)?;
    let locale = match &options.lang_override {
        Some(lang) => resolve_locale(lang),
        None => resolve_locale(&config.language),
    };
    rust_i18n::set_locale(locale);

    println!(
        "{}",
        t!("loading_config", locale = locale, path = config_path.display())
    );

    let base_dir = config_base_dir(&config_path);
    let report_dir = match (&options.report_dir, &config.report_dir) {
        (Some(dir), _) => dir.clone(),
        (None, Some(dir)) => resolve_path(&base_dir, dir)?,
        (None, None) => base_dir.clone(),
    };

    // Every source is loaded before the first case runs.
    let suites = prepare_suites(&config, &base_dir, locale)?;
    if suites.is_empty() {
        println!("{}", t!("no_suites", locale = locale).yellow());
    }

    let context = Arc::new(ExecutionContext::from_config(&config.context)?);
    let client = ApiClient::new(&context)?;
    let default_jobs = options
        .jobs
        .or(config.jobs)
        .unwrap_or(num_cpus::get() / 2 + 1)
        .max(1);

    println!(
        "{}",
        t!("target_api", locale = locale, url = context.base_uri()).cyan()
    );

    let aggregator = Arc::new(ReportAggregator::in_directory(&report_dir));
    aggregator
        .start(&config.name)
        .with_context(|| t!("report_start_failed", locale = locale, path = report_dir.display()))?;
    if let Some(path) = aggregator.report_path() {
        println!("{}", t!("report_file", locale = locale, path = path.display()));
    }

    let stop_token = setup_signal_handler(locale);
    let case_timeout = context.timeout() + CASE_TIMEOUT_GRACE;

    for suite in suites {
        let test = describe_suite(suite.config, default_jobs);
        let mode = match test.mode {
            ExecutionMode::Sequential => t!("mode_sequential", locale = locale),
            ExecutionMode::Parallel { jobs } => t!("mode_parallel", locale = locale, jobs = jobs),
        };
        println!(
            "\n{}",
            t!(
                "running_suite",
                locale = locale,
                name = &test.name,
                count = suite.matrix.len(),
                mode = mode
            )
            .bold()
        );

        let client = client.clone();
        let context = Arc::clone(&context);
        let check = suite.check;
        run_data_driven(
            &test,
            suite.matrix,
            case_timeout,
            Arc::clone(&aggregator),
            stop_token.clone(),
            move |row| {
                let client = client.clone();
                let context = Arc::clone(&context);
                let check = Arc::clone(&check);
                async move { check.execute(&client, &context, &row).await }
            },
        )
        .await?;
    }

    let finished = aggregator.finish()?;
    print_summary(&finished, locale);

    if finished.summary.has_failures() {
        print_failure_details(&finished, locale);
        anyhow::bail!(t!(
            "run_failed",
            locale = locale,
            count = finished.summary.failed
        ));
    }
    println!("\n{}", t!("all_tests_passed", locale = locale).green().bold());
    Ok(())
}

fn prepare_suites<'a>(
    config: &'a HarnessConfig,
    base_dir: &Path,
    locale: &str,
) -> Result<Vec<PreparedSuite<'a>>> {
    config
        .suites
        .iter()
        .map(|suite| -> Result<PreparedSuite<'a>> {
            let matrix = suite.source.load(base_dir).with_context(|| {
                t!(
                    "source_load_failed",
                    locale = locale,
                    name = &suite.name,
                    source = suite.source.describe()
                )
            })?;
            println!(
                "{}",
                t!(
                    "source_loaded",
                    locale = locale,
                    name = &suite.name,
                    source = suite.source.describe(),
                    count = matrix.len()
                )
                .cyan()
            );
            let check = ApiCheck::new(suite.request.clone(), &matrix)
                .with_context(|| format!("suite '{}'", suite.name))?;
            Ok(PreparedSuite {
                config: suite,
                matrix: Arc::new(matrix),
                check: Arc::new(check),
            })
        })
        .collect()
}

fn setup_signal_handler(locale: &str) -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();
    let locale = locale.to_string();

    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            println!("\n{}", t!("shutdown_signal", locale = &locale).yellow());
            token_clone.cancel();
        }
    });

    token
}
