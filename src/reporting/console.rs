//! # Console Reporting Module / 控制台报告模块
//!
//! This module prints the end-of-run summary and failure details to the
//! console, with color coding and internationalization support. The report
//! file itself is written by the aggregator; nothing here touches it.
//!
//! 此模块在控制台打印运行结束时的摘要和失败详情，
//! 使用颜色编码并支持国际化。报告文件本身由聚合器写入，此处不涉及。

use colored::*;

use crate::core::outcome::{OutcomeStatus, TestOutcome};
use crate::infra::t;
use crate::reporting::aggregator::FinishedRun;

/// Prints a formatted summary of a finished run to the console.
/// Displays one line per case with status, name and duration, followed by
/// the totals and the success rate.
///
/// 在控制台打印已完成运行的格式化摘要。
/// 每个用例一行，显示状态、名称和持续时间，随后是总数和成功率。
///
/// # Arguments / 参数
/// * `run` - The finished run to summarize
///           要总结的已完成运行
/// * `locale` - The language locale to use for messages
///              用于消息的语言区域设置
///
/// # Output Format / 输出格式
/// ```text
/// --- Test Summary ---
///   - Passed   | create_issue[1]                          |    120ms
///   - Failed   | create_issue[2]                          |     87ms
///   - Skipped  | create_issue[3]                          |      0ms
/// ```
pub fn print_summary(run: &FinishedRun, locale: &str) {
    println!("\n{}", t!("test_summary_banner", locale = locale).bold());

    let mut outcomes: Vec<&TestOutcome> = run.outcomes.iter().collect();
    outcomes.sort_by(|a, b| a.name().cmp(b.name()));

    for outcome in outcomes {
        let status = status_text(outcome.status(), locale);
        let status_colored = match outcome.status() {
            OutcomeStatus::Passed => status.green(),
            OutcomeStatus::Failed => status.red(),
            OutcomeStatus::Skipped => status.dimmed(),
        };
        println!(
            "  - {:<10} | {:<40} | {:>8}",
            status_colored,
            outcome.name(),
            format!("{}ms", outcome.duration_millis())
        );
    }

    let summary = &run.summary;
    println!(
        "\n{}",
        t!(
            "summary_totals",
            locale = locale,
            total = summary.total(),
            passed = summary.passed,
            failed = summary.failed,
            skipped = summary.skipped,
            rate = summary.success_rate_text()
        )
    );
    if let Some(path) = &run.report_path {
        println!("{}", t!("report_written", locale = locale, path = path.display()));
    }
}

/// Prints the error details of every failed case.
///
/// 打印每个失败用例的错误详情。
pub fn print_failure_details(run: &FinishedRun, locale: &str) {
    let failures: Vec<&TestOutcome> = run
        .outcomes
        .iter()
        .filter(|o| o.status() == OutcomeStatus::Failed)
        .collect();
    if failures.is_empty() {
        return;
    }

    println!("\n{}", t!("failure_banner", locale = locale).red().bold());
    println!("{}", "-".repeat(80));

    for (i, outcome) in failures.iter().enumerate() {
        println!(
            "[{}/{}] {} '{}' ({})",
            i + 1,
            failures.len(),
            t!("failure_header", locale = locale).red(),
            outcome.name().cyan(),
            outcome.group()
        );
        if let Some(detail) = outcome.failure() {
            println!("  {}", detail.message);
            for cause in &detail.causes {
                println!("    {} {}", t!("caused_by", locale = locale).yellow(), cause);
            }
        }
        println!("{}", "-".repeat(80));
    }
}

fn status_text(status: OutcomeStatus, locale: &str) -> String {
    match status {
        OutcomeStatus::Passed => t!("status_passed", locale = locale).to_string(),
        OutcomeStatus::Failed => t!("status_failed", locale = locale).to_string(),
        OutcomeStatus::Skipped => t!("status_skipped", locale = locale).to_string(),
    }
}
