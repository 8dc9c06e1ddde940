//! # Plain-Text Report Layout / 纯文本报告布局
//!
//! Renders the blocks of the run report. Every function returns a complete
//! block as one `String` so the aggregator can write it in a single call
//! while holding its lock.
//!
//! 渲染运行报告的各个块。每个函数都将完整的块作为一个 `String` 返回，
//! 以便聚合器在持有锁的情况下一次性写入。
//!
//! ## Layout / 布局
//!
//! ```text
//! ================================================================================
//! REST API Test Execution Report
//! Test Suite: nightly
//! Start Time: 2024-05-01 10:00:00.000
//! ================================================================================
//!
//! --------------------------------------------------------------------------------
//! Test: create_issue[1]
//! Class: DataDrivenTests
//! Status: FAILED
//! Duration: 42ms
//! Description: Create issues from CSV data
//! Error Details:
//! expected status 200, got 400
//! Caused by: ...
//!
//! ================================================================================
//! Test Execution Summary
//! ================================================================================
//! Total Tests: 1
//! ...
//! ```

use chrono::{DateTime, Local};

use crate::core::outcome::{RunSummary, TestOutcome};

pub const REPORT_TITLE: &str = "REST API Test Execution Report";
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";
const RULE_WIDTH: usize = 80;

fn heavy_rule() -> String {
    "=".repeat(RULE_WIDTH)
}

fn light_rule() -> String {
    "-".repeat(RULE_WIDTH)
}

pub fn render_header(run_name: &str, started_at: &DateTime<Local>) -> String {
    let mut out = String::new();
    push_line(&mut out, &heavy_rule());
    push_line(&mut out, REPORT_TITLE);
    push_line(&mut out, &format!("Test Suite: {run_name}"));
    push_line(
        &mut out,
        &format!("Start Time: {}", started_at.format(TIME_FORMAT)),
    );
    push_line(&mut out, &heavy_rule());
    push_line(&mut out, "");
    out
}

pub fn render_outcome(outcome: &TestOutcome) -> String {
    let mut out = String::new();
    push_line(&mut out, &light_rule());
    push_line(&mut out, &format!("Test: {}", outcome.name()));
    push_line(&mut out, &format!("Class: {}", outcome.group()));
    push_line(&mut out, &format!("Status: {}", outcome.status()));
    push_line(
        &mut out,
        &format!("Duration: {}ms", outcome.duration_millis()),
    );
    if let Some(description) = outcome.description() {
        push_line(&mut out, &format!("Description: {description}"));
    }
    if let Some(detail) = outcome.failure() {
        push_line(&mut out, "Error Details:");
        push_line(&mut out, &detail.message);
        for cause in &detail.causes {
            push_line(&mut out, &format!("Caused by: {cause}"));
        }
    }
    push_line(&mut out, "");
    out
}

pub fn render_summary(summary: &RunSummary, finished_at: &DateTime<Local>) -> String {
    let mut out = String::new();
    push_line(&mut out, "");
    push_line(&mut out, &heavy_rule());
    push_line(&mut out, "Test Execution Summary");
    push_line(&mut out, &heavy_rule());
    push_line(&mut out, &format!("Total Tests: {}", summary.total()));
    push_line(&mut out, &format!("Passed: {}", summary.passed));
    push_line(&mut out, &format!("Failed: {}", summary.failed));
    push_line(&mut out, &format!("Skipped: {}", summary.skipped));
    push_line(
        &mut out,
        &format!("Success Rate: {}", summary.success_rate_text()),
    );
    push_line(
        &mut out,
        &format!("End Time: {}", finished_at.format(TIME_FORMAT)),
    );
    push_line(&mut out, &heavy_rule());
    out
}

/// Trailer written when a running aggregator is dropped without `finish()`.
pub fn render_abort_notice(recorded: usize, at: &DateTime<Local>) -> String {
    let mut out = String::new();
    push_line(&mut out, "");
    push_line(&mut out, &heavy_rule());
    push_line(
        &mut out,
        &format!(
            "Run aborted at {} after {recorded} recorded outcomes; no summary was produced.",
            at.format(TIME_FORMAT)
        ),
    );
    push_line(&mut out, &heavy_rule());
    out
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::outcome::{ErrorDetail, FinishedCase};
    use std::time::Duration;

    #[test]
    fn test_failure_block_renders_cause_chain() {
        let case = FinishedCase::new("create[2]", "DataDrivenTests", Duration::from_millis(7));
        let detail = ErrorDetail::new("expected status 200, got 400").with_cause("bad request");
        let block = render_outcome(&TestOutcome::failed(case, Some(detail)));

        assert!(block.contains("Status: FAILED\n"));
        assert!(block.contains("Duration: 7ms\n"));
        assert!(block.contains("Error Details:\nexpected status 200, got 400\nCaused by: bad request\n"));
    }

    #[test]
    fn test_failure_without_detail_has_no_error_section() {
        let case = FinishedCase::new("assertion", "Group", Duration::ZERO);
        let block = render_outcome(&TestOutcome::failed(case, None));

        assert!(block.contains("Status: FAILED"));
        assert!(!block.contains("Error Details:"));
    }
}
