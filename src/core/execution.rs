//! # Test Execution Engine Module / 测试执行引擎模块
//!
//! Expands a data-driven test over the rows of a `TestCaseMatrix` and runs
//! one case per row, either sequentially or with a bounded number of
//! concurrent workers. Every case produces exactly one event on the
//! `ReportAggregator`: timeouts, errors and panics become failures, and
//! cancellation becomes a skip. Cases are never retried.
//!
//! 将数据驱动测试展开到 `TestCaseMatrix` 的各行上，每行运行一个用例，
//! 可以顺序执行，也可以使用有限数量的并发工作者执行。每个用例在
//! `ReportAggregator` 上恰好产生一个事件：超时、错误和 panic 记为失败，
//! 取消记为跳过。用例从不重试。

use anyhow::Result;
use colored::*;
use futures::{stream, StreamExt};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        matrix::{Row, TestCaseMatrix},
        outcome::{ErrorDetail, FinishedCase},
    },
    infra::t,
    reporting::aggregator::{ReportAggregator, ReportError},
};

/// How the rows of one data source are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// One row at a time, in source order.
    Sequential,
    /// Up to `jobs` rows at once; completion order is unspecified.
    Parallel { jobs: usize },
}

impl ExecutionMode {
    pub fn jobs(&self) -> usize {
        match self {
            ExecutionMode::Sequential => 1,
            ExecutionMode::Parallel { jobs } => (*jobs).max(1),
        }
    }
}

/// What a case body reports when it completes without error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseVerdict {
    Passed,
    /// The case decided not to run, with a reason shown in the report.
    Skipped(String),
}

/// A data-driven test template: run once per matrix row.
/// 数据驱动测试模板：对矩阵的每一行运行一次。
#[derive(Debug, Clone)]
pub struct DataDrivenTest {
    pub name: String,
    pub group: String,
    pub description: Option<String>,
    pub mode: ExecutionMode,
}

impl DataDrivenTest {
    pub fn new(name: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group: group.into(),
            description: None,
            mode: ExecutionMode::Sequential,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Name of the case generated for `row`, e.g. `create_issue[3]`.
    pub fn case_name(&self, row: &Row) -> String {
        format!("{}[{}]", self.name, row.index())
    }

    fn finished_case(&self, name: String, duration: Duration, note: Option<String>) -> FinishedCase {
        let description = match (&self.description, note) {
            (Some(d), Some(n)) => Some(format!("{d} ({n})")),
            (Some(d), None) => Some(d.clone()),
            (None, n) => n,
        };
        FinishedCase {
            name,
            group: self.group.clone(),
            duration,
            description,
        }
    }
}

/// How a single case ended, before it is turned into an aggregator event.
enum CaseEnd {
    Verdict(CaseVerdict),
    Error(ErrorDetail),
    TimedOut(Duration),
    Cancelled,
}

/// Runs `body` once per row of `matrix` and records every case on
/// `aggregator`. The aggregator must already be started.
///
/// # Arguments
/// * `test` - Name, group and scheduling mode of the data-driven test
/// * `matrix` - The rows to expand the test over
/// * `timeout` - Upper bound for a single case
/// * `aggregator` - Receives one event per case
/// * `cancel` - When cancelled, unfinished cases are recorded as skipped
/// * `body` - The case body, called with one row
///
/// # Returns
/// The number of cases recorded, or the first aggregator error
///
/// 对 `matrix` 的每一行运行一次 `body`，并在 `aggregator` 上记录每个用例。
pub async fn run_data_driven<F, Fut>(
    test: &DataDrivenTest,
    matrix: Arc<TestCaseMatrix>,
    timeout: Duration,
    aggregator: Arc<ReportAggregator>,
    cancel: CancellationToken,
    body: F,
) -> Result<usize, ReportError>
where
    F: Fn(Row) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<CaseVerdict>> + Send + 'static,
{
    let body = Arc::new(body);
    let test = Arc::new(test.clone());
    let jobs = test.mode.jobs();

    let tasks = stream::iter(matrix.rows().to_vec().into_iter().map(|row| {
        let body = Arc::clone(&body);
        let test = Arc::clone(&test);
        let aggregator = Arc::clone(&aggregator);
        let cancel = cancel.clone();

        tokio::spawn(async move {
            let name = test.case_name(&row);
            let started = Instant::now();

            let end = if cancel.is_cancelled() {
                CaseEnd::Cancelled
            } else {
                // The body runs in its own task so a panic is contained.
                let mut handle = tokio::spawn((*body)(row));
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        handle.abort();
                        CaseEnd::Cancelled
                    }
                    _ = tokio::time::sleep(timeout) => {
                        handle.abort();
                        CaseEnd::TimedOut(timeout)
                    }
                    joined = &mut handle => match joined {
                        Ok(Ok(verdict)) => CaseEnd::Verdict(verdict),
                        Ok(Err(e)) => CaseEnd::Error(ErrorDetail::from_error(&e)),
                        Err(join_error) => CaseEnd::Error(
                            ErrorDetail::new("test case panicked").with_cause(join_error.to_string()),
                        ),
                    },
                }
            };

            record_case(&test, &aggregator, name, started.elapsed(), end)
        })
    }));

    let results: Vec<_> = tasks.buffer_unordered(jobs).collect().await;

    let mut recorded = 0;
    let mut first_error = None;
    for result in results {
        match result {
            Ok(Ok(())) => recorded += 1,
            Ok(Err(e)) => {
                first_error.get_or_insert(e);
            }
            Err(join_error) => {
                // Recording itself never panics; treat a lost task as an I/O fault.
                first_error.get_or_insert(ReportError::Io(std::io::Error::other(
                    join_error.to_string(),
                )));
            }
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(recorded),
    }
}

fn record_case(
    test: &DataDrivenTest,
    aggregator: &ReportAggregator,
    name: String,
    duration: Duration,
    end: CaseEnd,
) -> Result<(), ReportError> {
    match end {
        CaseEnd::Verdict(CaseVerdict::Passed) => {
            println!(
                "{}",
                t!("run.case_passed", name = &name, duration = duration.as_millis()).green()
            );
            aggregator.record_success(test.finished_case(name, duration, None))
        }
        CaseEnd::Verdict(CaseVerdict::Skipped(reason)) => {
            println!(
                "{}",
                t!("run.case_skipped", name = &name, reason = &reason).dimmed()
            );
            aggregator.record_skip(test.finished_case(name, duration, Some(reason)))
        }
        CaseEnd::Error(detail) => {
            println!(
                "{}",
                t!("run.case_failed", name = &name, duration = duration.as_millis()).red()
            );
            aggregator.record_failure(test.finished_case(name, duration, None), Some(detail))
        }
        CaseEnd::TimedOut(limit) => {
            println!(
                "{}",
                t!("run.case_timeout", name = &name, timeout = limit.as_secs()).red()
            );
            let detail = ErrorDetail::new(format!(
                "timed out after {}s",
                limit.as_secs_f64()
            ));
            aggregator.record_failure(test.finished_case(name, duration, None), Some(detail))
        }
        CaseEnd::Cancelled => {
            aggregator.record_skip(test.finished_case(name, duration, Some("cancelled".to_string())))
        }
    }
}
