//! # Test Outcome Module / 测试结果模块
//!
//! Terminal results of executed test cases and the summary derived from them.
//!
//! 已执行测试用例的最终结果，以及由这些结果推导出的摘要。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Status of one finished test case.
/// 单个已完成测试用例的状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutcomeStatus {
    Passed,
    Failed,
    Skipped,
}

impl OutcomeStatus {
    /// Label written into the report file.
    pub fn label(&self) -> &'static str {
        match self {
            OutcomeStatus::Passed => "PASSED",
            OutcomeStatus::Failed => "FAILED",
            OutcomeStatus::Skipped => "SKIPPED",
        }
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A rendered error: the top-level message followed by its cause chain.
///
/// 渲染后的错误：顶层消息及其原因链。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(default)]
    pub causes: Vec<String>,
}

impl ErrorDetail {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            causes: Vec::new(),
        }
    }

    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.causes.push(cause.into());
        self
    }

    /// Captures an `anyhow` error and every error in its `source()` chain.
    pub fn from_error(error: &anyhow::Error) -> Self {
        let mut chain = error.chain();
        let message = chain
            .next()
            .map(ToString::to_string)
            .unwrap_or_default();
        Self {
            message,
            causes: chain.map(ToString::to_string).collect(),
        }
    }
}

impl From<&anyhow::Error> for ErrorDetail {
    fn from(error: &anyhow::Error) -> Self {
        Self::from_error(error)
    }
}

/// What a runner knows about a case when it finishes, before a status is
/// attached. The aggregator's `record_*` hooks turn it into a `TestOutcome`.
///
/// 用例完成时运行器所知道的信息（尚未附加状态）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedCase {
    pub name: String,
    pub group: String,
    pub duration: Duration,
    pub description: Option<String>,
}

impl FinishedCase {
    pub fn new(name: impl Into<String>, group: impl Into<String>, duration: Duration) -> Self {
        Self {
            name: name.into(),
            group: group.into(),
            duration,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// The terminal result of one executed test case. Immutable once built.
/// 单个已执行测试用例的最终结果。一旦构建即不可变。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestOutcome {
    name: String,
    group: String,
    status: OutcomeStatus,
    duration_millis: u64,
    description: Option<String>,
    failure: Option<ErrorDetail>,
}

impl TestOutcome {
    /// Builds an outcome. A failure detail is only kept for `Failed`.
    pub fn new(case: FinishedCase, status: OutcomeStatus, failure: Option<ErrorDetail>) -> Self {
        let duration_millis = u64::try_from(case.duration.as_millis()).unwrap_or(u64::MAX);
        Self {
            name: case.name,
            group: case.group,
            status,
            duration_millis,
            description: case.description,
            failure: failure.filter(|_| status == OutcomeStatus::Failed),
        }
    }

    pub fn passed(case: FinishedCase) -> Self {
        Self::new(case, OutcomeStatus::Passed, None)
    }

    pub fn failed(case: FinishedCase, failure: Option<ErrorDetail>) -> Self {
        Self::new(case, OutcomeStatus::Failed, failure)
    }

    pub fn skipped(case: FinishedCase) -> Self {
        Self::new(case, OutcomeStatus::Skipped, None)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn status(&self) -> OutcomeStatus {
        self.status
    }

    pub fn duration_millis(&self) -> u64 {
        self.duration_millis
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn failure(&self) -> Option<&ErrorDetail> {
        self.failure.as_ref()
    }
}

/// Pass/fail/skip counts of a run. Derived, never stored separately from
/// the outcomes it was computed from.
///
/// 一次运行的通过/失败/跳过计数。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl RunSummary {
    pub fn from_outcomes<'a>(outcomes: impl IntoIterator<Item = &'a TestOutcome>) -> Self {
        let mut summary = Self::default();
        for outcome in outcomes {
            summary.add(outcome.status());
        }
        summary
    }

    pub fn add(&mut self, status: OutcomeStatus) {
        match status {
            OutcomeStatus::Passed => self.passed += 1,
            OutcomeStatus::Failed => self.failed += 1,
            OutcomeStatus::Skipped => self.skipped += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped
    }

    /// `passed / total`, or `None` for an empty run.
    pub fn success_rate(&self) -> Option<f64> {
        match self.total() {
            0 => None,
            total => Some(self.passed as f64 / total as f64),
        }
    }

    /// Success rate as a percentage with two decimals (`"60.00%"`), or
    /// `"N/A"` for an empty run.
    pub fn success_rate_text(&self) -> String {
        match self.success_rate() {
            Some(rate) => format!("{:.2}%", rate * 100.0),
            None => "N/A".to_string(),
        }
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}
