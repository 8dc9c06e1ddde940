//! # Report Aggregator Module / 报告聚合器模块
//!
//! A thread-safe sink for test-lifecycle events. The aggregator is an
//! explicit state machine:
//!
//! ```text
//! NotStarted --start()--> Running --finish()--> Finished
//! ```
//!
//! While `Running`, `record_*` may be called from any number of threads.
//! Each call appends the outcome and writes its text block under one mutex,
//! so counters always equal the number of calls and blocks never interleave.
//! The report output is owned by the aggregator for the whole run and is
//! released by `finish()` or, on abnormal teardown, by `Drop`.
//!
//! 测试生命周期事件的线程安全接收器。聚合器是一个显式状态机。
//! 在 `Running` 状态下，`record_*` 可以从任意数量的线程调用。每次调用都在同一个
//! 互斥锁下追加结果并写入其文本块，因此计数始终等于调用次数，且文本块不会交错。
//! 报告输出在整个运行期间由聚合器独占，并由 `finish()` 或在异常退出时由 `Drop` 释放。

use chrono::{DateTime, Local};
use parking_lot::Mutex;
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::mem;
use std::path::PathBuf;
use thiserror::Error;

use crate::core::outcome::{ErrorDetail, FinishedCase, RunSummary, TestOutcome};
use crate::infra::fs::create_report_file;
use crate::reporting::text;

/// Lifecycle misuse and output failures of the aggregator.
/// 聚合器的生命周期误用和输出失败。
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("the run has already been started")]
    AlreadyStarted,
    #[error("the run has not been started")]
    NotStarted,
    #[error("the run has already finished")]
    RunAlreadyFinished,
    #[error("failed to write the report")]
    Io(#[from] io::Error),
}

/// Where the report goes.
pub enum ReportSink {
    /// A new file named `test-report-<timestamp>.txt` inside this directory.
    Directory(PathBuf),
    /// This exact file, created or truncated.
    File(PathBuf),
    /// Any writer, e.g. an in-memory buffer.
    Writer(Box<dyn Write + Send>),
}

impl fmt::Debug for ReportSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportSink::Directory(dir) => f.debug_tuple("Directory").field(dir).finish(),
            ReportSink::File(path) => f.debug_tuple("File").field(path).finish(),
            ReportSink::Writer(_) => f.write_str("Writer(..)"),
        }
    }
}

impl ReportSink {
    fn open(self, started_at: &DateTime<Local>) -> io::Result<(Box<dyn Write + Send>, Option<PathBuf>)> {
        match self {
            ReportSink::Directory(dir) => {
                let (file, path) = create_report_file(&dir, started_at)?;
                let writer: Box<dyn Write + Send> = Box::new(BufWriter::new(file));
                Ok((writer, Some(path)))
            }
            ReportSink::File(path) => {
                let file = File::create(&path)?;
                let writer: Box<dyn Write + Send> = Box::new(BufWriter::new(file));
                Ok((writer, Some(path)))
            }
            ReportSink::Writer(writer) => Ok((writer, None)),
        }
    }
}

/// Externally visible lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    NotStarted,
    Running,
    Finished,
}

/// Everything a finished run produced.
/// 已完成运行产生的全部内容。
#[derive(Debug, Clone)]
pub struct FinishedRun {
    pub run_name: String,
    pub summary: RunSummary,
    /// Outcomes in arrival order.
    pub outcomes: Vec<TestOutcome>,
    pub report_path: Option<PathBuf>,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
}

struct ActiveRun {
    run_name: String,
    started_at: DateTime<Local>,
    writer: Box<dyn Write + Send>,
    report_path: Option<PathBuf>,
    outcomes: Vec<TestOutcome>,
}

enum RunState {
    /// `None` once a failed `start()` consumed the sink.
    NotStarted(Option<ReportSink>),
    Running(ActiveRun),
    Finished,
}

/// Collects outcomes from concurrently executing test cases and writes the
/// run report. Share it between tasks with `Arc<ReportAggregator>`.
pub struct ReportAggregator {
    state: Mutex<RunState>,
}

impl fmt::Debug for ReportAggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportAggregator")
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}

impl ReportAggregator {
    pub fn new(sink: ReportSink) -> Self {
        Self {
            state: Mutex::new(RunState::NotStarted(Some(sink))),
        }
    }

    /// Aggregator writing a timestamped report file into `dir`.
    pub fn in_directory(dir: impl Into<PathBuf>) -> Self {
        Self::new(ReportSink::Directory(dir.into()))
    }

    pub fn phase(&self) -> RunPhase {
        match &*self.state.lock() {
            RunState::NotStarted(_) => RunPhase::NotStarted,
            RunState::Running(_) => RunPhase::Running,
            RunState::Finished => RunPhase::Finished,
        }
    }

    /// Counts recorded so far; all zero outside `Running`.
    pub fn tally(&self) -> RunSummary {
        match &*self.state.lock() {
            RunState::Running(run) => RunSummary::from_outcomes(&run.outcomes),
            _ => RunSummary::default(),
        }
    }

    /// Path of the report file, once the run has started with a file sink.
    pub fn report_path(&self) -> Option<PathBuf> {
        match &*self.state.lock() {
            RunState::Running(run) => run.report_path.clone(),
            _ => None,
        }
    }

    /// Opens the output and writes the report header.
    ///
    /// 打开输出并写入报告头。
    ///
    /// # Errors
    /// `AlreadyStarted` if `start` was called before (even if the run has
    /// since finished); `Io` if the output cannot be opened or written.
    pub fn start(&self, run_name: &str) -> Result<(), ReportError> {
        let mut state = self.state.lock();
        let sink = match &mut *state {
            RunState::NotStarted(sink) => sink.take().ok_or_else(|| {
                io::Error::other("report output was lost by an earlier failed start")
            })?,
            RunState::Running(_) | RunState::Finished => return Err(ReportError::AlreadyStarted),
        };

        let started_at = Local::now();
        let (mut writer, report_path) = sink.open(&started_at)?;
        writer.write_all(text::render_header(run_name, &started_at).as_bytes())?;
        writer.flush()?;

        *state = RunState::Running(ActiveRun {
            run_name: run_name.to_string(),
            started_at,
            writer,
            report_path,
            outcomes: Vec::new(),
        });
        Ok(())
    }

    /// Records a passed case.
    pub fn record_success(&self, case: FinishedCase) -> Result<(), ReportError> {
        self.record(TestOutcome::passed(case))
    }

    /// Records a failed case. `detail` (message and cause chain) is rendered
    /// in full beneath the case's block when present.
    pub fn record_failure(
        &self,
        case: FinishedCase,
        detail: Option<ErrorDetail>,
    ) -> Result<(), ReportError> {
        self.record(TestOutcome::failed(case, detail))
    }

    /// Records a skipped case.
    pub fn record_skip(&self, case: FinishedCase) -> Result<(), ReportError> {
        self.record(TestOutcome::skipped(case))
    }

    /// Records an outcome of any status. The outcome is counted even if
    /// writing its block fails, in which case `Io` is returned.
    ///
    /// 记录任意状态的结果。即使写入其文本块失败也会计入，此时返回 `Io`。
    pub fn record(&self, outcome: TestOutcome) -> Result<(), ReportError> {
        // Rendering happens outside the lock; only count-and-write is serialized.
        let block = text::render_outcome(&outcome);

        let mut state = self.state.lock();
        let run = match &mut *state {
            RunState::Running(run) => run,
            RunState::NotStarted(_) => return Err(ReportError::NotStarted),
            RunState::Finished => return Err(ReportError::RunAlreadyFinished),
        };
        run.outcomes.push(outcome);
        run.writer.write_all(block.as_bytes())?;
        run.writer.flush()?;
        Ok(())
    }

    /// Writes the summary block, releases the output and returns the run.
    ///
    /// 写入摘要块，释放输出并返回运行结果。
    ///
    /// # Errors
    /// `NotStarted` before `start`, `RunAlreadyFinished` on a second call.
    pub fn finish(&self) -> Result<FinishedRun, ReportError> {
        let mut state = self.state.lock();
        let mut run = match mem::replace(&mut *state, RunState::Finished) {
            RunState::Running(run) => run,
            not_started @ RunState::NotStarted(_) => {
                *state = not_started;
                return Err(ReportError::NotStarted);
            }
            RunState::Finished => return Err(ReportError::RunAlreadyFinished),
        };
        drop(state);

        let summary = RunSummary::from_outcomes(&run.outcomes);
        let finished_at = Local::now();
        run.writer
            .write_all(text::render_summary(&summary, &finished_at).as_bytes())?;
        run.writer.flush()?;

        let ActiveRun {
            run_name,
            started_at,
            writer,
            report_path,
            outcomes,
        } = run;
        drop(writer);

        Ok(FinishedRun {
            run_name,
            summary,
            outcomes,
            report_path,
            started_at,
            finished_at,
        })
    }
}

impl Drop for ReportAggregator {
    fn drop(&mut self) {
        if let RunState::Running(run) = self.state.get_mut() {
            let notice = text::render_abort_notice(run.outcomes.len(), &Local::now());
            // Nothing can be reported from drop; the handle closes either way.
            let _ = run.writer.write_all(notice.as_bytes());
            let _ = run.writer.flush();
        }
    }
}
