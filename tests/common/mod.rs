// Shared test helpers for integration tests
#![allow(dead_code)]

use api_harness::core::outcome::FinishedCase;
use api_harness::reporting::aggregator::ReportSink;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Writes `content` to `dir/name` and returns the path.
pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("Failed to write fixture file");
    path
}

/// An in-memory report output that can be read back after the aggregator
/// has taken ownership of its writer half.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sink(&self) -> ReportSink {
        ReportSink::Writer(Box::new(self.clone()))
    }

    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).expect("report is not UTF-8")
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A finished case in the `DataDrivenTests` group.
pub fn case(name: &str, millis: u64) -> FinishedCase {
    FinishedCase::new(name, "DataDrivenTests", Duration::from_millis(millis))
}

/// Counts how many outcome blocks a report contains.
pub fn count_blocks(report: &str) -> usize {
    report.lines().filter(|l| l.starts_with("Test: ")).count()
}

/// A harness config pointing at an address nothing listens on, so every
/// HTTP case fails fast with a connection error.
pub fn unreachable_config(report_dir: &Path, source_toml: &str) -> String {
    format!(
        r#"
language = "en"
name = "offline run"
report_dir = "{}"

[context]
base_url = "http://127.0.0.1:9"
timeout_secs = 2

[[suites]]
name = "get_issue"
group = "Issues"
{source_toml}

[suites.request]
method = "GET"
path = "/issues/{{id}}"
"#,
        report_dir.display().to_string().replace('\\', "/")
    )
}
