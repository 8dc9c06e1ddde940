//! # Reporting Module / 报告模块
//!
//! This module collects test outcomes into the plain-text run report and
//! prints colorful, formatted summaries to the console with
//! internationalization support.
//!
//! 此模块将测试结果汇总到纯文本运行报告中，
//! 并在控制台打印彩色格式化摘要，支持国际化。

pub mod aggregator;
pub mod console;
pub mod text;

// Re-export common reporting functions
pub use aggregator::{FinishedRun, ReportAggregator};
pub use console::{print_failure_details, print_summary};
