//! # API Harness Library / API Harness 库
//!
//! This library provides the core functionality for the API Harness tool,
//! a data-driven test harness for REST APIs. Test cases are expanded from
//! tabular sources (delimited text, spreadsheet workbooks or inline tables)
//! and every outcome is aggregated into one plain-text report.
//!
//! 此库为 API Harness 工具提供核心功能，
//! 这是一个面向 REST API 的数据驱动测试工具。测试用例从表格数据源
//! （分隔文本、电子表格工作簿或内联表格）展开，所有结果汇总到一个纯文本报告中。
//!
//! ## Modules / 模块
//!
//! - `core` - Cell model, test case matrix, outcomes, context and the execution driver
//! - `sources` - Data-source adapters producing a `TestCaseMatrix`
//! - `reporting` - Report aggregation, text rendering and console summaries
//! - `infra` - Infrastructure services like HTTP and file system operations
//! - `cli` / `commands` - Command-line interface and commands
//!
//! - `core` - 单元格模型、测试用例矩阵、结果、上下文和执行驱动
//! - `sources` - 生成 `TestCaseMatrix` 的数据源适配器
//! - `reporting` - 报告聚合、文本渲染和控制台摘要
//! - `infra` - 基础设施服务，如 HTTP 和文件系统操作
//! - `cli` / `commands` - 命令行接口和命令

pub mod cli;
pub mod commands;
pub mod core;
pub mod infra;
pub mod reporting;
pub mod sources;

// Re-export commonly used items
pub use crate::core::cell::{CanonicalCell, CellValue};
pub use crate::core::matrix::{Row, TestCaseMatrix};
pub use crate::reporting::aggregator::{ReportAggregator, ReportError, ReportSink};
pub use crate::sources::{DataSource, SourceError};

/// Initializes the application's internationalization (i18n) based on the system locale.
///
/// This function detects the user's system locale and sets the appropriate
/// language for the application's user interface. It attempts to match the full
/// locale (e.g., "zh-CN"), then just the language code (e.g., "en"), and
/// finally falls back to the default language ("en"). Returns the selected locale.
pub fn init() -> &'static str {
    let locale = sys_locale::get_locale().unwrap_or_else(|| "en".to_string());
    let lang = resolve_locale(&locale);
    rust_i18n::set_locale(lang);
    lang
}

/// Maps a requested locale (e.g. "zh_CN.UTF-8", "en-US") onto one of the
/// bundled locales, falling back to "en".
///
/// 将请求的语言区域映射到内置的语言区域之一，无法匹配时回退到 "en"。
pub fn resolve_locale(requested: &str) -> &'static str {
    let available_locales = rust_i18n::available_locales!();
    let requested = requested.split('.').next().unwrap_or_default().replace('_', "-");

    if let Some(exact) = available_locales
        .iter()
        .copied()
        .find(|locale| locale.eq_ignore_ascii_case(&requested))
    {
        return exact;
    }

    let language = requested.split('-').next().unwrap_or_default();
    available_locales
        .iter()
        .copied()
        .find(|locale| {
            locale
                .split('-')
                .next()
                .is_some_and(|code| code.eq_ignore_ascii_case(language))
        })
        .unwrap_or("en")
}

// Initialize i18n
rust_i18n::i18n!("locales", fallback = "en");
