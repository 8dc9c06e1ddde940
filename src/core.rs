//! # Core Module / 核心模块
//!
//! This module contains the core functionality of API Harness:
//! the cell model, the test case matrix, outcomes, the execution context,
//! configuration and the data-driven execution driver.
//!
//! 此模块包含 API Harness 的核心功能：
//! 单元格模型、测试用例矩阵、结果、执行上下文、配置和数据驱动执行驱动。

pub mod cell;
pub mod config;
pub mod context;
pub mod execution;
pub mod matrix;
pub mod outcome;
pub mod suite;

// Re-exports
pub use config::HarnessConfig;
pub use execution::run_data_driven;
pub use outcome::{RunSummary, TestOutcome};
