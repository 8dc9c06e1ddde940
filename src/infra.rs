//! # Infrastructure Module / 基础设施模块
//!
//! This module provides infrastructure services for API Harness,
//! including the HTTP client, file system operations, and i18n support.
//!
//! 此模块为 API Harness 提供基础设施服务，
//! 包括 HTTP 客户端、文件系统操作和国际化支持。

pub mod fs;
pub mod http;

// Re-export i18n functions for easier access
pub use rust_i18n::t;
