//! # Commands Module / 命令模块
//!
//! Implementations of the `run` and `preview` subcommands.
//!
//! `run` 和 `preview` 子命令的实现。

pub mod preview;
pub mod run;
