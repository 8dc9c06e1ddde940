use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::context::ContextConfig;
use crate::sources::DataSource;

/// Represents the whole harness configuration, loaded from a TOML file.
/// It holds the connection context and the list of data-driven suites.
/// 代表从 TOML 文件加载的整个测试工具配置。
/// 它包含连接上下文和数据驱动测试套件列表。
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HarnessConfig {
    /// The language for console messages (e.g., "en", "zh-CN").
    /// Defaults to "en" if not specified.
    ///
    /// 控制台消息的语言（例如 "en", "zh-CN"）。如果未指定，则默认为 "en"。
    #[serde(default = "default_language")]
    pub language: String,

    /// Run name written into the report header.
    /// 写入报告头部的运行名称。
    #[serde(default = "default_run_name")]
    pub name: String,

    /// Directory that receives the report file. Relative to the config file.
    /// 接收报告文件的目录，相对于配置文件。
    #[serde(default)]
    pub report_dir: Option<PathBuf>,

    /// Default number of concurrent cases for suites marked `parallel`.
    /// 标记为 `parallel` 的套件的默认并发用例数。
    #[serde(default)]
    pub jobs: Option<usize>,

    pub context: ContextConfig,

    #[serde(default)]
    pub suites: Vec<SuiteConfig>,
}

fn default_language() -> String {
    "en".to_string()
}

fn default_run_name() -> String {
    "REST API Test Suite".to_string()
}

/// One data-driven test: a data source plus the request executed per row.
/// 一个数据驱动测试：一个数据源加上针对每一行执行的请求。
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SuiteConfig {
    /// Test name; each case is reported as `<name>[<row>]`.
    pub name: String,
    /// Owning group shown as `Class:` in the report. Defaults to the name.
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Run this suite's rows concurrently.
    #[serde(default)]
    pub parallel: bool,
    /// Overrides the global `jobs` for this suite.
    #[serde(default)]
    pub jobs: Option<usize>,
    pub source: DataSource,
    pub request: RequestSpec,
}

impl SuiteConfig {
    pub fn group_name(&self) -> &str {
        self.group.as_deref().unwrap_or(&self.name)
    }
}

/// The request sent for every row, with `{column}` placeholders.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RequestSpec {
    #[serde(default = "default_method")]
    pub method: String,
    pub path: String,
    #[serde(default)]
    pub query: BTreeMap<String, String>,
    #[serde(default)]
    pub body: Option<Value>,
    #[serde(default)]
    pub expect_status: StatusExpectation,
    /// Top-level JSON fields the response body must contain.
    #[serde(default)]
    pub require_fields: Vec<String>,
}

fn default_method() -> String {
    "GET".to_string()
}

/// Expected HTTP status: a fixed code, or a placeholder resolved per row.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum StatusExpectation {
    Code(u16),
    Template(String),
}

impl Default for StatusExpectation {
    fn default() -> Self {
        StatusExpectation::Code(200)
    }
}

impl HarnessConfig {
    /// Reads and parses a config file. Returns the config together with the
    /// canonical path of the file, whose parent directory anchors relative
    /// paths in the config.
    pub fn load(path: &Path) -> Result<(Self, PathBuf)> {
        let config_path = fs::canonicalize(path)
            .with_context(|| format!("Failed to locate config file: {}", path.display()))?;
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;
        Ok((config, config_path))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: HarnessConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.jobs == Some(0) {
            bail!("jobs must be greater than zero");
        }
        let mut seen = std::collections::HashSet::new();
        for suite in &self.suites {
            if !seen.insert(suite.name.as_str()) {
                bail!("duplicate suite name '{}'", suite.name);
            }
            if suite.jobs == Some(0) {
                bail!("suite '{}': jobs must be greater than zero", suite.name);
            }
            if reqwest::Method::from_bytes(suite.request.method.as_bytes()).is_err() {
                bail!(
                    "suite '{}': invalid HTTP method '{}'",
                    suite.name,
                    suite.request.method
                );
            }
        }
        Ok(())
    }
}
