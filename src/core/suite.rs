//! # API Suite Module / API 测试套件模块
//!
//! Turns a configured `RequestSpec` into a per-row HTTP check: placeholders
//! of the form `{column}` are filled from the row, the request is sent, and
//! the response is checked against the expected status and required fields.
//!
//! 将配置的 `RequestSpec` 转换为逐行的 HTTP 检查：用行数据填充 `{column}`
//! 形式的占位符，发送请求，并根据预期状态码和必需字段检查响应。

use anyhow::{anyhow, bail, Context, Result};
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;

use crate::core::config::{RequestSpec, StatusExpectation, SuiteConfig};
use crate::core::context::{ExecutionContext, RequestTemplate};
use crate::core::execution::{CaseVerdict, DataDrivenTest, ExecutionMode};
use crate::core::matrix::{Row, TestCaseMatrix};
use crate::infra::http::{ApiClient, ApiResponse};

/// A request spec bound to the columns of one matrix.
#[derive(Debug, Clone)]
pub struct ApiCheck {
    spec: RequestSpec,
    method: Method,
    columns: Arc<Vec<String>>,
}

/// A fully rendered request plus the status it must return.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedCase {
    pub request: RequestTemplate,
    pub expected_status: u16,
}

impl ApiCheck {
    /// Binds `spec` to the columns of `matrix`. Every placeholder in the
    /// path, query, body and status template must name one of those columns,
    /// so a typo is reported before any case runs.
    pub fn new(spec: RequestSpec, matrix: &TestCaseMatrix) -> Result<Self> {
        let method = Method::from_bytes(spec.method.to_ascii_uppercase().as_bytes())
            .with_context(|| format!("Invalid HTTP method '{}'", spec.method))?;
        for template in templates_of(&spec) {
            for name in placeholder_names(template)? {
                if matrix.column_index(&name).is_none() {
                    bail!("unknown column '{name}' in '{template}'");
                }
            }
        }
        Ok(Self {
            spec,
            method,
            columns: Arc::new(matrix.columns().to_vec()),
        })
    }

    /// Fills the request template for `row`.
    pub fn render(&self, template: RequestTemplate, row: &Row) -> Result<RenderedCase> {
        let mut request = template
            .with_method(self.method.clone())
            .with_path(self.fill(&self.spec.path, row)?);
        for (key, value) in &self.spec.query {
            request = request.with_query(key.clone(), self.fill(value, row)?);
        }
        if let Some(body) = &self.spec.body {
            request = request.with_json(self.fill_json(body, row)?);
        }

        let expected_status = match &self.spec.expect_status {
            StatusExpectation::Code(code) => *code,
            StatusExpectation::Template(raw) => {
                let filled = self.fill(raw, row)?;
                filled
                    .trim()
                    .parse()
                    .with_context(|| format!("Expected status '{filled}' is not a number"))?
            }
        };

        Ok(RenderedCase {
            request,
            expected_status,
        })
    }

    /// Checks a response against the expectations of this suite.
    pub fn verify(&self, expected_status: u16, response: &ApiResponse) -> Result<()> {
        if response.status != expected_status {
            return Err(anyhow!("response body: {}", snippet(&response.body))
                .context(format!(
                    "expected status {expected_status}, got {}",
                    response.status
                )));
        }
        if self.spec.require_fields.is_empty() {
            return Ok(());
        }
        let json = response.json()?;
        for field in &self.spec.require_fields {
            match json.get(field) {
                None | Some(Value::Null) => bail!("response is missing required field '{field}'"),
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Renders, sends and verifies one row.
    pub async fn execute(
        &self,
        client: &ApiClient,
        context: &ExecutionContext,
        row: &Row,
    ) -> Result<CaseVerdict> {
        let case = self.render(context.build_request_template(), row)?;
        let response = client.send(&case.request).await?;
        self.verify(case.expected_status, &response)?;
        Ok(CaseVerdict::Passed)
    }

    fn fill(&self, template: &str, row: &Row) -> Result<String> {
        render_placeholders(template, &self.columns, row)
    }

    fn fill_json(&self, value: &Value, row: &Row) -> Result<Value> {
        Ok(match value {
            Value::String(s) => Value::String(self.fill(s, row)?),
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.fill_json(item, row))
                    .collect::<Result<_>>()?,
            ),
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| Ok((k.clone(), self.fill_json(v, row)?)))
                    .collect::<Result<_>>()?,
            ),
            other => other.clone(),
        })
    }
}

/// Builds the `DataDrivenTest` descriptor for a configured suite.
pub fn describe_suite(suite: &SuiteConfig, default_jobs: usize) -> DataDrivenTest {
    let mode = if suite.parallel {
        ExecutionMode::Parallel {
            jobs: suite.jobs.unwrap_or(default_jobs),
        }
    } else {
        ExecutionMode::Sequential
    };
    let mut test = DataDrivenTest::new(&suite.name, suite.group_name()).with_mode(mode);
    if let Some(description) = &suite.description {
        test = test.with_description(description);
    }
    test
}

/// Every string of `spec` that may contain placeholders.
fn templates_of(spec: &RequestSpec) -> Vec<&str> {
    let mut templates = vec![spec.path.as_str()];
    templates.extend(spec.query.values().map(String::as_str));
    if let Some(body) = &spec.body {
        collect_json_strings(body, &mut templates);
    }
    if let StatusExpectation::Template(raw) = &spec.expect_status {
        templates.push(raw.as_str());
    }
    templates
}

fn collect_json_strings<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
    match value {
        Value::String(s) => out.push(s.as_str()),
        Value::Array(items) => items.iter().for_each(|item| collect_json_strings(item, out)),
        Value::Object(map) => map.values().for_each(|v| collect_json_strings(v, out)),
        _ => {}
    }
}

/// A template split into literal text and column references.
enum Piece {
    Text(String),
    Column(String),
}

fn parse_template(template: &str) -> Result<Vec<Piece>> {
    let mut pieces = Vec::new();
    let mut text = String::new();
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                text.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                text.push('}');
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(ch) => name.push(ch),
                        None => bail!("unterminated placeholder in '{template}'"),
                    }
                }
                if !text.is_empty() {
                    pieces.push(Piece::Text(std::mem::take(&mut text)));
                }
                pieces.push(Piece::Column(name.trim().to_string()));
            }
            other => text.push(other),
        }
    }
    if !text.is_empty() {
        pieces.push(Piece::Text(text));
    }
    Ok(pieces)
}

/// Column names referenced by `template`, in order of appearance.
pub fn placeholder_names(template: &str) -> Result<Vec<String>> {
    Ok(parse_template(template)?
        .into_iter()
        .filter_map(|piece| match piece {
            Piece::Column(name) => Some(name),
            Piece::Text(_) => None,
        })
        .collect())
}

/// Replaces every `{column}` in `template` with the row's cell text.
/// `{{` and `}}` produce literal braces.
///
/// 将 `template` 中的每个 `{column}` 替换为该行对应单元格的文本。
pub fn render_placeholders(template: &str, columns: &[String], row: &Row) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    for piece in parse_template(template)? {
        match piece {
            Piece::Text(text) => out.push_str(&text),
            Piece::Column(name) => {
                let index = columns
                    .iter()
                    .position(|col| *col == name)
                    .ok_or_else(|| anyhow!("unknown column '{name}' in '{template}'"))?;
                out.push_str(&row.text(index));
            }
        }
    }
    Ok(out)
}

fn snippet(body: &str) -> String {
    const LIMIT: usize = 500;
    if body.chars().count() <= LIMIT {
        body.to_string()
    } else {
        let cut: String = body.chars().take(LIMIT).collect();
        format!("{cut}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cell::CellValue;

    fn columns() -> Vec<String> {
        vec!["id".to_string(), "summary".to_string()]
    }

    #[test]
    fn test_placeholders_are_filled_from_row() {
        let row = Row::new(1, vec![CellValue::from("0-1"), CellValue::from("Crash")]);
        let rendered = render_placeholders("/issues/{id}?q={summary}", &columns(), &row).unwrap();
        assert_eq!(rendered, "/issues/0-1?q=Crash");
    }

    #[test]
    fn test_escaped_braces_are_literal() {
        let row = Row::new(1, vec![CellValue::from("7"), CellValue::Empty]);
        let rendered = render_placeholders("{{\"id\": {id}}}", &columns(), &row).unwrap();
        assert_eq!(rendered, "{\"id\": 7}");
    }

    #[test]
    fn test_unknown_column_is_an_error() {
        let row = Row::new(1, vec![CellValue::Empty, CellValue::Empty]);
        let err = render_placeholders("/{missing}", &columns(), &row).unwrap_err();
        assert!(err.to_string().contains("unknown column 'missing'"));
    }

    #[test]
    fn test_placeholder_names_skip_escapes() {
        let names = placeholder_names("{{literal}} /issues/{id}/{ summary }").unwrap();
        assert_eq!(names, vec!["id".to_string(), "summary".to_string()]);
        assert!(placeholder_names("/issues/{id").is_err());
    }

    #[test]
    fn test_unknown_column_is_rejected_when_binding() {
        let spec = RequestSpec {
            method: "GET".to_string(),
            path: "/issues/{idReadable}".to_string(),
            query: Default::default(),
            body: None,
            expect_status: StatusExpectation::Code(200),
            require_fields: Vec::new(),
        };
        let matrix =
            TestCaseMatrix::from_literals(["id"], vec![vec![CellValue::from("0-1")]]).unwrap();
        let err = ApiCheck::new(spec, &matrix).unwrap_err();
        assert!(err.to_string().contains("unknown column 'idReadable'"));
    }
}
