mod common;

use api_harness::core::cell::CellValue;
use api_harness::core::config::{HarnessConfig, StatusExpectation};
use api_harness::core::context::{ContextConfig, ExecutionContext, DEFAULT_TIMEOUT_SECS};
use api_harness::core::execution::ExecutionMode;
use api_harness::core::matrix::TestCaseMatrix;
use api_harness::core::suite::{describe_suite, ApiCheck};
use api_harness::infra::http::ApiResponse;
use api_harness::sources::{DataSource, LiteralCell};
use common::write_file;
use reqwest::Method;
use serde_json::json;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::tempdir;

const FULL_CONFIG: &str = r#"
language = "zh-CN"
name = "YouTrack REST API"
report_dir = "reports"
jobs = 4

[context]
base_url = "https://example.youtrack.cloud/"
base_path = "api/"
auth_token = "perm:abc"

[[suites]]
name = "create_issue"
group = "DataDrivenTests"
description = "Create issues from CSV data"
parallel = true
source = { kind = "delimited", path = "data/issues.csv" }

[suites.request]
method = "POST"
path = "/issues"
query = { fields = "id,summary" }
body = { summary = "{summary}", project = { id = "{projectId}" } }
expect_status = "{expectedStatus}"
require_fields = ["id"]

[[suites]]
name = "priorities"
source = { kind = "inline", columns = ["priority", "weight", "active"], rows = [["Critical", 1, true], ["Major", 2, false]] }

[suites.request]
path = "/admin/customFieldSettings/bundles/enum"
"#;

#[test]
fn test_full_config_parses() {
    let config = HarnessConfig::from_toml(FULL_CONFIG).unwrap();

    assert_eq!(config.language, "zh-CN");
    assert_eq!(config.name, "YouTrack REST API");
    assert_eq!(config.report_dir, Some(PathBuf::from("reports")));
    assert_eq!(config.jobs, Some(4));
    assert_eq!(config.context.timeout_secs, DEFAULT_TIMEOUT_SECS);
    assert_eq!(config.suites.len(), 2);

    let create = &config.suites[0];
    assert_eq!(create.group_name(), "DataDrivenTests");
    assert!(create.parallel);
    assert_eq!(
        create.source,
        DataSource::Delimited {
            path: PathBuf::from("data/issues.csv"),
            delimiter: None
        }
    );
    assert_eq!(create.request.method, "POST");
    assert_eq!(
        create.request.expect_status,
        StatusExpectation::Template("{expectedStatus}".to_string())
    );

    let priorities = &config.suites[1];
    assert_eq!(priorities.group_name(), "priorities");
    assert_eq!(priorities.request.method, "GET");
    assert_eq!(priorities.request.expect_status, StatusExpectation::Code(200));
    match &priorities.source {
        DataSource::Inline { rows, .. } => {
            assert_eq!(
                rows[0],
                vec![
                    LiteralCell::Text("Critical".to_string()),
                    LiteralCell::Integer(1),
                    LiteralCell::Bool(true)
                ]
            );
        }
        other => panic!("expected an inline source, got {other:?}"),
    }
}

#[test]
fn test_minimal_config_uses_defaults() {
    let config = HarnessConfig::from_toml(
        r#"
[context]
base_url = "http://localhost:8080"
"#,
    )
    .unwrap();

    assert_eq!(config.language, "en");
    assert_eq!(config.name, "REST API Test Suite");
    assert!(config.report_dir.is_none());
    assert!(config.suites.is_empty());
}

#[test]
fn test_duplicate_suite_names_are_rejected() {
    let content = r#"
[context]
base_url = "http://localhost"

[[suites]]
name = "dup"
source = { kind = "inline", columns = ["a"], rows = [["1"]] }
request = { path = "/a" }

[[suites]]
name = "dup"
source = { kind = "inline", columns = ["a"], rows = [["1"]] }
request = { path = "/b" }
"#;
    let err = HarnessConfig::from_toml(content).unwrap_err();
    assert!(err.to_string().contains("duplicate suite name 'dup'"));
}

#[test]
fn test_zero_jobs_is_rejected() {
    let content = r#"
jobs = 0
[context]
base_url = "http://localhost"
"#;
    assert!(HarnessConfig::from_toml(content).is_err());
}

#[test]
fn test_load_reports_missing_file() {
    let dir = tempdir().unwrap();
    let err = HarnessConfig::load(&dir.path().join("Harness.toml")).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to locate config file"));
}

#[test]
fn test_load_returns_canonical_path() {
    let dir = tempdir().unwrap();
    let path = write_file(dir.path(), "Harness.toml", FULL_CONFIG);

    let (config, config_path) = HarnessConfig::load(&path).unwrap();

    assert_eq!(config.suites.len(), 2);
    assert!(config_path.is_absolute());
    assert!(config_path.ends_with("Harness.toml"));
}

#[test]
fn test_context_normalizes_url_and_path() {
    let config = HarnessConfig::from_toml(FULL_CONFIG).unwrap();
    let context = ExecutionContext::from_config(&config.context).unwrap();

    assert_eq!(context.base_uri(), "https://example.youtrack.cloud/api");
    assert_eq!(context.timeout(), Duration::from_secs(30));
}

#[test]
fn test_context_rejects_blank_url_and_zero_timeout() {
    assert!(ExecutionContext::new("  ", "", "", 30).is_err());
    assert!(ExecutionContext::new("http://localhost", "", "", 0).is_err());
}

#[test]
fn test_context_expands_environment_token() {
    // SAFETY: the variable name is unique to this test.
    unsafe { std::env::set_var("API_HARNESS_TEST_TOKEN", "perm:from-env") };
    let context = ExecutionContext::from_config(&ContextConfig {
        base_url: "http://localhost".to_string(),
        base_path: String::new(),
        auth_token: "${API_HARNESS_TEST_TOKEN}".to_string(),
        timeout_secs: 5,
    })
    .unwrap();

    assert_eq!(context.auth_token(), "perm:from-env");
    let template = context.build_request_template();
    assert_eq!(template.header("Authorization"), Some("Bearer perm:from-env"));
}

#[test]
fn test_request_template_headers_and_url() {
    let context = ExecutionContext::new("http://localhost:8080/", "/api", "", 10).unwrap();
    let template = context.build_request_template().with_path("/issues/0-1");

    assert_eq!(template.header("Accept"), Some("application/json"));
    assert_eq!(template.header("Content-Type"), Some("application/json"));
    assert_eq!(template.header("Authorization"), None);
    assert_eq!(template.method(), &Method::GET);
    assert_eq!(template.timeout(), Duration::from_secs(10));
    assert_eq!(template.url(), "http://localhost:8080/api/issues/0-1");
}

#[test]
fn test_api_check_renders_row_into_request() {
    let config = HarnessConfig::from_toml(FULL_CONFIG).unwrap();
    let context = ExecutionContext::from_config(&config.context).unwrap();
    let matrix = TestCaseMatrix::from_literals(
        ["summary", "projectId", "expectedStatus"],
        vec![vec![
            CellValue::from("Login crash"),
            CellValue::from("0-0"),
            CellValue::from("201"),
        ]],
    )
    .unwrap();

    let check = ApiCheck::new(config.suites[0].request.clone(), &matrix).unwrap();
    let case = check
        .render(context.build_request_template(), &matrix.rows()[0])
        .unwrap();

    assert_eq!(case.expected_status, 201);
    assert_eq!(case.request.method(), &Method::POST);
    assert_eq!(case.request.url(), "https://example.youtrack.cloud/api/issues");
    assert_eq!(
        case.request.query(),
        [("fields".to_string(), "id,summary".to_string())]
    );
    assert_eq!(
        case.request.body(),
        Some(&json!({ "summary": "Login crash", "project": { "id": "0-0" } }))
    );
}

#[test]
fn test_api_check_verifies_status_and_fields() {
    let config = HarnessConfig::from_toml(FULL_CONFIG).unwrap();
    let matrix = TestCaseMatrix::from_literals(
        ["summary", "projectId", "expectedStatus"],
        Vec::<Vec<CellValue>>::new(),
    )
    .unwrap();
    let check = ApiCheck::new(config.suites[0].request.clone(), &matrix).unwrap();

    let ok = ApiResponse {
        status: 201,
        body: r#"{"id":"2-15","summary":"Login crash"}"#.to_string(),
    };
    assert!(check.verify(201, &ok).is_ok());

    let wrong_status = ApiResponse {
        status: 400,
        body: r#"{"error":"bad request"}"#.to_string(),
    };
    let err = check.verify(201, &wrong_status).unwrap_err();
    assert_eq!(err.to_string(), "expected status 201, got 400");

    let missing_id = ApiResponse {
        status: 201,
        body: r#"{"summary":"Login crash"}"#.to_string(),
    };
    let err = check.verify(201, &missing_id).unwrap_err();
    assert!(err.to_string().contains("missing required field 'id'"));
}

#[test]
fn test_suite_descriptor_uses_parallel_jobs() {
    let config = HarnessConfig::from_toml(FULL_CONFIG).unwrap();

    let create = describe_suite(&config.suites[0], 3);
    assert_eq!(create.mode, ExecutionMode::Parallel { jobs: 3 });
    assert_eq!(create.group, "DataDrivenTests");
    assert_eq!(create.description.as_deref(), Some("Create issues from CSV data"));

    let priorities = describe_suite(&config.suites[1], 3);
    assert_eq!(priorities.mode, ExecutionMode::Sequential);
}
