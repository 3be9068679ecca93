use std::time::Duration;

use quasm::config::ExecutionConfig;
use quasm::service::{execute_request, ErrorCode, ExecuteRequest, ExecuteResponse, ProgramSource, Service};

#[test]
fn test_request_accepts_text_or_lines() {
    let text: ExecuteRequest =
        serde_json::from_str(r#"{"instructions": "alloc 1\nmov 2, 0b", "shots": 3}"#).unwrap();
    assert_eq!(text.shots, Some(3));
    assert!(matches!(text.instructions, ProgramSource::Text(_)));

    let lines: ExecuteRequest =
        serde_json::from_str(r#"{"instructions": ["alloc 1", "mov 2, 0b"]}"#).unwrap();
    assert_eq!(lines.shots, None);
    assert!(matches!(lines.instructions, ProgramSource::Lines(ref l) if l.len() == 2));

    assert_eq!(execute_request(&text), execute_request(&lines));
}

#[test]
fn test_response_json_shape() {
    let response = execute_request(&ExecuteRequest::new("alloc 3\nalloc 1Q(0)\nmov 4, 2b").with_shots(2));
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json, serde_json::json!({"error": null, "content": [4.0]}));

    let response = execute_request(&ExecuteRequest::new("NOPE"));
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "error": {"code": "ERR_CANNOT_COMPILE", "message": "Invalid qasm instruction 'NOPE'"},
            "content": null
        })
    );
}

#[test]
fn test_averages_over_shots() {
    let source = "
alloc 4
alloc 3Q(0)
alloc 1b(3)
H 0Q
H 1Q
CCNOT 0Q, 1Q, 2Q
M 2Q, 3b
";
    let service = Service::new(ExecutionConfig::default().with_seed(99).with_parallel(true));
    let response = service.handle(&ExecuteRequest::new(source).with_shots(800));
    let content = response.content.unwrap();
    assert_eq!(content.len(), 1);
    assert!((content[0] - 0.25).abs() < 0.06, "average = {}", content[0]);
}

#[test]
fn test_execution_error_is_reported() {
    let response = execute_request(&ExecuteRequest::new("alloc 1\nalloc 1b(0)\ndiv 0, 0b"));
    let error = response.error.unwrap();
    assert_eq!(error.code, ErrorCode::CannotExecute);
    assert_eq!(error.message, "Division by zero writing cell 0");
}

#[test]
fn test_infinite_loop_times_out() {
    let service = Service::new(ExecutionConfig::default().with_timeout(Duration::from_millis(100)));
    let response = service.handle(&ExecuteRequest::new(".l:\njmp .l"));
    assert_eq!(
        response,
        ExecuteResponse::failure(ErrorCode::CannotExecute, "Execution took more than 100ms")
    );
}
