/// End-to-end tests for the load generator against a mock HTTP backend.
use std::sync::Arc;
use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;

use llmload::config::{Provider, TestConfig};
use llmload::http::client::ChatClientEnum;
use llmload::loadgen::generator::LoadGenerator;
use llmload::loadgen::prompts::variable_length_prompts;
use llmload::loadgen::report::AggregateReport;

fn generic_config(endpoint: String) -> TestConfig {
    TestConfig::new(Provider::Generic, "mock-model", "test-key")
        .with_endpoint(endpoint)
        .with_request_timeout(Duration::from_secs(5))
}

fn generator_for(config: TestConfig) -> LoadGenerator<ChatClientEnum> {
    let client = Arc::new(ChatClientEnum::from_config(&config).expect("client construction"));
    LoadGenerator::new(config, client)
}

#[tokio::test]
async fn batched_run_against_mock_endpoint() {
    let server = MockServer::start_async().await;
    let path = "/v1/chat/completions";

    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path(path);
            then.status(200).json_body(json!({
                "choices": [
                    { "message": { "content": "a completion that is long enough to count" } }
                ]
            }));
        })
        .await;

    let generator = generator_for(generic_config(format!("{}{}", server.base_url(), path)));
    let prompts: Vec<String> = (0..7).map(|i| format!("prompt {}", i)).collect();

    let report = generator.run_batched(&prompts, 3).await.unwrap();

    assert_eq!(report.total_requests, 7);
    assert_eq!(report.successful_requests, 7);
    assert_eq!(report.failed_requests, 0);
    assert!(report.error.is_none());

    let latency = report.latency_secs.expect("latency stats present");
    assert!(latency.min > 0.0);
    assert!(latency.min <= latency.p50 && latency.p50 <= latency.max);

    let tokens = report.output_tokens.expect("token stats present");
    // "a completion that is long enough to count" is 41 chars -> 10 tokens.
    assert_eq!(tokens.min, 10.0);
    assert_eq!(tokens.max, 10.0);

    mock.assert_hits_async(7).await;
}

#[tokio::test]
async fn failing_endpoint_yields_all_failed_report() {
    let server = MockServer::start_async().await;
    let path = "/v1/chat/completions";

    server
        .mock_async(|when, then| {
            when.method(POST).path(path);
            then.status(503).body("overloaded");
        })
        .await;

    let generator = generator_for(generic_config(format!("{}{}", server.base_url(), path)));
    let prompts = vec!["ping".to_string(); 3];

    let report = generator.run_batched(&prompts, 2).await.unwrap();

    assert_eq!(report.total_requests, 3);
    assert_eq!(report.successful_requests, 0);
    assert_eq!(report.failed_requests, 3);
    assert!(report.all_failed());
    assert!(report.latency_secs.is_none());
}

#[tokio::test]
async fn sustained_run_against_mock_endpoint() {
    let server = MockServer::start_async().await;
    let path = "/v1/chat/completions";

    server
        .mock_async(|when, then| {
            when.method(POST).path(path);
            then.status(200).json_body(json!({ "response": "ok" }));
        })
        .await;

    let generator = generator_for(generic_config(format!("{}{}", server.base_url(), path)));

    let report = generator
        .run_sustained("steady", 10.0, Duration::from_millis(400))
        .await
        .unwrap();

    assert!(report.total_requests >= 2);
    assert_eq!(report.failed_requests, 0);
    assert_eq!(
        report.successful_requests + report.failed_requests,
        report.total_requests
    );
}

#[tokio::test]
async fn variable_length_sweep_end_to_end() {
    let server = MockServer::start_async().await;
    let path = "/v1/chat/completions";

    server
        .mock_async(|when, then| {
            when.method(POST).path(path);
            then.status(200).json_body(json!({ "content": "reply" }));
        })
        .await;

    let prompts = variable_length_prompts("Explain quantum computing", 5, 100, 500).unwrap();
    let lengths: Vec<usize> = prompts.iter().map(|p| p.chars().count()).collect();
    assert_eq!(lengths, vec![100, 200, 300, 400, 500]);

    let generator = generator_for(generic_config(format!("{}{}", server.base_url(), path)));
    let outcomes = generator.batched_outcomes(&prompts, 2, None).await.unwrap();

    assert_eq!(outcomes.len(), 5);
    for (outcome, expected_len) in outcomes.iter().zip(lengths) {
        assert!(outcome.success);
        assert_eq!(outcome.prompt_chars, expected_len);
    }
}

#[tokio::test]
async fn persisted_report_round_trips() {
    let server = MockServer::start_async().await;
    let path = "/v1/chat/completions";

    server
        .mock_async(|when, then| {
            when.method(POST).path(path);
            then.status(200).json_body(json!({ "content": "reply" }));
        })
        .await;

    let dir = tempfile::TempDir::new().unwrap();
    let config = generic_config(format!("{}{}", server.base_url(), path))
        .with_output_dir(dir.path());
    let generator = generator_for(config);

    let prompts = vec!["one".to_string(), "two".to_string()];
    let report = generator.run_batched(&prompts, 2).await.unwrap();
    let saved = generator.persist(&report, "batch").unwrap().unwrap();

    let contents = std::fs::read_to_string(&saved).unwrap();
    let parsed: AggregateReport = serde_json::from_str(&contents).unwrap();
    assert_eq!(parsed.total_requests, report.total_requests);
    assert_eq!(parsed.successful_requests, report.successful_requests);
}
