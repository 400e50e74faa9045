use super::*;

use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL: &str = "gemini-3-flash-preview";

fn config_for(server: &MockServer, api_key: &str) -> GeminiConfig {
    GeminiConfig {
        api_key: api_key.to_string(),
        model: MODEL.to_string(),
        base_url: server.uri(),
    }
}

async fn enhance_against(
    server: &MockServer,
    api_key: &str,
    raw: &str,
) -> Result<TaskEnhancement, EnhanceError> {
    let config = config_for(server, api_key);
    let raw = raw.to_string();
    tokio::task::spawn_blocking(move || {
        let enhancer =
            GeminiEnhancer::new(&config, Duration::from_secs(5)).expect("enhancer should build");
        enhancer.enhance(&raw)
    })
    .await
    .expect("blocking task should join")
}

fn candidate_body(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}

struct FailingEnhancer;

impl TaskEnhancer for FailingEnhancer {
    fn enhance(&self, _raw: &str) -> Result<TaskEnhancement, EnhanceError> {
        Err(EnhanceError::EmptyResponse)
    }
}

struct FixedEnhancer(TaskEnhancement);

impl TaskEnhancer for FixedEnhancer {
    fn enhance(&self, _raw: &str) -> Result<TaskEnhancement, EnhanceError> {
        Ok(self.0.clone())
    }
}

#[test]
fn prompt_quotes_the_raw_task() {
    assert_eq!(
        enhancement_prompt("buy milk"),
        "Improve this task title and categorize it. Task: \"buy milk\""
    );
}

#[test]
fn request_body_asks_for_structured_json() {
    let body = enhancement_request_body("gym");
    assert_eq!(
        body["generationConfig"]["responseMimeType"],
        "application/json"
    );
    assert_eq!(
        body["generationConfig"]["responseSchema"]["required"],
        json!(["enhancedTitle", "priority", "category"])
    );
    assert_eq!(
        body["generationConfig"]["responseSchema"]["properties"]["priority"]["enum"],
        json!(["low", "medium", "high"])
    );
}

#[test]
fn endpoint_combines_base_url_and_model() {
    assert_eq!(
        generate_content_url("https://generativelanguage.googleapis.com/", MODEL),
        "https://generativelanguage.googleapis.com/v1beta/models/gemini-3-flash-preview:generateContent"
    );
}

#[test]
fn parses_enhancement_and_trims_fields() {
    let parsed = parse_enhancement(
        "  {\"enhancedTitle\":\" Renew passport \",\"priority\":\"high\",\"category\":\" Admin \"}\n",
    )
    .expect("should parse");
    assert_eq!(parsed.enhanced_title, "Renew passport");
    assert_eq!(parsed.priority, Priority::High);
    assert_eq!(parsed.category, "Admin");
}

#[test]
fn out_of_range_priority_reads_as_medium() {
    let parsed =
        parse_enhancement(r#"{"enhancedTitle":"Nap","priority":"critical","category":"Health"}"#)
            .expect("should parse");
    assert_eq!(parsed.priority, Priority::Medium);
}

#[test]
fn blank_title_or_missing_field_is_rejected() {
    assert!(matches!(
        parse_enhancement(r#"{"enhancedTitle":"  ","priority":"low","category":"Home"}"#),
        Err(EnhanceError::Parse(_))
    ));
    assert!(matches!(
        parse_enhancement(r#"{"enhancedTitle":"Nap","priority":"low"}"#),
        Err(EnhanceError::Parse(_))
    ));
    assert!(matches!(
        parse_enhancement("Sure! Here is your task."),
        Err(EnhanceError::Parse(_))
    ));
}

#[test]
fn response_text_joins_first_candidate_parts() {
    let body = json!({
        "candidates": [
            { "content": { "parts": [{ "text": "{\"a\":" }, { "text": "1}" }] } },
            { "content": { "parts": [{ "text": "ignored" }] } }
        ]
    })
    .to_string();
    assert_eq!(
        response_text(&body).expect("parse"),
        Some("{\"a\":1}".to_string())
    );
    assert_eq!(response_text(r#"{"candidates":[]}"#).expect("parse"), None);
    assert_eq!(response_text("{}").expect("parse"), None);
}

#[test]
fn fallback_draft_uses_raw_input_and_defaults() {
    let (draft, used_ai) = enhance_or_fallback(&FailingEnhancer, "fix bike");
    assert!(!used_ai);
    assert_eq!(draft, TaskDraft::fallback("fix bike"));
    assert_eq!(draft.category, "General");
    assert_eq!(draft.priority, Priority::Medium);
}

#[test]
fn successful_enhancement_becomes_draft() {
    let enhancer = FixedEnhancer(TaskEnhancement {
        enhanced_title: "Repair bicycle brakes".to_string(),
        priority: Priority::Low,
        category: "Home".to_string(),
    });
    let (draft, used_ai) = enhance_or_fallback(&enhancer, "fix bike");
    assert!(used_ai);
    assert_eq!(draft.title, "Repair bicycle brakes");
    assert_eq!(draft.priority, Priority::Low);
    assert_eq!(draft.category, "Home");
}

#[tokio::test(flavor = "multi_thread")]
async fn enhance_posts_prompt_with_api_key_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/v1beta/models/{MODEL}:generateContent")))
        .and(header("x-goog-api-key", "secret"))
        .and(body_partial_json(json!({
            "contents": [{ "parts": [{
                "text": "Improve this task title and categorize it. Task: \"dentist\""
            }] }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate_body(
            r#"{"enhancedTitle":"Book dentist appointment","priority":"medium","category":"Health"}"#,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let enhancement = enhance_against(&server, "secret", "dentist")
        .await
        .expect("enhancement should succeed");
    assert_eq!(enhancement.enhanced_title, "Book dentist appointment");
    assert_eq!(enhancement.category, "Health");
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_api_key_skips_the_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = enhance_against(&server, "  ", "anything")
        .await
        .expect_err("should fail without key");
    assert!(matches!(err, EnhanceError::MissingApiKey));
}

#[tokio::test(flavor = "multi_thread")]
async fn api_error_carries_google_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT" }
        })))
        .mount(&server)
        .await;

    let err = enhance_against(&server, "bad", "anything")
        .await
        .expect_err("should fail");
    match err {
        EnhanceError::Api { status, message } => {
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(message, "API key not valid.");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn candidate_without_text_is_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "finishReason": "SAFETY" }]
        })))
        .mount(&server)
        .await;

    let err = enhance_against(&server, "key", "anything")
        .await
        .expect_err("should fail");
    assert!(matches!(err, EnhanceError::EmptyResponse));
}

#[test]
fn unreachable_gemini_falls_back_to_raw_input() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    let config = GeminiConfig {
        api_key: "key".to_string(),
        model: MODEL.to_string(),
        base_url: format!("http://{addr}"),
    };
    let enhancer =
        GeminiEnhancer::new(&config, Duration::from_secs(2)).expect("enhancer should build");

    let err = enhancer.enhance("call mom").expect_err("nothing is listening");
    assert!(matches!(err, EnhanceError::Http(_)));

    let (draft, used_ai) = enhance_or_fallback(&enhancer, "call mom");
    assert!(!used_ai);
    assert_eq!(draft, TaskDraft::fallback("call mom"));
}
