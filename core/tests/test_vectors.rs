//! Verify parsing, payload mapping and build/parse methods against JSON test
//! vectors stored in `test-vectors/`.
//!
//! Comparing parsed JSON (not raw strings) avoids false negatives from
//! field-ordering differences.

use quiz_core::{
    parse, ApiError, CanvasClient, HttpMethod, HttpResponse, ItemPayload, QuizPayload, QuizSettings,
};

const BASE_URL: &str = "http://localhost:3000";

fn client() -> CanvasClient {
    CanvasClient::new(BASE_URL, 12345, "secret")
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        other => panic!("unknown method: {other}"),
    }
}

fn expected_headers(value: &serde_json::Value) -> Vec<(String, String)> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|h| {
            let arr = h.as_array().unwrap();
            (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
        })
        .collect()
}

fn simulated(case: &serde_json::Value) -> HttpResponse {
    let sim = &case["simulated_response"];
    HttpResponse {
        status: sim["status"].as_u64().unwrap() as u16,
        headers: Vec::new(),
        body: sim["body"].as_str().unwrap().to_string(),
    }
}

/// Generates `id-1`, `id-2`, ... so item payloads are reproducible.
fn sequential() -> impl FnMut() -> String {
    let mut n = 0;
    move || {
        n += 1;
        format!("id-{n}")
    }
}

// ---------------------------------------------------------------------------
// Parse
// ---------------------------------------------------------------------------

#[test]
fn parse_test_vectors() {
    let raw = include_str!("../../test-vectors/parse.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let result = parse(case["input"].as_str().unwrap());

        if let Some(expected) = case.get("expected_error") {
            let err = result.unwrap_err();
            assert_eq!(err.line as u64, expected["line"].as_u64().unwrap(), "{name}: error line");
            assert_eq!(err.reason, expected["reason"].as_str().unwrap(), "{name}: error reason");
            continue;
        }

        let parsed = result.unwrap_or_else(|e| panic!("{name}: {e}"));
        assert_eq!(parsed.quiz.title(), case["expected_title"].as_str().unwrap(), "{name}: title");

        let expected_questions = case["expected_questions"].as_array().unwrap();
        assert_eq!(parsed.quiz.questions().len(), expected_questions.len(), "{name}: question count");
        for (question, expected) in parsed.quiz.questions().iter().zip(expected_questions) {
            assert_eq!(question.ordinal as u64, expected["ordinal"].as_u64().unwrap(), "{name}: ordinal");
            assert_eq!(question.kind.as_str(), expected["kind"].as_str().unwrap(), "{name}: kind");
            assert_eq!(question.points, expected["points"].as_f64().unwrap(), "{name}: points");
        }

        let warnings: Vec<serde_json::Value> = parsed
            .warnings
            .iter()
            .map(|w| serde_json::json!({ "line": w.line, "kind": w.kind }))
            .collect();
        assert_eq!(
            serde_json::Value::Array(warnings),
            case["expected_warnings"],
            "{name}: warnings"
        );
    }
}

// ---------------------------------------------------------------------------
// Create quiz
// ---------------------------------------------------------------------------

#[test]
fn create_quiz_test_vectors() {
    let raw = include_str!("../../test-vectors/quiz.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let quiz = parse(case["input"].as_str().unwrap()).unwrap().quiz;
        let expected_req = &case["expected_request"];

        // Verify build
        let req = c
            .build_create_quiz(&QuizPayload::new(&quiz, &QuizSettings::default()))
            .unwrap();
        assert_eq!(req.method, parse_method(expected_req["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(req.path, format!("{BASE_URL}{}", expected_req["path"].as_str().unwrap()), "{name}: path");
        assert_eq!(req.headers, expected_headers(&expected_req["headers"]), "{name}: headers");

        let req_body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(req_body, expected_req["body"], "{name}: body");

        // Verify parse
        let created = c.parse_create_quiz(simulated(case)).unwrap();
        assert_eq!(created.id, case["expected_result"]["id"].as_str().unwrap(), "{name}: id");
        assert_eq!(created.title, case["expected_result"]["title"].as_str().unwrap(), "{name}: title");
    }
}

// ---------------------------------------------------------------------------
// List items
// ---------------------------------------------------------------------------

#[test]
fn list_items_test_vectors() {
    let raw = include_str!("../../test-vectors/quiz.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["list_cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let expected_req = &case["expected_request"];

        // Verify build
        let req = c.build_list_items(case["quiz_id"].as_str().unwrap());
        assert_eq!(req.method, parse_method(expected_req["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(req.path, format!("{BASE_URL}{}", expected_req["path"].as_str().unwrap()), "{name}: path");
        assert_eq!(req.headers, expected_headers(&expected_req["headers"]), "{name}: headers");
        assert!(req.body.is_none(), "{name}: body should be None");

        // Verify parse
        let result = c.parse_list_items(simulated(case));
        if let Some(expected_error) = case.get("expected_error") {
            let err = result.unwrap_err();
            match expected_error.as_str().unwrap() {
                "NotFound" => assert!(matches!(err, ApiError::NotFound), "{name}: expected NotFound"),
                other => panic!("{name}: unknown expected_error: {other}"),
            }
        } else {
            let items: Vec<serde_json::Value> = result
                .unwrap()
                .into_iter()
                .map(|item| {
                    serde_json::json!({
                        "id": item.id,
                        "position": item.position,
                        "slug": item.entry.map(|e| e.interaction_type_slug),
                    })
                })
                .collect();
            assert_eq!(serde_json::Value::Array(items), case["expected_result"], "{name}: parsed result");
        }
    }
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

#[test]
fn item_payload_test_vectors() {
    let raw = include_str!("../../test-vectors/items.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let quiz = parse(case["input"].as_str().unwrap()).unwrap_or_else(|e| panic!("{name}: {e}")).quiz;
        let payload = ItemPayload::with_ids(&quiz.questions()[0], false, sequential());

        let req = c.build_create_item("77", &payload).unwrap();
        assert_eq!(req.method, HttpMethod::Post, "{name}: method");
        assert_eq!(req.path, format!("{BASE_URL}{}", case["expected_path"].as_str().unwrap()), "{name}: path");

        let req_body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(req_body, case["expected_body"], "{name}: body");
    }
}
