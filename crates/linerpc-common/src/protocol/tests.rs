use super::*;
use serde_json::{json, Value};

// Classifier totality: every UnionRequest lands in exactly one bucket.
#[test]
fn test_classifier_is_total_over_field_combinations() {
    let ids = [None, Some(RequestId::Number(1))];
    let methods = [None, Some("add".to_string())];
    let payloads = [None, Some(json!(1))];
    let errors = [None, Some(ErrorObject::new(1, "x"))];

    for id in &ids {
        for method in &methods {
            for result in &payloads {
                for error in &errors {
                    let msg = UnionRequest {
                        jsonrpc: JSONRPC_VERSION.to_string(),
                        id: id.clone(),
                        method: method.clone(),
                        params: None,
                        result: result.clone(),
                        error: error.clone(),
                    };
                    // classify must not panic and must pick exactly one arm
                    let _ = msg.classify();
                }
            }
        }
    }
}

#[test]
fn test_wire_request_shape_is_bit_exact() {
    let request = Request::new(1, "add", Some(json!({"a": 2, "b": 3})));
    let encoded = serde_json::to_string(&request).unwrap();
    assert_eq!(
        encoded,
        r#"{"jsonrpc":"2.0","id":1,"method":"add","params":{"a":2,"b":3}}"#
    );
}

#[test]
fn test_wire_response_shapes() {
    let ok: Response<Value> = Response::success(RequestId::Number(1), json!({"sum": 5}));
    let encoded = serde_json::to_value(&ok).unwrap();
    assert_eq!(encoded["result"], json!({"sum": 5}));
    assert_eq!(encoded["id"], json!(1));
    assert!(encoded.get("error").is_none());

    let err: Response<Value> = Response::error(
        Some(RequestId::Number(2)),
        ErrorObject::method_not_found("subtract"),
    );
    let encoded = serde_json::to_value(&err).unwrap();
    assert_eq!(encoded["error"]["code"], json!(-32601));
    assert!(encoded.get("result").is_none());
}

#[test]
fn test_union_request_survives_batch_round_trip() {
    let wire = br#"[{"jsonrpc":"2.0","method":"add","params":{"a":1},"id":1},{"jsonrpc":"2.0","method":"notify","params":{"message":"hi"}},{"jsonrpc":"2.0","result":{"sum":2},"id":1}]"#;
    let batch = Batch::<UnionRequest>::from_slice(wire).unwrap();
    assert!(batch.is_batch);
    assert_eq!(batch.len(), 3);
    assert_eq!(batch.items[0].classify().unwrap(), MessageKind::Method);
    assert_eq!(batch.items[1].classify().unwrap(), MessageKind::Notification);
    assert_eq!(batch.items[2].classify().unwrap(), MessageKind::Response);

    let encoded = batch.to_vec().unwrap();
    let original: Value = serde_json::from_slice(wire).unwrap();
    let round_tripped: Value = serde_json::from_slice(&encoded).unwrap();
    assert_eq!(original, round_tripped);
}

#[test]
fn test_default_error_messages_match_reserved_codes() {
    assert_eq!(
        default_error_message(PARSE_ERROR),
        "An error occurred on the server while parsing JSON object"
    );
    assert_eq!(
        default_error_message(INVALID_REQUEST),
        "The JSON sent is not a valid Request object"
    );
    assert_eq!(
        default_error_message(METHOD_NOT_FOUND),
        "The method does not exist / is not available"
    );
    assert_eq!(default_error_message(INVALID_PARAMS), "Invalid method parameter(s)");
    assert_eq!(default_error_message(INTERNAL_ERROR), "Internal JSON-RPC error");
    assert_eq!(default_error_message(0), "");
}
