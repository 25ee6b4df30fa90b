use super::*;

fn request_with_size(size: serde_json::Value) -> AiRequest {
    AiRequest { messages: Vec::new(), grid: Vec::new(), size }
}

#[test]
fn effective_size_accepts_ai_sizes() {
    assert_eq!(request_with_size(serde_json::json!(8)).effective_size(), GridSize::S8);
    assert_eq!(request_with_size(serde_json::json!(32.0)).effective_size(), GridSize::S32);
    assert_eq!(request_with_size(serde_json::json!(" 16 ")).effective_size(), GridSize::S16);
}

#[test]
fn effective_size_falls_back_to_sixteen() {
    for size in [serde_json::json!(64), serde_json::json!(12), serde_json::json!("big"), serde_json::Value::Null] {
        assert_eq!(request_with_size(size).effective_size(), GridSize::S16);
    }
}

#[test]
fn request_from_grid_carries_rows_and_side() {
    let grid = Grid::empty(GridSize::S8);
    let req = AiRequest::new(vec![ChatMessage::user("hi")], &grid);
    assert_eq!(req.grid.len(), 8);
    assert_eq!(req.size, serde_json::json!(8));
    let json = serde_json::to_value(&req).unwrap();
    assert_eq!(json["messages"][0], serde_json::json!({"role": "user", "content": "hi"}));
}

#[test]
fn request_tolerates_missing_fields() {
    let req: AiRequest = serde_json::from_str("{}").unwrap();
    assert!(req.messages.is_empty());
    assert_eq!(req.effective_size(), GridSize::S16);
}

#[test]
fn none_response_omits_grid_and_size() {
    let resp = AiResponse { action: ResponseAction::None, reply: "ok".into(), size: None, grid: None };
    assert_eq!(serde_json::to_value(&resp).unwrap(), serde_json::json!({"action": "none", "reply": "ok"}));
}

#[test]
fn role_labels_are_upper_case() {
    assert_eq!(Role::User.label(), "USER");
    assert_eq!(Role::Assistant.label(), "ASSISTANT");
}

#[test]
fn artwork_id_from_links() {
    assert_eq!(artwork_id("abc_DEF-123"), Some("abc_DEF-123"));
    assert_eq!(artwork_id(" https://arweave.net/abc123 "), Some("abc123"));
    assert_eq!(artwork_id("https://arweave.net/abc123/"), Some("abc123"));
    assert_eq!(artwork_id("https://arweave.net/abc123/grid-data.json"), Some("abc123"));
    assert_eq!(artwork_id("https://arweave.net/abc123/image.png?x=1"), Some("abc123"));
}

#[test]
fn artwork_id_rejects_garbage() {
    assert_eq!(artwork_id(""), None);
    assert_eq!(artwork_id("https://arweave.net/"), None);
    assert_eq!(artwork_id("not an id"), None);
}
