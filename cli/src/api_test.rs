use super::*;
use canvas::grid::GridSize;

#[test]
fn error_message_prefers_error_field() {
    let body = r#"{"error":"AI generation failed","code":"E_API_REQUEST","retryable":true}"#;
    assert_eq!(error_message(body), "AI generation failed");
    assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
}

#[test]
fn encode_query_escapes_reserved() {
    assert_eq!(encode_query("red heart&x=1"), "red%20heart%26x%3D1");
    assert_eq!(encode_query("abc-_.~"), "abc-_.~");
}

#[test]
fn base_url_is_trimmed() {
    assert_eq!(ApiClient::new("http://localhost:3000/").base_url, "http://localhost:3000");
}

#[test]
fn publish_body_is_camel_case() {
    let grid = Grid::empty(GridSize::S8);
    let body = PublishBody { creator_name: "ada", artwork_name: "tiny", grid: &grid };
    let json = serde_json::to_value(&body).unwrap();
    assert_eq!(json["creatorName"], "ada");
    assert_eq!(json["artworkName"], "tiny");
    assert_eq!(json["grid"].as_array().map(Vec::len), Some(8));
}

#[test]
fn grid_file_ignores_extra_metadata() {
    let body = serde_json::json!({
        "grid": vec![vec!["#ffffff"; 8]; 8],
        "metadata": { "imageTxId": "i", "creator": "ada", "artworkName": "tiny", "size": 8, "createdAt": "t" }
    });
    let file: GridDataFile = serde_json::from_value(body).unwrap();
    assert_eq!(file.grid.size(), GridSize::S8);
    assert_eq!(file.metadata.creator, "ada");
}
