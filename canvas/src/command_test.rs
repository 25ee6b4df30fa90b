use super::*;
use serde_json::json;

fn rows(n: usize, color: &str) -> Vec<Vec<String>> {
    vec![vec![color.to_string(); n]; n]
}

fn rows_json(n: usize, color: &str) -> String {
    serde_json::to_string(&rows(n, color)).unwrap()
}

// =============================================================
// Fences and JSON extraction
// =============================================================

#[test]
fn strips_fence_with_language_tag() {
    let text = "```json\n{\"action\":\"none\"}\n```";
    assert_eq!(strip_code_fences(text), "{\"action\":\"none\"}");
}

#[test]
fn strips_bare_fence() {
    assert_eq!(strip_code_fences("  ```\n{}\n```  "), "{}");
}

#[test]
fn leaves_unfenced_text_alone() {
    assert_eq!(strip_code_fences(" {\"a\":1} "), "{\"a\":1}");
    assert_eq!(strip_code_fences("here: ```{}```"), "here: ```{}```");
}

#[test]
fn extract_parses_clean_json() {
    assert_eq!(extract_json("{\"reply\":\"hi\"}").unwrap(), json!({"reply": "hi"}));
}

#[test]
fn extract_falls_back_to_brace_span() {
    let text = "Sure! Here you go: {\"reply\":\"hi\"} Hope it helps.";
    assert_eq!(extract_json(text).unwrap(), json!({"reply": "hi"}));
}

#[test]
fn extract_without_braces_fails() {
    assert_eq!(extract_json("I cannot draw that."), Err(CommandError::NoJson));
    assert_eq!(extract_json("} backwards {"), Err(CommandError::NoJson));
}

#[test]
fn extract_with_broken_span_fails() {
    assert!(matches!(extract_json("{ not json }"), Err(CommandError::InvalidJson(_))));
}

// =============================================================
// Size normalization
// =============================================================

#[test]
fn normalizes_dimension_strings() {
    for (raw, side) in [("8x8", 8), (" 16x16 ", 16), ("32x32", 32), ("16", 16), ("64", 64)] {
        let mut value = json!({ "size": raw });
        normalize_size(&mut value);
        assert_eq!(value["size"], json!(side), "raw {raw:?}");
    }
}

#[test]
fn leaves_other_sizes_alone() {
    for raw in [json!("big"), json!("8 x 8"), json!(""), json!(12), json!(null)] {
        let mut value = json!({ "size": raw.clone() });
        normalize_size(&mut value);
        assert_eq!(value["size"], raw);
    }
}

// =============================================================
// Schema
// =============================================================

#[test]
fn missing_fields_take_defaults() {
    let candidate = validate(json!({})).unwrap();
    assert_eq!(candidate, Candidate::default());
}

#[test]
fn unknown_keys_are_ignored() {
    let candidate = validate(json!({"reply": "ok", "mood": "happy"})).unwrap();
    assert_eq!(candidate.reply, "ok");
}

#[test]
fn rejects_non_object() {
    assert_eq!(validate(json!([1, 2])), Err(CommandError::NotAnObject));
}

#[test]
fn rejects_unknown_action() {
    assert_eq!(
        validate(json!({"action": "draw"})),
        Err(CommandError::UnknownAction("draw".into()))
    );
}

#[test]
fn rejects_null_fields() {
    assert_eq!(validate(json!({"reply": null})), Err(CommandError::WrongType("reply")));
    assert_eq!(validate(json!({"size": null})), Err(CommandError::WrongType("size")));
}

#[test]
fn rejects_size_outside_set() {
    assert!(matches!(validate(json!({"size": 64})), Err(CommandError::UnsupportedSize(_))));
    assert!(matches!(validate(json!({"size": 12})), Err(CommandError::UnsupportedSize(_))));
}

#[test]
fn accepts_integral_float_size() {
    assert_eq!(validate(json!({"size": 16.0})).unwrap().size, Some(GridSize::S16));
}

#[test]
fn rejects_bad_cell() {
    let mut grid = rows(8, "#fff");
    grid[2][5] = "red".into();
    assert_eq!(
        validate(json!({ "grid": grid })),
        Err(CommandError::BadCell { x: 5, y: 2, value: "red".into() })
    );
}

#[test]
fn rejects_ragged_rows() {
    let mut grid = rows(8, "#000000");
    grid[3].pop();
    assert_eq!(
        validate(json!({ "grid": grid })),
        Err(CommandError::RaggedGrid { row: 3, expected: 8, found: 7 })
    );
}

// =============================================================
// Reconcile end to end
// =============================================================

#[test]
fn dimension_string_size_is_accepted_with_grid() {
    let text = format!(
        r##"{{"action":"replace_grid","reply":"ok","size":"8x8","grid":{}}}"##,
        rows_json(8, "#ff0000")
    );
    let result = reconcile(&text);
    assert_eq!(result.outcome, Outcome::Accepted);
    assert_eq!(result.command.size(), Some(GridSize::S8));
    assert_eq!(result.command.reply(), "ok");
    assert_eq!(result.command.grid().unwrap().get(7, 7), Some("#ff0000"));
}

#[test]
fn ragged_grid_collapses_to_default() {
    let mut grid = rows(8, "#000000");
    grid[0].push("#000000".into());
    let text = json!({"action": "replace_grid", "reply": "here", "grid": grid}).to_string();
    let result = reconcile(&text);
    assert_eq!(result.command, AiCommand::None { reply: String::new() });
    assert!(matches!(result.outcome, Outcome::Defaulted(CommandError::RaggedGrid { .. })));
}

#[test]
fn ten_row_grid_is_discarded_with_note() {
    let text = json!({"action": "replace_grid", "reply": "done", "grid": rows(10, "#abc")}).to_string();
    let result = reconcile(&text);
    let AiCommand::None { reply } = &result.command else {
        panic!("expected none, got {:?}", result.command);
    };
    assert!(reply.starts_with("done\n\n"));
    assert!(reply.ends_with(GRID_DISCARDED_NOTE));
    assert_eq!(result.outcome, Outcome::GridDiscarded { rows: 10, columns: 10 });
}

#[test]
fn non_square_grid_is_discarded() {
    let grid: Vec<Vec<String>> = vec![vec!["#fff".to_string(); 16]; 8];
    let result = reconcile(&json!({"action": "replace_grid", "grid": grid}).to_string());
    assert!(result.command.grid().is_none());
    assert!(result.command.reply().contains(GRID_DISCARDED_NOTE));
}

#[test]
fn sixty_four_grid_is_discarded() {
    let result = reconcile(&json!({"action": "replace_grid", "grid": rows(64, "#fff")}).to_string());
    assert_eq!(result.outcome, Outcome::GridDiscarded { rows: 64, columns: 64 });
}

#[test]
fn declared_size_loses_to_grid_side() {
    let text = json!({"action": "replace_grid", "size": 8, "grid": rows(16, "#fff")}).to_string();
    let result = reconcile(&text);
    assert_eq!(result.command.size(), Some(GridSize::S16));
    assert_eq!(
        result.outcome,
        Outcome::SizeCorrected { declared: GridSize::S8, actual: GridSize::S16 }
    );
}

#[test]
fn replace_without_grid_is_none() {
    let result = reconcile(r#"{"action":"replace_grid","reply":"hmm"}"#);
    assert_eq!(result.command, AiCommand::None { reply: "hmm".into() });
}

#[test]
fn none_with_grid_drops_grid() {
    let text = json!({"action": "none", "reply": "just chatting", "grid": rows(8, "#fff")}).to_string();
    assert_eq!(reconcile(&text).command, AiCommand::None { reply: "just chatting".into() });
}

#[test]
fn fenced_prose_response_is_reconciled() {
    let text = format!(
        "```json\n{{\"action\":\"replace_grid\",\"reply\":\"a cat\",\"size\":16,\"grid\":{}}}\n```",
        rows_json(16, "#123456")
    );
    let result = reconcile(&text);
    assert_eq!(result.command.size(), Some(GridSize::S16));
}

#[test]
fn garbage_yields_default() {
    let result = reconcile("the model had a bad day");
    assert_eq!(result.command, AiCommand::default());
    assert_eq!(result.outcome.label(), "defaulted");
}

// =============================================================
// Wire conversions and application
// =============================================================

#[test]
fn command_to_response_carries_grid_size() {
    let grid = Grid::empty(GridSize::S32);
    let response = AiResponse::from(AiCommand::ReplaceGrid { reply: "r".into(), grid: grid.clone() });
    assert_eq!(response.action, ResponseAction::ReplaceGrid);
    assert_eq!(response.size, Some(GridSize::S32));
    assert_eq!(response.grid, Some(grid));

    let value = serde_json::to_value(AiResponse::from(AiCommand::default())).unwrap();
    assert_eq!(value, json!({"action": "none", "reply": ""}));
}

#[test]
fn response_to_command_requires_ai_sized_grid() {
    let response = AiResponse {
        action: ResponseAction::ReplaceGrid,
        reply: "big".into(),
        size: None,
        grid: Some(Grid::empty(GridSize::S64)),
    };
    assert_eq!(AiCommand::from(response), AiCommand::None { reply: "big".into() });
}

#[test]
fn applying_32_grid_to_16_session_resets_history_and_size() {
    let mut editor = Editor::new(GridSize::S16);
    editor.paint(0, 0, "#ff0000").unwrap();

    let grid = Grid::empty(GridSize::S32).painted(10, 10, "#00ff00").unwrap();
    let command = AiCommand::ReplaceGrid { reply: "bigger".into(), grid: grid.clone() };
    assert_eq!(command.apply(&mut editor), Action::GridReplaced { size: GridSize::S32 });

    assert_eq!(editor.size(), GridSize::S32);
    assert_eq!(editor.grid(), &grid);
    assert!(!editor.can_undo());
    assert!(!editor.can_redo());
}

#[test]
fn applying_none_leaves_editor_untouched() {
    let mut editor = Editor::new(GridSize::S8);
    editor.paint(1, 1, "#ff0000").unwrap();
    let before = editor.grid().clone();
    assert_eq!(AiCommand::default().apply(&mut editor), Action::None);
    assert_eq!(editor.grid(), &before);
    assert!(editor.can_undo());
}
