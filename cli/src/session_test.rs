use super::*;
use canvas::consts::{BACKGROUND, GENERATION_FAILED_REPLY};
use canvas::grid::Grid;
use canvas::protocol::ResponseAction;

use crate::api::GridMetadata;

fn session() -> (tempfile::TempDir, Session) {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::new(dir.path());
    (dir, Session::new(Editor::new(GridSize::S8), store))
}

fn run(session: &mut Session, line: &str) -> Effect {
    let command = parse_command(line).unwrap().unwrap();
    session.execute(command).unwrap()
}

// =============================================================================
// parse_command
// =============================================================================

#[test]
fn blank_line_is_no_command() {
    assert_eq!(parse_command("   ").unwrap(), None);
}

#[test]
fn parses_paint_with_and_without_color() {
    assert_eq!(
        parse_command("paint 1 2").unwrap(),
        Some(Command::Paint { x: 1, y: 2, color: None })
    );
    assert_eq!(
        parse_command("p 3 4 #ff0000").unwrap(),
        Some(Command::Paint { x: 3, y: 4, color: Some("#ff0000".into()) })
    );
}

#[test]
fn paint_rejects_negative_coordinates() {
    assert!(matches!(parse_command("paint -1 2"), Err(CliError::Usage(_))));
    assert!(matches!(parse_command("paint 1"), Err(CliError::Usage(_))));
}

#[test]
fn stroke_needs_pairs() {
    assert_eq!(
        parse_command("stroke 0 0 1 0").unwrap(),
        Some(Command::Stroke(vec![(0, 0), (1, 0)]))
    );
    assert!(parse_command("stroke 0 0 1").is_err());
    assert!(parse_command("stroke").is_err());
}

#[test]
fn size_coerces_unsupported_values_to_sixteen() {
    assert_eq!(
        parse_command("size 32 --force").unwrap(),
        Some(Command::Size { size: GridSize::S32, force: true })
    );
    assert_eq!(
        parse_command("size 12").unwrap(),
        Some(Command::Size { size: GridSize::S16, force: false })
    );
    assert_eq!(coerce_size("abc"), GridSize::S16);
    assert_eq!(coerce_size(" 64 "), GridSize::S64);
}

#[test]
fn ask_keeps_the_whole_line() {
    assert_eq!(
        parse_command("ask draw a  red heart").unwrap(),
        Some(Command::Ask("draw a  red heart".into()))
    );
    assert!(parse_command("ask").is_err());
}

#[test]
fn publish_joins_artwork_name() {
    assert_eq!(
        parse_command("publish ada my red heart").unwrap(),
        Some(Command::Publish { creator: "ada".into(), artwork: "my red heart".into() })
    );
    assert!(parse_command("publish ada").is_err());
}

#[test]
fn unknown_command_is_usage_error() {
    let err = parse_command("fly away").unwrap_err();
    assert!(err.to_string().contains("unknown command `fly`"));
}

// =============================================================================
// editing
// =============================================================================

#[test]
fn paint_uses_selected_color_then_eraser() {
    let (_dir, mut s) = session();
    run(&mut s, "color #ff0000");
    assert_eq!(run(&mut s, "paint 1 1"), Effect::Redraw(None));
    assert_eq!(s.editor.grid().get(1, 1), Some("#ff0000"));

    run(&mut s, "tool eraser");
    run(&mut s, "paint 1 1");
    assert_eq!(s.editor.grid().get(1, 1), Some(BACKGROUND));
}

#[test]
fn repainting_same_color_does_not_redraw() {
    let (_dir, mut s) = session();
    run(&mut s, "paint 0 0 #000000");
    assert_eq!(run(&mut s, "paint 0 0 #000000"), Effect::Nothing);
}

#[test]
fn off_grid_paint_is_an_error() {
    let (_dir, mut s) = session();
    let err = s.execute(Command::Paint { x: 8, y: 0, color: None }).unwrap_err();
    assert!(matches!(err, CliError::Grid(_)));
}

#[test]
fn invalid_color_is_rejected() {
    let (_dir, mut s) = session();
    assert!(s.execute(Command::Color("red".into())).is_err());
    assert!(s.execute(Command::Paint { x: 0, y: 0, color: Some("red".into()) }).is_err());
}

#[test]
fn undo_and_redo_report_when_empty() {
    let (_dir, mut s) = session();
    assert_eq!(run(&mut s, "undo"), Effect::Message("nothing to undo".into()));
    run(&mut s, "paint 2 2");
    assert_eq!(run(&mut s, "undo"), Effect::Redraw(None));
    assert!(s.editor.grid().is_blank());
    assert_eq!(run(&mut s, "redo"), Effect::Redraw(None));
    assert_eq!(run(&mut s, "redo"), Effect::Message("nothing to redo".into()));
}

#[test]
fn stroke_paints_every_cell() {
    let (_dir, mut s) = session();
    assert_eq!(run(&mut s, "stroke 0 0 1 0 2 0"), Effect::Redraw(None));
    assert_eq!(s.editor.grid().painted_cells(), 3);
}

#[test]
fn stroke_off_grid_ends_the_stroke() {
    let (_dir, mut s) = session();
    assert!(s.execute(Command::Stroke(vec![(0, 0), (9, 9)])).is_err());
    assert_eq!(s.editor.grid().painted_cells(), 1);
    // A new stroke starts cleanly afterwards.
    run(&mut s, "stroke 3 3");
    assert_eq!(s.editor.grid().painted_cells(), 2);
}

#[test]
fn resize_with_work_requires_force() {
    let (_dir, mut s) = session();
    run(&mut s, "paint 0 0");
    assert!(matches!(run(&mut s, "size 16"), Effect::Message(m) if m.contains("--force")));
    assert_eq!(s.editor.size(), GridSize::S8);

    assert_eq!(run(&mut s, "size 16 --force"), Effect::Redraw(None));
    assert_eq!(s.editor.size(), GridSize::S16);
    assert!(s.editor.grid().is_blank());
}

#[test]
fn resize_to_same_size_is_a_message() {
    let (_dir, mut s) = session();
    assert_eq!(run(&mut s, "size 8"), Effect::Message("already 8x8".into()));
}

#[test]
fn reset_blank_canvas_needs_no_force() {
    let (_dir, mut s) = session();
    assert!(matches!(run(&mut s, "reset"), Effect::Redraw(None)));
    run(&mut s, "paint 0 0");
    assert!(matches!(run(&mut s, "reset"), Effect::Message(_)));
    run(&mut s, "reset --force");
    assert!(s.editor.grid().is_blank());
}

#[test]
fn custom_color_reports_duplicates() {
    let (_dir, mut s) = session();
    assert_eq!(run(&mut s, "custom #123456"), Effect::Message("added #123456".into()));
    assert_eq!(
        run(&mut s, "custom #123456"),
        Effect::Message("#123456 already in palette".into())
    );
    assert!(matches!(run(&mut s, "palette"), Effect::Message(m) if m.contains("#123456")));
}

// =============================================================================
// drafts
// =============================================================================

#[test]
fn save_then_save_again_updates_same_draft() {
    let (_dir, mut s) = session();
    run(&mut s, "paint 0 0");
    run(&mut s, "save heart");
    let (id, name) = s.current_draft().map(|(i, n)| (i.to_string(), n.to_string())).unwrap();
    assert_eq!(name, "heart");

    run(&mut s, "paint 1 1");
    run(&mut s, "save");
    let drafts = s.store().drafts();
    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0].id, id);
    assert_eq!(drafts[0].name, "heart");
    assert_eq!(drafts[0].grid.painted_cells(), 2);
}

#[test]
fn unnamed_save_is_untitled() {
    let (_dir, mut s) = session();
    run(&mut s, "save");
    assert_eq!(s.store().drafts()[0].name, "Untitled");
}

#[test]
fn load_replaces_grid_and_clears_history() {
    let (_dir, mut s) = session();
    run(&mut s, "paint 0 0");
    run(&mut s, "save one");
    let id = s.current_draft().unwrap().0.to_string();
    run(&mut s, "reset --force");

    let effect = s.execute(Command::Load(id)).unwrap();
    assert_eq!(effect, Effect::Redraw(Some("loaded draft one".into())));
    assert_eq!(s.editor.grid().painted_cells(), 1);
    assert!(!s.editor.can_undo());
}

#[test]
fn load_unknown_draft_errors() {
    let (_dir, mut s) = session();
    let err = s.execute(Command::Load("missing".into())).unwrap_err();
    assert!(matches!(err, CliError::UnknownDraft(id) if id == "missing"));
}

#[test]
fn deleting_current_draft_detaches_it() {
    let (_dir, mut s) = session();
    run(&mut s, "save doomed");
    let id = s.current_draft().unwrap().0.to_string();
    s.execute(Command::Delete(id.clone())).unwrap();
    assert!(s.current_draft().is_none());
    assert!(s.execute(Command::Delete(id)).is_err());
}

// =============================================================================
// chat
// =============================================================================

#[test]
fn ask_produces_request_and_blocks_second_ask() {
    let (_dir, mut s) = session();
    let Effect::Ask(request) = run(&mut s, "ask draw a cat") else {
        panic!("expected ask effect");
    };
    assert_eq!(request.messages.len(), 1);
    assert_eq!(
        run(&mut s, "ask again"),
        Effect::Message("a request is already in flight".into())
    );
}

#[test]
fn drawing_continues_while_ask_in_flight() {
    let (_dir, mut s) = session();
    assert!(matches!(run(&mut s, "ask draw a cat"), Effect::Ask(_)));
    assert!(s.chat.is_loading());

    assert_eq!(run(&mut s, "paint 2 3 #00ff00"), Effect::Redraw(None));
    assert_eq!(s.editor.grid().get(2, 3), Some("#00ff00"));
    assert_eq!(
        run(&mut s, "ask a dog instead"),
        Effect::Message("a request is already in flight".into())
    );

    let response = AiResponse { action: ResponseAction::None, reply: "meow".into(), size: None, grid: None };
    assert_eq!(s.finish_ask(Ok(response)).unwrap(), Effect::Message("assistant: meow".into()));
    assert!(!s.chat.is_loading());
    assert_eq!(s.editor.grid().get(2, 3), Some("#00ff00"));
    assert!(matches!(run(&mut s, "ask now a dog"), Effect::Ask(_)));
}

#[test]
fn finish_ask_applies_grid_and_persists_chat() {
    let (dir, mut s) = session();
    run(&mut s, "ask red square");
    let grid = Grid::empty(GridSize::S8).painted(0, 0, "#ff0000").unwrap();
    let response = AiResponse {
        action: ResponseAction::ReplaceGrid,
        reply: "done".into(),
        size: Some(GridSize::S8),
        grid: Some(grid),
    };
    let effect = s.finish_ask(Ok(response)).unwrap();
    assert_eq!(effect, Effect::Redraw(Some("assistant: done".into())));
    assert_eq!(s.editor.grid().get(0, 0), Some("#ff0000"));

    let reopened = Store::new(dir.path());
    assert_eq!(reopened.chat().len(), 2);
}

#[test]
fn failed_ask_appends_apology_without_redraw() {
    let (_dir, mut s) = session();
    run(&mut s, "ask anything");
    let effect = s
        .finish_ask(Err(CliError::Server { status: 500, message: "boom".into() }))
        .unwrap();
    assert_eq!(effect, Effect::Message(format!("assistant: {GENERATION_FAILED_REPLY}")));
    assert!(!s.chat.is_loading());
}

#[test]
fn chat_resumes_from_store_and_newchat_clears_it() {
    let (dir, mut s) = session();
    run(&mut s, "ask hi");
    s.finish_ask(Err(CliError::Usage("x".into()))).unwrap();

    let mut resumed = Session::new(Editor::new(GridSize::S8), Store::new(dir.path()));
    assert_eq!(resumed.chat.messages().len(), 2);
    assert!(matches!(run(&mut resumed, "chat"), Effect::Message(m) if m.starts_with("you: hi")));

    run(&mut resumed, "newchat");
    assert!(Store::new(dir.path()).chat().is_empty());
}

// =============================================================================
// publish / import
// =============================================================================

#[test]
fn finish_publish_records_export() {
    let (_dir, mut s) = session();
    let receipt = PublishReceipt {
        image_id: "img".into(),
        grid_data_id: "data".into(),
        manifest_id: "man".into(),
        link: "https://arweave.net/man".into(),
        size: 8,
    };
    let effect = s.finish_publish("ada", "heart", &receipt).unwrap();
    assert_eq!(effect, Effect::Message("published: https://arweave.net/man (grid data data)".into()));

    let exports = s.store().exports();
    assert_eq!(exports[0].id, "img");
    assert_eq!(exports[0].manifest_id.as_deref(), Some("man"));
    assert_eq!(exports[0].turbo_link, "https://arweave.net/man");
}

#[test]
fn finish_import_replaces_grid() {
    let (_dir, mut s) = session();
    run(&mut s, "save mine");
    let file = GridDataFile {
        grid: Grid::empty(GridSize::S16).painted(5, 5, "#00ff00").unwrap(),
        metadata: GridMetadata { creator: "bo".into(), artwork_name: "leaf".into() },
    };
    let effect = s.finish_import(file);
    assert_eq!(effect, Effect::Redraw(Some("loaded leaf by bo".into())));
    assert_eq!(s.editor.size(), GridSize::S16);
    assert!(s.current_draft().is_none());
}

#[test]
fn empty_listings_have_placeholders() {
    assert_eq!(format_drafts(&[]), "(no drafts)");
    assert_eq!(format_exports(&[]), "(no exports)");
    assert_eq!(format_gallery(&[]), "(no artwork)");
}
