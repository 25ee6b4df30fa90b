//! Interactive editing session: command parsing and dispatch.
//!
//! DESIGN
//! ======
//! `Session` owns the editor, the chat state and the local store. Commands
//! that only touch local state run synchronously in [`Session::execute`].
//! Anything that needs the server comes back as an [`Effect`] for the REPL
//! to perform, and its result is fed back through `finish_*`. This keeps the
//! session testable without a network and mirrors the chat's
//! begin/complete split around the single suspension point.

use canvas::chat::ChatSession;
use canvas::editor::{Action, Editor};
use canvas::grid::GridSize;
use canvas::input::Tool;
use canvas::protocol::{AiResponse, Role};

use crate::api::{GalleryItem, GridDataFile, PublishReceipt};
use crate::error::CliError;
use crate::store::{Draft, ExportEntry, Store, now_millis};

pub const HELP: &str = "\
commands:
  paint X Y [#hex]     paint one cell (default: current tool color)
  stroke X Y X Y ...   drag across cells as one stroke
  tool pencil|eraser   switch tool (bare `tool` toggles the eraser)
  color #hex           select a color
  custom #hex          add a custom palette color
  palette              list palette colors
  undo | redo          step through history
  size N [--force]     switch to an NxN canvas (8, 16, 32, 64)
  reset [--force]      clear the canvas
  show                 redraw the canvas
  ask TEXT             ask the AI assistant
  chat                 show the conversation
  newchat              start a new conversation
  save [NAME]          save the canvas as a draft
  drafts               list drafts
  load ID              open a draft
  delete ID            delete a draft
  publish CREATOR NAME...  publish the canvas
  exports              list published artwork
  import LINK          open a published artwork by link or id
  gallery [QUERY]      browse community artwork
  help | quit";

// =============================================================================
// COMMANDS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Paint { x: usize, y: usize, color: Option<String> },
    Stroke(Vec<(usize, usize)>),
    Tool(Option<Tool>),
    Color(String),
    Custom(String),
    Palette,
    Undo,
    Redo,
    Size { size: GridSize, force: bool },
    Reset { force: bool },
    Show,
    Ask(String),
    Chat,
    NewChat,
    Save(Option<String>),
    Drafts,
    Load(String),
    Delete(String),
    Publish { creator: String, artwork: String },
    Exports,
    Import(String),
    Gallery(Option<String>),
    Help,
    Quit,
}

fn usage(msg: &str) -> CliError {
    CliError::Usage(msg.to_string())
}

fn coord(raw: Option<&str>) -> Result<usize, CliError> {
    raw.and_then(|s| s.parse().ok())
        .ok_or_else(|| usage("coordinates must be non-negative integers"))
}

/// `--size` and `size N` input: anything unsupported means 16.
#[must_use]
pub fn coerce_size(raw: &str) -> GridSize {
    raw.trim()
        .parse::<usize>()
        .ok()
        .and_then(|side| GridSize::from_side(side).ok())
        .unwrap_or_default()
}

/// Parse one REPL line. Blank lines are `Ok(None)`.
///
/// # Errors
///
/// [`CliError::Usage`] for unknown commands or bad arguments.
pub fn parse_command(line: &str) -> Result<Option<Command>, CliError> {
    let line = line.trim();
    let (head, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    let mut args = rest.split_whitespace();
    let optional = |s: &str| (!s.is_empty()).then(|| s.to_string());

    let command = match head {
        "" => return Ok(None),
        "paint" | "p" => {
            let x = coord(args.next())?;
            let y = coord(args.next())?;
            Command::Paint { x, y, color: args.next().map(str::to_string) }
        }
        "stroke" => {
            let nums = args.map(|a| coord(Some(a))).collect::<Result<Vec<_>, _>>()?;
            if nums.is_empty() || nums.len() % 2 != 0 {
                return Err(usage("stroke needs X Y pairs"));
            }
            Command::Stroke(nums.chunks(2).map(|c| (c[0], c[1])).collect())
        }
        "tool" => match args.next() {
            None => Command::Tool(None),
            Some("pencil") => Command::Tool(Some(Tool::Pencil)),
            Some("eraser") => Command::Tool(Some(Tool::Eraser)),
            Some(_) => return Err(usage("tool is pencil or eraser")),
        },
        "eraser" | "e" => Command::Tool(None),
        "color" => Command::Color(args.next().ok_or_else(|| usage("color #hex"))?.to_string()),
        "custom" => Command::Custom(args.next().ok_or_else(|| usage("custom #hex"))?.to_string()),
        "palette" => Command::Palette,
        "undo" | "u" => Command::Undo,
        "redo" | "r" => Command::Redo,
        "size" => {
            let raw = args.next().ok_or_else(|| usage("size N"))?;
            Command::Size { size: coerce_size(raw), force: args.any(|a| a == "--force") }
        }
        "reset" => Command::Reset { force: args.any(|a| a == "--force") },
        "show" => Command::Show,
        "ask" => {
            if rest.is_empty() {
                return Err(usage("ask TEXT"));
            }
            Command::Ask(rest.to_string())
        }
        "chat" => Command::Chat,
        "newchat" => Command::NewChat,
        "save" => Command::Save(optional(rest)),
        "drafts" => Command::Drafts,
        "load" => Command::Load(args.next().ok_or_else(|| usage("load ID"))?.to_string()),
        "delete" => Command::Delete(args.next().ok_or_else(|| usage("delete ID"))?.to_string()),
        "publish" => {
            let creator = args.next().ok_or_else(|| usage("publish CREATOR NAME..."))?.to_string();
            let artwork = args.collect::<Vec<_>>().join(" ");
            if artwork.is_empty() {
                return Err(usage("publish CREATOR NAME..."));
            }
            Command::Publish { creator, artwork }
        }
        "exports" => Command::Exports,
        "import" => Command::Import(args.next().ok_or_else(|| usage("import LINK"))?.to_string()),
        "gallery" => Command::Gallery(optional(rest)),
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(CliError::Usage(format!("unknown command `{other}`; try `help`"))),
    };
    Ok(Some(command))
}

// =============================================================================
// SESSION
// =============================================================================

/// What the REPL should do after a command.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Nothing,
    Message(String),
    /// Redraw the canvas, then print the message if any.
    Redraw(Option<String>),
    Ask(canvas::protocol::AiRequest),
    Publish { creator: String, artwork: String },
    Import(String),
    Gallery(Option<String>),
    Quit,
}

fn redraw_if(action: &Action, message: Option<String>) -> Effect {
    if action.needs_render() {
        Effect::Redraw(message)
    } else {
        message.map_or(Effect::Nothing, Effect::Message)
    }
}

pub struct Session {
    pub editor: Editor,
    pub chat: ChatSession,
    store: Store,
    draft: Option<(String, String)>,
}

impl Session {
    /// Start a session, restoring the saved conversation.
    #[must_use]
    pub fn new(editor: Editor, store: Store) -> Self {
        let chat = ChatSession::from_messages(store.chat());
        Self { editor, chat, store, draft: None }
    }

    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// `(id, name)` of the draft being edited, if any.
    #[must_use]
    pub fn current_draft(&self) -> Option<(&str, &str)> {
        self.draft.as_ref().map(|(id, name)| (id.as_str(), name.as_str()))
    }

    /// # Errors
    ///
    /// Grid errors (bad color, off-grid cell), store write failures and
    /// unknown draft ids.
    pub fn execute(&mut self, command: Command) -> Result<Effect, CliError> {
        let effect = match command {
            Command::Paint { x, y, color } => {
                let color = color.unwrap_or_else(|| {
                    self.editor
                        .tool()
                        .stroke_color(self.editor.selected_color())
                        .to_string()
                });
                let action = self.editor.paint(x, y, &color)?;
                redraw_if(&action, None)
            }
            Command::Stroke(cells) => self.stroke(&cells)?,
            Command::Tool(tool) => {
                let tool = match tool {
                    Some(tool) => {
                        self.editor.set_tool(tool);
                        tool
                    }
                    None => self.editor.toggle_eraser(),
                };
                Effect::Message(format!("tool: {}", tool_name(tool)))
            }
            Command::Color(color) => {
                self.editor.select_color(&color)?;
                Effect::Message(format!("color: {}", self.editor.selected_color()))
            }
            Command::Custom(color) => {
                let added = self.editor.add_custom_color(&color)?;
                Effect::Message(if added { format!("added {color}") } else { format!("{color} already in palette") })
            }
            Command::Palette => Effect::Message(self.editor.palette().collect::<Vec<_>>().join(" ")),
            Command::Undo => {
                let action = self.editor.undo();
                redraw_if(&action, (!action.needs_render()).then(|| "nothing to undo".to_string()))
            }
            Command::Redo => {
                let action = self.editor.redo();
                redraw_if(&action, (!action.needs_render()).then(|| "nothing to redo".to_string()))
            }
            Command::Size { size, force } => {
                if size == self.editor.size() {
                    Effect::Message(format!("already {size}"))
                } else if self.editor.would_lose_work() && !force {
                    Effect::Message(format!("canvas has unsaved work; `size {} --force` discards it", size.side()))
                } else {
                    self.draft = None;
                    redraw_if(&self.editor.resize(size), None)
                }
            }
            Command::Reset { force } => {
                if self.editor.would_lose_work() && !force {
                    Effect::Message("canvas has unsaved work; `reset --force` clears it".to_string())
                } else {
                    redraw_if(&self.editor.reset(), None)
                }
            }
            Command::Show => Effect::Redraw(None),
            Command::Ask(text) => match self.chat.begin(&text, self.editor.grid()) {
                Some(request) => Effect::Ask(request),
                None => Effect::Message("a request is already in flight".to_string()),
            },
            Command::Chat => Effect::Message(format_chat(&self.chat)),
            Command::NewChat => {
                self.chat.clear();
                self.store.save_chat(self.chat.messages())?;
                Effect::Message("started a new chat".to_string())
            }
            Command::Save(name) => {
                let draft = self.save(name)?;
                Effect::Message(format!("saved draft {} ({})", draft.name, draft.id))
            }
            Command::Drafts => Effect::Message(format_drafts(&self.store.drafts())),
            Command::Load(id) => {
                let draft = self.store.draft(&id).ok_or(CliError::UnknownDraft(id))?;
                let message = format!("loaded draft {}", draft.name);
                self.draft = Some((draft.id, draft.name));
                redraw_if(&self.editor.replace_grid(draft.grid), Some(message))
            }
            Command::Delete(id) => {
                if !self.store.delete_draft(&id)? {
                    return Err(CliError::UnknownDraft(id));
                }
                if self.draft.as_ref().is_some_and(|(current, _)| *current == id) {
                    self.draft = None;
                }
                Effect::Message(format!("deleted draft {id}"))
            }
            Command::Publish { creator, artwork } => Effect::Publish { creator, artwork },
            Command::Exports => Effect::Message(format_exports(&self.store.exports())),
            Command::Import(link) => Effect::Import(link),
            Command::Gallery(query) => Effect::Gallery(query),
            Command::Help => Effect::Message(HELP.to_string()),
            Command::Quit => Effect::Quit,
        };
        Ok(effect)
    }

    fn stroke(&mut self, cells: &[(usize, usize)]) -> Result<Effect, CliError> {
        let Some((&(x, y), rest)) = cells.split_first() else {
            return Ok(Effect::Nothing);
        };
        let mut changed = self.editor.pointer_down(x, y)?.needs_render();
        for &(x, y) in rest {
            match self.editor.pointer_move(x, y) {
                Ok(action) => changed |= action.needs_render(),
                Err(e) => {
                    // Off-grid mid-stroke behaves like the pointer leaving.
                    self.editor.pointer_leave();
                    return Err(e.into());
                }
            }
        }
        changed |= self.editor.pointer_up().needs_render();
        Ok(if changed { Effect::Redraw(None) } else { Effect::Nothing })
    }

    fn save(&mut self, name: Option<String>) -> Result<Draft, CliError> {
        let (id, current_name) = match &self.draft {
            Some((id, name)) => (Some(id.clone()), Some(name.clone())),
            None => (None, None),
        };
        let name = name.or(current_name).unwrap_or_else(|| "Untitled".to_string());
        let draft = self.store.save_draft(id.as_deref(), &name, self.editor.grid())?;
        self.draft = Some((draft.id.clone(), draft.name.clone()));
        Ok(draft)
    }

    /// Complete an `ask`: record the reply, apply any accepted grid and
    /// persist the conversation.
    ///
    /// # Errors
    ///
    /// Store write failures. A failed generation is not an error here; it
    /// becomes the apology message.
    pub fn finish_ask(&mut self, result: Result<AiResponse, CliError>) -> Result<Effect, CliError> {
        let action = self.chat.complete(result, &mut self.editor);
        self.store.save_chat(self.chat.messages())?;
        let reply = self
            .chat
            .messages()
            .last()
            .map(|m| format!("assistant: {}", m.content))
            .unwrap_or_default();
        Ok(redraw_if(&action, Some(reply)))
    }

    /// Record a successful publish in the export history.
    ///
    /// # Errors
    ///
    /// Store write failures.
    pub fn finish_publish(&mut self, creator: &str, artwork: &str, receipt: &PublishReceipt) -> Result<Effect, CliError> {
        self.store.record_export(ExportEntry {
            id: receipt.image_id.clone(),
            creator_name: creator.to_string(),
            turbo_link: receipt.link.clone(),
            artwork_name: artwork.to_string(),
            size: receipt.size,
            exported_at: now_millis(),
            manifest_id: Some(receipt.manifest_id.clone()),
        })?;
        Ok(Effect::Message(format!("published: {} (grid data {})", receipt.link, receipt.grid_data_id)))
    }

    /// Open a published artwork. History restarts at the loaded grid.
    pub fn finish_import(&mut self, file: GridDataFile) -> Effect {
        self.draft = None;
        let message = format!("loaded {} by {}", file.metadata.artwork_name, file.metadata.creator);
        redraw_if(&self.editor.replace_grid(file.grid), Some(message))
    }
}

// =============================================================================
// FORMATTING
// =============================================================================

fn tool_name(tool: Tool) -> &'static str {
    match tool {
        Tool::Pencil => "pencil",
        Tool::Eraser => "eraser",
    }
}

#[must_use]
pub fn format_chat(chat: &ChatSession) -> String {
    if chat.messages().is_empty() {
        return "(no messages)".to_string();
    }
    chat.messages()
        .iter()
        .map(|m| {
            let who = match m.role {
                Role::User => "you",
                Role::Assistant => "assistant",
            };
            format!("{who}: {}", m.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[must_use]
pub fn format_drafts(drafts: &[Draft]) -> String {
    if drafts.is_empty() {
        return "(no drafts)".to_string();
    }
    drafts
        .iter()
        .map(|d| format!("{}  {}x{}  {}", d.id, d.size, d.size, d.name))
        .collect::<Vec<_>>()
        .join("\n")
}

#[must_use]
pub fn format_exports(exports: &[ExportEntry]) -> String {
    if exports.is_empty() {
        return "(no exports)".to_string();
    }
    exports
        .iter()
        .map(|e| format!("{}  by {}  {}x{}  {}", e.artwork_name, e.creator_name, e.size, e.size, e.turbo_link))
        .collect::<Vec<_>>()
        .join("\n")
}

#[must_use]
pub fn format_gallery(items: &[GalleryItem]) -> String {
    if items.is_empty() {
        return "(no artwork)".to_string();
    }
    items
        .iter()
        .map(|i| format!("{}  {} by {}  {}", i.id, i.title, i.artist, i.link))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
