mod api;
mod error;
mod render;
mod session;
mod store;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use canvas::consts::DEFAULT_MAX_HISTORY;
use canvas::editor::Editor;
use canvas::input::StrokeGranularity;
use canvas::protocol::{AiResponse, artwork_id};
use clap::{Args, Parser, Subcommand};
use tokio::sync::mpsc;

use crate::api::{ApiClient, PublishBody};
use crate::error::CliError;
use crate::session::{Effect, Session, coerce_size, format_drafts, format_exports, format_gallery, parse_command};
use crate::store::{Store, default_data_dir};

const DEFAULT_GALLERY_PAGE: u32 = 100;

#[derive(Parser, Debug)]
#[command(name = "drawwy", about = "Pixel-art editor with an AI drawing assistant")]
struct Cli {
    #[arg(long, env = "DRAWWY_BASE_URL", default_value = "http://127.0.0.1:3000")]
    base_url: String,

    /// Where drafts, export history and the chat log live.
    #[arg(long, env = "DRAWWY_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open the interactive editor (the default).
    Draw(DrawArgs),
    Ping,
    Gallery {
        #[arg(long, default_value_t = DEFAULT_GALLERY_PAGE)]
        first: u32,
        #[arg(long)]
        query: Option<String>,
    },
    Drafts,
    Exports {
        /// Forget all recorded exports.
        #[arg(long, default_value_t = false)]
        clear: bool,
    },
}

#[derive(Args, Debug, Default)]
struct DrawArgs {
    /// Canvas side: 8, 16, 32 or 64. Anything else means 16.
    #[arg(long, default_value = "16")]
    size: String,

    /// Record a whole drag as one undo step instead of one per cell.
    #[arg(long, default_value_t = false)]
    per_stroke: bool,

    /// Draw with `.` and `#` instead of terminal colors.
    #[arg(long, default_value_t = false)]
    plain: bool,

    /// Open a saved draft by id.
    #[arg(long)]
    draft: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let client = ApiClient::new(&cli.base_url);
    let store = Store::new(cli.data_dir.unwrap_or_else(default_data_dir));

    match cli.command.unwrap_or(Command::Draw(DrawArgs { size: "16".into(), ..DrawArgs::default() })) {
        Command::Draw(args) => run_draw(&client, store, args).await,
        Command::Ping => {
            client.ping().await?;
            println!("ok");
            Ok(())
        }
        Command::Gallery { first, query } => {
            let items = client.gallery(first, query.as_deref()).await?;
            println!("{}", format_gallery(&items));
            Ok(())
        }
        Command::Drafts => {
            println!("{}", format_drafts(&store.drafts()));
            Ok(())
        }
        Command::Exports { clear: true } => {
            store.clear_exports()?;
            println!("export history cleared");
            Ok(())
        }
        Command::Exports { clear: false } => {
            println!("{}", format_exports(&store.exports()));
            Ok(())
        }
    }
}

async fn run_draw(client: &ApiClient, store: Store, args: DrawArgs) -> Result<(), CliError> {
    let granularity = if args.per_stroke { StrokeGranularity::PerStroke } else { StrokeGranularity::PerCell };
    let editor = Editor::with_options(coerce_size(&args.size), granularity, DEFAULT_MAX_HISTORY);
    let mut session = Session::new(editor, store);

    if let Some(id) = args.draft {
        let effect = session.execute(session::Command::Load(id))?;
        show(&session, &effect, args.plain);
    } else {
        show(&session, &Effect::Redraw(None), args.plain);
    }
    println!("saving to {}; type `help` for commands", session.store().dir().display());

    // Stdin blocks, so it gets its own thread. Generation replies arrive on a
    // second channel and are applied between commands.
    let (line_tx, mut lines) = mpsc::unbounded_channel::<io::Result<String>>();
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            if line_tx.send(line).is_err() {
                break;
            }
        }
    });
    let (reply_tx, mut replies) = mpsc::unbounded_channel::<Result<AiResponse, CliError>>();

    loop {
        print!("> ");
        io::stdout().flush()?;
        tokio::select! {
            line = lines.recv() => {
                let Some(line) = line else {
                    if session.chat.is_loading()
                        && let Some(result) = replies.recv().await
                    {
                        finish_ask(&mut session, result, args.plain);
                    }
                    break;
                };
                if handle_line(client, &mut session, &reply_tx, &line?, args.plain).await {
                    break;
                }
            }
            Some(result) = replies.recv() => {
                println!();
                finish_ask(&mut session, result, args.plain);
            }
        }
    }
    Ok(())
}

/// Run one input line. Returns `true` when the user asked to quit.
async fn handle_line(client: &ApiClient, session: &mut Session, replies: &Replies, line: &str, plain: bool) -> bool {
    let command = match parse_command(line) {
        Ok(Some(command)) => command,
        Ok(None) => return false,
        Err(e) => {
            eprintln!("{e}");
            return false;
        }
    };
    let effect = match session.execute(command) {
        Ok(effect) => effect,
        Err(e) => {
            eprintln!("{e}");
            return false;
        }
    };
    match perform(client, session, replies, effect).await {
        Ok(Effect::Quit) => true,
        Ok(effect) => {
            show(session, &effect, plain);
            false
        }
        Err(e) => {
            eprintln!("{e}");
            false
        }
    }
}

type Replies = mpsc::UnboundedSender<Result<AiResponse, CliError>>;

fn finish_ask(session: &mut Session, result: Result<AiResponse, CliError>, plain: bool) {
    match session.finish_ask(result) {
        Ok(effect) => show(session, &effect, plain),
        Err(e) => eprintln!("{e}"),
    }
}

/// Run the network half of an effect and return what to show. Generation
/// runs in the background and reports back through `replies`.
async fn perform(client: &ApiClient, session: &mut Session, replies: &Replies, effect: Effect) -> Result<Effect, CliError> {
    match effect {
        Effect::Ask(request) => {
            let client = client.clone();
            let replies = replies.clone();
            tokio::spawn(async move { replies.send(client.generate(&request).await) });
            Ok(Effect::Message("thinking... (keep drawing; the reply shows up when ready)".to_string()))
        }
        Effect::Publish { creator, artwork } => {
            println!("publishing...");
            let body = PublishBody { creator_name: &creator, artwork_name: &artwork, grid: session.editor.grid() };
            let receipt = client.publish(&body).await?;
            session.finish_publish(&creator, &artwork, &receipt)
        }
        Effect::Import(link) => {
            let id = artwork_id(&link).ok_or_else(|| CliError::Usage(format!("not an artwork link: {link}")))?;
            let file = client.artwork_grid(id).await?;
            Ok(session.finish_import(file))
        }
        Effect::Gallery(query) => {
            let items = client.gallery(DEFAULT_GALLERY_PAGE, query.as_deref()).await?;
            Ok(Effect::Message(format_gallery(&items)))
        }
        other => Ok(other),
    }
}

fn show(session: &Session, effect: &Effect, plain: bool) {
    let draw = |session: &Session| {
        let grid = session.editor.grid();
        let rendered = if plain { render::render_plain(grid) } else { render::render_ansi(grid) };
        print!("{rendered}");
    };
    match effect {
        Effect::Redraw(message) => {
            draw(session);
            if let Some(message) = message {
                println!("{message}");
            }
        }
        Effect::Message(message) => println!("{message}"),
        _ => {}
    }
}
