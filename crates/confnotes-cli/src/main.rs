mod config;
mod headless;
mod logging;
mod ui;

use std::env;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use confnotes_core::Config;
use confnotes_core::NoteId;
use confnotes_core::RATING_MAX;
use confnotes_core::RATING_MIN;
use confnotes_core::RepositoryConfig;
use confnotes_core::RepositoryKind;
use confnotes_exec::demo_notes;
use confnotes_exec::EffectExecutor;
use confnotes_exec::InMemoryNoteRepository;
use confnotes_exec::JsonFileNoteRepository;
use confnotes_exec::NoteRepository;
use confnotes_exec::RepositoryError;
use thiserror::Error;
use tracing::info;

use crate::headless::NoteFields;
use crate::logging::LogTarget;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error("cannot read config {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("logging setup failed: {0}")]
    Logging(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("{0}")]
    Load(String),

    #[error("{0}")]
    Mutation(String),

    #[error("no note with id {0}")]
    UnknownNote(NoteId),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Default, PartialEq, Eq)]
struct GlobalArgs {
    config: Option<PathBuf>,
    store: Option<PathBuf>,
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Help,
    Version,
    Tui,
    List { json: bool },
    Add(NoteFields),
    Edit { id: NoteId, fields: NoteFields },
    Delete { id: NoteId },
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), CliError> {
    let (globals, command) = parse_args(env::args().skip(1).collect())?;
    match command {
        Command::Help => {
            print_help();
            return Ok(());
        }
        Command::Version => {
            println!("confnotes {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        _ => {}
    }

    let mut config = config::load_config(globals.config.as_deref())?;
    config::apply_store_override(&mut config, globals.store);
    logging::init(&config.logging, log_target(&config, &command))?;
    let executor = build_executor(&config.repository)?;
    info!(
        repository = executor.repository().name(),
        stale_responses = config.behavior.stale_responses.label(),
        "starting {}",
        command_name(&command)
    );

    if command == Command::Tui {
        return ui::run(&config, executor);
    }
    let options = config.behavior;
    let mut stdout = io::stdout().lock();
    match command {
        Command::List { json } => headless::list(options, executor, json, &mut stdout),
        Command::Add(fields) => headless::add(options, executor, &fields, &mut stdout),
        Command::Edit { id, fields } => headless::edit(options, executor, id, &fields, &mut stdout),
        Command::Delete { id } => headless::delete(options, executor, id, &mut stdout),
        Command::Help | Command::Version | Command::Tui => Ok(()),
    }
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Help => "help",
        Command::Version => "version",
        Command::Tui => "tui",
        Command::List { .. } => "list",
        Command::Add(_) => "add",
        Command::Edit { .. } => "edit",
        Command::Delete { .. } => "delete",
    }
}

fn log_target(config: &Config, command: &Command) -> LogTarget {
    match (&config.logging.file, command) {
        (Some(path), _) => LogTarget::File(path.clone()),
        (None, Command::Tui) => LogTarget::File(config::default_log_path()),
        (None, _) => LogTarget::Stderr,
    }
}

fn build_executor(repository: &RepositoryConfig) -> Result<EffectExecutor, CliError> {
    let store: Arc<dyn NoteRepository> = match repository.kind {
        RepositoryKind::Memory => Arc::new(InMemoryNoteRepository::seeded(demo_notes())),
        RepositoryKind::JsonFile => {
            let path = repository
                .path
                .clone()
                .unwrap_or_else(config::default_store_path);
            Arc::new(JsonFileNoteRepository::open(path, Vec::new())?)
        }
    };
    Ok(EffectExecutor::new(store).with_latency(Duration::from_millis(repository.latency_ms)))
}

fn parse_args(args: Vec<String>) -> Result<(GlobalArgs, Command), CliError> {
    let mut globals = GlobalArgs::default();
    let mut rest = Vec::new();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                globals.config = Some(PathBuf::from(flag_value(&args, i)?));
                i += 2;
            }
            "--store" => {
                globals.store = Some(PathBuf::from(flag_value(&args, i)?));
                i += 2;
            }
            _ => {
                rest.push(args[i].clone());
                i += 1;
            }
        }
    }

    let Some((name, rest)) = rest.split_first() else {
        return Ok((globals, Command::Help));
    };
    let command = match name.as_str() {
        "--help" | "-h" | "help" => Command::Help,
        "--version" | "-V" | "version" => Command::Version,
        "tui" => {
            expect_no_args(rest)?;
            Command::Tui
        }
        "list" => match rest {
            [] => Command::List { json: false },
            [flag] if flag == "--json" => Command::List { json: true },
            [other, ..] => return Err(unsupported(other)),
        },
        "add" => {
            let fields = parse_note_fields(rest)?;
            if fields.title.is_none() {
                return Err(CliError::Usage("add requires --title".to_string()));
            }
            Command::Add(fields)
        }
        "edit" => {
            let (id, rest) = parse_id(name, rest)?;
            let fields = parse_note_fields(rest)?;
            if fields.is_empty() {
                return Err(CliError::Usage(
                    "edit needs at least one of --title, --presenter, --rating, --body".to_string(),
                ));
            }
            Command::Edit { id, fields }
        }
        "delete" => {
            let (id, rest) = parse_id(name, rest)?;
            expect_no_args(rest)?;
            Command::Delete { id }
        }
        other => {
            print_help();
            return Err(CliError::Usage(format!("unknown command: {other}")));
        }
    };
    Ok((globals, command))
}

fn flag_value(args: &[String], i: usize) -> Result<&str, CliError> {
    args.get(i + 1)
        .map(String::as_str)
        .ok_or_else(|| CliError::Usage(format!("{} requires a value", args[i])))
}

fn unsupported(arg: &str) -> CliError {
    CliError::Usage(format!("unsupported argument: {arg}"))
}

fn expect_no_args(rest: &[String]) -> Result<(), CliError> {
    match rest.first() {
        Some(other) => Err(unsupported(other)),
        None => Ok(()),
    }
}

fn parse_id<'a>(command: &str, rest: &'a [String]) -> Result<(NoteId, &'a [String]), CliError> {
    let Some((raw, rest)) = rest.split_first() else {
        return Err(CliError::Usage(format!("{command} requires a note id")));
    };
    match raw.parse::<u64>() {
        Ok(id) if id > 0 => Ok((NoteId(id), rest)),
        _ => Err(CliError::Usage(format!("invalid note id: {raw}"))),
    }
}

fn parse_note_fields(args: &[String]) -> Result<NoteFields, CliError> {
    let mut fields = NoteFields::default();
    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        if !matches!(flag, "--title" | "--presenter" | "--body" | "--rating") {
            return Err(unsupported(flag));
        }
        let value = flag_value(args, i)?.to_string();
        match flag {
            "--title" => fields.title = Some(value),
            "--presenter" => fields.presenter = Some(value),
            "--body" => fields.body = Some(value),
            _ => match value.parse::<u8>() {
                Ok(rating) if (RATING_MIN..=RATING_MAX).contains(&rating) => {
                    fields.rating = Some(rating)
                }
                _ => {
                    return Err(CliError::Usage(format!(
                        "rating must be between {RATING_MIN} and {RATING_MAX}, got {value}"
                    )))
                }
            },
        }
        i += 2;
    }
    Ok(fields)
}

fn print_help() {
    println!("confnotes: take notes on conference sessions");
    println!();
    println!("Usage:");
    println!("  confnotes [--config PATH] [--store PATH] <command>");
    println!();
    println!("Commands:");
    println!("  tui                      Open the interactive notes screen");
    println!("  list [--json]            Print all notes");
    println!("  add --title T [--presenter P] [--rating N] [--body B]");
    println!("  edit ID [--title T] [--presenter P] [--rating N] [--body B]");
    println!("  delete ID");
    println!();
    println!("Options:");
    println!("  --config PATH            Config file (default: <config dir>/confnotes/config.toml)");
    println!("  --store PATH             Keep notes in a JSON file at PATH");
    println!("  -h, --help               Show this help");
    println!("  -V, --version            Show version");
    println!();
    println!("Set {}=debug for verbose logs.", logging::LOG_ENV);
}
