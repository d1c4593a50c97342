use std::{
    fs, io,
    path::{Path, PathBuf},
};

use anyhow::{ensure, Context};
use clap::{Args, Parser, Subcommand};
use shot_engine::{
    aggregate_totals, get_rounds, renumber, resolve_group, DirectionPolicy, EditorOptions, SessionEditor, MAX_ROUNDS,
};
use shot_schema::{Direction, Session, SessionDraft};
use shot_store::{load_sessions_from_path, JsonFileStore, SessionStore};
use tracing_subscriber::EnvFilter;

mod cell_spec;
mod report;

#[derive(Debug, Parser)]
#[command(name = "shot")]
#[command(about = "Shooting practice log", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct StoreArgs {
    /// Sessions file (JSON array)
    #[arg(long, env = "SHOT_STORE")]
    store: PathBuf,
    #[arg(long)]
    user: String,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sessions with their totals, newest first
    List {
        #[command(flatten)]
        store: StoreArgs,
        #[arg(long)]
        json: bool,
    },
    /// Rounds and per-zone totals of one session
    Show {
        #[command(flatten)]
        store: StoreArgs,
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// Zone labels of a group in display order
    Zones {
        group: String,
        #[arg(short, long, default_value = "ltr")]
        direction: String,
    },
    /// Enter a session through the round grid and save it
    Log {
        #[command(flatten)]
        store: StoreArgs,
        /// Edit this session instead of creating one
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long = "type")]
        training_type: Option<String>,
        #[arg(long)]
        group: Option<String>,
        #[arg(long)]
        rounds: Option<u32>,
        /// One value turns the whole grid; several set each round in turn
        #[arg(long = "direction", value_delimiter = ',')]
        directions: Vec<String>,
        #[arg(long)]
        auto_fill: bool,
        /// ROUND:ZONE=ATTEMPTS[/MADE], rounds numbered from 1
        #[arg(long = "cell")]
        cells: Vec<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Rewrite sessions with canonical rounds (legacy zone maps converted)
    Normalize {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let cli = Cli::parse();

    match cli.command {
        Command::List { store, json } => {
            let sessions = JsonFileStore::new(&store.store)
                .load(&store.user)
                .with_context(|| format!("failed to load sessions: {}", store.store.display()))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report::list_json(&sessions))?);
            } else {
                print!("{}", report::list_table(&sessions));
            }
        }
        Command::Show { store, id, json } => {
            let sessions = JsonFileStore::new(&store.store)
                .load(&store.user)
                .with_context(|| format!("failed to load sessions: {}", store.store.display()))?;
            let session = sessions
                .iter()
                .find(|s| s.id == id)
                .with_context(|| format!("no session {id} for user {}", store.user))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report::session_json(session))?);
            } else {
                print!("{}", report::session_detail(session));
            }
        }
        Command::Zones { group, direction } => {
            let zones = shot_engine::ordered_zones_for(&group, &direction);
            for (i, zone) in zones.iter().enumerate() {
                println!("{}. {zone}", i + 1);
            }
        }
        Command::Log {
            store,
            id,
            date,
            training_type,
            group,
            rounds,
            directions,
            auto_fill,
            cells,
            notes,
        } => {
            let directions: Vec<Direction> = directions.iter().map(|d| Direction::parse(d)).collect();
            let mut options = EditorOptions {
                auto_fill,
                direction_policy: if directions.len() > 1 {
                    DirectionPolicy::PerBucket
                } else {
                    DirectionPolicy::Shared
                },
                ..EditorOptions::default()
            };
            if let Some(t) = &training_type {
                options.training_type = t.clone();
            }
            if let Some(g) = &group {
                options.zone_group = resolve_group(g);
            }

            if let Some(n) = rounds {
                ensure!(
                    (1..=MAX_ROUNDS).contains(&n),
                    "--rounds must be between 1 and {MAX_ROUNDS}, got {n}"
                );
            }

            let mut file_store = JsonFileStore::new(&store.store);
            let stored = match &id {
                Some(id) => {
                    let sessions = file_store
                        .load(&store.user)
                        .with_context(|| format!("failed to load sessions: {}", store.store.display()))?;
                    let session = sessions
                        .into_iter()
                        .find(|s| s.id == *id)
                        .with_context(|| format!("no session {id} for user {}", store.user))?;
                    Some(session)
                }
                None => None,
            };
            let mut editor = match &stored {
                Some(session) => SessionEditor::edit(session, &options),
                None => SessionEditor::new(&options),
            };

            if let Some(date) = date {
                editor.set_date(date);
            }
            if let Some(t) = training_type {
                editor.set_training_type(t);
            }
            if group.is_some() {
                editor.set_zone_group(options.zone_group);
            }
            if let Some(notes) = notes {
                editor.set_notes(notes);
            }

            let reshaped = rounds.is_some() || !directions.is_empty() || !cells.is_empty();
            match editor.grid_mut() {
                Some(grid) => {
                    if let Some(n) = rounds {
                        grid.set_rounds_count(n);
                    }
                    for (bucket, direction) in directions.into_iter().enumerate() {
                        let bucket = u32::try_from(bucket)?;
                        grid.set_direction(bucket, direction)
                            .with_context(|| format!("cannot set direction of round {}", bucket + 1))?;
                    }
                    for spec in &cells {
                        let cell = cell_spec::parse_cell(spec)?;
                        cell_spec::apply_cell(grid, &cell)
                            .with_context(|| format!("cannot apply --cell {spec}"))?;
                    }
                }
                None => ensure!(
                    !reshaped,
                    "session {} does not fit the round grid; only --date, --type, --group and --notes can change it",
                    id.as_deref().unwrap_or_default()
                ),
            }

            let draft = editor.begin_save().context("session is not valid")?;
            if let Some(session) = &stored {
                if let Err(e) = ensure_keeps_stored_rounds(session, &draft, rounds.is_some(), !cells.is_empty()) {
                    editor.finish_save(None);
                    return Err(e);
                }
            }
            let saved = file_store.save(&store.user, editor.session_id(), &draft);
            match saved {
                Ok(saved_id) => {
                    editor.finish_save(Some(&saved_id));
                    let totals = editor.totals();
                    println!("saved {saved_id}: {}", report::totals_line(&totals));
                }
                Err(e) => {
                    editor.finish_save(None);
                    return Err(e).context("failed to save session");
                }
            }
        }
        Command::Normalize { input, output } => {
            let mut sessions = load_sessions_from_path(&input)
                .with_context(|| format!("failed to load: {}", input.display()))?;
            for session in &mut sessions {
                session.rounds = get_rounds(session);
                renumber(&mut session.rounds);
                session.zones = None;
            }
            let json = serde_json::to_string_pretty(&sessions).context("failed to serialize sessions")?;
            let out_path = output.unwrap_or_else(|| default_output_path(&input));
            fs::write(&out_path, json)
                .with_context(|| format!("failed to write: {}", out_path.display()))?;
            println!("{} sessions -> {}", sessions.len(), out_path.display());
        }
    }

    Ok(())
}

/// An edit may only lose stored rounds when the command asked for it:
/// `--rounds` to shrink, `--cell` to re-enter values.
fn ensure_keeps_stored_rounds(
    stored: &Session,
    draft: &SessionDraft,
    resized: bool,
    edited: bool,
) -> anyhow::Result<()> {
    let before = get_rounds(stored);
    if !resized {
        ensure!(
            draft.rounds.len() >= before.len(),
            "saving would drop {} of {} stored rounds; pass --rounds to shrink the session",
            before.len() - draft.rounds.len(),
            before.len()
        );
    }
    if !edited {
        let (was, now) = (aggregate_totals(&before), aggregate_totals(&draft.rounds));
        ensure!(
            (was.attempts, was.made) == (now.attempts, now.made),
            "saving would change stored totals from {}/{} to {}/{}; pass --cell to re-enter values",
            was.made,
            was.attempts,
            now.made,
            now.attempts
        );
    }
    Ok(())
}

fn default_output_path(input: &Path) -> PathBuf {
    let mut out = input.to_path_buf();
    out.set_extension("normalized.json");
    out
}
