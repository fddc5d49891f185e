//! Dayplan CLI
//!
//! Manage the daily schedule and notes directly, or let a language model
//! edit them from a plain-language instruction.

use anyhow::{bail, Context};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use dayplan::persistence::migrate_legacy_tasks;
use dayplan::schedule::parse_time;
use dayplan::{
    config, gateway, Assistant, Insertion, JsonFileStore, NoteExecutor, NotePersistence,
    NoteStore, Priority, ScheduleExecutor, ScheduleStore, Task, TaskPersistence, TaskStatus,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Dayplan - daily schedule and notes with a language-model editor
#[derive(Parser, Debug)]
#[command(name = "dayplan")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to dayplan.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding tasks.json and notes.json
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Verbose output: log prompts and raw model replies
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List tasks for a date (today by default)
    Tasks {
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Only show tasks with this status, across all dates
        #[arg(long)]
        status: Option<String>,
    },
    /// Add a task, refusing overlaps unless --allow-overlap is given
    AddTask {
        description: String,
        /// Start time, HH:MM
        start: String,
        /// End time, HH:MM
        end: String,
        #[arg(long)]
        date: Option<NaiveDate>,
        /// HIGH, MEDIUM or LOW
        #[arg(long)]
        priority: Option<String>,
        #[arg(long)]
        allow_overlap: bool,
    },
    /// Set a task's status (PENDING, IN_PROGRESS, COMPLETED, CANCELLED)
    SetStatus { id: String, status: String },
    RemoveTask { id: String },
    /// List notes, newest first
    Notes,
    AddNote {
        #[arg(required = true, trailing_var_arg = true)]
        text: Vec<String>,
    },
    DeleteNote { id: String },
    /// Ask the model to edit today's schedule
    EditSchedule {
        #[arg(required = true, trailing_var_arg = true)]
        instruction: Vec<String>,
    },
    /// Ask the model to edit the notes
    EditNotes {
        #[arg(required = true, trailing_var_arg = true)]
        instruction: Vec<String>,
    },
    /// Chat with the model without touching any data
    Chat {
        #[arg(required = true, trailing_var_arg = true)]
        message: Vec<String>,
    },
    /// Run a schedule action JSON object without calling the model
    ApplySchedule {
        json: String,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Run a note action JSON object without calling the model
    ApplyNotes { json: String },
    /// Convert a legacy tasks.txt in the data directory to tasks.json
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = config::load(cli.config.as_deref())?;
    if let Some(data_dir) = cli.data_dir {
        config = config.with_data_dir(data_dir);
    }
    info!("Data directory: {:?}", config.data_dir);

    let files = Arc::new(JsonFileStore::new(&config.data_dir));
    if let Command::Migrate = cli.command {
        let migrated = migrate_legacy_tasks(&config.data_dir)?;
        println!("Migrated {migrated} tasks");
        return Ok(());
    }

    let mut schedule = ScheduleStore::new();
    let restored_tasks = schedule.load_from(&*files)?;
    let mut notes = NoteStore::new();
    let restored_notes = notes.load_from(&*files)?;
    debug!("Loaded {} tasks and {} notes", restored_tasks, restored_notes);

    let today = Local::now().date_naive();

    match cli.command {
        Command::Tasks { date, status } => {
            let tasks = match status {
                Some(status) => schedule.get_tasks_by_status(status.parse()?),
                None => schedule.get_tasks_for_date(date.unwrap_or(today)),
            };
            print_tasks(&tasks);
        }
        Command::AddTask {
            description,
            start,
            end,
            date,
            priority,
            allow_overlap,
        } => {
            let priority = match priority {
                Some(raw) => match Priority::parse(&raw) {
                    Some(priority) => priority,
                    None => bail!("Unknown priority '{raw}', expected HIGH, MEDIUM or LOW"),
                },
                None => Priority::default(),
            };
            let insertion = schedule.add_task(
                &description,
                parse_time(&start)?,
                parse_time(&end)?,
                date.unwrap_or(today),
                allow_overlap,
            )?;
            match insertion {
                Insertion::Added(task) => {
                    schedule.update_task_priority(&task.id, priority);
                    files.save_tasks(&schedule.get_all_tasks())?;
                    println!("Added task {} ({})", task.id, task.time_range());
                }
                Insertion::Conflict { existing_id } => {
                    bail!("Time slot conflicts with task {existing_id}")
                }
            }
        }
        Command::SetStatus { id, status } => {
            let status: TaskStatus = status.parse()?;
            if !schedule.update_task_status(&id, status) {
                bail!("Could not find task with ID: {id}");
            }
            files.save_tasks(&schedule.get_all_tasks())?;
            println!("Task {id} is now {status}");
        }
        Command::RemoveTask { id } => {
            if !schedule.remove_task(&id) {
                bail!("Could not find task with ID: {id}");
            }
            files.save_tasks(&schedule.get_all_tasks())?;
            println!("Removed task {id}");
        }
        Command::Notes => println!("{}", notes.render_listing()),
        Command::AddNote { text } => {
            let note = notes.add_note(&text.join(" "))?;
            files.save_notes(&notes.get_all_notes())?;
            println!("Added note {}", note.id);
        }
        Command::DeleteNote { id } => {
            if !notes.delete_note(&id) {
                bail!("Could not find note with ID: {id}");
            }
            files.save_notes(&notes.get_all_notes())?;
            println!("Deleted note {id}");
        }
        Command::ApplySchedule { json, date } => {
            let executor = ScheduleExecutor::new(dayplan::schedule::shared(schedule), files.clone());
            println!("{}", executor.execute(&json, date.unwrap_or(today)));
        }
        Command::ApplyNotes { json } => {
            let executor = NoteExecutor::new(dayplan::notes::shared(notes), files.clone());
            println!("{}", executor.execute(&json));
        }
        Command::EditSchedule { instruction } => {
            let assistant = build_assistant(&config, schedule, notes, files)?;
            println!(
                "{}",
                assistant.edit_schedule(&instruction.join(" "), today).await
            );
        }
        Command::EditNotes { instruction } => {
            let assistant = build_assistant(&config, schedule, notes, files)?;
            println!("{}", assistant.edit_notes(&instruction.join(" ")).await);
        }
        Command::Chat { message } => {
            let assistant = build_assistant(&config, schedule, notes, files)?;
            println!("{}", assistant.chat(&message.join(" ")).await);
        }
        Command::Migrate => {}
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn build_assistant(
    config: &dayplan::DayplanConfig,
    schedule: ScheduleStore,
    notes: NoteStore,
    files: Arc<JsonFileStore>,
) -> anyhow::Result<Assistant> {
    let gateway = gateway::from_config(config).context("cannot reach a language model")?;
    info!("{}", gateway.describe());
    Ok(Assistant::new(
        gateway,
        ScheduleExecutor::new(dayplan::schedule::shared(schedule), files.clone()),
        NoteExecutor::new(dayplan::notes::shared(notes), files),
    ))
}

fn print_tasks(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("No tasks.");
        return;
    }
    for task in tasks {
        println!(
            "{}  {}  {}  [{} / {}]  {}",
            task.date, task.time_range(), task.id, task.status, task.priority, task.description
        );
    }
}
