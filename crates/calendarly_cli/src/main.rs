//! Command-line front end over the scheduling controller.
//!
//! Every subcommand opens the SQLite file, loads the affected month and
//! issues exactly one controller intent.

use anyhow::{Context, Result};
use calendarly_core::config::DEFAULT_DB_FILE_NAME;
use calendarly_core::db::open_db;
use calendarly_core::{
    default_log_level, format_minutes, init_logging, minutes_since_midnight, month_grid, Category,
    Event, EventCandidate, EventId, EventStore, ExportFormat, KvEventStore, SchedulingController,
    SchedulingRules, SqliteKv,
};
use chrono::{Datelike, Local, NaiveDate};
use clap::{Parser, Subcommand};
use log::info;
use rusqlite::Connection;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "calendarly")]
#[command(about = "Schedule, move and export non-overlapping calendar events")]
struct Cli {
    /// SQLite file holding the event collection
    #[arg(long, default_value = DEFAULT_DB_FILE_NAME)]
    db: PathBuf,

    /// Absolute directory for rotated log files; logging is off when omitted
    #[arg(long)]
    log_dir: Option<String>,

    /// trace|debug|info|warn|error
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a month grid followed by its events
    Month {
        /// Defaults to the current year
        #[arg(long)]
        year: Option<i32>,

        /// 1-12, defaults to the current month
        #[arg(long)]
        month: Option<u32>,

        /// Only show events whose title or description contains this text
        #[arg(long)]
        filter: Option<String>,
    },
    /// Create an event
    Add {
        title: String,

        /// Day of the event (YYYY-MM-DD)
        #[arg(short, long, value_parser = parse_date)]
        date: NaiveDate,

        /// Start time, e.g. "09:00" or "9:00 AM"
        #[arg(short, long)]
        start: String,

        /// End time; earlier than start means the event ends after midnight
        #[arg(short, long)]
        end: String,

        #[arg(short, long, default_value_t = Category::Other)]
        category: Category,

        #[arg(long)]
        description: Option<String>,

        /// Explicit id; a fresh one is generated when omitted
        #[arg(long)]
        id: Option<String>,
    },
    /// Change fields of an existing event
    Edit {
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,

        #[arg(long)]
        start: Option<String>,

        #[arg(long)]
        end: Option<String>,

        #[arg(long)]
        category: Option<Category>,

        #[arg(long)]
        description: Option<String>,
    },
    /// Move an event to another day, keeping its times
    Move {
        id: String,

        #[arg(long, value_parser = parse_date)]
        from: NaiveDate,

        #[arg(long, value_parser = parse_date)]
        to: NaiveDate,
    },
    /// Delete an event; unknown ids are ignored
    Delete { id: String },
    /// Write a month's events to `events_<year>_<month>.<ext>`
    Export {
        #[arg(long)]
        year: i32,

        #[arg(long)]
        month: u32,

        /// json or csv
        #[arg(short, long, default_value = "json")]
        format: ExportFormat,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Self::Month { .. } => "month",
            Self::Add { .. } => "add",
            Self::Edit { .. } => "edit",
            Self::Move { .. } => "move",
            Self::Delete { .. } => "delete",
            Self::Export { .. } => "export",
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir).context("failed to start logging")?;
    }

    let conn = open_db(&cli.db)
        .with_context(|| format!("failed to open {}", cli.db.display()))?;
    info!("event=cli_command module=cli status=start command={}", cli.command.name());

    match cli.command {
        Commands::Month {
            year,
            month,
            filter,
        } => {
            let today = Local::now().date_naive();
            let year = year.unwrap_or(today.year());
            let month = month.unwrap_or(today.month());
            show_month(&conn, year, month, filter.as_deref())
        }
        Commands::Add {
            title,
            date,
            start,
            end,
            category,
            description,
            id,
        } => {
            let id = id.map_or_else(EventId::generate, EventId::from);
            let mut candidate = EventCandidate::from_clock(id, title, date, &start, &end)?
                .with_category(category);
            if let Some(description) = description {
                candidate = candidate.with_description(description);
            }
            let mut controller = controller_for(&conn, date)?;
            let event = controller.create(&candidate)?;
            println!("created {}", describe(&event));
            Ok(())
        }
        Commands::Edit {
            id,
            title,
            date,
            start,
            end,
            category,
            description,
        } => {
            let id = EventId::from(id);
            let store = KvEventStore::new(SqliteKv::new(&conn));
            let existing = store
                .get(&id)?
                .with_context(|| format!("event not found: {id}"))?;

            let mut candidate = EventCandidate::from_event(&existing);
            if let Some(title) = title {
                candidate.title = title;
            }
            if let Some(date) = date {
                candidate.day = date;
            }
            if let Some(start) = start {
                candidate.start = minutes_since_midnight(&start, None)?;
            }
            if let Some(end) = end {
                candidate.end = minutes_since_midnight(&end, None)?;
            }
            if let Some(category) = category {
                candidate.category = category;
            }
            if let Some(description) = description {
                candidate.description = Some(description);
            }

            let mut controller = controller_for(&conn, candidate.day)?;
            let event = controller.edit(&candidate)?;
            println!("updated {}", describe(&event));
            Ok(())
        }
        Commands::Move { id, from, to } => {
            let mut controller = controller_for(&conn, from)?;
            let event = controller.move_event(&EventId::from(id), from, to)?;
            println!("moved {}", describe(&event));
            Ok(())
        }
        Commands::Delete { id } => {
            let today = Local::now().date_naive();
            let mut controller = controller_for(&conn, today)?;
            controller.delete(&EventId::from(id))?;
            Ok(())
        }
        Commands::Export {
            year,
            month,
            format,
            out,
        } => export_month(&conn, year, month, format, &out),
    }
}

type Controller<'conn> = SchedulingController<KvEventStore<SqliteKv<'conn>>>;

fn controller_for(conn: &Connection, day: NaiveDate) -> Result<Controller<'_>> {
    controller_for_month(conn, day.year(), day.month())
}

fn show_month(conn: &Connection, year: i32, month: u32, filter: Option<&str>) -> Result<()> {
    let controller = controller_for_month(conn, year, month)?;
    print_grid(&controller, year, month)?;

    let events = match filter {
        Some(text) => controller.filter(text),
        None => controller.month_events(),
    };
    if events.is_empty() {
        println!("\nNo events.");
        return Ok(());
    }

    println!();
    let mut current_day = None;
    for event in &events {
        if current_day != Some(event.day()) {
            current_day = Some(event.day());
            println!("{}", event.day().format("%a %b %-d"));
        }
        println!("  {}", describe(event));
    }
    Ok(())
}

fn controller_for_month(conn: &Connection, year: i32, month: u32) -> Result<Controller<'_>> {
    Ok(SchedulingController::new(
        KvEventStore::new(SqliteKv::new(conn)),
        SchedulingRules::default(),
        year,
        month,
    )?)
}

fn print_grid(controller: &Controller<'_>, year: i32, month: u32) -> Result<()> {
    let cells = month_grid(year, month)?;
    println!("{year}-{month:02}");
    println!(" Su  Mo  Tu  We  Th  Fr  Sa");
    for week in cells.chunks(7) {
        let line = week
            .iter()
            .map(|cell| match cell {
                Some(day) if !controller.events_for_day(*day).is_empty() => {
                    format!("{:>2}*", day.day())
                }
                Some(day) => format!("{:>2} ", day.day()),
                None => "   ".to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ");
        println!("{line}");
    }
    Ok(())
}

fn export_month(
    conn: &Connection,
    year: i32,
    month: u32,
    format: ExportFormat,
    out: &Path,
) -> Result<()> {
    let controller = controller_for_month(conn, year, month)?;
    let file = controller.export(format)?;
    let path = out.join(&file.file_name);
    std::fs::write(&path, file.content)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("wrote {} ({})", path.display(), file.content_type);
    Ok(())
}

fn describe(event: &Event) -> String {
    format!(
        "{}-{}  {} [{}] ({})",
        format_minutes(event.start_minutes()),
        format_minutes(event.end_minutes()),
        event.title,
        event.category,
        event.id
    )
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|err| format!("`{value}` is not YYYY-MM-DD: {err}"))
}
