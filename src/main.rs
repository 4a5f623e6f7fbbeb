mod config;
mod store;
mod view;

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveTime, Utc};
use clap::{Parser, Subcommand};
use coparent_core::{
    ics, import_drafts, DateRange, EventDraft, EventKind, EventPatch, EventStore, Parent,
    Recurrence,
};
use store::JsonStore;

#[derive(Parser)]
#[command(name = "coparent-cli")]
#[command(about = "Coordinate a shared custody calendar: month views, recurring schedules, and .ics import/export")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import events from an .ics file
    Import {
        /// Path to the .ics file
        file: String,

        /// Parent the imported events belong to (defaults to config)
        #[arg(short, long)]
        parent: Option<Parent>,
    },
    /// Export stored events to an .ics file
    Export {
        /// Output path (defaults to coparent-calendar-<today>.ics)
        #[arg(short, long)]
        out: Option<String>,

        /// Window start (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Window end (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
    },
    /// Render a month of the custody calendar
    Month {
        /// Month to render as YYYY-MM (defaults to the current month)
        month: Option<String>,
    },
    /// List every (day, event) occupancy pair in a window
    List {
        /// Window start (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Window end (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
    },
    /// Create a new event
    New {
        /// Event title
        title: String,

        /// First day of the event (YYYY-MM-DD)
        #[arg(short, long)]
        start: String,

        /// Last day of the event (defaults to the start day)
        #[arg(short, long)]
        end: Option<String>,

        /// Parent the event belongs to (defaults to config)
        #[arg(short, long)]
        parent: Option<Parent>,

        /// Event kind: custody, holiday, activity or travel
        #[arg(short, long, default_value = "custody")]
        kind: EventKind,

        /// Start time of day (HH:MM)
        #[arg(long, default_value = "09:00")]
        start_time: String,

        /// End time of day (HH:MM)
        #[arg(long, default_value = "10:00")]
        end_time: String,

        /// Recurrence: none, daily, weekly, biweekly, monthly, yearly or custom
        #[arg(short, long, default_value = "none")]
        recur: Recurrence,

        /// Recurrence interval (every N days/weeks/months/years)
        #[arg(long, default_value_t = 1)]
        interval: u32,

        /// Last date on which an occurrence may start (YYYY-MM-DD)
        #[arg(long)]
        until: Option<String>,

        /// Weekdays for weekly recurrence, 0=Sunday..6=Saturday (e.g. "1,3,5")
        #[arg(long)]
        days: Option<String>,

        /// Event description
        #[arg(long)]
        description: Option<String>,

        /// Event location
        #[arg(short, long)]
        location: Option<String>,

        /// Child this event applies to (absent = all children)
        #[arg(long)]
        child: Option<u64>,
    },
    /// Update fields of an existing event (recurrence changes take
    /// effect on the next expansion)
    Edit {
        /// Event id
        id: u64,

        #[arg(long)]
        title: Option<String>,

        /// First day of the event (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,

        /// Last day of the event (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,

        #[arg(long)]
        parent: Option<Parent>,

        #[arg(long)]
        kind: Option<EventKind>,

        #[arg(long)]
        recur: Option<Recurrence>,

        #[arg(long)]
        interval: Option<u32>,

        /// Last date on which an occurrence may start (YYYY-MM-DD)
        #[arg(long)]
        until: Option<String>,

        /// Weekdays for weekly recurrence, 0=Sunday..6=Saturday
        #[arg(long)]
        days: Option<String>,
    },
    /// Delete an event (removes all of its past and future occupancy)
    Delete {
        /// Event id
        id: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Import { file, parent } => cmd_import(&file, parent).await,
        Commands::Export { out, from, to } => cmd_export(out, from.as_deref(), to.as_deref()).await,
        Commands::Month { month } => cmd_month(month.as_deref()).await,
        Commands::List { from, to } => cmd_list(from.as_deref(), to.as_deref()).await,
        Commands::New {
            title,
            start,
            end,
            parent,
            kind,
            start_time,
            end_time,
            recur,
            interval,
            until,
            days,
            description,
            location,
            child,
        } => {
            cmd_new(NewArgs {
                title,
                start,
                end,
                parent,
                kind,
                start_time,
                end_time,
                recur,
                interval,
                until,
                days,
                description,
                location,
                child,
            })
            .await
        }
        Commands::Edit {
            id,
            title,
            start,
            end,
            parent,
            kind,
            recur,
            interval,
            until,
            days,
        } => {
            let patch = EventPatch {
                title,
                parent,
                kind,
                start_date: start.as_deref().map(parse_date).transpose()?,
                end_date: end.as_deref().map(parse_date).transpose()?,
                recurrence: recur,
                recurrence_interval: interval,
                recurrence_end: until.as_deref().map(parse_date).transpose()?.map(Some),
                recurrence_days: days.as_deref().map(parse_days).transpose()?,
                ..Default::default()
            };
            cmd_edit(id, patch).await
        }
        Commands::Delete { id } => cmd_delete(id).await,
    }
}

async fn cmd_edit(id: u64, patch: EventPatch) -> Result<()> {
    let mut store = open_store()?;
    let event = store.update_event(id, patch).await?;
    println!("Updated event #{}: {}", event.id, event.title);
    Ok(())
}

fn open_store() -> Result<JsonStore> {
    let cfg = config::load_config()?;
    let path = config::events_path(&cfg);
    JsonStore::open(path).context("Failed to open event store")
}

async fn cmd_import(file: &str, parent: Option<Parent>) -> Result<()> {
    let cfg = config::load_config()?;
    let parent = parent.unwrap_or(cfg.default_parent);

    // Validation gate first: extension and size, before any parsing.
    let metadata = std::fs::metadata(file)
        .with_context(|| format!("Cannot read {}", file))?;
    ics::validate_ics_file(file, metadata.len())?;

    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file))?;

    let parsed = ics::parse_ics(&content);
    if parsed.is_empty() {
        println!("No importable events found in {}", file);
        return Ok(());
    }

    let drafts = ics::to_event_drafts(&parsed, parent);
    let mut store = open_store()?;
    let outcome = import_drafts(&mut store, drafts).await;

    println!("{}", outcome.summary());
    Ok(())
}

async fn cmd_export(out: Option<String>, from: Option<&str>, to: Option<&str>) -> Result<()> {
    let window = DateRange::from_args(from, to)?;
    let store = open_store()?;
    let events = store.list_events(&window).await?;

    if events.is_empty() {
        println!("No events to export in this window.");
        return Ok(());
    }

    let content = ics::export_ics(&events)?;
    let path = out.unwrap_or_else(|| ics::export_filename(Utc::now().date_naive()));
    std::fs::write(&path, content).with_context(|| format!("Failed to write {}", path))?;

    println!("Exported {} events to {}", events.len(), path);
    Ok(())
}

async fn cmd_month(month: Option<&str>) -> Result<()> {
    let (year, month) = match month {
        Some(s) => parse_year_month(s)?,
        None => {
            let today = Utc::now().date_naive();
            (today.year(), today.month())
        }
    };

    let window = DateRange::month(year, month)?;
    let store = open_store()?;
    let events = store.list_events(&window).await?;

    print!("{}", view::render_month(year, month, &events)?);
    Ok(())
}

async fn cmd_list(from: Option<&str>, to: Option<&str>) -> Result<()> {
    let window = DateRange::from_args(from, to)?;
    let store = open_store()?;
    let events = store.list_events(&window).await?;

    print!("{}", view::render_agenda(&window, &events));
    Ok(())
}

struct NewArgs {
    title: String,
    start: String,
    end: Option<String>,
    parent: Option<Parent>,
    kind: EventKind,
    start_time: String,
    end_time: String,
    recur: Recurrence,
    interval: u32,
    until: Option<String>,
    days: Option<String>,
    description: Option<String>,
    location: Option<String>,
    child: Option<u64>,
}

async fn cmd_new(args: NewArgs) -> Result<()> {
    let cfg = config::load_config()?;

    let draft = EventDraft {
        title: args.title,
        description: args.description,
        location: args.location,
        child_id: args.child,
        parent: args.parent.unwrap_or(cfg.default_parent),
        kind: args.kind,
        start_date: parse_date(&args.start)?,
        end_date: args.end.as_deref().map(parse_date).transpose()?,
        start_time: parse_time(&args.start_time)?,
        end_time: parse_time(&args.end_time)?,
        time_zone: cfg.time_zone.clone(),
        recurrence: args.recur,
        recurrence_interval: args.interval,
        recurrence_end: args.until.as_deref().map(parse_date).transpose()?,
        recurrence_days: args.days.as_deref().map(parse_days).transpose()?.unwrap_or_default(),
    };

    let mut store = open_store()?;
    let event = store.create_event(draft).await?;

    println!("Created event #{}: {}", event.id, event.title);
    Ok(())
}

async fn cmd_delete(id: u64) -> Result<()> {
    let mut store = open_store()?;
    let title = store.get(id).map(|e| e.title.clone());
    store.delete_event(id).await?;

    match title {
        Some(title) => println!("Deleted event #{}: {}", id, title),
        None => println!("Deleted event #{}", id),
    }
    Ok(())
}

fn parse_date(s: &str) -> Result<chrono::NaiveDate> {
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}'. Expected YYYY-MM-DD", s))
}

fn parse_time(s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .with_context(|| format!("Invalid time '{}'. Expected HH:MM", s))
}

fn parse_year_month(s: &str) -> Result<(i32, u32)> {
    let (year, month) = s
        .split_once('-')
        .with_context(|| format!("Invalid month '{}'. Expected YYYY-MM", s))?;
    Ok((
        year.parse().with_context(|| format!("Invalid year in '{}'", s))?,
        month.parse().with_context(|| format!("Invalid month in '{}'", s))?,
    ))
}

fn parse_days(s: &str) -> Result<Vec<u8>> {
    s.split(',')
        .map(|part| {
            part.trim()
                .parse::<u8>()
                .with_context(|| format!("Invalid weekday index '{}'", part))
        })
        .collect()
}
