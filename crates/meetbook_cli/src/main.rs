//! Meetbook command-line entry point.
//!
//! # Responsibility
//! - Parse arguments and configuration (flags or `MEETBOOK_*` env vars).
//! - Load the saved contact book, run one operation, save it back.
//! - Render contacts and meetings for humans.
//!
//! All rules live in `meetbook_core`; this binary only translates input and
//! output.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use clap::{Args, Parser, Subcommand};
use log::info;
use meetbook_core::db::open_db;
use meetbook_core::{
    core_version, default_log_level, init_logging, Classification, Clock, ContactId,
    ContactManager, ManualClock, Meeting, MeetingId, SnapshotRepository,
    SqliteSnapshotRepository, SystemClock,
};
use std::io::Write;
use std::path::{Path, PathBuf};

const DATE_FORMAT: &str = "%d-%m-%Y";
const TIME_FORMAT: &str = "%H:%M";

#[derive(Parser, Debug)]
#[command(name = "meetbook")]
#[command(version = core_version())]
#[command(about = "Contact book and meeting scheduler", long_about = None)]
struct Cli {
    /// SQLite file holding the contact book
    #[arg(long, env = "MEETBOOK_DB", default_value = "meetbook.sqlite3", global = true)]
    db: PathBuf,

    /// Absolute directory for rolling log files (logging is off when unset)
    #[arg(long, env = "MEETBOOK_LOG_DIR", global = true)]
    log_dir: Option<PathBuf>,

    /// Log level: trace|debug|info|warn|error
    #[arg(long, env = "MEETBOOK_LOG_LEVEL", global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage contacts
    Contact {
        #[command(subcommand)]
        action: ContactAction,
    },
    /// Manage meetings
    Meeting {
        #[command(subcommand)]
        action: MeetingAction,
    },
    /// Print every contact and meeting
    Dump,
    /// Delete the contact book file
    Reset,
}

#[derive(Subcommand, Debug)]
enum ContactAction {
    /// Add a contact
    Add {
        name: String,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Find contacts by id or by name substring (all when no filter is given)
    Find {
        #[arg(long = "id", conflicts_with = "name")]
        ids: Vec<ContactId>,
        #[arg(long)]
        name: Option<String>,
    },
    /// Append notes to a contact
    Note { id: ContactId, text: String },
}

#[derive(Subcommand, Debug)]
enum MeetingAction {
    /// Add a meeting; dates up to now are recorded as past meetings
    Add {
        #[command(flatten)]
        when: When,
        /// Participating contact ids
        #[arg(long = "contact", required = true)]
        contacts: Vec<ContactId>,
        /// Notes (past meetings only)
        #[arg(long)]
        notes: Option<String>,
    },
    /// Show one meeting
    Show { id: MeetingId },
    /// List meetings of one contact
    List {
        #[arg(long)]
        contact: ContactId,
        /// List past meetings instead of future ones
        #[arg(long)]
        past: bool,
    },
    /// List meetings falling on one day
    On {
        /// Day in dd-mm-yyyy format
        date: String,
    },
    /// Add notes to a meeting, moving it to the past once it has happened
    Note { id: MeetingId, text: String },
}

#[derive(Args, Debug)]
struct When {
    /// Day in dd-mm-yyyy format
    #[arg(long)]
    date: String,
    /// Time of day in HH:MM (UTC); defaults to the current hour at :59
    #[arg(long)]
    time: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Some(log_dir) = &cli.log_dir {
        let level = cli.log_level.as_deref().unwrap_or_else(|| default_log_level());
        init_logging(level, &log_dir.to_string_lossy()).context("failed to start logging")?;
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run(cli, &SystemClock, &mut out)
}

/// Runs one command against the contact book.
///
/// `clock` is read once; the whole command sees that single instant.
fn run(cli: Cli, clock: &impl Clock, out: &mut impl Write) -> Result<()> {
    if matches!(cli.command, Commands::Reset) {
        return reset(&cli.db, out);
    }

    let conn = open_db(&cli.db)
        .with_context(|| format!("failed to open contact book `{}`", cli.db.display()))?;
    let repo = SqliteSnapshotRepository::try_new(&conn)?;
    let frozen = ManualClock::new(clock.now());
    let mut manager = ContactManager::from_snapshot(repo.load_snapshot()?, frozen)?;

    let changed = execute(&mut manager, cli.command, out)?;
    if changed {
        repo.save_snapshot(&manager.snapshot())?;
        info!("event=cli_save module=cli status=ok");
    }
    Ok(())
}

/// Runs one command; returns whether state changed and must be saved.
fn execute<C: Clock>(
    manager: &mut ContactManager<C>,
    command: Commands,
    out: &mut impl Write,
) -> Result<bool> {
    match command {
        Commands::Contact { action } => execute_contact(manager, action, out),
        Commands::Meeting { action } => execute_meeting(manager, action, out),
        Commands::Dump => {
            dump(manager, out)?;
            Ok(false)
        }
        Commands::Reset => bail!("reset is handled before the contact book is opened"),
    }
}

fn execute_contact<C: Clock>(
    manager: &mut ContactManager<C>,
    action: ContactAction,
    out: &mut impl Write,
) -> Result<bool> {
    match action {
        ContactAction::Add { name, notes } => {
            let id = manager.add_contact(Some(name.as_str()), Some(notes.as_str()))?;
            writeln!(out, "Contact added with id {id}.")?;
            Ok(true)
        }
        ContactAction::Find { ids, name } => {
            let found = if ids.is_empty() {
                manager.contacts_by_name(Some(name.as_deref().unwrap_or("")))?
            } else {
                manager.contacts_by_ids(&ids)?
            };
            if found.is_empty() {
                writeln!(out, "No contact found.")?;
            }
            for contact in found {
                writeln!(out, "{contact}")?;
            }
            Ok(false)
        }
        ContactAction::Note { id, text } => {
            manager.add_contact_notes(id, Some(text.as_str()))?;
            writeln!(out, "Notes added to contact {id}.")?;
            Ok(true)
        }
    }
}

fn execute_meeting<C: Clock>(
    manager: &mut ContactManager<C>,
    action: MeetingAction,
    out: &mut impl Write,
) -> Result<bool> {
    match action {
        MeetingAction::Add {
            when,
            contacts,
            notes,
        } => {
            let now = manager.clock().now();
            let date = parse_when(&when, now)?;
            let contacts = manager.contacts_by_ids(&contacts)?;
            let id = if date <= now {
                manager.add_past_meeting(
                    Some(&contacts),
                    Some(date),
                    Some(notes.as_deref().unwrap_or("")),
                )?
            } else {
                if notes.is_some() {
                    bail!("notes can only be recorded for meetings that already happened");
                }
                manager.add_future_meeting(&contacts, date)?
            };
            let classification = manager
                .classification(id)
                .map_or("unknown", Classification::as_str);
            writeln!(out, "Added {classification} meeting with id {id}.")?;
            Ok(true)
        }
        MeetingAction::Show { id } => {
            match manager.meeting(id) {
                Some(meeting) => writeln!(out, "{}", render_meeting(manager, &meeting))?,
                None => writeln!(out, "No meeting with id {id}.")?,
            }
            Ok(false)
        }
        MeetingAction::List { contact, past } => {
            let contact = manager
                .contact(contact)
                .with_context(|| format!("no contact with id {contact}"))?;
            let classification = if past {
                Classification::Past
            } else {
                Classification::Future
            };
            let meetings = manager.meetings_for_contact(&contact, classification)?;
            write_meetings(manager, &meetings, out)?;
            Ok(false)
        }
        MeetingAction::On { date } => {
            let day = parse_day(&date)?;
            let meetings = manager.meetings_on_day(day);
            write_meetings(manager, &meetings, out)?;
            Ok(false)
        }
        MeetingAction::Note { id, text } => {
            manager.add_meeting_notes(id, Some(text.as_str()))?;
            if let Some(meeting) = manager.past_meeting(id)? {
                writeln!(out, "{}", render_meeting(manager, &meeting))?;
            }
            Ok(true)
        }
    }
}

fn dump<C: Clock>(manager: &ContactManager<C>, out: &mut impl Write) -> Result<()> {
    let snapshot = manager.snapshot();
    writeln!(out, "Contacts:")?;
    for contact in &snapshot.contacts {
        writeln!(out, "  {contact}")?;
    }
    for (label, meetings) in [
        ("Past meetings:", &snapshot.past_meetings),
        ("Future meetings:", &snapshot.future_meetings),
    ] {
        writeln!(out, "{label}")?;
        for meeting in meetings {
            writeln!(out, "  {}", render_meeting(manager, meeting))?;
        }
    }
    Ok(())
}

fn reset(db: &Path, out: &mut impl Write) -> Result<()> {
    if !db.exists() {
        writeln!(out, "Nothing to delete at {}.", db.display())?;
        return Ok(());
    }
    std::fs::remove_file(db).with_context(|| format!("failed to delete `{}`", db.display()))?;
    info!("event=cli_reset module=cli status=ok");
    writeln!(out, "Deleted {}.", db.display())?;
    Ok(())
}

fn write_meetings<C: Clock>(
    manager: &ContactManager<C>,
    meetings: &[Meeting],
    out: &mut impl Write,
) -> Result<()> {
    if meetings.is_empty() {
        writeln!(out, "No meetings found.")?;
    }
    for meeting in meetings {
        writeln!(out, "{}", render_meeting(manager, meeting))?;
    }
    Ok(())
}

/// Formats a meeting followed by its participants' names.
fn render_meeting<C: Clock>(manager: &ContactManager<C>, meeting: &Meeting) -> String {
    let names = manager
        .meeting_contacts(meeting.id())
        .unwrap_or_default()
        .iter()
        .map(|contact| format!("{} ({})", contact.name(), contact.id()))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{meeting} with {names}")
}

fn parse_day(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT)
        .with_context(|| format!("invalid date `{text}`, expected dd-mm-yyyy"))
}

fn parse_when(when: &When, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let day = parse_day(&when.date)?;
    let time = match &when.time {
        Some(text) => NaiveTime::parse_from_str(text.trim(), TIME_FORMAT)
            .with_context(|| format!("invalid time `{text}`, expected HH:MM"))?,
        None => NaiveTime::from_hms_opt(now.hour(), 59, 0)
            .context("current hour is out of range")?,
    };
    Ok(day.and_time(time).and_utc())
}
