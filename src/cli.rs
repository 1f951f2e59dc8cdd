use crate::calendar::Calendar;
use crate::clock::Clock;
use crate::dates::parse_natural_date;
use crate::error::{Error, Result};
use crate::store::Store;
use clap::{CommandFactory, Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;

/// Keep track of when you last saw your friends.
#[derive(Debug, Parser)]
#[command(name = "friendtracker", version)]
pub struct Cli {
    /// Directory holding the hangout log [default: $FRIENDTRACKER_DIR or ~/.friendtracker]
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Set how many days you want between hangouts with a friend
    Update { friend: String, frequency: u32 },
    /// Remove a friend (not supported yet)
    Remove { friend: String },
    /// Add a recent or planned hangout
    Hangout {
        /// When it happened, e.g. "yesterday", "2021-05-01", "in 3 days"
        date: String,
        description: String,
        #[arg(required = true)]
        friends: Vec<String>,
    },
    /// Check the calendar, one week either side of today
    Calendar {
        /// Only show this friend, back to their third most recent hangout
        #[arg(long)]
        friend: Option<String>,
    },
}

/// Carry out `command`, writing anything meant for the user to `out`.
///
/// Without a command, prints the help text.
pub fn run<S, C, W>(command: Option<Command>, store: &mut S, clock: &C, out: &mut W) -> Result<()>
where
    S: Store + ?Sized,
    C: Clock + ?Sized,
    W: Write,
{
    let Some(command) = command else {
        return Cli::command().write_help(out).map_err(Error::Output);
    };

    match command {
        Command::Update { friend, frequency } => {
            let friend = store.upsert_friend(&friend, Some(frequency))?;
            log::debug!("{} now has frequency {:?}", friend.name, friend.frequency);
        }
        Command::Remove { friend } => store.remove_friend(&friend)?,
        Command::Hangout {
            date,
            description,
            friends,
        } => {
            let date = parse_natural_date(&date, clock.today())?;
            let hang = store.create_hangout(date, &description, &friends)?;
            log::debug!("recorded hangout {} on {}", hang.id, hang.date);
        }
        Command::Calendar { friend } => {
            let calendar = Calendar::new(&*store, clock);
            for line in calendar.render_calendar(friend.as_deref())? {
                writeln!(out, "{line}").map_err(Error::Output)?;
            }
        }
    }
    Ok(())
}
