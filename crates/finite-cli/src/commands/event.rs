//! Countdown event commands for CLI.

use clap::Subcommand;
use finite_core::countdown::{parse_instant, DEFAULT_LIFESPAN_YEARS};
use finite_core::{Database, DatabaseError, NewEvent};

#[derive(Subcommand)]
pub enum EventAction {
    /// Create a countdown to a date
    Create {
        /// Event name
        name: String,
        /// Target date (YYYY-MM-DD, or RFC 3339 date-time)
        #[arg(long)]
        target: String,
        /// Motto shown with the countdown
        #[arg(long)]
        motto: Option<String>,
        /// Event description
        #[arg(long)]
        description: Option<String>,
    },
    /// Create a life countdown from a birth date
    Life {
        /// Birth date (YYYY-MM-DD)
        #[arg(long)]
        birth: String,
        /// Expected lifespan in years
        #[arg(long, default_value_t = DEFAULT_LIFESPAN_YEARS)]
        lifespan: f64,
        /// Event name
        #[arg(long, default_value = "Life")]
        name: String,
        /// Motto shown with the countdown
        #[arg(long)]
        motto: Option<String>,
    },
    /// List events in display order
    List,
    /// Show one event
    Get {
        /// Event ID
        id: String,
    },
    /// Delete an event
    Delete {
        /// Event ID
        id: String,
    },
    /// Move an event to a new position (0-based)
    Move {
        /// Event ID
        id: String,
        /// New position
        position: u32,
    },
}

pub fn run(action: EventAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        EventAction::Create {
            name,
            target,
            motto,
            description,
        } => {
            let new = NewEvent::custom(name, parse_instant(&target)?)
                .with_motto(motto)
                .with_description(description);
            let event = db.create_event(new)?;
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
        EventAction::Life {
            birth,
            lifespan,
            name,
            motto,
        } => {
            let new = NewEvent::life(name, parse_instant(&birth)?, lifespan)?.with_motto(motto);
            let event = db.create_event(new)?;
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
        EventAction::List => {
            let events = db.list_events()?;
            println!("{}", serde_json::to_string_pretty(&events)?);
        }
        EventAction::Get { id } => {
            let event = db
                .get_event(&id)?
                .ok_or(DatabaseError::NotFound { id })?;
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
        EventAction::Delete { id } => {
            db.delete_event(&id)?;
            println!("deleted {id}");
        }
        EventAction::Move { id, position } => {
            db.move_event(&id, position)?;
            let events = db.list_events()?;
            println!("{}", serde_json::to_string_pretty(&events)?);
        }
    }
    Ok(())
}
