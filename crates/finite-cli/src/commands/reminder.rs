use std::sync::Arc;

use chrono::Utc;
use clap::Subcommand;
use finite_core::notify::{remaining_life, reminder_body, spawn_reminders, REMINDER_TITLE};
use finite_core::{Config, SystemClock};
use serde_json::json;

use crate::notifier::TerminalNotifier;

#[derive(Subcommand)]
pub enum ReminderAction {
    /// Print the reminder that would be sent right now
    Preview,
    /// Send reminders at the configured frequency until interrupted
    Run,
}

pub fn run(action: ReminderAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let target = super::life_target(&config)?;
    let birth = target.reference_point().ok_or("life countdown has no birth date")?;
    let lifespan = target
        .expectancy_years()
        .ok_or("life countdown has no expected lifespan")?;

    match action {
        ReminderAction::Preview => {
            let remaining = remaining_life(birth, lifespan, Utc::now());
            let preview = json!({
                "title": REMINDER_TITLE,
                "body": reminder_body(remaining, &config.reminders.message),
                "frequency": config.reminders.frequency,
                "enabled": config.reminders.enabled,
            });
            println!("{}", serde_json::to_string_pretty(&preview)?);
        }
        ReminderAction::Run => {
            if !config.reminders.enabled {
                return Err("reminders are disabled (try: finite-cli config set reminders.enabled true)".into());
            }
            if !config.notifications.enabled {
                return Err("notifications are disabled (try: finite-cli config set notifications.enabled true)".into());
            }
            let notifier = Arc::new(TerminalNotifier::new(true));
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(async {
                let handle = spawn_reminders(&config.reminders, birth, lifespan, notifier, SystemClock)?;
                tokio::signal::ctrl_c().await?;
                if let Some(handle) = handle {
                    handle.stop();
                }
                Ok::<(), Box<dyn std::error::Error>>(())
            })?;
        }
    }
    Ok(())
}
