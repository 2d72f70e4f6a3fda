//! Command handlers for CLI operations
//!
//! This module implements the handlers for all CLI commands:
//! - ask: process a single request
//! - chat: interactive loop with selections and confirmations
//! - status: engine and capability summary
//! - config show / path: configuration inspection

use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::capabilities::{LocalCalendar, LogNotifier, StaticPlaceSearch, TemplateGenerator};
use crate::config::Config;
use crate::directory::JsonDirectory;
use crate::orchestrator::{NextAction, OptionItem, Orchestrator, Response};

/// Output format for command results
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

/// Build an orchestrator wired to the local capability implementations.
///
/// The calendar, notifier, and place search are in-process backends; real
/// deployments swap them for networked implementations of the same traits.
pub fn build_orchestrator(config: &Config) -> Result<Orchestrator> {
    let directory = JsonDirectory::load(
        &config.directory.contacts_path,
        &config.directory.profiles_path,
    )
    .context("Failed to load directory sources")?;

    let calendar = Arc::new(LocalCalendar::new(config.scheduling.clone()));
    let notifier = Arc::new(LogNotifier::new());
    let places = Arc::new(StaticPlaceSearch::sample());
    let generator = Arc::new(TemplateGenerator::new());

    Orchestrator::new(
        &directory,
        calendar.clone(),
        calendar,
        notifier,
        places,
        Some(generator),
        config,
    )
    .context("Failed to initialize orchestrator")
}

/// Process one request and print the response.
pub async fn handle_ask(
    query: String,
    from: Option<String>,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let mut orchestrator = build_orchestrator(config)?;
    let response = orchestrator.submit_query(&query, from.as_deref()).await;
    print_response(&response, format)?;
    Ok(())
}

/// Interactive loop. Numbers select from presented options, yes/no settles
/// confirmations, anything else is a fresh query.
pub async fn handle_chat(from: Option<String>, config: &Config, format: OutputFormat) -> Result<()> {
    let mut orchestrator = build_orchestrator(config)?;
    let requester = from.as_deref();

    let stdin = std::io::stdin();
    let mut expecting_selection = false;
    let mut awaiting_confirmation: Option<String> = None;

    println!("valet: what can I do for you? (\"exit\" to quit)");
    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(input, "exit" | "quit") {
            break;
        }

        let response = if let Some(id) = awaiting_confirmation.clone() {
            orchestrator.respond_confirmation(requester, &id, input).await
        } else if expecting_selection && input.chars().all(|c| c.is_ascii_digit()) {
            let option_id: usize = input.parse().unwrap_or(0);
            orchestrator.select_option(requester, option_id).await
        } else {
            orchestrator.submit_query(input, requester).await
        };

        expecting_selection = matches!(
            response.next_action,
            NextAction::SelectTimeSlot | NextAction::SelectRestaurant
        );
        awaiting_confirmation = response.confirmation_id.clone();

        print_response(&response, format)?;
    }

    Ok(())
}

/// Show engine status.
pub fn handle_status(config: &Config, format: OutputFormat) -> Result<()> {
    let orchestrator = build_orchestrator(config)?;
    let status = orchestrator.status();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&status)?),
        OutputFormat::Text => {
            println!("Valet engine");
            println!("  Directory entries: {}", status.directory_size);
            println!("  Active sessions:   {}", status.active_sessions);
            println!("  Capabilities:      {}", status.capabilities.join(", "));
        }
    }
    Ok(())
}

/// Print the active configuration.
pub fn handle_config_show(config: &Config, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
        OutputFormat::Text => println!("{}", toml::to_string_pretty(config)?),
    }
    Ok(())
}

/// Print the configuration file path.
pub fn handle_config_path() -> Result<()> {
    println!("{}", Config::default_config_path()?.display());
    Ok(())
}

/// Render one response in the requested format.
fn print_response(response: &Response, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(response)?);
        }
        OutputFormat::Text => {
            println!("{}", response.message);

            for option in &response.options {
                match option {
                    OptionItem::Slot(slot) => {
                        println!("  {}. {} ({} min)", slot.id, slot.time, slot.duration);
                    }
                    OptionItem::Place(place) => {
                        println!(
                            "  {}. {} - {} (rating {:.1})",
                            place.id, place.name, place.address, place.rating
                        );
                    }
                }
            }

            for schedule in &response.schedules {
                if schedule.entries.is_empty() {
                    println!("  {}: free all day", schedule.email);
                } else {
                    println!("  {}:", schedule.email);
                    for entry in &schedule.entries {
                        println!(
                            "    {} - {}  {}",
                            entry.start.format("%H:%M"),
                            entry.end.format("%H:%M"),
                            entry.title
                        );
                    }
                }
            }

            if !response.missing_fields.is_empty() {
                println!("  Missing: {}", response.missing_fields.join(", "));
            }
            for warning in &response.warnings {
                println!("  note: {}", warning);
            }
        }
    }
    Ok(())
}
