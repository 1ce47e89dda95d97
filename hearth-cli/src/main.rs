//! hearth - command-line front end for the Hearth family organizer core
//!
//! Computes next occurrences for recurring tasks, prints the role
//! permission matrix, manages the persisted session, and waits on
//! asynchronous generation jobs.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use hearth_common::access::{permission_matrix, Permission};
use hearth_common::api::{AuthScheme, Credentials, Endpoint, FunctionsClient};
use hearth_common::badge::due_badge;
use hearth_common::config::HearthConfig;
use hearth_common::polling::JobPoller;
use hearth_common::recurrence::{next_occurrence, Recurrence};
use hearth_common::session::{SessionStore, Widget};
use hearth_common::time::{format_iso_date, parse_iso_date, today};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Command-line arguments for hearth
#[derive(Parser, Debug)]
#[command(name = "hearth")]
#[command(about = "Family organizer core tools")]
#[command(version)]
struct Args {
    /// Configuration file (defaults to the platform config directory)
    #[arg(short, long, env = "HEARTH_CONFIG")]
    config: Option<PathBuf>,

    /// Root folder holding session state
    #[arg(short, long, env = "HEARTH_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the next occurrence of a recurring task read from JSON
    Next {
        /// Task JSON file (isRecurring / recurringPattern fields)
        #[arg(short, long)]
        file: PathBuf,

        /// Date to compute from (YYYY-MM-DD), defaults to today
        #[arg(long, value_parser = parse_date_arg)]
        today: Option<NaiveDate>,
    },

    /// Print the default permissions of every role
    Roles,

    /// Inspect or change the persisted session
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },

    /// Wait for an asynchronous generation job and print its result
    Poll {
        /// operationId returned when the job was started
        operation_id: String,

        /// Status function name
        #[arg(short, long)]
        endpoint: String,

        /// How the status function expects credentials
        #[arg(long, value_enum, default_value_t = SchemeArg::Bearer)]
        scheme: SchemeArg,

        /// Session token
        #[arg(long, env = "HEARTH_TOKEN")]
        token: Option<String>,

        /// User id sent with token-header credentials
        #[arg(long, env = "HEARTH_USER_ID")]
        user_id: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum SessionAction {
    /// Print the stored session as JSON
    Show,
    /// Delete the stored session
    Clear,
    /// Turn demo mode on or off
    Demo { state: Toggle },
    /// Show or hide a dashboard widget
    Widget { name: String, state: Toggle },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Toggle {
    On,
    Off,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum SchemeArg {
    Bearer,
    TokenHeaders,
    None,
}

impl From<SchemeArg> for AuthScheme {
    fn from(arg: SchemeArg) -> Self {
        match arg {
            SchemeArg::Bearer => AuthScheme::Bearer,
            SchemeArg::TokenHeaders => AuthScheme::TokenHeaders,
            SchemeArg::None => AuthScheme::None,
        }
    }
}

fn parse_date_arg(s: &str) -> std::result::Result<NaiveDate, String> {
    parse_iso_date(s).ok_or_else(|| format!("expected YYYY-MM-DD, got {s}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // The log level comes from the config, so report its origin once tracing is up
    let (config, origin) = HearthConfig::load_with_origin(args.config.as_deref())
        .context("Failed to load configuration")?;

    // RUST_LOG overrides the configured level
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .with_writer(std::io::stderr)
        .init();

    debug!("hearth v{}", env!("CARGO_PKG_VERSION"));
    origin.log();

    match args.command {
        Command::Next { file, today: from } => run_next(&file, from.unwrap_or_else(today)),
        Command::Roles => {
            print_roles();
            Ok(())
        }
        Command::Session { action } => {
            let store = config.session_store(args.root_folder.as_deref());
            run_session(&store, action)
        }
        Command::Poll {
            operation_id,
            endpoint,
            scheme,
            token,
            user_id,
        } => {
            let mut client = FunctionsClient::new(&config.functions)
                .context("Failed to build HTTP client")?;
            if let Some(token) = token {
                let mut credentials = Credentials::new(token);
                if let Some(user_id) = user_id {
                    credentials = credentials.with_user_id(user_id);
                }
                client = client.with_credentials(credentials);
            }

            let status = client.status_endpoint(Endpoint::new(endpoint, scheme.into()));
            let poller = JobPoller::from_config(&config.polling);
            info!(
                operation_id = %operation_id,
                interval_ms = config.polling.interval_ms,
                max_attempts = config.polling.max_attempts,
                "Waiting for job"
            );

            let result = poller
                .wait(&status, &operation_id)
                .await
                .with_context(|| format!("Job {} did not complete", operation_id))?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
    }
}

fn run_next(file: &Path, today: NaiveDate) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let recurrence: Recurrence = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse task JSON in {}", file.display()))?;

    match next_occurrence(&recurrence, today) {
        Some(next) => println!("{}\t{}", format_iso_date(next), due_badge(next, today)),
        None => println!("none"),
    }
    Ok(())
}

fn print_roles() {
    let header: Vec<String> = std::iter::once(format!("{:<18}", "permission"))
        .chain(permission_matrix().iter().map(|(role, _)| format!("{:<9}", role.as_str())))
        .collect();
    println!("{}", header.join(" ").trim_end());

    for permission in Permission::ALL {
        let row: Vec<String> = std::iter::once(format!("{:<18}", permission.as_str()))
            .chain(permission_matrix().iter().map(|(_, set)| {
                let mark = if set.contains(permission) { "yes" } else { "-" };
                format!("{:<9}", mark)
            }))
            .collect();
        println!("{}", row.join(" ").trim_end());
    }
}

fn run_session(store: &SessionStore, action: SessionAction) -> Result<()> {
    match action {
        SessionAction::Show => {
            let state = store.load().context("Failed to load session")?;
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
        SessionAction::Clear => {
            store.clear().context("Failed to clear session")?;
            println!("Session cleared ({})", store.path().display());
        }
        SessionAction::Demo { state } => {
            let mut session = store.load().context("Failed to load session")?;
            session.demo_mode = state == Toggle::On;
            store.save(&session).context("Failed to save session")?;
            println!("Demo mode {}", if session.demo_mode { "on" } else { "off" });
        }
        SessionAction::Widget { name, state } => {
            let widget: Widget = name.parse()?;
            let mut session = store.load().context("Failed to load session")?;
            session.widgets.set_visible(widget, state == Toggle::On);
            store.save(&session).context("Failed to save session")?;
            println!(
                "Widget {} {}",
                widget,
                if state == Toggle::On { "shown" } else { "hidden" }
            );
        }
    }
    Ok(())
}
