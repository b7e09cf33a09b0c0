use std::{
    path::PathBuf,
    process::ExitCode,
    sync::{Arc, Mutex, PoisonError},
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    Command, CommandOutcome, FeedbackSlot, HttpRosterApi, MemorySurface, MutationController,
};
use tracing::info;
use tracing_subscriber::EnvFilter;
use url::Url;

mod config;

use config::load_settings;

#[derive(Parser, Debug)]
struct Args {
    /// Overrides the server url from the settings file and environment.
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long, default_value = "roster.toml")]
    config: PathBuf,
    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Show the current roster.
    List,
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        activity: String,
    },
    Unregister {
        #[arg(long)]
        activity: String,
        #[arg(long)]
        email: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    let args = Args::parse();

    let mut settings = load_settings(&args.config)?;
    if let Some(server_url) = args.server_url {
        settings.server_url = server_url;
    }
    let base_url = Url::parse(&settings.server_url)
        .with_context(|| format!("invalid server url '{}'", settings.server_url))?;
    info!(server_url = %base_url, "using roster server");

    let api = HttpRosterApi::with_timeout(base_url, settings.request_timeout())
        .context("failed to build http client")?;
    let surface = Arc::new(Mutex::new(MemorySurface::new()));
    let controller = MutationController::new_with_feedback(
        Arc::new(api),
        surface.clone(),
        FeedbackSlot::new(settings.feedback_hide_after()),
    );

    let mut outcome = controller.start().outcome().await;

    let command = {
        let mut surface = surface.lock().unwrap_or_else(PoisonError::into_inner);
        match args.action {
            Action::List => None,
            Action::Signup { email, activity } => {
                surface.form.email = email.clone();
                surface.form.activity = activity.clone();
                Some(Command::Signup { email, activity })
            }
            Action::Unregister { activity, email } => Some(
                surface
                    .remove_control(&activity, &email)
                    .map(Command::unregister_from)
                    .unwrap_or(Command::Unregister {
                        activity: Some(activity),
                        email: Some(email),
                    }),
            ),
        }
    };

    if let Some(command) = command {
        let handle = controller.dispatch(command);
        let name = handle.command();
        outcome = handle.outcome().await;
        info!(command = name, ?outcome, "command finished");
    }

    print!(
        "{}",
        surface
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .to_text()
    );
    if let Some(feedback) = controller.feedback().current().filter(|m| m.visible) {
        println!("[{}] {}", feedback.kind.as_str(), feedback.text);
    }

    Ok(match outcome {
        CommandOutcome::Refreshed | CommandOutcome::Succeeded => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}
