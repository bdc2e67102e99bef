//! # Civitas Binary
//!
//! The entry point that assembles the application based on compile-time features.

mod cli;
mod config;

use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use cv_core::{ImageGenerator, KeyValueStore, NewIssue, Notifier, Role, TextGenerator};
use cv_services::flows::{
    categorize_issue, generate_medals, summarize_issue, CategorizeIssueInput, GenerateMedalsInput,
    SummarizeIssueInput,
};
use cv_services::{DataStore, IdentityContext};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::config::{GeminiSettings, LogFormat, Settings};

// Feature-gated imports
#[cfg(feature = "storage-local")]
use cv_storage_local::LocalFileStore;

#[cfg(feature = "ai-gemini")]
use cv_ai_gemini::{GeminiClient, GeminiOptions};

/// Prints store notifications the way a toast would show them.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, title: &str, description: &str) {
        println!("{title} {description}");
    }
}

/// The model ports the AI commands run against.
struct AiBackend {
    text: Arc<dyn TextGenerator>,
    image: Arc<dyn ImageGenerator>,
}

#[cfg(feature = "ai-gemini")]
fn ai_backend(settings: &GeminiSettings) -> anyhow::Result<AiBackend> {
    let Some(api_key) = settings.api_key.clone() else {
        bail!("no API key configured; set CIVITAS_GEMINI__API_KEY or GEMINI_API_KEY");
    };
    let client = Arc::new(GeminiClient::new(
        api_key,
        GeminiOptions {
            base_url: settings.base_url.clone(),
            text_model: settings.text_model.clone(),
            image_model: settings.image_model.clone(),
            timeout: std::time::Duration::from_secs(settings.timeout_secs),
        },
    )?);
    Ok(AiBackend {
        text: client.clone(),
        image: client,
    })
}

#[cfg(not(feature = "ai-gemini"))]
fn ai_backend(_settings: &GeminiSettings) -> anyhow::Result<AiBackend> {
    bail!("built without an AI backend; enable the `ai-gemini` feature")
}

#[cfg(feature = "storage-local")]
fn storage_backend(settings: &Settings) -> anyhow::Result<Arc<dyn KeyValueStore>> {
    Ok(Arc::new(LocalFileStore::open(&settings.data_dir)?))
}

#[cfg(not(feature = "storage-local"))]
fn storage_backend(_settings: &Settings) -> anyhow::Result<Arc<dyn KeyValueStore>> {
    tracing::warn!("built without storage-local; state lasts for this process only");
    Ok(Arc::new(cv_core::MemoryStore::new()))
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // 1. Settings and logging
    let settings = Settings::load().context("loading settings")?;
    init_tracing(settings.log_format);

    // 2. Storage and session
    let backend = storage_backend(&settings)?;
    let identity = Arc::new(IdentityContext::new(backend.clone()));

    // 3. The store seeds itself before the first read
    let store = DataStore::open(backend, identity, Arc::new(ConsoleNotifier));

    run(cli.command, &store, &settings.gemini).await
}

async fn run(command: Command, store: &DataStore, gemini: &GeminiSettings) -> anyhow::Result<()> {
    match command {
        Command::Login { name, admin } => {
            let role = if admin { Role::Admin } else { Role::User };
            let landing = store.identity().login(name.trim(), role);
            println!("Logged in as {} ({role}). Next: {}", name.trim(), landing.path());
        }
        Command::Logout => {
            let landing = store.identity().logout();
            println!("Logged out. Next: {}", landing.path());
        }
        Command::Whoami => match store.identity().current() {
            Some(actor) => println!("{} ({})", actor.name, actor.role),
            None => println!("Not logged in."),
        },
        Command::Report {
            title,
            description,
            location,
            category,
            assist,
        } => {
            if store.identity().current().is_none() {
                bail!("log in before reporting an issue");
            }
            let new_issue = if assist {
                assisted_issue(title, description, location, category, gemini).await?
            } else {
                let (Some(title), Some(category)) = (title, category) else {
                    bail!("--title and --category are required unless --assist is given");
                };
                NewIssue {
                    title,
                    description,
                    location,
                    category,
                }
            };
            if let Some(issue) = store.add_issue(new_issue) {
                print_json(&issue)?;
            }
        }
        Command::Status { issue_id, status } => {
            if !store.identity().is_admin() {
                bail!("only an admin may change issue status");
            }
            if !store.update_issue_status(&issue_id, status) {
                bail!("no issue with id {issue_id}");
            }
            println!("{issue_id} is now {status}");
        }
        Command::Feed => print_json(store.issues().as_ref())?,
        Command::Mine => {
            if store.identity().current().is_none() {
                bail!("log in to see your reports");
            }
            print_json(&store.my_reports())?;
        }
        Command::Leaderboard { top } => {
            for (rank, user) in store.top_users(top).iter().enumerate() {
                println!("{:>3}. {:<24} {:>4} pts", rank + 1, user.name, user.points);
            }
        }
        Command::Dashboard => print_json(&store.dashboard_stats())?,
        Command::Analytics => print_json(&store.status_breakdown())?,
        Command::Categorize { description } => {
            let ai = ai_backend(gemini)?;
            let out = categorize_issue(ai.text.as_ref(), &CategorizeIssueInput { description }).await?;
            print_json(&out)?;
        }
        Command::Summarize { description } => {
            let ai = ai_backend(gemini)?;
            let out = summarize_issue(ai.text.as_ref(), &SummarizeIssueInput { description }).await?;
            print_json(&out)?;
        }
        Command::Medals { usernames } => {
            let ai = ai_backend(gemini)?;
            let out = generate_medals(
                ai.image.as_ref(),
                &GenerateMedalsInput {
                    top_usernames: usernames,
                },
            )
            .await;
            print_json(&out)?;
        }
    }
    Ok(())
}

/// Fills a missing title (with a polished description) and a missing
/// category from the model before the issue is filed.
async fn assisted_issue(
    title: Option<String>,
    description: String,
    location: String,
    category: Option<cv_core::Category>,
    gemini: &GeminiSettings,
) -> anyhow::Result<NewIssue> {
    let ai = ai_backend(gemini)?;

    let (title, description) = match title {
        Some(title) => (title, description),
        None => {
            let summary = summarize_issue(
                ai.text.as_ref(),
                &SummarizeIssueInput {
                    description: description.clone(),
                },
            )
            .await?;
            (summary.title, summary.summarized_description)
        }
    };

    let category = match category {
        Some(category) => category,
        None => {
            categorize_issue(
                ai.text.as_ref(),
                &CategorizeIssueInput {
                    description: description.clone(),
                },
            )
            .await?
            .category
        }
    };

    Ok(NewIssue {
        title,
        description,
        location,
        category,
    })
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
