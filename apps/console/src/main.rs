use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    config::{load_settings, load_settings_from},
    ClientContext, LoginError, RegisterError, Route, RouteDecision,
};
use shared::domain::{CategoryId, CategoryRecord};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use wizard::{
    steps::{register_form_schema, registration_payload},
    AccumulatedRecord, RawInput, StepOutcome, WizardError,
};

mod prompt;

use prompt::{confirm, fill_form, print_field_errors, read_line, FormInput, BACK};

#[derive(Parser, Debug)]
#[command(name = "category-console", about = "Registration, login and category management")]
struct Cli {
    /// Settings file (defaults to ./client.toml when present).
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    backend_url: Option<String>,
    #[arg(long)]
    session_db: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account with the three-step wizard.
    Register {
        /// Ask for everything on a single page instead.
        #[arg(long)]
        single_page: bool,
    },
    Login {
        username: String,
        /// Prompted for when omitted.
        #[arg(long)]
        password: Option<String>,
    },
    Logout,
    /// Whether a session is stored.
    Status,
    Categories {
        #[command(subcommand)]
        action: CategoryAction,
    },
}

#[derive(Subcommand, Debug)]
enum CategoryAction {
    List {
        #[arg(long)]
        json: bool,
    },
    Add {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    Delete {
        id: i64,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

fn init_tracing(fallback_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(fallback_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => load_settings_from(path),
        None => load_settings(),
    };
    if let Some(url) = cli.backend_url {
        settings.backend_url = url;
    }
    if let Some(db) = cli.session_db {
        settings.session_db_url = db;
    }
    init_tracing(&settings.log_filter);
    debug!(
        backend_url = %settings.backend_url,
        session_db = %settings.session_db_url,
        "console: settings loaded"
    );

    let ctx = ClientContext::from_settings(settings).await?;

    match cli.command {
        Command::Register { single_page: false } => run_wizard(&ctx).await,
        Command::Register { single_page: true } => run_register_form(&ctx).await,
        Command::Login { username, password } => run_login(&ctx, &username, password).await,
        Command::Logout => {
            ctx.auth.logout().await.context("failed to clear session")?;
            println!("Logged out.");
            Ok(())
        }
        Command::Status => {
            match ctx.guard.decide(Route::Category).await {
                RouteDecision::Allow => println!("Signed in."),
                RouteDecision::RedirectToLogin => println!("Signed out."),
            }
            Ok(())
        }
        Command::Categories { action } => run_categories(&ctx, action).await,
    }
}

async fn run_wizard(ctx: &ClientContext) -> Result<()> {
    let mut wizard = ctx.registration_wizard()?;

    loop {
        let step = wizard.current_step();
        let schema = wizard.current_definition().schema.clone();
        println!(
            "\nStep {step}/{}: {}",
            wizard.step_count(),
            wizard.current_definition().title
        );
        if step > 1 {
            println!("(enter {BACK} in any field to go back)");
        }

        let input = match fill_form(&schema, &wizard.prefill(), step > 1)? {
            FormInput::Back => {
                wizard.go_to_previous_step()?;
                continue;
            }
            FormInput::Filled(input) => input,
        };

        match wizard.submit_step(step, &input).await {
            Ok(StepOutcome::Advanced { .. }) => {}
            Ok(StepOutcome::Submitted(_)) => {
                println!("Registered. Continue at {}.", Route::Login.path());
                return Ok(());
            }
            Err(WizardError::Validation(errors)) => {
                eprintln!("Please fix the following:");
                print_field_errors(&errors);
            }
            Err(WizardError::Submit(message)) => {
                eprintln!("Registration failed: {message}");
                if !confirm("Try again?")? {
                    return Err(anyhow!("registration abandoned: {message}"));
                }
            }
            Err(err) => return Err(err.into()),
        }
    }
}

async fn run_register_form(ctx: &ClientContext) -> Result<()> {
    let schema = register_form_schema();
    let mut prefill = RawInput::new();

    loop {
        let input = match fill_form(&schema, &prefill, false)? {
            FormInput::Filled(input) => input,
            FormInput::Back => continue,
        };
        prefill = input.clone();
        prefill.remove("password");

        let validated = match wizard::validate(&schema, &input, wizard::today()) {
            Ok(validated) => validated,
            Err(errors) => {
                eprintln!("Please fix the following:");
                print_field_errors(&errors);
                continue;
            }
        };
        let payload = registration_payload(&AccumulatedRecord::new().merged(&validated));

        match ctx.auth.register(&payload).await {
            Ok(next) => {
                println!("Registered. Continue at {}.", next.path());
                return Ok(());
            }
            Err(RegisterError::Rejected(errors)) => {
                eprintln!("The server rejected the registration:");
                print_field_errors(&errors);
            }
            Err(err) => return Err(err).context("registration failed"),
        }
    }
}

async fn run_login(ctx: &ClientContext, username: &str, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => read_line("password", None)?.unwrap_or_default(),
    };

    match ctx.auth.login(username, &password).await {
        Ok(next) => {
            println!("Logged in. Continue at {}.", next.path());
            Ok(())
        }
        Err(LoginError::Validation(errors)) => {
            print_field_errors(&errors);
            bail!("login form is incomplete")
        }
        Err(err) => Err(err).context("login failed"),
    }
}

async fn run_categories(ctx: &ClientContext, action: CategoryAction) -> Result<()> {
    if ctx.guard.decide(Route::Category).await == RouteDecision::RedirectToLogin {
        bail!("not signed in, log in first ({})", Route::Login.path());
    }

    let mut screen = ctx.category_screen();
    screen.mount().await?;

    match action {
        CategoryAction::List { json } => {
            let records = screen.list().snapshot().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                print_table(&records);
            }
        }
        CategoryAction::Add { name, description } => {
            let dialog = screen.dialog_mut();
            dialog.open_add();
            dialog.set_name(name);
            dialog.set_description(description);
            let created = screen.commit_dialog().await?;
            println!("Created category {}.", created.id);
        }
        CategoryAction::Edit {
            id,
            name,
            description,
        } => {
            let record = cached(&screen, id).await?;
            let dialog = screen.dialog_mut();
            dialog.open_edit(&record);
            if let Some(name) = name {
                dialog.set_name(name);
            }
            if let Some(description) = description {
                dialog.set_description(description);
            }
            let updated = screen.commit_dialog().await?;
            println!("Updated category {}.", updated.id);
        }
        CategoryAction::Delete { id, yes } => {
            let record = cached(&screen, id).await?;
            screen.dialog_mut().open_delete_confirm(&record);
            if !yes && !confirm(&format!("Delete category '{}'?", record.name))? {
                screen.cancel();
                println!("Kept category {id}.");
                return Ok(());
            }
            let deleted = screen.confirm_delete().await?;
            println!("Deleted category {deleted}.");
        }
    }
    Ok(())
}

async fn cached(screen: &client_core::CategoryScreen, id: i64) -> Result<CategoryRecord> {
    screen
        .list()
        .get(CategoryId(id))
        .await
        .with_context(|| format!("no category with id {id}"))
}

fn print_table(records: &[CategoryRecord]) {
    if records.is_empty() {
        println!("No categories.");
        return;
    }
    println!("{:>6}  {:<24}  DESCRIPTION", "ID", "NAME");
    for record in records {
        println!("{:>6}  {:<24}  {}", record.id.0, record.name, record.description);
    }
}
