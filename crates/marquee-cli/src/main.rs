use std::io::BufRead;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use marquee_common::telemetry::{self, TelemetryConfig};
use marquee_common::{ApiClient, ApiConfig, CaseStudy, ContactSubmission, Role, User, Work};
use miette::{IntoDiagnostic, Result};

mod commands;

use commands::display_id;

#[derive(Parser)]
#[command(version, about = "Marquee - admin tool for the site content API", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Base URL of the content API
    #[arg(long, env = "MARQUEE_API_URL")]
    api_url: String,

    /// Bearer token, as printed by `marquee login`
    #[arg(long, env = "MARQUEE_API_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and edit marketing pages
    Pages {
        #[command(subcommand)]
        command: PagesCommand,
    },
    /// Upload a file and print where it landed
    Upload { file: PathBuf },
    /// Manage admin accounts
    Users {
        #[command(subcommand)]
        command: UsersCommand,
    },
    /// List portfolio entries
    Works {
        #[command(subcommand)]
        command: ListCommand,
    },
    /// List case studies
    CaseStudies {
        #[command(subcommand)]
        command: ListCommand,
    },
    /// List contact form submissions
    Contacts {
        #[command(subcommand)]
        command: ListCommand,
    },
    /// Log in and print a token for MARQUEE_API_TOKEN
    Login {
        email: String,

        /// Read from stdin when not set
        #[arg(long, env = "MARQUEE_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
}

#[derive(Subcommand)]
enum PagesCommand {
    List,
    /// Print a page record as JSON
    Show { name: String },
    Publish { name: String },
    /// Unpublish a page; visitors are redirected
    Hide {
        name: String,

        /// Where to send visitors instead of the site fallback
        #[arg(long)]
        redirect: Option<String>,
    },
    /// Seed a page with the built-in default content
    Init {
        name: String,

        #[arg(long)]
        force: bool,
    },
    /// Set a single field; VALUE is JSON, or a bare string
    Set {
        name: String,
        key: String,
        value: String,
    },
}

#[derive(Subcommand)]
enum UsersCommand {
    List,
    Create {
        email: String,

        #[arg(long, default_value = "")]
        name: String,

        #[arg(long, value_enum, default_value_t = RoleArg::Viewer)]
        role: RoleArg,

        #[arg(long, env = "MARQUEE_NEW_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Delete { id: String },
}

#[derive(Subcommand)]
enum ListCommand {
    List,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RoleArg {
    Admin,
    Editor,
    Viewer,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Admin => Role::Admin,
            RoleArg::Editor => Role::Editor,
            RoleArg::Viewer => Role::Viewer,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_miette();
    telemetry::init(TelemetryConfig::from_env("marquee-cli").with_level(tracing::Level::WARN));

    let cli = Cli::parse();

    let mut config = ApiConfig::parse(&cli.api_url)?;
    config.token = cli.token.filter(|t| !t.is_empty());
    let client = ApiClient::with_unauthorized_hook(config, || {
        eprintln!("⚠ Session rejected. Run 'marquee login <email>' and export MARQUEE_API_TOKEN");
    });

    match cli.command {
        Commands::Pages { command } => pages(&client, command).await?,
        Commands::Upload { file } => {
            let uploaded = commands::upload(&client, &file).await?;
            println!("✓ {} ({:?})", uploaded.path, uploaded.media_type);
        }
        Commands::Users { command } => users(&client, command).await?,
        Commands::Works { command: ListCommand::List } => {
            for work in client.list::<Work>().await? {
                let state = if work.published { "published" } else { "draft" };
                println!("{}\t{}\t{}\t{}", display_id(&work.id), work.slug, work.title, state);
            }
        }
        Commands::CaseStudies { command: ListCommand::List } => {
            for study in client.list::<CaseStudy>().await? {
                println!("{}\t{}\t{}", display_id(&study.id), study.slug, study.title);
            }
        }
        Commands::Contacts { command: ListCommand::List } => {
            for contact in client.list::<ContactSubmission>().await? {
                let received = contact
                    .created_at
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_default();
                println!("{}\t{} <{}>\t{}", received, contact.name, contact.email, contact.message);
            }
        }
        Commands::Login { email, password } => {
            let password = match password {
                Some(p) => p,
                None => read_password()?,
            };
            let session = client.login(&email, &password).await?;
            println!("✓ Logged in as {} ({:?})", session.user.email, session.user.role);
            println!("export MARQUEE_API_TOKEN={}", session.token);
        }
    }

    Ok(())
}

async fn pages(client: &ApiClient, command: PagesCommand) -> Result<()> {
    match command {
        PagesCommand::List => {
            for page in client.list_pages().await? {
                let state = match (page.published, page.redirect_target()) {
                    (true, _) => "published".to_string(),
                    (false, Some(to)) => format!("hidden -> {to}"),
                    (false, None) => "hidden".to_string(),
                };
                println!("{}\t{}\t{}", page.name, page.title, state);
            }
        }
        PagesCommand::Show { name } => {
            let page = client.get_page(&name).await?;
            let json = serde_json::to_string_pretty(&page).into_diagnostic()?;
            println!("{json}");
        }
        PagesCommand::Publish { name } => {
            commands::set_published(client, &name, true, None).await?;
            println!("✓ {name} published");
        }
        PagesCommand::Hide { name, redirect } => {
            let page = commands::set_published(client, &name, false, redirect).await?;
            match page.redirect_target() {
                Some(to) => println!("✓ {name} hidden, redirecting to {to}"),
                None => println!("✓ {name} hidden, redirecting to the site fallback"),
            }
        }
        PagesCommand::Init { name, force } => {
            commands::init_page(client, &name, force).await?;
            println!("✓ {name} initialised with default content");
        }
        PagesCommand::Set { name, key, value } => {
            if commands::set_field(client, &name, &key, &value).await? {
                println!("✓ {name}.{key} saved");
            } else {
                println!("{name}.{key} unchanged");
            }
        }
    }
    Ok(())
}

async fn users(client: &ApiClient, command: UsersCommand) -> Result<()> {
    match command {
        UsersCommand::List => {
            for user in client.list::<User>().await? {
                println!("{}\t{}\t{:?}", display_id(&user.id), user.email, user.role);
            }
        }
        UsersCommand::Create {
            email,
            name,
            role,
            password,
        } => {
            let user = commands::create_user(client, email, name, role.into(), password).await?;
            println!("✓ Created {} ({})", user.email, display_id(&user.id));
        }
        UsersCommand::Delete { id } => {
            client.delete::<User>(&id).await?;
            println!("✓ Deleted user {id}");
        }
    }
    Ok(())
}

fn read_password() -> Result<String> {
    eprintln!("Password:");
    let mut password = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut password)
        .into_diagnostic()?;
    Ok(password.trim_end_matches(['\r', '\n']).to_string())
}

fn init_miette() {
    // A hook may already be installed (e.g. under a test harness).
    let _ = miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }));
    miette::set_panic_hook();
}
