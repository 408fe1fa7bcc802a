//! Conecta - a command-line client for the Conecta Saber school platform.
//!
//! Sign in, browse and search posts, and (for teachers and admins) manage
//! posts, comments and accounts from the terminal.

mod format;

use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use conecta_core::models::{NewAccount, NewPost, PostStatus, ProfileUpdate, Role, UserUpdate};
use conecta_core::services::{
    dashboard_counts, AuthService, PostQuery, PostService, DEFAULT_PAGE_SIZE,
};
use conecta_core::{ApiClient, ApiError, Config};

#[derive(Parser)]
#[command(name = "conecta")]
#[command(version, about = "Conecta Saber command-line client", long_about = None)]
struct Cli {
    /// API base URL (overrides CONECTA_API_URL and the config file)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and cache the session
    Login {
        #[arg(long)]
        email: Option<String>,
    },
    /// Create an account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "student")]
        role: Role,
        /// Do not sign in as the new account (admins creating users)
        #[arg(long)]
        no_login: bool,
    },
    /// Forget the cached session
    Logout,
    /// Show the cached user
    Whoami,
    /// Show or update the signed-in profile
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        avatar_url: Option<String>,
    },
    /// Change the account password
    Password,
    #[command(subcommand)]
    Posts(PostCommands),
    #[command(subcommand)]
    Comments(CommentCommands),
    #[command(subcommand)]
    Users(UserCommands),
    /// Post, teacher and student totals
    Dashboard,
}

#[derive(Args)]
struct PageArgs {
    #[arg(long, default_value_t = 1)]
    page: u32,
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    limit: u32,
}

#[derive(Subcommand)]
enum PostCommands {
    /// Published feed
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[command(flatten)]
        page: PageArgs,
    },
    /// All posts including drafts
    All {
        #[command(flatten)]
        page: PageArgs,
    },
    Show {
        id: String,
    },
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        #[arg(long)]
        category: String,
        /// Comma-separated tags
        #[arg(long, default_value = "")]
        tags: String,
        #[arg(long, default_value = "published")]
        status: PostStatus,
    },
    Delete {
        id: String,
    },
}

#[derive(Subcommand)]
enum CommentCommands {
    Add { post_id: String, content: String },
    Edit { post_id: String, comment_id: String, content: String },
    Delete { post_id: String, comment_id: String },
}

#[derive(Subcommand)]
enum UserCommands {
    Teachers,
    Students,
    Show { id: String },
    /// Edit another account (admin)
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        role: Option<Role>,
        /// Activate or deactivate the account
        #[arg(long)]
        active: Option<bool>,
    },
    Delete { id: String },
}

/// Initialize logging: stderr filtered by RUST_LOG (default `warn`), plus a
/// daily log file in the cache directory when one is available.
fn init_tracing(config: &Config) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match config.cache_dir() {
        Ok(dir) => {
            let appender = tracing_appender::rolling::daily(dir.join("logs"), "conecta.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn prompt_password(label: &str) -> Result<String> {
    rpassword::prompt_password(label).context("Failed to read password")
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let mut config = Config::load()?;
    let _log_guard = init_tracing(&config);
    info!("conecta starting");

    let api = match cli.api_url {
        Some(ref url) => {
            ApiClient::connect(url, config.request_timeout(), config.session_store()?)?
        }
        None => config.api_client()?,
    };

    if let Err(e) = run(cli.command, api, &mut config).await {
        if let Some(api_err) = e.downcast_ref::<ApiError>() {
            if api_err.is_unauthorized() {
                eprintln!("Session expired or not signed in. Run `conecta login`.");
            }
        }
        return Err(e);
    }
    Ok(())
}

async fn run(command: Commands, api: ApiClient, config: &mut Config) -> Result<()> {
    let auth = AuthService::new(api.clone());
    let posts = PostService::new(api);

    match command {
        Commands::Login { email } => {
            let email = match email.or_else(|| config.last_email.clone()) {
                Some(email) => email,
                None => prompt("Email: ")?,
            };
            let password = prompt_password("Password: ")?;
            let response = auth.login(&email, &password).await?;

            config.last_email = Some(email);
            config.save()?;
            println!("Signed in as {} ({})", response.user.name, response.user.role);
        }
        Commands::Register { name, email, role, no_login } => {
            let password = prompt_password("Password: ")?;
            let account = NewAccount { name, email, password, role };
            let payload = auth.register(&account, !no_login).await?;
            match payload.user {
                Some(user) => println!("Registered {} ({})", user.email, user.role),
                None => println!("Registered {}", account.email),
            }
            if !no_login && payload.access_token.is_none() {
                println!("Run `conecta login` to sign in.");
            }
        }
        Commands::Logout => {
            auth.logout()?;
            println!("Signed out");
        }
        Commands::Whoami => match auth.restore() {
            Some(user) => println!("{}", format::user_line(&user)),
            None => println!("Not signed in"),
        },
        Commands::Profile { name, email, avatar_url } => {
            let user = if name.is_none() && email.is_none() && avatar_url.is_none() {
                auth.profile().await?
            } else {
                auth.update_profile(&ProfileUpdate { name, email, avatar_url }).await?
            };
            println!("{}", serde_json::to_string_pretty(&user)?);
        }
        Commands::Password => {
            let current = prompt_password("Current password: ")?;
            let new = prompt_password("New password: ")?;
            auth.change_password(&current, &new).await?;
            println!("Password changed");
        }
        Commands::Posts(cmd) => run_posts(cmd, &posts).await?,
        Commands::Comments(cmd) => match cmd {
            CommentCommands::Add { post_id, content } => {
                let post = posts.add_comment(&post_id, &content).await?;
                println!("{}", format::post_detail(&post));
            }
            CommentCommands::Edit { post_id, comment_id, content } => {
                let post = posts.update_comment(&post_id, &comment_id, &content).await?;
                println!("{}", format::post_detail(&post));
            }
            CommentCommands::Delete { post_id, comment_id } => {
                posts.delete_comment(&post_id, &comment_id).await?;
                println!("Comment deleted");
            }
        },
        Commands::Users(cmd) => match cmd {
            UserCommands::Teachers => {
                for user in auth.teachers().await? {
                    println!("{}", format::user_line(&user));
                }
            }
            UserCommands::Students => {
                for user in auth.students().await? {
                    println!("{}", format::user_line(&user));
                }
            }
            UserCommands::Show { id } => {
                let user = auth.user(&id).await?;
                println!("{}", serde_json::to_string_pretty(&user)?);
            }
            UserCommands::Edit { id, name, email, role, active } => {
                let update = UserUpdate {
                    name,
                    email,
                    role,
                    is_active: active,
                };
                let user = auth.update_user(&id, &update).await?;
                println!("{}", format::user_line(&user));
            }
            UserCommands::Delete { id } => {
                auth.delete_user(&id).await?;
                println!("User {} deleted", id);
            }
        },
        Commands::Dashboard => {
            let counts = dashboard_counts(&auth, &posts).await?;
            println!("Posts:    {}", counts.posts);
            println!("Teachers: {}", counts.teachers);
            println!("Students: {}", counts.students);
        }
    }
    Ok(())
}

async fn run_posts(cmd: PostCommands, posts: &PostService) -> Result<()> {
    match cmd {
        PostCommands::List { search, category, page } => {
            let query = PostQuery {
                page: page.page,
                limit: page.limit,
                search,
                category,
            };
            let result = posts.list(query).await?;
            for post in &result.data {
                println!("{}", format::post_line(post));
            }
            println!("page {}/{} · {} posts", result.page, result.total_pages, result.total);
        }
        PostCommands::All { page } => {
            let result = posts.list_all(page.page, page.limit).await?;
            for post in &result.data {
                println!("{}", format::post_line(post));
            }
            println!("page {}/{} · {} posts", result.page, result.total_pages, result.total);
        }
        PostCommands::Show { id } => {
            let post = posts.get(&id).await?;
            println!("{}", format::post_detail(&post));
        }
        PostCommands::Create { title, content, category, tags, status } => {
            let post = NewPost::new(title, content, category, status)
                .with_tags(format::parse_tags(&tags));
            let created = posts.create(&post).await?;
            println!("Created post {}", created.id);
        }
        PostCommands::Delete { id } => {
            posts.delete(&id).await?;
            println!("Post {} deleted", id);
        }
    }
    Ok(())
}
