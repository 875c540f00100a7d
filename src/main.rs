mod commands;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use commands::{CliError, Context};
use todos::clock::{Clock, FixedClock, SystemClock};
use todos::models::{NewTodo, Role, StatusFilter, TodoChanges, TodoQuery, UserChanges};

#[derive(Parser)]
#[command(name = "td", version, about = "Role-aware todo list manager")]
struct Cli {
    /// Path to the database file (default: .todos/todos.db in current dir)
    #[arg(long, env = "TD_DB", global = true)]
    db: Option<PathBuf>,

    /// Act as this user id
    #[arg(long = "as", value_name = "USER_ID", env = "TD_ACTOR", global = true)]
    actor: Option<i64>,

    /// Pin the clock to an RFC 3339 instant
    #[arg(long, env = "TD_NOW", global = true, value_parser = FixedClock::parse)]
    now: Option<FixedClock>,

    /// Output as JSON instead of table
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the todo database
    Init,
    /// Create the demo accounts and replace all todos with the demo set
    Seed {
        /// Drop and recreate the schema first
        #[arg(long)]
        fresh: bool,
    },
    /// Serve the JSON API
    Serve {
        #[arg(long, env = "TD_HOST", default_value = "127.0.0.1")]
        host: String,
        #[arg(long, env = "TD_PORT", default_value_t = 8080)]
        port: u16,
    },
    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserCommand,
    },
    /// Show or edit your own account
    Profile {
        #[command(subcommand)]
        action: ProfileCommand,
    },
    /// Manage todos
    Todo {
        #[command(subcommand)]
        action: TodoCommand,
    },
    /// Show todo counts (yours, or everyone's with --global)
    Stats {
        /// System-wide statistics (admin only)
        #[arg(long)]
        global: bool,
    },
}

#[derive(Subcommand)]
enum UserCommand {
    /// Provision a new account
    Add {
        name: String,
        email: String,
        #[arg(long, default_value = "user")]
        role: Role,
        /// Opaque credential hash stored as-is
        #[arg(long)]
        password_hash: Option<String>,
    },
    /// List users (admin only)
    List {
        #[arg(long)]
        page: Option<u32>,
    },
    /// Show a user (admin only)
    Show { id: i64 },
    /// Update a user (admin only)
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        role: Option<Role>,
    },
    /// Change a user's role (admin only)
    Role { id: i64, role: Role },
    /// Delete a user and their todos (admin only)
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum ProfileCommand {
    /// Show your account
    Show,
    /// Update your name or email
    Update {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
}

#[derive(Subcommand)]
enum TodoCommand {
    /// Create a todo
    Create {
        title: String,
        #[arg(short, long)]
        description: Option<String>,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<NaiveDate>,
        /// Owner (admins only; ignored otherwise)
        #[arg(long)]
        user: Option<i64>,
    },
    /// List todos, newest first
    List {
        /// completed, incomplete or overdue
        #[arg(short, long)]
        status: Option<StatusFilter>,
        /// Restrict to one owner (admins only)
        #[arg(long)]
        user: Option<i64>,
        #[arg(long)]
        page: Option<u32>,
    },
    /// Show a todo
    Show { id: i64 },
    /// Update a todo
    Update {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(short, long, conflicts_with = "clear_description")]
        description: Option<String>,
        #[arg(long)]
        clear_description: bool,
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<NaiveDate>,
        #[arg(long)]
        clear_due: bool,
        /// New owner (admins only)
        #[arg(long)]
        user: Option<i64>,
    },
    /// Delete a todo
    Delete { id: i64 },
    /// Flip a todo between completed and incomplete
    Toggle { id: i64 },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match cli.command {
        Commands::Serve { .. } => "info",
        _ => "warn",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let db_path = match cli.db {
        Some(p) => p,
        None => match std::env::current_dir() {
            Ok(dir) => dir.join(".todos").join("todos.db"),
            Err(e) => {
                eprintln!("error: cannot determine current directory: {e}");
                std::process::exit(1);
            }
        },
    };
    let clock: Arc<dyn Clock> = match cli.now {
        Some(fixed) => Arc::new(fixed),
        None => Arc::new(SystemClock),
    };
    let ctx = Context {
        db_path,
        actor: cli.actor,
        clock,
        json: cli.json,
    };

    if let Err(e) = run(&ctx, cli.command) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(ctx: &Context, command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Init => commands::init::run(ctx),
        Commands::Seed { fresh } => commands::seed::run(ctx, fresh),
        Commands::Serve { host, port } => commands::serve::run(ctx, &host, port),
        Commands::User { action } => match action {
            UserCommand::Add {
                name,
                email,
                role,
                password_hash,
            } => commands::user::add(ctx, &name, &email, role, password_hash),
            UserCommand::List { page } => commands::user::list(ctx, page),
            UserCommand::Show { id } => commands::user::show(ctx, id),
            UserCommand::Update {
                id,
                name,
                email,
                role,
            } => commands::user::update(
                ctx,
                id,
                UserChanges {
                    name,
                    email,
                    password_hash: None,
                    role,
                },
            ),
            UserCommand::Role { id, role } => commands::user::set_role(ctx, id, role),
            UserCommand::Delete { id } => commands::user::delete(ctx, id),
        },
        Commands::Profile { action } => match action {
            ProfileCommand::Show => commands::profile::show(ctx),
            ProfileCommand::Update { name, email } => commands::profile::update(ctx, name, email),
        },
        Commands::Todo { action } => match action {
            TodoCommand::Create {
                title,
                description,
                due,
                user,
            } => commands::todo::create(
                ctx,
                NewTodo {
                    title,
                    description,
                    due_date: due,
                    user_id: user,
                },
            ),
            TodoCommand::List { status, user, page } => commands::todo::list(
                ctx,
                &TodoQuery {
                    status,
                    user_id: user,
                    page,
                },
            ),
            TodoCommand::Show { id } => commands::todo::show(ctx, id),
            TodoCommand::Update {
                id,
                title,
                description,
                clear_description,
                due,
                clear_due,
                user,
            } => commands::todo::update(
                ctx,
                id,
                TodoChanges {
                    title,
                    description: if clear_description {
                        Some(None)
                    } else {
                        description.map(Some)
                    },
                    due_date: if clear_due { Some(None) } else { due.map(Some) },
                    user_id: user,
                },
            ),
            TodoCommand::Delete { id } => commands::todo::delete(ctx, id),
            TodoCommand::Toggle { id } => commands::todo::toggle(ctx, id),
        },
        Commands::Stats { global } => commands::stats::run(ctx, global),
    }
}
