use std::{error::Error, io::Write};

use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};
use engine::{Engine, EngineError, users};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection, EntityTrait};

/// Starter layout installed by `seed`: group, description, categories.
const STARTER_GROUPS: &[(&str, &str, &[&str])] = &[
    (
        "Living",
        "Home and essential bills",
        &["Rent", "Utilities", "Groceries"],
    ),
    (
        "Spending",
        "Day-to-day discretionary spending",
        &["Eating out", "Entertainment", "Transport"],
    ),
    (
        "Savings",
        "Long-term reserves",
        &["Emergency fund", "Investments"],
    ),
    (
        "Monthly",
        "Recurring subscriptions and fees",
        &["Insurance", "Subscriptions"],
    ),
    ("Family", "Shared family expenses", &["Gifts", "Kids"]),
];

#[derive(Parser, Debug)]
#[command(name = "celengan_admin")]
#[command(about = "Admin utilities for Celengan (bootstrap users and starter groups)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./celengan.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    /// Install the starter groups and categories for an existing user.
    Seed(SeedArgs),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create(UserCreateArgs),
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    username: String,
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
}

#[derive(Args, Debug)]
struct SeedArgs {
    #[arg(long)]
    username: String,
}

struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> Result<Self, Box<dyn Error + Send + Sync>> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn prompt_password(prompt: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
    let _raw = RawModeGuard::enter()?;

    let mut out = std::io::stderr();
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(prompt)
    )?;
    out.flush()?;

    let mut buf = String::new();
    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };

        match code {
            KeyCode::Enter => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                break;
            }
            KeyCode::Backspace => {
                if buf.pop().is_some() {
                    execute!(out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
                    out.flush()?;
                }
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                return Err("interrupted".into());
            }
            KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
                buf.push(ch);
                execute!(out, Print("*"))?;
                out.flush()?;
            }
            _ => {}
        }
    }

    Ok(buf)
}

fn prompt_password_twice() -> Result<String, Box<dyn Error + Send + Sync>> {
    let mut out = std::io::stderr();
    for _ in 0..3 {
        let p1 = prompt_password("Password: ")?;
        if p1.is_empty() {
            execute!(
                out,
                cursor::MoveToColumn(0),
                terminal::Clear(ClearType::CurrentLine),
                Print("Password must not be empty.\r\n")
            )?;
            continue;
        }

        let p2 = prompt_password("Confirm password: ")?;
        if p1 == p2 {
            return Ok(p1);
        }

        execute!(
            out,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine),
            Print("Passwords do not match. Try again.\r\n")
        )?;
    }

    Err("too many attempts".into())
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

async fn seed_starter_groups(
    engine: &Engine,
    username: &str,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let mut created = 0;
    let mut skipped = 0;

    for &(name, description, categories) in STARTER_GROUPS {
        let group = match engine.new_group(username, name, Some(description)).await {
            Ok(group) => group,
            Err(EngineError::ExistingKey(_)) => {
                skipped += 1;
                continue;
            }
            Err(err) => return Err(err.into()),
        };

        for category in categories {
            engine
                .new_category(username, group.id, category, None)
                .await?;
        }
        created += 1;
    }

    println!("seeded {created} groups for {username} ({skipped} already present)");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db.clone()).build().await?;

    match cli.command {
        Command::User(User {
            command: UserCommand::Create(args),
        }) => {
            let password = prompt_password_twice()?;

            match engine
                .register(&args.username, &password, &args.name, &args.email)
                .await
            {
                Ok(user) => println!("created user: {}", user.username),
                Err(EngineError::ExistingKey(key)) => {
                    eprintln!("already exists: {key}");
                    std::process::exit(1);
                }
                Err(EngineError::Validation(message)) => {
                    eprintln!("{message}");
                    std::process::exit(2);
                }
                Err(err) => return Err(err.into()),
            }
        }
        Command::Seed(args) => {
            if users::Entity::find_by_id(args.username.clone())
                .one(&db)
                .await?
                .is_none()
            {
                eprintln!("user not found: {}", args.username);
                std::process::exit(1);
            }

            seed_starter_groups(&engine, &args.username).await?;
        }
    }

    Ok(())
}
