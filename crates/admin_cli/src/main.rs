use std::{
    error::Error,
    io::{Stderr, Write},
};

use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};
use engine::{Engine, EngineError, NewUser};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

#[derive(Parser, Debug)]
#[command(name = "plugin_catalog_admin")]
#[command(about = "Admin utilities for the plugin catalog (accounts and taxonomy)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./plugin_catalog.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Category(Category),
    Subcategory(Subcategory),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    /// Create an account; the password is read from the terminal.
    Create(UserCreateArgs),
    /// Grant or revoke staff access.
    Promote(UserPromoteArgs),
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    username: String,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    staff: bool,
    /// Superusers are always staff too.
    #[arg(long)]
    superuser: bool,
}

#[derive(Args, Debug)]
struct UserPromoteArgs {
    #[arg(long)]
    username: String,
    #[arg(long)]
    revoke: bool,
}

#[derive(Args, Debug)]
struct Category {
    #[command(subcommand)]
    command: CategoryCommand,
}

#[derive(Subcommand, Debug)]
enum CategoryCommand {
    Create(CategoryCreateArgs),
}

#[derive(Args, Debug)]
struct CategoryCreateArgs {
    #[arg(long)]
    name: String,
    /// Derived from the name when omitted.
    #[arg(long)]
    slug: Option<String>,
}

#[derive(Args, Debug)]
struct Subcategory {
    #[command(subcommand)]
    command: SubcategoryCommand,
}

#[derive(Subcommand, Debug)]
enum SubcategoryCommand {
    Create(SubcategoryCreateArgs),
}

#[derive(Args, Debug)]
struct SubcategoryCreateArgs {
    /// Slug of the parent category.
    #[arg(long)]
    category: String,
    #[arg(long)]
    name: String,
    #[arg(long)]
    slug: Option<String>,
}

const MIN_PASSWORD_CHARS: usize = 8;
const PASSWORD_ATTEMPTS: usize = 3;

/// Why `password` cannot be used for the account `username`, if anything.
fn password_problem(username: &str, password: &str) -> Option<String> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Some(format!(
            "Password must be at least {MIN_PASSWORD_CHARS} characters."
        ));
    }
    if password.chars().all(char::is_whitespace) {
        return Some("Password must not be blank.".to_string());
    }
    if password.to_lowercase() == username.trim().to_lowercase() {
        return Some("Password must differ from the username.".to_string());
    }
    None
}

/// Terminal in raw mode for masked input; restored on drop.
struct MaskedTerminal {
    out: Stderr,
}

impl MaskedTerminal {
    fn open() -> Result<Self, Box<dyn Error + Send + Sync>> {
        terminal::enable_raw_mode()?;
        Ok(Self {
            out: std::io::stderr(),
        })
    }

    /// Replace the current line with `text`.
    fn show(&mut self, text: &str) -> std::io::Result<()> {
        execute!(
            self.out,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine),
            Print(text)
        )?;
        self.out.flush()
    }

    fn read_masked(&mut self, prompt: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
        self.show(prompt)?;

        let mut buf = String::new();
        loop {
            let Event::Key(KeyEvent {
                code,
                modifiers,
                kind,
                ..
            }) = event::read()?
            else {
                continue;
            };
            if kind == KeyEventKind::Release {
                continue;
            }
            let control = modifiers.contains(KeyModifiers::CONTROL);

            match code {
                KeyCode::Enter => {
                    execute!(self.out, Print("\r\n"))?;
                    return Ok(buf);
                }
                KeyCode::Esc => return self.cancel(),
                KeyCode::Char('c') if control => return self.cancel(),
                KeyCode::Char('u') if control => {
                    buf.clear();
                    self.show(prompt)?;
                }
                KeyCode::Backspace => {
                    if buf.pop().is_some() {
                        execute!(self.out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
                        self.out.flush()?;
                    }
                }
                KeyCode::Char(ch) if !control => {
                    buf.push(ch);
                    execute!(self.out, Print("*"))?;
                    self.out.flush()?;
                }
                _ => {}
            }
        }
    }

    fn cancel(&mut self) -> Result<String, Box<dyn Error + Send + Sync>> {
        execute!(self.out, Print("\r\n"))?;
        Err("account creation cancelled".into())
    }
}

impl Drop for MaskedTerminal {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

/// Ask for a new password for `username` and its confirmation.
fn read_new_password(username: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
    let mut term = MaskedTerminal::open()?;
    for _ in 0..PASSWORD_ATTEMPTS {
        let password = term.read_masked(&format!("Password for {username}: "))?;
        if let Some(problem) = password_problem(username, &password) {
            term.show(&format!("{problem}\r\n"))?;
            continue;
        }

        if term.read_masked("Repeat password: ")? == password {
            return Ok(password);
        }
        term.show("Passwords differ, start over.\r\n")?;
    }

    Err(format!("no password set for {username} after {PASSWORD_ATTEMPTS} attempts").into())
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

/// Print user-facing engine failures and exit, propagate the rest.
fn report<T>(result: Result<T, EngineError>) -> Result<T, Box<dyn Error + Send + Sync>> {
    match result {
        Ok(value) => Ok(value),
        Err(
            err @ (EngineError::ExistingKey(_)
            | EngineError::KeyNotFound(_)
            | EngineError::InvalidField(_)),
        ) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
        Err(err) => Err(err.into()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::User(User {
            command: UserCommand::Create(args),
        }) => {
            let password = read_new_password(&args.username)?;
            let user = report(
                engine
                    .create_user(NewUser {
                        username: &args.username,
                        password: &password,
                        email: args.email.as_deref(),
                        is_staff: args.staff,
                        is_superuser: args.superuser,
                    })
                    .await,
            )?;
            println!(
                "created user: {} (staff: {}, superuser: {})",
                user.username, user.is_staff, user.is_superuser
            );
        }
        Command::User(User {
            command: UserCommand::Promote(args),
        }) => {
            let user = report(engine.set_staff(&args.username, !args.revoke).await)?;
            println!("{}: staff = {}", user.username, user.is_staff);
        }
        Command::Category(Category {
            command: CategoryCommand::Create(args),
        }) => {
            let category = report(
                engine
                    .create_category(&args.name, args.slug.as_deref())
                    .await,
            )?;
            println!("created category: {} ({})", category.name, category.slug);
        }
        Command::Subcategory(Subcategory {
            command: SubcategoryCommand::Create(args),
        }) => {
            let subcategory = report(
                engine
                    .create_subcategory(&args.category, &args.name, args.slug.as_deref())
                    .await,
            )?;
            println!(
                "created subcategory: {} ({}) under {}",
                subcategory.name, subcategory.slug, args.category
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_passwords_are_refused() {
        assert!(password_problem("alice", "").is_some());
        assert!(password_problem("alice", "seven77").is_some());
        assert_eq!(password_problem("alice", "eight888"), None);
    }

    #[test]
    fn blank_passwords_are_refused() {
        assert_eq!(
            password_problem("alice", "          ").as_deref(),
            Some("Password must not be blank.")
        );
    }

    #[test]
    fn password_must_differ_from_username() {
        assert!(password_problem("producer", "Producer").is_some());
        assert_eq!(password_problem("producer", "producer1"), None);
    }
}
