use sea_orm::Database;
use sea_orm_migration::prelude::*;

const DEFAULT_DATABASE_URL: &str = "sqlite:./plugin_catalog.db?mode=rwc";

enum Command {
    Up(Option<u32>),
    Down(Option<u32>),
    Fresh,
    Refresh,
    Status,
}

fn parse_command(mut args: impl Iterator<Item = String>) -> Result<Command, String> {
    let name = args.next().unwrap_or_else(|| "up".to_string());
    let steps = args
        .next()
        .map(|raw| raw.parse::<u32>().map_err(|_| format!("invalid step count: {raw}")))
        .transpose()?;

    match name.as_str() {
        "up" => Ok(Command::Up(steps)),
        "down" => Ok(Command::Down(steps.or(Some(1)))),
        "fresh" => Ok(Command::Fresh),
        "refresh" => Ok(Command::Refresh),
        "status" => Ok(Command::Status),
        other => Err(format!("unknown command: {other}")),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let command = match parse_command(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(err) => {
            eprintln!("{err}");
            eprintln!("Usage: migration [up [N] | down [N] | fresh | refresh | status]");
            std::process::exit(2);
        }
    };

    let db_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
    let db = Database::connect(&db_url).await?;

    match command {
        Command::Up(steps) => migration::Migrator::up(&db, steps).await?,
        Command::Down(steps) => migration::Migrator::down(&db, steps).await?,
        Command::Fresh => migration::Migrator::fresh(&db).await?,
        Command::Refresh => migration::Migrator::refresh(&db).await?,
        Command::Status => migration::Migrator::status(&db).await?,
    }

    Ok(())
}
