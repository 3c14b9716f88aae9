//! subtrack - command-line interface
//!
//! Usage: subtrack <command> [args]

use std::process::ExitCode;
use std::sync::Arc;

use chrono::Utc;
use subtrack::domain::{days_until_date, Subscription, SubscriptionId};
use subtrack::services::{SubscriptionInput, SubscriptionPatch};
use subtrack::{db, telemetry, Config, SqliteSubscriptionStore, SubscriptionService, TelegramNotifier};

const USAGE: &str = "\
Usage: subtrack <command> [arguments]

Commands:
  add <name> <price> <currency> <cycle> <payment_date>
      Example: subtrack add \"Netflix\" 15.99 USD monthly 15-02-2025
  list
  update <id> [name] [price] [currency] [cycle] [payment_date]
      Empty arguments keep the current value.
      Example: subtrack update 1 \"\" 19.99
  delete <id>
  check
  health

Dates use DD-MM-YYYY. Cycle is monthly or yearly.";

/// A parsed command line
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Add(Vec<String>),
    List,
    Update {
        id: SubscriptionId,
        fields: Vec<String>,
    },
    Delete(SubscriptionId),
    Check,
    Health,
}

/// Parse `args` (without the program name)
fn parse_args(args: &[String]) -> Result<Command, String> {
    let (command, rest) = args.split_first().ok_or_else(|| USAGE.to_string())?;

    match command.as_str() {
        "add" => {
            if rest.len() != 5 {
                return Err("Usage: subtrack add <name> <price> <currency> <cycle> <payment_date>".to_string());
            }
            Ok(Command::Add(rest.to_vec()))
        }
        "list" => Ok(Command::List),
        "update" => {
            let (id, fields) = rest
                .split_first()
                .ok_or("Usage: subtrack update <id> [name] [price] [currency] [cycle] [payment_date]")?;
            if fields.len() > 5 {
                return Err("update takes at most 5 fields after the id".to_string());
            }
            Ok(Command::Update {
                id: parse_id(id)?,
                fields: fields.to_vec(),
            })
        }
        "delete" => {
            let id = rest.first().ok_or("Usage: subtrack delete <id>")?;
            Ok(Command::Delete(parse_id(id)?))
        }
        "check" => Ok(Command::Check),
        "health" => Ok(Command::Health),
        "help" | "-h" | "--help" => Err(USAGE.to_string()),
        other => Err(format!("Unknown command: {}\n\n{}", other, USAGE)),
    }
}

fn parse_id(text: &str) -> Result<SubscriptionId, String> {
    text.trim()
        .parse::<SubscriptionId>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| format!("invalid subscription ID: {}", text))
}

fn patch_from_fields(fields: &[String]) -> SubscriptionPatch {
    let field = |i: usize| fields.get(i).cloned();
    SubscriptionPatch {
        name: field(0),
        price: field(1),
        currency: field(2),
        cycle: field(3),
        payment_date: field(4),
    }
}

/// Aligned table with three spaces between columns
fn render_table(subs: &[Subscription]) -> String {
    let header = ["ID", "Name", "Price", "Currency", "Cycle", "Payment Date"];
    let mut rows: Vec<Vec<String>> = vec![
        header.iter().map(|h| h.to_string()).collect(),
        header.iter().map(|h| "-".repeat(h.chars().count())).collect(),
    ];
    rows.extend(subs.iter().map(|sub| {
        vec![
            sub.id.to_string(),
            sub.name.clone(),
            sub.price.to_string(),
            sub.currency.clone(),
            sub.cycle.to_string(),
            sub.formatted_payment_date(),
        ]
    }));

    let widths: Vec<usize> = (0..header.len())
        .map(|col| rows.iter().map(|row| row[col].chars().count()).max().unwrap_or(0))
        .collect();

    rows.iter()
        .map(|row| {
            row.iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{:<width$}", cell, width = width))
                .collect::<Vec<_>>()
                .join("   ")
                .trim_end()
                .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_candidate(sub: &Subscription, days: i64) -> String {
    format!(
        "📢 {}\n   💰 Price: {} {}\n   📅 Payment in: {} days\n   🔄 Cycle: {}\n   📆 Next payment: {}\n",
        sub.name,
        sub.price,
        sub.currency,
        days,
        sub.cycle,
        sub.formatted_payment_date()
    )
}

async fn build_service() -> anyhow::Result<SubscriptionService> {
    let config = Config::from_env()?;
    let pool = db::connect(&config.db_path).await?;
    let notifier = TelegramNotifier::new(
        config.telegram_api_url,
        config.telegram_bot_token,
        config.telegram_chat_id,
    )?;

    Ok(SubscriptionService::new(
        Arc::new(SqliteSubscriptionStore::new(pool)),
        Arc::new(notifier),
    ))
}

async fn execute(command: Command, service: &SubscriptionService) -> anyhow::Result<()> {
    match command {
        Command::Add(fields) => {
            let input = SubscriptionInput {
                name: fields[0].clone(),
                price: fields[1].clone(),
                currency: fields[2].clone(),
                cycle: fields[3].clone(),
                payment_date: fields[4].clone(),
            };
            service.add(&input).await?;
            println!("✓ Subscription added successfully");
        }
        Command::List => {
            let subs = service.list().await?;
            if subs.is_empty() {
                println!("No subscriptions found");
            } else {
                println!("{}", render_table(&subs));
            }
        }
        Command::Update { id, fields } => {
            service.update(id, &patch_from_fields(&fields)).await?;
            println!("✓ Subscription updated successfully");
        }
        Command::Delete(id) => {
            service.delete(id).await?;
            println!("✓ Subscription deleted successfully");
        }
        Command::Check => {
            println!("Checking upcoming payments...");
            let now = Utc::now();

            match service.update_past_due(now).await {
                Ok(sweep) if sweep.failed_count() > 0 => {
                    println!("Error updating past due payments: {} record(s) failed", sweep.failed_count());
                }
                Ok(_) => {}
                Err(e) => println!("Error updating past due payments: {}", e),
            }

            let candidates = service.upcoming(now).await?;
            if candidates.is_empty() {
                println!("No upcoming payments found");
                return Ok(());
            }

            println!("Found {} subscriptions with upcoming payments:\n", candidates.len());
            for sub in &candidates {
                println!("{}", render_candidate(sub, days_until_date(sub.next_payment_date, now)));
            }

            let report = service.send_notifications(&candidates, now).await;
            if report.failed_count() > 0 {
                println!("Error sending notifications: {} failed", report.failed_count());
            }
        }
        Command::Health => {
            service
                .notifier_health()
                .await
                .map_err(|e| anyhow::anyhow!("Telegram bot health check failed: {}", e))?;
            println!("✓ Telegram bot is healthy");
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    telemetry::init_tracing("subtrack=warn");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match parse_args(&args) {
        Ok(command) => command,
        Err(message) => {
            eprintln!("{}", message);
            return ExitCode::FAILURE;
        }
    };

    let result = match build_service().await {
        Ok(service) => execute(command, &service).await,
        Err(e) => Err(e.context("Failed to initialize")),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
