mod ai;
mod app;
mod config;
mod db;
mod error;
mod feed;
mod models;
mod scheduler;
mod services;

use app::App;
use config::Config;
use error::{AppError, Result};
use models::{Language, NewFeed};
use scheduler::DailySchedule;

const USAGE: &str = "usage: ai-daily [--schedule | --once | --list-feeds | --digest [zh|en] \
                     | --add-feed <name> <url> <zh|en> [weight]]";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Schedule,
    Once,
    ListFeeds,
    Digest(Language),
    AddFeed {
        name: String,
        url: String,
        language: Language,
        weight: i64,
    },
}

fn parse_args(args: &[String]) -> Result<Command> {
    let usage = || AppError::Config(USAGE.to_string());
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    match args.as_slice() {
        [] | ["--schedule"] => Ok(Command::Schedule),
        ["--once"] => Ok(Command::Once),
        ["--list-feeds"] => Ok(Command::ListFeeds),
        ["--digest"] => Ok(Command::Digest(Language::En)),
        ["--digest", language] => Ok(Command::Digest(language.parse()?)),
        ["--add-feed", name, url, language, rest @ ..] if rest.len() <= 1 => {
            let weight = match rest.first() {
                Some(w) => w.parse::<i64>().map_err(|_| usage())?,
                None => 0,
            };
            Ok(Command::AddFeed {
                name: name.to_string(),
                url: url.to_string(),
                language: language.parse()?,
                weight,
            })
        }
        _ => Err(usage()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (RUST_LOG wins, info otherwise)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_args(&args)?;

    // Load configuration
    let config = Config::load()?;

    let app = App::new(&config).await?;

    match command {
        Command::AddFeed {
            name,
            url,
            language,
            weight,
        } => {
            let id = app
                .repository
                .insert_feed(NewFeed {
                    name: name.clone(),
                    url,
                    language,
                    weight,
                    enabled: true,
                })
                .await?;
            println!("Added feed #{id}: {name}");
        }
        Command::ListFeeds => {
            for feed in app.repository.get_all_feeds().await? {
                println!(
                    "#{:<4} {:<3} w={:<4} {} {} ({})",
                    feed.id,
                    feed.language,
                    feed.weight,
                    if feed.enabled { "on " } else { "off" },
                    feed.name,
                    feed.url
                );
            }
        }
        Command::Digest(language) => print_digest(&app, language).await?,
        Command::Once => {
            let report = app.run_daily().await?;
            println!("Inserted {} news items", report.ingest.total());
            for (language, status) in &report.summaries {
                println!("  {language}: {} new, summary {}", report.ingest.count(*language), status.as_str());
            }
        }
        Command::Schedule => {
            scheduler::run(&app, DailySchedule::new(config.schedule_time()?)).await?;
        }
    }

    Ok(())
}

async fn print_digest(app: &App, language: Language) -> Result<()> {
    let daily = app.repository.get_today_daily(language).await?;
    let news = app.repository.get_today_news(language).await?;

    let Some(daily) = daily else {
        println!("No digest for {language} today.");
        return Ok(());
    };

    println!("== {} ({}) ==", daily.date, daily.language);
    match daily.summary.as_deref().filter(|s| !s.is_empty()) {
        Some(summary) => println!("{summary}\n"),
        None => println!("(summary not generated yet)\n"),
    }

    for item in &news {
        println!("{}. {}", item.order_index + 1, item.title);
        println!("   {} | {}", item.source, item.link);
        if !item.tags.is_empty() {
            println!("   tags: {}", item.tags.join(", "));
        }
    }

    Ok(())
}
