use bgg_suggest::{EngineOptions, ExpansionMode, Suggestion, SuggestQuery, SuggestionEngine, SuggestionReport};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bgg-suggest")]
#[command(
    about = "Help board game players to choose the best games using BoardGameGeek data",
    long_about = "Help board game players to choose the best games using BoardGameGeek data.\n\
                  BGG users and games stats are cached locally to reduce API usage and \
                  to allow offline suggestions.",
    after_help = "BoardGameGeek XML API Terms of use: https://boardgamegeek.com/wiki/page/XML_API_Terms_of_Use"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Database path (default: $BGG_DB_PATH or bgg-suggest.db)
    #[arg(long, global = true)]
    db: Option<String>,

    /// Print debug messages and detailed evaluations
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Suggest games for a group of players
    Suggest {
        /// Indicative playing time in minutes
        #[arg(short, long, default_value = "0")]
        time: u32,

        /// Indicative game weight (0.0 - 5.0)
        #[arg(short, long, default_value = "0.0")]
        weight: f64,

        /// BGG username of players
        #[arg(short, long, num_args = 1..)]
        username: Vec<String>,

        /// How many guests (not BGG users) are present?
        #[arg(short, long, default_value = "0")]
        guests: usize,

        /// Suggest only games owned by given BGG usernames (default: the players' collections)
        #[arg(short, long, num_args = 1..)]
        collection: Vec<String>,

        /// Limit to how many results (0 for all)
        #[arg(short, long, default_value = "0")]
        limit: usize,

        /// Re-download all data from BoardGameGeek
        #[arg(short, long)]
        force: bool,

        /// List expansions as separate games
        #[arg(short, long)]
        expansions: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Get cache statistics
    Stats,

    /// Clean up old cache entries
    Cleanup {
        /// Maximum age in days
        #[arg(short, long, default_value = "30")]
        max_age_days: i64,
    },

    /// Remove every cached player and game
    Clear,
}

fn print_details(suggestion: &Suggestion, indent: &str) {
    if let Some(evaluation) = &suggestion.evaluation {
        println!("{}Detailed evaluation:", indent);
        for line in evaluation.describe() {
            println!("{}  {}", indent, line);
        }
    }
}

fn print_report(report: &SuggestionReport, details: bool) {
    println!(
        "🎲 Game suggestion for {} players ({} playable games):",
        report.players, report.playable_games
    );

    if report.is_empty() {
        println!("   Nothing to suggest");
        return;
    }

    for (i, suggestion) in report.suggestions.iter().enumerate() {
        println!("   {}. {}", i + 1, suggestion.display());
        if details {
            print_details(suggestion, "      ");
        }

        for expansion in &suggestion.expansions {
            match expansion.score {
                Some(score) => println!("      with expansion {} [{:.4}]", expansion.game.display_name(), score),
                None => println!("      with expansion {}", expansion.game.display_name()),
            }

            if details {
                if let Some(evaluation) = &expansion.evaluation {
                    for line in evaluation.describe() {
                        println!("         {}", line);
                    }
                }
            }
        }
    }

    println!("\n   Ranking: {} ({:.2}ms)", report.ranking_method, report.latency_ms);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_target(false)
        .init();

    let mut options = EngineOptions::from_env();
    if let Some(db) = cli.db {
        options.db_path = db;
    }

    let engine = SuggestionEngine::new(options).await?;

    match cli.command {
        Commands::Suggest {
            time,
            weight,
            username,
            guests,
            collection,
            limit,
            force,
            expansions,
            json,
        } => {
            let query = SuggestQuery {
                usernames: username,
                guests,
                collection,
                playing_time: Some(time),
                weight: Some(weight),
                limit: Some(limit),
                use_cache: !force,
                expansion_mode: if expansions {
                    ExpansionMode::Separate
                } else {
                    ExpansionMode::Grouped
                },
            };

            let report = engine.suggest(query).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report, cli.debug);
            }
        }

        Commands::Stats => {
            let stats = engine.cache_stats().await?;

            println!("📊 Cache Statistics:");
            println!("   Players: {}", stats.players);
            println!("   Games: {}", stats.games);
            println!("   Total hits: {}", stats.total_hits);
            println!("   Avg hits/entry: {:.2}", stats.avg_hit_count());

            if let Some(oldest) = stats.oldest_entry {
                println!("   Oldest entry: {}", oldest.format("%Y-%m-%d %H:%M:%S"));
            }

            if let Some(newest) = stats.newest_entry {
                println!("   Newest entry: {}", newest.format("%Y-%m-%d %H:%M:%S"));
            }
        }

        Commands::Cleanup { max_age_days } => {
            println!("🧹 Cleaning up entries older than {} days...", max_age_days);

            let deleted = engine.cleanup_cache(max_age_days).await?;

            println!("✅ Deleted {} entries", deleted);
        }

        Commands::Clear => {
            let deleted = engine.clear_cache().await?;

            println!("✅ Deleted {} entries", deleted);
        }
    }

    Ok(())
}
