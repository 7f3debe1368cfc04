use clap::{Parser, Subcommand};
use hilites_core::commands::{self, MatchPanel};
use hilites_core::config::Config;
use hilites_core::discovery::DiscoveryState;
use hilites_core::types::MatchId;
use hilites_core::{init_tracing, AppState};
use std::collections::HashSet;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "hilites")]
#[command(about = "Find and list match highlights from the Hilites backend")]
#[command(version)]
struct Args {
    /// Backend base URL
    #[arg(long, env = "HILITES_API_URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show highlights for matches, discovering them when none are stored yet
    Discover {
        #[arg(required = true)]
        match_ids: Vec<MatchId>,
    },
    /// Print the discovery service status
    Status,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    let mut config = Config::from_env();
    if let Some(url) = args.api_url.as_deref() {
        config = config.with_api_url(url);
    }
    info!("Using Hilites API at {}", config.api_url);

    let app = match AppState::from_config(&config) {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to set up API client: {e}");
            return ExitCode::FAILURE;
        }
    };

    match args.command {
        Command::Discover { match_ids } => {
            let mut failed = false;
            // One match at a time, the same way the UI allows it.
            for match_id in unique_match_ids(match_ids) {
                let panel = commands::toggle_match(match_id, &app).await;
                print_panel(&panel);
                failed |= panel.state == DiscoveryState::Failed;
            }
            commands::collapse_all(&app);
            if failed {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Command::Status => match commands::discovery_status(&app).await {
            Ok(status) => {
                match serde_json::to_string_pretty(&status) {
                    Ok(text) => println!("{text}"),
                    Err(_) => println!("{status}"),
                }
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("{e}");
                ExitCode::FAILURE
            }
        },
    }
}

/// Drop repeated ids, keeping first-seen order. Toggling a match twice would
/// collapse it again.
fn unique_match_ids(mut match_ids: Vec<MatchId>) -> Vec<MatchId> {
    let mut seen = HashSet::new();
    match_ids.retain(|id| seen.insert(*id));
    match_ids
}

fn print_panel(panel: &MatchPanel) {
    println!("Match {}", panel.match_id);
    if let Some(err) = &panel.error {
        println!("  ! {err}");
        return;
    }
    if !panel.has_highlights {
        println!("  No highlights found for this match.");
        return;
    }
    for h in &panel.highlights {
        let channel = h.channel_name.as_deref().unwrap_or("unknown channel");
        let views = h
            .view_count
            .map(|v| v.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        println!(
            "  {} [{}] {} · {} views",
            h.title,
            h.formatted_duration(),
            channel,
            views
        );
        println!("    {}", h.embed_url());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_match_ids_keeps_first_seen_order() {
        assert_eq!(unique_match_ids(vec![5, 5]), vec![5]);
        assert_eq!(unique_match_ids(vec![3, 1, 3, 2, 1]), vec![3, 1, 2]);
        assert!(unique_match_ids(Vec::new()).is_empty());
    }

    #[test]
    fn test_discover_args_with_repeated_ids() {
        let args = Args::try_parse_from(["hilites", "discover", "5", "5", "7"]).unwrap();
        match args.command {
            Command::Discover { match_ids } => {
                assert_eq!(unique_match_ids(match_ids), vec![5, 7]);
            }
            Command::Status => panic!("expected discover"),
        }
    }
}
