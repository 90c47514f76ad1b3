//! Eatventure CLI
//!
//! Usage:
//!   eatventure                              # Interactive session
//!   eatventure --state-file me.json         # Interactive, ledger saved between runs
//!   eatventure --tick-ms 100                # Faster scan ritual for demos
//!   eatventure --serve                      # HTTP API server
//!   eatventure --json                       # JSON event lines instead of text

use clap::Parser;
use colored::Colorize;
use log::error;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tokio::time::{interval, MissedTickBehavior};

use eatventure::core::{
    parse_command, run_server, ApiConfig, Catalog, Command, ListFilter, SessionConfig,
    SessionController,
};
use eatventure::types::{RestaurantEntry, SessionEvent};
use eatventure::{DEFAULT_INITIAL_BALANCE, DEFAULT_TICK_MS, RITUAL_DURATION_SECS, VERSION};

#[derive(Parser, Debug)]
#[command(
    name = "eatventure",
    version = VERSION,
    about = "Eatventure - discover restaurants, check in, earn points, redeem rewards",
    long_about = "Eatventure is a dining-discovery game.\n\n\
                  Check in at a restaurant you have not visited yet to earn its points,\n\
                  then spend points on rewards. Both actions run a 30-second scan\n\
                  ritual that can be cancelled before it completes.\n\n\
                  Modes:\n  \
                  (default)  Interactive terminal session\n  \
                  --serve    HTTP API server"
)]
struct Args {
    /// Run as HTTP API server
    #[arg(short, long)]
    serve: bool,

    /// Server address (default: 127.0.0.1:3000)
    #[arg(long, default_value = "127.0.0.1:3000")]
    addr: String,

    /// Starting balance for a fresh session
    #[arg(long, default_value_t = DEFAULT_INITIAL_BALANCE)]
    balance: u32,

    /// Restaurants already visited in a fresh session (comma separated)
    #[arg(long, value_delimiter = ',', default_values_t = eatventure::DEFAULT_VISITED)]
    visited: Vec<u32>,

    /// Ledger record file, restored at start and written after every change
    #[arg(long)]
    state_file: Option<PathBuf>,

    /// Directory for per-session ledger records (server mode)
    #[arg(long)]
    store_dir: Option<PathBuf>,

    /// Milliseconds per ritual tick
    #[arg(long, default_value_t = DEFAULT_TICK_MS)]
    tick_ms: u64,

    /// Output events as JSON lines
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let color = if args.no_color { ColorChoice::Never } else { ColorChoice::Auto };
    let level = args.log_level.parse().unwrap_or(LevelFilter::Warn);
    let _ = TermLogger::init(level, Config::default(), TerminalMode::Stderr, color);
    if args.no_color {
        colored::control::set_override(false);
    }

    let result = if args.serve {
        run_serve(&args).await
    } else {
        run_interactive(&args).await
    };

    if let Err(e) = result {
        error!("fatal: {}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Run HTTP API server
async fn run_serve(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    print_header("API Server");
    let config = ApiConfig {
        tick_period: Duration::from_millis(args.tick_ms),
        store_dir: args.store_dir.clone(),
    };
    run_server(&args.addr, config).await
}

/// Run an interactive terminal session
async fn run_interactive(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = SessionConfig {
        initial_balance: args.balance,
        initial_visited: args.visited.clone(),
        store_path: args.state_file.clone(),
    };
    let mut session = SessionController::new(Catalog::oakland(), config)?;
    let mut events = session.subscribe();

    let mut ticker = interval(Duration::from_millis(args.tick_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    if !args.json {
        print_header("Interactive");
        print_help();
        print_status(&session);
        prompt();
    }

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    if !args.json { prompt(); }
                    continue;
                }
                match parse_command(&line) {
                    Ok(Command::Quit) => break,
                    Ok(command) => {
                        let started = run_command(&mut session, command, args.json);
                        if started {
                            // Full period before the first tick
                            ticker.reset();
                        }
                    }
                    Err(msg) => println!("{}", msg.yellow()),
                }
            }
            _ = ticker.tick(), if session.active_ritual().is_some() => {
                if let Err(e) = session.tick() {
                    // Invariant violations are logged by the controller
                    println!("{}", format!("⚠ internal error: {} [{}]", e, e.code()).red().bold());
                }
            }
        }

        let resolved = render_events(&mut events, args.json);
        if !args.json && (resolved || session.active_ritual().is_none()) {
            prompt();
        }
    }

    if !args.json {
        let stats = session.stats();
        println!(
            "\nSession ended. {} pts | {}/{} restaurants visited",
            stats.balance, stats.visited_count, stats.total_restaurants
        );
    }
    Ok(())
}

/// Execute one command, returns true if a ritual was started
fn run_command(session: &mut SessionController, command: Command, json: bool) -> bool {
    match command {
        Command::List(filter) => {
            print_restaurants(session, &filter, json);
            false
        }
        Command::Rewards => {
            print_rewards(session, json);
            false
        }
        Command::Status => {
            if json {
                println!("{}", serde_json::to_string(&session.stats()).unwrap_or_default());
            } else {
                print_status(session);
            }
            false
        }
        // Rejections arrive as events, so the Err value itself is not printed
        Command::CheckIn(id) => session.start_check_in(id).is_ok(),
        Command::Redeem(id) => session.start_redemption(id).is_ok(),
        Command::Cancel => {
            if session.cancel_active_ritual().is_none() && !json {
                println!("{}", "Nothing to cancel".dimmed());
            }
            false
        }
        Command::Help => {
            print_help();
            false
        }
        Command::Quit => false,
    }
}

/// Print pending events, returns true if a ritual resolved
fn render_events(events: &mut broadcast::Receiver<SessionEvent>, json: bool) -> bool {
    let mut resolved = false;
    while let Ok(event) = events.try_recv() {
        if json {
            println!("{}", serde_json::to_string(&event).unwrap_or_default());
            continue;
        }
        match &event {
            SessionEvent::RitualTick { progress } => {
                print!("\r  {} ", progress.to_bar_string(RITUAL_DURATION_SECS as usize).cyan());
                let _ = std::io::stdout().flush();
            }
            SessionEvent::RitualStarted { .. } => {
                if let Some(msg) = event.message() {
                    println!("{}", msg.cyan().bold());
                    println!("{}", "  (type 'cancel' to stop)".dimmed());
                }
            }
            SessionEvent::CheckInCompleted { balance, .. }
            | SessionEvent::RedemptionCompleted { balance, .. } => {
                resolved = true;
                if let Some(msg) = event.message() {
                    println!();
                    println!("{}", msg.green().bold());
                    println!("  Balance: {} pts", balance.to_string().bold());
                }
            }
            SessionEvent::RitualCancelled { .. } => {
                resolved = true;
                if let Some(msg) = event.message() {
                    println!();
                    println!("{}", msg.yellow());
                }
            }
            // A rejection never ends a running ritual
            SessionEvent::Rejected { .. } => {
                if let Some(msg) = event.message() {
                    println!("{}", format!("✗ {}", msg).red());
                }
            }
        }
    }
    resolved
}

fn print_restaurants(session: &SessionController, filter: &ListFilter, json: bool) {
    let catalog = session.catalog();
    let selected: Vec<&RestaurantEntry> = match filter {
        ListFilter::All => catalog.restaurants().iter().collect(),
        ListFilter::Rarity(tier) => catalog.by_rarity(*tier).collect(),
        ListFilter::Neighborhood(n) => catalog.by_neighborhood(n).collect(),
    };

    if json {
        println!("{}", serde_json::to_string(&selected).unwrap_or_default());
        return;
    }
    if selected.is_empty() {
        println!("{}", "No restaurants match".dimmed());
        return;
    }
    for r in selected {
        let visited = if session.ledger().has_visited(r.id) {
            "✓ visited".green().to_string()
        } else {
            format!("+{} pts", r.point_value).bold().to_string()
        };
        let rarity = if colored::control::SHOULD_COLORIZE.should_colorize() {
            format!("{}{} {}\x1b[0m", r.rarity.color_code(), r.rarity.emoji(), r.rarity)
        } else {
            r.rarity.to_string()
        };
        println!(
            "{} #{} {} | {} | {} | ★{:.1} | {:.1} mi | {} | {}",
            r.icon, r.id, r.name.bold(), r.cuisine, r.neighborhood, r.rating, r.distance_miles, rarity, visited
        );
        println!("    {}", r.description.dimmed());
    }
}

fn print_rewards(session: &SessionController, json: bool) {
    let rewards = session.catalog().rewards();
    if json {
        println!("{}", serde_json::to_string(rewards).unwrap_or_default());
        return;
    }
    for w in rewards {
        let shortfall = session.ledger().shortfall(w.cost_points);
        let availability = if shortfall == 0 {
            "Redeem Now".green().to_string()
        } else {
            format!("Need {} more points", shortfall).dimmed().to_string()
        };
        println!(
            "{} #{} {} | {} pts | {}",
            w.icon, w.id, w.name.bold(), w.cost_points, availability
        );
        println!("    {}", w.description.dimmed());
    }
}

fn print_status(session: &SessionController) {
    let stats = session.stats();
    println!(
        "🏆 {} pts | {}/{} restaurants visited",
        stats.balance.to_string().green().bold(),
        stats.visited_count,
        stats.total_restaurants
    );
    if let Some(ritual) = session.active_ritual() {
        println!(
            "   {} in progress for #{}: {}s of {}s left",
            ritual.kind(),
            ritual.subject_id(),
            ritual.remaining_secs(),
            ritual.total_secs()
        );
    }
}

fn print_header(mode: &str) {
    println!("{}", "========================================".bold());
    println!("{}", format!("  Eatventure v{} - {}", VERSION, mode).bold());
    println!("{}", "========================================".bold());
    println!();
}

fn print_help() {
    println!("Commands:");
    println!("  list [rarity|neighborhood]  Browse restaurants");
    println!("  rewards                     Browse rewards");
    println!("  status                      Points and visits");
    println!("  checkin <id>                Scan in at a restaurant");
    println!("  redeem <id>                 Spend points on a reward");
    println!("  cancel                      Stop the running scan");
    println!("  quit                        Leave");
    println!();
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_during_ritual_is_not_a_resolution() {
        let mut session = SessionController::new(Catalog::oakland(), SessionConfig::default()).unwrap();
        let mut events = session.subscribe();
        session.start_check_in(4).unwrap();
        assert!(!render_events(&mut events, false));

        assert!(session.start_redemption(1).is_err());
        assert!(!render_events(&mut events, false));
        assert!(session.active_ritual().is_some());
    }

    #[test]
    fn test_cancel_is_a_resolution() {
        let mut session = SessionController::new(Catalog::oakland(), SessionConfig::default()).unwrap();
        let mut events = session.subscribe();
        session.start_check_in(4).unwrap();
        session.cancel_active_ritual();
        assert!(render_events(&mut events, false));
    }
}
