//! Terminal command parser
//!
//! One command per line: a verb, optionally followed by one argument.

use lazy_static::lazy_static;
use regex::Regex;

use crate::types::RarityTier;

lazy_static! {
    static ref COMMAND: Regex =
        Regex::new(r"^\s*(?P<verb>[A-Za-z-]+)(?:\s+(?P<arg>.+?))?\s*$").unwrap();
}

/// Restaurant listing filter given to `list`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListFilter {
    All,
    Rarity(RarityTier),
    Neighborhood(String),
}

/// A parsed terminal command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List(ListFilter),
    Rewards,
    Status,
    CheckIn(u32),
    Redeem(u32),
    Cancel,
    Help,
    Quit,
}

/// Parse a line. Err carries a message for the user.
pub fn parse_command(line: &str) -> Result<Command, String> {
    let caps = COMMAND
        .captures(line)
        .ok_or_else(|| format!("could not parse '{}', try 'help'", line.trim()))?;
    let verb = caps["verb"].to_ascii_lowercase();
    let arg = caps.name("arg").map(|m| m.as_str());

    match (verb.as_str(), arg) {
        ("list" | "ls" | "discover", None) => Ok(Command::List(ListFilter::All)),
        ("list" | "ls" | "discover", Some(a)) => Ok(Command::List(match a.parse::<RarityTier>() {
            Ok(tier) => ListFilter::Rarity(tier),
            Err(_) => ListFilter::Neighborhood(a.to_string()),
        })),
        ("rewards", None) => Ok(Command::Rewards),
        ("status" | "points", None) => Ok(Command::Status),
        ("checkin" | "check-in" | "scan", Some(a)) => parse_id(a).map(Command::CheckIn),
        ("redeem", Some(a)) => parse_id(a).map(Command::Redeem),
        ("cancel" | "x", None) => Ok(Command::Cancel),
        ("help" | "?", None) => Ok(Command::Help),
        ("quit" | "exit" | "q", None) => Ok(Command::Quit),
        ("checkin" | "check-in" | "scan" | "redeem", None) => Err(format!("'{}' needs an id", verb)),
        (_, Some(_)) if is_known(&verb) => Err(format!("'{}' takes no argument", verb)),
        _ => Err(format!("unknown command '{}', try 'help'", verb)),
    }
}

fn parse_id(arg: &str) -> Result<u32, String> {
    arg.trim_start_matches('#')
        .parse()
        .map_err(|_| format!("'{}' is not a valid id", arg))
}

fn is_known(verb: &str) -> bool {
    matches!(
        verb,
        "rewards" | "status" | "points" | "cancel" | "x" | "help" | "?" | "quit" | "exit" | "q"
    )
}
