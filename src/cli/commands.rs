//! Command definitions for the Adhan CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::types::{parse_date_key, Prayer, PrayerTime};

// ============================================================================
// CLI Structure
// ============================================================================

/// Adhan - prayer-time scheduler that plays the Adhan on time
#[derive(Parser, Debug)]
#[command(
    name = "adhan",
    version,
    about = "Prayer-time scheduler that plays the Adhan at each prayer",
    long_about = "Fetches a year of prayer times for a city, keeps them on disk, and \
                  runs a background daemon that plays the Adhan at each prayer time.",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the scheduler daemon in the foreground
    Daemon,

    /// Load a city's prayer times (fetching them if not saved) and start playing
    Load(LocationArgs),

    /// Show prayer times for a day of the active schedule
    Show {
        /// Date as YYYY-MM-DD (defaults to today)
        #[arg(short, long, value_parser = validate_date)]
        date: Option<String>,
    },

    /// Show scheduler status
    Status,

    /// Stop playing the Adhan
    Stop,

    /// Change one prayer's time on one day
    SetTime(SetTimeArgs),

    /// Use a custom Adhan file for a prayer on every day
    SetAdhan(SetAdhanArgs),

    /// List saved schedules
    List,

    /// Delete a saved schedule
    Delete {
        /// File name as shown by `list` (e.g. cairo_egypt.json)
        filename: String,
    },

    /// Show or set the home location loaded when the daemon starts
    Home(HomeArgs),

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ============================================================================
// Command Arguments
// ============================================================================

/// City and country of a schedule
#[derive(Args, Debug, Clone)]
pub struct LocationArgs {
    /// City name (e.g. "New York")
    #[arg(value_parser = validate_name)]
    pub city: String,

    /// Country name (e.g. "USA")
    #[arg(value_parser = validate_name)]
    pub country: String,
}

/// Arguments for the set-time command
#[derive(Args, Debug, Clone)]
pub struct SetTimeArgs {
    /// Prayer name (Fajr, Dhuhr, Asr, Maghrib, Isha)
    #[arg(value_parser = parse_prayer)]
    pub prayer: Prayer,

    /// New time as HH:MM (24-hour)
    #[arg(value_parser = validate_time)]
    pub time: String,

    /// Date as YYYY-MM-DD (defaults to today)
    #[arg(short, long, value_parser = validate_date)]
    pub date: Option<String>,
}

/// Arguments for the set-adhan command
#[derive(Args, Debug, Clone)]
pub struct SetAdhanArgs {
    /// Prayer name (Fajr, Dhuhr, Asr, Maghrib, Isha)
    #[arg(value_parser = parse_prayer)]
    pub prayer: Prayer,

    /// Audio file to play for this prayer
    pub path: PathBuf,
}

/// Arguments for the home command
#[derive(Args, Debug, Clone)]
pub struct HomeArgs {
    /// City to set as home (shows the current home when omitted)
    #[arg(requires = "country", value_parser = validate_name)]
    pub city: Option<String>,

    /// Country to set as home
    #[arg(value_parser = validate_name)]
    pub country: Option<String>,
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Validates a city or country name.
fn validate_name(s: &str) -> Result<String, String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err("name must not be empty".to_string());
    }
    if trimmed.contains(['/', '\\']) {
        return Err("name must not contain path separators".to_string());
    }
    Ok(trimmed.to_string())
}

fn validate_date(s: &str) -> Result<String, String> {
    parse_date_key(s)
        .map(|_| s.to_string())
        .ok_or_else(|| format!("'{s}' is not a valid date (expected YYYY-MM-DD)"))
}

fn validate_time(s: &str) -> Result<String, String> {
    let well_formed = s.len() == 5 && s.as_bytes()[2] == b':';
    match PrayerTime::parse(s) {
        Some(time) if well_formed => Ok(time.to_string()),
        _ => Err(format!("'{s}' is not a valid time (expected HH:MM, 24-hour)")),
    }
}

fn parse_prayer(s: &str) -> Result<Prayer, String> {
    s.parse()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // ------------------------------------------------------------------------
    // Cli Tests
    // ------------------------------------------------------------------------

    mod cli_tests {
        use super::*;

        #[test]
        fn test_parse_no_args() {
            let cli = Cli::parse_from(["adhan"]);
            assert!(cli.command.is_none());
            assert!(!cli.verbose);
            assert!(cli.config.is_none());
        }

        #[test]
        fn test_parse_global_flags() {
            let cli = Cli::parse_from(["adhan", "status", "-v", "--config", "/tmp/adhan.json"]);
            assert!(cli.verbose);
            assert_eq!(cli.config, Some(PathBuf::from("/tmp/adhan.json")));
        }

        #[test]
        fn test_parse_load() {
            let cli = Cli::parse_from(["adhan", "load", "New York", "USA"]);
            match cli.command {
                Some(Commands::Load(args)) => {
                    assert_eq!(args.city, "New York");
                    assert_eq!(args.country, "USA");
                }
                other => panic!("Expected Load command, got {:?}", other),
            }
        }

        #[test]
        fn test_parse_load_requires_country() {
            assert!(Cli::try_parse_from(["adhan", "load", "Cairo"]).is_err());
        }

        #[test]
        fn test_parse_show_with_date() {
            let cli = Cli::parse_from(["adhan", "show", "--date", "2025-03-01"]);
            match cli.command {
                Some(Commands::Show { date }) => assert_eq!(date.as_deref(), Some("2025-03-01")),
                other => panic!("Expected Show command, got {:?}", other),
            }
        }

        #[test]
        fn test_parse_show_rejects_bad_date() {
            assert!(Cli::try_parse_from(["adhan", "show", "--date", "2025-3-1"]).is_err());
        }

        #[test]
        fn test_parse_set_time() {
            let cli = Cli::parse_from(["adhan", "set-time", "asr", "15:45", "-d", "2025-01-01"]);
            match cli.command {
                Some(Commands::SetTime(args)) => {
                    assert_eq!(args.prayer, Prayer::Asr);
                    assert_eq!(args.time, "15:45");
                    assert_eq!(args.date.as_deref(), Some("2025-01-01"));
                }
                other => panic!("Expected SetTime command, got {:?}", other),
            }
        }

        #[test]
        fn test_parse_set_time_rejects_bad_input() {
            assert!(Cli::try_parse_from(["adhan", "set-time", "Witr", "15:45"]).is_err());
            assert!(Cli::try_parse_from(["adhan", "set-time", "Asr", "25:00"]).is_err());
            assert!(Cli::try_parse_from(["adhan", "set-time", "Asr", "3:45"]).is_err());
        }

        #[test]
        fn test_parse_set_adhan() {
            let cli = Cli::parse_from(["adhan", "set-adhan", "Fajr", "/audio/fajr.mp3"]);
            match cli.command {
                Some(Commands::SetAdhan(args)) => {
                    assert_eq!(args.prayer, Prayer::Fajr);
                    assert_eq!(args.path, PathBuf::from("/audio/fajr.mp3"));
                }
                other => panic!("Expected SetAdhan command, got {:?}", other),
            }
        }

        #[test]
        fn test_parse_home() {
            let cli = Cli::parse_from(["adhan", "home"]);
            assert!(matches!(
                cli.command,
                Some(Commands::Home(HomeArgs { city: None, country: None }))
            ));

            let cli = Cli::parse_from(["adhan", "home", "Mecca", "Saudi Arabia"]);
            match cli.command {
                Some(Commands::Home(args)) => {
                    assert_eq!(args.city.as_deref(), Some("Mecca"));
                    assert_eq!(args.country.as_deref(), Some("Saudi Arabia"));
                }
                other => panic!("Expected Home command, got {:?}", other),
            }

            assert!(Cli::try_parse_from(["adhan", "home", "Mecca"]).is_err());
        }

        #[test]
        fn test_parse_delete() {
            let cli = Cli::parse_from(["adhan", "delete", "cairo_egypt.json"]);
            assert!(matches!(
                cli.command,
                Some(Commands::Delete { filename }) if filename == "cairo_egypt.json"
            ));
        }

        #[test]
        fn test_parse_completions() {
            let cli = Cli::parse_from(["adhan", "completions", "bash"]);
            assert!(matches!(cli.command, Some(Commands::Completions { .. })));
        }
    }

    // ------------------------------------------------------------------------
    // Validation Tests
    // ------------------------------------------------------------------------

    mod validation_tests {
        use super::*;

        #[test]
        fn test_validate_name() {
            assert_eq!(validate_name("  Cairo "), Ok("Cairo".to_string()));
            assert!(validate_name("   ").is_err());
            assert!(validate_name("../etc").is_err());
        }

        #[test]
        fn test_validate_time() {
            assert_eq!(validate_time("05:30"), Ok("05:30".to_string()));
            assert!(validate_time("5:30").is_err());
            assert!(validate_time("05:61").is_err());
            assert!(validate_time("").is_err());
            assert!(validate_time("+1:30").is_err());
        }

        #[test]
        fn test_validate_date() {
            assert!(validate_date("2024-02-29").is_ok());
            assert!(validate_date("2025-02-29").is_err());
        }
    }
}
