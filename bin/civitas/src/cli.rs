use clap::{Parser, Subcommand};
use cv_core::{Category, Status};

/// Report civic issues, follow their progress, and climb the leaderboard.
#[derive(Debug, Parser)]
#[command(name = "civitas", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start a session under NAME (no password is asked)
    Login {
        name: String,
        /// Log in with the admin role
        #[arg(long)]
        admin: bool,
    },
    /// End the current session
    Logout,
    /// Show the current actor
    Whoami,
    /// File a new issue as the current actor
    Report {
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: String,
        #[arg(long)]
        location: String,
        #[arg(long)]
        category: Option<Category>,
        /// Fill in a missing title or category with the AI helpers
        #[arg(long)]
        assist: bool,
    },
    /// Set an issue's status (admin only)
    Status { issue_id: String, status: Status },
    /// Every issue, most recent first
    Feed,
    /// Issues reported by the current actor
    Mine,
    /// Users ranked by points
    Leaderboard {
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Issue counters for the admin dashboard
    Dashboard,
    /// Issue counts per status
    Analytics,
    /// Suggest a category for a description
    Categorize { description: String },
    /// Suggest a title and a polished description
    Summarize { description: String },
    /// Generate medal images for the given usernames
    Medals {
        #[arg(required = true)]
        usernames: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_status_and_category() {
        let cli = Cli::try_parse_from(["civitas", "status", "issue-1", "in-progress"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Status { ref issue_id, status: Status::InProgress } if issue_id == "issue-1"
        ));

        let cli = Cli::try_parse_from([
            "civitas", "report", "--description", "d", "--location", "l", "--category", "water",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Command::Report { category: Some(Category::Water), assist: false, .. }
        ));
    }

    #[test]
    fn test_rejects_unknown_category() {
        assert!(Cli::try_parse_from([
            "civitas", "report", "--description", "d", "--location", "l", "--category", "noise",
        ])
        .is_err());
    }
}
