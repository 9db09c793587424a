//! Command-line interface definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::domain::{Category, Priority, Role, Status};
use crate::ordering::TriageView;

/// Civic issue tracker
///
/// Report infrastructure problems, upvote them, and work the triage queues.
///
/// Exit Codes:
///   0  - Command succeeded
///   1  - Generic error occurred
///   2  - Invalid arguments, invalid input or refused status change
///   3  - Issue or account not found
///   4  - Policy violation (self upvote, duplicate upvote, report quota)
///   5  - Permission denied
///   6  - Not logged in or session expired
///  10  - Server unreachable or failed
#[derive(Parser)]
#[command(name = "civic", version)]
#[command(about = "Report and triage city infrastructure issues", long_about = None)]
pub struct Cli {
    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Config file (default: ~/.config/civic/civic.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(flatten)]
    Api(ApiCommands),

    /// Show the statuses reachable from STATUS for a role (offline)
    Workflow {
        status: Status,

        #[arg(long, default_value = "admin")]
        role: Role,
    },
}

impl Commands {
    /// Name used in JSON metadata
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Api(cmd) => cmd.name(),
            Commands::Workflow { .. } => "workflow",
        }
    }
}

/// Commands that talk to the issue service
#[derive(Subcommand)]
pub enum ApiCommands {
    /// Log in and store the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Forget the stored session
    Logout,

    /// Show the logged-in profile
    Whoami,

    /// Create a citizen account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Status counts for the current user's issues
    Dashboard,

    /// Screens available to the current user
    Nav,

    /// Issue commands
    #[command(subcommand)]
    Issue(IssueCommands),

    /// Citizen account management (admin)
    #[command(subcommand)]
    User(UserCommands),

    /// Staff account management (admin)
    #[command(subcommand)]
    Staff(StaffCommands),

    /// Upgrade to premium (unlimited reports)
    Subscribe,

    /// Payment history
    Payments,
}

impl ApiCommands {
    /// Name used in JSON metadata
    pub fn name(&self) -> &'static str {
        match self {
            ApiCommands::Login { .. } => "login",
            ApiCommands::Logout => "logout",
            ApiCommands::Whoami => "whoami",
            ApiCommands::Register { .. } => "register",
            ApiCommands::Dashboard => "dashboard",
            ApiCommands::Nav => "nav",
            ApiCommands::Issue(cmd) => cmd.name(),
            ApiCommands::User(cmd) => match cmd {
                UserCommands::List => "user list",
                UserCommands::Block { .. } => "user block",
                UserCommands::Unblock { .. } => "user unblock",
            },
            ApiCommands::Staff(cmd) => match cmd {
                StaffCommands::List => "staff list",
                StaffCommands::Add { .. } => "staff add",
                StaffCommands::Remove { .. } => "staff remove",
            },
            ApiCommands::Subscribe => "subscribe",
            ApiCommands::Payments => "payments",
        }
    }
}

/// Which triage queue to show
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ViewArg {
    /// Issues assigned to me
    Staff,
    /// All issues
    Admin,
}

impl From<ViewArg> for TriageView {
    fn from(view: ViewArg) -> Self {
        match view {
            ViewArg::Staff => TriageView::StaffAssigned,
            ViewArg::Admin => TriageView::AdminManage,
        }
    }
}

#[derive(Subcommand)]
pub enum IssueCommands {
    /// List issues
    List {
        #[arg(long)]
        status: Option<Status>,
        #[arg(long)]
        category: Option<Category>,
        #[arg(long)]
        priority: Option<Priority>,
        /// Staff user id
        #[arg(long)]
        assigned_to: Option<String>,
        /// Reporter user id
        #[arg(long)]
        citizen: Option<String>,
        #[arg(long)]
        boosted: bool,
        /// Case-insensitive text in title, description or address
        #[arg(long)]
        search: Option<String>,
        /// Only the issues on my dashboard
        #[arg(long)]
        mine: bool,
    },

    /// Show one issue with its history
    Show { id: String },

    /// Report a new issue
    Report {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        category: Category,
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long)]
        address: String,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// Image URL or data URL (repeatable, first is primary)
        #[arg(long = "photo")]
        photos: Vec<String>,
    },

    /// Ordered work queue (defaults to the view for my role)
    Triage {
        #[arg(long, value_enum)]
        view: Option<ViewArg>,
    },

    /// Statuses I can move an issue to
    Options { id: String },

    /// Change an issue's status
    Status {
        id: String,
        status: Status,
        #[arg(long)]
        comment: Option<String>,
    },

    /// Assign a pending issue to a staff member
    Assign {
        id: String,
        /// Staff user id
        #[arg(long)]
        staff: String,
    },

    /// Reject a pending issue
    Reject { id: String },

    /// Upvote an issue
    Upvote { id: String },

    /// Boost one of my issues (paid)
    Boost { id: String },
}

impl IssueCommands {
    pub fn name(&self) -> &'static str {
        match self {
            IssueCommands::List { .. } => "issue list",
            IssueCommands::Show { .. } => "issue show",
            IssueCommands::Report { .. } => "issue report",
            IssueCommands::Triage { .. } => "issue triage",
            IssueCommands::Options { .. } => "issue options",
            IssueCommands::Status { .. } => "issue status",
            IssueCommands::Assign { .. } => "issue assign",
            IssueCommands::Reject { .. } => "issue reject",
            IssueCommands::Upvote { .. } => "issue upvote",
            IssueCommands::Boost { .. } => "issue boost",
        }
    }
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// List citizen accounts
    List,
    /// Block a citizen
    Block { id: String },
    /// Unblock a citizen
    Unblock { id: String },
}

#[derive(Subcommand)]
pub enum StaffCommands {
    /// List staff accounts
    List,
    /// Create a staff account
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        password: String,
    },
    /// Delete a staff account
    Remove { id: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_status_change() {
        let cli = Cli::try_parse_from([
            "civic", "issue", "status", "abc123", "in_progress", "--comment", "On it",
        ])
        .unwrap();
        match cli.command {
            Commands::Api(ApiCommands::Issue(IssueCommands::Status { id, status, comment })) => {
                assert_eq!(id, "abc123");
                assert_eq!(status, Status::InProgress);
                assert_eq!(comment.as_deref(), Some("On it"));
            }
            _ => panic!("expected issue status"),
        }
    }

    #[test]
    fn test_parse_report_with_negative_coordinates() {
        let cli = Cli::try_parse_from([
            "civic", "--json", "issue", "report", "--title", "Hole", "--description", "Deep",
            "--category", "pothole", "--address", "Main St", "--lat", "-33.86", "--lon", "151.2",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Api(ApiCommands::Issue(IssueCommands::Report { lat, category, .. })) => {
                assert_eq!(lat, -33.86);
                assert_eq!(category, Category::Pothole);
            }
            _ => panic!("expected issue report"),
        }
    }

    #[test]
    fn test_workflow_is_kept_apart_from_api_commands() {
        let cli = Cli::try_parse_from(["civic", "workflow", "working", "--role", "staff"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Workflow {
                status: Status::Working,
                role: Role::Staff
            }
        ));

        let cli = Cli::try_parse_from(["civic", "payments"]).unwrap();
        assert!(matches!(cli.command, Commands::Api(ApiCommands::Payments)));
        assert_eq!(cli.command.name(), "payments");
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        assert!(Cli::try_parse_from(["civic", "workflow", "done"]).is_err());
    }
}
