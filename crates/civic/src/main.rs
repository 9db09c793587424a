//! Civic CLI
//!
//! Talks to the issue service over HTTP. The session is kept in a JSON file
//! between invocations; `--json` switches every command to machine-readable
//! envelopes.

use std::path::Path;

use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use civic::capability::Route;
use civic::cli::{ApiCommands, Cli, Commands, IssueCommands, StaffCommands, UserCommands};
use civic::commands::{CommandExecutor, ViewScope};
use civic::config::ConfigLoader;
use civic::domain::queries::IssueFilter;
use civic::domain::{IssueDraft, Location, Role, StaffDraft, Status};
use civic::output::{
    format_issue_detail, format_issue_line, format_payment_line, format_user_line, ExitCode,
    JsonError, JsonOutput, OutputContext,
};
use civic::session::SessionStore;
use civic::storage::HttpRepository;
use civic::{workflow, CivicError, TriageView};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let output = OutputContext::new(cli.quiet, cli.json);
    let command = cli.command.name();

    let exit_code = match run(cli, &output).await {
        Ok(()) => ExitCode::Success,
        Err(e) => report_error(&e, &output, command),
    };

    if exit_code != ExitCode::Success {
        std::process::exit(exit_code.code());
    }
}

fn report_error(error: &anyhow::Error, output: &OutputContext, command: &str) -> ExitCode {
    let (json, code) = match error.downcast_ref::<CivicError>() {
        Some(err) => (JsonError::from_civic_error(err, command), ExitCode::for_error(err)),
        None => (
            JsonError::new("GENERIC_ERROR", format!("{:#}", error), command),
            ExitCode::GenericError,
        ),
    };

    if output.is_json() {
        match json.to_json_string() {
            Ok(text) => println!("{}", text),
            Err(_) => eprintln!("Error: {}", json.error.message),
        }
    } else {
        if output.print_error(&json.error.message).is_err() {
            eprintln!("Error: {}", json.error.message);
        }
        for hint in &json.error.suggestions {
            eprintln!("  hint: {}", hint);
        }
    }
    code
}

/// Print `data` as a JSON envelope or as the human-readable text.
fn emit<T: Serialize>(output: &OutputContext, command: &str, data: &T, human: impl FnOnce() -> String) -> Result<()> {
    if output.is_json() {
        println!("{}", JsonOutput::success(data, command).to_json_string()?);
    } else {
        output.print_data(human())?;
    }
    Ok(())
}

fn build_executor(config_path: Option<&Path>) -> Result<CommandExecutor<HttpRepository>> {
    let mut loader = ConfigLoader::new().with_user_config()?;
    if let Some(path) = config_path {
        loader = loader.with_file(path)?;
    }
    let config = loader.with_process_env().build();

    let session = SessionStore::persistent(config.session_file())?;
    let repo = HttpRepository::from_config(&config, session.clone())?;
    tracing::debug!(base_url = repo.base_url(), "using API");
    Ok(CommandExecutor::new(repo, session).with_report_limit(config.free_report_limit()))
}

async fn run(cli: Cli, output: &OutputContext) -> Result<()> {
    let command = cli.command.name();
    match cli.command {
        // answered locally, needs neither config nor session
        Commands::Workflow { status, role } => show_workflow(output, command, status, role),
        Commands::Api(cmd) => {
            let executor = build_executor(cli.config.as_deref())?;
            let scope = ViewScope::new(command);
            scope.cancel_on_ctrl_c();
            run_api(&executor, &scope, cmd, output, command).await
        }
    }
}

async fn run_api(
    executor: &CommandExecutor<HttpRepository>,
    scope: &ViewScope,
    cmd: ApiCommands,
    output: &OutputContext,
    command: &str,
) -> Result<()> {
    match cmd {
        ApiCommands::Login { email, password } => {
            let user = scope.run(executor.login(&email, &password)).await?;
            if output.is_json() {
                emit(output, command, &user, String::new)?;
            } else {
                output.print_success(format!("Logged in as {} ({})", user.name, user.role))?;
            }
        }
        ApiCommands::Logout => {
            executor.logout()?;
            output.print_success("Logged out")?;
        }
        ApiCommands::Whoami => {
            let user = executor.whoami()?;
            emit(output, command, &user, || format_user_line(&user))?;
        }
        ApiCommands::Register {
            name,
            email,
            password,
        } => {
            let user = scope.run(executor.register(&name, &email, &password)).await?;
            if output.is_json() {
                emit(output, command, &user, String::new)?;
            } else {
                output.print_success(format!("Registered {}; log in with `civic login`", user.email))?;
            }
        }
        ApiCommands::Dashboard => {
            let summary = scope.run(executor.dashboard()).await?;
            emit(output, command, &summary, || {
                let mut rows = vec![format!("Total: {}  Boosted: {}", summary.total, summary.boosted)];
                rows.extend(summary.by_status.iter().map(|(status, count)| format!("  {:<12} {}", status, count)));
                rows.join("\n")
            })?;
        }
        ApiCommands::Nav => {
            let identity = executor.session().require_identity()?;
            let routes = Route::navigation(&identity);
            emit(output, command, &routes, || {
                routes.iter().map(|r| format!("{:?}", r)).collect::<Vec<_>>().join("\n")
            })?;
        }
        ApiCommands::Issue(cmd) => run_issue(executor, scope, cmd, output, command).await?,
        ApiCommands::User(cmd) => match cmd {
            UserCommands::List => {
                let users = scope.run(executor.list_users()).await?;
                emit(output, command, &users, || lines(&users, format_user_line))?;
            }
            UserCommands::Block { id } => {
                let user = scope.run(executor.set_user_blocked(&id, true)).await?;
                emit(output, command, &user, || format!("Blocked {}", user.email))?;
            }
            UserCommands::Unblock { id } => {
                let user = scope.run(executor.set_user_blocked(&id, false)).await?;
                emit(output, command, &user, || format!("Unblocked {}", user.email))?;
            }
        },
        ApiCommands::Staff(cmd) => match cmd {
            StaffCommands::List => {
                let staff = scope.run(executor.list_staff()).await?;
                emit(output, command, &staff, || lines(&staff, format_user_line))?;
            }
            StaffCommands::Add {
                name,
                email,
                phone,
                password,
            } => {
                let draft = StaffDraft {
                    name,
                    email,
                    phone,
                    password,
                };
                let user = scope.run(executor.add_staff(draft)).await?;
                emit(output, command, &user, || format!("Created staff account {} ({})", user.email, user.id))?;
            }
            StaffCommands::Remove { id } => {
                scope.run(executor.remove_staff(&id)).await?;
                emit(output, command, &serde_json::json!({ "removed": id }), || format!("Removed staff {}", id))?;
            }
        },
        ApiCommands::Subscribe => {
            let user = scope.run(executor.subscribe()).await?;
            emit(output, command, &user, || "You are now a premium member".to_string())?;
        }
        ApiCommands::Payments => {
            let payments = scope.run(executor.list_payments()).await?;
            emit(output, command, &payments, || lines(&payments, format_payment_line))?;
        }
    }
    Ok(())
}

fn show_workflow(output: &OutputContext, command: &str, status: Status, role: Role) -> Result<()> {
    let options = workflow::next_options(status, role);
    emit(output, command, &options, || {
        if options.is_empty() {
            format!("No transitions from {} for {}", status, role)
        } else {
            options.iter().map(|s| s.to_string()).collect::<Vec<_>>().join("\n")
        }
    })
}

async fn run_issue(
    executor: &CommandExecutor<HttpRepository>,
    scope: &ViewScope,
    cmd: IssueCommands,
    output: &OutputContext,
    command: &str,
) -> Result<()> {
    match cmd {
        IssueCommands::List {
            status,
            category,
            priority,
            assigned_to,
            citizen,
            boosted,
            search,
            mine,
        } => {
            let filter = IssueFilter {
                status,
                category,
                priority,
                assigned_to,
                citizen_id: citizen,
                boosted_only: boosted,
                search,
            };
            let issues = if mine {
                filter.apply(&scope.run(executor.my_issues()).await?)
            } else {
                scope.run(executor.list_issues(&filter)).await?
            };
            emit(output, command, &issues, || lines(&issues, format_issue_line))?;
        }
        IssueCommands::Show { id } => {
            let id = scope.run(executor.resolve_issue_id(&id)).await?;
            let issue = scope.run(executor.show_issue(&id)).await?;
            emit(output, command, &issue, || format_issue_detail(&issue))?;
        }
        IssueCommands::Report {
            title,
            description,
            category,
            priority,
            address,
            lat,
            lon,
            photos,
        } => {
            let draft = IssueDraft {
                title,
                description,
                category,
                priority,
                location: Location {
                    address,
                    latitude: lat,
                    longitude: lon,
                },
                photos,
            };
            let issue = scope.run(executor.report_issue(draft)).await?;
            emit(output, command, &issue, || format!("Reported issue {}", issue.id))?;
        }
        IssueCommands::Triage { view } => {
            let view = match view {
                Some(v) => TriageView::from(v),
                None => match executor.session().require_identity()?.role {
                    Role::Staff => TriageView::StaffAssigned,
                    _ => TriageView::AdminManage,
                },
            };
            let issues = scope.run(executor.triage_queue(view)).await?;
            emit(output, command, &issues, || lines(&issues, format_issue_line))?;
        }
        IssueCommands::Options { id } => {
            let id = scope.run(executor.resolve_issue_id(&id)).await?;
            let issue = scope.run(executor.show_issue(&id)).await?;
            let options = executor.next_status_options(&issue);
            emit(output, command, &options, || {
                if options.is_empty() {
                    format!("No status changes available for {} ({})", issue.short_id(), issue.status)
                } else {
                    options.iter().map(|s| s.to_string()).collect::<Vec<_>>().join("\n")
                }
            })?;
        }
        IssueCommands::Status {
            id,
            status,
            comment,
        } => {
            let id = scope.run(executor.resolve_issue_id(&id)).await?;
            let mut issue = scope.run(executor.show_issue(&id)).await?;
            scope
                .run(executor.update_status(&mut issue, status, comment.as_deref()))
                .await?;
            emit(output, command, &issue, || format!("{} is now {}", issue.short_id(), issue.status))?;
        }
        IssueCommands::Assign { id, staff } => {
            let id = scope.run(executor.resolve_issue_id(&id)).await?;
            let issue = scope.run(executor.assign_issue(&id, &staff)).await?;
            emit(output, command, &issue, || format!("Assigned {} to {}", issue.short_id(), staff))?;
        }
        IssueCommands::Reject { id } => {
            let id = scope.run(executor.resolve_issue_id(&id)).await?;
            let issue = scope.run(executor.reject_issue(&id)).await?;
            emit(output, command, &issue, || format!("Rejected {}", issue.short_id()))?;
        }
        IssueCommands::Upvote { id } => {
            let id = scope.run(executor.resolve_issue_id(&id)).await?;
            let mut issue = scope.run(executor.show_issue(&id)).await?;
            let receipt = scope.run(executor.upvote(&mut issue)).await?;
            emit(output, command, &receipt, || format!("{} now has {} upvotes", issue.short_id(), receipt.upvotes))?;
        }
        IssueCommands::Boost { id } => {
            let id = scope.run(executor.resolve_issue_id(&id)).await?;
            let issue = scope.run(executor.boost_issue(&id)).await?;
            emit(output, command, &issue, || format!("Boosted {}", issue.short_id()))?;
        }
    }
    Ok(())
}

fn lines<T>(items: &[T], format: impl Fn(&T) -> String) -> String {
    if items.is_empty() {
        return "(none)".to_string();
    }
    items.iter().map(format).collect::<Vec<_>>().join("\n")
}
