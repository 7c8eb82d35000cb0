//! `kanban` command-line entry point.
//!
//! # Responsibility
//! - Load configuration (`.env`, `kanban.toml`, `KANBAN_*`) and open the board.
//! - Expose demo-data administration and read-only board summaries.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use kanban_core::service::task_service::TaskStatistics;
use kanban_core::{
    default_log_level, init_logging, Board, BoardConfig, ContactRepository, LoggingConfig,
    SeedOutcome,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kanban")]
#[command(version, about = "Kanban board data tools")]
struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true, default_value = kanban_core::config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show how many contacts and tasks are stored
    Status,
    /// Upload the demo contacts and tasks
    Upload {
        /// Overwrite even when both collections already hold data
        #[arg(long)]
        force: bool,
    },
    /// Replace contacts and tasks with the demo set
    Reset,
    /// Seed demo users and upload demo data unless present
    Initialize,
    /// Report whether the remote store is reachable
    Connection,
    /// Print the board columns
    Board,
    /// Print contacts grouped by first letter
    Contacts,
    /// Print summary statistics
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = BoardConfig::load(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    let level = if cli.verbose {
        "debug".to_string()
    } else {
        config
            .logging
            .level
            .clone()
            .unwrap_or_else(|| default_log_level().to_string())
    };
    init_logging(&LoggingConfig {
        level,
        log_dir: config.logging.dir.clone(),
    })
    .context("failed to initialize logging")?;

    let board = Board::open(&config).context("failed to open board")?;
    info!(
        "event=cli_start module=cli status=ok config={}",
        cli.config.display()
    );
    run(cli.command, &board).await
}

async fn run(command: Commands, board: &Board) -> Result<()> {
    match command {
        Commands::Status => {
            let status = board.seeder().check().await;
            println!("contacts: {}", status.contacts_count);
            println!("tasks:    {}", status.tasks_count);
            println!("demo data complete: {}", status.all_exist());
        }
        Commands::Upload { force } => {
            let outcome = board.seeder().upload(force).await?;
            print_outcome(outcome);
        }
        Commands::Reset => {
            let outcome = board.seeder().reset().await?;
            print_outcome(outcome);
        }
        Commands::Initialize => {
            let (outcome, users) = board.seeder().initialize().await?;
            print_outcome(outcome);
            if users > 0 {
                println!("created {users} demo users");
            }
        }
        Commands::Connection => {
            let connected = board.store().is_connected().await;
            let backend = board.store().remote().backend_name();
            println!(
                "{backend}: {}",
                if connected { "connected" } else { "offline" }
            );
        }
        Commands::Board => {
            let contacts = board.contacts().list_contacts().await?;
            for column in board.task_service().board().await? {
                println!("[{}] ({})", column.status, column.tasks.len());
                for task in column.tasks {
                    let (done, total) = task.subtask_progress();
                    let assignees: Vec<&str> = task
                        .assigned_to
                        .iter()
                        .filter_map(|id| contacts.iter().find(|c| &c.id == id))
                        .map(|c| c.initials.as_str())
                        .collect();
                    println!(
                        "  - {} due {} {:?} subtasks {done}/{total} [{}]",
                        task.title,
                        task.due_date,
                        task.priority,
                        assignees.join(" ")
                    );
                }
            }
        }
        Commands::Contacts => {
            for group in board.contact_service().list_grouped().await? {
                println!("{}", group.letter);
                for contact in group.contacts {
                    println!("  {} <{}> {}", contact.name, contact.email, contact.phone);
                }
            }
        }
        Commands::Stats => {
            let stats = board.task_service().statistics().await?;
            print_statistics(&stats);
        }
    }
    Ok(())
}

fn print_outcome(outcome: SeedOutcome) {
    match outcome {
        SeedOutcome::Skipped(status) => println!(
            "demo data already present ({} contacts, {} tasks)",
            status.contacts_count, status.tasks_count
        ),
        SeedOutcome::Uploaded { contacts, tasks } => {
            println!("uploaded {contacts} contacts and {tasks} tasks")
        }
    }
}

fn print_statistics(stats: &TaskStatistics) {
    println!("total:          {}", stats.total);
    for status in kanban_core::TaskStatus::ALL {
        println!("{:<15} {}", format!("{status}:"), stats.count_for(status));
    }
    println!("urgent:         {}", stats.urgent);
    match stats.next_urgent_deadline {
        Some(date) => println!("next deadline:  {}", date.format("%B %-d, %Y")),
        None => println!("next deadline:  no urgent tasks"),
    }
}
