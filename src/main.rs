use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;

use taskpath::config::Config;
use taskpath::core::{DependencyType, EdgeCandidate, EdgeId};
use taskpath::store::JsonFileStore;
use taskpath::{plog, plog_error, Error, Result, ScopeService};

/// taskpath - task dependency leveling and critical path scheduling
#[derive(Parser, Debug)]
#[command(name = "taskpath")]
#[command(version, about, long_about = None)]
#[command(after_help = "ENVIRONMENT:\n    TASKPATH_DEBUG=1     Enable debug logging (alternative to --debug)")]
pub struct Cli {
    /// Enable debug logging (writes to ~/.taskpath/taskpath.log)
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// JSON record store to use instead of the configured one
    #[arg(long, global = true)]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Print the layout level of every task in a scope
    Levels {
        #[arg(long, short = 's')]
        scope: Option<String>,
    },

    /// Print earliest/latest times, float and critical tasks for a scope
    Schedule {
        #[arg(long, short = 's')]
        scope: Option<String>,
    },

    /// Print levels and schedule together
    Report {
        #[arg(long, short = 's')]
        scope: Option<String>,
    },

    /// Add a dependency: TASK cannot proceed until DEPENDS_ON allows it
    Link {
        /// The dependent task
        #[arg(long)]
        task: String,

        /// The prerequisite task
        #[arg(long = "depends-on")]
        depends_on: String,

        /// Dependency type (fs, ss, ff, sf)
        #[arg(long = "type", short = 't', default_value = "fs")]
        dependency_type: DependencyType,

        #[arg(long, short = 's')]
        scope: Option<String>,
    },

    /// Remove a dependency by id
    Unlink {
        edge_id: EdgeId,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let data_path = match cli.data {
        Some(path) => path,
        None => config.data_path()?,
    };
    plog!("Using record store {}", data_path.display());
    let mut service = ScopeService::new(JsonFileStore::new(data_path));

    match cli.command {
        Command::Levels { scope } => {
            let scope = config.scope_or_default(scope.as_deref())?;
            print_json(&service.levels(&scope)?)
        }
        Command::Schedule { scope } => {
            let scope = config.scope_or_default(scope.as_deref())?;
            print_json(&service.schedule(&scope, Utc::now())?)
        }
        Command::Report { scope } => {
            let scope = config.scope_or_default(scope.as_deref())?;
            let report = service.scope_report(&scope, Utc::now())?;
            for warning in &report.warnings {
                eprintln!("warning: {}", warning);
            }
            print_json(&report)
        }
        Command::Link {
            task,
            depends_on,
            dependency_type,
            scope,
        } => {
            let scope = config.scope_or_default(scope.as_deref())?;
            let candidate = EdgeCandidate::new(task, depends_on).with_type(dependency_type);
            let id = service.create_dependency_edge(&scope, candidate)?;
            println!("{}", id);
            Ok(())
        }
        Command::Unlink { edge_id } => {
            service.remove_dependency_edge(&edge_id)?;
            println!("removed {}", edge_id.short());
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    taskpath::log::init_with_debug(cli.debug);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if !e.is_user_error() {
                plog_error!("{}", e);
            }
            eprintln!("error: {}", e);
            if matches!(e, Error::CycleDetected { .. }) {
                eprintln!("hint: run `taskpath levels` to see which tasks are affected");
            }
            ExitCode::FAILURE
        }
    }
}
