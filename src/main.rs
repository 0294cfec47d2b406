use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
};

use clap::{Parser, Subcommand};
use colored::*;
use tracing_subscriber::EnvFilter;

use crate::{
    controller::{CommitOutcome, Controller, ControllerError},
    models::selection::{Filter, Sort},
    storage::{Storage, json::JsonFileStorage},
};

mod controller;
mod models;
mod services;
mod storage;
mod ui;

#[derive(Parser)]
#[command(name = "tasklist", about = "A small to-do list that remembers your tasks")]
struct Cli {
    /// Path of the task store (defaults to the user data directory)
    #[arg(long, global = true, value_name = "PATH")]
    store: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show tasks
    List {
        /// Which tasks to show
        #[arg(short, long, value_enum, default_value_t = Filter::All)]
        filter: Filter,

        /// How to order the shown tasks
        #[arg(short, long, value_enum, default_value_t = Sort::Default)]
        sort: Sort,
    },

    /// Add a new task
    Add {
        /// Task text
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,

        /// Deadline, e.g. "2025-03-01T18:00"
        #[arg(short, long)]
        deadline: Option<String>,
    },

    /// Edit a task's text and/or deadline
    Edit {
        /// Task number
        number: usize,

        /// New task text (keeps the current text when omitted)
        text: Vec<String>,

        /// New deadline
        #[arg(short, long, conflicts_with = "clear_deadline")]
        deadline: Option<String>,

        /// Remove the deadline
        #[arg(long)]
        clear_deadline: bool,
    },

    /// Delete a task
    Delete { number: usize },

    /// Check or uncheck a task
    #[command(alias = "done")]
    Toggle { number: usize },

    /// Show completion statistics
    Stats,

    /// Interactive session reading one command per line
    Shell,
}

/// Commands accepted inside `tasklist shell`
#[derive(Parser)]
#[command(no_binary_name = true, disable_help_subcommand = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand)]
enum ShellCommand {
    /// Stage the task text
    Text { text: Vec<String> },
    /// Stage the deadline (no value clears it)
    Deadline { deadline: Vec<String> },
    /// Load a task into the form for editing
    Edit { number: usize },
    /// Leave edit mode and clear the form
    Cancel,
    /// Submit the form (adds, or saves the edit)
    Commit,
    /// Stage text and submit in one step
    Add {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
        #[arg(short, long)]
        deadline: Option<String>,
    },
    /// Delete a task
    Delete { number: usize },
    /// Check or uncheck a task
    #[command(alias = "done")]
    Toggle { number: usize },
    /// Change which tasks are shown
    Filter {
        #[arg(value_enum)]
        filter: Filter,
    },
    /// Change how tasks are ordered
    Sort {
        #[arg(value_enum)]
        sort: Sort,
    },
    /// Hide the notification
    Dismiss,
    /// Redraw the list
    List,
    /// Show available commands
    Help,
    /// Leave the session
    #[command(alias = "exit")]
    Quit,
}

fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let storage_path = cli.store.unwrap_or_else(|| {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tasklist")
            .join("store.json")
    });

    // Create parent directory if it doesn't exist
    if let Some(parent) = storage_path.parent() {
        std::fs::create_dir_all(parent).unwrap_or_else(|e| {
            eprintln!("Error: Failed to create data directory: {}", e);
            std::process::exit(1);
        });
    }

    let mut controller = Controller::load(JsonFileStorage::new(storage_path));

    let result = match cli.command {
        None => {
            render(&controller);
            Ok(())
        }
        Some(Commands::List { filter, sort }) => {
            controller.set_filter(filter);
            controller.set_sort(sort);
            render(&controller);
            Ok(())
        }
        Some(Commands::Add { text, deadline }) => {
            controller.set_text(text.join(" "));
            controller.set_deadline(deadline);
            commit(&mut controller)
        }
        Some(Commands::Edit {
            number,
            text,
            deadline,
            clear_deadline,
        }) => task_index(number)
            .and_then(|index| controller.begin_edit(index))
            .and_then(|()| {
                if !text.is_empty() {
                    controller.set_text(text.join(" "));
                }
                if clear_deadline {
                    controller.set_deadline(None);
                } else if deadline.is_some() {
                    controller.set_deadline(deadline);
                }
                commit(&mut controller)
            }),
        Some(Commands::Delete { number }) => task_index(number)
            .and_then(|index| controller.remove(index, jiff::Timestamp::now()))
            .map(|_| render(&controller)),
        Some(Commands::Toggle { number }) => task_index(number)
            .and_then(|index| controller.toggle(index))
            .map(|_| render(&controller)),
        Some(Commands::Stats) => {
            ui::render_statistics(&controller.view(&jiff::Zoned::now()).statistics);
            Ok(())
        }
        Some(Commands::Shell) => run_shell(&mut controller),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!("tasklist={}", level)))
        .with_writer(io::stderr)
        .init();
}

/// Task numbers on screen are 1-based positions in the stored list
fn task_index(number: usize) -> Result<usize, ControllerError> {
    number
        .checked_sub(1)
        .ok_or(ControllerError::InvalidTaskNumber)
}

fn commit<S: Storage>(controller: &mut Controller<S>) -> Result<(), ControllerError> {
    match controller.commit(jiff::Timestamp::now())? {
        CommitOutcome::Ignored => {
            tracing::debug!("Nothing to commit");
        }
        CommitOutcome::Discarded => {
            println!("{}", "The task being edited no longer exists".yellow());
        }
        CommitOutcome::Added | CommitOutcome::Edited => {}
    }
    render(controller);
    Ok(())
}

/// Redraw everything: notification banner, list and statistics
fn render<S: Storage>(controller: &Controller<S>) {
    let now = jiff::Zoned::now();
    if let Some(notification) = controller.notification(now.timestamp()) {
        ui::render_notification(notification);
    }
    ui::render_view(&controller.view(&now));
}

/// Next line of shell input, or `None` once input ends or can't be read
fn next_line(lines: &mut impl Iterator<Item = io::Result<String>>) -> Option<String> {
    match lines.next()? {
        Ok(line) => Some(line),
        Err(e) => {
            eprintln!("Error: Failed to read input: {}", e);
            tracing::error!("Failed to read shell input: {}", e);
            None
        }
    }
}

fn run_shell<S: Storage>(controller: &mut Controller<S>) -> Result<(), ControllerError> {
    println!("{}", "Type `help` for commands, `quit` to leave.".dimmed());
    render(controller);

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        ui::render_form(&controller.state().session);
        print!("  > ");
        let _ = io::stdout().flush();

        let Some(line) = next_line(&mut lines) else {
            return Ok(());
        };
        let words: Vec<&str> = line.split_whitespace().collect();
        if words.is_empty() {
            continue;
        }

        let command = match ShellLine::try_parse_from(words) {
            Ok(parsed) => parsed.command,
            Err(e) => {
                let _ = e.print();
                continue;
            }
        };

        match handle_shell_command(controller, command) {
            Ok(true) => render(controller),
            Ok(false) => return Ok(()),
            // Bad task numbers shouldn't end the session; storage errors should
            Err(
                e @ (ControllerError::TaskNotFound(_) | ControllerError::InvalidTaskNumber),
            ) => eprintln!("Error: {}", e),
            Err(e) => return Err(e),
        }
    }
}

/// Returns `Ok(false)` when the session should end
fn handle_shell_command<S: Storage>(
    controller: &mut Controller<S>,
    command: ShellCommand,
) -> Result<bool, ControllerError> {
    let now = jiff::Timestamp::now();
    match command {
        ShellCommand::Text { text } => controller.set_text(text.join(" ")),
        ShellCommand::Deadline { deadline } => controller.set_deadline(Some(deadline.join(" "))),
        ShellCommand::Edit { number } => controller.begin_edit(task_index(number)?)?,
        ShellCommand::Cancel => controller.cancel_edit(),
        ShellCommand::Commit => {
            if controller.commit(now)? == CommitOutcome::Discarded {
                println!("{}", "The task being edited no longer exists".yellow());
            }
        }
        ShellCommand::Add { text, deadline } => {
            controller.set_text(text.join(" "));
            controller.set_deadline(deadline);
            controller.commit(now)?;
        }
        ShellCommand::Delete { number } => {
            controller.remove(task_index(number)?, now)?;
        }
        ShellCommand::Toggle { number } => {
            controller.toggle(task_index(number)?)?;
        }
        ShellCommand::Filter { filter } => controller.set_filter(filter),
        ShellCommand::Sort { sort } => controller.set_sort(sort),
        ShellCommand::Dismiss => controller.dismiss_notification(),
        ShellCommand::List => {}
        ShellCommand::Help => {
            use clap::CommandFactory;
            let _ = ShellLine::command().print_help();
        }
        ShellCommand::Quit => return Ok(false),
    }
    Ok(true)
}
