mod input;
mod user;

use crate::admin::input::CancelType;
use crate::api::error::ApiError;
use crate::app::AppState;
use rustyline::error::ReadlineError;
use std::str::FromStr;
use strum::{EnumIter, EnumMessage, EnumString, IntoEnumIterator, IntoStaticStr};
use thiserror::Error;
use tracing::error;

pub type AdminResult<T> = Result<T, AdminError>;

#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Cancel(#[from] CancelType),
    #[error("Could not connect to the database. Details:\n{0}")]
    FailedConnection(#[from] diesel::r2d2::PoolError),
    #[error("Database query failed. Details:\n{0}")]
    FailedQuery(#[from] diesel::result::Error),
    #[error("Could not hash password. Details:\n{0}")]
    Password(#[from] argon2::password_hash::Error),
    #[error(transparent)]
    Readline(#[from] ReadlineError),
    #[error("No user named {0} exists")]
    UnknownUser(String),
}

pub fn enabled() -> bool {
    std::env::args().any(|arg| arg == "--admin")
}

/// Runs the interactive administration loop until the user exits.
pub fn command_line_mode(state: &AppState) -> AdminResult<()> {
    let mut editor = input::create_editor::<AdminTask>()?;
    println!("Running ArtBuddy admin command line interface. Enter \"help\" for a list of commands.\n");
    input::print_info();

    loop {
        let user_input = match input::read("Please select a task: ", &mut editor) {
            Ok(user_input) => user_input,
            Err(CancelType::Stop) => continue,
            Err(CancelType::Exit) => return Ok(()),
        };
        if user_input.is_empty() {
            continue;
        }

        let task = match AdminTask::from_str(&user_input) {
            Ok(task) => task,
            Err(_) => {
                let possible_tasks: Vec<&'static str> = AdminTask::iter().map(AdminTask::into).collect();
                eprintln!("ERROR: Task should be one of {possible_tasks:?}\n");
                continue;
            }
        };
        match run_task(state, task) {
            Ok(()) => println!("Task finished.\n"),
            Err(AdminError::Cancel(CancelType::Exit)) => return Ok(()),
            Err(err) => error!("{err}\n"),
        }
    }
}

#[derive(Clone, Copy, EnumIter, EnumMessage, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
enum AdminTask {
    #[strum(message = "Grant administrator privileges to users")]
    PromoteUser,
    #[strum(message = "Revoke administrator privileges from users")]
    DemoteUser,
    #[strum(message = "Set a new password for users")]
    ResetPassword,
}

fn run_task(state: &AppState, task: AdminTask) -> AdminResult<()> {
    println!("Starting task...");
    let mut editor = input::create_text_editor()?;
    match task {
        AdminTask::PromoteUser => input::user_input_loop(state, &mut editor, |state, editor| {
            user::change_privileges(state, editor, true)
        }),
        AdminTask::DemoteUser => input::user_input_loop(state, &mut editor, |state, editor| {
            user::change_privileges(state, editor, false)
        }),
        AdminTask::ResetPassword => input::user_input_loop(state, &mut editor, user::reset_password_interactive),
    }
}
