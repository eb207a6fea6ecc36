//! REPL – the operator's command intake.
//!
//! Supported slash-commands:
//!   /help         – show this list
//!   /status       – robot state, navigation counters and latest sensor readings
//!   /quit | /exit – stop the robot and exit
//!
//! Any other line is sent to the robot as a command (`F10`, `L90`, `STOP`,
//! `AUTO_NAV`, `AUTO_OFF`). Text the robot does not understand becomes `STOP`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use colored::Colorize;
use ebug_middleware::{CommandSender, SnapshotReader, StatusBoard};
use ebug_types::{Command, RobotError};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::warn;

/// Handles the REPL needs to reach the running robot.
#[derive(Clone)]
pub struct Session {
    pub intake: CommandSender,
    pub status: StatusBoard,
    pub snapshots: SnapshotReader,
}

/// What a single input line asks for.
#[derive(Debug, PartialEq)]
pub enum ReplAction {
    Empty,
    Help,
    Status,
    Quit,
    Unknown(String),
    Submitted(Result<Command, RobotError>),
}

/// Entry point for the interactive REPL.
///
/// `shutdown` is polled each iteration; when set the REPL exits cleanly.
pub fn run(session: &Session, shutdown: Arc<AtomicBool>) {
    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            eprintln!("{}: {}", "Terminal error".red(), e);
            return;
        }
    };
    let prompt = format!("{} ", "ebug>".bold().cyan());

    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        let line = match editor.readline(&prompt) {
            Ok(line) => line,
            // Ctrl-C while the prompt owns the terminal.
            Err(ReadlineError::Interrupted) => {
                stop_robot(session);
                shutdown.store(true, Ordering::SeqCst);
                break;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {}", "Read error".red(), e);
                break;
            }
        };
        if !line.trim().is_empty() {
            let _ = editor.add_history_entry(line.trim());
        }

        match dispatch(line.trim(), session) {
            ReplAction::Empty => {}
            ReplAction::Help => cmd_help(),
            ReplAction::Status => cmd_status(session),
            ReplAction::Quit => {
                stop_robot(session);
                println!("{}", "Goodbye.".green());
                shutdown.store(true, Ordering::SeqCst);
                break;
            }
            ReplAction::Unknown(other) => {
                println!(
                    "{} '{}'. Type {} for available commands.",
                    "Unknown command:".red(),
                    other.yellow(),
                    "/help".bold()
                );
            }
            ReplAction::Submitted(Ok(cmd)) => {
                println!("  {} {}", "queued".green(), cmd.to_string().bold());
            }
            ReplAction::Submitted(Err(RobotError::ChannelFull(cmd))) => {
                println!(
                    "  {} {} (robot busy, queue full)",
                    "dropped".yellow(),
                    cmd.to_string().bold()
                );
            }
            ReplAction::Submitted(Err(e)) => {
                println!("  {}: {}", "Error".red(), e);
            }
        }
    }
}

/// Interpret one trimmed input line. Robot commands are submitted here.
pub fn dispatch(line: &str, session: &Session) -> ReplAction {
    match line {
        "" => ReplAction::Empty,
        "/help" => ReplAction::Help,
        "/status" => ReplAction::Status,
        "/quit" | "/exit" => ReplAction::Quit,
        other if other.starts_with('/') => ReplAction::Unknown(other.to_string()),
        raw => ReplAction::Submitted(session.intake.submit(raw)),
    }
}

fn stop_robot(session: &Session) {
    if let Err(e) = session.intake.try_push(Command::stop()) {
        warn!(error = %e, "STOP not queued on exit");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Command handlers
// ─────────────────────────────────────────────────────────────────────────────

fn cmd_help() {
    println!();
    println!("{}", "Available commands:".bold());
    println!("  {}   – show this help", "/help".cyan());
    println!("  {} – robot state and latest sensor readings", "/status".cyan());
    println!("  {}   – stop the robot and exit", "/quit".cyan());
    println!();
    println!("{}", "Robot commands:".bold());
    println!("  {}  – forward / backward N cm", "F<n> B<n>".cyan());
    println!("  {}  – turn left / right N degrees", "L<n> R<n>".cyan());
    println!("  {}        – stop all motion", "STOP".cyan());
    println!("  {} – autonomous navigation on / off", "AUTO_NAV AUTO_OFF".cyan());
    println!();
}

fn cmd_status(session: &Session) {
    let status = session.status.snapshot();
    let nav = status.navigation;
    let reading = session.snapshots.latest();

    println!();
    println!("{}", "Robot".bold());
    println!("  state          : {}", status.state.to_string().bold());
    println!(
        "  autonomy       : {}",
        if nav.autonomy_enabled { "on".green() } else { "off".dimmed() }
    );
    println!("  phase          : {:?}", nav.phase);
    println!("  stuck counter  : {}", nav.stuck_counter);
    println!("  last angle     : {:.0}°", nav.last_chosen_angle_deg);
    println!("  path memory    : {} entries", nav.path_memory_entries);
    println!(
        "  command queue  : {}/{} ({} dropped)",
        session.intake.occupancy(),
        session.intake.capacity(),
        session.intake.dropped_count()
    );
    println!("{}", "Sensors".bold());
    println!("  distance       : {:.1} cm", reading.distance_cm);
    println!("  heading        : {:.1}°", reading.heading_deg);
    println!("  temperature    : {:.1} °C", reading.temperature_c);
    println!("  battery        : {:.0}%", reading.battery_pct);
    println!("  at             : {} ms", reading.timestamp_ms);
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use ebug_middleware::{CommandReceiver, command_channel, snapshot_cell};
    use ebug_types::CommandKind;

    fn session(capacity: usize) -> (Session, CommandReceiver) {
        let (intake, commands) = command_channel(capacity);
        let (_publisher, snapshots) = snapshot_cell();
        let session = Session {
            intake,
            status: StatusBoard::new(),
            snapshots,
        };
        (session, commands)
    }

    #[test]
    fn slash_commands_are_recognised() {
        let (session, _rx) = session(4);
        assert_eq!(dispatch("", &session), ReplAction::Empty);
        assert_eq!(dispatch("/help", &session), ReplAction::Help);
        assert_eq!(dispatch("/status", &session), ReplAction::Status);
        assert_eq!(dispatch("/quit", &session), ReplAction::Quit);
        assert_eq!(dispatch("/exit", &session), ReplAction::Quit);
        assert_eq!(
            dispatch("/dance", &session),
            ReplAction::Unknown("/dance".to_string())
        );
    }

    #[test]
    fn robot_commands_reach_the_queue() {
        let (session, mut rx) = session(4);
        let action = dispatch("F10", &session);
        assert_eq!(
            action,
            ReplAction::Submitted(Ok(Command::new(CommandKind::Forward, 10)))
        );
        assert_eq!(rx.try_pop(), Some(Command::new(CommandKind::Forward, 10)));
    }

    #[test]
    fn gibberish_is_sent_as_stop() {
        let (session, mut rx) = session(4);
        assert_eq!(dispatch("dance", &session), ReplAction::Submitted(Ok(Command::stop())));
        assert_eq!(rx.try_pop(), Some(Command::stop()));
    }

    #[test]
    fn full_queue_reports_the_dropped_command() {
        let (session, _rx) = session(1);
        assert!(matches!(dispatch("F1", &session), ReplAction::Submitted(Ok(_))));
        assert_eq!(
            dispatch("F2", &session),
            ReplAction::Submitted(Err(RobotError::ChannelFull(Command::new(CommandKind::Forward, 2))))
        );
        assert_eq!(session.intake.dropped_count(), 1);
    }
}
