//! Bounded command channel from intake to the motion loop.
//!
//! Both ends are non-blocking. A full channel drops the new command and
//! reports it to the producer; an empty channel yields `None` to the motion
//! loop, which then falls through to autonomous or idle behaviour.
//! Commands come out in the order they were accepted.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use ebug_types::{Command, RobotError};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{info, warn};

use crate::command::parse_command;

/// Create a channel holding at most `capacity` commands (minimum 1).
///
/// ```rust
/// use ebug_middleware::channel::command_channel;
///
/// let (tx, mut rx) = command_channel(2);
/// tx.submit("F10").unwrap();
/// tx.submit("L90").unwrap();
/// assert!(tx.submit("STOP").is_err());
/// assert_eq!(rx.try_pop().unwrap().to_string(), "F10");
/// assert_eq!(tx.dropped_count(), 1);
/// ```
pub fn command_channel(capacity: usize) -> (CommandSender, CommandReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        CommandSender {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
        },
        CommandReceiver { rx },
    )
}

/// Producer half. Clones share the queue and the drop counter.
#[derive(Clone, Debug)]
pub struct CommandSender {
    tx: mpsc::Sender<Command>,
    dropped: Arc<AtomicU64>,
}

impl CommandSender {
    /// Enqueue `cmd` without waiting.
    ///
    /// # Errors
    ///
    /// - [`RobotError::ChannelFull`] when the queue is at capacity; the
    ///   command is dropped and counted.
    /// - [`RobotError::Channel`] when the motion loop has gone away.
    pub fn try_push(&self, cmd: Command) -> Result<(), RobotError> {
        match self.tx.try_send(cmd) {
            Ok(()) => {
                info!(command = %cmd, "Command queued");
                Ok(())
            }
            Err(TrySendError::Full(cmd)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(command = %cmd, dropped, "Command queue full, dropping command");
                Err(RobotError::ChannelFull(cmd))
            }
            Err(TrySendError::Closed(_)) => {
                Err(RobotError::Channel("command receiver closed".into()))
            }
        }
    }

    /// Decode `raw` and enqueue it. Returns the decoded command.
    pub fn submit(&self, raw: &str) -> Result<Command, RobotError> {
        let cmd = parse_command(raw);
        self.try_push(cmd)?;
        Ok(cmd)
    }

    /// Commands dropped because the queue was full.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Commands currently waiting.
    pub fn occupancy(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }
}

/// Consumer half, owned by the motion loop.
#[derive(Debug)]
pub struct CommandReceiver {
    rx: mpsc::Receiver<Command>,
}

impl CommandReceiver {
    /// Take the oldest waiting command, if any. Never blocks.
    pub fn try_pop(&mut self) -> Option<Command> {
        self.rx.try_recv().ok()
    }
}
