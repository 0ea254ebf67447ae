//! Notification sinks triggered when a poll cycle finds seats.
//!
//! A notification runs as a detached task bounded by a timeout. Its outcome
//! only ever reaches the log, so a broken audio setup cannot stop polling.

use std::fmt;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::config::NotifyConfig;
use crate::error::NotifyError;

/// Side effect performed on a hit.
#[async_trait]
pub trait Notifier: Send + Sync + fmt::Debug {
    /// Performs the notification and waits for it to finish.
    ///
    /// # Errors
    ///
    /// Returns a [`NotifyError`] if the side effect fails.
    async fn notify(&self) -> Result<(), NotifyError>;
}

/// Plays the signal file through an external player program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandNotifier {
    program: String,
    args: Vec<String>,
}

impl CommandNotifier {
    /// Creates a notifier running `command` (program then arguments) with
    /// `signal_path` appended as the last argument.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::EmptyCommand`] if `command` is empty.
    pub fn new(command: &[String], signal_path: impl Into<String>) -> Result<Self, NotifyError> {
        let (program, rest) = command.split_first().ok_or(NotifyError::EmptyCommand)?;
        let mut args = rest.to_vec();
        args.push(signal_path.into());
        Ok(Self {
            program: program.clone(),
            args,
        })
    }
}

#[async_trait]
impl Notifier for CommandNotifier {
    async fn notify(&self) -> Result<(), NotifyError> {
        tracing::debug!(program = %self.program, args = ?self.args, "playing signal");
        let status = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(NotifyError::Spawn)?;

        if status.success() {
            Ok(())
        } else {
            Err(NotifyError::ExitStatus(status))
        }
    }
}

/// Logs the hit. Used when no signal file is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self) -> Result<(), NotifyError> {
        tracing::warn!("seats available (no signal file configured)");
        Ok(())
    }
}

/// Picks the sink described by `config`.
///
/// # Errors
///
/// Returns [`NotifyError::EmptyCommand`] if a signal file is configured but
/// the player command is empty.
pub fn from_config(config: &NotifyConfig) -> Result<Arc<dyn Notifier>, NotifyError> {
    match &config.signal_path {
        Some(path) => Ok(Arc::new(CommandNotifier::new(&config.command, path.as_str())?)),
        None => Ok(Arc::new(LogNotifier)),
    }
}

/// Runs `notifier` on a detached task, giving up after `timeout`.
///
/// Callers are free to drop the returned handle.
pub fn spawn_notification(notifier: Arc<dyn Notifier>, timeout: Duration) -> JoinHandle<()> {
    let span = tracing::info_span!("notification");
    tokio::spawn(
        async move {
            match tokio::time::timeout(timeout, notifier.notify()).await {
                Ok(Ok(())) => tracing::debug!("notification finished"),
                Ok(Err(e)) => tracing::error!(error = %e, "notification failed"),
                Err(_) => {
                    tracing::error!(error = %NotifyError::Timeout(timeout), "notification failed");
                }
            }
        }
        .instrument(span),
    )
}

#[cfg(all(test, unix))]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn command(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn signal_path_is_last_argument() {
        let Ok(n) = CommandNotifier::new(&command(&["mpg123", "-q"]), "/tmp/a.mp3") else {
            panic!("valid command");
        };
        assert_eq!(n.program, "mpg123");
        assert_eq!(n.args, ["-q", "/tmp/a.mp3"]);
    }

    #[test]
    fn empty_command_is_rejected() {
        assert!(matches!(
            CommandNotifier::new(&[], "/tmp/a.mp3"),
            Err(NotifyError::EmptyCommand)
        ));
    }

    #[test]
    fn without_signal_file_hits_are_logged() {
        let cfg = NotifyConfig {
            signal_path: None,
            command: Vec::new(),
            timeout: Duration::from_secs(1),
        };
        let Ok(notifier) = from_config(&cfg) else {
            panic!("log notifier needs no command");
        };
        assert!(format!("{notifier:?}").contains("LogNotifier"));
    }

    #[tokio::test]
    async fn successful_command_completes() {
        // `true` ignores its arguments and exits 0.
        let Ok(n) = CommandNotifier::new(&command(&["true"]), "signal.mp3") else {
            panic!("valid command");
        };
        tokio_test::assert_ok!(n.notify().await);
    }

    #[tokio::test]
    async fn failing_command_reports_exit_status() {
        let Ok(n) = CommandNotifier::new(&command(&["false"]), "signal.mp3") else {
            panic!("valid command");
        };
        assert!(matches!(n.notify().await, Err(NotifyError::ExitStatus(_))));
    }

    #[tokio::test]
    async fn missing_program_reports_spawn_error() {
        let Ok(n) = CommandNotifier::new(&command(&["/nonexistent/player"]), "signal.mp3") else {
            panic!("valid command");
        };
        assert!(matches!(n.notify().await, Err(NotifyError::Spawn(_))));
    }

    #[tokio::test]
    async fn detached_notification_is_bounded_by_timeout() {
        // `sleep 30` never finishes inside the 50 ms budget.
        let Ok(n) = CommandNotifier::new(&command(&["sleep"]), "30") else {
            panic!("valid command");
        };
        let handle = spawn_notification(Arc::new(n), Duration::from_millis(50));
        let joined = tokio::time::timeout(Duration::from_secs(5), handle).await;
        assert!(matches!(joined, Ok(Ok(()))));
    }

    #[tokio::test]
    async fn detached_failure_does_not_propagate() {
        let Ok(n) = CommandNotifier::new(&command(&["false"]), "x") else {
            panic!("valid command");
        };
        let handle = spawn_notification(Arc::new(n), Duration::from_secs(5));
        assert!(matches!(handle.await, Ok(())));
    }
}
