//! Virtual Display Driver Control
//!
//! External tooling that plugs virtual displays into the OS (e.g. an
//! indirect-display driver toggled through a device installer). The monitor
//! core never depends on it; the binary adds displays before the first
//! discovery pass and removes them on shutdown.
//!
//! # Overview
//!
//! - [`VirtualDisplayDriver`]: add or remove one virtual display
//! - [`ShellDriver`]: runs a configured argv for each operation
//! - [`DriverSupervisor`]: counts what was added and makes a bounded number
//!   of removal attempts during cleanup
//!
//! Failures are never fatal: the supervisor logs them and stops.

use std::process::Command;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Driver errors
#[derive(Error, Debug)]
pub enum DriverError {
    /// No command configured for the operation
    #[error("Virtual display driver command is not configured")]
    NotConfigured,

    /// Command could not be started
    #[error("Failed to run driver command '{command}': {source}")]
    Spawn {
        /// Command line
        command: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Command ran and reported failure
    #[error("Driver command '{command}' failed ({status}): {stderr}")]
    Failed {
        /// Command line
        command: String,
        /// Exit status description
        status: String,
        /// Captured stderr
        stderr: String,
    },
}

/// Control over the OS virtual-display driver
#[cfg_attr(test, mockall::automock)]
pub trait VirtualDisplayDriver {
    /// Plug in one virtual display
    fn add_display(&self) -> Result<(), DriverError>;

    /// Remove one virtual display
    fn remove_display(&self) -> Result<(), DriverError>;
}

/// Driver controlled by running external commands
#[derive(Debug, Clone)]
pub struct ShellDriver {
    add_command: Vec<String>,
    remove_command: Vec<String>,
}

impl ShellDriver {
    /// Each command is an argv; the first element is the program
    pub fn new(add_command: Vec<String>, remove_command: Vec<String>) -> Self {
        Self {
            add_command,
            remove_command,
        }
    }

    fn run(argv: &[String]) -> Result<(), DriverError> {
        let (program, args) = argv.split_first().ok_or(DriverError::NotConfigured)?;
        let command = argv.join(" ");

        debug!("Running driver command: {}", command);

        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|source| DriverError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(DriverError::Failed {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(())
    }
}

impl VirtualDisplayDriver for ShellDriver {
    fn add_display(&self) -> Result<(), DriverError> {
        Self::run(&self.add_command)
    }

    fn remove_display(&self) -> Result<(), DriverError> {
        Self::run(&self.remove_command)
    }
}

/// Tracks displays added through a driver and removes them again
pub struct DriverSupervisor<D: VirtualDisplayDriver> {
    driver: D,
    added: usize,
    max_cleanup_attempts: u32,
}

impl<D: VirtualDisplayDriver> DriverSupervisor<D> {
    /// `max_cleanup_attempts` bounds the removal attempts per display
    pub fn new(driver: D, max_cleanup_attempts: u32) -> Self {
        Self {
            driver,
            added: 0,
            max_cleanup_attempts: max_cleanup_attempts.max(1),
        }
    }

    /// Add up to `count` displays, stopping at the first failure
    ///
    /// Returns how many were added by this call.
    pub fn add_displays(&mut self, count: usize) -> usize {
        let mut added = 0;
        for i in 0..count {
            match self.driver.add_display() {
                Ok(()) => {
                    added += 1;
                    self.added += 1;
                }
                Err(e) => {
                    error!(
                        "Failed to add virtual display {}/{}: {}",
                        i + 1,
                        count,
                        e
                    );
                    break;
                }
            }
        }

        if added > 0 {
            info!("Added {} virtual display(s)", added);
        }
        added
    }

    /// Remove every display this supervisor added
    ///
    /// Each removal is retried up to `max_cleanup_attempts` times; when a
    /// display still cannot be removed the supervisor gives up on the rest.
    /// Returns how many were removed.
    pub fn cleanup(&mut self) -> usize {
        let mut removed = 0;

        'displays: while self.added > 0 {
            for attempt in 1..=self.max_cleanup_attempts {
                match self.driver.remove_display() {
                    Ok(()) => {
                        self.added -= 1;
                        removed += 1;
                        continue 'displays;
                    }
                    Err(e) => warn!(
                        "Removing virtual display failed (attempt {}/{}): {}",
                        attempt, self.max_cleanup_attempts, e
                    ),
                }
            }

            error!(
                "Giving up on virtual display cleanup, {} display(s) left",
                self.added
            );
            break;
        }

        if removed > 0 {
            info!("Removed {} virtual display(s)", removed);
        }
        removed
    }

    /// Displays added and not yet removed
    pub fn added(&self) -> usize {
        self.added
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::Sequence;

    fn failure() -> DriverError {
        DriverError::Failed {
            command: "idd".to_string(),
            status: "exit status: 1".to_string(),
            stderr: "no device".to_string(),
        }
    }

    #[test]
    fn test_add_stops_at_first_failure() {
        let mut driver = MockVirtualDisplayDriver::new();
        let mut seq = Sequence::new();
        driver
            .expect_add_display()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));
        driver
            .expect_add_display()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Err(failure()));

        let mut supervisor = DriverSupervisor::new(driver, 3);
        assert_eq!(supervisor.add_displays(5), 2);
        assert_eq!(supervisor.added(), 2);
    }

    #[test]
    fn test_cleanup_removes_everything_added() {
        let mut driver = MockVirtualDisplayDriver::new();
        driver.expect_add_display().times(2).returning(|| Ok(()));
        driver.expect_remove_display().times(2).returning(|| Ok(()));

        let mut supervisor = DriverSupervisor::new(driver, 3);
        supervisor.add_displays(2);
        assert_eq!(supervisor.cleanup(), 2);
        assert_eq!(supervisor.added(), 0);
    }

    #[test]
    fn test_cleanup_attempts_are_bounded() {
        let mut driver = MockVirtualDisplayDriver::new();
        driver.expect_add_display().times(2).returning(|| Ok(()));
        driver
            .expect_remove_display()
            .times(3)
            .returning(|| Err(failure()));

        let mut supervisor = DriverSupervisor::new(driver, 3);
        supervisor.add_displays(2);
        assert_eq!(supervisor.cleanup(), 0);
        assert_eq!(supervisor.added(), 2);
    }

    #[test]
    fn test_cleanup_retries_then_succeeds() {
        let mut driver = MockVirtualDisplayDriver::new();
        let mut seq = Sequence::new();
        driver.expect_add_display().times(1).returning(|| Ok(()));
        driver
            .expect_remove_display()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|| Err(failure()));
        driver
            .expect_remove_display()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));

        let mut supervisor = DriverSupervisor::new(driver, 3);
        supervisor.add_displays(1);
        assert_eq!(supervisor.cleanup(), 1);
    }

    #[test]
    fn test_cleanup_without_additions_is_noop() {
        let driver = MockVirtualDisplayDriver::new();
        let mut supervisor = DriverSupervisor::new(driver, 3);
        assert_eq!(supervisor.cleanup(), 0);
    }

    #[test]
    fn test_shell_driver_empty_command() {
        let driver = ShellDriver::new(Vec::new(), Vec::new());
        assert!(matches!(
            driver.add_display(),
            Err(DriverError::NotConfigured)
        ));
    }

    #[test]
    fn test_shell_driver_missing_program() {
        let driver = ShellDriver::new(
            vec!["definitely-not-a-real-driver-tool".to_string()],
            Vec::new(),
        );
        assert!(matches!(
            driver.add_display(),
            Err(DriverError::Spawn { .. })
        ));
    }
}
