use crate::export::ExportReport;
use crate::server::ServerState;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;

/// User-visible on/off switch of live export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToggleState {
    Inactive,
    Active,
}

impl fmt::Display for ToggleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToggleState::Inactive => write!(f, "inactive"),
            ToggleState::Active => write!(f, "active"),
        }
    }
}

/// Which transition a toggle performed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToggleOutcome {
    Activated,
    Deactivated,
}

/// Snapshot of the controller, taken under its lock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveExportStatus {
    pub toggle: ToggleState,
    pub server: ServerState,
    pub trigger_registered: bool,
    pub address: Option<SocketAddr>,
    pub last_export: Option<ExportReport>,
}

impl LiveExportStatus {
    /// Toggle, server and save-handler registration all agree
    pub fn is_consistent(&self) -> bool {
        match self.toggle {
            ToggleState::Active => self.server == ServerState::Running && self.trigger_registered,
            ToggleState::Inactive => {
                self.server == ServerState::Stopped && !self.trigger_registered
            }
        }
    }
}

impl fmt::Display for LiveExportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Live export: {}", self.toggle)?;
        match self.address {
            Some(addr) => writeln!(f, "Server: {} (http://localhost:{})", self.server, addr.port())?,
            None => writeln!(f, "Server: {}", self.server)?,
        }
        write!(
            f,
            "Save handler: {}",
            if self.trigger_registered {
                "registered"
            } else {
                "not registered"
            }
        )?;
        if let Some(report) = &self.last_export {
            write!(
                f,
                "\nLast export at {}:\n{}",
                report.finished_at.format("%Y-%m-%d %H:%M:%S"),
                report
            )?;
        }
        Ok(())
    }
}
