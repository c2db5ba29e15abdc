//! Netlist error types.

use crate::ids::{InstId, ModNetId, NetId, PinId};

/// Errors raised by netlist queries and edits.
#[derive(Debug, thiserror::Error)]
pub enum NetlistError {
    /// An object with this name already exists.
    #[error("{kind} '{name}' already exists")]
    DuplicateName {
        /// Object kind ("instance", "net", ...).
        kind: &'static str,
        /// The conflicting name.
        name: String,
    },

    /// The instance ID does not resolve.
    #[error("unknown instance {0}")]
    UnknownInstance(InstId),

    /// The net ID does not resolve.
    #[error("unknown net {0}")]
    UnknownNet(NetId),

    /// The pin ID does not resolve.
    #[error("unknown pin {0}")]
    UnknownPin(PinId),

    /// The hierarchical net ID does not resolve.
    #[error("unknown hierarchical net {0}")]
    UnknownModNet(ModNetId),

    /// A replacement master does not provide the instance's ports.
    #[error("cell '{cell}' has no port '{port}' required by instance '{inst}'")]
    PortMismatch {
        /// Instance name.
        inst: String,
        /// Replacement cell name.
        cell: String,
        /// Missing port.
        port: String,
    },

    /// `begin_eco` was called while an ECO is open.
    #[error("an ECO is already open")]
    EcoAlreadyActive,

    /// An ECO operation was requested with no ECO open.
    #[error("no ECO is open")]
    NoActiveEco,

    /// The database is internally inconsistent.
    #[error("inconsistent netlist: {0}")]
    Inconsistent(String),

    /// An I/O error occurred while reading or writing a design file.
    #[error("failed to access design file: {0}")]
    Io(#[from] std::io::Error),

    /// A design file is not valid JSON for the netlist model.
    #[error("failed to parse design: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let err = NetlistError::DuplicateName {
            kind: "net",
            name: "n1".to_string(),
        };
        assert_eq!(format!("{err}"), "net 'n1' already exists");
        assert_eq!(
            format!("{}", NetlistError::UnknownPin(PinId::from_raw(3))),
            "unknown pin 3"
        );
    }
}
