//! Resizer error types.

use crate::codes;
use ferrite_diagnostics::Diagnostic;
use ferrite_netlist::NetlistError;

/// Errors that abort a resizer command.
#[derive(Debug, thiserror::Error)]
pub enum ResizerError {
    /// The library has no buffer cell that may be used.
    #[error("no buffers found")]
    NoBuffers,

    /// A cell has no entry in the target load map.
    #[error("missing target load cap for cell '{0}'")]
    MissingTargetLoad(String),

    /// A cell cannot be placed because it has no physical master.
    #[error("no physical master for cell '{0}'")]
    NoPhysicalMaster(String),

    /// A negative distance was passed where a length is required.
    #[error("cannot convert negative distance {0} to database units")]
    NegativeDistance(f64),

    /// No corner has a wire resistance.
    #[error("could not find a resistance value for any corner; cannot evaluate max wire length for buffer")]
    NoWireResistance,

    /// A bisection search exceeded its iteration bound.
    #[error("{what} did not converge for cell '{cell}'")]
    NonConvergence {
        /// The quantity being solved for.
        what: &'static str,
        /// The cell being characterized.
        cell: String,
    },

    /// `journal_begin` was called with a transaction already open.
    #[error("a journal transaction is already open")]
    JournalAlreadyOpen,

    /// A journal operation was requested with no transaction open.
    #[error("no journal transaction is open")]
    NoJournal,

    /// No instance has this name.
    #[error("unknown instance '{0}'")]
    UnknownInstance(String),

    /// No pin has this path.
    #[error("unknown pin '{0}'")]
    UnknownPin(String),

    /// No library cell has this name.
    #[error("unknown cell '{0}'")]
    UnknownCell(String),

    /// The cell has no port with this name.
    #[error("cell '{cell}' has no port '{port}'")]
    UnknownPort {
        /// Cell name.
        cell: String,
        /// Port name.
        port: String,
    },

    /// A netlist edit failed.
    #[error(transparent)]
    Netlist(#[from] NetlistError),
}

impl ResizerError {
    /// Converts the error into an error diagnostic carrying its stable code.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let code = match self {
            Self::NoBuffers => codes::NO_BUFFERS,
            Self::MissingTargetLoad(_) => codes::MISSING_TARGET_LOAD,
            Self::NoPhysicalMaster(_) => codes::NO_PHYSICAL_MASTER,
            Self::NegativeDistance(_) => codes::NEGATIVE_DISTANCE,
            Self::NoWireResistance => codes::NO_WIRE_RESISTANCE,
            _ => codes::COMMAND_FAILED,
        };
        let diag = Diagnostic::error(code, self.to_string());
        match self {
            Self::MissingTargetLoad(cell) | Self::NoPhysicalMaster(cell) => diag.with_object(cell),
            Self::UnknownInstance(name) | Self::UnknownPin(name) | Self::UnknownCell(name) => {
                diag.with_object(name)
            }
            _ => diag,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_the_error() {
        assert_eq!(ResizerError::NoBuffers.to_diagnostic().code.to_string(), "E022");
        let diag = ResizerError::NoPhysicalMaster("BUF_X1".to_string()).to_diagnostic();
        assert_eq!(diag.code.to_string(), "E070");
        assert_eq!(diag.object.as_deref(), Some("BUF_X1"));
        assert_eq!(
            ResizerError::JournalAlreadyOpen.to_diagnostic().code.to_string(),
            "E001"
        );
    }
}
