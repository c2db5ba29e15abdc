//! Stable diagnostic codes emitted by the resizer.

use ferrite_diagnostics::{Category, DiagnosticCode};

/// A command failed for a reason without a dedicated code.
pub const COMMAND_FAILED: DiagnosticCode = DiagnosticCode::new(Category::Error, 1);
/// A rolled-back transaction left the netlist structurally different.
pub const ROLLBACK_MISMATCH: DiagnosticCode = DiagnosticCode::new(Category::Error, 2);
/// No usable buffer cell in the library.
pub const NO_BUFFERS: DiagnosticCode = DiagnosticCode::new(Category::Error, 22);
/// A candidate cell has no characterized target load.
pub const MISSING_TARGET_LOAD: DiagnosticCode = DiagnosticCode::new(Category::Error, 68);
/// A buffer has no physical master.
pub const NO_PHYSICAL_MASTER: DiagnosticCode = DiagnosticCode::new(Category::Error, 70);
/// A negative distance was converted to database units.
pub const NEGATIVE_DISTANCE: DiagnosticCode = DiagnosticCode::new(Category::Error, 86);
/// No corner carries a wire resistance.
pub const NO_WIRE_RESISTANCE: DiagnosticCode = DiagnosticCode::new(Category::Error, 89);

/// New instances were clamped into the core area.
pub const BUFFER_MOVED_INTO_CORE: DiagnosticCode = DiagnosticCode::new(Category::Warning, 77);
/// An output port was not buffered because of its driver.
pub const DONT_TOUCH_DRIVER: DiagnosticCode = DiagnosticCode::new(Category::Warning, 84);
/// An input port was not buffered because of its fanout.
pub const DONT_TOUCH_FANOUT: DiagnosticCode = DiagnosticCode::new(Category::Warning, 85);
/// A corner without wire resistance was skipped.
pub const CORNER_NO_WIRE_RES: DiagnosticCode = DiagnosticCode::new(Category::Warning, 88);
/// A buffer named for removal could not be removed.
pub const BUFFER_NOT_REMOVED: DiagnosticCode = DiagnosticCode::new(Category::Warning, 97);
/// A removed buffer could not be restored.
pub const BUFFER_NOT_RESTORED: DiagnosticCode = DiagnosticCode::new(Category::Warning, 99);

/// Count of removed buffers.
pub const REMOVED_BUFFERS: DiagnosticCode = DiagnosticCode::new(Category::Info, 26);
/// Count of input buffers.
pub const INPUT_BUFFERS: DiagnosticCode = DiagnosticCode::new(Category::Info, 27);
/// Count of output buffers.
pub const OUTPUT_BUFFERS: DiagnosticCode = DiagnosticCode::new(Category::Info, 28);
/// Count of removed dead logic.
pub const DEAD_LOGIC: DiagnosticCode = DiagnosticCode::new(Category::Info, 29);
/// Count of resized instances.
pub const RESIZED: DiagnosticCode = DiagnosticCode::new(Category::Info, 31);
/// Count of cloned clock inverters.
pub const CLONED_INVERTERS: DiagnosticCode = DiagnosticCode::new(Category::Info, 33);
/// Count of inserted tie cells.
pub const TIE_CELLS: DiagnosticCode = DiagnosticCode::new(Category::Info, 42);
