//! Standard-cell library model for the Ferrite timing-repair engine.
//!
//! A [`Library`] holds [`LibCell`]s with their ports, Liberty-style logic
//! functions, and timing arcs whose models are tagged as evaluable gate
//! tables ([`GateTableModel`]) or anything else. Cells are classified from
//! their functions (buffer, inverter, tie, ...) and grouped into
//! [`EquivCells`] for sizing. [`Corner`]s scale the characterized tables and
//! carry the wire RC for estimated parasitics.
//!
//! # Usage
//!
//! ```ignore
//! use ferrite_liberty::{Corner, Library, RiseFall};
//!
//! let lib = Library::load(path)?;
//! let buf = lib.find_cell("BUF_X2").unwrap();
//! let equiv = lib.make_equiv_cells();
//! for &candidate in equiv.equivalents(buf) { /* ... */ }
//! ```

#![warn(missing_docs)]

pub mod cell;
pub mod corner;
pub mod function;
pub mod ids;
pub mod library;
pub mod samples;
pub mod table;

pub use cell::{
    ArcRole, CellKind, GateTableModel, LibCell, LibPort, PhysicalMaster, PortDirection, RiseFall,
    TimingArcSet, TimingModel, TimingSense,
};
pub use corner::Corner;
pub use function::{FunctionError, LogicExpr};
pub use ids::LibCellId;
pub use library::{EquivCells, Library, LibraryError};
pub use samples::demo_library;
pub use table::NldmTable;
