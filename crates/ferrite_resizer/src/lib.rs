//! Incremental gate sizing and buffering for the Ferrite timing-repair engine.
//!
//! A [`Resizer`] session edits a [`Design`] (netlist, library, corners, and a
//! timing engine) one bounded operation at a time: resizing a driver to the
//! target slew, buffering ports, removing buffers, repairing tie fanout,
//! swapping equivalent input pins, and cloning clock inverters. Every edit
//! keeps design area, parasitics invalidation, and the optional journal in
//! step, so a transaction can be committed or rolled back as a whole.
//!
//! # Usage
//!
//! ```ignore
//! use ferrite_resizer::{Design, Resizer};
//!
//! let mut design = Design::new(netlist, library);
//! let mut rsz = Resizer::from_config(&config, &design);
//! rsz.journal_begin(&mut design)?;
//! rsz.buffer_inputs(&mut design)?;
//! rsz.resize_all(&mut design)?;
//! rsz.journal_restore(&mut design)?; // or journal_end to keep the edits
//! ```
//!
//! # Architecture
//!
//! - [`characterize`]: target slews, target loads, buffer list
//! - [`delay`]: gate and buffer delay queries
//! - [`edit`]: netlist edit primitives with area and parasitics bookkeeping
//! - [`sizing`]: resize to target slew
//! - [`buffer`] / [`tie`] / [`clone`]: insertion and removal
//! - [`pin_swap`]: commutative input swapping
//! - [`journal`]: transactional undo
//! - [`dead_logic`] / [`report`] / [`wire_length`]: analyses

#![warn(missing_docs)]

pub mod buffer;
pub mod characterize;
pub mod clone;
pub mod codes;
pub mod dead_logic;
pub mod delay;
pub mod design;
pub mod edit;
pub mod error;
pub mod journal;
pub mod pin_swap;
pub mod report;
pub mod session;
pub mod sizing;
pub mod tie;
pub mod wire_length;

pub use characterize::find_target_load;
pub use delay::{gate_delays_with_slews, GateDelays};
pub use design::{corners_from_config, Design};
pub use edit::has_port;
pub use error::ResizerError;
pub use journal::{BufferRecord, EditHistory, JournalEntry, PinRef, RestoreSummary};
pub use report::{max_load_manhattan_distance, LongWire};
pub use session::{design_area, EditCounters, Resizer};
pub use tie::tie_location;
