//! Mutable netlist database for the Ferrite timing-repair engine.
//!
//! The [`Netlist`] holds instances bound to library cells, flat nets,
//! hierarchical module nets, and top-level ports. All structural edits go
//! through methods that can be journaled by an ECO log
//! ([`Netlist::begin_eco`], [`Netlist::undo_eco_to`]) and observed through
//! an [`ObserverScope`]. A [`Legalizer`] moves edited instances onto legal
//! sites.
//!
//! # Usage
//!
//! ```ignore
//! use ferrite_netlist::Netlist;
//!
//! let mut nl = Netlist::load(path)?;
//! nl.begin_eco()?;
//! let n = nl.create_net("n1")?;
//! nl.connect(pin, n)?;
//! nl.undo_eco()?;
//! ```

#![warn(missing_docs)]

pub mod data;
pub mod eco;
pub mod edit;
pub mod error;
pub mod ids;
pub mod io;
pub mod legalize;
pub mod observer;

pub use data::{Instance, ModNet, Net, Netlist, Pin, PlacementStatus, SignalType};
pub use eco::{EcoOp, RemovalSnapshot, UndoReport};
pub use error::NetlistError;
pub use ids::{InstId, ModNetId, NetId, PinId};
pub use legalize::{Legalizer, RowLegalizer};
pub use observer::{NetlistEvent, NetlistObserver, ObserverScope};
