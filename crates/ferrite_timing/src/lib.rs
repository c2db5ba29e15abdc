//! Timing-engine boundary for the Ferrite timing-repair engine.
//!
//! The repair core never propagates arrival or required times itself. It
//! talks to a [`TimingEngine`] for load capacitance, annotated slews, and
//! slack, and tells it which nets need fresh parasitics through the
//! [`ParasiticsTracker`]. [`EstimatedTiming`] is a self-contained engine
//! that derives wire load from half-perimeter wire length.
//!
//! # Usage
//!
//! ```ignore
//! use ferrite_timing::{EstimatedTiming, ParasiticsTracker, TimingEngine};
//!
//! let mut tracker = ParasiticsTracker::new();
//! tracker.invalidate(net);
//! let mut sta = EstimatedTiming::new();
//! sta.update_parasitics(&netlist, &tracker.take_invalid());
//! let cap = sta.load_cap(&netlist, &library, drvr_pin, &corner);
//! ```

#![warn(missing_docs)]

pub mod engine;
pub mod estimate;
pub mod parasitics;

pub use engine::TimingEngine;
pub use estimate::EstimatedTiming;
pub use parasitics::ParasiticsTracker;
