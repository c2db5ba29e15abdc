//! The timing engine query interface.

use ferrite_liberty::{Corner, Library, RiseFall};
use ferrite_netlist::{NetId, Netlist, PinId};
use std::collections::BTreeSet;

/// Queries and invalidation hooks the repair core needs from static timing
/// analysis.
pub trait TimingEngine {
    /// Re-derives parasitics for `nets`.
    fn update_parasitics(&mut self, netlist: &Netlist, nets: &BTreeSet<NetId>);

    /// Drops parasitics held for a net that is about to be deleted.
    fn remove_parasitics(&mut self, net: NetId);

    /// Total capacitance seen by the driver `drvr` at `corner`: wire plus
    /// load pins plus external port loads.
    fn load_cap(&self, netlist: &Netlist, library: &Library, drvr: PinId, corner: &Corner) -> f64;

    /// Annotated slew at `pin` for the given edge, if known.
    fn vertex_slew(&self, pin: PinId, rf: RiseFall, corner: &Corner) -> Option<f64>;

    /// Worst slack at `pin`, if known.
    fn vertex_slack(&self, pin: PinId) -> Option<f64>;

    /// Brings the timing graph levels up to date with the netlist.
    fn ensure_levelized(&mut self, netlist: &Netlist);

    /// Recomputes required times.
    fn find_requireds(&mut self, netlist: &Netlist);

    /// Returns `true` if `pin` is in a clock network.
    fn is_clock(&self, netlist: &Netlist, pin: PinId) -> bool;

    /// Returns `true` if `pin` carries a constant logic value.
    fn is_constant(&self, netlist: &Netlist, library: &Library, pin: PinId) -> bool;
}
