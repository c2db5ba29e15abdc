//! Library cells, ports, and timing arcs.

use crate::corner::Corner;
use crate::function::LogicExpr;
use crate::table::NldmTable;
use ferrite_common::{Dbu, Point};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Signal edge at a pin.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum RiseFall {
    /// Rising transition.
    Rise,
    /// Falling transition.
    Fall,
}

impl RiseFall {
    /// Both edges, rise first.
    pub const ALL: [RiseFall; 2] = [RiseFall::Rise, RiseFall::Fall];

    /// Array index for per-edge storage.
    pub fn index(self) -> usize {
        match self {
            RiseFall::Rise => 0,
            RiseFall::Fall => 1,
        }
    }

    /// The opposite edge.
    pub fn opposite(self) -> RiseFall {
        match self {
            RiseFall::Rise => RiseFall::Fall,
            RiseFall::Fall => RiseFall::Rise,
        }
    }
}

impl fmt::Display for RiseFall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiseFall::Rise => write!(f, "rise"),
            RiseFall::Fall => write!(f, "fall"),
        }
    }
}

/// Direction of a library port.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortDirection {
    /// Signal input.
    Input,
    /// Signal output.
    Output,
    /// Bidirectional signal.
    Bidirect,
    /// Three-state output.
    Tristate,
    /// Power supply.
    Power,
    /// Ground supply.
    Ground,
}

impl PortDirection {
    /// Input or bidirectional.
    pub fn is_any_input(self) -> bool {
        matches!(self, Self::Input | Self::Bidirect)
    }

    /// Output, bidirectional, or three-state.
    pub fn is_any_output(self) -> bool {
        matches!(self, Self::Output | Self::Bidirect | Self::Tristate)
    }

    /// Three-state output.
    pub fn is_tristate(self) -> bool {
        self == Self::Tristate
    }

    /// Power or ground supply.
    pub fn is_power_ground(self) -> bool {
        matches!(self, Self::Power | Self::Ground)
    }
}

/// A port of a library cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibPort {
    /// Port name.
    pub name: String,
    /// Port direction.
    pub direction: PortDirection,
    /// Input pin capacitance in farads.
    #[serde(default)]
    pub capacitance: f64,
    /// Output drive resistance in ohms.
    #[serde(default)]
    pub drive_resistance: f64,
    /// Liberty-style logic function for outputs.
    #[serde(default)]
    pub function: Option<String>,
    /// Maximum capacitance the output may drive, in farads.
    #[serde(default)]
    pub max_capacitance: Option<f64>,
    /// Pin location relative to the instance origin.
    #[serde(default)]
    pub offset: Option<Point>,
}

impl LibPort {
    /// Creates an input port with the given capacitance.
    pub fn input(name: &str, capacitance: f64) -> Self {
        Self {
            name: name.to_string(),
            direction: PortDirection::Input,
            capacitance,
            drive_resistance: 0.0,
            function: None,
            max_capacitance: None,
            offset: None,
        }
    }

    /// Creates an output port with the given function and drive resistance.
    pub fn output(name: &str, function: &str, drive_resistance: f64) -> Self {
        Self {
            name: name.to_string(),
            direction: PortDirection::Output,
            capacitance: 0.0,
            drive_resistance,
            function: Some(function.to_string()),
            max_capacitance: None,
            offset: None,
        }
    }

    /// Creates a power or ground port.
    pub fn supply(name: &str, direction: PortDirection) -> Self {
        Self {
            name: name.to_string(),
            direction,
            capacitance: 0.0,
            drive_resistance: 0.0,
            function: None,
            max_capacitance: None,
            offset: None,
        }
    }

    /// Sets the port direction.
    pub fn with_direction(mut self, direction: PortDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Sets the pin offset inside the master.
    pub fn with_offset(mut self, x: Dbu, y: Dbu) -> Self {
        self.offset = Some(Point::new(x, y));
        self
    }

    /// Parses the function, if any.
    pub fn parsed_function(&self) -> Option<LogicExpr> {
        self.function.as_deref().and_then(|f| LogicExpr::parse(f).ok())
    }
}

/// How the output of an arc responds to its input edge.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingSense {
    /// Output follows the input edge.
    PositiveUnate,
    /// Output inverts the input edge.
    NegativeUnate,
    /// Either output edge for either input edge.
    NonUnate,
}

impl TimingSense {
    /// `(input edge, output edge)` pairs exercised by this sense.
    pub fn edges(self) -> &'static [(RiseFall, RiseFall)] {
        use RiseFall::{Fall, Rise};
        match self {
            TimingSense::PositiveUnate => &[(Rise, Rise), (Fall, Fall)],
            TimingSense::NegativeUnate => &[(Rise, Fall), (Fall, Rise)],
            TimingSense::NonUnate => &[(Rise, Rise), (Rise, Fall), (Fall, Rise), (Fall, Fall)],
        }
    }
}

/// The role an arc plays in timing analysis.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArcRole {
    /// Combinational propagation.
    Combinational,
    /// Rising clock edge to output.
    RisingEdge,
    /// Falling clock edge to output.
    FallingEdge,
    /// Setup check.
    Setup,
    /// Hold check.
    Hold,
    /// Recovery check.
    Recovery,
    /// Removal check.
    Removal,
    /// Three-state enable.
    TristateEnable,
    /// Three-state disable.
    TristateDisable,
    /// Minimum clock-tree insertion path.
    ClockTreePathMin,
    /// Maximum clock-tree insertion path.
    ClockTreePathMax,
}

impl ArcRole {
    /// Setup, hold, recovery, or removal.
    pub fn is_timing_check(self) -> bool {
        matches!(self, Self::Setup | Self::Hold | Self::Recovery | Self::Removal)
    }

    /// Roles that contribute to a cell's target load: everything except
    /// checks, three-state enable/disable, and clock-tree paths.
    pub fn drives_target_load(self) -> bool {
        !self.is_timing_check()
            && !matches!(
                self,
                Self::TristateEnable
                    | Self::TristateDisable
                    | Self::ClockTreePathMin
                    | Self::ClockTreePathMax
            )
    }
}

/// Delay and transition tables for a gate arc.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GateTableModel {
    /// Delay to a rising output.
    #[serde(default)]
    pub cell_rise: Option<NldmTable>,
    /// Delay to a falling output.
    #[serde(default)]
    pub cell_fall: Option<NldmTable>,
    /// Rising output transition.
    #[serde(default)]
    pub rise_transition: Option<NldmTable>,
    /// Falling output transition.
    #[serde(default)]
    pub fall_transition: Option<NldmTable>,
}

impl GateTableModel {
    /// Model with identical rise and fall tables.
    pub fn symmetric(delay: NldmTable, transition: NldmTable) -> Self {
        Self {
            cell_rise: Some(delay.clone()),
            cell_fall: Some(delay),
            rise_transition: Some(transition.clone()),
            fall_transition: Some(transition),
        }
    }

    /// Evaluates `(delay, output slew)` for the given output edge, scaled to
    /// `corner`. Returns `None` if the edge has no tables.
    pub fn gate_delay(
        &self,
        out_rf: RiseFall,
        in_slew: f64,
        load_cap: f64,
        corner: &Corner,
    ) -> Option<(f64, f64)> {
        let (delay, slew) = match out_rf {
            RiseFall::Rise => (self.cell_rise.as_ref()?, self.rise_transition.as_ref()?),
            RiseFall::Fall => (self.cell_fall.as_ref()?, self.fall_transition.as_ref()?),
        };
        let d = delay.lookup(in_slew, load_cap) * corner.delay_scale;
        let s = slew.lookup(in_slew, load_cap) * corner.slew_scale;
        Some((d, s.max(0.0)))
    }
}

/// The model attached to a timing arc.
///
/// Only gate table models can be evaluated for delay and slew; everything
/// else (check tables, unsupported models) is carried as `Other`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimingModel {
    /// Evaluable gate delay/transition tables.
    Gate(GateTableModel),
    /// Any model the engine does not evaluate.
    Other,
}

impl TimingModel {
    /// Returns `true` if the model can produce a gate delay and slew.
    pub fn is_evaluable(&self) -> bool {
        matches!(self, TimingModel::Gate(_))
    }

    /// The gate model, if evaluable.
    pub fn as_gate(&self) -> Option<&GateTableModel> {
        match self {
            TimingModel::Gate(model) => Some(model),
            TimingModel::Other => None,
        }
    }
}

/// A set of timing arcs between one input and one output port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingArcSet {
    /// Source port name.
    pub from: String,
    /// Destination port name.
    pub to: String,
    /// Arc role.
    pub role: ArcRole,
    /// Timing sense.
    pub sense: TimingSense,
    /// Delay model.
    pub model: TimingModel,
}

impl TimingArcSet {
    /// Creates a combinational arc set with no model.
    pub fn combinational(from: &str, to: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            role: ArcRole::Combinational,
            sense: TimingSense::PositiveUnate,
            model: TimingModel::Other,
        }
    }

    /// Sets the timing sense.
    pub fn with_sense(mut self, sense: TimingSense) -> Self {
        self.sense = sense;
        self
    }

    /// Sets the role.
    pub fn with_role(mut self, role: ArcRole) -> Self {
        self.role = role;
        self
    }

    /// Sets the model.
    pub fn with_model(mut self, model: TimingModel) -> Self {
        self.model = model;
        self
    }

    /// Evaluable gate model for an arc that is not a timing check.
    pub fn delay_model(&self) -> Option<&GateTableModel> {
        if self.role.is_timing_check() {
            None
        } else {
            self.model.as_gate()
        }
    }
}

/// Functional classification of a library cell.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    /// Single-input non-inverting cell.
    Buffer,
    /// Single-input inverting cell.
    Inverter,
    /// Constant-one driver.
    TieHigh,
    /// Constant-zero driver.
    TieLow,
    /// Any other combinational function.
    #[default]
    Combinational,
    /// Register or latch.
    Sequential,
    /// Hard macro, pad, or other non-core cell.
    Macro,
}

/// Physical (LEF-style) master of a cell.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct PhysicalMaster {
    /// Width in database units.
    pub width: Dbu,
    /// Height in database units.
    pub height: Dbu,
}

/// A library cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibCell {
    /// Cell name.
    pub name: String,
    /// Cell area in square microns.
    #[serde(default)]
    pub area: f64,
    /// Footprint name; cells with equal footprints are drop-in replacements.
    #[serde(default)]
    pub footprint: Option<String>,
    /// User-declared function class restricting swaps.
    #[serde(default)]
    pub user_function_class: Option<String>,
    /// Physical master; `None` means the cell cannot be instantiated.
    #[serde(default)]
    pub master: Option<PhysicalMaster>,
    /// Never instantiate this cell.
    #[serde(default)]
    pub dont_use: bool,
    /// Clock-tree cell, excluded from data-path buffering.
    #[serde(default)]
    pub is_clock_cell: bool,
    /// Register or latch.
    #[serde(default)]
    pub is_sequential: bool,
    /// Macro, pad, or other block cell.
    #[serde(default)]
    pub is_macro: bool,
    /// Ports in pin order.
    pub ports: Vec<LibPort>,
    /// Timing arc sets.
    #[serde(default)]
    pub arcs: Vec<TimingArcSet>,
    /// Derived classification, recomputed when the cell is added to a library.
    #[serde(skip)]
    pub kind: CellKind,
}

impl LibCell {
    /// Creates an empty cell.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            area: 0.0,
            footprint: None,
            user_function_class: None,
            master: None,
            dont_use: false,
            is_clock_cell: false,
            is_sequential: false,
            is_macro: false,
            ports: Vec::new(),
            arcs: Vec::new(),
            kind: CellKind::Combinational,
        }
    }

    /// Sets the area.
    pub fn with_area(mut self, area: f64) -> Self {
        self.area = area;
        self
    }

    /// Sets the footprint.
    pub fn with_footprint(mut self, footprint: &str) -> Self {
        self.footprint = Some(footprint.to_string());
        self
    }

    /// Sets the physical master size.
    pub fn with_master(mut self, width: Dbu, height: Dbu) -> Self {
        self.master = Some(PhysicalMaster { width, height });
        self
    }

    /// Adds a port.
    pub fn add_port(&mut self, port: LibPort) {
        self.ports.push(port);
    }

    /// Adds an arc set.
    pub fn add_arc(&mut self, arc: TimingArcSet) {
        self.arcs.push(arc);
    }

    /// Looks up a port by name.
    pub fn port(&self, name: &str) -> Option<&LibPort> {
        self.ports.iter().find(|p| p.name == name)
    }

    /// Signal input ports.
    pub fn inputs(&self) -> impl Iterator<Item = &LibPort> {
        self.ports.iter().filter(|p| p.direction.is_any_input())
    }

    /// Signal output ports.
    pub fn outputs(&self) -> impl Iterator<Item = &LibPort> {
        self.ports.iter().filter(|p| p.direction.is_any_output())
    }

    /// Arc sets ending at `to`.
    pub fn arcs_to<'a>(&'a self, to: &'a str) -> impl Iterator<Item = &'a TimingArcSet> + 'a {
        self.arcs.iter().filter(move |a| a.to == to)
    }

    /// Arc sets from `from` to `to`.
    pub fn arcs_between<'a>(
        &'a self,
        from: &'a str,
        to: &'a str,
    ) -> impl Iterator<Item = &'a TimingArcSet> + 'a {
        self.arcs.iter().filter(move |a| a.from == from && a.to == to)
    }

    /// Returns `true` for buffers.
    pub fn is_buffer(&self) -> bool {
        self.kind == CellKind::Buffer
    }

    /// Returns `true` for inverters.
    pub fn is_inverter(&self) -> bool {
        self.kind == CellKind::Inverter
    }

    /// Returns `true` for buffers and inverters.
    pub fn is_buf_inv(&self) -> bool {
        self.is_buffer() || self.is_inverter()
    }

    /// Returns `true` for tie-high and tie-low cells.
    pub fn is_tie(&self) -> bool {
        matches!(self.kind, CellKind::TieHigh | CellKind::TieLow)
    }

    /// Returns `true` for standard logic cells that live in the core rows.
    pub fn is_logic_std_cell(&self) -> bool {
        self.kind != CellKind::Macro
    }

    /// `(input, output)` ports of a buffer or inverter.
    pub fn buffer_ports(&self) -> Option<(&LibPort, &LibPort)> {
        if !self.is_buf_inv() {
            return None;
        }
        Some((self.inputs().next()?, self.outputs().next()?))
    }

    /// Strongest (lowest) output drive resistance, or 0 with no outputs.
    pub fn drive_resistance(&self) -> f64 {
        self.outputs()
            .map(|p| p.drive_resistance)
            .fold(None, |acc: Option<f64>, r| Some(acc.map_or(r, |a| a.min(r))))
            .unwrap_or(0.0)
    }

    /// Derives the [`CellKind`] from flags and port functions.
    pub fn classify(&self) -> CellKind {
        if self.is_macro {
            return CellKind::Macro;
        }
        if self.is_sequential {
            return CellKind::Sequential;
        }
        let inputs: Vec<&LibPort> = self.inputs().collect();
        let outputs: Vec<&LibPort> = self.outputs().collect();
        if outputs.len() != 1 {
            return CellKind::Combinational;
        }
        let Some(func) = outputs[0].parsed_function() else {
            return CellKind::Combinational;
        };
        match (inputs.len(), &func) {
            (0, LogicExpr::Const(true)) => CellKind::TieHigh,
            (0, LogicExpr::Const(false)) => CellKind::TieLow,
            (1, _) => {
                let names = vec![inputs[0].name.clone()];
                match func.truth_table(&names).as_deref() {
                    Some([false, true]) => CellKind::Buffer,
                    Some([true, false]) => CellKind::Inverter,
                    _ => CellKind::Combinational,
                }
            }
            _ => CellKind::Combinational,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell_with(inputs: &[&str], function: &str) -> LibCell {
        let mut cell = LibCell::new("C");
        for name in inputs {
            cell.add_port(LibPort::input(name, 1e-15));
        }
        cell.add_port(LibPort::output("Y", function, 1000.0));
        cell
    }

    #[test]
    fn classify_by_function() {
        assert_eq!(cell_with(&["A"], "A").classify(), CellKind::Buffer);
        assert_eq!(cell_with(&["A"], "!A").classify(), CellKind::Inverter);
        assert_eq!(cell_with(&[], "1").classify(), CellKind::TieHigh);
        assert_eq!(cell_with(&[], "0").classify(), CellKind::TieLow);
        assert_eq!(cell_with(&["A", "B"], "A&B").classify(), CellKind::Combinational);
    }

    #[test]
    fn classify_flags_win() {
        let mut cell = cell_with(&["D"], "D");
        cell.is_sequential = true;
        assert_eq!(cell.classify(), CellKind::Sequential);
        cell.is_macro = true;
        assert_eq!(cell.classify(), CellKind::Macro);
    }

    #[test]
    fn edges_per_sense() {
        assert_eq!(TimingSense::PositiveUnate.edges().len(), 2);
        assert_eq!(
            TimingSense::NegativeUnate.edges()[0],
            (RiseFall::Rise, RiseFall::Fall)
        );
        assert_eq!(TimingSense::NonUnate.edges().len(), 4);
    }

    #[test]
    fn target_load_roles() {
        assert!(ArcRole::Combinational.drives_target_load());
        assert!(ArcRole::RisingEdge.drives_target_load());
        assert!(!ArcRole::Setup.drives_target_load());
        assert!(!ArcRole::TristateEnable.drives_target_load());
        assert!(!ArcRole::ClockTreePathMax.drives_target_load());
    }

    #[test]
    fn gate_model_scales_with_corner() {
        let model = GateTableModel::symmetric(NldmTable::constant(10e-12), NldmTable::constant(20e-12));
        let slow = Corner::nominal().with_scales(2.0, 1.5);
        let (d, s) = model.gate_delay(RiseFall::Fall, 0.0, 0.0, &slow).unwrap();
        assert!((d - 20e-12).abs() < 1e-20);
        assert!((s - 30e-12).abs() < 1e-20);
        assert!(GateTableModel::default()
            .gate_delay(RiseFall::Rise, 0.0, 0.0, &slow)
            .is_none());
    }

    #[test]
    fn timing_model_serde_tag() {
        let json = serde_json::to_string(&TimingModel::Other).unwrap();
        assert_eq!(json, r#"{"kind":"other"}"#);
        let back: TimingModel = serde_json::from_str(&json).unwrap();
        assert!(!back.is_evaluable());
    }

    #[test]
    fn drive_resistance_is_strongest_output() {
        let mut cell = cell_with(&["A"], "A");
        cell.add_port(LibPort::output("Z", "A", 400.0));
        assert_eq!(cell.drive_resistance(), 400.0);
    }
}
