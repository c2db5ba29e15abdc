//! The cell library and cell equivalence.

use crate::cell::{CellKind, LibCell, PortDirection};
use crate::function::{FunctionError, LogicExpr};
use crate::ids::LibCellId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Errors raised while building or loading a library.
#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    /// An I/O error occurred while reading the library file.
    #[error("failed to read library: {0}")]
    Io(#[from] std::io::Error),

    /// The library file is not valid JSON for the library model.
    #[error("failed to parse library: {0}")]
    Parse(#[from] serde_json::Error),

    /// Two cells share a name.
    #[error("duplicate cell '{0}'")]
    DuplicateCell(String),

    /// A port function could not be parsed.
    #[error("cell '{cell}' port '{port}': {source}")]
    BadFunction {
        /// Cell name.
        cell: String,
        /// Port name.
        port: String,
        /// Parse failure.
        source: FunctionError,
    },

    /// A timing arc names a port the cell does not have.
    #[error("cell '{cell}' arc references unknown port '{port}'")]
    UnknownArcPort {
        /// Cell name.
        cell: String,
        /// Port name.
        port: String,
    },
}

/// A merged standard-cell library.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Library {
    /// Library name.
    pub name: String,
    /// All cells, indexed by [`LibCellId`].
    pub cells: Vec<LibCell>,
    /// Auxiliary index: cell name to ID (rebuilt on deserialization).
    #[serde(skip)]
    cell_by_name: HashMap<String, LibCellId>,
}

impl Library {
    /// Creates an empty library.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            cells: Vec::new(),
            cell_by_name: HashMap::new(),
        }
    }

    /// Parses a library from its JSON serialization.
    pub fn from_json(text: &str) -> Result<Self, LibraryError> {
        let mut lib: Library = serde_json::from_str(text)?;
        lib.rebuild_indices()?;
        Ok(lib)
    }

    /// Reads a library JSON file.
    pub fn load(path: &Path) -> Result<Self, LibraryError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Validates a cell, classifies it, and adds it to the library.
    pub fn add_cell(&mut self, mut cell: LibCell) -> Result<LibCellId, LibraryError> {
        if self.cell_by_name.contains_key(&cell.name) {
            return Err(LibraryError::DuplicateCell(cell.name));
        }
        validate_cell(&cell)?;
        cell.kind = cell.classify();
        let id = LibCellId::from_raw(self.cells.len() as u32);
        self.cell_by_name.insert(cell.name.clone(), id);
        self.cells.push(cell);
        Ok(id)
    }

    /// Rebuilds the name index and cell classification after deserialization.
    pub fn rebuild_indices(&mut self) -> Result<(), LibraryError> {
        self.cell_by_name.clear();
        for (i, cell) in self.cells.iter_mut().enumerate() {
            validate_cell(cell)?;
            cell.kind = cell.classify();
            if self
                .cell_by_name
                .insert(cell.name.clone(), LibCellId::from_raw(i as u32))
                .is_some()
            {
                return Err(LibraryError::DuplicateCell(cell.name.clone()));
            }
        }
        Ok(())
    }

    /// Returns the cell with the given ID.
    pub fn cell(&self, id: LibCellId) -> &LibCell {
        &self.cells[id.as_raw() as usize]
    }

    /// Looks up a cell by name.
    pub fn find_cell(&self, name: &str) -> Option<LibCellId> {
        self.cell_by_name.get(name).copied()
    }

    /// Iterates over all cell IDs.
    pub fn cell_ids(&self) -> impl Iterator<Item = LibCellId> + '_ {
        (0..self.cells.len()).map(|i| LibCellId::from_raw(i as u32))
    }

    /// Returns the number of cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// All buffer cells, in library order.
    pub fn buffer_cells(&self) -> Vec<LibCellId> {
        self.cell_ids().filter(|&id| self.cell(id).is_buffer()).collect()
    }

    /// Other input ports of `cell` that can be exchanged with `port` without
    /// changing any output function.
    pub fn equiv_input_ports(&self, cell: LibCellId, port: &str) -> Vec<String> {
        let cell = self.cell(cell);
        let inputs: Vec<String> = cell.inputs().map(|p| p.name.clone()).collect();
        let Some(pi) = inputs.iter().position(|n| n == port) else {
            return Vec::new();
        };
        let functions: Vec<LogicExpr> = cell.outputs().filter_map(|p| p.parsed_function()).collect();
        if functions.is_empty() || functions.len() != cell.outputs().count() {
            return Vec::new();
        }
        inputs
            .iter()
            .enumerate()
            .filter(|&(qi, _)| qi != pi)
            .filter(|&(qi, _)| {
                let swap = |i: usize| {
                    if i == pi {
                        qi
                    } else if i == qi {
                        pi
                    } else {
                        i
                    }
                };
                functions.iter().all(|f| {
                    let plain = f.truth_table(&inputs);
                    plain.is_some() && plain == f.truth_table_permuted(&inputs, &swap)
                })
            })
            .map(|(_, name)| name.clone())
            .collect()
    }

    /// Groups functionally equivalent cells.
    pub fn make_equiv_cells(&self) -> EquivCells {
        let mut by_key: HashMap<EquivKey, Vec<LibCellId>> = HashMap::new();
        for id in self.cell_ids() {
            if let Some(key) = equiv_key(self.cell(id)) {
                by_key.entry(key).or_default().push(id);
            }
        }
        let mut groups: Vec<Vec<LibCellId>> = by_key.into_values().collect();
        for group in &mut groups {
            group.sort_by(|&a, &b| {
                let (ca, cb) = (self.cell(a), self.cell(b));
                cb.drive_resistance()
                    .total_cmp(&ca.drive_resistance())
                    .then(ca.area.total_cmp(&cb.area))
                    .then_with(|| ca.name.cmp(&cb.name))
            });
        }
        groups.sort_by_key(|g| g[0]);
        let mut group_of = HashMap::new();
        for (gi, group) in groups.iter().enumerate() {
            for &id in group {
                group_of.insert(id, gi);
            }
        }
        EquivCells { groups, group_of }
    }
}

fn validate_cell(cell: &LibCell) -> Result<(), LibraryError> {
    for port in &cell.ports {
        if let Some(func) = &port.function {
            LogicExpr::parse(func).map_err(|source| LibraryError::BadFunction {
                cell: cell.name.clone(),
                port: port.name.clone(),
                source,
            })?;
        }
    }
    for arc in &cell.arcs {
        for name in [&arc.from, &arc.to] {
            if cell.port(name).is_none() {
                return Err(LibraryError::UnknownArcPort {
                    cell: cell.name.clone(),
                    port: name.clone(),
                });
            }
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct EquivKey {
    kind: CellKind,
    inputs: Vec<String>,
    outputs: Vec<(String, PortDirection, Option<Vec<bool>>)>,
}

fn equiv_key(cell: &LibCell) -> Option<EquivKey> {
    if cell.kind == CellKind::Macro {
        return None;
    }
    let mut inputs: Vec<String> = cell.inputs().map(|p| p.name.clone()).collect();
    inputs.sort();
    let mut outputs = Vec::new();
    for port in cell.outputs() {
        let table = port.parsed_function().and_then(|f| f.truth_table(&inputs));
        // Combinational equivalence needs a known function on every output.
        if table.is_none() && cell.kind != CellKind::Sequential {
            return None;
        }
        outputs.push((port.name.clone(), port.direction, table));
    }
    if outputs.is_empty() {
        return None;
    }
    outputs.sort_by(|a, b| a.0.cmp(&b.0));
    Some(EquivKey {
        kind: cell.kind,
        inputs,
        outputs,
    })
}

/// Cells grouped by logical equivalence.
///
/// Each group is ordered from the weakest drive (highest resistance) to the
/// strongest. Cells without a known function belong to no group.
#[derive(Debug, Clone, Default)]
pub struct EquivCells {
    groups: Vec<Vec<LibCellId>>,
    group_of: HashMap<LibCellId, usize>,
}

impl EquivCells {
    /// Cells equivalent to `cell`, including `cell` itself. Empty if the cell
    /// has no equivalence class.
    pub fn equivalents(&self, cell: LibCellId) -> &[LibCellId] {
        match self.group_of.get(&cell) {
            Some(&gi) => &self.groups[gi],
            None => &[],
        }
    }

    /// Number of equivalence classes.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}
