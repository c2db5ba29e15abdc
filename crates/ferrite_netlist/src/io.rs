//! JSON design files.

use crate::data::Netlist;
use crate::error::NetlistError;
use std::path::Path;

impl Netlist {
    /// Parses a design from JSON and rebuilds its name indices.
    pub fn from_json(text: &str) -> Result<Self, NetlistError> {
        let mut netlist: Netlist = serde_json::from_str(text)?;
        netlist.rebuild_indices();
        netlist.validate()?;
        Ok(netlist)
    }

    /// Serializes the design as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, NetlistError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reads a design file.
    pub fn load(path: &Path) -> Result<Self, NetlistError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Writes a design file.
    pub fn save(&self, path: &Path) -> Result<(), NetlistError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
