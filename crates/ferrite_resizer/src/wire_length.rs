//! Maximum unbuffered wire length.
//!
//! A wire is too long once driving it straight through is slower than
//! splitting it in half with a second copy of the same buffer. The delay of
//! a driver plus wire is the gate delay into the lumped wire and pin load
//! plus the Elmore delay of the wire into the receiving pin.

use crate::codes;
use crate::design::Design;
use crate::error::ResizerError;
use crate::session::Resizer;
use ferrite_diagnostics::Diagnostic;
use ferrite_liberty::{Corner, LibCellId, Library};

const MAX_ITERATIONS: usize = 200;
const TOLERANCE: f64 = 0.01;

impl Resizer {
    /// The shortest max wire length over every buffer and every corner that
    /// has wire resistance, in meters.
    pub fn find_max_wire_length(&mut self, design: &mut Design) -> Result<f64, ResizerError> {
        self.resize_preamble(design)?;
        let mut max_length: Option<f64> = None;
        for corner in &design.corners {
            if corner.wire_res_per_m <= 0.0 {
                self.diagnostics.emit(
                    Diagnostic::warning(
                        codes::CORNER_NO_WIRE_RES,
                        format!("Corner: {} has no wire signal resistance value.", corner.name),
                    )
                    .with_object(&corner.name),
                );
                continue;
            }
            for &buffer in &self.buffer_cells {
                let length = self.buffer_max_wire_length(&design.library, buffer, corner)?;
                max_length = Some(max_length.map_or(length, |m| m.min(length)));
            }
        }
        max_length.ok_or(ResizerError::NoWireResistance)
    }

    /// Wire length at which splitting a wire driven by `buffer` in half
    /// starts to pay off at `corner`, in meters.
    pub fn buffer_max_wire_length(
        &self,
        library: &Library,
        buffer: LibCellId,
        corner: &Corner,
    ) -> Result<f64, ResizerError> {
        let cell = library.cell(buffer);
        if cell.master.is_none() {
            return Err(ResizerError::NoPhysicalMaster(cell.name.clone()));
        }
        let Some((input, output)) = cell.buffer_ports() else {
            return Ok(0.0);
        };
        let pin_cap = input.capacitance;
        let drvr_r = output.drive_resistance;
        let split_diff = |length: f64| {
            self.buffer_wire_delay(library, buffer, pin_cap, length, corner)
                - 2.0 * self.buffer_wire_delay(library, buffer, pin_cap, length / 2.0, corner)
        };

        let mut lo = 0.0_f64;
        let mut hi = drvr_r / corner.wire_res_per_m;
        let mut diff_hi = split_diff(hi);
        let mut iterations = 0;
        while (lo - hi).abs() > lo.max(hi) * TOLERANCE {
            iterations += 1;
            if iterations > MAX_ITERATIONS {
                return Err(ResizerError::NonConvergence {
                    what: "max wire length",
                    cell: cell.name.clone(),
                });
            }
            if diff_hi < 0.0 {
                lo = hi;
                hi *= 2.0;
                diff_hi = split_diff(hi);
            } else {
                let mid = (lo + hi) / 2.0;
                let diff_mid = split_diff(mid);
                if diff_mid < 0.0 {
                    lo = mid;
                } else {
                    hi = mid;
                    diff_hi = diff_mid;
                }
            }
        }
        tracing::debug!(buffer = %cell.name, corner = %corner.name, length = lo, "max wire length");
        Ok(lo)
    }

    fn buffer_wire_delay(
        &self,
        library: &Library,
        buffer: LibCellId,
        pin_cap: f64,
        length: f64,
        corner: &Corner,
    ) -> f64 {
        let wire_res = length * corner.wire_res_per_m;
        let wire_cap = length * corner.wire_cap_per_m;
        let gate = self.buffer_delay(library, buffer, wire_cap + pin_cap, corner);
        gate + wire_res * (wire_cap / 2.0 + pin_cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrite_config::ResizerSettings;
    use ferrite_liberty::demo_library;
    use ferrite_netlist::Netlist;

    fn design(corners: Vec<Corner>) -> Design {
        Design::new(Netlist::new("top", 1000), demo_library().unwrap()).with_corners(corners)
    }

    #[test]
    fn four_times_the_resistance_halves_the_length() {
        let d = design(vec![Corner::nominal()]);
        let rsz = Resizer::new(ResizerSettings::default(), &d);
        let buf = d.library.find_cell("BUF_X2").unwrap();
        let low = Corner::new("low", 0).with_wire_rc(1e6, 2e-10);
        let high = Corner::new("high", 1).with_wire_rc(4e6, 2e-10);
        let l_low = rsz.buffer_max_wire_length(&d.library, buf, &low).unwrap();
        let l_high = rsz.buffer_max_wire_length(&d.library, buf, &high).unwrap();
        assert!(l_low > 0.0);
        assert!((l_low / l_high - 2.0).abs() < 0.05, "ratio {}", l_low / l_high);
    }

    #[test]
    fn corners_without_resistance_warn() {
        let mut d = design(vec![
            Corner::new("ideal", 0),
            Corner::new("wired", 1).with_wire_rc(1e6, 2e-10),
        ]);
        let mut rsz = Resizer::new(ResizerSettings::default(), &d);
        let length = rsz.find_max_wire_length(&mut d).unwrap();
        assert!(length > 0.0);
        assert!(rsz.diagnostics().contains_code("W088"));
    }

    #[test]
    fn no_resistance_anywhere_is_an_error() {
        let mut d = design(vec![Corner::new("ideal", 0)]);
        let mut rsz = Resizer::new(ResizerSettings::default(), &d);
        assert!(matches!(
            rsz.find_max_wire_length(&mut d),
            Err(ResizerError::NoWireResistance)
        ));
    }
}
