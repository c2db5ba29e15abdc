//! A small built-in standard-cell library.
//!
//! The cells follow a linear drive model (`delay = t0 + 0.1*slew + 0.69*R*C`,
//! `slew = t0/4 + 0.05*slew + 2.2*R*C`) sampled into NLDM tables, which is
//! enough to exercise sizing, buffering, and pin swapping without a real
//! characterized library.

use crate::cell::{
    ArcRole, GateTableModel, LibCell, LibPort, PortDirection, TimingArcSet, TimingModel,
    TimingSense,
};
use crate::library::{Library, LibraryError};
use crate::table::NldmTable;
use ferrite_common::units::{FEMTO, PICO};

const ROW_HEIGHT: i64 = 1400;

/// NLDM model for a gate with intrinsic delay `t0` and drive resistance `r`.
pub fn linear_gate_model(t0: f64, r: f64) -> TimingModel {
    let slews = vec![0.0, 20.0 * PICO, 100.0 * PICO, 400.0 * PICO];
    let loads = vec![0.0, 5.0 * FEMTO, 20.0 * FEMTO, 80.0 * FEMTO];
    let delay = NldmTable::from_fn(slews.clone(), loads.clone(), |s, c| {
        t0 + 0.1 * s + 0.69 * r * c
    });
    let slew = NldmTable::from_fn(slews, loads, |s, c| 0.25 * t0 + 0.05 * s + 2.2 * r * c);
    TimingModel::Gate(GateTableModel::symmetric(delay, slew))
}

#[allow(clippy::too_many_arguments)]
fn gate(
    name: &str,
    footprint: &str,
    inputs: &[&str],
    output: &str,
    function: &str,
    in_cap_ff: f64,
    drive_res: f64,
    t0_ps: f64,
    sense: TimingSense,
    width: i64,
) -> LibCell {
    let mut cell = LibCell::new(name)
        .with_area(width as f64 * ROW_HEIGHT as f64 * 1e-6)
        .with_footprint(footprint)
        .with_master(width, ROW_HEIGHT);
    for input in inputs {
        cell.add_port(LibPort::input(input, in_cap_ff * FEMTO).with_offset(0, ROW_HEIGHT / 2));
    }
    cell.add_port(LibPort::output(output, function, drive_res).with_offset(width, ROW_HEIGHT / 2));
    for input in inputs {
        cell.add_arc(
            TimingArcSet::combinational(input, output)
                .with_sense(sense)
                .with_model(linear_gate_model(t0_ps * PICO, drive_res)),
        );
    }
    cell
}

fn tie(name: &str, value: &str) -> LibCell {
    let mut cell = LibCell::new(name)
        .with_area(0.532)
        .with_footprint("tie")
        .with_master(380, ROW_HEIGHT);
    cell.add_port(LibPort::output("Z", value, 1000.0).with_offset(190, ROW_HEIGHT / 2));
    cell.add_port(LibPort::supply("VDD", PortDirection::Power));
    cell.add_port(LibPort::supply("VSS", PortDirection::Ground));
    cell
}

fn dff() -> LibCell {
    let mut cell = LibCell::new("DFF_X1")
        .with_area(4.522)
        .with_footprint("dff")
        .with_master(3230, ROW_HEIGHT);
    cell.is_sequential = true;
    cell.add_port(LibPort::input("D", 1.1 * FEMTO).with_offset(0, ROW_HEIGHT / 2));
    cell.add_port(LibPort::input("CK", 0.9 * FEMTO).with_offset(0, ROW_HEIGHT / 4));
    cell.add_port(LibPort::output("Q", "IQ", 4000.0).with_offset(3230, ROW_HEIGHT / 2));
    cell.add_arc(
        TimingArcSet::combinational("CK", "Q")
            .with_role(ArcRole::RisingEdge)
            .with_sense(TimingSense::NonUnate)
            .with_model(linear_gate_model(60.0 * PICO, 4000.0)),
    );
    cell.add_arc(
        TimingArcSet::combinational("D", "CK")
            .with_role(ArcRole::Setup)
            .with_model(TimingModel::Other),
    );
    cell
}

/// Builds the demo library.
///
/// Buffers `BUF_X1/X2/X4`, clock buffer `CLKBUF_X2`, inverters
/// `INV_X1/X2/X4`, `NAND2_X1/X2/X4`, `AOI21_X1`, tie cells `TIEHI`/`TIELO`,
/// and a `DFF_X1` register.
pub fn demo_library() -> Result<Library, LibraryError> {
    use TimingSense::{NegativeUnate, PositiveUnate};

    let mut cells = vec![
        gate("BUF_X1", "buf", &["A"], "Z", "A", 1.0, 6000.0, 20.0, PositiveUnate, 570),
        gate("BUF_X2", "buf", &["A"], "Z", "A", 1.8, 3000.0, 18.0, PositiveUnate, 760),
        gate("BUF_X4", "buf", &["A"], "Z", "A", 3.4, 1500.0, 16.0, PositiveUnate, 1140),
        gate("INV_X1", "inv", &["A"], "ZN", "!A", 1.2, 5000.0, 10.0, NegativeUnate, 380),
        gate("INV_X2", "inv", &["A"], "ZN", "!A", 2.2, 2500.0, 9.0, NegativeUnate, 570),
        gate("INV_X4", "inv", &["A"], "ZN", "!A", 4.2, 1250.0, 8.0, NegativeUnate, 950),
        gate("NAND2_X1", "nand2", &["A1", "A2"], "ZN", "!(A1&A2)", 1.5, 7000.0, 14.0, NegativeUnate, 570),
        gate("NAND2_X2", "nand2", &["A1", "A2"], "ZN", "!(A1&A2)", 2.8, 3500.0, 13.0, NegativeUnate, 950),
        gate("NAND2_X4", "nand2", &["A1", "A2"], "ZN", "!(A1&A2)", 5.4, 1750.0, 12.0, NegativeUnate, 1710),
        gate("AOI21_X1", "aoi21", &["A1", "A2", "B"], "ZN", "!((A1&A2)|B)", 1.6, 9000.0, 18.0, NegativeUnate, 760),
        tie("TIEHI", "1"),
        tie("TIELO", "0"),
        dff(),
    ];
    let mut clkbuf = gate("CLKBUF_X2", "clkbuf", &["A"], "Z", "A", 1.6, 3000.0, 17.0, PositiveUnate, 760);
    clkbuf.is_clock_cell = true;
    cells.push(clkbuf);

    let mut lib = Library::new("ferrite_demo");
    for cell in cells {
        lib.add_cell(cell)?;
    }
    Ok(lib)
}
