//! Shared fixture: a small placed netlist on the demo library.
//!
//! ```text
//! in ──┬── u1 (INV_X1) ── n1 ── b1 (BUF_X1) ── n2 ── u2/A1
//!      └────────────────────────────────────────── u2/A2   u2 (NAND2_X1) ── out
//! ```

#![allow(dead_code)]

use ferrite_common::Point;
use ferrite_liberty::{demo_library, Library, PortDirection};
use ferrite_netlist::{InstId, Netlist, PinId, PlacementStatus};
use ferrite_resizer::Design;

pub fn place(nl: &mut Netlist, lib: &Library, cell: &str, name: &str, x: i64) -> InstId {
    let inst = nl.create_instance(lib, lib.find_cell(cell).unwrap(), name).unwrap();
    nl.set_location(inst, Point::new(x, 0)).unwrap();
    nl.set_placement(inst, PlacementStatus::Placed).unwrap();
    inst
}

pub fn wire(nl: &mut Netlist, net: &str, pins: &[PinId]) {
    let net = match nl.find_net(net) {
        Some(n) => n,
        None => nl.create_net(net).unwrap(),
    };
    for &pin in pins {
        nl.connect(pin, net).unwrap();
    }
}

pub fn pin(nl: &Netlist, inst: &str, port: &str) -> PinId {
    nl.find_pin_by_path(&format!("{inst}/{port}")).unwrap()
}

pub fn chain_netlist(lib: &Library) -> Netlist {
    let mut nl = Netlist::new("top", 1000);
    let input = nl.create_top_port("in", PortDirection::Input, Point::new(0, 700)).unwrap();
    let output = nl.create_top_port("out", PortDirection::Output, Point::new(40_000, 700)).unwrap();
    place(&mut nl, lib, "INV_X1", "u1", 10_000);
    place(&mut nl, lib, "BUF_X1", "b1", 20_000);
    place(&mut nl, lib, "NAND2_X1", "u2", 30_000);
    let pins = [
        pin(&nl, "u1", "A"),
        pin(&nl, "u2", "A2"),
        pin(&nl, "u1", "ZN"),
        pin(&nl, "b1", "A"),
        pin(&nl, "b1", "Z"),
        pin(&nl, "u2", "A1"),
        pin(&nl, "u2", "ZN"),
    ];
    wire(&mut nl, "in", &[input, pins[0], pins[1]]);
    wire(&mut nl, "n1", &[pins[2], pins[3]]);
    wire(&mut nl, "n2", &[pins[4], pins[5]]);
    wire(&mut nl, "out", &[pins[6], output]);
    nl
}

pub fn chain_design() -> Design {
    let lib = demo_library().unwrap();
    let nl = chain_netlist(&lib);
    Design::new(nl, lib)
}
