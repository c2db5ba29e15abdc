//! Buffer removal, port buffering, and pin swapping on a small placed design.

mod common;

use common::{chain_design, chain_netlist, pin, place, wire};
use ferrite_common::units::PICO;
use ferrite_config::ResizerSettings;
use ferrite_liberty::{demo_library, PortDirection, RiseFall};
use ferrite_netlist::Netlist;
use ferrite_resizer::{Design, Resizer};
use ferrite_timing::EstimatedTiming;

fn session(design: &Design) -> Resizer {
    Resizer::new(ResizerSettings::default(), design)
}

#[test]
fn remove_all_buffers_merges_into_input_net() {
    let mut d = chain_design();
    let mut rsz = session(&d);
    let n1 = d.netlist.find_net("n1").unwrap();

    assert_eq!(rsz.remove_buffers(&mut d, &[]).unwrap(), 1);
    assert!(d.netlist.find_instance("b1").is_none());
    assert!(d.netlist.find_net("n2").is_none());
    assert_eq!(d.netlist.pin_net(pin(&d.netlist, "u2", "A1")), Some(n1));
    assert_eq!(d.netlist.pin_net(pin(&d.netlist, "u1", "ZN")), Some(n1));
    assert_eq!(rsz.counters().removed_buffers, 1);
    assert!(rsz.diagnostics().contains_code("I026"));
}

#[test]
fn dont_touch_buffer_survives_bulk_removal_but_not_manual() {
    let mut d = chain_design();
    let mut rsz = session(&d);
    let b1 = d.netlist.find_instance("b1").unwrap();
    d.netlist.set_inst_dont_touch(b1, true).unwrap();

    assert_eq!(rsz.remove_buffers(&mut d, &[]).unwrap(), 0);
    assert!(d.netlist.find_instance("b1").is_some());

    assert_eq!(rsz.remove_buffers(&mut d, &[b1]).unwrap(), 1);
    assert!(d.netlist.find_instance("b1").is_none());
    assert!(!rsz.diagnostics().contains_code("W097"));
}

#[test]
fn port_to_port_buffer_is_never_removed() {
    let lib = demo_library().unwrap();
    let mut nl = Netlist::new("top", 1000);
    let a = nl.create_top_port("a", PortDirection::Input, Default::default()).unwrap();
    let y = nl.create_top_port("y", PortDirection::Output, Default::default()).unwrap();
    let buf = place(&mut nl, &lib, "BUF_X2", "feed", 5000);
    let (buf_a, buf_z) = (pin(&nl, "feed", "A"), pin(&nl, "feed", "Z"));
    wire(&mut nl, "a", &[a, buf_a]);
    wire(&mut nl, "y", &[buf_z, y]);
    let mut d = Design::new(nl, lib);
    let mut rsz = session(&d);

    assert!(rsz.buffer_between_ports(&d, buf));
    assert!(!rsz.remove_buffer(&mut d, buf, false, false).unwrap());
    assert_eq!(rsz.remove_buffers(&mut d, &[buf]).unwrap(), 0);
    assert!(rsz.diagnostics().contains_code("W097"));
    assert!(d.netlist.find_instance("feed").is_some());
}

#[test]
fn output_port_net_survives_removal() {
    let lib = demo_library().unwrap();
    let mut nl = chain_netlist(&lib);
    // Drive the output port through a second buffer.
    place(&mut nl, &lib, "BUF_X1", "b2", 35_000);
    let out = nl.find_top_port("out").unwrap();
    let (u2_zn, b2_a, b2_z) = (pin(&nl, "u2", "ZN"), pin(&nl, "b2", "A"), pin(&nl, "b2", "Z"));
    wire(&mut nl, "mid", &[u2_zn, b2_a]);
    wire(&mut nl, "out", &[b2_z, out]);
    let out_net = nl.find_net("out").unwrap();
    let b2 = nl.find_instance("b2").unwrap();
    let mut d = Design::new(nl, lib);
    let mut rsz = session(&d);

    assert!(rsz.remove_buffer(&mut d, b2, true, false).unwrap());
    assert!(d.netlist.find_net("mid").is_none());
    assert_eq!(d.netlist.pin_net(u2_zn), Some(out_net));
    assert_eq!(d.netlist.net_name(out_net), "out");
}

#[test]
fn ports_are_buffered_with_weakest_buffer() {
    let mut d = chain_design();
    let mut rsz = session(&d);
    let buf_x1 = d.library.find_cell("BUF_X1").unwrap();

    assert_eq!(rsz.buffer_inputs(&mut d).unwrap(), 1);
    let input1 = d.netlist.find_instance("input1").unwrap();
    assert_eq!(d.netlist.instance(input1).unwrap().cell, buf_x1);
    let in_net = d.netlist.find_net("in").unwrap();
    // The port net now feeds only the new buffer.
    assert_eq!(d.netlist.net_loads(in_net), vec![pin(&d.netlist, "input1", "A")]);
    let fanout = d.netlist.pin_net(pin(&d.netlist, "input1", "Z")).unwrap();
    assert_eq!(d.netlist.pin_net(pin(&d.netlist, "u1", "A")), Some(fanout));
    assert_eq!(d.netlist.pin_net(pin(&d.netlist, "u2", "A2")), Some(fanout));

    assert_eq!(rsz.buffer_outputs(&mut d).unwrap(), 1);
    let out_port = d.netlist.find_top_port("out").unwrap();
    let out_net = d.netlist.pin_net(out_port).unwrap();
    assert_eq!(d.netlist.net_name(out_net), "out");
    let drivers = d.netlist.net_drivers(out_net);
    assert_eq!(drivers, vec![pin(&d.netlist, "output2", "Z")]);

    assert_eq!(rsz.counters().inserted_buffers, 2);
    assert!(rsz.diagnostics().contains_code("I027"));
    assert!(rsz.diagnostics().contains_code("I028"));
    assert!(rsz.history().buffered.contains(&input1));
}

#[test]
fn dont_touch_neighbors_block_port_buffering() {
    let mut d = chain_design();
    let mut rsz = session(&d);
    let u1 = d.netlist.find_instance("u1").unwrap();
    let u2 = d.netlist.find_instance("u2").unwrap();
    d.netlist.set_inst_dont_touch(u1, true).unwrap();
    d.netlist.set_inst_dont_touch(u2, true).unwrap();

    assert_eq!(rsz.buffer_inputs(&mut d).unwrap(), 0);
    assert!(rsz.diagnostics().contains_code("W085"));
    assert_eq!(rsz.buffer_outputs(&mut d).unwrap(), 0);
    assert!(rsz.diagnostics().contains_code("W084"));
    assert_eq!(rsz.counters().inserted_buffers, 0);
}

#[test]
fn late_input_is_swapped_to_fast_pin() {
    let lib = demo_library().unwrap();
    let nl = chain_netlist(&lib);
    let (a1, a2, zn) = (pin(&nl, "u2", "A1"), pin(&nl, "u2", "A2"), pin(&nl, "u2", "ZN"));
    let (n2, in_net) = (nl.find_net("n2").unwrap(), nl.find_net("in").unwrap());
    let mut sta = EstimatedTiming::new();
    for rf in RiseFall::ALL {
        sta.set_vertex_slew(a1, rf, 300.0 * PICO);
        sta.set_vertex_slew(a2, rf, 10.0 * PICO);
    }
    let mut d = Design::new(nl, lib).with_timing(Box::new(sta));
    let mut rsz = session(&d);

    assert!(rsz.repair_pin_swap(&mut d, a1, zn).unwrap());
    assert_eq!(d.netlist.pin_net(a1), Some(in_net));
    assert_eq!(d.netlist.pin_net(a2), Some(n2));
    assert_eq!(rsz.counters().swapped_pins, 1);
    assert!(rsz.history().swapped.contains(&d.netlist.find_instance("u2").unwrap()));
}

#[test]
fn fast_input_is_left_alone() {
    let lib = demo_library().unwrap();
    let nl = chain_netlist(&lib);
    let (a1, a2, zn) = (pin(&nl, "u2", "A1"), pin(&nl, "u2", "A2"), pin(&nl, "u2", "ZN"));
    let mut sta = EstimatedTiming::new();
    for rf in RiseFall::ALL {
        sta.set_vertex_slew(a1, rf, 10.0 * PICO);
        sta.set_vertex_slew(a2, rf, 300.0 * PICO);
    }
    let mut d = Design::new(nl, lib).with_timing(Box::new(sta));
    let mut rsz = session(&d);
    let before = d.netlist.structural_fingerprint();

    assert!(!rsz.repair_pin_swap(&mut d, a1, zn).unwrap());
    assert_eq!(d.netlist.structural_fingerprint(), before);
    assert_eq!(rsz.counters().swapped_pins, 0);
}
