//! Read-only connectivity and wire reports.

use crate::design::Design;
use crate::session::Resizer;
use ferrite_common::units::dbu_to_meters;
use ferrite_common::Dbu;
use ferrite_netlist::{NetId, Netlist, PinId};
use serde::Serialize;

/// A driver with the distance to its farthest load.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LongWire {
    /// Driver pin name.
    pub driver: String,
    /// Manhattan distance to the farthest load, in meters.
    pub length: f64,
    /// Lumped RC delay of a wire of that length, in seconds.
    pub delay: f64,
}

impl Resizer {
    /// Nets with loads but no driver, sorted by name.
    pub fn find_floating_nets(&self, netlist: &Netlist) -> Vec<NetId> {
        let mut nets: Vec<(String, NetId)> = netlist
            .nets()
            .filter(|n| {
                n.pins.iter().any(|&p| netlist.is_load(p)) && !n.pins.iter().any(|&p| netlist.is_driver(p))
            })
            .map(|n| (n.name.clone(), n.id))
            .collect();
        nets.sort();
        nets.into_iter().map(|(_, id)| id).collect()
    }

    /// Instance input pins with no net.
    pub fn find_floating_pins(&self, netlist: &Netlist) -> Vec<PinId> {
        netlist
            .instances()
            .flat_map(|i| i.pins.iter().copied())
            .filter(|&p| {
                netlist
                    .pin(p)
                    .is_some_and(|pin| pin.direction == ferrite_liberty::PortDirection::Input && pin.net.is_none())
            })
            .collect()
    }

    /// Signal drivers ordered by the distance to their farthest load,
    /// longest first. Clock and constant drivers are skipped.
    pub fn find_long_wires(&self, design: &Design) -> Vec<LongWire> {
        let corner = self.target_corner(design);
        let netlist = &design.netlist;
        let mut wires: Vec<(Dbu, PinId)> = netlist
            .nets()
            .flat_map(|n| n.pins.iter().copied())
            .filter(|&p| netlist.is_driver(p))
            .filter(|&p| !design.sta.is_clock(netlist, p) && !design.sta.is_constant(netlist, &design.library, p))
            .map(|p| (max_load_manhattan_distance(netlist, p), p))
            .collect();
        wires.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        wires
            .into_iter()
            .map(|(dist, p)| {
                let length = dbu_to_meters(dist, netlist.dbu_per_micron);
                LongWire {
                    driver: netlist.pin_name(p),
                    length,
                    delay: 0.5 * (length * corner.wire_res_per_m) * (length * corner.wire_cap_per_m),
                }
            })
            .collect()
    }

    /// Largest driver-to-load Manhattan distance over the drivers of `net`,
    /// in meters.
    pub fn net_max_load_distance(&self, netlist: &Netlist, net: NetId) -> f64 {
        let dist = netlist
            .net_drivers(net)
            .into_iter()
            .map(|d| max_load_manhattan_distance(netlist, d))
            .max()
            .unwrap_or(0);
        dbu_to_meters(dist, netlist.dbu_per_micron)
    }
}

/// Manhattan distance from `drvr` to its farthest load, in database units.
pub fn max_load_manhattan_distance(netlist: &Netlist, drvr: PinId) -> Dbu {
    let (Some(net), Some(from)) = (netlist.pin_net(drvr), netlist.pin_location(drvr)) else {
        return 0;
    };
    netlist
        .net_loads(net)
        .into_iter()
        .filter_map(|l| netlist.pin_location(l))
        .map(|to| from.manhattan(to))
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrite_common::Point;
    use ferrite_config::ResizerSettings;
    use ferrite_liberty::{demo_library, Corner, PortDirection};

    fn design() -> (Design, Resizer) {
        let d = Design::new(Netlist::new("top", 1000), demo_library().unwrap())
            .with_corners(vec![Corner::new("wire", 0).with_wire_rc(1e6, 2e-10)]);
        let rsz = Resizer::new(ResizerSettings::default(), &d);
        (d, rsz)
    }

    #[test]
    fn floating_nets_and_pins() {
        let (mut d, mut rsz) = design();
        let inv = d.library.find_cell("INV_X1").unwrap();
        let u1 = rsz.make_instance(&mut d, inv, "u1", Point::new(0, 0)).unwrap();
        let u2 = rsz.make_instance(&mut d, inv, "u2", Point::new(0, 0)).unwrap();
        let b = d.netlist.create_net("b").unwrap();
        let a = d.netlist.create_net("a").unwrap();
        d.netlist.connect(d.netlist.find_pin(u1, "A").unwrap(), b).unwrap();
        d.netlist.connect(d.netlist.find_pin(u2, "ZN").unwrap(), a).unwrap();
        d.netlist.connect(d.netlist.find_pin(u1, "ZN").unwrap(), a).unwrap();
        let c = d.netlist.create_net("c").unwrap();
        let port = d.netlist.create_top_port("out", PortDirection::Output, Point::new(0, 0)).unwrap();
        d.netlist.connect(port, c).unwrap();

        assert_eq!(rsz.find_floating_nets(&d.netlist), vec![b, c]);
        assert_eq!(rsz.find_floating_pins(&d.netlist), vec![d.netlist.find_pin(u2, "A").unwrap()]);
    }

    #[test]
    fn long_wires_are_sorted_with_rc_delay() {
        let (mut d, mut rsz) = design();
        let inv = d.library.find_cell("INV_X1").unwrap();
        let drv_short = rsz.make_instance(&mut d, inv, "s", Point::new(0, 0)).unwrap();
        let drv_long = rsz.make_instance(&mut d, inv, "l", Point::new(0, 10_000)).unwrap();
        let ld1 = rsz.make_instance(&mut d, inv, "ld1", Point::new(1380, 0)).unwrap();
        let ld2 = rsz.make_instance(&mut d, inv, "ld2", Point::new(100_380, 10_000)).unwrap();
        for (drv, ld, name) in [(drv_short, ld1, "ns"), (drv_long, ld2, "nl")] {
            let n = d.netlist.create_net(name).unwrap();
            d.netlist.connect(d.netlist.find_pin(drv, "ZN").unwrap(), n).unwrap();
            d.netlist.connect(d.netlist.find_pin(ld, "A").unwrap(), n).unwrap();
        }

        let wires = rsz.find_long_wires(&d);
        assert_eq!(wires[0].driver, "l/ZN");
        assert!((wires[0].length - 100e-6).abs() < 1e-12);
        let expected = 0.5 * (100e-6 * 1e6) * (100e-6 * 2e-10);
        assert!((wires[0].delay - expected).abs() < 1e-20);
        assert_eq!(wires[1].driver, "s/ZN");
        assert!((wires[1].length - 1e-6).abs() < 1e-12);
        let nl = d.netlist.find_net("nl").unwrap();
        assert!((rsz.net_max_load_distance(&d.netlist, nl) - 100e-6).abs() < 1e-12);
    }
}
