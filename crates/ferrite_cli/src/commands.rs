//! Subcommand dispatch.
//!
//! Each command runs against a freshly loaded design. Edit commands report
//! through the resizer's diagnostics; report commands also print a table or
//! JSON document to stdout.

use ferrite_common::units::{format_cap, format_distance, format_time, MICRON};
use ferrite_diagnostics::Diagnostic;
use ferrite_resizer::codes;
use ferrite_resizer::{Design, EditCounters, LongWire, Resizer, ResizerError};
use serde_json::json;

use crate::pipeline::{load_design, render_diagnostics, resolve_config, save_design};
use crate::{Command, GlobalArgs, ReportFormat, SwapPinsArgs};

/// What a command leaves to print.
enum Report {
    Edits(EditCounters),
    TargetLoads(Vec<(String, f64)>),
    MaxWireLength(f64),
    LongWires(Vec<LongWire>),
    Floating { nets: Vec<String>, pins: Vec<String> },
}

/// Runs one subcommand and returns the process exit code.
pub fn run(command: &Command, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config = resolve_config(global)?;
    let mut design = load_design(global, &config)?;
    let mut rsz = Resizer::from_config(&config, &design);

    let before = design.netlist.structural_fingerprint();
    if global.trial {
        rsz.journal_begin(&mut design)?;
    }
    let tie_separation = config.tie.separation_um;
    let outcome = execute(command, &mut rsz, &mut design, tie_separation);
    if let Err(ref e) = outcome {
        rsz.diagnostics().emit(e.to_diagnostic());
    }

    if global.trial {
        let summary = rsz.journal_restore(&mut design)?;
        if !global.quiet {
            eprintln!("   Rolled back: {summary}");
        }
        if design.netlist.structural_fingerprint() != before {
            rsz.diagnostics().emit(Diagnostic::error(
                codes::ROLLBACK_MISMATCH,
                "netlist differs from its state before the trial",
            ));
        }
    } else if outcome.is_ok() {
        save_design(&design, global)?;
    }

    if let Ok(ref report) = outcome {
        print_report(report, global)?;
    }
    Ok(render_diagnostics(rsz.diagnostics(), global))
}

fn execute(
    command: &Command,
    rsz: &mut Resizer,
    design: &mut Design,
    tie_separation_um: f64,
) -> Result<Report, ResizerError> {
    match command {
        Command::Resize { pin: Some(path) } => {
            let pin = design
                .netlist
                .find_pin_by_path(path)
                .ok_or_else(|| ResizerError::UnknownPin(path.clone()))?;
            rsz.resize_to_target_slew(design, pin)?;
            rsz.update_parasitics(design);
        }
        Command::Resize { pin: None } => {
            rsz.resize_all(design)?;
        }
        Command::BufferInputs => {
            rsz.buffer_inputs(design)?;
        }
        Command::BufferOutputs => {
            rsz.buffer_outputs(design)?;
        }
        Command::RemoveBuffers { instances } => {
            let insts = instances
                .iter()
                .map(|name| {
                    design
                        .netlist
                        .find_instance(name)
                        .ok_or_else(|| ResizerError::UnknownInstance(name.clone()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            rsz.remove_buffers(design, &insts)?;
        }
        Command::RepairTieFanout { tie, separation } => {
            let (cell_name, port) = tie
                .split_once('/')
                .ok_or_else(|| ResizerError::UnknownPin(tie.clone()))?;
            let cell = design
                .library
                .find_cell(cell_name)
                .ok_or_else(|| ResizerError::UnknownCell(cell_name.to_string()))?;
            let separation = separation.unwrap_or(tie_separation_um) * MICRON;
            rsz.repair_tie_fanout(design, cell, port, separation)?;
        }
        Command::SwapPins(args) => swap_pins(rsz, design, args)?,
        Command::RepairClkInverters => {
            rsz.repair_clk_inverters(design)?;
        }
        Command::EliminateDeadLogic { clean_nets } => {
            rsz.eliminate_dead_logic(design, *clean_nets)?;
        }
        Command::ReportTargetLoads => {
            rsz.resize_preamble(design)?;
            let loads = design
                .library
                .cell_ids()
                .filter_map(|id| {
                    rsz.target_load(id)
                        .map(|load| (design.library.cell(id).name.clone(), load))
                })
                .collect();
            return Ok(Report::TargetLoads(loads));
        }
        Command::MaxWireLength => {
            return Ok(Report::MaxWireLength(rsz.find_max_wire_length(design)?));
        }
        Command::ReportLongWires { count } => {
            let mut wires = rsz.find_long_wires(design);
            wires.truncate(*count);
            return Ok(Report::LongWires(wires));
        }
        Command::ReportFloating => {
            let netlist = &design.netlist;
            let nets = rsz
                .find_floating_nets(netlist)
                .into_iter()
                .map(|n| netlist.net_name(n))
                .collect();
            let pins = rsz
                .find_floating_pins(netlist)
                .into_iter()
                .map(|p| netlist.pin_name(p))
                .collect();
            return Ok(Report::Floating { nets, pins });
        }
    }
    Ok(Report::Edits(rsz.counters()))
}

fn swap_pins(rsz: &mut Resizer, design: &mut Design, args: &SwapPinsArgs) -> Result<(), ResizerError> {
    let netlist = &design.netlist;
    let inst = netlist
        .find_instance(&args.inst)
        .ok_or_else(|| ResizerError::UnknownInstance(args.inst.clone()))?;
    let find = |port: &str| {
        netlist
            .find_pin(inst, port)
            .ok_or_else(|| ResizerError::UnknownPin(format!("{}/{port}", args.inst)))
    };
    let input = find(&args.input)?;
    let output = find(&args.output)?;
    if rsz.repair_pin_swap(design, input, output)? {
        tracing::info!(inst = %args.inst, input = %args.input, "swapped to a faster input");
    }
    Ok(())
}

fn print_report(report: &Report, global: &GlobalArgs) -> Result<(), serde_json::Error> {
    if global.format == ReportFormat::Json {
        let value = match report {
            Report::Edits(counters) => serde_json::to_value(counters)?,
            Report::TargetLoads(loads) => json!(loads
                .iter()
                .map(|(cell, load)| json!({ "cell": cell, "target_load": load }))
                .collect::<Vec<_>>()),
            Report::MaxWireLength(length) => json!({ "max_wire_length": length }),
            Report::LongWires(wires) => serde_json::to_value(wires)?,
            Report::Floating { nets, pins } => json!({ "nets": nets, "pins": pins }),
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    match report {
        Report::Edits(c) => {
            if !global.quiet {
                eprintln!(
                    "     Edits: {} resized, {} buffers inserted, {} buffers removed, {} cloned, {} pin swaps",
                    c.resized, c.inserted_buffers, c.removed_buffers, c.cloned_gates, c.swapped_pins
                );
            }
        }
        Report::TargetLoads(loads) => {
            println!("{:<20} {:>12}", "Cell", "Target load");
            for (cell, load) in loads {
                println!("{cell:<20} {:>12}", format_cap(*load));
            }
        }
        Report::MaxWireLength(length) => println!("{}", format_distance(*length)),
        Report::LongWires(wires) => {
            println!("{:<24} {:>14} {:>12}", "Driver", "Length", "Delay");
            for w in wires {
                println!(
                    "{:<24} {:>14} {:>12}",
                    w.driver,
                    format_distance(w.length),
                    format_time(w.delay)
                );
            }
        }
        Report::Floating { nets, pins } => {
            for net in nets {
                println!("floating net {net}");
            }
            for pin in pins {
                println!("floating pin {pin}");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrite_common::Point;
    use ferrite_liberty::{demo_library, PortDirection};
    use ferrite_netlist::{Netlist, PlacementStatus};
    use std::path::Path;

    /// in -> u1 (INV_X1) -> n1 -> b1 (BUF_X1) -> n2 -> u2 (INV_X1) -> out
    fn chain() -> Design {
        let lib = demo_library().unwrap();
        let mut nl = Netlist::new("top", 1000);
        let input = nl.create_top_port("in", PortDirection::Input, Point::new(0, 700)).unwrap();
        let output = nl.create_top_port("out", PortDirection::Output, Point::new(40_000, 700)).unwrap();
        let mut place = |nl: &mut Netlist, cell: &str, name: &str, x: i64| {
            let inst = nl.create_instance(&lib, lib.find_cell(cell).unwrap(), name).unwrap();
            nl.set_location(inst, Point::new(x, 0)).unwrap();
            nl.set_placement(inst, PlacementStatus::Placed).unwrap();
        };
        place(&mut nl, "INV_X1", "u1", 10_000);
        place(&mut nl, "BUF_X1", "b1", 20_000);
        place(&mut nl, "INV_X1", "u2", 30_000);
        for (net, pins) in [
            ("in", vec!["u1/A"]),
            ("n1", vec!["u1/ZN", "b1/A"]),
            ("n2", vec!["b1/Z", "u2/A"]),
            ("out", vec!["u2/ZN"]),
        ] {
            let n = nl.create_net(net).unwrap();
            for path in pins {
                let pin = nl.find_pin_by_path(path).unwrap();
                nl.connect(pin, n).unwrap();
            }
        }
        let n_in = nl.find_net("in").unwrap();
        let n_out = nl.find_net("out").unwrap();
        nl.connect(input, n_in).unwrap();
        nl.connect(output, n_out).unwrap();
        Design::new(nl, lib)
    }

    fn write_inputs(dir: &Path, design: &Design) {
        std::fs::write(dir.join("lib.json"), serde_json::to_string(&design.library).unwrap()).unwrap();
        design.netlist.save(&dir.join("top.json")).unwrap();
    }

    fn setup() -> (tempfile::TempDir, GlobalArgs) {
        let dir = tempfile::tempdir().unwrap();
        write_inputs(dir.path(), &chain());
        let global = GlobalArgs {
            quiet: true,
            verbose: false,
            color: false,
            config: None,
            library: Some(dir.path().join("lib.json").to_string_lossy().into_owned()),
            design: Some(dir.path().join("top.json").to_string_lossy().into_owned()),
            output: None,
            trial: false,
            format: ReportFormat::Text,
        };
        (dir, global)
    }

    #[test]
    fn remove_buffers_writes_the_edited_design() {
        let (dir, mut global) = setup();
        let out = dir.path().join("out.json");
        global.output = Some(out.to_string_lossy().into_owned());
        let code = run(&Command::RemoveBuffers { instances: vec![] }, &global).unwrap();
        assert_eq!(code, 0);
        let edited = Netlist::load(&out).unwrap();
        assert!(edited.find_instance("b1").is_none());
        assert_eq!(edited.instance_count(), 2);
    }

    #[test]
    fn trial_leaves_no_output() {
        let (dir, mut global) = setup();
        let out = dir.path().join("out.json");
        global.output = Some(out.to_string_lossy().into_owned());
        global.trial = true;
        let code = run(&Command::BufferInputs, &global).unwrap();
        assert_eq!(code, 0);
        assert!(!out.exists());
    }

    #[test]
    fn unknown_instance_fails_the_command() {
        let (_dir, global) = setup();
        let code = run(
            &Command::RemoveBuffers {
                instances: vec!["nope".to_string()],
            },
            &global,
        )
        .unwrap();
        assert_eq!(code, 1);
    }

    #[test]
    fn execute_reports_long_wires_longest_first() {
        let mut design = chain();
        let mut rsz = Resizer::new(Default::default(), &design);
        let report = execute(&Command::ReportLongWires { count: 2 }, &mut rsz, &mut design, 0.0).unwrap();
        let Report::LongWires(wires) = report else {
            panic!("expected a long wire report");
        };
        assert_eq!(wires.len(), 2);
        assert!(wires[0].length >= wires[1].length);
    }

    #[test]
    fn execute_tie_spec_needs_a_port() {
        let mut design = chain();
        let mut rsz = Resizer::new(Default::default(), &design);
        let command = Command::RepairTieFanout {
            tie: "TIEHI".to_string(),
            separation: None,
        };
        assert!(matches!(
            execute(&command, &mut rsz, &mut design, 0.0),
            Err(ResizerError::UnknownPin(_))
        ));
    }

    #[test]
    fn execute_target_loads_lists_characterized_cells() {
        let mut design = chain();
        let mut rsz = Resizer::new(Default::default(), &design);
        let Report::TargetLoads(loads) = execute(&Command::ReportTargetLoads, &mut rsz, &mut design, 0.0).unwrap()
        else {
            panic!("expected a target load report");
        };
        assert!(loads.iter().any(|(cell, load)| cell == "BUF_X1" && *load > 0.0));
    }
}
