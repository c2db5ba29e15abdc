//! Shared pipeline helpers for CLI commands.
//!
//! Resolves the configuration, loads the library and design into a
//! [`Design`], renders diagnostics, and writes the edited design.

use std::path::{Path, PathBuf};

use ferrite_config::{FerriteConfig, CONFIG_FILE_NAME};
use ferrite_diagnostics::{DiagnosticRenderer, DiagnosticSink, Severity, TerminalRenderer};
use ferrite_liberty::Library;
use ferrite_netlist::Netlist;
use ferrite_resizer::{corners_from_config, Design};

use crate::GlobalArgs;

/// Finds the configuration to use.
///
/// `--config` wins. Otherwise a `ferrite.toml` next to the design file is
/// used if present, and defaults apply when there is none.
pub fn resolve_config(global: &GlobalArgs) -> Result<FerriteConfig, Box<dyn std::error::Error>> {
    if let Some(ref path) = global.config {
        return Ok(ferrite_config::load_config(Path::new(path))?);
    }
    if let Some(dir) = global.design.as_deref().map(design_dir) {
        if dir.join(CONFIG_FILE_NAME).is_file() {
            return Ok(ferrite_config::load_config(&dir)?);
        }
    }
    Ok(FerriteConfig::default())
}

fn design_dir(design: &str) -> PathBuf {
    Path::new(design)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Loads the library and design named on the command line and binds them
/// to the configured corners.
pub fn load_design(
    global: &GlobalArgs,
    config: &FerriteConfig,
) -> Result<Design, Box<dyn std::error::Error>> {
    let lib_path = global.library.as_deref().ok_or("missing --library <lib.json>")?;
    let design_path = global.design.as_deref().ok_or("missing --design <design.json>")?;
    let library = Library::load(Path::new(lib_path))?;
    let netlist = Netlist::load(Path::new(design_path))?;
    tracing::debug!(
        library = %library.name,
        cells = library.cell_count(),
        top = %netlist.top,
        instances = netlist.instance_count(),
        "loaded design"
    );
    Ok(Design::new(netlist, library).with_corners(corners_from_config(&config.corners)))
}

/// Writes the design to `--output`, if given.
pub fn save_design(design: &Design, global: &GlobalArgs) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(ref path) = global.output {
        design.netlist.save(Path::new(path))?;
        if !global.quiet {
            eprintln!("     Wrote {path}");
        }
    }
    Ok(())
}

/// Renders collected diagnostics to stderr and returns the exit code.
///
/// In quiet mode only errors are shown.
pub fn render_diagnostics(sink: &DiagnosticSink, global: &GlobalArgs) -> i32 {
    let renderer = TerminalRenderer::new(global.color);
    for diag in sink.diagnostics() {
        if global.quiet && diag.severity != Severity::Error {
            continue;
        }
        eprint!("{}", renderer.render(&diag));
    }
    if sink.has_errors() {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ReportFormat;

    fn global(dir: &Path) -> GlobalArgs {
        GlobalArgs {
            quiet: true,
            verbose: false,
            color: false,
            config: None,
            library: Some(dir.join("lib.json").to_string_lossy().into_owned()),
            design: Some(dir.join("top.json").to_string_lossy().into_owned()),
            output: None,
            trial: false,
            format: ReportFormat::Text,
        }
    }

    #[test]
    fn design_dir_of_bare_file_is_cwd() {
        assert_eq!(design_dir("top.json"), PathBuf::from("."));
        assert_eq!(design_dir("runs/a/top.json"), PathBuf::from("runs/a"));
    }

    #[test]
    fn config_next_to_design_is_found() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[tie]\nseparation_um = 3.0\n").unwrap();
        let config = resolve_config(&global(dir.path())).unwrap();
        assert_eq!(config.tie.separation_um, 3.0);
    }

    #[test]
    fn missing_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = resolve_config(&global(dir.path())).unwrap();
        assert!(config.corners.is_empty());
    }

    #[test]
    fn missing_library_flag_errors() {
        let dir = tempfile::tempdir().unwrap();
        let mut g = global(dir.path());
        g.library = None;
        let err = load_design(&g, &FerriteConfig::default()).err().unwrap();
        assert!(err.to_string().contains("--library"));
    }
}
