//! Configuration types deserialized from `ferrite.toml`.

use serde::Deserialize;

/// The top-level configuration parsed from `ferrite.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FerriteConfig {
    /// Resizer policy settings.
    #[serde(default)]
    pub resizer: ResizerSettings,
    /// Tie-cell fanout repair settings.
    #[serde(default)]
    pub tie: TieSettings,
    /// Analysis corners. An empty list means a single nominal corner.
    #[serde(default)]
    pub corners: Vec<CornerConfig>,
}

/// Where the timing engine's parasitics come from.
///
/// Routing-derived parasitics require every resized or inserted instance to
/// be legalized immediately, because the router will not revisit it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParasiticsSource {
    /// No parasitics; wires are ideal.
    None,
    /// Estimated from placement.
    #[default]
    Placement,
    /// Extracted from global routing.
    GlobalRouting,
    /// Extracted from detailed routing.
    DetailedRouting,
}

impl ParasiticsSource {
    /// Returns `true` for routing-derived parasitics.
    pub fn is_routing(self) -> bool {
        matches!(self, Self::GlobalRouting | Self::DetailedRouting)
    }
}

/// Resizer policy knobs.
#[derive(Debug, Clone, Deserialize)]
pub struct ResizerSettings {
    /// Restrict swappable cells to the same footprint as the current cell.
    #[serde(default)]
    pub match_cell_footprint: bool,
    /// Never pick clock buffers for data-path buffering.
    #[serde(default = "default_true")]
    pub exclude_clock_buffers: bool,
    /// Source of the parasitics the timing engine uses.
    #[serde(default)]
    pub parasitics_source: ParasiticsSource,
    /// Multiple of a buffer's input capacitance used as its load when
    /// deriving the target slew.
    #[serde(default = "default_load_cap_factor")]
    pub target_slew_load_cap_factor: f64,
    /// Cell name patterns (`*` wildcard) that must never be instantiated.
    #[serde(default)]
    pub dont_use: Vec<String>,
    /// Maximum core utilization, as a fraction of the core area.
    #[serde(default)]
    pub max_utilization: Option<f64>,
}

impl Default for ResizerSettings {
    fn default() -> Self {
        Self {
            match_cell_footprint: false,
            exclude_clock_buffers: true,
            parasitics_source: ParasiticsSource::default(),
            target_slew_load_cap_factor: default_load_cap_factor(),
            dont_use: Vec::new(),
            max_utilization: None,
        }
    }
}

impl ResizerSettings {
    /// Returns `true` if `cell_name` matches one of the `dont_use` patterns.
    pub fn is_dont_use(&self, cell_name: &str) -> bool {
        self.dont_use.iter().any(|p| wildcard_match(p, cell_name))
    }
}

/// Tie-cell fanout repair settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TieSettings {
    /// Distance between a new tie cell and the load it drives, in microns.
    #[serde(default)]
    pub separation_um: f64,
}

/// One analysis corner.
#[derive(Debug, Clone, Deserialize)]
pub struct CornerConfig {
    /// Corner name.
    pub name: String,
    /// Multiplier applied to library cell delays.
    #[serde(default = "default_scale")]
    pub delay_scale: f64,
    /// Multiplier applied to library output slews.
    #[serde(default = "default_scale")]
    pub slew_scale: f64,
    /// Wire resistance in ohms per micron.
    #[serde(default)]
    pub wire_res_per_um: f64,
    /// Wire capacitance in femtofarads per micron.
    #[serde(default)]
    pub wire_cap_ff_per_um: f64,
}

fn default_true() -> bool {
    true
}

fn default_scale() -> f64 {
    1.0
}

fn default_load_cap_factor() -> f64 {
    10.0
}

/// Matches `text` against `pattern` where `*` matches any run of characters.
pub fn wildcard_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut pi, mut ti) = (0, 0);
    let mut star: Option<(usize, usize)> = None;
    while ti < t.len() {
        if pi < p.len() && p[pi] == '*' {
            star = Some((pi, ti));
            pi += 1;
        } else if pi < p.len() && p[pi] == t[ti] {
            pi += 1;
            ti += 1;
        } else if let Some((sp, st)) = star {
            pi = sp + 1;
            ti = st + 1;
            star = Some((sp, st + 1));
        } else {
            return false;
        }
    }
    p[pi..].iter().all(|&c| c == '*')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_patterns() {
        assert!(wildcard_match("*_DLY*", "BUF_DLY4_X1"));
        assert!(wildcard_match("BUF_X1", "BUF_X1"));
        assert!(wildcard_match("*", ""));
        assert!(!wildcard_match("BUF_*", "INV_X1"));
        assert!(!wildcard_match("BUF", "BUF_X1"));
        assert!(wildcard_match("B*_X*", "BUF_X16"));
    }

    #[test]
    fn routing_sources() {
        assert!(!ParasiticsSource::Placement.is_routing());
        assert!(ParasiticsSource::GlobalRouting.is_routing());
        assert!(ParasiticsSource::DetailedRouting.is_routing());
    }

    #[test]
    fn dont_use_lookup() {
        let settings = ResizerSettings {
            dont_use: vec!["*_DLY*".to_string(), "CLKBUF_X1".to_string()],
            ..ResizerSettings::default()
        };
        assert!(settings.is_dont_use("BUF_DLY2"));
        assert!(settings.is_dont_use("CLKBUF_X1"));
        assert!(!settings.is_dont_use("BUF_X2"));
    }
}
