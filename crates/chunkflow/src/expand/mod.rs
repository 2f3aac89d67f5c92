//! Expansion of logical graphs into physical graphs.
//!
//! [`ExpandEngine`] walks the logical graph in dependency order, invokes the data-generation and
//! compute functions attached to each node exactly once, validates what they return, assigns
//! every fragment its offset inside the parent tensor, and remembers which physical nodes realize
//! each logical data node.
mod engine;
mod mapping;

pub use engine::{ExpandEngine, ExpandStats};

/// Tunables for [`ExpandEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandConfig {
    /// Log the offset assigned to every fragment at debug level.
    pub trace_offsets: bool,
    /// Reject partition grids whose cell sizes along an axis vary with the other axes.
    pub validate_regular_grid: bool,
}

impl Default for ExpandConfig {
    fn default() -> Self {
        Self {
            trace_offsets: false,
            validate_regular_grid: true,
        }
    }
}

impl ExpandConfig {
    /// Environment variable toggling [`ExpandConfig::trace_offsets`].
    pub const TRACE_OFFSETS_VAR: &'static str = "CHUNKFLOW_TRACE_OFFSETS";

    /// Defaults overridden by the environment.
    ///
    /// Unset or empty variables keep the default; unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(trace) = env_flag(Self::TRACE_OFFSETS_VAR) {
            config.trace_offsets = trace;
        }
        config
    }
}

fn env_flag(name: &str) -> Option<bool> {
    let value = std::env::var(name).ok()?;
    let flag = parse_flag(&value);
    if flag.is_none() && !value.trim().is_empty() {
        log::warn!("ignoring {name}={value:?}: expected a boolean");
    }
    flag
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
