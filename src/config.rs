//! Command-line configuration for the exhibit tool.
//!
//! Two subcommands share the same exhibit argument:
//!
//! - `layout` loads an exhibit and prints the computed grid, placements and
//!   layer plan as JSON
//! - `simulate` builds the exhibit into a headless viewer, resolves its
//!   layers and reports how the load barrier behaved
//!
//! # Example
//!
//! ```ignore
//! use clap::Parser;
//! use wsi_exhibit::config::{Cli, Command};
//!
//! match Cli::parse().into_command() {
//!     Command::Layout(config) => println!("{}", config.exhibit),
//!     Command::Simulate(config) => println!("{:?}", config.barrier_timeout()),
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `EXHIBIT_SOURCE` - Exhibit JSON file or `http(s)` URL
//! - `EXHIBIT_TEXTURE_UNITS` - Texture units available to the renderer (default: 16)
//! - `EXHIBIT_BARRIER_TIMEOUT_MS` - Barrier deadline in ms, 0 to disable (default: 30000)
//! - `EXHIBIT_FAILURE_POLICY` - `count-as-loaded` or `stall` (default: count-as-loaded)

use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::barrier::FailurePolicy;
use crate::exhibit::ExhibitSource;

// =============================================================================
// Default Values
// =============================================================================

/// Default number of texture units assumed for the renderer.
pub const DEFAULT_TEXTURE_UNITS: usize = 16;

/// Default barrier deadline in milliseconds (30 seconds).
pub const DEFAULT_BARRIER_TIMEOUT_MS: u64 = 30_000;

/// Largest accepted barrier deadline in milliseconds (10 minutes).
pub const MAX_BARRIER_TIMEOUT_MS: u64 = 600_000;

// =============================================================================
// CLI Arguments
// =============================================================================

/// WSI Exhibit - layout and load synchronization for multi-channel slide exhibits.
#[derive(Parser, Debug, Clone)]
#[command(name = "wsi-exhibit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn into_command(self) -> Command {
        self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the computed layout of an exhibit as JSON.
    Layout(LayoutConfig),

    /// Build an exhibit into a headless viewer and report layer loading.
    Simulate(SimulateConfig),
}

/// Options of the `layout` subcommand.
#[derive(Args, Debug, Clone)]
pub struct LayoutConfig {
    /// Exhibit JSON file or http(s) URL.
    #[arg(env = "EXHIBIT_SOURCE")]
    pub exhibit: String,

    /// Texture units available to the renderer (sizes the tile cache).
    #[arg(long, default_value_t = DEFAULT_TEXTURE_UNITS, env = "EXHIBIT_TEXTURE_UNITS")]
    pub texture_units: usize,

    /// Print compact JSON instead of pretty-printed JSON.
    #[arg(long, default_value_t = false)]
    pub compact: bool,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl LayoutConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        validate_exhibit(&self.exhibit)?;
        validate_texture_units(self.texture_units)
    }

    pub fn source(&self) -> ExhibitSource {
        ExhibitSource::parse(&self.exhibit)
    }
}

/// Options of the `simulate` subcommand.
#[derive(Args, Debug, Clone)]
pub struct SimulateConfig {
    /// Exhibit JSON file or http(s) URL.
    #[arg(env = "EXHIBIT_SOURCE")]
    pub exhibit: String,

    /// Texture units available to the renderer (sizes the tile cache).
    #[arg(long, default_value_t = DEFAULT_TEXTURE_UNITS, env = "EXHIBIT_TEXTURE_UNITS")]
    pub texture_units: usize,

    /// Release the barrier in degraded mode after this many milliseconds.
    ///
    /// Set to 0 to wait indefinitely.
    #[arg(long, default_value_t = DEFAULT_BARRIER_TIMEOUT_MS, env = "EXHIBIT_BARRIER_TIMEOUT_MS")]
    pub barrier_timeout_ms: u64,

    /// How failed layer loads are counted by the barrier.
    #[arg(long, value_enum, default_value_t = FailurePolicy::CountAsLoaded, env = "EXHIBIT_FAILURE_POLICY")]
    pub failure_policy: FailurePolicy,

    /// Layers to report as failed (comma-separated layer names).
    #[arg(long, value_delimiter = ',')]
    pub fail_layers: Vec<String>,

    /// Layers that never report a completion (comma-separated layer names).
    #[arg(long, value_delimiter = ',')]
    pub skip_layers: Vec<String>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl SimulateConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        validate_exhibit(&self.exhibit)?;
        validate_texture_units(self.texture_units)?;

        if self.barrier_timeout_ms > MAX_BARRIER_TIMEOUT_MS {
            return Err(format!(
                "barrier_timeout_ms must be at most {}",
                MAX_BARRIER_TIMEOUT_MS
            ));
        }

        if let Some(layer) = self
            .fail_layers
            .iter()
            .find(|layer| self.skip_layers.contains(layer))
        {
            return Err(format!("Layer '{}' cannot be both failed and skipped", layer));
        }

        Ok(())
    }

    pub fn source(&self) -> ExhibitSource {
        ExhibitSource::parse(&self.exhibit)
    }

    /// Barrier deadline, or `None` when disabled.
    pub fn barrier_timeout(&self) -> Option<Duration> {
        match self.barrier_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}

fn validate_exhibit(exhibit: &str) -> Result<(), String> {
    if exhibit.trim().is_empty() {
        return Err(
            "Exhibit source is required. Pass a path or URL, or set EXHIBIT_SOURCE".to_string(),
        );
    }
    Ok(())
}

fn validate_texture_units(texture_units: usize) -> Result<(), String> {
    if texture_units == 0 {
        return Err("texture_units must be greater than 0".to_string());
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn simulate_config() -> SimulateConfig {
        SimulateConfig {
            exhibit: "exhibit.json".to_string(),
            texture_units: DEFAULT_TEXTURE_UNITS,
            barrier_timeout_ms: 1000,
            failure_policy: FailurePolicy::CountAsLoaded,
            fail_layers: vec!["mask-cells".to_string()],
            skip_layers: Vec::new(),
            verbose: false,
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(simulate_config().validate().is_ok());
    }

    #[test]
    fn test_empty_exhibit() {
        let mut config = simulate_config();
        config.exhibit = "  ".to_string();
        let result = config.validate();
        assert!(result.unwrap_err().contains("Exhibit source"));
    }

    #[test]
    fn test_zero_texture_units() {
        let mut config = simulate_config();
        config.texture_units = 0;
        assert!(config.validate().is_err());

        let layout = LayoutConfig {
            exhibit: "exhibit.json".to_string(),
            texture_units: 0,
            compact: false,
            verbose: false,
        };
        assert!(layout.validate().is_err());
    }

    #[test]
    fn test_barrier_timeout() {
        let mut config = simulate_config();
        assert_eq!(config.barrier_timeout(), Some(Duration::from_millis(1000)));

        config.barrier_timeout_ms = 0;
        assert_eq!(config.barrier_timeout(), None);
        assert!(config.validate().is_ok());

        config.barrier_timeout_ms = MAX_BARRIER_TIMEOUT_MS + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_layer_both_failed_and_skipped() {
        let mut config = simulate_config();
        config.skip_layers = vec!["mask-cells".to_string()];
        let result = config.validate();
        assert!(result.unwrap_err().contains("mask-cells"));
    }

    #[test]
    fn test_parse_simulate_command() {
        let cli = Cli::try_parse_from([
            "wsi-exhibit",
            "simulate",
            "https://example.org/exhibit.json",
            "--failure-policy",
            "stall",
            "--fail-layers",
            "mask-a,mask-b",
            "--barrier-timeout-ms",
            "0",
        ])
        .unwrap();

        match cli.into_command() {
            Command::Simulate(config) => {
                assert_eq!(config.failure_policy, FailurePolicy::Stall);
                assert_eq!(config.fail_layers, ["mask-a", "mask-b"]);
                assert!(config.skip_layers.is_empty());
                assert_eq!(config.barrier_timeout(), None);
                assert!(matches!(config.source(), ExhibitSource::Url(_)));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_layout_command() {
        let cli =
            Cli::try_parse_from(["wsi-exhibit", "layout", "exhibit.json", "--compact"]).unwrap();
        match cli.into_command() {
            Command::Layout(config) => {
                assert!(config.compact);
                assert_eq!(config.texture_units, DEFAULT_TEXTURE_UNITS);
                assert!(matches!(config.source(), ExhibitSource::Path(_)));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
