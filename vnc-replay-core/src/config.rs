//! Replay configuration: output path, asset embedding, log verbosity.
//!
//! Loadable from an optional TOML file and always overridable by CLI flags
//! (the CLI layer in the `vnc-replay` binary owns the override merge; this
//! type only owns defaults, (de)serialization, and validation).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_output() -> PathBuf {
    PathBuf::from("replay.html")
}

fn default_embed_assets() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where the self-contained HTML replay is written.
    #[serde(default = "default_output")]
    pub output: PathBuf,
    /// Inline `player.js` into the output rather than referencing it externally.
    #[serde(default = "default_embed_assets")]
    pub embed_assets: bool,
    /// Log verbosity, as a count of `-v` flags (0 = warnings and above).
    #[serde(default)]
    pub verbosity: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output: default_output(),
            embed_assets: default_embed_assets(),
            verbosity: 0,
        }
    }
}

impl Config {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Loads a `Config` from a TOML file's contents.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Loads a `Config` from a TOML file at `path`.
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading config file {}: {e}", path.display()))?;
        Self::from_toml_str(&text)
            .map_err(|e| anyhow::anyhow!("parsing config file {}: {e}", path.display()))
    }
}

/// Builder for creating a `Config`, mirroring the config-then-CLI-override
/// pattern used elsewhere in this workspace.
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    #[must_use]
    pub fn output(mut self, output: impl Into<PathBuf>) -> Self {
        self.config.output = output.into();
        self
    }

    #[must_use]
    pub fn embed_assets(mut self, embed_assets: bool) -> Self {
        self.config.embed_assets = embed_assets;
        self
    }

    #[must_use]
    pub fn verbosity(mut self, verbosity: u8) -> Self {
        self.config.verbosity = verbosity;
        self
    }

    #[must_use]
    pub fn build(self) -> Config {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let config = Config::default();
        assert_eq!(config.output, PathBuf::from("replay.html"));
        assert!(config.embed_assets);
        assert_eq!(config.verbosity, 0);
    }

    #[test]
    fn builder_overrides_defaults() {
        let config = Config::builder()
            .output("out.html")
            .embed_assets(false)
            .verbosity(2)
            .build();
        assert_eq!(config.output, PathBuf::from("out.html"));
        assert!(!config.embed_assets);
        assert_eq!(config.verbosity, 2);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config = Config::from_toml_str(r#"embed_assets = false"#).unwrap();
        assert_eq!(config.output, PathBuf::from("replay.html"));
        assert!(!config.embed_assets);
    }
}
