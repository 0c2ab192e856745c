//! Command-line argument parsing for the replay tool.

use clap::Parser;
use std::path::PathBuf;
use vnc_replay_core::Config;

/// Replays a captured RFB session from a pcap file to a self-contained HTML document.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// The `.pcap` capture to replay.
    #[arg(value_name = "INFILE")]
    pub infile: Option<PathBuf>,

    /// Same as the positional INFILE, for scripts that prefer named flags.
    #[arg(short = 'i', long = "input", value_name = "INFILE")]
    pub input: Option<PathBuf>,

    /// Where to write the HTML replay (default: replay.html).
    #[arg(short = 'o', long, value_name = "OUTFILE")]
    pub output: Option<PathBuf>,

    /// Inline player.js into the output instead of referencing it externally.
    #[arg(long, value_name = "BOOL", value_parser = clap::value_parser!(bool))]
    pub embed_assets: Option<bool>,

    /// TOML config file; CLI flags override its values.
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (repeatable).
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    #[must_use]
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// The capture file to read, whichever flag supplied it.
    pub fn infile(&self) -> anyhow::Result<&PathBuf> {
        self.infile
            .as_ref()
            .or(self.input.as_ref())
            .ok_or_else(|| anyhow::anyhow!("no input file given (positional INFILE or -i/--input)"))
    }

    /// Merges these flags over a base `Config`, CLI taking precedence.
    pub fn apply_to(&self, mut config: Config) -> Config {
        if let Some(output) = &self.output {
            config.output = output.clone();
        }
        if let Some(embed_assets) = self.embed_assets {
            config.embed_assets = embed_assets;
        }
        if self.verbose > 0 {
            config.verbosity = self.verbose;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_infile_is_found() {
        let args = Args::try_parse_args(["vnc-replay", "session.pcap"]).unwrap();
        assert_eq!(args.infile().unwrap(), &PathBuf::from("session.pcap"));
    }

    #[test]
    fn named_input_flag_is_found() {
        let args = Args::try_parse_args(["vnc-replay", "-i", "session.pcap"]).unwrap();
        assert_eq!(args.infile().unwrap(), &PathBuf::from("session.pcap"));
    }

    #[test]
    fn missing_infile_is_an_error() {
        let args = Args::try_parse_args(["vnc-replay"]).unwrap();
        assert!(args.infile().is_err());
    }

    #[test]
    fn cli_flags_override_config_defaults() {
        let args = Args::try_parse_args([
            "vnc-replay",
            "session.pcap",
            "-o",
            "out.html",
            "--embed-assets",
            "false",
        ])
        .unwrap();
        let merged = args.apply_to(Config::default());
        assert_eq!(merged.output, PathBuf::from("out.html"));
        assert!(!merged.embed_assets);
    }

    impl Args {
        fn try_parse_args<I, T>(iter: I) -> Result<Self, clap::Error>
        where
            I: IntoIterator<Item = T>,
            T: Into<std::ffi::OsString> + Clone,
        {
            <Self as Parser>::try_parse_from(iter)
        }
    }
}
