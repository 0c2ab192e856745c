//! Entry point: read a pcap capture, replay the RFB session it contains, and
//! write a self-contained HTML document.

mod args;
mod pcap;

use anyhow::{Context, Result};
use args::Args;
use tracing::info;
use vnc_replay_core::{Config, Session};
use vnc_replay_report::ReplayWriter;

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("vnc_replay={level},vnc_replay_core={level}").into()),
        )
        .with_target(false)
        .init();
}

fn load_config(args: &Args) -> Result<Config> {
    let base = match &args.config {
        Some(path) => Config::from_toml_file(path)
            .with_context(|| format!("loading config file {}", path.display()))?,
        None => Config::default(),
    };
    Ok(args.apply_to(base))
}

fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;
    init_logging(config.verbosity);

    let infile = args.infile()?;
    info!(path = %infile.display(), "reading capture");
    let data = std::fs::read(infile).with_context(|| format!("reading {}", infile.display()))?;
    let packets = pcap::read_tcp_segments(&data)
        .with_context(|| format!("parsing pcap file {}", infile.display()))?;

    let session = Session::from_packets(packets).context("replaying RFB session")?;
    info!(
        events = session.events().len(),
        diagnostics = session.diagnostics().len(),
        "session decoded"
    );

    let writer = ReplayWriter::new(&session, config.embed_assets);
    let html = writer.render().context("rendering replay document")?;
    std::fs::write(&config.output, html)
        .with_context(|| format!("writing {}", config.output.display()))?;
    info!(path = %config.output.display(), "replay written");
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    if let Err(e) = run(args.clone()) {
        // Surface the failure both on stderr and, where possible, inside a
        // best-effort HTML marker - a partially replayed session is still
        // useful to look at.
        eprintln!("error: {e:#}");
        if let Ok(config) = load_config(&args) {
            let marker = format!(
                "<!DOCTYPE html><html><body><h2>error: {e}</h2></body></html>\n"
            );
            let _ = std::fs::write(&config.output, marker);
        }
        std::process::exit(1);
    }
    Ok(())
}
