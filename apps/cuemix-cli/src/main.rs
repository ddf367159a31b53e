mod client;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use cuemix_core::json::parse_edl;
use cuemix_core::{Request, TimeRange};

use client::Client;

/// Sample rate assumed when converting `--start`/`--dur` seconds into
/// timeline samples for `edl-render`.
const ASSUMED_SAMPLE_RATE: f64 = 48000.0;

#[derive(Debug, Parser)]
#[command(name = "cuemix-cli")]
#[command(about = "Client for the cuemix audio engine")]
struct Cli {
    /// Server address.
    #[arg(long, default_value = "127.0.0.1:50051")]
    addr: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check that the server answers.
    Ping,
    /// Probe a media file on the server.
    Load {
        #[arg(long)]
        path: Option<String>,
        /// Legacy positional form of --path.
        #[arg(value_name = "PATH")]
        path_pos: Option<String>,
    },
    /// One-shot render of a media file window.
    Render {
        #[arg(long)]
        path: Option<String>,
        #[arg(long)]
        out: Option<String>,
        /// Legacy positional form of --path.
        #[arg(value_name = "PATH")]
        path_pos: Option<String>,
        /// Legacy positional form of --out.
        #[arg(value_name = "OUT")]
        out_pos: Option<String>,
        /// Window start in seconds.
        #[arg(long)]
        start: Option<f64>,
        /// Window length in seconds.
        #[arg(long)]
        dur: Option<f64>,
    },
    /// Replace the engine's EDL from a JSON file (`-` reads stdin).
    EdlUpdate {
        #[arg(long)]
        edl: String,
        #[arg(long)]
        replace: bool,
    },
    /// Render a window of the current EDL to a WAV file.
    EdlRender {
        #[arg(long)]
        edl_id: String,
        /// Window start in seconds (at 48 kHz).
        #[arg(long)]
        start: f64,
        /// Window length in seconds (at 48 kHz).
        #[arg(long)]
        dur: f64,
        #[arg(long)]
        out: String,
        #[arg(long, default_value_t = 16)]
        bit_depth: u32,
    },
    /// Stream engine events as NDJSON until interrupted.
    Subscribe {
        #[arg(long)]
        edl_id: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut client = Client::connect(&cli.addr)?;

    match cli.command {
        Command::Ping => client.ping(),
        Command::Load { path, path_pos } => {
            let path = named_or_positional(path, path_pos, "--path")?;
            client.load(&path)
        }
        Command::Render {
            path,
            out,
            path_pos,
            out_pos,
            start,
            dur,
        } => {
            let path = named_or_positional(path, path_pos, "--path")?;
            let out = named_or_positional(out, out_pos, "--out")?;
            client.render(Request::Render {
                input_file: path,
                output_file: out,
                start_time: start,
                duration: dur,
            })
        }
        Command::EdlUpdate { edl, replace } => {
            let json = read_edl_json(&edl)?;
            let edl = parse_edl(&json).context("invalid EDL JSON")?;
            client.update_edl(edl, replace)
        }
        Command::EdlRender {
            edl_id,
            start,
            dur,
            out,
            bit_depth,
        } => {
            let range = TimeRange::new(
                (start * ASSUMED_SAMPLE_RATE) as i64,
                (dur * ASSUMED_SAMPLE_RATE) as i64,
            );
            client.render_edl_window(Request::RenderEdlWindow {
                edl_id,
                range,
                out_path: out,
                bit_depth,
            })
        }
        Command::Subscribe { edl_id } => client.subscribe(&edl_id),
    }
}

fn named_or_positional(named: Option<String>, positional: Option<String>, flag: &str) -> Result<String> {
    match named.or(positional) {
        Some(value) => Ok(value),
        None => bail!("missing {flag} (or its positional form)"),
    }
}

fn read_edl_json(path: &str) -> Result<String> {
    if path == "-" {
        let mut json = String::new();
        std::io::Read::read_to_string(&mut std::io::stdin(), &mut json)
            .context("failed to read EDL JSON from stdin")?;
        return Ok(json);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read EDL file {path}"))
}
