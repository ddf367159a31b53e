use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;

use anyhow::{Context, Result, bail};

use cuemix_core::json::event_to_ndjson;
use cuemix_core::{Edl, EngineEvent, Request, Response};

/// Line-oriented connection to the engine server.
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl Client {
    pub fn connect(addr: &str) -> Result<Self> {
        let stream =
            TcpStream::connect(addr).with_context(|| format!("failed to connect to {addr}"))?;
        let reader = BufReader::new(stream.try_clone().context("failed to clone connection")?);
        Ok(Self {
            reader,
            writer: stream,
        })
    }

    pub fn ping(&mut self) -> Result<()> {
        self.send(&Request::Ping)?;
        match self.recv()? {
            Response::Pong => {
                println!("pong");
                Ok(())
            }
            other => bail!("unexpected response: {other:?}"),
        }
    }

    pub fn load(&mut self, path: &str) -> Result<()> {
        self.send(&Request::LoadFile {
            file_path: path.to_string(),
        })?;
        match self.recv()? {
            Response::LoadFile {
                success: true,
                file_info: Some(info),
                ..
            } => {
                println!(
                    "{}: {} Hz, {} ch, {:.3} s, {} bytes",
                    info.path,
                    info.sample_rate,
                    info.num_channels,
                    info.duration_seconds,
                    info.file_size_bytes
                );
                Ok(())
            }
            Response::LoadFile { message, .. } => bail!("load failed: {message}"),
            other => bail!("unexpected response: {other:?}"),
        }
    }

    pub fn render(&mut self, request: Request) -> Result<()> {
        self.send(&request)?;
        loop {
            match self.recv()? {
                Response::RenderProgress {
                    percentage,
                    status_message,
                    ..
                } => eprintln!("{status_message} ({percentage:.1}%)"),
                Response::RenderComplete {
                    output_file_path,
                    sha256_hash,
                    total_duration_seconds,
                    output_file_size_bytes,
                } => {
                    println!(
                        "{output_file_path}: {output_file_size_bytes} bytes in {total_duration_seconds:.2}s, sha256 {sha256_hash}"
                    );
                    return Ok(());
                }
                Response::RenderError {
                    error_code,
                    error_message,
                } => bail!("render failed ({error_code}): {error_message}"),
                other => bail!("unexpected response: {other:?}"),
            }
        }
    }

    pub fn update_edl(&mut self, edl: Edl, replace: bool) -> Result<()> {
        self.send(&Request::UpdateEdl { edl, replace })?;
        match self.recv()? {
            Response::UpdateEdl {
                edl_id,
                revision,
                track_count,
                clip_count,
            } => {
                println!("applied {edl_id} rev {revision}: {track_count} tracks, {clip_count} clips");
                Ok(())
            }
            Response::Error { code, message } => bail!("update failed ({code}): {message}"),
            other => bail!("unexpected response: {other:?}"),
        }
    }

    pub fn render_edl_window(&mut self, request: Request) -> Result<()> {
        self.send(&request)?;
        loop {
            match self.recv()? {
                Response::Event { event } => match event {
                    EngineEvent::Progress { fraction, eta } => {
                        eprintln!("rendering {:.1}% (eta {eta:.1}s)", fraction * 100.0);
                    }
                    EngineEvent::Complete {
                        out_path,
                        duration_sec,
                        sha256,
                    } => {
                        println!("{out_path}: {duration_sec:.3}s, sha256 {sha256}");
                        return Ok(());
                    }
                    EngineEvent::EdlError { reason, .. } => bail!("render failed: {reason}"),
                    other => eprintln!("{}", event_to_ndjson(&other)),
                },
                Response::Error { code, message } => bail!("render failed ({code}): {message}"),
                other => bail!("unexpected response: {other:?}"),
            }
        }
    }

    /// Print events as NDJSON until the server closes the stream.
    pub fn subscribe(&mut self, session: &str) -> Result<()> {
        self.send(&Request::Subscribe {
            session: session.to_string(),
        })?;
        loop {
            let mut line = String::new();
            let n = self.reader.read_line(&mut line)?;
            if n == 0 {
                return Ok(());
            }
            match serde_json::from_str::<Response>(line.trim_end()) {
                Ok(Response::Event { event }) => {
                    println!("{}", event_to_ndjson(&event));
                    if matches!(event, EngineEvent::SlowConsumer { .. }) {
                        bail!("server dropped events: consumer too slow");
                    }
                }
                Ok(other) => bail!("unexpected response: {other:?}"),
                Err(error) => bail!("unparseable event line: {error}"),
            }
        }
    }

    fn send(&mut self, request: &Request) -> Result<()> {
        let mut line = serde_json::to_vec(request).context("failed to encode request")?;
        line.push(b'\n');
        self.writer
            .write_all(&line)
            .context("failed to send request")?;
        Ok(())
    }

    fn recv(&mut self) -> Result<Response> {
        let mut line = String::new();
        let n = self
            .reader
            .read_line(&mut line)
            .context("failed to read response")?;
        if n == 0 {
            bail!("server closed the connection");
        }
        serde_json::from_str(line.trim_end()).context("unparseable response line")
    }
}
