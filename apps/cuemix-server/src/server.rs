//! JSON-lines connection handling.
//!
//! Each connection carries newline-delimited JSON: one [`Request`]
//! object per line in, one or more [`Response`] objects per line out.
//! Streaming operations (render, subscribe) take over the connection
//! until their terminal event, then the line loop resumes.

use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use cuemix_core::{EngineEvent, Request, Response};
use cuemix_engine::{
    CancelFlag, Engine, EngineError, FileRenderRequest, RenderWindowRequest, Subscription,
};

type LineWriter = BufWriter<OwnedWriteHalf>;

/// Accept connections forever.
pub async fn serve(listener: TcpListener, engine: Arc<Engine>) -> Result<()> {
    loop {
        let (stream, peer) = listener.accept().await?;
        debug!(%peer, "client connected");
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            if let Err(error) = handle_connection(stream, engine).await {
                debug!(%peer, %error, "connection closed");
            }
        });
    }
}

async fn handle_connection(stream: TcpStream, engine: Arc<Engine>) -> Result<()> {
    let (read_half, write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();
    let mut writer = BufWriter::new(write_half);

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let request: Request = match serde_json::from_str(&line) {
            Ok(request) => request,
            Err(error) => {
                warn!(%error, "unparseable request line");
                let response = Response::Error {
                    code: "INVALID_ARGUMENT".to_string(),
                    message: format!("bad request: {error}"),
                };
                write_line(&mut writer, &response).await?;
                continue;
            }
        };

        match request {
            Request::Ping => write_line(&mut writer, &Response::Pong).await?,
            Request::LoadFile { file_path } => {
                handle_load_file(&engine, &mut writer, file_path).await?;
            }
            Request::UpdateEdl { edl, replace } => {
                handle_update_edl(&engine, &mut writer, edl, replace).await?;
            }
            Request::Render {
                input_file,
                output_file,
                start_time,
                duration,
            } => {
                let request = FileRenderRequest {
                    input_file,
                    output_file: output_file.into(),
                    start_time,
                    duration,
                };
                handle_render_file(&engine, &mut writer, request).await?;
            }
            Request::RenderEdlWindow {
                edl_id,
                range,
                out_path,
                bit_depth,
            } => {
                let request = RenderWindowRequest {
                    edl_id,
                    range,
                    out_path: out_path.into(),
                    bit_depth,
                };
                handle_render_window(&engine, &mut writer, request).await?;
            }
            Request::Subscribe { session } => {
                let subscription = engine.subscribe(&session);
                handle_subscribe(&engine, &mut writer, subscription).await?;
                // Subscriber streams end only with the client.
                break;
            }
        }
    }
    Ok(())
}

async fn handle_load_file(engine: &Arc<Engine>, writer: &mut LineWriter, path: String) -> Result<()> {
    let engine = Arc::clone(engine);
    let loaded = tokio::task::spawn_blocking(move || engine.load_file(&path)).await?;

    let response = match loaded {
        Ok(file_info) => Response::LoadFile {
            success: true,
            message: "File loaded successfully".to_string(),
            file_info: Some(file_info),
        },
        Err(error) => Response::LoadFile {
            success: false,
            message: error.to_string(),
            file_info: None,
        },
    };
    write_line(writer, &response).await
}

async fn handle_update_edl(
    engine: &Arc<Engine>,
    writer: &mut LineWriter,
    edl: cuemix_core::Edl,
    replace: bool,
) -> Result<()> {
    let engine = Arc::clone(engine);
    // Validation probes media files, so it runs off the IO threads.
    let updated = tokio::task::spawn_blocking(move || engine.update_edl(edl, replace)).await?;

    let response = match updated {
        Ok(summary) => Response::UpdateEdl {
            edl_id: summary.edl_id,
            revision: summary.revision,
            track_count: summary.track_count,
            clip_count: summary.clip_count,
        },
        Err(error) => error_response(&error),
    };
    write_line(writer, &response).await
}

async fn handle_render_window(
    engine: &Arc<Engine>,
    writer: &mut LineWriter,
    request: RenderWindowRequest,
) -> Result<()> {
    let (tx, mut rx) = mpsc::channel::<EngineEvent>(64);
    let cancel = CancelFlag::new();

    let engine = Arc::clone(engine);
    let worker_cancel = cancel.clone();
    let worker = tokio::task::spawn_blocking(move || {
        engine.render_edl_window(&request, &worker_cancel, &mut |event| {
            let _ = tx.blocking_send(event);
        })
    });

    // The worker owns the sender; the loop ends when the render does.
    // A failed write means the client went away: flip the cancel flag
    // and keep draining so the worker never blocks on a full channel.
    while let Some(event) = rx.recv().await {
        if write_line(writer, &Response::Event { event }).await.is_err() {
            cancel.cancel();
        }
    }

    match worker.await? {
        Ok(outcome) => {
            info!(out_path = %outcome.out_path, sha256 = %outcome.sha256, "window render served");
        }
        Err(error) if error.is_cancelled() => {
            info!("window render cancelled by client");
        }
        Err(error) => {
            // The terminal EdlError event is already on the stream; the
            // status line mirrors it for unary-style clients.
            write_line(writer, &error_response(&error)).await?;
        }
    }
    Ok(())
}

async fn handle_render_file(
    engine: &Arc<Engine>,
    writer: &mut LineWriter,
    request: FileRenderRequest,
) -> Result<()> {
    let (tx, mut rx) = mpsc::channel::<Response>(64);
    let cancel = CancelFlag::new();

    let engine = Arc::clone(engine);
    let worker_cancel = cancel.clone();
    let worker = tokio::task::spawn_blocking(move || {
        engine.render_file(&request, &worker_cancel, &mut |progress| {
            let _ = tx.blocking_send(Response::RenderProgress {
                percentage: progress.percentage,
                status_message: format!("Rendering... {}%", progress.percentage as u32),
                elapsed_seconds: progress.elapsed_seconds,
                estimated_remaining_seconds: progress.estimated_remaining_seconds,
            });
        })
    });

    while let Some(response) = rx.recv().await {
        if write_line(writer, &response).await.is_err() {
            cancel.cancel();
        }
    }

    let response = match worker.await? {
        Ok(outcome) => Response::RenderComplete {
            output_file_path: outcome.output_file_path,
            sha256_hash: outcome.sha256_hash,
            total_duration_seconds: outcome.total_duration_seconds,
            output_file_size_bytes: outcome.output_file_size_bytes,
        },
        Err(error) if error.is_cancelled() => return Ok(()),
        Err(error) => Response::RenderError {
            error_code: error.code().to_string(),
            error_message: error.to_string(),
        },
    };
    write_line(writer, &response).await
}

async fn handle_subscribe(
    engine: &Arc<Engine>,
    writer: &mut LineWriter,
    subscription: Subscription,
) -> Result<()> {
    let Subscription { initial, mut receiver } = subscription;
    for event in initial {
        write_line(writer, &Response::Event { event }).await?;
    }

    let period = engine.config().heartbeat_interval;
    let mut heartbeat = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            received = receiver.recv() => match received {
                Ok(event) => write_line(writer, &Response::Event { event }).await?,
                Err(tokio::sync::broadcast::error::RecvError::Lagged(dropped)) => {
                    warn!(dropped, "subscriber fell behind, closing stream");
                    let event = EngineEvent::SlowConsumer { dropped };
                    write_line(writer, &Response::Event { event }).await?;
                    return Ok(());
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => return Ok(()),
            },
            _ = heartbeat.tick() => {
                write_line(writer, &Response::Event { event: engine.heartbeat() }).await?;
            }
        }
    }
}

fn error_response(error: &EngineError) -> Response {
    Response::Error {
        code: error.code().to_string(),
        message: error.to_string(),
    }
}

async fn write_line(writer: &mut LineWriter, response: &Response) -> Result<()> {
    let mut line = serde_json::to_vec(response)?;
    line.push(b'\n');
    writer.write_all(&line).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use cuemix_core::{Request, TimeRange};

    #[test]
    fn request_lines_parse_into_wire_types() {
        let line = r#"{"type":"render_edl_window","edl_id":"e1","range":{"start_samples":0,"duration_samples":4800},"out_path":"/tmp/o.wav","bit_depth":16}"#;
        let request: Request = serde_json::from_str(line).expect("parse");
        let Request::RenderEdlWindow { edl_id, range, .. } = request else {
            panic!("wrong variant");
        };
        assert_eq!(edl_id, "e1");
        assert_eq!(range, TimeRange::new(0, 4800));
    }
}
