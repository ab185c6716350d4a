//! Line service: one JSON request per line in, responses and events out.
//!
//! # Task layout
//!
//! - The reader loop parses requests and spawns one task per request, so a
//!   slow command (e.g. `getLocation` waiting for a fix) never holds up the
//!   next line.
//! - A single writer task owns the output stream. Responses and events reach
//!   it over one unbounded channel, so frames never interleave mid-line.
//! - A forwarder task drains the bridge event stream into the writer. When
//!   the session ends it hands the receiver back so a later session can
//!   resume streaming.

use std::{io, result::Result as StdResult, sync::Arc};

use bridge_engine::Bridge;
use bridge_protocol::{
    BridgeError,
    ipc::{EventRx, EventTx, codec},
};
use parking_lot::Mutex;
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader},
    sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel},
    task::{JoinError, JoinSet},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::{Error, Result};

/// Serves a [`Bridge`] over a pair of byte streams.
#[derive(Clone)]
pub struct LineServer {
    /// The bridge commands are dispatched to.
    bridge: Bridge,
    /// Event receiver; taken for the duration of a session.
    event_rx: Arc<Mutex<Option<EventRx>>>,
    /// When set, tracing output is relayed to the client as log events.
    log_sink: Option<EventTx>,
    /// Cancelled to end the current session.
    shutdown: CancellationToken,
}

impl LineServer {
    /// Server for `bridge`, streaming the events it publishes on `event_rx`.
    pub fn new(bridge: Bridge, event_rx: EventRx) -> Self {
        Self {
            bridge,
            event_rx: Arc::new(Mutex::new(Some(event_rx))),
            log_sink: None,
            shutdown: CancellationToken::new(),
        }
    }

    /// Relay log records to the client through `tx` while serving.
    ///
    /// `tx` should be the sender paired with the bridge's event receiver.
    pub fn forward_logs(mut self, tx: EventTx) -> Self {
        self.log_sink = Some(tx);
        self
    }

    /// Token that stops the session when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Serve requests from `reader` until EOF or shutdown.
    ///
    /// At EOF, requests already in flight are allowed to finish and their
    /// responses are written before this returns. Shutdown aborts them.
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let event_rx = self.event_rx.lock().take().ok_or(Error::AlreadyServing)?;
        info!("client session started");

        let (out_tx, out_rx) = unbounded_channel::<String>();
        let writer_task = tokio::spawn(write_lines(writer, out_rx));
        let forward_token = self.shutdown.child_token();
        let forwarder = tokio::spawn(forward_events(
            event_rx,
            out_tx.clone(),
            forward_token.clone(),
        ));
        if let Some(tx) = &self.log_sink {
            logging::forward::set_sink(tx.clone());
        }

        let mut lines = BufReader::new(reader).lines();
        let mut inflight = JoinSet::new();
        let read_result = loop {
            let next = tokio::select! {
                _ = self.shutdown.cancelled() => {
                    debug!("shutdown requested");
                    break Ok(());
                }
                next = lines.next_line() => next,
            };
            match next {
                Ok(Some(line)) => {
                    if !line.trim().is_empty() {
                        self.accept(&line, &out_tx, &mut inflight);
                    }
                }
                Ok(None) => break Ok(()),
                Err(e) => break Err(Error::Io(e)),
            }
            while let Some(done) = inflight.try_join_next() {
                log_join(done);
            }
        };

        // EOF drains in-flight requests; shutdown aborts them.
        let mut aborted = false;
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled(), if !aborted => {
                    if !inflight.is_empty() {
                        debug!(pending = inflight.len(), "abandoning in-flight requests");
                    }
                    inflight.abort_all();
                    aborted = true;
                }
                done = inflight.join_next() => match done {
                    Some(done) => log_join(done),
                    None => break,
                },
            }
        }
        if self.log_sink.is_some() {
            logging::forward::clear_sink();
        }

        forward_token.cancel();
        match forwarder.await {
            Ok(rx) => *self.event_rx.lock() = Some(rx),
            Err(e) => error!("event forwarder failed: {}", e),
        }
        drop(out_tx);
        let write_result = match writer_task.await {
            Ok(r) => r.map_err(Error::Io),
            Err(e) => Err(Error::Io(io::Error::other(e.to_string()))),
        };
        info!("client session ended");
        read_result.and(write_result)
    }

    /// Parse one line and spawn its request.
    fn accept(&self, line: &str, out: &UnboundedSender<String>, inflight: &mut JoinSet<()>) {
        let req = match codec::line_to_request(line) {
            Ok(req) => req,
            Err(e) => {
                warn!("malformed request line: {}", e);
                let err = BridgeError::invalid_argument(format!("malformed request: {e}"));
                send_line(out, codec::response_to_line(e.request_id(), Err(err)));
                return;
            }
        };
        trace!(id = req.id, method = %req.method, "request");
        let bridge = self.bridge.clone();
        let out = out.clone();
        inflight.spawn(async move {
            let result = bridge.dispatch(&req.method, &req.args).await;
            send_line(&out, codec::response_to_line(Some(req.id), result));
        });
    }
}

fn send_line(out: &UnboundedSender<String>, line: StdResult<String, codec::Error>) {
    match line {
        Ok(line) => {
            if out.send(line).is_err() {
                debug!("writer gone; dropping frame");
            }
        }
        Err(e) => error!("failed to encode frame: {}", e),
    }
}

fn log_join(done: StdResult<(), JoinError>) {
    match done {
        Ok(()) => {}
        Err(e) if e.is_cancelled() => trace!("request abandoned"),
        Err(e) => error!("request task failed: {}", e),
    }
}

async fn write_lines<W>(mut writer: W, mut rx: UnboundedReceiver<String>) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(mut line) = rx.recv().await {
        line.push('\n');
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
    }
    writer.shutdown().await
}

/// Forward bridge events until cancelled; returns the receiver.
///
/// Only logs below `INFO` here: anything louder would itself be forwarded.
async fn forward_events(
    mut rx: EventRx,
    out: UnboundedSender<String>,
    token: CancellationToken,
) -> EventRx {
    loop {
        let event = tokio::select! {
            _ = token.cancelled() => break,
            event = rx.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };
        trace!(event = event.name(), "forward");
        match codec::event_to_line(&event) {
            Ok(line) => {
                if out.send(line).is_err() {
                    break;
                }
            }
            Err(e) => debug!("failed to encode event: {}", e),
        }
    }
    rx
}
