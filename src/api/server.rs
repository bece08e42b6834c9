//! Line-delimited transport: one JSON request per line in, one response per line out.
//!
//! Requests run concurrently, so responses are written in completion order
//! and clients must correlate them by id.

use std::net::SocketAddr;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use super::{Dispatcher, Request, Response};
use crate::error::{AppError, AppResult};

/// Serve one session until the reader reaches end of stream
pub async fn serve_connection<R, W>(reader: R, writer: W, dispatcher: Dispatcher) -> AppResult<()>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel::<Response>();
    let writer_task = tokio::spawn(write_responses(writer, rx));

    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }

        let Ok(line) = std::str::from_utf8(&buf) else {
            tracing::warn!("Ignoring request line that is not valid UTF-8");
            continue;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let request = match Request::parse(line) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!("Ignoring malformed request line ({}): {}", e, line);
                continue;
            }
        };

        let dispatcher = dispatcher.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let id = request.id;
            let method = request.method.clone();
            // A panicking handler must still produce an answer for its id
            let response = match tokio::spawn(async move { dispatcher.dispatch(&request).await }).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!("Handler for {} (id={}) failed: {}", method, id, e);
                    Response::failure(id, &AppError::Internal(format!("handler failed: {}", method)))
                }
            };
            if tx.send(response).is_err() {
                tracing::warn!("Output closed, dropping response id={}", id);
            }
        });
    }

    tracing::info!("Input stream closed, finishing pending requests");
    drop(tx);
    writer_task
        .await
        .map_err(|e| AppError::Internal(format!("response writer failed: {}", e)))?
}

async fn write_responses<W>(writer: W, mut rx: mpsc::UnboundedReceiver<Response>) -> AppResult<()>
where
    W: AsyncWrite + Unpin,
{
    let mut writer = BufWriter::new(writer);
    while let Some(response) = rx.recv().await {
        let mut line = response.to_line()?;
        line.push('\n');
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
    }
    Ok(())
}

/// Serve requests from stdin, answering on stdout
pub async fn serve_stdio(dispatcher: Dispatcher) -> AppResult<()> {
    tracing::info!("Serving catalog requests on stdio");
    serve_connection(tokio::io::stdin(), tokio::io::stdout(), dispatcher).await
}

/// Accept TCP sessions; each connection is served independently
pub async fn serve_tcp(addr: SocketAddr, dispatcher: Dispatcher) -> AppResult<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Serving catalog requests on tcp://{}", listener.local_addr()?);

    loop {
        let (stream, peer) = listener.accept().await?;
        tracing::info!("Accepted connection from {}", peer);

        let dispatcher = dispatcher.clone();
        tokio::spawn(async move {
            let (reader, writer) = stream.into_split();
            match serve_connection(reader, writer, dispatcher).await {
                Ok(()) => tracing::info!("Connection from {} closed", peer),
                Err(e) => tracing::warn!("Connection from {} ended with error: {}", peer, e),
            }
        });
    }
}
