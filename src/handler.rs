//! TCP connection handler
//!
//! Handles individual client connections: line framing, request processing
//! through the `ChatServer`, and reply writing.

use futures_util::{SinkExt, Stream, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};
use tracing::{debug, error, info, warn};

use crate::config::LimitsConfig;
use crate::error::AppError;
use crate::server::ChatServer;
use crate::types::Endpoint;
use crate::user::Outbound;

/// Handle a new TCP connection
///
/// Reads lines until the peer closes or a transport error occurs. Every
/// line the client receives (replies and group messages) goes through one
/// outbound queue drained by a dedicated write task.
pub async fn handle_connection(
    stream: TcpStream,
    server: ChatServer,
    limits: LimitsConfig,
) -> Result<(), AppError> {
    let endpoint = Endpoint::from(stream.peer_addr()?);
    info!("Client connected from {}", endpoint);

    let framed = Framed::new(stream, LinesCodec::new_with_max_length(limits.max_line_length));
    let (mut line_sender, mut line_receiver) = framed.split::<String>();

    // Channel for server -> client lines
    let (msg_tx, mut msg_rx) = mpsc::channel::<String>(limits.outbound_buffer.max(1));
    let outbound = Outbound::new(msg_tx);

    // Fired once the read side is done; the user record may outlive this
    // connection with a sender clone, so the queue alone never closes
    let (close_tx, mut close_rx) = oneshot::channel::<()>();

    // Spawn write task (outbound queue -> socket)
    let write_endpoint = endpoint.clone();
    let write_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                line = msg_rx.recv() => {
                    let Some(line) = line else { break };
                    if let Err(e) = line_sender.send(line).await {
                        debug!("Write to {} failed: {}", write_endpoint, e);
                        break;
                    }
                }
                _ = &mut close_rx => {
                    // Flush what is already queued, then stop
                    while let Ok(line) = msg_rx.try_recv() {
                        if line_sender.send(line).await.is_err() {
                            break;
                        }
                    }
                    break;
                }
            }
        }
        let _ = line_sender.close().await;
        debug!("Write task ended for {}", write_endpoint);
    });
    let write_abort = write_task.abort_handle();

    let result = read_loop(&mut line_receiver, &server, &endpoint, &outbound).await;

    server.disconnect(&endpoint);
    drop(outbound);
    let _ = close_tx.send(());

    // Bound the final flush by the delivery timeout
    if tokio::time::timeout(limits.delivery_timeout(), write_task)
        .await
        .is_err()
    {
        write_abort.abort();
    }

    info!("Client {} disconnected", endpoint);
    result
}

async fn read_loop<S>(
    lines: &mut S,
    server: &ChatServer,
    endpoint: &Endpoint,
    outbound: &Outbound,
) -> Result<(), AppError>
where
    S: Stream<Item = Result<String, LinesCodecError>> + Unpin,
{
    // Framed yields one None after a decode error before it resumes reading
    let mut resume_after_error = false;
    loop {
        let Some(result) = lines.next().await else {
            if std::mem::take(&mut resume_after_error) {
                continue;
            }
            break;
        };

        let reply = match result {
            Ok(line) => {
                resume_after_error = false;
                server.handle_line(endpoint, outbound, &line).await
            }
            Err(e) => {
                let err = AppError::from(e);
                if err.is_fatal() {
                    error!("Read error for {}: {}", endpoint, err);
                    return Err(err);
                }
                warn!("Rejected input from {}: {}", endpoint, err);
                resume_after_error = true;
                Some(err.reply())
            }
        };

        if let Some(reply) = reply {
            if outbound.send(reply).await.is_err() {
                debug!("Outbound closed for {}, ending read loop", endpoint);
                break;
            }
        }
    }
    Ok(())
}
