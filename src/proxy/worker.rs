//! Connection Worker
//!
//! One worker runs per accepted connection and drives it to completion:
//! translate the client request, serve from the cache on a hit, otherwise
//! fetch from the origin, stream the response through, and populate the
//! cache when the response stayed under the per-object ceiling.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::cache::ObjectCache;
use crate::error::{ProxyError, Result};
use crate::http::{error_page, translate};

/// Chunk size for relaying the origin response.
const RELAY_BUF_SIZE: usize = 8 * 1024;

// == Connection Entry Point ==
/// Handles one client connection from accept to close.
///
/// Failures that happen before any response bytes were written are answered
/// with the matching error page; mid-stream failures are only logged, since
/// the client already holds a partial response. Sockets and cache handles
/// are released by drop on every path.
pub async fn handle_connection(
    mut client: TcpStream,
    peer: SocketAddr,
    cache: Arc<ObjectCache>,
    max_object_size: usize,
) {
    if let Err(err) = serve(&mut client, &cache, max_object_size).await {
        if let Some((code, reason)) = err.status() {
            let page = error_page(code, reason, &err.to_string());
            if let Err(write_err) = client.write_all(&page).await {
                debug!(%peer, error = %write_err, "failed to deliver error page");
            }
        }
        warn!(%peer, error = %err, "connection failed");
    }
}

// == State Machine ==
/// Translating -> (CacheHit | Fetching) -> Streaming -> Done.
async fn serve(client: &mut TcpStream, cache: &ObjectCache, max_object_size: usize) -> Result<()> {
    let (read_half, mut client_wr) = client.split();
    let mut client_rd = BufReader::new(read_half);

    // Translating
    let request = translate(&mut client_rd).await?;

    // CacheHit: stream the stored payload and finish. The handle is dropped
    // on return, success or not.
    if let Some(payload) = cache.lookup(&request.cache_key) {
        debug!(key = %request.cache_key, bytes = payload.len(), "serving from cache");
        return client_wr
            .write_all(&payload)
            .await
            .map_err(ProxyError::ClientWrite);
    }

    // Fetching
    let mut origin = TcpStream::connect((request.host.as_str(), request.port))
        .await
        .map_err(|source| ProxyError::OriginConnect {
            host: request.host.clone(),
            port: request.port,
            source,
        })?;
    origin
        .write_all(&request.bytes)
        .await
        .map_err(ProxyError::OriginWrite)?;

    // Streaming: relay each chunk to the client as it arrives while
    // accumulating a copy, until the ceiling rules caching out. Exceeding
    // the ceiling never interrupts delivery.
    let mut chunk = vec![0u8; RELAY_BUF_SIZE];
    let mut body = Vec::new();
    let mut total = 0usize;
    let mut cacheable = true;
    loop {
        let n = origin
            .read(&mut chunk)
            .await
            .map_err(ProxyError::OriginRead)?;
        if n == 0 {
            break;
        }
        client_wr
            .write_all(&chunk[..n])
            .await
            .map_err(ProxyError::ClientWrite)?;
        total += n;
        if cacheable {
            if total > max_object_size {
                debug!(key = %request.cache_key, "response exceeds object ceiling, not caching");
                cacheable = false;
                body = Vec::new();
            } else {
                body.extend_from_slice(&chunk[..n]);
            }
        }
    }

    // Done: populate the cache. A duplicate key or oversize payload is
    // logged and absorbed; the client already has its bytes.
    if cacheable && total > 0 {
        match cache.store(&request.cache_key, Bytes::from(body)) {
            Ok(()) => debug!(key = %request.cache_key, bytes = total, "cached response"),
            Err(err) => debug!(key = %request.cache_key, error = %err, "response not cached"),
        }
    }

    Ok(())
}
