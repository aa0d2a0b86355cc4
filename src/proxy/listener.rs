//! Accept Loop
//!
//! Accepts client connections forever and spawns one detached worker task
//! per connection. There is no connection cap, no pooling, and no join: a
//! worker runs to completion on its own and releases its resources by drop.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{debug, error};

use crate::cache::ObjectCache;
use crate::proxy::worker::handle_connection;

// == Run ==
/// Serves the given listener until the surrounding task is dropped.
///
/// Accept errors affect no in-flight connection; they are logged and the
/// loop keeps accepting.
pub async fn run(listener: TcpListener, cache: Arc<ObjectCache>, max_object_size: usize) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                debug!(%peer, "accepted connection");
                let cache = Arc::clone(&cache);
                tokio::spawn(handle_connection(stream, peer, cache, max_object_size));
            }
            Err(err) => {
                error!(error = %err, "failed to accept connection");
            }
        }
    }
}
