//! Request Translator
//!
//! Reads a client request from a buffered stream and rewrites it into the
//! normalized HTTP/1.0 request forwarded to the origin, extracting the
//! origin host, port, and the cache key along the way.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::error::{ProxyError, Result};

/// Fixed User-Agent carried on every forwarded request.
pub const PROXY_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:3.10.0) Gecko/20210731 Firefox/63.0.1";

/// Upper bound on the request head (request line plus headers).
const MAX_REQUEST_HEAD: usize = 64 * 1024;

/// Maximum number of client headers parsed.
const MAX_HEADERS: usize = 64;

// == Forward Request ==
/// A client request translated into its origin-facing form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardRequest {
    /// The complete rewritten request, ready to write to the origin
    pub bytes: Vec<u8>,
    /// Origin host extracted from the request target
    pub host: String,
    /// Origin port (80 unless the target names one)
    pub port: u16,
    /// Path plus query exactly as the client sent it; the scheme, host,
    /// and port are deliberately not part of the key
    pub cache_key: String,
}

// == Translate ==
/// Reads and normalizes one client request.
///
/// Only `GET` is supported; the request target must be an absolute
/// `http://` URL as browsers send to a forward proxy. The rewritten request
/// is always HTTP/1.0 and carries exactly one `Host`, the fixed proxy
/// `User-Agent`, `Connection: close`, and `Proxy-Connection: close`;
/// client-supplied values for those four headers are dropped and every
/// other client header passes through verbatim.
pub async fn translate<R>(reader: &mut R) -> Result<ForwardRequest>
where
    R: AsyncBufRead + Unpin,
{
    let head = read_head(reader).await?;

    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut parsed = httparse::Request::new(&mut headers);
    let status = parsed
        .parse(&head)
        .map_err(|e| ProxyError::BadRequest(e.to_string()))?;
    if status.is_partial() {
        return Err(ProxyError::BadRequest("truncated request head".to_string()));
    }

    let method = parsed
        .method
        .ok_or_else(|| ProxyError::BadRequest("missing method".to_string()))?;
    if method != "GET" {
        return Err(ProxyError::NotImplemented(method.to_string()));
    }
    match parsed.version {
        Some(0) | Some(1) => {}
        _ => {
            return Err(ProxyError::BadRequest(
                "unsupported HTTP version".to_string(),
            ))
        }
    }
    let target = parsed
        .path
        .ok_or_else(|| ProxyError::BadRequest("missing request target".to_string()))?;
    let (host, port, cache_key) = split_target(target)?;

    // Rebuild the request: HTTP/1.0 request line against the origin-relative
    // path, passthrough headers, then the proxy-owned header block.
    let mut bytes = Vec::with_capacity(head.len() + 256);
    bytes.extend_from_slice(format!("GET {} HTTP/1.0\r\n", cache_key).as_bytes());
    for header in parsed.headers.iter() {
        if is_proxy_owned(header.name) {
            continue;
        }
        bytes.extend_from_slice(header.name.as_bytes());
        bytes.extend_from_slice(b": ");
        bytes.extend_from_slice(header.value);
        bytes.extend_from_slice(b"\r\n");
    }
    bytes.extend_from_slice(format!("Host: {}:{}\r\n", host, port).as_bytes());
    bytes.extend_from_slice(format!("User-Agent: {}\r\n", PROXY_USER_AGENT).as_bytes());
    bytes.extend_from_slice(b"Connection: close\r\n");
    bytes.extend_from_slice(b"Proxy-Connection: close\r\n");
    bytes.extend_from_slice(b"\r\n");

    Ok(ForwardRequest {
        bytes,
        host,
        port,
        cache_key,
    })
}

/// Headers the proxy sets itself; client-supplied values are dropped.
fn is_proxy_owned(name: &str) -> bool {
    name.eq_ignore_ascii_case("Host")
        || name.eq_ignore_ascii_case("User-Agent")
        || name.eq_ignore_ascii_case("Connection")
        || name.eq_ignore_ascii_case("Proxy-Connection")
}

/// Accumulates the request head up to and including the blank line.
///
/// The size bound is enforced on the reads themselves, not just on the
/// accumulated head: a client sending one endless newline-free line is cut
/// off after the limit instead of being buffered in full first.
async fn read_head<R>(reader: &mut R) -> Result<Vec<u8>>
where
    R: AsyncBufRead + Unpin,
{
    let mut reader = reader.take(MAX_REQUEST_HEAD as u64 + 1);
    let mut head = Vec::with_capacity(1024);
    loop {
        let n = reader
            .read_until(b'\n', &mut head)
            .await
            .map_err(|e| ProxyError::BadRequest(format!("error reading request: {}", e)))?;
        if head.len() > MAX_REQUEST_HEAD {
            return Err(ProxyError::BadRequest("request head too large".to_string()));
        }
        if n == 0 {
            return Err(ProxyError::BadRequest(
                "unexpected end of request".to_string(),
            ));
        }
        if head.ends_with(b"\r\n\r\n") || head.ends_with(b"\n\n") {
            return Ok(head);
        }
    }
}

/// Splits an absolute-form request target into host, port, and the
/// origin-relative path (the cache key).
fn split_target(target: &str) -> Result<(String, u16, String)> {
    let rest = target.strip_prefix("http://").ok_or_else(|| {
        ProxyError::BadRequest(format!("request target is not an absolute http URL: {}", target))
    })?;

    let (authority, path) = match rest.find('/') {
        Some(idx) => (&rest[..idx], &rest[idx..]),
        None => (rest, "/"),
    };

    let (host, port) = match authority.split_once(':') {
        Some((host, port)) => {
            let port: u16 = port.parse().map_err(|_| {
                ProxyError::BadRequest(format!("invalid port in request target: {}", port))
            })?;
            (host, port)
        }
        None => (authority, 80),
    };
    if host.is_empty() {
        return Err(ProxyError::BadRequest(
            "empty host in request target".to_string(),
        ));
    }

    Ok((host.to_string(), port, path.to_string()))
}
