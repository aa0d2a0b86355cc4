//! Client Error Responses
//!
//! Builds the minimal HTTP/1.0 error pages the proxy sends when a request
//! cannot be translated or the origin cannot be reached.

// == Error Page ==
/// Renders a complete HTTP/1.0 error response: status line, Content-Type,
/// a correct Content-Length, and a small HTML body.
pub fn error_page(code: &str, reason: &str, detail: &str) -> Vec<u8> {
    let body = format!(
        "<!DOCTYPE html>\r\n\
         <html>\r\n\
         <head><title>Server Error</title></head>\r\n\
         <body bgcolor=\"ffffff\">\r\n\
         <h1>{}: {}</h1>\r\n\
         <p>{}</p>\r\n\
         </body></html>\r\n",
        code, reason, detail
    );

    let mut response = format!(
        "HTTP/1.0 {} {}\r\n\
         Content-Type: text/html\r\n\
         Content-Length: {}\r\n\r\n",
        code,
        reason,
        body.len()
    )
    .into_bytes();
    response.extend_from_slice(body.as_bytes());
    response
}
