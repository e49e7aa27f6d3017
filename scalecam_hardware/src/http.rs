//! Blocking HTTP upload client.
//!
//! Status codes of any class come back as-is; only failures below HTTP
//! (DNS, connect, socket I/O) map to the non-positive codes of
//! [`HttpResponse`].

use std::time::Duration;

use scalecam_traits::{HttpResponse, HttpTransport};
use tracing::{debug, warn};

/// No connection could be made (DNS, refused, bad URL).
pub const CODE_CONNECTION_REFUSED: i32 = -1;
/// The connection dropped or timed out mid-exchange.
pub const CODE_CONNECTION_LOST: i32 = -5;

pub struct HttpClient {
    agent: ureq::Agent,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self { agent }
    }
}

impl HttpTransport for HttpClient {
    fn post(&mut self, url: &str, content_type: &str, body: &[u8]) -> HttpResponse {
        let result = self
            .agent
            .post(url)
            .set("Content-Type", content_type)
            .send_bytes(body);
        match result {
            Ok(resp) => read_response(resp.status(), resp),
            Err(ureq::Error::Status(status, resp)) => read_response(status, resp),
            Err(ureq::Error::Transport(t)) => {
                let code = transport_code(t.kind());
                warn!(url, code, error = %t, "upload transport error");
                HttpResponse {
                    code,
                    body: t.to_string(),
                }
            }
        }
    }
}

fn read_response(status: u16, resp: ureq::Response) -> HttpResponse {
    let body = resp.into_string().unwrap_or_default();
    debug!(status, body_len = body.len(), "upload answered");
    HttpResponse {
        code: i32::from(status),
        body,
    }
}

fn transport_code(kind: ureq::ErrorKind) -> i32 {
    match kind {
        ureq::ErrorKind::Io => CODE_CONNECTION_LOST,
        _ => CODE_CONNECTION_REFUSED,
    }
}
