//! Minimal HTTP/1.1 client plumbing
//!
//! Only what the sign server needs: `GET`/`POST` requests with a JSON body
//! and `Connection: close`, and responses framed by `Content-Length` or by
//! the peer closing the connection.

use core::fmt::Write;

use heapless::{String, Vec};

use crate::BoardError;

/// Largest request the client builds (headers plus body)
pub const MAX_REQUEST_SIZE: usize = 512;

/// Largest response the client reads
pub const MAX_RESPONSE_SIZE: usize = 1024;

const MAX_HOST_LEN: usize = 64;

/// Host and port of the sign server, taken from an `http://` base URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddress {
    host: String<MAX_HOST_LEN>,
    port: u16,
}

impl ServerAddress {
    /// Parse `http://host[:port][/]`
    pub fn parse(url: &str) -> Result<Self, BoardError> {
        let rest = url
            .trim()
            .strip_prefix("http://")
            .ok_or(BoardError::ConfigError)?;
        let authority = rest.trim_end_matches('/');
        if authority.is_empty() || authority.contains('/') {
            return Err(BoardError::ConfigError);
        }

        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) => (host, port.parse().map_err(|_| BoardError::ConfigError)?),
            None => (authority, 80),
        };
        if host.is_empty() {
            return Err(BoardError::ConfigError);
        }

        let mut owned = String::new();
        owned.push_str(host).map_err(|_| BoardError::ConfigError)?;
        Ok(Self { host: owned, port })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// Build a complete request. A body is sent as `application/json`.
pub fn format_request(
    method: Method,
    server: &ServerAddress,
    path: &str,
    body: Option<&[u8]>,
) -> Result<Vec<u8, MAX_REQUEST_SIZE>, BoardError> {
    let mut head: String<MAX_REQUEST_SIZE> = String::new();
    write!(head, "{} {} HTTP/1.1\r\n", method.as_str(), path).map_err(|_| BoardError::ProtocolError)?;
    let host_line = if server.port == 80 {
        write!(head, "Host: {}\r\n", server.host)
    } else {
        write!(head, "Host: {}:{}\r\n", server.host, server.port)
    };
    host_line.map_err(|_| BoardError::ProtocolError)?;
    head.push_str("Connection: close\r\n").map_err(|_| BoardError::ProtocolError)?;
    if let Some(body) = body {
        write!(
            head,
            "Content-Type: application/json\r\nContent-Length: {}\r\n",
            body.len()
        )
        .map_err(|_| BoardError::ProtocolError)?;
    }
    head.push_str("\r\n").map_err(|_| BoardError::ProtocolError)?;

    let mut request = Vec::new();
    request
        .extend_from_slice(head.as_bytes())
        .map_err(|_| BoardError::ProtocolError)?;
    if let Some(body) = body {
        request.extend_from_slice(body).map_err(|_| BoardError::ProtocolError)?;
    }
    Ok(request)
}

/// Parsed response borrowing from the receive buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Response<'a> {
    pub status: u16,
    pub body: &'a [u8],
}

impl Response<'_> {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Parse a complete response as read until the server closed the connection
pub fn parse_response(raw: &[u8]) -> Result<Response<'_>, BoardError> {
    let header_end = find(raw, b"\r\n\r\n").ok_or(BoardError::ProtocolError)?;
    let head = core::str::from_utf8(&raw[..header_end]).map_err(|_| BoardError::ProtocolError)?;
    let rest = &raw[header_end + 4..];

    let mut lines = head.split("\r\n");
    let status_line = lines.next().ok_or(BoardError::ProtocolError)?;
    let mut parts = status_line.splitn(3, ' ');
    let version = parts.next().unwrap_or_default();
    if !version.starts_with("HTTP/1.") {
        return Err(BoardError::ProtocolError);
    }
    let status = parts
        .next()
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or(BoardError::ProtocolError)?;

    let mut content_length = None;
    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        if name.trim().eq_ignore_ascii_case("content-length") {
            content_length = Some(value.parse::<usize>().map_err(|_| BoardError::ProtocolError)?);
        } else if name.trim().eq_ignore_ascii_case("transfer-encoding")
            && value.eq_ignore_ascii_case("chunked")
        {
            return Err(BoardError::ProtocolError);
        }
    }

    let body = match content_length {
        Some(len) => rest.get(..len).ok_or(BoardError::ProtocolError)?,
        None => rest,
    };

    Ok(Response { status, body })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Request/response exchange with the sign server.
///
/// Implementations open a connection, write `request`, read until the peer
/// closes and return the number of bytes placed in `response`.
#[allow(async_fn_in_trait)]
pub trait HttpTransport {
    async fn exchange(
        &mut self,
        server: &ServerAddress,
        request: &[u8],
        response: &mut [u8],
    ) -> Result<usize, BoardError>;
}
