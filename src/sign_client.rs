//! Sign server client
//!
//! `POST {server}/api/signs/{id}/status` reports telemetry and
//! `GET {server}/api/signs/{id}/command` fetches the display command.
//! Failures are logged and returned; nothing is retried.

use core::fmt::Write;

use heapless::String;

use crate::BoardError;
use crate::command::{self, DisplayCommand};
use crate::http::{self, HttpTransport, MAX_RESPONSE_SIZE, Method, Response, ServerAddress};
use crate::telemetry::TelemetrySample;

const MAX_PATH_LEN: usize = 96;
const MAX_SIGN_ID_LEN: usize = 32;
const MAX_STATUS_BODY: usize = 192;

pub struct SignClient<T> {
    transport: T,
    server: ServerAddress,
    sign_id: String<MAX_SIGN_ID_LEN>,
}

impl<T: HttpTransport> SignClient<T> {
    pub fn new(transport: T, server: ServerAddress, sign_id: &str) -> Result<Self, BoardError> {
        let sign_id = sign_id.trim();
        if sign_id.is_empty() || sign_id.contains(['/', ' ', '?', '#']) {
            return Err(BoardError::ConfigError);
        }
        let mut id = String::new();
        id.push_str(sign_id).map_err(|_| BoardError::ConfigError)?;

        Ok(Self {
            transport,
            server,
            sign_id: id,
        })
    }

    pub fn sign_id(&self) -> &str {
        &self.sign_id
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn endpoint(&self, name: &str) -> Result<String<MAX_PATH_LEN>, BoardError> {
        let mut path = String::new();
        write!(path, "/api/signs/{}/{}", self.sign_id, name).map_err(|_| BoardError::ConfigError)?;
        Ok(path)
    }

    async fn request<'b>(
        &mut self,
        method: Method,
        path: &str,
        body: Option<&[u8]>,
        buf: &'b mut [u8],
    ) -> Result<Response<'b>, BoardError> {
        let request = http::format_request(method, &self.server, path, body)?;
        let len = self.transport.exchange(&self.server, &request, buf).await?;
        let buf: &'b [u8] = buf;
        let response = http::parse_response(&buf[..len])?;
        if response.is_success() {
            Ok(response)
        } else {
            Err(BoardError::HttpError(response.status))
        }
    }

    /// Report a telemetry sample
    pub async fn send_status(&mut self, sample: &TelemetrySample) -> Result<(), BoardError> {
        log::info!("[HTTP] Sending status update...");

        let mut body = [0u8; MAX_STATUS_BODY];
        let len = sample.write_json(&mut body)?;
        let path = self.endpoint("status")?;

        let mut buf = [0u8; MAX_RESPONSE_SIZE];
        match self.request(Method::Post, &path, Some(&body[..len]), &mut buf).await {
            Ok(_) => {
                log::info!("[HTTP] Status update successful");
                Ok(())
            }
            Err(e) => {
                log::warn!("[HTTP] Status update failed: {}", e);
                Err(e)
            }
        }
    }

    /// Fetch the current command; `Ok(None)` for codes the sign does not know
    pub async fn poll_command(&mut self) -> Result<Option<DisplayCommand>, BoardError> {
        let path = self.endpoint("command")?;
        log::info!("[HTTP] Checking commands: {}", path);

        let mut buf = [0u8; MAX_RESPONSE_SIZE];
        let result = match self.request(Method::Get, &path, None, &mut buf).await {
            Ok(response) => command::decode_command(response.body),
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            log::warn!("[HTTP] Command check failed: {}", e);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;

    /// Replays a canned response and records the requests it was given
    struct ScriptedTransport {
        response: Result<&'static [u8], BoardError>,
        requests: Vec<std::string::String>,
    }

    impl ScriptedTransport {
        fn replying(raw: &'static [u8]) -> Self {
            Self {
                response: Ok(raw),
                requests: Vec::new(),
            }
        }

        fn failing(error: BoardError) -> Self {
            Self {
                response: Err(error),
                requests: Vec::new(),
            }
        }
    }

    impl HttpTransport for ScriptedTransport {
        async fn exchange(
            &mut self,
            _server: &ServerAddress,
            request: &[u8],
            response: &mut [u8],
        ) -> Result<usize, BoardError> {
            self.requests
                .push(std::string::String::from_utf8(request.to_vec()).unwrap());
            let raw = self.response?;
            response[..raw.len()].copy_from_slice(raw);
            Ok(raw.len())
        }
    }

    fn client(transport: ScriptedTransport) -> SignClient<ScriptedTransport> {
        let server = ServerAddress::parse("http://10.10.50.101:3000").unwrap();
        SignClient::new(transport, server, "1").unwrap()
    }

    fn sample() -> TelemetrySample {
        TelemetrySample {
            latitude: 52.25,
            longitude: 6.875,
            heading: 45,
            battery: 93,
            signal: -55,
        }
    }

    #[test]
    fn rejects_unusable_sign_ids() {
        let server = ServerAddress::parse("http://10.10.50.101:3000").unwrap();
        for id in ["", "  ", "a/b", "x?y"] {
            let transport = ScriptedTransport::failing(BoardError::TransportError);
            assert!(SignClient::new(transport, server.clone(), id).is_err());
        }
    }

    #[test]
    fn status_is_posted_as_json() {
        let mut client = client(ScriptedTransport::replying(
            b"HTTP/1.1 200 OK\r\nContent-Length: 16\r\n\r\n{\"success\":true}",
        ));

        assert_eq!(block_on(client.send_status(&sample())), Ok(()));

        let request = &client.transport().requests[0];
        assert!(request.starts_with("POST /api/signs/1/status HTTP/1.1\r\n"));
        assert!(request.contains("Content-Type: application/json\r\n"));
        assert!(request.ends_with(",\"heading\":45,\"battery\":93,\"signal\":-55}"));
    }

    #[test]
    fn status_failure_reports_code() {
        let mut client = client(ScriptedTransport::replying(
            b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 2\r\n\r\n{}",
        ));
        assert_eq!(
            block_on(client.send_status(&sample())),
            Err(BoardError::HttpError(500))
        );
        assert_eq!(client.transport().requests.len(), 1);
    }

    #[test]
    fn command_is_fetched_and_mapped() {
        let mut client = client(ScriptedTransport::replying(
            b"HTTP/1.1 200 OK\r\nContent-Length: 13\r\n\r\n{\"command\":1}",
        ));

        assert_eq!(
            block_on(client.poll_command()),
            Ok(Some(DisplayCommand::LeftArrow))
        );
        assert_eq!(
            client.transport().requests[0],
            "GET /api/signs/1/command HTTP/1.1\r\nHost: 10.10.50.101:3000\r\nConnection: close\r\n\r\n"
        );
    }

    #[test]
    fn unknown_command_is_ignored() {
        let mut client = client(ScriptedTransport::replying(
            b"HTTP/1.1 200 OK\r\nContent-Length: 13\r\n\r\n{\"command\":7}",
        ));
        assert_eq!(block_on(client.poll_command()), Ok(None));
    }

    #[test]
    fn missing_sign_is_http_error() {
        let mut client = client(ScriptedTransport::replying(
            b"HTTP/1.1 404 Not Found\r\nContent-Length: 26\r\n\r\n{\"error\":\"Sign not found\"}",
        ));
        assert_eq!(block_on(client.poll_command()), Err(BoardError::HttpError(404)));
    }

    #[test]
    fn transport_errors_pass_through() {
        let mut client = client(ScriptedTransport::failing(BoardError::TransportError));
        assert_eq!(block_on(client.poll_command()), Err(BoardError::TransportError));
        assert_eq!(
            block_on(client.send_status(&sample())),
            Err(BoardError::TransportError)
        );
        assert_eq!(client.transport().requests.len(), 2);
    }
}
