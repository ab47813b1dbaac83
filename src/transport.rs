//! HTTP transport over an embassy-net TCP socket

use embassy_net::dns::DnsQueryType;
use embassy_net::tcp::TcpSocket;
use embassy_net::{IpAddress, Ipv4Address, Stack};
use embassy_time::Duration;
use embedded_io_async::Write;

use crate::BoardError;
use crate::http::{HttpTransport, ServerAddress};

const SOCKET_TIMEOUT: Duration = Duration::from_secs(10);
const SOCKET_BUFFER_SIZE: usize = 1024;

/// One TCP connection per exchange, closed by the server after the response
pub struct TcpTransport<'a> {
    stack: Stack<'a>,
    rx_buffer: [u8; SOCKET_BUFFER_SIZE],
    tx_buffer: [u8; SOCKET_BUFFER_SIZE],
}

impl<'a> TcpTransport<'a> {
    pub fn new(stack: Stack<'a>) -> Self {
        Self {
            stack,
            rx_buffer: [0; SOCKET_BUFFER_SIZE],
            tx_buffer: [0; SOCKET_BUFFER_SIZE],
        }
    }

    async fn resolve(&self, host: &str) -> Result<IpAddress, BoardError> {
        if let Ok(ip) = host.parse::<Ipv4Address>() {
            return Ok(IpAddress::Ipv4(ip));
        }

        let addresses = self
            .stack
            .dns_query(host, DnsQueryType::A)
            .await
            .map_err(|e| {
                log::warn!("[HTTP] DNS lookup for {} failed: {:?}", host, e);
                BoardError::TransportError
            })?;
        addresses.first().copied().ok_or(BoardError::TransportError)
    }
}

impl HttpTransport for TcpTransport<'_> {
    async fn exchange(
        &mut self,
        server: &ServerAddress,
        request: &[u8],
        response: &mut [u8],
    ) -> Result<usize, BoardError> {
        let address = self.resolve(server.host()).await?;

        let mut socket = TcpSocket::new(self.stack, &mut self.rx_buffer, &mut self.tx_buffer);
        socket.set_timeout(Some(SOCKET_TIMEOUT));

        socket
            .connect((address, server.port()))
            .await
            .map_err(|e| {
                log::warn!("[HTTP] Connect to {}:{} failed: {:?}", server.host(), server.port(), e);
                BoardError::TransportError
            })?;

        socket
            .write_all(request)
            .await
            .map_err(|_| BoardError::TransportError)?;
        socket.flush().await.map_err(|_| BoardError::TransportError)?;

        let mut len = 0;
        while len < response.len() {
            match socket.read(&mut response[len..]).await {
                Ok(0) => break,
                Ok(n) => len += n,
                Err(e) => {
                    log::warn!("[HTTP] Read failed: {:?}", e);
                    socket.abort();
                    return Err(BoardError::TransportError);
                }
            }
        }

        socket.close();
        Ok(len)
    }
}
