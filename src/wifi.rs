//! WiFi module for the ESP32-C3 sign node
//!
//! Association uses esp-wifi 0.14 in station mode; addressing comes from
//! embassy-net DHCP. A bounded number of association checks is made before
//! giving up, after which the caller restarts the node.

use embassy_net::Stack;
use embassy_time::{Duration, Timer, with_timeout};
use esp_wifi::wifi::{AuthMethod, ClientConfiguration, Configuration, WifiController};

use crate::{BoardError, config};

/// Time allowed for DHCP after association
const DHCP_TIMEOUT: Duration = Duration::from_secs(10);

/// WiFi manager for station-mode association
pub struct WiFiManager<'a> {
    controller: WifiController<'a>,
    stack: Stack<'a>,
    is_connected: bool,
}

impl<'a> WiFiManager<'a> {
    pub fn new(controller: WifiController<'a>, stack: Stack<'a>) -> Self {
        Self {
            controller,
            stack,
            is_connected: false,
        }
    }

    /// Associate and wait for a DHCP lease
    pub async fn connect(&mut self, ssid: &str, password: &str) -> Result<(), BoardError> {
        log::info!("[WIFI] Connecting to WiFi: {}", ssid);

        let auth_method = if password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let client_config = ClientConfiguration {
            ssid: ssid.try_into().map_err(|_| BoardError::WiFiError)?,
            password: password.try_into().map_err(|_| BoardError::WiFiError)?,
            auth_method,
            ..Default::default()
        };

        self.controller
            .set_configuration(&Configuration::Client(client_config))
            .map_err(|_| BoardError::WiFiError)?;

        if !self.controller.is_started().unwrap_or(false) {
            self.controller.start().map_err(|_| BoardError::WiFiError)?;
        }
        self.controller.connect().map_err(|_| BoardError::WiFiError)?;

        let mut attempts = 0;
        while !self.controller.is_connected().unwrap_or(false)
            && attempts < config::WIFI_CONNECT_ATTEMPTS
        {
            Timer::after(Duration::from_millis(config::WIFI_RETRY_DELAY_MS)).await;
            log::debug!("[WIFI] Waiting for association ({})", attempts + 1);
            attempts += 1;
        }

        if !self.controller.is_connected().unwrap_or(false) {
            log::error!("[WIFI] WiFi connection failed after {} attempts", attempts);
            return Err(BoardError::WiFiError);
        }

        log::info!("[WIFI] WiFi connected!");

        if with_timeout(DHCP_TIMEOUT, self.stack.wait_config_up())
            .await
            .is_err()
        {
            log::error!("[WIFI] No DHCP lease within {}s", DHCP_TIMEOUT.as_secs());
            return Err(BoardError::WiFiError);
        }

        if let Some(config) = self.stack.config_v4() {
            log::info!("[WIFI] IP address: {}", config.address.address());
        }

        self.is_connected = true;
        Ok(())
    }

    /// Check if WiFi is connected
    pub fn is_connected(&self) -> bool {
        self.is_connected && self.controller.is_connected().unwrap_or(false)
    }

    /// Returns `false` once the association has been lost
    pub fn monitor_connection(&mut self) -> bool {
        let current_status = self.controller.is_connected().unwrap_or(false);

        if self.is_connected && !current_status {
            log::warn!("[WIFI] WiFi connection lost!");
            self.is_connected = false;
        }

        self.is_connected
    }
}
