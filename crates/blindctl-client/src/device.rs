//! Device maintenance calls: Wi-Fi and restart.
//!
//! These hold no client state. Each call is a single request whose result
//! goes straight back to the caller.

use std::sync::Arc;

use blindctl_core::{NetworkConfig, WifiNetwork};
use serde_json::{Value, json};
use tracing::info;

use crate::endpoint::{Endpoint, NetworkConfigRequest};
use crate::error::Result;
use crate::transport::{Transport, fetch_list, fetch_one, send};

#[derive(Clone)]
pub struct DeviceApi {
    transport: Arc<dyn Transport>,
}

impl DeviceApi {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// List visible Wi-Fi networks, strongest first as reported by the device.
    pub async fn scan_networks(&self) -> Result<Vec<WifiNetwork>> {
        fetch_list(self.transport.as_ref(), Endpoint::WifiNetworks).await
    }

    /// Current station credentials.
    pub async fn network_config(&self) -> Result<NetworkConfig> {
        fetch_one(self.transport.as_ref(), Endpoint::WifiConfig).await
    }

    pub async fn update_network_config(&self, ssid: &str, password: &str) -> Result<()> {
        let request = NetworkConfigRequest {
            ssid: ssid.to_string(),
            password: password.to_string(),
        };
        let _: Value = send(self.transport.as_ref(), Endpoint::WifiConfig, &request).await?;
        info!(%ssid, "network configuration updated");
        Ok(())
    }

    /// Ask the device to reboot. The log socket will drop shortly after.
    pub async fn restart(&self) -> Result<()> {
        let _: Value = send(self.transport.as_ref(), Endpoint::CoreRestart, &json!({})).await?;
        info!("device restart requested");
        Ok(())
    }
}
