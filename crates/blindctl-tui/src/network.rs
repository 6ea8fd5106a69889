//! Wi-Fi and device maintenance state behind the network view.
//!
//! Requests run on the tokio runtime and come back through a `JoinSet`,
//! the same way channel commands do. [`NetworkState::poll`] applies
//! finished requests without blocking the UI thread.

use blindctl_client::{DeviceApi, NetworkError};
use blindctl_core::{NetworkConfig, WifiNetwork};
use tokio::runtime::Handle;
use tokio::task::JoinSet;
use tracing::{debug, warn};

enum DeviceReply {
    Scan(Result<Vec<WifiNetwork>, NetworkError>),
    Config(Result<NetworkConfig, NetworkError>),
    Saved {
        config: NetworkConfig,
        result: Result<(), NetworkError>,
    },
    Restarted(Result<(), NetworkError>),
}

/// Outcome of a finished device request, for the status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceNotice {
    Scanned { count: usize },
    ConfigLoaded,
    Saved { ssid: String },
    Restarting,
    Failed { request: &'static str, message: String },
}

impl DeviceNotice {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

impl std::fmt::Display for DeviceNotice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scanned { count } => write!(f, "Found {count} networks"),
            Self::ConfigLoaded => write!(f, "Network configuration loaded"),
            Self::Saved { ssid } => write!(f, "Saved network {ssid}"),
            Self::Restarting => write!(f, "Device restarting"),
            Self::Failed { request, message } => write!(f, "{request} failed: {message}"),
        }
    }
}

pub struct NetworkState {
    device: DeviceApi,
    runtime: Handle,
    tasks: JoinSet<DeviceReply>,
    networks: Vec<WifiNetwork>,
    config: Option<NetworkConfig>,
    scanning: bool,
}

impl NetworkState {
    pub fn new(device: DeviceApi, runtime: Handle) -> Self {
        Self {
            device,
            runtime,
            tasks: JoinSet::new(),
            networks: Vec::new(),
            config: None,
            scanning: false,
        }
    }

    /// Networks from the last successful scan, in device order.
    pub fn networks(&self) -> &[WifiNetwork] {
        &self.networks
    }

    pub fn config(&self) -> Option<&NetworkConfig> {
        self.config.as_ref()
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning
    }

    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Start a scan unless one is already running.
    pub fn scan(&mut self) -> bool {
        if self.scanning {
            return false;
        }
        self.scanning = true;
        let device = self.device.clone();
        self.tasks
            .spawn_on(async move { DeviceReply::Scan(device.scan_networks().await) }, &self.runtime);
        true
    }

    pub fn load_config(&mut self) {
        let device = self.device.clone();
        self.tasks.spawn_on(
            async move { DeviceReply::Config(device.network_config().await) },
            &self.runtime,
        );
    }

    pub fn save_config(&mut self, ssid: String, password: String) {
        let device = self.device.clone();
        self.tasks.spawn_on(
            async move {
                let result = device.update_network_config(&ssid, &password).await;
                DeviceReply::Saved {
                    config: NetworkConfig { ssid, password },
                    result,
                }
            },
            &self.runtime,
        );
    }

    pub fn restart(&mut self) {
        let device = self.device.clone();
        self.tasks
            .spawn_on(async move { DeviceReply::Restarted(device.restart().await) }, &self.runtime);
    }

    /// Apply every finished request.
    pub fn poll(&mut self) -> Vec<DeviceNotice> {
        let mut notices = Vec::new();
        while let Some(joined) = self.tasks.try_join_next() {
            match joined {
                Ok(reply) => notices.push(self.apply(reply)),
                Err(e) => warn!(error = %e, "device request task failed"),
            }
        }
        notices
    }

    /// Wait for every outstanding request.
    pub async fn settle(&mut self) -> Vec<DeviceNotice> {
        let mut notices = Vec::new();
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(reply) => notices.push(self.apply(reply)),
                Err(e) => warn!(error = %e, "device request task failed"),
            }
        }
        notices
    }

    fn apply(&mut self, reply: DeviceReply) -> DeviceNotice {
        match reply {
            DeviceReply::Scan(result) => {
                self.scanning = false;
                match result {
                    Ok(networks) => {
                        debug!(count = networks.len(), "wifi scan finished");
                        self.networks = networks;
                        DeviceNotice::Scanned {
                            count: self.networks.len(),
                        }
                    }
                    Err(e) => failed("Scan", e),
                }
            }
            DeviceReply::Config(Ok(config)) => {
                self.config = Some(config);
                DeviceNotice::ConfigLoaded
            }
            DeviceReply::Config(Err(e)) => failed("Loading network config", e),
            DeviceReply::Saved { config, result } => match result {
                Ok(()) => {
                    let ssid = config.ssid.clone();
                    self.config = Some(config);
                    DeviceNotice::Saved { ssid }
                }
                Err(e) => failed("Saving network config", e),
            },
            DeviceReply::Restarted(Ok(())) => DeviceNotice::Restarting,
            DeviceReply::Restarted(Err(e)) => failed("Restart", e),
        }
    }
}

fn failed(request: &'static str, error: NetworkError) -> DeviceNotice {
    warn!(request, error = %error, "device request failed");
    DeviceNotice::Failed {
        request,
        message: error.friendly_message(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blindctl_client::{Endpoint, MockTransport};
    use serde_json::json;
    use std::sync::Arc;

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap()
    }

    fn state_with(mock: Arc<MockTransport>, rt: &tokio::runtime::Runtime) -> NetworkState {
        NetworkState::new(DeviceApi::new(mock), rt.handle().clone())
    }

    #[test]
    fn test_scan_keeps_device_order() {
        let rt = runtime();
        let mock = Arc::new(MockTransport::new().with_response(
            Endpoint::WifiNetworks,
            json!([{"ssid": "attic", "rssi": -80}, {"ssid": "home", "rssi": -40}]),
        ));
        let mut state = state_with(mock, &rt);

        assert!(state.scan());
        assert!(state.is_scanning());
        // A second scan while one runs is ignored
        assert!(!state.scan());

        let notices = rt.block_on(state.settle());
        assert_eq!(notices, vec![DeviceNotice::Scanned { count: 2 }]);
        assert!(!state.is_scanning());
        assert_eq!(state.networks()[0].ssid, "attic");
        assert_eq!(state.networks()[1].rssi, -40);
    }

    #[test]
    fn test_failed_scan_keeps_previous_results() {
        let rt = runtime();
        let mock = Arc::new(
            MockTransport::new()
                .with_response(Endpoint::WifiNetworks, json!([{"ssid": "home", "rssi": -40}])),
        );
        let mut state = state_with(mock.clone(), &rt);
        state.scan();
        rt.block_on(state.settle());

        mock.set_failing(Endpoint::WifiNetworks, true);
        state.scan();
        let notices = rt.block_on(state.settle());

        assert!(notices[0].is_failure());
        assert_eq!(
            notices[0].to_string(),
            "Scan failed: Device unreachable. Check the network."
        );
        assert_eq!(state.networks().len(), 1);
        assert!(!state.is_scanning());
    }

    #[test]
    fn test_save_config_posts_credentials() {
        let rt = runtime();
        let mock = Arc::new(MockTransport::new());
        let mut state = state_with(mock.clone(), &rt);

        state.save_config("home".to_string(), "hunter22".to_string());
        let notices = rt.block_on(state.settle());

        assert_eq!(
            notices,
            vec![DeviceNotice::Saved {
                ssid: "home".to_string()
            }]
        );
        assert_eq!(
            mock.payloads(Endpoint::WifiConfig),
            vec![json!({"ssid": "home", "password": "hunter22"})]
        );
        assert_eq!(state.config().map(|c| c.ssid.as_str()), Some("home"));
    }

    #[test]
    fn test_load_config() {
        let rt = runtime();
        let mock = Arc::new(
            MockTransport::new()
                .with_response(Endpoint::WifiConfig, json!({"ssid": "home", "password": "pw"})),
        );
        let mut state = state_with(mock, &rt);

        state.load_config();
        let notices = rt.block_on(state.settle());

        assert_eq!(notices, vec![DeviceNotice::ConfigLoaded]);
        assert_eq!(
            state.config(),
            Some(&NetworkConfig {
                ssid: "home".to_string(),
                password: "pw".to_string()
            })
        );
    }

    #[test]
    fn test_restart_posts_empty_object() {
        let rt = runtime();
        let mock = Arc::new(MockTransport::new());
        let mut state = state_with(mock.clone(), &rt);

        state.restart();
        let notices = rt.block_on(state.settle());

        assert_eq!(notices, vec![DeviceNotice::Restarting]);
        assert_eq!(mock.payloads(Endpoint::CoreRestart), vec![json!({})]);
    }
}
