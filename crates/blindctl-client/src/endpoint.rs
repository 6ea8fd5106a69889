//! REST endpoints exposed by the device and their request bodies.

use blindctl_core::{ChannelId, RemoteAction};
use serde::{Deserialize, Serialize};

/// Every REST endpoint the panel talks to, relative to the API root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `GET` list of channels
    Remotes,
    /// `POST {remote_id, action}`
    RemoteAction,
    /// `POST {name}` returning the created channel
    RemoteCreate,
    /// `POST {remote_id, data: {name}}`
    RemoteUpdate,
    /// `POST {remote_id}`
    RemoteDelete,
    /// `GET` Wi-Fi scan results
    WifiNetworks,
    /// `GET` current credentials, `POST {ssid, password}` to change them
    WifiConfig,
    /// `POST {}`
    CoreRestart,
}

impl Endpoint {
    /// Path appended to the API root.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Remotes => "/remotes",
            Self::RemoteAction => "/remotes/action",
            Self::RemoteCreate => "/remotes/create",
            Self::RemoteUpdate => "/remotes/update",
            Self::RemoteDelete => "/remotes/delete",
            Self::WifiNetworks => "/wifi/networks",
            Self::WifiConfig => "/wifi/config",
            Self::CoreRestart => "/core/restart",
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub remote_id: ChannelId,
    pub action: RemoteAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRequest {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRequest {
    pub remote_id: ChannelId,
    pub data: UpdateData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateData {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteRequest {
    pub remote_id: ChannelId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfigRequest {
    pub ssid: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_shapes() {
        let action = ActionRequest {
            remote_id: ChannelId(4),
            action: RemoteAction::Stop,
        };
        assert_eq!(
            serde_json::to_value(&action).unwrap(),
            json!({"remote_id": 4, "action": "stop"})
        );

        let update = UpdateRequest {
            remote_id: ChannelId(4),
            data: UpdateData {
                name: "Patio".into(),
            },
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({"remote_id": 4, "data": {"name": "Patio"}})
        );
    }

    #[test]
    fn test_paths() {
        assert_eq!(Endpoint::Remotes.path(), "/remotes");
        assert_eq!(Endpoint::RemoteAction.to_string(), "/remotes/action");
        assert_eq!(Endpoint::CoreRestart.path(), "/core/restart");
    }
}
