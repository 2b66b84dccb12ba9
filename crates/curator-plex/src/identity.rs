// SPDX-License-Identifier: GPL-3.0-or-later

use uuid::Uuid;

/// Identification sent with every Plex call as `X-Plex-*` headers.
///
/// Built once at process start and shared read-only; the client identifier
/// must stay stable for the lifetime of the process so Plex sees a single
/// device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    pub client_identifier: String,
    pub product: String,
    pub version: String,
    pub device: String,
    pub device_name: String,
    pub platform: String,
    pub platform_version: String,
}

impl ClientIdentity {
    /// Use `client_identifier` when it is set and non-blank, otherwise generate one.
    pub fn with_identifier(client_identifier: Option<String>) -> Self {
        let client_identifier = client_identifier
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Self {
            client_identifier,
            ..Self::default()
        }
    }

    pub(crate) fn header_pairs(&self) -> [(&'static str, &str); 7] {
        [
            ("X-Plex-Client-Identifier", self.client_identifier.as_str()),
            ("X-Plex-Product", self.product.as_str()),
            ("X-Plex-Version", self.version.as_str()),
            ("X-Plex-Device", self.device.as_str()),
            ("X-Plex-Device-Name", self.device_name.as_str()),
            ("X-Plex-Platform", self.platform.as_str()),
            ("X-Plex-Platform-Version", self.platform_version.as_str()),
        ]
    }
}

impl Default for ClientIdentity {
    fn default() -> Self {
        Self {
            client_identifier: Uuid::new_v4().to_string(),
            product: "Curator".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            device: "Curator".to_string(),
            device_name: "Curator".to_string(),
            platform: std::env::consts::OS.to_string(),
            platform_version: "1.0".to_string(),
        }
    }
}
