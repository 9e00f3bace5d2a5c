//! Network type classification for instance URLs
//!
//! Pure URL inspection, no network I/O.

use url::Url;

use crate::error::{CollectorError, Result};

/// Reachability network of an instance, derived from its URL host
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    /// Ordinary clear-web host
    Normal,
    /// Tor onion service (`.onion`)
    Tor,
    /// I2P eepsite (`.i2p`)
    I2p,
}

impl NetworkType {
    pub const ALL: [NetworkType; 3] = [NetworkType::Normal, NetworkType::Tor, NetworkType::I2p];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Tor => "tor",
            Self::I2p => "i2p",
        }
    }
}

impl std::fmt::Display for NetworkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classify an instance URL. Unparseable URLs classify as `Normal`.
pub fn network_type_of(url: &str) -> NetworkType {
    let host = match Url::parse(url) {
        Ok(parsed) => match parsed.host_str() {
            Some(host) => host.to_ascii_lowercase(),
            None => return NetworkType::Normal,
        },
        Err(_) => return NetworkType::Normal,
    };
    if host.ends_with(".onion") {
        NetworkType::Tor
    } else if host.ends_with(".i2p") {
        NetworkType::I2p
    } else {
        NetworkType::Normal
    }
}

/// Extract the host and effective port of an instance URL.
///
/// The port falls back to the scheme default (80/443).
pub fn host_port_of(url: &str) -> Result<(String, u16)> {
    let parsed = Url::parse(url)?;
    let host = parsed
        .host_str()
        .ok_or_else(|| CollectorError::validation("instance_url", format!("no host in {url}")))?
        .to_owned();
    let port = parsed
        .port_or_known_default()
        .ok_or_else(|| CollectorError::validation("instance_url", format!("no port in {url}")))?;
    Ok((host, port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_web_is_normal() {
        assert_eq!(network_type_of("https://searx.example.org/"), NetworkType::Normal);
    }

    #[test]
    fn test_onion_is_tor() {
        assert_eq!(
            network_type_of("http://ulrn6sryqaifefld.onion/"),
            NetworkType::Tor
        );
    }

    #[test]
    fn test_i2p_suffix() {
        assert_eq!(network_type_of("http://searx.i2p/"), NetworkType::I2p);
    }

    #[test]
    fn test_garbage_is_normal() {
        assert_eq!(network_type_of("not a url"), NetworkType::Normal);
    }

    #[test]
    fn test_host_port_defaults() {
        assert_eq!(
            host_port_of("https://searx.example.org/").unwrap(),
            ("searx.example.org".to_string(), 443)
        );
        assert_eq!(
            host_port_of("http://searx.example.org:8888/").unwrap(),
            ("searx.example.org".to_string(), 8888)
        );
    }
}
