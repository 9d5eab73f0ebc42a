use crate::error::InvalidAdapter;
use std::collections::HashMap;
use std::sync::RwLock;

/// A parsed broker URL of the form `scheme://host[:port][/vhost]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerUrl {
    /// The original URL, unparsed.
    pub raw: String,
    /// The scheme, used to select an adapter driver (e.g. `"amqp"`).
    pub scheme: String,
    /// The broker host.
    pub host: String,
    /// The broker port, defaulted per [`default_port`] if not given.
    pub port: u16,
    /// The virtual host, defaulted to `/` if not given.
    pub vhost: String,
}

/// Returns the conventional default port for a known broker URL scheme.
pub fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "amqp" => Some(5672),
        "amqps" => Some(5671),
        "tcp" => Some(5672),
        _ => None,
    }
}

impl BrokerUrl {
    /// Parses `url` into its constituent parts, defaulting the port per
    /// [`default_port`] when one is not given.
    ///
    /// This is a deliberately small parser: it understands exactly the
    /// `scheme://host[:port][/vhost]` shape used throughout this crate, not
    /// the full generality of RFC 3986.
    pub fn parse(url: &str) -> Result<Self, InvalidAdapter> {
        let (scheme, rest) = url.split_once("://").ok_or_else(|| InvalidAdapter {
            scheme: url.to_string(),
        })?;

        let (authority, vhost) = match rest.split_once('/') {
            Some((authority, vhost)) => (authority, vhost.to_string()),
            None => (rest, String::new()),
        };

        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port_str)) => {
                let port = port_str.parse::<u16>().map_err(|_| InvalidAdapter {
                    scheme: scheme.to_string(),
                })?;
                (host.to_string(), port)
            }
            None => {
                let port = default_port(scheme).ok_or_else(|| InvalidAdapter {
                    scheme: scheme.to_string(),
                })?;
                (authority.to_string(), port)
            }
        };

        let vhost = if vhost.is_empty() {
            "/".to_string()
        } else {
            vhost
        };

        Ok(Self {
            raw: url.to_string(),
            scheme: scheme.to_string(),
            host,
            port,
            vhost,
        })
    }
}

/// A process-wide registry mapping URL schemes to adapter driver names.
///
/// This crate does not mandate a single adapter trait object type (the
/// concrete [`Session`](crate::adapter::Session)/[`Reader`](crate::adapter::Reader)
/// types differ per driver), so the registry only resolves *which* driver a
/// scheme names; callers match on the returned name to obtain a concrete
/// adapter constructor.
#[derive(Debug, Default)]
pub struct Registry {
    drivers: RwLock<HashMap<String, String>>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `driver` as the handler for `scheme`, overwriting any
    /// previous registration.
    pub fn register(&self, scheme: impl Into<String>, driver: impl Into<String>) {
        self.drivers
            .write()
            .unwrap()
            .insert(scheme.into(), driver.into());
    }

    /// Resolves the driver registered for `url`'s scheme.
    pub fn find(&self, url: &str) -> Result<String, InvalidAdapter> {
        let parsed = BrokerUrl::parse(url)?;

        self.drivers
            .read()
            .unwrap()
            .get(&parsed.scheme)
            .cloned()
            .ok_or(InvalidAdapter {
                scheme: parsed.scheme,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_url() {
        let parsed = BrokerUrl::parse("amqp://broker.example:5673/prod").unwrap();

        assert_eq!(parsed.scheme, "amqp");
        assert_eq!(parsed.host, "broker.example");
        assert_eq!(parsed.port, 5673);
        assert_eq!(parsed.vhost, "prod");
    }

    #[test]
    fn defaults_port_and_vhost() {
        let parsed = BrokerUrl::parse("amqps://broker.example").unwrap();

        assert_eq!(parsed.port, 5671);
        assert_eq!(parsed.vhost, "/");
    }

    #[test]
    fn rejects_unknown_scheme_without_explicit_port() {
        let error = BrokerUrl::parse("carrier-pigeon://broker.example").unwrap_err();
        assert_eq!(error.scheme, "carrier-pigeon");
    }

    #[test]
    fn registry_round_trip() {
        let registry = Registry::new();
        registry.register("amqp", "lapin");

        assert_eq!(registry.find("amqp://broker.example").unwrap(), "lapin");
    }

    #[test]
    fn registry_reports_missing_driver() {
        let registry = Registry::new();
        let error = registry.find("amqp://broker.example").unwrap_err();
        assert_eq!(error.scheme, "amqp");
    }
}
