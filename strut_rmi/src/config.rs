use serde::de::{Error, IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_value::Value;
use std::collections::BTreeMap;
use std::fmt::Formatter;
use std::path::PathBuf;
use strut_factory::impl_deserialize_field;
use strut_util::BackoffConfig;

/// The protocol version tag stamped on envelopes when no other is given.
const DEFAULT_VERSION: &str = "1.0";

fn default_root() -> PathBuf {
    PathBuf::from("/var/lib/strut-rmi/pending")
}

fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}

/// Represents the application-level configuration section covering the RMI
/// agent: where the durable pending queue lives on disk, the protocol
/// version tag stamped on outgoing envelopes, and the backoff policy used
/// by the [reliability wrapper](crate::reliability).
///
/// This config comes with a custom [`Deserialize`] implementation, to
/// support more human-oriented textual configuration, matching the
/// convention used by [`RabbitMqConfig`](strut_rabbitmq::RabbitMqConfig).
#[derive(Debug, Clone, PartialEq)]
pub struct RmiConfig {
    root: PathBuf,
    version: String,
    backoff: BackoffConfig,
}

impl RmiConfig {
    /// Returns the root directory of the durable pending queue.
    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    /// Returns the protocol version tag stamped on outgoing envelopes.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the backoff policy for the reliability wrapper.
    pub fn backoff(&self) -> &BackoffConfig {
        &self.backoff
    }
}

impl Default for RmiConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            version: default_version(),
            backoff: BackoffConfig::default(),
        }
    }
}

impl AsRef<RmiConfig> for RmiConfig {
    fn as_ref(&self) -> &RmiConfig {
        self
    }
}

const _: () = {
    impl<'de> Deserialize<'de> for RmiConfig {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_map(RmiConfigVisitor)
        }
    }

    struct RmiConfigVisitor;

    impl<'de> Visitor<'de> for RmiConfigVisitor {
        type Value = RmiConfig;

        fn expecting(&self, formatter: &mut Formatter) -> std::fmt::Result {
            formatter.write_str("a map of application RMI configuration")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut root = None;
            let mut version = None;
            let mut backoff = None;

            let mut discarded = BTreeMap::new();

            while let Some(key) = map.next_key::<Value>()? {
                let field = RmiConfigField::deserialize(key.clone()).map_err(Error::custom)?;

                match field {
                    RmiConfigField::root => field.poll(&mut map, &mut root)?,
                    RmiConfigField::version => field.poll(&mut map, &mut version)?,
                    RmiConfigField::backoff => field.poll(&mut map, &mut backoff)?,
                    RmiConfigField::__ignore => {
                        discarded.insert(key, map.next_value()?);
                        IgnoredAny
                    }
                };
            }

            Ok(RmiConfig {
                root: root.unwrap_or_else(default_root),
                version: version.unwrap_or_else(default_version),
                backoff: backoff.unwrap_or_default(),
            })
        }
    }

    impl_deserialize_field!(
        RmiConfigField,
        strut_deserialize::Slug::eq_as_slugs,
        root | path | directory | dir,
        version | protocol_version,
        backoff | retry,
    );
};

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty() {
        let input = "";
        let expected_output = RmiConfig::default();

        let actual_output = serde_yml::from_str::<RmiConfig>(input).unwrap();

        assert_eq!(expected_output, actual_output);
    }

    #[test]
    fn full() {
        let input = r#"
root: /data/rmi/pending
version: "2.1"
backoff:
  initial_interval: 1s
  max_interval: 30s
"#;

        let actual_output = serde_yml::from_str::<RmiConfig>(input).unwrap();

        assert_eq!(actual_output.root(), &PathBuf::from("/data/rmi/pending"));
        assert_eq!(actual_output.version(), "2.1");
    }

    #[test]
    fn aliases_are_recognized() {
        let input = "dir: /data/rmi/pending\n";
        let actual_output = serde_yml::from_str::<RmiConfig>(input).unwrap();

        assert_eq!(actual_output.root(), &PathBuf::from("/data/rmi/pending"));
    }
}
