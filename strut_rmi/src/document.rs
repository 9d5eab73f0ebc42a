use crate::error::InvalidDocument;
use crate::window::Window;
use serde::de::{DeserializeOwned, Error as DeError};
use serde::ser::Error as SerError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};

/// The body carried by an [`Envelope`]: a method call, its outcome, or a
/// progress report, distinguished on the wire by the envelope's `kind` field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Body<T> {
    /// A request to invoke a remote method, carrying the caller-supplied
    /// argument type `T`.
    Request(Request<T>),
    /// The outcome of a previously dispatched request: either a result of
    /// type `T` or an [`Exception`].
    Reply(Reply<T>),
    /// An intermediate progress report for a long-running request.
    Progress(Progress),
}

/// A remote method call: the target, the method name, and its arguments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Request<T> {
    /// The name of the method being invoked.
    pub method: String,
    /// The method's arguments, opaque to the envelope itself.
    pub args: T,
}

/// The outcome of a dispatched request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Reply<T> {
    /// The method call completed successfully, producing `T`.
    Result(T),
    /// The method call raised an exception.
    Exception(Exception),
}

/// A caller-facing description of a failed method call, deliberately
/// string-based: the exact error types of a remote peer are not known to
/// this agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Exception {
    /// The exception's class or category name, as reported by the peer.
    pub xclass: String,
    /// A human-readable description.
    pub description: String,
}

/// A streamed status report for a long-running request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Progress {
    /// A free-form status string (e.g. "downloading", "applying").
    pub status: String,
    /// Completion percentage, when known.
    pub percent: Option<f64>,
}

/// The wire document exchanged between RMI peers.
///
/// Envelopes are immutable once written to the pending queue: nothing in
/// this module exposes a way to mutate one in place short of constructing a
/// new value.
///
/// Two envelopes are equal iff their `sn` (serial number) is equal;
/// everything else is metadata layered on top of that identity.
#[derive(Debug, Clone)]
pub struct Envelope<T> {
    /// Globally unique serial number identifying this request.
    pub sn: String,
    /// Creation timestamp, seconds since the Unix epoch, assigned on enqueue.
    ///
    /// Absent on a freshly-received request whose execution window is
    /// already open: those never pass through [`Envelope::stamp`].
    pub ts: u64,
    /// The origin broker URL, assigned on enqueue.
    ///
    /// Absent for the same reason as `ts`.
    pub url: String,
    /// The optional execution window; `None` means "always open".
    pub window: Option<Window>,
    /// An opaque correlator, returned to the caller verbatim.
    pub any: Option<String>,
    /// An optional reply-to address.
    pub replyto: Option<String>,
    /// The protocol version tag.
    pub version: String,
    /// `[from, to]` routing pair.
    pub routing: [String; 2],
    /// The payload body. Sits alongside `sn`, `ts`, etc. on the wire: `kind`
    /// (and the body's own fields) are merged into the envelope's own JSON
    /// object, not nested under a `body` key.
    pub body: Body<T>,
    /// Fields present on the wire but not recognized above, preserved
    /// verbatim so re-serialization does not silently drop them.
    ///
    /// Deliberately disjoint from whatever keys [`Body<T>`]'s own
    /// representation occupies (`kind`, and then `method`/`args`,
    /// `result`/`exception`, or `status`/`percent` depending on the variant):
    /// [`Envelope`]'s hand-written [`Deserialize`] strips those out before
    /// this map is populated, and its hand-written [`Serialize`] lets the
    /// body's keys win on the (should-never-happen) chance of a clash, so
    /// `dump()` never emits a key twice.
    pub unknown: serde_json::Map<String, Value>,
}

impl<T> Envelope<T> {
    /// Returns the current time as seconds since the Unix epoch, saturating
    /// at zero rather than panicking on a clock set before 1970.
    fn now_secs() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }

    /// Validates that `sn` is present and non-empty, per the document
    /// model's one hard invariant.
    pub fn validate(&self, bytes: &[u8]) -> Result<(), InvalidDocument> {
        if self.sn.trim().is_empty() {
            return Err(InvalidDocument::sn_missing(bytes.to_vec()));
        }

        Ok(())
    }

    /// Stamps this envelope as though it were just accepted for enqueue:
    /// sets `ts` to now and `url` to the given origin.
    pub fn stamp(&mut self, url: impl Into<String>) {
        self.ts = Self::now_secs();
        self.url = url.into();
    }
}

impl<T> Envelope<T>
where
    T: Serialize,
{
    /// Produces a stable JSON encoding of this envelope.
    pub fn dump(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl<T> Envelope<T>
where
    T: DeserializeOwned,
{
    /// Parses an envelope from its JSON encoding.
    ///
    /// This only constructs the value; it does not validate `sn`. Callers
    /// that accept envelopes from an untrusted source should call
    /// [`Envelope::validate`] immediately afterward.
    pub fn load(bytes: &[u8]) -> Result<Self, InvalidDocument> {
        serde_json::from_slice(bytes)
            .map_err(|error| InvalidDocument::malformed(format!("malformed envelope: {}", error), bytes.to_vec()))
    }
}

impl<T> PartialEq for Envelope<T> {
    fn eq(&self, other: &Self) -> bool {
        self.sn == other.sn
    }
}

impl<T> Eq for Envelope<T> {}

impl<T> Serialize for Envelope<T>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serde_json::Map::new();

        map.insert("sn".to_string(), Value::String(self.sn.clone()));
        map.insert("ts".to_string(), Value::from(self.ts));
        map.insert("url".to_string(), Value::String(self.url.clone()));
        map.insert(
            "window".to_string(),
            serde_json::to_value(self.window).map_err(S::Error::custom)?,
        );
        map.insert(
            "any".to_string(),
            serde_json::to_value(&self.any).map_err(S::Error::custom)?,
        );
        map.insert(
            "replyto".to_string(),
            serde_json::to_value(&self.replyto).map_err(S::Error::custom)?,
        );
        map.insert("version".to_string(), Value::String(self.version.clone()));
        map.insert(
            "routing".to_string(),
            serde_json::to_value(&self.routing).map_err(S::Error::custom)?,
        );

        // The body's own keys (`kind`, plus whichever of `method`/`args`,
        // `result`/`exception`, `status`/`percent` apply) are merged in
        // directly, taking precedence over `unknown` below, so a document
        // round-tripped through this envelope never emits a key twice.
        match serde_json::to_value(&self.body).map_err(S::Error::custom)? {
            Value::Object(body_map) => map.extend(body_map),
            other => {
                return Err(S::Error::custom(format!(
                    "envelope body did not serialize to a JSON object: {}",
                    other
                )))
            }
        }

        for (key, value) in &self.unknown {
            map.entry(key.clone()).or_insert_with(|| value.clone());
        }

        map.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for Envelope<T>
where
    T: DeserializeOwned,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut map = serde_json::Map::<String, Value>::deserialize(deserializer)?;

        let sn = take_required::<String, D::Error>(&mut map, "sn")?;
        let ts = take_optional::<u64, D::Error>(&mut map, "ts")?.unwrap_or(0);
        let url = take_optional::<String, D::Error>(&mut map, "url")?.unwrap_or_default();
        let window = take_optional::<Option<Window>, D::Error>(&mut map, "window")?.flatten();
        let any = take_optional::<Option<String>, D::Error>(&mut map, "any")?.flatten();
        let replyto = take_optional::<Option<String>, D::Error>(&mut map, "replyto")?.flatten();
        let version = take_required::<String, D::Error>(&mut map, "version")?;
        let routing = take_required::<[String; 2], D::Error>(&mut map, "routing")?;

        // `Body<T>` is internally tagged on `kind`, so it is decoded straight
        // out of the same object the rest of the envelope's fields came from.
        let body: Body<T> =
            serde_json::from_value(Value::Object(map.clone())).map_err(D::Error::custom)?;

        map.remove("kind");
        match &body {
            Body::Request(_) => {
                map.remove("method");
                map.remove("args");
            }
            Body::Reply(Reply::Result(_)) => {
                map.remove("result");
            }
            Body::Reply(Reply::Exception(_)) => {
                map.remove("exception");
            }
            Body::Progress(_) => {
                map.remove("status");
                map.remove("percent");
            }
        }

        Ok(Envelope {
            sn,
            ts,
            url,
            window,
            any,
            replyto,
            version,
            routing,
            body,
            unknown: map,
        })
    }
}

fn take_required<T, E>(map: &mut serde_json::Map<String, Value>, key: &'static str) -> Result<T, E>
where
    T: DeserializeOwned,
    E: DeError,
{
    let value = map.remove(key).ok_or_else(|| E::missing_field(key))?;
    serde_json::from_value(value).map_err(E::custom)
}

fn take_optional<T, E>(map: &mut serde_json::Map<String, Value>, key: &str) -> Result<Option<T>, E>
where
    T: DeserializeOwned,
    E: DeError,
{
    match map.remove(key) {
        Some(value) => serde_json::from_value(value).map(Some).map_err(E::custom),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample(sn: &str) -> Envelope<Value> {
        Envelope {
            sn: sn.to_string(),
            ts: 0,
            url: String::new(),
            window: None,
            any: None,
            replyto: None,
            version: "1.0".to_string(),
            routing: ["agent".to_string(), "plugin".to_string()],
            body: Body::Request(Request {
                method: "noop".to_string(),
                args: Value::Null,
            }),
            unknown: serde_json::Map::new(),
        }
    }

    #[test]
    fn equality_is_by_sn_alone() {
        let mut a = sample("sn-1");
        let b = sample("sn-1");
        a.ts = 12345;

        assert_eq!(a, b);
    }

    #[test]
    fn distinct_sn_is_not_equal() {
        assert_ne!(sample("sn-1"), sample("sn-2"));
    }

    #[test]
    fn validate_rejects_missing_sn() {
        let mut envelope = sample("");
        envelope.sn = "   ".to_string();

        let error = envelope.validate(b"{}").unwrap_err();
        assert_eq!(error.code, crate::error::rejection::SN_MISSING);
    }

    #[test]
    fn dump_and_load_round_trip() {
        let envelope = sample("sn-1");
        let dumped = envelope.dump().unwrap();

        let loaded: Envelope<Value> = Envelope::load(dumped.as_bytes()).unwrap();
        assert_eq!(loaded, envelope);
        assert_eq!(loaded.routing, envelope.routing);
    }

    #[test]
    fn unknown_fields_are_preserved_through_a_round_trip() {
        let json = r#"{
            "sn": "sn-1",
            "ts": 0,
            "url": "",
            "window": null,
            "any": null,
            "replyto": null,
            "version": "1.0",
            "routing": ["agent", "plugin"],
            "kind": "request",
            "method": "noop",
            "args": null,
            "future_field": "kept"
        }"#;

        let envelope: Envelope<Value> = Envelope::load(json.as_bytes()).unwrap();
        assert_eq!(
            envelope.unknown.get("future_field"),
            Some(&Value::String("kept".to_string()))
        );

        let dumped = envelope.dump().unwrap();
        assert!(dumped.contains("future_field"));
    }

    #[test]
    fn unknown_holds_only_unrecognized_keys_and_every_key_is_emitted_once() {
        let json = r#"{
            "sn": "sn-1",
            "ts": 0,
            "url": "",
            "window": null,
            "any": null,
            "replyto": null,
            "version": "1.0",
            "routing": ["agent", "plugin"],
            "kind": "request",
            "method": "noop",
            "args": null,
            "future_field": "kept"
        }"#;

        let envelope: Envelope<Value> = Envelope::load(json.as_bytes()).unwrap();

        // Every field the envelope itself recognizes, including the body's
        // own `kind`/`method`/`args`, must be absent from `unknown`.
        for key in [
            "sn", "ts", "url", "window", "any", "replyto", "version", "routing", "kind", "method",
            "args",
        ] {
            assert!(
                !envelope.unknown.contains_key(key),
                "unknown should not contain recognized key '{}'",
                key
            );
        }
        assert_eq!(envelope.unknown.len(), 1);
        assert!(envelope.unknown.contains_key("future_field"));

        let dumped = envelope.dump().unwrap();
        let reparsed: Value = serde_json::from_str(&dumped).unwrap();
        let object = reparsed.as_object().unwrap();

        // `serde_json::Map` is keyed, so a literal duplicate key could only
        // have arisen during encoding by one of the two merges overwriting
        // the other silently; assert the values line up with what was read.
        assert_eq!(object.get("kind"), Some(&Value::String("request".to_string())));
        assert_eq!(object.get("method"), Some(&Value::String("noop".to_string())));
        assert_eq!(object.get("future_field"), Some(&Value::String("kept".to_string())));
        assert_eq!(object.len(), 12);
    }

    #[test]
    fn ts_and_url_default_when_absent() {
        let json = r#"{
            "sn": "sn-1",
            "version": "1.0",
            "routing": ["agent", "plugin"],
            "kind": "request",
            "method": "noop",
            "args": null
        }"#;

        let envelope: Envelope<Value> = Envelope::load(json.as_bytes()).unwrap();
        assert_eq!(envelope.ts, 0);
        assert_eq!(envelope.url, "");
    }

    #[test]
    fn load_rejects_malformed_json() {
        let error = Envelope::<Value>::load(b"not json").unwrap_err();
        assert_eq!(error.code, crate::error::rejection::MALFORMED);
    }

    #[test]
    fn load_reports_malformed_not_sn_missing_for_a_bad_field() {
        let json = r#"{
            "sn": "sn-1",
            "version": "1.0",
            "routing": "not-a-pair",
            "kind": "request",
            "method": "noop",
            "args": null
        }"#;

        let error = Envelope::<Value>::load(json.as_bytes()).unwrap_err();
        assert_eq!(error.code, crate::error::rejection::MALFORMED);
    }
}
