use serde::de::{Error as DeError, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::Formatter;
use std::time::{Duration, SystemTime};
use strut_factory::impl_deserialize_field;

/// A half-open interval `[begin, begin + duration)` during which an
/// [`Envelope`](crate::Envelope) is eligible for execution.
///
/// Encoded on the wire as `{"begin": <ISO-8601 timestamp>, "duration": <seconds>}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    begin: SystemTime,
    duration: Duration,
}

impl Window {
    /// Creates a new window starting at `begin` and lasting `duration`.
    pub fn new(begin: SystemTime, duration: Duration) -> Self {
        Self { begin, duration }
    }

    /// Reports the start of this window.
    pub fn begin(&self) -> SystemTime {
        self.begin
    }

    /// Reports the duration of this window.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Reports the (exclusive) end of this window: `begin + duration`.
    pub fn end(&self) -> SystemTime {
        self.begin + self.duration
    }

    /// Reports whether this window has not yet opened as of `now`.
    pub fn is_future(&self, now: SystemTime) -> bool {
        self.begin > now
    }

    /// Reports whether this window has already closed as of `now`.
    pub fn is_past(&self, now: SystemTime) -> bool {
        now >= self.end()
    }

    /// Reports whether `now` falls within `[begin, end)`.
    pub fn is_open(&self, now: SystemTime) -> bool {
        !self.is_future(now) && !self.is_past(now)
    }
}

/// Reports whether the given (optional) window has not yet opened as of `now`.
///
/// A `None` window is always open, so it is never future.
pub fn future(window: Option<&Window>, now: SystemTime) -> bool {
    window.is_some_and(|window| window.is_future(now))
}

/// Reports whether the given (optional) window has already closed as of `now`.
///
/// A `None` window is always open, so it is never past.
pub fn past(window: Option<&Window>, now: SystemTime) -> bool {
    window.is_some_and(|window| window.is_past(now))
}

impl Serialize for Window {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let begin = humantime::format_rfc3339_seconds(self.begin).to_string();
        let duration = self.duration.as_secs();

        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("begin", &begin)?;
        map.serialize_entry("duration", &duration)?;
        map.end()
    }
}

const _: () = {
    impl<'de> Deserialize<'de> for Window {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_map(WindowVisitor)
        }
    }

    struct WindowVisitor;

    impl<'de> Visitor<'de> for WindowVisitor {
        type Value = Window;

        fn expecting(&self, formatter: &mut Formatter) -> std::fmt::Result {
            formatter.write_str("a map with 'begin' (ISO-8601) and 'duration' (seconds)")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut begin: Option<String> = None;
            let mut duration: Option<u64> = None;

            while let Some(key) = map.next_key()? {
                match key {
                    WindowField::begin => key.poll(&mut map, &mut begin)?,
                    WindowField::duration => key.poll(&mut map, &mut duration)?,
                    WindowField::__ignore => map.next_value()?,
                };
            }

            let begin = begin.ok_or_else(|| A::Error::missing_field("begin"))?;
            let duration = duration.ok_or_else(|| A::Error::missing_field("duration"))?;

            let begin = humantime::parse_rfc3339_weak(&begin).map_err(|error| {
                A::Error::custom(format!("invalid 'begin' timestamp '{}': {}", begin, error))
            })?;

            Ok(Window {
                begin,
                duration: Duration::from_secs(duration),
            })
        }
    }

    impl_deserialize_field!(
        WindowField,
        strut_deserialize::Slug::eq_as_slugs,
        begin,
        duration,
    );
};

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn at(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn nil_window_is_never_future_or_past() {
        assert!(!future(None, at(0)));
        assert!(!past(None, at(0)));
    }

    #[test]
    fn future_window() {
        let window = Window::new(at(100), Duration::from_secs(60));

        assert!(future(Some(&window), at(50)));
        assert!(!past(Some(&window), at(50)));
        assert!(!window.is_open(at(50)));
    }

    #[test]
    fn open_window() {
        let window = Window::new(at(100), Duration::from_secs(60));

        assert!(!future(Some(&window), at(130)));
        assert!(!past(Some(&window), at(130)));
        assert!(window.is_open(at(130)));
    }

    #[test]
    fn past_window_is_half_open_at_the_end() {
        let window = Window::new(at(100), Duration::from_secs(60));

        // Exactly at `begin + duration`: this is past, not open (half-open interval).
        assert!(past(Some(&window), at(160)));
        assert!(!future(Some(&window), at(160)));
        assert!(!window.is_open(at(160)));
    }

    #[test]
    fn deserialize_round_trip() {
        let json = r#"{"begin": "2024-01-01T00:00:00Z", "duration": 60}"#;
        let window: Window = serde_json::from_str(json).unwrap();

        assert_eq!(window.duration(), Duration::from_secs(60));

        let encoded = serde_json::to_string(&window).unwrap();
        let round_tripped: Window = serde_json::from_str(&encoded).unwrap();

        assert_eq!(round_tripped, window);
    }
}
