use crate::method::HttpMethod;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Text used in place of a method map when a URL accepted nothing.
pub const UNREACHABLE_MESSAGE: &str = "No methods available or URL unreachable.";

/// Why a probe did not count as an accepted method
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unavailable {
    /// Server answered 405 Method Not Allowed
    MethodNotAllowed,
    /// No response before the probe deadline
    Timeout,
    /// Could not connect (refused, DNS, TLS handshake)
    Connect,
    /// Any other request failure
    Request(String),
}

impl fmt::Display for Unavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unavailable::MethodNotAllowed => write!(f, "method not allowed"),
            Unavailable::Timeout => write!(f, "timed out"),
            Unavailable::Connect => write!(f, "connection failed"),
            Unavailable::Request(msg) => write!(f, "request failed: {}", msg),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The server answered with something other than 405
    Status(u16),
    Unavailable(Unavailable),
}

impl ProbeOutcome {
    /// Apply the availability rule to a response status: only 405 means
    /// the method was refused, every other code counts as accepted.
    pub fn from_status(status: u16) -> Self {
        if status == 405 {
            ProbeOutcome::Unavailable(Unavailable::MethodNotAllowed)
        } else {
            ProbeOutcome::Status(status)
        }
    }
}

/// Outcome of probing one method against one URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodResult {
    pub method: HttpMethod,
    pub outcome: ProbeOutcome,
}

impl MethodResult {
    pub fn new(method: HttpMethod, outcome: ProbeOutcome) -> Self {
        Self { method, outcome }
    }

    pub fn status(&self) -> Option<u16> {
        match self.outcome {
            ProbeOutcome::Status(code) => Some(code),
            ProbeOutcome::Unavailable(_) => None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.status().is_some()
    }
}

/// Accepted methods of a URL and the status each one returned.
///
/// Never empty; a URL with no accepted method is `ScanOutcome::Unreachable`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UrlReport {
    methods: BTreeMap<HttpMethod, u16>,
}

impl UrlReport {
    pub fn get(&self, method: HttpMethod) -> Option<u16> {
        self.methods.get(&method).copied()
    }

    pub fn contains(&self, method: HttpMethod) -> bool {
        self.methods.contains_key(&method)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (HttpMethod, u16)> + '_ {
        self.methods.iter().map(|(method, status)| (*method, *status))
    }
}

/// Result of scanning one eligible URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Methods(UrlReport),
    Unreachable,
}

impl ScanOutcome {
    /// Fold probe results into an outcome. Unavailable probes are dropped;
    /// if nothing is left the URL is unreachable.
    pub fn from_results<I>(results: I) -> Self
    where
        I: IntoIterator<Item = MethodResult>,
    {
        let methods: BTreeMap<HttpMethod, u16> = results
            .into_iter()
            .filter_map(|result| result.status().map(|status| (result.method, status)))
            .collect();

        if methods.is_empty() {
            ScanOutcome::Unreachable
        } else {
            ScanOutcome::Methods(UrlReport { methods })
        }
    }

    pub fn report(&self) -> Option<&UrlReport> {
        match self {
            ScanOutcome::Methods(report) => Some(report),
            ScanOutcome::Unreachable => None,
        }
    }

    pub fn is_unreachable(&self) -> bool {
        matches!(self, ScanOutcome::Unreachable)
    }
}

impl Serialize for ScanOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ScanOutcome::Methods(report) => report.serialize(serializer),
            ScanOutcome::Unreachable => serializer.serialize_str(UNREACHABLE_MESSAGE),
        }
    }
}

impl<'de> Deserialize<'de> for ScanOutcome {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Methods(BTreeMap<HttpMethod, u16>),
            Message(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Methods(methods) if methods.is_empty() => Ok(ScanOutcome::Unreachable),
            Repr::Methods(methods) => Ok(ScanOutcome::Methods(UrlReport { methods })),
            Repr::Message(msg) if msg == UNREACHABLE_MESSAGE => Ok(ScanOutcome::Unreachable),
            Repr::Message(msg) => Err(serde::de::Error::custom(format!(
                "unexpected scan outcome: {}",
                msg
            ))),
        }
    }
}
