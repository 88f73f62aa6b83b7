//! Events fed into the state machine.
//!
//! An event is an immutable descriptor: a type string used for dispatch and a
//! bag of opaque parameters copied from whatever produced it (usually an
//! inbound datagram).

use std::collections::BTreeMap;
use std::fmt;

/// Opaque parameter value carried by an [`Event`].
pub type Parameter = Vec<u8>;

/// Immutable event descriptor.
///
/// Dispatch only ever looks at [`Event::kind`]; the parameters are passed
/// through untouched to the action of the transition that fires.
///
/// # Example
///
/// ```rust
/// use heli_exchange::core::Event;
///
/// let event = Event::new("DATA").with_parameter("transition", vec![1, 2, 3]);
///
/// assert_eq!(event.kind(), "DATA");
/// assert_eq!(event.parameter("transition"), Some(&[1u8, 2, 3][..]));
/// assert!(event.parameter("missing").is_none());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    kind: String,
    parameters: BTreeMap<String, Parameter>,
}

impl Event {
    /// Create an event without parameters.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            parameters: BTreeMap::new(),
        }
    }

    /// Create an event from a type and a full parameter mapping.
    pub fn with_parameters(kind: impl Into<String>, parameters: BTreeMap<String, Parameter>) -> Self {
        Self {
            kind: kind.into(),
            parameters,
        }
    }

    /// Return a copy of this event with one more parameter.
    pub fn with_parameter(mut self, key: impl Into<String>, value: Parameter) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    /// The event type used for transition lookup.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn parameter(&self, key: &str) -> Option<&[u8]> {
        self.parameters.get(key).map(Vec::as_slice)
    }

    pub fn parameters(&self) -> &BTreeMap<String, Parameter> {
        &self.parameters
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.kind)
    }
}
