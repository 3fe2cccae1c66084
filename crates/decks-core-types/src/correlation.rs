//! Correlation types carried across action calls
//!
//! Every inbound action gets a [`RequestContext`]. The request id is taken
//! from the caller when present (so a call chain shares one id) and minted
//! otherwise.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! correlation_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Mint a fresh id (UUIDv7, time ordered)
            pub fn new() -> Self {
                Self(Uuid::now_v7().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Adopt an id supplied by a caller
            pub fn from_string(s: String) -> Self {
                Self(s)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

correlation_id!(
    /// Identifier of a single action call
    RequestId
);

correlation_id!(
    /// Identifier shared by every call in one distributed call chain
    TraceId
);

/// Context attached to one action invocation
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub request_id: RequestId,
    pub trace_id: Option<TraceId>,
    /// Name of the calling node or service, if it identified itself
    pub caller: Option<String>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context from optional caller-supplied ids.
    ///
    /// Blank ids are treated as absent.
    pub fn from_parts(
        request_id: Option<&str>,
        trace_id: Option<&str>,
        caller: Option<&str>,
    ) -> Self {
        let non_blank = |s: Option<&str>| {
            s.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        Self {
            request_id: non_blank(request_id)
                .map(RequestId::from_string)
                .unwrap_or_default(),
            trace_id: non_blank(trace_id).map(TraceId::from_string),
            caller: non_blank(caller),
        }
    }

    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_ids_are_unique() {
        let id1 = RequestId::new();
        let id2 = RequestId::new();

        assert_ne!(id1, id2);
        assert!(!id1.as_str().is_empty());
    }

    #[test]
    fn test_display_matches_inner() {
        let id = TraceId::from_string("trace-1".to_string());
        assert_eq!(id.to_string(), "trace-1");
    }

    #[test]
    fn test_from_parts_adopts_caller_ids() {
        let ctx = RequestContext::from_parts(Some("req-9"), Some("trace-9"), Some("cards"));

        assert_eq!(ctx.request_id.as_str(), "req-9");
        assert_eq!(ctx.trace_id.unwrap().as_str(), "trace-9");
        assert_eq!(ctx.caller.as_deref(), Some("cards"));
    }

    #[test]
    fn test_from_parts_mints_when_blank() {
        let ctx = RequestContext::from_parts(Some("   "), None, Some(""));

        assert!(!ctx.request_id.as_str().trim().is_empty());
        assert!(ctx.trace_id.is_none());
        assert!(ctx.caller.is_none());
    }

    #[test]
    fn test_serializes_transparently() {
        let id = RequestId::from_string("abc".to_string());
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"abc\"");

        let back: RequestId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
