//! Node runtime: identity, uptime and per-service health
//!
//! Services hosted on the node report their own state here; `health`
//! aggregates it into the structure returned by `GET /health` and the
//! `decks.health` action.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::RwLock;
use std::time::Instant;

pub const CLIENT_TYPE: &str = "rust";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Degraded,
}

/// State reported by one hosted service
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceHealth {
    pub status: HealthStatus,
    pub details: Value,
}

impl ServiceHealth {
    pub fn ok(details: Value) -> Self {
        Self {
            status: HealthStatus::Ok,
            details,
        }
    }

    pub fn degraded(details: Value) -> Self {
        Self {
            status: HealthStatus::Degraded,
            details,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessInfo {
    pub pid: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OsInfo {
    pub platform: &'static str,
    pub arch: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientInfo {
    #[serde(rename = "type")]
    pub client_type: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeInfo {
    pub utc: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuntimeHealth {
    pub node_id: String,
    pub status: HealthStatus,
    pub uptime_secs: u64,
    pub process: ProcessInfo,
    pub os: OsInfo,
    pub client: ClientInfo,
    pub time: TimeInfo,
    pub services: BTreeMap<String, ServiceHealth>,
}

#[derive(Debug)]
pub struct NodeRuntime {
    node_id: String,
    started: Instant,
    services: RwLock<BTreeMap<String, ServiceHealth>>,
}

impl NodeRuntime {
    /// Runtime for `node_id`; an empty id becomes `decks-<pid>`
    pub fn new(node_id: &str) -> Self {
        let node_id = if node_id.trim().is_empty() {
            format!("decks-{}", std::process::id())
        } else {
            node_id.trim().to_string()
        };
        Self {
            node_id,
            started: Instant::now(),
            services: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Record the current state of a hosted service
    pub fn report(&self, service: &str, health: ServiceHealth) {
        if let Ok(mut services) = self.services.write() {
            services.insert(service.to_string(), health);
        }
    }

    pub fn service_health(&self, service: &str) -> Option<ServiceHealth> {
        self.services
            .read()
            .ok()
            .and_then(|services| services.get(service).cloned())
    }

    pub fn health(&self) -> RuntimeHealth {
        let services = self
            .services
            .read()
            .map(|s| s.clone())
            .unwrap_or_default();
        let status = if services
            .values()
            .any(|s| s.status == HealthStatus::Degraded)
        {
            HealthStatus::Degraded
        } else {
            HealthStatus::Ok
        };
        let now = chrono::Utc::now();

        RuntimeHealth {
            node_id: self.node_id.clone(),
            status,
            uptime_secs: self.started.elapsed().as_secs(),
            process: ProcessInfo {
                pid: std::process::id(),
            },
            os: OsInfo {
                platform: std::env::consts::OS,
                arch: std::env::consts::ARCH,
            },
            client: ClientInfo {
                client_type: CLIENT_TYPE,
                version: env!("CARGO_PKG_VERSION"),
            },
            time: TimeInfo {
                utc: now.to_rfc3339(),
                timestamp: now.timestamp_millis(),
            },
            services,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_blank_node_id_is_generated() {
        let runtime = NodeRuntime::new("  ");
        assert!(runtime.node_id().starts_with("decks-"));
        assert_eq!(NodeRuntime::new("node-1").node_id(), "node-1");
    }

    #[test]
    fn test_degraded_service_degrades_node() {
        let runtime = NodeRuntime::new("node-1");
        runtime.report("decks", ServiceHealth::ok(json!({})));
        assert_eq!(runtime.health().status, HealthStatus::Ok);

        runtime.report("decks", ServiceHealth::degraded(json!({"reason": "x"})));
        let health = runtime.health();
        assert_eq!(health.status, HealthStatus::Degraded);
        assert_eq!(health.services.len(), 1);
    }

    #[test]
    fn test_wire_shape() {
        let runtime = NodeRuntime::new("node-1");
        let value = serde_json::to_value(runtime.health()).unwrap();

        assert_eq!(value["node_id"], "node-1");
        assert_eq!(value["status"], "ok");
        assert_eq!(value["client"]["type"], "rust");
        assert!(value["process"]["pid"].is_u64());
        assert!(value["time"]["timestamp"].is_i64());
        assert!(value["os"]["platform"].is_string());
    }
}
