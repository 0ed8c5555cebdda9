//! Backend instance value.

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// One addressable replica of a downstream service.
///
/// Immutable once registered; the registry only ever hands out clones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceInstance {
    /// Logical service name (e.g. `account_service`).
    pub name: String,
    /// Hostname or IP address.
    pub host: String,
    /// TCP port.
    pub port: u16,
}

impl ServiceInstance {
    pub fn new(name: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port,
        }
    }

    /// `host:port`, as used in request URIs.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Absolute URL for a request path (including query) on this instance.
    pub fn url_for(&self, path_and_query: &str) -> Result<Url, url::ParseError> {
        Url::parse(&format!("http://{}", self.authority()))?.join(path_and_query)
    }
}

impl fmt::Display for ServiceInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.name, self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_keeps_path_and_query() {
        let instance = ServiceInstance::new("account_service", "127.0.0.1", 5000);
        let url = instance.url_for("/accounts/a1/balance?verbose=1").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:5000/accounts/a1/balance?verbose=1");
    }

    #[test]
    fn deserializes_inventory_record() {
        let instance: ServiceInstance =
            serde_json::from_str(r#"{"name":"template_service","host":"template_service","port":5005}"#)
                .unwrap();
        assert_eq!(instance, ServiceInstance::new("template_service", "template_service", 5005));
        assert_eq!(instance.to_string(), "template_service@template_service:5005");
    }
}
