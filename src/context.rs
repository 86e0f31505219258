use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Name of the context that is always available, declared or not.
pub const DEFAULT_CONTEXT: &str = "admin";

/// Naming conventions and settings keys used by the registry.
///
/// The defaults reproduce the route naming `dcat.<name>.` and
/// `dcat.<name>.dcat-api.`; a settings file may override any field under a
/// `registry` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Context used when nothing is active.
    pub default_context: String,
    /// First segment of every route alias.
    pub route_namespace: String,
    /// Segment appended to the route alias for API groups.
    pub api_namespace: String,
    /// Settings key holding the `name -> enabled` declarations.
    pub declarations_key: String,
    /// Settings key the active context's configuration is published under.
    pub active_slot_key: String,
    /// Middleware parameter prefix; the context name is appended.
    pub middleware_prefix: String,
    /// File name of a context's own route definitions.
    pub routes_file: String,
    /// Where to look for `routes_file` when the context sets no `directory`.
    pub base_directory: PathBuf,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            default_context: DEFAULT_CONTEXT.to_string(),
            route_namespace: "dcat".to_string(),
            api_namespace: "dcat-api".to_string(),
            declarations_key: "admin.multi_app".to_string(),
            active_slot_key: "admin".to_string(),
            middleware_prefix: "admin.app:".to_string(),
            routes_file: "routes.toml".to_string(),
            base_directory: PathBuf::from("."),
        }
    }
}

impl Options {
    /// `"<namespace>.<name>."`
    pub fn route_prefix(&self, name: &str) -> String {
        format!("{}.{}.", self.route_namespace, name)
    }

    /// `"<namespace>.<name>.<api-namespace>."`
    pub fn api_route_prefix(&self, name: &str) -> String {
        format!("{}{}.", self.route_prefix(name), self.api_namespace)
    }

    pub fn middleware(&self, name: &str) -> String {
        format!("{}{}", self.middleware_prefix, name)
    }

    /// Settings key of a context's route domain override.
    pub fn domain_key(&self, name: &str) -> String {
        format!("{name}.route.domain")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_naming() {
        let opts = Options::default();
        assert_eq!(opts.route_prefix("foo"), "dcat.foo.");
        assert_eq!(opts.api_route_prefix("admin"), "dcat.admin.dcat-api.");
        assert_eq!(opts.middleware("tenant"), "admin.app:tenant");
        assert_eq!(opts.domain_key("tenant"), "tenant.route.domain");
    }

    #[test]
    fn partial_override_keeps_defaults() {
        let opts: Options =
            serde_json::from_str(r#"{"route_namespace": "shop"}"#).unwrap();
        assert_eq!(opts.route_prefix("a"), "shop.a.");
        assert_eq!(opts.default_context, "admin");
    }
}
