use std::convert::Infallible;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

/// Callback that defines routes inside a group.
pub type RouteCallback = Arc<dyn Fn(&GroupAttributes) + Send + Sync>;

/// Parameters of one route group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupAttributes {
    /// Middleware bound to the group, e.g. `admin.app:shop`.
    pub middleware: String,
    /// Host the group is restricted to, if the context configures one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Route name prefix, e.g. `dcat.shop.`.
    #[serde(rename = "as")]
    pub alias: String,
}

/// What a route group is filled from.
#[derive(Clone)]
pub enum RouteSource {
    /// A route-definition file the router knows how to read.
    File(PathBuf),
    /// A well-known route set the router resolves by name.
    Named(String),
    Callback(RouteCallback),
}

impl RouteSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        RouteSource::File(path.into())
    }

    pub fn named(name: impl Into<String>) -> Self {
        RouteSource::Named(name.into())
    }

    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&GroupAttributes) + Send + Sync + 'static,
    {
        RouteSource::Callback(Arc::new(f))
    }

    /// Short human-readable description, used in logs and plans.
    pub fn describe(&self) -> String {
        match self {
            RouteSource::File(p) => format!("file:{}", p.display()),
            RouteSource::Named(n) => format!("named:{n}"),
            RouteSource::Callback(_) => "callback".to_string(),
        }
    }
}

impl fmt::Debug for RouteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Route registration backend.
///
/// The registry never inspects or wraps `Error`; a failing group is returned
/// to the caller as-is.
pub trait Router {
    type Error;

    fn group(&mut self, attributes: GroupAttributes, routes: &RouteSource) -> Result<(), Self::Error>;
}

/// Existence check for per-context route files.
pub trait RouteProbe: Send + Sync {
    fn exists(&self, path: &Path) -> bool;
}

/// Probes the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsProbe;

impl RouteProbe for FsProbe {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}

impl<F> RouteProbe for F
where
    F: Fn(&Path) -> bool + Send + Sync,
{
    fn exists(&self, path: &Path) -> bool {
        self(path)
    }
}

/// A group as seen by [`RecordingRouter`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordedGroup {
    #[serde(flatten)]
    pub attributes: GroupAttributes,
    pub source: String,
}

/// Router that keeps every group it is given, in order.
///
/// Callbacks are invoked with the group attributes, the way a real router
/// runs them inside the group scope.
#[derive(Debug, Default)]
pub struct RecordingRouter {
    groups: Vec<RecordedGroup>,
}

impl RecordingRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn groups(&self) -> &[RecordedGroup] {
        &self.groups
    }

    /// Aliases of all recorded groups, in registration order.
    pub fn aliases(&self) -> Vec<&str> {
        self.groups.iter().map(|g| g.attributes.alias.as_str()).collect()
    }
}

impl Router for RecordingRouter {
    type Error = Infallible;

    fn group(&mut self, attributes: GroupAttributes, routes: &RouteSource) -> Result<(), Infallible> {
        if let RouteSource::Callback(cb) = routes {
            cb(&attributes);
        }
        self.groups.push(RecordedGroup {
            attributes,
            source: routes.describe(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn attrs(alias: &str) -> GroupAttributes {
        GroupAttributes {
            middleware: "admin.app:shop".into(),
            domain: None,
            alias: alias.into(),
        }
    }

    #[test]
    fn recording_router_runs_callbacks() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let source = RouteSource::callback(move |a| {
            assert_eq!(a.alias, "dcat.shop.");
            seen.fetch_add(1, Ordering::SeqCst);
        });

        let mut router = RecordingRouter::new();
        router.group(attrs("dcat.shop."), &source).unwrap();
        router.group(attrs("dcat.crm."), &RouteSource::file("app/routes.toml")).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(router.aliases(), vec!["dcat.shop.", "dcat.crm."]);
        assert_eq!(router.groups()[1].source, "file:app/routes.toml");
    }

    #[test]
    fn attributes_serialise_without_empty_domain() {
        let json = serde_json::to_value(attrs("dcat.shop.")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"middleware": "admin.app:shop", "as": "dcat.shop."})
        );
    }

    #[test]
    fn closure_probe() {
        let probe = |p: &Path| p.ends_with("routes.toml");
        assert!(probe.exists(Path::new("app/Admin/routes.toml")));
        assert!(!FsProbe.exists(Path::new("definitely/not/here.toml")));
    }
}
