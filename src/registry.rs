use std::collections::HashMap;
use std::path::PathBuf;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::context::Options;
use crate::declarations::ContextDeclarations;
use crate::path::{self, ConfigKey};
use crate::router::{FsProbe, GroupAttributes, RouteProbe, RouteSource, Router};
use crate::settings::SettingsSource;

#[derive(Debug, Default)]
struct State {
    active: Option<String>,
    configs: HashMap<String, Map<String, Value>>,
}

/// Tracks the declared contexts, which one is active, and each context's
/// configuration.
///
/// Declarations are read from the settings source once and memoised.
/// Configurations are loaded lazily per context and cached for the life of
/// the registry. Switching the active context publishes its configuration
/// to the settings source under [`Options::active_slot_key`].
pub struct ContextRegistry<S: SettingsSource> {
    settings: S,
    options: Options,
    declared: OnceCell<ContextDeclarations>,
    state: Mutex<State>,
    api_routes: RouteSource,
    probe: Box<dyn RouteProbe>,
}

impl<S: SettingsSource> ContextRegistry<S> {
    pub fn new(settings: S) -> Self {
        let options = Options::default();
        let api_routes = RouteSource::named(options.api_namespace.clone());
        Self {
            settings,
            options,
            declared: OnceCell::new(),
            state: Mutex::new(State::default()),
            api_routes,
            probe: Box::new(FsProbe),
        }
    }

    pub fn with_options(mut self, options: Options) -> Self {
        if let RouteSource::Named(name) = &self.api_routes {
            if *name == self.options.api_namespace {
                self.api_routes = RouteSource::named(options.api_namespace.clone());
            }
        }
        self.options = options;
        self
    }

    /// Route source registered in every context's API group.
    pub fn with_api_routes(mut self, routes: RouteSource) -> Self {
        self.api_routes = routes;
        self
    }

    pub fn with_probe<P: RouteProbe + 'static>(mut self, probe: P) -> Self {
        self.probe = Box::new(probe);
        self
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn settings(&self) -> &S {
        &self.settings
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    /// All declared contexts. Read from the settings source on first call
    /// only; later changes to the source are not observed.
    pub fn declared(&self) -> &ContextDeclarations {
        self.declared.get_or_init(|| {
            let raw = self.settings.read(&self.options.declarations_key);
            let declared = ContextDeclarations::from_value(&raw);
            debug!(key = %self.options.declarations_key, count = declared.len(), "context declarations loaded");
            declared
        })
    }

    pub fn enabled(&self) -> ContextDeclarations {
        self.declared().enabled()
    }

    fn is_readable(&self, name: &str) -> bool {
        name == self.options.default_context || self.declared().contains(name)
    }

    // ------------------------------------------------------------------
    // Active context
    // ------------------------------------------------------------------

    /// Make `name` the active context and publish its configuration.
    ///
    /// `None` or an empty name selects the default context. Both steps run
    /// under one lock.
    pub fn switch_to(&self, name: Option<&str>) {
        // Declarations live under the active slot; capture them before the
        // first publish overwrites it.
        self.declared();

        let name = non_empty(name);
        let mut state = self.state.lock();
        state.active = name.map(str::to_string);

        // The slot's original contents are the configuration of the context
        // sharing its name.
        self.load(&mut state, &self.options.active_slot_key);
        let effective = name.unwrap_or(self.options.default_context.as_str());
        let config = self.load(&mut state, effective).clone();
        self.settings
            .write(&self.options.active_slot_key, Value::Object(config));
        debug!(context = effective, "switched active context");
    }

    /// Set the active name without publishing its configuration.
    pub fn set_active_name(&self, name: Option<&str>) {
        self.state.lock().active = non_empty(name).map(str::to_string);
    }

    /// Active context name, or the default when none is set.
    pub fn active_name(&self) -> String {
        self.state
            .lock()
            .active
            .clone()
            .unwrap_or_else(|| self.options.default_context.clone())
    }

    /// Switch to `name` until the returned guard drops, then switch back to
    /// whatever was active before.
    pub fn enter(&self, name: Option<&str>) -> ContextGuard<'_, S> {
        let previous = self.state.lock().active.clone();
        self.switch_to(name);
        ContextGuard {
            registry: self,
            restore: previous,
        }
    }

    /// Run `f` with `name` active, restoring the previous context afterwards.
    pub fn with_context<T>(&self, name: Option<&str>, f: impl FnOnce(&Self) -> T) -> T {
        let _guard = self.enter(name);
        f(self)
    }

    fn resolve(&self, name: Option<&str>) -> String {
        match non_empty(name) {
            Some(n) => n.to_string(),
            None => self.active_name(),
        }
    }

    // ------------------------------------------------------------------
    // Naming
    // ------------------------------------------------------------------

    /// `"dcat.<name>."`, for the given name or the active context.
    pub fn route_prefix(&self, name: Option<&str>) -> String {
        self.options.route_prefix(&self.resolve(name))
    }

    /// `"dcat.<name>.dcat-api."`, for the given name or the active context.
    pub fn api_route_prefix(&self, name: Option<&str>) -> String {
        self.options.api_route_prefix(&self.resolve(name))
    }

    pub fn active_api_route_prefix(&self) -> String {
        self.api_route_prefix(None)
    }

    /// Full route name of `route` in the active context.
    pub fn route_name(&self, route: &str) -> String {
        format!("{}{}", self.route_prefix(None), route)
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    fn load<'a>(&self, state: &'a mut State, name: &str) -> &'a Map<String, Value> {
        state.configs.entry(name.to_string()).or_insert_with(|| {
            debug!(context = name, "loading context configuration");
            path::into_mapping(self.settings.read(name))
        })
    }

    /// Value at `key` in the active context's configuration, or `default`.
    pub fn config_value(&self, key: impl Into<ConfigKey>, default: Value) -> Value {
        let name = self.active_name();
        self.context_config_value(&name, key, default)
    }

    /// Replace the active context's configuration wholesale.
    pub fn replace_config(&self, config: Map<String, Value>) {
        let name = self.active_name();
        self.replace_context_config(&name, config);
    }

    /// Value at `key` in `name`'s configuration, or `default`.
    ///
    /// Contexts that are not declared read as empty. The default context is
    /// always readable.
    pub fn context_config_value(&self, name: &str, key: impl Into<ConfigKey>, default: Value) -> Value {
        let key = key.into();
        if !self.is_readable(name) {
            trace!(context = name, ?key, "undeclared context; returning default");
            return default;
        }
        let mut state = self.state.lock();
        let config = self.load(&mut state, name);
        let value = path::get(config, &key).cloned();
        trace!(context = name, ?key, found = value.is_some(), "config lookup");
        value.unwrap_or(default)
    }

    /// Replace `name`'s configuration wholesale.
    ///
    /// Accepted for any name, declared or not. The mapping is also written
    /// to the settings source under the context's name, and republished to
    /// the active slot when `name` is the active context.
    pub fn replace_context_config(&self, name: &str, config: Map<String, Value>) {
        self.declared();
        let mut state = self.state.lock();
        // Cache the slot's original contents before it can be overwritten.
        self.load(&mut state, &self.options.active_slot_key);
        let value = Value::Object(config.clone());
        state.configs.insert(name.to_string(), config);
        self.settings.write(name, value.clone());

        let active = state.active.as_deref().unwrap_or(self.options.default_context.as_str());
        if active == name {
            self.settings.write(&self.options.active_slot_key, value);
        }
        debug!(context = name, "context configuration replaced");
    }

    /// Whether `name`'s configuration has been loaded or set.
    pub fn is_cached(&self, name: &str) -> bool {
        self.state.lock().configs.contains_key(name)
    }

    // ------------------------------------------------------------------
    // Route registration
    // ------------------------------------------------------------------

    /// Group parameters for `name`, or for the active context.
    pub fn group_attributes(&self, name: Option<&str>) -> GroupAttributes {
        let name = self.resolve(name);
        let domain = self.settings.read(&self.options.domain_key(&name));
        let domain = match domain {
            Value::String(s) if !s.is_empty() && s != "0" => Some(s),
            _ => None,
        };
        GroupAttributes {
            middleware: self.options.middleware(&name),
            domain,
            alias: self.options.route_prefix(&name),
        }
    }

    /// Register `routes` in a group bound to `name` (or the active context).
    pub fn load_routes<R: Router>(&self, router: &mut R, routes: &RouteSource, name: Option<&str>) -> Result<(), R::Error> {
        let attributes = self.group_attributes(name);
        debug!(
            alias = %attributes.alias,
            middleware = %attributes.middleware,
            domain = ?attributes.domain,
            source = %routes.describe(),
            "registering route group"
        );
        router.group(attributes, routes)
    }

    /// Where the active context's own route file would live.
    ///
    /// Reads `directory` from the published active slot, so it only follows
    /// contexts selected with [`switch_to`](Self::switch_to), not
    /// [`set_active_name`](Self::set_active_name).
    pub fn routes_path(&self) -> PathBuf {
        let key = format!("{}.directory", self.options.active_slot_key);
        let dir = match self.settings.read(&key) {
            Value::String(s) if !s.is_empty() => PathBuf::from(s),
            _ => self.options.base_directory.clone(),
        };
        dir.join(&self.options.routes_file)
    }

    /// Switch to `name` and register its API routes, plus its route file
    /// when one exists.
    pub fn register_context<R: Router>(&self, router: &mut R, name: Option<&str>) -> Result<(), R::Error> {
        self.switch_to(name);
        let name = self.active_name();

        self.load_routes(router, &self.api_routes, Some(name.as_str()))?;

        let routes = self.routes_path();
        if self.probe.exists(&routes) {
            self.load_routes(router, &RouteSource::File(routes), Some(name.as_str()))?;
        } else {
            trace!(context = %name, path = %routes.display(), "no route file");
        }
        Ok(())
    }

    /// Boot: register the default context, then every enabled declared
    /// context, and leave the default context active.
    pub fn register_all_enabled<R: Router>(&self, router: &mut R) -> Result<(), R::Error> {
        let default = self.options.default_context.clone();
        let _restore = self.restore_on_exit(&default);

        self.register_context(router, Some(default.as_str()))?;
        for (name, _) in self.enabled().iter() {
            self.register_context(router, Some(name))?;
        }
        Ok(())
    }

    /// Register `routes` under the default context and again under every
    /// enabled declared context, leaving the default context active.
    pub fn register_across_contexts<R: Router>(&self, router: &mut R, routes: &RouteSource) -> Result<(), R::Error> {
        let default = self.options.default_context.clone();
        self.load_routes(router, routes, Some(default.as_str()))?;

        if self.declared().is_empty() {
            return Ok(());
        }
        let _restore = self.restore_on_exit(&default);
        for (name, _) in self.enabled().iter() {
            self.switch_to(Some(name));
            self.load_routes(router, routes, Some(name))?;
        }
        Ok(())
    }

    fn restore_on_exit(&self, name: &str) -> ContextGuard<'_, S> {
        ContextGuard {
            registry: self,
            restore: Some(name.to_string()),
        }
    }
}

/// Restores an earlier active context when dropped.
#[must_use = "the previous context is restored as soon as the guard drops"]
pub struct ContextGuard<'a, S: SettingsSource> {
    registry: &'a ContextRegistry<S>,
    restore: Option<String>,
}

impl<S: SettingsSource> Drop for ContextGuard<'_, S> {
    fn drop(&mut self) {
        self.registry.switch_to(self.restore.as_deref());
    }
}

fn non_empty(name: Option<&str>) -> Option<&str> {
    name.filter(|n| !n.is_empty())
}
