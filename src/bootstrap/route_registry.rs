use actix_web::web;
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::RwLock;

/// Route configuration function type.
pub type RouteConfigFn = fn(&mut web::ServiceConfig);

/// One registered route group.
#[derive(Debug, Clone)]
pub struct RouteInfo {
    pub name: String,
    pub description: String,
    pub module: String,
    pub config_fn: RouteConfigFn,
}

/// Global route registry. Modules register their route groups during
/// startup; the bootstrap applies them all to the actix `ServiceConfig`.
#[derive(Debug, Default)]
pub struct RouteRegistry {
    routes: HashMap<String, RouteInfo>,
}

impl RouteRegistry {
    pub fn register_route(&mut self, route_info: RouteInfo) {
        self.routes.insert(route_info.name.clone(), route_info);
    }

    pub fn configure_all_routes(&self, cfg: &mut web::ServiceConfig) {
        for route_info in self.routes.values() {
            (route_info.config_fn)(cfg);
        }
    }

    pub fn modules(&self) -> Vec<String> {
        let mut modules: Vec<String> = self
            .routes
            .values()
            .map(|route| route.module.clone())
            .collect::<std::collections::HashSet<_>>()
            .into_iter()
            .collect();
        modules.sort();
        modules
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

lazy_static! {
    static ref GLOBAL_ROUTE_REGISTRY: RwLock<RouteRegistry> = RwLock::new(RouteRegistry::default());
}

pub fn register_global_route(route_info: RouteInfo) {
    let mut registry = GLOBAL_ROUTE_REGISTRY.write().unwrap();
    registry.register_route(route_info);
}

pub fn configure_global_routes(cfg: &mut web::ServiceConfig) {
    let registry = GLOBAL_ROUTE_REGISTRY.read().unwrap();
    registry.configure_all_routes(cfg);
}

pub fn global_routes_stats() -> (usize, Vec<String>) {
    let registry = GLOBAL_ROUTE_REGISTRY.read().unwrap();
    (registry.len(), registry.modules())
}

/// Convenience macro: register a route group with the global registry.
#[macro_export]
macro_rules! register_route {
    ($name:expr, $description:expr, $module:expr, $config_fn:expr) => {
        $crate::bootstrap::route_registry::register_global_route(
            $crate::bootstrap::route_registry::RouteInfo {
                name: $name.to_string(),
                description: $description.to_string(),
                module: $module.to_string(),
                config_fn: $config_fn,
            },
        );
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_cfg: &mut web::ServiceConfig) {}

    #[test]
    fn test_registry_tracks_modules() {
        let mut registry = RouteRegistry::default();
        registry.register_route(RouteInfo {
            name: "batches".to_string(),
            description: "batch lifecycle".to_string(),
            module: "declaration".to_string(),
            config_fn: noop,
        });
        registry.register_route(RouteInfo {
            name: "records".to_string(),
            description: "declaration records".to_string(),
            module: "declaration".to_string(),
            config_fn: noop,
        });
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.modules(), vec!["declaration".to_string()]);
    }
}
