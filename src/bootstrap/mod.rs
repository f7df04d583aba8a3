//! Startup plumbing: HTTP bootstrap, CLI command registry, route registry.

pub mod app_bootstrap;
pub mod command_registry;
pub mod route_registry;
