//! Module kê khai BHXH/BHYT.
//!
//! Batch lifecycle, declaration records, duplicate detection, amount
//! calculation, search and history.

pub mod amount;
pub mod cmd;
pub mod controller;
pub mod models;
pub mod repo;
pub mod routes;
pub mod service;
pub mod validate;

use crate::register_route;

/// Đăng ký route của module với registry toàn cục.
pub fn register_declaration_routes() {
    register_route!(
        "declaration",
        "Quản lý đợt kê khai và hồ sơ tham gia BHXH/BHYT",
        "declaration",
        routes::configure_declaration_routes
    );
}

/// Đăng ký lệnh CLI của module.
pub fn register_declaration_commands() {
    crate::bootstrap::command_registry::register_module(Box::new(cmd::DeclarationCommands));
}
