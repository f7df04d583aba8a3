//! Cổng tiếp nhận hồ sơ kê khai BHXH/BHYT.
//!
//! Employees create declaration batches and participant records; reviewers
//! approve, track payment and completion. See the `declaration` module for
//! the domain logic.

pub mod auth;
pub mod bootstrap;
pub mod cmd;
pub mod comm;
pub mod db;
pub mod error;
pub mod modules;
pub mod response;

/// Đăng ký lệnh CLI của tất cả các module.
pub fn init_commands() {
    modules::declaration::register_declaration_commands();
}

/// Đăng ký route của tất cả các module.
pub fn init_routes() {
    modules::declaration::register_declaration_routes();
}
