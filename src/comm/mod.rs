/// Common infrastructure module
/// Các thành phần hạ tầng dùng chung

pub mod config;
pub mod port;
