/// Print version information.
pub fn handle_version_command() {
    println!("bhxh-portal {}", env!("CARGO_PKG_VERSION"));
}
