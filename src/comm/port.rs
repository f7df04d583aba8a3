use std::net::TcpListener;

/// Check whether a TCP port can be bound on all interfaces.
pub fn is_port_available_sync(port: u16) -> bool {
    TcpListener::bind(("0.0.0.0", port)).is_ok()
}

/// Find an available port starting from `start_port`, scanning a small
/// range. Returns `start_port` itself when it is free.
pub fn available_port(start_port: u16) -> u16 {
    let mut port = start_port;
    let end = start_port.saturating_add(10);

    while port <= end {
        if is_port_available_sync(port) {
            if port != start_port {
                tracing::warn!("Port {} is occupied, using port {}", start_port, port);
            }
            return port;
        }
        port = port.saturating_add(1);
    }

    start_port
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_occupied_port_is_reported_unavailable() {
        let listener = TcpListener::bind(("0.0.0.0", 0)).unwrap();
        let port = listener.local_addr().unwrap().port();
        assert!(!is_port_available_sync(port));
        let fallback = available_port(port);
        assert_ne!(fallback, port);
    }
}
