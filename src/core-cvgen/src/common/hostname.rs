use std::{net::SocketAddr, num::ParseIntError};

/// Gets the host:port from the env vars HOST and PORT.
/// Uses defaults `127.0.0.1:3000` if env vars are empty.
pub fn get_api_base_url() -> Result<SocketAddr, HostPortError> {
    socket_addr(std::env::var("HOST").ok(), std::env::var("PORT").ok())
}

fn socket_addr(host: Option<String>, port: Option<String>) -> Result<SocketAddr, HostPortError> {
    let host = host.filter(|h| !h.trim().is_empty()).unwrap_or_else(|| "127.0.0.1".to_string());
    let port = match port.filter(|p| !p.trim().is_empty()) {
        Some(p) => p.trim().parse::<u16>()?,
        None => 3000,
    };
    Ok(format!("{}:{}", host.trim(), port).parse::<SocketAddr>()?)
}

#[derive(Debug)]
pub enum HostPortError {
    InvalidPort(ParseIntError),
    InvalidHostname(std::net::AddrParseError),
}

impl std::error::Error for HostPortError {}

impl std::fmt::Display for HostPortError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostPortError::InvalidPort(err) => write!(f, "Invalid port: {}", err),
            HostPortError::InvalidHostname(err) => write!(f, "Invalid hostname: {}", err),
        }
    }
}

impl From<ParseIntError> for HostPortError {
    fn from(err: ParseIntError) -> Self {
        HostPortError::InvalidPort(err)
    }
}

impl From<std::net::AddrParseError> for HostPortError {
    fn from(err: std::net::AddrParseError) -> Self {
        HostPortError::InvalidHostname(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let addr = socket_addr(None, None).unwrap();
        assert_eq!(addr.to_string(), "127.0.0.1:3000");

        let addr = socket_addr(Some(" ".to_string()), Some(String::new())).unwrap();
        assert_eq!(addr.to_string(), "127.0.0.1:3000");
    }

    #[test]
    fn test_explicit_host_and_port() {
        let addr = socket_addr(Some("0.0.0.0".to_string()), Some("8080".to_string())).unwrap();
        assert_eq!(addr.to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            socket_addr(None, Some("http".to_string())),
            Err(HostPortError::InvalidPort(_))
        ));
        assert!(matches!(
            socket_addr(Some("not a host".to_string()), None),
            Err(HostPortError::InvalidHostname(_))
        ));
    }
}
