use clap::Parser;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Runtime settings. Every flag can also come from the environment.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "togetherly-server", version, about = "WebRTC signaling relay")]
pub struct RelayConfig {
    /// Interface to bind.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 3001)]
    pub port: u16,

    /// Origins allowed to open cross-origin requests. Empty allows any origin.
    #[arg(long = "allowed-origin", env = "ALLOWED_ORIGINS", value_delimiter = ',')]
    pub allowed_origins: Vec<String>,
}

impl RelayConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 3001,
            allowed_origins: Vec::new(),
        }
    }
}
