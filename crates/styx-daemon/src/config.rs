use std::net::SocketAddr;

/// Daemon runtime configuration.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub listen: SocketAddr,
    /// Base identifier of this oracle instance.
    pub self_id: u64,
    pub max_body_bytes: usize,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 8080)),
            self_id: 1,
            max_body_bytes: 16_384,
        }
    }
}

impl DaemonConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(listen) = read_env_addr("STYX_LISTEN") {
            cfg.listen = listen;
        }
        cfg.self_id = read_env_u64("STYX_SELF_ID", cfg.self_id);
        cfg.max_body_bytes = read_env_usize("STYX_MAX_BODY_BYTES", cfg.max_body_bytes);
        cfg
    }
}

fn read_env_addr(name: &str) -> Option<SocketAddr> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

fn read_env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn read_env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}
