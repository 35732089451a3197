use agriscan_vision::PipelineConfig;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BIND: &str = "127.0.0.1:8000";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_MAX_STORED_IMAGES: usize = 20;
pub const DEFAULT_WS_POLL_MS: u64 = 1000;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub max_upload_bytes: usize,
    pub max_stored_images: usize,
    /// Analysis workers; `None` uses one per CPU.
    pub workers: Option<usize>,
    /// Fixed seed for every analysis; `None` seeds each request from the clock.
    pub seed: Option<u64>,
    pub ws_poll_interval: Duration,
    pub pipeline: PipelineConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_stored_images: DEFAULT_MAX_STORED_IMAGES,
            workers: None,
            seed: None,
            ws_poll_interval: Duration::from_millis(DEFAULT_WS_POLL_MS),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `AGRISCAN_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();
        if let Some(bind) = lookup("AGRISCAN_BIND").filter(|b| !b.is_empty()) {
            cfg.bind_addr = bind;
        }
        if let Some(v) = parse(&lookup, "AGRISCAN_MAX_UPLOAD_BYTES") {
            cfg.max_upload_bytes = v;
        }
        if let Some(v) = parse(&lookup, "AGRISCAN_MAX_STORED_IMAGES") {
            cfg.max_stored_images = v;
        }
        cfg.workers = parse(&lookup, "AGRISCAN_WORKERS");
        cfg.seed = parse(&lookup, "AGRISCAN_SEED");
        if let Some(ms) = parse::<u64>(&lookup, "AGRISCAN_WS_POLL_MS") {
            cfg.ws_poll_interval = Duration::from_millis(ms.max(1));
        }
        cfg
    }
}

fn parse<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparsable setting");
            None
        }
    }
}
