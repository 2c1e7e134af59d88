//! Client identity headers shared by every request of a process

use rand::seq::SliceRandom;
use std::time::Duration;

pub const ACFUN_REFERER: &str = "https://www.acfun.cn/";

const DESKTOP_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36 Edg/135.0.0.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/134.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:136.0) Gecko/20100101 Firefox/136.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36",
];

/// Identity and timeout settings for the HTTP layer.
///
/// Built once at startup and passed to whatever needs to issue requests;
/// nothing mutates it afterwards.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub user_agent: String,
    pub referer: String,
    /// Bound for a single request attempt (and for each body chunk of a transfer)
    pub timeout: Duration,
}

impl ClientConfig {
    /// Pick a random desktop browser identity
    pub fn new() -> Self {
        Self::with_user_agent(random_user_agent())
    }

    /// Use a fixed identity instead of a random one
    pub fn with_user_agent(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            referer: ACFUN_REFERER.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn random_user_agent() -> String {
    DESKTOP_USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(DESKTOP_USER_AGENTS[0])
        .to_string()
}
