//! Randomized client identities (user-agent + session cookie).

use crate::RequestIdentity;
use rand::distributions::{Alphanumeric, Distribution};
use rand::seq::SliceRandom;
use rand::Rng;

/// Representative browser signatures a request may claim to be.
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/86.0.4240.183 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 \
     (KHTML, like Gecko) Version/14.0.1 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/85.0.4183.121 Safari/537.36",
];

pub const COOKIE_NAME_PREFIX: &str = "session_id_";
pub const COOKIE_SUFFIX_LEN: usize = 6;
pub const COOKIE_VALUE_LEN: usize = 16;

/// Draws identities from a fixed user-agent pool.
///
/// The synthesizer holds no randomness of its own. Every worker passes in
/// the RNG it owns, so concurrent workers never share generator state.
#[derive(Debug, Clone, Copy)]
pub struct IdentitySynthesizer {
    user_agents: &'static [&'static str],
}

impl Default for IdentitySynthesizer {
    fn default() -> Self {
        Self::new(USER_AGENTS)
    }
}

impl IdentitySynthesizer {
    /// `user_agents` must not be empty.
    pub fn new(user_agents: &'static [&'static str]) -> Self {
        assert!(!user_agents.is_empty(), "user-agent pool is empty");
        Self { user_agents }
    }

    pub fn next<R: Rng + ?Sized>(&self, rng: &mut R) -> RequestIdentity {
        let user_agent = self
            .user_agents
            .choose(rng)
            .copied()
            .unwrap_or(USER_AGENTS[0]);

        RequestIdentity {
            user_agent: user_agent.to_string(),
            cookie_name: format!("{}{}", COOKIE_NAME_PREFIX, alphanumeric(rng, COOKIE_SUFFIX_LEN)),
            cookie_value: alphanumeric(rng, COOKIE_VALUE_LEN),
        }
    }
}

fn alphanumeric<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len).map(|_| Alphanumeric.sample(rng) as char).collect()
}
