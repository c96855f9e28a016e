//! Browser identity presented to the target site.
//!
//! One [`IdentityProfile`] is drawn per request: a User-Agent picked
//! uniformly from [`USER_AGENTS`] plus a fixed header bundle. The pool is
//! read-only and shared by all requests.

use rand::seq::IndexedRandom;
use url::Url;

/// User agents a profile is drawn from.
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/120.0",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1",
];

const BASE_HEADERS: &[(&str, &str)] = &[
    (
        "Accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
    ),
    ("Accept-Language", "en-US,en;q=0.5"),
    ("Sec-Fetch-Dest", "document"),
    ("Sec-Fetch-Mode", "navigate"),
    ("Sec-Fetch-Site", "same-origin"),
];

/// User-Agent and extra headers applied to one browser session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityProfile {
    pub user_agent: &'static str,
    pub headers: Vec<(String, String)>,
}

impl IdentityProfile {
    /// Draw a random profile for a navigation to `target_url`.
    ///
    /// `Referer` is set to the target's origin when the URL parses.
    pub fn random(target_url: &str) -> Self {
        let user_agent = USER_AGENTS
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or(USER_AGENTS[0]);
        Self::with_user_agent(user_agent, target_url)
    }

    pub fn with_user_agent(user_agent: &'static str, target_url: &str) -> Self {
        let mut headers: Vec<(String, String)> = BASE_HEADERS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        if let Some(origin) = origin_of(target_url) {
            headers.push(("Referer".to_string(), origin));
        }

        Self {
            user_agent,
            headers,
        }
    }

    /// Headers as a JSON object, the shape CDP expects.
    pub fn headers_json(&self) -> serde_json::Value {
        let map = self
            .headers
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }
}

fn origin_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    match parsed.origin() {
        origin @ url::Origin::Tuple(..) => Some(format!("{}/", origin.ascii_serialization())),
        url::Origin::Opaque(_) => None,
    }
}
