use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Snapshot of user agent, viewport, and locale characteristics.
pub struct UserAgentProfile {
    pub user_agent: String,
    pub viewport: (u32, u32),
    pub platform: String,
    pub languages: Vec<String>,
    pub timezone: String,
}

impl UserAgentProfile {
    fn desktop(user_agent: &str, viewport: (u32, u32), platform: &str, timezone: &str) -> Self {
        Self {
            user_agent: user_agent.to_string(),
            viewport,
            platform: platform.to_string(),
            languages: vec!["en-US".to_string(), "en".to_string()],
            timezone: timezone.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
/// Maintains a small pool of plausible desktop fingerprint profiles and pins
/// one per browser session.
pub struct UserAgentManager {
    desktop_profiles: Vec<UserAgentProfile>,
    current_session_profile: Option<UserAgentProfile>,
}

impl Default for UserAgentManager {
    fn default() -> Self {
        Self::new()
    }
}

impl UserAgentManager {
    /// Create a new manager with built-in desktop profiles.
    pub fn new() -> Self {
        Self {
            desktop_profiles: vec![
                UserAgentProfile::desktop(
                    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
                    (1920, 1080),
                    "Win32",
                    "America/New_York",
                ),
                UserAgentProfile::desktop(
                    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
                    (1536, 864),
                    "Win32",
                    "America/Chicago",
                ),
                UserAgentProfile::desktop(
                    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
                    (1440, 900),
                    "MacIntel",
                    "America/Los_Angeles",
                ),
                UserAgentProfile::desktop(
                    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
                    (1680, 1050),
                    "MacIntel",
                    "America/Denver",
                ),
                UserAgentProfile::desktop(
                    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
                    (1920, 1080),
                    "Linux x86_64",
                    "Europe/London",
                ),
            ],
            current_session_profile: None,
        }
    }

    /// A manager that always hands out `user_agent`, keeping the first pool
    /// entry's viewport and locale.
    pub fn pinned(user_agent: &str) -> Self {
        let mut manager = Self::new();
        let mut profile = manager.desktop_profiles[0].clone();
        profile.user_agent = user_agent.to_string();
        profile.platform = platform_for(user_agent).to_string();
        manager.current_session_profile = Some(profile);
        manager
    }

    pub fn profiles(&self) -> &[UserAgentProfile] {
        &self.desktop_profiles
    }

    /// Get (or lazily select) the current session profile.
    pub fn session_profile(&mut self) -> &UserAgentProfile {
        let pool = &self.desktop_profiles;
        self.current_session_profile.get_or_insert_with(|| {
            let index = rand::thread_rng().gen_range(0..pool.len());
            pool[index].clone()
        })
    }
}

/// `navigator.platform` value consistent with a user-agent string.
fn platform_for(user_agent: &str) -> &'static str {
    if user_agent.contains("Macintosh") {
        "MacIntel"
    } else if user_agent.contains("Linux") {
        "Linux x86_64"
    } else {
        "Win32"
    }
}
