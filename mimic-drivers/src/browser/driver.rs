use crate::browser::{
    fingerprint::{UserAgentManager, UserAgentProfile},
    page::WebPage,
    stealth::{build_stealth_arguments, exclude_switches},
};
use anyhow::{Context, Result};
use fantoccini::{Client, ClientBuilder};
use mimic_common::{BrowserConfig, StealthLevel};
use serde_json::json;
use tracing::info;
use url::Url;
use webdriver::capabilities::Capabilities;

/// Thin wrapper around a `fantoccini` WebDriver client launched with
/// stealth arguments.
pub struct MimicDriver {
    pub client: Client,
    pub user_agent_manager: UserAgentManager,
    pub stealth_level: StealthLevel,
}

impl MimicDriver {
    /// Connect to the WebDriver service named in `config`
    /// (`http://localhost:9515`, i.e. Chromedriver, by default).
    pub async fn connect(config: &BrowserConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.webdriver_url)
            .with_context(|| format!("invalid webdriver url: {}", config.webdriver_url))?;

        let mut user_agent_manager = match &config.user_agent {
            Some(ua) => UserAgentManager::pinned(ua),
            None => UserAgentManager::new(),
        };
        let profile = user_agent_manager.session_profile().clone();
        let caps = chrome_capabilities(config, &profile);

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(endpoint.as_str())
            .await
            .with_context(|| format!("failed to connect to webdriver at {endpoint}"))?;

        info!(
            target: "browser.driver",
            webdriver = %endpoint,
            headless = config.headless,
            stealth_level = ?config.stealth_level,
            user_agent = %profile.user_agent,
            "browser session started"
        );

        Ok(Self {
            client,
            user_agent_manager,
            stealth_level: config.stealth_level,
        })
    }

    /// Navigate to `url` and return a [`WebPage`] with stealth scripts
    /// applied.
    pub async fn goto(&mut self, url: &str) -> Result<WebPage> {
        let profile = self.user_agent_manager.session_profile().clone();
        let mut page = WebPage::new(self.client.clone(), self.stealth_level, profile);
        page.goto(url).await?;
        Ok(page)
    }

    /// Close the underlying browser session.
    pub async fn close(self) -> Result<()> {
        self.client.close().await?;
        info!(target: "browser.driver", "browser session closed");
        Ok(())
    }
}

/// `goog:chromeOptions` capabilities for a session.
pub fn chrome_capabilities(config: &BrowserConfig, profile: &UserAgentProfile) -> Capabilities {
    let args = build_stealth_arguments(config.stealth_level, profile, config.headless);
    let mut caps = Capabilities::new();
    caps.insert(
        "goog:chromeOptions".to_string(),
        json!({
            "args": args,
            "excludeSwitches": exclude_switches(),
            "useAutomationExtension": false,
        }),
    );
    caps
}
