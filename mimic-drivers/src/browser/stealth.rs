use super::fingerprint::UserAgentProfile;
use mimic_common::StealthLevel;

/// Construct Chrome command-line arguments for a given stealth level
/// and fingerprint.
pub fn build_stealth_arguments(
    level: StealthLevel,
    user_profile: &UserAgentProfile,
    headless: bool,
) -> Vec<String> {
    let mut args: Vec<String> = [
        "--disable-blink-features=AutomationControlled",
        "--disable-infobars",
        "--disable-background-networking",
        "--disable-background-timer-throttling",
        "--disable-backgrounding-occluded-windows",
        "--disable-breakpad",
        "--disable-client-side-phishing-detection",
        "--disable-default-apps",
        "--disable-dev-shm-usage",
        "--disable-extensions",
        "--disable-features=site-per-process,TranslateUI,BlinkGenPropertyTrees",
        "--disable-hang-monitor",
        "--disable-ipc-flooding-protection",
        "--disable-popup-blocking",
        "--disable-prompt-on-repost",
        "--disable-renderer-backgrounding",
        "--disable-sync",
        "--force-color-profile=srgb",
        "--metrics-recording-only",
        "--no-first-run",
        "--password-store=basic",
        "--use-mock-keychain",
    ]
    .into_iter()
    .map(String::from)
    .collect();

    args.push(format!("--user-agent={}", user_profile.user_agent));
    args.push(format!(
        "--window-size={},{}",
        user_profile.viewport.0, user_profile.viewport.1
    ));
    args.push(format!("--lang={}", user_profile.languages.join(",")));

    if headless {
        args.push("--headless=new".to_string());
    }
    if headless || level == StealthLevel::Maximum {
        args.push("--disable-gpu".to_string());
    }
    args
}

/// Capability switches that hide the automation banner and extension.
pub fn exclude_switches() -> Vec<&'static str> {
    vec!["enable-automation"]
}

/// JavaScript evasions applied after navigation to reduce automation signals.
pub struct StealthScripts;

impl StealthScripts {
    pub fn core_evasions() -> &'static str {
        r#"
            Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
            Object.defineProperty(navigator, 'plugins', { get: () => [1, 2, 3, 4, 5] });
            Object.defineProperty(navigator, 'languages', {
                get: () => ['en-US', 'en']
            });
            if (!window.chrome) window.chrome = { runtime: {} };
            if (navigator.permissions && navigator.permissions.query) {
                const originalQuery = navigator.permissions.query.bind(navigator.permissions);
                navigator.permissions.query = (parameters) => (
                    parameters.name === 'notifications'
                        ? Promise.resolve({ state: Notification.permission })
                        : originalQuery(parameters)
                );
            }
        "#
    }

    pub fn webgl_evasions() -> &'static str {
        r#"
            const getParameter = WebGLRenderingContext.prototype.getParameter;
            WebGLRenderingContext.prototype.getParameter = function(parameter) {
                if (parameter === 37445) return 'Intel Inc.';
                if (parameter === 37446) return 'Intel Iris OpenGL Engine';
                return getParameter.call(this, parameter);
            };
        "#
    }

    pub fn canvas_evasions() -> &'static str {
        r#"
            const getContext = HTMLCanvasElement.prototype.getContext;
            HTMLCanvasElement.prototype.getContext = function(type, ...args) {
                const ctx = getContext.call(this, type, ...args);
                if (type === '2d' && ctx) {
                    const origToDataURL = this.toDataURL;
                    this.toDataURL = function(...a) {
                        const imgdata = ctx.getImageData(0, 0, this.width, this.height);
                        for (let i = 0; i < imgdata.data.length; i += 4) {
                            if (Math.random() < 0.001) imgdata.data[i] += Math.random() < 0.5 ? -1 : 1;
                        }
                        ctx.putImageData(imgdata, 0, 0);
                        return origToDataURL.call(this, ...a);
                    };
                }
                return ctx;
            };
        "#
    }

    /// Pin `navigator.platform` to the session profile's value.
    pub fn platform_override(platform: &str) -> String {
        let quoted = serde_json::Value::String(platform.to_string()).to_string();
        format!("Object.defineProperty(navigator, 'platform', {{ get: () => {quoted} }});")
    }

    /// Every script to run after navigation, in order.
    pub fn for_level(level: StealthLevel, profile: &UserAgentProfile) -> Vec<String> {
        let mut scripts = vec![Self::core_evasions().to_string()];
        match level {
            StealthLevel::Lightweight => {}
            StealthLevel::Balanced => {
                scripts.push(Self::canvas_evasions().to_string());
            }
            StealthLevel::Maximum => {
                scripts.push(Self::canvas_evasions().to_string());
                scripts.push(Self::webgl_evasions().to_string());
                scripts.push(Self::platform_override(&profile.platform));
            }
        }
        scripts
    }
}
