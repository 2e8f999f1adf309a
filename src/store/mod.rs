//! App store redirect
//!
//! ```text
//!  final tap ─► url_for(platform)
//!                 │
//!                 ▼
//!   FbPlayableAd.onCTAClick() ─► mraid.open(url) ─► Moloco.click() ─► Moloco.open(url)
//!        (first hook present on the page handles it, routing stops there)
//!                 │ none present / hook threw
//!                 ▼
//!   window.open(url, "_blank") ─► location.href = url
//! ```
pub mod bridge;

use anyhow::Result;
use once_cell::sync::Lazy;
use serde::Deserialize;

pub const FALLBACK_URL: &str = "https://www.google.com";

static BUILD_CONFIG: Lazy<StoreConfig> = Lazy::new(|| {
    StoreConfig::from_json(include_str!("../../build.json")).unwrap_or_else(|err| {
        log::error!("build.json unreadable, store links fall back : {:#}", err);
        StoreConfig::default()
    })
});

/// Store links baked in at build time
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfig {
    #[serde(default)]
    pub google_play_url: Option<String>,
    #[serde(default)]
    pub app_store_url: Option<String>,
}

impl StoreConfig {
    pub fn embedded() -> &'static StoreConfig {
        &BUILD_CONFIG
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Store matching the platform, else whichever link exists
    pub fn url_for(&self, platform: Platform) -> &str {
        let play = non_empty(&self.google_play_url);
        let apple = non_empty(&self.app_store_url);
        match (platform, play, apple) {
            (Platform::Android, Some(play), _) => play,
            (Platform::Ios, _, Some(apple)) => apple,
            _ => play.or(apple).unwrap_or(FALLBACK_URL),
        }
    }
}

fn non_empty(url: &Option<String>) -> Option<&str> {
    url.as_deref().filter(|url| !url.is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Ios,
    Android,
    Other,
}

impl Platform {
    /// Client hints first (`navigator.userAgentData.platform`), then the UA string
    pub fn detect(ua_data_platform: Option<&str>, user_agent: &str) -> Platform {
        if let Some(platform) = ua_data_platform.map(str::to_lowercase) {
            if ["iphone", "ipad", "ios"].iter().any(|needle| platform.contains(needle)) {
                return Platform::Ios;
            }
            if platform.contains("android") {
                return Platform::Android;
            }
        }
        let user_agent = user_agent.to_lowercase();
        if ["iphone", "ipad", "ipod"].iter().any(|needle| user_agent.contains(needle)) {
            return Platform::Ios;
        }
        if user_agent.contains("android") {
            return Platform::Android;
        }
        Platform::Other
    }
}

pub fn is_moloco(user_agent: &str) -> bool {
    user_agent.to_lowercase().contains("moloco")
}

/// Ad network callbacks that may be injected into the page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtaHook {
    FbPlayableAdCta,
    MraidOpen,
    MolocoClick,
    MolocoOpen,
}

impl CtaHook {
    pub const PRIORITY: [CtaHook; 4] = [
        CtaHook::FbPlayableAdCta,
        CtaHook::MraidOpen,
        CtaHook::MolocoClick,
        CtaHook::MolocoOpen,
    ];

    /// (global object, method)
    pub fn path(self) -> (&'static str, &'static str) {
        match self {
            CtaHook::FbPlayableAdCta => ("FbPlayableAd", "onCTAClick"),
            CtaHook::MraidOpen => ("mraid", "open"),
            CtaHook::MolocoClick => ("Moloco", "click"),
            CtaHook::MolocoOpen => ("Moloco", "open"),
        }
    }

    pub fn takes_url(self) -> bool {
        matches!(self, CtaHook::MraidOpen | CtaHook::MolocoOpen)
    }
}

/// What the page offers for leaving the ad
pub trait AdBridge {
    fn has_hook(&self, hook: CtaHook) -> bool;
    fn invoke(&self, hook: CtaHook, url: &str) -> Result<()>;
    /// `Ok(false)` when the popup was blocked
    fn open_window(&self, url: &str) -> Result<bool>;
    fn navigate(&self, url: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    Hook(CtaHook),
    NewWindow,
    Navigated,
}

pub fn open_store(bridge: &impl AdBridge, url: &str) -> Result<StoreOutcome> {
    if let Some(hook) = CtaHook::PRIORITY.into_iter().find(|&hook| bridge.has_hook(hook)) {
        let (object, method) = hook.path();
        match bridge.invoke(hook, url) {
            Ok(()) => {
                log::info!("Store opened through {}.{}", object, method);
                return Ok(StoreOutcome::Hook(hook));
            }
            Err(err) => log::warn!("{}.{} failed, using the browser : {:#}", object, method, err),
        }
    }

    match bridge.open_window(url) {
        Ok(true) => return Ok(StoreOutcome::NewWindow),
        Ok(false) => log::info!("Popup blocked, navigating instead"),
        Err(err) => log::warn!("Fallback window.open failed : {:#}", err),
    }
    bridge.navigate(url)?;
    Ok(StoreOutcome::Navigated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::cell::RefCell;

    #[derive(Default)]
    struct FakeBridge {
        hooks: Vec<CtaHook>,
        broken_hooks: Vec<CtaHook>,
        popup: Option<bool>,
        calls: RefCell<Vec<String>>,
    }

    impl AdBridge for FakeBridge {
        fn has_hook(&self, hook: CtaHook) -> bool {
            self.hooks.contains(&hook)
        }

        fn invoke(&self, hook: CtaHook, url: &str) -> Result<()> {
            self.calls.borrow_mut().push(format!("{:?} {}", hook, url));
            if self.broken_hooks.contains(&hook) {
                return Err(anyhow!("hook threw"));
            }
            Ok(())
        }

        fn open_window(&self, url: &str) -> Result<bool> {
            self.calls.borrow_mut().push(format!("open {}", url));
            self.popup.ok_or_else(|| anyhow!("window.open threw"))
        }

        fn navigate(&self, url: &str) -> Result<()> {
            self.calls.borrow_mut().push(format!("navigate {}", url));
            Ok(())
        }
    }

    const URL: &str = "https://store.example/app";

    #[test]
    fn first_present_hook_wins() {
        let bridge = FakeBridge {
            hooks: vec![CtaHook::MolocoOpen, CtaHook::MraidOpen],
            ..FakeBridge::default()
        };
        assert_eq!(open_store(&bridge, URL).unwrap(), StoreOutcome::Hook(CtaHook::MraidOpen));
        assert_eq!(*bridge.calls.borrow(), vec![format!("MraidOpen {}", URL)]);
    }

    #[test]
    fn facebook_cta_outranks_everything() {
        let bridge = FakeBridge {
            hooks: CtaHook::PRIORITY.to_vec(),
            ..FakeBridge::default()
        };
        assert_eq!(
            open_store(&bridge, URL).unwrap(),
            StoreOutcome::Hook(CtaHook::FbPlayableAdCta)
        );
    }

    #[test]
    fn no_hooks_opens_a_window() {
        let bridge = FakeBridge {
            popup: Some(true),
            ..FakeBridge::default()
        };
        assert_eq!(open_store(&bridge, URL).unwrap(), StoreOutcome::NewWindow);
        assert_eq!(*bridge.calls.borrow(), vec![format!("open {}", URL)]);
    }

    #[test]
    fn blocked_popup_navigates() {
        let bridge = FakeBridge {
            popup: Some(false),
            ..FakeBridge::default()
        };
        assert_eq!(open_store(&bridge, URL).unwrap(), StoreOutcome::Navigated);
        assert_eq!(
            *bridge.calls.borrow(),
            vec![format!("open {}", URL), format!("navigate {}", URL)]
        );
    }

    #[test]
    fn throwing_hook_skips_to_the_browser() {
        let bridge = FakeBridge {
            hooks: vec![CtaHook::MolocoClick, CtaHook::MolocoOpen],
            broken_hooks: vec![CtaHook::MolocoClick],
            popup: None,
            ..FakeBridge::default()
        };
        assert_eq!(open_store(&bridge, URL).unwrap(), StoreOutcome::Navigated);
        // Moloco.open is never tried once Moloco.click threw
        assert_eq!(
            *bridge.calls.borrow(),
            vec![
                format!("MolocoClick {}", URL),
                format!("open {}", URL),
                format!("navigate {}", URL)
            ]
        );
    }

    #[test]
    fn platform_prefers_client_hints() {
        assert_eq!(Platform::detect(Some("Android"), "Mozilla/5.0 (iPhone)"), Platform::Android);
        assert_eq!(Platform::detect(Some("iOS"), ""), Platform::Ios);
        // unhelpful hint falls through to the UA string
        assert_eq!(
            Platform::detect(Some("Linux"), "Mozilla/5.0 (Linux; Android 14)"),
            Platform::Android
        );
        assert_eq!(Platform::detect(None, "Mozilla/5.0 (iPod touch)"), Platform::Ios);
        assert_eq!(Platform::detect(None, "Mozilla/5.0 (Windows NT 10.0)"), Platform::Other);
    }

    #[test]
    fn store_url_follows_platform_then_availability() {
        let both = StoreConfig {
            google_play_url: Some("https://play".into()),
            app_store_url: Some("https://apple".into()),
        };
        assert_eq!(both.url_for(Platform::Android), "https://play");
        assert_eq!(both.url_for(Platform::Ios), "https://apple");
        assert_eq!(both.url_for(Platform::Other), "https://play");

        let apple_only = StoreConfig {
            google_play_url: Some(String::new()),
            app_store_url: Some("https://apple".into()),
        };
        assert_eq!(apple_only.url_for(Platform::Android), "https://apple");
        assert_eq!(StoreConfig::default().url_for(Platform::Ios), FALLBACK_URL);
    }

    #[test]
    fn build_json_uses_camel_case_keys() {
        let config = StoreConfig::from_json(r#"{ "appStoreUrl": "https://apple" }"#).unwrap();
        assert_eq!(config.app_store_url.as_deref(), Some("https://apple"));
        assert_eq!(config.google_play_url, None);
        assert!(StoreConfig::from_json("not json").is_err());
    }

    #[test]
    fn embedded_config_has_a_store_link() {
        assert_ne!(StoreConfig::embedded().url_for(Platform::Android), FALLBACK_URL);
    }

    #[test]
    fn moloco_detection_ignores_case() {
        assert!(is_moloco("Mozilla/5.0 MOLOCO-SDK"));
        assert!(!is_moloco("Mozilla/5.0"));
    }
}
