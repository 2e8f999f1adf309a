use anyhow::{anyhow, Result};
use js_sys::{Function, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::Window;

use crate::browser;
use crate::store::{AdBridge, CtaHook};

/// `AdBridge` over the real page globals
pub struct WindowBridge {
    window: Window,
}

impl WindowBridge {
    pub fn new() -> Result<Self> {
        Ok(WindowBridge {
            window: browser::window()?,
        })
    }

    /// `(receiver, method)` when `window[object][method]` is a function
    fn lookup(&self, hook: CtaHook) -> Option<(JsValue, Function)> {
        let (object, method) = hook.path();
        let receiver = Reflect::get(&self.window, &JsValue::from_str(object)).ok()?;
        if receiver.is_undefined() || receiver.is_null() {
            return None;
        }
        let function = Reflect::get(&receiver, &JsValue::from_str(method))
            .ok()?
            .dyn_into::<Function>()
            .ok()?;
        Some((receiver, function))
    }
}

impl AdBridge for WindowBridge {
    fn has_hook(&self, hook: CtaHook) -> bool {
        self.lookup(hook).is_some()
    }

    fn invoke(&self, hook: CtaHook, url: &str) -> Result<()> {
        let (object, method) = hook.path();
        let (receiver, function) = self
            .lookup(hook)
            .ok_or_else(|| anyhow!("{}.{} is not available", object, method))?;
        let called = if hook.takes_url() {
            function.call1(&receiver, &JsValue::from_str(url))
        } else {
            function.call0(&receiver)
        };
        called
            .map(|_| ())
            .map_err(|err| anyhow!("{}.{} threw : {:#?}", object, method, err))
    }

    fn open_window(&self, url: &str) -> Result<bool> {
        self.window
            .open_with_url_and_target(url, "_blank")
            .map(|opened| opened.is_some())
            .map_err(|err| anyhow!("window.open threw : {:#?}", err))
    }

    fn navigate(&self, url: &str) -> Result<()> {
        self.window
            .location()
            .set_href(url)
            .map_err(|err| anyhow!("Could not navigate to {} : {:#?}", url, err))
    }
}

/// Console-logging stand-ins for the ad network globals, local testing only.
/// Globals the network already injected are left alone.
#[cfg(feature = "dev-stubs")]
pub fn install_dev_stubs() -> Result<()> {
    let window = browser::window()?;
    #[rustfmt::skip]
    let stubs: [(&str, &str, &str, &str); 2] = [
        ("FbPlayableAd", "onCTAClick", "",    "console.log('[DEV] FbPlayableAd.onCTAClick()')"),
        ("mraid",        "open",       "url", "console.log('[DEV] mraid.open:', url)"),
    ];

    for (name, method, args, body) in stubs {
        let existing = Reflect::get(&window, &JsValue::from_str(name))
            .map_err(|err| anyhow!("Could not read window.{} : {:#?}", name, err))?;
        if !existing.is_undefined() {
            continue;
        }
        let object = js_sys::Object::new();
        Reflect::set(&object, &JsValue::from_str(method), &Function::new_with_args(args, body))
            .map_err(|err| anyhow!("Could not stub {}.{} : {:#?}", name, method, err))?;
        Reflect::set(&window, &JsValue::from_str(name), &object)
            .map_err(|err| anyhow!("Could not install window.{} : {:#?}", name, err))?;
        log::debug!("Installed dev stub window.{}", name);
    }
    Ok(())
}
