// ==================== Imports ====================
use wasm_bindgen::prelude::*;

pub mod assets;
pub mod browser;
pub mod choreography;
pub mod engine;
pub mod game;
pub mod scene;
pub mod sprite;
pub mod store;
pub mod tween;

use engine::GameLoop;
use game::PlayableAd;

// ==================== Main Functions ====================
/// Main entry for the WebAssembly module
/// - hooks panics and logging to the browser console
/// - starts the game loop once the asset bundles are decoded
#[wasm_bindgen(start)]
pub fn main_js() -> Result<(), JsValue> {
    // setup better panic messages for debugging
    console_error_panic_hook::set_once();
    let level = if cfg!(debug_assertions) {
        log::Level::Debug
    } else {
        log::Level::Info
    };
    if let Err(err) = console_log::init_with_level(level) {
        web_sys::console::warn_1(&format!("Logger already set : {}", err).into());
    }

    #[cfg(feature = "dev-stubs")]
    store::bridge::install_dev_stubs()
        .unwrap_or_else(|err| log::warn!("Dev stubs not installed : {:#}", err));

    browser::spawn_local(async move {
        if let Err(err) = GameLoop::start(PlayableAd::new()).await {
            log::error!("Could not start the playable ad : {:#}", err);
        }
    });

    Ok(())
}
