//! Logger setup: `console_log` in the browser, `env_logger` natively (tests).

use log::LevelFilter;
use wasm_bindgen::prelude::*;

fn parse_level(level: &str) -> LevelFilter {
    level.trim().parse().unwrap_or(LevelFilter::Info)
}

#[cfg(target_arch = "wasm32")]
fn install(filter: LevelFilter) {
    if let Some(level) = filter.to_level() {
        // Err only means a logger is already installed.
        let _ = console_log::init_with_level(level);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn install(filter: LevelFilter) {
    let _ = env_logger::Builder::new()
        .filter_level(filter)
        .is_test(cfg!(test))
        .try_init();
}

/// Install the logger (first call wins) and set the max level.
/// Unknown level names fall back to `info`.
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging(level: &str) {
    let filter = parse_level(level);
    install(filter);
    log::set_max_level(filter);
}
