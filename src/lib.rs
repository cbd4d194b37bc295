//! Scratch Card core crate.
//!
//! One configurable scratch-card widget replaces the per-shape card designs:
//! a cover layer is erased by pointer/touch strokes, coverage is sampled from
//! the cover's pixels, and the first time it crosses the configured threshold a
//! one-shot reward plays (glitter burst, cover fade, scale pop, optional audio).
//!
//! The estimator, reveal state machine, particle drivers and reward timeline are
//! platform-neutral and tested natively. `web::ScratchCard` is the exported
//! wasm-bindgen widget that wires them to canvases, DOM events and
//! `requestAnimationFrame`.

use wasm_bindgen::prelude::*;

pub mod card;
pub mod config;
pub mod coverage;
pub mod error;
pub mod logging;
pub mod particles;
pub mod reveal;
pub mod reward;
pub mod surface;
pub mod web;

pub use card::Card;
pub use config::{CardConfig, CoverPaint, Variant};
pub use coverage::{Region, estimate, estimate_region};
pub use error::ScratchError;
pub use reveal::{Reveal, RevealMachine, RevealState, StrokeOutcome};
pub use reward::{AudioCue, AudioTrigger, CardHooks, FadeStyle, RewardSequence};
pub use surface::{CoverLayer, PixelRect, Point, RasterCover, Rgba};

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    logging::init_logging("info");
}

/// Names of the built-in presets, for host-side pickers.
#[wasm_bindgen(js_name = presetNames)]
pub fn preset_names() -> Vec<String> {
    Variant::ALL.iter().map(|v| v.name().to_string()).collect()
}

/// Preset config as camelCase JSON, a starting point for custom cards.
#[wasm_bindgen(js_name = presetConfig)]
pub fn preset_config(variant: &str) -> Result<String, JsValue> {
    let variant: Variant = variant.parse()?;
    serde_json::to_string(&CardConfig::preset(variant))
        .map_err(|e| ScratchError::from(e).into())
}
