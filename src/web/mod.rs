//! Browser glue: canvases, DOM listeners, animation frames and audio around a
//! `Card<CanvasCover>`. Everything here is a thin shell; the behaviour lives in
//! the platform-neutral modules.

use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlElement};

use crate::error::{Result, ScratchError};

mod audio;
mod canvas;
mod frame;
mod widget;

pub use canvas::{CanvasCover, CanvasParticles};
pub use widget::ScratchCard;

/// Event dispatched on the host element when a card is revealed.
pub const REVEAL_EVENT: &str = "scratchcard:revealed";

fn create<T: JsCast>(doc: &Document, tag: &str) -> Result<T> {
    doc.create_element(tag)
        .map_err(ScratchError::js)?
        .dyn_into::<T>()
        .map_err(|_| ScratchError::Js(format!("<{tag}> has unexpected type")))
}

fn set_styles(el: &HtmlElement, styles: &[(&str, &str)]) {
    let style = el.style();
    for (name, value) in styles {
        style.set_property(name, value).ok();
    }
}
