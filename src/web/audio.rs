// Card audio playback. Autoplay rejections are expected and swallowed.

use std::cell::Cell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{HtmlAudioElement, window};

use crate::error::{Result, ScratchError};
use crate::reward::AudioCue;

const RETRY_DELAY_MS: i32 = 50;

pub struct AudioPlayer {
    element: HtmlAudioElement,
    alive: Rc<Cell<bool>>, // false after teardown; pending retries check it
}

impl AudioPlayer {
    pub fn new(src: &str) -> Result<Self> {
        let element = HtmlAudioElement::new_with_src(src).map_err(ScratchError::js)?;
        element.set_preload("auto");
        element.load();
        Ok(Self { element, alive: Rc::new(Cell::new(true)) })
    }

    /// Near-silent play/pause inside a user gesture so the later reward
    /// playback is not blocked by autoplay policy.
    pub fn unlock(&self) {
        let el = self.element.clone();
        el.set_volume(0.01);
        el.set_current_time(0.01);
        let Ok(promise) = el.play() else { return };
        let after = el.clone();
        let on_ok = Closure::once(move |_: JsValue| {
            after.pause().ok();
            after.set_current_time(0.0);
        });
        let on_err = Closure::once(move |_: JsValue| {
            log::debug!("audio unlock rejected");
        });
        let _ = promise.then(&on_ok).catch(&on_err);
        on_ok.forget();
        on_err.forget();
    }

    pub fn start(&self, cue: &AudioCue) {
        if !self.alive.get() {
            return;
        }
        self.element.set_loop(cue.looped);
        self.element.set_volume(cue.volume.clamp(0.0, 1.0));
        self.element.set_current_time(cue.start_offset_secs.max(0.0));
        play_with_retry(self.element.clone(), self.alive.clone());
    }

    pub fn stop(&self) {
        self.alive.set(false);
        self.element.pause().ok();
    }
}

/// Play; on rejection try exactly once more after a short delay, then give up.
fn play_with_retry(element: HtmlAudioElement, alive: Rc<Cell<bool>>) {
    let Ok(promise) = element.play() else { return };
    let on_err = Closure::once(move |err: JsValue| {
        log::debug!("audio play rejected, retrying once: {err:?}");
        let retry = Closure::once_into_js(move || {
            if !alive.get() {
                return;
            }
            if let Ok(p) = element.play() {
                let swallow = Closure::once(|_: JsValue| log::debug!("audio retry rejected"));
                let _ = p.catch(&swallow);
                swallow.forget();
            }
        });
        if let Some(w) = window() {
            let _ = w.set_timeout_with_callback_and_timeout_and_arguments_0(
                retry.unchecked_ref(),
                RETRY_DELAY_MS,
            );
        }
    });
    let _ = promise.catch(&on_err);
    on_err.forget();
}
