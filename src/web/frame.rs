// requestAnimationFrame loop driven by a step function.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::window;

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

/// Re-schedules itself while `step` returns true. The callback only holds a
/// weak handle to itself, so dropping the loop frees it.
pub struct FrameLoop {
    callback: FrameCallback,
    handle: Rc<Cell<Option<i32>>>, // pending rAF id
}

fn request(callback: &FrameCallback) -> Option<i32> {
    let w = window()?;
    let cb = callback.borrow();
    let closure = cb.as_ref()?;
    w.request_animation_frame(closure.as_ref().unchecked_ref()).ok()
}

impl FrameLoop {
    pub fn new(mut step: impl FnMut(f64) -> bool + 'static) -> Self {
        let f: FrameCallback = Rc::new(RefCell::new(None));
        let handle: Rc<Cell<Option<i32>>> = Rc::new(Cell::new(None));
        let me: Weak<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::downgrade(&f);
        let h = handle.clone();
        *f.borrow_mut() = Some(Closure::wrap(Box::new(move |ts: f64| {
            h.set(None);
            if step(ts) {
                if let Some(f) = me.upgrade() {
                    h.set(request(&f));
                }
            }
        }) as Box<dyn FnMut(f64)>));
        Self { callback: f, handle }
    }

    pub fn is_scheduled(&self) -> bool {
        self.handle.get().is_some()
    }

    /// Schedule the next frame unless one is already pending.
    pub fn start(&self) {
        if !self.is_scheduled() {
            self.handle.set(request(&self.callback));
        }
    }

    pub fn cancel(&self) {
        if let (Some(id), Some(w)) = (self.handle.take(), window()) {
            w.cancel_animation_frame(id).ok();
        }
    }
}
