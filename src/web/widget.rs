// Exported `ScratchCard` widget.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    CustomEvent, CustomEventInit, Document, Element, Event, EventTarget, HtmlCanvasElement, HtmlElement,
    HtmlImageElement, MouseEvent, TouchEvent, window,
};

use super::audio::AudioPlayer;
use super::canvas::{CanvasCover, CanvasParticles};
use super::frame::FrameLoop;
use super::{REVEAL_EVENT, create, set_styles};
use crate::card::Card;
use crate::config::{CardConfig, CoverPaint, Variant};
use crate::error::{Result, ScratchError};
use crate::reward::{AudioCue, CardHooks};
use crate::surface::Point;

const IMAGE_POP_SCALE: f64 = 1.08;

// --- Effects -------------------------------------------------------------------

/// Side effects requested by the card while its state is borrowed. They are
/// applied afterwards so host callbacks may call back into the widget.
enum Effect {
    Revealed(f64),
    Pop(bool),
    ImagePop(bool),
    UnlockAudio,
    StartAudio(AudioCue),
}

#[derive(Default)]
struct EffectQueue {
    effects: Vec<Effect>,
}

impl CardHooks for EffectQueue {
    fn revealed(&mut self, coverage: f64) {
        self.effects.push(Effect::Revealed(coverage));
    }
    fn set_pop(&mut self, on: bool) {
        self.effects.push(Effect::Pop(on));
    }
    fn set_image_pop(&mut self, on: bool) {
        self.effects.push(Effect::ImagePop(on));
    }
    fn unlock_audio(&mut self) {
        self.effects.push(Effect::UnlockAudio);
    }
    fn start_audio(&mut self, cue: &AudioCue) {
        self.effects.push(Effect::StartAudio(cue.clone()));
    }
}

// --- Widget state ----------------------------------------------------------------

type Listener = (EventTarget, &'static str, Closure<dyn FnMut(Event)>);

struct Inner {
    card: Card<CanvasCover>,
    particles: CanvasParticles,
    host: Element,
    container: HtmlElement,
    image: Option<HtmlElement>,
    audio: Option<AudioPlayer>,
    frames: Option<FrameLoop>,
    listeners: Vec<Listener>,
    retired: Vec<Listener>, // removed on destroy, freed with the widget
    on_reveal: Option<js_sys::Function>,
    pop_scale: f64,
    destroyed: bool,
}

impl Inner {
    fn set_pop(&self, on: bool) {
        let scale = if on { self.pop_scale } else { 1.0 };
        set_styles(&self.container, &[("transform", &format!("scale({scale})"))]);
    }

    fn set_image_pop(&self, on: bool) {
        if let Some(img) = &self.image {
            let scale = if on { IMAGE_POP_SCALE } else { 1.0 };
            set_styles(img, &[("transform", &format!("scale({scale})"))]);
        }
    }

    /// Idempotent teardown shared by `destroy()` and drop.
    fn shutdown(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.card.teardown();
        if let Some(frames) = &self.frames {
            frames.cancel();
        }
        if let Some(audio) = &self.audio {
            audio.stop();
        }
        let listeners: Vec<Listener> = self.listeners.drain(..).collect();
        for (target, name, closure) in &listeners {
            target
                .remove_event_listener_with_callback(name, closure.as_ref().unchecked_ref())
                .ok();
        }
        self.retired.extend(listeners);
        self.container.remove();
        log::debug!("scratch card destroyed");
    }

    fn start_frames(&self) {
        if let Some(frames) = &self.frames {
            frames.start();
        }
    }
}

// Freed from JS without `destroy()`: the DOM still holds our listeners and
// possibly a pending frame, so detach them before the closures go away.
impl Drop for Inner {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn apply_effects(inner: &Rc<RefCell<Inner>>, effects: Vec<Effect>) {
    for effect in effects {
        match effect {
            Effect::Revealed(coverage) => {
                let (host, callback) = {
                    let st = inner.borrow();
                    st.start_frames();
                    (st.host.clone(), st.on_reveal.clone())
                };
                publish_reveal(&host, callback.as_ref(), coverage);
            }
            Effect::Pop(on) => inner.borrow().set_pop(on),
            Effect::ImagePop(on) => inner.borrow().set_image_pop(on),
            Effect::UnlockAudio => {
                if let Some(audio) = &inner.borrow().audio {
                    audio.unlock();
                }
            }
            Effect::StartAudio(cue) => {
                if let Some(audio) = &inner.borrow().audio {
                    audio.start(&cue);
                }
            }
        }
    }
}

fn publish_reveal(host: &Element, callback: Option<&js_sys::Function>, coverage: f64) {
    let detail = JsValue::from_f64(coverage);
    let init = CustomEventInit::new();
    init.set_bubbles(true);
    init.set_detail(&detail);
    match CustomEvent::new_with_event_init_dict(REVEAL_EVENT, &init) {
        Ok(event) => {
            host.dispatch_event(&event).ok();
        }
        Err(err) => log::warn!("could not create reveal event: {err:?}"),
    }
    if let Some(cb) = callback {
        if let Err(err) = cb.call1(&JsValue::NULL, &detail) {
            log::warn!("onReveal callback threw: {err:?}");
        }
    }
}

// --- Input -----------------------------------------------------------------------

#[derive(Clone, Copy)]
enum Input {
    Down(f64, f64),
    Move(f64, f64),
    Up,
}

fn handle_input(inner: &Rc<RefCell<Inner>>, input: Input) {
    let mut queue = EffectQueue::default();
    {
        let Ok(mut st) = inner.try_borrow_mut() else { return };
        if st.destroyed {
            return;
        }
        let to_local = |st: &Inner, x: f64, y: f64| {
            let rect = st.card.cover().canvas().get_bounding_client_rect();
            Point::from_client(x, y, rect.left(), rect.top())
        };
        match input {
            Input::Down(x, y) => {
                let p = to_local(&*st, x, y);
                st.card.pointer_down(p, &mut queue);
            }
            Input::Move(x, y) => {
                let p = to_local(&*st, x, y);
                st.card.pointer_move(p, &mut queue);
            }
            Input::Up => st.card.pointer_up(),
        }
    }
    apply_effects(inner, queue.effects);
}

fn first_touch(evt: &Event) -> Option<(f64, f64)> {
    let touch = evt.unchecked_ref::<TouchEvent>().touches().get(0)?;
    Some((touch.client_x() as f64, touch.client_y() as f64))
}

fn mouse_xy(evt: &Event) -> (f64, f64) {
    let m = evt.unchecked_ref::<MouseEvent>();
    (m.client_x() as f64, m.client_y() as f64)
}

fn listen(
    inner: &Rc<RefCell<Inner>>,
    target: &EventTarget,
    name: &'static str,
    to_input: fn(&Event) -> Option<Input>,
) -> Result<Listener> {
    let weak: Weak<RefCell<Inner>> = Rc::downgrade(inner);
    let closure = Closure::wrap(Box::new(move |evt: Event| {
        let Some(inner) = weak.upgrade() else { return };
        if let Some(input) = to_input(&evt) {
            handle_input(&inner, input);
        }
    }) as Box<dyn FnMut(Event)>);
    target
        .add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())
        .map_err(ScratchError::js)?;
    Ok((target.clone(), name, closure))
}

fn attach_listeners(inner: &Rc<RefCell<Inner>>, canvas: &HtmlCanvasElement) -> Result<()> {
    let target: &EventTarget = canvas.as_ref();
    let table: [(&'static str, fn(&Event) -> Option<Input>); 7] = [
        ("mousedown", |e| {
            let (x, y) = mouse_xy(e);
            Some(Input::Down(x, y))
        }),
        ("mousemove", |e| {
            let (x, y) = mouse_xy(e);
            Some(Input::Move(x, y))
        }),
        ("mouseup", |_| Some(Input::Up)),
        ("mouseleave", |_| Some(Input::Up)),
        ("touchstart", |e| first_touch(e).map(|(x, y)| Input::Down(x, y))),
        ("touchmove", |e| first_touch(e).map(|(x, y)| Input::Move(x, y))),
        ("touchend", |_| Some(Input::Up)),
    ];
    for (name, to_input) in table {
        let listener = listen(inner, target, name, to_input)?;
        inner.borrow_mut().listeners.push(listener);
    }
    Ok(())
}

// --- Frames ------------------------------------------------------------------------

fn frame_step(weak: &Weak<RefCell<Inner>>, ts: f64) -> bool {
    let Some(inner) = weak.upgrade() else { return false };
    let mut queue = EffectQueue::default();
    let more = {
        let Ok(mut st) = inner.try_borrow_mut() else { return true };
        let st = &mut *st;
        if st.destroyed {
            return false;
        }
        st.card.tick(ts, &mut st.particles, &mut queue)
    };
    apply_effects(&inner, queue.effects);
    more
}

// --- Cover image ---------------------------------------------------------------------

fn load_cover_image(inner: &Rc<RefCell<Inner>>, src: &str) -> Result<()> {
    let img = HtmlImageElement::new().map_err(ScratchError::js)?;
    let weak = Rc::downgrade(inner);
    let loaded = img.clone();
    let onload = Closure::once_into_js(move || {
        let Some(inner) = weak.upgrade() else { return };
        let Ok(mut st) = inner.try_borrow_mut() else { return };
        if st.destroyed {
            return;
        }
        match st.card.cover_mut().draw_image(&loaded) {
            Ok(()) => {
                st.card.mark_cover_ready();
                log::debug!("cover image ready");
            }
            Err(err) => log::warn!("cover image draw failed: {err}"),
        }
    });
    img.set_onload(Some(onload.unchecked_ref()));
    img.set_src(src);
    Ok(())
}

// --- Exported widget -------------------------------------------------------------------

/// Scratch card mounted inside a host element.
#[wasm_bindgen]
pub struct ScratchCard {
    inner: Rc<RefCell<Inner>>,
}

#[wasm_bindgen]
impl ScratchCard {
    /// Mount into the element with id `host_id`, configured by camelCase JSON.
    #[wasm_bindgen(constructor)]
    pub fn new(host_id: &str, config_json: &str) -> std::result::Result<ScratchCard, JsValue> {
        let config = CardConfig::from_json(config_json)?;
        Ok(Self::mount(host_id, config)?)
    }

    /// Mount one of the built-in presets (`card`, `card-two`, `heart`,
    /// `heart-image`, `circle`).
    #[wasm_bindgen(js_name = fromPreset)]
    pub fn from_preset(host_id: &str, variant: &str) -> std::result::Result<ScratchCard, JsValue> {
        let variant: Variant = variant.parse()?;
        Ok(Self::mount(host_id, CardConfig::preset(variant))?)
    }

    #[wasm_bindgen(js_name = isRevealed)]
    pub fn is_revealed(&self) -> bool {
        self.inner.borrow().card.is_revealed()
    }

    /// Coverage measured by the most recent check.
    pub fn coverage(&self) -> f64 {
        self.inner.borrow().card.machine().last_coverage()
    }

    /// Register `callback(coverage)`, invoked once on reveal.
    #[wasm_bindgen(js_name = onReveal)]
    pub fn on_reveal(&self, callback: js_sys::Function) {
        self.inner.borrow_mut().on_reveal = Some(callback);
    }

    /// Stop animations, detach listeners and remove the widget's DOM.
    pub fn destroy(&self) {
        match self.inner.try_borrow_mut() {
            Ok(mut st) => st.shutdown(),
            Err(_) => log::warn!("destroy called re-entrantly; ignoring"),
        }
    }
}

impl ScratchCard {
    fn mount(host_id: &str, config: CardConfig) -> Result<ScratchCard> {
        config.validate()?;
        let win = window().ok_or(ScratchError::NoWindow)?;
        let doc = win.document().ok_or(ScratchError::NoDocument)?;
        let host = doc
            .get_element_by_id(host_id)
            .ok_or_else(|| ScratchError::MissingElement(host_id.to_string()))?;

        let (w, h) = (config.surface_width, config.surface_height);
        let ratio = config
            .pixel_ratio
            .unwrap_or_else(|| win.device_pixel_ratio())
            .max(1.0);

        let container: HtmlElement = create(&doc, "div")?;
        container.set_class_name("scratch-card");
        let (width_px, height_px) = (format!("{w}px"), format!("{h}px"));
        set_styles(
            &container,
            &[
                ("position", "relative"),
                ("width", &width_px),
                ("height", &height_px),
                ("overflow", "hidden"),
                ("transition", &format!("transform {}ms ease", config.pop_duration_ms)),
            ],
        );
        if let Some(clip) = &config.clip_path {
            set_styles(&container, &[("clip-path", clip)]);
        }

        let image = match &config.reveal_image {
            Some(src) => Some(reveal_image(&doc, &container, src, &config)?),
            None => None,
        };
        let cover_canvas = layer_canvas(&doc, &container, &width_px, &height_px)?;
        set_styles(&cover_canvas, &[("touch-action", "none"), ("cursor", "pointer")]);
        let glitter_canvas = layer_canvas(&doc, &container, &width_px, &height_px)?;
        set_styles(&glitter_canvas, &[("pointer-events", "none")]);

        let cover = CanvasCover::new(cover_canvas.clone(), w, h, ratio, config.cover_color())?;
        let particles = CanvasParticles::new(&glitter_canvas, w, h)?;
        let audio = config
            .reward_audio
            .as_ref()
            .map(|cue| AudioPlayer::new(&cue.src))
            .transpose()?;
        let cover_image = match &config.cover {
            CoverPaint::Image(src) => Some(src.clone()),
            CoverPaint::Color(_) => None,
        };
        let pop_scale = config.pop_scale;

        let inner = Rc::new(RefCell::new(Inner {
            card: Card::new(config, cover),
            particles,
            host: host.clone(),
            container: container.clone(),
            image,
            audio,
            frames: None,
            listeners: Vec::new(),
            retired: Vec::new(),
            on_reveal: None,
            pop_scale,
            destroyed: false,
        }));

        // From here on an early return drops `inner`, whose teardown
        // unregisters whatever listeners were already attached.
        let weak = Rc::downgrade(&inner);
        inner.borrow_mut().frames = Some(FrameLoop::new(move |ts| frame_step(&weak, ts)));
        attach_listeners(&inner, &cover_canvas)?;
        if let Some(src) = cover_image {
            load_cover_image(&inner, &src)?;
        }
        // Attach last so a failed mount leaves the host untouched.
        host.append_child(&container).map_err(ScratchError::js)?;

        log::info!("mounted {w}x{h} scratch card in #{host_id}");
        Ok(ScratchCard { inner })
    }
}

fn layer_canvas(doc: &Document, parent: &HtmlElement, width: &str, height: &str) -> Result<HtmlCanvasElement> {
    let canvas: HtmlCanvasElement = create(doc, "canvas")?;
    set_styles(
        &canvas,
        &[
            ("position", "absolute"),
            ("top", "0"),
            ("left", "0"),
            ("width", width),
            ("height", height),
        ],
    );
    parent.append_child(&canvas).map_err(ScratchError::js)?;
    Ok(canvas)
}

fn reveal_image(doc: &Document, parent: &HtmlElement, src: &str, config: &CardConfig) -> Result<HtmlElement> {
    let img: HtmlImageElement = create(doc, "img")?;
    img.set_src(src);
    img.set_alt("Hidden");
    let transition = format!("transform {}ms ease", config.image_pop_duration_ms.unwrap_or(350.0));
    set_styles(
        &img,
        &[
            ("position", "absolute"),
            ("inset", "0"),
            ("width", "100%"),
            ("height", "100%"),
            ("object-fit", "cover"),
            ("transition", &transition),
        ],
    );
    parent.append_child(&img).map_err(ScratchError::js)?;
    Ok(img.into())
}
