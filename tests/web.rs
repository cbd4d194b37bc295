// Browser tests for the exported widget. Run with `wasm-pack test --headless --chrome`.
#![cfg(target_arch = "wasm32")]

use scratch_card::web::ScratchCard;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::*;
use web_sys::{CanvasRenderingContext2d, Element, HtmlCanvasElement};

wasm_bindgen_test_configure!(run_in_browser);

fn host(id: &str) -> Element {
    let doc = web_sys::window().unwrap().document().unwrap();
    let el = doc.create_element("div").unwrap();
    el.set_id(id);
    doc.body().unwrap().append_child(&el).unwrap();
    el
}

fn canvases(el: &Element) -> Vec<HtmlCanvasElement> {
    let list = el.query_selector_all("canvas").unwrap();
    (0..list.length())
        .filter_map(|i| list.item(i))
        .map(|n| n.dyn_into::<HtmlCanvasElement>().unwrap())
        .collect()
}

fn drag(canvas: &HtmlCanvasElement, y: f64, steps: i32) {
    let rect = canvas.get_bounding_client_rect();
    for i in 0..steps {
        let init = web_sys::MouseEventInit::new();
        init.set_client_x((rect.left() + 10.0 * i as f64) as i32);
        init.set_client_y((rect.top() + y) as i32);
        let evt = web_sys::MouseEvent::new_with_mouse_event_init_dict("mousemove", &init).unwrap();
        canvas.dispatch_event(evt.unchecked_ref()).unwrap();
    }
}

fn pixels(canvas: &HtmlCanvasElement) -> Vec<u8> {
    let ctx = canvas
        .get_context("2d")
        .unwrap()
        .unwrap()
        .dyn_into::<CanvasRenderingContext2d>()
        .unwrap();
    ctx.get_image_data(0.0, 0.0, canvas.width() as f64, canvas.height() as f64)
        .unwrap()
        .data()
        .0
}

async fn wait_ms(ms: i32) {
    let promise = js_sys::Promise::new(&mut |resolve, _| {
        web_sys::window()
            .unwrap()
            .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms)
            .unwrap();
    });
    JsFuture::from(promise).await.unwrap();
}

#[wasm_bindgen_test]
fn mounts_and_destroys_preset() {
    let el = host("sc-preset");
    let card = ScratchCard::from_preset("sc-preset", "card").unwrap();
    assert!(!card.is_revealed());
    assert_eq!(el.child_element_count(), 1);
    assert_eq!(canvases(&el).len(), 2);
    card.destroy();
    card.destroy();
    assert_eq!(el.child_element_count(), 0);
}

#[wasm_bindgen_test]
fn rejects_bad_config_and_missing_host() {
    let el = host("sc-bad");
    assert!(ScratchCard::new("sc-bad", r#"{"revealThreshold": 2}"#).is_err());
    assert!(ScratchCard::new("sc-bad", r#"{"popScale": 0}"#).is_err());
    assert!(ScratchCard::new("does-not-exist", "{}").is_err());
    assert!(ScratchCard::from_preset("sc-bad", "hexagon").is_err());
    assert_eq!(el.child_element_count(), 0);
}

#[wasm_bindgen_test]
fn mouse_moves_scratch_the_cover() {
    let el = host("sc-mouse");
    let card = ScratchCard::new("sc-mouse", r#"{"pixelRatio": 1, "revealThreshold": 0.99}"#).unwrap();
    drag(&canvases(&el)[0], 150.0, 20);
    assert!(card.coverage() > 0.0);
    assert!(!card.is_revealed());
    card.destroy();
}

#[wasm_bindgen_test]
async fn destroy_mid_reward_freezes_both_layers() {
    let el = host("sc-mid");
    let card = ScratchCard::new("sc-mid", r#"{"pixelRatio": 1, "revealThreshold": 0.05}"#).unwrap();
    let layers = canvases(&el);
    drag(&layers[0], 150.0, 20);
    assert!(card.is_revealed());

    wait_ms(50).await;
    card.destroy();
    let cover = pixels(&layers[0]);
    let glitter = pixels(&layers[1]);
    wait_ms(200).await;
    assert_eq!(pixels(&layers[0]), cover);
    assert_eq!(pixels(&layers[1]), glitter);
    assert_eq!(el.child_element_count(), 0);
}

#[wasm_bindgen_test]
async fn dropping_without_destroy_tears_down() {
    let el = host("sc-drop");
    let card = ScratchCard::new("sc-drop", r#"{"pixelRatio": 1, "revealThreshold": 0.05}"#).unwrap();
    let layers = canvases(&el);
    drag(&layers[0], 150.0, 20);
    assert!(card.is_revealed());
    drop(card);
    assert_eq!(el.child_element_count(), 0);

    let glitter = pixels(&layers[1]);
    // Late input and frames hit no freed closures and change nothing.
    drag(&layers[0], 100.0, 5);
    wait_ms(100).await;
    assert_eq!(pixels(&layers[1]), glitter);
}
