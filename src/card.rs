//! Platform-neutral scratch card: config + cover + reveal machine + reward.
//!
//! The browser widget feeds pointer events and animation frames into a
//! `Card<CanvasCover>`; tests drive a `Card<RasterCover>` the same way.

use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::config::{CardConfig, CoverPaint};
use crate::particles::ParticlePainter;
use crate::reveal::{Reveal, RevealMachine, RevealState};
use crate::reward::{AudioTrigger, CardHooks, RewardSequence};
use crate::surface::{CoverLayer, Point};

pub struct Card<C: CoverLayer> {
    config: CardConfig,
    cover: C,
    machine: RevealMachine,
    reward: Option<RewardSequence>,
    rng: SmallRng,
    pressed: bool,        // only meaningful with require_press
    ready: bool,          // image covers ignore input until loaded
    audio_requested: bool, // first gesture seen (unlock or gesture-triggered start)
    torn_down: bool,
}

impl<C: CoverLayer> Card<C> {
    pub fn new(config: CardConfig, cover: C) -> Self {
        Self::with_rng(config, cover, SmallRng::from_entropy())
    }

    pub fn with_rng(config: CardConfig, cover: C, rng: SmallRng) -> Self {
        let machine = RevealMachine::new(
            config.reveal_threshold,
            config.check_every_n_strokes,
            config.cover_region,
            config.effective_brush_width(),
        );
        let ready = matches!(config.cover, CoverPaint::Color(_));
        Self {
            config,
            cover,
            machine,
            reward: None,
            rng,
            pressed: false,
            ready,
            audio_requested: false,
            torn_down: false,
        }
    }

    pub fn config(&self) -> &CardConfig {
        &self.config
    }

    pub fn cover(&self) -> &C {
        &self.cover
    }

    pub fn cover_mut(&mut self) -> &mut C {
        &mut self.cover
    }

    pub fn machine(&self) -> &RevealMachine {
        &self.machine
    }

    pub fn state(&self) -> RevealState {
        self.machine.state()
    }

    pub fn is_revealed(&self) -> bool {
        self.machine.is_revealed()
    }

    pub fn reward(&self) -> Option<&RewardSequence> {
        self.reward.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Cover image finished drawing; input is accepted from now on.
    pub fn mark_cover_ready(&mut self) {
        self.ready = true;
    }

    fn accepts_input(&self) -> bool {
        self.ready && !self.torn_down && !self.machine.is_revealed()
    }

    /// First gesture: unlock playback for reveal cues, or start gesture cues.
    fn request_audio<H: CardHooks + ?Sized>(&mut self, hooks: &mut H) {
        if self.audio_requested {
            return;
        }
        let Some(cue) = &self.config.reward_audio else { return };
        self.audio_requested = true;
        match cue.trigger {
            AudioTrigger::Reveal => hooks.unlock_audio(),
            AudioTrigger::Gesture => hooks.start_audio(cue),
        }
    }

    /// Press start. Audio is requested even before an image cover is ready,
    /// since the press is the gesture browsers require.
    pub fn pointer_down<H: CardHooks + ?Sized>(&mut self, point: Point, hooks: &mut H) {
        if self.torn_down || self.machine.is_revealed() {
            return;
        }
        self.request_audio(hooks);
        if !self.accepts_input() {
            return;
        }
        self.pressed = true;
        self.machine.anchor(point);
    }

    /// Scratch towards `point`. Returns the reveal if this stroke caused it.
    pub fn pointer_move<H: CardHooks + ?Sized>(&mut self, point: Point, hooks: &mut H) -> Option<Reveal> {
        if !self.accepts_input() || (self.config.require_press && !self.pressed) {
            return None;
        }
        self.request_audio(hooks);
        let reveal = self.machine.on_stroke(&mut self.cover, point);
        self.after_check(reveal, hooks)
    }

    pub fn pointer_up(&mut self) {
        self.pressed = false;
        self.machine.reset_stroke();
    }

    pub fn pointer_leave(&mut self) {
        self.pointer_up();
    }

    /// Unthrottled coverage check.
    pub fn check_reveal<H: CardHooks + ?Sized>(&mut self, hooks: &mut H) -> Option<Reveal> {
        if self.torn_down {
            return None;
        }
        let reveal = self.machine.maybe_check_reveal(&self.cover);
        self.after_check(reveal, hooks)
    }

    fn after_check<H: CardHooks + ?Sized>(&mut self, reveal: Option<Reveal>, hooks: &mut H) -> Option<Reveal> {
        let reveal = reveal?;
        debug_assert!(self.reward.is_none(), "reward started twice");
        hooks.revealed(reveal.coverage);
        let size = self.cover.size();
        self.reward = Some(RewardSequence::new(self.config.reward_plan(), size, &mut self.rng));
        Some(reveal)
    }

    /// Whether the host should keep requesting animation frames.
    pub fn needs_frames(&self) -> bool {
        !self.torn_down && self.reward.as_ref().is_some_and(RewardSequence::is_running)
    }

    /// One animation frame. Returns whether another frame is needed.
    pub fn tick<P, H>(&mut self, now_ms: f64, painter: &mut P, hooks: &mut H) -> bool
    where
        P: ParticlePainter + ?Sized,
        H: CardHooks + ?Sized,
    {
        if self.torn_down {
            return false;
        }
        match &mut self.reward {
            Some(seq) => seq.tick(now_ms, &mut self.cover, painter, hooks, &mut self.rng),
            None => false,
        }
    }

    /// Stop all animation; every later call is a no-op.
    pub fn teardown(&mut self) {
        self.torn_down = true;
        self.pressed = false;
        self.machine.reset_stroke();
        if let Some(seq) = &mut self.reward {
            seq.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Variant;
    use crate::particles::tests::RecordingPainter;
    use crate::reward::tests::CountingHooks;
    use crate::surface::RasterCover;

    fn card(config: CardConfig) -> Card<RasterCover> {
        let cover = RasterCover::new(config.surface_width, config.surface_height, config.cover_color());
        Card::with_rng(config, cover, SmallRng::seed_from_u64(11))
    }

    fn sweep(card: &mut Card<RasterCover>, hooks: &mut CountingHooks) {
        let (w, h) = card.cover().size();
        let mut y = 0.0;
        while y <= h as f64 {
            card.pointer_leave();
            card.pointer_move(Point::new(-20.0, y), hooks);
            card.pointer_move(Point::new(w as f64 + 20.0, y), hooks);
            y += 10.0;
        }
    }

    #[test]
    fn test_sweeping_reveals_once() {
        let mut c = card(CardConfig::preset(Variant::Card));
        let mut hooks = CountingHooks::default();
        sweep(&mut c, &mut hooks);
        assert!(c.is_revealed());
        assert_eq!(hooks.revealed.len(), 1);
        sweep(&mut c, &mut hooks);
        assert!(c.check_reveal(&mut hooks).is_none());
        assert_eq!(hooks.revealed.len(), 1);
        assert_eq!(c.reward().unwrap().burst().len(), 120);
    }

    #[test]
    fn test_require_press_gates_moves() {
        let config = CardConfig {
            cover: CoverPaint::Color("#123456".into()),
            ..CardConfig::preset(Variant::Circle)
        };
        let mut c = card(config);
        let mut hooks = CountingHooks::default();
        c.pointer_move(Point::new(10.0, 10.0), &mut hooks);
        c.pointer_move(Point::new(300.0, 300.0), &mut hooks);
        assert_eq!(c.machine().strokes(), 0);
        assert_eq!(hooks.unlocks, 0);

        c.pointer_down(Point::new(10.0, 10.0), &mut hooks);
        assert_eq!(hooks.unlocks, 1);
        c.pointer_move(Point::new(300.0, 300.0), &mut hooks);
        assert_eq!(c.machine().strokes(), 1);

        c.pointer_up();
        c.pointer_move(Point::new(10.0, 300.0), &mut hooks);
        assert_eq!(c.machine().strokes(), 1);
        c.pointer_down(Point::new(0.0, 0.0), &mut hooks);
        assert_eq!(hooks.unlocks, 1);
    }

    #[test]
    fn test_image_cover_waits_until_ready() {
        let mut c = card(CardConfig {
            cover: CoverPaint::Image("/cover.png".into()),
            ..CardConfig::default()
        });
        let mut hooks = CountingHooks::default();
        assert!(!c.is_ready());
        c.pointer_move(Point::new(0.0, 0.0), &mut hooks);
        c.pointer_move(Point::new(50.0, 50.0), &mut hooks);
        assert_eq!(c.machine().strokes(), 0);
        c.mark_cover_ready();
        c.pointer_move(Point::new(0.0, 0.0), &mut hooks);
        c.pointer_move(Point::new(50.0, 50.0), &mut hooks);
        assert_eq!(c.machine().strokes(), 1);
    }

    #[test]
    fn test_input_after_teardown_is_ignored() {
        let mut c = card(CardConfig::default());
        let mut hooks = CountingHooks::default();
        c.pointer_move(Point::new(0.0, 150.0), &mut hooks);
        c.pointer_move(Point::new(100.0, 150.0), &mut hooks);
        assert_eq!(c.machine().strokes(), 1);
        c.teardown();

        let pixels = c.cover().pixels().to_vec();
        c.pointer_down(Point::new(0.0, 0.0), &mut hooks);
        c.pointer_move(Point::new(200.0, 300.0), &mut hooks);
        c.pointer_move(Point::new(0.0, 300.0), &mut hooks);
        c.pointer_up();
        assert_eq!(c.machine().strokes(), 1);
        assert_eq!(c.cover().pixels(), &pixels[..]);
        assert!(hooks.revealed.is_empty());
    }

    #[test]
    fn test_gesture_audio_starts_on_first_press() {
        let mut c = card(CardConfig::preset(Variant::HeartImage));
        let mut hooks = CountingHooks::default();
        // Image cover not loaded yet; the press still counts as the gesture.
        c.pointer_down(Point::new(10.0, 10.0), &mut hooks);
        assert_eq!(hooks.audio_starts, 1);
        assert_eq!(hooks.unlocks, 0);
        assert_eq!(c.machine().strokes(), 0);

        c.mark_cover_ready();
        c.pointer_down(Point::new(10.0, 10.0), &mut hooks);
        c.pointer_move(Point::new(200.0, 10.0), &mut hooks);
        assert_eq!(hooks.audio_starts, 1);

        c.cover_mut().clear();
        assert!(c.check_reveal(&mut hooks).is_some());
        let mut painter = RecordingPainter::default();
        let mut now = 0.0;
        while c.tick(now, &mut painter, &mut hooks) {
            now += 16.0;
        }
        assert_eq!(hooks.audio_starts, 1);
    }

    #[test]
    fn test_gesture_audio_starts_on_first_scratch() {
        let config = CardConfig { cover: CoverPaint::default(), ..CardConfig::preset(Variant::HeartImage) };
        let mut c = card(config);
        let mut hooks = CountingHooks::default();
        c.pointer_move(Point::new(10.0, 10.0), &mut hooks);
        c.pointer_move(Point::new(20.0, 10.0), &mut hooks);
        assert_eq!(hooks.audio_starts, 1);
    }

    #[test]
    fn test_teardown_stops_frames_and_input() {
        let mut c = card(CardConfig::preset(Variant::Circle));
        c.mark_cover_ready();
        let mut hooks = CountingHooks::default();
        // Clear the sampled centre directly, then force a check.
        c.cover_mut().clear();
        assert!(c.check_reveal(&mut hooks).is_some());
        let mut painter = RecordingPainter::default();
        assert!(c.tick(0.0, &mut painter, &mut hooks));
        assert!(c.needs_frames());
        c.teardown();
        assert!(!c.needs_frames());
        assert!(!c.tick(1_000.0, &mut painter, &mut hooks));
        assert_eq!(hooks.audio_starts, 0);
        assert!(c.check_reveal(&mut hooks).is_none());
    }
}
