//! Reward sequence played once when a card is revealed.
//!
//! Everything is frame-driven: the host calls `RewardSequence::tick` from its
//! animation callback with a millisecond timestamp and keeps scheduling frames
//! while it returns `true`. Fixed-delay cues (pop revert, delayed audio) are
//! kept on the same timeline, so stopping the sequence also drops them.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::particles::{AmbientConfig, AmbientGlitter, Burst, BurstConfig, ParticlePainter};
use crate::surface::{CoverLayer, Point};

// --- Cover fade ----------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FadeStyle {
    /// Clear and repaint the cover paint at decreasing opacity.
    #[default]
    Repaint,
    /// Destination-out the whole surface with decreasing strength.
    Erase,
}

/// Fades the remaining cover to nothing over a fixed number of steps.
#[derive(Clone, Debug)]
pub struct CoverFade {
    style: FadeStyle,
    step: u32,
    steps: u32,
}

impl CoverFade {
    pub fn new(style: FadeStyle, steps: u32) -> Self {
        Self { style, step: 0, steps: steps.max(1) }
    }

    pub fn is_done(&self) -> bool {
        self.step >= self.steps
    }

    /// Opacity the cover will be drawn at on the next step.
    pub fn next_opacity(&self) -> f64 {
        1.0 - (self.step + 1) as f64 / self.steps as f64
    }

    pub fn step<C: CoverLayer + ?Sized>(&mut self, cover: &mut C) {
        if self.is_done() {
            return;
        }
        let opacity = self.next_opacity();
        self.step += 1;
        if self.is_done() {
            cover.clear();
            return;
        }
        match self.style {
            FadeStyle::Repaint => cover.repaint(opacity),
            FadeStyle::Erase => cover.erase_all(opacity),
        }
    }
}

// --- Audio -----------------------------------------------------------------------

/// When a card's audio starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AudioTrigger {
    /// `delay_ms` after the reveal; the first gesture only unlocks playback.
    #[default]
    Reveal,
    /// On the first press or scratch. `delay_ms` is ignored.
    Gesture,
}

/// Optional audio attached to a card.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioCue {
    pub src: String,
    #[serde(default)]
    pub start_offset_secs: f64,
    #[serde(default = "default_volume")]
    pub volume: f64,
    #[serde(default)]
    pub delay_ms: f64,
    #[serde(default)]
    pub trigger: AudioTrigger,
    #[serde(default, rename = "loop")]
    pub looped: bool,
}

impl AudioCue {
    /// Reveal-triggered, non-looping cue with the default volume.
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            start_offset_secs: 0.0,
            volume: default_volume(),
            delay_ms: 0.0,
            trigger: AudioTrigger::Reveal,
            looped: false,
        }
    }
}

fn default_volume() -> f64 {
    0.8
}

// --- Hooks -----------------------------------------------------------------------

/// Side effects a card asks its host to perform. All presentation lives on the
/// other side of this trait.
pub trait CardHooks {
    /// Reveal transition happened (fires exactly once per card).
    fn revealed(&mut self, coverage: f64);
    fn set_pop(&mut self, on: bool);
    fn set_image_pop(&mut self, on: bool);
    /// Called once on the first user gesture so later playback is allowed.
    fn unlock_audio(&mut self) {}
    /// Reveal cues call this from the timeline, gesture cues on first input.
    fn start_audio(&mut self, cue: &AudioCue);
}

// --- Sequence --------------------------------------------------------------------

/// Static description of the reward, derived from the card config.
#[derive(Clone, Debug)]
pub struct RewardPlan {
    pub origin: Point,
    pub burst: BurstConfig,
    pub ambient: Option<AmbientConfig>,
    pub fade_style: FadeStyle,
    pub fade_steps: u32,
    pub pop_duration_ms: f64,
    pub image_pop_duration_ms: Option<f64>,
    pub audio: Option<AudioCue>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CueKind {
    PopOff,
    ImagePopOff,
    Audio,
}

#[derive(Clone, Copy, Debug)]
struct Cue {
    at_ms: f64, // relative to the first tick
    kind: CueKind,
}

/// Running reward animation: cover fade, glitter, delayed cues.
#[derive(Debug)]
pub struct RewardSequence {
    plan: RewardPlan,
    started_at: Option<f64>,
    fade: CoverFade,
    burst: Burst,
    ambient: Option<AmbientGlitter>,
    cues: Vec<Cue>, // pending, sorted by time
    stopped: bool,
}

impl RewardSequence {
    pub fn new<R: Rng + ?Sized>(plan: RewardPlan, surface: (u32, u32), rng: &mut R) -> Self {
        let burst = Burst::new(plan.origin, &plan.burst, rng);
        let ambient = plan
            .ambient
            .clone()
            .map(|cfg| AmbientGlitter::new(surface.0 as f64, surface.1 as f64, cfg, rng));
        let mut cues = vec![Cue { at_ms: plan.pop_duration_ms, kind: CueKind::PopOff }];
        if let Some(ms) = plan.image_pop_duration_ms {
            cues.push(Cue { at_ms: ms, kind: CueKind::ImagePopOff });
        }
        if let Some(audio) = plan.audio.as_ref().filter(|a| a.trigger == AudioTrigger::Reveal) {
            cues.push(Cue { at_ms: audio.delay_ms, kind: CueKind::Audio });
        }
        cues.sort_by(|a, b| a.at_ms.total_cmp(&b.at_ms));
        Self {
            fade: CoverFade::new(plan.fade_style, plan.fade_steps),
            plan,
            started_at: None,
            burst,
            ambient,
            cues,
            stopped: false,
        }
    }

    pub fn burst(&self) -> &Burst {
        &self.burst
    }

    pub fn ambient(&self) -> Option<&AmbientGlitter> {
        self.ambient.as_ref()
    }

    pub fn fade(&self) -> &CoverFade {
        &self.fade
    }

    pub fn pending_cues(&self) -> usize {
        self.cues.len()
    }

    /// True while any part still needs frames.
    pub fn is_running(&self) -> bool {
        !self.stopped
            && (!self.fade.is_done()
                || self.burst.is_running()
                || !self.cues.is_empty()
                || self.ambient.as_ref().is_some_and(AmbientGlitter::is_running))
    }

    /// Halt everything; pending cues are dropped without firing.
    pub fn stop(&mut self) {
        self.stopped = true;
        self.cues.clear();
        if let Some(ambient) = &mut self.ambient {
            ambient.stop();
        }
    }

    /// Advance one frame. Returns whether another frame is needed.
    pub fn tick<C, P, H, R>(&mut self, now_ms: f64, cover: &mut C, painter: &mut P, hooks: &mut H, rng: &mut R) -> bool
    where
        C: CoverLayer + ?Sized,
        P: ParticlePainter + ?Sized,
        H: CardHooks + ?Sized,
        R: Rng + ?Sized,
    {
        if self.stopped {
            return false;
        }
        let start = *self.started_at.get_or_insert_with(|| {
            hooks.set_pop(true);
            if self.plan.image_pop_duration_ms.is_some() {
                hooks.set_image_pop(true);
            }
            now_ms
        });
        let elapsed = now_ms - start;

        while let Some(cue) = self.cues.first().copied() {
            if cue.at_ms > elapsed {
                break;
            }
            self.cues.remove(0);
            match cue.kind {
                CueKind::PopOff => hooks.set_pop(false),
                CueKind::ImagePopOff => hooks.set_image_pop(false),
                CueKind::Audio => {
                    if let Some(audio) = &self.plan.audio {
                        hooks.start_audio(audio);
                    }
                }
            }
        }

        self.fade.step(cover);

        // One clear per frame; burst and ambient share the layer.
        painter.clear();
        if self.burst.is_running() {
            self.burst.advance();
            self.burst.render(painter);
        }
        if let Some(ambient) = &mut self.ambient {
            ambient.advance_and_render(rng, painter);
        }

        self.is_running()
    }
}
