//! Per-card configuration and the built-in presets.
//!
//! One `CardConfig` drives every card shape; the presets reproduce the tuning
//! of the individual card designs (thresholds, sampling, particle counts).
//! Configs arrive from JavaScript as camelCase JSON with every field optional.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::coverage::Region;
use crate::error::{Result, ScratchError};
use crate::particles::{AmbientConfig, BurstConfig, GOLD, Span};
use crate::reward::{AudioCue, AudioTrigger, FadeStyle, RewardPlan};
use crate::surface::{Point, Rgba};

pub const DEFAULT_COVER_COLOR: &str = "#9CA3AF";
const DEFAULT_GREY: Rgba = Rgba::rgb(0x9c, 0xa3, 0xaf);

/// Heart outline used by the heart presets (320x320 box).
pub const HEART_CLIP_PATH: &str = "path('M160 295 C25 215, 0 110, 85 55 C140 20, 160 75, 160 105 \
     C160 75, 180 20, 235 55 C320 110, 295 215, 160 295 Z')";

/// Slimmer heart outline of the `card-two` design.
pub const SLIM_HEART_CLIP_PATH: &str = "path('M160 295 C40 210, 10 95, 90 45 C140 10, 160 70, 160 95 \
     C160 70, 180 10, 230 45 C310 95, 280 210, 160 295Z')";

/// The heart designs sample a fixed 200x300 window of their 320x320 surface.
const HEART_SAMPLE: Region = Region::Rect { x: 0, y: 0, width: 200, height: 300 };

/// What the cover layer is painted with before scratching starts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CoverPaint {
    Color(String),
    /// Image drawn stretched over the surface; input is ignored until loaded.
    Image(String),
}

impl Default for CoverPaint {
    fn default() -> Self {
        CoverPaint::Color(DEFAULT_COVER_COLOR.to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CardConfig {
    // Surface
    pub surface_width: u32,
    pub surface_height: u32,
    pub pixel_ratio: Option<f64>, // None = window.devicePixelRatio
    pub cover: CoverPaint,
    pub fade_color: Option<String>, // image covers only; colour covers fade with their own colour
    // Reveal
    pub cover_region: Region,
    pub reveal_threshold: f64,
    pub check_every_n_strokes: u32,
    pub brush_width: f64,
    pub brush_width_fraction: Option<f64>, // brush = max(brush_width, fraction * width)
    pub require_press: bool,
    // Reward
    pub origin: Option<Point>, // None = surface centre
    pub particle_count: usize,
    pub particle_speed_range: Span,
    pub particle_size_range: Span,
    pub particle_lifetime: u32,
    pub particle_color: Rgba,
    pub first_frame_boost: f64,
    pub ambient_glitter: Option<AmbientConfig>,
    pub fade_steps: u32,
    pub fade_style: FadeStyle,
    pub pop_scale: f64,
    pub pop_duration_ms: f64,
    pub image_pop_duration_ms: Option<f64>,
    pub reward_audio: Option<AudioCue>,
    // Presentation
    pub clip_path: Option<String>,
    pub reveal_image: Option<String>,
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            surface_width: 200,
            surface_height: 300,
            pixel_ratio: None,
            cover: CoverPaint::default(),
            fade_color: None,
            cover_region: Region::Full,
            reveal_threshold: 0.85,
            check_every_n_strokes: 1,
            brush_width: 35.0,
            brush_width_fraction: None,
            require_press: false,
            origin: None,
            particle_count: 120,
            particle_speed_range: Span::new(-5.0, 5.0),
            particle_size_range: Span::new(2.0, 7.0),
            particle_lifetime: 60,
            particle_color: GOLD,
            first_frame_boost: 0.0,
            ambient_glitter: None,
            fade_steps: 13,
            fade_style: FadeStyle::Repaint,
            pop_scale: 1.1,
            pop_duration_ms: 300.0,
            image_pop_duration_ms: None,
            reward_audio: None,
            clip_path: None,
            reveal_image: None,
        }
    }
}

impl CardConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: CardConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(ScratchError::InvalidConfig(msg.to_string()));
        if self.surface_width == 0 || self.surface_height == 0 {
            return invalid("surface size must be positive");
        }
        if !(self.reveal_threshold > 0.0 && self.reveal_threshold <= 1.0) {
            return invalid("revealThreshold must be in (0, 1]");
        }
        if self.check_every_n_strokes == 0 {
            return invalid("checkEveryNStrokes must be at least 1");
        }
        if !(self.brush_width > 0.0) {
            return invalid("brushWidth must be positive");
        }
        let usable = |s: &Span| s.is_ordered() && s.is_finite();
        if !usable(&self.particle_speed_range) || !usable(&self.particle_size_range) {
            return invalid("particle ranges must be finite with min <= max");
        }
        if let Some(ambient) = &self.ambient_glitter {
            if !usable(&ambient.size) || !usable(&ambient.rise_speed) {
                return invalid("ambient glitter ranges must be finite with min <= max");
            }
        }
        if self.fade_steps == 0 {
            return invalid("fadeSteps must be at least 1");
        }
        if matches!(self.pixel_ratio, Some(r) if !(r > 0.0)) {
            return invalid("pixelRatio must be positive");
        }
        if !(self.pop_scale.is_finite() && self.pop_scale > 0.0) {
            return invalid("popScale must be a positive number");
        }
        if let CoverPaint::Color(hex) = &self.cover {
            if Rgba::from_hex(hex).is_none() {
                return invalid("cover colour must be #rgb or #rrggbb");
            }
        }
        if let Some(hex) = &self.fade_color {
            if Rgba::from_hex(hex).is_none() {
                return invalid("fadeColor must be #rgb or #rrggbb");
            }
        }
        Ok(())
    }

    /// Paint the cover is filled and faded with. Image covers use
    /// `fade_color`, grey when unset.
    pub fn cover_color(&self) -> Rgba {
        let hex = match &self.cover {
            CoverPaint::Color(c) => Some(c.as_str()),
            CoverPaint::Image(_) => self.fade_color.as_deref(),
        };
        hex.and_then(Rgba::from_hex).unwrap_or(DEFAULT_GREY)
    }

    pub fn effective_brush_width(&self) -> f64 {
        match self.brush_width_fraction {
            Some(f) => self.brush_width.max(self.surface_width as f64 * f),
            None => self.brush_width,
        }
    }

    pub fn origin(&self) -> Point {
        self.origin.unwrap_or_else(|| {
            Point::new(self.surface_width as f64 / 2.0, self.surface_height as f64 / 2.0)
        })
    }

    pub fn burst(&self) -> BurstConfig {
        BurstConfig {
            count: self.particle_count,
            velocity: self.particle_speed_range,
            size: self.particle_size_range,
            lifetime: self.particle_lifetime,
            color: self.particle_color,
            first_frame_boost: self.first_frame_boost,
        }
    }

    pub fn reward_plan(&self) -> RewardPlan {
        RewardPlan {
            origin: self.origin(),
            burst: self.burst(),
            ambient: self.ambient_glitter.clone(),
            fade_style: self.fade_style,
            fade_steps: self.fade_steps,
            pop_duration_ms: self.pop_duration_ms,
            image_pop_duration_ms: self.image_pop_duration_ms,
            audio: self.reward_audio.clone(),
        }
    }

    pub fn preset(variant: Variant) -> Self {
        let base = CardConfig::default();
        match variant {
            Variant::Card => base,
            Variant::CardTwo => CardConfig {
                surface_width: 320,
                surface_height: 320,
                cover_region: HEART_SAMPLE,
                reveal_threshold: 0.45,
                particle_count: 150,
                particle_speed_range: Span::new(-6.0, 6.0),
                particle_size_range: Span::new(2.0, 8.0),
                clip_path: Some(SLIM_HEART_CLIP_PATH.to_string()),
                ..base
            },
            Variant::Heart => CardConfig {
                clip_path: Some(HEART_CLIP_PATH.to_string()),
                ..CardConfig::preset(Variant::CardTwo)
            },
            Variant::HeartImage => CardConfig {
                cover: CoverPaint::Image("/image.jpg".to_string()),
                fade_color: Some("#FFFFFF".to_string()),
                cover_region: Region::Full,
                reward_audio: Some(AudioCue {
                    volume: 0.4,
                    trigger: AudioTrigger::Gesture,
                    looped: true,
                    ..AudioCue::new("/love_story.mp3")
                }),
                ..CardConfig::preset(Variant::Heart)
            },
            Variant::Circle => CardConfig {
                surface_width: 350,
                surface_height: 350,
                pixel_ratio: Some(1.0),
                cover: CoverPaint::Image("/fill circle-01.png".to_string()),
                cover_region: Region::Centered { width: 120, height: 120 },
                reveal_threshold: 0.55,
                check_every_n_strokes: 18,
                brush_width: 26.0,
                brush_width_fraction: Some(0.12),
                require_press: true,
                first_frame_boost: 0.35,
                ambient_glitter: Some(AmbientConfig::default()),
                fade_style: FadeStyle::Erase,
                pop_duration_ms: 450.0,
                image_pop_duration_ms: Some(350.0),
                pop_scale: 1.05,
                reward_audio: Some(AudioCue {
                    start_offset_secs: 66.0,
                    delay_ms: 250.0,
                    looped: true,
                    ..AudioCue::new("/love_story.mp3")
                }),
                reveal_image: Some("/image.jpg".to_string()),
                clip_path: Some("circle(50% at 50% 50%)".to_string()),
                ..CardConfig::preset(Variant::CardTwo)
            },
        }
    }
}

/// Named presets matching the card designs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Variant {
    Card,
    CardTwo,
    Heart,
    HeartImage,
    Circle,
}

impl Variant {
    pub const ALL: [Variant; 5] = [
        Variant::Card,
        Variant::CardTwo,
        Variant::Heart,
        Variant::HeartImage,
        Variant::Circle,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Variant::Card => "card",
            Variant::CardTwo => "card-two",
            Variant::Heart => "heart",
            Variant::HeartImage => "heart-image",
            Variant::Circle => "circle",
        }
    }
}

impl FromStr for Variant {
    type Err = ScratchError;

    fn from_str(s: &str) -> Result<Self> {
        Variant::ALL
            .into_iter()
            .find(|v| v.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ScratchError::UnknownVariant(s.to_string()))
    }
}
