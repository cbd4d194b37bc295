//! Glitter particle drivers.
//!
//! Two flavours: a one-shot `Burst` that expires after a fixed lifetime, and
//! `AmbientGlitter`, motes that float up from the bottom edge and respawn until
//! the owner stops them. Both are stepped once per animation frame and draw
//! through a `ParticlePainter`. Nothing here touches reveal state.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::surface::{Point, Rgba};

/// Default glitter colour (gold).
pub const GOLD: Rgba = Rgba::rgb(255, 215, 0);

/// Target the particle layer is drawn onto.
pub trait ParticlePainter {
    fn clear(&mut self);
    fn fill_circle(&mut self, x: f64, y: f64, radius: f64, color: Rgba);
}

/// Closed numeric range `[min, max]` used for randomized particle parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub min: f64,
    pub max: f64,
}

impl Span {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn is_ordered(&self) -> bool {
        self.min <= self.max
    }

    /// Both ends finite and `max - min` representable.
    pub fn is_finite(&self) -> bool {
        (self.max - self.min).is_finite()
    }

    /// Uniform value in `[min, max)`. Never panics: an empty or inverted span
    /// yields `min`, and a span too wide for `gen_range` is interpolated.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if !(self.min < self.max) {
            return if self.min.is_finite() { self.min } else { 0.0 };
        }
        if !self.is_finite() {
            if !(self.min.is_finite() && self.max.is_finite()) {
                return 0.0;
            }
            let t = rng.r#gen::<f64>();
            return self.min * (1.0 - t) + self.max * t;
        }
        rng.gen_range(self.min..self.max)
    }

    pub fn contains(&self, v: f64) -> bool {
        v >= self.min && v <= self.max
    }
}

// --- Burst -------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
pub struct BurstConfig {
    pub count: usize,
    pub velocity: Span, // per-axis velocity, pixels per frame
    pub size: Span,     // radius in pixels
    pub lifetime: u32,  // frames
    pub color: Rgba,
    /// Extra displacement, as a fraction of velocity, applied on the first step.
    pub first_frame_boost: f64,
}

impl Default for BurstConfig {
    fn default() -> Self {
        Self {
            count: 120,
            velocity: Span::new(-5.0, 5.0),
            size: Span::new(2.0, 7.0),
            lifetime: 60,
            color: GOLD,
            first_frame_boost: 0.0,
        }
    }
}

/// One glitter speck of a burst.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub size: f64,
    pub life: u32, // frames left
}

impl Particle {
    pub fn is_alive(&self) -> bool {
        self.life > 0
    }
}

/// Radial glitter burst that runs until every particle has expired.
#[derive(Clone, Debug)]
pub struct Burst {
    particles: Vec<Particle>,
    lifetime: u32,
    color: Rgba,
    boost: f64,
    steps: u32,
}

impl Burst {
    pub fn new<R: Rng + ?Sized>(origin: Point, config: &BurstConfig, rng: &mut R) -> Self {
        let particles = (0..config.count)
            .map(|_| Particle {
                x: origin.x,
                y: origin.y,
                vx: config.velocity.sample(rng),
                vy: config.velocity.sample(rng),
                size: config.size.sample(rng),
                life: config.lifetime,
            })
            .collect();
        Self {
            particles,
            lifetime: config.lifetime.max(1),
            color: config.color,
            boost: config.first_frame_boost,
            steps: 0,
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn alive(&self) -> usize {
        self.particles.iter().filter(|p| p.is_alive()).count()
    }

    pub fn is_running(&self) -> bool {
        self.particles.iter().any(Particle::is_alive)
    }

    /// Move and age every particle by one frame.
    pub fn advance(&mut self) {
        let boost = if self.steps == 0 { self.boost } else { 0.0 };
        for p in &mut self.particles {
            p.x += p.vx * (1.0 + boost);
            p.y += p.vy * (1.0 + boost);
            p.life = p.life.saturating_sub(1);
        }
        self.steps += 1;
    }

    /// Draw live particles with alpha proportional to remaining life.
    pub fn render<P: ParticlePainter + ?Sized>(&self, painter: &mut P) {
        for p in self.particles.iter().filter(|p| p.is_alive()) {
            let alpha = p.life as f64 / self.lifetime as f64;
            painter.fill_circle(p.x, p.y, p.size, self.color.with_alpha(alpha));
        }
    }

    /// One full frame on a layer of its own: clear, advance, draw.
    /// Returns whether another frame should be scheduled.
    pub fn step<P: ParticlePainter + ?Sized>(&mut self, painter: &mut P) -> bool {
        painter.clear();
        self.advance();
        self.render(painter);
        self.is_running()
    }
}

// --- Ambient glitter -----------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AmbientConfig {
    pub count: usize,
    pub size: Span,
    pub rise_speed: Span,   // pixels per frame, upward
    pub fade_per_step: f64, // opacity lost per frame
    pub spawn_band: f64,    // motes spawn this far below the bottom edge
    pub color: Rgba,
}

impl Default for AmbientConfig {
    fn default() -> Self {
        Self {
            count: 45,
            size: Span::new(1.0, 3.0),
            rise_speed: Span::new(0.3, 0.9),
            fade_per_step: 0.004,
            spawn_band: 50.0,
            color: GOLD,
        }
    }
}

/// Floating speck of ambient glitter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mote {
    pub x: f64,
    pub y: f64,
    pub speed: f64,
    pub size: f64,
    pub opacity: f64,
}

/// Endless rising glitter; stops only when told to.
#[derive(Clone, Debug)]
pub struct AmbientGlitter {
    motes: Vec<Mote>,
    config: AmbientConfig,
    width: f64,
    height: f64,
    running: bool,
    respawns: u64,
}

impl AmbientGlitter {
    pub fn new<R: Rng + ?Sized>(width: f64, height: f64, config: AmbientConfig, rng: &mut R) -> Self {
        let mut glitter = Self {
            motes: Vec::with_capacity(config.count),
            config,
            width,
            height,
            running: true,
            respawns: 0,
        };
        for _ in 0..glitter.config.count {
            let mote = glitter.spawn(rng);
            glitter.motes.push(mote);
        }
        glitter
    }

    fn spawn<R: Rng + ?Sized>(&self, rng: &mut R) -> Mote {
        Mote {
            x: Span::new(0.0, self.width).sample(rng),
            y: self.height + Span::new(0.0, self.config.spawn_band).sample(rng),
            speed: self.config.rise_speed.sample(rng),
            size: self.config.size.sample(rng),
            opacity: rng.r#gen::<f64>(),
        }
    }

    pub fn motes(&self) -> &[Mote] {
        &self.motes
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Total respawns so far.
    pub fn respawns(&self) -> u64 {
        self.respawns
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Rise, fade, draw, and recycle motes that faded out or left the top.
    pub fn advance_and_render<R, P>(&mut self, rng: &mut R, painter: &mut P)
    where
        R: Rng + ?Sized,
        P: ParticlePainter + ?Sized,
    {
        if !self.running {
            return;
        }
        for i in 0..self.motes.len() {
            let mut m = self.motes[i];
            m.y -= m.speed;
            m.opacity -= self.config.fade_per_step;
            if m.opacity > 0.0 {
                painter.fill_circle(m.x, m.y, m.size, self.config.color.with_alpha(m.opacity));
            }
            if m.opacity <= 0.0 || m.y < 0.0 {
                // A mote keeps its speed and size across respawns.
                let fresh = self.spawn(rng);
                m = Mote { speed: m.speed, size: m.size, ..fresh };
                self.respawns += 1;
            }
            self.motes[i] = m;
        }
    }
}
