//! Reveal state machine.
//!
//! Converts stroke points into erased segments on the cover and decides, from
//! periodic coverage samples, when the card flips to `Revealed`. The flip
//! happens at most once; the state itself is the guard.

use crate::coverage::{Region, estimate_region};
use crate::surface::{CoverLayer, Point};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RevealState {
    #[default]
    Scratching,
    Revealed, // terminal
}

/// What a single `draw_stroke` call did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrokeOutcome {
    /// No previous point: the point was only recorded.
    Anchored,
    /// A segment was erased from the previous point.
    Drawn,
    /// Card already revealed.
    Ignored,
}

/// Emitted exactly once, on the `Scratching -> Revealed` transition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reveal {
    pub coverage: f64,
}

/// Per-card stroke and threshold tracking.
#[derive(Clone, Debug)]
pub struct RevealMachine {
    state: RevealState,
    last_point: Option<Point>,
    strokes: u32,     // drawn segments since creation
    threshold: f64,   // reveal when coverage > threshold
    check_every: u32, // sample coverage every N drawn segments
    region: Region,
    brush_width: f64,
    last_coverage: f64,
}

impl RevealMachine {
    pub fn new(threshold: f64, check_every: u32, region: Region, brush_width: f64) -> Self {
        Self {
            state: RevealState::Scratching,
            last_point: None,
            strokes: 0,
            threshold,
            check_every: check_every.max(1),
            region,
            brush_width,
            last_coverage: 0.0,
        }
    }

    pub fn state(&self) -> RevealState {
        self.state
    }

    pub fn is_revealed(&self) -> bool {
        self.state == RevealState::Revealed
    }

    pub fn last_point(&self) -> Option<Point> {
        self.last_point
    }

    /// Coverage measured by the most recent check.
    pub fn last_coverage(&self) -> f64 {
        self.last_coverage
    }

    pub fn strokes(&self) -> u32 {
        self.strokes
    }

    /// Erase from the last recorded point to `point`. The first point after
    /// creation or `reset_stroke` only anchors, so no segment is drawn from an
    /// undefined origin.
    pub fn draw_stroke<C: CoverLayer + ?Sized>(&mut self, cover: &mut C, point: Point) -> StrokeOutcome {
        if self.is_revealed() {
            return StrokeOutcome::Ignored;
        }
        let outcome = match self.last_point {
            None => StrokeOutcome::Anchored,
            Some(from) => {
                cover.erase_segment(from, point, self.brush_width);
                self.strokes += 1;
                StrokeOutcome::Drawn
            }
        };
        self.last_point = Some(point);
        outcome
    }

    /// Sample coverage and transition if it exceeds the threshold.
    /// Returns `Some` only on the transition itself.
    pub fn maybe_check_reveal<C: CoverLayer + ?Sized>(&mut self, cover: &C) -> Option<Reveal> {
        if self.is_revealed() {
            return None;
        }
        let coverage = match estimate_region(cover, self.region) {
            Ok(c) => c,
            Err(err) => {
                log::warn!("coverage sample failed, skipping check: {err}");
                return None;
            }
        };
        self.last_coverage = coverage;
        if coverage > self.threshold {
            self.state = RevealState::Revealed;
            self.last_point = None;
            log::info!("card revealed at {:.1}% coverage", coverage * 100.0);
            return Some(Reveal { coverage });
        }
        None
    }

    /// Draw a stroke and run the throttled check every `check_every` drawn
    /// segments. Anchoring strokes never trigger a check.
    pub fn on_stroke<C: CoverLayer + ?Sized>(&mut self, cover: &mut C, point: Point) -> Option<Reveal> {
        match self.draw_stroke(cover, point) {
            StrokeOutcome::Drawn if self.strokes % self.check_every == 0 => self.maybe_check_reveal(cover),
            _ => None,
        }
    }

    /// Forget the last point (pointer left / touch ended).
    pub fn reset_stroke(&mut self) {
        self.last_point = None;
    }

    /// Record `point` as the stroke origin without drawing (press start).
    pub fn anchor(&mut self, point: Point) {
        if !self.is_revealed() {
            self.last_point = Some(point);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{RasterCover, Rgba};

    fn cover() -> RasterCover {
        RasterCover::new(100, 100, Rgba::rgb(156, 163, 175))
    }

    fn opaque_count(c: &RasterCover) -> usize {
        c.pixels().chunks_exact(4).filter(|px| px[3] == 255).count()
    }

    #[test]
    fn test_first_stroke_only_anchors() {
        let mut c = cover();
        let mut m = RevealMachine::new(0.5, 1, Region::Full, 20.0);
        assert_eq!(m.draw_stroke(&mut c, Point::new(10.0, 10.0)), StrokeOutcome::Anchored);
        assert_eq!(opaque_count(&c), 100 * 100);
        assert_eq!(m.draw_stroke(&mut c, Point::new(60.0, 10.0)), StrokeOutcome::Drawn);
        assert!(opaque_count(&c) < 100 * 100);
        assert_eq!(m.last_point(), Some(Point::new(60.0, 10.0)));
    }

    #[test]
    fn test_reset_stroke_starts_fresh_segment() {
        let mut c = cover();
        let mut m = RevealMachine::new(0.5, 1, Region::Full, 4.0);
        m.draw_stroke(&mut c, Point::new(10.0, 10.0));
        m.reset_stroke();
        assert_eq!(m.draw_stroke(&mut c, Point::new(90.0, 90.0)), StrokeOutcome::Anchored);
        // Nothing between the two points was erased.
        assert_eq!(c.alpha_at(50, 50), Some(255));
        assert_eq!(opaque_count(&c), 100 * 100);
    }

    #[test]
    fn test_reveal_fires_once() {
        let mut c = cover();
        let mut m = RevealMachine::new(0.1, 1, Region::Full, 60.0);
        m.draw_stroke(&mut c, Point::new(0.0, 50.0));
        let first = m.on_stroke(&mut c, Point::new(100.0, 50.0));
        assert!(first.is_some());
        assert!(m.is_revealed());
        assert_eq!(m.maybe_check_reveal(&c), None);
        assert_eq!(m.on_stroke(&mut c, Point::new(0.0, 0.0)), None);
    }

    #[test]
    fn test_strokes_ignored_after_reveal() {
        let mut c = RasterCover::from_rgba(10, 10, vec![0; 400]);
        let mut m = RevealMachine::new(0.5, 1, Region::Full, 4.0);
        assert!(m.maybe_check_reveal(&c).is_some());
        assert_eq!(m.draw_stroke(&mut c, Point::new(1.0, 1.0)), StrokeOutcome::Ignored);
        assert_eq!(m.last_point(), None);
    }

    #[test]
    fn test_check_every_n_strokes() {
        let mut c = RasterCover::from_rgba(10, 10, vec![0; 400]);
        let mut m = RevealMachine::new(0.5, 3, Region::Full, 1.0);
        m.draw_stroke(&mut c, Point::new(0.0, 0.0));
        assert_eq!(m.on_stroke(&mut c, Point::new(1.0, 0.0)), None);
        assert_eq!(m.on_stroke(&mut c, Point::new(2.0, 0.0)), None);
        assert!(m.on_stroke(&mut c, Point::new(3.0, 0.0)).is_some());
    }

    #[test]
    fn test_threshold_is_strict() {
        // Exactly half cleared, threshold 0.5: not revealed.
        let mut buf = vec![255u8; 400];
        for px in buf.chunks_exact_mut(4).take(50) {
            px.fill(0);
        }
        let c = RasterCover::from_rgba(10, 10, buf);
        let mut m = RevealMachine::new(0.5, 1, Region::Full, 1.0);
        assert_eq!(m.maybe_check_reveal(&c), None);
        assert_eq!(m.last_coverage(), 0.5);
        assert_eq!(m.state(), RevealState::Scratching);
    }
}
