// Placement engine: random overlap-free position for the runaway control.
// Rule: always produce a position. After the retry budget the last candidate wins,
// overlapping or not.

use rand::Rng;

use crate::error::EngineError;
use crate::types::*;

/// Samples candidate positions until one clears every forbidden rectangle.
/// Stateless apart from its retry budget; randomness is supplied per call.
#[derive(Debug, Clone)]
pub struct PlacementEngine {
    retry_budget: u32,
}

impl PlacementEngine {
    /// A budget of zero still samples one candidate.
    pub fn new(retry_budget: u32) -> Self {
        PlacementEngine {
            retry_budget: retry_budget.max(1),
        }
    }

    pub fn retry_budget(&self) -> u32 {
        self.retry_budget
    }

    /// Position for an element of size `element` inside `viewport` that
    /// overlaps none of `forbidden`, falling back to the last sampled
    /// candidate when the budget runs out.
    pub fn compute_position<R: Rng + ?Sized>(
        &self,
        viewport: Size,
        element: Size,
        forbidden: &[Rect],
        rng: &mut R,
    ) -> Position {
        match self.try_compute_position(viewport, element, forbidden, rng) {
            Ok(position) => position,
            Err(EngineError::PlacementExhausted { attempts, fallback }) => {
                log::debug!(
                    "no free spot after {} attempts against {} regions, using {}",
                    attempts,
                    forbidden.len(),
                    fallback
                );
                fallback
            }
            // try_compute_position only reports exhaustion.
            Err(_) => Position::origin(),
        }
    }

    /// Like [`compute_position`](Self::compute_position) but reports
    /// exhaustion as [`EngineError::PlacementExhausted`].
    pub fn try_compute_position<R: Rng + ?Sized>(
        &self,
        viewport: Size,
        element: Size,
        forbidden: &[Rect],
        rng: &mut R,
    ) -> Result<Position, EngineError> {
        let max_left = sampling_span(viewport.width, element.width);
        let max_top = sampling_span(viewport.height, element.height);

        let mut candidate = Position::origin();
        for _ in 0..self.retry_budget {
            candidate = Position::new(sample(rng, max_top), sample(rng, max_left));
            let rect = Rect::at(candidate, element);
            if !overlaps_any(&rect, forbidden) {
                return Ok(candidate);
            }
        }

        Err(EngineError::PlacementExhausted {
            attempts: self.retry_budget,
            fallback: candidate,
        })
    }
}

impl Default for PlacementEngine {
    fn default() -> Self {
        PlacementEngine::new(100)
    }
}

/// True when `candidate` touches or intersects any of `forbidden`.
pub fn overlaps_any(candidate: &Rect, forbidden: &[Rect]) -> bool {
    forbidden.iter().any(|rect| candidate.overlaps(rect))
}

/// Upper bound of the sampling interval on one axis, clamped to be non-negative.
fn sampling_span(viewport: f64, element: f64) -> f64 {
    let span = viewport - element;
    if span.is_finite() && span > 0.0 {
        span
    } else {
        0.0
    }
}

/// Uniform in `[0, max)`, or exactly 0 for an empty interval.
fn sample<R: Rng + ?Sized>(rng: &mut R, max: f64) -> f64 {
    if max > 0.0 {
        rng.gen::<f64>() * max
    } else {
        0.0
    }
}
