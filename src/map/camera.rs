//! Camera state and retargetable transitions.
//!
//! Every camera command bumps a generation counter and returns it as an
//! `AnimationId`. Issuing a command mid-transition retargets the camera
//! from wherever it currently is; the superseded id simply never completes.

use crate::geo::projection::{from_mercator, to_mercator, world_size, MAX_ZOOM, MIN_ZOOM};
use geo_types::{Coord, Rect};
use std::time::Duration;

/// Generation number identifying one camera transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AnimationId(pub u64);

/// Camera position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    pub center: Coord<f64>,
    pub zoom: f64,
}

impl CameraView {
    pub fn new(center: Coord<f64>, zoom: f64) -> Self {
        Self {
            center,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
        }
    }
}

/// Interpolation style of a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraCurve {
    /// Smooth pan and zoom.
    Ease,
    /// Zooms out mid-flight and back in, for long jumps.
    Fly,
}

#[derive(Debug, Clone)]
struct Transition {
    id: AnimationId,
    from: CameraView,
    to: CameraView,
    curve: CameraCurve,
    started_at: Duration,
    duration: Duration,
}

/// Map camera with a local clock advanced by the frame loop.
#[derive(Debug, Clone)]
pub struct Camera {
    view: CameraView,
    transition: Option<Transition>,
    generation: u64,
    clock: Duration,
}

impl Camera {
    pub fn new(view: CameraView) -> Self {
        Self {
            view,
            transition: None,
            generation: 0,
            clock: Duration::ZERO,
        }
    }

    /// Current (possibly mid-transition) view.
    pub fn view(&self) -> CameraView {
        self.view
    }

    /// Where the camera will come to rest.
    pub fn destination(&self) -> CameraView {
        self.transition
            .as_ref()
            .map(|t| t.to)
            .unwrap_or(self.view)
    }

    pub fn is_animating(&self, id: AnimationId) -> bool {
        self.transition.as_ref().is_some_and(|t| t.id == id)
    }

    /// Id of the running transition, if any.
    pub fn active(&self) -> Option<AnimationId> {
        self.transition.as_ref().map(|t| t.id)
    }

    /// Starts a transition to `to`, replacing any running one.
    pub fn start(&mut self, to: CameraView, duration: Duration, curve: CameraCurve) -> AnimationId {
        self.generation += 1;
        let id = AnimationId(self.generation);

        if duration.is_zero() {
            self.view = to;
            self.transition = None;
            return id;
        }

        self.transition = Some(Transition {
            id,
            from: self.view,
            to,
            curve,
            started_at: self.clock,
            duration,
        });
        id
    }

    /// Moves the camera immediately, cancelling any transition (user drag/scroll).
    pub fn jump_to(&mut self, view: CameraView) {
        self.generation += 1;
        self.transition = None;
        self.view = view;
    }

    /// Advances the clock; returns the id of a transition that finished during this step.
    pub fn advance(&mut self, dt: Duration) -> Option<AnimationId> {
        self.clock += dt;
        let transition = self.transition.as_ref()?;

        let elapsed = self.clock.saturating_sub(transition.started_at);
        let t = (elapsed.as_secs_f64() / transition.duration.as_secs_f64()).min(1.0);

        if t >= 1.0 {
            self.view = transition.to;
            let id = transition.id;
            self.transition = None;
            return Some(id);
        }

        self.view = interpolate(transition, ease_in_out(t));
        None
    }

    /// Computes the view that fits `bounds` into a viewport with padding.
    pub fn fit_view(bounds: Rect<f64>, viewport: (f32, f32), padding: f32) -> CameraView {
        let min = to_mercator(Coord {
            x: bounds.min().x,
            y: bounds.max().y,
        });
        let max = to_mercator(Coord {
            x: bounds.max().x,
            y: bounds.min().y,
        });

        let width = (viewport.0 - 2.0 * padding).max(1.0) as f64;
        let height = (viewport.1 - 2.0 * padding).max(1.0) as f64;
        let span_x = (max.x - min.x).abs();
        let span_y = (max.y - min.y).abs();

        let zoom = if span_x <= f64::EPSILON && span_y <= f64::EPSILON {
            MAX_ZOOM
        } else {
            let scale_x = if span_x > 0.0 {
                width / (span_x * world_size(0.0))
            } else {
                f64::INFINITY
            };
            let scale_y = if span_y > 0.0 {
                height / (span_y * world_size(0.0))
            } else {
                f64::INFINITY
            };
            scale_x.min(scale_y).log2()
        };

        let center = from_mercator(Coord {
            x: (min.x + max.x) / 2.0,
            y: (min.y + max.y) / 2.0,
        });
        CameraView::new(center, zoom)
    }
}

fn ease_in_out(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

fn interpolate(transition: &Transition, t: f64) -> CameraView {
    let from = to_mercator(transition.from.center);
    let to = to_mercator(transition.to.center);
    let center = from_mercator(Coord {
        x: from.x + (to.x - from.x) * t,
        y: from.y + (to.y - from.y) * t,
    });

    let mut zoom = transition.from.zoom + (transition.to.zoom - transition.from.zoom) * t;
    if transition.curve == CameraCurve::Fly {
        // Dip proportional to how many screens apart the endpoints are.
        let distance = ((to.x - from.x).hypot(to.y - from.y) * world_size(transition.from.zoom)
            / 512.0)
            .max(1.0);
        let hop = distance.log2().min(4.0);
        zoom -= hop * (std::f64::consts::PI * t).sin();
    }

    CameraView::new(center, zoom)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(x: f64, y: f64, zoom: f64) -> CameraView {
        CameraView::new(Coord { x, y }, zoom)
    }

    #[test]
    fn test_transition_completes_at_destination() {
        let mut camera = Camera::new(view(125.0, 8.0, 7.0));
        let id = camera.start(view(125.5, 8.5, 9.0), Duration::from_millis(1000), CameraCurve::Ease);

        assert!(camera.is_animating(id));
        assert_eq!(camera.advance(Duration::from_millis(500)), None);
        let mid = camera.view();
        assert!(mid.zoom > 7.0 && mid.zoom < 9.0);

        assert_eq!(camera.advance(Duration::from_millis(500)), Some(id));
        assert_eq!(camera.view(), view(125.5, 8.5, 9.0));
        assert!(!camera.is_animating(id));
    }

    #[test]
    fn test_retarget_supersedes_previous_transition() {
        let mut camera = Camera::new(view(125.0, 8.0, 7.0));
        let first = camera.start(view(126.0, 9.0, 8.0), Duration::from_millis(1000), CameraCurve::Ease);
        camera.advance(Duration::from_millis(200));
        let second = camera.start(view(124.0, 7.0, 6.0), Duration::from_millis(1000), CameraCurve::Fly);

        assert!(second > first);
        assert!(!camera.is_animating(first));
        assert_eq!(camera.destination(), view(124.0, 7.0, 6.0));

        // Only the newest generation is reported as finished.
        assert_eq!(camera.advance(Duration::from_millis(1000)), Some(second));
    }

    #[test]
    fn test_zero_duration_jumps() {
        let mut camera = Camera::new(view(125.0, 8.0, 7.0));
        let id = camera.start(view(120.0, 10.0, 5.0), Duration::ZERO, CameraCurve::Ease);
        assert!(!camera.is_animating(id));
        assert_eq!(camera.view(), view(120.0, 10.0, 5.0));
    }

    #[test]
    fn test_fit_view_centers_on_bounds() {
        let bounds = Rect::new(Coord { x: 125.0, y: 8.0 }, Coord { x: 125.1, y: 8.1 });
        let fitted = Camera::fit_view(bounds, (800.0, 600.0), 30.0);

        assert!((fitted.center.x - 125.05).abs() < 1e-9);
        assert!((fitted.center.y - 8.05).abs() < 1e-3);

        // 0.1 degrees into 540 px is well above the regional zoom.
        assert!(fitted.zoom > 10.0 && fitted.zoom < 14.0);

        let padded = Camera::fit_view(bounds, (800.0, 600.0), 100.0);
        assert!(padded.zoom < fitted.zoom);
    }
}
