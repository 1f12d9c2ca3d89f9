const DEFAULT_FLAPPING_THRESHOLD: f64 = 1.5;
const DEFAULT_SETTLE_DELAY_MS: f64 = 150.0;
const MAX_INTENSITY: f64 = 1.5;
const BASE_WING_BEAT_SECONDS: f64 = 0.8;
const BASE_SPRITE_SCALE: f64 = 0.45;
const MIN_SPEED_SCALE: f64 = 0.9;
const SPEED_SCALE_FALLOFF: f64 = 0.001;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlapState {
    Idle,
    Flapping,
}

impl FlapState {
    pub fn css_class(self) -> Option<&'static str> {
        match self {
            Self::Idle => None,
            Self::Flapping => Some("flapping"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlapConfig {
    pub threshold: f64,
    pub settle_delay_ms: f64,
}

impl Default for FlapConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_FLAPPING_THRESHOLD,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
        }
    }
}

/// Consumer-side wing state driven by follower speed.
///
/// Starts flapping as soon as speed crosses the threshold and only returns to
/// idle after speed has stayed at or below it for the settle delay.
#[derive(Clone, Debug)]
pub struct FlapController {
    config: FlapConfig,
    state: FlapState,
    intensity: f64,
    settle_started_at: Option<f64>,
}

impl FlapController {
    pub fn new(config: FlapConfig) -> Self {
        Self {
            config,
            state: FlapState::Idle,
            intensity: 1.0,
            settle_started_at: None,
        }
    }

    pub fn state(&self) -> FlapState {
        self.state
    }

    pub fn intensity(&self) -> f64 {
        self.intensity
    }

    /// `now_ms` is a monotonic frame timestamp, e.g. the `requestAnimationFrame` argument.
    pub fn update(&mut self, speed: f64, now_ms: f64) -> FlapState {
        if speed > self.config.threshold {
            self.state = FlapState::Flapping;
            self.intensity = (speed / self.config.threshold).min(MAX_INTENSITY);
            self.settle_started_at = None;
            return self.state;
        }

        if self.state == FlapState::Idle {
            return self.state;
        }

        let started_at = *self.settle_started_at.get_or_insert(now_ms);
        if now_ms - started_at >= self.config.settle_delay_ms {
            self.state = FlapState::Idle;
            self.intensity = 1.0;
            self.settle_started_at = None;
        }

        self.state
    }

    pub fn wing_beat_seconds(&self) -> f64 {
        BASE_WING_BEAT_SECONDS / self.intensity
    }
}

impl Default for FlapController {
    fn default() -> Self {
        Self::new(FlapConfig::default())
    }
}

/// Sprite scale: slightly smaller when moving fast, never below 90% of base.
pub fn sprite_scale(speed: f64) -> f64 {
    BASE_SPRITE_SCALE * (1.0 - speed * SPEED_SCALE_FALLOFF).max(MIN_SPEED_SCALE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_idle() {
        let controller = FlapController::default();
        assert_eq!(controller.state(), FlapState::Idle);
        assert_eq!(controller.intensity(), 1.0);
        assert!((controller.wing_beat_seconds() - 0.8).abs() < 1e-12);
    }

    #[test]
    fn flaps_immediately_above_threshold() {
        let mut controller = FlapController::default();

        assert_eq!(controller.update(1.5, 0.0), FlapState::Idle);
        assert_eq!(controller.update(1.6, 16.0), FlapState::Flapping);
        assert_eq!(controller.state().css_class(), Some("flapping"));
    }

    #[test]
    fn settles_after_delay() {
        let mut controller = FlapController::default();
        controller.update(3.0, 0.0);

        assert_eq!(controller.update(1.0, 100.0), FlapState::Flapping);
        assert_eq!(controller.update(0.5, 200.0), FlapState::Flapping);
        assert_eq!(controller.update(0.2, 249.0), FlapState::Flapping);
        assert_eq!(controller.update(0.2, 250.0), FlapState::Idle);
        assert_eq!(controller.intensity(), 1.0);
        assert_eq!(controller.state().css_class(), None);
    }

    #[test]
    fn retrigger_restarts_settle_timer() {
        let mut controller = FlapController::default();
        controller.update(3.0, 0.0);
        controller.update(1.0, 100.0);
        controller.update(2.0, 200.0);

        assert_eq!(controller.update(1.0, 300.0), FlapState::Flapping);
        assert_eq!(controller.update(1.0, 400.0), FlapState::Flapping);
        assert_eq!(controller.update(1.0, 450.0), FlapState::Idle);
    }

    #[test]
    fn intensity_follows_speed_and_caps() {
        let mut controller = FlapController::default();

        controller.update(1.8, 0.0);
        assert!((controller.intensity() - 1.2).abs() < 1e-12);
        assert!((controller.wing_beat_seconds() - 0.8 / 1.2).abs() < 1e-12);

        controller.update(15.0, 16.0);
        assert_eq!(controller.intensity(), 1.5);

        // Intensity holds while settling.
        controller.update(0.0, 32.0);
        assert_eq!(controller.intensity(), 1.5);
    }

    #[test]
    fn custom_threshold() {
        let mut controller = FlapController::new(FlapConfig {
            threshold: 5.0,
            settle_delay_ms: 0.0,
        });

        assert_eq!(controller.update(4.0, 0.0), FlapState::Idle);
        assert_eq!(controller.update(6.0, 1.0), FlapState::Flapping);
        assert_eq!(controller.update(5.0, 2.0), FlapState::Idle);
    }

    #[test]
    fn sprite_scale_shrinks_with_speed() {
        assert!((sprite_scale(0.0) - 0.45).abs() < 1e-12);
        assert!((sprite_scale(50.0) - 0.45 * 0.95).abs() < 1e-12);
        assert!((sprite_scale(15_000.0) - 0.45 * 0.9).abs() < 1e-12);
    }
}
