use std::fmt;
use std::ops::{AddAssign, Mul, MulAssign, Sub};

const DEFAULT_ACCELERATION_RATE: f64 = 0.2;
const DEFAULT_ACCELERATION_SMOOTHING: f64 = 0.1;
const DEFAULT_SPRING_STRENGTH: f64 = 0.12;
const DEFAULT_DAMPING: f64 = 0.85;
const DEFAULT_MAX_SPEED: f64 = 15.0;
const DEFAULT_DIRECTION_THRESHOLD: f64 = 0.1;
const DEFAULT_DELAY: f64 = 0.08;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl MulAssign<f64> for Vec2 {
    fn mul_assign(&mut self, rhs: f64) {
        self.x *= rhs;
        self.y *= rhs;
    }
}

/// Which way the follower sprite faces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Facing {
    Right,
    Left,
}

impl Facing {
    /// `1.0` for right, `-1.0` for left; usable directly as a `scaleX` factor.
    pub fn sign(self) -> f64 {
        match self {
            Self::Right => 1.0,
            Self::Left => -1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MotionConfigError {
    Damping(f64),
    MaxSpeed(f64),
    AccelerationSmoothing(f64),
    NonFinite(&'static str),
    Negative(&'static str),
}

impl fmt::Display for MotionConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Damping(value) => write!(f, "damping must be in (0, 1), got {value}"),
            Self::MaxSpeed(value) => write!(f, "max speed must be positive, got {value}"),
            Self::AccelerationSmoothing(value) => {
                write!(f, "acceleration smoothing must be in (0, 1], got {value}")
            }
            Self::NonFinite(field) => write!(f, "{field} must be finite"),
            Self::Negative(field) => write!(f, "{field} must not be negative"),
        }
    }
}

impl std::error::Error for MotionConfigError {}

/// Tuning for [`MotionSimulator`].
///
/// `delay` is part of the follower's public configuration but the update step
/// never reads it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionConfig {
    pub acceleration_rate: f64,
    pub acceleration_smoothing: f64,
    pub spring_strength: f64,
    pub damping: f64,
    pub max_speed: f64,
    pub direction_threshold: f64,
    pub delay: f64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            acceleration_rate: DEFAULT_ACCELERATION_RATE,
            acceleration_smoothing: DEFAULT_ACCELERATION_SMOOTHING,
            spring_strength: DEFAULT_SPRING_STRENGTH,
            damping: DEFAULT_DAMPING,
            max_speed: DEFAULT_MAX_SPEED,
            direction_threshold: DEFAULT_DIRECTION_THRESHOLD,
            delay: DEFAULT_DELAY,
        }
    }
}

impl MotionConfig {
    pub fn validate(&self) -> Result<(), MotionConfigError> {
        let fields = [
            ("acceleration rate", self.acceleration_rate),
            ("acceleration smoothing", self.acceleration_smoothing),
            ("spring strength", self.spring_strength),
            ("damping", self.damping),
            ("max speed", self.max_speed),
            ("direction threshold", self.direction_threshold),
        ];

        if let Some(&(name, _)) = fields.iter().find(|(_, value)| !value.is_finite()) {
            return Err(MotionConfigError::NonFinite(name));
        }

        if !(self.damping > 0.0 && self.damping < 1.0) {
            return Err(MotionConfigError::Damping(self.damping));
        }

        if self.max_speed <= 0.0 {
            return Err(MotionConfigError::MaxSpeed(self.max_speed));
        }

        if !(self.acceleration_smoothing > 0.0 && self.acceleration_smoothing <= 1.0) {
            return Err(MotionConfigError::AccelerationSmoothing(
                self.acceleration_smoothing,
            ));
        }

        for (name, value) in [
            ("acceleration rate", self.acceleration_rate),
            ("spring strength", self.spring_strength),
            ("direction threshold", self.direction_threshold),
        ] {
            if value < 0.0 {
                return Err(MotionConfigError::Negative(name));
            }
        }

        Ok(())
    }

    /// The configuration itself when valid, otherwise the defaults.
    pub fn or_default(self) -> Self {
        match self.validate() {
            Ok(()) => self,
            Err(_) => Self::default(),
        }
    }
}

/// What consumers read back every frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionSnapshot {
    pub position: Vec2,
    pub velocity: Vec2,
    pub speed: f64,
    pub facing: Facing,
}

impl MotionSnapshot {
    pub const AT_REST: Self = Self {
        position: Vec2::ZERO,
        velocity: Vec2::ZERO,
        speed: 0.0,
        facing: Facing::Right,
    };
}

impl Default for MotionSnapshot {
    fn default() -> Self {
        Self::AT_REST
    }
}

/// Damped spring follower. One [`tick`](Self::tick) per animation frame.
#[derive(Clone, Debug)]
pub struct MotionSimulator {
    config: MotionConfig,
    position: Vec2,
    velocity: Vec2,
    acceleration: Vec2,
    speed: f64,
    facing: Facing,
}

impl MotionSimulator {
    pub fn new(config: MotionConfig) -> Self {
        Self {
            config,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            speed: 0.0,
            facing: Facing::Right,
        }
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    pub fn snapshot(&self) -> MotionSnapshot {
        MotionSnapshot {
            position: self.position,
            velocity: self.velocity,
            speed: self.speed,
            facing: self.facing,
        }
    }

    pub fn tick(&mut self, target: Vec2) -> MotionSnapshot {
        let config = self.config;
        let displacement = target - self.position;

        self.acceleration +=
            (displacement * config.acceleration_rate - self.acceleration) * config.acceleration_smoothing;

        self.velocity += self.acceleration * config.spring_strength;
        self.velocity *= config.damping;

        let speed = self.velocity.length();
        if speed > config.max_speed {
            self.velocity *= config.max_speed / speed;
        }

        self.position += self.velocity;
        self.speed = self.velocity.length();

        // Hysteresis: near-idle horizontal drift keeps the previous facing.
        if self.velocity.x.abs() > config.direction_threshold {
            self.facing = if self.velocity.x > 0.0 {
                Facing::Right
            } else {
                Facing::Left
            };
        }

        self.snapshot()
    }
}

impl Default for MotionSimulator {
    fn default() -> Self {
        Self::new(MotionConfig::default())
    }
}
