//! Scroll progress to background layer state for the home scene.
//!
//! Each layer owns an ordered list of progress bands; the first band whose
//! upper bound is at or above the progress supplies the value.

const CONTENT_FADE_RATE: f64 = 1.2;
const CONTENT_LIFT_PX: f64 = 120.0;

#[derive(Clone, Copy, Debug)]
enum Segment {
    Constant(f64),
    /// `from + (p - start) * slope`
    Linear { start: f64, from: f64, slope: f64 },
}

impl Segment {
    fn eval(self, progress: f64) -> f64 {
        match self {
            Self::Constant(value) => value,
            Self::Linear { start, from, slope } => from + (progress - start) * slope,
        }
    }
}

/// `(upper bound inclusive, segment)`, sorted by bound, last bound is `1.0`.
type Bands = &'static [(f64, Segment)];

const JUNGLE_OPACITY: Bands = &[
    (0.3, Segment::Linear { start: 0.0, from: 1.0, slope: -1.0 / 0.3 }),
    (1.0, Segment::Constant(0.0)),
];

const CANOPY_OPACITY: Bands = &[
    (0.4, Segment::Linear { start: 0.0, from: 0.0, slope: 1.0 / 0.4 }),
    (0.8, Segment::Constant(1.0)),
    (1.0, Segment::Linear { start: 0.8, from: 1.0, slope: -1.0 / 0.2 }),
];

const CANOPY_SCALE: Bands = &[
    (0.4, Segment::Linear { start: 0.0, from: 1.0, slope: 0.15 / 0.4 }),
    (0.8, Segment::Linear { start: 0.4, from: 1.15, slope: 0.15 / 0.4 }),
    (1.0, Segment::Constant(1.3)),
];

const FOREST_OPACITY: Bands = &[
    (0.8, Segment::Constant(0.0)),
    (1.0, Segment::Linear { start: 0.8, from: 0.0, slope: 1.0 / 0.2 }),
];

fn sample(bands: Bands, progress: f64) -> f64 {
    bands
        .iter()
        .find(|(upper, _)| progress <= *upper)
        .or_else(|| bands.last())
        .map(|(_, segment)| segment.eval(progress))
        .unwrap_or(0.0)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneFrame {
    pub jungle_opacity: f64,
    pub canopy_opacity: f64,
    pub canopy_scale: f64,
    pub forest_opacity: f64,
    pub content_opacity: f64,
    pub content_offset_y: f64,
}

impl SceneFrame {
    pub fn at(progress: f64) -> Self {
        let progress = clamp_progress(progress);

        Self {
            jungle_opacity: sample(JUNGLE_OPACITY, progress),
            canopy_opacity: sample(CANOPY_OPACITY, progress),
            canopy_scale: sample(CANOPY_SCALE, progress),
            forest_opacity: sample(FOREST_OPACITY, progress),
            content_opacity: (1.0 - progress * CONTENT_FADE_RATE).max(0.0),
            content_offset_y: -progress * CONTENT_LIFT_PX,
        }
    }

    /// The forest overlay only takes clicks once it is meaningfully visible.
    pub fn forest_interactive(&self) -> bool {
        self.forest_opacity > 0.1
    }
}

impl Default for SceneFrame {
    fn default() -> Self {
        Self::at(0.0)
    }
}

pub fn clamp_progress(progress: f64) -> f64 {
    if progress.is_finite() {
        progress.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Progress of a scroll offset through a section taller than the viewport.
pub fn scroll_progress(scroll_y: f64, section_height: f64, viewport_height: f64) -> f64 {
    let scrollable = (section_height - viewport_height).max(1.0);
    clamp_progress(scroll_y / scrollable)
}
