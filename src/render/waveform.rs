//! Waveform drawn from a pattern's phase durations.
//!
//! Inhale bulges up to the top edge, Exhale down to the bottom edge and Hold
//! runs flat along the baseline. The same path places the progress marker, so
//! the marker always travels along what is drawn.

use serde::{Deserialize, Serialize};

use crate::pattern::{Pattern, PhaseKind};

/// Chords used to approximate each curve when measuring arclength.
const CURVE_SAMPLES: usize = 48;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 400.0,
            height: 100.0,
        }
    }
}

impl Canvas {
    pub fn baseline(&self) -> f64 {
        self.height / 2.0
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn lerp(self, other: Point, t: f64) -> Point {
        Point::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    fn distance(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    Line { to: Point },
    Quad { ctrl: Point, to: Point },
}

impl PathSegment {
    fn end(&self) -> Point {
        match *self {
            PathSegment::Line { to } | PathSegment::Quad { to, .. } => to,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WaveformPath {
    canvas: Canvas,
    start: Point,
    segments: Vec<PathSegment>,
    /// Flattened path, first point is `start`.
    points: Vec<Point>,
    /// Cumulative arclength at each entry of `points`.
    lengths: Vec<f64>,
}

pub fn build_path(pattern: &Pattern, canvas: Canvas) -> WaveformPath {
    let total = pattern.total_duration();
    let baseline = canvas.baseline();
    let start = Point::new(0.0, baseline);

    let mut segments = Vec::with_capacity(pattern.len());
    let mut x = 0.0;
    for phase in pattern.phases() {
        let width = if total > 0.0 {
            phase.duration / total * canvas.width
        } else {
            0.0
        };
        let to = Point::new(x + width, baseline);
        let segment = match phase.kind {
            PhaseKind::Inhale => PathSegment::Quad {
                ctrl: Point::new(x + width / 2.0, 0.0),
                to,
            },
            PhaseKind::Exhale => PathSegment::Quad {
                ctrl: Point::new(x + width / 2.0, canvas.height),
                to,
            },
            PhaseKind::Hold => PathSegment::Line { to },
        };
        segments.push(segment);
        x += width;
    }

    WaveformPath::from_segments(canvas, start, segments)
}

impl WaveformPath {
    fn from_segments(canvas: Canvas, start: Point, segments: Vec<PathSegment>) -> Self {
        let mut points = vec![start];
        let mut cursor = start;
        for segment in &segments {
            match *segment {
                PathSegment::Line { to } => points.push(to),
                PathSegment::Quad { ctrl, to } => {
                    for step in 1..=CURVE_SAMPLES {
                        let t = step as f64 / CURVE_SAMPLES as f64;
                        let a = cursor.lerp(ctrl, t);
                        let b = ctrl.lerp(to, t);
                        points.push(a.lerp(b, t));
                    }
                }
            }
            cursor = segment.end();
        }

        let mut lengths = Vec::with_capacity(points.len());
        let mut running = 0.0;
        lengths.push(running);
        for pair in points.windows(2) {
            running += pair[0].distance(pair[1]);
            lengths.push(running);
        }

        Self {
            canvas,
            start,
            segments,
            points,
            lengths,
        }
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn polyline(&self) -> &[Point] {
        &self.points
    }

    pub fn total_length(&self) -> f64 {
        self.lengths.last().copied().unwrap_or(0.0)
    }

    /// Horizontal end of the path.
    pub fn extent(&self) -> f64 {
        self.segments.last().map_or(self.start.x, |segment| segment.end().x)
    }

    /// Point at `fraction` of the path's arclength.
    pub fn point_at_progress(&self, fraction: f64) -> Point {
        let fraction = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let total = self.total_length();
        if total <= 0.0 {
            return self.start;
        }

        let target = fraction * total;
        let upper = self
            .lengths
            .partition_point(|&length| length < target)
            .clamp(1, self.points.len() - 1);
        let lower = upper - 1;

        let span = self.lengths[upper] - self.lengths[lower];
        let t = if span > 0.0 {
            (target - self.lengths[lower]) / span
        } else {
            0.0
        };
        self.points[lower].lerp(self.points[upper], t)
    }

    /// SVG path data, e.g. `M 0 50 Q 50 0, 100 50 L 200 50`.
    pub fn to_svg_data(&self) -> String {
        let mut data = format!("M {} {}", self.start.x, self.start.y);
        for segment in &self.segments {
            let step = match *segment {
                PathSegment::Line { to } => format!(" L {} {}", to.x, to.y),
                PathSegment::Quad { ctrl, to } => {
                    format!(" Q {} {}, {} {}", ctrl.x, ctrl.y, to.x, to.y)
                }
            };
            data.push_str(&step);
        }
        data
    }
}
