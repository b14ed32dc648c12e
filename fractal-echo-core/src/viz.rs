//! Visualization data
//!
//! Geometry for drawing the lane tree: one horizontal bar per lane, a thin
//! connector up (or down) to the parent lane, and a circle per note sized by
//! its velocity coefficient. Nothing here draws; a renderer consumes the
//! shapes in whatever coordinate system `Bounds` describes.

use crate::types::Lane;
use std::collections::HashSet;

/// Linearly map `val` from `[val_min, val_max]` onto `[out_min, out_max]`.
/// An empty input range maps everything to `out_min`.
pub fn scale(val: f64, val_min: f64, val_max: f64, out_min: f64, out_max: f64) -> f64 {
    let val_range = val_max - val_min;
    if val_range == 0.0 {
        return out_min;
    }
    (val - val_min) * (out_max - out_min) / val_range + out_min
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

/// HSL to RGB; `h` in degrees `[0, 360)`, `s` and `l` in `[0, 1]`
pub fn hsl_to_rgb(h: f64, s: f64, l: f64) -> Rgb {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = l - c / 2.0;

    let (r, g, b) = if (0.0..60.0).contains(&h) {
        (c, x, 0.0)
    } else if (60.0..120.0).contains(&h) {
        (x, c, 0.0)
    } else if (120.0..180.0).contains(&h) {
        (0.0, c, x)
    } else if (180.0..240.0).contains(&h) {
        (0.0, x, c)
    } else if (240.0..300.0).contains(&h) {
        (x, 0.0, c)
    } else if (300.0..360.0).contains(&h) {
        (c, 0.0, x)
    } else {
        (0.0, 0.0, 0.0)
    };

    Rgb {
        r: r + m,
        g: g + m,
        b: b + m,
    }
}

/// Hue of a lane: 30° per semitone of the lane's pitch offset
pub fn lane_hue(lane: &Lane) -> f64 {
    let delta = lane.notes.first().map(|n| n.pitch_delta).unwrap_or(0);
    f64::from((30 * i64::from(delta)).rem_euclid(360) as i32)
}

/// Drawing area and stroke sizes
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub line_width: f64,
    /// Diameter of a note circle at full velocity
    pub base_diameter: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            x_min: -5.5,
            x_max: 5.5,
            y_min: -0.7,
            y_max: 0.8,
            line_width: 0.02,
            base_diameter: 0.25,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NoteCircle {
    pub id: usize,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    /// Border ring, drawn underneath the fill
    pub outline_radius: f64,
    /// The note is currently sounding; renderers light the border
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LaneShape {
    pub lane_index: usize,
    pub color: Rgb,
    pub bar: Rect,
    /// Vertical stroke to the parent lane (absent for the root)
    pub connector: Option<Rect>,
    pub notes: Vec<NoteCircle>,
}

/// Lay out every lane. `active` holds ids of notes currently sounding.
///
/// Shapes come back in lane order; draw them in reverse so children sit
/// underneath their parents' connectors.
pub fn layout(lanes: &[Lane], active: &HashSet<usize>, bounds: &Bounds) -> Vec<LaneShape> {
    let max_ms = lanes
        .iter()
        .flat_map(|l| l.notes.iter().map(|n| n.offset_ms))
        .max()
        .unwrap_or(0) as f64;
    let last_lane = lanes.len().saturating_sub(1) as f64;

    let x = |ms: i64| scale(ms as f64, 0.0, max_ms, bounds.x_min, bounds.x_max);
    let y = |idx: usize| scale(idx as f64, 0.0, last_lane, bounds.y_min, bounds.y_max);

    lanes
        .iter()
        .enumerate()
        .map(|(idx, lane)| {
            let lane_y = y(idx);
            let origin_x = x(lane.origin_ms());

            let connector = lane.link.map(|link| Rect {
                x0: origin_x,
                y0: lane_y,
                x1: origin_x + bounds.line_width,
                y1: y(link.parent_lane_index) + bounds.line_width,
            });

            let notes = lane
                .notes
                .iter()
                .map(|note| NoteCircle {
                    id: note.id,
                    x: x(note.offset_ms),
                    y: lane_y,
                    radius: bounds.base_diameter * note.velocity_coeff,
                    outline_radius: (bounds.base_diameter + 0.02) * note.velocity_coeff,
                    active: active.contains(&note.id),
                })
                .collect();

            LaneShape {
                lane_index: idx,
                color: hsl_to_rgb(lane_hue(lane), 0.5, 0.4),
                bar: Rect {
                    x0: origin_x,
                    y0: lane_y - bounds.line_width,
                    x1: x(lane.end_ms()),
                    y1: lane_y + bounds.line_width,
                },
                connector,
                notes,
            }
        })
        .collect()
}
