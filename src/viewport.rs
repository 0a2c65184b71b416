//! Viewport containment test for section geometry.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::page::{Rect, ViewportSize};

/// How much of a section must be on screen to count as "in view".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Containment {
    /// Every edge inside the viewport. Sections taller than the viewport
    /// never qualify.
    #[default]
    Full,
    /// Any overlap with positive area.
    Partial,
}

impl FromStr for Containment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" => Ok(Containment::Full),
            "partial" => Ok(Containment::Partial),
            other => Err(format!("unknown containment '{other}' (expected full or partial)")),
        }
    }
}

impl fmt::Display for Containment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Containment::Full => f.write_str("full"),
            Containment::Partial => f.write_str("partial"),
        }
    }
}

/// True iff the whole rect lies within `[0, width] x [0, height]`.
pub fn is_in_viewport(rect: &Rect, width: f64, height: f64) -> bool {
    rect.top >= 0.0 && rect.left >= 0.0 && rect.bottom <= height && rect.right <= width
}

/// True iff the rect and the viewport share some area.
pub fn overlaps_viewport(rect: &Rect, width: f64, height: f64) -> bool {
    rect.top < height && rect.bottom > 0.0 && rect.left < width && rect.right > 0.0
}

pub fn classify(rect: &Rect, viewport: &ViewportSize, mode: Containment) -> bool {
    let (w, h) = (viewport.width(), viewport.height());
    match mode {
        Containment::Full => is_in_viewport(rect, w, h),
        Containment::Partial => overlaps_viewport(rect, w, h),
    }
}
