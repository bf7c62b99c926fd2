//! Display class from the current viewbox width.
//!
//! Sits beside the geometry engine: it never touches diagram state. Callers feed it the visible
//! width on zoom; debouncing the feed is left to the host's event loop.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DisplayClass {
    /// Zoomed in: labels, arrows and values shown.
    Detailed,
    Medium,
    /// Zoomed out: bare topology.
    Overview,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewportScale {
    /// Widths up to this value are [`DisplayClass::Detailed`].
    pub detailed_max_width: f64,
    /// Widths up to this value are [`DisplayClass::Medium`].
    pub medium_max_width: f64,
    /// Observations closer than this ratio to the last accepted width are ignored.
    pub min_relative_change: f64,
    last_width: Option<f64>,
    class: Option<DisplayClass>,
}

impl Default for ViewportScale {
    fn default() -> Self {
        Self::new(1500.0, 6000.0, 0.05)
    }
}

impl ViewportScale {
    pub fn new(detailed_max_width: f64, medium_max_width: f64, min_relative_change: f64) -> Self {
        Self {
            detailed_max_width,
            medium_max_width,
            min_relative_change,
            last_width: None,
            class: None,
        }
    }

    pub fn class(&self) -> Option<DisplayClass> {
        self.class
    }

    pub fn classify(&self, width: f64) -> DisplayClass {
        if width <= self.detailed_max_width {
            DisplayClass::Detailed
        } else if width <= self.medium_max_width {
            DisplayClass::Medium
        } else {
            DisplayClass::Overview
        }
    }

    /// Returns the new class when this observation changes it.
    pub fn observe(&mut self, width: f64) -> Option<DisplayClass> {
        if !width.is_finite() || width <= 0.0 {
            return None;
        }
        if let Some(last) = self.last_width {
            if ((width - last) / last).abs() < self.min_relative_change {
                return None;
            }
        }
        self.last_width = Some(width);
        let class = self.classify(width);
        if self.class == Some(class) {
            return None;
        }
        self.class = Some(class);
        Some(class)
    }
}
