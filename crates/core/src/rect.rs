//! Placement rectangle for compositing a product image onto a template.
//!
//! The rect is configured per job and stored as JSONB on the `jobs`
//! table. Validation happens here, at submission time -- the compositor
//! assumes it is handed a valid rect and only applies the clamping
//! rules.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Target region for the product image on the template, in template
/// pixel coordinates. `x`/`y` may be negative or out of bounds; they
/// are clamped against the template dimensions at composite time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl PlacementRect {
    /// Validate a rect coming in from the API or the database.
    ///
    /// Width and height must be at least 1; zero-sized placements make
    /// the resize step meaningless and are rejected up front.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.width == 0 || self.height == 0 {
            return Err(CoreError::Validation(format!(
                "Placement dimensions must be at least 1x1, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }

    /// Deserialize and validate a rect from its stored JSONB form.
    ///
    /// Returns `Validation` if the JSON is missing fields, has the
    /// wrong types, or fails [`validate`](Self::validate). A job whose
    /// stored placement does not pass this is unrunnable.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, CoreError> {
        let rect: Self = serde_json::from_value(value.clone()).map_err(|e| {
            CoreError::Validation(format!("Invalid placement rect: {e}"))
        })?;
        rect.validate()?;
        Ok(rect)
    }

    /// Serialize to the JSONB form stored on the `jobs` table.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "x": self.x,
            "y": self.y,
            "width": self.width,
            "height": self.height,
        })
    }

    /// Compute the final top-left position on a template of the given
    /// size, clamped so the placed image stays inside the template:
    ///
    /// ```text
    /// final_x = max(0, min(x, template_w - width))
    /// final_y = max(0, min(y, template_h - height))
    /// ```
    ///
    /// When the product is larger than the template the lower bound
    /// wins and the position pins to 0.
    pub fn clamped_position(&self, template_w: u32, template_h: u32) -> (i64, i64) {
        let max_x = template_w as i64 - self.width as i64;
        let max_y = template_h as i64 - self.height as i64;
        let final_x = (self.x as i64).min(max_x).max(0);
        let final_y = (self.y as i64).min(max_y).max(0);
        (final_x, final_y)
    }

    /// Whether clamping against the given template size would move the
    /// rect away from its requested position.
    pub fn is_clamped_on(&self, template_w: u32, template_h: u32) -> bool {
        self.clamped_position(template_w, template_h) != (self.x as i64, self.y as i64)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: i32, y: i32, width: u32, height: u32) -> PlacementRect {
        PlacementRect { x, y, width, height }
    }

    #[test]
    fn validate_accepts_normal_rect() {
        assert!(rect(10, 20, 100, 100).validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_dimensions() {
        assert!(rect(0, 0, 0, 100).validate().is_err());
        assert!(rect(0, 0, 100, 0).validate().is_err());
    }

    #[test]
    fn in_bounds_rect_is_not_moved() {
        let r = rect(10, 20, 50, 50);
        assert_eq!(r.clamped_position(200, 150), (10, 20));
        assert!(!r.is_clamped_on(200, 150));
    }

    #[test]
    fn overflow_clamps_to_bottom_right() {
        // Template 200x150, rect at (180, 140) sized 50x50 must pin to
        // (150, 100) so the full product stays inside.
        let r = rect(180, 140, 50, 50);
        assert_eq!(r.clamped_position(200, 150), (150, 100));
        assert!(r.is_clamped_on(200, 150));
    }

    #[test]
    fn negative_origin_clamps_to_zero() {
        let r = rect(-30, -5, 50, 50);
        assert_eq!(r.clamped_position(200, 150), (0, 0));
    }

    #[test]
    fn product_larger_than_template_pins_to_origin() {
        let r = rect(10, 10, 400, 300);
        assert_eq!(r.clamped_position(200, 150), (0, 0));
    }

    #[test]
    fn from_json_roundtrip() {
        let value = serde_json::json!({ "x": 180, "y": 140, "width": 50, "height": 50 });
        let r = PlacementRect::from_json(&value).expect("valid rect should parse");
        assert_eq!(r, rect(180, 140, 50, 50));
        assert_eq!(r.to_json(), value);
    }

    #[test]
    fn from_json_rejects_missing_fields() {
        let value = serde_json::json!({ "x": 180, "y": 140 });
        assert!(PlacementRect::from_json(&value).is_err());
    }

    #[test]
    fn from_json_rejects_zero_size() {
        let value = serde_json::json!({ "x": 0, "y": 0, "width": 0, "height": 10 });
        assert!(PlacementRect::from_json(&value).is_err());
    }
}
