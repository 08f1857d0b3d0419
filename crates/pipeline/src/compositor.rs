//! Resize + bounds-clamped alpha composite of one product image onto a
//! template.
//!
//! The compositor never mutates the template it is handed; every call
//! works on a fresh decoded copy, so one template serves a whole run.

use image::imageops::FilterType;
use image::{ImageFormat, RgbaImage};

use feedframe_core::rect::PlacementRect;

/// Errors compositing a single entry. Always entry-local: the job
/// records a null result and moves on.
#[derive(Debug, thiserror::Error)]
pub enum CompositeError {
    #[error("Product image request failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("Product image request returned status {0}")]
    FetchStatus(reqwest::StatusCode),

    #[error("Image processing failed: {0}")]
    Image(#[from] image::ImageError),
}

/// Composites product images onto templates.
pub struct Compositor {
    client: reqwest::Client,
}

impl Compositor {
    /// Create a compositor sharing the given client (and its timeout).
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Fetch the product image at `product_image_url` and composite it
    /// onto `template_bytes` per `rect`, returning encoded PNG bytes.
    pub async fn composite(
        &self,
        template_bytes: &[u8],
        product_image_url: &str,
        rect: PlacementRect,
    ) -> Result<Vec<u8>, CompositeError> {
        let product_bytes = self.fetch_product(product_image_url).await?;
        compose(template_bytes, &product_bytes, rect)
    }

    async fn fetch_product(&self, url: &str) -> Result<Vec<u8>, CompositeError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CompositeError::FetchStatus(status));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// Decode both images, resize the product to the rect's dimensions
/// (Lanczos3), clamp the placement inside the template, alpha-blend,
/// and encode the result as PNG.
///
/// Clamping is logged, never raised: an out-of-bounds rect is a
/// recoverable authoring mistake, not an entry failure.
pub fn compose(
    template_bytes: &[u8],
    product_bytes: &[u8],
    rect: PlacementRect,
) -> Result<Vec<u8>, CompositeError> {
    let template = image::load_from_memory(template_bytes)?.to_rgba8();
    let product = image::load_from_memory(product_bytes)?.to_rgba8();

    let resized = image::imageops::resize(&product, rect.width, rect.height, FilterType::Lanczos3);

    let (final_x, final_y) = rect.clamped_position(template.width(), template.height());
    if rect.is_clamped_on(template.width(), template.height()) {
        tracing::warn!(
            requested_x = rect.x,
            requested_y = rect.y,
            final_x,
            final_y,
            template_w = template.width(),
            template_h = template.height(),
            "Placement adjusted to fit template bounds",
        );
    }

    let mut canvas: RgbaImage = template;
    image::imageops::overlay(&mut canvas, &resized, final_x, final_y);

    encode_png(&canvas)
}

fn encode_png(canvas: &RgbaImage) -> Result<Vec<u8>, CompositeError> {
    let mut buf = std::io::Cursor::new(Vec::new());
    canvas.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    /// Encode a solid-color RGBA image as PNG bytes.
    fn solid_png(width: u32, height: u32, color: Rgba<u8>) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, color);
        let mut buf = std::io::Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png)
            .expect("encoding a fresh image should succeed");
        buf.into_inner()
    }

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    fn rect(x: i32, y: i32, width: u32, height: u32) -> PlacementRect {
        PlacementRect { x, y, width, height }
    }

    #[test]
    fn composite_places_product_at_requested_position() {
        let template = solid_png(200, 150, RED);
        let product = solid_png(10, 10, BLUE);

        let out = compose(&template, &product, rect(20, 30, 50, 50))
            .expect("composite should succeed");
        let result = image::load_from_memory(&out).unwrap().to_rgba8();

        assert_eq!(result.dimensions(), (200, 150));
        // Inside the placed region.
        assert_eq!(*result.get_pixel(45, 55), BLUE);
        // Outside it the template shows through.
        assert_eq!(*result.get_pixel(10, 10), RED);
        assert_eq!(*result.get_pixel(19, 29), RED);
    }

    #[test]
    fn out_of_bounds_placement_is_clamped() {
        // Template 200x150, rect (180, 140, 50, 50) clamps to (150, 100).
        let template = solid_png(200, 150, RED);
        let product = solid_png(10, 10, BLUE);

        let out = compose(&template, &product, rect(180, 140, 50, 50))
            .expect("composite should succeed");
        let result = image::load_from_memory(&out).unwrap().to_rgba8();

        // The clamped region covers [150, 200) x [100, 150).
        assert_eq!(*result.get_pixel(150, 100), BLUE);
        assert_eq!(*result.get_pixel(199, 149), BLUE);
        // Just outside the clamped region.
        assert_eq!(*result.get_pixel(149, 100), RED);
        assert_eq!(*result.get_pixel(150, 99), RED);
    }

    #[test]
    fn transparent_product_pixels_let_template_show_through() {
        let template = solid_png(100, 100, RED);
        let product = solid_png(10, 10, Rgba([0, 0, 255, 0]));

        let out = compose(&template, &product, rect(0, 0, 40, 40))
            .expect("composite should succeed");
        let result = image::load_from_memory(&out).unwrap().to_rgba8();

        // Fully transparent product leaves the template untouched.
        assert_eq!(*result.get_pixel(20, 20), RED);
    }

    #[test]
    fn template_is_not_mutated_between_entries() {
        let template = solid_png(100, 100, RED);
        let product = solid_png(10, 10, BLUE);

        // First composite paints the top-left corner.
        let _ = compose(&template, &product, rect(0, 0, 50, 50)).unwrap();

        // A second call against the same template bytes must start from
        // a clean template.
        let out = compose(&template, &product, rect(50, 50, 50, 50)).unwrap();
        let result = image::load_from_memory(&out).unwrap().to_rgba8();
        assert_eq!(*result.get_pixel(10, 10), RED);
        assert_eq!(*result.get_pixel(75, 75), BLUE);
    }

    #[test]
    fn undecodable_template_is_an_error() {
        let product = solid_png(10, 10, BLUE);
        let result = compose(b"not an image", &product, rect(0, 0, 10, 10));
        assert!(matches!(result, Err(CompositeError::Image(_))));
    }

    #[test]
    fn undecodable_product_is_an_error() {
        let template = solid_png(100, 100, RED);
        let result = compose(&template, b"not an image", rect(0, 0, 10, 10));
        assert!(matches!(result, Err(CompositeError::Image(_))));
    }
}
