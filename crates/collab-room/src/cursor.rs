//! Cursor pixel mapping: a placeholder per §6 ("treats anything better as
//! out of scope"). A real editor integration supplies its own glyph metrics
//! and font measurement; this is enough to drive a cursor layer in tests or
//! a minimal renderer.

use collab_common::ClientId;
use serde::{Deserialize, Serialize};

const GLYPH_WIDTH_PX: f64 = 8.0;
const LINE_HEIGHT_PX: f64 = 18.0;

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct CursorPosition {
    pub line: u32,
    pub column: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PixelPosition {
    pub x: f64,
    pub y: f64,
}

/// Fixed-metrics placeholder: every glyph is `GLYPH_WIDTH_PX` wide and every
/// line is `LINE_HEIGHT_PX` tall, with no wrapping or proportional fonts.
#[must_use]
pub fn cursor_to_pixels(pos: CursorPosition) -> PixelPosition {
    PixelPosition {
        x: f64::from(pos.column) * GLYPH_WIDTH_PX,
        y: f64::from(pos.line) * LINE_HEIGHT_PX,
    }
}

/// A remote cursor ready for a cursor layer to render.
#[derive(Clone, Debug, Serialize)]
pub struct CursorDecoration {
    pub client_id: ClientId,
    pub color: String,
    pub name: String,
    pub pixel: PixelPosition,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_line_and_column_to_fixed_glyph_grid() {
        let pixel = cursor_to_pixels(CursorPosition { line: 2, column: 3 });
        assert_eq!(pixel, PixelPosition { x: 24.0, y: 36.0 });
    }
}
