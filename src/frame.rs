// frame.rs — CPU-side RGBA frame container.
//
// The pipeline's input type: a tightly packed RGBA8 buffer with
// runtime dimensions, standing in for whatever the caller decodes a
// camera or video frame into. The pipeline only ever reads it.
//
// Memory layout (row-major, 4 bytes per pixel, no row padding):
//
//   data index:  [0..4)   [4..8)   [8..12)  ...
//   pixel:       (0,0)    (1,0)    (2,0)    ...
//   byte order:  R G B A  per pixel

use std::fmt;

/// A tightly packed RGBA8 image with runtime dimensions.
pub struct RgbaFrame {
    /// Pixel bytes, length = width * height * 4.
    data: Vec<u8>,
    /// Frame width in pixels.
    width: usize,
    /// Frame height in pixels.
    height: usize,
}

impl Clone for RgbaFrame {
    fn clone(&self) -> Self {
        RgbaFrame {
            data: self.data.clone(),
            width: self.width,
            height: self.height,
        }
    }
}

impl RgbaFrame {
    /// Create a zero-initialized (transparent black) frame.
    pub fn new(width: usize, height: usize) -> Self {
        RgbaFrame {
            data: vec![0u8; width * height * 4],
            width,
            height,
        }
    }

    /// Create a frame from existing RGBA bytes.
    ///
    /// # Panics
    /// Panics if `data.len() != width * height * 4`.
    pub fn from_vec(width: usize, height: usize, data: Vec<u8>) -> Self {
        assert_eq!(
            data.len(),
            width * height * 4,
            "data length ({}) must equal width * height * 4 ({})",
            data.len(),
            width * height * 4,
        );
        RgbaFrame { data, width, height }
    }

    /// Create a frame filled with a single RGBA value.
    /// Handy for the solid-color luminance checks in tests and demos.
    pub fn solid(width: usize, height: usize, rgba: [u8; 4]) -> Self {
        let mut data = Vec::with_capacity(width * height * 4);
        for _ in 0..width * height {
            data.extend_from_slice(&rgba);
        }
        RgbaFrame { data, width, height }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Get the RGBA value at (x, y). x is column, y is row.
    ///
    /// # Panics
    /// Panics if (x, y) is out of bounds.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> [u8; 4] {
        self.bounds_check(x, y);
        let i = (y * self.width + x) * 4;
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }

    /// Set the RGBA value at (x, y).
    ///
    /// # Panics
    /// Panics if (x, y) is out of bounds.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, rgba: [u8; 4]) {
        self.bounds_check(x, y);
        let i = (y * self.width + x) * 4;
        self.data[i..i + 4].copy_from_slice(&rgba);
    }

    /// Borrow one pixel row as a byte slice (length = width * 4).
    #[inline]
    pub fn row(&self, y: usize) -> &[u8] {
        assert!(y < self.height, "row {y} out of bounds (height {})", self.height);
        let start = y * self.width * 4;
        &self.data[start..start + self.width * 4]
    }

    /// The full pixel buffer in row-major RGBA order.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Return a new frame rotated 90° clockwise.
    ///
    /// The returned frame has swapped dimensions:
    /// `dst(x, y) = src(col = y, row = src_height - 1 - x)`.
    ///
    /// This is the same mapping the compositor applies when it detects
    /// a rotated capture, which makes the rotation-equivalence property
    /// directly testable: composing a frame through the rotated path
    /// must equal composing `frame.rotated_cw()` through the straight
    /// path.
    pub fn rotated_cw(&self) -> RgbaFrame {
        let mut dst = RgbaFrame::new(self.height, self.width);
        for y in 0..dst.height {
            for x in 0..dst.width {
                dst.set(x, y, self.get(y, self.height - 1 - x));
            }
        }
        dst
    }

    #[inline]
    fn bounds_check(&self, x: usize, y: usize) {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x},{y}) out of bounds for frame {}×{}",
            self.width,
            self.height,
        );
    }
}

// Debug formatting — dimensions only; dumping pixel bytes is never useful.
impl fmt::Debug for RgbaFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RgbaFrame {{ {}×{} }}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_zeroed() {
        let frame = RgbaFrame::new(3, 2);
        assert_eq!(frame.width(), 3);
        assert_eq!(frame.height(), 2);
        assert!(frame.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_get_set_roundtrip() {
        let mut frame = RgbaFrame::new(4, 3);
        frame.set(0, 0, [1, 2, 3, 4]);
        frame.set(3, 2, [250, 251, 252, 253]);
        assert_eq!(frame.get(0, 0), [1, 2, 3, 4]);
        assert_eq!(frame.get(3, 2), [250, 251, 252, 253]);
        assert_eq!(frame.get(1, 1), [0, 0, 0, 0]); // untouched pixel
    }

    #[test]
    fn test_solid_fill() {
        let frame = RgbaFrame::solid(2, 2, [128, 64, 32, 255]);
        for y in 0..2 {
            for x in 0..2 {
                assert_eq!(frame.get(x, y), [128, 64, 32, 255]);
            }
        }
    }

    #[test]
    fn test_row_slice() {
        let mut frame = RgbaFrame::new(2, 2);
        frame.set(0, 1, [9, 9, 9, 9]);
        frame.set(1, 1, [7, 7, 7, 7]);
        assert_eq!(frame.row(1), &[9, 9, 9, 9, 7, 7, 7, 7]);
    }

    #[test]
    #[should_panic(expected = "data length")]
    fn test_from_vec_wrong_length() {
        let _ = RgbaFrame::from_vec(2, 2, vec![0u8; 15]);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_get_out_of_bounds() {
        let frame = RgbaFrame::new(2, 2);
        let _ = frame.get(2, 0); // x == width
    }

    #[test]
    fn test_rotated_cw_dimensions_swap() {
        let frame = RgbaFrame::new(5, 3);
        let rot = frame.rotated_cw();
        assert_eq!(rot.width(), 3);
        assert_eq!(rot.height(), 5);
    }

    #[test]
    fn test_rotated_cw_corner_mapping() {
        // 2×3 frame with distinct corner markers:
        //   A .        top-left  A = (0,0)
        //   . .
        //   B .        bottom-left B = (0,2)
        let mut frame = RgbaFrame::new(2, 3);
        frame.set(0, 0, [10, 0, 0, 255]); // A
        frame.set(0, 2, [20, 0, 0, 255]); // B
        let rot = frame.rotated_cw(); // 3×2
        // Clockwise: top-left goes to top-right, bottom-left to top-left.
        assert_eq!(rot.get(2, 0), [10, 0, 0, 255]);
        assert_eq!(rot.get(0, 0), [20, 0, 0, 255]);
    }

    #[test]
    fn test_rotate_four_times_is_identity() {
        let mut frame = RgbaFrame::new(3, 2);
        for y in 0..2 {
            for x in 0..3 {
                frame.set(x, y, [(x * 10 + y) as u8, 0, 0, 255]);
            }
        }
        let back = frame.rotated_cw().rotated_cw().rotated_cw().rotated_cw();
        assert_eq!(back.as_bytes(), frame.as_bytes());
    }
}
