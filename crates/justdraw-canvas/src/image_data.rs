//! RGBA pixel buffers.

use justdraw_common::Color;

use crate::CanvasError;

/// Raw pixel data, 8-bit RGBA, row-major from the top-left corner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl ImageData {
    /// Create image data with all pixels transparent black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn from_data(width: u32, height: u32, data: Vec<u8>) -> Result<Self, CanvasError> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(CanvasError::InvalidImageData {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { width, height, data })
    }

    /// Both dimensions are powers of two.
    pub fn is_power_of_two(&self) -> bool {
        self.width.is_power_of_two() && self.height.is_power_of_two()
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| (y as usize * self.width as usize + x as usize) * 4)
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> Option<Color> {
        let idx = self.index(x, y)?;
        let px = &self.data[idx..idx + 4];
        Some(Color::new(
            px[0] as f32,
            px[1] as f32,
            px[2] as f32,
            px[3] as f32 / 255.0,
        ))
    }

    /// Out-of-range coordinates are ignored.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Color) {
        if let Some(idx) = self.index(x, y) {
            self.data[idx..idx + 4].copy_from_slice(&to_rgba8(color));
        }
    }

    pub fn fill(&mut self, color: Color) {
        let px = to_rgba8(color);
        for chunk in self.data.chunks_exact_mut(4) {
            chunk.copy_from_slice(&px);
        }
    }
}

fn to_rgba8(color: Color) -> [u8; 4] {
    let channel = |v: f32| v.round().clamp(0.0, 255.0) as u8;
    [
        channel(color.r),
        channel(color.g),
        channel(color.b),
        channel(color.a * 255.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_pixel() {
        let mut data = ImageData::new(10, 10);
        data.set_pixel(5, 5, Color::from_rgb(255, 0, 0));
        assert_eq!(data.get_pixel(5, 5), Some(Color::RED));
        assert_eq!(data.get_pixel(0, 0), Some(Color::TRANSPARENT));
        assert_eq!(data.get_pixel(10, 0), None);
    }

    #[test]
    fn test_from_data_checks_len() {
        assert!(ImageData::from_data(2, 2, vec![0; 16]).is_ok());
        assert_eq!(
            ImageData::from_data(2, 2, vec![0; 15]),
            Err(CanvasError::InvalidImageData { expected: 16, actual: 15 })
        );
    }

    #[test]
    fn test_power_of_two() {
        assert!(ImageData::new(4, 16).is_power_of_two());
        assert!(!ImageData::new(3, 4).is_power_of_two());
    }
}
