// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The output image, stored as three planes of bytes.  A frame is
//! filled by splitting it into bands of whole rows; each band holds
//! the only mutable borrow of its rows, so the workers that fill the
//! bands never need to coordinate.

use std::hash::Hasher;

use fnv::FnvHasher;

use crate::error::RenderError;
use crate::palette::Rgb;

/// Red, green and blue planes of `width * height` bytes each,
/// row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    width: usize,
    height: usize,
    /// Red plane.
    pub red: Vec<u8>,
    /// Green plane.
    pub green: Vec<u8>,
    /// Blue plane.
    pub blue: Vec<u8>,
}

fn plane(len: usize) -> Result<Vec<u8>, RenderError> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|_| RenderError::AllocationFailure {
            bytes: len,
            alignment: 1,
        })?;
    v.resize(len, 0);
    Ok(v)
}

impl FrameBuffer {
    /// Allocates a black frame.  Fails if the size overflows or the
    /// planes cannot be allocated.
    pub fn new(width: usize, height: usize) -> Result<FrameBuffer, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::invalid(
                "size",
                format!("{}x{} has no pixels", width, height),
            ));
        }
        let len = width
            .checked_mul(height)
            .ok_or(RenderError::AllocationFailure {
                bytes: usize::max_value(),
                alignment: 1,
            })?;
        Ok(FrameBuffer {
            width,
            height,
            red: plane(len)?,
            green: plane(len)?,
            blue: plane(len)?,
        })
    }

    /// Rebuilds a frame from `RGBRGB...` bytes.
    pub fn from_interleaved(
        width: usize,
        height: usize,
        bytes: &[u8],
    ) -> Result<FrameBuffer, RenderError> {
        let mut frame = FrameBuffer::new(width, height)?;
        if bytes.len() != frame.len() * 3 {
            return Err(RenderError::invalid(
                "pixels",
                format!(
                    "expected {} bytes for {}x{}, got {}",
                    frame.len() * 3,
                    width,
                    height,
                    bytes.len()
                ),
            ));
        }
        for (i, rgb) in bytes.chunks(3).enumerate() {
            frame.red[i] = rgb[0];
            frame.green[i] = rgb[1];
            frame.blue[i] = rgb[2];
        }
        Ok(frame)
    }

    /// Image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of pixels.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    /// Never true for a constructed frame.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The color at column `x`, row `y`.
    pub fn pixel(&self, x: usize, y: usize) -> Rgb {
        let i = y * self.width + x;
        Rgb(self.red[i], self.green[i], self.blue[i])
    }

    /// The planes as `RGBRGB...`, which is what both image encoders
    /// consume.
    pub fn interleaved(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len() * 3);
        for i in 0..self.len() {
            out.push(self.red[i]);
            out.push(self.green[i]);
            out.push(self.blue[i]);
        }
        out
    }

    /// 64-bit FNV-1a over the interleaved pixels.
    pub fn fnv1a(&self) -> u64 {
        let mut hasher = FnvHasher::default();
        for i in 0..self.len() {
            hasher.write(&[self.red[i], self.green[i], self.blue[i]]);
        }
        hasher.finish()
    }

    /// True while every plane still holds exactly `width * height`
    /// bytes.
    pub fn planes_intact(&self) -> bool {
        let len = self.len();
        self.red.len() == len && self.green.len() == len && self.blue.len() == len
    }

    /// Splits the frame into bands of `rows_per_band` rows (the last
    /// may be shorter), in top-to-bottom order.  A band never holds
    /// more rows than the frame.
    pub fn bands(&mut self, rows_per_band: usize) -> Vec<Band> {
        let rows = rows_per_band.max(1).min(self.height);
        let width = self.width;
        let chunk = rows * width;
        self.red
            .chunks_mut(chunk)
            .zip(self.green.chunks_mut(chunk))
            .zip(self.blue.chunks_mut(chunk))
            .enumerate()
            .map(|(i, ((red, green), blue))| Band {
                first_row: i * rows,
                width,
                red,
                green,
                blue,
            })
            .collect()
    }
}

/// A run of whole rows of a frame, borrowed mutably.
#[derive(Debug)]
pub struct Band<'a> {
    first_row: usize,
    width: usize,
    red: &'a mut [u8],
    green: &'a mut [u8],
    blue: &'a mut [u8],
}

impl<'a> Band<'a> {
    /// The frame row of this band's first row.
    pub fn first_row(&self) -> usize {
        self.first_row
    }

    /// Number of rows in the band.
    pub fn rows(&self) -> usize {
        self.red.len() / self.width
    }

    /// Row width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Writes one pixel; `row` is relative to the band.
    #[inline]
    pub fn put(&mut self, x: usize, row: usize, color: Rgb) {
        let i = row * self.width + x;
        self.red[i] = color.0;
        self.green[i] = color.1;
        self.blue[i] = color.2;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_frames_are_black_and_sized() {
        let f = FrameBuffer::new(5, 3).unwrap();
        assert_eq!(f.len(), 15);
        assert_eq!(f.red.len(), 15);
        assert_eq!(f.green.len(), 15);
        assert_eq!(f.blue.len(), 15);
        assert!(f.interleaved().iter().all(|&b| b == 0));
    }

    #[test]
    fn impossible_sizes_are_errors() {
        assert!(FrameBuffer::new(0, 3).is_err());
        match FrameBuffer::new(usize::max_value(), 2) {
            Err(RenderError::AllocationFailure { .. }) => {}
            other => panic!("expected allocation failure, got {:?}", other),
        }
    }

    #[test]
    fn oversized_bands_hold_the_whole_frame() {
        let mut f = FrameBuffer::new(2, 3).unwrap();
        for &rows in &[3usize, 1 << 63, usize::max_value()] {
            let bands = f.bands(rows);
            assert_eq!(bands.len(), 1);
            assert_eq!(bands[0].rows(), 3);
            assert_eq!(bands[0].first_row(), 0);
        }
    }

    #[test]
    fn resized_planes_are_noticed() {
        let mut f = FrameBuffer::new(4, 4).unwrap();
        assert!(f.planes_intact());
        f.green.truncate(10);
        assert!(!f.planes_intact());
    }

    #[test]
    fn bands_cover_the_frame_without_overlap() {
        let mut f = FrameBuffer::new(4, 7).unwrap();
        {
            let bands = f.bands(3);
            assert_eq!(bands.len(), 3);
            assert_eq!(
                bands.iter().map(|b| b.first_row()).collect::<Vec<_>>(),
                vec![0, 3, 6]
            );
            assert_eq!(
                bands.iter().map(|b| b.rows()).collect::<Vec<_>>(),
                vec![3, 3, 1]
            );
            for mut band in bands {
                for row in 0..band.rows() {
                    for x in 0..band.width() {
                        let y = band.first_row() + row;
                        band.put(x, row, Rgb(x as u8, y as u8, 9));
                    }
                }
            }
        }
        for y in 0..7 {
            for x in 0..4 {
                assert_eq!(f.pixel(x, y), Rgb(x as u8, y as u8, 9));
            }
        }
    }

    #[test]
    fn interleaving_round_trips() {
        let bytes: Vec<u8> = (0..18).collect();
        let f = FrameBuffer::from_interleaved(3, 2, &bytes).unwrap();
        assert_eq!(f.pixel(1, 0), Rgb(3, 4, 5));
        assert_eq!(f.pixel(0, 1), Rgb(9, 10, 11));
        assert_eq!(f.interleaved(), bytes);
        assert!(FrameBuffer::from_interleaved(3, 2, &bytes[1..]).is_err());
    }

    #[test]
    fn hash_depends_on_content() {
        let a = FrameBuffer::new(2, 2).unwrap();
        let mut b = a.clone();
        assert_eq!(a.fnv1a(), b.fnv1a());
        b.blue[3] = 1;
        assert_ne!(a.fnv1a(), b.fnv1a());
    }
}
