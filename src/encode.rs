// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Writes frames as binary PPM or PNG, and reads binary PPM back.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use failure::Fail;
use image::png::PNGEncoder;
use image::pnm::PNMDecoder;
use image::{ColorType, ImageDecoder};

use crate::frame::FrameBuffer;

/// Failures while writing or reading an image.  The underlying
/// library's message is carried through unchanged.
#[derive(Debug, Fail)]
pub enum EncodeError {
    /// The file could not be opened, written or read.
    #[fail(display = "{}", _0)]
    Io(#[cause] io::Error),
    /// The PNG encoder rejected the frame.
    #[fail(display = "PNG encode error: {}", _0)]
    Png(String),
    /// The input was not a binary RGB PPM.
    #[fail(display = "could not read image: {}", _0)]
    Decode(String),
    /// Wider or taller than the format can describe.
    #[fail(display = "{}x{} is too large to encode", _0, _1)]
    TooLarge(usize, usize),
}

impl From<io::Error> for EncodeError {
    fn from(e: io::Error) -> Self {
        EncodeError::Io(e)
    }
}

/// The supported output formats.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Format {
    /// 8-bit RGB PNG.
    Png,
    /// Binary ("P6") portable pixmap.
    Ppm,
}

impl Default for Format {
    fn default() -> Self {
        Format::Png
    }
}

impl Format {
    /// The file name used when none is given.
    pub fn default_filename(self) -> &'static str {
        match self {
            Format::Png => "NEWTON.png",
            Format::Ppm => "NEWTON.ppm",
        }
    }
}

/// Writes `P6\n<width> <height>\n255\n` and then the pixels as RGB
/// triples, row by row.
pub fn write_ppm<W: Write>(frame: &FrameBuffer, mut out: W) -> Result<(), EncodeError> {
    write!(out, "P6\n{} {}\n255\n", frame.width(), frame.height())?;
    let width = frame.width();
    let mut row = vec![0u8; width * 3];
    for y in 0..frame.height() {
        let base = y * width;
        for (x, rgb) in row.chunks_mut(3).enumerate() {
            rgb[0] = frame.red[base + x];
            rgb[1] = frame.green[base + x];
            rgb[2] = frame.blue[base + x];
        }
        out.write_all(&row)?;
    }
    out.flush()?;
    Ok(())
}

/// Reads a binary PPM with a maximum value of 255.
pub fn read_ppm<R: Read>(input: R) -> Result<FrameBuffer, EncodeError> {
    let decoder =
        PNMDecoder::new(BufReader::new(input)).map_err(|e| EncodeError::Decode(e.to_string()))?;
    let (width, height) = decoder.dimensions();
    let (width, height) = (width as usize, height as usize);
    let bytes = decoder
        .read_image()
        .map_err(|e| EncodeError::Decode(e.to_string()))?;
    FrameBuffer::from_interleaved(width, height, &bytes)
        .map_err(|e| EncodeError::Decode(e.to_string()))
}

/// Writes an 8-bit RGB PNG.
pub fn write_png<W: Write>(frame: &FrameBuffer, out: W) -> Result<(), EncodeError> {
    let too_large = || EncodeError::TooLarge(frame.width(), frame.height());
    let width = to_u32(frame.width()).ok_or_else(too_large)?;
    let height = to_u32(frame.height()).ok_or_else(too_large)?;
    PNGEncoder::new(out)
        .encode(&frame.interleaved(), width, height, ColorType::RGB(8))
        .map_err(|e| EncodeError::Png(e.to_string()))
}

fn to_u32(v: usize) -> Option<u32> {
    if v > u32::max_value() as usize {
        None
    } else {
        Some(v as u32)
    }
}

/// Writes the frame to `path` in the given format.
pub fn save(frame: &FrameBuffer, path: &Path, format: Format) -> Result<(), EncodeError> {
    let file = BufWriter::new(File::create(path)?);
    match format {
        Format::Png => write_png(frame, file),
        Format::Ppm => write_ppm(frame, file),
    }
}
