//! Frame geometry and tile extraction.
//!
//! Frames are produced in row-major order (top-to-bottom, left-to-right):
//! frame `i` is cell `(i / cols, i % cols)`. Every tile is drawn into one
//! reusable [`ScratchSurface`], so peak memory is one frame plus the sheet.

use crate::config::GridConfig;
use crate::decoder::SourceImage;
use image::RgbaImage;

const BYTES_PER_PIXEL: usize = 4;

/// Per-frame size derived from the sheet size and the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameGeometry {
    pub rows: u32,
    pub cols: u32,
    pub frame_width: u32,
    pub frame_height: u32,
}

impl FrameGeometry {
    /// Floor-divide the sheet into `rows × cols` cells. Trailing pixels that
    /// do not fill a whole cell are discarded.
    pub fn new(width: u32, height: u32, rows: u32, cols: u32) -> Self {
        debug_assert!(rows >= 1 && cols >= 1);
        Self {
            rows,
            cols,
            frame_width: width / cols,
            frame_height: height / rows,
        }
    }

    pub fn for_image(image: &SourceImage, config: &GridConfig) -> Self {
        Self::new(image.width(), image.height(), config.rows, config.cols)
    }

    pub fn frame_count(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    /// Pixel offset of the top-left corner of a cell.
    pub fn offset(&self, row: u32, col: u32) -> (u32, u32) {
        (col * self.frame_width, row * self.frame_height)
    }

    /// Cell of the `index`-th frame in emission order.
    pub fn cell(&self, index: usize) -> (u32, u32) {
        let cols = self.cols as usize;
        ((index / cols) as u32, (index % cols) as u32)
    }

    /// All cells in emission order.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32)> {
        let cols = self.cols;
        (0..self.rows).flat_map(move |row| (0..cols).map(move |col| (row, col)))
    }
}

/// The single drawing surface reused for every tile of one conversion.
#[derive(Debug)]
pub struct ScratchSurface {
    buffer: RgbaImage,
}

impl ScratchSurface {
    pub fn new(geometry: &FrameGeometry) -> Self {
        Self {
            buffer: RgbaImage::new(geometry.frame_width, geometry.frame_height),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.buffer
    }

    fn clear(&mut self) {
        let raw: &mut [u8] = &mut self.buffer;
        raw.fill(0);
    }

    /// Clear the surface, then copy the tile of `source` at `(row, col)` into it.
    fn draw_cell(&mut self, source: &SourceImage, geometry: &FrameGeometry, row: u32, col: u32) {
        self.clear();

        let (left, top) = geometry.offset(row, col);
        let src = source.pixels();
        let src_stride = src.width() as usize * BYTES_PER_PIXEL;
        let row_bytes = geometry.frame_width as usize * BYTES_PER_PIXEL;
        let src_raw = src.as_raw();

        for (y, dst_row) in self.buffer.chunks_exact_mut(row_bytes.max(1)).enumerate() {
            let start = (top as usize + y) * src_stride + left as usize * BYTES_PER_PIXEL;
            dst_row.copy_from_slice(&src_raw[start..start + row_bytes]);
        }
    }
}

/// One extracted tile, borrowed from the scratch surface.
#[derive(Debug)]
pub struct Frame<'a> {
    pub index: usize,
    pub row: u32,
    pub col: u32,
    pub duration_ms: u32,
    pub pixels: &'a RgbaImage,
}

/// Walks the grid of one sheet, yielding each frame into the scratch surface.
pub struct FrameExtractor<'a> {
    source: &'a SourceImage,
    geometry: FrameGeometry,
    duration_ms: u32,
}

impl<'a> FrameExtractor<'a> {
    pub fn new(source: &'a SourceImage, geometry: FrameGeometry, duration_ms: u32) -> Self {
        Self {
            source,
            geometry,
            duration_ms,
        }
    }

    pub fn geometry(&self) -> &FrameGeometry {
        &self.geometry
    }

    /// Draw frame `index` into `scratch` and return a view of it.
    pub fn extract<'s>(&self, index: usize, scratch: &'s mut ScratchSurface) -> Frame<'s> {
        let (row, col) = self.geometry.cell(index);
        scratch.draw_cell(self.source, &self.geometry, row, col);
        Frame {
            index,
            row,
            col,
            duration_ms: self.duration_ms,
            pixels: scratch.image(),
        }
    }

    /// Extract every frame in row-major order, handing each to `sink` before
    /// the next one overwrites the surface. Stops at the first error.
    pub fn for_each_frame<E, F>(&self, scratch: &mut ScratchSurface, mut sink: F) -> Result<(), E>
    where
        F: FnMut(Frame<'_>) -> Result<(), E>,
    {
        for index in 0..self.geometry.frame_count() {
            let frame = self.extract(index, scratch);
            sink(frame)?;
        }
        Ok(())
    }
}
