/// Shelf packer for glyph bitmaps.
///
/// Glyphs fill a row left to right; when one does not fit horizontally the cursor
/// moves down by the tallest glyph of the row.
#[derive(Debug, Clone)]
pub(crate) struct ShelfPacker {
    width: u32,
    max_height: u32,
    padding: u32,
    cursor_x: u32,
    cursor_y: u32,
    row_height: u32,
}

impl ShelfPacker {
    pub fn new(width: u32, max_height: u32, padding: u32) -> Self {
        Self { width, max_height, padding, cursor_x: padding, cursor_y: padding, row_height: 0 }
    }

    /// Top-left corner for a `w` x `h` bitmap, or `None` when the atlas is full.
    pub fn place(&mut self, w: u32, h: u32) -> Option<(u32, u32)> {
        if w + 2 * self.padding > self.width {
            return None;
        }
        if self.cursor_x + w + self.padding > self.width {
            self.cursor_y += self.row_height + self.padding;
            self.cursor_x = self.padding;
            self.row_height = 0;
        }
        if self.cursor_y + h + self.padding > self.max_height {
            return None;
        }

        let pos = (self.cursor_x, self.cursor_y);
        self.cursor_x += w + self.padding;
        self.row_height = self.row_height.max(h);
        Some(pos)
    }

    /// Height actually used so far, including the current row.
    pub fn used_height(&self) -> u32 {
        self.cursor_y + self.row_height + self.padding
    }
}
