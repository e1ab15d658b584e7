//! Glyph table assembly shared by both descriptor encodings.
//!
//! BMFont stores glyph rectangles with a top-left origin; the tables built
//! here use a bottom-left origin, so every rectangle is flipped against the
//! declared texture height on the way in. Nothing else is transformed.

use log::trace;
use rustc_hash::FxHashMap;

use super::{Character, Glyph, GlyphMetrics, GlyphRect};

/// A `char` record as it appears in the file (top-left texture space).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CharRecord {
    pub code: u32,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub x_offset: i32,
    pub y_offset: i32,
    pub x_advance: i32,
    pub page: u32,
}

/// Finished output of a [`GlyphTableBuilder`].
#[derive(Debug, Default)]
pub struct GlyphTables {
    pub characters: Vec<Character>,
    pub lookup: FxHashMap<u32, usize>,
    pub glyphs: Vec<Glyph>,
}

#[derive(Debug)]
pub struct GlyphTableBuilder {
    texture_height: i32,
    tables: GlyphTables,
}

/// Flip a top-left-origin y coordinate to bottom-left origin.
#[inline(always)]
pub const fn flip_y(texture_height: i32, y: i32, height: i32) -> i32 {
    texture_height.wrapping_sub(y).wrapping_sub(height)
}

impl GlyphTableBuilder {
    pub fn new(texture_height: i32) -> Self {
        Self::with_capacity(texture_height, 0)
    }

    pub fn with_capacity(texture_height: i32, capacity: usize) -> Self {
        Self {
            texture_height,
            tables: GlyphTables {
                characters: Vec::with_capacity(capacity),
                lookup: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
                glyphs: Vec::with_capacity(capacity),
            },
        }
    }

    /// Append one record; returns the dense index assigned to its glyph.
    ///
    /// The lookup keeps the first character seen for a code point, later
    /// duplicates only land in the ordered list.
    pub fn push(&mut self, rec: &CharRecord) -> u32 {
        let index = self.tables.glyphs.len() as u32;
        let glyph = Glyph {
            index,
            rect: GlyphRect {
                x: rec.x,
                y: flip_y(self.texture_height, rec.y, rec.height),
                width: rec.width,
                height: rec.height,
            },
            metrics: GlyphMetrics {
                width: rec.width,
                height: rec.height,
                bearing_x: rec.x_offset,
                bearing_y: rec.y_offset,
                advance: rec.x_advance,
            },
            page: rec.page,
        };
        trace!(
            "glyph {index}: U+{:04X} rect {:?} page {}",
            rec.code, glyph.rect, rec.page
        );

        let char_idx = self.tables.characters.len();
        self.tables.characters.push(Character {
            code: rec.code,
            glyph: index,
        });
        self.tables.lookup.entry(rec.code).or_insert(char_idx);
        self.tables.glyphs.push(glyph);
        index
    }

    pub fn len(&self) -> usize {
        self.tables.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.glyphs.is_empty()
    }

    pub fn finish(self) -> GlyphTables {
        self.tables
    }
}

#[cfg(test)]
mod tests {
    use super::{CharRecord, GlyphTableBuilder, flip_y};

    fn rec(code: u32, y: i32, height: i32) -> CharRecord {
        CharRecord {
            code,
            x: 3,
            y,
            width: 10,
            height,
            x_offset: -1,
            y_offset: 4,
            x_advance: 11,
            page: 0,
        }
    }

    #[test]
    fn rect_is_flipped_to_bottom_left_origin() {
        let mut b = GlyphTableBuilder::new(256);
        b.push(&rec(65, 0, 12));
        b.push(&rec(66, 100, 20));
        let t = b.finish();
        assert_eq!(t.glyphs[0].rect.y, 244);
        assert_eq!(t.glyphs[1].rect.y, 136);
        for (g, src_y) in t.glyphs.iter().zip([0, 100]) {
            assert_eq!(g.rect.y + g.rect.height + src_y, 256);
        }
    }

    #[test]
    fn metrics_are_copied_verbatim() {
        let mut b = GlyphTableBuilder::new(64);
        b.push(&rec(33, 60, 12));
        let t = b.finish();
        let g = &t.glyphs[0];
        assert_eq!(g.rect.x, 3);
        // Out-of-bounds rectangles pass through untouched.
        assert_eq!(g.rect.y, -8);
        assert_eq!(
            (
                g.metrics.width,
                g.metrics.height,
                g.metrics.bearing_x,
                g.metrics.bearing_y,
                g.metrics.advance
            ),
            (10, 12, -1, 4, 11)
        );
    }

    #[test]
    fn indices_are_dense_and_first_code_point_wins() {
        let mut b = GlyphTableBuilder::new(128);
        assert!(b.is_empty());
        assert_eq!(b.push(&rec(65, 0, 8)), 0);
        assert!(!b.is_empty());
        assert_eq!(b.push(&rec(66, 0, 8)), 1);
        assert_eq!(b.push(&rec(65, 10, 8)), 2);
        assert_eq!(b.len(), 3);
        let t = b.finish();
        assert_eq!(t.characters.len(), 3);
        assert_eq!(t.lookup.len(), 2);
        assert_eq!(t.lookup[&65], 0);
        for (i, (c, g)) in t.characters.iter().zip(&t.glyphs).enumerate() {
            assert_eq!(g.index as usize, i);
            assert_eq!(c.glyph, g.index);
        }
    }

    #[test]
    fn flip_does_not_panic_on_extreme_values() {
        assert_eq!(flip_y(0, i32::MIN, 0), i32::MIN);
    }
}
