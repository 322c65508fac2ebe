//! Glyph placement cache keyed by font face and glyph index.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::batch::ShadingType;
use crate::geometry::Rect;
use crate::payload::FontFaceId;

type GlyphKey = (FontFaceId, u16);

/// Where a rasterized glyph lives in the atlas and how to shade it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GlyphCacheEntry {
    /// `None` for glyphs with an empty ink box: cached, but never drawn.
    pub shading: Option<ShadingType>,
    /// Pixel offset from the glyph origin to the top-left of its ink box.
    pub offset: (i16, i16),
    /// Atlas rectangle `[x, y, w, h]` in pixels.
    pub texcoord: Rect,
}

/// All glyphs currently resident in the atlas.
///
/// There is no eviction: the whole cache is cleared together with the
/// atlas texture.
#[derive(Debug, Default)]
pub struct GlyphCache {
    entries: HashMap<GlyphKey, GlyphCacheEntry>,
}

impl GlyphCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a glyph, inserting an empty entry on a miss.
    ///
    /// Returns the entry and whether it was just inserted. A freshly
    /// inserted entry must be filled in by the caller.
    pub fn find_or_insert(
        &mut self,
        font_face: FontFaceId,
        glyph_index: u16,
    ) -> (&mut GlyphCacheEntry, bool) {
        match self.entries.entry((font_face, glyph_index)) {
            Entry::Occupied(e) => (e.into_mut(), false),
            Entry::Vacant(e) => (e.insert(GlyphCacheEntry::default()), true),
        }
    }

    pub fn get(&self, font_face: FontFaceId, glyph_index: u16) -> Option<&GlyphCacheEntry> {
        self.entries.get(&(font_face, glyph_index))
    }

    /// Drop one entry, e.g. a miss that could not be placed.
    pub fn remove(&mut self, font_face: FontFaceId, glyph_index: u16) {
        self.entries.remove(&(font_face, glyph_index));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn miss_then_hit() {
        let mut cache = GlyphCache::new();
        let (entry, inserted) = cache.find_or_insert(FontFaceId(1), 42);
        assert!(inserted);
        entry.shading = Some(ShadingType::TextGrayscale);
        entry.texcoord = Rect::new(0.0, 0.0, 8.0, 12.0);

        let (entry, inserted) = cache.find_or_insert(FontFaceId(1), 42);
        assert!(!inserted);
        assert_eq!(entry.shading, Some(ShadingType::TextGrayscale));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn key_includes_font_face() {
        let mut cache = GlyphCache::new();
        cache.find_or_insert(FontFaceId(1), 7);
        let (_, inserted) = cache.find_or_insert(FontFaceId(2), 7);
        assert!(inserted);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn empty_glyph_stays_cached() {
        let mut cache = GlyphCache::new();
        let (entry, _) = cache.find_or_insert(FontFaceId(0), 3);
        entry.shading = None;

        let (entry, inserted) = cache.find_or_insert(FontFaceId(0), 3);
        assert!(!inserted);
        assert_eq!(entry.shading, None);
    }

    #[test]
    fn clear_drops_everything() {
        let mut cache = GlyphCache::new();
        for g in 0..10 {
            cache.find_or_insert(FontFaceId(0), g);
        }
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get(FontFaceId(0), 3).is_none());
        assert!(cache.find_or_insert(FontFaceId(0), 3).1);
    }
}
