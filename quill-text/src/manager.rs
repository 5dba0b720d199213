//! Context-owned font registry.
//!
//! [`FontManager`] owns every loaded face together with its per-face
//! [`FontCache`]. Fonts are addressed by [`FontHandle`]; queries through a
//! handle that does not exist return zero-valued results.

use std::cell::RefCell;
use std::num::NonZeroUsize;
use std::path::Path;

use lru::LruCache;

use crate::config::{GLYPH_AVAILABILITY_CACHE_SIZE, MAX_FONTS};
use crate::database::{FontDatabase, FontDescriptor};
use crate::error::FontError;
use crate::font::{FaceId, FontFace, FontFile, FontMetrics, GlyphMetrics};
use crate::font_cache::FontCache;
use crate::shaping::ShapingFont;

/// Index of a font inside its [`FontManager`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FontHandle(pub usize);

/// A loaded font: source bytes, parsed face and its shaping handles.
pub struct FontEntry {
    pub file: FontFile,
    pub face: FontFace,
    pub cache: FontCache,
}

/// Ordered list of fonts tried for each character.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FontFallbackChain {
    fonts: Vec<FontHandle>,
}

impl FontFallbackChain {
    pub fn new(fonts: Vec<FontHandle>) -> Self {
        Self { fonts }
    }

    pub fn single(font: FontHandle) -> Self {
        Self { fonts: vec![font] }
    }

    pub fn push(&mut self, font: FontHandle) {
        if !self.fonts.contains(&font) {
            self.fonts.push(font);
        }
    }

    /// First font of the chain.
    pub fn primary(&self) -> Option<FontHandle> {
        self.fonts.first().copied()
    }

    pub fn fonts(&self) -> &[FontHandle] {
        &self.fonts
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }
}

pub struct FontManager {
    fonts: Vec<FontEntry>,
    default_font: Option<FontHandle>,
    glyph_availability: RefCell<LruCache<(FontHandle, char), bool>>,
}

impl Default for FontManager {
    fn default() -> Self {
        Self::new()
    }
}

impl FontManager {
    pub fn new() -> Self {
        let capacity =
            NonZeroUsize::new(GLYPH_AVAILABILITY_CACHE_SIZE).unwrap_or(NonZeroUsize::MIN);
        Self {
            fonts: Vec::new(),
            default_font: None,
            glyph_availability: RefCell::new(LruCache::new(capacity)),
        }
    }

    /// Register an already loaded file. The first font becomes the default.
    pub fn add_font_file(&mut self, file: FontFile) -> Result<FontHandle, FontError> {
        if self.fonts.len() >= MAX_FONTS {
            return Err(FontError::TooManyFonts(MAX_FONTS));
        }
        let handle = FontHandle(self.fonts.len());
        let face = FontFace::from_file(&file, FaceId(handle.0 as u32))?;
        log::info!("Loaded font '{}' as {:?}", file.name(), handle);
        self.fonts.push(FontEntry {
            file,
            face,
            cache: FontCache::new(),
        });
        if self.default_font.is_none() {
            self.default_font = Some(handle);
        }
        Ok(handle)
    }

    pub fn load_font_from_memory(&mut self, data: Vec<u8>, name: &str) -> Option<FontHandle> {
        let result = FontFile::from_bytes(name, data).and_then(|file| self.add_font_file(file));
        log_failure(name, result)
    }

    pub fn load_font_from_file(&mut self, path: impl AsRef<Path>, name: &str) -> Option<FontHandle> {
        let result = FontFile::from_path(path, name).and_then(|file| self.add_font_file(file));
        log_failure(name, result)
    }

    /// Load the best installed match for `descriptor`.
    pub fn load_system_font(
        &mut self,
        database: &FontDatabase,
        descriptor: &FontDescriptor,
    ) -> Option<FontHandle> {
        let Some(found) = database.match_font(descriptor) else {
            log::warn!("No installed font matches {:?}", descriptor.families);
            return None;
        };
        let name = found.face.postscript_name.clone();
        let result = found.face.load().and_then(|file| self.add_font_file(file));
        log_failure(&name, result)
    }

    pub fn font_count(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_valid(&self, handle: FontHandle) -> bool {
        handle.0 < self.fonts.len()
    }

    pub fn entry(&self, handle: FontHandle) -> Option<&FontEntry> {
        self.fonts.get(handle.0)
    }

    pub fn face(&self, handle: FontHandle) -> Option<&FontFace> {
        self.entry(handle).map(|e| &e.face)
    }

    pub fn file(&self, handle: FontHandle) -> Option<&FontFile> {
        self.entry(handle).map(|e| &e.file)
    }

    /// Size-bound shaping handle from the font's cache.
    pub fn shaping_font(&mut self, handle: FontHandle, size: f32) -> Option<&ShapingFont> {
        let entry = self.fonts.get_mut(handle.0)?;
        entry.cache.get_shaping_font(&entry.face, size)
    }

    pub fn font_metrics(&self, handle: FontHandle, size: f32) -> FontMetrics {
        self.face(handle).map(|f| f.metrics(size)).unwrap_or_default()
    }

    pub fn glyph_metrics(&self, handle: FontHandle, ch: char, size: f32) -> GlyphMetrics {
        self.face(handle)
            .map(|f| f.glyph_metrics(ch, size))
            .unwrap_or_default()
    }

    pub fn measure_text(&self, handle: FontHandle, text: &str, size: f32) -> f32 {
        self.face(handle)
            .map(|f| f.measure_text(text, size))
            .unwrap_or(0.0)
    }

    pub fn text_height(&self, handle: FontHandle, size: f32) -> f32 {
        self.face(handle).map(|f| f.text_height(size)).unwrap_or(0.0)
    }

    /// Whether `handle` maps `ch`. The most recent
    /// `GLYPH_AVAILABILITY_CACHE_SIZE` answers are memoized.
    pub fn has_glyph(&self, handle: FontHandle, ch: char) -> bool {
        let mut memo = self.glyph_availability.borrow_mut();
        if let Some(&known) = memo.get(&(handle, ch)) {
            return known;
        }
        let available = self.face(handle).is_some_and(|f| f.has_glyph(ch));
        memo.put((handle, ch), available);
        available
    }

    /// First font in `chain` that has `ch`, else the chain's primary font.
    /// An empty chain resolves to the default font.
    pub fn select_font_for_codepoint(
        &self,
        ch: char,
        chain: &FontFallbackChain,
    ) -> Option<FontHandle> {
        let found = chain
            .fonts()
            .iter()
            .copied()
            .find(|&font| self.has_glyph(font, ch));
        if found.is_none() {
            log::trace!("No font in chain has U+{:04X}", ch as u32);
        }
        found.or(chain.primary()).or(self.default_font)
    }

    /// Make `handle` the default font. Fails for unknown handles.
    pub fn set_default_font(&mut self, handle: FontHandle) -> bool {
        if !self.is_valid(handle) {
            return false;
        }
        self.default_font = Some(handle);
        true
    }

    pub fn default_font(&self) -> Option<FontHandle> {
        self.default_font
    }

    /// Default font first, then every other font in load order.
    pub fn default_fallback_chain(&self) -> FontFallbackChain {
        let mut chain = FontFallbackChain::default();
        if let Some(default) = self.default_font {
            chain.push(default);
        }
        for index in 0..self.fonts.len() {
            chain.push(FontHandle(index));
        }
        chain
    }
}

fn log_failure(name: &str, result: Result<FontHandle, FontError>) -> Option<FontHandle> {
    match result {
        Ok(handle) => Some(handle),
        Err(err) => {
            log::warn!("Failed to load font '{name}': {err}");
            None
        }
    }
}

// ===================================================================
// Tests
// ===================================================================
