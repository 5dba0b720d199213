//! System font database: discovery and CSS-style matching.
//!
//! Wraps `font-kit` for OS-level enumeration and indexes faces by
//! lowercase family name. Matching walks a CSS fallback chain
//! (`"Inter, Helvetica, sans-serif"`) and picks the closest face by
//! stretch, then style, then weight. A match carries the font-kit
//! [`Handle`] so [`FontManager`](crate::FontManager) can load its bytes.
//!
//! ```text
//! FontDatabase
//!   ├── families: HashMap<String, Vec<SystemFace>>
//!   ├── generic_map: HashMap<GenericFamily, String>
//!   └── match_font(descriptor) → Option<FontMatch>
//! ```

use std::collections::HashMap;
use std::fmt;
use std::time::Instant;

use font_kit::family_name::FamilyName;
use font_kit::handle::Handle;
use font_kit::properties::{Properties as FkProperties, Style as FkStyle};
use font_kit::source::SystemSource;

use crate::error::FontError;
use crate::font::FontFile;

// ── Style, stretch, generic family ──────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
    Oblique,
}

/// Font stretch / width class.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FontStretch {
    UltraCondensed,
    ExtraCondensed,
    Condensed,
    SemiCondensed,
    #[default]
    Normal,
    SemiExpanded,
    Expanded,
    ExtraExpanded,
    UltraExpanded,
}

/// CSS generic font families.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GenericFamily {
    Serif,
    SansSerif,
    Monospace,
    Cursive,
    Fantasy,
}

impl GenericFamily {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "serif" => Some(Self::Serif),
            "sans-serif" => Some(Self::SansSerif),
            "monospace" => Some(Self::Monospace),
            "cursive" => Some(Self::Cursive),
            "fantasy" => Some(Self::Fantasy),
            _ => None,
        }
    }

    fn family_name(self) -> FamilyName {
        match self {
            Self::Serif => FamilyName::Serif,
            Self::SansSerif => FamilyName::SansSerif,
            Self::Monospace => FamilyName::Monospace,
            Self::Cursive => FamilyName::Cursive,
            Self::Fantasy => FamilyName::Fantasy,
        }
    }
}

// ── Faces and descriptors ───────────────────────────────────────────

/// One installed face and where to load it from.
#[derive(Clone, Debug)]
pub struct SystemFace {
    pub postscript_name: String,
    /// Weight (100–900).
    pub weight: u16,
    pub style: FontStyle,
    pub stretch: FontStretch,
    pub handle: Handle,
}

impl SystemFace {
    /// Read the face's bytes into a [`FontFile`] named by its PostScript name.
    pub fn load(&self) -> Result<FontFile, FontError> {
        match &self.handle {
            Handle::Path { path, font_index } => {
                Ok(FontFile::from_path(path, &self.postscript_name)?.with_face_index(*font_index))
            }
            Handle::Memory { bytes, font_index } => {
                Ok(FontFile::from_bytes(&self.postscript_name, bytes.to_vec())?
                    .with_face_index(*font_index))
            }
        }
    }
}

/// CSS-style font request.
#[derive(Clone, Debug, PartialEq)]
pub struct FontDescriptor {
    /// Lowercase fallback chain, e.g. `["arial", "helvetica", "sans-serif"]`.
    pub families: Vec<String>,
    /// Weight (100–900). 400 = normal, 700 = bold.
    pub weight: u16,
    pub style: FontStyle,
    pub stretch: FontStretch,
}

impl Default for FontDescriptor {
    fn default() -> Self {
        Self {
            families: vec!["sans-serif".into()],
            weight: 400,
            style: FontStyle::Normal,
            stretch: FontStretch::Normal,
        }
    }
}

impl FontDescriptor {
    /// Parse a CSS `font-family` list. Names are trimmed, unquoted and
    /// lowercased; an empty list becomes `sans-serif`.
    pub fn from_css(family_str: &str, weight: u16, style: FontStyle) -> Self {
        let families: Vec<String> = family_str
            .split(',')
            .map(|s| s.trim().trim_matches('"').trim_matches('\'').to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            families: if families.is_empty() {
                vec!["sans-serif".into()]
            } else {
                families
            },
            weight,
            style,
            stretch: FontStretch::Normal,
        }
    }
}

#[derive(Clone, Debug)]
pub struct FontMatch {
    /// Resolved family name (lowercase).
    pub family: String,
    pub face: SystemFace,
    pub match_type: MatchType,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchType {
    /// A family in the chain was installed.
    Exact,
    /// Resolved through a generic family keyword.
    Generic,
    /// Nothing in the chain matched.
    Fallback,
}

// ── Database ────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FontDatabase {
    families: HashMap<String, Vec<SystemFace>>,
    generic_map: HashMap<GenericFamily, String>,
    discovery_time_ms: f64,
    face_count: usize,
}

impl FontDatabase {
    /// Database with no faces. Faces can be added with [`insert`](Self::insert).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Enumerate installed fonts. Faces that fail to load are skipped; a
    /// system without fonts gives an empty database.
    pub fn discover() -> Self {
        let start = Instant::now();
        let source = SystemSource::new();
        let mut db = Self::empty();

        match source.all_families() {
            Ok(family_names) => {
                for family_name in &family_names {
                    let Ok(family) = source.select_family_by_name(family_name) else {
                        continue;
                    };
                    for handle in family.fonts() {
                        let Ok(font) = handle.load() else {
                            continue;
                        };
                        let props = font.properties();
                        db.insert(
                            family_name,
                            SystemFace {
                                postscript_name: font.postscript_name().unwrap_or_default(),
                                weight: props.weight.0 as u16,
                                style: convert_style(props.style),
                                stretch: convert_stretch(props.stretch.0),
                                handle: handle.clone(),
                            },
                        );
                    }
                }
            }
            Err(err) => log::warn!("System font enumeration failed: {err:?}"),
        }

        for generic in [
            GenericFamily::Serif,
            GenericFamily::SansSerif,
            GenericFamily::Monospace,
            GenericFamily::Cursive,
            GenericFamily::Fantasy,
        ] {
            if let Some(name) = resolve_generic(&source, generic) {
                db.generic_map.insert(generic, name);
            }
        }

        db.discovery_time_ms = start.elapsed().as_secs_f64() * 1000.0;
        log::info!("FontDatabase: {db}");
        db
    }

    /// Register `face` under `family` (case-insensitive).
    pub fn insert(&mut self, family: &str, face: SystemFace) {
        self.families.entry(family.to_lowercase()).or_default().push(face);
        self.face_count += 1;
    }

    /// Resolve `generic` to an installed family.
    pub fn set_generic(&mut self, generic: GenericFamily, family: &str) {
        self.generic_map.insert(generic, family.to_lowercase());
    }

    pub fn family_count(&self) -> usize {
        self.families.len()
    }

    pub fn face_count(&self) -> usize {
        self.face_count
    }

    pub fn is_empty(&self) -> bool {
        self.face_count == 0
    }

    pub fn discovery_time_ms(&self) -> f64 {
        self.discovery_time_ms
    }

    /// Family names, sorted.
    pub fn all_families(&self) -> Vec<String> {
        let mut names: Vec<String> = self.families.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn has_family(&self, name: &str) -> bool {
        self.families.contains_key(&name.to_lowercase())
    }

    pub fn faces(&self, family: &str) -> Option<&[SystemFace]> {
        self.families.get(&family.to_lowercase()).map(|v| v.as_slice())
    }

    pub fn resolve_generic(&self, generic: GenericFamily) -> Option<&str> {
        self.generic_map.get(&generic).map(|s| s.as_str())
    }

    /// Walk the descriptor's chain, then fall back to sans-serif, then to
    /// the alphabetically first family. `None` only for an empty database.
    pub fn match_font(&self, descriptor: &FontDescriptor) -> Option<FontMatch> {
        for family_name in &descriptor.families {
            let family_name = family_name.to_lowercase();
            if let Some(generic) = GenericFamily::parse(&family_name) {
                if let Some(found) = self.match_generic(generic, descriptor, MatchType::Generic) {
                    return Some(found);
                }
                continue;
            }
            if let Some(faces) = self.families.get(&family_name) {
                if let Some(face) = best_match(faces, descriptor) {
                    return Some(FontMatch {
                        family: family_name,
                        face,
                        match_type: MatchType::Exact,
                    });
                }
            }
        }

        if let Some(found) =
            self.match_generic(GenericFamily::SansSerif, descriptor, MatchType::Fallback)
        {
            return Some(found);
        }

        let family = self.all_families().into_iter().next()?;
        let face = best_match(self.families.get(&family)?, descriptor)?;
        Some(FontMatch {
            family,
            face,
            match_type: MatchType::Fallback,
        })
    }

    fn match_generic(
        &self,
        generic: GenericFamily,
        descriptor: &FontDescriptor,
        match_type: MatchType,
    ) -> Option<FontMatch> {
        let concrete = self.generic_map.get(&generic)?;
        let face = best_match(self.families.get(concrete)?, descriptor)?;
        Some(FontMatch {
            family: concrete.clone(),
            face,
            match_type,
        })
    }
}

impl fmt::Display for FontDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FontDatabase({} families, {} faces, {:.1}ms)",
            self.families.len(),
            self.face_count,
            self.discovery_time_ms,
        )
    }
}

// ── Matching internals ──────────────────────────────────────────────

/// Lowest-scoring face; stops early on a perfect match.
fn best_match(faces: &[SystemFace], desc: &FontDescriptor) -> Option<SystemFace> {
    let mut best: Option<(&SystemFace, u32)> = None;
    for face in faces {
        let score = match_score(face, desc);
        if best.map_or(true, |(_, s)| score < s) {
            best = Some((face, score));
            if score == 0 {
                break;
            }
        }
    }
    best.map(|(face, _)| face.clone())
}

/// Lower is better. Stretch dominates style, style dominates weight.
fn match_score(face: &SystemFace, desc: &FontDescriptor) -> u32 {
    let stretch_diff = stretch_distance(face.stretch, desc.stretch) as u32;
    let style_diff = style_distance(face.style, desc.style) as u32;
    let weight_diff = (face.weight as i32 - desc.weight as i32).unsigned_abs();

    stretch_diff * 10000 + style_diff * 100 + weight_diff
}

fn stretch_distance(a: FontStretch, b: FontStretch) -> u8 {
    (a as i8 - b as i8).unsigned_abs()
}

fn style_distance(a: FontStyle, b: FontStyle) -> u8 {
    match (a, b) {
        _ if a == b => 0,
        (FontStyle::Italic, FontStyle::Oblique) | (FontStyle::Oblique, FontStyle::Italic) => 1,
        _ => 2,
    }
}

fn convert_style(style: FkStyle) -> FontStyle {
    match style {
        FkStyle::Normal => FontStyle::Normal,
        FkStyle::Italic => FontStyle::Italic,
        FkStyle::Oblique => FontStyle::Oblique,
    }
}

/// Map a font-kit stretch factor (0.5–2.0) to the nearest width class.
fn convert_stretch(value: f32) -> FontStretch {
    const CLASSES: [(f32, FontStretch); 8] = [
        (0.525, FontStretch::UltraCondensed),
        (0.575, FontStretch::ExtraCondensed),
        (0.65, FontStretch::Condensed),
        (0.775, FontStretch::SemiCondensed),
        (1.05, FontStretch::Normal),
        (1.15, FontStretch::SemiExpanded),
        (1.3, FontStretch::Expanded),
        (1.6, FontStretch::ExtraExpanded),
    ];
    CLASSES
        .iter()
        .find(|(limit, _)| value <= *limit)
        .map(|(_, class)| *class)
        .unwrap_or(FontStretch::UltraExpanded)
}

fn resolve_generic(source: &SystemSource, generic: GenericFamily) -> Option<String> {
    let handle = source
        .select_best_match(&[generic.family_name()], &FkProperties::new())
        .ok()?;
    let name = handle.load().ok()?.family_name();
    (!name.is_empty()).then(|| name.to_lowercase())
}

// ===================================================================
// Tests
// ===================================================================
