//! Font engine interface
//!
//! The document only needs a handful of queries from a font: glyph lookup,
//! advance widths, some global metrics and a way to produce an embeddable
//! subset. [`TrueTypeFace`] answers them with `ttf-parser` and `subsetter`.

use std::{fs, path::Path};

use log::warn;

use crate::{
    common::{FontFlags, Point, Rectangle},
    error::LoadError,
};

/// Index of a glyph in the font program
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GlyphId(pub u16);

/// The standard 14 fonts every reader provides
#[allow(missing_docs)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BuiltinFont {
    TimesRoman,
    TimesBold,
    TimesItalic,
    TimesBoldItalic,
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
    Courier,
    CourierBold,
    CourierOblique,
    CourierBoldOblique,
    Symbol,
    ZapfDingbats,
}

impl BuiltinFont {
    /// All fonts, in declaration order
    pub const ALL: [BuiltinFont; 14] = [
        Self::TimesRoman,
        Self::TimesBold,
        Self::TimesItalic,
        Self::TimesBoldItalic,
        Self::Helvetica,
        Self::HelveticaBold,
        Self::HelveticaOblique,
        Self::HelveticaBoldOblique,
        Self::Courier,
        Self::CourierBold,
        Self::CourierOblique,
        Self::CourierBoldOblique,
        Self::Symbol,
        Self::ZapfDingbats,
    ];

    /// The `/BaseFont` name
    pub const fn base_font(self) -> &'static str {
        match self {
            Self::TimesRoman => "Times-Roman",
            Self::TimesBold => "Times-Bold",
            Self::TimesItalic => "Times-Italic",
            Self::TimesBoldItalic => "Times-BoldItalic",
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::HelveticaOblique => "Helvetica-Oblique",
            Self::HelveticaBoldOblique => "Helvetica-BoldOblique",
            Self::Courier => "Courier",
            Self::CourierBold => "Courier-Bold",
            Self::CourierOblique => "Courier-Oblique",
            Self::CourierBoldOblique => "Courier-BoldOblique",
            Self::Symbol => "Symbol",
            Self::ZapfDingbats => "ZapfDingbats",
        }
    }
}

/// Global font metrics, in font units
#[derive(Debug, Clone, PartialEq)]
pub struct FontMetrics {
    /// Units per em
    pub units_per_em: u16,
    /// Typographic ascender
    pub ascender: i16,
    /// Typographic descender (negative)
    pub descender: i16,
    /// Height of flat capital letters
    pub cap_height: Option<i16>,
    /// Union of all glyph boxes
    pub bbox: Rectangle<i32>,
    /// Angle of the dominant vertical strokes
    pub italic_angle: f32,
    /// Flags for the font descriptor
    pub flags: FontFlags,
}

impl FontMetrics {
    /// Convert a value in font units to thousandths of an em
    pub fn scale(&self, value: i32) -> i32 {
        if self.units_per_em == 0 {
            return value;
        }
        (value as f32 * 1000.0 / self.units_per_em as f32).round() as i32
    }
}

/// A font face that can be embedded
pub trait FontFace {
    /// The PostScript name used for `/BaseFont`
    fn postscript_name(&self) -> String;

    /// The glyph that shows `chr`, if any
    fn glyph_index(&self, chr: char) -> Option<GlyphId>;

    /// Horizontal advance in font units
    fn advance_width(&self, glyph: GlyphId) -> Option<u16>;

    /// Global metrics
    fn metrics(&self) -> FontMetrics;

    /// Build a font program containing `.notdef` at glyph 0 and `glyphs[p]`
    /// at glyph `p + 1`
    fn subset(&self, glyphs: &[GlyphId]) -> Result<Vec<u8>, LoadError>;
}

/// A TrueType / OpenType face read from a file
pub struct TrueTypeFace {
    data: Vec<u8>,
    index: u32,
    name: String,
    metrics: FontMetrics,
}

impl std::fmt::Debug for TrueTypeFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrueTypeFace")
            .field("name", &self.name)
            .field("index", &self.index)
            .field("len", &self.data.len())
            .finish()
    }
}

impl TrueTypeFace {
    /// Load the first face of a font file
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let data = fs::read(path)?;
        let fallback = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| String::from("Font"));
        Self::from_data(data, 0, &fallback)
    }

    /// Parse face `index` from font file bytes
    pub fn from_data(data: Vec<u8>, index: u32, fallback_name: &str) -> Result<Self, LoadError> {
        let face = ttf_parser::Face::parse(&data, index)?;

        let name = face
            .names()
            .into_iter()
            .filter(|n| n.name_id == ttf_parser::name_id::POST_SCRIPT_NAME)
            .find_map(|n| n.to_string())
            .unwrap_or_else(|| {
                warn!("Font has no PostScript name, using {:?}", fallback_name);
                fallback_name.to_owned()
            });
        let name: String = name.chars().filter(|c| !c.is_whitespace()).collect();

        let bb = face.global_bounding_box();
        let mut flags = FontFlags::SYMBOLIC;
        if face.is_monospaced() {
            flags |= FontFlags::FIXED_PITCH;
        }
        if face.is_italic() {
            flags |= FontFlags::ITALIC;
        }
        let metrics = FontMetrics {
            units_per_em: face.units_per_em(),
            ascender: face.ascender(),
            descender: face.descender(),
            cap_height: face.capital_height(),
            bbox: Rectangle {
                ll: Point {
                    x: bb.x_min.into(),
                    y: bb.y_min.into(),
                },
                ur: Point {
                    x: bb.x_max.into(),
                    y: bb.y_max.into(),
                },
            },
            italic_angle: if face.is_italic() { -12.0 } else { 0.0 },
            flags,
        };

        Ok(Self {
            data,
            index,
            name,
            metrics,
        })
    }

    fn face(&self) -> Option<ttf_parser::Face<'_>> {
        // validated in `from_data`
        ttf_parser::Face::parse(&self.data, self.index).ok()
    }
}

impl FontFace for TrueTypeFace {
    fn postscript_name(&self) -> String {
        self.name.clone()
    }

    fn glyph_index(&self, chr: char) -> Option<GlyphId> {
        self.face()?.glyph_index(chr).map(|g| GlyphId(g.0))
    }

    fn advance_width(&self, glyph: GlyphId) -> Option<u16> {
        self.face()?.glyph_hor_advance(ttf_parser::GlyphId(glyph.0))
    }

    fn metrics(&self) -> FontMetrics {
        self.metrics.clone()
    }

    fn subset(&self, glyphs: &[GlyphId]) -> Result<Vec<u8>, LoadError> {
        let mut remapper = subsetter::GlyphRemapper::new();
        for glyph in glyphs {
            remapper.remap(glyph.0);
        }
        subsetter::subset(&self.data, self.index, &remapper)
            .map_err(|e| LoadError::Subset(e.to_string()))
    }
}
