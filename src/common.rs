//! Common structs and enums

use std::{collections::BTreeMap, fmt, io};

use serde::Deserialize;

use crate::{
    encoding::text_string_encode,
    write::{Formatter, PdfDict, PdfName, PdfNameBuf, Serialize, ToDict},
};

/// A PDF Byte string
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd)]
pub struct PdfString(Vec<u8>);

impl PdfString {
    /// Create a new string from raw bytes
    pub fn new(string: &[u8]) -> Self {
        Self(string.to_vec())
    }

    /// Create a *text string*, i.e. one that is shown to the user
    pub fn text(text: &str) -> Self {
        Self(text_string_encode(text))
    }

    /// Get a slice to the contained bytes
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_ref()
    }

    /// Get the contained byte buffer
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl fmt::Debug for PdfString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PdfString({:?})", String::from_utf8_lossy(&self.0))
    }
}

/// A reference to an object
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjRef {
    /// The object number within the file
    pub id: u64,
    /// The generation number
    pub gen: u16,
}

/// Make a ObjRef for an original document (generation 0)
pub const fn make_ref(id: u64) -> ObjRef {
    ObjRef { id, gen: 0 }
}

/// A simple two-dimensional coordinate
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct Point<P> {
    /// Horizontal offset
    pub x: P,
    /// Vertical offset
    pub y: P,
}

/// A primitive rectangle
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
pub struct Rectangle<P> {
    /// lower left
    pub ll: Point<P>,
    /// upper right
    pub ur: Point<P>,
}

impl Rectangle<f32> {
    /// Create a rectangle from its corner coordinates
    pub const fn new(llx: f32, lly: f32, urx: f32, ury: f32) -> Self {
        Rectangle {
            ll: Point { x: llx, y: lly },
            ur: Point { x: urx, y: ury },
        }
    }

    /// A box at the origin with the given dimensions
    pub const fn media_box(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// The media box for A4 Paper (Portrait)
    pub const fn a4_media_box() -> Self {
        Self::media_box(595.276, 841.89)
    }

    /// Width of the rectangle
    pub fn width(&self) -> f32 {
        self.ur.x - self.ll.x
    }

    /// Height of the rectangle
    pub fn height(&self) -> f32 {
        self.ur.y - self.ll.y
    }
}

impl<P: Serialize> Serialize for Rectangle<P> {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        f.pdf_arr()
            .entry(&self.ll.x)?
            .entry(&self.ll.y)?
            .entry(&self.ur.x)?
            .entry(&self.ur.y)?
            .finish()
    }
}

/// A transformation matrix
///
/// <pre style="line-height: 120%;">
/// ⎛ a b 0 ⎞
/// ⎜ c d 0 ⎟
/// ⎝ e f 1 ⎠
/// </pre>
#[derive(Debug, Copy, Clone, PartialEq, Deserialize)]
pub struct Matrix<P> {
    /// M<sub>1,1</sub>
    pub a: P,
    /// M<sub>1,2</sub>
    pub b: P,
    /// M<sub>2,1</sub>
    pub c: P,
    /// M<sub>2,2</sub>
    pub d: P,
    /// M<sub>3,1</sub>
    pub e: P,
    /// M<sub>3,2</sub>
    pub f: P,
}

impl Matrix<f32> {
    /// ```
    /// use pdf_forge::common::Matrix;
    /// let id = Matrix::identity();
    /// assert_eq!(id.a, id.d);
    /// ```
    pub fn identity() -> Self {
        Self::scale(1.0, 1.0)
    }

    /// Create a scaling matrix
    pub fn scale(x: f32, y: f32) -> Self {
        Self {
            a: x,
            b: 0.0,
            c: 0.0,
            d: y,
            e: 0.0,
            f: 0.0,
        }
    }
}

impl<P: Serialize> Serialize for Matrix<P> {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        f.pdf_arr()
            .entry(&self.a)?
            .entry(&self.b)?
            .entry(&self.c)?
            .entry(&self.d)?
            .entry(&self.e)?
            .entry(&self.f)?
            .finish()
    }
}

bitflags::bitflags! {
    /// Font flags specifying various characteristics of the font.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct FontFlags: u32 {
        /// All glyphs have the same width
        const FIXED_PITCH = 1 << 0;
        /// Glyphs have serifs
        const SERIF = 1 << 1;
        /// Font contains glyphs outside the Adobe standard Latin character set.
        /// This flag and the Nonsymbolic flag shall not both be set or both be
        /// clear
        const SYMBOLIC = 1 << 2;
        /// Glyphs resemble cursive handwriting.
        const SCRIPT = 1 << 3;
        /// Font uses the Adobe standard Latin character set or a subset of it.
        const NONSYMBOLIC = 1 << 5;
        /// Glyphs have dominant vertical strokes that are slanted.
        const ITALIC = 1 << 6;
        /// Font contains no lowercase letters
        const ALL_CAPS = 1 << 16;
        /// Lowercase letters are small uppercase letters
        const SMALL_CAP = 1 << 17;
        /// Paint bold glyphs with extra pixels at small sizes
        const FORCE_BOLD = 1 << 18;
    }
}

impl Default for FontFlags {
    fn default() -> Self {
        Self::SYMBOLIC
    }
}

impl Serialize for FontFlags {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        self.bits().write(f)
    }
}

/// A font descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct FontDescriptor {
    /// **FontName**, including the subset tag
    pub font_name: PdfNameBuf,
    /// **Flags**: A collection of flags defining various characteristics of the font.
    pub flags: FontFlags,
    /// A rectangle, expressed in the glyph coordinate system, that shall specify the font bounding box.
    pub font_bbox: Rectangle<i32>,
    /// **ItalicAngle**: degrees counterclockwise from the vertical
    pub italic_angle: f32,
    /// **Ascent**: The maximum height above the baseline
    pub ascent: i32,
    /// **Descent**: The maximum depth below the baseline (negative)
    pub descent: i32,
    /// **CapHeight**: top of flat capital letters
    pub cap_height: i32,
    /// **StemV**: thickness of the dominant vertical stems
    pub stem_v: u32,
    /// **FontFile2**: the embedded TrueType program
    pub font_file2: Option<ObjRef>,
}

impl Serialize for FontDescriptor {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        f.pdf_dict()
            .field("Type", &PdfName("FontDescriptor"))?
            .field("FontName", &self.font_name)?
            .field("Flags", &self.flags)?
            .field("FontBBox", &self.font_bbox)?
            .field("ItalicAngle", &self.italic_angle)?
            .field("Ascent", &self.ascent)?
            .field("Descent", &self.descent)?
            .field("CapHeight", &self.cap_height)?
            .field("StemV", &self.stem_v)?
            .opt_field("FontFile2", &self.font_file2)?
            .finish()
    }
}

struct BTreeSer<'a, A, B>(&'a BTreeMap<A, B>);

impl<A, B> Serialize for BTreeSer<'_, A, B>
where
    A: Serialize,
    B: Serialize,
{
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        let mut arr = f.pdf_arr();
        for (key, value) in self.0 {
            arr.entry(key)?;
            arr.entry(value)?;
        }
        arr.finish()
    }
}

/// A (flat) number tree
#[derive(Debug, Clone)]
pub struct NumberTree<T> {
    inner: BTreeMap<usize, T>,
}

impl<T> Default for NumberTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> NumberTree<T> {
    /// Creates a new tree
    pub fn new() -> Self {
        Self {
            inner: BTreeMap::new(),
        }
    }

    /// Checks whether the tree is empty
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Inserts a node into the tree
    pub fn insert(&mut self, key: usize, value: T) -> Option<T> {
        self.inner.insert(key, value)
    }

    /// The smallest key not yet used
    pub fn next_key(&self) -> usize {
        self.inner.keys().next_back().map_or(0, |k| k + 1)
    }
}

impl<T: Serialize> Serialize for NumberTree<T> {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        f.pdf_dict().field("Nums", &BTreeSer(&self.inner))?.finish()
    }
}

/// A (flat) name tree, keys are kept sorted
#[derive(Debug, Clone)]
pub struct NameTree<T> {
    inner: BTreeMap<PdfString, T>,
}

impl<T> Default for NameTree<T> {
    fn default() -> Self {
        Self {
            inner: BTreeMap::new(),
        }
    }
}

impl<T> NameTree<T> {
    /// Checks whether the tree is empty
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Inserts a node into the tree
    pub fn insert(&mut self, key: PdfString, value: T) -> Option<T> {
        self.inner.insert(key, value)
    }
}

impl<T: Serialize> Serialize for NameTree<T> {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        f.pdf_dict()
            .field("Names", &BTreeSer(&self.inner))?
            .finish()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Deserialize)]
/// Parameters for the `Lab` color space
pub struct LabColorSpaceParams {
    /// The white point of the space [X_W, Y_W, Z_W]
    pub white_point: [f32; 3],
    /// The black point of the space [X_B, Y_B, Z_B]
    pub black_point: Option<[f32; 3]>,
    /// The range of the space [a_min, a_max, b_min, b_max]
    pub range: [f32; 4],
}

impl Serialize for LabColorSpaceParams {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        f.pdf_dict()
            .field("WhitePoint", &self.white_point)?
            .opt_field("BlackPoint", &self.black_point)?
            .field("Range", &self.range)?
            .finish()
    }
}

impl Default for LabColorSpaceParams {
    fn default() -> Self {
        Self {
            white_point: [0.9505, 1.0000, 1.0890],
            black_point: None,
            range: [-128.0, 127.0, -128.0, 127.0],
        }
    }
}

/// The color space of an image or a shading
#[derive(Debug, Copy, Clone, PartialEq)]
#[allow(clippy::upper_case_acronyms)]
pub enum ColorSpace {
    /// A 1-component grayscale space
    DeviceGray,
    /// A 3-component RGB space
    DeviceRGB,
    /// A 4-component CMYK space
    DeviceCMYK,
    /// Any color space that lives in its own object (ICCBased, Lab, Separation)
    Ref(ObjRef),
}

impl Serialize for ColorSpace {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        match self {
            Self::DeviceGray => PdfName("DeviceGray").write(f),
            Self::DeviceRGB => PdfName("DeviceRGB").write(f),
            Self::DeviceCMYK => PdfName("DeviceCMYK").write(f),
            Self::Ref(r) => r.write(f),
        }
    }
}

/// The metadata for an image XObject
#[derive(Debug, Copy, Clone)]
pub struct ImageMetadata {
    /// The width of the image
    pub width: u32,
    /// The height of the image
    pub height: u32,
    /// The `ColorSpace`
    pub color_space: ColorSpace,
    /// The `BitsPerComponent`
    pub bits_per_component: u8,
    /// Soft mask with the alpha channel
    pub smask: Option<ObjRef>,
}

impl ToDict for ImageMetadata {
    fn write(&self, dict: &mut PdfDict<'_, '_>) -> io::Result<()> {
        dict.field("Type", &PdfName("XObject"))?
            .field("Subtype", &PdfName("Image"))?
            .field("Width", &self.width)?
            .field("Height", &self.height)?
            .field("ColorSpace", &self.color_space)?
            .field("BitsPerComponent", &self.bits_per_component)?
            .opt_field("SMask", &self.smask)?;
        Ok(())
    }
}

/// Color Profile metadata
#[derive(Debug, Copy, Clone)]
pub struct ICCColorProfileMetadata {
    /// An alternate color space
    pub alternate: Option<ColorSpace>,
    /// Number of color components: 1, 3, or 4
    pub num_components: u8,
}

impl ToDict for ICCColorProfileMetadata {
    fn write(&self, dict: &mut PdfDict<'_, '_>) -> io::Result<()> {
        dict.field("N", &self.num_components)?;
        dict.opt_field("Alternate", &self.alternate)?;
        Ok(())
    }
}

/// The metadata for a stream
#[derive(Debug, Clone)]
pub enum StreamMetadata {
    /// No specific metadata (e.g. page contents)
    None,
    /// Metadata for an Image
    Image(ImageMetadata),
    /// A 1-bit stencil mask, painted in the current fill color
    ImageMask {
        /// The width of the mask
        width: u32,
        /// The height of the mask
        height: u32,
    },
    /// Metadata for a color Profile
    ColorProfile(ICCColorProfileMetadata),
    /// An embedded TrueType font program
    FontFile2 {
        /// Length of the uncompressed program
        length1: usize,
    },
    /// An embedded file of the given size
    EmbeddedFile {
        /// Uncompressed size in bytes
        size: usize,
        /// Optional MIME type
        subtype: Option<PdfNameBuf>,
    },
    /// A CMap stream
    CMap {
        /// The name of the CMap
        name: PdfNameBuf,
        /// Registry, Ordering and Supplement
        system_info: CidSystemInfo,
    },
}

impl ToDict for StreamMetadata {
    fn write(&self, dict: &mut PdfDict<'_, '_>) -> io::Result<()> {
        match self {
            Self::None => Ok(()),
            Self::Image(i) => i.write(dict),
            Self::ImageMask { width, height } => {
                dict.field("Type", &PdfName("XObject"))?
                    .field("Subtype", &PdfName("Image"))?
                    .field("Width", width)?
                    .field("Height", height)?
                    .field("ImageMask", &true)?
                    .field("BitsPerComponent", &1u8)?;
                Ok(())
            }
            Self::ColorProfile(m) => m.write(dict),
            Self::FontFile2 { length1 } => {
                dict.field("Length1", length1)?;
                Ok(())
            }
            Self::EmbeddedFile { size, subtype } => {
                dict.field("Type", &PdfName("EmbeddedFile"))?
                    .opt_field("Subtype", subtype)?
                    .field("Params", &EmbeddedFileParams { size: *size })?;
                Ok(())
            }
            Self::CMap { name, system_info } => {
                dict.field("Type", &PdfName("CMap"))?
                    .field("CMapName", name)?
                    .field("CIDSystemInfo", system_info)?;
                Ok(())
            }
        }
    }
}

struct EmbeddedFileParams {
    size: usize,
}

impl Serialize for EmbeddedFileParams {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        f.pdf_dict().field("Size", &self.size)?.finish()
    }
}

/// The `CIDSystemInfo` of a CID-keyed font or CMap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CidSystemInfo {
    /// Issuer of the character collection
    pub registry: PdfString,
    /// Name of the character collection
    pub ordering: PdfString,
    /// Supplement number
    pub supplement: u32,
}

impl CidSystemInfo {
    /// `Adobe-Identity-0`
    pub fn identity() -> Self {
        Self {
            registry: PdfString::new(b"Adobe"),
            ordering: PdfString::new(b"Identity"),
            supplement: 0,
        }
    }
}

impl Serialize for CidSystemInfo {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        f.pdf_dict()
            .field("Registry", &self.registry)?
            .field("Ordering", &self.ordering)?
            .field("Supplement", &self.supplement)?
            .finish()
    }
}

#[allow(missing_docs, non_camel_case_types, clippy::upper_case_acronyms)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
pub enum OutputIntentSubtype {
    GTS_PDFX,
    GTS_PDFA1,
    ISO_PDFE1,
}

impl Serialize for OutputIntentSubtype {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        match self {
            Self::GTS_PDFX => PdfName("GTS_PDFX").write(f),
            Self::GTS_PDFA1 => PdfName("GTS_PDFA1").write(f),
            Self::ISO_PDFE1 => PdfName("ISO_PDFE1").write(f),
        }
    }
}

#[derive(Debug, Clone)]
/// An output intent
pub struct OutputIntent<Profile> {
    /// The subtype
    pub subtype: OutputIntentSubtype,
    /// Human-readable output condition
    pub output_condition: Option<PdfString>,
    /// Identifier of the characterized printing condition
    pub output_condition_identifier: PdfString,
    /// Registry in which the identifier is defined
    pub registry_name: Option<PdfString>,
    /// Output profile stream
    pub dest_output_profile: Option<Profile>,
}

impl Serialize for OutputIntent<ObjRef> {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        f.pdf_dict()
            .field("Type", &PdfName("OutputIntent"))?
            .field("S", &self.subtype)?
            .opt_field("OutputCondition", &self.output_condition)?
            .field(
                "OutputConditionIdentifier",
                &self.output_condition_identifier,
            )?
            .opt_field("RegistryName", &self.registry_name)?
            .opt_field("DestOutputProfile", &self.dest_output_profile)?
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{make_ref, NameTree, NumberTree, PdfString, Rectangle};
    use crate::write::to_bytes;

    #[test]
    fn test_rectangle() {
        let r = Rectangle::new(10.0, 10.0, 32.0, 20.0);
        assert_eq!(to_bytes(&r).unwrap(), b"[10 10 32 20]".to_vec());
        assert_eq!(r.width(), 22.0);
    }

    #[test]
    fn test_number_tree() {
        let mut tree = NumberTree::new();
        assert_eq!(tree.next_key(), 0);
        tree.insert(1, make_ref(7));
        tree.insert(0, make_ref(5));
        assert_eq!(tree.next_key(), 2);
        let text = String::from_utf8(to_bytes(&tree).unwrap()).unwrap();
        assert_eq!(text, "<<\n  /Nums[0 5 0 R 1 7 0 R]\n>>");
    }

    #[test]
    fn test_name_tree_is_sorted() {
        let mut tree = NameTree::default();
        tree.insert(PdfString::new(b"b.txt"), make_ref(3));
        tree.insert(PdfString::new(b"a.txt"), make_ref(4));
        let text = String::from_utf8(to_bytes(&tree).unwrap()).unwrap();
        assert_eq!(text, "<<\n  /Names[(a.txt)4 0 R(b.txt)3 0 R]\n>>");
    }
}
