//! Low-Level API
//!
//! This module contains structs and enums for representing/creating a PDF
//! that is already split up into objects with opaque reference IDs.

use std::io::{self, Write};

use flate2::{write::ZlibEncoder, Compression};

use crate::{
    common::{
        CidSystemInfo, ColorSpace, LabColorSpaceParams, Matrix, ObjRef, PdfString, Rectangle,
    },
    write::{Formatter, Null, PdfDict, PdfName, PdfNameBuf, Serialize, ToDict},
};

/// Destination of a GoTo action
#[derive(Debug, Clone)]
pub enum Destination {
    /// Page @0, keep the current position and zoom
    PageXYZ(ObjRef),
}

impl Serialize for Destination {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        match self {
            Self::PageXYZ(r) => f
                .pdf_arr()
                .entry(r)?
                .entry(&PdfName("XYZ"))?
                .entry(&Null)?
                .entry(&Null)?
                .entry(&Null)?
                .finish(),
        }
    }
}

/// The root outline item
#[derive(Debug, Clone)]
pub struct Outline {
    /// The first item
    pub first: ObjRef,
    /// The last item
    pub last: ObjRef,
    /// The total amount of items
    pub count: usize,
}

impl Serialize for Outline {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        f.pdf_dict()
            .field("Type", &PdfName("Outlines"))?
            .field("First", &self.first)?
            .field("Last", &self.last)?
            .field("Count", &self.count)?
            .finish()
    }
}

/// A child outline item
#[derive(Debug, Clone)]
pub struct OutlineItem {
    /// The title of the outline item
    pub title: PdfString,
    /// The parent of this item
    pub parent: ObjRef,
    /// The previous sibling
    pub prev: Option<ObjRef>,
    /// The next sibling
    pub next: Option<ObjRef>,
    /// The first child
    pub first: Option<ObjRef>,
    /// The last child
    pub last: Option<ObjRef>,
    /// The total amount of open descendants
    pub count: usize,
    /// The destination to be used
    pub dest: Destination,
}

impl Serialize for OutlineItem {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        let mut dict = f.pdf_dict();
        dict.field("Title", &self.title)?
            .field("Parent", &self.parent)?
            .opt_field("Prev", &self.prev)?
            .opt_field("Next", &self.next)?
            .opt_field("First", &self.first)?
            .opt_field("Last", &self.last)?;
        if self.count > 0 {
            dict.field("Count", &self.count)?;
        }
        dict.field("Dest", &self.dest)?.finish()
    }
}

/// A page object
pub struct Page<'a> {
    /// Reference to the parent
    pub parent: ObjRef,
    /// The content stream of the page
    pub contents: ObjRef,
    /// The resources of this page
    pub resources: ObjRef,
    /// Page transparency group
    pub group: ObjRef,
    /// MediaBox and friends
    pub boxes: &'a dyn ToDict,
    /// Widgets and other annotations
    pub annots: Vec<ObjRef>,
    /// Key into the structure parent tree
    pub struct_parents: Option<usize>,
    /// Presentation transition
    pub transition: Option<&'a dyn Serialize>,
}

impl Serialize for Page<'_> {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        let mut dict = f.pdf_dict();
        dict.field("Type", &PdfName("Page"))?
            .field("Parent", &self.parent)?
            .embed(self.boxes)?
            .field("Resources", &self.resources)?
            .field("Contents", &self.contents)?
            .field("Group", &self.group)?
            .opt_arr_field("Annots", &self.annots)?
            .opt_field("StructParents", &self.struct_parents)?;
        if let Some(trans) = self.transition {
            dict.field("Trans", trans)?;
        }
        if self.struct_parents.is_some() && !self.annots.is_empty() {
            dict.field("Tabs", &PdfName("S"))?;
        }
        dict.finish()
    }
}

/// The transparency group every page paints into
pub struct TransparencyGroup {
    /// Blending color space, the output color space of the document
    pub color_space: ColorSpace,
}

impl Serialize for TransparencyGroup {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        f.pdf_dict()
            .field("Type", &PdfName("Group"))?
            .field("S", &PdfName("Transparency"))?
            .field("CS", &self.color_space)?
            .finish()
    }
}

/// A standard 14 font, no program is embedded
pub struct Type1Font<'a> {
    /// One of the standard font names
    pub base_font: &'a str,
}

impl Serialize for Type1Font<'_> {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        f.pdf_dict()
            .field("Type", &PdfName("Font"))?
            .field("Subtype", &PdfName("Type1"))?
            .field("BaseFont", &PdfName(self.base_font))?
            .finish()
    }
}

/// The list of pages
pub struct Pages {
    /// References to the individual pages
    pub kids: Vec<ObjRef>,
}

impl Serialize for Pages {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        f.pdf_dict()
            .field("Type", &PdfName("Pages"))?
            .field("Count", &self.kids.len())?
            .field("Kids", &self.kids)?
            .finish()
    }
}

/// The `/AcroForm` dictionary
pub struct AcroForm {
    /// All terminal fields
    pub fields: Vec<ObjRef>,
}

impl Serialize for AcroForm {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        f.pdf_dict().field("Fields", &self.fields)?.finish()
    }
}

/// The `/Names` dictionary of the catalog
pub struct Names {
    /// Name tree of embedded files
    pub embedded_files: Option<ObjRef>,
}

impl Serialize for Names {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        f.pdf_dict()
            .opt_field("EmbeddedFiles", &self.embedded_files)?
            .finish()
    }
}

struct MarkInfo;

impl Serialize for MarkInfo {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        f.pdf_dict().field("Marked", &true)?.finish()
    }
}

/// The catalog/root of the document
pub struct Catalog {
    /// Reference to the list of pages
    pub pages: ObjRef,
    /// Optional reference to the outline
    pub outline: Option<ObjRef>,
    /// Optional reference to the structure tree
    pub struct_tree_root: Option<ObjRef>,
    /// Name trees
    pub names: Option<Names>,
    /// Interactive form
    pub acro_form: Option<AcroForm>,
    /// Optional List of output intents
    pub output_intents: Vec<ObjRef>,
    /// Natural language of the document
    pub lang: Option<PdfString>,
}

impl Serialize for Catalog {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        let mut dict = f.pdf_dict();
        dict.field("Type", &PdfName("Catalog"))?
            .field("Pages", &self.pages)?
            .opt_field("Outlines", &self.outline)?;
        if self.outline.is_some() {
            dict.field("PageMode", &PdfName("UseOutlines"))?;
        }
        if let Some(root) = &self.struct_tree_root {
            dict.field("StructTreeRoot", root)?
                .field("MarkInfo", &MarkInfo)?;
        }
        dict.opt_field("Names", &self.names)?
            .opt_field("AcroForm", &self.acro_form)?
            .opt_arr_field("OutputIntents", &self.output_intents)?
            .opt_field("Lang", &self.lang)?
            .finish()
    }
}

/// The structure that holds the document IDs.
#[allow(clippy::upper_case_acronyms)]
pub struct ID {
    /// The ID for the original (gen 0) document
    pub original: md5::Digest,
    /// The ID for the current generation of the document
    pub current: md5::Digest,
}

impl Serialize for ID {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        f.pdf_arr()
            .entry(&self.original)?
            .entry(&self.current)?
            .finish()
    }
}

/// The trailer of the document
pub struct Trailer {
    /// The size of the document / number of objects
    pub size: usize,
    /// Optional reference to the info struct
    pub info: Option<ObjRef>,
    /// Refernce to the root/catalog
    pub root: ObjRef,
    /// The ID String
    pub id: ID,
}

impl Serialize for Trailer {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        f.pdf_dict()
            .field("Size", &self.size)?
            .opt_field("Info", &self.info)?
            .field("Root", &self.root)?
            .field("ID", &self.id)?
            .finish()
    }
}

/// Color space families that live in their own object
#[derive(Debug, Clone)]
pub enum ColorSpaceFamily {
    /// `[/ICCBased stream]`
    IccBased(ObjRef),
    /// `[/Lab << … >>]`
    Lab(LabColorSpaceParams),
    /// `[/Separation /name alternate tint]`
    Separation {
        /// Name of the colorant
        name: PdfNameBuf,
        /// Space used when the colorant is not available
        alternate: ColorSpace,
        /// Function mapping tint to the alternate space
        tint_transform: ObjRef,
    },
}

impl Serialize for ColorSpaceFamily {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        match self {
            Self::IccBased(r) => f.pdf_arr().entry(&PdfName("ICCBased"))?.entry(r)?.finish(),
            Self::Lab(params) => f.pdf_arr().entry(&PdfName("Lab"))?.entry(params)?.finish(),
            Self::Separation {
                name,
                alternate,
                tint_transform,
            } => f
                .pdf_arr()
                .entry(&PdfName("Separation"))?
                .entry(name)?
                .entry(alternate)?
                .entry(tint_transform)?
                .finish(),
        }
    }
}

/// A function dictionary
#[derive(Debug, Clone)]
pub enum Function {
    /// Type 2, `C0 + x^N * (C1 - C0)`
    Exponential {
        /// Input range
        domain: [f32; 2],
        /// Output at `0.0`
        c0: Vec<f32>,
        /// Output at `1.0`
        c1: Vec<f32>,
        /// Interpolation exponent
        n: f32,
    },
    /// Type 3, several 1-in functions glued together
    Stitching {
        /// Input range
        domain: [f32; 2],
        /// The sub-functions
        functions: Vec<ObjRef>,
        /// `k - 1` boundaries between `k` functions
        bounds: Vec<f32>,
        /// `2 * k` numbers mapping each sub-domain
        encode: Vec<f32>,
    },
}

impl Serialize for Function {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        match self {
            Self::Exponential { domain, c0, c1, n } => f
                .pdf_dict()
                .field("FunctionType", &2u8)?
                .field("Domain", domain)?
                .field("C0", c0)?
                .field("C1", c1)?
                .field("N", n)?
                .finish(),
            Self::Stitching {
                domain,
                functions,
                bounds,
                encode,
            } => f
                .pdf_dict()
                .field("FunctionType", &3u8)?
                .field("Domain", domain)?
                .field("Functions", functions)?
                .field("Bounds", bounds)?
                .field("Encode", encode)?
                .finish(),
        }
    }
}

/// A shading dictionary
#[derive(Debug, Clone)]
pub struct Shading {
    /// 2 = axial, 3 = radial
    pub shading_type: u8,
    /// Color space of the function output
    pub color_space: ColorSpace,
    /// `[x0 y0 x1 y1]` or `[x0 y0 r0 x1 y1 r1]`
    pub coords: Vec<f32>,
    /// The color function
    pub function: ObjRef,
    /// Extend beyond the start and end point
    pub extend: [bool; 2],
}

impl Serialize for Shading {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        f.pdf_dict()
            .field("ShadingType", &self.shading_type)?
            .field("ColorSpace", &self.color_space)?
            .field("Coords", &self.coords)?
            .field("Function", &self.function)?
            .field("Extend", &self.extend)?
            .finish()
    }
}

/// A shading pattern (type 2)
#[derive(Debug, Clone)]
pub struct ShadingPattern {
    /// The shading
    pub shading: ObjRef,
    /// Pattern space to default space
    pub matrix: Matrix<f32>,
}

impl Serialize for ShadingPattern {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        f.pdf_dict()
            .field("Type", &PdfName("Pattern"))?
            .field("PatternType", &2u8)?
            .field("Shading", &self.shading)?
            .field("Matrix", &self.matrix)?
            .finish()
    }
}

/// Stream entries of a tiling pattern (type 1)
#[derive(Debug, Clone)]
pub struct TilingPattern {
    /// 1 = colored, 2 = uncolored
    pub paint_type: u8,
    /// 1 = constant spacing, 2 = no distortion, 3 = faster
    pub tiling_type: u8,
    /// Bounds of the pattern cell
    pub bbox: Rectangle<f32>,
    /// Horizontal spacing
    pub x_step: f32,
    /// Vertical spacing
    pub y_step: f32,
    /// Resources of the cell content
    pub resources: ObjRef,
    /// Pattern space to default space
    pub matrix: Matrix<f32>,
}

impl ToDict for TilingPattern {
    fn write(&self, dict: &mut PdfDict<'_, '_>) -> io::Result<()> {
        dict.field("Type", &PdfName("Pattern"))?
            .field("PatternType", &1u8)?
            .field("PaintType", &self.paint_type)?
            .field("TilingType", &self.tiling_type)?
            .field("BBox", &self.bbox)?
            .field("XStep", &self.x_step)?
            .field("YStep", &self.y_step)?
            .field("Resources", &self.resources)?
            .field("Matrix", &self.matrix)?;
        Ok(())
    }
}

/// Stream entries of a form XObject
#[derive(Debug, Clone)]
pub struct FormXObject {
    /// Bounds in form space
    pub bbox: Rectangle<f32>,
    /// Form space to user space
    pub matrix: Option<Matrix<f32>>,
    /// Resources of the content
    pub resources: Option<ObjRef>,
}

impl ToDict for FormXObject {
    fn write(&self, dict: &mut PdfDict<'_, '_>) -> io::Result<()> {
        dict.field("Type", &PdfName("XObject"))?
            .field("Subtype", &PdfName("Form"))?
            .field("BBox", &self.bbox)?
            .opt_field("Matrix", &self.matrix)?
            .opt_field("Resources", &self.resources)?;
        Ok(())
    }
}

/// A file specification with an embedded file
#[derive(Debug, Clone)]
pub struct Filespec {
    /// The file name
    pub file_name: PdfString,
    /// The `EmbeddedFile` stream
    pub embedded_file: ObjRef,
    /// Optional description
    pub description: Option<PdfString>,
}

struct EmbeddedFileRef(ObjRef);

impl Serialize for EmbeddedFileRef {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        f.pdf_dict().field("F", &self.0)?.field("UF", &self.0)?.finish()
    }
}

impl Serialize for Filespec {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        f.pdf_dict()
            .field("Type", &PdfName("Filespec"))?
            .field("F", &self.file_name)?
            .field("UF", &self.file_name)?
            .field("EF", &EmbeddedFileRef(self.embedded_file))?
            .opt_field("Desc", &self.description)?
            .finish()
    }
}

bitflags::bitflags! {
    /// Annotation flags (`/F`)
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct AnnotationFlags: u32 {
        /// Hide unknown annotation types
        const INVISIBLE = 1 << 0;
        /// Do not display or print
        const HIDDEN = 1 << 1;
        /// Print the annotation
        const PRINT = 1 << 2;
        /// Do not scale with the page zoom
        const NO_ZOOM = 1 << 3;
        /// Do not rotate with the page
        const NO_ROTATE = 1 << 4;
    }
}

impl Serialize for AnnotationFlags {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        self.bits().write(f)
    }
}

/// Subtype specific entries of an annotation
pub enum AnnotationBody<'a> {
    /// A sticky note
    Text {
        /// The note
        contents: &'a PdfString,
        /// Icon name
        icon: &'a str,
        /// Show the popup initially
        open: bool,
    },
    /// A file attachment icon
    FileAttachment {
        /// The `Filespec`
        file_spec: ObjRef,
        /// Tooltip
        contents: Option<&'a PdfString>,
        /// Icon name
        icon: &'a str,
    },
    /// A URI link
    Link {
        /// The target
        uri: &'a PdfString,
    },
    /// A checkbox widget
    Checkbox {
        /// Partial field name
        name: &'a PdfString,
        /// Appearance of the checked state
        on: ObjRef,
        /// Appearance of the unchecked state
        off: ObjRef,
        /// Initial state
        checked: bool,
    },
}

struct UriAction<'a>(&'a PdfString);

impl Serialize for UriAction<'_> {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        f.pdf_dict()
            .field("Type", &PdfName("Action"))?
            .field("S", &PdfName("URI"))?
            .field("URI", self.0)?
            .finish()
    }
}

struct CheckboxAppearance {
    on: ObjRef,
    off: ObjRef,
}

impl Serialize for CheckboxAppearance {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        f.pdf_dict()
            .field("Yes", &self.on)?
            .field("Off", &self.off)?
            .finish()
    }
}

struct NormalAppearance(CheckboxAppearance);

impl Serialize for NormalAppearance {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        f.pdf_dict().field("N", &self.0)?.finish()
    }
}

/// An annotation dictionary
pub struct Annotation<'a> {
    /// Position on the page
    pub rect: Rectangle<f32>,
    /// The page the annotation is on
    pub page: Option<ObjRef>,
    /// Color of the icon / border
    pub color: Option<Vec<f32>>,
    /// Annotation flags
    pub flags: AnnotationFlags,
    /// Key into the parent tree
    pub struct_parent: Option<usize>,
    /// The subtype specific part
    pub body: AnnotationBody<'a>,
}

impl Serialize for Annotation<'_> {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        let mut dict = f.pdf_dict();
        dict.field("Type", &PdfName("Annot"))?;
        match &self.body {
            AnnotationBody::Text {
                contents,
                icon,
                open,
            } => {
                dict.field("Subtype", &PdfName("Text"))?
                    .field("Contents", contents)?
                    .field("Name", &PdfName(icon))?
                    .field("Open", open)?;
            }
            AnnotationBody::FileAttachment {
                file_spec,
                contents,
                icon,
            } => {
                dict.field("Subtype", &PdfName("FileAttachment"))?
                    .field("FS", file_spec)?
                    .opt_field("Contents", contents)?
                    .field("Name", &PdfName(icon))?;
            }
            AnnotationBody::Link { uri } => {
                dict.field("Subtype", &PdfName("Link"))?
                    .field("A", &UriAction(uri))?
                    .field("Border", &[0u8, 0, 0])?;
            }
            AnnotationBody::Checkbox {
                name,
                on,
                off,
                checked,
            } => {
                let state = PdfName(if *checked { "Yes" } else { "Off" });
                dict.field("Subtype", &PdfName("Widget"))?
                    .field("FT", &PdfName("Btn"))?
                    .field("T", name)?
                    .field("V", &state)?
                    .field("AS", &state)?
                    .field(
                        "AP",
                        &NormalAppearance(CheckboxAppearance { on: *on, off: *off }),
                    )?;
            }
        }
        dict.field("Rect", &self.rect)?
            .opt_field("P", &self.page)?
            .opt_field("C", &self.color)?
            .field("F", &self.flags)?
            .opt_field("StructParent", &self.struct_parent)?
            .finish()
    }
}

/// A structure element
pub struct StructElem<'a> {
    /// Structure type
    pub kind: &'a str,
    /// Parent element or the tree root
    pub parent: ObjRef,
    /// Page of the marked content
    pub page: Option<ObjRef>,
    /// Children elements first, then marked-content ids
    pub kids: Vec<StructKid>,
    /// Title
    pub title: Option<&'a PdfString>,
    /// Alternate description
    pub alt: Option<&'a PdfString>,
    /// Replacement text
    pub actual_text: Option<&'a PdfString>,
    /// Language
    pub lang: Option<&'a PdfString>,
}

/// Child of a structure element
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StructKid {
    /// Another structure element
    Elem(ObjRef),
    /// Marked content on the element's page
    Mcid(usize),
}

impl Serialize for StructKid {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        match self {
            Self::Elem(r) => r.write(f),
            Self::Mcid(id) => id.write(f),
        }
    }
}

impl Serialize for StructElem<'_> {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        f.pdf_dict()
            .field("Type", &PdfName("StructElem"))?
            .field("S", &PdfName(self.kind))?
            .field("P", &self.parent)?
            .opt_field("Pg", &self.page)?
            .opt_arr_field("K", &self.kids)?
            .opt_field("T", &self.title)?
            .opt_field("Alt", &self.alt)?
            .opt_field("ActualText", &self.actual_text)?
            .opt_field("Lang", &self.lang)?
            .finish()
    }
}

/// The root of the structure tree
pub struct StructTreeRoot {
    /// Top-level elements
    pub kids: Vec<ObjRef>,
    /// The parent tree
    pub parent_tree: ObjRef,
    /// Next free key in the parent tree
    pub parent_tree_next_key: usize,
}

impl Serialize for StructTreeRoot {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        f.pdf_dict()
            .field("Type", &PdfName("StructTreeRoot"))?
            .field("K", &self.kids)?
            .field("ParentTree", &self.parent_tree)?
            .field("ParentTreeNextKey", &self.parent_tree_next_key)?
            .finish()
    }
}

/// A `Type0` font dictionary
pub struct Type0Font<'a> {
    /// Tagged PostScript name
    pub base_font: &'a PdfNameBuf,
    /// The encoding CMap stream
    pub encoding: ObjRef,
    /// The `CIDFontType2` dictionary
    pub descendant: ObjRef,
    /// The `ToUnicode` CMap
    pub to_unicode: ObjRef,
}

impl Serialize for Type0Font<'_> {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        f.pdf_dict()
            .field("Type", &PdfName("Font"))?
            .field("Subtype", &PdfName("Type0"))?
            .field("BaseFont", self.base_font)?
            .field("Encoding", &self.encoding)?
            .field("DescendantFonts", &[self.descendant])?
            .field("ToUnicode", &self.to_unicode)?
            .finish()
    }
}

struct WidthRun<'a>(&'a [u32]);

impl Serialize for WidthRun<'_> {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        f.pdf_arr().entry(&1u8)?.entry(&self.0)?.finish()
    }
}

/// A `CIDFontType2` dictionary
pub struct CidFont<'a> {
    /// Tagged PostScript name
    pub base_font: &'a PdfNameBuf,
    /// Character collection
    pub system_info: CidSystemInfo,
    /// The font descriptor
    pub font_descriptor: ObjRef,
    /// Widths for CID 1 upwards, in thousandths of an em
    pub widths: &'a [u32],
}

impl Serialize for CidFont<'_> {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        f.pdf_dict()
            .field("Type", &PdfName("Font"))?
            .field("Subtype", &PdfName("CIDFontType2"))?
            .field("BaseFont", self.base_font)?
            .field("CIDSystemInfo", &self.system_info)?
            .field("FontDescriptor", &self.font_descriptor)?
            .field("DW", &0u32)?
            .field("W", &WidthRun(self.widths))?
            .field("CIDToGIDMap", &PdfName("Identity"))?
            .finish()
    }
}

/// A stream that is compressed on the way out
pub struct FlateStream<'a> {
    /// Dict entries rendered ahead of time, without `/Length`
    pub entries: &'a [u8],
    /// The uncompressed data
    pub data: &'a [u8],
}

impl Serialize for FlateStream<'_> {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        let mut e = ZlibEncoder::new(Vec::new(), Compression::best());
        e.write_all(self.data)?;
        let buf = e.finish()?;
        f.pdf_dict()
            .raw(self.entries)?
            .field("Length", &buf.len())?
            .field("Filter", &PdfName("FlateDecode"))?
            .field("DL", &self.data.len())?
            .finish()?;
        f.pdf_stream(&buf)?;
        Ok(())
    }
}

/// An object that was rendered ahead of time
pub struct RawObject<'a> {
    /// The object text, including `/Length` if there is a stream
    pub dict: &'a [u8],
    /// Stream data, written verbatim
    pub stream: Option<&'a [u8]>,
}

impl Serialize for RawObject<'_> {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        f.write_raw(self.dict)?;
        if let Some(data) = self.stream {
            f.pdf_stream(data)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Annotation, AnnotationBody, AnnotationFlags, ColorSpaceFamily, Destination, FlateStream,
        RawObject,
    };
    use crate::{
        common::{make_ref, ColorSpace, PdfString, Rectangle},
        write::{to_bytes, PdfNameBuf},
    };

    #[test]
    fn test_link_annotation() {
        let uri = PdfString::new(b"https://example.org");
        let annot = Annotation {
            rect: Rectangle::new(10.0, 10.0, 32.0, 20.0),
            page: Some(make_ref(4)),
            color: None,
            flags: AnnotationFlags::PRINT,
            struct_parent: None,
            body: AnnotationBody::Link { uri: &uri },
        };
        let text = String::from_utf8(to_bytes(&annot).unwrap()).unwrap();
        assert!(text.contains("/Subtype/Link"));
        assert!(text.contains("/URI(https://example.org)"));
        assert!(text.contains("/Rect[10 10 32 20]"));
        assert!(text.contains("/P 4 0 R"));
        assert!(text.contains("/F 4"));
    }

    #[test]
    fn test_color_space_arrays() {
        let icc = to_bytes(&ColorSpaceFamily::IccBased(make_ref(7))).unwrap();
        assert_eq!(icc, b"[/ICCBased 7 0 R]".to_vec());
        let sep = to_bytes(&ColorSpaceFamily::Separation {
            name: PdfNameBuf("Gold".into()),
            alternate: ColorSpace::DeviceCMYK,
            tint_transform: make_ref(3),
        })
        .unwrap();
        assert_eq!(sep, b"[/Separation/Gold/DeviceCMYK 3 0 R]".to_vec());
    }

    #[test]
    fn test_flate_stream() {
        use flate2::read::ZlibDecoder;
        use std::io::Read;

        let data = b"BT /F0 12 Tf (Hello) Tj ET".repeat(8);
        let out = to_bytes(&FlateStream {
            entries: b"  /Type/XObject\n",
            data: &data,
        })
        .unwrap();
        let start = out.windows(7).position(|w| w == b"stream\n").unwrap() + 7;
        let end = out.windows(10).position(|w| w == b"\nendstream").unwrap();
        let text = String::from_utf8_lossy(&out[..start]);
        assert!(text.starts_with("<<\n  /Type/XObject\n"));
        assert!(text.contains(&format!("/Length {}", end - start)));
        assert!(text.contains("/Filter/FlateDecode"));
        let mut plain = Vec::new();
        ZlibDecoder::new(&out[start..end]).read_to_end(&mut plain).unwrap();
        assert_eq!(plain, data);
    }

    #[test]
    fn test_raw_object() {
        let out = to_bytes(&RawObject {
            dict: b"<< /Length 3 >>",
            stream: Some(&b"abc"[..]),
        })
        .unwrap();
        assert_eq!(out, b"<< /Length 3 >>\nstream\nabc\nendstream".to_vec());
    }

    #[test]
    fn test_destination() {
        let d = to_bytes(&Destination::PageXYZ(make_ref(5))).unwrap();
        assert_eq!(d, b"[5 0 R/XYZ null null null]".to_vec());
    }
}
