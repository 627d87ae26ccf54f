//! The object graph
//!
//! Every indirect object of the output lives in one [`ObjectStore`] slot.
//! Slot `0` is the head of the free list, so the first object number handed
//! out is `1`. Numbers are never reused or renumbered.

use std::io;

use log::debug;

use crate::{
    color::Color,
    common::{make_ref, ObjRef, Rectangle},
    high::{AnnotationKind, PageBoxes, StructureAttributes, StructureType, Transition},
    id::{AnnotationId, FontId, FormWidgetId, FormXObjectId, PageId, StructureItemId},
    write::{entries_to_bytes, to_bytes, Formatter, PdfName, Serialize, ToDict},
};

/// Identifies one subset of a loaded font
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SubsetKey {
    /// The font
    pub font: FontId,
    /// Index of the subset within the font
    pub subset: usize,
}

/// A page whose `/Annots`, `/Parent` and widget references are resolved at write time
#[derive(Debug, Clone)]
pub struct DelayedPage {
    /// The page
    pub page: PageId,
    /// Object with the resource dictionary
    pub resources: ObjRef,
    /// Object with the content stream
    pub contents: ObjRef,
    /// The transparency group shared by all pages
    pub group: ObjRef,
    /// Form widgets placed on the page
    pub widgets: Vec<FormWidgetId>,
    /// Annotations placed on the page
    pub annotations: Vec<AnnotationId>,
    /// Key into the parent tree, if the page has marked content
    pub struct_parents: Option<usize>,
    /// Presentation transition
    pub transition: Option<Transition>,
    /// MediaBox and the optional boxes
    pub boxes: PageBoxes,
}

/// A checkbox widget, resolved once its page is known
#[derive(Debug, Clone)]
pub struct DelayedCheckbox {
    /// Position on the page
    pub rect: Rectangle<f32>,
    /// Appearance of the checked state
    pub on: FormXObjectId,
    /// Appearance of the unchecked state
    pub off: FormXObjectId,
    /// Partial field name (`/T`)
    pub name: String,
    /// Initial state
    pub checked: bool,
}

/// An annotation, resolved once its page is known
#[derive(Debug, Clone)]
pub struct DelayedAnnotation {
    /// Position on the page
    pub rect: Rectangle<f32>,
    /// Variant specific data
    pub kind: AnnotationKind,
    /// Border / icon color, before conversion to the output color space
    pub color: Option<Color>,
}

/// A structure element, resolved once its children and content are known
#[derive(Debug, Clone)]
pub struct DelayedStructItem {
    /// The structure type (`/S`)
    pub kind: StructureType,
    /// The parent element, the tree root if `None`
    pub parent: Option<StructureItemId>,
    /// Optional `/T`, `/Alt`, `/ActualText`, `/Lang`
    pub attributes: StructureAttributes,
}

/// One slot in the object store
#[derive(Debug, Clone)]
pub enum ObjectRecord {
    /// Reserved slot, nothing written yet
    Placeholder,
    /// Complete object text, followed by raw stream data if present
    ///
    /// If there is stream data, `dict` already contains its `/Length`.
    Final {
        /// The dictionary (or any other object)
        dict: Vec<u8>,
        /// Stream data, written verbatim
        stream: Option<Vec<u8>>,
    },
    /// Stream that is compressed while writing
    Deflate {
        /// Bare dict entries, see [`crate::write::Formatter::entries`]
        entries: Vec<u8>,
        /// Uncompressed stream data
        stream: Vec<u8>,
    },
    /// Embedded TrueType program of a subset
    SubsetFontData(SubsetKey),
    /// `FontDescriptor` of a subset
    SubsetFontDescriptor(SubsetKey),
    /// `ToUnicode` CMap of a subset
    SubsetCMap(SubsetKey),
    /// Descendant `CIDFontType2` of a subset
    SubsetCidFont(SubsetKey),
    /// The `Type0` font dictionary of a subset
    SubsetFont(SubsetKey),
    /// A page
    Page(DelayedPage),
    /// A checkbox form field
    CheckboxWidget(DelayedCheckbox),
    /// A text, file attachment or link annotation
    Annotation(DelayedAnnotation),
    /// A structure element
    StructItem(DelayedStructItem),
}

impl ObjectRecord {
    /// Render a value into a final record
    pub fn object(value: &dyn Serialize) -> io::Result<Self> {
        Ok(Self::Final {
            dict: to_bytes(value)?,
            stream: None,
        })
    }

    /// A stream that is written as-is, e.g. because it is already encoded
    pub fn raw_stream(meta: &dyn ToDict, filter: Option<&str>, data: Vec<u8>) -> io::Result<Self> {
        let dict = to_bytes(&RawStreamDict {
            meta,
            filter,
            length: data.len(),
        })?;
        Ok(Self::Final {
            dict,
            stream: Some(data),
        })
    }

    /// A stream that is compressed when the document is written
    pub fn deflate(meta: &dyn ToDict, data: Vec<u8>) -> io::Result<Self> {
        Ok(Self::Deflate {
            entries: entries_to_bytes(meta)?,
            stream: data,
        })
    }

    /// Short name of the variant, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Placeholder => "placeholder",
            Self::Final { .. } => "final",
            Self::Deflate { .. } => "deflate",
            Self::SubsetFontData(_) => "subset font data",
            Self::SubsetFontDescriptor(_) => "subset font descriptor",
            Self::SubsetCMap(_) => "subset cmap",
            Self::SubsetCidFont(_) => "subset cid font",
            Self::SubsetFont(_) => "subset font",
            Self::Page(_) => "page",
            Self::CheckboxWidget(_) => "checkbox widget",
            Self::Annotation(_) => "annotation",
            Self::StructItem(_) => "structure item",
        }
    }
}

struct RawStreamDict<'a> {
    meta: &'a dyn ToDict,
    filter: Option<&'a str>,
    length: usize,
}

impl Serialize for RawStreamDict<'_> {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        f.pdf_dict()
            .embed(self.meta)?
            .field("Length", &self.length)?
            .opt_field("Filter", &self.filter.map(PdfName))?
            .finish()
    }
}

/// Append-only list of indirect objects
#[derive(Debug)]
pub struct ObjectStore {
    records: Vec<ObjectRecord>,
}

impl Default for ObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore {
    /// Create a store that only holds the free list head
    pub fn new() -> Self {
        Self {
            records: vec![ObjectRecord::Placeholder],
        }
    }

    /// Append a record and return its object number
    pub fn allocate(&mut self, record: ObjectRecord) -> ObjRef {
        let r = make_ref(self.records.len() as u64);
        debug!("allocate {} 0 R ({})", r.id, record.kind());
        self.records.push(record);
        r
    }

    /// Append an empty slot that is filled in later with [`ObjectStore::fill`]
    pub fn reserve(&mut self) -> ObjRef {
        self.allocate(ObjectRecord::Placeholder)
    }

    /// Fill a slot that was handed out by [`ObjectStore::reserve`]
    ///
    /// Returns `false` and leaves the store unchanged if the slot is not an
    /// unfilled reservation.
    pub fn fill(&mut self, r: ObjRef, record: ObjectRecord) -> bool {
        if r.id == 0 {
            return false;
        }
        match self.records.get_mut(r.id as usize) {
            Some(slot) if matches!(slot, ObjectRecord::Placeholder) => {
                *slot = record;
                true
            }
            _ => false,
        }
    }

    /// Get the record behind an object number
    pub fn get(&self, r: ObjRef) -> Option<&ObjectRecord> {
        if r.id == 0 {
            return None;
        }
        self.records.get(r.id as usize)
    }

    /// Number of allocated objects, not counting the free list head
    pub fn len(&self) -> usize {
        self.records.len() - 1
    }

    /// Whether nothing was allocated yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over all allocated objects in ascending order
    pub fn iter(&self) -> impl Iterator<Item = (ObjRef, &ObjectRecord)> + '_ {
        self.records
            .iter()
            .enumerate()
            .skip(1)
            .map(|(index, record)| (make_ref(index as u64), record))
    }
}
