use crate::{
    common::Rectangle,
    id::{EmbeddedFileId, FormXObjectId},
};

/// The closed set of annotation variants
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationKind {
    /// A sticky note
    Text {
        /// Text of the note
        contents: String,
        /// Whether the popup is shown initially
        open: bool,
    },
    /// An icon that opens an embedded file
    FileAttachment {
        /// The file
        file: EmbeddedFileId,
        /// Tooltip text
        description: Option<String>,
    },
    /// A clickable area that opens a URI
    Link {
        /// The target
        uri: String,
    },
}

impl AnnotationKind {
    /// The `/Subtype` of the annotation
    pub fn subtype(&self) -> &'static str {
        match self {
            Self::Text { .. } => "Text",
            Self::FileAttachment { .. } => "FileAttachment",
            Self::Link { .. } => "Link",
        }
    }
}

/// A checkbox form field with two appearances
#[derive(Debug, Clone, PartialEq)]
pub struct Checkbox {
    /// Position on the page
    pub rect: Rectangle<f32>,
    /// Appearance when checked
    pub on: FormXObjectId,
    /// Appearance when unchecked
    pub off: FormXObjectId,
    /// Partial field name
    pub name: String,
    /// Initial state
    pub checked: bool,
}
