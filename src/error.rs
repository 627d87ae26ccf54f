//! Error types

use std::io;

use thiserror::Error;

use crate::color::ProfileError;

/// Failure of an external collaborator to load a resource
#[derive(Debug, Error)]
pub enum LoadError {
    /// Reading the file failed
    #[error("Failed IO")]
    Io(#[from] io::Error),
    /// The font engine rejected the face
    #[error("Malformed font file: {0}")]
    Font(#[from] ttf_parser::FaceParsingError),
    /// The subsetter rejected the face
    #[error("Font subsetting failed: {0}")]
    Subset(String),
    /// The image decoder failed
    #[error("Malformed image: {0}")]
    Image(#[from] image::ImageError),
    /// Sample buffers do not match the image dimensions
    #[error("Invalid image data: {0}")]
    InvalidImage(String),
    /// The ICC header is not usable
    #[error("Malformed ICC profile: {0}")]
    Profile(#[from] ProfileError),
}

/// Everything that can go wrong while building or writing a document
#[derive(Debug, Error)]
pub enum Error {
    /// A font, image, ICC profile or embedded file could not be loaded
    #[error("Failed to load {what}")]
    ResourceLoad {
        /// Description of the resource, usually a path
        what: String,
        /// The collaborator error
        #[source]
        source: LoadError,
    },
    /// An identifier was not found in its registry
    #[error("Unknown {kind} #{id}")]
    UnknownResource {
        /// Resource kind
        kind: &'static str,
        /// Raw identifier value
        id: u32,
    },
    /// A widget, annotation or structure item was placed on a second page
    #[error("{kind} #{id} is already used on page #{page}")]
    AlreadyUsed {
        /// Resource kind
        kind: &'static str,
        /// Raw identifier value
        id: u32,
        /// Raw id of the page that owns the resource
        page: u32,
    },
    /// A structure or outline item names a parent that was not registered
    #[error("Unknown parent {kind} #{id}")]
    UnknownParent {
        /// Resource kind
        kind: &'static str,
        /// Raw identifier value of the parent
        id: u32,
    },
    /// The font has no glyph for a requested character
    #[error("Font #{font} has no glyph for U+{codepoint:04X}")]
    GlyphNotFound {
        /// Raw id of the font
        font: u32,
        /// The requested codepoint
        codepoint: u32,
    },
    /// Writing the output failed
    #[error("IO Error")]
    Io(#[from] io::Error),
    /// The document options could not be parsed
    #[error("Deserialize Error")]
    Options(#[from] ron::error::Error),
}

/// Result with the crate [`enum@Error`] as default
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub(crate) fn load(what: impl Into<String>, source: impl Into<LoadError>) -> Self {
        Self::ResourceLoad {
            what: what.into(),
            source: source.into(),
        }
    }
}
