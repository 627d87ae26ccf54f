//! Typed identifiers
//!
//! Every resource kind gets its own wrapper around a `u32` handle. They are
//! all built from the same macro, but there is no conversion between them:
//!
//! ```compile_fail
//! use pdf_forge::id::{FontId, ImageId};
//! fn takes_font(_: FontId) {}
//! takes_font(ImageId::new(1));
//! ```
//!
//! ```compile_fail
//! use pdf_forge::id::{AnnotationId, FormWidgetId};
//! let widget: FormWidgetId = AnnotationId::new(0).into();
//! ```

use std::fmt;

/// Common interface of all identifier types
pub trait ResourceId: Copy + Eq + std::hash::Hash + fmt::Debug {
    /// Name of the resource kind, used in error messages
    const KIND: &'static str;

    /// Wrap a raw handle
    fn from_raw(raw: u32) -> Self;

    /// The raw handle
    fn raw(self) -> u32;
}

macro_rules! resource_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u32);

        impl $name {
            /// Wrap a raw handle
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            /// The raw handle
            pub const fn raw(self) -> u32 {
                self.0
            }
        }

        impl From<u32> for $name {
            fn from(raw: u32) -> Self {
                Self(raw)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", $kind, self.0)
            }
        }

        impl ResourceId for $name {
            const KIND: &'static str = $kind;

            fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            fn raw(self) -> u32 {
                self.0
            }
        }
    };
}

resource_id!(
    /// A raster image XObject
    ImageId,
    "Image"
);
resource_id!(
    /// A loaded font face
    FontId,
    "Font"
);
resource_id!(
    /// One of the standard 14 fonts
    BuiltinFontId,
    "BuiltinFont"
);
resource_id!(
    /// An `ICCBased` color space
    IccColorSpaceId,
    "IccColorSpace"
);
resource_id!(
    /// A form XObject
    FormXObjectId,
    "FormXObject"
);
resource_id!(
    /// An interactive form widget
    FormWidgetId,
    "FormWidget"
);
resource_id!(
    /// A (non-widget) annotation
    AnnotationId,
    "Annotation"
);
resource_id!(
    /// A node of the structure tree
    StructureItemId,
    "StructureItem"
);
resource_id!(
    /// A `Separation` color space
    SeparationId,
    "Separation"
);
resource_id!(
    /// An `ExtGState` dictionary
    GraphicsStateId,
    "GraphicsState"
);
resource_id!(
    /// A PDF function
    FunctionId,
    "Function"
);
resource_id!(
    /// A shading dictionary
    ShadingId,
    "Shading"
);
resource_id!(
    /// A shading or tiling pattern
    PatternId,
    "Pattern"
);
resource_id!(
    /// A `Lab` color space
    LabColorSpaceId,
    "LabColorSpace"
);
resource_id!(
    /// A page, numbered in the order they were added
    PageId,
    "Page"
);
resource_id!(
    /// An item of the document outline
    OutlineId,
    "Outline"
);
resource_id!(
    /// An embedded file
    EmbeddedFileId,
    "EmbeddedFile"
);

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{FontId, ImageId, ResourceId};

    #[test]
    fn test_identity_by_raw_value() {
        assert_eq!(FontId::new(4), FontId::from(4));
        assert!(FontId::new(1) < FontId::new(2));
        assert_eq!(ImageId::new(9).raw(), 9);

        let set: HashSet<_> = [FontId::new(1), FontId::new(1), FontId::new(2)]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(<FontId as ResourceId>::KIND, "Font");
        assert_eq!(ImageId::new(3).to_string(), "Image#3");
    }
}
