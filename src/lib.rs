#![warn(missing_docs)]
//! # pdf-forge
//!
//! Library to build a PDF file from typed resources
//!
//! ```
//! use pdf_forge::{
//!     common::Rectangle,
//!     high::{AnnotationKind, PageContents},
//!     Document,
//! };
//!
//! // Create a new document
//! let mut doc = Document::new();
//!
//! // Resources are registered first and return typed ids
//! let link = doc
//!     .create_annotation(
//!         Rectangle::new(10.0, 10.0, 32.0, 20.0),
//!         AnnotationKind::Link {
//!             uri: "https://example.org".into(),
//!         },
//!     )
//!     .unwrap();
//!
//! // Pages refer to them by id
//! doc.add_page(PageContents {
//!     contents: b"0 0 1 rg 10 10 22 10 re f".to_vec(),
//!     annotations: vec![link],
//!     ..Default::default()
//! })
//! .unwrap();
//!
//! // Write the PDF into a buffer
//! let mut out = Vec::new();
//! doc.finalize(&mut out).unwrap();
//! assert!(out.starts_with(b"%PDF-1.7"));
//! ```

pub mod cmap;
pub mod color;
pub mod common;
pub mod encoding;
pub mod error;
mod finalize;
pub mod font;
pub mod high;
pub mod id;
pub mod low;
mod lowering;
pub mod options;
pub mod raster;
pub mod registry;
pub mod store;
pub mod subset;
pub mod util;
pub mod write;

pub use error::{Error, Result};
pub use high::Document;
