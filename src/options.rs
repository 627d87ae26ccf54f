//! Document options
//!
//! Options can be written as a RON file:
//!
//! ```
//! use pdf_forge::options::DocumentOptions;
//! let options = DocumentOptions::from_ron(r#"(
//!     title: Some("Annual Report"),
//!     lang: Some("en-US"),
//!     tagged: true,
//! )"#).unwrap();
//! assert!(options.tagged);
//! assert!(options.compress);
//! ```

use std::{fs, path::Path};

use serde::Deserialize;

use crate::{
    color::DeviceColorSpace,
    error::Result,
    high::PageBoxes,
    subset::DEFAULT_CAPACITY,
};

/// Settings that apply to the whole document
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DocumentOptions {
    /// `/Title`
    pub title: Option<String>,
    /// `/Author`
    pub author: Option<String>,
    /// `/Subject`
    pub subject: Option<String>,
    /// `/Keywords`
    pub keywords: Option<String>,
    /// `/Creator`
    pub creator: Option<String>,
    /// `/Producer`
    pub producer: Option<String>,
    /// Natural language of the document (`/Lang`)
    pub lang: Option<String>,
    /// Page boxes of pages that do not bring their own
    pub page_boxes: PageBoxes,
    /// Device space of the colors the document emits on its own
    pub output_color_space: DeviceColorSpace,
    /// Compress streams with `/FlateDecode`
    pub compress: bool,
    /// Codes per font subset, at most 255
    pub subset_capacity: usize,
    /// Write a structure tree even if no structure items were added
    pub tagged: bool,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            title: None,
            author: None,
            subject: None,
            keywords: None,
            creator: None,
            producer: Some(format!("pdf-forge {}", env!("CARGO_PKG_VERSION"))),
            lang: None,
            page_boxes: PageBoxes::default(),
            output_color_space: DeviceColorSpace::Rgb,
            compress: true,
            subset_capacity: DEFAULT_CAPACITY,
            tagged: false,
        }
    }
}

impl DocumentOptions {
    /// Parse options from RON text
    pub fn from_ron(text: &str) -> Result<Self> {
        Ok(ron::from_str(text)?)
    }

    /// Read options from a RON file
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_ron(&text)
    }
}
