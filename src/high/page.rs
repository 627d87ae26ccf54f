use std::io;

use serde::Deserialize;

use crate::{
    common::Rectangle,
    id::{AnnotationId, FormWidgetId, StructureItemId},
    write::{Formatter, PdfDict, PdfName, Serialize, ToDict},
};

/// The boundary boxes of a page
#[derive(Debug, Copy, Clone, PartialEq, Deserialize)]
pub struct PageBoxes {
    /// (required) the physical page
    pub media_box: Rectangle<f32>,
    /// visible region
    #[serde(default)]
    pub crop_box: Option<Rectangle<f32>>,
    /// clipping region for production output
    #[serde(default)]
    pub bleed_box: Option<Rectangle<f32>>,
    /// intended dimensions after trimming
    #[serde(default)]
    pub trim_box: Option<Rectangle<f32>>,
    /// extent of the meaningful content
    #[serde(default)]
    pub art_box: Option<Rectangle<f32>>,
}

impl Default for PageBoxes {
    fn default() -> Self {
        Self::new(Rectangle::a4_media_box())
    }
}

impl PageBoxes {
    /// Only a media box
    pub fn new(media_box: Rectangle<f32>) -> Self {
        Self {
            media_box,
            crop_box: None,
            bleed_box: None,
            trim_box: None,
            art_box: None,
        }
    }
}

impl ToDict for PageBoxes {
    fn write(&self, dict: &mut PdfDict<'_, '_>) -> io::Result<()> {
        dict.field("MediaBox", &self.media_box)?
            .opt_field("CropBox", &self.crop_box)?
            .opt_field("BleedBox", &self.bleed_box)?
            .opt_field("TrimBox", &self.trim_box)?
            .opt_field("ArtBox", &self.art_box)?;
        Ok(())
    }
}

/// The visual effect when moving to a page
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[allow(missing_docs)]
pub enum TransitionStyle {
    Split,
    Blinds,
    Box,
    Wipe,
    Dissolve,
    Glitter,
    /// Plain replacement, `/R`
    Replace,
    Fly,
    Push,
    Cover,
    Uncover,
    Fade,
}

const TRANSITION_NAMES: [&str; 12] = [
    "Split", "Blinds", "Box", "Wipe", "Dissolve", "Glitter", "R", "Fly", "Push", "Cover",
    "Uncover", "Fade",
];

impl TransitionStyle {
    /// The value of `/S`
    pub fn name(self) -> &'static str {
        TRANSITION_NAMES[self as usize]
    }
}

/// Dimension of `Split` and `Blinds`
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[allow(missing_docs)]
pub enum TransitionDimension {
    Horizontal,
    Vertical,
}

/// Motion of `Split`, `Box` and `Fly`
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[allow(missing_docs)]
pub enum TransitionMotion {
    Inward,
    Outward,
}

/// A page transition dictionary
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Transition {
    /// The effect
    pub style: TransitionStyle,
    /// Duration in seconds
    pub duration: f32,
    /// `/Dm`
    #[serde(default)]
    pub dimension: Option<TransitionDimension>,
    /// `/M`
    #[serde(default)]
    pub motion: Option<TransitionMotion>,
    /// `/Di`, counterclockwise degrees
    #[serde(default)]
    pub direction: Option<u16>,
}

impl Transition {
    /// A transition with default parameters
    pub fn new(style: TransitionStyle, duration: f32) -> Self {
        Self {
            style,
            duration,
            dimension: None,
            motion: None,
            direction: None,
        }
    }
}

impl Serialize for Transition {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        let mut dict = f.pdf_dict();
        dict.field("Type", &PdfName("Trans"))?
            .field("S", &PdfName(self.style.name()))?
            .field("D", &self.duration)?;
        if let Some(dm) = self.dimension {
            let dm = match dm {
                TransitionDimension::Horizontal => "H",
                TransitionDimension::Vertical => "V",
            };
            dict.field("Dm", &PdfName(dm))?;
        }
        if let Some(m) = self.motion {
            let m = match m {
                TransitionMotion::Inward => "I",
                TransitionMotion::Outward => "O",
            };
            dict.field("M", &PdfName(m))?;
        }
        dict.opt_field("Di", &self.direction)?.finish()
    }
}

/// Everything the drawing context produced for one page
#[derive(Debug, Clone, Default)]
pub struct PageContents {
    /// The resource dictionary, e.g. `<< /Font << /F0 12 0 R >> >>`
    pub resources: Vec<u8>,
    /// The (uncompressed) content stream
    pub contents: Vec<u8>,
    /// Form widgets shown on the page
    pub widgets: Vec<FormWidgetId>,
    /// Other annotations on the page
    pub annotations: Vec<AnnotationId>,
    /// Structure items in the order of their marked content, `MCID n` in the
    /// content stream belongs to `structure[n]`
    pub structure: Vec<StructureItemId>,
    /// Presentation transition
    pub transition: Option<Transition>,
    /// Page boxes, the document defaults if `None`
    pub boxes: Option<PageBoxes>,
}
