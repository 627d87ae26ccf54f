//! Graphics resources: `ExtGState`, functions, shadings, patterns and forms

use std::io;

use serde::Deserialize;

use crate::{
    color::DeviceColorSpace,
    common::{Matrix, Rectangle},
    id::{FunctionId, IccColorSpaceId, LabColorSpaceId, SeparationId, ShadingId},
    write::{Formatter, PdfName, Serialize},
};

/// Shape at the end of open subpaths
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[allow(missing_docs)]
pub enum LineCap {
    Butt = 0,
    Round = 1,
    Square = 2,
}

/// Shape at the corners of paths
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[allow(missing_docs)]
pub enum LineJoin {
    Miter = 0,
    Round = 1,
    Bevel = 2,
}

/// Separable and non-separable blend modes
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[allow(missing_docs)]
pub enum BlendMode {
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Hue,
    Saturation,
    Color,
    Luminosity,
}

const BLEND_MODE_NAMES: [&str; 16] = [
    "Normal",
    "Multiply",
    "Screen",
    "Overlay",
    "Darken",
    "Lighten",
    "ColorDodge",
    "ColorBurn",
    "HardLight",
    "SoftLight",
    "Difference",
    "Exclusion",
    "Hue",
    "Saturation",
    "Color",
    "Luminosity",
];

impl BlendMode {
    /// The value of `/BM`
    pub fn name(self) -> &'static str {
        BLEND_MODE_NAMES[self as usize]
    }
}

/// A dash pattern
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DashPattern {
    /// Lengths of alternating dashes and gaps
    pub array: Vec<f32>,
    /// Offset into the pattern
    pub phase: f32,
}

impl Serialize for DashPattern {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        f.pdf_arr().entry(&self.array)?.entry(&self.phase)?.finish()
    }
}

/// An `ExtGState` dictionary, unset fields are left out
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GraphicsState {
    /// `/LW`
    pub line_width: Option<f32>,
    /// `/LC`
    pub line_cap: Option<LineCap>,
    /// `/LJ`
    pub line_join: Option<LineJoin>,
    /// `/ML`
    pub miter_limit: Option<f32>,
    /// `/D`
    pub dash: Option<DashPattern>,
    /// `/CA`, stroking alpha
    pub stroke_alpha: Option<f32>,
    /// `/ca`, non-stroking alpha
    pub fill_alpha: Option<f32>,
    /// `/BM`
    pub blend_mode: Option<BlendMode>,
    /// `/OP`
    pub overprint_stroke: Option<bool>,
    /// `/op`
    pub overprint_fill: Option<bool>,
    /// `/OPM`
    pub overprint_mode: Option<u8>,
}

impl Serialize for GraphicsState {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        let mut dict = f.pdf_dict();
        dict.field("Type", &PdfName("ExtGState"))?
            .opt_field("LW", &self.line_width)?
            .opt_field("LC", &self.line_cap.map(|c| c as u8))?
            .opt_field("LJ", &self.line_join.map(|j| j as u8))?
            .opt_field("ML", &self.miter_limit)?
            .opt_field("D", &self.dash)?
            .opt_field("CA", &self.stroke_alpha)?
            .opt_field("ca", &self.fill_alpha)?;
        if let Some(bm) = self.blend_mode {
            dict.field("BM", &PdfName(bm.name()))?;
        }
        dict.opt_field("OP", &self.overprint_stroke)?
            .opt_field("op", &self.overprint_fill)?
            .opt_field("OPM", &self.overprint_mode)?
            .finish()
    }
}

/// A function with one input
#[derive(Debug, Clone, PartialEq)]
pub enum Function {
    /// Exponential interpolation between two colors (type 2)
    Exponential {
        /// Input range
        domain: [f32; 2],
        /// Output at the domain start
        c0: Vec<f32>,
        /// Output at the domain end
        c1: Vec<f32>,
        /// Exponent, `1.0` is linear
        n: f32,
    },
    /// Previously added functions glued together (type 3)
    Stitching {
        /// Input range
        domain: [f32; 2],
        /// The sub-functions
        functions: Vec<FunctionId>,
        /// Boundaries between the sub-domains
        bounds: Vec<f32>,
        /// Mapping of each sub-domain, two numbers per function
        encode: Vec<f32>,
    },
}

impl Function {
    /// Linear interpolation from `c0` to `c1` over `[0, 1]`
    pub fn linear(c0: Vec<f32>, c1: Vec<f32>) -> Self {
        Self::Exponential {
            domain: [0.0, 1.0],
            c0,
            c1,
            n: 1.0,
        }
    }
}

/// The color space of a shading
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ShadingColorSpace {
    /// A device space
    Device(DeviceColorSpace),
    /// An ICC profile
    Icc(IccColorSpaceId),
    /// A Lab space
    Lab(LabColorSpaceId),
    /// A spot colorant
    Separation(SeparationId),
}

/// The geometry of a shading
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ShadingGeometry {
    /// Between two points (type 2)
    Axial {
        /// Start point
        from: [f32; 2],
        /// End point
        to: [f32; 2],
    },
    /// Between two circles (type 3)
    Radial {
        /// Start circle center and radius
        from: [f32; 3],
        /// End circle center and radius
        to: [f32; 3],
    },
}

/// A smooth shading
#[derive(Debug, Clone, PartialEq)]
pub struct Shading {
    /// Axial or radial
    pub geometry: ShadingGeometry,
    /// Space of the function output
    pub color_space: ShadingColorSpace,
    /// Color function
    pub function: FunctionId,
    /// Extend beyond start and end
    pub extend: [bool; 2],
}

/// A pattern color
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    /// Paint a shading
    Shading {
        /// The shading
        shading: ShadingId,
        /// Pattern space to default space
        matrix: Matrix<f32>,
    },
    /// Repeat a cell
    Tiling {
        /// The cell bounds
        bbox: Rectangle<f32>,
        /// Horizontal spacing
        x_step: f32,
        /// Vertical spacing
        y_step: f32,
        /// Whether the cell has its own colors (paint type 1)
        colored: bool,
        /// Resource dictionary of the cell
        resources: Vec<u8>,
        /// Content stream of the cell
        contents: Vec<u8>,
        /// Pattern space to default space
        matrix: Matrix<f32>,
    },
}

/// A form XObject
#[derive(Debug, Clone, PartialEq)]
pub struct FormXObject {
    /// Bounds in form space
    pub bbox: Rectangle<f32>,
    /// Form space to user space
    pub matrix: Option<Matrix<f32>>,
    /// Resource dictionary, may be empty
    pub resources: Vec<u8>,
    /// Content stream
    pub contents: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::{BlendMode, DashPattern, GraphicsState, LineCap};
    use crate::write::to_bytes;

    #[test]
    fn test_graphics_state() {
        let gs = GraphicsState {
            line_width: Some(0.5),
            line_cap: Some(LineCap::Round),
            dash: Some(DashPattern {
                array: vec![3.0, 2.0],
                phase: 0.0,
            }),
            fill_alpha: Some(0.25),
            blend_mode: Some(BlendMode::Multiply),
            overprint_fill: Some(true),
            ..Default::default()
        };
        let text = String::from_utf8(to_bytes(&gs).unwrap()).unwrap();
        assert!(text.contains("/LW 0.5"));
        assert!(text.contains("/LC 1"));
        assert!(text.contains("/D[[3 2]0]"));
        assert!(text.contains("/ca 0.25"));
        assert!(text.contains("/BM/Multiply"));
        assert!(text.contains("/op true"));
        assert!(!text.contains("/CA"));
    }
}
