//! Colors, color spaces and the ICC profile manager

use std::collections::HashMap;

use log::{debug, warn};
use serde::Deserialize;
use smallvec::SmallVec;
use thiserror::Error;

use crate::{
    common::{ColorSpace, ICCColorProfileMetadata, LabColorSpaceParams, ObjRef, StreamMetadata},
    error::{Error, Result},
    id::{IccColorSpaceId, LabColorSpaceId, SeparationId},
    low::{ColorSpaceFamily, Function},
    registry::Registry,
    store::{ObjectRecord, ObjectStore},
    write::PdfNameBuf,
};

/// A device color space
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Deserialize)]
pub enum DeviceColorSpace {
    /// `DeviceGray`
    Gray,
    /// `DeviceRGB`
    Rgb,
    /// `DeviceCMYK`
    Cmyk,
}

impl Default for DeviceColorSpace {
    fn default() -> Self {
        Self::Rgb
    }
}

impl DeviceColorSpace {
    /// Number of color components
    pub fn num_components(self) -> u8 {
        match self {
            Self::Gray => 1,
            Self::Rgb => 3,
            Self::Cmyk => 4,
        }
    }
}

impl From<DeviceColorSpace> for ColorSpace {
    fn from(value: DeviceColorSpace) -> Self {
        match value {
            DeviceColorSpace::Gray => ColorSpace::DeviceGray,
            DeviceColorSpace::Rgb => ColorSpace::DeviceRGB,
            DeviceColorSpace::Cmyk => ColorSpace::DeviceCMYK,
        }
    }
}

/// A color in one of the device color spaces, components in `0.0..=1.0`
#[derive(Debug, Copy, Clone, PartialEq, Deserialize)]
pub enum Color {
    /// Gray level
    Gray(f32),
    /// Red, green, blue
    Rgb(f32, f32, f32),
    /// Cyan, magenta, yellow, black
    Cmyk(f32, f32, f32, f32),
}

impl Color {
    /// The color space the components are in
    pub fn space(&self) -> DeviceColorSpace {
        match self {
            Self::Gray(_) => DeviceColorSpace::Gray,
            Self::Rgb(..) => DeviceColorSpace::Rgb,
            Self::Cmyk(..) => DeviceColorSpace::Cmyk,
        }
    }

    /// The components, as written to a color array
    pub fn components(&self) -> SmallVec<[f32; 4]> {
        match *self {
            Self::Gray(g) => SmallVec::from_slice(&[g]),
            Self::Rgb(r, g, b) => SmallVec::from_slice(&[r, g, b]),
            Self::Cmyk(c, m, y, k) => SmallVec::from_slice(&[c, m, y, k]),
        }
    }
}

/// Pixel color conversion, provided by a color management system
pub trait ColorConverter {
    /// Convert `color` into the space `to`
    ///
    /// Only called when the source and target space differ.
    fn convert(&self, color: Color, to: DeviceColorSpace) -> Color;
}

/// Uncalibrated device conversions
#[derive(Debug, Default, Copy, Clone)]
pub struct DeviceConverter;

impl ColorConverter for DeviceConverter {
    fn convert(&self, color: Color, to: DeviceColorSpace) -> Color {
        let (r, g, b) = match color {
            Color::Gray(v) => (v, v, v),
            Color::Rgb(r, g, b) => (r, g, b),
            Color::Cmyk(c, m, y, k) => {
                if to == DeviceColorSpace::Gray {
                    let v = 0.3 * c + 0.59 * m + 0.11 * y + k;
                    return Color::Gray(1.0 - v.min(1.0));
                }
                ((1.0 - c) * (1.0 - k), (1.0 - m) * (1.0 - k), (1.0 - y) * (1.0 - k))
            }
        };
        match to {
            DeviceColorSpace::Gray => Color::Gray(0.3 * r + 0.59 * g + 0.11 * b),
            DeviceColorSpace::Rgb => Color::Rgb(r, g, b),
            DeviceColorSpace::Cmyk => {
                if let Color::Gray(v) = color {
                    return Color::Cmyk(0.0, 0.0, 0.0, 1.0 - v);
                }
                let k = 1.0 - r.max(g).max(b);
                if k >= 1.0 {
                    Color::Cmyk(0.0, 0.0, 0.0, 1.0)
                } else {
                    let d = 1.0 - k;
                    Color::Cmyk((1.0 - r - k) / d, (1.0 - g - k) / d, (1.0 - b - k) / d, k)
                }
            }
        }
    }
}

/// The ICC header could not be used
#[derive(Debug, Error)]
pub enum ProfileError {
    /// Shorter than the 128 byte header
    #[error("Profile too short ({0} bytes)")]
    TooShort(usize),
    /// No `acsp` signature at offset 36
    #[error("Missing profile file signature")]
    BadSignature,
    /// Data color space other than gray, RGB or CMYK
    #[error("Unsupported data color space {0:?}")]
    UnsupportedColorSpace(String),
}

/// The parts of an ICC profile header the document needs
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct IccProfile {
    /// The data color space of the profile
    pub color_space: DeviceColorSpace,
    /// Major and minor version
    pub version: (u8, u8),
}

impl IccProfile {
    /// Parse the profile header
    pub fn parse(bytes: &[u8]) -> Result<Self, ProfileError> {
        if bytes.len() < 128 {
            return Err(ProfileError::TooShort(bytes.len()));
        }
        if &bytes[36..40] != b"acsp" {
            return Err(ProfileError::BadSignature);
        }
        let color_space = match &bytes[16..20] {
            b"GRAY" => DeviceColorSpace::Gray,
            b"RGB " => DeviceColorSpace::Rgb,
            b"CMYK" => DeviceColorSpace::Cmyk,
            other => {
                return Err(ProfileError::UnsupportedColorSpace(
                    String::from_utf8_lossy(other).into_owned(),
                ))
            }
        };
        Ok(Self {
            color_space,
            version: (bytes[8], bytes[9] >> 4),
        })
    }
}

#[derive(Debug, Clone)]
struct IccRecord {
    stream: ObjRef,
    space: ObjRef,
    profile: IccProfile,
}

#[derive(Debug, Clone)]
struct SeparationRecord {
    space: ObjRef,
    fallback: Color,
}

/// Tracks the color spaces in the object graph
pub struct ColorManager {
    converter: Box<dyn ColorConverter>,
    output: DeviceColorSpace,
    compress: bool,
    icc: Registry<IccColorSpaceId, IccRecord>,
    by_digest: HashMap<[u8; 16], Vec<IccColorSpaceId>>,
    labs: Registry<LabColorSpaceId, ObjRef>,
    separations: Registry<SeparationId, SeparationRecord>,
}

impl std::fmt::Debug for ColorManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColorManager")
            .field("output", &self.output)
            .field("icc", &self.icc.len())
            .field("labs", &self.labs.len())
            .field("separations", &self.separations.len())
            .finish()
    }
}

impl ColorManager {
    /// Create a manager that converts to `output` with `converter`
    pub fn new(output: DeviceColorSpace, converter: Box<dyn ColorConverter>, compress: bool) -> Self {
        Self {
            converter,
            output,
            compress,
            icc: Registry::new(),
            by_digest: HashMap::new(),
            labs: Registry::new(),
            separations: Registry::new(),
        }
    }

    /// The device space that colors emitted by the document use
    pub fn output_space(&self) -> DeviceColorSpace {
        self.output
    }

    /// Store an ICC profile once, identical bytes return the first id
    pub fn load_icc_profile(
        &mut self,
        store: &mut ObjectStore,
        bytes: &[u8],
    ) -> Result<IccColorSpaceId> {
        let digest = md5::compute(bytes).0;
        if let Some(candidates) = self.by_digest.get(&digest) {
            for &id in candidates {
                let record = self.icc.get(id)?;
                if stream_data(store, record.stream) == Some(bytes) {
                    debug!("ICC profile {} reused", id);
                    return Ok(id);
                }
            }
        }

        let profile =
            IccProfile::parse(bytes).map_err(|e| Error::load("ICC profile", e))?;
        let n = profile.color_space.num_components();
        let meta = StreamMetadata::ColorProfile(ICCColorProfileMetadata {
            alternate: Some(profile.color_space.into()),
            num_components: n,
        });
        let data = bytes.to_vec();
        let record = if self.compress {
            ObjectRecord::deflate(&meta, data)?
        } else {
            ObjectRecord::raw_stream(&meta, None, data)?
        };
        let stream = store.allocate(record);
        let space = store.allocate(ObjectRecord::object(&ColorSpaceFamily::IccBased(stream))?);
        let id = self.icc.register(IccRecord {
            stream,
            space,
            profile,
        });
        self.by_digest.entry(digest).or_default().push(id);
        debug!("ICC profile {} at {} 0 R", id, space.id);
        Ok(id)
    }

    /// The `[/ICCBased …]` color space object
    pub fn icc_ref(&self, id: IccColorSpaceId) -> Result<ObjRef> {
        Ok(self.icc.get(id)?.space)
    }

    /// The ICC profile stream object
    pub fn icc_stream_ref(&self, id: IccColorSpaceId) -> Result<ObjRef> {
        Ok(self.icc.get(id)?.stream)
    }

    /// The data color space of a loaded profile
    pub fn icc_color_space(&self, id: IccColorSpaceId) -> Result<DeviceColorSpace> {
        Ok(self.icc.get(id)?.profile.color_space)
    }

    /// Number of distinct profiles
    pub fn icc_count(&self) -> usize {
        self.icc.len()
    }

    /// Add a `Lab` color space
    pub fn add_lab(
        &mut self,
        store: &mut ObjectStore,
        params: LabColorSpaceParams,
    ) -> Result<LabColorSpaceId> {
        let r = store.allocate(ObjectRecord::object(&ColorSpaceFamily::Lab(params))?);
        let id = self.labs.register(r);
        debug!("Lab color space {} at {} 0 R", id, r.id);
        Ok(id)
    }

    /// The `[/Lab …]` color space object
    pub fn lab_ref(&self, id: LabColorSpaceId) -> Result<ObjRef> {
        self.labs.get(id).copied()
    }

    /// Add a `Separation` color space for a named colorant
    ///
    /// `fallback` is the appearance of full tint on devices without the
    /// colorant, it also fixes the alternate space.
    pub fn add_separation(
        &mut self,
        store: &mut ObjectStore,
        name: &str,
        fallback: Color,
    ) -> Result<SeparationId> {
        let c1: Vec<f32> = fallback.components().into_vec();
        let c0 = vec![0.0; c1.len()];
        let tint = store.allocate(ObjectRecord::object(&Function::Exponential {
            domain: [0.0, 1.0],
            c0,
            c1,
            n: 1.0,
        })?);
        let space = store.allocate(ObjectRecord::object(&ColorSpaceFamily::Separation {
            name: PdfNameBuf(name.to_owned()),
            alternate: fallback.space().into(),
            tint_transform: tint,
        })?);
        let id = self.separations.register(SeparationRecord { space, fallback });
        debug!("Separation {:?} {} at {} 0 R", name, id, space.id);
        Ok(id)
    }

    /// The `[/Separation …]` color space object
    pub fn separation_ref(&self, id: SeparationId) -> Result<ObjRef> {
        Ok(self.separations.get(id)?.space)
    }

    /// Full tint of a separation as a device color
    pub fn separation_fallback(&self, id: SeparationId) -> Result<Color> {
        Ok(self.separations.get(id)?.fallback)
    }

    /// Convert a color to `to`, calling the converter only if needed
    pub fn convert(&self, color: Color, to: DeviceColorSpace) -> Color {
        if color.space() == to {
            return color;
        }
        let converted = self.converter.convert(color, to);
        if converted.space() != to {
            warn!(
                "Color converter returned {:?} instead of {:?}",
                converted.space(),
                to
            );
        }
        converted
    }

    /// Convert a color to the output space
    pub fn to_output(&self, color: Color) -> Color {
        self.convert(color, self.output)
    }
}

fn stream_data(store: &ObjectStore, r: ObjRef) -> Option<&[u8]> {
    match store.get(r)? {
        ObjectRecord::Deflate { stream, .. } => Some(stream),
        ObjectRecord::Final {
            stream: Some(stream),
            ..
        } => Some(stream),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{Color, ColorConverter, ColorManager, DeviceColorSpace, DeviceConverter, IccProfile};
    use crate::store::{ObjectRecord, ObjectStore};

    pub(crate) fn fake_profile(space: &[u8; 4], salt: u8) -> Vec<u8> {
        let mut bytes = vec![0u8; 132];
        bytes[8] = 4;
        bytes[9] = 0x30;
        bytes[16..20].copy_from_slice(space);
        bytes[36..40].copy_from_slice(b"acsp");
        bytes[131] = salt;
        bytes
    }

    #[test]
    fn test_parse_header() {
        let p = IccProfile::parse(&fake_profile(b"CMYK", 0)).unwrap();
        assert_eq!(p.color_space, DeviceColorSpace::Cmyk);
        assert_eq!(p.version, (4, 3));
        assert!(IccProfile::parse(&[0; 10]).is_err());
        assert!(IccProfile::parse(&fake_profile(b"XYZ ", 0)).is_err());
    }

    #[test]
    fn test_icc_dedup() {
        let mut store = ObjectStore::new();
        let mut colors = ColorManager::new(DeviceColorSpace::Rgb, Box::new(DeviceConverter), true);
        let a = colors
            .load_icc_profile(&mut store, &fake_profile(b"RGB ", 1))
            .unwrap();
        let len = store.len();
        let b = colors
            .load_icc_profile(&mut store, &fake_profile(b"RGB ", 1))
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(store.len(), len);

        let c = colors
            .load_icc_profile(&mut store, &fake_profile(b"RGB ", 2))
            .unwrap();
        assert_ne!(a, c);
        assert_eq!(colors.icc_count(), 2);

        let streams = store
            .iter()
            .filter(|(_, r)| matches!(r, ObjectRecord::Deflate { .. }))
            .count();
        assert_eq!(streams, 2);
    }

    #[test]
    fn test_trivial_conversion_skips_converter() {
        struct Panics;
        impl ColorConverter for Panics {
            fn convert(&self, _: Color, _: DeviceColorSpace) -> Color {
                panic!("should not be called")
            }
        }
        let colors = ColorManager::new(DeviceColorSpace::Cmyk, Box::new(Panics), true);
        let c = Color::Cmyk(0.1, 0.2, 0.3, 0.4);
        assert_eq!(colors.to_output(c), c);
    }

    #[test]
    fn test_device_conversion() {
        let conv = DeviceConverter;
        assert_eq!(
            conv.convert(Color::Rgb(1.0, 0.0, 0.0), DeviceColorSpace::Cmyk),
            Color::Cmyk(0.0, 1.0, 1.0, 0.0)
        );
        assert_eq!(
            conv.convert(Color::Gray(0.25), DeviceColorSpace::Cmyk),
            Color::Cmyk(0.0, 0.0, 0.0, 0.75)
        );
        assert_eq!(
            conv.convert(Color::Cmyk(0.0, 0.0, 0.0, 1.0), DeviceColorSpace::Rgb),
            Color::Rgb(0.0, 0.0, 0.0)
        );
    }
}
