//! High-Level API
//!
//! A [`Document`] accumulates resources and pages. Every `add_*`/`create_*`
//! call validates its inputs, pushes records into the object store and
//! returns a typed identifier; the matching `*_ref` getter returns the
//! object number to use in resource dictionaries. The document is written
//! with [`Document::finalize`], which consumes it.

use std::{collections::HashSet, fs, path::Path};

use log::{debug, warn};

use crate::{
    cmap::EncodingCMap,
    color::{Color, ColorConverter, ColorManager, DeviceColorSpace, DeviceConverter},
    common::{
        CidSystemInfo, ColorSpace, ImageMetadata, LabColorSpaceParams, ObjRef,
        OutputIntentSubtype, PdfString, Rectangle, StreamMetadata,
    },
    error::{Error, Result},
    error::LoadError,
    font::{BuiltinFont, FontFace, GlyphId, TrueTypeFace},
    id::{
        AnnotationId, BuiltinFontId, EmbeddedFileId, FontId, FormWidgetId, FormXObjectId, FunctionId,
        GraphicsStateId, IccColorSpaceId, ImageId, LabColorSpaceId, OutlineId, PageId, PatternId,
        ResourceId, SeparationId, ShadingId, StructureItemId,
    },
    low,
    options::DocumentOptions,
    raster::{self, ImageSource, JpegInfo, MonoImage, RasterImage},
    registry::{Registry, UsageMap},
    store::{
        DelayedAnnotation, DelayedCheckbox, DelayedPage, DelayedStructItem, ObjectRecord,
        ObjectStore, SubsetKey,
    },
    subset::{FontSubsetter, SubsetGlyph},
    write::{PdfDict, PdfNameBuf, ToDict},
};

mod annotation;
mod graphics;
mod metadata;
mod outline;
mod page;
mod structure;

pub use annotation::{AnnotationKind, Checkbox};
pub use graphics::{
    BlendMode, DashPattern, FormXObject, Function, GraphicsState, LineCap, LineJoin, Pattern,
    Shading, ShadingColorSpace, ShadingGeometry,
};
pub use metadata::Info;
pub use outline::OutlineEntry;
pub use page::{
    PageBoxes, PageContents, Transition, TransitionDimension, TransitionMotion, TransitionStyle,
};
pub use structure::{StructureAttributes, StructureType};

/// The objects that make up one font subset
#[derive(Debug, Copy, Clone)]
pub(crate) struct SubsetObjects {
    pub data: ObjRef,
    pub descriptor: ObjRef,
    pub cmap: ObjRef,
    pub cid_font: ObjRef,
    pub font: ObjRef,
}

pub(crate) struct FontRecord {
    pub face: Box<dyn FontFace>,
    pub subsetter: FontSubsetter,
    pub subsets: Vec<SubsetObjects>,
}

#[derive(Debug, Clone)]
pub(crate) struct PageRecord {
    pub obj: ObjRef,
    pub struct_parents: Option<usize>,
    pub structure: Vec<StructureItemId>,
}

#[derive(Debug, Clone)]
pub(crate) struct StructRecord {
    pub obj: ObjRef,
    pub parent: Option<StructureItemId>,
}

#[derive(Debug, Clone)]
pub(crate) struct EmbeddedFileRecord {
    pub name: String,
    pub filespec: ObjRef,
}

#[derive(Debug, Clone)]
pub(crate) struct OutputIntentRecord {
    pub subtype: OutputIntentSubtype,
    pub identifier: String,
    pub condition: Option<String>,
    pub profile: Option<IccColorSpaceId>,
}

struct JpegDict<'a>(&'a JpegInfo);

impl ToDict for JpegDict<'_> {
    fn write(&self, dict: &mut PdfDict<'_, '_>) -> std::io::Result<()> {
        let info = self.0;
        dict.embed(&ImageMetadata {
            width: info.width,
            height: info.height,
            color_space: info.color_space.into(),
            bits_per_component: info.bits_per_component,
            smask: None,
        })?;
        if info.inverted {
            dict.field("Decode", &[1u8, 0, 1, 0, 1, 0, 1, 0])?;
        }
        Ok(())
    }
}

/// A PDF document in the making
pub struct Document {
    pub(crate) options: DocumentOptions,
    pub(crate) info: Info,
    pub(crate) store: ObjectStore,
    pub(crate) colors: ColorManager,
    pub(crate) fonts: Registry<FontId, FontRecord>,
    pub(crate) builtin_fonts: Registry<BuiltinFontId, (BuiltinFont, ObjRef)>,
    pub(crate) encoding_cmap: Option<ObjRef>,
    pub(crate) images: Registry<ImageId, ObjRef>,
    pub(crate) forms: Registry<FormXObjectId, ObjRef>,
    pub(crate) widgets: Registry<FormWidgetId, ObjRef>,
    pub(crate) widget_usage: UsageMap<FormWidgetId>,
    pub(crate) annotations: Registry<AnnotationId, ObjRef>,
    pub(crate) annotation_usage: UsageMap<AnnotationId>,
    pub(crate) structure: Registry<StructureItemId, StructRecord>,
    pub(crate) structure_usage: UsageMap<StructureItemId>,
    pub(crate) graphics_states: Registry<GraphicsStateId, ObjRef>,
    pub(crate) functions: Registry<FunctionId, ObjRef>,
    pub(crate) shadings: Registry<ShadingId, ObjRef>,
    pub(crate) patterns: Registry<PatternId, ObjRef>,
    pub(crate) embedded_files: Registry<EmbeddedFileId, EmbeddedFileRecord>,
    pub(crate) pages: Registry<PageId, PageRecord>,
    pub(crate) outlines: Registry<OutlineId, OutlineEntry>,
    pub(crate) output_intent: Option<OutputIntentRecord>,
    page_group: Option<ObjRef>,
    next_struct_parent: usize,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document with default options
    pub fn new() -> Self {
        Self::with_options(DocumentOptions::default())
    }

    /// Create a document
    pub fn with_options(options: DocumentOptions) -> Self {
        Self::with_converter(options, Box::new(DeviceConverter))
    }

    /// Create a document that converts colors with `converter`
    pub fn with_converter(options: DocumentOptions, converter: Box<dyn ColorConverter>) -> Self {
        let info = Info::new(
            options.title.as_deref(),
            options.author.as_deref(),
            options.subject.as_deref(),
            options.keywords.as_deref(),
            options.creator.as_deref(),
            options.producer.as_deref(),
        );
        let colors = ColorManager::new(options.output_color_space, converter, options.compress);
        Self {
            options,
            info,
            store: ObjectStore::new(),
            colors,
            fonts: Registry::new(),
            builtin_fonts: Registry::new(),
            encoding_cmap: None,
            images: Registry::new(),
            forms: Registry::new(),
            widgets: Registry::new(),
            widget_usage: UsageMap::default(),
            annotations: Registry::new(),
            annotation_usage: UsageMap::default(),
            structure: Registry::new(),
            structure_usage: UsageMap::default(),
            graphics_states: Registry::new(),
            functions: Registry::new(),
            shadings: Registry::new(),
            patterns: Registry::new(),
            embedded_files: Registry::new(),
            pages: Registry::new(),
            outlines: Registry::new(),
            output_intent: None,
            page_group: None,
            next_struct_parent: 0,
        }
    }

    /// The options the document was created with
    pub fn options(&self) -> &DocumentOptions {
        &self.options
    }

    /// The document information dictionary
    pub fn info_mut(&mut self) -> &mut Info {
        &mut self.info
    }

    /// The object graph built so far
    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    /// Number of pages added so far
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn push_stream(&mut self, meta: &dyn ToDict, data: Vec<u8>) -> Result<ObjRef> {
        let record = if self.options.compress {
            ObjectRecord::deflate(meta, data)?
        } else {
            ObjectRecord::raw_stream(meta, None, data)?
        };
        Ok(self.store.allocate(record))
    }

    fn push_resources(&mut self, resources: Vec<u8>) -> ObjRef {
        let dict = if resources.iter().all(u8::is_ascii_whitespace) {
            b"<< >>".to_vec()
        } else {
            resources
        };
        self.store.allocate(ObjectRecord::Final { dict, stream: None })
    }

    // Fonts

    /// Load a TrueType font file
    pub fn load_font(&mut self, path: &Path) -> Result<FontId> {
        let face =
            TrueTypeFace::load(path).map_err(|e| Error::load(path.display().to_string(), e))?;
        Ok(self.add_font(Box::new(face)))
    }

    /// Add a font face, e.g. one provided by another font engine
    pub fn add_font(&mut self, face: Box<dyn FontFace>) -> FontId {
        let name = face.postscript_name();
        let id = self.fonts.register(FontRecord {
            face,
            subsetter: FontSubsetter::new(self.options.subset_capacity),
            subsets: Vec::new(),
        });
        debug!("Font {} is {}", id, name);
        id
    }

    /// Assign the glyph for `chr` to a subset
    ///
    /// Fails with [`Error::GlyphNotFound`] if the font has no such glyph.
    pub fn get_subset_glyph(&mut self, font: FontId, chr: char) -> Result<SubsetGlyph> {
        let glyph = self
            .fonts
            .get(font)?
            .face
            .glyph_index(chr)
            .ok_or(Error::GlyphNotFound {
                font: font.raw(),
                codepoint: chr.into(),
            })?;
        self.get_subset_glyph_id(font, glyph, Some(chr))
    }

    /// Assign a glyph to a subset, `unicode` is its text for extraction
    pub fn get_subset_glyph_id(
        &mut self,
        font: FontId,
        glyph: GlyphId,
        unicode: Option<char>,
    ) -> Result<SubsetGlyph> {
        self.fonts.get(font)?;
        if glyph.0 == 0 {
            return Err(Error::GlyphNotFound {
                font: font.raw(),
                codepoint: unicode.map_or(0, u32::from),
            });
        }
        let capacity = self.options.subset_capacity;
        if self.encoding_cmap.is_none() {
            let cmap = EncodingCMap::new(capacity.clamp(1, 255));
            let meta = StreamMetadata::CMap {
                name: PdfNameBuf(EncodingCMap::NAME.to_owned()),
                system_info: CidSystemInfo::identity(),
            };
            self.encoding_cmap = Some(self.push_stream(&meta, cmap.to_bytes())?);
        }

        let record = self.fonts.get_mut(font)?;
        let (slot, opened) = record.subsetter.assign(glyph, unicode);
        if opened {
            let key = SubsetKey {
                font,
                subset: slot.subset,
            };
            let objects = SubsetObjects {
                data: self.store.allocate(ObjectRecord::SubsetFontData(key)),
                descriptor: self.store.allocate(ObjectRecord::SubsetFontDescriptor(key)),
                cmap: self.store.allocate(ObjectRecord::SubsetCMap(key)),
                cid_font: self.store.allocate(ObjectRecord::SubsetCidFont(key)),
                font: self.store.allocate(ObjectRecord::SubsetFont(key)),
            };
            debug!(
                "Font {} subset {} at {} 0 R",
                font, slot.subset, objects.font.id
            );
            record.subsets.push(objects);
        }
        Ok(slot)
    }

    /// The `Type0` font object of a subset
    pub fn subset_font_ref(&self, font: FontId, subset: usize) -> Result<ObjRef> {
        self.fonts
            .get(font)?
            .subsets
            .get(subset)
            .map(|s| s.font)
            .ok_or(Error::UnknownResource {
                kind: FontId::KIND,
                id: font.raw(),
            })
    }

    /// Number of subsets opened for a font
    pub fn font_subset_count(&self, font: FontId) -> Result<usize> {
        Ok(self.fonts.get(font)?.subsets.len())
    }

    /// The id of a standard 14 font, its object is written on first use
    pub fn get_builtin_font_id(&mut self, font: BuiltinFont) -> Result<BuiltinFontId> {
        if let Some((id, _)) = self.builtin_fonts.iter().find(|(_, (f, _))| *f == font) {
            return Ok(id);
        }
        let r = self.store.allocate(ObjectRecord::object(&low::Type1Font {
            base_font: font.base_font(),
        })?);
        let id = self.builtin_fonts.register((font, r));
        debug!("BuiltinFont {} /{} at {} 0 R", id, font.base_font(), r.id);
        Ok(id)
    }

    /// The `Type1` font object of a standard 14 font
    pub fn builtin_font_ref(&self, id: BuiltinFontId) -> Result<ObjRef> {
        Ok(self.builtin_fonts.get(id)?.1)
    }

    /// Advance width of `chr`, in thousandths of an em
    pub fn advance_width(&self, font: FontId, chr: char) -> Result<f32> {
        let face = &self.fonts.get(font)?.face;
        let not_found = Error::GlyphNotFound {
            font: font.raw(),
            codepoint: chr.into(),
        };
        let glyph = face.glyph_index(chr).ok_or(not_found)?;
        let advance = face.advance_width(glyph).unwrap_or(0);
        let upem = face.metrics().units_per_em.max(1);
        Ok(advance as f32 * 1000.0 / upem as f32)
    }

    // Images and colors

    /// Load a JPEG, PNG or other image file
    pub fn load_image(&mut self, path: &Path) -> Result<ImageId> {
        let source =
            raster::load_image(path).map_err(|e| Error::load(path.display().to_string(), e))?;
        self.add_image_source(source)
    }

    /// Load a 1-bit image file as a stencil mask
    pub fn load_mask_image(&mut self, path: &Path) -> Result<ImageId> {
        let what = path.display().to_string();
        match raster::load_image(path).map_err(|e| Error::load(what.clone(), e))? {
            ImageSource::Mono(image) => self.add_mask_image(image),
            _ => Err(Error::load(
                what,
                LoadError::InvalidImage("a mask needs one bit per pixel".to_owned()),
            )),
        }
    }

    /// Add an image from encoded or decoded data
    pub fn add_image_source(&mut self, source: ImageSource) -> Result<ImageId> {
        match source {
            ImageSource::Jpeg(info, data) => {
                let record = ObjectRecord::raw_stream(&JpegDict(&info), Some("DCTDecode"), data)?;
                let r = self.store.allocate(record);
                let id = self.images.register(r);
                debug!("Image {} (JPEG) at {} 0 R", id, r.id);
                Ok(id)
            }
            ImageSource::Raster(image) => self.add_image(image),
            ImageSource::Mono(image) => self.add_mono_image(image),
        }
    }

    /// Add a black and white image
    pub fn add_mono_image(&mut self, image: MonoImage) -> Result<ImageId> {
        image.validate().map_err(|e| Error::load("image", e))?;
        let meta = StreamMetadata::Image(ImageMetadata {
            width: image.width,
            height: image.height,
            color_space: ColorSpace::DeviceGray,
            bits_per_component: 1,
            smask: None,
        });
        let r = self.push_stream(&meta, image.data)?;
        let id = self.images.register(r);
        debug!("Image {} (1-bit) at {} 0 R", id, r.id);
        Ok(id)
    }

    /// Add a stencil mask, black pixels are painted with the fill color
    pub fn add_mask_image(&mut self, image: MonoImage) -> Result<ImageId> {
        image.validate().map_err(|e| Error::load("image", e))?;
        let meta = StreamMetadata::ImageMask {
            width: image.width,
            height: image.height,
        };
        let r = self.push_stream(&meta, image.data)?;
        let id = self.images.register(r);
        debug!("Image {} (mask) at {} 0 R", id, r.id);
        Ok(id)
    }

    /// Add decoded 8-bit samples, alpha becomes a soft mask
    pub fn add_image(&mut self, image: RasterImage) -> Result<ImageId> {
        image.validate().map_err(|e| Error::load("image", e))?;
        let color_space = match image.icc {
            Some(icc) => {
                let space = self.colors.icc_color_space(icc)?;
                if space != image.color_space {
                    warn!(
                        "Image samples are {:?} but the profile is {:?}",
                        image.color_space, space
                    );
                }
                ColorSpace::Ref(self.colors.icc_ref(icc)?)
            }
            None => image.color_space.into(),
        };
        let smask = match image.alpha {
            Some(alpha) => {
                let meta = StreamMetadata::Image(ImageMetadata {
                    width: image.width,
                    height: image.height,
                    color_space: ColorSpace::DeviceGray,
                    bits_per_component: 8,
                    smask: None,
                });
                Some(self.push_stream(&meta, alpha)?)
            }
            None => None,
        };
        let meta = StreamMetadata::Image(ImageMetadata {
            width: image.width,
            height: image.height,
            color_space,
            bits_per_component: 8,
            smask,
        });
        let r = self.push_stream(&meta, image.data)?;
        let id = self.images.register(r);
        debug!("Image {} at {} 0 R", id, r.id);
        Ok(id)
    }

    /// The image XObject
    pub fn image_ref(&self, id: ImageId) -> Result<ObjRef> {
        self.images.get(id).copied()
    }

    /// Store an ICC profile, identical bytes return the same id
    pub fn load_icc_profile(&mut self, bytes: &[u8]) -> Result<IccColorSpaceId> {
        self.colors.load_icc_profile(&mut self.store, bytes)
    }

    /// The `ICCBased` color space object
    pub fn icc_ref(&self, id: IccColorSpaceId) -> Result<ObjRef> {
        self.colors.icc_ref(id)
    }

    /// Add a `Lab` color space
    pub fn add_lab_color_space(&mut self, params: LabColorSpaceParams) -> Result<LabColorSpaceId> {
        self.colors.add_lab(&mut self.store, params)
    }

    /// The `Lab` color space object
    pub fn lab_ref(&self, id: LabColorSpaceId) -> Result<ObjRef> {
        self.colors.lab_ref(id)
    }

    /// Add a `Separation` color space
    pub fn add_separation(&mut self, name: &str, fallback: Color) -> Result<SeparationId> {
        self.colors.add_separation(&mut self.store, name, fallback)
    }

    /// The `Separation` color space object
    pub fn separation_ref(&self, id: SeparationId) -> Result<ObjRef> {
        self.colors.separation_ref(id)
    }

    /// Convert a color between device spaces
    pub fn convert_color(&self, color: Color, to: DeviceColorSpace) -> Color {
        self.colors.convert(color, to)
    }

    /// Declare the intended output condition
    pub fn set_output_intent(
        &mut self,
        subtype: OutputIntentSubtype,
        identifier: &str,
        condition: Option<&str>,
        profile: Option<IccColorSpaceId>,
    ) -> Result<()> {
        if let Some(icc) = profile {
            self.colors.icc_ref(icc)?;
        }
        self.output_intent = Some(OutputIntentRecord {
            subtype,
            identifier: identifier.to_owned(),
            condition: condition.map(str::to_owned),
            profile,
        });
        Ok(())
    }

    fn shading_color_space(&self, space: ShadingColorSpace) -> Result<ColorSpace> {
        Ok(match space {
            ShadingColorSpace::Device(d) => d.into(),
            ShadingColorSpace::Icc(id) => ColorSpace::Ref(self.colors.icc_ref(id)?),
            ShadingColorSpace::Lab(id) => ColorSpace::Ref(self.colors.lab_ref(id)?),
            ShadingColorSpace::Separation(id) => ColorSpace::Ref(self.colors.separation_ref(id)?),
        })
    }

    // Graphics resources

    /// Add an `ExtGState`
    pub fn add_graphics_state(&mut self, state: &GraphicsState) -> Result<GraphicsStateId> {
        let r = self.store.allocate(ObjectRecord::object(state)?);
        let id = self.graphics_states.register(r);
        debug!("GraphicsState {} at {} 0 R", id, r.id);
        Ok(id)
    }

    /// The `ExtGState` object
    pub fn graphics_state_ref(&self, id: GraphicsStateId) -> Result<ObjRef> {
        self.graphics_states.get(id).copied()
    }

    /// Add a function, stitched functions must already exist
    pub fn add_function(&mut self, function: &Function) -> Result<FunctionId> {
        let low = match function {
            Function::Exponential { domain, c0, c1, n } => low::Function::Exponential {
                domain: *domain,
                c0: c0.clone(),
                c1: c1.clone(),
                n: *n,
            },
            Function::Stitching {
                domain,
                functions,
                bounds,
                encode,
            } => low::Function::Stitching {
                domain: *domain,
                functions: functions
                    .iter()
                    .map(|&f| self.functions.get(f).copied())
                    .collect::<Result<_>>()?,
                bounds: bounds.clone(),
                encode: encode.clone(),
            },
        };
        let r = self.store.allocate(ObjectRecord::object(&low)?);
        let id = self.functions.register(r);
        debug!("Function {} at {} 0 R", id, r.id);
        Ok(id)
    }

    /// The function object
    pub fn function_ref(&self, id: FunctionId) -> Result<ObjRef> {
        self.functions.get(id).copied()
    }

    /// Add an axial or radial shading
    pub fn add_shading(&mut self, shading: &Shading) -> Result<ShadingId> {
        let (shading_type, coords) = match shading.geometry {
            ShadingGeometry::Axial { from, to } => (2, vec![from[0], from[1], to[0], to[1]]),
            ShadingGeometry::Radial { from, to } => {
                (3, vec![from[0], from[1], from[2], to[0], to[1], to[2]])
            }
        };
        let low = low::Shading {
            shading_type,
            color_space: self.shading_color_space(shading.color_space)?,
            coords,
            function: self.functions.get(shading.function).copied()?,
            extend: shading.extend,
        };
        let r = self.store.allocate(ObjectRecord::object(&low)?);
        let id = self.shadings.register(r);
        debug!("Shading {} at {} 0 R", id, r.id);
        Ok(id)
    }

    /// The shading object, for `sh` operators
    pub fn shading_ref(&self, id: ShadingId) -> Result<ObjRef> {
        self.shadings.get(id).copied()
    }

    /// Add a shading or tiling pattern
    pub fn add_pattern(&mut self, pattern: Pattern) -> Result<PatternId> {
        let r = match pattern {
            Pattern::Shading { shading, matrix } => {
                let low = low::ShadingPattern {
                    shading: self.shadings.get(shading).copied()?,
                    matrix,
                };
                self.store.allocate(ObjectRecord::object(&low)?)
            }
            Pattern::Tiling {
                bbox,
                x_step,
                y_step,
                colored,
                resources,
                contents,
                matrix,
            } => {
                let resources = self.push_resources(resources);
                let meta = low::TilingPattern {
                    paint_type: if colored { 1 } else { 2 },
                    tiling_type: 1,
                    bbox,
                    x_step,
                    y_step,
                    resources,
                    matrix,
                };
                self.push_stream(&meta, contents)?
            }
        };
        let id = self.patterns.register(r);
        debug!("Pattern {} at {} 0 R", id, r.id);
        Ok(id)
    }

    /// The pattern object
    pub fn pattern_ref(&self, id: PatternId) -> Result<ObjRef> {
        self.patterns.get(id).copied()
    }

    /// Add a form XObject
    pub fn add_form_xobject(&mut self, form: FormXObject) -> Result<FormXObjectId> {
        let resources = if form.resources.is_empty() {
            None
        } else {
            Some(self.push_resources(form.resources))
        };
        let meta = low::FormXObject {
            bbox: form.bbox,
            matrix: form.matrix,
            resources,
        };
        let r = self.push_stream(&meta, form.contents)?;
        let id = self.forms.register(r);
        debug!("FormXObject {} at {} 0 R", id, r.id);
        Ok(id)
    }

    /// The form XObject
    pub fn form_xobject_ref(&self, id: FormXObjectId) -> Result<ObjRef> {
        self.forms.get(id).copied()
    }

    // Files, annotations and widgets

    /// Embed a file from disk, listed under its file name
    pub fn embed_file(&mut self, path: &Path) -> Result<EmbeddedFileId> {
        let data = fs::read(path).map_err(|e| Error::load(path.display().to_string(), e))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.embed_file_data(&name, data, None)
    }

    /// Embed file contents under `name`
    pub fn embed_file_data(
        &mut self,
        name: &str,
        data: Vec<u8>,
        mime_type: Option<&str>,
    ) -> Result<EmbeddedFileId> {
        if self.embedded_files.iter().any(|(_, f)| f.name == name) {
            warn!("Embedded file name {:?} is used more than once", name);
        }
        let meta = StreamMetadata::EmbeddedFile {
            size: data.len(),
            subtype: mime_type.map(|m| PdfNameBuf(m.to_owned())),
        };
        let stream = self.push_stream(&meta, data)?;
        let filespec = self.store.allocate(ObjectRecord::object(&low::Filespec {
            file_name: PdfString::text(name),
            embedded_file: stream,
            description: None,
        })?);
        let id = self.embedded_files.register(EmbeddedFileRecord {
            name: name.to_owned(),
            filespec,
        });
        debug!("EmbeddedFile {} {:?} at {} 0 R", id, name, filespec.id);
        Ok(id)
    }

    /// The `Filespec` object of an embedded file
    pub fn embedded_file_ref(&self, id: EmbeddedFileId) -> Result<ObjRef> {
        Ok(self.embedded_files.get(id)?.filespec)
    }

    /// Create an annotation, placed on a page with [`Document::add_page`]
    pub fn create_annotation(
        &mut self,
        rect: Rectangle<f32>,
        kind: AnnotationKind,
    ) -> Result<AnnotationId> {
        self.create_colored_annotation(rect, kind, None)
    }

    /// Create an annotation with an icon / border color
    pub fn create_colored_annotation(
        &mut self,
        rect: Rectangle<f32>,
        kind: AnnotationKind,
        color: Option<Color>,
    ) -> Result<AnnotationId> {
        if let AnnotationKind::FileAttachment { file, .. } = &kind {
            self.embedded_files.get(*file)?;
        }
        let subtype = kind.subtype();
        let r = self
            .store
            .allocate(ObjectRecord::Annotation(DelayedAnnotation { rect, kind, color }));
        let id = self.annotations.register(r);
        debug!("Annotation {} ({}) at {} 0 R", id, subtype, r.id);
        Ok(id)
    }

    /// The annotation object
    pub fn annotation_ref(&self, id: AnnotationId) -> Result<ObjRef> {
        self.annotations.get(id).copied()
    }

    /// Create a checkbox field, placed on a page with [`Document::add_page`]
    pub fn create_checkbox(&mut self, checkbox: Checkbox) -> Result<FormWidgetId> {
        self.forms.get(checkbox.on)?;
        self.forms.get(checkbox.off)?;
        let r = self
            .store
            .allocate(ObjectRecord::CheckboxWidget(DelayedCheckbox {
                rect: checkbox.rect,
                on: checkbox.on,
                off: checkbox.off,
                name: checkbox.name,
                checked: checkbox.checked,
            }));
        let id = self.widgets.register(r);
        debug!("FormWidget {} at {} 0 R", id, r.id);
        Ok(id)
    }

    /// The widget annotation / field object
    pub fn form_widget_ref(&self, id: FormWidgetId) -> Result<ObjRef> {
        self.widgets.get(id).copied()
    }

    // Structure and pages

    /// Add a structure element below `parent`, or below the root
    pub fn add_structure_item(
        &mut self,
        kind: StructureType,
        parent: Option<StructureItemId>,
    ) -> Result<StructureItemId> {
        self.add_structure_item_with(kind, parent, StructureAttributes::default())
    }

    /// Add a structure element with a title, alternate text or language
    pub fn add_structure_item_with(
        &mut self,
        kind: StructureType,
        parent: Option<StructureItemId>,
        attributes: StructureAttributes,
    ) -> Result<StructureItemId> {
        if let Some(parent) = parent {
            if !self.structure.contains(parent) {
                return Err(Error::UnknownParent {
                    kind: StructureItemId::KIND,
                    id: parent.raw(),
                });
            }
        }
        let name = kind.name().to_owned();
        let obj = self.store.allocate(ObjectRecord::StructItem(DelayedStructItem {
            kind,
            parent,
            attributes,
        }));
        let id = self.structure.register(StructRecord { obj, parent });
        debug!("StructureItem {} /{} at {} 0 R", id, name, obj.id);
        Ok(id)
    }

    /// The structure element object
    pub fn structure_item_ref(&self, id: StructureItemId) -> Result<ObjRef> {
        Ok(self.structure.get(id)?.obj)
    }

    /// Add a page
    ///
    /// All widgets, annotations and structure items are checked before
    /// anything is changed: unknown ones fail with
    /// [`Error::UnknownResource`], ones already placed on a page (or listed
    /// twice) with [`Error::AlreadyUsed`].
    pub fn add_page(&mut self, page: PageContents) -> Result<PageId> {
        let id = self.pages.next_id();
        check_unused(&self.widgets, &self.widget_usage, &page.widgets, id)?;
        check_unused(
            &self.annotations,
            &self.annotation_usage,
            &page.annotations,
            id,
        )?;
        check_unused(
            &self.structure,
            &self.structure_usage,
            &page.structure,
            id,
        )?;

        for &w in &page.widgets {
            self.widget_usage.mark_used(w, id)?;
        }
        for &a in &page.annotations {
            self.annotation_usage.mark_used(a, id)?;
        }
        for &s in &page.structure {
            self.structure_usage.mark_used(s, id)?;
        }

        let struct_parents = if page.structure.is_empty() {
            None
        } else {
            let key = self.next_struct_parent;
            self.next_struct_parent += 1;
            Some(key)
        };

        let group = match self.page_group {
            Some(group) => group,
            None => {
                let group = self.store.allocate(ObjectRecord::object(&low::TransparencyGroup {
                    color_space: self.options.output_color_space.into(),
                })?);
                self.page_group = Some(group);
                group
            }
        };
        let resources = self.push_resources(page.resources);
        let contents = self.push_stream(&StreamMetadata::None, page.contents)?;
        let obj = self.store.allocate(ObjectRecord::Page(DelayedPage {
            page: id,
            resources,
            contents,
            group,
            widgets: page.widgets,
            annotations: page.annotations,
            struct_parents,
            transition: page.transition,
            boxes: page.boxes.unwrap_or(self.options.page_boxes),
        }));
        let registered = self.pages.register(PageRecord {
            obj,
            struct_parents,
            structure: page.structure,
        });
        debug!("Page {} at {} 0 R", registered, obj.id);
        Ok(registered)
    }

    /// The page object
    pub fn page_ref(&self, id: PageId) -> Result<ObjRef> {
        Ok(self.pages.get(id)?.obj)
    }

    /// Add an outline item that jumps to `page`
    pub fn add_outline(
        &mut self,
        title: &str,
        page: PageId,
        parent: Option<OutlineId>,
    ) -> Result<OutlineId> {
        self.pages.get(page)?;
        if let Some(parent) = parent {
            if !self.outlines.contains(parent) {
                return Err(Error::UnknownParent {
                    kind: OutlineId::KIND,
                    id: parent.raw(),
                });
            }
        }
        let id = self.outlines.register(OutlineEntry {
            title: title.to_owned(),
            page,
            parent,
        });
        debug!("Outline {} {:?}", id, title);
        Ok(id)
    }
}

fn check_unused<I: ResourceId, T>(
    registry: &Registry<I, T>,
    usage: &UsageMap<I>,
    ids: &[I],
    page: PageId,
) -> Result<()> {
    let mut seen = HashSet::with_capacity(ids.len());
    for &id in ids {
        registry.get(id)?;
        usage.check_unused(id)?;
        if !seen.insert(id) {
            return Err(Error::AlreadyUsed {
                kind: I::KIND,
                id: id.raw(),
                page: page.raw(),
            });
        }
    }
    Ok(())
}

/// Name of the `FontDescriptor` / `BaseFont` of a subset
pub(crate) fn subset_base_font(face: &dyn FontFace, key: SubsetKey) -> PdfNameBuf {
    PdfNameBuf(format!(
        "{}+{}",
        crate::util::subset_tag(key.font.raw(), key.subset),
        face.postscript_name()
    ))
}

#[cfg(test)]
mod tests {
    use super::{AnnotationKind, Checkbox, Document, FormXObject, PageContents, StructureType};
    use crate::{
        common::Rectangle,
        error::Error,
        id::{AnnotationId, FormWidgetId, StructureItemId},
        store::ObjectRecord,
    };

    fn form(doc: &mut Document) -> crate::id::FormXObjectId {
        doc.add_form_xobject(FormXObject {
            bbox: Rectangle::new(0.0, 0.0, 10.0, 10.0),
            matrix: None,
            resources: Vec::new(),
            contents: b"0 0 10 10 re f".to_vec(),
        })
        .unwrap()
    }

    #[test]
    fn test_widget_on_two_pages() {
        let mut doc = Document::new();
        let on = form(&mut doc);
        let off = form(&mut doc);
        let widget = doc
            .create_checkbox(Checkbox {
                rect: Rectangle::new(10.0, 10.0, 20.0, 20.0),
                on,
                off,
                name: "agree".into(),
                checked: false,
            })
            .unwrap();
        doc.add_page(PageContents {
            widgets: vec![widget],
            ..Default::default()
        })
        .unwrap();
        let len = doc.store().len();
        let err = doc
            .add_page(PageContents {
                widgets: vec![widget],
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyUsed { page: 0, .. }));
        assert_eq!(doc.page_count(), 1);
        assert_eq!(doc.store().len(), len);

        let first = doc.page_ref(crate::id::PageId::new(0)).unwrap();
        match doc.store().get(first) {
            Some(ObjectRecord::Page(p)) => assert_eq!(p.widgets, vec![widget]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_failed_page_does_not_mark_anything() {
        let mut doc = Document::new();
        let a = doc
            .create_annotation(
                Rectangle::new(0.0, 0.0, 5.0, 5.0),
                AnnotationKind::Link {
                    uri: "https://example.org".into(),
                },
            )
            .unwrap();
        let err = doc
            .add_page(PageContents {
                annotations: vec![a],
                widgets: vec![FormWidgetId::new(3)],
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, Error::UnknownResource { kind: "FormWidget", id: 3 }));
        doc.add_page(PageContents {
            annotations: vec![a],
            ..Default::default()
        })
        .unwrap();
    }

    #[test]
    fn test_duplicate_within_page() {
        let mut doc = Document::new();
        let a = doc
            .create_annotation(
                Rectangle::new(0.0, 0.0, 5.0, 5.0),
                AnnotationKind::Text {
                    contents: "note".into(),
                    open: false,
                },
            )
            .unwrap();
        let err = doc
            .add_page(PageContents {
                annotations: vec![a, a],
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyUsed { kind: "Annotation", .. }));
        assert_eq!(doc.page_count(), 0);
        doc.add_page(PageContents {
            annotations: vec![a],
            ..Default::default()
        })
        .unwrap();
        assert!(doc.annotation_ref(AnnotationId::new(1)).is_err());
    }

    #[test]
    fn test_structure_parent_must_exist() {
        let mut doc = Document::new();
        let root = doc.add_structure_item(StructureType::Document, None).unwrap();
        doc.add_structure_item(StructureType::P, Some(root)).unwrap();
        let err = doc
            .add_structure_item(StructureType::P, Some(StructureItemId::new(9)))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownParent { id: 9, .. }));
    }

    #[test]
    fn test_outline_parent_must_exist() {
        let mut doc = Document::new();
        let page = doc.add_page(PageContents::default()).unwrap();
        let top = doc.add_outline("Intro", page, None).unwrap();
        doc.add_outline("Detail", page, Some(top)).unwrap();
        assert!(matches!(
            doc.add_outline("Lost", page, Some(crate::id::OutlineId::new(5))),
            Err(Error::UnknownParent { kind: "Outline", .. })
        ));
    }
}
