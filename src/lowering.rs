//! Deferred records to PDF objects
//!
//! Records that point at pages, subsets or structure items are completed
//! here, once the whole document is known.

use std::collections::HashMap;

use log::warn;

use crate::{
    cmap::ToUnicodeCMap,
    common::{
        CidSystemInfo, FontDescriptor, ObjRef, PdfString, Point, Rectangle, StreamMetadata,
    },
    error::{Error, Result},
    high::{subset_base_font, AnnotationKind, Document, FontRecord, SubsetObjects},
    id::{FontId, ResourceId, StructureItemId},
    low::{
        Annotation, AnnotationBody, AnnotationFlags, CidFont, FlateStream, Page, RawObject,
        StructElem, StructKid, Type0Font,
    },
    store::{
        DelayedAnnotation, DelayedCheckbox, DelayedPage, DelayedStructItem, ObjectRecord,
        SubsetKey,
    },
    subset::Subset,
    write::{entries_to_bytes, Formatter, Null, Serialize, ToDict},
};

/// Everything needed to resolve the deferred records of a document
pub(crate) struct Lowering<'d> {
    doc: &'d Document,
    pages_root: ObjRef,
    struct_root: Option<ObjRef>,
    /// page object of each widget / annotation, by object number
    placed_on: HashMap<u64, ObjRef>,
    struct_ids: HashMap<u64, StructureItemId>,
    struct_kids: HashMap<StructureItemId, Vec<StructKid>>,
    struct_pages: HashMap<StructureItemId, ObjRef>,
}

impl<'d> Lowering<'d> {
    pub fn new(doc: &'d Document, pages_root: ObjRef, struct_root: Option<ObjRef>) -> Result<Self> {
        let mut placed_on = HashMap::new();
        for (_, record) in doc.store.iter() {
            if let ObjectRecord::Page(page) = record {
                let page_obj = doc.pages.get(page.page)?.obj;
                for &w in &page.widgets {
                    placed_on.insert(doc.widgets.get(w)?.id, page_obj);
                }
                for &a in &page.annotations {
                    placed_on.insert(doc.annotations.get(a)?.id, page_obj);
                }
            }
        }

        let mut struct_ids = HashMap::new();
        let mut struct_kids: HashMap<StructureItemId, Vec<StructKid>> = HashMap::new();
        for (id, item) in doc.structure.iter() {
            struct_ids.insert(item.obj.id, id);
            if let Some(parent) = item.parent {
                struct_kids
                    .entry(parent)
                    .or_default()
                    .push(StructKid::Elem(item.obj));
            }
        }
        let mut struct_pages = HashMap::new();
        for (_, page) in doc.pages.iter() {
            for (mcid, &item) in page.structure.iter().enumerate() {
                struct_kids.entry(item).or_default().push(StructKid::Mcid(mcid));
                struct_pages.insert(item, page.obj);
            }
        }

        Ok(Self {
            doc,
            pages_root,
            struct_root,
            placed_on,
            struct_ids,
            struct_kids,
            struct_pages,
        })
    }

    fn stream(&self, f: &mut Formatter, r: ObjRef, meta: &dyn ToDict, data: &[u8]) -> Result<()> {
        let entries = entries_to_bytes(meta)?;
        if self.doc.options.compress {
            f.obj(r, &FlateStream {
                entries: &entries,
                data,
            })?;
        } else {
            let record = ObjectRecord::raw_stream(meta, None, data.to_vec())?;
            self.write_record(f, r, &record)?;
        }
        Ok(())
    }

    fn subset(&self, key: SubsetKey) -> Result<(&'d FontRecord, &'d Subset, SubsetObjects)> {
        let font = self.doc.fonts.get(key.font)?;
        let missing = || Error::UnknownResource {
            kind: FontId::KIND,
            id: key.font.raw(),
        };
        let subset = font.subsetter.subset(key.subset).ok_or_else(missing)?;
        let objects = *font.subsets.get(key.subset).ok_or_else(missing)?;
        Ok((font, subset, objects))
    }

    /// Write one slot of the object store
    pub fn write_record(&self, f: &mut Formatter, r: ObjRef, record: &ObjectRecord) -> Result<()> {
        match record {
            ObjectRecord::Placeholder => {
                warn!("{} 0 R was reserved but never filled", r.id);
                f.obj(r, &Null)?;
            }
            ObjectRecord::Final { dict, stream } => {
                f.obj(r, &RawObject {
                    dict,
                    stream: stream.as_deref(),
                })?;
            }
            ObjectRecord::Deflate { entries, stream } => {
                f.obj(r, &FlateStream {
                    entries,
                    data: stream,
                })?;
            }
            ObjectRecord::SubsetFontData(key) => {
                let (font, subset, _) = self.subset(*key)?;
                let program = font.face.subset(subset.glyphs()).map_err(|e| {
                    Error::load(
                        format!("subset {} of {}", key.subset, font.face.postscript_name()),
                        e,
                    )
                })?;
                let meta = StreamMetadata::FontFile2 {
                    length1: program.len(),
                };
                self.stream(f, r, &meta, &program)?;
            }
            ObjectRecord::SubsetFontDescriptor(key) => {
                let (font, _, objects) = self.subset(*key)?;
                f.obj(r, &font_descriptor(font, *key, objects.data))?;
            }
            ObjectRecord::SubsetCMap(key) => {
                let (_, subset, _) = self.subset(*key)?;
                let cmap = ToUnicodeCMap::from_codes((0..subset.len()).map(|p| subset.unicode(p)));
                self.stream(f, r, &StreamMetadata::None, &cmap.to_bytes())?;
            }
            ObjectRecord::SubsetCidFont(key) => {
                let (font, subset, objects) = self.subset(*key)?;
                let metrics = font.face.metrics();
                let widths: Vec<u32> = subset
                    .padded_glyphs(font.subsetter.capacity())
                    .map(|glyph| {
                        glyph
                            .and_then(|g| font.face.advance_width(g))
                            .map_or(0, |w| metrics.scale(w.into()).max(0) as u32)
                    })
                    .collect();
                let base_font = subset_base_font(font.face.as_ref(), *key);
                f.obj(r, &CidFont {
                    base_font: &base_font,
                    system_info: CidSystemInfo::identity(),
                    font_descriptor: objects.descriptor,
                    widths: &widths,
                })?;
            }
            ObjectRecord::SubsetFont(key) => {
                let (font, _, objects) = self.subset(*key)?;
                let encoding = self.doc.encoding_cmap.ok_or(Error::UnknownResource {
                    kind: FontId::KIND,
                    id: key.font.raw(),
                })?;
                let base_font = subset_base_font(font.face.as_ref(), *key);
                f.obj(r, &Type0Font {
                    base_font: &base_font,
                    encoding,
                    descendant: objects.cid_font,
                    to_unicode: objects.cmap,
                })?;
            }
            ObjectRecord::Page(page) => self.write_page(f, r, page)?,
            ObjectRecord::CheckboxWidget(checkbox) => self.write_checkbox(f, r, checkbox)?,
            ObjectRecord::Annotation(annot) => self.write_annotation(f, r, annot)?,
            ObjectRecord::StructItem(item) => self.write_struct_item(f, r, item)?,
        }
        Ok(())
    }

    fn write_page(&self, f: &mut Formatter, r: ObjRef, page: &DelayedPage) -> Result<()> {
        let mut annots = Vec::with_capacity(page.widgets.len() + page.annotations.len());
        for &w in &page.widgets {
            annots.push(*self.doc.widgets.get(w)?);
        }
        for &a in &page.annotations {
            annots.push(*self.doc.annotations.get(a)?);
        }
        let transition = page.transition.as_ref().map(|t| t as &dyn Serialize);
        f.obj(r, &Page {
            parent: self.pages_root,
            contents: page.contents,
            resources: page.resources,
            group: page.group,
            boxes: &page.boxes,
            annots,
            struct_parents: page.struct_parents,
            transition,
        })?;
        Ok(())
    }

    fn page_of(&self, r: ObjRef, what: &str) -> Option<ObjRef> {
        let page = self.placed_on.get(&r.id).copied();
        if page.is_none() {
            warn!("{} {} 0 R is not placed on any page", what, r.id);
        }
        page
    }

    fn write_checkbox(&self, f: &mut Formatter, r: ObjRef, checkbox: &DelayedCheckbox) -> Result<()> {
        let name = PdfString::text(&checkbox.name);
        f.obj(r, &Annotation {
            rect: checkbox.rect,
            page: self.page_of(r, "Checkbox"),
            color: None,
            flags: AnnotationFlags::PRINT,
            struct_parent: None,
            body: AnnotationBody::Checkbox {
                name: &name,
                on: *self.doc.forms.get(checkbox.on)?,
                off: *self.doc.forms.get(checkbox.off)?,
                checked: checkbox.checked,
            },
        })?;
        Ok(())
    }

    fn write_annotation(&self, f: &mut Formatter, r: ObjRef, annot: &DelayedAnnotation) -> Result<()> {
        let color = annot
            .color
            .map(|c| self.doc.colors.to_output(c).components().to_vec());
        let text;
        let uri;
        let description;
        let body = match &annot.kind {
            AnnotationKind::Text { contents, open } => {
                text = PdfString::text(contents);
                AnnotationBody::Text {
                    contents: &text,
                    icon: "Note",
                    open: *open,
                }
            }
            AnnotationKind::FileAttachment { file, description: desc } => {
                description = desc.as_deref().map(PdfString::text);
                AnnotationBody::FileAttachment {
                    file_spec: self.doc.embedded_files.get(*file)?.filespec,
                    contents: description.as_ref(),
                    icon: "PushPin",
                }
            }
            AnnotationKind::Link { uri: target } => {
                uri = PdfString::new(target.as_bytes());
                AnnotationBody::Link { uri: &uri }
            }
        };
        f.obj(r, &Annotation {
            rect: annot.rect,
            page: self.page_of(r, annot.kind.subtype()),
            color,
            flags: AnnotationFlags::PRINT,
            struct_parent: None,
            body,
        })?;
        Ok(())
    }

    fn write_struct_item(&self, f: &mut Formatter, r: ObjRef, item: &DelayedStructItem) -> Result<()> {
        let id = self
            .struct_ids
            .get(&r.id)
            .copied()
            .ok_or(Error::UnknownResource {
                kind: StructureItemId::KIND,
                id: r.id as u32,
            })?;
        let parent = match (item.parent, self.struct_root) {
            (Some(parent), _) => self.doc.structure.get(parent)?.obj,
            (None, Some(root)) => root,
            (None, None) => {
                return Err(Error::UnknownParent {
                    kind: StructureItemId::KIND,
                    id: id.raw(),
                })
            }
        };
        let attrs = &item.attributes;
        let title = attrs.title.as_deref().map(PdfString::text);
        let alt = attrs.alt.as_deref().map(PdfString::text);
        let actual_text = attrs.actual_text.as_deref().map(PdfString::text);
        let lang = attrs.lang.as_deref().map(PdfString::text);
        f.obj(r, &StructElem {
            kind: item.kind.name(),
            parent,
            page: self.struct_pages.get(&id).copied(),
            kids: self.struct_kids.get(&id).cloned().unwrap_or_default(),
            title: title.as_ref(),
            alt: alt.as_ref(),
            actual_text: actual_text.as_ref(),
            lang: lang.as_ref(),
        })?;
        Ok(())
    }
}

fn font_descriptor(font: &FontRecord, key: SubsetKey, data: ObjRef) -> FontDescriptor {
    let m = font.face.metrics();
    let bbox = Rectangle {
        ll: Point {
            x: m.scale(m.bbox.ll.x),
            y: m.scale(m.bbox.ll.y),
        },
        ur: Point {
            x: m.scale(m.bbox.ur.x),
            y: m.scale(m.bbox.ur.y),
        },
    };
    FontDescriptor {
        font_name: subset_base_font(font.face.as_ref(), key),
        flags: m.flags,
        font_bbox: bbox,
        italic_angle: m.italic_angle,
        ascent: m.scale(m.ascender.into()),
        descent: m.scale(m.descender.into()),
        cap_height: m.scale(m.cap_height.unwrap_or(m.ascender).into()),
        stem_v: 80,
        font_file2: Some(data),
    }
}
