//! Writing the document
//!
//! Finalization adds the document-level objects (page tree, outline,
//! structure tree, name trees, output intent, info and catalog) to the
//! store, writes every slot in ascending order and closes the file with the
//! cross-reference table and the trailer.

use std::{
    collections::HashMap,
    fs::{self, File},
    io::{BufWriter, Write},
    path::Path,
};

use log::{info, warn};

use crate::{
    common::{NameTree, NumberTree, ObjRef, OutputIntent, PdfString},
    error::Result,
    high::Document,
    id::OutlineId,
    low::{self, Destination, OutlineItem, ID},
    lowering::Lowering,
    store::ObjectRecord,
    write::{Formatter, Serialize},
};

impl Document {
    /// Write the PDF to `w`
    ///
    /// Objects appear in ascending order and are never renumbered, so every
    /// reference handed out while building stays valid.
    pub fn finalize<W: Write>(mut self, mut w: W) -> Result<()> {
        let pages_root = self.store.reserve();
        let outline = self.lower_outline()?;
        let struct_root = self.lower_structure()?;
        let names = self.lower_names()?;
        let output_intents = self.lower_output_intent()?;

        let fields: Vec<ObjRef> = self
            .widgets
            .iter()
            .filter(|(id, _)| self.widget_usage.page_of(*id).is_some())
            .map(|(_, r)| *r)
            .collect();
        let acro_form = if fields.is_empty() {
            None
        } else {
            Some(low::AcroForm { fields })
        };

        let info_ref = self.store.allocate(ObjectRecord::object(&self.info)?);
        let catalog = low::Catalog {
            pages: pages_root,
            outline,
            struct_tree_root: struct_root,
            names,
            acro_form,
            output_intents,
            lang: self.options.lang.as_deref().map(PdfString::text),
        };
        let catalog_ref = self.store.allocate(ObjectRecord::object(&catalog)?);

        let kids = self.pages.iter().map(|(_, p)| p.obj).collect();
        self.store
            .fill(pages_root, ObjectRecord::object(&low::Pages { kids })?);

        let mut fmt = Formatter::new(&mut w);
        writeln!(fmt.inner, "%PDF-1.7")?;
        fmt.inner.write_all(&[b'%', 180, 200, 220, 240, b'\n'])?;

        let lowering = Lowering::new(&self, pages_root, struct_root)?;
        for (r, record) in self.store.iter() {
            lowering.write_record(&mut fmt, r, record)?;
        }

        let startxref = fmt.xref()?;
        let id = self.compute_id(&fmt);

        writeln!(fmt.inner, "trailer")?;
        let trailer = low::Trailer {
            size: fmt.xref_len(),
            info: Some(info_ref),
            root: catalog_ref,
            id,
        };
        trailer.write(&mut fmt)?;
        writeln!(fmt.inner)?;

        writeln!(fmt.inner, "startxref")?;
        writeln!(fmt.inner, "{}", startxref)?;
        writeln!(fmt.inner, "%%EOF")?;
        let size = fmt.offset();
        drop(fmt);
        w.flush()?;

        info!(
            "Wrote {} objects, {} pages, {} bytes",
            self.store.len(),
            self.pages.len(),
            size
        );
        Ok(())
    }

    /// Write the PDF to a file, removing the partial file on error
    pub fn finalize_to_path(self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let result = self.finalize(BufWriter::new(file));
        if result.is_err() {
            if let Err(e) = fs::remove_file(path) {
                warn!("Could not remove {}: {}", path.display(), e);
            }
        }
        result
    }

    fn compute_id(&self, fmt: &Formatter) -> ID {
        let mut id_ctx = md5::Context::new();

        // - The current time
        let now = chrono::Local::now().to_string();
        id_ctx.consume(now);

        // - The size of the file in bytes
        let len = fmt.offset();
        id_ctx.consume(len.to_ne_bytes());

        // - The number of objects
        id_ctx.consume(self.store.len().to_ne_bytes());

        // - The values of all entries in the document information dictionary
        self.info.digest_into(&mut id_ctx);

        let digest = id_ctx.compute();
        ID {
            original: digest,
            current: digest,
        }
    }

    fn lower_outline(&mut self) -> Result<Option<ObjRef>> {
        if self.outlines.is_empty() {
            return Ok(None);
        }
        let root = self.store.reserve();
        let refs: HashMap<OutlineId, ObjRef> = self
            .outlines
            .iter()
            .map(|(id, _)| id)
            .collect::<Vec<_>>()
            .into_iter()
            .map(|id| (id, self.store.reserve()))
            .collect();

        let mut children: HashMap<Option<OutlineId>, Vec<OutlineId>> = HashMap::new();
        for (id, entry) in self.outlines.iter() {
            children.entry(entry.parent).or_default().push(id);
        }

        let mut records = Vec::with_capacity(refs.len());
        for siblings in children.values() {
            for (i, id) in siblings.iter().enumerate() {
                let entry = self.outlines.get(*id)?;
                let parent = match entry.parent {
                    Some(p) => refs[&p],
                    None => root,
                };
                let own = children.get(&Some(*id));
                let item = OutlineItem {
                    title: PdfString::text(&entry.title),
                    parent,
                    prev: i.checked_sub(1).map(|j| refs[&siblings[j]]),
                    next: siblings.get(i + 1).map(|n| refs[n]),
                    first: own.and_then(|c| c.first()).map(|c| refs[c]),
                    last: own.and_then(|c| c.last()).map(|c| refs[c]),
                    count: descendants(&children, *id),
                    dest: Destination::PageXYZ(self.pages.get(entry.page)?.obj),
                };
                records.push((refs[id], ObjectRecord::object(&item)?));
            }
        }
        for (r, record) in records {
            self.store.fill(r, record);
        }

        let top = children.get(&None).map(Vec::as_slice).unwrap_or(&[]);
        let (Some(first), Some(last)) = (top.first(), top.last()) else {
            return Ok(None);
        };
        let outline = low::Outline {
            first: refs[first],
            last: refs[last],
            count: refs.len(),
        };
        self.store.fill(root, ObjectRecord::object(&outline)?);
        Ok(Some(root))
    }

    fn lower_structure(&mut self) -> Result<Option<ObjRef>> {
        if self.structure.is_empty() && !self.options.tagged {
            return Ok(None);
        }
        let root = self.store.reserve();

        let mut parent_tree = NumberTree::new();
        for (_, page) in self.pages.iter() {
            if let Some(key) = page.struct_parents {
                let items = page
                    .structure
                    .iter()
                    .map(|&s| self.structure.get(s).map(|item| item.obj))
                    .collect::<Result<Vec<_>>>()?;
                parent_tree.insert(key, items);
            }
        }
        let next_key = parent_tree.next_key();
        let parent_tree = self.store.allocate(ObjectRecord::object(&parent_tree)?);

        let kids = self
            .structure
            .iter()
            .filter(|(_, item)| item.parent.is_none())
            .map(|(_, item)| item.obj)
            .collect();
        self.store.fill(
            root,
            ObjectRecord::object(&low::StructTreeRoot {
                kids,
                parent_tree,
                parent_tree_next_key: next_key,
            })?,
        );
        Ok(Some(root))
    }

    fn lower_names(&mut self) -> Result<Option<low::Names>> {
        if self.embedded_files.is_empty() {
            return Ok(None);
        }
        let mut tree = NameTree::default();
        let mut seen: HashMap<&str, usize> = HashMap::new();
        for (_, file) in self.embedded_files.iter() {
            let n = seen.entry(file.name.as_str()).or_default();
            let key = if *n == 0 {
                file.name.clone()
            } else {
                format!("{} ({})", file.name, n)
            };
            *n += 1;
            tree.insert(PdfString::text(&key), file.filespec);
        }
        let r = self.store.allocate(ObjectRecord::object(&tree)?);
        Ok(Some(low::Names {
            embedded_files: Some(r),
        }))
    }

    fn lower_output_intent(&mut self) -> Result<Vec<ObjRef>> {
        let Some(intent) = &self.output_intent else {
            return Ok(Vec::new());
        };
        let profile = match intent.profile {
            Some(icc) => Some(self.colors.icc_stream_ref(icc)?),
            None => None,
        };
        let low = OutputIntent {
            subtype: intent.subtype,
            output_condition: intent.condition.as_deref().map(PdfString::text),
            output_condition_identifier: PdfString::text(&intent.identifier),
            registry_name: None,
            dest_output_profile: profile,
        };
        let record = ObjectRecord::object(&low)?;
        Ok(vec![self.store.allocate(record)])
    }
}

fn descendants(children: &HashMap<Option<OutlineId>, Vec<OutlineId>>, id: OutlineId) -> usize {
    children
        .get(&Some(id))
        .map_or(0, |c| c.iter().map(|&k| 1 + descendants(children, k)).sum())
}
