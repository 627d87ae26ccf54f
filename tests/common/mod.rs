#![allow(dead_code)]

use lopdf::{Dictionary, Object, ObjectId};
use pdf_forge::{
    common::{FontFlags, Point, Rectangle},
    error::LoadError,
    font::{FontFace, FontMetrics, GlyphId},
};

/// A face that maps every BMP codepoint to the glyph with the same number
pub struct SyntheticFace;

pub const SYNTHETIC_NAME: &str = "Synthetic-Regular";

impl FontFace for SyntheticFace {
    fn postscript_name(&self) -> String {
        SYNTHETIC_NAME.to_owned()
    }

    fn glyph_index(&self, chr: char) -> Option<GlyphId> {
        u16::try_from(u32::from(chr)).ok().map(GlyphId)
    }

    fn advance_width(&self, _glyph: GlyphId) -> Option<u16> {
        Some(500)
    }

    fn metrics(&self) -> FontMetrics {
        FontMetrics {
            units_per_em: 1000,
            ascender: 800,
            descender: -200,
            cap_height: Some(700),
            bbox: Rectangle {
                ll: Point { x: -50, y: -200 },
                ur: Point { x: 950, y: 800 },
            },
            italic_angle: 0.0,
            flags: FontFlags::SYMBOLIC,
        }
    }

    fn subset(&self, glyphs: &[GlyphId]) -> Result<Vec<u8>, LoadError> {
        Ok(synthetic_program(glyphs))
    }
}

/// The bytes [`SyntheticFace`] produces for a subset
pub fn synthetic_program(glyphs: &[GlyphId]) -> Vec<u8> {
    let mut out = b"SYNTHETIC".to_vec();
    for g in glyphs {
        out.extend_from_slice(&g.0.to_be_bytes());
    }
    out
}

pub fn init_log() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn parse(bytes: &[u8]) -> lopdf::Document {
    lopdf::Document::load_mem(bytes).unwrap()
}

pub fn oid(r: pdf_forge::common::ObjRef) -> ObjectId {
    (r.id as u32, r.gen)
}

pub fn number(obj: &Object) -> f64 {
    match obj {
        Object::Integer(i) => *i as f64,
        Object::Real(r) => *r as f64,
        other => panic!("not a number: {:?}", other),
    }
}

pub fn dict<'a>(doc: &'a lopdf::Document, id: ObjectId) -> &'a Dictionary {
    match doc.get_object(id).unwrap() {
        Object::Dictionary(d) => d,
        Object::Stream(s) => &s.dict,
        other => panic!("not a dictionary: {:?}", other),
    }
}

pub fn get<'a>(d: &'a Dictionary, key: &str) -> &'a Object {
    d.get(key.as_bytes())
        .unwrap_or_else(|_| panic!("missing /{}", key))
}

pub fn name(obj: &Object) -> &[u8] {
    match obj {
        Object::Name(n) => n,
        other => panic!("not a name: {:?}", other),
    }
}

pub fn string(obj: &Object) -> &[u8] {
    match obj {
        Object::String(s, _) => s,
        other => panic!("not a string: {:?}", other),
    }
}

pub fn reference(obj: &Object) -> ObjectId {
    match obj {
        Object::Reference(r) => *r,
        other => panic!("not a reference: {:?}", other),
    }
}

pub fn array(obj: &Object) -> &[Object] {
    match obj {
        Object::Array(a) => a,
        other => panic!("not an array: {:?}", other),
    }
}

/// Follow a reference, or return a direct dictionary
pub fn resolve_dict<'a>(doc: &'a lopdf::Document, obj: &'a Object) -> &'a Dictionary {
    match obj {
        Object::Reference(r) => dict(doc, *r),
        Object::Dictionary(d) => d,
        other => panic!("not a dictionary: {:?}", other),
    }
}

/// Decoded data of a stream object
pub fn stream_data(doc: &lopdf::Document, id: ObjectId) -> Vec<u8> {
    match doc.get_object(id).unwrap() {
        Object::Stream(s) => {
            if s.dict.get(b"Filter").is_ok() {
                s.decompressed_content().unwrap()
            } else {
                s.content.clone()
            }
        }
        other => panic!("not a stream: {:?}", other),
    }
}

pub fn catalog(doc: &lopdf::Document) -> &Dictionary {
    let root = reference(doc.trailer.get(b"Root").unwrap());
    dict(doc, root)
}

/// Byte offsets of all `n 0 obj` lines, by object number
pub fn scan_objects(bytes: &[u8]) -> Vec<(u32, usize)> {
    let mut found = Vec::new();
    let mut start = 0;
    while start < bytes.len() {
        let end = bytes[start..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(bytes.len(), |p| start + p);
        let line = &bytes[start..end];
        if let Some(head) = line.strip_suffix(b" 0 obj") {
            if !head.is_empty() && head.iter().all(u8::is_ascii_digit) {
                let n: u32 = std::str::from_utf8(head).unwrap().parse().unwrap();
                found.push((n, start));
            }
        }
        start = end + 1;
    }
    found
}

/// Lines of the last xref section as `(offset, generation, kind)`
pub fn xref_entries(bytes: &[u8]) -> Vec<(usize, u16, u8)> {
    let text = String::from_utf8_lossy(bytes);
    let pos = text.rfind("startxref\n").unwrap();
    let offset: usize = text[pos + 10..].lines().next().unwrap().parse().unwrap();
    assert!(bytes[offset..].starts_with(b"xref\n"));

    let mut cursor = offset + 5;
    let header_end = cursor + bytes[cursor..].iter().position(|&b| b == b'\n').unwrap();
    let header = std::str::from_utf8(&bytes[cursor..header_end]).unwrap();
    let mut parts = header.split(' ');
    assert_eq!(parts.next(), Some("0"));
    let count: usize = parts.next().unwrap().parse().unwrap();
    cursor = header_end + 1;

    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        let line = &bytes[cursor..cursor + 20];
        assert_eq!(&line[18..], b" \n");
        let text = std::str::from_utf8(&line[..18]).unwrap();
        let offset = text[..10].parse().unwrap();
        let gen = text[11..16].parse().unwrap();
        entries.push((offset, gen, line[17]));
        cursor += 20;
    }
    entries
}
