mod common;

use common::{
    array, dict, get, name, number, oid, parse, reference, resolve_dict, stream_data,
    synthetic_program, SyntheticFace, SYNTHETIC_NAME,
};
use pdf_forge::{
    font::{BuiltinFont, FontFace, GlyphId, TrueTypeFace},
    high::PageContents,
    options::DocumentOptions,
    subset::SubsetGlyph,
    Document, Error,
};

#[test]
fn glyphs_overflow_into_a_second_subset() {
    let mut doc = Document::new();
    let font = doc.add_font(Box::new(SyntheticFace));

    let chars: Vec<char> = (0x41u32..0x41 + 300).filter_map(char::from_u32).collect();
    assert_eq!(chars.len(), 300);
    let mut slots = Vec::new();
    for &c in &chars {
        slots.push(doc.get_subset_glyph(font, c).unwrap());
    }
    assert_eq!(slots[0], SubsetGlyph { subset: 0, position: 0 });
    assert_eq!(slots[254], SubsetGlyph { subset: 0, position: 254 });
    assert_eq!(slots[255], SubsetGlyph { subset: 1, position: 0 });
    assert_eq!(slots[299], SubsetGlyph { subset: 1, position: 44 });
    assert_eq!(doc.get_subset_glyph(font, 'A').unwrap(), slots[0]);
    assert_eq!(doc.font_subset_count(font).unwrap(), 2);
    assert_eq!(doc.advance_width(font, 'A').unwrap(), 500.0);

    let first = doc.subset_font_ref(font, 0).unwrap();
    let second = doc.subset_font_ref(font, 1).unwrap();
    assert!(doc.subset_font_ref(font, 2).is_err());
    doc.add_page(PageContents {
        resources: format!(
            "<< /Font << /F0 {} 0 R /F1 {} 0 R >> >>",
            first.id, second.id
        )
        .into_bytes(),
        contents: b"BT /F0 12 Tf <00> Tj /F1 12 Tf <00> Tj ET".to_vec(),
        ..Default::default()
    })
    .unwrap();

    let mut out = Vec::new();
    doc.finalize(&mut out).unwrap();
    let pdf = parse(&out);

    for (index, font_ref) in [first, second].into_iter().enumerate() {
        let type0 = dict(&pdf, oid(font_ref));
        assert_eq!(name(get(type0, "Subtype")), b"Type0");
        let base = name(get(type0, "BaseFont"));
        let base = std::str::from_utf8(base).unwrap();
        let (tag, rest) = base.split_once('+').unwrap();
        assert_eq!(tag.len(), 6);
        assert!(tag.bytes().all(|b| b.is_ascii_uppercase()));
        assert_eq!(rest, SYNTHETIC_NAME);

        let encoding = reference(get(type0, "Encoding"));
        let cmap = String::from_utf8(stream_data(&pdf, encoding)).unwrap();
        assert!(cmap.contains("<00> <FE> 1"));

        let descendants = array(get(type0, "DescendantFonts"));
        let cid = dict(&pdf, reference(&descendants[0]));
        assert_eq!(name(get(cid, "Subtype")), b"CIDFontType2");
        assert_eq!(name(get(cid, "CIDToGIDMap")), b"Identity");
        let w = array(get(cid, "W"));
        assert_eq!(number(&w[0]), 1.0);
        let widths: Vec<f64> = array(&w[1]).iter().map(number).collect();
        assert_eq!(widths.len(), 255);
        let used = if index == 0 { 255 } else { 45 };
        assert!(widths[..used].iter().all(|&w| w == 500.0));
        assert!(widths[used..].iter().all(|&w| w == 0.0));

        let descriptor = resolve_dict(&pdf, get(cid, "FontDescriptor"));
        assert_eq!(name(get(descriptor, "FontName")), base.as_bytes());
        assert_eq!(number(get(descriptor, "Ascent")), 800.0);
        let program = stream_data(&pdf, reference(get(descriptor, "FontFile2")));
        let glyphs: Vec<GlyphId> = chars[index * 255..(index * 255 + used)]
            .iter()
            .map(|&c| GlyphId(c as u16))
            .collect();
        assert_eq!(program, synthetic_program(&glyphs));

        let to_unicode = reference(get(type0, "ToUnicode"));
        let cmap = String::from_utf8(stream_data(&pdf, to_unicode)).unwrap();
        assert!(!cmap.contains("beginbfchar"));
        if index == 0 {
            assert!(cmap.contains("2 beginbfrange\n<00> <BE> <0041>\n<BF> <FE> <0100>\n"));
        } else {
            assert!(cmap.contains("1 beginbfrange\n<00> <2C> <0140>\n"));
        }
    }
}

#[test]
fn subsets_share_one_encoding() {
    let mut doc = Document::with_options(DocumentOptions {
        subset_capacity: 4,
        ..Default::default()
    });
    let font = doc.add_font(Box::new(SyntheticFace));
    for c in "abcdefghij".chars() {
        doc.get_subset_glyph(font, c).unwrap();
    }
    assert_eq!(doc.font_subset_count(font).unwrap(), 3);
    let refs: Vec<_> = (0..3).map(|i| doc.subset_font_ref(font, i).unwrap()).collect();
    assert!(refs.windows(2).all(|w| w[0].id < w[1].id));

    let mut out = Vec::new();
    doc.finalize(&mut out).unwrap();
    let pdf = parse(&out);
    let encodings: Vec<_> = refs
        .iter()
        .map(|&r| reference(get(dict(&pdf, oid(r)), "Encoding")))
        .collect();
    assert!(encodings.iter().all(|&e| e == encodings[0]));
    let cmap = String::from_utf8(stream_data(&pdf, encodings[0])).unwrap();
    assert!(cmap.contains("<00> <03> 1"));

    let cid = dict(&pdf, reference(&array(get(dict(&pdf, oid(refs[2])), "DescendantFonts"))[0]));
    let widths: Vec<f64> = array(&array(get(cid, "W"))[1]).iter().map(number).collect();
    assert_eq!(widths, vec![500.0, 500.0, 0.0, 0.0]);
}

#[test]
fn subset_tags_stay_distinct_past_256_subsets() {
    let mut doc = Document::with_options(DocumentOptions {
        subset_capacity: 1,
        ..Default::default()
    });
    let font = doc.add_font(Box::new(SyntheticFace));
    for c in (0x100u32..0x100 + 257).filter_map(char::from_u32) {
        doc.get_subset_glyph(font, c).unwrap();
    }
    assert_eq!(doc.font_subset_count(font).unwrap(), 257);
    let refs: Vec<_> = [0, 1, 256]
        .iter()
        .map(|&i| doc.subset_font_ref(font, i).unwrap())
        .collect();

    let mut out = Vec::new();
    doc.finalize(&mut out).unwrap();
    let pdf = parse(&out);
    let names: Vec<Vec<u8>> = refs
        .iter()
        .map(|&r| name(get(dict(&pdf, oid(r)), "BaseFont")).to_vec())
        .collect();
    assert_ne!(names[0], names[2]);
    assert_ne!(names[0], names[1]);
    assert_ne!(names[1], names[2]);
}

#[test]
fn missing_glyphs() {
    let mut doc = Document::new();
    let font = doc.add_font(Box::new(SyntheticFace));
    assert!(matches!(
        doc.get_subset_glyph(font, '\u{1F600}'),
        Err(Error::GlyphNotFound {
            font: 0,
            codepoint: 0x1F600
        })
    ));
    assert!(matches!(
        doc.get_subset_glyph_id(font, GlyphId(0), None),
        Err(Error::GlyphNotFound { .. })
    ));
    assert!(matches!(
        doc.get_subset_glyph(pdf_forge::id::FontId::new(7), 'a'),
        Err(Error::UnknownResource { kind: "Font", id: 7 })
    ));
    assert_eq!(doc.font_subset_count(font).unwrap(), 0);
    assert!(doc.store().is_empty());
}

#[test]
fn missing_font_file() {
    let mut doc = Document::new();
    let err = doc
        .load_font(std::path::Path::new("/nonexistent/font.ttf"))
        .unwrap_err();
    match err {
        Error::ResourceLoad { what, .. } => assert!(what.contains("font.ttf")),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn builtin_fonts_are_written_once() {
    let mut doc = Document::new();
    let helv = doc.get_builtin_font_id(BuiltinFont::Helvetica).unwrap();
    let times = doc.get_builtin_font_id(BuiltinFont::TimesBoldItalic).unwrap();
    assert_ne!(helv, times);
    assert_eq!(doc.get_builtin_font_id(BuiltinFont::Helvetica).unwrap(), helv);
    assert!(doc.builtin_font_ref(pdf_forge::id::BuiltinFontId::new(9)).is_err());

    let helv_ref = doc.builtin_font_ref(helv).unwrap();
    let times_ref = doc.builtin_font_ref(times).unwrap();
    doc.add_page(PageContents {
        resources: format!("<< /Font << /F0 {} 0 R >> >>", helv_ref.id).into_bytes(),
        contents: b"BT /F0 12 Tf 10 10 Td (Hi) Tj ET".to_vec(),
        ..Default::default()
    })
    .unwrap();

    let mut out = Vec::new();
    doc.finalize(&mut out).unwrap();
    let pdf = parse(&out);
    let font = dict(&pdf, oid(helv_ref));
    assert_eq!(name(get(font, "Type")), b"Font");
    assert_eq!(name(get(font, "Subtype")), b"Type1");
    assert_eq!(name(get(font, "BaseFont")), b"Helvetica");
    assert!(font.get(b"FontDescriptor").is_err());
    assert_eq!(
        name(get(dict(&pdf, oid(times_ref)), "BaseFont")),
        b"Times-BoldItalic"
    );
}

fn system_font() -> Option<std::path::PathBuf> {
    std::env::var_os("PDF_FORGE_TEST_FONT")
        .map(std::path::PathBuf::from)
        .into_iter()
        .chain(
            [
                "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
                "/usr/share/fonts/TTF/DejaVuSans.ttf",
                "/usr/share/fonts/dejavu/DejaVuSans.ttf",
                "/Library/Fonts/Arial.ttf",
            ]
            .into_iter()
            .map(std::path::PathBuf::from),
        )
        .find(|p| p.is_file())
}

#[test]
fn truetype_subset_keeps_advances() {
    let Some(path) = system_font() else {
        eprintln!("no TrueType font installed, set PDF_FORGE_TEST_FONT to run this test");
        return;
    };
    let face = TrueTypeFace::load(&path).unwrap();
    assert!(!face.postscript_name().is_empty());

    let mut glyphs: Vec<GlyphId> = Vec::new();
    for c in "Hello, PDF world! 0123".chars() {
        let glyph = face.glyph_index(c).unwrap();
        if !glyphs.contains(&glyph) {
            glyphs.push(glyph);
        }
    }
    let program = face.subset(&glyphs).unwrap();

    let data = std::fs::read(&path).unwrap();
    let original = ttf_parser::Face::parse(&data, 0).unwrap();
    let subset = ttf_parser::Face::parse(&program, 0).unwrap();
    assert!(usize::from(subset.number_of_glyphs()) > glyphs.len());
    for (position, glyph) in glyphs.iter().enumerate() {
        let expected = original.glyph_hor_advance(ttf_parser::GlyphId(glyph.0));
        let actual = subset.glyph_hor_advance(ttf_parser::GlyphId(position as u16 + 1));
        assert!(expected.is_some());
        assert_eq!(actual, expected, "glyph {} at position {}", glyph.0, position);
        assert_eq!(face.advance_width(*glyph), expected);
    }
}
