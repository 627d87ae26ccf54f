mod common;

use common::{
    array, catalog, dict, get, init_log, name, number, oid, parse, reference, resolve_dict,
    stream_data, string,
};
use pdf_forge::{
    color::{Color, DeviceColorSpace},
    common::Rectangle,
    high::{
        AnnotationKind, Checkbox, FormXObject, PageContents, StructureAttributes, StructureType,
        Transition, TransitionStyle,
    },
    options::DocumentOptions,
    raster::RasterImage,
    Document, Error,
};

fn uncompressed() -> DocumentOptions {
    DocumentOptions {
        compress: false,
        ..Default::default()
    }
}

#[test]
fn link_annotation_end_to_end() {
    init_log();
    let mut doc = Document::new();
    let link = doc
        .create_annotation(
            Rectangle::new(10.0, 10.0, 32.0, 20.0),
            AnnotationKind::Link {
                uri: "https://example.org".into(),
            },
        )
        .unwrap();
    let page = doc
        .add_page(PageContents {
            annotations: vec![link],
            ..Default::default()
        })
        .unwrap();
    let page_ref = doc.page_ref(page).unwrap();
    let link_ref = doc.annotation_ref(link).unwrap();

    let mut out = Vec::new();
    doc.finalize(&mut out).unwrap();
    let pdf = parse(&out);

    let pages = pdf.get_pages();
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[&1], oid(page_ref));

    let page = dict(&pdf, oid(page_ref));
    let annots = array(get(page, "Annots"));
    assert_eq!(annots.len(), 1);
    assert_eq!(reference(&annots[0]), oid(link_ref));

    let annot = dict(&pdf, oid(link_ref));
    assert_eq!(name(get(annot, "Subtype")), b"Link");
    let rect: Vec<f64> = array(get(annot, "Rect")).iter().map(number).collect();
    assert_eq!(rect, vec![10.0, 10.0, 32.0, 20.0]);
    let action = resolve_dict(&pdf, get(annot, "A"));
    assert_eq!(string(get(action, "URI")), b"https://example.org");
    assert_eq!(reference(get(annot, "P")), oid(page_ref));
}

#[test]
fn trailer_and_info() {
    let mut doc = Document::with_options(DocumentOptions {
        title: Some("Quarterly".into()),
        lang: Some("de-DE".into()),
        ..Default::default()
    });
    doc.add_page(PageContents::default()).unwrap();
    let mut out = Vec::new();
    doc.finalize(&mut out).unwrap();

    let text = String::from_utf8_lossy(&out);
    assert!(out.starts_with(b"%PDF-1.7\n%"));
    assert_eq!(&out[10..14], &[180, 200, 220, 240]);
    assert!(text.ends_with("%%EOF\n"));

    let pdf = parse(&out);
    let size = number(pdf.trailer.get(b"Size").unwrap()) as usize;
    assert_eq!(size, pdf.max_id as usize + 1);
    assert_eq!(array(pdf.trailer.get(b"ID").unwrap()).len(), 2);
    let info = resolve_dict(&pdf, pdf.trailer.get(b"Info").unwrap());
    assert_eq!(string(get(info, "Title")), b"Quarterly");
    assert!(info.get(b"Producer").is_ok());
    assert_eq!(string(get(catalog(&pdf), "Lang")), b"de-DE");
}

#[test]
fn structure_tree() {
    let mut doc = Document::new();
    let root = doc.add_structure_item(StructureType::Document, None).unwrap();
    let heading = doc
        .add_structure_item_with(
            StructureType::H1,
            Some(root),
            StructureAttributes {
                alt: Some("Title".into()),
                ..Default::default()
            },
        )
        .unwrap();
    let para = doc.add_structure_item(StructureType::P, Some(root)).unwrap();
    let page = doc
        .add_page(PageContents {
            contents: b"/H1 <</MCID 0>> BDC EMC /P <</MCID 1>> BDC EMC".to_vec(),
            structure: vec![heading, para],
            ..Default::default()
        })
        .unwrap();
    let page_ref = doc.page_ref(page).unwrap();
    let root_ref = doc.structure_item_ref(root).unwrap();
    let heading_ref = doc.structure_item_ref(heading).unwrap();
    let para_ref = doc.structure_item_ref(para).unwrap();

    let mut out = Vec::new();
    doc.finalize(&mut out).unwrap();
    let pdf = parse(&out);

    let cat = catalog(&pdf);
    let mark_info = resolve_dict(&pdf, get(cat, "MarkInfo"));
    assert!(matches!(get(mark_info, "Marked"), lopdf::Object::Boolean(true)));
    let tree = resolve_dict(&pdf, get(cat, "StructTreeRoot"));
    let kids = array(get(tree, "K"));
    assert_eq!(kids.len(), 1);
    assert_eq!(reference(&kids[0]), oid(root_ref));
    assert_eq!(number(get(tree, "ParentTreeNextKey")), 1.0);

    let parent_tree = resolve_dict(&pdf, get(tree, "ParentTree"));
    let nums = array(get(parent_tree, "Nums"));
    assert_eq!(number(&nums[0]), 0.0);
    let marked: Vec<_> = array(&nums[1]).iter().map(reference).collect();
    assert_eq!(marked, vec![oid(heading_ref), oid(para_ref)]);

    let page = dict(&pdf, oid(page_ref));
    assert_eq!(number(get(page, "StructParents")), 0.0);

    let doc_elem = dict(&pdf, oid(root_ref));
    let children: Vec<_> = array(get(doc_elem, "K")).iter().map(reference).collect();
    assert_eq!(children, vec![oid(heading_ref), oid(para_ref)]);

    let p = dict(&pdf, oid(para_ref));
    assert_eq!(name(get(p, "S")), b"P");
    assert_eq!(reference(get(p, "P")), oid(root_ref));
    assert_eq!(reference(get(p, "Pg")), oid(page_ref));
    assert_eq!(number(&array(get(p, "K"))[0]), 1.0);

    let h = dict(&pdf, oid(heading_ref));
    assert_eq!(string(get(h, "Alt")), b"Title");
}

#[test]
fn already_used_leaves_pages_alone() {
    let mut doc = Document::new();
    let form = |doc: &mut Document| {
        doc.add_form_xobject(FormXObject {
            bbox: Rectangle::new(0.0, 0.0, 10.0, 10.0),
            matrix: None,
            resources: Vec::new(),
            contents: b"0 g 0 0 10 10 re f".to_vec(),
        })
        .unwrap()
    };
    let on = form(&mut doc);
    let off = form(&mut doc);
    let widget = doc
        .create_checkbox(Checkbox {
            rect: Rectangle::new(50.0, 50.0, 60.0, 60.0),
            on,
            off,
            name: "accept".into(),
            checked: true,
        })
        .unwrap();
    let first = doc
        .add_page(PageContents {
            widgets: vec![widget],
            ..Default::default()
        })
        .unwrap();
    let err = doc
        .add_page(PageContents {
            widgets: vec![widget],
            ..Default::default()
        })
        .unwrap_err();
    assert!(matches!(
        err,
        Error::AlreadyUsed {
            kind: "FormWidget",
            id: 0,
            page: 0
        }
    ));

    let first_ref = doc.page_ref(first).unwrap();
    let widget_ref = doc.form_widget_ref(widget).unwrap();
    let on_ref = doc.form_xobject_ref(on).unwrap();
    let mut out = Vec::new();
    doc.finalize(&mut out).unwrap();
    let pdf = parse(&out);

    assert_eq!(pdf.get_pages().len(), 1);
    let page = dict(&pdf, oid(first_ref));
    let annots: Vec<_> = array(get(page, "Annots")).iter().map(reference).collect();
    assert_eq!(annots, vec![oid(widget_ref)]);

    let widget = dict(&pdf, oid(widget_ref));
    assert_eq!(name(get(widget, "Subtype")), b"Widget");
    assert_eq!(name(get(widget, "AS")), b"Yes");
    assert_eq!(reference(get(widget, "P")), oid(first_ref));
    let ap = resolve_dict(&pdf, get(widget, "AP"));
    let normal = resolve_dict(&pdf, get(ap, "N"));
    assert_eq!(reference(get(normal, "Yes")), oid(on_ref));

    let form = resolve_dict(&pdf, get(catalog(&pdf), "AcroForm"));
    let fields: Vec<_> = array(get(form, "Fields")).iter().map(reference).collect();
    assert_eq!(fields, vec![oid(widget_ref)]);
}

#[test]
fn unknown_resources_are_rejected() {
    let mut doc = Document::new();
    let err = doc
        .create_annotation(
            Rectangle::new(0.0, 0.0, 1.0, 1.0),
            AnnotationKind::FileAttachment {
                file: pdf_forge::id::EmbeddedFileId::new(0),
                description: None,
            },
        )
        .unwrap_err();
    assert!(matches!(err, Error::UnknownResource { kind: "EmbeddedFile", id: 0 }));
    assert!(doc.image_ref(pdf_forge::id::ImageId::new(0)).is_err());
    assert!(doc.store().is_empty());
}

#[test]
fn outline_and_attachments() {
    let mut doc = Document::new();
    let p1 = doc.add_page(PageContents::default()).unwrap();
    let p2 = doc.add_page(PageContents::default()).unwrap();
    let intro = doc.add_outline("Introduction", p1, None).unwrap();
    doc.add_outline("Motivation", p1, Some(intro)).unwrap();
    doc.add_outline("Results", p2, None).unwrap();

    let file = doc
        .embed_file_data("data.csv", b"a,b\n1,2\n".to_vec(), Some("text/csv"))
        .unwrap();
    let attachment = doc
        .create_colored_annotation(
            Rectangle::new(100.0, 100.0, 120.0, 120.0),
            AnnotationKind::FileAttachment {
                file,
                description: Some("Raw data".into()),
            },
            Some(Color::Cmyk(0.0, 0.0, 1.0, 0.0)),
        )
        .unwrap();
    doc.add_page(PageContents {
        annotations: vec![attachment],
        ..Default::default()
    })
    .unwrap();
    let p2_ref = doc.page_ref(p2).unwrap();
    let annot_ref = doc.annotation_ref(attachment).unwrap();

    let mut out = Vec::new();
    doc.finalize(&mut out).unwrap();
    let pdf = parse(&out);
    let cat = catalog(&pdf);

    let outlines = resolve_dict(&pdf, get(cat, "Outlines"));
    assert_eq!(number(get(outlines, "Count")), 3.0);
    let first = resolve_dict(&pdf, get(outlines, "First"));
    assert_eq!(string(get(first, "Title")), b"Introduction");
    assert_eq!(number(get(first, "Count")), 1.0);
    let child = resolve_dict(&pdf, get(first, "First"));
    assert_eq!(string(get(child, "Title")), b"Motivation");
    let last = resolve_dict(&pdf, get(outlines, "Last"));
    assert_eq!(string(get(last, "Title")), b"Results");
    assert_eq!(reference(&array(get(last, "Dest"))[0]), oid(p2_ref));

    let names = resolve_dict(&pdf, get(cat, "Names"));
    let files = resolve_dict(&pdf, get(names, "EmbeddedFiles"));
    let entries = array(get(files, "Names"));
    assert_eq!(string(&entries[0]), b"data.csv");
    let spec = resolve_dict(&pdf, &entries[1]);
    let ef = resolve_dict(&pdf, get(spec, "EF"));
    assert_eq!(stream_data(&pdf, reference(get(ef, "F"))), b"a,b\n1,2\n");

    let annot = dict(&pdf, oid(annot_ref));
    assert_eq!(name(get(annot, "Subtype")), b"FileAttachment");
    assert_eq!(string(get(annot, "Contents")), b"Raw data");
    let color: Vec<f64> = array(get(annot, "C")).iter().map(number).collect();
    assert_eq!(color.len(), 3);
    assert_eq!(color, vec![1.0, 1.0, 0.0]);
}

#[test]
fn uncompressed_content_and_transition() {
    let mut doc = Document::with_options(uncompressed());
    let page = doc
        .add_page(PageContents {
            resources: b"<< /ProcSet [/PDF] >>".to_vec(),
            contents: b"0 0 1 rg 10 10 100 100 re f".to_vec(),
            transition: Some(Transition::new(TransitionStyle::Dissolve, 1.5)),
            ..Default::default()
        })
        .unwrap();
    let page_ref = doc.page_ref(page).unwrap();
    let mut out = Vec::new();
    doc.finalize(&mut out).unwrap();

    let text = String::from_utf8_lossy(&out);
    assert!(text.contains("0 0 1 rg 10 10 100 100 re f"));
    assert!(!text.contains("FlateDecode"));

    let pdf = parse(&out);
    let page = dict(&pdf, oid(page_ref));
    let contents = reference(get(page, "Contents"));
    assert_eq!(stream_data(&pdf, contents), b"0 0 1 rg 10 10 100 100 re f");
    let trans = resolve_dict(&pdf, get(page, "Trans"));
    assert_eq!(name(get(trans, "S")), b"Dissolve");
    let media: Vec<f64> = array(get(page, "MediaBox")).iter().map(number).collect();
    assert_eq!(media.len(), 4);
}

#[test]
fn image_with_alpha() {
    let mut doc = Document::new();
    let image = doc
        .add_image(RasterImage {
            width: 2,
            height: 1,
            color_space: DeviceColorSpace::Rgb,
            data: vec![255, 0, 0, 0, 0, 255],
            alpha: Some(vec![255, 128]),
            icc: None,
        })
        .unwrap();
    let bad = doc.add_image(RasterImage {
        width: 2,
        height: 2,
        color_space: DeviceColorSpace::Gray,
        data: vec![0; 3],
        alpha: None,
        icc: None,
    });
    assert!(matches!(bad, Err(Error::ResourceLoad { .. })));

    let image_ref = doc.image_ref(image).unwrap();
    doc.add_page(PageContents::default()).unwrap();
    let mut out = Vec::new();
    doc.finalize(&mut out).unwrap();
    let pdf = parse(&out);

    let xobject = dict(&pdf, oid(image_ref));
    assert_eq!(name(get(xobject, "Subtype")), b"Image");
    assert_eq!(name(get(xobject, "ColorSpace")), b"DeviceRGB");
    assert_eq!(stream_data(&pdf, oid(image_ref)), vec![255, 0, 0, 0, 0, 255]);
    let smask = reference(get(xobject, "SMask"));
    assert_eq!(stream_data(&pdf, smask), vec![255, 128]);
}

#[test]
fn finalize_to_path_writes_file() {
    let path = std::env::temp_dir().join(format!("pdf-forge-{}.pdf", std::process::id()));
    let mut doc = Document::new();
    doc.add_page(PageContents::default()).unwrap();
    doc.finalize_to_path(&path).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(parse(&bytes).get_pages().len(), 1);
}

#[test]
fn pages_share_a_transparency_group() {
    let mut doc = Document::with_options(DocumentOptions {
        output_color_space: DeviceColorSpace::Gray,
        ..Default::default()
    });
    let first = doc.add_page(PageContents::default()).unwrap();
    let second = doc.add_page(PageContents::default()).unwrap();
    let first_ref = doc.page_ref(first).unwrap();
    let second_ref = doc.page_ref(second).unwrap();

    let mut out = Vec::new();
    doc.finalize(&mut out).unwrap();
    let pdf = parse(&out);
    let group = reference(get(dict(&pdf, oid(first_ref)), "Group"));
    assert_eq!(reference(get(dict(&pdf, oid(second_ref)), "Group")), group);
    let group = dict(&pdf, group);
    assert_eq!(name(get(group, "Type")), b"Group");
    assert_eq!(name(get(group, "S")), b"Transparency");
    assert_eq!(name(get(group, "CS")), b"DeviceGray");
}
