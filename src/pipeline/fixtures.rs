//! In-memory PDF builder for unit tests.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

/// Build a PDF with one page per entry of `pages`; each line becomes its own
/// text object. `info` optionally adds `(key, value)` pairs to the Info dictionary.
pub(crate) fn build_pdf(pages: &[&[&str]], info: &[(&str, &str)]) -> Vec<u8> {
    let contents = pages
        .iter()
        .map(|lines| {
            lines
                .iter()
                .enumerate()
                .flat_map(|(i, line)| text_object(&[*line], 720 - 16 * i as i64))
                .collect::<Vec<_>>()
        })
        .collect();
    build_pdf_from_operations(contents, info)
}

/// One `BT`/`ET` block at height `y` showing each of `runs` with its own `Tj`.
pub(crate) fn text_object(runs: &[&str], y: i64) -> Vec<Operation> {
    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), 12.into()]),
        Operation::new("Td", vec![72.into(), y.into()]),
    ];
    for run in runs {
        operations.push(Operation::new("Tj", vec![Object::string_literal(*run)]));
    }
    operations.push(Operation::new("ET", vec![]));
    operations
}

/// Build a PDF whose pages carry the given content operations verbatim.
pub(crate) fn build_pdf_from_operations(
    pages: Vec<Vec<Operation>>,
    info: &[(&str, &str)],
) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });

    let mut kids: Vec<Object> = Vec::new();
    for operations in pages {
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    if !info.is_empty() {
        let mut dict = lopdf::Dictionary::new();
        for (key, value) in info {
            dict.set(key.as_bytes().to_vec(), Object::string_literal(*value));
        }
        let info_id = doc.add_object(dict);
        doc.trailer.set("Info", info_id);
    }

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("save pdf");
    buf
}
