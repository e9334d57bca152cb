//! 测试用的 PDF 构造和检查工具

use lopdf::{Dictionary, Document, Object, Stream};

/// 构造一个单页 PDF，页面宽度作为可识别的标记
pub fn single_page_pdf(width: i64) -> Vec<u8> {
    multi_page_pdf(&[width])
}

/// 构造一个多页 PDF，每页宽度依次取自 `widths`
pub fn multi_page_pdf(widths: &[i64]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::with_capacity(widths.len());
    for &width in widths {
        let content = format!("BT /F1 12 Tf 50 500 Td (Slide-{}) Tj ET", width);
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

        let mut page = Dictionary::new();
        page.set("Type", Object::Name(b"Page".to_vec()));
        page.set("Parent", Object::Reference(pages_id));
        page.set("Contents", Object::Reference(content_id));
        page.set(
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(width),
                Object::Integer(540),
            ]),
        );
        kids.push(Object::Reference(doc.add_object(page)));
    }

    let mut pages = Dictionary::new();
    pages.set("Type", Object::Name(b"Pages".to_vec()));
    pages.set("Count", Object::Integer(kids.len() as i64));
    pages.set("Kids", Object::Array(kids));
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// 按页序读出每页 MediaBox 的宽度
pub fn page_widths(bytes: &[u8]) -> Vec<i64> {
    let doc = Document::load_mem(bytes).unwrap();
    doc.get_pages()
        .values()
        .map(|&page_id| {
            let page = doc.get_dictionary(page_id).unwrap();
            let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
            match &media_box[2] {
                Object::Integer(w) => *w,
                Object::Real(w) => *w as i64,
                other => panic!("unexpected MediaBox entry: {:?}", other),
            }
        })
        .collect()
}
