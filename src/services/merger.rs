//! PDF 合并
//!
//! 把每张幻灯片的 PDF 按输入顺序拼接成一个文档。
//!
//! 算法：
//! 1. 逐个解析输入，任何一个无法解析或不是恰好一页都直接失败
//! 2. 以第一个文档为基础，后续文档的对象 ID 整体偏移到当前最大 ID 之后
//! 3. 所有页面按顺序挂到基础文档的根 `Pages` 节点下，并修正 `Parent`
//! 4. 压缩并序列化

use lopdf::{Document, Object, ObjectId};
use tracing::debug;

use crate::error::MergeError;
use crate::models::{MergedDocument, RenderedPage};

/// 页面可从父节点继承的属性
const INHERITABLE_KEYS: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// 合并多个 PDF
pub fn merge_pages(pages: &[RenderedPage]) -> Result<MergedDocument, MergeError> {
    if pages.is_empty() {
        return Err(MergeError::Empty);
    }

    let mut loaded = Vec::with_capacity(pages.len());
    for page in pages {
        let doc = Document::load_mem(&page.bytes).map_err(|source| MergeError::Parse {
            slide: page.index + 1,
            source,
        })?;
        let page_count = doc.get_pages().len();
        if page_count != 1 {
            return Err(MergeError::PageCount {
                slide: page.index + 1,
                pages: page_count,
            });
        }
        loaded.push(doc);
    }

    // 单个文档原样返回
    if loaded.len() == 1 {
        return Ok(MergedDocument {
            bytes: pages[0].bytes.clone(),
            page_count: 1,
        });
    }

    let mut docs = loaded.into_iter();
    let mut dest = docs.next().ok_or(MergeError::Empty)?;
    flatten_inherited_attributes(&mut dest);

    let mut page_refs: Vec<ObjectId> = dest.get_pages().values().copied().collect();
    let mut max_id = dest.max_id;

    for mut source in docs {
        flatten_inherited_attributes(&mut source);
        let offset = max_id;
        let source_pages: Vec<ObjectId> = source.get_pages().values().copied().collect();

        for (id, object) in std::mem::take(&mut source.objects) {
            dest.objects
                .insert((id.0 + offset, id.1), remap_object_refs(object, offset));
        }
        page_refs.extend(source_pages.into_iter().map(|id| (id.0 + offset, id.1)));
        max_id = max_id.max(source.max_id + offset);
    }

    dest.max_id = max_id;
    let pages_id = root_pages_id(&dest)?;
    rebuild_page_tree(&mut dest, pages_id, &page_refs)?;

    dest.compress();
    let mut bytes = Vec::new();
    dest.save_to(&mut bytes)
        .map_err(|e| MergeError::Save(e.to_string()))?;

    debug!("合并完成: {} 页, {} 字节", page_refs.len(), bytes.len());
    Ok(MergedDocument {
        bytes,
        page_count: page_refs.len(),
    })
}

/// 统计 PDF 页数
pub fn count_pages(bytes: &[u8]) -> Result<usize, lopdf::Error> {
    Ok(Document::load_mem(bytes)?.get_pages().len())
}

/// 递归偏移对象中的引用
fn remap_object_refs(obj: Object, offset: u32) -> Object {
    match obj {
        Object::Reference(id) => Object::Reference((id.0 + offset, id.1)),
        Object::Array(arr) => Object::Array(
            arr.into_iter()
                .map(|o| remap_object_refs(o, offset))
                .collect(),
        ),
        Object::Dictionary(mut dict) => {
            for (_, value) in dict.iter_mut() {
                *value = remap_object_refs(value.clone(), offset);
            }
            Object::Dictionary(dict)
        }
        Object::Stream(mut stream) => {
            for (_, value) in stream.dict.iter_mut() {
                *value = remap_object_refs(value.clone(), offset);
            }
            Object::Stream(stream)
        }
        other => other,
    }
}

/// 把中间 `Pages` 节点上的可继承属性下放到页面本身
///
/// 页面被直接挂到新的根节点后，原来的中间节点不再是它的祖先。
fn flatten_inherited_attributes(doc: &mut Document) {
    let page_ids: Vec<ObjectId> = doc.get_pages().values().copied().collect();

    for page_id in page_ids {
        let mut missing: Vec<(&[u8], Object)> = Vec::new();
        for key in INHERITABLE_KEYS {
            let has_own = doc
                .get_dictionary(page_id)
                .map(|dict| dict.has(key))
                .unwrap_or(true);
            if has_own {
                continue;
            }
            if let Some(value) = find_inherited(doc, page_id, key) {
                missing.push((key, value));
            }
        }

        if let Ok(dict) = doc.get_dictionary_mut(page_id) {
            for (key, value) in missing {
                dict.set(key, value);
            }
        }
    }
}

fn find_inherited(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = doc.get_dictionary(page_id).ok()?;
    // 防止畸形文档中的循环引用
    for _ in 0..32 {
        let parent_id = current.get(b"Parent").ok()?.as_reference().ok()?;
        let parent = doc.get_dictionary(parent_id).ok()?;
        if let Ok(value) = parent.get(key) {
            return Some(value.clone());
        }
        current = parent;
    }
    None
}

fn root_pages_id(doc: &Document) -> Result<ObjectId, MergeError> {
    let catalog_id = doc
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|_| MergeError::Structure("trailer 中缺少 Root".into()))?;

    doc.get_dictionary(catalog_id)
        .map_err(|_| MergeError::Structure("找不到 Catalog".into()))?
        .get(b"Pages")
        .and_then(Object::as_reference)
        .map_err(|_| MergeError::Structure("Catalog 中缺少 Pages".into()))
}

/// 把所有页面挂到根 `Pages` 节点下
fn rebuild_page_tree(
    doc: &mut Document,
    pages_id: ObjectId,
    page_refs: &[ObjectId],
) -> Result<(), MergeError> {
    for &page_id in page_refs {
        let page = doc
            .get_dictionary_mut(page_id)
            .map_err(|_| MergeError::Structure(format!("页面对象 {:?} 不存在", page_id)))?;
        page.set("Parent", Object::Reference(pages_id));
    }

    let pages = doc
        .get_dictionary_mut(pages_id)
        .map_err(|_| MergeError::Structure("Pages 不是字典".into()))?;
    pages.set(
        "Kids",
        Object::Array(page_refs.iter().map(|&id| Object::Reference(id)).collect()),
    );
    pages.set("Count", Object::Integer(page_refs.len() as i64));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{multi_page_pdf, page_widths, single_page_pdf};
    use lopdf::Dictionary;
    use pretty_assertions::assert_eq;

    fn rendered(index: usize, bytes: Vec<u8>) -> RenderedPage {
        RenderedPage { index, bytes }
    }

    #[test]
    fn test_merge_empty_fails() {
        let result = merge_pages(&[]);
        assert!(matches!(result, Err(MergeError::Empty)));
    }

    #[test]
    fn test_merge_single_returns_input() {
        let pdf = single_page_pdf(960);
        let merged = merge_pages(&[rendered(0, pdf.clone())]).unwrap();
        assert_eq!(merged.page_count, 1);
        assert_eq!(merged.bytes, pdf);
    }

    #[test]
    fn test_merge_preserves_order_and_count() {
        let pages: Vec<RenderedPage> = (0..5)
            .map(|i| rendered(i, single_page_pdf(100 + i as i64)))
            .collect();

        let merged = merge_pages(&pages).unwrap();
        assert_eq!(merged.page_count, 5);
        assert_eq!(count_pages(&merged.bytes).unwrap(), 5);
        assert_eq!(page_widths(&merged.bytes), vec![100, 101, 102, 103, 104]);
    }

    #[test]
    fn test_merge_rejects_corrupt_page() {
        let pages = vec![
            rendered(0, single_page_pdf(100)),
            rendered(1, b"definitely not a pdf".to_vec()),
        ];
        match merge_pages(&pages) {
            Err(MergeError::Parse { slide, .. }) => assert_eq!(slide, 2),
            other => panic!("expected parse error, got {:?}", other.map(|m| m.page_count)),
        }
    }

    #[test]
    fn test_merge_rejects_slide_spilling_onto_second_page() {
        let pages = vec![
            rendered(0, multi_page_pdf(&[100, 101])),
            rendered(1, single_page_pdf(102)),
        ];
        assert!(matches!(merge_pages(&pages), Err(MergeError::PageCount { slide: 1, pages: 2 })));

        // 只有一张幻灯片时也不能原样放行
        assert!(matches!(
            merge_pages(&[rendered(0, multi_page_pdf(&[100, 101]))]),
            Err(MergeError::PageCount { slide: 1, pages: 2 })
        ));
    }

    #[test]
    fn test_merge_keeps_inherited_media_box() {
        // MediaBox 只写在 Pages 节点上
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut page = Dictionary::new();
        page.set("Type", Object::Name(b"Page".to_vec()));
        page.set("Parent", Object::Reference(pages_id));
        let page_id = doc.add_object(page);

        let mut pages = Dictionary::new();
        pages.set("Type", Object::Name(b"Pages".to_vec()));
        pages.set("Kids", Object::Array(vec![Object::Reference(page_id)]));
        pages.set("Count", Object::Integer(1));
        pages.set(
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(777),
                Object::Integer(540),
            ]),
        );
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(pages_id));
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", Object::Reference(catalog_id));
        let mut inherited = Vec::new();
        doc.save_to(&mut inherited).unwrap();

        let merged = merge_pages(&[
            rendered(0, single_page_pdf(960)),
            rendered(1, inherited),
        ])
        .unwrap();
        assert_eq!(page_widths(&merged.bytes), vec![960, 777]);
    }
}
