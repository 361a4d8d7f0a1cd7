//! Merge several PDFs into one, preserving input order
//!
//! Every input is renumbered past the previous one and its pages are
//! re-parented under a single page tree; one catalog is kept.
//! Outlines are dropped since they would point into the old trees.

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::error::{PdfError, Result};

/// Merge PDF byte streams, pages appearing in input order
pub fn merge_pdfs<B: AsRef<[u8]>>(inputs: &[B]) -> Result<Vec<u8>> {
    if inputs.is_empty() {
        return Err(PdfError::Merge("no input documents".to_string()));
    }

    let mut max_id = 1;
    let mut pages: Vec<(ObjectId, Dictionary)> = Vec::new();
    let mut objects: Vec<(ObjectId, Object)> = Vec::new();

    for (index, input) in inputs.iter().enumerate() {
        let mut doc = Document::load_mem(input.as_ref())?;
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
        if page_ids.is_empty() {
            return Err(PdfError::Merge(format!("input {} has no pages", index + 1)));
        }
        for id in page_ids {
            let mut page = doc.get_dictionary(id)?.clone();
            inherit_attributes(&doc, &mut page);
            pages.push((id, page));
        }
        objects.extend(doc.objects);
    }

    let mut merged = Document::with_version("1.5");
    let mut catalog: Option<(ObjectId, Dictionary)> = None;
    let mut page_tree: Option<(ObjectId, Dictionary)> = None;

    for (id, object) in objects {
        match type_of(&object) {
            Some(b"Catalog") => {
                if catalog.is_none() {
                    if let Object::Dictionary(dict) = object {
                        catalog = Some((id, dict));
                    }
                }
            }
            Some(b"Pages") => {
                if page_tree.is_none() {
                    if let Object::Dictionary(dict) = object {
                        page_tree = Some((id, dict));
                    }
                }
            }
            Some(b"Page") | Some(b"Outlines") | Some(b"Outline") => {}
            _ => {
                merged.objects.insert(id, object);
            }
        }
    }

    let (catalog_id, mut catalog) =
        catalog.ok_or_else(|| PdfError::Merge("no catalog found".to_string()))?;
    let (tree_id, mut tree) =
        page_tree.ok_or_else(|| PdfError::Merge("no page tree found".to_string()))?;

    let mut kids = Vec::with_capacity(pages.len());
    for (id, mut page) in pages {
        page.set("Parent", tree_id);
        merged.objects.insert(id, Object::Dictionary(page));
        kids.push(Object::Reference(id));
    }

    tree.set("Count", kids.len() as i64);
    tree.set("Kids", kids);
    merged.objects.insert(tree_id, Object::Dictionary(tree));

    catalog.set("Pages", tree_id);
    catalog.remove(b"Outlines");
    merged.objects.insert(catalog_id, Object::Dictionary(catalog));

    merged.trailer.set("Root", catalog_id);
    merged.max_id = merged.objects.keys().map(|(n, _)| *n).max().unwrap_or(0);
    merged.renumber_objects();
    merged.compress();

    let mut buffer = Vec::new();
    merged.save_to(&mut buffer)?;
    Ok(buffer)
}

const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Copy attributes a page inherits from its ancestors onto the page
///
/// Pages are re-parented under one tree, so anything they inherited
/// from their original tree would otherwise be lost or replaced.
fn inherit_attributes(doc: &Document, page: &mut Dictionary) {
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    let mut depth = 0;
    while let Some(parent_id) = parent {
        let Ok(node) = doc.get_dictionary(parent_id) else {
            break;
        };
        for key in INHERITABLE {
            if !page.has(key) {
                if let Ok(value) = node.get(key) {
                    page.set(key.to_vec(), value.clone());
                }
            }
        }
        depth += 1;
        if depth > 32 {
            break;
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }
}

fn type_of(object: &Object) -> Option<&[u8]> {
    match object {
        Object::Dictionary(dict) => dict.get(b"Type").and_then(Object::as_name).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simple::SimplePdfWriter;
    use billgen_ast::{Block, Heading};

    fn titled_pdf(title: &str) -> Vec<u8> {
        let mut doc = billgen_ast::Document::with_title(title);
        doc.push(Block::Heading(Heading::new(1, title)));
        SimplePdfWriter::write(&doc).unwrap()
    }

    fn page_texts(bytes: &[u8]) -> Vec<String> {
        let mut doc = Document::load_mem(bytes).unwrap();
        doc.decompress();
        doc.get_pages()
            .into_values()
            .map(|id| String::from_utf8_lossy(&doc.get_page_content(id).unwrap()).into_owned())
            .collect()
    }

    #[test]
    fn test_merge_preserves_input_order() {
        let titles = ["Summary", "Deviation Statement", "Extra Items"];
        let inputs: Vec<Vec<u8>> = titles.iter().map(|t| titled_pdf(t)).collect();

        let merged = merge_pdfs(&inputs).unwrap();
        assert!(merged.starts_with(b"%PDF"));

        let texts = page_texts(&merged);
        assert_eq!(texts.len(), 3);
        for (text, title) in texts.iter().zip(titles) {
            assert!(text.contains(title), "expected {} in page content", title);
        }
    }

    #[test]
    fn test_merge_reversed_inputs_reverse_pages() {
        let inputs = vec![titled_pdf("Scrutiny Sheet"), titled_pdf("Summary")];
        let texts = page_texts(&merge_pdfs(&inputs).unwrap());
        assert!(texts[0].contains("Scrutiny Sheet"));
        assert!(texts[1].contains("Summary"));
    }

    #[test]
    fn test_merge_rejects_empty_input() {
        let inputs: Vec<Vec<u8>> = Vec::new();
        assert!(matches!(merge_pdfs(&inputs), Err(PdfError::Merge(_))));
    }

    #[test]
    fn test_merge_rejects_garbage() {
        assert!(merge_pdfs(&[b"not a pdf".to_vec()]).is_err());
    }
}
