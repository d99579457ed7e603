//! Multi-document merge
//!
//! Combines already-serialized PDFs into one document by renumbering each
//! input's objects past a running offset and rebuilding a single page tree.

use crate::{FormError, Result};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};
use std::collections::BTreeMap;

/// Merge serialized PDFs into a single document, preserving input order
///
/// An empty input list yields a valid document with zero pages.
pub fn merge_documents(inputs: &[Vec<u8>]) -> Result<Vec<u8>> {
    let mut merged = Document::with_version("1.5");
    // Collected in page-tree order; object-id order is not reliable inside
    // one input
    let mut pages: Vec<(ObjectId, Object)> = Vec::new();
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for data in inputs {
        let mut doc = Document::load_mem(data).map_err(|e| FormError::Load(e.to_string()))?;
        doc.renumber_objects_with(merged.max_id + 1);
        merged.max_id = doc.max_id;

        for (_, page_id) in doc.get_pages() {
            if let Ok(page) = doc.get_object(page_id) {
                pages.push((page_id, page.clone()));
            }
        }
        objects.extend(doc.objects);
    }

    // Keep exactly one Catalog and one Pages node; page objects are
    // re-parented below, everything else carries over untouched
    let mut catalog_dict = None;
    let mut pages_dict = None;

    for (object_id, object) in objects {
        match object.type_name().unwrap_or("") {
            "Catalog" => {
                catalog_dict.get_or_insert((object_id, object));
            }
            "Pages" => {
                if let Ok(dict) = object.as_dict() {
                    pages_dict = Some(match pages_dict.take() {
                        Some((id, existing)) => {
                            let mut merged_dict: Dictionary = existing;
                            merged_dict.extend(dict);
                            (id, merged_dict)
                        }
                        None => (object_id, dict.clone()),
                    });
                }
            }
            "Page" | "Outlines" | "Outline" => {}
            _ => {
                merged.objects.insert(object_id, object);
            }
        }
    }

    let pages_id = match pages_dict {
        Some((id, dict)) => {
            let mut dict = dict;
            dict.set("Count", pages.len() as u32);
            dict.set(
                "Kids",
                pages
                    .iter()
                    .map(|(id, _)| Object::Reference(*id))
                    .collect::<Vec<_>>(),
            );
            merged.objects.insert(id, Object::Dictionary(dict));
            id
        }
        None => {
            // No inputs: synthesize an empty page tree
            merged.add_object(dictionary! {
                "Type" => "Pages",
                "Count" => 0,
                "Kids" => Object::Array(Vec::new()),
            })
        }
    };

    for (page_id, page) in pages {
        if let Ok(dict) = page.as_dict() {
            let mut dict = dict.clone();
            dict.set("Parent", Object::Reference(pages_id));
            merged.objects.insert(page_id, Object::Dictionary(dict));
        }
    }

    let catalog_id = match catalog_dict {
        Some((id, object)) => {
            if let Ok(dict) = object.as_dict() {
                let mut dict = dict.clone();
                dict.set("Pages", Object::Reference(pages_id));
                dict.remove(b"Outlines");
                merged.objects.insert(id, Object::Dictionary(dict));
            }
            id
        }
        None => merged.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        }),
    };

    merged.trailer.set("Root", Object::Reference(catalog_id));
    merged.max_id = merged.objects.keys().map(|id| id.0).max().unwrap_or(0);
    merged.renumber_objects();
    merged.compress();

    let mut buffer = Vec::new();
    merged
        .save_to(&mut buffer)
        .map_err(|e| FormError::Save(e.to_string()))?;
    Ok(buffer)
}
