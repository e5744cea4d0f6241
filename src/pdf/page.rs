//! Page-level helpers: geometry, inherited attributes, resources and content

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::error::Result;
use crate::layout::{compute_position, tile_positions, Anchor, Size};

/// Attributes a page may inherit from its ancestors in the page tree
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Look up a page attribute, walking up `Parent` links when the page lacks it
pub fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = page_id;
    // Bounded walk: malformed files can contain Parent cycles
    for _ in 0..64 {
        let dict = doc.get_dictionary(current).ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value.clone());
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok()?;
    }
    None
}

/// Copy inherited attributes onto the page itself
///
/// Needed before a page is moved under a different parent, otherwise it
/// silently loses the media box and resources of its old ancestors.
pub fn materialize_inherited_attributes(doc: &mut Document, page_id: ObjectId) -> Result<()> {
    let mut missing = Vec::new();
    {
        let page = doc.get_dictionary(page_id)?;
        for key in INHERITABLE {
            if !page.has(key) {
                if let Some(value) = inherited_attribute(doc, page_id, key) {
                    missing.push((key, value));
                }
            }
        }
    }

    let page = doc.get_dictionary_mut(page_id)?;
    for (key, value) in missing {
        page.set(key, value);
    }
    Ok(())
}

/// A page's media box in default user space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    /// Lower-left corner
    pub x: f32,
    pub y: f32,
    pub size: Size,
}

impl PageBox {
    /// Where content goes for `anchor`, in page coordinates
    ///
    /// Anchors are resolved against the box size and then shifted by the box
    /// corner, so pages whose media box does not start at the origin are
    /// stamped inside their visible area. `gap` is only used for tiling.
    pub fn placements(&self, anchor: Anchor, content: Size, margin: f32, gap: f32) -> Vec<(f32, f32)> {
        let positions = match anchor {
            Anchor::Tiled => tile_positions(self.size, content, gap),
            anchor => vec![compute_position(anchor, self.size, content, margin)],
        };
        positions
            .into_iter()
            .map(|(x, y)| (x + self.x, y + self.y))
            .collect()
    }
}

/// Media box of a page, defaulting to US Letter at the origin
pub fn page_box(doc: &Document, page_id: ObjectId) -> PageBox {
    let media_box = inherited_attribute(doc, page_id, b"MediaBox").and_then(|obj| match obj {
        Object::Reference(id) => doc.get_object(id).ok().cloned(),
        other => Some(other),
    });

    let values: Vec<f32> = match media_box {
        Some(Object::Array(items)) => items.iter().filter_map(|v| v.as_float().ok()).collect(),
        _ => Vec::new(),
    };

    match values.as_slice() {
        [x0, y0, x1, y1] => PageBox {
            x: x0.min(*x1),
            y: y0.min(*y1),
            size: Size::new((x1 - x0).abs(), (y1 - y0).abs()),
        },
        _ => PageBox {
            x: 0.0,
            y: 0.0,
            size: Size::letter(),
        },
    }
}

/// Page size from its media box, defaulting to US Letter
pub fn page_size(doc: &Document, page_id: ObjectId) -> Size {
    page_box(doc, page_id).size
}

/// Register an object in one of the page's resource categories
///
/// `category` is e.g. `Font`, `XObject` or `ExtGState`. A fresh name built
/// from `prefix` is chosen so existing resources are never shadowed; the
/// chosen name is returned. Shared or inherited resource dictionaries are
/// copied onto the page first so other pages are not affected.
pub fn add_page_resource(
    doc: &mut Document,
    page_id: ObjectId,
    category: &str,
    prefix: &str,
    object_id: ObjectId,
) -> Result<String> {
    let mut resources = resolve_dictionary(doc, inherited_attribute(doc, page_id, b"Resources"));
    let mut entries = resolve_dictionary(doc, resources.get(category.as_bytes()).ok().cloned());

    let name = (1..)
        .map(|n| format!("{prefix}{n}"))
        .find(|candidate| !entries.has(candidate.as_bytes()))
        .unwrap_or_else(|| prefix.to_string());

    entries.set(name.as_bytes(), Object::Reference(object_id));
    resources.set(category, Object::Dictionary(entries));

    let page = doc.get_dictionary_mut(page_id)?;
    page.set("Resources", Object::Dictionary(resources));

    Ok(name)
}

/// Draw `content` on top of the page's existing content
///
/// The original content is bracketed in `q`/`Q` so a transformation left
/// active by it cannot displace the overlay.
pub fn overlay_content(doc: &mut Document, page_id: ObjectId, content: Vec<u8>) -> Result<()> {
    let save_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));

    let mut overlay = b"Q\n".to_vec();
    overlay.extend(content);
    let overlay_id = doc.add_object(Stream::new(Dictionary::new(), overlay));

    let page = doc.get_dictionary_mut(page_id)?;
    let existing = page.get(b"Contents").ok().cloned();

    let mut contents = vec![Object::Reference(save_id)];
    match existing {
        Some(Object::Reference(content_id)) => contents.push(Object::Reference(content_id)),
        Some(Object::Array(content_array)) => contents.extend(content_array),
        _ => {}
    }
    contents.push(Object::Reference(overlay_id));

    page.set("Contents", Object::Array(contents));
    Ok(())
}

/// Clone a dictionary, following one level of indirection
fn resolve_dictionary(doc: &Document, object: Option<Object>) -> Dictionary {
    match object {
        Some(Object::Dictionary(dict)) => dict,
        Some(Object::Reference(id)) => doc.get_dictionary(id).cloned().unwrap_or_else(|_| Dictionary::new()),
        _ => Dictionary::new(),
    }
}
