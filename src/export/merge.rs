//! Appending pages to an existing multi-page PDF.
//!
//! The appended page's objects are renumbered past the output's highest id and
//! copied in; every page whose media box is smaller than the largest one is
//! grown to it, with its content shifted so it stays top-left aligned. The
//! result is written beside the output, re-opened and page-counted, and only
//! then renamed over it.

use super::file::temp_path;
use super::types::ExportError;
use fs2::FileExt;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

/// Parent links followed when resolving inherited page attributes.
const MAX_INHERIT_DEPTH: usize = 32;

/// Exclusive lock on `<output>.lock`, released on drop.
#[derive(Debug)]
pub struct OutputLock {
    file: File,
    path: PathBuf,
}

impl OutputLock {
    /// Takes the lock without waiting; a second writer gets [`ExportError::Locked`].
    pub fn acquire(output: &Path) -> Result<Self, ExportError> {
        let path = lock_path(output);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&path)?;
        if file.try_lock_exclusive().is_err() {
            return Err(ExportError::Locked(output.to_path_buf()));
        }
        Ok(Self { file, path })
    }
}

impl Drop for OutputLock {
    fn drop(&mut self) {
        if let Err(err) = FileExt::unlock(&self.file) {
            log::warn!("Failed to unlock {}: {}", self.path.display(), err);
        }
        fs::remove_file(&self.path).ok();
    }
}

fn lock_path(output: &Path) -> PathBuf {
    let name = output
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    output.with_file_name(format!(".{}.lock", name))
}

/// Appends every page of `page_pdf` to the document at `output`.
///
/// On any failure the document at `output` is left as it was. Returns the
/// page count of the merged document.
pub fn append_pages(output: &Path, page_pdf: &[u8]) -> Result<usize, ExportError> {
    let _lock = OutputLock::acquire(output)?;

    let mut main = Document::load(output)?;
    let previous = main.get_pages().len();
    let page_doc = Document::load_mem(page_pdf)?;

    let added = merge_into(&mut main, page_doc)?;
    normalise_page_boxes(&mut main)?;

    let expected = previous + added;
    let tmp_path = temp_path(output, "merge");
    let result = write_verified(&mut main, &tmp_path, expected)
        .and_then(|()| fs::rename(&tmp_path, output).map_err(ExportError::from));
    if result.is_err() {
        fs::remove_file(&tmp_path).ok();
    }
    result?;

    log::info!(
        "Appended {} page(s) to {} ({} total)",
        added,
        output.display(),
        expected
    );
    Ok(expected)
}

fn write_verified(doc: &mut Document, tmp_path: &Path, expected: usize) -> Result<(), ExportError> {
    doc.save(tmp_path)?;
    let found = Document::load(tmp_path)?.get_pages().len();
    if found != expected {
        return Err(ExportError::Verify {
            path: tmp_path.to_path_buf(),
            expected,
            found,
        });
    }
    Ok(())
}

/// Copies the pages of `source` into `main`'s page tree. Returns how many
/// pages were added.
fn merge_into(main: &mut Document, mut source: Document) -> Result<usize, ExportError> {
    source.renumber_objects_with(main.max_id + 1);

    let source_pages: Vec<ObjectId> = source.get_pages().into_values().collect();
    if source_pages.is_empty() {
        return Err(ExportError::Malformed("page document has no pages".to_string()));
    }

    // Attributes a page may inherit from the source tree, which is not copied
    let inherited: Vec<(ObjectId, Option<Object>, Option<Object>)> = source_pages
        .iter()
        .map(|&id| {
            (
                id,
                inherited_attribute(&source, id, b"MediaBox"),
                inherited_attribute(&source, id, b"Resources"),
            )
        })
        .collect();

    let pages_root = pages_root(main)?;
    let max_id = source.max_id;
    for (id, object) in source.objects {
        if is_structural(&object) {
            continue;
        }
        main.objects.insert(id, object);
    }
    main.max_id = main.max_id.max(max_id);

    for (page_id, media_box, resources) in inherited {
        let page = main.get_dictionary_mut(page_id)?;
        page.set("Parent", Object::Reference(pages_root));
        if let Some(media_box) = media_box {
            page.set("MediaBox", media_box);
        }
        if let Some(resources) = resources {
            page.set("Resources", resources);
        }
    }

    let root = main.get_dictionary_mut(pages_root)?;
    let kids = root.get_mut(b"Kids")?.as_array_mut()?;
    kids.extend(source_pages.iter().map(|&id| Object::Reference(id)));
    let count = root.get(b"Count").and_then(Object::as_i64).unwrap_or(0);
    root.set("Count", Object::Integer(count + source_pages.len() as i64));

    Ok(source_pages.len())
}

/// Grows every page to the largest width and height in the document.
fn normalise_page_boxes(doc: &mut Document) -> Result<(), ExportError> {
    let pages: Vec<(ObjectId, f64, f64)> = doc
        .get_pages()
        .into_values()
        .filter_map(|id| page_size(doc, id).map(|(w, h)| (id, w, h)))
        .collect();

    let max_width = pages.iter().map(|(_, w, _)| *w).fold(0.0, f64::max);
    let max_height = pages.iter().map(|(_, _, h)| *h).fold(0.0, f64::max);

    for (id, width, height) in pages {
        if width >= max_width && height >= max_height {
            continue;
        }
        let shift = max_height - height;
        if shift > 0.0 {
            shift_contents(doc, id, shift)?;
        }
        let page = doc.get_dictionary_mut(id)?;
        page.set(
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                number(max_width),
                number(max_height),
            ]),
        );
    }
    Ok(())
}

/// Wraps the page contents in `q 1 0 0 1 0 <dy> cm ... Q`.
fn shift_contents(doc: &mut Document, page_id: ObjectId, dy: f64) -> Result<(), ExportError> {
    let existing = match doc.get_dictionary(page_id)?.get(b"Contents") {
        Ok(Object::Array(items)) => items.clone(),
        Ok(other) => vec![other.clone()],
        Err(_) => Vec::new(),
    };

    let prefix = doc.add_object(Stream::new(
        Dictionary::new(),
        format!("q 1 0 0 1 0 {} cm\n", format_number(dy)).into_bytes(),
    ));
    let suffix = doc.add_object(Stream::new(Dictionary::new(), b"\nQ\n".to_vec()));

    let mut contents = Vec::with_capacity(existing.len() + 2);
    contents.push(Object::Reference(prefix));
    contents.extend(existing);
    contents.push(Object::Reference(suffix));

    doc.get_dictionary_mut(page_id)?
        .set("Contents", Object::Array(contents));
    Ok(())
}

/// Width and height of a page's (possibly inherited) media box.
pub fn page_size(doc: &Document, page_id: ObjectId) -> Option<(f64, f64)> {
    let media_box = inherited_attribute(doc, page_id, b"MediaBox")?;
    let values: Vec<f64> = resolve(doc, &media_box)
        .as_array()
        .ok()?
        .iter()
        .filter_map(|item| as_number(resolve(doc, item)))
        .collect();
    match values.as_slice() {
        [x0, y0, x1, y1] => Some(((x1 - x0).abs(), (y1 - y0).abs())),
        _ => None,
    }
}

/// Looks `key` up on the page, then up its Parent chain.
fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_INHERIT_DEPTH {
        if let Ok(value) = current.get(key) {
            return Some(value.clone());
        }
        let parent = current.get(b"Parent").and_then(Object::as_reference).ok()?;
        current = doc.get_dictionary(parent).ok()?;
    }
    None
}

fn pages_root(doc: &Document) -> Result<ObjectId, ExportError> {
    let root = doc.trailer.get(b"Root")?.as_reference()?;
    Ok(doc.get_dictionary(root)?.get(b"Pages")?.as_reference()?)
}

/// Catalog, page-tree and cross-reference objects of the source are not copied.
fn is_structural(object: &Object) -> bool {
    let dict = match object {
        Object::Dictionary(dict) => dict,
        Object::Stream(stream) => &stream.dict,
        _ => return false,
    };
    matches!(
        dict.get(b"Type").and_then(Object::as_name),
        Ok(b"Catalog" | b"Pages" | b"XRef" | b"ObjStm")
    )
}

fn resolve<'a>(doc: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(object),
        other => other,
    }
}

fn as_number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(value) => Some(*value as f64),
        Object::Real(value) => Some(*value as f64),
        _ => None,
    }
}

/// Page dimensions are written as whole points, rounded up.
fn number(value: f64) -> Object {
    Object::Integer(value.ceil() as i64)
}

fn format_number(value: f64) -> String {
    let text = format!("{:.4}", value);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_number_trims_zeros() {
        assert_eq!(format_number(40.0), "40");
        assert_eq!(format_number(12.5), "12.5");
    }

    #[test]
    fn lock_rejects_second_writer() {
        let temp = tempfile::tempdir().unwrap();
        let output = temp.path().join("session.pdf");
        let first = OutputLock::acquire(&output).unwrap();
        assert!(matches!(OutputLock::acquire(&output), Err(ExportError::Locked(_))));
        drop(first);
        assert!(OutputLock::acquire(&output).is_ok());
    }
}
