//! Test utilities for building admission fixtures in memory.
//!
//! Zips, nested zips, PDFs and workbooks are produced with the same crates
//! the pipeline reads them with, so fixtures never need to be checked in.
//!
//! # Panics
//!
//! All functions in this module may panic on I/O errors since they are
//! designed for test use only where panics are acceptable.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::io::Cursor;
use std::io::Write;

use lopdf::Document;
use lopdf::Object;
use lopdf::Stream;
use lopdf::content::Content;
use lopdf::content::Operation;
use lopdf::dictionary;
use zip::write::SimpleFileOptions;
use zip::write::ZipWriter;

/// Creates an in-memory ZIP archive from a list of entries.
///
/// Each entry is a tuple of (path, content). Files are stored uncompressed
/// with mode 0o644.
///
/// # Examples
///
/// ```
/// use intake_core::test_utils::create_test_zip;
///
/// let zip_data = create_test_zip(&[("file.txt", b"hello"), ("dir/nested.txt", b"world!")]);
/// ```
#[must_use]
pub fn create_test_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = ZipTestBuilder::new();
    for (path, data) in entries {
        builder = builder.add_file(path, data);
    }
    builder.build()
}

/// Builder for ZIP test archives with various entry types.
///
/// # Examples
///
/// ```
/// use intake_core::test_utils::ZipTestBuilder;
///
/// let zip_data = ZipTestBuilder::new()
///     .add_file("file.txt", b"content")
///     .add_directory("dir/")
///     .build();
/// ```
pub struct ZipTestBuilder {
    zip: ZipWriter<Cursor<Vec<u8>>>,
}

impl ZipTestBuilder {
    /// Creates a new ZIP test builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
        }
    }

    /// Adds a stored regular file.
    #[must_use]
    pub fn add_file(mut self, path: &str, data: &[u8]) -> Self {
        let options = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored)
            .unix_permissions(0o644);

        self.zip.start_file(path, options).unwrap();
        self.zip.write_all(data).unwrap();
        self
    }

    /// Adds a deflate-compressed regular file.
    #[must_use]
    pub fn add_deflated(mut self, path: &str, data: &[u8]) -> Self {
        let options = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .unix_permissions(0o644);

        self.zip.start_file(path, options).unwrap();
        self.zip.write_all(data).unwrap();
        self
    }

    /// Adds a directory entry.
    #[must_use]
    pub fn add_directory(mut self, path: &str) -> Self {
        let options = SimpleFileOptions::default().unix_permissions(0o755);
        self.zip.add_directory(path, options).unwrap();
        self
    }

    /// Adds a symbolic link entry.
    #[must_use]
    pub fn add_symlink(mut self, path: &str, target: &str) -> Self {
        self.zip
            .add_symlink(path, target, SimpleFileOptions::default())
            .unwrap();
        self
    }

    /// Builds and returns the ZIP archive data.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        self.zip.finish().unwrap().into_inner()
    }
}

impl Default for ZipTestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Wraps a text payload in `levels` zips, each inside the next.
///
/// The innermost archive holds `payload.txt`; the others hold a single
/// `levelN.zip`. The payload therefore sits at depth `levels`.
#[must_use]
pub fn nested_zip(levels: usize, payload: &[u8]) -> Vec<u8> {
    let mut data = create_test_zip(&[("payload.txt", payload)]);
    for level in (1..levels).rev() {
        let name = format!("level{level}.zip");
        data = create_test_zip(&[(name.as_str(), data.as_slice())]);
    }
    data
}

/// Central directory entries of a well-formed archive as
/// `(central header offset, local header offset)` pairs.
fn directory_entries(zip: &[u8]) -> Vec<(usize, usize)> {
    let eocd = zip
        .windows(4)
        .rposition(|w| w == b"PK\x05\x06")
        .unwrap();
    let count = usize::from(u16::from_le_bytes([zip[eocd + 10], zip[eocd + 11]]));
    let mut offset = read_u32(zip, eocd + 16);

    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        assert_eq!(&zip[offset..offset + 4], b"PK\x01\x02");
        let local = read_u32(zip, offset + 42);
        entries.push((offset, local));

        let name_len = usize::from(u16::from_le_bytes([zip[offset + 28], zip[offset + 29]]));
        let extra_len = usize::from(u16::from_le_bytes([zip[offset + 30], zip[offset + 31]]));
        let comment_len = usize::from(u16::from_le_bytes([zip[offset + 32], zip[offset + 33]]));
        offset += 46 + name_len + extra_len + comment_len;
    }
    entries
}

fn read_u32(data: &[u8], at: usize) -> usize {
    u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]]) as usize
}

/// Sets the "encrypted" general-purpose flag on every entry, in both the
/// local and the central headers.
///
/// The data itself stays plaintext; readers must refuse on the flag alone.
#[must_use]
pub fn mark_encrypted(mut zip: Vec<u8>) -> Vec<u8> {
    for (central, local) in directory_entries(&zip) {
        zip[central + 8] |= 0x01;
        zip[local + 6] |= 0x01;
    }
    zip
}

/// Flips the first data byte of the first entry so its checksum no longer
/// matches. Intended for stored entries.
#[must_use]
pub fn corrupt_first_member(mut zip: Vec<u8>) -> Vec<u8> {
    let (_, local) = directory_entries(&zip)[0];
    let name_len = usize::from(u16::from_le_bytes([zip[local + 26], zip[local + 27]]));
    let extra_len = usize::from(u16::from_le_bytes([zip[local + 28], zip[local + 29]]));
    zip[local + 30 + name_len + extra_len] ^= 0xff;
    zip
}

/// Creates a one-page PDF showing `text`.
#[must_use]
pub fn create_test_pdf(text: &str) -> Vec<u8> {
    create_test_pdf_pages(&[text])
}

/// Creates a PDF with one page per entry, each showing that entry's text.
#[must_use]
pub fn create_test_pdf_pages(pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![100.into(), 600.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = i64::try_from(kids.len()).unwrap();
    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// A minimal PDF whose trailer references a standard security handler.
///
/// The body is not really encrypted; it only needs to carry the markers a
/// reader or probe looks for.
#[must_use]
pub fn encrypted_pdf_stub() -> Vec<u8> {
    b"%PDF-1.6\n\
      1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n\
      2 0 obj\n<< /Type /Pages /Kids [] /Count 0 >>\nendobj\n\
      5 0 obj\n<< /Filter /Standard /V 2 /R 3 /Length 128 /P -3904 \
      /O <00000000000000000000000000000000> /U <00000000000000000000000000000000> >>\nendobj\n\
      trailer\n<< /Size 6 /Root 1 0 R /Encrypt 5 0 R >>\n%%EOF\n"
        .to_vec()
}

/// Creates a single-sheet XLSX workbook with inline-string cells.
///
/// # Examples
///
/// ```
/// use intake_core::test_utils::create_test_xlsx;
///
/// let workbook = create_test_xlsx(&[&["name", "score"], &["alice", "42"]]);
/// assert!(workbook.starts_with(b"PK"));
/// ```
#[must_use]
pub fn create_test_xlsx(rows: &[&[&str]]) -> Vec<u8> {
    create_test_xlsx_with_trailing_xml(rows, "")
}

/// Like [`create_test_xlsx`], with `trailing` spliced into the sheet data
/// after the generated rows.
#[must_use]
pub fn create_test_xlsx_with_trailing_xml(rows: &[&[&str]], trailing: &str) -> Vec<u8> {
    const CONTENT_TYPES: &str = concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
        r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
        r#"<Default Extension="xml" ContentType="application/xml"/>"#,
        r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
        r#"<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
        r#"</Types>"#
    );
    const ROOT_RELS: &str = concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>"#,
        r#"</Relationships>"#
    );
    const WORKBOOK: &str = concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" "#,
        r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
        r#"<sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets>"#,
        r#"</workbook>"#
    );
    const WORKBOOK_RELS: &str = concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>"#,
        r#"</Relationships>"#
    );

    let mut sheet = String::from(concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#
    ));
    for (r, row) in rows.iter().enumerate() {
        let row_num = r + 1;
        sheet.push_str(&format!(r#"<row r="{row_num}">"#));
        for (c, value) in row.iter().enumerate() {
            sheet.push_str(&format!(
                r#"<c r="{}{row_num}" t="inlineStr"><is><t>{}</t></is></c>"#,
                column_name(c),
                escape_xml(value)
            ));
        }
        sheet.push_str("</row>");
    }
    sheet.push_str(trailing);
    sheet.push_str("</sheetData></worksheet>");

    ZipTestBuilder::new()
        .add_deflated("[Content_Types].xml", CONTENT_TYPES.as_bytes())
        .add_deflated("_rels/.rels", ROOT_RELS.as_bytes())
        .add_deflated("xl/workbook.xml", WORKBOOK.as_bytes())
        .add_deflated("xl/_rels/workbook.xml.rels", WORKBOOK_RELS.as_bytes())
        .add_deflated("xl/worksheets/sheet1.xml", sheet.as_bytes())
        .build()
}

/// `0 → A`, `25 → Z`, `26 → AA`.
fn column_name(mut index: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'A' + u8::try_from(index % 26).unwrap());
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    name.reverse();
    String::from_utf8(name).unwrap()
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use zip::ZipArchive;

    #[test]
    fn test_create_test_zip() {
        let zip_data = create_test_zip(&[("file.txt", b"hello")]);
        let archive = ZipArchive::new(Cursor::new(zip_data)).unwrap();
        assert_eq!(archive.len(), 1);
    }

    #[test]
    fn test_mark_encrypted_sets_flag() {
        let zip_data = mark_encrypted(create_test_zip(&[("a.txt", b"a"), ("b.txt", b"b")]));
        let mut archive = ZipArchive::new(Cursor::new(zip_data)).unwrap();
        for i in 0..archive.len() {
            assert!(archive.by_index_raw(i).unwrap().encrypted());
        }
    }

    #[test]
    fn test_nested_zip_levels() {
        let data = nested_zip(3, b"x");
        let mut archive = ZipArchive::new(Cursor::new(data)).unwrap();
        assert_eq!(archive.by_index(0).unwrap().name(), "level1.zip");
    }

    #[test]
    fn test_pdf_fixture_parses() {
        let doc = Document::load_mem(&create_test_pdf_pages(&["one", "two"])).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[test]
    fn test_column_names() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(27), "AB");
    }
}
