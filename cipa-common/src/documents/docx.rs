//! Minimal WordprocessingML (.docx) package writer
//!
//! Produces a package with one document part, an optional header logo and
//! plain paragraphs/tables. Styling is inline; no style part is emitted.

use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const NS_DECLS: &str = concat!(
    r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
    r#"xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" "#,
    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
    r#"xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture""#
);

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="png" ContentType="image/png"/><Default Extension="jpeg" ContentType="image/jpeg"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const IMAGE_REL_TYPE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

/// 1 inch in English Metric Units
const EMU_PER_INCH: i64 = 914_400;

/// Raster format of an embedded image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    /// Detect from magic bytes
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
            Some(ImageFormat::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageFormat::Jpeg)
        } else {
            None
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
        }
    }
}

/// Branding image placed at the top of the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Logo {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
}

impl Logo {
    /// Accept PNG or JPEG bytes, reject anything else
    pub fn from_bytes(bytes: Vec<u8>) -> Option<Self> {
        ImageFormat::sniff(&bytes).map(|format| Self { bytes, format })
    }
}

/// Paragraph alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
    Justify,
}

impl Align {
    fn as_str(&self) -> &'static str {
        match self {
            Align::Left => "left",
            Align::Center => "center",
            Align::Right => "right",
            Align::Justify => "both",
        }
    }
}

/// Escape text for XML content and attribute values
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

fn run(text: &str, bold: bool, size_half_points: Option<u32>) -> String {
    let mut props = String::new();
    if bold {
        props.push_str("<w:b/>");
    }
    if let Some(size) = size_half_points {
        props.push_str(&format!(r#"<w:sz w:val="{}"/>"#, size));
    }
    let rpr = if props.is_empty() {
        String::new()
    } else {
        format!("<w:rPr>{}</w:rPr>", props)
    };
    format!(
        r#"<w:r>{}<w:t xml:space="preserve">{}</w:t></w:r>"#,
        rpr,
        escape_xml(text)
    )
}

fn paragraph_xml(runs: &str, align: Align) -> String {
    format!(
        r#"<w:p><w:pPr><w:jc w:val="{}"/></w:pPr>{}</w:p>"#,
        align.as_str(),
        runs
    )
}

/// Accumulates body blocks and writes the package
#[derive(Debug, Default)]
pub struct DocxBuilder {
    body: Vec<String>,
    logo: Option<Logo>,
}

impl DocxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a logo at the top of the document
    pub fn logo(&mut self, logo: Logo) -> &mut Self {
        self.logo = Some(logo);
        self
    }

    pub fn title(&mut self, text: &str) -> &mut Self {
        self.body.push(paragraph_xml(&run(text, true, Some(28)), Align::Center));
        self
    }

    pub fn heading(&mut self, text: &str) -> &mut Self {
        self.body.push(paragraph_xml(&run(text, true, Some(24)), Align::Left));
        self
    }

    pub fn paragraph(&mut self, text: &str) -> &mut Self {
        self.body.push(paragraph_xml(&run(text, false, None), Align::Justify));
        self
    }

    pub fn aligned(&mut self, text: &str, align: Align) -> &mut Self {
        self.body.push(paragraph_xml(&run(text, false, None), align));
        self
    }

    /// "Label: value" with the label in bold
    pub fn field(&mut self, label: &str, value: &str) -> &mut Self {
        let runs = format!("{}{}", run(&format!("{}: ", label), true, None), run(value, false, None));
        self.body.push(paragraph_xml(&runs, Align::Left));
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.body.push("<w:p/>".to_string());
        self
    }

    /// Signature line with the signer's name and role below it
    pub fn signature_line(&mut self, name: &str, role: &str) -> &mut Self {
        self.blank();
        self.aligned("_________________________________________", Align::Center);
        self.aligned(name, Align::Center);
        self.aligned(role, Align::Center);
        self
    }

    /// Bordered table; the first row is rendered bold as the header
    pub fn table(&mut self, header: &[&str], rows: &[Vec<String>]) -> &mut Self {
        let border = r#"w:val="single" w:sz="4" w:space="0" w:color="000000""#;
        let mut xml = format!(
            concat!(
                r#"<w:tbl><w:tblPr><w:tblW w:w="5000" w:type="pct"/><w:tblBorders>"#,
                r#"<w:top {b}/><w:left {b}/><w:bottom {b}/><w:right {b}/><w:insideH {b}/><w:insideV {b}/>"#,
                r#"</w:tblBorders></w:tblPr><w:tblGrid/>"#
            ),
            b = border
        );

        let cell = |text: &str, bold: bool| {
            format!(
                "<w:tc><w:tcPr/>{}</w:tc>",
                paragraph_xml(&run(text, bold, None), Align::Left)
            )
        };

        xml.push_str("<w:tr>");
        for h in header {
            xml.push_str(&cell(*h, true));
        }
        xml.push_str("</w:tr>");

        for row in rows {
            xml.push_str("<w:tr>");
            for value in row {
                xml.push_str(&cell(value.as_str(), false));
            }
            xml.push_str("</w:tr>");
        }

        xml.push_str("</w:tbl>");
        self.body.push(xml);
        // Word requires a paragraph between a table and the section end
        self.blank();
        self
    }

    pub fn page_break(&mut self) -> &mut Self {
        self.body.push(r#"<w:p><w:r><w:br w:type="page"/></w:r></w:p>"#.to_string());
        self
    }

    fn logo_paragraph(format: ImageFormat) -> String {
        let cx = EMU_PER_INCH * 3 / 2;
        let cy = EMU_PER_INCH * 3 / 4;
        let name = format!("logo.{}", format.extension());
        format!(
            concat!(
                r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:drawing>"#,
                r#"<wp:inline distT="0" distB="0" distL="0" distR="0">"#,
                r#"<wp:extent cx="{cx}" cy="{cy}"/><wp:docPr id="1" name="{name}"/>"#,
                r#"<a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
                r#"<pic:pic><pic:nvPicPr><pic:cNvPr id="0" name="{name}"/><pic:cNvPicPr/></pic:nvPicPr>"#,
                r#"<pic:blipFill><a:blip r:embed="rIdLogo"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
                r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
                r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr></pic:pic>"#,
                r#"</a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>"#
            ),
            cx = cx,
            cy = cy,
            name = name
        )
    }

    /// `word/document.xml` content
    pub fn document_xml(&self) -> String {
        let mut xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document {}><w:body>"#,
            NS_DECLS
        );
        if let Some(logo) = &self.logo {
            xml.push_str(&Self::logo_paragraph(logo.format));
        }
        for block in &self.body {
            xml.push_str(block);
        }
        xml.push_str(
            r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="1134" w:right="1134" w:bottom="1134" w:left="1134" w:header="709" w:footer="709" w:gutter="0"/></w:sectPr>"#,
        );
        xml.push_str("</w:body></w:document>");
        xml
    }

    fn document_rels(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        if let Some(logo) = &self.logo {
            xml.push_str(&format!(
                r#"<Relationship Id="rIdLogo" Type="{}" Target="media/logo.{}"/>"#,
                IMAGE_REL_TYPE,
                logo.format.extension()
            ));
        }
        xml.push_str("</Relationships>");
        xml
    }

    /// Write the zip package
    pub fn finish(&self) -> zip::result::ZipResult<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.start_file("[Content_Types].xml", options)?;
        zip.write_all(CONTENT_TYPES.as_bytes())?;

        zip.start_file("_rels/.rels", options)?;
        zip.write_all(PACKAGE_RELS.as_bytes())?;

        zip.start_file("word/document.xml", options)?;
        zip.write_all(self.document_xml().as_bytes())?;

        zip.start_file("word/_rels/document.xml.rels", options)?;
        zip.write_all(self.document_rels().as_bytes())?;

        if let Some(logo) = &self.logo {
            zip.start_file(format!("word/media/logo.{}", logo.format.extension()), options)?;
            zip.write_all(&logo.bytes)?;
        }

        Ok(zip.finish()?.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    fn entry(bytes: &[u8], name: &str) -> Option<String> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).ok()?;
        let mut file = archive.by_name(name).ok()?;
        let mut out = String::new();
        file.read_to_string(&mut out).ok()?;
        Some(out)
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("A & B <C> \"d\""), "A &amp; B &lt;C&gt; &quot;d&quot;");
    }

    #[test]
    fn test_package_contains_required_parts() {
        let mut builder = DocxBuilder::new();
        builder.title("EDITAL").paragraph("Texto & mais");
        let bytes = builder.finish().unwrap();

        assert!(entry(&bytes, "[Content_Types].xml").is_some());
        assert!(entry(&bytes, "_rels/.rels").is_some());
        let document = entry(&bytes, "word/document.xml").unwrap();
        assert!(document.contains("EDITAL"));
        assert!(document.contains("Texto &amp; mais"));
        assert!(!document.contains("rIdLogo"));
    }

    #[test]
    fn test_logo_is_embedded_and_related() {
        let logo = Logo::from_bytes(PNG_HEADER.to_vec()).unwrap();
        let mut builder = DocxBuilder::new();
        builder.logo(logo).title("ATA");
        let bytes = builder.finish().unwrap();

        let rels = entry(&bytes, "word/_rels/document.xml.rels").unwrap();
        assert!(rels.contains("media/logo.png"));
        assert!(entry(&bytes, "word/document.xml").unwrap().contains(r#"r:embed="rIdLogo""#));

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert!(archive.by_name("word/media/logo.png").is_ok());
    }

    #[test]
    fn test_sniff_rejects_unknown_formats() {
        assert_eq!(ImageFormat::sniff(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageFormat::Jpeg));
        assert!(Logo::from_bytes(b"GIF89a".to_vec()).is_none());
    }

    #[test]
    fn test_table_renders_header_and_rows() {
        let mut builder = DocxBuilder::new();
        builder.table(&["Nome", "Cargo"], &[vec!["Ana".to_string(), "Técnica".to_string()]]);
        let xml = builder.document_xml();
        assert!(xml.contains("<w:tbl>"));
        assert_eq!(xml.matches("<w:tr>").count(), 2);
    }
}
