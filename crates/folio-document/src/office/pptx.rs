// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Picture-only .pptx generation: one full-bleed image per slide.

use std::io::{Cursor, Seek, Write};

use folio_core::error::{FolioError, Result};
use tracing::{info, instrument};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use super::escape_xml;
use crate::traits::{PresentationWriter, SlideImage};

const NS_DRAWING: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_RELATIONSHIPS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_PRESENTATION: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const NS_PACKAGE_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const REL_TYPE_SLIDE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
const REL_TYPE_SLIDE_LAYOUT: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
const REL_TYPE_SLIDE_MASTER: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
const REL_TYPE_THEME: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
const REL_TYPE_IMAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

/// Slide width in EMU (10 inches); the height follows the first image's
/// aspect ratio.
const SLIDE_WIDTH_EMU: u64 = 9_144_000;
/// 4:3 fallback height.
const SLIDE_HEIGHT_EMU: u64 = 6_858_000;

type PartResult = std::result::Result<(), zip::result::ZipError>;

/// Writes presentations whose slides are page pictures.
#[derive(Debug, Clone)]
pub struct PptxWriter {
    title: String,
}

impl Default for PptxWriter {
    fn default() -> Self {
        Self::new("Converted document")
    }
}

impl PptxWriter {
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into() }
    }

    fn write_package<W: Write + Seek>(&self, zip: &mut ZipWriter<W>, slides: &[SlideImage]) -> PartResult {
        let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        let (cx, cy) = slide_size(slides);

        put(zip, options, "[Content_Types].xml", &content_types(slides.len()))?;
        put(zip, options, "_rels/.rels", ROOT_RELS)?;
        put(zip, options, "docProps/app.xml", &app_xml(slides.len()))?;
        put(zip, options, "docProps/core.xml", &core_xml(&self.title))?;
        put(zip, options, "ppt/presentation.xml", &presentation_xml(slides.len(), cx, cy))?;
        put(zip, options, "ppt/_rels/presentation.xml.rels", &presentation_rels(slides.len()))?;
        put(zip, options, "ppt/theme/theme1.xml", &theme_xml())?;
        put(zip, options, "ppt/slideMasters/slideMaster1.xml", &slide_master_xml())?;
        put(zip, options, "ppt/slideMasters/_rels/slideMaster1.xml.rels", &slide_master_rels())?;
        put(zip, options, "ppt/slideLayouts/slideLayout1.xml", &slide_layout_xml())?;
        put(zip, options, "ppt/slideLayouts/_rels/slideLayout1.xml.rels", &slide_layout_rels())?;

        for (index, slide) in slides.iter().enumerate() {
            let number = index + 1;
            put(zip, options, &format!("ppt/slides/slide{number}.xml"), &slide_xml(number, cx, cy))?;
            put(zip, options, &format!("ppt/slides/_rels/slide{number}.xml.rels"), &slide_rels(number))?;
            zip.start_file(format!("ppt/media/image{number}.png"), options)?;
            zip.write_all(&slide.png)?;
        }
        Ok(())
    }
}

impl PresentationWriter for PptxWriter {
    #[instrument(skip_all, fields(slides = slides.len()))]
    fn image_slides(&self, slides: &[SlideImage]) -> Result<Vec<u8>> {
        if slides.is_empty() {
            return Err(FolioError::OfficeError("a presentation needs at least one slide".into()));
        }
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        self.write_package(&mut zip, slides)
            .map_err(|err| FolioError::OfficeError(format!("cannot write presentation: {}", err)))?;
        let bytes = zip
            .finish()
            .map_err(|err| FolioError::OfficeError(format!("cannot finish presentation: {}", err)))?
            .into_inner();
        info!(output_bytes = bytes.len(), "Presentation written");
        Ok(bytes)
    }
}

fn put<W: Write + Seek>(zip: &mut ZipWriter<W>, options: SimpleFileOptions, name: &str, content: &str) -> PartResult {
    zip.start_file(name, options)?;
    zip.write_all(content.as_bytes())?;
    Ok(())
}

fn slide_size(slides: &[SlideImage]) -> (u64, u64) {
    match slides.first() {
        Some(first) if first.width > 0 && first.height > 0 => {
            let cy = SLIDE_WIDTH_EMU * u64::from(first.height) / u64::from(first.width);
            (SLIDE_WIDTH_EMU, cy)
        }
        _ => (SLIDE_WIDTH_EMU, SLIDE_HEIGHT_EMU),
    }
}

// -- Package parts ------------------------------------------------------------

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
  <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/>
</Relationships>"#;

fn content_types(slide_count: usize) -> String {
    let mut content = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Default Extension="png" ContentType="image/png"/>
  <Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>
  <Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/>
  <Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/>
  <Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/>
  <Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
  <Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>
"#,
    );
    for number in 1..=slide_count {
        content.push_str(&format!(
            "  <Override PartName=\"/ppt/slides/slide{number}.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.slide+xml\"/>\n"
        ));
    }
    content.push_str("</Types>");
    content
}

fn app_xml(slide_count: usize) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties">
  <Application>Folio</Application>
  <Slides>{slide_count}</Slides>
</Properties>"#
    )
}

fn core_xml(title: &str) -> String {
    let now = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <dc:title>{}</dc:title>
  <dc:creator>Folio</dc:creator>
  <dcterms:created xsi:type="dcterms:W3CDTF">{now}</dcterms:created>
  <dcterms:modified xsi:type="dcterms:W3CDTF">{now}</dcterms:modified>
</cp:coreProperties>"#,
        escape_xml(title)
    )
}

fn presentation_xml(slide_count: usize, cx: u64, cy: u64) -> String {
    // rId1 is the slide master, rId2 the theme, slides follow.
    let slide_ids: String = (1..=slide_count)
        .map(|number| format!("    <p:sldId id=\"{}\" r:id=\"rId{}\"/>\n", 255 + number, number + 2))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation xmlns:a="{NS_DRAWING}" xmlns:r="{NS_RELATIONSHIPS}" xmlns:p="{NS_PRESENTATION}">
  <p:sldMasterIdLst>
    <p:sldMasterId id="2147483648" r:id="rId1"/>
  </p:sldMasterIdLst>
  <p:sldIdLst>
{slide_ids}  </p:sldIdLst>
  <p:sldSz cx="{cx}" cy="{cy}"/>
  <p:notesSz cx="{cy}" cy="{cx}"/>
</p:presentation>"#
    )
}

fn presentation_rels(slide_count: usize) -> String {
    let mut rels = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{NS_PACKAGE_RELS}">
  <Relationship Id="rId1" Type="{REL_TYPE_SLIDE_MASTER}" Target="slideMasters/slideMaster1.xml"/>
  <Relationship Id="rId2" Type="{REL_TYPE_THEME}" Target="theme/theme1.xml"/>
"#
    );
    for number in 1..=slide_count {
        rels.push_str(&format!(
            "  <Relationship Id=\"rId{}\" Type=\"{REL_TYPE_SLIDE}\" Target=\"slides/slide{number}.xml\"/>\n",
            number + 2
        ));
    }
    rels.push_str("</Relationships>");
    rels
}

fn theme_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<a:theme xmlns:a="{NS_DRAWING}" name="Folio">
  <a:themeElements>
    <a:clrScheme name="Office">
      <a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1>
      <a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1>
      <a:dk2><a:srgbClr val="44546A"/></a:dk2>
      <a:lt2><a:srgbClr val="E7E6E6"/></a:lt2>
      <a:accent1><a:srgbClr val="4472C4"/></a:accent1>
      <a:accent2><a:srgbClr val="ED7D31"/></a:accent2>
      <a:accent3><a:srgbClr val="A5A5A5"/></a:accent3>
      <a:accent4><a:srgbClr val="FFC000"/></a:accent4>
      <a:accent5><a:srgbClr val="5B9BD5"/></a:accent5>
      <a:accent6><a:srgbClr val="70AD47"/></a:accent6>
      <a:hlink><a:srgbClr val="0563C1"/></a:hlink>
      <a:folHlink><a:srgbClr val="954F72"/></a:folHlink>
    </a:clrScheme>
    <a:fontScheme name="Office">
      <a:majorFont><a:latin typeface="Calibri Light"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont>
      <a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont>
    </a:fontScheme>
    <a:fmtScheme name="Office">
      <a:fillStyleLst>
        <a:solidFill><a:schemeClr val="phClr"/></a:solidFill>
        <a:solidFill><a:schemeClr val="phClr"/></a:solidFill>
        <a:solidFill><a:schemeClr val="phClr"/></a:solidFill>
      </a:fillStyleLst>
      <a:lnStyleLst>
        <a:ln w="6350"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>
        <a:ln w="12700"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>
        <a:ln w="19050"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>
      </a:lnStyleLst>
      <a:effectStyleLst>
        <a:effectStyle><a:effectLst/></a:effectStyle>
        <a:effectStyle><a:effectLst/></a:effectStyle>
        <a:effectStyle><a:effectLst/></a:effectStyle>
      </a:effectStyleLst>
      <a:bgFillStyleLst>
        <a:solidFill><a:schemeClr val="phClr"/></a:solidFill>
        <a:solidFill><a:schemeClr val="phClr"/></a:solidFill>
        <a:solidFill><a:schemeClr val="phClr"/></a:solidFill>
      </a:bgFillStyleLst>
    </a:fmtScheme>
  </a:themeElements>
</a:theme>"#
    )
}

fn empty_tree() -> &'static str {
    r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>"#
}

fn slide_master_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldMaster xmlns:a="{NS_DRAWING}" xmlns:r="{NS_RELATIONSHIPS}" xmlns:p="{NS_PRESENTATION}">
  <p:cSld><p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg><p:spTree>{}</p:spTree></p:cSld>
  <p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>
  <p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst>
</p:sldMaster>"#,
        empty_tree()
    )
}

fn slide_master_rels() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{NS_PACKAGE_RELS}">
  <Relationship Id="rId1" Type="{REL_TYPE_SLIDE_LAYOUT}" Target="../slideLayouts/slideLayout1.xml"/>
  <Relationship Id="rId2" Type="{REL_TYPE_THEME}" Target="../theme/theme1.xml"/>
</Relationships>"#
    )
}

fn slide_layout_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldLayout xmlns:a="{NS_DRAWING}" xmlns:r="{NS_RELATIONSHIPS}" xmlns:p="{NS_PRESENTATION}" type="blank" preserve="1">
  <p:cSld name="Blank"><p:spTree>{}</p:spTree></p:cSld>
  <p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>
</p:sldLayout>"#,
        empty_tree()
    )
}

fn slide_layout_rels() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{NS_PACKAGE_RELS}">
  <Relationship Id="rId1" Type="{REL_TYPE_SLIDE_MASTER}" Target="../slideMasters/slideMaster1.xml"/>
</Relationships>"#
    )
}

fn slide_xml(number: usize, cx: u64, cy: u64) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="{NS_DRAWING}" xmlns:r="{NS_RELATIONSHIPS}" xmlns:p="{NS_PRESENTATION}">
  <p:cSld>
    <p:spTree>
      {}
      <p:pic>
        <p:nvPicPr>
          <p:cNvPr id="2" name="Page {number}"/>
          <p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr>
          <p:nvPr/>
        </p:nvPicPr>
        <p:blipFill><a:blip r:embed="rId2"/><a:stretch><a:fillRect/></a:stretch></p:blipFill>
        <p:spPr>
          <a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>
          <a:prstGeom prst="rect"><a:avLst/></a:prstGeom>
        </p:spPr>
      </p:pic>
    </p:spTree>
  </p:cSld>
  <p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>
</p:sld>"#,
        empty_tree()
    )
}

fn slide_rels(number: usize) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{NS_PACKAGE_RELS}">
  <Relationship Id="rId1" Type="{REL_TYPE_SLIDE_LAYOUT}" Target="../slideLayouts/slideLayout1.xml"/>
  <Relationship Id="rId2" Type="{REL_TYPE_IMAGE}" Target="../media/image{number}.png"/>
</Relationships>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    fn slide(width: u32, height: u32) -> SlideImage {
        SlideImage {
            png: crate::test_utils::sample_png(width, height, [255, 255, 255, 255]),
            width,
            height,
        }
    }

    fn part(bytes: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut contents = String::new();
        archive.by_name(name).unwrap().read_to_string(&mut contents).unwrap();
        contents
    }

    #[test]
    fn one_slide_and_picture_per_image() {
        let pptx = PptxWriter::default().image_slides(&[slide(612, 792), slide(612, 792)]).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(pptx.as_slice())).unwrap();
        for name in [
            "ppt/slides/slide1.xml",
            "ppt/slides/slide2.xml",
            "ppt/media/image2.png",
            "ppt/slides/_rels/slide2.xml.rels",
        ] {
            assert!(archive.by_name(name).is_ok(), "missing {name}");
        }
        let presentation = part(&pptx, "ppt/presentation.xml");
        assert!(presentation.contains(r#"r:id="rId4""#));
        assert!(part(&pptx, "[Content_Types].xml").contains("/ppt/slides/slide2.xml"));
    }

    #[test]
    fn slide_size_follows_first_page_aspect() {
        assert_eq!(slide_size(&[slide(100, 50)]), (SLIDE_WIDTH_EMU, SLIDE_WIDTH_EMU / 2));
        assert_eq!(slide_size(&[]), (SLIDE_WIDTH_EMU, SLIDE_HEIGHT_EMU));
    }

    #[test]
    fn title_is_escaped() {
        let pptx = PptxWriter::new("Q&A <draft>").image_slides(&[slide(4, 3)]).unwrap();
        assert!(part(&pptx, "docProps/core.xml").contains("Q&amp;A &lt;draft&gt;"));
    }

    #[test]
    fn empty_presentation_is_rejected() {
        assert!(PptxWriter::default().image_slides(&[]).is_err());
    }
}
