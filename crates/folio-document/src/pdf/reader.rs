// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — open PDF documents and inspect individual pages (size,
// rotation, embedded text, embedded scan images) using the `lopdf` crate.

use image::DynamicImage;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use folio_core::error::{FolioError, Result};
use tracing::{debug, instrument, warn};

/// US Letter in PDF points, used when a page declares no /MediaBox.
const FALLBACK_PAGE_SIZE: (f32, f32) = (612.0, 792.0);

/// Upper bound on /Parent hops when resolving inherited page attributes.
const MAX_INHERITANCE_DEPTH: usize = 32;

/// Read-only view of a PDF document.
///
/// Wraps `lopdf::Document` and answers per-page questions with 1-indexed page
/// numbers.
pub struct PdfReader {
    /// The underlying lopdf document.
    document: Document,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data).map_err(|err| {
            FolioError::PdfError(format!("failed to load PDF from memory: {}", err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");

        Ok(Self { document })
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    /// Resolve a 1-indexed page number to its object id.
    pub fn page_id(&self, page_number: u32) -> Result<ObjectId> {
        let pages = self.document.get_pages();
        if page_number == 0 || page_number as usize > pages.len() {
            return Err(FolioError::InvalidPage {
                page: page_number,
                total: pages.len() as u32,
            });
        }

        // lopdf pages are keyed by 1-indexed page number.
        pages.get(&page_number).copied().ok_or_else(|| {
            FolioError::PdfError(format!("page {} not found in page tree", page_number))
        })
    }

    /// Page size in points (width, height) from the inherited /MediaBox,
    /// before any /Rotate is applied.
    pub fn page_size(&self, page_number: u32) -> Result<(f32, f32)> {
        let page_id = self.page_id(page_number)?;

        let size = self
            .inherited_attribute(page_id, b"MediaBox")
            .and_then(|obj| self.resolve(obj).as_array().ok())
            .and_then(|arr| media_box_size(arr));

        match size {
            Some(size) => Ok(size),
            None => {
                warn!(page_number, "page has no usable /MediaBox; assuming US Letter");
                Ok(FALLBACK_PAGE_SIZE)
            }
        }
    }

    /// Clockwise display rotation in degrees, normalised to 0/90/180/270.
    pub fn page_rotation(&self, page_number: u32) -> Result<u32> {
        let page_id = self.page_id(page_number)?;
        let rotation = self
            .inherited_attribute(page_id, b"Rotate")
            .and_then(|obj| self.resolve(obj).as_i64().ok())
            .unwrap_or(0);

        let normalised = rotation.rem_euclid(360);
        Ok(match normalised {
            90 | 180 | 270 => normalised as u32,
            _ => 0,
        })
    }

    /// Embedded text items of a page, each trimmed, empty items dropped.
    #[instrument(skip(self))]
    pub fn page_text_items(&self, page_number: u32) -> Result<Vec<String>> {
        self.page_id(page_number)?;

        let raw = self.document.extract_text(&[page_number]).map_err(|err| {
            FolioError::PdfError(format!(
                "failed to read text of page {}: {}",
                page_number, err
            ))
        })?;

        let items: Vec<String> = raw
            .lines()
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_owned)
            .collect();

        debug!(page_number, items = items.len(), "Page text items read");
        Ok(items)
    }

    /// The largest image XObject drawn on a page (the scan itself, for scanned
    /// documents), decoded. `None` when the page carries no image.
    #[instrument(skip(self))]
    pub fn page_image(&self, page_number: u32) -> Result<Option<DynamicImage>> {
        let page_id = self.page_id(page_number)?;

        let Some(resources) = self
            .inherited_attribute(page_id, b"Resources")
            .and_then(|obj| self.resolve(obj).as_dict().ok())
        else {
            return Ok(None);
        };

        let Some(xobjects) = resources
            .get(b"XObject")
            .ok()
            .and_then(|obj| self.resolve(obj).as_dict().ok())
        else {
            return Ok(None);
        };

        let mut largest: Option<(u64, &Stream)> = None;
        for (_name, obj_ref) in xobjects.iter() {
            let Object::Stream(stream) = self.resolve(obj_ref) else {
                continue;
            };
            if !is_image_subtype(&stream.dict) {
                continue;
            }
            let area = self.int_entry(&stream.dict, b"Width").unwrap_or(0).max(0) as u64
                * self.int_entry(&stream.dict, b"Height").unwrap_or(0).max(0) as u64;
            if largest.is_none_or(|(best, _)| area > best) {
                largest = Some((area, stream));
            }
        }

        let Some((_, stream)) = largest else {
            return Ok(None);
        };

        let image = self.decode_image_stream(stream)?;
        debug!(
            page_number,
            width = image.width(),
            height = image.height(),
            "Decoded page image"
        );
        Ok(Some(image))
    }

    // -- Helpers --------------------------------------------------------------

    /// Follow a reference to its target, or return the object as-is.
    fn resolve<'a>(&'a self, obj: &'a Object) -> &'a Object {
        match obj {
            Object::Reference(id) => self.document.get_object(*id).unwrap_or(obj),
            _ => obj,
        }
    }

    /// Look up a page attribute, walking /Parent for inheritable keys.
    fn inherited_attribute(&self, page_id: ObjectId, key: &[u8]) -> Option<&Object> {
        let mut current = self.document.get_object(page_id).ok()?.as_dict().ok()?;

        for _ in 0..MAX_INHERITANCE_DEPTH {
            if let Ok(value) = current.get(key) {
                return Some(value);
            }
            let parent = current.get(b"Parent").ok()?;
            current = self.resolve(parent).as_dict().ok()?;
        }

        None
    }

    fn int_entry(&self, dict: &Dictionary, key: &[u8]) -> Option<i64> {
        dict.get(key)
            .ok()
            .and_then(|obj| self.resolve(obj).as_i64().ok())
    }

    /// Decode an image XObject stream, handling JPEG, embedded image files,
    /// and raw 8-bit gray/RGB/CMYK samples.
    fn decode_image_stream(&self, stream: &Stream) -> Result<DynamicImage> {
        let content = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());

        // DCTDecode streams are JPEG files; some producers also embed PNG/TIFF.
        if let Ok(image) = image::load_from_memory(&content) {
            return Ok(image);
        }

        let width = self.int_entry(&stream.dict, b"Width").unwrap_or(0);
        let height = self.int_entry(&stream.dict, b"Height").unwrap_or(0);
        let bits = self.int_entry(&stream.dict, b"BitsPerComponent").unwrap_or(8);
        if width <= 0 || height <= 0 {
            return Err(FolioError::Render(format!(
                "image XObject has invalid size {}x{}",
                width, height
            )));
        }
        if bits != 8 {
            return Err(FolioError::Render(format!(
                "unsupported image depth: {} bits per component",
                bits
            )));
        }

        let (width, height) = (width as u32, height as u32);
        let channels = self.color_channels(&stream.dict);
        let expected = width as usize * height as usize * channels;
        if content.len() < expected {
            return Err(FolioError::Render(format!(
                "raw pixel buffer too small: {} bytes, expected {} ({}x{}x{})",
                content.len(),
                expected,
                width,
                height,
                channels
            )));
        }
        let samples = content[..expected].to_vec();

        let image = match channels {
            1 => image::GrayImage::from_raw(width, height, samples).map(DynamicImage::ImageLuma8),
            3 => image::RgbImage::from_raw(width, height, samples).map(DynamicImage::ImageRgb8),
            _ => image::RgbImage::from_raw(width, height, cmyk_to_rgb(&samples))
                .map(DynamicImage::ImageRgb8),
        };

        image.ok_or_else(|| FolioError::Render("failed to assemble raw image samples".into()))
    }

    /// Channel count from /ColorSpace (1 gray, 3 RGB, 4 CMYK).
    fn color_channels(&self, dict: &Dictionary) -> usize {
        let Some(color_space) = dict.get(b"ColorSpace").ok().map(|obj| self.resolve(obj)) else {
            return 3;
        };

        match color_space {
            Object::Name(name) => match name.as_slice() {
                b"DeviceGray" | b"CalGray" => 1,
                b"DeviceCMYK" => 4,
                _ => 3,
            },
            Object::Array(arr) => match arr.first() {
                Some(Object::Name(name)) if name == b"ICCBased" => arr
                    .get(1)
                    .and_then(|obj| match self.resolve(obj) {
                        Object::Stream(icc) => self.int_entry(&icc.dict, b"N"),
                        _ => None,
                    })
                    .map(|n| n.clamp(1, 4) as usize)
                    .map(|n| if n == 2 { 3 } else { n })
                    .unwrap_or(3),
                Some(Object::Name(name)) if name == b"Indexed" => 1,
                _ => 3,
            },
            _ => 3,
        }
    }
}

/// Check if a stream dictionary has /Subtype /Image.
fn is_image_subtype(dict: &Dictionary) -> bool {
    dict.get(b"Subtype")
        .map(|obj| matches!(obj, Object::Name(name) if name == b"Image"))
        .unwrap_or(false)
}

/// Width and height of a [x0 y0 x1 y1] box.
fn media_box_size(values: &[Object]) -> Option<(f32, f32)> {
    if values.len() != 4 {
        return None;
    }
    let mut coords = [0.0f32; 4];
    for (slot, value) in coords.iter_mut().zip(values) {
        *slot = match value {
            Object::Integer(i) => *i as f32,
            Object::Real(r) => *r as f32,
            _ => return None,
        };
    }
    let width = (coords[2] - coords[0]).abs();
    let height = (coords[3] - coords[1]).abs();
    (width > 0.0 && height > 0.0).then_some((width, height))
}

/// Naive CMYK → RGB, good enough for recognition.
fn cmyk_to_rgb(samples: &[u8]) -> Vec<u8> {
    samples
        .chunks_exact(4)
        .flat_map(|px| {
            let k = 255 - px[3] as u16;
            [
                ((255 - px[0] as u16) * k / 255) as u8,
                ((255 - px[1] as u16) * k / 255) as u8,
                ((255 - px[2] as u16) * k / 255) as u8,
            ]
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Synthetic PDFs built with lopdf for tests across this crate.

    use lopdf::{Document, Object, Stream, dictionary};

    /// One text page per entry; `None` produces a page with no text at all.
    pub fn text_pdf(pages: &[Option<&str>]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in pages {
            let content = match text {
                Some(text) => format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET"),
                None => String::new(),
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => dictionary! {
                    "Font" => dictionary! { "F1" => font_id },
                },
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
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );

        finish(doc, pages_id)
    }

    /// A single scanned page: a raw 8-bit grayscale image filling a
    /// `page_w` x `page_h` point page, optionally rotated.
    pub fn scanned_pdf(
        image_w: u32,
        image_h: u32,
        page_w: i64,
        page_h: i64,
        rotate: i64,
    ) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let pixels: Vec<u8> = (0..image_w * image_h)
            .map(|i| if (i / image_w) % 8 < 4 { 20 } else { 235 })
            .collect();
        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => image_w as i64,
                "Height" => image_h as i64,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            pixels,
        ));
        let content = format!("q {page_w} 0 0 {page_h} 0 0 cm /Im1 Do Q");
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), page_w.into(), page_h.into()],
            "Rotate" => rotate,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im1" => image_id },
            },
        });

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );

        finish(doc, pages_id)
    }

    fn finish(mut doc: Document, pages_id: lopdf::ObjectId) -> Vec<u8> {
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).expect("serialise test PDF");
        buf
    }
}
