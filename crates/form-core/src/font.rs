//! Appearance font embedding
//!
//! The template's design-time font does not ship with the document, so field
//! appearances are drawn with a caller-supplied TrueType font embedded as a
//! Type0/Identity-H CID font. The full font file is embedded: the values are
//! dynamic user text, so subsetting risks missing characters.

use crate::{FormError, Result};
use lopdf::{Dictionary, Object, Stream};
use std::collections::HashSet;

/// A parsed TrueType font used to draw field appearances
pub struct EmbeddedFont {
    /// Font name used as BaseFont
    pub name: String,
    /// Raw TTF data
    ttf_data: Vec<u8>,
    /// Characters drawn with this font (for the W array and ToUnicode)
    used_chars: HashSet<char>,
    /// Parsed font face
    face: ttf_parser::Face<'static>,
}

/// PDF objects generated for font embedding
pub struct FontObjects {
    /// Type0 font dictionary
    pub type0_font: Dictionary,
    /// CIDFont Type2 dictionary
    pub cid_font: Dictionary,
    /// Font descriptor dictionary
    pub font_descriptor: Dictionary,
    /// Font file stream (full TTF data)
    pub font_file_stream: Stream,
    /// ToUnicode CMap stream
    pub tounicode_stream: Stream,
}

impl EmbeddedFont {
    /// Parse a TrueType font from bytes
    pub fn from_ttf(name: &str, ttf_data: &[u8]) -> Result<Self> {
        let data = ttf_data.to_vec();

        // The face borrows the data for the document lifetime; fonts are
        // loaded once per generation, so leaking the copy is acceptable.
        let static_data: &'static [u8] = Box::leak(data.clone().into_boxed_slice());

        let face = ttf_parser::Face::parse(static_data, 0)
            .map_err(|e| FormError::FontParse(format!("{e:?}")))?;

        Ok(Self {
            name: name.to_string(),
            ttf_data: data,
            used_chars: HashSet::new(),
            face,
        })
    }

    /// Record characters that will be drawn with this font
    pub fn add_chars(&mut self, text: &str) {
        for c in text.chars() {
            self.used_chars.insert(c);
        }
    }

    /// Get glyph ID for a character
    pub fn glyph_id(&self, c: char) -> Option<u16> {
        self.face.glyph_index(c).map(|id| id.0)
    }

    /// Check if the font has a glyph for the given character
    pub fn has_glyph(&self, c: char) -> bool {
        self.glyph_id(c).map(|id| id != 0).unwrap_or(false)
    }

    /// Font units per em
    pub fn units_per_em(&self) -> u16 {
        self.face.units_per_em()
    }

    /// Calculate text width in points for a given font size
    pub fn text_width_points(&self, text: &str, font_size: f32) -> f64 {
        let width: u32 = text
            .chars()
            .filter_map(|c| {
                let gid = self.face.glyph_index(c)?;
                self.face.glyph_hor_advance(gid)
            })
            .map(|w| w as u32)
            .sum();

        (width as f64 / self.units_per_em() as f64) * font_size as f64
    }

    /// Encode text as an Identity-H hex string for the Tj operator
    pub fn encode_text_hex(&self, text: &str) -> String {
        let mut result = String::new();
        for c in text.chars() {
            let gid = self.glyph_id(c).unwrap_or(0);
            result.push_str(&format!("{gid:04X}"));
        }
        format!("<{result}>")
    }

    /// Generate all PDF objects needed to embed this font
    ///
    /// Reference placeholders between the objects are wired up by the caller
    /// when the objects are added to a document.
    pub fn to_pdf_objects(&self) -> FontObjects {
        let font_name = Object::Name(self.name.clone().into());

        let tounicode_content = self.generate_tounicode_cmap();
        let tounicode_stream = Stream::new(
            Dictionary::from_iter(vec![
                ("Type", "CMap".into()),
                ("Length", (tounicode_content.len() as i32).into()),
            ]),
            tounicode_content.into_bytes(),
        );

        let font_file_stream = Stream::new(
            Dictionary::from_iter(vec![(
                "Length1",
                (self.ttf_data.len() as i32).into(),
            )]),
            self.ttf_data.clone(),
        );

        let units_per_em = self.units_per_em() as i32;
        let ascender = self.face.ascender() as i32;
        let descender = self.face.descender() as i32;

        let font_bbox = vec![
            0.into(),
            descender.into(),
            units_per_em.into(),
            ascender.into(),
        ];

        let font_descriptor = Dictionary::from_iter(vec![
            ("Type", "FontDescriptor".into()),
            ("FontName", font_name.clone()),
            ("Flags", 4.into()), // Symbolic
            ("FontBBox", font_bbox.into()),
            ("ItalicAngle", 0.into()),
            ("Ascent", ascender.into()),
            ("Descent", descender.into()),
            ("CapHeight", ascender.into()),
            ("StemV", 80.into()),
        ]);

        let cid_system_info = Dictionary::from_iter(vec![
            ("Registry", Object::string_literal("Adobe")),
            ("Ordering", Object::string_literal("Identity")),
            ("Supplement", 0.into()),
        ]);

        let cid_font = Dictionary::from_iter(vec![
            ("Type", "Font".into()),
            ("Subtype", "CIDFontType2".into()),
            ("BaseFont", font_name.clone()),
            ("CIDSystemInfo", cid_system_info.into()),
            ("W", self.generate_widths_array().into()),
            ("DW", 1000.into()),
        ]);

        let type0_font = Dictionary::from_iter(vec![
            ("Type", "Font".into()),
            ("Subtype", "Type0".into()),
            ("BaseFont", font_name),
            ("Encoding", "Identity-H".into()),
        ]);

        FontObjects {
            type0_font,
            cid_font,
            font_descriptor,
            font_file_stream,
            tounicode_stream,
        }
    }

    /// Generate the /W array for used glyph widths
    fn generate_widths_array(&self) -> Vec<Object> {
        let mut gids: Vec<u16> = self
            .used_chars
            .iter()
            .filter_map(|&c| self.glyph_id(c))
            .collect();
        gids.sort_unstable();
        gids.dedup();

        // Individual mapping format: gid [width] gid [width] ...
        let scale = 1000.0 / self.units_per_em() as f64;
        let mut widths = Vec::with_capacity(gids.len() * 2);
        for gid in gids {
            let advance = self
                .face
                .glyph_hor_advance(ttf_parser::GlyphId(gid))
                .unwrap_or(1000);
            let scaled = (advance as f64 * scale).round() as i64;
            widths.push((gid as i64).into());
            widths.push(vec![scaled.into()].into());
        }
        widths
    }

    /// Generate the ToUnicode CMap stream content
    fn generate_tounicode_cmap(&self) -> String {
        let mut cmap = String::new();

        cmap.push_str("/CIDInit /ProcSet findresource begin\n");
        cmap.push_str("12 dict begin\n");
        cmap.push_str("begincmap\n");
        cmap.push_str("/CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n");
        cmap.push_str("/CMapName /Adobe-Identity-UCS def\n");
        cmap.push_str("/CMapType 2 def\n");
        cmap.push_str("1 begincodespacerange\n");
        cmap.push_str("<0000> <FFFF>\n");
        cmap.push_str("endcodespacerange\n");

        let mut char_list: Vec<char> = self.used_chars.iter().copied().collect();
        char_list.sort_by_key(|c| *c as u32);

        // bfchar sections are capped at 100 entries per the PDF spec
        for chunk in char_list.chunks(100) {
            cmap.push_str(&format!("{} beginbfchar\n", chunk.len()));
            for c in chunk {
                let gid = self.glyph_id(*c).unwrap_or(0);
                let mut units = [0u16; 2];
                let encoded = c.encode_utf16(&mut units);
                let unicode: String = encoded.iter().map(|u| format!("{u:04X}")).collect();
                cmap.push_str(&format!("<{gid:04X}> <{unicode}>\n"));
            }
            cmap.push_str("endbfchar\n");
        }

        cmap.push_str("endcmap\n");
        cmap.push_str("CMapName currentdict /CMap defineresource pop\n");
        cmap.push_str("end\n");
        cmap.push_str("end\n");

        cmap
    }
}
