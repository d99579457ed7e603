//! AcroForm document wrapper
//!
//! `FormDocument` wraps a loaded template and exposes the fill → wire →
//! flatten → serialize pipeline. Flatten is terminal: once the interactive
//! layer has been drawn into the page content, every mutator fails with
//! `FormError::Flattened`.

use crate::encoding::{decode_pdf_text, encode_pdf_text};
use crate::font::EmbeddedFont;
use crate::{Align, FormError, Result};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::collections::HashMap;

/// Multiline flag bit in /Ff (PDF 32000-1, table 228)
const FF_MULTILINE: i64 = 1 << 12;

/// Presentation profile for one text field class
#[derive(Debug, Clone, Copy)]
pub struct TextAppearance {
    /// Font size in points
    pub font_size: f32,
    /// Horizontal alignment inside the widget rect
    pub align: Align,
    /// Vertical widget-rect nudge in points (baseline correction)
    pub y_shift: f64,
    /// Whether the field accepts multiple lines
    pub multiline: bool,
}

impl Default for TextAppearance {
    fn default() -> Self {
        Self {
            font_size: 12.0,
            align: Align::Left,
            y_shift: 0.0,
            multiline: false,
        }
    }
}

/// A text value waiting to be drawn at flatten time
struct PendingText {
    field_id: ObjectId,
    text: String,
    appearance: TextAppearance,
}

/// A loaded form template being filled
pub struct FormDocument {
    /// The underlying lopdf document
    inner: Document,
    /// Decoded field name -> field dictionary id
    fields: HashMap<String, ObjectId>,
    /// AcroForm dictionary id (normalized to an indirect object on load)
    acroform_id: ObjectId,
    /// Appearance font, once embedded
    font: Option<EmbeddedFont>,
    /// Resource name the appearance font is registered under
    font_resource: String,
    /// Buffered text values, drawn during flatten
    pending_text: Vec<PendingText>,
    /// Checked checkbox fields, stamped during flatten
    pending_checks: Vec<ObjectId>,
    /// Buffered content operators per page (flushed at save)
    page_content: HashMap<ObjectId, Vec<u8>>,
    /// Pages that need the appearance font in their resources
    font_pages: Vec<ObjectId>,
    /// Next appearance XObject resource number
    next_xobject: u32,
    flattened: bool,
}

impl FormDocument {
    /// Load a form template from bytes
    ///
    /// Scans the AcroForm field tree and indexes every terminal field by its
    /// fully qualified, decoded name. Any XFA entry is dropped so the filled
    /// AcroForm is authoritative.
    pub fn load(data: &[u8]) -> Result<Self> {
        let mut inner = Document::load_mem(data).map_err(|e| FormError::Load(e.to_string()))?;

        let acroform_id = Self::normalize_acroform(&mut inner)?;

        // Drop XFA so viewers fall back to the AcroForm we fill
        if let Ok(Object::Dictionary(acroform)) = inner.get_object_mut(acroform_id) {
            acroform.remove(b"XFA");
        }

        let mut fields = HashMap::new();
        let field_refs = Self::acroform_field_refs(&inner, acroform_id)?;
        for id in field_refs {
            Self::index_field(&inner, id, "", &mut fields)?;
        }

        Ok(Self {
            inner,
            fields,
            acroform_id,
            font: None,
            font_resource: "CardFont".to_string(),
            pending_text: Vec::new(),
            pending_checks: Vec::new(),
            page_content: HashMap::new(),
            font_pages: Vec::new(),
            next_xobject: 1,
            flattened: false,
        })
    }

    /// Ensure the catalog's AcroForm entry is an indirect object
    fn normalize_acroform(doc: &mut Document) -> Result<ObjectId> {
        let catalog_id = doc
            .trailer
            .get(b"Root")
            .and_then(Object::as_reference)
            .map_err(|_| FormError::Parse("Document trailer missing Root".to_string()))?;

        let acroform = {
            let catalog = doc
                .get_object(catalog_id)?
                .as_dict()
                .map_err(|_| FormError::Parse("Catalog is not a dictionary".to_string()))?;
            catalog.get(b"AcroForm").ok().cloned()
        };

        match acroform {
            Some(Object::Reference(id)) => Ok(id),
            Some(Object::Dictionary(dict)) => {
                let id = doc.add_object(dict);
                let catalog = doc
                    .get_object_mut(catalog_id)?
                    .as_dict_mut()
                    .map_err(|_| FormError::Parse("Catalog is not a dictionary".to_string()))?;
                catalog.set(b"AcroForm", Object::Reference(id));
                Ok(id)
            }
            _ => Err(FormError::Load(
                "Template has no AcroForm dictionary".to_string(),
            )),
        }
    }

    /// Collect the root /Fields references of the AcroForm
    fn acroform_field_refs(doc: &Document, acroform_id: ObjectId) -> Result<Vec<ObjectId>> {
        let acroform = doc
            .get_object(acroform_id)?
            .as_dict()
            .map_err(|_| FormError::Parse("AcroForm is not a dictionary".to_string()))?;

        let fields = match acroform.get(b"Fields") {
            Ok(obj) => Self::deref_obj(doc, obj)?
                .as_array()
                .map_err(|_| FormError::Parse("AcroForm Fields is not an array".to_string()))?
                .clone(),
            Err(_) => Vec::new(),
        };

        Ok(fields
            .iter()
            .filter_map(|o| o.as_reference().ok())
            .collect())
    }

    /// Index a field (and its kids) under its fully qualified name
    fn index_field(
        doc: &Document,
        id: ObjectId,
        parent_name: &str,
        out: &mut HashMap<String, ObjectId>,
    ) -> Result<()> {
        let dict = doc
            .get_object(id)?
            .as_dict()
            .map_err(|_| FormError::Parse("Field is not a dictionary".to_string()))?;

        let name = match dict.get(b"T") {
            Ok(Object::String(bytes, _)) => {
                let partial = decode_pdf_text(bytes);
                if parent_name.is_empty() {
                    partial
                } else {
                    format!("{parent_name}.{partial}")
                }
            }
            _ => parent_name.to_string(),
        };

        if dict.has(b"FT") && !name.is_empty() {
            out.insert(name.clone(), id);
        }

        if let Ok(kids) = dict.get(b"Kids") {
            let kids = Self::deref_obj(doc, kids)?
                .as_array()
                .map_err(|_| FormError::Parse("Field Kids is not an array".to_string()))?
                .clone();
            for kid in kids {
                if let Ok(kid_id) = kid.as_reference() {
                    // Kids without /FT are widgets; those with /T are child fields
                    let kid_dict = doc.get_object(kid_id)?.as_dict();
                    if kid_dict.map(|d| d.has(b"T")).unwrap_or(false) {
                        Self::index_field(doc, kid_id, &name, out)?;
                    }
                }
            }
        }

        Ok(())
    }

    /// Embed the TrueType font used for field appearances
    pub fn embed_font(&mut self, ttf_data: &[u8]) -> Result<()> {
        if self.flattened {
            return Err(FormError::Flattened);
        }
        self.font = Some(EmbeddedFont::from_ttf("CardFont", ttf_data)?);
        Ok(())
    }

    /// Number of pages
    pub fn page_count(&self) -> usize {
        self.inner.get_pages().len()
    }

    /// All indexed field names (sorted, mainly for diagnostics and tests)
    pub fn field_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.fields.keys().cloned().collect();
        names.sort();
        names
    }

    /// Whether the interactive layer has been flattened away
    pub fn is_flattened(&self) -> bool {
        self.flattened
    }

    fn field_id(&self, name: &str) -> Result<ObjectId> {
        self.fields
            .get(name)
            .copied()
            .ok_or_else(|| FormError::FieldNotFound(name.to_string()))
    }

    /// Set a text field's value and presentation profile
    ///
    /// The value is stored in `/V`, the default appearance string is updated
    /// to the embedded font, and the widget rect is nudged upward by
    /// `appearance.y_shift` to correct for the appearance font's baseline.
    pub fn set_text(&mut self, name: &str, value: &str, appearance: &TextAppearance) -> Result<()> {
        if self.flattened {
            return Err(FormError::Flattened);
        }
        let field_id = self.field_id(name)?;
        self.expect_field_type(field_id, b"Tx")
            .map_err(|_| FormError::NotATextField(name.to_string()))?;

        let da = format!("/{} {} Tf 0 g", self.font_resource, appearance.font_size);
        {
            let dict = self
                .inner
                .get_object_mut(field_id)?
                .as_dict_mut()
                .map_err(|_| FormError::Parse("Field is not a dictionary".to_string()))?;

            dict.set(
                b"V",
                Object::String(encode_pdf_text(value), StringFormat::Hexadecimal),
            );
            dict.set(b"DA", Object::string_literal(da));

            if appearance.multiline {
                let ff = dict.get(b"Ff").and_then(Object::as_i64).unwrap_or(0);
                dict.set(b"Ff", Object::Integer(ff | FF_MULTILINE));
            }
        }

        if appearance.y_shift != 0.0 {
            for widget_id in self.widget_ids(field_id)? {
                self.nudge_rect(widget_id, appearance.y_shift)?;
            }
        }

        if !value.is_empty() {
            let font = self.font.as_mut().ok_or(FormError::FontMissing)?;
            font.add_chars(value);
            self.pending_text.push(PendingText {
                field_id,
                text: value.to_string(),
                appearance: *appearance,
            });
        }

        Ok(())
    }

    /// Set a checkbox field's state
    ///
    /// The "on" appearance state is discovered from the widget's `/AP /N`
    /// dictionary (the first state that is not `Off`).
    pub fn set_checkbox(&mut self, name: &str, checked: bool) -> Result<()> {
        if self.flattened {
            return Err(FormError::Flattened);
        }
        let field_id = self.field_id(name)?;
        self.expect_field_type(field_id, b"Btn")
            .map_err(|_| FormError::NotACheckbox(name.to_string()))?;

        let widgets = self.widget_ids(field_id)?;
        let on_state = match widgets.iter().find_map(|&w| self.on_state_of(w)) {
            Some(state) => state,
            None => {
                log::warn!("Checkbox '{name}' has no appearance states, assuming 'Yes'");
                b"Yes".to_vec()
            }
        };

        let state: &[u8] = if checked { &on_state } else { b"Off" };

        let dict = self
            .inner
            .get_object_mut(field_id)?
            .as_dict_mut()
            .map_err(|_| FormError::Parse("Field is not a dictionary".to_string()))?;
        dict.set(b"V", Object::Name(state.to_vec()));

        for widget_id in widgets {
            let widget = self
                .inner
                .get_object_mut(widget_id)?
                .as_dict_mut()
                .map_err(|_| FormError::Parse("Widget is not a dictionary".to_string()))?;
            widget.set(b"AS", Object::Name(state.to_vec()));
        }

        if checked {
            self.pending_checks.push(field_id);
        }

        Ok(())
    }

    /// Attach the on-calculate script to a field and register it in the
    /// document-wide calculation order (`/CO`)
    pub fn set_calculation_action(&mut self, name: &str, script: &str) -> Result<()> {
        if self.flattened {
            return Err(FormError::Flattened);
        }
        let field_id = self.field_id(name)?;
        self.set_field_action(field_id, b"C", script, true)?;

        // Register in the AcroForm calculation order so interactive viewers
        // recompute the total when any dependency changes
        let existing = {
            let acroform = self
                .inner
                .get_object(self.acroform_id)?
                .as_dict()
                .map_err(|_| FormError::Parse("AcroForm is not a dictionary".to_string()))?;
            acroform.get(b"CO").ok().cloned()
        };

        let mut co = match existing {
            Some(Object::Array(arr)) => arr,
            Some(Object::Reference(id)) => self
                .inner
                .get_object(id)?
                .as_array()
                .map_err(|_| FormError::Parse("CO is not an array".to_string()))?
                .clone(),
            _ => Vec::new(),
        };
        co.push(Object::Reference(field_id));

        let acroform = self
            .inner
            .get_object_mut(self.acroform_id)?
            .as_dict_mut()
            .map_err(|_| FormError::Parse("AcroForm is not a dictionary".to_string()))?;
        acroform.set(b"CO", Object::Array(co));

        Ok(())
    }

    /// Attach a no-op validate action to a field, if it has none
    ///
    /// Compatibility affordance only: it nudges viewer dependency tracking so
    /// edits to an hour field trigger the calculation chain.
    pub fn set_validate_stub(&mut self, name: &str) -> Result<()> {
        if self.flattened {
            return Err(FormError::Flattened);
        }
        let field_id = self.field_id(name)?;
        self.set_field_action(field_id, b"V", "/* trigger calc */", false)
    }

    /// Store a JavaScript action under the field's /AA entry
    fn set_field_action(
        &mut self,
        field_id: ObjectId,
        slot: &[u8],
        script: &str,
        overwrite: bool,
    ) -> Result<()> {
        let action = dictionary! {
            "S" => Object::Name(b"JavaScript".to_vec()),
            "JS" => Object::string_literal(script),
        };

        let dict = self
            .inner
            .get_object_mut(field_id)?
            .as_dict_mut()
            .map_err(|_| FormError::Parse("Field is not a dictionary".to_string()))?;

        let mut aa = match dict.get(b"AA") {
            Ok(Object::Dictionary(existing)) => existing.clone(),
            _ => Dictionary::new(),
        };
        if overwrite || !aa.has(slot) {
            aa.set(slot, Object::Dictionary(action));
        }
        dict.set(b"AA", Object::Dictionary(aa));

        Ok(())
    }

    /// Flatten the interactive layer into static page content
    ///
    /// Draws every buffered text value and every checked checkbox's on-state
    /// appearance into the owning page, then removes the widget annotations
    /// and empties the AcroForm field list. Terminal: mutators fail afterwards.
    pub fn flatten(&mut self) -> Result<()> {
        if self.flattened {
            return Err(FormError::Flattened);
        }

        let annot_pages = self.annotation_page_map()?;

        let pending = std::mem::take(&mut self.pending_text);
        for item in pending {
            self.draw_text_value(&item, &annot_pages)?;
        }

        let checks = std::mem::take(&mut self.pending_checks);
        for field_id in checks {
            self.stamp_checkbox(field_id, &annot_pages)?;
        }

        self.remove_widgets()?;

        let acroform = self
            .inner
            .get_object_mut(self.acroform_id)?
            .as_dict_mut()
            .map_err(|_| FormError::Parse("AcroForm is not a dictionary".to_string()))?;
        acroform.set(b"Fields", Object::Array(Vec::new()));
        acroform.remove(b"CO");

        self.flattened = true;
        Ok(())
    }

    /// Serialize the document
    ///
    /// Embeds the appearance font and flushes buffered page content, then
    /// saves the whole object graph to bytes.
    pub fn save_to_bytes(&mut self) -> Result<Vec<u8>> {
        self.embed_font_objects()?;
        self.flush_page_content()?;

        let mut buffer = Vec::new();
        self.inner
            .save_to(&mut buffer)
            .map_err(|e| FormError::Save(e.to_string()))?;
        Ok(buffer)
    }

    // --- flatten internals -------------------------------------------------

    /// Map every page annotation id to its owning page id
    fn annotation_page_map(&self) -> Result<HashMap<ObjectId, ObjectId>> {
        let mut map = HashMap::new();
        for (_, page_id) in self.inner.get_pages() {
            for annot_id in self.page_annot_ids(page_id)? {
                map.insert(annot_id, page_id);
            }
        }
        Ok(map)
    }

    fn page_annot_ids(&self, page_id: ObjectId) -> Result<Vec<ObjectId>> {
        let page = self
            .inner
            .get_object(page_id)?
            .as_dict()
            .map_err(|_| FormError::Parse("Page is not a dictionary".to_string()))?;

        match page.get(b"Annots") {
            Ok(obj) => Ok(Self::deref_obj(&self.inner, obj)?
                .as_array()
                .map_err(|_| FormError::Parse("Annots is not an array".to_string()))?
                .iter()
                .filter_map(|o| o.as_reference().ok())
                .collect()),
            Err(_) => Ok(Vec::new()),
        }
    }

    /// Draw one buffered text value into its page content
    fn draw_text_value(
        &mut self,
        item: &PendingText,
        annot_pages: &HashMap<ObjectId, ObjectId>,
    ) -> Result<()> {
        let font = self.font.as_ref().ok_or(FormError::FontMissing)?;
        let hex = font.encode_text_hex(&item.text);
        let text_width = font.text_width_points(&item.text, item.appearance.font_size);

        for widget_id in self.widget_ids(item.field_id)? {
            let page_id = match annot_pages.get(&widget_id) {
                Some(id) => *id,
                None => continue,
            };
            let rect = self.rect_of(widget_id)?;
            let size = item.appearance.font_size as f64;

            let x = match item.appearance.align {
                Align::Left => rect[0] + 2.0,
                Align::Center => (rect[0] + rect[2]) / 2.0 - text_width / 2.0,
                Align::Right => rect[2] - 2.0 - text_width,
            };
            let y = rect[1] + ((rect[3] - rect[1]) - size) / 2.0;

            let ops = format!(
                "BT\n0 g\n/{} {} Tf\n{x:.2} {y:.2} Td\n{hex} Tj\nET\n",
                self.font_resource, item.appearance.font_size
            );
            self.page_content
                .entry(page_id)
                .or_default()
                .extend_from_slice(ops.as_bytes());
            if !self.font_pages.contains(&page_id) {
                self.font_pages.push(page_id);
            }
        }

        Ok(())
    }

    /// Stamp a checked checkbox's on-state appearance onto its page
    fn stamp_checkbox(
        &mut self,
        field_id: ObjectId,
        annot_pages: &HashMap<ObjectId, ObjectId>,
    ) -> Result<()> {
        // The box may have been unchecked after it was queued
        {
            let dict = self
                .inner
                .get_object(field_id)?
                .as_dict()
                .map_err(|_| FormError::Parse("Field is not a dictionary".to_string()))?;
            if matches!(dict.get(b"V"), Ok(Object::Name(name)) if name == b"Off") {
                return Ok(());
            }
        }

        for widget_id in self.widget_ids(field_id)? {
            let page_id = match annot_pages.get(&widget_id) {
                Some(id) => *id,
                None => continue,
            };
            let Some(stream_id) = self.on_appearance_stream(widget_id)? else {
                continue;
            };
            let rect = self.rect_of(widget_id)?;

            // Make sure the appearance qualifies as a Form XObject
            {
                let obj = self.inner.get_object_mut(stream_id)?;
                if let Object::Stream(stream) = obj {
                    stream.dict.set(b"Type", Object::Name(b"XObject".to_vec()));
                    stream.dict.set(b"Subtype", Object::Name(b"Form".to_vec()));
                    if !stream.dict.has(b"BBox") {
                        stream.dict.set(
                            b"BBox",
                            Object::Array(vec![
                                0.into(),
                                0.into(),
                                Object::Real((rect[2] - rect[0]) as f32),
                                Object::Real((rect[3] - rect[1]) as f32),
                            ]),
                        );
                    }
                }
            }

            let resource_name = format!("Fq{}", self.next_xobject);
            self.next_xobject += 1;
            self.add_xobject_to_page(page_id, &resource_name, stream_id)?;

            let ops = format!(
                "q\n1 0 0 1 {:.2} {:.2} cm\n/{} Do\nQ\n",
                rect[0], rect[1], resource_name
            );
            self.page_content
                .entry(page_id)
                .or_default()
                .extend_from_slice(ops.as_bytes());
        }

        Ok(())
    }

    /// Find the widget's on-state appearance stream, materializing a direct
    /// stream into an indirect object if needed
    fn on_appearance_stream(&mut self, widget_id: ObjectId) -> Result<Option<ObjectId>> {
        let on_entry = {
            let widget = self
                .inner
                .get_object(widget_id)?
                .as_dict()
                .map_err(|_| FormError::Parse("Widget is not a dictionary".to_string()))?;

            let Ok(ap) = widget.get(b"AP") else {
                return Ok(None);
            };
            let ap = Self::deref_obj(&self.inner, ap)?
                .as_dict()
                .map_err(|_| FormError::Parse("AP is not a dictionary".to_string()))?;
            let Ok(normal) = ap.get(b"N") else {
                return Ok(None);
            };
            let normal = Self::deref_obj(&self.inner, normal)?
                .as_dict()
                .map_err(|_| FormError::Parse("AP N is not a dictionary".to_string()))?;

            normal
                .iter()
                .find(|(key, _)| key.as_slice() != b"Off")
                .map(|(_, value)| value.clone())
        };

        match on_entry {
            Some(Object::Reference(id)) => Ok(Some(id)),
            Some(Object::Stream(stream)) => Ok(Some(self.inner.add_object(stream))),
            _ => Ok(None),
        }
    }

    /// Remove all widget annotations from every page
    fn remove_widgets(&mut self) -> Result<()> {
        let mut widget_ids: Vec<ObjectId> = Vec::new();
        for &field_id in self.fields.values() {
            widget_ids.extend(self.widget_ids(field_id)?);
        }

        for (_, page_id) in self.inner.get_pages() {
            let kept: Vec<Object> = {
                let page = self
                    .inner
                    .get_object(page_id)?
                    .as_dict()
                    .map_err(|_| FormError::Parse("Page is not a dictionary".to_string()))?;
                match page.get(b"Annots") {
                    Ok(obj) => Self::deref_obj(&self.inner, obj)?
                        .as_array()
                        .map_err(|_| FormError::Parse("Annots is not an array".to_string()))?
                        .iter()
                        .filter(|o| match o.as_reference() {
                            Ok(id) => !widget_ids.contains(&id),
                            Err(_) => true,
                        })
                        .cloned()
                        .collect(),
                    Err(_) => continue,
                }
            };

            let page = self
                .inner
                .get_object_mut(page_id)?
                .as_dict_mut()
                .map_err(|_| FormError::Parse("Page is not a dictionary".to_string()))?;
            page.set(b"Annots", Object::Array(kept));
        }

        Ok(())
    }

    // --- save internals ----------------------------------------------------

    /// Embed the appearance font objects and register them on every page
    /// whose content references the font resource
    fn embed_font_objects(&mut self) -> Result<()> {
        if self.font_pages.is_empty() {
            return Ok(());
        }
        let font = self.font.as_ref().ok_or(FormError::FontMissing)?;
        let objects = font.to_pdf_objects();

        let tounicode_id = self.inner.add_object(objects.tounicode_stream);
        let font_file_id = self.inner.add_object(objects.font_file_stream);

        let mut descriptor = objects.font_descriptor;
        descriptor.set("FontFile2", Object::Reference(font_file_id));
        let descriptor_id = self.inner.add_object(descriptor);

        let mut cid_font = objects.cid_font;
        cid_font.set("FontDescriptor", Object::Reference(descriptor_id));
        let cid_font_id = self.inner.add_object(cid_font);

        let mut type0 = objects.type0_font;
        type0.set(
            "DescendantFonts",
            Object::Array(vec![Object::Reference(cid_font_id)]),
        );
        type0.set("ToUnicode", Object::Reference(tounicode_id));
        let type0_id = self.inner.add_object(type0);

        let pages = std::mem::take(&mut self.font_pages);
        let resource_name = self.font_resource.clone();
        for page_id in pages {
            self.add_font_to_page(page_id, &resource_name, type0_id)?;
        }

        Ok(())
    }

    fn add_font_to_page(
        &mut self,
        page_id: ObjectId,
        resource_name: &str,
        font_id: ObjectId,
    ) -> Result<()> {
        let mut resources = self.page_resources(page_id)?;
        let mut font_dict = match resources.get(b"Font") {
            Ok(obj) => Self::deref_obj(&self.inner, obj)?
                .as_dict()
                .cloned()
                .unwrap_or_default(),
            Err(_) => Dictionary::new(),
        };
        font_dict.set(resource_name.as_bytes(), Object::Reference(font_id));
        resources.set(b"Font", Object::Dictionary(font_dict));
        self.set_page_resources(page_id, resources)
    }

    fn add_xobject_to_page(
        &mut self,
        page_id: ObjectId,
        resource_name: &str,
        object_id: ObjectId,
    ) -> Result<()> {
        let mut resources = self.page_resources(page_id)?;
        let mut xobject_dict = match resources.get(b"XObject") {
            Ok(obj) => Self::deref_obj(&self.inner, obj)?
                .as_dict()
                .cloned()
                .unwrap_or_default(),
            Err(_) => Dictionary::new(),
        };
        xobject_dict.set(resource_name.as_bytes(), Object::Reference(object_id));
        resources.set(b"XObject", Object::Dictionary(xobject_dict));
        self.set_page_resources(page_id, resources)
    }

    fn page_resources(&self, page_id: ObjectId) -> Result<Dictionary> {
        let page = self
            .inner
            .get_object(page_id)?
            .as_dict()
            .map_err(|_| FormError::Parse("Page is not a dictionary".to_string()))?;
        match page.get(b"Resources") {
            Ok(obj) => Ok(Self::deref_obj(&self.inner, obj)?
                .as_dict()
                .cloned()
                .unwrap_or_default()),
            Err(_) => Ok(Dictionary::new()),
        }
    }

    fn set_page_resources(&mut self, page_id: ObjectId, resources: Dictionary) -> Result<()> {
        let page = self
            .inner
            .get_object_mut(page_id)?
            .as_dict_mut()
            .map_err(|_| FormError::Parse("Page is not a dictionary".to_string()))?;
        page.set(b"Resources", Object::Dictionary(resources));
        Ok(())
    }

    /// Flush buffered operators by appending to each page's content stream
    fn flush_page_content(&mut self) -> Result<()> {
        let buffers: Vec<(ObjectId, Vec<u8>)> = self.page_content.drain().collect();

        for (page_id, content) in buffers {
            if content.is_empty() {
                continue;
            }

            let existing = {
                let page = self
                    .inner
                    .get_object(page_id)?
                    .as_dict()
                    .map_err(|_| FormError::Parse("Page is not a dictionary".to_string()))?;
                match page.get(b"Contents") {
                    Ok(Object::Stream(stream)) => stream
                        .decompressed_content()
                        .unwrap_or_else(|_| stream.content.clone()),
                    Ok(Object::Reference(ref_id)) => {
                        match self.inner.get_object(*ref_id) {
                            Ok(Object::Stream(stream)) => stream
                                .decompressed_content()
                                .unwrap_or_else(|_| stream.content.clone()),
                            _ => Vec::new(),
                        }
                    }
                    Ok(Object::Array(arr)) => {
                        let mut combined = Vec::new();
                        for obj in arr.clone() {
                            let stream = match obj {
                                Object::Reference(ref_id) => {
                                    match self.inner.get_object(ref_id) {
                                        Ok(Object::Stream(s)) => Some(s.clone()),
                                        _ => None,
                                    }
                                }
                                Object::Stream(s) => Some(s),
                                _ => None,
                            };
                            if let Some(stream) = stream {
                                combined.extend_from_slice(
                                    &stream
                                        .decompressed_content()
                                        .unwrap_or_else(|_| stream.content.clone()),
                                );
                            }
                        }
                        combined
                    }
                    _ => Vec::new(),
                }
            };

            let mut new_content = existing;
            new_content.push(b'\n');
            new_content.extend_from_slice(&content);

            let stream_id = self
                .inner
                .add_object(Stream::new(Dictionary::new(), new_content));

            let page = self
                .inner
                .get_object_mut(page_id)?
                .as_dict_mut()
                .map_err(|_| FormError::Parse("Page is not a dictionary".to_string()))?;
            page.set(b"Contents", Object::Reference(stream_id));
        }

        Ok(())
    }

    // --- shared helpers ----------------------------------------------------

    /// Resolve a possibly-indirect object one level
    fn deref_obj<'a>(doc: &'a Document, obj: &'a Object) -> Result<&'a Object> {
        match obj {
            Object::Reference(id) => Ok(doc.get_object(*id)?),
            other => Ok(other),
        }
    }

    fn expect_field_type(&self, field_id: ObjectId, ft: &[u8]) -> Result<()> {
        let dict = self
            .inner
            .get_object(field_id)?
            .as_dict()
            .map_err(|_| FormError::Parse("Field is not a dictionary".to_string()))?;
        match dict.get(b"FT") {
            Ok(Object::Name(name)) if name == ft => Ok(()),
            _ => Err(FormError::Parse(format!(
                "Unexpected field type, wanted {}",
                String::from_utf8_lossy(ft)
            ))),
        }
    }

    /// Widget annotation ids of a field (the field dict itself when merged)
    fn widget_ids(&self, field_id: ObjectId) -> Result<Vec<ObjectId>> {
        let dict = self
            .inner
            .get_object(field_id)?
            .as_dict()
            .map_err(|_| FormError::Parse("Field is not a dictionary".to_string()))?;

        if dict.has(b"Rect") {
            return Ok(vec![field_id]);
        }

        match dict.get(b"Kids") {
            Ok(obj) => Ok(Self::deref_obj(&self.inner, obj)?
                .as_array()
                .map_err(|_| FormError::Parse("Field Kids is not an array".to_string()))?
                .iter()
                .filter_map(|o| o.as_reference().ok())
                .collect()),
            Err(_) => Ok(Vec::new()),
        }
    }

    fn rect_of(&self, widget_id: ObjectId) -> Result<[f64; 4]> {
        let widget = self
            .inner
            .get_object(widget_id)?
            .as_dict()
            .map_err(|_| FormError::Parse("Widget is not a dictionary".to_string()))?;
        let arr = Self::deref_obj(&self.inner, widget.get(b"Rect")?)?
            .as_array()
            .map_err(|_| FormError::Parse("Rect is not an array".to_string()))?;
        if arr.len() != 4 {
            return Err(FormError::Parse("Rect must have four entries".to_string()));
        }

        let mut rect = [0.0f64; 4];
        for (slot, obj) in rect.iter_mut().zip(arr.iter()) {
            *slot = Self::number_of(obj)
                .ok_or_else(|| FormError::Parse("Rect entry is not a number".to_string()))?;
        }
        Ok(rect)
    }

    fn number_of(obj: &Object) -> Option<f64> {
        match obj {
            Object::Integer(i) => Some(*i as f64),
            Object::Real(r) => Some(*r as f64),
            _ => None,
        }
    }

    /// Shift a widget rect vertically
    fn nudge_rect(&mut self, widget_id: ObjectId, y_shift: f64) -> Result<()> {
        let rect = self.rect_of(widget_id)?;
        let widget = self
            .inner
            .get_object_mut(widget_id)?
            .as_dict_mut()
            .map_err(|_| FormError::Parse("Widget is not a dictionary".to_string()))?;
        widget.set(
            b"Rect",
            Object::Array(vec![
                Object::Real(rect[0] as f32),
                Object::Real((rect[1] + y_shift) as f32),
                Object::Real(rect[2] as f32),
                Object::Real((rect[3] + y_shift) as f32),
            ]),
        );
        Ok(())
    }

    /// On-state name from the widget's /AP /N dictionary
    fn on_state_of(&self, widget_id: ObjectId) -> Option<Vec<u8>> {
        let widget = self.inner.get_object(widget_id).ok()?.as_dict().ok()?;
        let ap = Self::deref_obj(&self.inner, widget.get(b"AP").ok()?).ok()?;
        let normal = Self::deref_obj(&self.inner, ap.as_dict().ok()?.get(b"N").ok()?).ok()?;
        normal
            .as_dict()
            .ok()?
            .iter()
            .map(|(key, _)| key.clone())
            .find(|key| key.as_slice() != b"Off")
    }
}
