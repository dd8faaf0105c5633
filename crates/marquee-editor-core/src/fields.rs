//! Field renderers and edit operations.
//!
//! [`render_control`] turns a descriptor plus the current value into a
//! framework-agnostic control model. [`apply`] computes the next whole value
//! for a field from an edit operation; array fields are always replaced
//! wholesale, never patched in place.

use std::collections::BTreeSet;

use marquee_common::{MediaType, UploadedFile};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use smol_str::{SmolStr, format_smolstr};

use crate::error::{EditorError, Result};
use crate::registry::{FieldDescriptor, FieldKind};

/// One entry of an object-format image array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageItem {
    #[serde(default, deserialize_with = "scalar_id")]
    pub id: SmolStr,
    #[serde(default, deserialize_with = "scalar_text")]
    pub image: String,
    #[serde(
        default,
        deserialize_with = "optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,
    /// Keys this editor does not know about, written back untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ImageItem {
    fn new(id: SmolStr, image: String, name: Option<String>) -> Self {
        ImageItem {
            id,
            image,
            name,
            extra: Map::new(),
        }
    }
}

/// Image array contents. The shape is chosen by the descriptor's
/// `use_object_format`, never inferred from the data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageArray {
    Strings(Vec<String>),
    Objects(Vec<ImageItem>),
}

impl ImageArray {
    /// Read a stored value in the shape `descriptor` asks for, converting
    /// entries stored in the other shape.
    ///
    /// Every stored entry yields exactly one item, so indices line up with
    /// the stored array and a write-back never shortens it.
    pub fn read(descriptor: &FieldDescriptor, value: Option<&Value>) -> Self {
        let entries = value.and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[]);
        if descriptor.use_object_format {
            let mut items: Vec<ImageItem> = Vec::with_capacity(entries.len());
            for entry in entries {
                let mut item = match entry {
                    Value::Object(_) => ImageItem::deserialize(entry).unwrap_or_else(|_| {
                        ImageItem::new(SmolStr::default(), entry.to_string(), None)
                    }),
                    other => ImageItem::new(SmolStr::default(), text_of(Some(other)), None),
                };
                if item.id.is_empty() || items.iter().any(|i| i.id == item.id) {
                    item.id = next_id("image", items.iter().map(|i| &i.id));
                }
                items.push(item);
            }
            ImageArray::Objects(items)
        } else {
            ImageArray::Strings(
                entries
                    .iter()
                    .map(|entry| match entry {
                        Value::Object(obj) => text_of(obj.get("image")),
                        other => text_of(Some(other)),
                    })
                    .collect(),
            )
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ImageArray::Strings(v) => v.len(),
            ImageArray::Objects(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_value(&self) -> Value {
        match self {
            ImageArray::Strings(v) => Value::Array(v.iter().cloned().map(Value::String).collect()),
            ImageArray::Objects(v) => serde_json::to_value(v).unwrap_or(Value::Array(Vec::new())),
        }
    }

    /// Entries as display items. String entries get positional ids.
    pub fn items(&self) -> Vec<ImageItem> {
        match self {
            ImageArray::Strings(v) => v
                .iter()
                .enumerate()
                .map(|(i, path)| ImageItem::new(format_smolstr!("{i}"), path.clone(), None))
                .collect(),
            ImageArray::Objects(v) => v.clone(),
        }
    }

    fn push(&mut self, path: String, name: Option<String>) {
        match self {
            ImageArray::Strings(v) => v.push(path),
            ImageArray::Objects(v) => {
                let id = next_id("image", v.iter().map(|i| &i.id));
                v.push(ImageItem::new(id, path, name));
            }
        }
    }

    fn replace(&mut self, index: usize, path: String) {
        match self {
            ImageArray::Strings(v) => v[index] = path,
            ImageArray::Objects(v) => v[index].image = path,
        }
    }

    fn remove(&mut self, index: usize) {
        match self {
            ImageArray::Strings(v) => {
                v.remove(index);
            }
            ImageArray::Objects(v) => {
                v.remove(index);
            }
        }
    }

    fn swap(&mut self, a: usize, b: usize) {
        match self {
            ImageArray::Strings(v) => v.swap(a, b),
            ImageArray::Objects(v) => v.swap(a, b),
        }
    }
}

/// A stored record of an array field.
trait Record: for<'de> Deserialize<'de> + Serialize {
    /// Build a record from an entry stored as a bare value.
    fn from_text(text: String) -> Self;
}

/// Text slots accept numbers and booleans; older records store
/// `"value": 150` rather than `"value": "150"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stat {
    #[serde(default, deserialize_with = "scalar_text")]
    pub value: String,
    #[serde(default, deserialize_with = "scalar_text")]
    pub label: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record for Stat {
    fn from_text(value: String) -> Self {
        Stat {
            value,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Testimonial {
    #[serde(deserialize_with = "scalar_id")]
    pub id: SmolStr,
    #[serde(deserialize_with = "scalar_text")]
    pub quote1: String,
    #[serde(deserialize_with = "scalar_text")]
    pub quote2: String,
    #[serde(deserialize_with = "scalar_text")]
    pub author_name: String,
    #[serde(deserialize_with = "scalar_text")]
    pub author_role: String,
    #[serde(deserialize_with = "scalar_text")]
    pub author_image: String,
    #[serde(deserialize_with = "scalar_text")]
    pub stat1_value: String,
    #[serde(deserialize_with = "scalar_text")]
    pub stat1_label: String,
    #[serde(deserialize_with = "scalar_text")]
    pub stat2_value: String,
    #[serde(deserialize_with = "scalar_text")]
    pub stat2_label: String,
    #[serde(deserialize_with = "scalar_text")]
    pub stat3_value: String,
    #[serde(deserialize_with = "scalar_text")]
    pub stat3_label: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record for Testimonial {
    fn from_text(quote1: String) -> Self {
        Testimonial {
            quote1,
            ..Default::default()
        }
    }
}

/// Editable text slots of a testimonial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestimonialField {
    Quote1,
    Quote2,
    AuthorName,
    AuthorRole,
    AuthorImage,
    Stat1Value,
    Stat1Label,
    Stat2Value,
    Stat2Label,
    Stat3Value,
    Stat3Label,
}

impl TestimonialField {
    pub const ALL: [TestimonialField; 11] = [
        TestimonialField::Quote1,
        TestimonialField::Quote2,
        TestimonialField::AuthorName,
        TestimonialField::AuthorRole,
        TestimonialField::AuthorImage,
        TestimonialField::Stat1Value,
        TestimonialField::Stat1Label,
        TestimonialField::Stat2Value,
        TestimonialField::Stat2Label,
        TestimonialField::Stat3Value,
        TestimonialField::Stat3Label,
    ];

    /// Wire key of this slot.
    pub fn key(self) -> &'static str {
        match self {
            TestimonialField::Quote1 => "quote1",
            TestimonialField::Quote2 => "quote2",
            TestimonialField::AuthorName => "authorName",
            TestimonialField::AuthorRole => "authorRole",
            TestimonialField::AuthorImage => "authorImage",
            TestimonialField::Stat1Value => "stat1Value",
            TestimonialField::Stat1Label => "stat1Label",
            TestimonialField::Stat2Value => "stat2Value",
            TestimonialField::Stat2Label => "stat2Label",
            TestimonialField::Stat3Value => "stat3Value",
            TestimonialField::Stat3Label => "stat3Label",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }

    fn slot(self, t: &mut Testimonial) -> &mut String {
        match self {
            TestimonialField::Quote1 => &mut t.quote1,
            TestimonialField::Quote2 => &mut t.quote2,
            TestimonialField::AuthorName => &mut t.author_name,
            TestimonialField::AuthorRole => &mut t.author_role,
            TestimonialField::AuthorImage => &mut t.author_image,
            TestimonialField::Stat1Value => &mut t.stat1_value,
            TestimonialField::Stat1Label => &mut t.stat1_label,
            TestimonialField::Stat2Value => &mut t.stat2_value,
            TestimonialField::Stat2Label => &mut t.stat2_label,
            TestimonialField::Stat3Value => &mut t.stat3_value,
            TestimonialField::Stat3Label => &mut t.stat3_label,
        }
    }
}

/// Value of a media field. Older records store a bare URL string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaValue {
    pub url: String,
    #[serde(default)]
    pub media_type: MediaType,
}

impl MediaValue {
    pub fn read(value: Option<&Value>) -> Self {
        match value {
            Some(Value::String(url)) => MediaValue {
                media_type: MediaType::from_path(url),
                url: url.clone(),
            },
            Some(value @ Value::Object(_)) => {
                let mut media = MediaValue::deserialize(value).unwrap_or_default();
                if value.get("mediaType").is_none() {
                    media.media_type = MediaType::from_path(&media.url);
                }
                media
            }
            _ => MediaValue::default(),
        }
    }

    pub fn from_upload(file: &UploadedFile) -> Self {
        MediaValue {
            url: file.path.clone(),
            media_type: file.media_type,
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// An edit to a single field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOp {
    SetText(String),
    SetImage(String),
    ClearImage,
    AddImage { path: String, name: Option<String> },
    ReplaceImageAt { index: usize, path: String },
    RemoveAt(usize),
    MoveUp(usize),
    MoveDown(usize),
    AddStat,
    SetStat {
        index: usize,
        value: Option<String>,
        label: Option<String>,
    },
    SetMedia(MediaValue),
    ClearMedia,
    AddTestimonial,
    SetTestimonialField {
        index: usize,
        field: TestimonialField,
        value: String,
    },
}

impl FieldOp {
    pub fn name(&self) -> &'static str {
        match self {
            FieldOp::SetText(_) => "SetText",
            FieldOp::SetImage(_) => "SetImage",
            FieldOp::ClearImage => "ClearImage",
            FieldOp::AddImage { .. } => "AddImage",
            FieldOp::ReplaceImageAt { .. } => "ReplaceImageAt",
            FieldOp::RemoveAt(_) => "RemoveAt",
            FieldOp::MoveUp(_) => "MoveUp",
            FieldOp::MoveDown(_) => "MoveDown",
            FieldOp::AddStat => "AddStat",
            FieldOp::SetStat { .. } => "SetStat",
            FieldOp::SetMedia(_) => "SetMedia",
            FieldOp::ClearMedia => "ClearMedia",
            FieldOp::AddTestimonial => "AddTestimonial",
            FieldOp::SetTestimonialField { .. } => "SetTestimonialField",
        }
    }

    /// The op that stores a finished upload into a field of `kind`.
    pub fn for_upload(kind: FieldKind, file: &UploadedFile) -> Option<Self> {
        match kind {
            FieldKind::Image => Some(FieldOp::SetImage(file.path.clone())),
            FieldKind::ImageArray => Some(FieldOp::AddImage {
                path: file.path.clone(),
                name: None,
            }),
            FieldKind::Media => Some(FieldOp::SetMedia(MediaValue::from_upload(file))),
            _ => None,
        }
    }
}

/// View model for one field's editing control.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "control", rename_all = "camelCase")]
pub enum Control {
    Text {
        value: String,
        multiline: bool,
    },
    Image {
        url: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    ImageList {
        items: Vec<ImageItem>,
        object_format: bool,
        can_add: bool,
    },
    #[serde(rename_all = "camelCase")]
    Stats { rows: Vec<Stat>, can_add: bool },
    #[serde(rename_all = "camelCase")]
    Media {
        url: Option<String>,
        media_type: MediaType,
    },
    #[serde(rename_all = "camelCase")]
    Testimonials {
        items: Vec<Testimonial>,
        can_add: bool,
    },
}

/// Build the control model for a field from its current value.
pub fn render_control(descriptor: &FieldDescriptor, value: Option<&Value>) -> Control {
    let can_add = |len: usize| descriptor.max_items.is_none_or(|max| len < max);
    match descriptor.kind {
        FieldKind::Text | FieldKind::Textarea => Control::Text {
            value: text_of(value),
            multiline: descriptor.kind == FieldKind::Textarea,
        },
        FieldKind::Image => Control::Image {
            url: Some(text_of(value)).filter(|u| !u.is_empty()),
        },
        FieldKind::ImageArray => {
            let array = ImageArray::read(descriptor, value);
            Control::ImageList {
                can_add: can_add(array.len()),
                object_format: descriptor.use_object_format,
                items: array.items(),
            }
        }
        FieldKind::StatsArray => {
            let rows = read_records::<Stat>(value);
            Control::Stats {
                can_add: can_add(rows.len()),
                rows,
            }
        }
        FieldKind::Media => {
            let media = MediaValue::read(value);
            Control::Media {
                url: Some(media.url).filter(|u| !u.is_empty()),
                media_type: media.media_type,
            }
        }
        FieldKind::TestimonialsArray => {
            let items = read_testimonials(value);
            Control::Testimonials {
                can_add: can_add(items.len()),
                items,
            }
        }
    }
}

/// Compute the next whole value of a field.
pub fn apply(descriptor: &FieldDescriptor, current: Option<&Value>, op: FieldOp) -> Result<Value> {
    let key = descriptor.key;
    match (descriptor.kind, op) {
        (FieldKind::Text | FieldKind::Textarea, FieldOp::SetText(text)) => Ok(Value::String(text)),

        (FieldKind::Image, FieldOp::SetImage(path)) => Ok(Value::String(path)),
        (FieldKind::Image, FieldOp::ClearImage) => Ok(Value::String(String::new())),

        (FieldKind::ImageArray, op) => {
            let mut array = ImageArray::read(descriptor, current);
            match op {
                FieldOp::AddImage { path, name } => {
                    check_capacity(descriptor, array.len())?;
                    array.push(path, name);
                }
                FieldOp::ReplaceImageAt { index, path } => {
                    check_index(key, index, array.len())?;
                    array.replace(index, path);
                }
                FieldOp::RemoveAt(index) => {
                    check_index(key, index, array.len())?;
                    array.remove(index);
                }
                FieldOp::MoveUp(index) => {
                    check_index(key, index, array.len())?;
                    if index > 0 {
                        array.swap(index - 1, index);
                    }
                }
                FieldOp::MoveDown(index) => {
                    check_index(key, index, array.len())?;
                    if index + 1 < array.len() {
                        array.swap(index, index + 1);
                    }
                }
                op => return Err(kind_mismatch(descriptor, &op)),
            }
            Ok(array.to_value())
        }

        (FieldKind::StatsArray, op) => {
            let mut rows = read_records::<Stat>(current);
            match op {
                FieldOp::AddStat => {
                    check_capacity(descriptor, rows.len())?;
                    rows.push(Stat::default());
                }
                FieldOp::SetStat {
                    index,
                    value,
                    label,
                } => {
                    check_index(key, index, rows.len())?;
                    if let Some(value) = value {
                        rows[index].value = value;
                    }
                    if let Some(label) = label {
                        rows[index].label = label;
                    }
                }
                FieldOp::RemoveAt(index) => {
                    check_index(key, index, rows.len())?;
                    rows.remove(index);
                }
                op => return Err(kind_mismatch(descriptor, &op)),
            }
            Ok(serde_json::to_value(rows).unwrap_or(Value::Array(Vec::new())))
        }

        (FieldKind::Media, FieldOp::SetMedia(media)) => Ok(media.to_value()),
        (FieldKind::Media, FieldOp::ClearMedia) => Ok(MediaValue::default().to_value()),

        (FieldKind::TestimonialsArray, op) => {
            let mut items = read_testimonials(current);
            match op {
                FieldOp::AddTestimonial => {
                    check_capacity(descriptor, items.len())?;
                    let id = next_id("testimonial", items.iter().map(|t| &t.id));
                    items.push(Testimonial {
                        id,
                        ..Default::default()
                    });
                }
                FieldOp::SetTestimonialField {
                    index,
                    field,
                    value,
                } => {
                    check_index(key, index, items.len())?;
                    *field.slot(&mut items[index]) = value;
                }
                FieldOp::RemoveAt(index) => {
                    check_index(key, index, items.len())?;
                    items.remove(index);
                }
                FieldOp::MoveUp(index) => {
                    check_index(key, index, items.len())?;
                    if index > 0 {
                        items.swap(index - 1, index);
                    }
                }
                FieldOp::MoveDown(index) => {
                    check_index(key, index, items.len())?;
                    if index + 1 < items.len() {
                        items.swap(index, index + 1);
                    }
                }
                op => return Err(kind_mismatch(descriptor, &op)),
            }
            Ok(serde_json::to_value(items).unwrap_or(Value::Array(Vec::new())))
        }

        (_, op) => Err(kind_mismatch(descriptor, &op)),
    }
}

/// Which testimonial records are expanded in the editor.
///
/// Session-local UI state, never persisted. Tracked by record id so it
/// survives reordering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestimonialPanel {
    expanded: BTreeSet<SmolStr>,
}

impl TestimonialPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip a record open or closed. Returns the new state.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.expanded.remove(id) {
            false
        } else {
            self.expanded.insert(id.into());
            true
        }
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.contains(id)
    }

    /// Forget records that no longer exist.
    pub fn retain_existing(&mut self, items: &[Testimonial]) {
        self.expanded
            .retain(|id| items.iter().any(|t| &t.id == id));
    }

    pub fn expanded_count(&self) -> usize {
        self.expanded.len()
    }
}

/// Read testimonial records, giving id-less records a fresh id.
pub fn read_testimonials(value: Option<&Value>) -> Vec<Testimonial> {
    let mut items: Vec<Testimonial> = Vec::new();
    for mut item in read_records::<Testimonial>(value) {
        if item.id.is_empty() || items.iter().any(|t| t.id == item.id) {
            item.id = next_id("testimonial", items.iter().map(|t| &t.id));
        }
        items.push(item);
    }
    items
}

/// One record per stored entry, in order. Entries that are not objects are
/// kept as the record's first text slot.
fn read_records<T: Record>(value: Option<&Value>) -> Vec<T> {
    value
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .map(|entry| match entry {
                    Value::Object(_) => {
                        T::deserialize(entry).unwrap_or_else(|_| T::from_text(entry.to_string()))
                    }
                    other => T::from_text(text_of(Some(other))),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn scalar_text<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    Value::deserialize(deserializer).map(|v| text_of(Some(&v)))
}

fn scalar_id<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<SmolStr, D::Error> {
    scalar_text(deserializer).map(SmolStr::from)
}

fn optional_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    Value::deserialize(deserializer).map(|v| match v {
        Value::Null => None,
        other => Some(text_of(Some(&other))),
    })
}

fn text_of(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn next_id<'a>(prefix: &str, existing: impl Iterator<Item = &'a SmolStr> + Clone) -> SmolStr {
    (1..)
        .map(|n| format_smolstr!("{prefix}-{n}"))
        .find(|candidate| !existing.clone().any(|id| id == candidate))
        .unwrap_or_default()
}

fn check_index(key: &str, index: usize, len: usize) -> Result<()> {
    if index < len {
        Ok(())
    } else {
        Err(EditorError::IndexOutOfRange {
            key: key.into(),
            index,
            len,
        })
    }
}

fn check_capacity(descriptor: &FieldDescriptor, len: usize) -> Result<()> {
    match descriptor.max_items {
        Some(max) if len >= max => Err(EditorError::ArrayFull {
            key: descriptor.key.into(),
            max,
        }),
        _ => Ok(()),
    }
}

fn kind_mismatch(descriptor: &FieldDescriptor, op: &FieldOp) -> EditorError {
    EditorError::FieldKind {
        key: descriptor.key.into(),
        kind: descriptor.kind,
        op: op.name(),
    }
}
