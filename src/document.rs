// SPDX-License-Identifier: PMPL-1.0-or-later
//! Document collaborator interface.
//!
//! The analysis pipeline consumes documents exclusively through the
//! [`Document`] and [`Page`] traits: page-count, metadata, text runs,
//! annotations, a drawing-operation trace, and a rendered snapshot image.
//! Every per-page call is fallible; callers degrade per page rather than
//! aborting the whole pass.
//!
//! [`SnapshotDocument`] is a serde-backed in-memory implementation fed by a
//! JSON snapshot, used by the CLI and the test suite. Production adapters
//! wrapping an actual document reader implement the same traits.

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::geometry::Rect;

/// Document-level metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub language: Option<String>,
}

/// One positioned run of text on a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub font_size: f32,
}

impl TextRun {
    /// Bounding box in page coordinates
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

/// Annotation discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    Link,
    Widget,
    Other,
}

/// Interactive form field kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Button,
    Checkbox,
    RadioButton,
    Combobox,
    Listbox,
    Other,
}

impl FieldKind {
    /// Field kinds complex enough to need supplementary instructions
    pub fn needs_instructions(&self) -> bool {
        matches!(
            self,
            FieldKind::Combobox | FieldKind::Listbox | FieldKind::RadioButton
        )
    }

    /// Label used when embedding the kind in prompts and messages
    pub fn label(&self) -> &'static str {
        match self {
            FieldKind::Text => "text field",
            FieldKind::Button => "button",
            FieldKind::Checkbox => "checkbox",
            FieldKind::RadioButton => "radio button",
            FieldKind::Combobox => "combo box",
            FieldKind::Listbox => "list box",
            FieldKind::Other => "form field",
        }
    }
}

/// Script snippets bound to a form field's events. Each entry is the raw
/// action text; hazard checks scan these for known markers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldActions {
    pub mouse_down: Option<String>,
    pub mouse_up: Option<String>,
    pub key_down: Option<String>,
    pub key_up: Option<String>,
    pub focus: Option<String>,
    pub blur: Option<String>,
}

impl FieldActions {
    /// All bound scripts, regardless of event
    pub fn scripts(&self) -> impl Iterator<Item = &str> {
        [
            &self.mouse_down,
            &self.mouse_up,
            &self.key_down,
            &self.key_up,
            &self.focus,
            &self.blur,
        ]
        .into_iter()
        .filter_map(|s| s.as_deref())
    }

    /// A mouse handler exists without an analogous key handler
    pub fn mouse_only(&self) -> bool {
        (self.mouse_down.is_some() || self.mouse_up.is_some()) && self.key_down.is_none()
    }
}

/// One page annotation (link or interactive field)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Annotation {
    pub subtype: AnnotationKind,
    pub rect: Rect,
    pub field_name: Option<String>,
    pub field_kind: Option<FieldKind>,
    /// Field instructions / alternate description
    pub alternative_text: Option<String>,
    pub tab_order: Option<i32>,
    pub actions: Option<FieldActions>,
    pub url: Option<String>,
}

/// Entry in a page's drawing-operation trace. Only the operations the
/// detector cares about are distinguished.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum DrawOp {
    /// Marked-content region start; its presence is the tagged-content signal
    BeginMarkedContent,
    /// An embedded image drawn onto the page
    PaintImage {
        bounds: Rect,
        alt_text: Option<String>,
    },
    Other,
}

/// A structured document under analysis
#[async_trait]
pub trait Document: Send + Sync {
    /// Source name, for session bookkeeping
    fn name(&self) -> &str;

    /// Total page count
    fn page_count(&self) -> u32;

    /// Document metadata. Failure here is fatal to the analysis pass.
    async fn metadata(&self) -> Result<DocumentMetadata>;

    /// Fetch a page, 1-based. Failure affects only that page.
    async fn page(&self, number: u32) -> Result<Box<dyn Page>>;
}

/// One page of a document
#[async_trait]
pub trait Page: Send + Sync {
    async fn text_runs(&self) -> Result<Vec<TextRun>>;

    async fn annotations(&self) -> Result<Vec<Annotation>>;

    /// Drawing-operation trace, sufficient to detect tagged-content markers
    /// and embedded images
    async fn operations(&self) -> Result<Vec<DrawOp>>;

    /// Rendered snapshot of the page as an encoded image blob
    async fn render_to_image(&self, scale: f32) -> Result<Vec<u8>>;
}

// =============================================================================
// Snapshot implementation
// =============================================================================

/// Serializable capture of a whole document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    pub title: Option<String>,
    pub language: Option<String>,
    #[serde(default)]
    pub pages: Vec<PageSnapshot>,
}

/// Serializable capture of one page
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageSnapshot {
    #[serde(default)]
    pub text_runs: Vec<TextRun>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub operations: Vec<DrawOp>,
    /// Pre-rendered page image, base64-encoded
    #[serde(default)]
    pub image: Option<String>,
}

/// In-memory [`Document`] backed by a [`DocumentSnapshot`]
#[derive(Debug, Clone)]
pub struct SnapshotDocument {
    name: String,
    snapshot: DocumentSnapshot,
}

impl SnapshotDocument {
    pub fn new(name: &str, snapshot: DocumentSnapshot) -> Self {
        Self {
            name: name.to_string(),
            snapshot,
        }
    }

    /// Load a snapshot from a JSON file; the file stem becomes the name
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let snapshot: DocumentSnapshot = serde_json::from_str(&raw)
            .map_err(|e| Error::UnreadableDocument(format!("{}: {}", path.display(), e)))?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document")
            .to_string();
        Ok(Self { name, snapshot })
    }
}

#[async_trait]
impl Document for SnapshotDocument {
    fn name(&self) -> &str {
        &self.name
    }

    fn page_count(&self) -> u32 {
        self.snapshot.pages.len() as u32
    }

    async fn metadata(&self) -> Result<DocumentMetadata> {
        Ok(DocumentMetadata {
            title: self.snapshot.title.clone(),
            language: self.snapshot.language.clone(),
        })
    }

    async fn page(&self, number: u32) -> Result<Box<dyn Page>> {
        let idx = number
            .checked_sub(1)
            .ok_or_else(|| Error::Page(number, "page numbers are 1-based".to_string()))?;
        let page = self
            .snapshot
            .pages
            .get(idx as usize)
            .ok_or_else(|| Error::Page(number, "page out of range".to_string()))?;
        Ok(Box::new(SnapshotPage {
            number,
            page: page.clone(),
        }))
    }
}

struct SnapshotPage {
    number: u32,
    page: PageSnapshot,
}

#[async_trait]
impl Page for SnapshotPage {
    async fn text_runs(&self) -> Result<Vec<TextRun>> {
        Ok(self.page.text_runs.clone())
    }

    async fn annotations(&self) -> Result<Vec<Annotation>> {
        Ok(self.page.annotations.clone())
    }

    async fn operations(&self) -> Result<Vec<DrawOp>> {
        Ok(self.page.operations.clone())
    }

    async fn render_to_image(&self, _scale: f32) -> Result<Vec<u8>> {
        match &self.page.image {
            Some(encoded) => base64::engine::general_purpose::STANDARD
                .decode(encoded)
                .map_err(|e| Error::Page(self.number, format!("invalid page image: {}", e))),
            None => Ok(Vec::new()),
        }
    }
}
