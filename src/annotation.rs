//! Annotation codec.
//!
//! Free-form notes on the canvas are stored apart from the slot model, as one
//! versioned array document in the row's `BLK` column. Each note is a flat tuple:
//!
//! ```text
//! [id, x, y, width, height, font_size, text_color, bg_color, bold, italic, text]
//! ```
//!
//! Rich text is flattened to plain text with newlines on encode and rebuilt as
//! minimal escaped markup on decode. Decoding is defensive: a broken document yields
//! no notes and a broken entry is skipped.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{FlowError, Result, flow::Position, utils};

pub const ANNOTATION_VERSION: u32 = 1;

static BREAK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>|</(?:p|div|li|h[1-6])\s*>").unwrap());
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

type AnnotationEntry = (String, f64, f64, f64, f64, u32, String, String, bool, bool, String);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationStyle {
    pub font_size: u32,
    pub text_color: String,
    pub bg_color: String,
    pub bold: bool,
    pub italic: bool,
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self {
            font_size: 14,
            text_color: "#1f2937".to_string(),
            bg_color: "#fef3c7".to_string(),
            bold: false,
            italic: false,
        }
    }
}

/// A free text node on the canvas. Never takes a slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: String,
    pub position: Position,
    pub size: Size,
    #[serde(default)]
    pub style: AnnotationStyle,
    /// rich text as edited on the canvas
    pub html: String,
}

impl Annotation {
    pub fn new(
        position: Position,
        size: Size,
        html: impl Into<String>,
    ) -> Self {
        Self {
            id: utils::shortid(),
            position,
            size,
            style: AnnotationStyle::default(),
            html: html.into(),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct AnnotationDocument {
    v: u32,
    #[serde(default)]
    items: Vec<serde_json::Value>,
}

/// Encode annotations into a `BLK` document.
pub fn encode(annotations: &[Annotation]) -> Result<String> {
    let items = annotations
        .iter()
        .map(|a| {
            let entry: AnnotationEntry = (
                a.id.clone(),
                a.position.x,
                a.position.y,
                a.size.width,
                a.size.height,
                a.style.font_size,
                a.style.text_color.clone(),
                a.style.bg_color.clone(),
                a.style.bold,
                a.style.italic,
                flatten_rich_text(&a.html),
            );
            serde_json::to_value(entry)
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let doc = AnnotationDocument {
        v: ANNOTATION_VERSION,
        items,
    };
    Ok(serde_json::to_string(&doc)?)
}

/// Decode a `BLK` document, reporting a broken document as an error.
///
/// Individual entries that do not parse are skipped.
pub fn try_decode(s: &str) -> Result<Vec<Annotation>> {
    if s.trim().is_empty() {
        return Ok(Vec::new());
    }

    let doc: AnnotationDocument = serde_json::from_str(s).map_err(|e| FlowError::MalformedAnnotationDocument(e.to_string()))?;
    if doc.v != ANNOTATION_VERSION {
        return Err(FlowError::MalformedAnnotationDocument(format!("unsupported version {}", doc.v)));
    }

    let annotations = doc
        .items
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| match serde_json::from_value::<AnnotationEntry>(item) {
            Ok((id, x, y, width, height, font_size, text_color, bg_color, bold, italic, text)) => Some(Annotation {
                id,
                position: Position::new(x, y),
                size: Size {
                    width,
                    height,
                },
                style: AnnotationStyle {
                    font_size,
                    text_color,
                    bg_color,
                    bold,
                    italic,
                },
                html: to_markup(&text),
            }),
            Err(e) => {
                warn!("skipping annotation entry {}: {}", i, e);
                None
            }
        })
        .collect();

    Ok(annotations)
}

/// Decode a `BLK` document. Anything unreadable yields no annotations.
pub fn decode(s: &str) -> Vec<Annotation> {
    try_decode(s).unwrap_or_else(|e| {
        warn!("{}, loading without annotations", e);
        Vec::new()
    })
}

/// Flatten rich text to plain text, turning line-level tags into newlines.
pub fn flatten_rich_text(html: &str) -> String {
    let with_breaks = BREAK_RE.replace_all(html, "\n");
    let stripped = TAG_RE.replace_all(&with_breaks, "");
    let text = stripped
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&");
    text.trim_end_matches('\n').to_string()
}

/// Rebuild escaped markup from plain text, one `<br>` per newline.
pub fn to_markup(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
        .replace('\n', "<br>")
}
