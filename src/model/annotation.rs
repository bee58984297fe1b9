use serde::{Deserialize, Serialize};

use crate::{
    annotation::{Annotation, AnnotationStyle, Size},
    flow::Position,
    utils,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationModel {
    #[serde(default)]
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub style: AnnotationStyle,
    #[serde(default)]
    pub html: String,
}

impl From<&Annotation> for AnnotationModel {
    fn from(a: &Annotation) -> Self {
        Self {
            id: a.id.clone(),
            x: a.position.x,
            y: a.position.y,
            width: a.size.width,
            height: a.size.height,
            style: a.style.clone(),
            html: a.html.clone(),
        }
    }
}

impl From<&AnnotationModel> for Annotation {
    fn from(m: &AnnotationModel) -> Self {
        Self {
            id: if m.id.is_empty() { utils::shortid() } else { m.id.clone() },
            position: Position::new(m.x, m.y),
            size: Size {
                width: m.width,
                height: m.height,
            },
            style: m.style.clone(),
            html: m.html.clone(),
        }
    }
}
