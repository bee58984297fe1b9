use serde::{Deserialize, Serialize};

use crate::{
    codec::StepPayload,
    flow::{Group, Step},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepModel {
    #[serde(default)]
    pub id: String,
    /// slot name as last shown in the editor, e.g. `M3`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<String>,
    pub payload: StepPayload,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupModel {
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub steps: Vec<StepModel>,
}

impl From<&Step> for StepModel {
    fn from(step: &Step) -> Self {
        Self {
            id: step.id.clone(),
            slot: step.slot.map(|s| s.to_string()),
            payload: step.payload.clone(),
        }
    }
}

impl From<&Group> for GroupModel {
    fn from(group: &Group) -> Self {
        Self {
            id: group.id.clone(),
            title: group.title.clone(),
            x: group.position.x,
            y: group.position.y,
            steps: group.steps.iter().map(StepModel::from).collect(),
        }
    }
}
