use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    FlowError, Result,
    annotation::Annotation,
    flow::{Edge, Flow, Group, Position, START_NODE_ID, Step, Viewport},
    model::{AnnotationModel, EdgeModel, GroupModel},
    utils,
};

/// Flow as exchanged with the editor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewport: Option<Viewport>,
    #[serde(default)]
    pub groups: Vec<GroupModel>,
    #[serde(default)]
    pub annotations: Vec<AnnotationModel>,
    #[serde(default)]
    pub edges: Vec<EdgeModel>,
}

impl FlowModel {
    pub fn from_json(s: &str) -> Result<Self> {
        let flow = serde_json::from_str::<FlowModel>(s);
        match flow {
            Ok(v) => Ok(v),
            Err(e) => Err(FlowError::Convert(format!("{}", e))),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl TryFrom<&FlowModel> for Flow {
    type Error = FlowError;

    /// Build a runtime flow from editor input.
    ///
    /// Missing ids are minted. Every payload is validated as on a step edit, with
    /// schedule overlaps logged. Stale or conflicting slots are renormalized.
    fn try_from(model: &FlowModel) -> Result<Self> {
        let mut group_ids = HashSet::new();
        let mut step_ids = HashSet::new();
        let mut groups = Vec::with_capacity(model.groups.len());

        for gm in &model.groups {
            let id = if gm.id.is_empty() { utils::shortid() } else { gm.id.clone() };
            if id == START_NODE_ID || !group_ids.insert(id.clone()) {
                return Err(FlowError::Convert(format!("duplicate group id {}", id)));
            }

            let mut steps = Vec::with_capacity(gm.steps.len());
            for sm in &gm.steps {
                for warning in sm.payload.validate()? {
                    warn!("step {}: {}", sm.id, warning);
                }
                let mut step = Step::new(sm.payload.clone());
                if !sm.id.is_empty() {
                    step.id = sm.id.clone();
                }
                if !step_ids.insert(step.id.clone()) {
                    return Err(FlowError::Convert(format!("duplicate step id {}", step.id)));
                }
                if let Some(slot) = &sm.slot {
                    step.slot = Some(slot.parse()?);
                }
                steps.push(step);
            }

            groups.push(Group {
                id,
                title: gm.title.clone(),
                position: Position::new(gm.x, gm.y),
                steps,
            });
        }

        let mut edges = Vec::with_capacity(model.edges.len());
        for em in &model.edges {
            if em.source != START_NODE_ID && !group_ids.contains(&em.source) {
                return Err(FlowError::Edge(format!("source node {} not found", em.source)));
            }
            if !group_ids.contains(&em.target) {
                return Err(FlowError::Edge(format!("target node {} not found", em.target)));
            }
            if em.source == em.target {
                return Err(FlowError::Edge(format!("node {} cannot connect to itself", em.source)));
            }
            edges.push(Edge::new(em.source.clone(), em.target.clone()));
        }

        let mut flow = Flow::from_parts(model.start, model.viewport, groups, edges);
        flow.set_annotations(model.annotations.iter().map(Annotation::from).collect());
        if !flow.is_consistent() {
            debug!("editor slots are inconsistent, renormalizing");
            flow.renormalize()?;
        }
        Ok(flow)
    }
}

impl From<&Flow> for FlowModel {
    fn from(flow: &Flow) -> Self {
        Self {
            start: flow.start(),
            viewport: flow.viewport(),
            groups: flow.groups().iter().map(GroupModel::from).collect(),
            annotations: flow.annotations().iter().map(AnnotationModel::from).collect(),
            edges: flow.edges().iter().map(EdgeModel::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{StepPayload, TimeRule};

    const EDITOR_JSON: &str = r#"
    {
        "start": {"x": -100, "y": 0},
        "viewport": {"x": 0, "y": 0, "zoom": 1.5},
        "groups": [
            {
                "id": "welcome",
                "title": "Welcome",
                "x": 0,
                "y": 0,
                "steps": [
                    {"id": "s1", "slot": "M1", "payload": {"kind": "text", "text": "hi"}},
                    {"id": "s2", "slot": "T1", "payload": {"kind": "timer", "min": 5, "max": 10}},
                    {"id": "s3", "payload": {"kind": "note", "text": "remember"}}
                ]
            },
            {
                "id": "pitch",
                "title": "Pitch",
                "x": 300,
                "y": 0,
                "steps": [
                    {"payload": {"kind": "hook_add", "flow": "upsell", "delay": "02:15"}}
                ]
            }
        ],
        "annotations": [
            {"x": 10, "y": 400, "width": 200, "height": 80, "html": "<p>draft</p>"}
        ],
        "edges": [
            {"source": "start", "target": "welcome"},
            {"source": "welcome", "target": "pitch"}
        ]
    }
    "#;

    #[test]
    fn test_from_json() {
        let model = FlowModel::from_json(EDITOR_JSON).unwrap();
        assert_eq!(model.groups.len(), 2);
        assert_eq!(model.groups[0].steps[1].payload, StepPayload::Timer {
            min: 5,
            max: 10
        });

        let flow = Flow::try_from(&model).unwrap();
        assert!(flow.is_consistent());
        assert_eq!(flow.edges().len(), 2);
        assert_eq!(flow.annotations().len(), 1);
        let pitch = flow.group("pitch").unwrap();
        assert_eq!(pitch.steps[0].slot.map(|s| s.to_string()), Some("M2".to_string()));
    }

    #[test]
    fn test_invalid_input() {
        assert!(matches!(FlowModel::from_json("{\"groups\": 3}"), Err(FlowError::Convert(_))));

        let mut model = FlowModel::from_json(EDITOR_JSON).unwrap();
        model.edges.push(EdgeModel {
            source: "pitch".to_string(),
            target: "nowhere".to_string(),
        });
        assert!(matches!(Flow::try_from(&model), Err(FlowError::Edge(_))));

        let mut model = FlowModel::from_json(EDITOR_JSON).unwrap();
        model.groups[0].steps[0].slot = Some("Q1".to_string());
        assert!(matches!(Flow::try_from(&model), Err(FlowError::InvalidSlotFormat(_))));

        let mut model = FlowModel::from_json(EDITOR_JSON).unwrap();
        model.groups[1].id = "welcome".to_string();
        assert!(matches!(Flow::try_from(&model), Err(FlowError::Convert(_))));
    }

    #[test]
    fn test_invalid_payloads_are_rejected() {
        let mut model = FlowModel::from_json(EDITOR_JSON).unwrap();
        model.groups[0].steps[0].payload = StepPayload::TextSchedule {
            rules: vec![TimeRule::new("13:00", "12:00", "late", None).unwrap()],
        };
        assert!(matches!(Flow::try_from(&model), Err(FlowError::InvalidPayload(_))));

        let mut model = FlowModel::from_json(EDITOR_JSON).unwrap();
        model.groups[0].steps[1].payload = StepPayload::Timer {
            min: 10,
            max: 5,
        };
        assert!(matches!(Flow::try_from(&model), Err(FlowError::InvalidPayload(_))));

        let mut model = FlowModel::from_json(EDITOR_JSON).unwrap();
        model.groups[0].steps[0].payload = StepPayload::text("LINK me https://x.y");
        assert!(matches!(Flow::try_from(&model), Err(FlowError::InvalidPayload(_))));

        let mut model = FlowModel::from_json(EDITOR_JSON).unwrap();
        model.groups[0].steps[0].payload = StepPayload::TextSchedule {
            rules: vec![TimeRule::new("08:00", "12:00", "a", None).unwrap(), TimeRule::new("11:00", "13:00", "b", None).unwrap()],
        };
        assert!(Flow::try_from(&model).is_ok());
    }

    #[test]
    fn test_stale_slots_are_renormalized() {
        let mut model = FlowModel::from_json(EDITOR_JSON).unwrap();
        model.groups[0].steps[1].slot = Some("M1".to_string());
        let flow = Flow::try_from(&model).unwrap();
        assert!(flow.is_normalized());
        assert_eq!(flow.step("s2").and_then(|s| s.slot).map(|s| s.to_string()), Some("T1".to_string()));
    }

    #[test]
    fn test_model_roundtrip() {
        let flow = Flow::try_from(&FlowModel::from_json(EDITOR_JSON).unwrap()).unwrap();
        let model = FlowModel::from(&flow);
        let json = model.to_json().unwrap();
        let again = Flow::try_from(&FlowModel::from_json(&json).unwrap()).unwrap();
        assert_eq!(again, flow);
    }
}
