//! Editable flow graph.
//!
//! A flow holds the start node, groups of ordered steps, free annotation nodes and
//! the edges between groups. Every structural edit (steps added, removed, moved or
//! reordered; edges added or removed; groups moved) renormalizes the slot
//! assignment before returning, so a flow handed back to the caller is consistent.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    FlowError, Result,
    annotation::Annotation,
    codec::{RuleWarning, StepPayload},
    flow::{
        Slot, SlotAssignment, Step, StepId,
        order::{OrderedGroup, resolve_order},
        slot::{compact_after_removal, next_free_slot, normalize, validate_manual_assignment},
    },
    utils,
};

/// Id of the distinguished start node that edges may leave from.
pub const START_NODE_ID: &str = "start";

/// group id
pub type GroupId = String;

/// Canvas coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(
        x: f64,
        y: f64,
    ) -> Self {
        Self {
            x,
            y,
        }
    }
}

/// Canvas pan and zoom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

/// A visual container of ordered steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub title: String,
    pub position: Position,
    pub steps: Vec<Step>,
}

impl Group {
    pub fn new(
        title: impl Into<String>,
        position: Position,
    ) -> Self {
        Self {
            id: utils::shortid(),
            title: title.into(),
            position,
            steps: Vec::new(),
        }
    }
}

/// Intended execution order between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    /// group id or [`START_NODE_ID`]
    pub source: String,
    /// group id
    pub target: String,
}

impl Edge {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Flow {
    start: Option<Position>,
    viewport: Option<Viewport>,
    groups: Vec<Group>,
    annotations: Vec<Annotation>,
    edges: Vec<Edge>,
}

impl Flow {
    /// create an empty flow
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a flow from decoded parts. Slots are kept as given.
    ///
    /// Edges whose endpoints are unknown are dropped.
    pub(crate) fn from_parts(
        start: Option<Position>,
        viewport: Option<Viewport>,
        groups: Vec<Group>,
        edges: Vec<Edge>,
    ) -> Self {
        let mut flow = Self {
            start,
            viewport,
            groups,
            annotations: Vec::new(),
            edges: Vec::new(),
        };
        for edge in edges {
            match flow.check_edge(&edge.source, &edge.target) {
                Ok(()) if !flow.edges.contains(&edge) => flow.edges.push(edge),
                Ok(()) => {}
                Err(e) => warn!("dropping edge {} -> {}: {}", edge.source, edge.target, e),
            }
        }
        flow
    }

    pub fn start(&self) -> Option<Position> {
        self.start
    }

    pub fn set_start(
        &mut self,
        position: Position,
    ) {
        self.start = Some(position);
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    pub fn set_viewport(
        &mut self,
        viewport: Option<Viewport>,
    ) {
        self.viewport = viewport;
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group(
        &self,
        id: &str,
    ) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// All steps, group by group in storage order.
    pub fn steps(&self) -> impl Iterator<Item = &Step> {
        self.groups.iter().flat_map(|g| g.steps.iter())
    }

    pub fn step(
        &self,
        id: &str,
    ) -> Option<&Step> {
        self.steps().find(|s| s.id == id)
    }

    /// Canonical group order, tagged `G1..Gn`.
    pub fn order(&self) -> Vec<OrderedGroup> {
        resolve_order(self)
    }

    /// Steps keyed by their assigned slot.
    pub fn slots(&self) -> BTreeMap<Slot, &Step> {
        self.steps().filter_map(|s| s.slot.map(|slot| (slot, s))).collect()
    }

    // ----- groups -----

    pub fn add_group(
        &mut self,
        title: &str,
        position: Position,
    ) -> GroupId {
        let group = Group::new(title, position);
        let id = group.id.clone();
        self.groups.push(group);
        id
    }

    pub fn rename_group(
        &mut self,
        id: &str,
        title: &str,
    ) -> Result<()> {
        let group = self.group_mut(id)?;
        group.title = title.to_string();
        Ok(())
    }

    /// Move a group on the canvas. Position breaks ordering ties, so slots follow.
    pub fn move_group(
        &mut self,
        id: &str,
        position: Position,
    ) -> Result<()> {
        self.group_mut(id)?.position = position;
        self.renormalize()
    }

    /// Remove a group together with its steps and every edge touching it.
    pub fn remove_group(
        &mut self,
        id: &str,
    ) -> Result<Group> {
        let idx = self.groups.iter().position(|g| g.id == id).ok_or(FlowError::GroupNotFound(id.to_string()))?;
        let group = self.groups.remove(idx);
        self.edges.retain(|e| e.source != id && e.target != id);
        self.renormalize()?;
        Ok(group)
    }

    // ----- steps -----

    /// Append a step to a group. Schedule overlap warnings are logged.
    pub fn add_step(
        &mut self,
        group_id: &str,
        payload: StepPayload,
    ) -> Result<StepId> {
        let (id, warnings) = self.add_step_with_warnings(group_id, payload)?;
        log_warnings(&warnings);
        Ok(id)
    }

    /// Append a step to a group, returning its id with any schedule overlap warnings.
    pub fn add_step_with_warnings(
        &mut self,
        group_id: &str,
        payload: StepPayload,
    ) -> Result<(StepId, Vec<RuleWarning>)> {
        let len = self.group(group_id).map(|g| g.steps.len()).ok_or(FlowError::GroupNotFound(group_id.to_string()))?;
        self.insert_step_with_warnings(group_id, len, payload)
    }

    /// Insert a step at `index` (clamped) of a group. Schedule overlap warnings are logged.
    pub fn insert_step(
        &mut self,
        group_id: &str,
        index: usize,
        payload: StepPayload,
    ) -> Result<StepId> {
        let (id, warnings) = self.insert_step_with_warnings(group_id, index, payload)?;
        log_warnings(&warnings);
        Ok(id)
    }

    /// Insert a step at `index` (clamped) of a group, returning its id with any
    /// schedule overlap warnings.
    ///
    /// Rejected without changes when the payload is invalid or its slot kind is full.
    pub fn insert_step_with_warnings(
        &mut self,
        group_id: &str,
        index: usize,
        payload: StepPayload,
    ) -> Result<(StepId, Vec<RuleWarning>)> {
        if self.group(group_id).is_none() {
            return Err(FlowError::GroupNotFound(group_id.to_string()));
        }
        let warnings = payload.validate()?;
        if let Some(kind) = payload.slot_kind() {
            next_free_slot(kind, self)?;
        }

        let step = Step::new(payload);
        let id = step.id.clone();
        let group = self.group_mut(group_id)?;
        let index = index.min(group.steps.len());
        group.steps.insert(index, step);

        self.renormalize()?;
        Ok((id, warnings))
    }

    /// Replace a step's payload, possibly changing its kind.
    pub fn update_step(
        &mut self,
        step_id: &str,
        payload: StepPayload,
    ) -> Result<Vec<RuleWarning>> {
        let warnings = payload.validate()?;
        let current = self.step(step_id).ok_or(FlowError::StepNotFound(step_id.to_string()))?;
        let kind_changed = current.slot_kind() != payload.slot_kind();
        if kind_changed {
            if let Some(kind) = payload.slot_kind() {
                next_free_slot(kind, self)?;
            }
        }

        let (gi, si) = self.locate(step_id)?;
        self.groups[gi].steps[si].payload = payload;
        if kind_changed {
            self.renormalize()?;
        }
        Ok(warnings)
    }

    /// Delete a step and close the slot gap it leaves.
    pub fn remove_step(
        &mut self,
        step_id: &str,
    ) -> Result<Step> {
        let was_normalized = self.is_normalized();
        let (gi, si) = self.locate(step_id)?;
        let step = self.groups[gi].steps.remove(si);

        match step.slot {
            Some(removed) if was_normalized => {
                let mut assignment = self.current_assignment();
                compact_after_removal(&mut assignment, removed);
                debug_assert_eq!(Some(&assignment), normalize(self).ok().as_ref());
                self.apply_assignment(&assignment);
            }
            _ => self.renormalize()?,
        }

        debug!("removed step {} ({})", step.id, step.kind().as_ref());
        Ok(step)
    }

    /// Move a step to `index` (clamped) of another, or the same, group.
    pub fn move_step(
        &mut self,
        step_id: &str,
        to_group: &str,
        index: usize,
    ) -> Result<()> {
        if self.group(to_group).is_none() {
            return Err(FlowError::GroupNotFound(to_group.to_string()));
        }
        let (gi, si) = self.locate(step_id)?;
        let step = self.groups[gi].steps.remove(si);
        let target = self.group_mut(to_group)?;
        let index = index.min(target.steps.len());
        target.steps.insert(index, step);
        self.renormalize()
    }

    /// Move a step within its own group.
    pub fn reorder_step(
        &mut self,
        step_id: &str,
        new_index: usize,
    ) -> Result<()> {
        let (gi, _) = self.locate(step_id)?;
        let group_id = self.groups[gi].id.clone();
        self.move_step(step_id, &group_id, new_index)
    }

    /// Manually pin a step to `requested`.
    ///
    /// The override holds until the next structural edit renormalizes the flow.
    pub fn assign_slot(
        &mut self,
        step_id: &str,
        requested: &str,
    ) -> Result<Slot> {
        let slot = validate_manual_assignment(step_id, requested, self)?;
        let (gi, si) = self.locate(step_id)?;
        self.groups[gi].steps[si].slot = Some(slot);
        debug!("step {} manually assigned {}", step_id, slot);
        Ok(slot)
    }

    // ----- edges -----

    /// Connect two nodes. Returns `false` if the edge already existed.
    pub fn add_edge(
        &mut self,
        source: &str,
        target: &str,
    ) -> Result<bool> {
        self.check_edge(source, target)?;
        let edge = Edge::new(source, target);
        if self.edges.contains(&edge) {
            return Ok(false);
        }
        self.edges.push(edge);
        self.renormalize()?;
        Ok(true)
    }

    /// Disconnect two nodes. Returns `false` if there was no such edge.
    pub fn remove_edge(
        &mut self,
        source: &str,
        target: &str,
    ) -> Result<bool> {
        let before = self.edges.len();
        self.edges.retain(|e| !(e.source == source && e.target == target));
        if self.edges.len() == before {
            return Ok(false);
        }
        self.renormalize()?;
        Ok(true)
    }

    fn check_edge(
        &self,
        source: &str,
        target: &str,
    ) -> Result<()> {
        if source != START_NODE_ID && self.group(source).is_none() {
            return Err(FlowError::Edge(format!("source node {} not found", source)));
        }
        if target == START_NODE_ID {
            return Err(FlowError::Edge("the start node cannot be an edge target".to_string()));
        }
        if self.group(target).is_none() {
            return Err(FlowError::Edge(format!("target node {} not found", target)));
        }
        if source == target {
            return Err(FlowError::Edge(format!("node {} cannot connect to itself", source)));
        }
        Ok(())
    }

    // ----- annotations -----

    pub fn add_annotation(
        &mut self,
        annotation: Annotation,
    ) -> String {
        let id = annotation.id.clone();
        self.annotations.push(annotation);
        id
    }

    pub fn annotation_mut(
        &mut self,
        id: &str,
    ) -> Option<&mut Annotation> {
        self.annotations.iter_mut().find(|a| a.id == id)
    }

    pub fn remove_annotation(
        &mut self,
        id: &str,
    ) -> Option<Annotation> {
        let idx = self.annotations.iter().position(|a| a.id == id)?;
        Some(self.annotations.remove(idx))
    }

    pub fn set_annotations(
        &mut self,
        annotations: Vec<Annotation>,
    ) {
        self.annotations = annotations;
    }

    // ----- normalization -----

    /// Recompute every slot from the canonical order.
    pub fn renormalize(&mut self) -> Result<()> {
        let assignment = normalize(self)?;
        self.apply_assignment(&assignment);
        Ok(())
    }

    /// Store `assignment` on the steps. Steps it does not mention lose their slot.
    pub fn apply_assignment(
        &mut self,
        assignment: &SlotAssignment,
    ) {
        for step in self.groups.iter_mut().flat_map(|g| g.steps.iter_mut()) {
            step.slot = assignment.get(&step.id).copied();
        }
    }

    /// Slots currently stored on the steps.
    pub fn current_assignment(&self) -> SlotAssignment {
        self.steps().filter_map(|s| s.slot.map(|slot| (s.id.clone(), slot))).collect()
    }

    /// Whether the stored slots equal the canonical assignment.
    pub fn is_normalized(&self) -> bool {
        normalize(self).map(|canonical| canonical == self.current_assignment()).unwrap_or(false)
    }

    /// Every slotted step holds a unique slot of its own kind, and notes hold none.
    pub fn is_consistent(&self) -> bool {
        let mut seen = HashSet::new();
        self.steps().all(|s| match (s.slot_kind(), s.slot) {
            (Some(kind), Some(slot)) => slot.kind == kind && seen.insert(slot),
            (None, None) => true,
            _ => false,
        })
    }

    fn group_mut(
        &mut self,
        id: &str,
    ) -> Result<&mut Group> {
        self.groups.iter_mut().find(|g| g.id == id).ok_or(FlowError::GroupNotFound(id.to_string()))
    }

    fn locate(
        &self,
        step_id: &str,
    ) -> Result<(usize, usize)> {
        self.groups
            .iter()
            .enumerate()
            .find_map(|(gi, g)| g.steps.iter().position(|s| s.id == step_id).map(|si| (gi, si)))
            .ok_or(FlowError::StepNotFound(step_id.to_string()))
    }
}

fn log_warnings(warnings: &[RuleWarning]) {
    for warning in warnings {
        warn!("{}", warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{FlowTarget, TimeRule};

    fn slot_of(
        flow: &Flow,
        id: &str,
    ) -> String {
        flow.step(id).and_then(|s| s.slot).map(|s| s.to_string()).unwrap_or_default()
    }

    #[test]
    fn test_edges_reorder_slots() {
        let mut flow = Flow::new();
        let left = flow.add_group("left", Position::new(0.0, 0.0));
        let right = flow.add_group("right", Position::new(200.0, 0.0));
        let l = flow.add_step(&left, StepPayload::text("left")).unwrap();
        let r = flow.add_step(&right, StepPayload::text("right")).unwrap();
        assert_eq!(slot_of(&flow, &l), "M1");

        flow.add_edge(START_NODE_ID, &right).unwrap();
        assert_eq!(slot_of(&flow, &r), "M1");
        assert_eq!(slot_of(&flow, &l), "M2");

        assert!(flow.remove_edge(START_NODE_ID, &right).unwrap());
        assert_eq!(slot_of(&flow, &l), "M1");
        assert!(!flow.remove_edge(START_NODE_ID, &right).unwrap());
    }

    #[test]
    fn test_edge_validation() {
        let mut flow = Flow::new();
        let a = flow.add_group("a", Position::default());
        assert!(matches!(flow.add_edge(&a, START_NODE_ID), Err(FlowError::Edge(_))));
        assert!(matches!(flow.add_edge(&a, &a), Err(FlowError::Edge(_))));
        assert!(matches!(flow.add_edge("ghost", &a), Err(FlowError::Edge(_))));
        assert!(flow.add_edge(START_NODE_ID, &a).unwrap());
        assert!(!flow.add_edge(START_NODE_ID, &a).unwrap());
        assert_eq!(flow.edges().len(), 1);
    }

    #[test]
    fn test_move_and_reorder_steps() {
        let mut flow = Flow::new();
        let a = flow.add_group("a", Position::new(0.0, 0.0));
        let b = flow.add_group("b", Position::new(10.0, 0.0));
        let s1 = flow.add_step(&a, StepPayload::text("1")).unwrap();
        let s2 = flow.add_step(&a, StepPayload::text("2")).unwrap();
        let s3 = flow.add_step(&b, StepPayload::text("3")).unwrap();

        flow.reorder_step(&s2, 0).unwrap();
        assert_eq!(slot_of(&flow, &s2), "M1");
        assert_eq!(slot_of(&flow, &s1), "M2");

        flow.move_step(&s2, &b, 99).unwrap();
        assert_eq!(slot_of(&flow, &s1), "M1");
        assert_eq!(slot_of(&flow, &s3), "M2");
        assert_eq!(slot_of(&flow, &s2), "M3");
        assert!(flow.is_normalized());
    }

    #[test]
    fn test_move_group_changes_order() {
        let mut flow = Flow::new();
        let a = flow.add_group("a", Position::new(0.0, 0.0));
        let b = flow.add_group("b", Position::new(10.0, 0.0));
        let sa = flow.add_step(&a, StepPayload::text("a")).unwrap();
        flow.add_step(&b, StepPayload::text("b")).unwrap();

        flow.move_group(&a, Position::new(20.0, 0.0)).unwrap();
        assert_eq!(slot_of(&flow, &sa), "M2");
    }

    #[test]
    fn test_remove_group_drops_edges_and_steps() {
        let mut flow = Flow::new();
        let a = flow.add_group("a", Position::new(0.0, 0.0));
        let b = flow.add_group("b", Position::new(10.0, 0.0));
        flow.add_edge(START_NODE_ID, &a).unwrap();
        flow.add_edge(&a, &b).unwrap();
        flow.add_step(&a, StepPayload::text("a")).unwrap();
        let sb = flow.add_step(&b, StepPayload::text("b")).unwrap();

        flow.remove_group(&a).unwrap();
        assert!(flow.edges().is_empty());
        assert_eq!(slot_of(&flow, &sb), "M1");
        assert!(matches!(flow.remove_group(&a), Err(FlowError::GroupNotFound(_))));
    }

    #[test]
    fn test_update_step_changes_slot_kind() {
        let mut flow = Flow::new();
        let g = flow.add_group("g", Position::default());
        let s1 = flow.add_step(&g, StepPayload::text("1")).unwrap();
        let s2 = flow.add_step(&g, StepPayload::text("2")).unwrap();

        flow.update_step(
            &s1,
            StepPayload::Timer {
                min: 1,
                max: 4,
            },
        )
        .unwrap();
        assert_eq!(slot_of(&flow, &s1), "T1");
        assert_eq!(slot_of(&flow, &s2), "M1");
    }

    #[test]
    fn test_overlapping_rules_are_warnings() {
        let mut flow = Flow::new();
        let g = flow.add_group("g", Position::default());
        let s = flow.add_step(&g, StepPayload::text("x")).unwrap();
        let payload = StepPayload::TextSchedule {
            rules: vec![TimeRule::new("08:00", "12:00", "a", None).unwrap(), TimeRule::new("11:00", "13:00", "b", None).unwrap()],
        };
        let warnings = flow.update_step(&s, payload).unwrap();
        assert_eq!(
            warnings,
            vec![RuleWarning::Overlap {
                first: 0,
                second: 1
            }]
        );

        let inverted = StepPayload::TextSchedule {
            rules: vec![TimeRule::new("13:00", "12:00", "a", None).unwrap()],
        };
        assert!(flow.update_step(&s, inverted.clone()).is_err());
        assert!(flow.add_step(&g, inverted).is_err());
        assert_eq!(flow.steps().count(), 1);
    }

    #[test]
    fn test_add_step_reports_overlaps() {
        let mut flow = Flow::new();
        let g = flow.add_group("g", Position::default());
        let overlapping = StepPayload::TextSchedule {
            rules: vec![TimeRule::new("08:00", "12:00", "a", None).unwrap(), TimeRule::new("11:00", "13:00", "b", None).unwrap()],
        };

        let (id, warnings) = flow.add_step_with_warnings(&g, overlapping.clone()).unwrap();
        assert_eq!(
            warnings,
            vec![RuleWarning::Overlap {
                first: 0,
                second: 1
            }]
        );
        assert_eq!(slot_of(&flow, &id), "M1");

        let (first, warnings) = flow.insert_step_with_warnings(&g, 0, StepPayload::text("intro")).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(slot_of(&flow, &first), "M1");
        assert_eq!(slot_of(&flow, &id), "M2");

        assert!(flow.add_step(&g, overlapping).is_ok());
        assert_eq!(flow.steps().count(), 3);
    }

    #[test]
    fn test_add_step_rejects_unreadable_content() {
        let mut flow = Flow::new();
        let g = flow.add_group("g", Position::default());
        let rejected = vec![
            StepPayload::text("LINK me https://x.y"),
            StepPayload::LinkTag {
                name: "".to_string(),
            },
            StepPayload::PhotoCaption {
                url: "".to_string(),
                caption: "".to_string(),
            },
            StepPayload::HookAdd(FlowTarget::new("launch-01:30")),
        ];
        for payload in rejected {
            assert!(matches!(flow.add_step(&g, payload), Err(FlowError::InvalidPayload(_))));
        }
        assert_eq!(flow.steps().count(), 0);

        let s = flow.add_step(&g, StepPayload::text("ok")).unwrap();
        assert!(matches!(flow.update_step(&s, StepPayload::text("SCHEDULE 08:00|09:00|x")), Err(FlowError::InvalidPayload(_))));
        assert_eq!(flow.step(&s).map(|s| s.payload.clone()), Some(StepPayload::text("ok")));
    }

    #[test]
    fn test_assign_slot_rejects_padded_names() {
        let mut flow = Flow::new();
        let g = flow.add_group("g", Position::default());
        let s = flow.add_step(&g, StepPayload::text("x")).unwrap();
        assert!(matches!(flow.assign_slot(&s, " M1"), Err(FlowError::InvalidSlotFormat(_))));
        assert!(matches!(flow.assign_slot(&s, "M2 "), Err(FlowError::InvalidSlotFormat(_))));
        assert_eq!(slot_of(&flow, &s), "M1");
    }

    #[test]
    fn test_manual_assignment_is_advisory() {
        let mut flow = Flow::new();
        let g = flow.add_group("g", Position::default());
        let s1 = flow.add_step(&g, StepPayload::text("1")).unwrap();
        let s2 = flow.add_step(&g, StepPayload::text("2")).unwrap();

        flow.assign_slot(&s1, "M9").unwrap();
        assert_eq!(slot_of(&flow, &s1), "M9");
        assert!(flow.is_consistent());
        assert!(!flow.is_normalized());
        assert!(matches!(flow.assign_slot(&s1, "M2"), Err(FlowError::DuplicateSlot { .. })));
        assert_eq!(slot_of(&flow, &s1), "M9");

        flow.reorder_step(&s2, 0).unwrap();
        assert_eq!(slot_of(&flow, &s2), "M1");
        assert_eq!(slot_of(&flow, &s1), "M2");
    }

    #[test]
    fn test_remove_step_from_unnormalized_flow_resequences() {
        let mut flow = Flow::new();
        let g = flow.add_group("g", Position::default());
        let s1 = flow.add_step(&g, StepPayload::text("1")).unwrap();
        let s2 = flow.add_step(&g, StepPayload::text("2")).unwrap();
        let s3 = flow.add_step(&g, StepPayload::text("3")).unwrap();
        flow.assign_slot(&s3, "M30").unwrap();

        flow.remove_step(&s1).unwrap();
        assert_eq!(slot_of(&flow, &s2), "M1");
        assert_eq!(slot_of(&flow, &s3), "M2");
    }

    #[test]
    fn test_notes_take_no_slot() {
        let mut flow = Flow::new();
        let g = flow.add_group("g", Position::default());
        let n = flow
            .add_step(
                &g,
                StepPayload::Note {
                    text: "todo".to_string(),
                },
            )
            .unwrap();
        let s = flow.add_step(&g, StepPayload::text("x")).unwrap();
        assert_eq!(slot_of(&flow, &n), "");
        assert_eq!(slot_of(&flow, &s), "M1");

        flow.remove_step(&n).unwrap();
        assert_eq!(slot_of(&flow, &s), "M1");
        assert!(flow.is_consistent());
    }
}
