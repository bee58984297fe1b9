//! Whole-graph structure document stored in the row's `POSICAO` column.
//!
//! Payloads never live here. The snapshot records group layout, the slot names each
//! group holds, the canonical visitation order and every edge; restoring joins the
//! payloads fetched from the slot columns back in by slot name.

pub mod legacy;

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    FlowError, Result,
    codec::StepPayload,
    flow::{Edge, Flow, Group, GroupId, Position, Slot, Step, Viewport, resolve_order},
};

pub use legacy::LEGACY_GROUP_SPACING;

pub const SNAPSHOT_VERSION: u32 = 2;

/// Title of the group created for fetched slots when no group was recorded.
pub const DEFAULT_GROUP_TITLE: &str = "Group 1";

/// x, y, title, slot names
type GroupEntry = (f64, f64, String, Vec<String>);

#[derive(Serialize, Deserialize)]
struct SnapshotDocument {
    v: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    vp: Option<(f64, f64, f64)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start: Option<(f64, f64)>,
    #[serde(default)]
    order: Vec<GroupId>,
    #[serde(default)]
    groups: BTreeMap<GroupId, GroupEntry>,
    #[serde(default)]
    edges: Vec<(String, String)>,
}

/// Recorded layout of one group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupLayout {
    pub id: GroupId,
    pub position: Position,
    pub title: String,
    /// slot names in step order
    pub slots: Vec<Slot>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub viewport: Option<Viewport>,
    pub start: Option<Position>,
    /// groups in canonical visitation order
    pub groups: Vec<GroupLayout>,
    pub edges: Vec<Edge>,
}

impl Snapshot {
    /// Capture the structure of `flow`. Notes hold no slot and are left out.
    pub fn capture(flow: &Flow) -> Self {
        let groups = resolve_order(flow)
            .into_iter()
            .filter_map(|og| flow.group(&og.id))
            .map(|group| GroupLayout {
                id: group.id.clone(),
                position: group.position,
                title: group.title.clone(),
                slots: group.steps.iter().filter_map(|s| s.slot).collect(),
            })
            .collect();

        Self {
            viewport: flow.viewport(),
            start: flow.start(),
            groups,
            edges: flow.edges().to_vec(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.edges.is_empty()
    }

    /// Encode in the current format.
    pub fn encode(&self) -> Result<String> {
        let doc = SnapshotDocument {
            v: SNAPSHOT_VERSION,
            vp: self.viewport.map(|vp| (vp.x, vp.y, vp.zoom)),
            start: self.start.map(|p| (p.x, p.y)),
            order: self.groups.iter().map(|g| g.id.clone()).collect(),
            groups: self
                .groups
                .iter()
                .map(|g| (g.id.clone(), (g.position.x, g.position.y, g.title.clone(), g.slots.iter().map(Slot::to_string).collect())))
                .collect(),
            edges: self.edges.iter().map(|e| (e.source.clone(), e.target.clone())).collect(),
        };
        Ok(serde_json::to_string(&doc)?)
    }

    /// Decode either format, reporting unreadable input as an error.
    ///
    /// Empty input is an empty snapshot.
    pub fn try_decode(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Self::default());
        }
        if legacy::is_legacy(s) {
            return legacy::parse(s);
        }

        let doc: SnapshotDocument = serde_json::from_str(s).map_err(|e| FlowError::MalformedSnapshot(e.to_string()))?;
        if doc.v != SNAPSHOT_VERSION {
            return Err(FlowError::MalformedSnapshot(format!("unsupported version {}", doc.v)));
        }
        Ok(Self::from_document(doc))
    }

    /// Decode either format. Anything unreadable yields an empty snapshot.
    pub fn decode(s: &str) -> Self {
        Self::try_decode(s).unwrap_or_else(|e| {
            warn!("{}, loading an empty structure", e);
            Self::default()
        })
    }

    fn from_document(mut doc: SnapshotDocument) -> Self {
        let mut ids = Vec::with_capacity(doc.groups.len());
        let mut seen = HashSet::new();
        for id in doc.order.drain(..) {
            if !doc.groups.contains_key(&id) {
                warn!("snapshot order names unknown group {}", id);
            } else if seen.insert(id.clone()) {
                ids.push(id);
            }
        }
        ids.extend(doc.groups.keys().filter(|id| !seen.contains(*id)).cloned().collect::<Vec<_>>());

        let groups = ids
            .into_iter()
            .filter_map(|id| {
                let (x, y, title, slots) = doc.groups.remove(&id)?;
                let slots = slots
                    .iter()
                    .filter_map(|name| match name.parse::<Slot>() {
                        Ok(slot) => Some(slot),
                        Err(e) => {
                            warn!("group {}: {}", id, e);
                            None
                        }
                    })
                    .collect();
                Some(GroupLayout {
                    id,
                    position: Position::new(x, y),
                    title,
                    slots,
                })
            })
            .collect();

        Self {
            viewport: doc.vp.map(|(x, y, zoom)| Viewport {
                x,
                y,
                zoom,
            }),
            start: doc.start.map(|(x, y)| Position::new(x, y)),
            groups,
            edges: doc.edges.into_iter().map(|(source, target)| Edge::new(source, target)).collect(),
        }
    }

    /// Rebuild a flow, joining `fetched` payloads in by slot name.
    ///
    /// Recorded slots without a payload are skipped. Fetched payloads no group refers
    /// to are appended to the last group in slot order.
    pub fn restore(
        self,
        fetched: BTreeMap<Slot, StepPayload>,
    ) -> Flow {
        let mut remaining = fetched;
        let mut groups: Vec<Group> = self
            .groups
            .into_iter()
            .map(|layout| {
                let steps = layout.slots.iter().filter_map(|slot| remaining.remove(slot).map(|payload| Step::new(payload).with_slot(*slot))).collect();
                Group {
                    id: layout.id,
                    title: layout.title,
                    position: layout.position,
                    steps,
                }
            })
            .collect();

        if !remaining.is_empty() {
            debug!("{} fetched slots not referenced by the structure", remaining.len());
            if groups.is_empty() {
                groups.push(Group::new(DEFAULT_GROUP_TITLE, Position::default()));
            }
            if let Some(last) = groups.last_mut() {
                last.steps.extend(remaining.into_iter().map(|(slot, payload)| Step::new(payload).with_slot(slot)));
            }
        }

        Flow::from_parts(self.start, self.viewport, groups, self.edges)
    }
}

/// Encode the structure of `flow`.
pub fn encode(flow: &Flow) -> Result<String> {
    Snapshot::capture(flow).encode()
}
