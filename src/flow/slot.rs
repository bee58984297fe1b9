//! Slot allocation and normalization.
//!
//! A flow owns 100 named slots: `M1..M50` for content steps and `T1..T50` for timers.
//! The canonical assignment is always derived from scratch: walk groups in canonical
//! order, steps in list order, skip notes, and hand out the next `M` or `T` number.
//! [`compact_after_removal`] is a local shortcut for a single deletion and must agree
//! with a full [`normalize`].

use std::{collections::BTreeMap, fmt, str::FromStr, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{
    FlowError, Result,
    flow::{Flow, Group, StepId, order::resolve_order},
};

/// Highest slot index of either kind.
pub const MAX_SLOT_INDEX: u8 = 50;

static SLOT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([MT])(\d{1,2})$").unwrap());

/// Mapping from step id to its slot.
pub type SlotAssignment = BTreeMap<StepId, Slot>;

/// Slot family: content (`M`) or timer (`T`).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, strum::AsRefStr, strum::EnumString)]
pub enum SlotKind {
    M,
    T,
}

/// One named cell, `M1..M50` or `T1..T50`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slot {
    pub kind: SlotKind,
    pub index: u8,
}

impl Slot {
    pub fn new(
        kind: SlotKind,
        index: u8,
    ) -> Result<Self> {
        if index == 0 || index > MAX_SLOT_INDEX {
            return Err(FlowError::InvalidSlotFormat(format!("{}{}", kind.as_ref(), index)));
        }
        Ok(Self {
            kind,
            index,
        })
    }

    /// All 100 slots, `M1..M50` then `T1..T50`.
    pub fn all() -> impl Iterator<Item = Slot> {
        [SlotKind::M, SlotKind::T].into_iter().flat_map(|kind| {
            (1..=MAX_SLOT_INDEX).map(move |index| Slot {
                kind,
                index,
            })
        })
    }
}

impl FromStr for Slot {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self> {
        let caps = SLOT_RE.captures(s).ok_or(FlowError::InvalidSlotFormat(s.to_string()))?;
        let kind = caps[1].parse::<SlotKind>().map_err(|_| FlowError::InvalidSlotFormat(s.to_string()))?;
        let index = caps[2].parse::<u8>().map_err(|_| FlowError::InvalidSlotFormat(s.to_string()))?;
        Slot::new(kind, index).map_err(|_| FlowError::InvalidSlotFormat(s.to_string()))
    }
}

impl TryFrom<String> for Slot {
    type Error = FlowError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Slot> for String {
    fn from(value: Slot) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Slot {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}{}", self.kind.as_ref(), self.index)
    }
}

/// Compute the canonical slot of every slotted step in `flow`.
///
/// Idempotent: applying the result and normalizing again yields the same map.
pub fn normalize(flow: &Flow) -> Result<SlotAssignment> {
    let order = resolve_order(flow);
    let groups = order.iter().filter_map(|og| flow.group(&og.id));
    let assignment = sequence(groups)?;
    trace!("normalized {} slots over {} groups", assignment.len(), order.len());
    Ok(assignment)
}

/// Number slotted steps of `groups`, taken in the given order.
pub(crate) fn sequence<'a>(groups: impl Iterator<Item = &'a Group>) -> Result<SlotAssignment> {
    let mut assignment = SlotAssignment::new();
    let mut next_m: u8 = 0;
    let mut next_t: u8 = 0;

    for group in groups {
        for step in &group.steps {
            let Some(kind) = step.slot_kind() else {
                continue;
            };
            let counter = match kind {
                SlotKind::M => &mut next_m,
                SlotKind::T => &mut next_t,
            };
            if *counter >= MAX_SLOT_INDEX {
                return Err(FlowError::SlotLimitExceeded(kind));
            }
            *counter += 1;
            assignment.insert(
                step.id.clone(),
                Slot {
                    kind,
                    index: *counter,
                },
            );
        }
    }

    Ok(assignment)
}

/// Close the gap left by deleting the step that held `removed`.
///
/// Drops the entry for `removed` and moves every same-kind slot above it down by one.
/// On a canonical assignment this equals a full [`normalize`] of the flow without
/// the deleted step.
pub fn compact_after_removal(
    assignment: &mut SlotAssignment,
    removed: Slot,
) {
    assignment.retain(|_, slot| *slot != removed);
    for slot in assignment.values_mut() {
        if slot.kind == removed.kind && slot.index > removed.index {
            slot.index -= 1;
        }
    }
}

/// Check a user-requested slot for `step_id` without changing anything.
pub fn validate_manual_assignment(
    step_id: &str,
    requested: &str,
    flow: &Flow,
) -> Result<Slot> {
    let step = flow.step(step_id).ok_or(FlowError::StepNotFound(step_id.to_string()))?;
    let slot = requested.parse::<Slot>()?;

    match step.slot_kind() {
        Some(kind) if kind == slot.kind => {}
        Some(kind) => {
            return Err(FlowError::InvalidSlotFormat(format!("{} does not fit a {} step", requested, kind.as_ref())));
        }
        None => {
            return Err(FlowError::InvalidSlotFormat(format!("{} steps take no slot", step.kind().as_ref())));
        }
    }

    if let Some(holder) = flow.steps().find(|s| s.id != step_id && s.slot == Some(slot)) {
        return Err(FlowError::DuplicateSlot {
            slot: slot.to_string(),
            holder: holder.id.clone(),
        });
    }

    Ok(slot)
}

/// Lowest unused slot of `kind`, or `SlotLimitExceeded` once 50 steps of that kind exist.
pub fn next_free_slot(
    kind: SlotKind,
    flow: &Flow,
) -> Result<Slot> {
    let holders: Vec<Option<Slot>> = flow.steps().filter(|s| s.slot_kind() == Some(kind)).map(|s| s.slot).collect();
    if holders.len() >= MAX_SLOT_INDEX as usize {
        return Err(FlowError::SlotLimitExceeded(kind));
    }

    (1..=MAX_SLOT_INDEX)
        .map(|index| Slot {
            kind,
            index,
        })
        .find(|slot| !holders.contains(&Some(*slot)))
        .ok_or(FlowError::SlotLimitExceeded(kind))
}
