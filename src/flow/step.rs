use serde::{Deserialize, Serialize};

use crate::{
    codec::{StepKind, StepPayload},
    flow::{Slot, SlotKind},
    utils,
};

/// step id, session-local
pub type StepId = String;

/// A single typed unit of flow content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// minted per session, never used as a persistence key
    pub id: StepId,
    /// typed content
    pub payload: StepPayload,
    /// advisory slot; the canonical one comes from normalization
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<Slot>,
}

impl Step {
    pub fn new(payload: StepPayload) -> Self {
        Self {
            id: utils::shortid(),
            payload,
            slot: None,
        }
    }

    pub fn with_slot(
        mut self,
        slot: Slot,
    ) -> Self {
        self.slot = Some(slot);
        self
    }

    pub fn kind(&self) -> StepKind {
        self.payload.kind()
    }

    pub fn slot_kind(&self) -> Option<SlotKind> {
        self.payload.slot_kind()
    }
}
