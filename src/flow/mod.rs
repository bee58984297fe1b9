#[allow(clippy::module_inception)]
mod flow;
pub mod order;
pub mod slot;
mod step;

pub use flow::{Edge, Flow, Group, GroupId, Position, START_NODE_ID, Viewport};
pub use order::{OrderedGroup, resolve_order};
pub use slot::{MAX_SLOT_INDEX, Slot, SlotAssignment, SlotKind, compact_after_removal, next_free_slot, normalize, validate_manual_assignment};
pub use step::{Step, StepId};
