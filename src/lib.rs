//! # Slotflow
//!
//! Slotflow turns a visually edited flow (groups of typed steps joined by edges) into a
//! single flat table row, and back again without loss.
//!
//! ## Core Features
//!
//! - **Slot Allocation**: Every step holds one of 100 named cells, `M1..M50` for content and `T1..T50` for timers, renumbered after each edit
//! - **Deterministic Order**: Groups are ordered breadth-first from the start node, or by canvas position when there are no edges
//! - **Compact Payloads**: Each step's typed content is one prefix-coded string per slot
//! - **Lossless Structure**: Positions, titles, slot lists, edges and the viewport round-trip through one snapshot document
//! - **Annotations**: Free-form canvas notes travel in their own document
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use slotflow::{EngineBuilder, Flow, Position, RowKey, StepPayload, START_NODE_ID};
//!
//! let engine = EngineBuilder::new().build()?;
//!
//! let mut flow = Flow::new();
//! let intro = flow.add_group("Intro", Position::new(0.0, 0.0));
//! flow.add_edge(START_NODE_ID, &intro)?;
//! flow.add_step(&intro, StepPayload::text("hello"))?;
//!
//! let key = RowKey::new("sales", "welcome");
//! engine.publish(&mut flow, &key)?;
//! let loaded = engine.load(&key)?;
//! ```

pub mod annotation;
mod builder;
pub mod codec;
mod common;
mod config;
mod engine;
mod error;
pub mod flow;
pub mod model;
pub mod row;
pub mod snapshot;
pub mod store;
mod utils;

use std::sync::{Arc, RwLock};

pub use annotation::{Annotation, AnnotationStyle, Size};
pub use builder::EngineBuilder;
pub use codec::{Delay, FlowTarget, RuleWarning, StepKind, StepPayload, TimeRule};
pub use config::{Config, TimerPreset};
pub use engine::Engine;
pub use error::FlowError;
pub use flow::{Edge, Flow, Group, GroupId, OrderedGroup, Position, START_NODE_ID, Slot, SlotKind, Step, StepId, Viewport};
pub use model::*;
pub use row::{Column, FlowRow, RowKey};
pub use snapshot::Snapshot;
pub use store::{MemRowStore, RowStore};

/// Result type alias for slotflow operations.
pub type Result<T> = std::result::Result<T, FlowError>;

/// Thread-safe shared lock wrapper using Arc<RwLock<T>>.
pub(crate) type ShareLock<T> = Arc<RwLock<T>>;
