//! Flat-row publishing contract.
//!
//! A published flow is one row keyed by `(GROUP, FLOW)`. Step payloads live in the
//! slot columns `M1..M50` and `T1..T50`, the structure in `POSICAO` and the canvas
//! notes in `BLK`. Publishing always recomputes the whole row.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    FlowError, Result, annotation, codec,
    flow::{Flow, Slot},
    snapshot::{self, Snapshot},
};

/// Natural key of a published flow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowKey {
    pub group: String,
    pub flow: String,
}

impl RowKey {
    pub fn new(
        group: impl Into<String>,
        flow: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            flow: flow.into(),
        }
    }
}

impl fmt::Display for RowKey {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}/{}", self.group, self.flow)
    }
}

/// A content column of the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Posicao,
    Blk,
    Slot(Slot),
}

impl Column {
    /// All content columns in storage order: `POSICAO`, `BLK`, `M1..M50`, `T1..T50`.
    pub fn all() -> impl Iterator<Item = Column> {
        [Column::Posicao, Column::Blk].into_iter().chain(Slot::all().map(Column::Slot))
    }
}

impl fmt::Display for Column {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Column::Posicao => write!(f, "POSICAO"),
            Column::Blk => write!(f, "BLK"),
            Column::Slot(slot) => write!(f, "{}", slot),
        }
    }
}

impl FromStr for Column {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "POSICAO" => Ok(Column::Posicao),
            "BLK" => Ok(Column::Blk),
            _ => s.parse::<Slot>().map(Column::Slot).map_err(|_| FlowError::Convert(format!("unknown column {}", s))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowRow {
    pub group: String,
    pub flow: String,
    /// encoded payload per occupied slot
    pub slots: BTreeMap<Slot, String>,
    /// structure snapshot
    pub posicao: Option<String>,
    /// annotation document
    pub blk: Option<String>,
    /// millis since epoch, stamped by whoever persists the row
    pub updated_at: Option<i64>,
}

impl FlowRow {
    pub fn key(&self) -> RowKey {
        RowKey::new(self.group.clone(), self.flow.clone())
    }

    /// Every content column with its value. Unoccupied slots are `None` so a writer
    /// can overwrite the full row.
    pub fn columns(&self) -> Vec<(Column, Option<&str>)> {
        Column::all()
            .map(|column| {
                let value = match column {
                    Column::Posicao => self.posicao.as_deref(),
                    Column::Blk => self.blk.as_deref(),
                    Column::Slot(slot) => self.slots.get(&slot).map(String::as_str),
                };
                (column, value)
            })
            .collect()
    }

    /// Rebuild a row from named column values as read from the table.
    ///
    /// Empty cells count as absent. Unknown column names are skipped.
    pub fn from_columns<I, N>(
        key: &RowKey,
        columns: I,
    ) -> Self
    where
        I: IntoIterator<Item = (N, Option<String>)>,
        N: AsRef<str>,
    {
        let mut row = FlowRow {
            group: key.group.clone(),
            flow: key.flow.clone(),
            ..Default::default()
        };

        for (name, value) in columns {
            let Some(value) = value.filter(|v| !v.trim().is_empty()) else {
                continue;
            };
            match name.as_ref().parse::<Column>() {
                Ok(Column::Posicao) => row.posicao = Some(value),
                Ok(Column::Blk) => row.blk = Some(value),
                Ok(Column::Slot(slot)) => {
                    row.slots.insert(slot, value);
                }
                Err(e) => warn!("{}: {}", key, e),
            }
        }
        row
    }
}

/// Build the row for `flow`.
///
/// A flow whose slots are inconsistent is published from a normalized copy.
pub fn publish(
    flow: &Flow,
    key: &RowKey,
) -> Result<FlowRow> {
    let normalized;
    let flow = if flow.is_consistent() {
        flow
    } else {
        debug!("{}: slots inconsistent, publishing a normalized copy", key);
        let mut copy = flow.clone();
        copy.renormalize()?;
        normalized = copy;
        &normalized
    };

    let slots = flow.slots().into_iter().map(|(slot, step)| (slot, codec::encode(&step.payload))).collect();
    let blk = if flow.annotations().is_empty() {
        None
    } else {
        Some(annotation::encode(flow.annotations())?)
    };

    Ok(FlowRow {
        group: key.group.clone(),
        flow: key.flow.clone(),
        slots,
        posicao: Some(snapshot::encode(flow)?),
        blk,
        updated_at: None,
    })
}

/// Rebuild a flow from its row. Never fails: unreadable parts degrade to empty.
pub fn import(row: &FlowRow) -> Flow {
    let fetched = row.slots.iter().filter(|(_, value)| !value.trim().is_empty()).map(|(slot, value)| (*slot, codec::decode(value))).collect();

    let snapshot = Snapshot::decode(row.posicao.as_deref().unwrap_or_default());
    let mut flow = snapshot.restore(fetched);
    flow.set_annotations(annotation::decode(row.blk.as_deref().unwrap_or_default()));
    flow
}
