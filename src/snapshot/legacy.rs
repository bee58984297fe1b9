//! Legacy plain-text snapshots.
//!
//! ```text
//! v1|g:Intro@10,20{M1,M2}|g:Offer{M3,T1}
//! ```
//!
//! Groups carry no ids and there are no edges; coordinates are optional. These
//! documents are read for backward compatibility and never written.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::{
    FlowError, Result,
    flow::{Position, Slot},
    snapshot::{GroupLayout, Snapshot},
    utils,
};

pub const LEGACY_HEADER: &str = "v1";

/// Horizontal spacing for legacy groups stored without coordinates.
pub const LEGACY_GROUP_SPACING: f64 = 320.0;

static GROUP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^g:([^@{}]*)(?:@(-?\d+(?:\.\d+)?),(-?\d+(?:\.\d+)?))?\{([^{}]*)\}$").unwrap());

pub fn is_legacy(doc: &str) -> bool {
    doc == LEGACY_HEADER || doc.starts_with("v1|")
}

pub fn parse(doc: &str) -> Result<Snapshot> {
    let mut parts = doc.split('|');
    if parts.next() != Some(LEGACY_HEADER) {
        return Err(FlowError::MalformedSnapshot("missing legacy header".to_string()));
    }

    let mut groups = Vec::new();
    for part in parts.map(str::trim).filter(|p| !p.is_empty()) {
        let Some(caps) = GROUP_RE.captures(part) else {
            warn!("skipping unreadable legacy group '{}'", part);
            continue;
        };

        let position = match (caps.get(2), caps.get(3)) {
            (Some(x), Some(y)) => Position::new(x.as_str().parse().unwrap_or_default(), y.as_str().parse().unwrap_or_default()),
            _ => Position::new(groups.len() as f64 * LEGACY_GROUP_SPACING, 0.0),
        };

        let slots = caps[4]
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter_map(|s| match s.parse::<Slot>() {
                Ok(slot) => Some(slot),
                Err(e) => {
                    warn!("skipping legacy slot reference: {}", e);
                    None
                }
            })
            .collect();

        groups.push(GroupLayout {
            id: utils::shortid(),
            position,
            title: caps[1].trim().to_string(),
            slots,
        });
    }

    Ok(Snapshot {
        viewport: None,
        start: None,
        groups,
        edges: Vec::new(),
    })
}
