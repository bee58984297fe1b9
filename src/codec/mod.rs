//! Step payload codec.
//!
//! Every step kind that owns a slot is stored as one string in its slot cell. The
//! string starts with a literal kind prefix followed by a kind-specific body. Some
//! prefixes extend others (`PHOTO CAPTION SCHEDULE ` extends `PHOTO CAPTION `, which
//! extends `PHOTO `), so [`PREFIXES`] is ordered from most to least specific and
//! decoding takes the first match.
//!
//! Decoding never fails: a value with no known prefix, or with a known prefix but a
//! body that does not parse, comes back as a plain text step carrying the raw value.

mod escape;
mod models;
mod rules;

use std::sync::LazyLock;

use regex::Regex;
use tracing::{trace, warn};

pub use models::{Delay, FlowTarget, RuleWarning, StepKind, StepPayload, TimeOfDay, TimeRule};
pub use rules::validate_rules;

/// Wire prefixes, most specific first.
pub const PREFIXES: &[(&str, StepKind)] = &[
    ("PHOTO CAPTION SCHEDULE ", StepKind::PhotoSchedule),
    ("PHOTO CAPTION ", StepKind::PhotoCaption),
    ("PHOTO ", StepKind::Photo),
    ("VIDEO CAPTION SCHEDULE ", StepKind::VideoSchedule),
    ("VIDEO CAPTION ", StepKind::VideoCaption),
    ("VIDEO ", StepKind::Video),
    ("AUDIO ", StepKind::Audio),
    ("TEXT SCHEDULE ", StepKind::TextSchedule),
    ("TEXT LINK ", StepKind::TextLink),
    ("TEXT ", StepKind::Text),
    ("TIMER ", StepKind::Timer),
    ("WAIT REPLY", StepKind::WaitReply),
    ("HOOK ADD ", StepKind::HookAdd),
    ("HOOK REMOVE ", StepKind::HookRemove),
    ("DELIVERABLE ADD ", StepKind::DeliverableAdd),
    ("DELIVERABLE REMOVE ", StepKind::DeliverableRemove),
    ("REMINDER ADD ", StepKind::ReminderAdd),
    ("REMINDER REMOVE ", StepKind::ReminderRemove),
    ("TAG LINK ", StepKind::LinkTag),
    ("TAG PAYMENT ", StepKind::PaymentTag),
];

static TIMER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d+)-(\d+)$").unwrap());
static DELAYED_TARGET_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(.+)-(\d{2}:\d{2})$").unwrap());

fn prefix_of(kind: StepKind) -> Option<&'static str> {
    PREFIXES.iter().find(|(_, k)| *k == kind).map(|(p, _)| *p)
}

/// Encode a payload into its slot cell value.
///
/// Notes have no slot and encode to an empty string; callers never store them.
pub fn encode(payload: &StepPayload) -> String {
    let Some(prefix) = prefix_of(payload.kind()) else {
        return String::new();
    };

    let body = match payload {
        StepPayload::Text { text } => text.clone(),
        StepPayload::TextLink { text, url } => format!("{} {}", text, url),
        StepPayload::TextSchedule { rules } | StepPayload::PhotoSchedule { rules } | StepPayload::VideoSchedule { rules } => rules::encode_rules(rules),
        StepPayload::Photo { url } | StepPayload::Video { url } | StepPayload::Audio { url } => url.clone(),
        StepPayload::PhotoCaption { url, caption } | StepPayload::VideoCaption { url, caption } => format!("{} {}", url, caption),
        StepPayload::Timer { min, max } => format!("{}-{}", min, max),
        StepPayload::WaitReply => String::new(),
        StepPayload::HookAdd(target)
        | StepPayload::HookRemove(target)
        | StepPayload::DeliverableAdd(target)
        | StepPayload::DeliverableRemove(target)
        | StepPayload::ReminderAdd(target)
        | StepPayload::ReminderRemove(target) => encode_target(target),
        StepPayload::LinkTag { name } | StepPayload::PaymentTag { name } => name.clone(),
        StepPayload::Note { .. } => return String::new(),
    };

    format!("{}{}", prefix, body)
}

/// Decode a slot cell value. Unknown or malformed values fall back to plain text.
pub fn decode(value: &str) -> StepPayload {
    let Some((prefix, kind)) = match_prefix(value) else {
        trace!("no payload prefix matched, decoding as text");
        return StepPayload::text(value);
    };

    match decode_body(kind, &value[prefix.len()..]) {
        Some(payload) => payload,
        None => {
            warn!("malformed {} payload, decoding as text: {}", kind.as_ref(), value);
            StepPayload::text(value)
        }
    }
}

/// Whether `payload` reads back as itself from its encoded cell value.
pub(crate) fn is_lossless(payload: &StepPayload) -> bool {
    let value = encode(payload);
    match_prefix(&value).and_then(|(prefix, kind)| decode_body(kind, &value[prefix.len()..])).as_ref() == Some(payload)
}

fn match_prefix(value: &str) -> Option<(&'static str, StepKind)> {
    PREFIXES.iter().find(|(prefix, _)| value.starts_with(prefix)).copied()
}

fn decode_body(
    kind: StepKind,
    body: &str,
) -> Option<StepPayload> {
    let payload = match kind {
        StepKind::Text => StepPayload::text(body),
        StepKind::TextLink => {
            let (text, url) = body.rsplit_once(' ')?;
            if url.is_empty() {
                return None;
            }
            StepPayload::TextLink {
                text: text.to_string(),
                url: url.to_string(),
            }
        }
        StepKind::TextSchedule => StepPayload::TextSchedule {
            rules: rules::decode_rules(body, false)?,
        },
        StepKind::PhotoSchedule => StepPayload::PhotoSchedule {
            rules: rules::decode_rules(body, true)?,
        },
        StepKind::VideoSchedule => StepPayload::VideoSchedule {
            rules: rules::decode_rules(body, true)?,
        },
        StepKind::Photo => StepPayload::Photo {
            url: body.to_string(),
        },
        StepKind::Video => StepPayload::Video {
            url: body.to_string(),
        },
        StepKind::Audio => StepPayload::Audio {
            url: body.to_string(),
        },
        StepKind::PhotoCaption => {
            let (url, caption) = split_caption(body)?;
            StepPayload::PhotoCaption {
                url,
                caption,
            }
        }
        StepKind::VideoCaption => {
            let (url, caption) = split_caption(body)?;
            StepPayload::VideoCaption {
                url,
                caption,
            }
        }
        StepKind::Timer => {
            let caps = TIMER_RE.captures(body)?;
            StepPayload::Timer {
                min: caps[1].parse().ok()?,
                max: caps[2].parse().ok()?,
            }
        }
        StepKind::WaitReply => {
            if !body.is_empty() {
                return None;
            }
            StepPayload::WaitReply
        }
        StepKind::HookAdd => StepPayload::HookAdd(decode_target(body)?),
        StepKind::HookRemove => StepPayload::HookRemove(decode_target(body)?),
        StepKind::DeliverableAdd => StepPayload::DeliverableAdd(decode_target(body)?),
        StepKind::DeliverableRemove => StepPayload::DeliverableRemove(decode_target(body)?),
        StepKind::ReminderAdd => StepPayload::ReminderAdd(decode_target(body)?),
        StepKind::ReminderRemove => StepPayload::ReminderRemove(decode_target(body)?),
        StepKind::LinkTag => StepPayload::LinkTag {
            name: non_empty(body)?,
        },
        StepKind::PaymentTag => StepPayload::PaymentTag {
            name: non_empty(body)?,
        },
        StepKind::Note => return None,
    };

    Some(payload)
}

/// `<url> <caption>`; the url runs up to the first space.
fn split_caption(body: &str) -> Option<(String, String)> {
    let (url, caption) = body.split_once(' ')?;
    if url.is_empty() {
        return None;
    }
    Some((url.to_string(), caption.to_string()))
}

fn encode_target(target: &FlowTarget) -> String {
    match target.delay {
        Some(delay) => format!("{}-{}", target.flow, delay),
        None => target.flow.clone(),
    }
}

/// `<flow>[-HH:MM]`. A suffix that is not a valid delay stays part of the flow name.
fn decode_target(body: &str) -> Option<FlowTarget> {
    if let Some(caps) = DELAYED_TARGET_RE.captures(body) {
        if let Ok(delay) = caps[2].parse::<Delay>() {
            return Some(FlowTarget::new(&caps[1]).with_delay(delay));
        }
    }
    Some(FlowTarget::new(non_empty(body)?))
}

fn non_empty(body: &str) -> Option<String> {
    if body.trim().is_empty() { None } else { Some(body.to_string()) }
}
