use std::{fmt, str::FromStr, sync::LazyLock};

use chrono::NaiveTime;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{FlowError, Result, TimerPreset, flow::SlotKind, utils};

/// `HH:MM` offset used by delayed tag actions; hours may exceed a day.
static DELAY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{2}):(\d{2})$").unwrap());

/// Closed set of step kinds.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, strum::AsRefStr, strum::EnumString, strum::EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StepKind {
    Text,
    TextLink,
    TextSchedule,
    Photo,
    PhotoCaption,
    PhotoSchedule,
    Video,
    VideoCaption,
    VideoSchedule,
    Audio,
    Timer,
    WaitReply,
    HookAdd,
    HookRemove,
    LinkTag,
    PaymentTag,
    DeliverableAdd,
    DeliverableRemove,
    ReminderAdd,
    ReminderRemove,
    Note,
}

impl StepKind {
    /// Slot kind a step of this kind occupies. Notes live outside the slot model.
    pub fn slot_kind(self) -> Option<SlotKind> {
        match self {
            StepKind::Timer => Some(SlotKind::T),
            StepKind::Note => None,
            _ => Some(SlotKind::M),
        }
    }

    /// Kinds whose default content is incomplete: a url, target flow or tag name
    /// must be filled in before the step validates.
    pub fn needs_content(self) -> bool {
        matches!(
            self,
            StepKind::TextLink
                | StepKind::Photo
                | StepKind::PhotoCaption
                | StepKind::Video
                | StepKind::VideoCaption
                | StepKind::Audio
                | StepKind::HookAdd
                | StepKind::HookRemove
                | StepKind::LinkTag
                | StepKind::PaymentTag
                | StepKind::DeliverableAdd
                | StepKind::DeliverableRemove
                | StepKind::ReminderAdd
                | StepKind::ReminderRemove
        )
    }
}

/// A validated 24-hour time of day, written as `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay(NaiveTime);

impl TimeOfDay {
    pub fn time(&self) -> NaiveTime {
        self.0
    }
}

impl FromStr for TimeOfDay {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self> {
        utils::parse_hhmm(s).map(TimeOfDay).ok_or(FlowError::InvalidPayload(format!("invalid time '{}', expected HH:MM", s)))
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = FlowError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

/// One time-windowed entry of a schedule step.
///
/// `value` is the message text for text schedules and the media url for media schedules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRule {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

impl TimeRule {
    pub fn new(
        start: &str,
        end: &str,
        value: impl Into<String>,
        caption: Option<String>,
    ) -> Result<Self> {
        Ok(Self {
            start: start.parse()?,
            end: end.parse()?,
            value: value.into(),
            caption,
        })
    }

    pub fn overlaps(
        &self,
        other: &TimeRule,
    ) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Non-blocking findings from schedule validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleWarning {
    /// Rules at these indexes have intersecting windows.
    Overlap {
        first: usize,
        second: usize,
    },
}

impl fmt::Display for RuleWarning {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            RuleWarning::Overlap { first, second } => write!(f, "rules {} and {} have overlapping windows", first, second),
        }
    }
}

/// Hour/minute offset for delayed tag actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Delay {
    pub hours: u8,
    pub minutes: u8,
}

impl Delay {
    pub fn new(
        hours: u8,
        minutes: u8,
    ) -> Result<Self> {
        if hours > 99 || minutes > 59 {
            return Err(FlowError::InvalidPayload(format!("invalid delay {}:{}", hours, minutes)));
        }
        Ok(Self {
            hours,
            minutes,
        })
    }
}

impl FromStr for Delay {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self> {
        let caps = DELAY_RE.captures(s).ok_or(FlowError::InvalidPayload(format!("invalid delay '{}', expected HH:MM", s)))?;
        let hours = caps[1].parse::<u8>().map_err(|e| FlowError::InvalidPayload(e.to_string()))?;
        let minutes = caps[2].parse::<u8>().map_err(|e| FlowError::InvalidPayload(e.to_string()))?;
        Delay::new(hours, minutes)
    }
}

impl TryFrom<String> for Delay {
    type Error = FlowError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Delay> for String {
    fn from(value: Delay) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Delay {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hours, self.minutes)
    }
}

/// Target of an add/remove tag action: another flow, optionally delayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowTarget {
    pub flow: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<Delay>,
}

impl FlowTarget {
    pub fn new(flow: impl Into<String>) -> Self {
        Self {
            flow: flow.into(),
            delay: None,
        }
    }

    pub fn with_delay(
        mut self,
        delay: Delay,
    ) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// Typed content of a step. The variant decides the step kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepPayload {
    Text {
        text: String,
    },
    TextLink {
        text: String,
        url: String,
    },
    TextSchedule {
        rules: Vec<TimeRule>,
    },
    Photo {
        url: String,
    },
    PhotoCaption {
        url: String,
        caption: String,
    },
    PhotoSchedule {
        rules: Vec<TimeRule>,
    },
    Video {
        url: String,
    },
    VideoCaption {
        url: String,
        caption: String,
    },
    VideoSchedule {
        rules: Vec<TimeRule>,
    },
    Audio {
        url: String,
    },
    /// Random pause between `min` and `max` seconds.
    Timer {
        min: u32,
        max: u32,
    },
    WaitReply,
    HookAdd(FlowTarget),
    HookRemove(FlowTarget),
    LinkTag {
        name: String,
    },
    PaymentTag {
        name: String,
    },
    DeliverableAdd(FlowTarget),
    DeliverableRemove(FlowTarget),
    ReminderAdd(FlowTarget),
    ReminderRemove(FlowTarget),
    Note {
        text: String,
    },
}

impl StepPayload {
    pub fn text(text: impl Into<String>) -> Self {
        StepPayload::Text {
            text: text.into(),
        }
    }

    pub fn kind(&self) -> StepKind {
        match self {
            StepPayload::Text { .. } => StepKind::Text,
            StepPayload::TextLink { .. } => StepKind::TextLink,
            StepPayload::TextSchedule { .. } => StepKind::TextSchedule,
            StepPayload::Photo { .. } => StepKind::Photo,
            StepPayload::PhotoCaption { .. } => StepKind::PhotoCaption,
            StepPayload::PhotoSchedule { .. } => StepKind::PhotoSchedule,
            StepPayload::Video { .. } => StepKind::Video,
            StepPayload::VideoCaption { .. } => StepKind::VideoCaption,
            StepPayload::VideoSchedule { .. } => StepKind::VideoSchedule,
            StepPayload::Audio { .. } => StepKind::Audio,
            StepPayload::Timer { .. } => StepKind::Timer,
            StepPayload::WaitReply => StepKind::WaitReply,
            StepPayload::HookAdd(_) => StepKind::HookAdd,
            StepPayload::HookRemove(_) => StepKind::HookRemove,
            StepPayload::LinkTag { .. } => StepKind::LinkTag,
            StepPayload::PaymentTag { .. } => StepKind::PaymentTag,
            StepPayload::DeliverableAdd(_) => StepKind::DeliverableAdd,
            StepPayload::DeliverableRemove(_) => StepKind::DeliverableRemove,
            StepPayload::ReminderAdd(_) => StepKind::ReminderAdd,
            StepPayload::ReminderRemove(_) => StepKind::ReminderRemove,
            StepPayload::Note { .. } => StepKind::Note,
        }
    }

    pub fn slot_kind(&self) -> Option<SlotKind> {
        self.kind().slot_kind()
    }

    /// Empty payload for a freshly created step of `kind`.
    ///
    /// Timers take their bounds from `timer`, which callers resolve from configuration.
    /// Kinds that [`StepKind::needs_content`] fail validation until filled in.
    pub fn default_for(
        kind: StepKind,
        timer: TimerPreset,
    ) -> Self {
        match kind {
            StepKind::Text => StepPayload::text(""),
            StepKind::TextLink => StepPayload::TextLink {
                text: String::new(),
                url: String::new(),
            },
            StepKind::TextSchedule => StepPayload::TextSchedule {
                rules: Vec::new(),
            },
            StepKind::Photo => StepPayload::Photo {
                url: String::new(),
            },
            StepKind::PhotoCaption => StepPayload::PhotoCaption {
                url: String::new(),
                caption: String::new(),
            },
            StepKind::PhotoSchedule => StepPayload::PhotoSchedule {
                rules: Vec::new(),
            },
            StepKind::Video => StepPayload::Video {
                url: String::new(),
            },
            StepKind::VideoCaption => StepPayload::VideoCaption {
                url: String::new(),
                caption: String::new(),
            },
            StepKind::VideoSchedule => StepPayload::VideoSchedule {
                rules: Vec::new(),
            },
            StepKind::Audio => StepPayload::Audio {
                url: String::new(),
            },
            StepKind::Timer => StepPayload::Timer {
                min: timer.min,
                max: timer.max,
            },
            StepKind::WaitReply => StepPayload::WaitReply,
            StepKind::HookAdd => StepPayload::HookAdd(FlowTarget::new("")),
            StepKind::HookRemove => StepPayload::HookRemove(FlowTarget::new("")),
            StepKind::LinkTag => StepPayload::LinkTag {
                name: String::new(),
            },
            StepKind::PaymentTag => StepPayload::PaymentTag {
                name: String::new(),
            },
            StepKind::DeliverableAdd => StepPayload::DeliverableAdd(FlowTarget::new("")),
            StepKind::DeliverableRemove => StepPayload::DeliverableRemove(FlowTarget::new("")),
            StepKind::ReminderAdd => StepPayload::ReminderAdd(FlowTarget::new("")),
            StepKind::ReminderRemove => StepPayload::ReminderRemove(FlowTarget::new("")),
            StepKind::Note => StepPayload::Note {
                text: String::new(),
            },
        }
    }

    pub fn rules(&self) -> Option<&[TimeRule]> {
        match self {
            StepPayload::TextSchedule { rules } | StepPayload::PhotoSchedule { rules } | StepPayload::VideoSchedule { rules } => Some(rules),
            _ => None,
        }
    }

    /// Semantic checks beyond what the types already enforce.
    ///
    /// Hard violations are errors, including content whose slot encoding would read
    /// back as something else. Overlapping schedule windows come back as warnings.
    pub fn validate(&self) -> Result<Vec<RuleWarning>> {
        match self {
            StepPayload::TextLink { url, .. }
            | StepPayload::Photo { url }
            | StepPayload::PhotoCaption { url, .. }
            | StepPayload::Video { url }
            | StepPayload::VideoCaption { url, .. }
            | StepPayload::Audio { url } => {
                if url.is_empty() || url.contains(char::is_whitespace) {
                    return Err(FlowError::InvalidPayload(format!("invalid {} url '{}'", self.kind().as_ref(), url)));
                }
            }
            StepPayload::Timer { min, max } if min > max => {
                return Err(FlowError::InvalidPayload(format!("timer min {} is above max {}", min, max)));
            }
            StepPayload::HookAdd(target)
            | StepPayload::HookRemove(target)
            | StepPayload::DeliverableAdd(target)
            | StepPayload::DeliverableRemove(target)
            | StepPayload::ReminderAdd(target)
            | StepPayload::ReminderRemove(target) => {
                if target.flow.trim().is_empty() {
                    return Err(FlowError::InvalidPayload("tag action needs a target flow".to_string()));
                }
            }
            StepPayload::LinkTag { name } | StepPayload::PaymentTag { name } => {
                if name.trim().is_empty() {
                    return Err(FlowError::InvalidPayload(format!("{} needs a name", self.kind().as_ref())));
                }
            }
            _ => {}
        }

        let warnings = match self.rules() {
            Some(rules) => super::rules::validate_rules(rules)?,
            None => Vec::new(),
        };

        if self.slot_kind().is_some() && !super::is_lossless(self) {
            return Err(FlowError::InvalidPayload(format!("{} content does not read back unchanged from '{}'", self.kind().as_ref(), super::encode(self))));
        }
        Ok(warnings)
    }
}
