//! Schedule rule lists: `start|end|value[|caption]` joined by `;`.
//!
//! Media schedules written before the pipe grammar used `start-end-url[ caption]`.
//! Those still decode, but encoding always produces the pipe form.

use std::sync::LazyLock;

use regex::Regex;

use crate::{
    FlowError, Result,
    codec::{
        escape::{escape, split_unescaped, unescape},
        models::{RuleWarning, TimeRule},
    },
};

const RULE_SEPARATOR: char = ';';
const FIELD_SEPARATOR: char = '|';

static LEGACY_RULE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{2}:\d{2})-(\d{2}:\d{2})-(\S+)(?: (.*))?$").unwrap());

pub fn encode_rules(rules: &[TimeRule]) -> String {
    rules
        .iter()
        .map(|rule| {
            let mut fields = vec![rule.start.to_string(), rule.end.to_string(), escape(&rule.value)];
            if let Some(caption) = &rule.caption {
                fields.push(escape(caption));
            }
            fields.join("|")
        })
        .collect::<Vec<_>>()
        .join(";")
}

/// Parse a rule list. `None` means the body is not a rule list at all.
pub fn decode_rules(
    body: &str,
    accept_legacy: bool,
) -> Option<Vec<TimeRule>> {
    let mut rules = Vec::new();

    for segment in split_unescaped(body, RULE_SEPARATOR) {
        if segment.is_empty() {
            continue;
        }

        let fields = split_unescaped(segment, FIELD_SEPARATOR);
        let rule = match fields.as_slice() {
            [start, end, value] => TimeRule::new(start, end, unescape(value), None).ok()?,
            [start, end, value, caption] => TimeRule::new(start, end, unescape(value), Some(unescape(caption))).ok()?,
            [single] if accept_legacy => decode_legacy_rule(&unescape(single))?,
            _ => return None,
        };
        rules.push(rule);
    }

    Some(rules)
}

fn decode_legacy_rule(rule: &str) -> Option<TimeRule> {
    let caps = LEGACY_RULE_RE.captures(rule)?;
    let caption = caps.get(4).map(|m| m.as_str().to_string());
    TimeRule::new(&caps[1], &caps[2], &caps[3], caption).ok()
}

/// Check every rule window and report overlaps.
///
/// A window must start strictly before it ends. Overlapping windows are allowed
/// and reported as warnings.
pub fn validate_rules(rules: &[TimeRule]) -> Result<Vec<RuleWarning>> {
    for (i, rule) in rules.iter().enumerate() {
        if rule.start >= rule.end {
            return Err(FlowError::InvalidPayload(format!("rule {}: start {} must be before end {}", i, rule.start, rule.end)));
        }
    }

    let mut warnings = Vec::new();
    for (i, a) in rules.iter().enumerate() {
        for (j, b) in rules.iter().enumerate().skip(i + 1) {
            if a.overlaps(b) {
                warnings.push(RuleWarning::Overlap {
                    first: i,
                    second: j,
                });
            }
        }
    }

    Ok(warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(
        start: &str,
        end: &str,
        value: &str,
    ) -> TimeRule {
        TimeRule::new(start, end, value, None).unwrap()
    }

    #[test]
    fn test_encode_pipe_grammar() {
        let rules = vec![
            rule("08:00", "12:00", "good morning"),
            TimeRule::new("12:00", "18:00", "https://cdn/x.jpg", Some("after|noon".to_string())).unwrap(),
        ];
        assert_eq!(encode_rules(&rules), r"08:00|12:00|good morning;12:00|18:00|https://cdn/x.jpg|after\|noon");
        assert_eq!(decode_rules(&encode_rules(&rules), false).unwrap(), rules);
    }

    #[test]
    fn test_decode_legacy_hyphen_rules() {
        let rules = decode_rules("08:00-12:00-https://cdn/a-b.jpg Morning pic;13:00-14:00-https://cdn/c.jpg", true).unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].value, "https://cdn/a-b.jpg");
        assert_eq!(rules[0].caption.as_deref(), Some("Morning pic"));
        assert_eq!(rules[1].caption, None);

        assert!(decode_rules("08:00-12:00-https://cdn/a.jpg", false).is_none());
    }

    #[test]
    fn test_decode_mixed_legacy_and_pipe() {
        let rules = decode_rules("08:00-09:00-u1;10:00|11:00|u2|cap", true).unwrap();
        assert_eq!(rules[0].value, "u1");
        assert_eq!(rules[1].caption.as_deref(), Some("cap"));
    }

    #[test]
    fn test_decode_rejects_bad_rules() {
        assert!(decode_rules("8:00|12:00|x", false).is_none());
        assert!(decode_rules("08:00|12:00", false).is_none());
        assert_eq!(decode_rules("", false).unwrap(), vec![]);
    }

    #[test]
    fn test_validate_rules() {
        let full_day = vec![rule("00:00", "23:59", "x")];
        assert_eq!(validate_rules(&full_day).unwrap(), vec![]);

        let inverted = vec![rule("12:00", "08:00", "x")];
        assert!(validate_rules(&inverted).is_err());

        let empty_window = vec![rule("08:00", "08:00", "x")];
        assert!(validate_rules(&empty_window).is_err());

        let overlapping = vec![rule("08:00", "12:00", "a"), rule("12:00", "13:00", "b"), rule("11:00", "12:30", "c")];
        assert_eq!(
            validate_rules(&overlapping).unwrap(),
            vec![
                RuleWarning::Overlap {
                    first: 0,
                    second: 2
                },
                RuleWarning::Overlap {
                    first: 1,
                    second: 2
                },
            ]
        );
    }
}
