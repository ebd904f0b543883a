// ── Port name matching ──
//
// Reconciles an operator-declared port label ("3", "Gi1/0/3", "swp3") with
// the interface name a switch reports. Vendor quirks live in an ordered
// rule table rather than in the matching logic:
//
// - `PortNumber` rules recognise vendor naming schemes that embed the port
//   number (capture group 1) and match when it equals a numeric label.
// - `Exclude` rules name aggregate, virtual, management, and console
//   interfaces that must never satisfy a bare suffix match.

use std::sync::LazyLock;

use regex::Regex;
use strum::Display;

use crate::error::CoreError;

/// What a [`NameRule`] does when its pattern matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum RuleKind {
    /// Capture group 1 is a port number to compare against a numeric label.
    PortNumber,
    /// The interface is never a suffix match.
    Exclude,
}

/// One entry of the matcher's rule table.
#[derive(Debug, Clone)]
pub struct NameRule {
    kind: RuleKind,
    label: String,
    pattern: Regex,
}

impl NameRule {
    /// A vendor naming scheme whose first capture group is the port number.
    pub fn port_number(label: impl Into<String>, pattern: &str) -> Result<Self, CoreError> {
        let label = label.into();
        let regex = compile(&label, pattern)?;
        if regex.captures_len() < 2 {
            return Err(CoreError::Config {
                message: format!(
                    "port-number rule '{label}' needs a capture group for the port: {pattern}"
                ),
            });
        }
        Ok(Self {
            kind: RuleKind::PortNumber,
            label,
            pattern: regex,
        })
    }

    /// Interface names that must never satisfy a suffix match.
    pub fn exclude(label: impl Into<String>, pattern: &str) -> Result<Self, CoreError> {
        let label = label.into();
        let regex = compile(&label, pattern)?;
        Ok(Self {
            kind: RuleKind::Exclude,
            label,
            pattern: regex,
        })
    }

    fn builtin(kind: RuleKind, label: &str, pattern: &str) -> Self {
        Self {
            kind,
            label: label.to_owned(),
            pattern: Regex::new(pattern).expect("built-in name rule pattern is valid"),
        }
    }

    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    fn captured_port(&self, switch_name: &str) -> Option<u64> {
        self.pattern
            .captures(switch_name)?
            .get(1)?
            .as_str()
            .parse()
            .ok()
    }
}

fn compile(label: &str, pattern: &str) -> Result<Regex, CoreError> {
    Regex::new(pattern).map_err(|e| CoreError::Config {
        message: format!("invalid name rule '{label}': {e}"),
    })
}

// Only `vl`, `Nu` and `po\d` are anchored. The other exclusions match
// anywhere in the name, so e.g. `Stack-uplink 1/0/1` never binds.
static BUILTIN: LazyLock<PortNameMatcher> = LazyLock::new(|| {
    use RuleKind::{Exclude, PortNumber};

    PortNameMatcher::new(vec![
        NameRule::builtin(PortNumber, "3com", r"^RMON Port (\d+) on unit \d+"),
        NameRule::builtin(PortNumber, "dell", r"^Unit \d+ Port (\d+)\z"),
        NameRule::builtin(Exclude, "vlan", r"(?i)^vl"),
        NameRule::builtin(Exclude, "null", r"^Nu"),
        NameRule::builtin(Exclude, "rmon", r"RMON"),
        NameRule::builtin(Exclude, "console", r"(?i)console"),
        NameRule::builtin(Exclude, "stack", r"Stack"),
        NameRule::builtin(Exclude, "trunk", r"Trunk"),
        NameRule::builtin(Exclude, "port-channel", r"(?i)^po\d|port-channel"),
        NameRule::builtin(Exclude, "xge", r"XGE"),
        NameRule::builtin(Exclude, "lag", r"LAG"),
        NameRule::builtin(Exclude, "cpu", r"CPU"),
        NameRule::builtin(Exclude, "management", r"Management"),
    ])
});

/// Ordered rule table plus the matching algorithm.
#[derive(Debug, Clone)]
pub struct PortNameMatcher {
    rules: Vec<NameRule>,
}

impl PortNameMatcher {
    pub fn new(rules: Vec<NameRule>) -> Self {
        Self { rules }
    }

    /// Append a rule after the existing ones.
    pub fn with_rule(mut self, rule: NameRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[NameRule] {
        &self.rules
    }

    /// Does the switch-reported `switch_name` denote the declared port `label`?
    ///
    /// 1. Exact equality.
    /// 2. A numeric label equal to the port captured by any `PortNumber` rule.
    /// 3. `switch_name` ends with a non-digit, then `label`, then an optional
    ///    `.0`, and no `Exclude` rule matches it.
    pub fn matches(&self, switch_name: &str, label: &str) -> bool {
        if switch_name == label {
            return true;
        }

        if let Ok(port) = label.trim().parse::<u64>() {
            let vendor_hit = self
                .rules
                .iter()
                .filter(|r| r.kind == RuleKind::PortNumber)
                .any(|r| r.captured_port(switch_name) == Some(port));
            if vendor_hit {
                return true;
            }
        }

        if !ends_with_label(switch_name, label) {
            return false;
        }
        !self
            .rules
            .iter()
            .filter(|r| r.kind == RuleKind::Exclude)
            .any(|r| r.pattern.is_match(switch_name))
    }
}

impl Default for PortNameMatcher {
    fn default() -> Self {
        BUILTIN.clone()
    }
}

/// Match `switch_name` against `label` with the built-in rule table.
pub fn names_match(switch_name: &str, label: &str) -> bool {
    BUILTIN.matches(switch_name, label)
}

fn ends_with_label(switch_name: &str, label: &str) -> bool {
    if label.is_empty() {
        return false;
    }
    let preceded_by_non_digit = |name: &str| {
        name.strip_suffix(label)
            .and_then(|head| head.chars().last())
            .is_some_and(|c| !c.is_ascii_digit())
    };
    preceded_by_non_digit(switch_name)
        || switch_name
            .strip_suffix(".0")
            .is_some_and(preceded_by_non_digit)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn literal_name_table() {
        let cases = [
            ("GigabitEthernet0/1", "1", true),
            ("RMON Port 4 on unit 2", "4", true),
            ("Vlan100", "100", false),
            ("Te1/0/5", "5", true),
            ("Unit 1 Port 3", "3", true),
            ("Unit 1 Port 13", "3", false),
            ("Gi1/0/11", "1", false),
            ("Gi1/0/1.0", "1", true),
            ("Gi1/0/3", "Gi1/0/3", true),
            ("Vlan100", "Vlan100", true),
            ("Port-channel1", "1", false),
            ("po2", "2", false),
            ("RMON Port 4 on unit 2", "2", false),
            ("Null0", "0", false),
            ("CPU port 1", "1", false),
            ("Management1", "1", false),
            ("console 1", "1", false),
            ("swp3", "3", true),
            ("Gi1/0/1", "", false),
            ("Ethernet7", "Ethernet8", false),
        ];

        for (switch_name, label, want) in cases {
            assert_eq!(
                names_match(switch_name, label),
                want,
                "names_match({switch_name:?}, {label:?})"
            );
        }
    }

    #[test]
    fn unanchored_exclusions_match_mid_name() {
        assert!(names_match("Gi1/0/1", "1"));
        assert!(!names_match("Stack-uplink 1/0/1", "1"));
        assert!(!names_match("Uplink Trunk 0/1", "1"));
        assert!(!names_match("OOB Management 4", "4"));
        // Anchored rules only look at the start.
        assert!(names_match("eth-vlan 7", "7"));
        assert!(names_match("Gi1/0/Null 2", "2"));
    }

    #[test]
    fn vendor_rule_wins_over_exclusions() {
        // "RMON" is excluded for suffix matches, but the 3com scheme is
        // recognised first.
        assert!(names_match("RMON Port 12 on unit 1", "12"));
        assert!(names_match("RMON Port 12 on unit 1", "012"));
    }

    #[test]
    fn extra_vendor_rules_extend_matching() {
        let base = PortNameMatcher::default();
        assert!(!base.matches("Slot: 0 Port: 7 Gigabit - Level", "7"));

        let extended = base.with_rule(
            NameRule::port_number("netgear", r"^Slot: \d+ Port: (\d+) ").unwrap(),
        );
        assert!(extended.matches("Slot: 0 Port: 7 Gigabit - Level", "7"));
        assert!(!extended.matches("Slot: 0 Port: 7 Gigabit - Level", "8"));
    }

    #[test]
    fn extra_exclusions_block_suffix_matches() {
        let matcher = PortNameMatcher::default()
            .with_rule(NameRule::exclude("loopback", r"(?i)^loopback").unwrap());
        assert!(names_match("Loopback1", "1"));
        assert!(!matcher.matches("Loopback1", "1"));
    }

    #[test]
    fn port_rules_require_a_capture_group() {
        let err = NameRule::port_number("broken", r"^Port \d+$").unwrap_err();
        assert!(matches!(err, CoreError::Config { .. }));
        assert!(NameRule::exclude("bad", r"(").is_err());
    }

    #[test]
    fn builtin_table_is_ordered_and_labelled() {
        let matcher = PortNameMatcher::default();
        let first = &matcher.rules()[0];
        assert_eq!(first.kind(), RuleKind::PortNumber);
        assert_eq!(first.label(), "3com");
        assert_eq!(RuleKind::Exclude.to_string(), "exclude");
        insta::assert_snapshot!(matcher.rules()[1].pattern(), @r"^Unit \d+ Port (\d+)\z");
    }
}
