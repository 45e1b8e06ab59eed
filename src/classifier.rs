//! Per-line fact extraction
//!
//! Turns one raw log line into the set of observations the aggregator
//! understands: a counted source IP, zero or more authentication outcomes,
//! and an optional PAM lockout. All checks are heuristic substring and
//! regex probes; a line that matches nothing yields an empty event.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::dialect::{Dialect, IPV4_PATTERN};

static APACHE_SOURCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^({IPV4_PATTERN})")).expect("regex"));

static SSH_SOURCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"for.*from ({IPV4_PATTERN})")).expect("regex"));

static FAILED_USER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"for (?:invalid user\s)?(.*?)\sfrom").expect("regex"));

static ACCEPTED_USER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"password for (.*)\sfrom").expect("regex"));

static PAM_LOCKOUT: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"PAM.*rhost=({IPV4_PATTERN})")).expect("regex"));

/// One authentication outcome observed on a line. The username is `None`
/// when the line matched the outcome probe but the username pattern found
/// no match at all; an empty capture is kept as an empty username.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Failed(Option<String>),
    Accepted(Option<String>),
}

/// Everything extracted from a single line. `outcomes` can hold both a
/// failure and a success; the probes are independent of each other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineEvent {
    /// Source IP counted as one occurrence, when the line is relevant.
    pub source_ip: Option<String>,
    /// Outcomes tied to `source_ip`; empty when `source_ip` is `None`.
    pub outcomes: Vec<AuthOutcome>,
    /// rhost address of a PAM failure burst, tracked per line even when
    /// the line carries no counted source IP.
    pub lockout_ip: Option<String>,
}

/// Applies one dialect's extraction rules line by line.
pub struct LineClassifier {
    dialect: Dialect,
}

impl LineClassifier {
    pub fn new(dialect: Dialect) -> Self {
        LineClassifier { dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn classify(&self, line: &str) -> LineEvent {
        match self.dialect {
            Dialect::Apache => self.classify_apache(line),
            Dialect::Ssh => self.classify_ssh(line),
            Dialect::Unknown => LineEvent::default(),
        }
    }

    fn classify_apache(&self, line: &str) -> LineEvent {
        LineEvent {
            source_ip: APACHE_SOURCE.captures(line).map(|caps| caps[1].to_string()),
            ..LineEvent::default()
        }
    }

    fn classify_ssh(&self, line: &str) -> LineEvent {
        let mut event = LineEvent::default();

        if let Some(caps) = SSH_SOURCE.captures(line) {
            let ip = caps[1].to_string();
            if let Some(span) = outcome_span(line, "Failed password", &ip) {
                event
                    .outcomes
                    .push(AuthOutcome::Failed(capture_user(&FAILED_USER, span)));
            }
            if let Some(span) = outcome_span(line, "Accepted", &ip) {
                event
                    .outcomes
                    .push(AuthOutcome::Accepted(capture_user(&ACCEPTED_USER, span)));
            }
            event.source_ip = Some(ip);
        }

        // PAM bursts are tracked for every line, relevant or not.
        event.lockout_ip = PAM_LOCKOUT.captures(line).map(|caps| caps[1].to_string());

        event
    }
}

/// Slice of `line` from the outcome marker to the last occurrence of the
/// already-extracted source IP after it. `None` when the marker is absent
/// or the IP never reappears past it, in which case the outcome does not
/// apply to this line.
fn outcome_span<'a>(line: &'a str, marker: &str, ip: &str) -> Option<&'a str> {
    let start = line.find(marker)?;
    let tail = &line[start..];
    let ip_at = tail.rfind(ip)?;
    Some(&tail[..ip_at + ip.len()])
}

fn capture_user(pattern: &Regex, span: &str) -> Option<String> {
    pattern.captures(span).map(|caps| caps[1].to_string())
}
