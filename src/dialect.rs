//! Log dialect detection
//!
//! Inspects the first line of a filtered log and decides which family of
//! extraction rules applies to the rest of the file.

use once_cell::sync::Lazy;
use regex::Regex;

/// Dotted-quad sub-pattern shared by the detection and extraction rules.
pub(crate) const IPV4_PATTERN: &str = r"\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}";

static APACHE_SIGNATURE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"{IPV4_PATTERN} - - ")).expect("regex")
});

static SSH_SIGNATURE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec) \d{2} \d{2}:\d{2}:\d{2}")
        .expect("regex")
});

/// The log families the analyzer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Apache combined access log (`1.2.3.4 - - [...] "GET ..."`).
    Apache,
    /// Syslog-style sshd authentication log (`Jan 02 03:04:05 host sshd[...]`).
    Ssh,
    /// Neither signature matched; lines are read but nothing is counted.
    Unknown,
}

impl Dialect {
    /// Classifies a whole log file from its first line. Checks are tried in
    /// a fixed order and the first signature that matches wins.
    pub fn detect(first_line: &str) -> Dialect {
        if APACHE_SIGNATURE.is_match(first_line) {
            Dialect::Apache
        } else if SSH_SIGNATURE.is_match(first_line) {
            Dialect::Ssh
        } else {
            Dialect::Unknown
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Dialect::Apache => "apache",
            Dialect::Ssh => "ssh",
            Dialect::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
