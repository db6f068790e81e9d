//! Version grammars, in the order they are tried.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::VersionFields;

/// Prefixes tolerated in front of an exactly matched version.
const EXACT_PREFIX: &str = r"openjdk-?|jdk-?";

const OPT: &str = r"[-a-zA-Z0-9.]+";

const VNUM: &str = r"(?P<major>[0-9]+)(?:\.(?P<minor>[0-9]+)(?:\.(?P<security>[0-9]+)(?:\.(?P<patch>[0-9]+))?)?)?";

/// One way of reading a version string.
pub(super) trait Grammar: Send + Sync {
    /// Try to read `input`, returning the captured fields on a structural match.
    fn attempt(&self, input: &str, exact: bool) -> Option<VersionFields>;
}

/// All grammars, first match wins.
pub(super) static GRAMMARS: LazyLock<Vec<Box<dyn Grammar>>> = LazyLock::new(|| {
    vec![
        // major.minor.security[-pre]+build[.adopt][-opt]
        Box::new(PatternGrammar::new(&format!(
            r"(?P<major>[0-9]+)\.(?P<minor>[0-9]+)\.(?P<security>[0-9]+)(?:-(?P<pre>[a-zA-Z0-9]+))?\+(?P<build>[0-9]+)(?:\.(?P<adopt>[0-9]+))?(?:-(?P<opt>{OPT}))?"
        ))),
        // vnum[-pre]+build.adopt[-opt]
        Box::new(PatternGrammar::new(&format!(
            r"{VNUM}(?:-(?P<pre>[a-zA-Z0-9]+))?\+(?P<build>[0-9]+)\.(?P<adopt>[0-9]+)(?:-(?P<opt>{OPT}))?"
        ))),
        // vnum[-pre]+build[-opt]
        Box::new(PatternGrammar::new(&format!(
            r"{VNUM}(?:-(?P<pre>[a-zA-Z0-9]+))?\+(?P<build>[0-9]+)(?:-(?P<opt>{OPT}))?"
        ))),
        // vnum-pre[-opt]
        Box::new(PatternGrammar::new(&format!(
            r"{VNUM}-(?P<pre>[a-zA-Z0-9]+)(?:-(?P<opt>{OPT}))?"
        ))),
        // vnum[+-opt]
        Box::new(PatternGrammar::new(&format!(r"{VNUM}(?:\+-(?P<opt>{OPT}))?"))),
        // [1.]major u security [-b build][_opt]
        Box::new(PatternGrammar::new(&format!(
            r"(?:1\.)?(?P<major>[0-9]+)u(?P<security>[0-9]+)(?:-b(?P<build>[0-9]+))?(?:_(?P<opt>{OPT}))?"
        ))),
        Box::new(LegacyAlternateGrammar::new()),
        // (jdk|openjdk)major(u-|-|u)opt
        Box::new(PatternGrammar::new(&format!(
            r"(?:openjdk|jdk)(?P<major>[0-9]+)(?:u-|-|u)(?P<opt>{OPT})"
        ))),
    ]
});

/// Anchored and unanchored forms of one pattern.
struct Patterns {
    exact: Regex,
    search: Regex,
}

impl Patterns {
    fn compile(body: &str) -> Self {
        Self {
            exact: Regex::new(&format!("^(?:{EXACT_PREFIX})?(?:{body})$"))
                .expect("valid exact grammar"),
            search: Regex::new(body).expect("valid search grammar"),
        }
    }

    fn captures<'h>(&self, input: &'h str, exact: bool) -> Option<Captures<'h>> {
        if exact {
            self.exact.captures(input)
        } else {
            self.search.captures(input)
        }
    }
}

/// Integer group, 0 when absent. `None` when the digits overflow.
fn int(caps: &Captures<'_>, name: &str) -> Option<u32> {
    match caps.name(name) {
        Some(m) => m.as_str().parse().ok(),
        None => Some(0),
    }
}

/// Integer group that stays `None` when absent.
fn opt_int(caps: &Captures<'_>, name: &str) -> Option<Option<u32>> {
    match caps.name(name) {
        Some(m) => m.as_str().parse().ok().map(Some),
        None => Some(None),
    }
}

/// String group with empty captures normalized to `None`.
fn opt_str(caps: &Captures<'_>, name: &str) -> Option<String> {
    caps.name(name)
        .map(|m| m.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Grammar whose fields come straight from the named groups
/// `major`, `minor`, `security`, `patch`, `pre`, `build`, `adopt` and `opt`.
struct PatternGrammar {
    patterns: Patterns,
}

impl PatternGrammar {
    fn new(body: &str) -> Self {
        Self {
            patterns: Patterns::compile(body),
        }
    }
}

impl Grammar for PatternGrammar {
    fn attempt(&self, input: &str, exact: bool) -> Option<VersionFields> {
        let caps = self.patterns.captures(input, exact)?;
        Some(VersionFields {
            major: int(&caps, "major")?,
            minor: int(&caps, "minor")?,
            security: int(&caps, "security")?,
            patch: opt_int(&caps, "patch")?,
            pre: opt_str(&caps, "pre"),
            build: int(&caps, "build")?,
            adopt_build_number: opt_int(&caps, "adopt")?,
            optional: opt_str(&caps, "opt"),
        })
    }
}

/// Old `8u144-b01-201708021212` style tags.
///
/// Reads `major u security` and scans the dash-delimited suffix for a
/// `bNN` build token and a 12 digit timestamp used as the optional.
struct LegacyAlternateGrammar {
    patterns: Patterns,
}

impl LegacyAlternateGrammar {
    fn new() -> Self {
        Self {
            patterns: Patterns::compile(
                r"(?P<major>[0-9]+)u(?P<security>[0-9]+)(?P<suffix>(?:-[a-zA-Z0-9]+)*)",
            ),
        }
    }
}

impl Grammar for LegacyAlternateGrammar {
    fn attempt(&self, input: &str, exact: bool) -> Option<VersionFields> {
        let caps = self.patterns.captures(input, exact)?;

        let mut build = 0;
        let mut optional = None;
        let suffix = caps.name("suffix").map(|m| m.as_str()).unwrap_or("");
        for token in suffix.split('-').filter(|t| !t.is_empty()) {
            let is_digits = token.bytes().all(|b| b.is_ascii_digit());
            if build == 0 {
                if let Some(n) = token
                    .strip_prefix('b')
                    .filter(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
                    .and_then(|rest| rest.parse().ok())
                {
                    build = n;
                    continue;
                }
            }
            if optional.is_none() && is_digits && token.len() == 12 {
                optional = Some(token.to_string());
            }
        }

        Some(VersionFields {
            major: int(&caps, "major")?,
            security: int(&caps, "security")?,
            build,
            optional,
            ..VersionFields::default()
        })
    }
}
