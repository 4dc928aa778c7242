//! Project version strings such as `2017.05.2-dev.23` and their ordering.

use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

/// Value of a version component that is absent or unparseable.
pub const UNDEFINED: i32 = -1;

static VERSION_PATTERN: OnceLock<Regex> = OnceLock::new();
static SUFFIX_PATTERN: OnceLock<Regex> = OnceLock::new();

fn version_regex() -> &'static Regex {
    VERSION_PATTERN.get_or_init(|| {
        Regex::new(r"^\s*(\d+)(?:\.(\d+))?(?:\.(\d+))?(?:-(\S*))?\s*$").expect("Invalid version regex pattern")
    })
}

fn suffix_regex() -> &'static Regex {
    SUFFIX_PATTERN.get_or_init(|| Regex::new(r"^([A-Za-z]*)\.?(\d+)?").expect("Invalid version suffix regex pattern"))
}

/// A parsed version. Anything after `-` marks a pre-release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectVersion {
    pub major: i32,
    pub minor: i32,
    pub patch: i32,
    /// Number after the pre-release tag, as in `dev.23` or `RC2`.
    pub dev: i32,
    /// Pre-release tag such as `dev` or `RC`; `None` for releases.
    pub pre_release: Option<String>,
}

impl Default for ProjectVersion {
    fn default() -> Self {
        Self { major: UNDEFINED, minor: UNDEFINED, patch: UNDEFINED, dev: UNDEFINED, pre_release: None }
    }
}

impl ProjectVersion {
    /// Parses a version string; unparseable input gives all components
    /// [`UNDEFINED`].
    pub fn parse(text: &str) -> Self {
        let Some(caps) = version_regex().captures(text) else {
            return Self::default();
        };
        let number = |i: usize| caps.get(i).and_then(|m| m.as_str().parse().ok()).unwrap_or(UNDEFINED);
        let mut version = Self { major: number(1), minor: number(2), patch: number(3), ..Self::default() };
        if let Some(suffix) = caps.get(4) {
            let suffix = suffix.as_str();
            match suffix_regex().captures(suffix) {
                Some(parts) => {
                    version.pre_release = Some(parts[1].to_string());
                    version.dev = parts.get(2).and_then(|m| m.as_str().parse().ok()).unwrap_or(UNDEFINED);
                }
                None => version.pre_release = Some(suffix.to_string()),
            }
        }
        version
    }

    pub fn is_defined(&self) -> bool {
        self.major != UNDEFINED
    }

    pub fn is_release(&self) -> bool {
        self.pre_release.is_none()
    }

    pub fn is_newer_than(&self, other: &Self) -> bool {
        self > other
    }
}

impl Ord for ProjectVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.patch.cmp(&other.patch))
            .then(self.is_release().cmp(&other.is_release()))
            .then(self.dev.cmp(&other.dev))
            .then_with(|| self.pre_release.cmp(&other.pre_release))
    }
}

impl PartialOrd for ProjectVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ProjectVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_defined() {
            return write!(f, "undefined");
        }
        write!(f, "{}", self.major)?;
        for part in [self.minor, self.patch] {
            if part == UNDEFINED {
                break;
            }
            write!(f, ".{}", part)?;
        }
        if let Some(tag) = &self.pre_release {
            write!(f, "-{}", tag)?;
            if self.dev != UNDEFINED {
                write!(f, ".{}", self.dev)?;
            }
        }
        Ok(())
    }
}

impl std::str::FromStr for ProjectVersion {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}
