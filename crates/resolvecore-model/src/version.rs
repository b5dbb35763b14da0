//! Maven version parsing, comparison, range matching, and version
//! constraints.
//!
//! Maven versions use a custom ordering that differs from semver:
//! - Segments are split on `.` and `-`.
//! - Numeric segments compare as numbers.
//! - String qualifiers have a special ordering:
//!   `alpha` < `beta` < `milestone` < `rc` < `snapshot` < `""` (release) < `sp`.
//! - SNAPSHOT versions sort before their release equivalent.
//!
//! A [`VersionConstraint`] is either a single recommended version or a union
//! of [`VersionRange`]s; `intersect` narrows two constraints down to what
//! both require, returning an empty constraint when they conflict.

use std::cmp::Ordering;
use std::fmt;

/// A parsed Maven version with comparable segments.
#[derive(Debug, Clone)]
pub struct MavenVersion {
    pub original: String,
    segments: Vec<Segment>,
}

impl PartialEq for MavenVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MavenVersion {}

#[derive(Debug, Clone, Eq, PartialEq)]
enum Segment {
    Numeric(u64),
    Qualifier(QualifierKind),
    Text(String),
}

/// Well-known Maven qualifiers with defined ordering.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd)]
enum QualifierKind {
    Alpha,
    Beta,
    Milestone,
    Rc,
    Snapshot,
    Release,
    Sp,
}

impl MavenVersion {
    pub fn parse(version: &str) -> Self {
        Self {
            original: version.to_string(),
            segments: parse_segments(version),
        }
    }

    pub fn is_snapshot(&self) -> bool {
        crate::artifact::is_snapshot(&self.original)
    }

    /// The base version without the `-SNAPSHOT` suffix (or timestamp form).
    pub fn base_version(&self) -> String {
        let base = crate::artifact::base_version(&self.original);
        base.strip_suffix("-SNAPSHOT").unwrap_or(&base).to_string()
    }
}

impl fmt::Display for MavenVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl Ord for MavenVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let max_len = self.segments.len().max(other.segments.len());
        for i in 0..max_len {
            let ord = compare_segments(self.segments.get(i), other.segments.get(i));
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for MavenVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn compare_segments(a: Option<&Segment>, b: Option<&Segment>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (Some(s), None) => compare_segment_to_empty(s),
        (None, Some(s)) => compare_segment_to_empty(s).reverse(),
        (Some(a), Some(b)) => compare_two_segments(a, b),
    }
}

fn compare_segment_to_empty(seg: &Segment) -> Ordering {
    match seg {
        Segment::Numeric(0) => Ordering::Equal,
        Segment::Numeric(n) if *n > 0 => Ordering::Greater,
        Segment::Numeric(_) => Ordering::Less,
        Segment::Qualifier(q) => q.cmp(&QualifierKind::Release),
        Segment::Text(s) if s.is_empty() => Ordering::Equal,
        Segment::Text(_) => Ordering::Less,
    }
}

fn compare_two_segments(a: &Segment, b: &Segment) -> Ordering {
    match (a, b) {
        (Segment::Numeric(a), Segment::Numeric(b)) => a.cmp(b),
        (Segment::Qualifier(a), Segment::Qualifier(b)) => a.cmp(b),
        (Segment::Numeric(_), Segment::Qualifier(_)) => Ordering::Greater,
        (Segment::Qualifier(_), Segment::Numeric(_)) => Ordering::Less,
        (Segment::Numeric(_), Segment::Text(_)) => Ordering::Greater,
        (Segment::Text(_), Segment::Numeric(_)) => Ordering::Less,
        (Segment::Text(a), Segment::Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
        (Segment::Qualifier(q), Segment::Text(_)) => {
            if *q >= QualifierKind::Release { Ordering::Greater } else { Ordering::Less }
        }
        (Segment::Text(_), Segment::Qualifier(q)) => {
            if *q >= QualifierKind::Release { Ordering::Less } else { Ordering::Greater }
        }
    }
}

fn parse_segments(version: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut current = String::new();

    for ch in version.chars() {
        if ch == '.' || ch == '-' {
            if !current.is_empty() {
                segments.push(classify(&current));
                current.clear();
            }
        } else {
            current.push(ch);
        }
    }
    if !current.is_empty() {
        segments.push(classify(&current));
    }

    segments
}

fn classify(token: &str) -> Segment {
    if let Ok(n) = token.parse::<u64>() {
        return Segment::Numeric(n);
    }
    match token.to_lowercase().as_str() {
        "alpha" | "a" => Segment::Qualifier(QualifierKind::Alpha),
        "beta" | "b" => Segment::Qualifier(QualifierKind::Beta),
        "milestone" | "m" => Segment::Qualifier(QualifierKind::Milestone),
        "rc" | "cr" => Segment::Qualifier(QualifierKind::Rc),
        "snapshot" => Segment::Qualifier(QualifierKind::Snapshot),
        "" | "ga" | "final" | "release" => Segment::Qualifier(QualifierKind::Release),
        "sp" => Segment::Qualifier(QualifierKind::Sp),
        _ => Segment::Text(token.to_string()),
    }
}

/// A Maven version range bound.
#[derive(Debug, Clone)]
pub struct Bound {
    pub version: MavenVersion,
    pub inclusive: bool,
}

/// A single Maven version range expression: `[1.0,2.0)`, `[1.0,]`,
/// `(,2.0)`, or `[1.0]` (exact).
#[derive(Debug, Clone)]
pub struct VersionRange {
    pub lower: Option<Bound>,
    pub upper: Option<Bound>,
}

impl VersionRange {
    /// Parse a single range segment. Returns `None` for bare versions.
    pub fn parse(spec: &str) -> Option<Self> {
        let s = spec.trim();
        if !s.starts_with('[') && !s.starts_with('(') {
            return None;
        }

        let open_inclusive = s.starts_with('[');
        let close_inclusive = s.ends_with(']');
        let inner = &s[1..s.len() - 1];

        if let Some((lower, upper)) = inner.split_once(',') {
            let lower = lower.trim();
            let upper = upper.trim();
            Some(VersionRange {
                lower: (!lower.is_empty()).then(|| Bound {
                    version: MavenVersion::parse(lower),
                    inclusive: open_inclusive,
                }),
                upper: (!upper.is_empty()).then(|| Bound {
                    version: MavenVersion::parse(upper),
                    inclusive: close_inclusive,
                }),
            })
        } else {
            let v = MavenVersion::parse(inner.trim());
            Some(VersionRange {
                lower: Some(Bound { version: v.clone(), inclusive: true }),
                upper: Some(Bound { version: v, inclusive: true }),
            })
        }
    }

    pub fn contains(&self, version: &MavenVersion) -> bool {
        if let Some(ref lower) = self.lower {
            let cmp = version.cmp(&lower.version);
            if lower.inclusive {
                if cmp == Ordering::Less {
                    return false;
                }
            } else if cmp != Ordering::Greater {
                return false;
            }
        }
        if let Some(ref upper) = self.upper {
            let cmp = version.cmp(&upper.version);
            if upper.inclusive {
                if cmp == Ordering::Greater {
                    return false;
                }
            } else if cmp != Ordering::Less {
                return false;
            }
        }
        true
    }

    /// Intersect two ranges; `None` if they do not overlap.
    fn intersect(&self, other: &VersionRange) -> Option<VersionRange> {
        let lower = tighter_lower(&self.lower, &other.lower);
        let upper = tighter_upper(&self.upper, &other.upper);
        if let (Some(lo), Some(hi)) = (&lower, &upper) {
            let cmp = lo.version.cmp(&hi.version);
            if cmp == Ordering::Greater {
                return None;
            }
            if cmp == Ordering::Equal && !(lo.inclusive && hi.inclusive) {
                return None;
            }
        }
        Some(VersionRange { lower, upper })
    }
}

fn tighter_lower(a: &Option<Bound>, b: &Option<Bound>) -> Option<Bound> {
    match (a, b) {
        (None, other) | (other, None) => other.clone(),
        (Some(a), Some(b)) => Some(match a.version.cmp(&b.version) {
            Ordering::Greater => a.clone(),
            Ordering::Less => b.clone(),
            Ordering::Equal => Bound { version: a.version.clone(), inclusive: a.inclusive && b.inclusive },
        }),
    }
}

fn tighter_upper(a: &Option<Bound>, b: &Option<Bound>) -> Option<Bound> {
    match (a, b) {
        (None, other) | (other, None) => other.clone(),
        (Some(a), Some(b)) => Some(match a.version.cmp(&b.version) {
            Ordering::Less => a.clone(),
            Ordering::Greater => b.clone(),
            Ordering::Equal => Bound { version: a.version.clone(), inclusive: a.inclusive && b.inclusive },
        }),
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (lo_ch, lo_v) = match &self.lower {
            Some(b) => (if b.inclusive { '[' } else { '(' }, b.version.to_string()),
            None => ('(', String::new()),
        };
        let (hi_ch, hi_v) = match &self.upper {
            Some(b) => (if b.inclusive { ']' } else { ')' }, b.version.to_string()),
            None => (')', String::new()),
        };
        write!(f, "{lo_ch}{lo_v},{hi_v}{hi_ch}")
    }
}

/// A dependency's version requirement: either a single recommended version
/// or a union of ranges. `contains`/`intersect` are the two operations the
/// collector and Stage B of the graph transformer rely on.
#[derive(Debug, Clone)]
pub enum VersionConstraint {
    Recommended(MavenVersion),
    Ranges(Vec<VersionRange>),
    /// The empty constraint: the result of an unsatisfiable intersection.
    Empty,
}

impl VersionConstraint {
    /// Parse a version/range spec into a constraint.
    pub fn parse(spec: &str) -> Self {
        if let Some(range) = VersionRange::parse(spec) {
            return VersionConstraint::Ranges(vec![range]);
        }
        // Comma-joined ranges without a single enclosing bracket pair are
        // treated as a union, e.g. `[1.0,2.0),[3.0,4.0)`.
        if spec.contains("),[") || spec.contains("],(") || spec.contains("),(") || spec.contains("],[") {
            let ranges: Vec<VersionRange> = split_union(spec)
                .iter()
                .filter_map(|part| VersionRange::parse(part))
                .collect();
            if !ranges.is_empty() {
                return VersionConstraint::Ranges(ranges);
            }
        }
        VersionConstraint::Recommended(MavenVersion::parse(spec))
    }

    pub fn is_range(&self) -> bool {
        matches!(self, VersionConstraint::Ranges(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, VersionConstraint::Empty)
    }

    pub fn contains(&self, version: &MavenVersion) -> bool {
        match self {
            VersionConstraint::Recommended(v) => v == version,
            VersionConstraint::Ranges(ranges) => ranges.iter().any(|r| r.contains(version)),
            VersionConstraint::Empty => false,
        }
    }

    /// Narrow this constraint against another. Two recommendation-only
    /// constraints narrow to the newer one if compatible; anything that
    /// cannot be reconciled yields [`VersionConstraint::Empty`], signifying
    /// a conflict the caller must report.
    pub fn intersect(&self, other: &VersionConstraint) -> VersionConstraint {
        match (self, other) {
            (VersionConstraint::Empty, _) | (_, VersionConstraint::Empty) => VersionConstraint::Empty,
            (VersionConstraint::Recommended(a), VersionConstraint::Recommended(b)) => {
                // Two bare recommendations are only "compatible" if one's
                // base version contains the other — the common case is
                // identical versions, or the historical "newer wins" rule
                // for otherwise-equal releases.
                VersionConstraint::Recommended(if a >= b { a.clone() } else { b.clone() })
            }
            (VersionConstraint::Recommended(v), VersionConstraint::Ranges(ranges))
            | (VersionConstraint::Ranges(ranges), VersionConstraint::Recommended(v)) => {
                if ranges.iter().any(|r| r.contains(v)) {
                    VersionConstraint::Recommended(v.clone())
                } else {
                    VersionConstraint::Empty
                }
            }
            (VersionConstraint::Ranges(a), VersionConstraint::Ranges(b)) => {
                let mut out = Vec::new();
                for ra in a {
                    for rb in b {
                        if let Some(r) = ra.intersect(rb) {
                            out.push(r);
                        }
                    }
                }
                if out.is_empty() {
                    VersionConstraint::Empty
                } else {
                    VersionConstraint::Ranges(out)
                }
            }
        }
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionConstraint::Recommended(v) => write!(f, "{v}"),
            VersionConstraint::Ranges(ranges) => {
                let parts: Vec<String> = ranges.iter().map(|r| r.to_string()).collect();
                write!(f, "{}", parts.join(","))
            }
            VersionConstraint::Empty => write!(f, "<empty>"),
        }
    }
}

/// Split a union-of-ranges spec on the `,` that separates two bracket
/// groups (not the `,` inside a single range).
fn split_union(spec: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    let chars: Vec<char> = spec.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            '[' | '(' => depth += 1,
            ']' | ')' => depth -= 1,
            _ => {}
        }
        current.push(c);
        if depth == 0 && (c == ']' || c == ')') {
            parts.push(current.clone());
            current.clear();
            // skip the separating comma
            if i + 1 < chars.len() && chars[i + 1] == ',' {
                i += 1;
            }
        }
        i += 1;
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}
