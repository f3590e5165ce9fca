/// One step of a JSON path: an object property name or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// One step of a [`Location::matches`] glob pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternSegment<'a> {
    Key(&'a str),
    Index(usize),
    /// `*`: matches exactly one path segment, of either kind.
    Any,
    /// `**`: matches zero or more path segments.
    AnyRest,
}

/// Matches a concrete path against a glob-style pattern. `**` may appear any
/// number of times and matches a (possibly empty) run of segments.
pub fn path_matches(path: &[PathSegment], pattern: &[PatternSegment]) -> bool {
    match pattern.first() {
        None => path.is_empty(),
        Some(PatternSegment::AnyRest) => {
            // Try consuming 0, 1, 2, ... segments of `path` with the rest of
            // the pattern before giving up.
            (0..=path.len()).any(|take| path_matches(&path[take..], &pattern[1..]))
        }
        Some(head) => match path.first() {
            None => false,
            Some(PathSegment::Key(k)) => match head {
                PatternSegment::Key(pk) => pk == k && path_matches(&path[1..], &pattern[1..]),
                PatternSegment::Any => path_matches(&path[1..], &pattern[1..]),
                PatternSegment::Index(_) => false,
                PatternSegment::AnyRest => unreachable!(),
            },
            Some(PathSegment::Index(i)) => match head {
                PatternSegment::Index(pi) => pi == i && path_matches(&path[1..], &pattern[1..]),
                PatternSegment::Any => path_matches(&path[1..], &pattern[1..]),
                PatternSegment::Key(_) => false,
                PatternSegment::AnyRest => unreachable!(),
            },
        },
    }
}
