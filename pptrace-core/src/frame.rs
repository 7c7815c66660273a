use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Shape of a single backtrace frame, e.g. `  #3  deadbeef in _Z3fooi+0x1c`.
///
/// The symbol stops at the first `+`, so names that contain one (some
/// operator manglings) are cut short or not matched at all.
static FRAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<marker>=>|  )#(?P<index>[0-9]+) +(?P<address>[0-9a-f]+) in (?P<symbol>[^+]+)\+0x",
    )
    .expect("frame pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameMarker {
    /// `=>`, the frame that raised the fault
    Fault,
    /// two spaces
    Plain,
}

impl fmt::Display for FrameMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match self {
            FrameMarker::Fault => "=>",
            FrameMarker::Plain => "  ",
        };
        write!(f, "{}", marker)
    }
}

/// Borrowed view of a line that looks like a backtrace frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLine<'a> {
    pub marker: FrameMarker,
    pub index: &'a str,
    pub address: &'a str,
    pub symbol: &'a str,
}

impl<'a> FrameLine<'a> {
    /// Matches `line` (terminator included or not) against the frame shape.
    pub fn parse(line: &'a str) -> Option<Self> {
        let caps = FRAME_REGEX.captures(line)?;
        let marker = match &caps["marker"] {
            "=>" => FrameMarker::Fault,
            _ => FrameMarker::Plain,
        };

        Some(Self {
            marker,
            index: caps.name("index")?.as_str(),
            address: caps.name("address")?.as_str(),
            symbol: caps.name("symbol")?.as_str(),
        })
    }

    pub fn is_faulting(&self) -> bool {
        self.marker == FrameMarker::Fault
    }
}

/// Replaces the first occurrence of `symbol` anywhere in `line`.
///
/// This is a plain substring replace: if the symbol text shows up before the
/// ` in ` clause, that earlier occurrence is the one rewritten.
pub fn substitute_first(line: &str, symbol: &str, replacement: &str) -> String {
    line.replacen(symbol, replacement, 1)
}
