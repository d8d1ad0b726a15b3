//! Parsing of newline-delimited `x,y` telemetry.

use log::debug;

/// One numeric sample from a device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
}

impl Sample {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn as_point(&self) -> [f64; 2] {
        [self.x, self.y]
    }
}

impl From<(f64, f64)> for Sample {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Parse a single line. The line is split on its first comma and both halves must be
/// finite numbers; anything else yields `None`.
pub fn parse_line(line: &str) -> Option<Sample> {
    let (x, y) = line.trim().split_once(',')?;
    let x = x.trim().parse::<f64>().ok()?;
    let y = y.trim().parse::<f64>().ok()?;
    if !x.is_finite() || !y.is_finite() {
        return None;
    }
    Some(Sample { x, y })
}

/// Parse a batch of lines, silently dropping the malformed ones. Input order is kept.
pub fn parse_samples<S: AsRef<str>>(lines: &[S]) -> Vec<Sample> {
    lines
        .iter()
        .filter_map(|line| parse_line(line.as_ref()))
        .collect()
}

/// Maximum number of bytes kept from an unterminated line.
pub const MAX_PARTIAL_LINE: usize = 4096;

/// Reassembles complete lines from arbitrarily chunked text.
///
/// The tail after the last `\n` of a chunk is carried into the next `push`.
#[derive(Debug, Default, Clone)]
pub struct LineSplitter {
    carry: String,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return all lines it completes, without their terminators.
    pub fn push(&mut self, chunk: &str) -> Vec<String> {
        let mut lines = Vec::new();
        let mut rest = chunk;
        while let Some(pos) = rest.find('\n') {
            let (head, tail) = rest.split_at(pos);
            let mut line = std::mem::take(&mut self.carry);
            line.push_str(head.trim_end_matches('\r'));
            lines.push(line);
            rest = &tail[1..];
        }
        self.carry.push_str(rest);
        if self.carry.len() > MAX_PARTIAL_LINE {
            debug!(
                "dropping unterminated line of {} bytes",
                self.carry.len()
            );
            self.carry.clear();
        }
        lines
    }

    /// Bytes waiting for a line terminator.
    pub fn pending(&self) -> &str {
        &self.carry
    }

    pub fn clear(&mut self) {
        self.carry.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_whitespace_and_exponents() {
        assert_eq!(parse_line(" 1e3 , -2.5\r"), Some(Sample::new(1000.0, -2.5)));
    }

    #[test]
    fn splits_on_first_comma_only() {
        // "2,3" is not a number, so the whole line is rejected
        assert_eq!(parse_line("1,2,3"), None);
    }

    #[test]
    fn rejects_non_finite() {
        assert_eq!(parse_line("nan,1"), None);
        assert_eq!(parse_line("1,inf"), None);
    }

    #[test]
    fn carry_over_across_chunks() {
        let mut s = LineSplitter::new();
        assert!(s.push("1.5,").is_empty());
        assert_eq!(s.pending(), "1.5,");
        assert_eq!(s.push("2\r\n3,4\n5"), vec!["1.5,2".to_string(), "3,4".to_string()]);
        assert_eq!(s.pending(), "5");
    }

    #[test]
    fn oversized_partial_line_is_dropped() {
        let mut s = LineSplitter::new();
        let junk = "x".repeat(MAX_PARTIAL_LINE + 1);
        assert!(s.push(&junk).is_empty());
        assert_eq!(s.pending(), "");
    }
}
