//! `Accept` header negotiation between a full page and a Turbo Stream.

/// Media type of a Turbo Stream response body.
pub const STREAM_MIME_TYPE: &str = "text/vnd.turbo-stream.html";
/// Media type of a regular page.
pub const HTML_MIME_TYPE: &str = "text/html";

/// One parsed entry of an `Accept` header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaRange {
    pub kind: String,
    pub subtype: String,
    /// Quality in thousandths (`q=0.5` is 500).
    pub quality: u16,
    /// Index of the entry in the header.
    pub position: usize,
}

impl MediaRange {
    /// 2 for `type/subtype`, 1 for `type/*`, 0 for `*/*`.
    pub fn specificity(&self) -> u8 {
        match (self.kind.as_str(), self.subtype.as_str()) {
            ("*", _) => 0,
            (_, "*") => 1,
            _ => 2,
        }
    }

    pub fn matches(&self, kind: &str, subtype: &str) -> bool {
        match self.specificity() {
            0 => true,
            1 => self.kind.eq_ignore_ascii_case(kind),
            _ => self.kind.eq_ignore_ascii_case(kind) && self.subtype.eq_ignore_ascii_case(subtype),
        }
    }
}

/// Parse an `Accept` header. Malformed entries are skipped.
pub fn parse_accept(header: &str) -> Vec<MediaRange> {
    header
        .split(',')
        .enumerate()
        .filter_map(|(position, entry)| parse_range(entry, position))
        .collect()
}

fn parse_range(entry: &str, position: usize) -> Option<MediaRange> {
    let mut parts = entry.split(';');
    let (kind, subtype) = parts.next()?.trim().split_once('/')?;
    let (kind, subtype) = (kind.trim(), subtype.trim());
    if kind.is_empty() || subtype.is_empty() || subtype.contains('/') {
        return None;
    }
    if kind == "*" && subtype != "*" {
        return None;
    }

    let mut quality = 1000;
    for param in parts {
        let Some((name, value)) = param.split_once('=') else {
            continue;
        };
        if name.trim().eq_ignore_ascii_case("q") {
            let q: f32 = value.trim().parse().ok()?;
            if !q.is_finite() {
                return None;
            }
            quality = (q.clamp(0.0, 1.0) * 1000.0).round() as u16;
        }
    }

    Some(MediaRange {
        kind: kind.to_ascii_lowercase(),
        subtype: subtype.to_ascii_lowercase(),
        quality,
        position,
    })
}

/// How well the client accepts one candidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Rank {
    quality: u16,
    specificity: u8,
    position: usize,
}

impl Rank {
    fn beats(&self, other: &Rank) -> bool {
        if self.quality != other.quality {
            return self.quality > other.quality;
        }
        if self.specificity != other.specificity {
            return self.specificity > other.specificity;
        }
        self.position < other.position
    }
}

/// The most specific range covering `candidate` decides its quality.
fn rank(ranges: &[MediaRange], candidate: &str) -> Option<Rank> {
    let (kind, subtype) = candidate.split_once('/')?;
    let mut best: Option<&MediaRange> = None;
    for range in ranges.iter().filter(|r| r.matches(kind, subtype)) {
        match best {
            Some(b) if range.specificity() <= b.specificity() => {}
            _ => best = Some(range),
        }
    }
    best.filter(|r| r.quality > 0).map(|r| Rank {
        quality: r.quality,
        specificity: r.specificity(),
        position: r.position,
    })
}

/// Pick the candidate the client prefers.
///
/// Higher quality wins, then the more specific matching range, then the range
/// listed earlier by the client. Remaining ties go to the earlier candidate.
/// Returns `None` when the header is absent or accepts no candidate.
pub fn best_match<'a>(accept: Option<&str>, candidates: &[&'a str]) -> Option<&'a str> {
    let ranges = parse_accept(accept?);
    let mut winner: Option<(&'a str, Rank)> = None;
    for &candidate in candidates {
        let Some(r) = rank(&ranges, candidate) else {
            continue;
        };
        match winner {
            Some((_, current)) if !r.beats(&current) => {}
            _ => winner = Some((candidate, r)),
        }
    }
    winner.map(|(c, _)| c)
}

/// Whether a Turbo Stream is strictly preferred over HTML.
pub fn prefers_stream_format(accept: Option<&str>) -> bool {
    best_match(accept, &[HTML_MIME_TYPE, STREAM_MIME_TYPE]) == Some(STREAM_MIME_TYPE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_stream_type() {
        assert!(prefers_stream_format(Some("text/vnd.turbo-stream.html")));
    }

    #[test]
    fn exact_html() {
        assert!(!prefers_stream_format(Some("text/html")));
    }

    #[test]
    fn absent_or_empty_header() {
        assert!(!prefers_stream_format(None));
        assert!(!prefers_stream_format(Some("")));
    }

    #[test]
    fn turbo_form_submission_header() {
        // what turbo.js sends with form submissions
        assert!(prefers_stream_format(Some(
            "text/vnd.turbo-stream.html, text/html, application/xhtml+xml"
        )));
    }

    #[test]
    fn browser_navigation_header() {
        assert!(!prefers_stream_format(Some(
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"
        )));
    }

    #[test]
    fn wildcard_tie_defaults_to_html() {
        assert!(!prefers_stream_format(Some("*/*")));
        assert!(!prefers_stream_format(Some("text/*")));
    }

    #[test]
    fn quality_decides() {
        assert!(prefers_stream_format(Some("text/html;q=0.5, text/vnd.turbo-stream.html")));
        assert!(!prefers_stream_format(Some("text/html, text/vnd.turbo-stream.html;q=0.9")));
    }

    #[test]
    fn specific_range_beats_wildcard_at_equal_quality() {
        assert!(prefers_stream_format(Some("text/*, text/vnd.turbo-stream.html")));
        assert!(!prefers_stream_format(Some("text/vnd.turbo-stream.html;q=0.5, text/*")));
    }

    #[test]
    fn zero_quality_excludes() {
        assert!(!prefers_stream_format(Some("text/vnd.turbo-stream.html;q=0")));
        assert!(prefers_stream_format(Some("text/vnd.turbo-stream.html, text/html;q=0")));
    }

    #[test]
    fn malformed_entries_are_skipped() {
        assert!(!prefers_stream_format(Some("garbage")));
        assert!(!prefers_stream_format(Some("text/vnd.turbo-stream.html;q=abc")));
        assert!(prefers_stream_format(Some("nonsense, text/vnd.turbo-stream.html")));
    }

    #[test]
    fn case_insensitive_match() {
        assert!(prefers_stream_format(Some("TEXT/VND.TURBO-STREAM.HTML")));
    }

    #[test]
    fn parse_accept_reads_quality_and_position() {
        let ranges = parse_accept("text/html;q=0.7, */*;level=1");
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0].quality, 700);
        assert_eq!(ranges[0].specificity(), 2);
        assert_eq!(ranges[1].quality, 1000);
        assert_eq!(ranges[1].specificity(), 0);
        assert_eq!(ranges[1].position, 1);
    }

    #[test]
    fn best_match_returns_none_when_nothing_acceptable() {
        assert_eq!(best_match(Some("image/png"), &[HTML_MIME_TYPE, STREAM_MIME_TYPE]), None);
    }
}
