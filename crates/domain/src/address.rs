use std::fmt;
use std::net::Ipv4Addr;

/// An IPv4 address literal scanned from a log line (§3 "Address literal").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostKey(pub Ipv4Addr);

impl HostKey {
    pub fn octets(&self) -> [u8; 4] {
        self.0.octets()
    }

    /// The three owning prefixes, most specific first (§4.6).
    pub fn owning_classes(&self) -> [ClassKey; 3] {
        [
            ClassKey::new(*self, ClassWidth::Slash24),
            ClassKey::new(*self, ClassWidth::Slash16),
            ClassKey::new(*self, ClassWidth::Slash8),
        ]
    }

    /// Reverse-in-addr.arpa name for the host PTR query of §4.3.
    pub fn reverse_arpa_name(&self) -> String {
        let octets = self.octets();
        let mut parts: Vec<String> = octets.iter().rev().map(u8::to_string).collect();
        parts.push("in-addr".to_string());
        parts.push("arpa".to_string());
        parts.join(".")
    }
}

impl fmt::Display for HostKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Width of a class prefix (§3 "Class key").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassWidth {
    Slash24,
    Slash16,
    Slash8,
}

impl ClassWidth {
    fn octet_count(self) -> usize {
        match self {
            ClassWidth::Slash24 => 3,
            ClassWidth::Slash16 => 2,
            ClassWidth::Slash8 => 1,
        }
    }
}

/// One of the three leading-octet prefixes of a host, used for recursion (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassKey {
    octets: [u8; 4],
    width: ClassWidth,
}

impl ClassKey {
    pub fn new(host: HostKey, width: ClassWidth) -> Self {
        Self {
            octets: host.octets(),
            width,
        }
    }

    pub fn width(&self) -> ClassWidth {
        self.width
    }

    fn prefix(&self) -> &[u8] {
        &self.octets[..self.width.octet_count()]
    }

    /// Reverse-in-addr.arpa name for the NS query of §4.3.
    pub fn reverse_arpa_name(&self) -> String {
        let mut parts: Vec<String> = self.prefix().iter().rev().map(u8::to_string).collect();
        parts.push("in-addr".to_string());
        parts.push("arpa".to_string());
        parts.join(".")
    }
}

impl fmt::Display for ClassKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.prefix().iter().map(u8::to_string).collect();
        write!(f, "{}", parts.join("."))
    }
}

/// One scanned address literal together with the exact byte range it
/// occupied in the line it was scanned from (§3 "Address literal"). The
/// range is what the committer replaces, rather than re-searching for a
/// normalized `Display` form of the key, since a non-canonical literal
/// (leading zeros) would otherwise not round-trip to the same span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostOccurrence {
    pub host: HostKey,
    pub start: usize,
    pub end: usize,
}

/// Scans a line for address-literal occurrences in left-to-right order,
/// under either anchored (start-of-line only) or anywhere mode (§4.1).
pub fn scan_line(text: &str, anywhere: bool) -> Vec<HostOccurrence> {
    let bytes = text.as_bytes();
    let mut hits = Vec::new();
    let mut pos = 0usize;

    while pos < bytes.len() {
        if let Some((host, end)) = match_dotted_quad(bytes, pos) {
            hits.push(HostOccurrence { host, start: pos, end });
            pos = end;
            if !anywhere {
                break;
            }
            continue;
        }
        if !anywhere && pos == 0 {
            // Anchored mode only ever looks at the very start of the line.
            break;
        }
        pos += 1;
    }
    hits
}

/// Attempts to match a dotted-quad literal starting at `start`, returning the
/// parsed address and the index just past it. A match must not be touching a
/// digit or dot on either side, so it cannot be a fragment of a longer run of
/// numbers (e.g. the tail of a version string).
fn match_dotted_quad(bytes: &[u8], start: usize) -> Option<(HostKey, usize)> {
    if start > 0 {
        let prev = bytes[start - 1];
        if prev.is_ascii_digit() || prev == b'.' {
            return None;
        }
    }

    let mut octets = [0u8; 4];
    let mut pos = start;
    for (i, octet) in octets.iter_mut().enumerate() {
        let (value, next) = take_octet(bytes, pos)?;
        *octet = value;
        pos = next;
        if i < 3 {
            if pos >= bytes.len() || bytes[pos] != b'.' {
                return None;
            }
            pos += 1;
        }
    }

    if pos < bytes.len() {
        let next = bytes[pos];
        if next.is_ascii_digit() || next == b'.' {
            return None;
        }
    }

    Some((
        HostKey(Ipv4Addr::new(octets[0], octets[1], octets[2], octets[3])),
        pos,
    ))
}

fn take_octet(bytes: &[u8], start: usize) -> Option<(u8, usize)> {
    let mut end = start;
    while end < bytes.len() && bytes[end].is_ascii_digit() && end - start < 3 {
        end += 1;
    }
    if end == start {
        return None;
    }
    let text = std::str::from_utf8(&bytes[start..end]).ok()?;
    let value: u32 = text.parse().ok()?;
    if value > 255 {
        return None;
    }
    Some((value as u8, end))
}
