use std::io::Write;

const GLYPHS_PER_ROW: usize = 50;

/// Emits the per-host progress glyphs of §4.10 to an arbitrary writer
/// (stderr in the CLI). `.` network PTR, `r` recursion, `d` store hit.
pub struct ProgressReporter {
    enabled: bool,
    count: u64,
    column: usize,
}

impl ProgressReporter {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            count: 0,
            column: 0,
        }
    }

    pub fn network(&mut self, out: &mut impl Write) {
        self.glyph('.', out);
    }

    pub fn recursion(&mut self, out: &mut impl Write) {
        self.glyph('r', out);
    }

    pub fn store_hit(&mut self, out: &mut impl Write) {
        self.glyph('d', out);
    }

    fn glyph(&mut self, c: char, out: &mut impl Write) {
        if !self.enabled {
            return;
        }
        if self.column == 0 {
            let _ = write!(out, "{:7}  ", self.count);
        }
        let _ = write!(out, "{c}");
        self.count += 1;
        self.column += 1;
        if self.column == GLYPHS_PER_ROW {
            let _ = writeln!(out);
            self.column = 0;
        }
    }

    pub fn finish(&mut self, out: &mut impl Write) {
        if self.enabled && self.column != 0 {
            let _ = writeln!(out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_at_fifty_glyphs_with_count_prefix() {
        let mut buf = Vec::new();
        let mut p = ProgressReporter::new(true);
        for _ in 0..50 {
            p.network(&mut buf);
        }
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.matches('.').count(), 50);
        assert!(text.starts_with("      0  "));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn disabled_reporter_emits_nothing() {
        let mut buf = Vec::new();
        let mut p = ProgressReporter::new(false);
        p.network(&mut buf);
        p.finish(&mut buf);
        assert!(buf.is_empty());
    }
}
