//! Rolling delimiter matching for the tag scanner.
//!
//! A [`Pattern`] tracks progress toward matching one fixed delimiter string
//! against a character stream, one character per call. The scanner keeps one
//! pattern per delimiter alive for a whole file and feeds every incoming
//! character to whichever patterns are currently relevant.
//!
//! ## Deliberate quirk: no backtracking on mismatch
//!
//! The cursor only resets after a *complete* match. A failed partial match
//! leaves the cursor where it stalled, so the next candidate is tested from
//! mid-delimiter instead of from the start. Template delimiters are chosen so
//! this doesn't bite in ordinary markup, and generated output depends on the
//! exact behavior, so it is preserved rather than fixed. The
//! `stalled_cursor_resumes_mid_delimiter` test pins it.

/// In-progress matching of one fixed delimiter against a character stream.
#[derive(Debug, Clone)]
pub struct Pattern {
    text: Vec<char>,
    pos: usize,
}

impl Pattern {
    pub fn new(delimiter: &str) -> Self {
        Pattern {
            text: delimiter.chars().collect(),
            pos: 0,
        }
    }

    /// Delimiter length in bytes. Valid for truncating a scan buffer because
    /// every delimiter is ASCII.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Feed one character; true when the delimiter just completed.
    ///
    /// A completed match is consumed: the next call starts over from the
    /// beginning. A mismatch leaves the cursor in place.
    pub fn next(&mut self, ch: char) -> bool {
        if self.pos == self.text.len() {
            self.pos = 0;
        }
        if ch == self.text[self.pos] {
            self.pos += 1;
        }
        self.pos == self.text.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(pattern: &mut Pattern, input: &str) -> Vec<usize> {
        input
            .chars()
            .enumerate()
            .filter_map(|(i, ch)| pattern.next(ch).then_some(i))
            .collect()
    }

    #[test]
    fn matches_exact_delimiter() {
        let mut p = Pattern::new("?>");
        assert_eq!(feed(&mut p, "?>"), vec![1]);
    }

    #[test]
    fn matches_delimiter_inside_stream() {
        let mut p = Pattern::new("<?code");
        assert_eq!(feed(&mut p, "text <?code more"), vec![10]);
    }

    #[test]
    fn resets_after_complete_match() {
        let mut p = Pattern::new("?>");
        assert_eq!(feed(&mut p, "?>x?>"), vec![1, 4]);
    }

    #[test]
    fn partial_match_does_not_complete() {
        let mut p = Pattern::new("<?insert");
        assert_eq!(feed(&mut p, "<?ins"), Vec::<usize>::new());
    }

    #[test]
    fn cursor_survives_interleaved_noise() {
        // The stalled cursor picks the match back up when the right
        // characters eventually arrive, regardless of what came between.
        let mut p = Pattern::new("?>");
        assert_eq!(feed(&mut p, "?abc>"), vec![4]);
    }

    #[test]
    fn stalled_cursor_resumes_mid_delimiter() {
        // "<?c" stalls the cursor at position 3. The second tag's '<', '?',
        // 'c' all fail against the expected 'o'; its 'o', 'd', 'e' then
        // complete the stalled match. The completion lands on the same index
        // a restarting matcher would report, which is why the quirk is
        // harmless for these delimiters. Pinned on purpose — see the module
        // docs.
        let mut p = Pattern::new("<?code");
        assert_eq!(feed(&mut p, "<?c<?code"), vec![8]);
    }

    #[test]
    fn repeated_prefix_characters_stall_in_place() {
        let mut p = Pattern::new("?>");
        assert_eq!(feed(&mut p, "???>"), vec![3]);
    }
}
