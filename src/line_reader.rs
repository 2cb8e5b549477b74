//! Line reader: physical-line-to-logical-line normalization with
//! comment and continuation handling.

use std::io::{self, Read};

/// Reads logical lines out of an arbitrary byte stream, handling the
/// escape/continuation/comment rules a descriptor file needs before any
/// higher-level parsing happens.
pub struct LineReader<R> {
    inner: R,
    /// One byte of pushback, the Rust equivalent of a C `ungetc`.
    peeked: Option<u8>,
}

impl<R: Read> LineReader<R> {
    pub fn new(inner: R) -> Self {
        LineReader {
            inner,
            peeked: None,
        }
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        if let Some(b) = self.peeked.take() {
            return Ok(Some(b));
        }
        let mut buf = [0u8; 1];
        match self.inner.read(&mut buf)? {
            0 => Ok(None),
            _ => Ok(Some(buf[0])),
        }
    }

    fn push_back(&mut self, b: u8) {
        self.peeked = Some(b);
    }

    /// `c` was just read as a line terminator byte. `\n`/`\r` pairs
    /// (`\r\n` or `\n\r`) are consumed atomically; anything else read
    /// ahead is pushed back for the next logical line.
    fn consume_terminator_pair(&mut self, c: u8) -> io::Result<()> {
        if let Some(next) = self.read_byte()? {
            let pairs_with = matches!((c, next), (b'\r', b'\n') | (b'\n', b'\r'));
            if !pairs_with {
                self.push_back(next);
            }
        }
        Ok(())
    }

    /// Reads one logical line into `out` (cleared first, terminator not
    /// included). Returns `Ok(false)` only when called at end-of-stream
    /// with nothing left to read.
    pub fn read_line(&mut self, out: &mut Vec<u8>) -> io::Result<bool> {
        out.clear();

        let mut quoted = false;
        let mut comment = false;
        let mut n_read = 0usize;

        loop {
            let c = match self.read_byte()? {
                None => {
                    if quoted {
                        out.push(b'\\');
                    }
                    break;
                }
                Some(c) => c,
            };
            n_read += 1;

            if quoted {
                quoted = false;
                match c {
                    b'#' => out.push(b'#'),
                    b'\r' | b'\n' => self.consume_terminator_pair(c)?,
                    other => {
                        out.push(b'\\');
                        out.push(other);
                    }
                }
            } else {
                match c {
                    b'#' => comment = true,
                    b'\\' => {
                        if !comment {
                            quoted = true;
                        }
                    }
                    b'\r' | b'\n' => {
                        self.consume_terminator_pair(c)?;
                        break;
                    }
                    other => {
                        if !comment {
                            out.push(other);
                        }
                    }
                }
            }
        }

        Ok(n_read > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines_of(input: &str) -> Vec<String> {
        let mut reader = LineReader::new(input.as_bytes());
        let mut out = Vec::new();
        let mut buf = Vec::new();
        while reader.read_line(&mut buf).unwrap() {
            out.push(String::from_utf8(buf.clone()).unwrap());
        }
        out
    }

    #[test]
    fn splits_on_newline() {
        assert_eq!(lines_of("a\nb\n"), vec!["a", "b"]);
    }

    #[test]
    fn handles_crlf_and_lfcr_atomically() {
        assert_eq!(lines_of("a\r\nb\n\rc"), vec!["a", "b", "c"]);
    }

    #[test]
    fn comment_runs_to_end_of_physical_line() {
        assert_eq!(lines_of("prefix=/opt\n# a whole comment line\nNext: yes\n"),
            vec!["prefix=/opt", "", "Next: yes"]);
    }

    #[test]
    fn escaped_hash_is_literal() {
        assert_eq!(lines_of("foo \\# bar\n"), vec!["foo # bar"]);
    }

    #[test]
    fn backslash_before_terminator_continues_the_line() {
        assert_eq!(
            lines_of("prefix=/opt/\\\n    foo # bar\n"),
            vec!["prefix=/opt/    foo"]
        );
    }

    #[test]
    fn backslash_before_other_byte_is_passed_through() {
        assert_eq!(lines_of("a\\zb\n"), vec!["a\\zb"]);
    }

    #[test]
    fn no_trailing_newline_still_yields_final_line() {
        assert_eq!(lines_of("last"), vec!["last"]);
    }

    #[test]
    fn empty_stream_reads_nothing() {
        assert_eq!(lines_of(""), Vec::<String>::new());
    }
}
