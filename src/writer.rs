use std::fmt;

/// `fmt::Write` sink that appends to a `String` but stops accepting bytes once
/// `limit` bytes have been written through it.
///
/// Excess text is dropped silently, cut on a char boundary, so formatting
/// never fails because of the cap.
pub(crate) struct CappedWriter<'a> {
    buf: &'a mut String,
    remaining: usize,
    truncated: bool,
}

impl<'a> CappedWriter<'a> {
    pub(crate) fn new(buf: &'a mut String, limit: usize) -> Self {
        Self {
            buf,
            remaining: limit,
            truncated: false,
        }
    }

    pub(crate) fn truncated(&self) -> bool {
        self.truncated
    }
}

impl<'a> fmt::Write for CappedWriter<'a> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if s.len() <= self.remaining {
            self.buf.push_str(s);
            self.remaining -= s.len();
            return Ok(());
        }

        // Mark if we need to truncate the message.
        self.truncated = true;
        let mut end = self.remaining;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        self.buf.push_str(&s[..end]);
        self.remaining -= end;

        // Always report success so write! keeps going and the cap stays silent.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Write;

    #[test]
    fn test_basic_write() {
        let mut buf = String::new();
        let mut writer = CappedWriter::new(&mut buf, 8);

        write!(&mut writer, "Hi").unwrap();

        assert!(!writer.truncated());
        assert_eq!(buf, "Hi");
    }

    #[test]
    fn test_exact_fit() {
        let mut buf = String::new();
        let mut writer = CappedWriter::new(&mut buf, 6);

        write!(&mut writer, "123456").unwrap();

        assert!(!writer.truncated());
        assert_eq!(buf, "123456");
    }

    #[test]
    fn test_truncation() {
        let mut buf = String::new();
        let mut writer = CappedWriter::new(&mut buf, 6);

        write!(&mut writer, "1234567890").unwrap();

        assert!(writer.truncated());
        assert_eq!(buf, "123456");
    }

    #[test]
    fn test_multiple_writes_with_truncation() {
        let mut buf = String::new();
        let mut writer = CappedWriter::new(&mut buf, 7);

        write!(&mut writer, "ABC").unwrap();
        write!(&mut writer, "DEF").unwrap();
        write!(&mut writer, "GHI").unwrap();
        write!(&mut writer, "JKL").unwrap();

        assert_eq!(buf, "ABCDEFG");
    }

    #[test]
    fn test_appends_after_existing_prefix() {
        let mut buf = String::from("prefix:");
        let mut writer = CappedWriter::new(&mut buf, 3);

        write!(&mut writer, "value={}", 42).unwrap();

        assert_eq!(buf, "prefix:val");
    }

    #[test]
    fn test_cut_on_char_boundary() {
        let mut buf = String::new();
        let mut writer = CappedWriter::new(&mut buf, 4);

        // 'é' is two bytes; the cap falls in the middle of the second one
        write!(&mut writer, "aéé").unwrap();

        assert!(writer.truncated());
        assert_eq!(buf, "aé");
    }
}
