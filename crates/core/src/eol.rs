use strum_macros::{AsRefStr, EnumIter};

/// Line ending style of a document. Detected on load and kept so the file
/// round trips with the endings it came with.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, EnumIter, AsRefStr)]
pub enum EndOfLine {
    Lf,
    Crlf,
    Cr,
}

impl EndOfLine {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndOfLine::Lf => "\n",
            EndOfLine::Crlf => "\r\n",
            EndOfLine::Cr => "\r",
        }
    }

    /// Detect the dominant line ending of `text`. Ties and texts without any
    /// line endings fall back to the platform default.
    pub fn detect(text: &str) -> EndOfLine {
        let bytes = text.as_bytes();
        let mut lf = 0usize;
        let mut crlf = 0usize;
        let mut cr = 0usize;

        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\r' => {
                    if bytes.get(i + 1) == Some(&b'\n') {
                        crlf += 1;
                        i += 2;
                        continue;
                    }
                    cr += 1;
                }
                b'\n' => lf += 1,
                _ => {}
            }
            i += 1;
        }

        if lf == 0 && crlf == 0 && cr == 0 {
            return EndOfLine::default();
        }

        if crlf >= lf && crlf >= cr {
            EndOfLine::Crlf
        } else if cr > lf {
            EndOfLine::Cr
        } else {
            EndOfLine::Lf
        }
    }
}

impl Default for EndOfLine {
    fn default() -> Self {
        #[cfg(target_os = "windows")]
        const DEFAULT_EOL: EndOfLine = EndOfLine::Crlf;

        #[cfg(not(target_os = "windows"))]
        const DEFAULT_EOL: EndOfLine = EndOfLine::Lf;

        DEFAULT_EOL
    }
}
