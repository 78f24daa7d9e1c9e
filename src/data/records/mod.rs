use std::{error::Error, fs::File, io::ErrorKind, path::Path};

#[derive(Debug)]
struct RecordError {
    description: String,
    source:      Box<dyn Error + Send + Sync>,
}

impl std::fmt::Display for RecordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description)
    }
}

impl Error for RecordError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.source.as_ref())
    }
}

/// Shared file handling for the alignment, model, and profile readers.
pub(crate) trait RecordReader {
    const RECORD_NAME: &str;

    /// Opens a file, checking to ensure that it is non-empty, and providing
    /// context for error messages.
    #[inline]
    fn open_nonempty_file<P: AsRef<Path>>(filename: P) -> std::io::Result<File> {
        let path = filename.as_ref();

        let file = File::open(path).map_err(|err| Self::new_wrapped("file open error", path, err))?;
        let metadata = file
            .metadata()
            .map_err(|err| Self::new_wrapped("metadata error", path, err))?;
        if metadata.len() == 0 {
            return Err(Self::new_kind("file empty", path, ErrorKind::InvalidInput));
        }

        Ok(file)
    }

    fn new_kind(description: &str, path: &Path, kind: ErrorKind) -> std::io::Error {
        std::io::Error::new(
            kind,
            format!(
                "{desc} for {name}: '{path}'",
                desc = description,
                name = Self::RECORD_NAME,
                path = path.display()
            ),
        )
    }

    fn new_wrapped(description: &str, path: &Path, err: std::io::Error) -> std::io::Error {
        std::io::Error::other(RecordError {
            description: format!(
                "{desc} for {name}: '{path}'",
                desc = description,
                name = Self::RECORD_NAME,
                path = path.display()
            ),
            source:      Box::new(err),
        })
    }
}

/// A line-oriented view of a byte stream that tracks line numbers for
/// diagnostics and supports pushing back a single line.
pub(crate) struct LineSource<R: std::io::Read> {
    reader:      std::io::BufReader<R>,
    line_number: usize,
    pushed_back: Option<String>,
}

impl<R: std::io::Read> LineSource<R> {
    pub(crate) fn new(inner: R) -> Self {
        LineSource {
            reader:      std::io::BufReader::new(inner),
            line_number: 0,
            pushed_back: None,
        }
    }

    /// The number of the most recently returned line, starting from 1.
    #[inline]
    pub(crate) fn line_number(&self) -> usize {
        self.line_number
    }

    /// Returns the next line without its line terminator, or `None` at the
    /// end of the stream. Bytes that are not valid UTF-8 become U+FFFD.
    pub(crate) fn next_line(&mut self) -> std::io::Result<Option<String>> {
        use std::io::BufRead;

        if let Some(line) = self.pushed_back.take() {
            self.line_number += 1;
            return Ok(Some(line));
        }

        let mut buf = Vec::new();
        if self.reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(None);
        }
        self.line_number += 1;
        while let Some(b'\n' | b'\r') = buf.last() {
            buf.pop();
        }
        Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
    }

    /// Returns a line to the stream so the next call to
    /// [`next_line`](LineSource::next_line) yields it again.
    pub(crate) fn push_back(&mut self, line: String) {
        self.line_number = self.line_number.saturating_sub(1);
        self.pushed_back = Some(line);
    }

    /// Consumes the rest of the stream, including any pushed back line.
    pub(crate) fn read_remaining(&mut self) -> std::io::Result<String> {
        use std::io::Read;

        let mut buf = Vec::new();
        self.reader.read_to_end(&mut buf)?;
        let rest = String::from_utf8_lossy(&buf);
        self.line_number += rest.lines().count();
        Ok(match self.pushed_back.take() {
            Some(mut first) => {
                first.push('\n');
                first.push_str(&rest);
                first
            }
            None => rest.into_owned(),
        })
    }
}

/// Whether a line has nothing but whitespace.
#[inline]
pub(crate) fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Splits the next whitespace-delimited token off `s`, returning it and the
/// unconsumed remainder.
#[inline]
pub(crate) fn next_token(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    let end = s.find(char::is_whitespace).unwrap_or(s.len());
    Some(s.split_at(end))
}
