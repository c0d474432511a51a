use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// A sentence whose tokens are each annotated with a part-of-speech tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PosSample {
    words: Vec<String>,
    tags: Vec<String>,
}

impl PosSample {
    /// Create a sample, `words` and `tags` must have the same length
    pub fn new<W, T>(words: Vec<W>, tags: Vec<T>) -> io::Result<Self>
    where
        W: Into<String>,
        T: Into<String>,
    {
        if words.len() != tags.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "words and tags must have the same length",
            ));
        }
        Ok(Self {
            words: words.into_iter().map(Into::into).collect(),
            tags: tags.into_iter().map(Into::into).collect(),
        })
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Parses the `word_TAG word_TAG ...` form; the last `_` of a token starts the tag.
impl FromStr for PosSample {
    type Err = io::Error;

    fn from_str(line: &str) -> io::Result<Self> {
        let mut words = Vec::new();
        let mut tags = Vec::new();
        for token in line.split_whitespace() {
            match token.rsplit_once('_') {
                Some((word, tag)) if !word.is_empty() && !tag.is_empty() => {
                    words.push(word.to_string());
                    tags.push(tag.to_string());
                }
                _ => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("token '{}' is not of the form word_tag", token),
                    ))
                }
            }
        }
        Ok(Self { words, tags })
    }
}

impl fmt::Display for PosSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (word, tag)) in self.words.iter().zip(&self.tags).enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}_{}", word, tag)?;
        }
        Ok(())
    }
}

/// A restartable stream of training samples.
///
/// A stream may be scanned several times: every full scan but the last must be
/// followed by [`reset`](SampleStream::reset). It is released with
/// [`close`](SampleStream::close) once its owner is done with it.
pub trait SampleStream {
    /// Read the next sample, `None` once the stream is exhausted
    fn read(&mut self) -> io::Result<Option<PosSample>>;

    /// Rewind to the first sample
    fn reset(&mut self) -> io::Result<()>;

    /// Release the underlying resources
    fn close(&mut self) -> io::Result<()>;
}

impl<S: SampleStream + ?Sized> SampleStream for Box<S> {
    fn read(&mut self) -> io::Result<Option<PosSample>> {
        (**self).read()
    }

    fn reset(&mut self) -> io::Result<()> {
        (**self).reset()
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

fn closed_stream() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "sample stream is closed")
}

/// Samples held in memory behind an explicit cursor
#[derive(Debug, Clone, Default)]
pub struct MemorySampleStream {
    samples: Vec<PosSample>,
    cursor: usize,
    closed: bool,
}

impl MemorySampleStream {
    pub fn new(samples: Vec<PosSample>) -> Self {
        Self {
            samples,
            cursor: 0,
            closed: false,
        }
    }

    /// Position of the next sample to be read
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.samples.len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl SampleStream for MemorySampleStream {
    fn read(&mut self) -> io::Result<Option<PosSample>> {
        if self.closed {
            return Err(closed_stream());
        }
        let sample = self.samples.get(self.cursor).cloned();
        if sample.is_some() {
            self.cursor += 1;
        }
        Ok(sample)
    }

    fn reset(&mut self) -> io::Result<()> {
        if self.closed {
            return Err(closed_stream());
        }
        self.cursor = 0;
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.closed = true;
        Ok(())
    }
}

/// Samples read from a text file, one sentence per line
#[derive(Debug)]
pub struct FileSampleStream {
    path: PathBuf,
    reader: Option<BufReader<File>>,
    line_no: usize,
    buf: String,
}

impl FileSampleStream {
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        Ok(Self {
            path,
            reader: Some(BufReader::new(file)),
            line_no: 0,
            buf: String::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SampleStream for FileSampleStream {
    fn read(&mut self) -> io::Result<Option<PosSample>> {
        let reader = self.reader.as_mut().ok_or_else(closed_stream)?;
        loop {
            self.buf.clear();
            if reader.read_line(&mut self.buf)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            let line = self.buf.trim();
            if line.is_empty() {
                continue;
            }
            return line.parse::<PosSample>().map(Some).map_err(|e| {
                io::Error::new(
                    e.kind(),
                    format!("{}:{}: {}", self.path.display(), self.line_no, e),
                )
            });
        }
    }

    fn reset(&mut self) -> io::Result<()> {
        let reader = self.reader.as_mut().ok_or_else(closed_stream)?;
        reader.seek(SeekFrom::Start(0))?;
        self.line_no = 0;
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.reader = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_sample() {
        let sample: PosSample = "The_DT dog_NN barks_VBZ ._.".parse().unwrap();
        assert_eq!(sample.words(), ["The", "dog", "barks", "."]);
        assert_eq!(sample.tags(), ["DT", "NN", "VBZ", "."]);
        assert_eq!(sample.to_string(), "The_DT dog_NN barks_VBZ ._.");
    }

    #[test]
    fn test_parse_uses_last_separator() {
        let sample: PosSample = "New_York_NNP".parse().unwrap();
        assert_eq!(sample.words(), ["New_York"]);
        assert_eq!(sample.tags(), ["NNP"]);
    }

    #[test]
    fn test_parse_rejects_untagged_token() {
        let err = "The_DT dog".parse::<PosSample>().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(err.to_string().contains("dog"));
    }

    #[test]
    fn test_sample_length_mismatch() {
        let err = PosSample::new(vec!["a", "b"], vec!["X"]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_memory_stream_reset_and_close() {
        let samples = vec![
            "a_X".parse().unwrap(),
            "b_Y".parse::<PosSample>().unwrap(),
        ];
        let mut stream = MemorySampleStream::new(samples);
        assert!(stream.read().unwrap().is_some());
        assert!(stream.read().unwrap().is_some());
        assert!(stream.read().unwrap().is_none());
        assert!(stream.is_exhausted());

        stream.reset().unwrap();
        assert_eq!(stream.cursor(), 0);
        assert_eq!(stream.read().unwrap().unwrap().words(), ["a"]);

        stream.close().unwrap();
        assert!(stream.is_closed());
        assert!(stream.read().is_err());
        assert!(stream.reset().is_err());
    }

    #[test]
    fn test_file_stream_skips_blank_lines_and_rewinds() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "The_DT cat_NN").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "A_DT dog_NN").unwrap();
        file.flush().unwrap();

        let mut stream = FileSampleStream::open(file.path()).unwrap();
        let mut count = 0;
        while stream.read().unwrap().is_some() {
            count += 1;
        }
        assert_eq!(count, 2);

        stream.reset().unwrap();
        assert_eq!(stream.read().unwrap().unwrap().words(), ["The", "cat"]);
        stream.close().unwrap();
        assert!(stream.read().is_err());
    }

    #[test]
    fn test_file_stream_reports_line_number() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "The_DT cat_NN").unwrap();
        writeln!(file, "broken").unwrap();
        file.flush().unwrap();

        let mut stream = FileSampleStream::open(file.path()).unwrap();
        stream.read().unwrap();
        let err = stream.read().unwrap_err();
        assert!(err.to_string().contains(":2:"));
    }
}
