//! Line-oriented corpus reading.
//!
//! The corpus is read as raw bytes, one candidate per line. Lines that do
//! not decode in the selected encoding are skipped and tallied; the count
//! surfaces in the trainer's final status line. Decoding problems never
//! abort a training run.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use crate::error::{Result, TrainError};

/// Reads passwords from a corpus, counting undecodable lines.
pub struct PasswordReader<R> {
    inner: BufReader<R>,
    buf: Vec<u8>,
    encoding_errors: u64,
}

impl PasswordReader<File> {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| TrainError::CorpusOpen {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_reader(file))
    }
}

impl<R: Read> PasswordReader<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            inner: BufReader::new(reader),
            buf: Vec::new(),
            encoding_errors: 0,
        }
    }

    /// Next decodable line, with the trailing newline stripped.
    ///
    /// Returns `Ok(None)` at end of input. Undecodable lines are skipped
    /// and counted, so a call only fails on a real I/O error.
    pub fn next_password(&mut self) -> io::Result<Option<String>> {
        loop {
            self.buf.clear();
            let read = self.inner.read_until(b'\n', &mut self.buf)?;
            if read == 0 {
                return Ok(None);
            }
            while matches!(self.buf.last(), Some(b'\n') | Some(b'\r')) {
                self.buf.pop();
            }
            match std::str::from_utf8(&self.buf) {
                Ok(line) => return Ok(Some(line.to_string())),
                Err(_) => self.encoding_errors += 1,
            }
        }
    }

    /// Lines skipped so far because they did not decode.
    pub fn encoding_errors(&self) -> u64 {
        self.encoding_errors
    }
}

/// Encoding autodetection seam.
///
/// The real detector is an external collaborator; this implementation
/// confirms the corpus is readable and suggests UTF-8, which also covers
/// plain ASCII corpora. Callers take the first suggestion.
pub fn detect_file_encoding(path: &Path) -> Result<Vec<String>> {
    File::open(path).map_err(|source| TrainError::CorpusOpen {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(vec!["utf-8".to_string()])
}

/// Rejects encodings this build cannot decode.
pub fn check_encoding(encoding: &str) -> Result<()> {
    match encoding.to_ascii_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" | "us-ascii" => Ok(()),
        _ => Err(TrainError::UnsupportedEncoding(encoding.to_string())),
    }
}
