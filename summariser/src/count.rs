use log::{debug, trace};
use std::borrow::Cow;
use std::io::{BufRead as _, BufReader, Read};
use std::path::Path;

/// How bytes that are not valid UTF-8 are treated while counting.
///
/// Exports collected from a host under test may contain binary noise, so the default is to skip
/// it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Decoding {
    /// Skip byte sequences that are not valid UTF-8 and keep counting.
    #[default]
    Lenient,
    /// Fail on the first byte sequence that is not valid UTF-8.
    Strict,
}

/// Counts the lines of a text file.
///
/// Lines end with `\n`, `\r\n` or a lone `\r`. A final line without a terminator is still
/// counted. This is a structural count: nothing about the content of a line is parsed.
#[derive(Debug, Default)]
pub struct LineCounter {
    pub decoding: Decoding,
}

impl LineCounter {
    pub fn new(decoding: Decoding) -> Self {
        Self { decoding }
    }

    /// Counts the lines read from the given reader.
    pub fn count<R>(&self, reader: R) -> Result<u64, CountError>
    where
        R: Read,
    {
        let mut reader = BufReader::new(reader);
        let mut record = Vec::new();
        let mut lines = 0u64;

        loop {
            record.clear();
            if reader.read_until(b'\n', &mut record)? == 0 {
                break;
            }

            let decoded: Cow<'_, [u8]> = match self.decoding {
                Decoding::Strict => match std::str::from_utf8(&record) {
                    Ok(_) => Cow::Borrowed(&record[..]),
                    Err(e) => {
                        let line = lines + line_breaks(&record[..e.valid_up_to()]) + 1;
                        return Err(CountError::InvalidUtf8 { line });
                    }
                },
                Decoding::Lenient => drop_undecodable(&record),
            };

            lines += line_breaks(&decoded);

            // Only the last record of the input can end without a terminator
            let tail = match decoded.iter().rposition(|b| *b == b'\n' || *b == b'\r') {
                Some(pos) => &decoded[pos + 1..],
                None => &decoded[..],
            };
            if !tail.is_empty() {
                lines += 1;
            }
        }

        Ok(lines)
    }

    /// Counts the lines of the file at `path`, or returns 0 if there is no such file.
    pub fn count_file<P>(&self, path: P) -> Result<u64, CountError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        if !path.exists() {
            debug!("{} does not exist, counting 0 lines", path.display());
            return Ok(0);
        }

        let file = std::fs::File::open(path)?;
        self.count(file)
    }
}

/// Removes byte sequences that are not valid UTF-8, before any line terminators are looked at.
fn drop_undecodable(record: &[u8]) -> Cow<'_, [u8]> {
    if std::str::from_utf8(record).is_ok() {
        return Cow::Borrowed(record);
    }

    let mut decoded = Vec::with_capacity(record.len());
    for chunk in record.utf8_chunks() {
        decoded.extend_from_slice(chunk.valid().as_bytes());
        if !chunk.invalid().is_empty() {
            trace!("Skipping undecodable bytes {:?}", chunk.invalid());
        }
    }
    Cow::Owned(decoded)
}

/// Number of line terminators in `bytes`, treating `\r\n` as one.
fn line_breaks(bytes: &[u8]) -> u64 {
    let mut iter = bytes.iter().peekable();
    let mut breaks = 0;
    while let Some(b) = iter.next() {
        match *b {
            b'\n' => breaks += 1,
            b'\r' if iter.peek() != Some(&&b'\n') => breaks += 1,
            _ => {}
        }
    }
    breaks
}

/// An error type for [`LineCounter::count`].
#[derive(Debug, thiserror::Error)]
pub enum CountError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid UTF-8 on line {line}")]
    InvalidUtf8 { line: u64 },
}
