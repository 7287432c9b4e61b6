//! Training and test record streams.
//!
//! A training file holds one `<documentKey> <label>` pair per line with the
//! label `1` (relevant) or `0` (irrelevant); a test file holds one
//! `<documentKey>` per line. Blank lines are ignored.
//!
//! Sources are restartable: every call to [`RecordSource::records`] yields the
//! stream from its beginning, which lets feature selection and model
//! estimation each make their own pass over the training data.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TextCatError};

/// Binary class label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    /// Label `0`.
    Irrelevant,
    /// Label `1`.
    Relevant,
}

impl Label {
    /// Parse a label token.
    pub fn parse(token: &str) -> Result<Self> {
        match token {
            "1" => Ok(Label::Relevant),
            "0" => Ok(Label::Irrelevant),
            other => Err(TextCatError::InvalidLabel(other.to_string())),
        }
    }

    /// Check if this is the relevant class.
    pub fn is_relevant(self) -> bool {
        self == Label::Relevant
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Relevant => write!(f, "1"),
            Label::Irrelevant => write!(f, "0"),
        }
    }
}

/// A labeled training document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingRecord {
    /// External document key.
    pub key: String,
    /// Class label.
    pub label: Label,
}

impl TrainingRecord {
    /// Create a new training record.
    pub fn new<S: Into<String>>(key: S, label: Label) -> Self {
        TrainingRecord {
            key: key.into(),
            label,
        }
    }
}

/// An unlabeled test document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRecord {
    /// External document key.
    pub key: String,
}

impl TestRecord {
    /// Create a new test record.
    pub fn new<S: Into<String>>(key: S) -> Self {
        TestRecord { key: key.into() }
    }
}

/// A record that can be parsed from one non-blank line of a record file.
pub trait Record: Sized + Send {
    /// Parse a line. `line_no` is 1-based and used for error reporting.
    fn parse_line(line: &str, line_no: usize) -> Result<Self>;
}

impl Record for TrainingRecord {
    fn parse_line(line: &str, line_no: usize) -> Result<Self> {
        let mut fields = line.split_whitespace();
        let key = fields
            .next()
            .ok_or_else(|| TextCatError::parse(line_no, "missing document key"))?;
        let label = fields
            .next()
            .ok_or_else(|| TextCatError::parse(line_no, "missing label"))?;
        if fields.next().is_some() {
            return Err(TextCatError::parse(
                line_no,
                "expected `<documentKey> <label>`",
            ));
        }

        let label = Label::parse(label)
            .map_err(|e| TextCatError::parse(line_no, e.to_string()))?;
        Ok(TrainingRecord::new(key, label))
    }
}

impl Record for TestRecord {
    fn parse_line(line: &str, line_no: usize) -> Result<Self> {
        let mut fields = line.split_whitespace();
        let key = fields
            .next()
            .ok_or_else(|| TextCatError::parse(line_no, "missing document key"))?;
        if fields.next().is_some() {
            return Err(TextCatError::parse(line_no, "expected `<documentKey>`"));
        }
        Ok(TestRecord::new(key))
    }
}

/// Lazy, finite stream of records.
pub type RecordIter<'a, R> = Box<dyn Iterator<Item = Result<R>> + 'a>;

/// A restartable source of records.
pub trait RecordSource<R> {
    /// Open the stream from its beginning.
    fn records(&self) -> Result<RecordIter<'_, R>>;
}

impl<R: Clone + 'static> RecordSource<R> for [R] {
    fn records(&self) -> Result<RecordIter<'_, R>> {
        Ok(Box::new(self.iter().cloned().map(Ok)))
    }
}

impl<R: Clone + 'static> RecordSource<R> for Vec<R> {
    fn records(&self) -> Result<RecordIter<'_, R>> {
        self.as_slice().records()
    }
}

/// A record file on disk, re-opened for every pass.
#[derive(Debug, Clone)]
pub struct RecordFile<R> {
    path: PathBuf,
    _marker: PhantomData<fn() -> R>,
}

/// File of `<documentKey> <label>` lines.
pub type TrainingFile = RecordFile<TrainingRecord>;

/// File of `<documentKey>` lines.
pub type TestFile = RecordFile<TestRecord>;

impl<R: Record> RecordFile<R> {
    /// Create a source over the file at `path` without touching the file.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        RecordFile {
            path: path.as_ref().to_path_buf(),
            _marker: PhantomData,
        }
    }

    /// Create a source and check that the file can be opened now.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let source = Self::new(path);
        File::open(&source.path).map_err(|e| {
            TextCatError::config(format!("Can't open {}: {e}", source.path.display()))
        })?;
        Ok(source)
    }

    /// Path of the underlying file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<R: Record + 'static> RecordSource<R> for RecordFile<R> {
    fn records(&self) -> Result<RecordIter<'_, R>> {
        let reader = BufReader::new(File::open(&self.path)?);
        let iter = reader
            .lines()
            .enumerate()
            .filter_map(|(idx, line)| match line {
                Ok(line) if line.trim().is_empty() => None,
                Ok(line) => Some(R::parse_line(&line, idx + 1)),
                Err(e) => Some(Err(e.into())),
            });
        Ok(Box::new(iter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_training_line() {
        let record = TrainingRecord::parse_line("spam-001 1", 1).unwrap();
        assert_eq!(record, TrainingRecord::new("spam-001", Label::Relevant));

        let record = TrainingRecord::parse_line("  ham-7\t0  ", 2).unwrap();
        assert_eq!(record, TrainingRecord::new("ham-7", Label::Irrelevant));
    }

    #[test]
    fn test_parse_training_line_errors() {
        assert!(matches!(
            TrainingRecord::parse_line("doc", 4),
            Err(TextCatError::Parse { line: 4, .. })
        ));
        assert!(matches!(
            TrainingRecord::parse_line("doc 2", 5),
            Err(TextCatError::Parse { line: 5, .. })
        ));
        assert!(matches!(
            TrainingRecord::parse_line("doc 1 extra", 6),
            Err(TextCatError::Parse { line: 6, .. })
        ));
    }

    #[test]
    fn test_parse_test_line() {
        assert_eq!(
            TestRecord::parse_line("d3", 1).unwrap(),
            TestRecord::new("d3")
        );
        assert!(TestRecord::parse_line("d3 1", 1).is_err());
    }

    #[test]
    fn test_record_file_is_restartable() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "d1 1").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "d2 0").unwrap();
        file.flush().unwrap();

        let source = TrainingFile::open(file.path()).unwrap();
        for _ in 0..2 {
            let records: Vec<_> = source
                .records()
                .unwrap()
                .collect::<Result<Vec<_>>>()
                .unwrap();
            assert_eq!(
                records,
                vec![
                    TrainingRecord::new("d1", Label::Relevant),
                    TrainingRecord::new("d2", Label::Irrelevant),
                ]
            );
        }
    }

    #[test]
    fn test_record_file_reports_line_number() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "d1 1").unwrap();
        writeln!(file, "d2 yes").unwrap();
        file.flush().unwrap();

        let source = TrainingFile::open(file.path()).unwrap();
        let result: Result<Vec<_>> = source.records().unwrap().collect();
        assert!(matches!(result, Err(TextCatError::Parse { line: 2, .. })));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            TestFile::open("/nonexistent/textcat/test.txt"),
            Err(TextCatError::Config(_))
        ));
    }
}
