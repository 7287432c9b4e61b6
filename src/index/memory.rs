//! In-memory document index, optionally backed by a JSON index file.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TextCatError};
use crate::index::{DocId, DocumentIndex, Posting, TermId};

/// On-disk layout of an index file.
#[derive(Debug, Serialize, Deserialize)]
struct IndexFile {
    vocabulary_size: TermId,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    terms: Vec<String>,
    documents: Vec<DocumentEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct DocumentEntry {
    key: String,
    postings: Vec<(TermId, u32)>,
}

/// A document index held entirely in memory.
#[derive(Debug, Clone)]
pub struct MemoryIndex {
    vocabulary_size: TermId,
    /// Term text by term id; may be empty or shorter than the vocabulary.
    terms: Vec<String>,
    keys: Vec<String>,
    postings: Vec<Vec<Posting>>,
    key_to_id: HashMap<String, DocId>,
}

impl MemoryIndex {
    /// Start building an index over the vocabulary `[0, vocabulary_size]`.
    pub fn builder(vocabulary_size: TermId) -> MemoryIndexBuilder {
        MemoryIndexBuilder::new(vocabulary_size)
    }

    /// Load an index from a JSON index file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            TextCatError::index(format!("Can't open index {}: {e}", path.display()))
        })?;
        let index_file: IndexFile = serde_json::from_reader(BufReader::new(file))?;

        let mut builder = MemoryIndexBuilder::new(index_file.vocabulary_size);
        builder.terms = index_file.terms;
        for entry in index_file.documents {
            builder.add_document(entry.key, entry.postings)?;
        }

        let index = builder.build();
        log::debug!(
            "Loaded index {}: {} documents, vocabulary size {}",
            path.display(),
            index.doc_count(),
            index.vocabulary_size
        );
        Ok(index)
    }

    /// Write this index as a JSON index file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let index_file = IndexFile {
            vocabulary_size: self.vocabulary_size,
            terms: self.terms.clone(),
            documents: self
                .keys
                .iter()
                .zip(&self.postings)
                .map(|(key, postings)| DocumentEntry {
                    key: key.clone(),
                    postings: postings.iter().map(|p| (p.term_id, p.freq)).collect(),
                })
                .collect(),
        };

        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, &index_file)?;
        writer.flush()?;
        Ok(())
    }

    /// Number of documents in the index.
    pub fn doc_count(&self) -> usize {
        self.keys.len()
    }
}

impl DocumentIndex for MemoryIndex {
    fn resolve(&self, key: &str) -> Result<DocId> {
        self.key_to_id
            .get(key)
            .copied()
            .ok_or_else(|| TextCatError::document_not_found(key))
    }

    fn postings(&self, doc_id: DocId) -> Result<Vec<Posting>> {
        self.postings
            .get(doc_id as usize)
            .cloned()
            .ok_or_else(|| TextCatError::document_not_found(format!("#{doc_id}")))
    }

    fn vocabulary_size(&self) -> TermId {
        self.vocabulary_size
    }

    fn document_key(&self, doc_id: DocId) -> Option<&str> {
        self.keys.get(doc_id as usize).map(String::as_str)
    }

    fn term_text(&self, term_id: TermId) -> Option<&str> {
        self.terms
            .get(term_id as usize)
            .map(String::as_str)
            .filter(|text| !text.is_empty())
    }
}

/// Builder for [`MemoryIndex`].
#[derive(Debug, Clone)]
pub struct MemoryIndexBuilder {
    vocabulary_size: TermId,
    terms: Vec<String>,
    keys: Vec<String>,
    postings: Vec<Vec<Posting>>,
    key_to_id: HashMap<String, DocId>,
}

impl MemoryIndexBuilder {
    /// Create a builder over the vocabulary `[0, vocabulary_size]`.
    pub fn new(vocabulary_size: TermId) -> Self {
        MemoryIndexBuilder {
            vocabulary_size,
            terms: Vec::new(),
            keys: Vec::new(),
            postings: Vec::new(),
            key_to_id: HashMap::new(),
        }
    }

    /// Attach term text, indexed by term id.
    pub fn terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.terms = terms.into_iter().map(Into::into).collect();
        self
    }

    /// Add a document and return its id.
    ///
    /// Postings are stored as given; term ids are validated by the consumers.
    pub fn add_document<K, I>(&mut self, key: K, postings: I) -> Result<DocId>
    where
        K: Into<String>,
        I: IntoIterator<Item = (TermId, u32)>,
    {
        let key = key.into();
        if self.key_to_id.contains_key(&key) {
            return Err(TextCatError::index(format!("Duplicate document key: {key}")));
        }

        let doc_id = self.keys.len() as DocId;
        self.key_to_id.insert(key.clone(), doc_id);
        self.keys.push(key);
        self.postings.push(postings.into_iter().map(Posting::from).collect());
        Ok(doc_id)
    }

    /// Add a document, consuming and returning the builder.
    pub fn document<K, I>(mut self, key: K, postings: I) -> Result<Self>
    where
        K: Into<String>,
        I: IntoIterator<Item = (TermId, u32)>,
    {
        self.add_document(key, postings)?;
        Ok(self)
    }

    /// Finish building.
    pub fn build(self) -> MemoryIndex {
        MemoryIndex {
            vocabulary_size: self.vocabulary_size,
            terms: self.terms,
            keys: self.keys,
            postings: self.postings,
            key_to_id: self.key_to_id,
        }
    }
}
