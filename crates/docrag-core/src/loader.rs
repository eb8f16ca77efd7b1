//! Turns `.txt`, `.pdf` and `.json` files into chunks.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::chunker::TextSplitter;
use crate::error::{Error, Result};
use crate::types::{DocumentChunk, Metadata, PAGE_KEY, SOURCE_KEY};

pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["txt", "pdf", "json"];

/// Pulls the text to embed out of a parsed JSON document.
pub type JsonContentFn = fn(&Value) -> String;

/// Uses the `content` field of an object verbatim, otherwise the whole value
/// serialised to compact JSON.
pub fn default_json_content(value: &Value) -> String {
    match value {
        Value::Object(map) => match map.get("content") {
            Some(Value::String(content)) => content.clone(),
            Some(content) => content.to_string(),
            None => value.to_string(),
        },
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Text,
    Pdf,
    Json,
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "txt" => Some(Self::Text),
            "pdf" => Some(Self::Pdf),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of walking a directory: what was loaded and what was passed over.
#[derive(Debug, Default)]
pub struct DirectoryScan {
    pub chunks: Vec<DocumentChunk>,
    pub loaded: Vec<PathBuf>,
    pub skipped: Vec<SkippedFile>,
}

pub struct DocumentLoader {
    splitter: TextSplitter,
    json_content: JsonContentFn,
}

impl DocumentLoader {
    pub fn new(splitter: TextSplitter) -> Self {
        Self { splitter, json_content: default_json_content }
    }

    pub fn with_json_content(mut self, json_content: JsonContentFn) -> Self {
        self.json_content = json_content;
        self
    }

    pub fn splitter(&self) -> &TextSplitter { &self.splitter }

    pub fn load(&self, path: &Path) -> Result<Vec<DocumentChunk>> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let format = DocumentFormat::from_path(path).ok_or_else(|| Error::UnsupportedFormat {
            path: path.to_path_buf(),
            extension: path
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
                .unwrap_or_default(),
        })?;
        let mut base = Metadata::new();
        base.insert(SOURCE_KEY.to_string(), Value::String(path.to_string_lossy().to_string()));

        let mut chunks = Vec::new();
        match format {
            DocumentFormat::Text => {
                let text = read_utf8(path)?;
                self.push_chunks(&text, &base, &mut chunks);
            }
            DocumentFormat::Pdf => self.load_pdf(path, &base, &mut chunks)?,
            DocumentFormat::Json => {
                let raw = read_utf8(path)?;
                let value: Value = serde_json::from_str(&raw).map_err(|e| Error::parse(path, e))?;
                let content = (self.json_content)(&value);
                self.push_chunks(&content, &base, &mut chunks);
            }
        }
        debug!(path = %path.display(), chunks = chunks.len(), "loaded document");
        Ok(chunks)
    }

    /// Chunks of every supported file under `dir`. Files that fail to load are
    /// logged and skipped.
    pub fn process_directory(&self, dir: &Path) -> Result<Vec<DocumentChunk>> {
        Ok(self.scan_directory(dir)?.chunks)
    }

    pub fn scan_directory(&self, dir: &Path) -> Result<DirectoryScan> {
        if !dir.exists() {
            return Err(Error::FileNotFound(dir.to_path_buf()));
        }
        if !dir.is_dir() {
            return Err(Error::InvalidArgument(format!("{} is not a directory", dir.display())));
        }
        let mut scan = DirectoryScan::default();
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "cannot read directory entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if DocumentFormat::from_path(path).is_none() {
                warn!(path = %path.display(), "skipping unsupported file");
                scan.skipped.push(SkippedFile { path: path.to_path_buf(), reason: "unsupported file type".into() });
                continue;
            }
            match self.load(path) {
                Ok(chunks) => {
                    info!(path = %path.display(), chunks = chunks.len(), "processed file");
                    scan.loaded.push(path.to_path_buf());
                    scan.chunks.extend(chunks);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping file that failed to load");
                    scan.skipped.push(SkippedFile { path: path.to_path_buf(), reason: e.to_string() });
                }
            }
        }
        info!(
            dir = %dir.display(),
            files = scan.loaded.len(),
            skipped = scan.skipped.len(),
            chunks = scan.chunks.len(),
            "directory processed"
        );
        Ok(scan)
    }

    fn load_pdf(&self, path: &Path, base: &Metadata, out: &mut Vec<DocumentChunk>) -> Result<()> {
        let doc = lopdf::Document::load(path).map_err(|e| Error::parse(path, e))?;
        for page in doc.get_pages().into_keys() {
            let text = match doc.extract_text(&[page]) {
                Ok(text) => text,
                Err(e) => {
                    warn!(path = %path.display(), page, error = %e, "cannot extract page text");
                    continue;
                }
            };
            // lopdf counts pages from 1; stored page numbers start at 0
            let mut meta = base.clone();
            meta.insert(PAGE_KEY.to_string(), Value::from(page.saturating_sub(1)));
            self.push_chunks(&text, &meta, out);
        }
        Ok(())
    }

    fn push_chunks(&self, text: &str, meta: &Metadata, out: &mut Vec<DocumentChunk>) {
        for piece in self.splitter.split(text) {
            if piece.trim().is_empty() {
                continue;
            }
            out.push(DocumentChunk { text: piece, metadata: meta.clone() });
        }
    }
}

fn read_utf8(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => Error::FileNotFound(path.to_path_buf()),
        _ => Error::Io(e),
    })?;
    String::from_utf8(bytes).map_err(|e| Error::parse(path, e))
}
