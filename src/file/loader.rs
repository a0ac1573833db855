//! Document loading from files or stdin.
//!
//! The format comes from an explicit choice, else the file name, else the
//! content itself. Gzip input is decompressed transparently.

use crate::document::node::DocumentFormat;
use crate::document::parser::{detect_format, parse_document, parse_jsonl};
use crate::document::Document;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Loads and parses a document from the filesystem.
///
/// `format` overrides detection. Otherwise the extension decides (`.json`,
/// `.jsonl`, `.ndjson`, `.yaml`, `.yml`, `.xml`, each optionally followed by
/// `.gz`), and files with any other name are sniffed.
///
/// # Examples
///
/// ```no_run
/// use pathquill::file::loader::load_document_file;
///
/// let doc = load_document_file("catalog.xml.gz", None).unwrap();
/// let result = doc.query("//book/@id");
/// ```
///
/// # Errors
///
/// This function will return an error if:
/// - The file path does not exist or cannot be read
/// - A `.gz` file is not valid gzip
/// - The contents are not valid in the chosen format
pub fn load_document_file<P: AsRef<Path>>(
    path: P,
    format: Option<DocumentFormat>,
) -> Result<Document> {
    let path_ref = path.as_ref();

    let is_gzipped = path_ref
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext == "gz")
        .unwrap_or(false);

    let content = if is_gzipped {
        read_gzipped_file(path_ref)?
    } else {
        fs::read_to_string(path_ref)
            .with_context(|| format!("Failed to read file {}", path_ref.display()))?
    };

    if format.is_none() && is_jsonl_name(path_ref) {
        return parse_jsonl(&content);
    }

    let format = format
        .or_else(|| format_from_name(path_ref))
        .unwrap_or_else(|| detect_format(&content));
    debug!(path = %path_ref.display(), %format, gzipped = is_gzipped, "loading document");

    parse_document(&content, format)
        .with_context(|| format!("Failed to load {}", path_ref.display()))
}

/// Loads and parses a document from standard input.
///
/// Gzip data is recognized by its magic bytes. Without an explicit format the
/// content is sniffed; JSON that fails to parse as a single value is retried
/// as newline-delimited JSON.
///
/// # Examples
///
/// ```no_run
/// use pathquill::file::loader::load_document_from_stdin;
///
/// // Usage: echo '{"key": "value"}' | pathquill '$.key'
/// let doc = load_document_from_stdin(None).unwrap();
/// ```
pub fn load_document_from_stdin(format: Option<DocumentFormat>) -> Result<Document> {
    use std::io::{self, Read};

    let mut buffer = Vec::new();
    io::stdin()
        .read_to_end(&mut buffer)
        .context("Failed to read from stdin")?;

    parse_bytes(buffer, format).context("Failed to parse document from stdin")
}

/// Decodes raw input bytes (gzip or plain UTF-8) into a document.
pub fn parse_bytes(bytes: Vec<u8>, format: Option<DocumentFormat>) -> Result<Document> {
    // Check for gzip magic bytes (0x1f 0x8b)
    let content = if bytes.starts_with(&[0x1f, 0x8b]) {
        decompress_gzip_bytes(&bytes)?
    } else {
        String::from_utf8(bytes).context("Invalid UTF-8 in input")?
    };

    if let Some(format) = format {
        return parse_document(&content, format);
    }

    match detect_format(&content) {
        DocumentFormat::Json => parse_document(&content, DocumentFormat::Json).or_else(|err| {
            parse_jsonl(&content).map_err(|_| err)
        }),
        format => parse_document(&content, format),
    }
}

/// File name with a trailing `.gz` removed.
fn base_name(path: &Path) -> String {
    let name = path.to_string_lossy();
    match name.strip_suffix(".gz") {
        Some(stripped) => stripped.to_string(),
        None => name.into_owned(),
    }
}

/// Format implied by the extension, looking through a `.gz` suffix.
///
/// - `data.xml` → XML
/// - `data.yml.gz` → YAML
/// - `data.txt` → none
fn format_from_name(path: &Path) -> Option<DocumentFormat> {
    let base = base_name(path);
    let ext = Path::new(&base).extension()?.to_str()?;
    DocumentFormat::from_extension(ext)
}

fn is_jsonl_name(path: &Path) -> bool {
    let base = base_name(path);
    base.ends_with(".jsonl") || base.ends_with(".ndjson")
}

/// Reads and decompresses a gzipped file.
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be opened
/// - The file is not valid gzip format (corrupted)
/// - The decompressed content is not valid UTF-8
fn read_gzipped_file<P: AsRef<Path>>(path: P) -> Result<String> {
    use flate2::read::GzDecoder;
    use std::io::Read;

    let file = fs::File::open(path).context("Failed to open gzipped file")?;
    let mut decoder = GzDecoder::new(file);
    let mut content = String::new();
    decoder
        .read_to_string(&mut content)
        .context("Failed to decompress gzipped file - file may be corrupted")?;
    Ok(content)
}

fn decompress_gzip_bytes(bytes: &[u8]) -> Result<String> {
    use flate2::read::GzDecoder;
    use std::io::Read;

    let mut decoder = GzDecoder::new(bytes);
    let mut content = String::new();
    decoder
        .read_to_string(&mut content)
        .context("Failed to decompress gzipped input")?;
    Ok(content)
}
