//! CSV to [`Dataset`] loader with encoding and delimiter auto-detection.
//!
//! The header row names the target lists; every cell below a header is one
//! item of that list. Every row must have as many cells as the header. Blank
//! cells are dropped and at most [`MAX_ROWS`] data rows are kept.
//!
//! Input is comma-delimited unless a [`Delimiter`] says otherwise.

use std::fmt;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::api::logs::log_warning;
use crate::error::{ParseError, ParseResult};
use crate::models::Dataset;

/// Maximum number of data rows (header excluded) loaded from one source.
pub const MAX_ROWS: usize = 50;

/// Result of loading with metadata
#[derive(Debug, Clone)]
pub struct LoadResult {
    /// Column name to item texts
    pub dataset: Dataset,
    /// Detected or used encoding
    pub encoding: String,
    /// Detected or used delimiter
    pub delimiter: char,
    /// Column headers, as found in the source
    pub headers: Vec<String>,
    /// Data rows kept
    pub row_count: usize,
    /// Whether rows beyond [`MAX_ROWS`] were discarded
    pub truncated: bool,
}

/// How the field delimiter is chosen.
///
/// Parsed from `auto`, `tab` or a single character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Delimiter {
    /// Always split on this character.
    Fixed(char),
    /// Pick the most frequent of `, ; \t |` in the header line.
    Detect,
}

impl Default for Delimiter {
    fn default() -> Self {
        Delimiter::Fixed(',')
    }
}

impl Delimiter {
    /// The character to split `content` on.
    pub fn resolve(self, content: &str) -> char {
        match self {
            Delimiter::Fixed(c) => c,
            Delimiter::Detect => detect_delimiter(content),
        }
    }
}

impl FromStr for Delimiter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Delimiter::Detect),
            "tab" | "\\t" => Ok(Delimiter::Fixed('\t')),
            _ => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if c.is_ascii() && c != '"' && c != '\n' && c != '\r' => {
                        Ok(Delimiter::Fixed(c))
                    }
                    _ => Err(format!(
                        "invalid delimiter '{}': expected 'auto', 'tab' or one ASCII character",
                        s
                    )),
                }
            }
        }
    }
}

impl TryFrom<String> for Delimiter {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Delimiter> for String {
    fn from(delimiter: Delimiter) -> Self {
        delimiter.to_string()
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delimiter::Detect => write!(f, "auto"),
            Delimiter::Fixed('\t') => write!(f, "tab"),
            Delimiter::Fixed(c) => write!(f, "{}", c),
        }
    }
}

/// Detect the encoding of raw bytes.
///
/// Valid UTF-8 is taken as such; chardet only guesses for anything else.
pub fn detect_encoding(bytes: &[u8]) -> String {
    if std::str::from_utf8(bytes).is_ok() {
        return "utf-8".to_string();
    }

    let result = chardet::detect(&bytes.to_vec());
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding.
///
/// Unknown encodings fall back to lossy UTF-8.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let decoded = match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::ISO_8859_15.decode(bytes).0.to_string(),
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.to_string(),
        _ => String::from_utf8_lossy(bytes).to_string(),
    };
    match decoded.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => decoded,
    }
}

/// Detect the delimiter by counting occurrences in the header line.
///
/// Falls back to a comma when the header has a single column. Only used
/// for [`Delimiter::Detect`].
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Load CSV from a reader with an explicit delimiter.
///
/// # Example
/// ```ignore
/// use listload::parse_csv;
///
/// let loaded = parse_csv("Fruits,Colors\napple,red\nbanana,".as_bytes(), ',').unwrap();
///
/// assert_eq!(loaded.dataset.get("Fruits").unwrap(), ["apple", "banana"]);
/// assert_eq!(loaded.dataset.get("Colors").unwrap(), ["red"]);
/// ```
pub fn parse_csv<R: Read>(reader: R, delimiter: char) -> ParseResult<LoadResult> {
    let delimiter_byte = u8::try_from(delimiter).map_err(|_| ParseError::Malformed {
        line: 1,
        message: format!("Unsupported delimiter '{}'", delimiter),
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter_byte)
        .has_headers(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| malformed(&e, 1))?
        .iter()
        .map(str::to_string)
        .collect();

    if headers.is_empty() {
        return Err(ParseError::NoHeaders);
    }

    let mut dataset = Dataset::new();
    for header in &headers {
        dataset.add_column(header);
    }

    let mut row_count = 0;
    let mut truncated = false;

    for record in reader.records() {
        let record = record.map_err(|e| malformed(&e, row_count as u64 + 2))?;

        if row_count >= MAX_ROWS {
            truncated = true;
            log_warning(format!(
                "CSV has more than {} data rows. Truncating excess rows.",
                MAX_ROWS
            ));
            break;
        }
        row_count += 1;

        for (header, value) in headers.iter().zip(record.iter()) {
            dataset.push(header, value);
        }
    }

    Ok(LoadResult {
        dataset,
        encoding: "utf-8".to_string(),
        delimiter,
        headers,
        row_count,
        truncated,
    })
}

/// Load comma-delimited CSV text.
///
/// This is the entry point for content received directly rather than from a file.
pub fn parse_str(content: &str) -> ParseResult<LoadResult> {
    parse_str_with(content, Delimiter::default())
}

/// Load CSV text, choosing the delimiter with `delimiter`.
pub fn parse_str_with(content: &str, delimiter: Delimiter) -> ParseResult<LoadResult> {
    if content.is_empty() {
        return Err(ParseError::EmptyInput);
    }
    parse_csv(content.as_bytes(), delimiter.resolve(content))
}

/// Load CSV bytes with auto-detection of the encoding.
pub fn parse_bytes_auto(bytes: &[u8], delimiter: Delimiter) -> ParseResult<LoadResult> {
    if bytes.is_empty() {
        return Err(ParseError::EmptyInput);
    }

    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);

    let mut result = parse_str_with(&content, delimiter)?;
    result.encoding = encoding;
    Ok(result)
}

/// Load a CSV file with auto-detection of the encoding.
pub fn parse_csv_file_auto<P: AsRef<Path>>(path: P, delimiter: Delimiter) -> ParseResult<LoadResult> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes_auto(&bytes, delimiter)
}

fn malformed(err: &csv::Error, fallback_line: u64) -> ParseError {
    ParseError::Malformed {
        line: err.position().map(|p| p.line()).unwrap_or(fallback_line),
        message: err.to_string(),
    }
}
