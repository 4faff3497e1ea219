// ---------------------------------------------------------------------------
// Catalog file loading -- CSV to raw rows
// ---------------------------------------------------------------------------
//
// The core consumes already-parsed rows; this is the external loading step
// that produces them from a UTF-8 CSV file with a header line. Supports
// quoted fields (embedded commas, doubled quotes, embedded newlines) and
// CRLF line endings. Blank cells come through as empty strings, which the
// CatalogStore treats as missing so its defaults apply.
// ---------------------------------------------------------------------------

use std::fs;
use std::path::Path;

use crate::catalog::RawRow;
use crate::error::EngineError;

/// Read and parse a catalog CSV file.
pub fn load_csv(path: &Path) -> Result<Vec<RawRow>, EngineError> {
	let text = fs::read_to_string(path)?;
	parse_csv(&text)
}

/// Parse CSV text into rows keyed by the header line.
///
/// Rows shorter than the header simply omit the trailing columns; rows
/// longer than the header drop the extras. Fully blank records are
/// skipped. An unterminated quote fails the parse.
pub fn parse_csv(text: &str) -> Result<Vec<RawRow>, EngineError> {
	let text = text.strip_prefix('\u{feff}').unwrap_or(text);
	let mut records = split_records(text)?;
	if records.is_empty() {
		return Ok(Vec::new());
	}

	let header: Vec<String> = records
		.remove(0)
		.into_iter()
		.map(|h| h.trim().to_string())
		.collect();

	let mut rows = Vec::with_capacity(records.len());
	for record in records {
		if record.iter().all(|field| field.trim().is_empty()) {
			continue;
		}
		let row: RawRow = header
			.iter()
			.zip(record)
			.map(|(column, value)| (column.clone(), value))
			.collect();
		rows.push(row);
	}
	Ok(rows)
}

/// Split CSV text into records of fields, honoring quoting.
fn split_records(text: &str) -> Result<Vec<Vec<String>>, EngineError> {
	let mut records: Vec<Vec<String>> = Vec::new();
	let mut record: Vec<String> = Vec::new();
	let mut field = String::new();
	let mut in_quotes = false;

	let mut chars = text.chars().peekable();
	while let Some(c) = chars.next() {
		if in_quotes {
			match c {
				'"' => {
					if chars.peek() == Some(&'"') {
						chars.next();
						field.push('"');
					} else {
						in_quotes = false;
					}
				}
				_ => field.push(c),
			}
			continue;
		}

		match c {
			'"' => in_quotes = true,
			',' => {
				record.push(std::mem::take(&mut field));
			}
			'\r' => {
				if chars.peek() == Some(&'\n') {
					chars.next();
				}
				record.push(std::mem::take(&mut field));
				records.push(std::mem::take(&mut record));
			}
			'\n' => {
				record.push(std::mem::take(&mut field));
				records.push(std::mem::take(&mut record));
			}
			_ => field.push(c),
		}
	}

	if in_quotes {
		return Err(EngineError::Serialization(
			"unterminated quoted field in CSV input".to_string(),
		));
	}
	if !field.is_empty() || !record.is_empty() {
		record.push(field);
		records.push(record);
	}

	// A trailing newline leaves no dangling record; an all-empty record
	// (blank line) is dropped here rather than downstream.
	records.retain(|r| !(r.len() == 1 && r[0].is_empty()));
	Ok(records)
}
