use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::warn;

use crate::types::{FieldValue, RawRecord};

/// In-memory id → title lookup built from a collection's publication
/// file. Loaded once per indexing run and shared read-only afterwards.
///
/// Duplicate ids are accepted silently; the last occurrence wins.
#[derive(Debug, Default)]
pub struct TitleCatalog {
    titles: HashMap<String, Option<String>>,
}

impl TitleCatalog {
    /// Stream `publication_file` once and build the mapping. Malformed
    /// lines follow the same skip-and-log policy as corpus conversion.
    pub fn load(publication_file: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(publication_file).with_context(|| {
            format!(
                "cannot read publication file {}",
                publication_file.display()
            )
        })?);

        let mut titles = HashMap::new();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line
                .with_context(|| format!("read failed on {}", publication_file.display()))?;
            let raw: RawRecord = match serde_json::from_str(&line) {
                Ok(raw) => raw,
                Err(err) => {
                    warn!(
                        file = %publication_file.display(),
                        line = line_no + 1,
                        %err,
                        "skipping malformed publication record"
                    );
                    continue;
                }
            };
            let Some(id) = raw.id else {
                warn!(
                    file = %publication_file.display(),
                    line = line_no + 1,
                    "skipping publication record without id"
                );
                continue;
            };
            titles.insert(id, raw.title.as_ref().and_then(usable_title));
        }
        Ok(Self { titles })
    }

    /// The usable title for `id`, if the id is known and carries one.
    pub fn title(&self, id: &str) -> Option<&str> {
        self.titles.get(id).and_then(|t| t.as_deref())
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }
}

/// First-element rule for titles. Absent, null, empty-list, and blank
/// values all mean "no usable title": such ids stay known to the catalog
/// but never produce a query.
fn usable_title(value: &FieldValue) -> Option<String> {
    let first = value.first_or_empty();
    if first.trim().is_empty() {
        None
    } else {
        Some(first.to_string())
    }
}
