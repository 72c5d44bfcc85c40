//! MEDLINE record model and the tagged-field text parser.
//!
//! PubMed's `rettype=medline` export is line oriented:
//!
//! ```text
//! PMID- 12345678
//! TI  - A title that is long enough to
//!       wrap onto a second line.
//! AU  - Smith J
//! AU  - Doe A
//! ```
//!
//! The tag occupies the first four columns (space padded), followed by `- `
//! and the value. Lines starting with six spaces continue the previous tag and
//! blank lines separate records.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Width of the `TAG - ` prefix on every field line.
const VALUE_OFFSET: usize = 6;

/// Width of the tag column.
const TAG_WIDTH: usize = 4;

/// Tags whose values are collapsed into a single space-joined string.
const TEXT_TAGS: &[&str] = &[
    "ID", "PMID", "SO", "RF", "NI", "JC", "TA", "IS", "CY", "TT", "CA", "IP", "VI", "DP", "YR",
    "PG", "LID", "DA", "LR", "OWN", "STAT", "DCOM", "PUBM", "DEP", "PL", "JID", "SB", "PMC",
    "EDAT", "MHDA", "PST", "AB", "AD", "EA", "TI", "JT",
];

/// Tags where a continuation line extends the previous entry instead of adding one.
const GLUED_TAGS: &[&str] = &["MH", "AD"];

/// Value of a single MEDLINE field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Free-text field (title, abstract, journal, ...)
    Text(String),
    /// Repeatable field (authors, MeSH terms, publication types, ...)
    List(Vec<String>),
}

impl FieldValue {
    /// The value as one string; list entries are joined with `"; "`
    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Text(text) => text.clone(),
            FieldValue::List(values) => values.join("; "),
        }
    }

    /// The value as individual entries
    pub fn as_list(&self) -> Vec<&str> {
        match self {
            FieldValue::Text(text) => vec![text.as_str()],
            FieldValue::List(values) => values.iter().map(String::as_str).collect(),
        }
    }
}

/// A parsed MEDLINE citation: field tag to value.
///
/// No schema is imposed; every tag found in the payload is kept as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MedlineRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl MedlineRecord {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the first record of a MEDLINE payload.
    ///
    /// A payload without any field lines produces an empty record.
    pub fn parse(text: &str) -> Self {
        let mut records = parse_records(text);
        if records.len() > 1 {
            tracing::debug!(
                "MEDLINE payload held {} records, keeping the first",
                records.len()
            );
        }
        if records.is_empty() {
            Self::default()
        } else {
            records.swap_remove(0)
        }
    }

    /// Look up a field by tag
    pub fn get(&self, tag: &str) -> Option<&FieldValue> {
        self.fields.get(tag)
    }

    /// Field value as a single string
    pub fn text(&self, tag: &str) -> Option<String> {
        self.get(tag).map(FieldValue::as_text)
    }

    /// Field value as individual entries (empty if the tag is absent)
    pub fn values(&self, tag: &str) -> Vec<&str> {
        self.get(tag).map(FieldValue::as_list).unwrap_or_default()
    }

    /// Article title (`TI`)
    pub fn title(&self) -> Option<String> {
        self.text("TI")
    }

    /// Abstract (`AB`)
    pub fn abstract_text(&self) -> Option<String> {
        self.text("AB")
    }

    /// PubMed identifier (`PMID`)
    pub fn pmid(&self) -> Option<String> {
        self.text("PMID")
    }

    /// Short author names (`AU`)
    pub fn authors(&self) -> Vec<&str> {
        self.values("AU")
    }

    /// Tags present in this record, in sorted order
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn from_raw(raw: Vec<(String, Vec<String>)>) -> Self {
        let fields = raw
            .into_iter()
            .map(|(tag, values)| {
                let value = if TEXT_TAGS.contains(&tag.as_str()) {
                    FieldValue::Text(values.join(" "))
                } else {
                    FieldValue::List(values)
                };
                (tag, value)
            })
            .collect();
        Self { fields }
    }
}

/// Accumulates raw field lines for the record currently being read.
#[derive(Debug, Default)]
struct RawRecord {
    fields: Vec<(String, Vec<String>)>,
    current: Option<usize>,
}

impl RawRecord {
    fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn start_field(&mut self, tag: String, value: String) {
        let index = match self.fields.iter().position(|(t, _)| *t == tag) {
            Some(index) => index,
            None => {
                self.fields.push((tag, Vec::new()));
                self.fields.len() - 1
            }
        };
        self.fields[index].1.push(value);
        self.current = Some(index);
    }

    fn continue_field(&mut self, line: &str) {
        let Some(index) = self.current else {
            tracing::debug!("Dropping MEDLINE continuation line with no preceding tag");
            return;
        };
        let (tag, values) = &mut self.fields[index];
        if GLUED_TAGS.contains(&tag.as_str()) {
            // Keep the single separating space from column six.
            let tail = skip_chars(line, VALUE_OFFSET - 1);
            match values.last_mut() {
                Some(last) => last.push_str(tail),
                None => values.push(tail.trim_start().to_string()),
            }
        } else {
            values.push(skip_chars(line, VALUE_OFFSET).to_string());
        }
    }

    fn finish(self) -> MedlineRecord {
        MedlineRecord::from_raw(self.fields)
    }
}

/// Parse every record in a MEDLINE payload, in order.
pub fn parse_records(text: &str) -> Vec<MedlineRecord> {
    let mut records = Vec::new();
    let mut raw = RawRecord::default();

    for line in text.lines() {
        let line = line.trim_end();

        if line.starts_with("      ") {
            raw.continue_field(line);
        } else if !line.is_empty() {
            let tag = take_chars(line, TAG_WIDTH).trim_end().to_string();
            let value = skip_chars(line, VALUE_OFFSET).to_string();
            raw.start_field(tag, value);
        } else if !raw.is_empty() {
            records.push(std::mem::take(&mut raw).finish());
        }
    }

    if !raw.is_empty() {
        records.push(raw.finish());
    }

    records
}

/// The first `n` characters of `s`
fn take_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((offset, _)) => &s[..offset],
        None => s,
    }
}

/// `s` without its first `n` characters
fn skip_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((offset, _)) => &s[offset..],
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "
PMID- 31452104
OWN - NLM
STAT- MEDLINE
TI  - Trastuzumab deruxtecan in previously treated HER2-low advanced breast
      cancer.
AB  - BACKGROUND: Patients with HER2-low metastatic breast cancer have had
      limited targeted options.
AU  - Modi S
AU  - Jacot W
MH  - Antibodies, Monoclonal, Humanized/*therapeutic use
MH  - Breast Neoplasms/*drug therapy/pathology
      /metabolism
PT  - Journal Article
";

    #[test]
    fn test_parse_single_line_title_and_abstract_unmodified() {
        let text = "PMID- 1\nTI  - Therapy for breast cancer: a review.\nAB  - We review 42 trials (n=1,234) of HER2/neu-targeted agents.\n";
        let record = MedlineRecord::parse(text);

        assert_eq!(
            record.title().as_deref(),
            Some("Therapy for breast cancer: a review.")
        );
        assert_eq!(
            record.abstract_text().as_deref(),
            Some("We review 42 trials (n=1,234) of HER2/neu-targeted agents.")
        );
        assert_eq!(record.pmid().as_deref(), Some("1"));
    }

    #[test]
    fn test_parse_multiline_text_fields_are_joined() {
        let record = MedlineRecord::parse(SAMPLE);

        assert_eq!(
            record.get("TI"),
            Some(&FieldValue::Text(
                "Trastuzumab deruxtecan in previously treated HER2-low advanced breast cancer."
                    .to_string()
            ))
        );
        assert!(record
            .abstract_text()
            .unwrap()
            .ends_with("have had limited targeted options."));
    }

    #[test]
    fn test_parse_repeated_tags_become_lists() {
        let record = MedlineRecord::parse(SAMPLE);

        assert_eq!(record.authors(), vec!["Modi S", "Jacot W"]);
        assert_eq!(record.values("PT"), vec!["Journal Article"]);
        assert_eq!(record.text("STAT").as_deref(), Some("MEDLINE"));
    }

    #[test]
    fn test_parse_mesh_continuation_glued_to_previous_entry() {
        let record = MedlineRecord::parse(SAMPLE);
        let mesh = record.values("MH");

        assert_eq!(mesh.len(), 2);
        assert_eq!(mesh[1], "Breast Neoplasms/*drug therapy/pathology /metabolism");
    }

    #[test]
    fn test_parse_keeps_unknown_tags() {
        let record = MedlineRecord::parse("PMID- 7\nZZ  - something new\n");
        assert_eq!(record.values("ZZ"), vec!["something new"]);
        assert_eq!(record.len(), 2);
    }

    #[test]
    fn test_parse_multiple_records() {
        let text = "PMID- 1\nTI  - First.\n\nPMID- 2\nTI  - Second.\n";
        let records = parse_records(text);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title().as_deref(), Some("First."));
        assert_eq!(records[1].title().as_deref(), Some("Second."));
        assert_eq!(MedlineRecord::parse(text).pmid().as_deref(), Some("1"));
    }

    #[test]
    fn test_parse_empty_and_garbage_input() {
        assert!(MedlineRecord::parse("").is_empty());
        assert!(MedlineRecord::parse("\n\n\n").is_empty());

        // A continuation with no tag before it is dropped.
        let record = MedlineRecord::parse("      orphan line\nTI  - Kept.\n");
        assert_eq!(record.len(), 1);
        assert_eq!(record.title().as_deref(), Some("Kept."));
    }

    #[test]
    fn test_parse_short_lines_and_non_ascii() {
        let record = MedlineRecord::parse("XY\nTI  - Étude über Krebs – résumé\n");

        assert_eq!(record.values("XY"), vec![""]);
        assert_eq!(
            record.title().as_deref(),
            Some("Étude über Krebs – résumé")
        );
    }

    #[test]
    fn test_record_serializes_as_plain_mapping() {
        let record = MedlineRecord::parse("PMID- 5\nAU  - Modi S\n");
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["PMID"], "5");
        assert_eq!(json["AU"], serde_json::json!(["Modi S"]));
    }
}
