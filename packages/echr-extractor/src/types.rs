//! Core data types: case records and citation network elements.

use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Relation type carried by every citation edge.
pub const REFERENCES_RELATION: &str = "references";

/// Column order used when a case is written as a flat record.
pub const CASE_COLUMNS: &[&str] = &[
    "itemid",
    "appno",
    "article",
    "conclusion",
    "docname",
    "doctype",
    "doctypebranch",
    "ecli",
    "importance",
    "judgementdate",
    "languageisocode",
    "originatingbody",
    "violation",
    "nonviolation",
    "extractedappno",
    "scl",
    "full_text",
];

/// Date-time layouts seen in HUDOC results and in our own CSV output.
const DATE_TIME_FORMATS: &[&str] = &[
    "%d/%m/%Y %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%Y-%m-%d"];

/// Parse a HUDOC date value leniently.
///
/// Returns `None` for empty or unrecognised input.
///
/// # Examples
/// ```
/// use echr_extractor::types::parse_hudoc_date;
///
/// let dt = parse_hudoc_date("14/01/2020 00:00:00").unwrap();
/// assert_eq!(dt.format("%Y-%m-%d").to_string(), "2020-01-14");
/// assert!(parse_hudoc_date("not a date").is_none());
/// ```
pub fn parse_hudoc_date(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// A single ECHR document with its HUDOC metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EchrCase {
    pub itemid: String,
    pub appno: String,
    pub article: String,
    pub conclusion: String,
    pub docname: String,
    pub doctype: String,
    pub doctypebranch: String,
    pub ecli: String,
    pub importance: String,
    pub judgementdate: Option<NaiveDateTime>,
    pub languageisocode: String,
    pub originatingbody: String,
    pub violation: String,
    pub nonviolation: String,
    pub extractedappno: String,
    pub scl: String,
    pub full_text: String,

    /// Requested fields that have no dedicated member.
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl EchrCase {
    /// Build a case from a field-name to value map.
    ///
    /// Unknown keys land in [`EchrCase::extra`]; missing keys stay empty.
    pub fn from_fields<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut case = Self::default();
        for (key, value) in fields {
            case.set_field(key.into(), value.into());
        }
        case
    }

    fn set_field(&mut self, key: String, value: String) {
        let slot = match key.as_str() {
            "itemid" => &mut self.itemid,
            "appno" => &mut self.appno,
            "article" => &mut self.article,
            "conclusion" => &mut self.conclusion,
            "docname" => &mut self.docname,
            "doctype" => &mut self.doctype,
            "doctypebranch" => &mut self.doctypebranch,
            "ecli" => &mut self.ecli,
            "importance" => &mut self.importance,
            "languageisocode" => &mut self.languageisocode,
            "originatingbody" => &mut self.originatingbody,
            "violation" => &mut self.violation,
            "nonviolation" => &mut self.nonviolation,
            "extractedappno" => &mut self.extractedappno,
            "scl" => &mut self.scl,
            "full_text" => &mut self.full_text,
            "judgementdate" => {
                self.judgementdate = parse_hudoc_date(&value);
                return;
            }
            _ => {
                self.extra.insert(key, value);
                return;
            }
        };
        *slot = value;
    }

    /// Value of a column by name, as written to flat files.
    pub fn field(&self, name: &str) -> String {
        match name {
            "itemid" => self.itemid.clone(),
            "appno" => self.appno.clone(),
            "article" => self.article.clone(),
            "conclusion" => self.conclusion.clone(),
            "docname" => self.docname.clone(),
            "doctype" => self.doctype.clone(),
            "doctypebranch" => self.doctypebranch.clone(),
            "ecli" => self.ecli.clone(),
            "importance" => self.importance.clone(),
            "judgementdate" => self
                .judgementdate
                .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default(),
            "languageisocode" => self.languageisocode.clone(),
            "originatingbody" => self.originatingbody.clone(),
            "violation" => self.violation.clone(),
            "nonviolation" => self.nonviolation.clone(),
            "extractedappno" => self.extractedappno.clone(),
            "scl" => self.scl.clone(),
            "full_text" => self.full_text.clone(),
            other => self.extra.get(other).cloned().unwrap_or_default(),
        }
    }

    /// Application numbers listed in `appno` (`;`-separated).
    pub fn application_numbers(&self) -> impl Iterator<Item = &str> {
        self.appno
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

impl From<HashMap<String, String>> for EchrCase {
    fn from(fields: HashMap<String, String>) -> Self {
        Self::from_fields(fields)
    }
}

/// CSV columns of [`NetworkNode`], in field order.
pub const NODE_COLUMNS: &[&str] = &[
    "id",
    "ecli",
    "appno",
    "docname",
    "judgementdate",
    "importance",
    "languageisocode",
];

/// CSV columns of [`NetworkEdge`], in field order.
pub const EDGE_COLUMNS: &[&str] = &["source_id", "target_id", "relation_type", "weight"];

/// A case in the citation network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkNode {
    pub id: String,
    pub ecli: String,
    pub appno: String,
    pub docname: String,
    pub judgementdate: Option<NaiveDateTime>,
    pub importance: String,
    pub languageisocode: String,
}

impl From<&EchrCase> for NetworkNode {
    fn from(case: &EchrCase) -> Self {
        Self {
            id: case.itemid.clone(),
            ecli: case.ecli.clone(),
            appno: case.appno.clone(),
            docname: case.docname.clone(),
            judgementdate: case.judgementdate,
            importance: case.importance.clone(),
            languageisocode: case.languageisocode.clone(),
        }
    }
}

/// A citation from one case to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkEdge {
    pub source_id: String,
    pub target_id: String,
    pub relation_type: String,
    pub weight: f64,
}

impl NetworkEdge {
    /// Create a `references` edge with unit weight.
    #[must_use]
    pub fn references(source_id: impl Into<String>, target_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            relation_type: REFERENCES_RELATION.to_string(),
            weight: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_hudoc_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2020, 1, 14)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(parse_hudoc_date("14/01/2020 00:00:00"), Some(expected));
        assert_eq!(parse_hudoc_date("2020-01-14T00:00:00"), Some(expected));
        assert_eq!(parse_hudoc_date("2020-01-14 00:00:00"), Some(expected));
        assert_eq!(parse_hudoc_date("2020-01-14"), Some(expected));
        assert_eq!(parse_hudoc_date(""), None);
        assert_eq!(parse_hudoc_date("32/01/2020"), None);
    }

    #[test]
    fn test_from_fields_known_and_extra() {
        let case = EchrCase::from_fields([
            ("itemid", "001-200001"),
            ("ecli", "ECLI:CE:ECHR:2020:0114JUD001234518"),
            ("judgementdate", "14/01/2020 00:00:00"),
            ("respondent", "NLD"),
        ]);

        assert_eq!(case.itemid, "001-200001");
        assert_eq!(case.ecli, "ECLI:CE:ECHR:2020:0114JUD001234518");
        assert!(case.judgementdate.is_some());
        assert_eq!(case.extra.get("respondent").map(String::as_str), Some("NLD"));
        assert_eq!(case.appno, "");
    }

    #[test]
    fn test_field_roundtrips_through_from_fields() {
        let case = EchrCase::from_fields([
            ("itemid", "001-1"),
            ("judgementdate", "2019-05-02"),
            ("respondent", "FRA"),
        ]);
        assert_eq!(case.field("judgementdate"), "2019-05-02 00:00:00");
        assert_eq!(case.field("respondent"), "FRA");

        let again = EchrCase::from_fields(
            ["itemid", "judgementdate", "respondent"]
                .map(|k| (k.to_string(), case.field(k))),
        );
        assert_eq!(again, case);
    }

    #[test]
    fn test_application_numbers() {
        let case = EchrCase {
            appno: "12345/18; 23456/19;".to_string(),
            ..EchrCase::default()
        };
        let numbers: Vec<&str> = case.application_numbers().collect();
        assert_eq!(numbers, vec!["12345/18", "23456/19"]);
    }

    #[test]
    fn test_case_json_flattens_extra() {
        let case = EchrCase::from_fields([("itemid", "001-1"), ("respondent", "NLD")]);
        let json = serde_json::to_value(&case).unwrap();
        assert_eq!(json["itemid"], "001-1");
        assert_eq!(json["respondent"], "NLD");
        assert!(json["judgementdate"].is_null());
    }

    #[test]
    fn test_node_from_case() {
        let case = EchrCase::from_fields([
            ("itemid", "001-1"),
            ("ecli", "ECLI:X"),
            ("appno", "1/20"),
            ("scl", "ignored"),
        ]);
        let node = NetworkNode::from(&case);
        assert_eq!(node.id, "001-1");
        assert_eq!(node.ecli, "ECLI:X");
        assert_eq!(node.appno, "1/20");
    }

    #[test]
    fn test_references_edge() {
        let edge = NetworkEdge::references("a", "b");
        assert_eq!(edge.relation_type, "references");
        assert!((edge.weight - 1.0).abs() < f64::EPSILON);
    }
}
