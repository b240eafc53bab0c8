//! Core data model — postings as scraped, skill-group requirement sets, and
//! the record shape handed to the posting store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Posting ─────────────────────────────────────────────────────────

/// A candidate job posting as delivered by the streaming source.
///
/// Owned by the upstream source; the pipeline only reads it until the
/// persistence node derives a [`NewPosting`] from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Posting {
    /// Source-native identifier.
    pub external_id: String,
    /// Which scraper produced this posting (e.g. "djinni").
    pub source: String,
    pub title: String,
    pub company: String,
    /// Free-text description. May be empty — downstream nodes treat an empty
    /// description as "nothing to evaluate", not as an error.
    #[serde(default)]
    pub description: String,
    pub location: Option<Location>,
    /// Employment type (e.g. "remote", "office", "hybrid").
    pub employment: Option<String>,
    /// Required experience in months. Absent means no stated requirement.
    pub experience_months: Option<i64>,
    pub salary: Option<SalaryRange>,
    pub published_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Location block of a posting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub region: Option<String>,
    #[serde(default)]
    pub remote: bool,
    /// Whether the candidate's region is eligible to apply.
    #[serde(default)]
    pub can_apply: bool,
}

/// Salary range as advertised.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalaryRange {
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub currency: Option<String>,
}

// ── Skill groups ────────────────────────────────────────────────────

/// A requirement set encoded as AND-of-ORs: every outer group is required,
/// any one alternative inside a group satisfies it. A single mandatory skill
/// is a one-element group.
///
/// A flat list of strings is never a valid encoding — [`SkillGroups::from_value`]
/// normalizes bare strings into singleton groups and rejects anything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillGroups(Vec<Vec<String>>);

impl SkillGroups {
    pub fn new(groups: Vec<Vec<String>>) -> Self {
        Self(groups)
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn groups(&self) -> &[Vec<String>] {
        &self.0
    }

    /// Build skill groups from a raw JSON value, normalizing as needed.
    ///
    /// Accepted shapes per element of the outer array:
    /// - an array of strings → one OR-group, order preserved
    /// - a bare string → a one-element group (the flat-list contract
    ///   violation some providers produce)
    ///
    /// Anything else (`null`, a non-array top level, non-string alternatives)
    /// returns `None`. Empty strings and empty groups are dropped.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        let items = value.as_array()?;
        let mut groups = Vec::with_capacity(items.len());
        for item in items {
            match item {
                serde_json::Value::String(s) => {
                    let s = s.trim();
                    if !s.is_empty() {
                        groups.push(vec![s.to_string()]);
                    }
                }
                serde_json::Value::Array(alternatives) => {
                    let mut group = Vec::with_capacity(alternatives.len());
                    for alt in alternatives {
                        let s = alt.as_str()?.trim();
                        if !s.is_empty() {
                            group.push(s.to_string());
                        }
                    }
                    if !group.is_empty() {
                        groups.push(group);
                    }
                }
                _ => return None,
            }
        }
        Some(Self(groups))
    }
}

impl From<Vec<Vec<String>>> for SkillGroups {
    fn from(groups: Vec<Vec<String>>) -> Self {
        Self(groups)
    }
}

// ── Create record ───────────────────────────────────────────────────

/// The posting store's create contract: a shallow copy of the posting fields
/// plus the evaluation outcome flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPosting {
    pub external_id: String,
    pub source: String,
    pub title: String,
    pub company: String,
    pub description: String,
    pub location: Option<Location>,
    pub employment: Option<String>,
    pub experience_months: Option<i64>,
    pub salary: Option<SalaryRange>,
    pub published_at: Option<DateTime<Utc>>,
    pub is_relevant: bool,
    pub is_filtered: bool,
    /// Written only when extraction ran and found something. An absent value
    /// means "not evaluated", never "evaluated, found nothing".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub must_have_skill_groups: Option<SkillGroups>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nice_to_have_skill_groups: Option<SkillGroups>,
}

impl NewPosting {
    /// Shallow-copy the posting fields into a create record with default
    /// flags (`is_relevant = true`, `is_filtered = false`, no skill groups).
    pub fn from_posting(posting: &Posting) -> Self {
        Self {
            external_id: posting.external_id.clone(),
            source: posting.source.clone(),
            title: posting.title.clone(),
            company: posting.company.clone(),
            description: posting.description.clone(),
            location: posting.location.clone(),
            employment: posting.employment.clone(),
            experience_months: posting.experience_months,
            salary: posting.salary.clone(),
            published_at: posting.published_at,
            is_relevant: true,
            is_filtered: false,
            must_have_skill_groups: None,
            nice_to_have_skill_groups: None,
        }
    }

    /// Mark the record as rejected by the filter stage.
    pub fn filtered(mut self) -> Self {
        self.is_filtered = true;
        self.is_relevant = false;
        self
    }

    /// Rebuild a `Posting` view of this record, as returned by store reads.
    pub fn to_posting(&self, updated_at: DateTime<Utc>) -> Posting {
        Posting {
            external_id: self.external_id.clone(),
            source: self.source.clone(),
            title: self.title.clone(),
            company: self.company.clone(),
            description: self.description.clone(),
            location: self.location.clone(),
            employment: self.employment.clone(),
            experience_months: self.experience_months,
            salary: self.salary.clone(),
            published_at: self.published_at,
            updated_at: Some(updated_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn posting() -> Posting {
        Posting {
            external_id: "djinni-42".into(),
            source: "djinni".into(),
            title: "Backend Engineer".into(),
            company: "Acme".into(),
            description: "Build APIs".into(),
            location: Some(Location {
                region: Some("Europe".into()),
                remote: true,
                can_apply: true,
            }),
            employment: Some("remote".into()),
            experience_months: Some(24),
            salary: None,
            published_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn skill_groups_preserve_group_and_alternative_order() {
        let value = json!([["Python", "Java"], ["Django"]]);
        let groups = SkillGroups::from_value(&value).unwrap();
        assert_eq!(
            groups.groups(),
            &[
                vec!["Python".to_string(), "Java".to_string()],
                vec!["Django".to_string()]
            ]
        );
    }

    #[test]
    fn skill_groups_normalize_bare_strings_to_singleton_groups() {
        let value = json!(["Rust", "Tokio"]);
        let groups = SkillGroups::from_value(&value).unwrap();
        assert_eq!(
            groups.groups(),
            &[vec!["Rust".to_string()], vec!["Tokio".to_string()]]
        );
    }

    #[test]
    fn skill_groups_reject_null_and_non_arrays() {
        assert!(SkillGroups::from_value(&json!(null)).is_none());
        assert!(SkillGroups::from_value(&json!("Python")).is_none());
        assert!(SkillGroups::from_value(&json!({"skills": []})).is_none());
    }

    #[test]
    fn skill_groups_reject_non_string_alternatives() {
        assert!(SkillGroups::from_value(&json!([["Python", 3]])).is_none());
        assert!(SkillGroups::from_value(&json!([42])).is_none());
    }

    #[test]
    fn skill_groups_drop_empty_entries() {
        let value = json!([[], ["Go"], ["", "SQL"], "  "]);
        let groups = SkillGroups::from_value(&value).unwrap();
        assert_eq!(
            groups.groups(),
            &[vec!["Go".to_string()], vec!["SQL".to_string()]]
        );
    }

    #[test]
    fn skill_groups_empty_array_is_valid_and_empty() {
        let groups = SkillGroups::from_value(&json!([])).unwrap();
        assert!(groups.is_empty());
    }

    #[test]
    fn new_posting_copies_fields_with_default_flags() {
        let record = NewPosting::from_posting(&posting());
        assert_eq!(record.external_id, "djinni-42");
        assert_eq!(record.title, "Backend Engineer");
        assert!(record.is_relevant);
        assert!(!record.is_filtered);
        assert!(record.must_have_skill_groups.is_none());
        assert!(record.nice_to_have_skill_groups.is_none());
    }

    #[test]
    fn filtered_record_sets_both_flags() {
        let record = NewPosting::from_posting(&posting()).filtered();
        assert!(record.is_filtered);
        assert!(!record.is_relevant);
    }

    #[test]
    fn skill_groups_serialize_as_nested_arrays() {
        let groups = SkillGroups::new(vec![
            vec!["Python".into(), "Java".into()],
            vec!["Django".into()],
        ]);
        let value = serde_json::to_value(&groups).unwrap();
        assert_eq!(value, json!([["Python", "Java"], ["Django"]]));
    }
}
