use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

///
/// Germline (inherited) trait association reported by a source for one variant.
///
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Germline {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accession: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinical_significance: Option<String>,
    #[serde(default)]
    pub disease: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Empty means the inheritance model is unknown.
    #[serde(default)]
    pub inheritance_model: BTreeSet<String>,
    #[serde(default)]
    pub gene_names: BTreeSet<String>,
    #[serde(default)]
    pub bibliography: BTreeSet<String>,
}

///
/// Somatic (tumour-acquired) trait association reported by a source for one variant.
///
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Somatic {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accession: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_status: Option<String>,
    #[serde(default)]
    pub gene_names: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_histology: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_site: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_subtype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub histology_subtype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tumour_origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutation_somatic_status: Option<String>,
    #[serde(default)]
    pub bibliography: BTreeSet<String>,
}

impl Somatic {
    ///
    /// True when both records agree on every field except `bibliography`.
    ///
    pub fn same_except_bibliography(&self, other: &Somatic) -> bool {
        self.accession == other.accession
            && self.source == other.source
            && self.review_status == other.review_status
            && self.gene_names == other.gene_names
            && self.primary_histology == other.primary_histology
            && self.primary_site == other.primary_site
            && self.site_subtype == other.site_subtype
            && self.histology_subtype == other.histology_subtype
            && self.sample_source == other.sample_source
            && self.tumour_origin == other.tumour_origin
            && self.mutation_somatic_status == other.mutation_somatic_status
    }
}

///
/// Value stored per variant key: every germline and somatic record seen for
/// that variant, in the order they were indexed.
///
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VariantTraitAssociation {
    #[serde(default)]
    pub germline: Vec<Germline>,
    #[serde(default)]
    pub somatic: Vec<Somatic>,
}

impl VariantTraitAssociation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.germline.is_empty() && self.somatic.is_empty()
    }

    pub fn len(&self) -> usize {
        self.germline.len() + self.somatic.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn somatic(bibliography: &[&str]) -> Somatic {
        Somatic {
            accession: Some("COSM476".to_string()),
            source: Some("cosmic".to_string()),
            gene_names: BTreeSet::from(["BRAF".to_string()]),
            primary_site: Some("skin".to_string()),
            bibliography: bibliography.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[rstest]
    fn test_same_except_bibliography() {
        let a = somatic(&["PMID:1"]);
        let b = somatic(&["PMID:2"]);
        assert!(a.same_except_bibliography(&b));

        let mut c = somatic(&["PMID:1"]);
        c.primary_site = Some("lung".to_string());
        assert!(!a.same_except_bibliography(&c));
    }

    #[rstest]
    fn test_serializes_camel_case() {
        let germline = Germline {
            accession: Some("RCV000000012".to_string()),
            clinical_significance: Some("Pathogenic".to_string()),
            inheritance_model: BTreeSet::from(["autosomal dominant inheritance".to_string()]),
            ..Default::default()
        };
        let value = serde_json::to_value(&germline).unwrap();
        assert_eq!(value["clinicalSignificance"], "Pathogenic");
        assert_eq!(value["inheritanceModel"][0], "autosomal dominant inheritance");
        assert!(value.get("reviewStatus").is_none());
    }

    #[rstest]
    fn test_deserialize_tolerates_missing_lists() {
        let association: VariantTraitAssociation =
            serde_json::from_str(r#"{"germline":[{"accession":"RCV1"}]}"#).unwrap();
        assert_eq!(association.germline.len(), 1);
        assert!(association.somatic.is_empty());
        assert!(association.germline[0].bibliography.is_empty());
    }
}
