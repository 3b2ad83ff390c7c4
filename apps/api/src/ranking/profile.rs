//! Role keyword profiles used to bias cleaning and weighting toward
//! domain-relevant terms.
//!
//! The role set is closed: profiles are built once at startup and shared
//! read-only across every document in a run. Unknown role identifiers
//! degrade to unweighted scoring rather than erroring.

use std::collections::HashSet;

use serde::Serialize;

/// A named set of domain keywords, including multi-word phrases
/// ("machine learning", "data analysis"). Immutable after construction.
#[derive(Debug, Clone, Serialize)]
pub struct RoleProfile {
    pub id: String,
    keywords: HashSet<String>,
}

impl RoleProfile {
    pub fn new(id: &str, keywords: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// Exact-match lookup; `token` may be a folded multi-word phrase.
    pub fn contains(&self, token: &str) -> bool {
        self.keywords.contains(token)
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}

/// The closed catalog of role profiles, loaded once per process.
#[derive(Debug, Clone)]
pub struct RoleCatalog {
    profiles: Vec<RoleProfile>,
}

impl RoleCatalog {
    /// The shipped role→keyword tables.
    pub fn builtin() -> Self {
        let profiles = vec![
            RoleProfile::new(
                "itOfficer",
                &[
                    "network", "security", "cloud", "linux", "windows", "virtualization", "sql",
                    "python", "bash", "powershell", "itil", "devops", "troubleshooting", "aws",
                    "azure", "gcp", "vmware", "docker", "cybersecurity", "database",
                ],
            ),
            RoleProfile::new(
                "teacher",
                &[
                    "curriculum", "pedagogy", "classroom", "education", "lesson", "assessment",
                    "mathematics", "science", "literature", "educational technology",
                    "smartboard", "moodle", "teaching", "student",
                ],
            ),
            RoleProfile::new(
                "dataScience",
                &[
                    "python", "r", "sql", "machine learning", "deep learning", "tableau",
                    "powerbi", "excel", "hadoop", "spark", "statistics", "visualization", "etl",
                    "predictive modeling", "data analysis", "business intelligence", "dashboard",
                    "reporting",
                ],
            ),
            RoleProfile::new(
                "designer",
                &[
                    "ui/ux", "graphic design", "figma", "adobe xd", "photoshop", "html", "css",
                    "javascript", "react", "angular", "vue.js", "nodejs", "django", "php", "seo",
                    "api", "restful", "git", "aws", "heroku", "wireframing", "prototyping",
                ],
            ),
            RoleProfile::new(
                "businessAnalyst",
                &[
                    "requirements", "swot", "excel", "sql", "tableau", "powerbi",
                    "business intelligence", "agile", "scrum", "project management",
                    "financial analysis", "process modeling",
                ],
            ),
        ];
        Self { profiles }
    }

    /// Case-insensitive lookup. `None` for unknown identifiers.
    pub fn get(&self, role: &str) -> Option<&RoleProfile> {
        self.profiles
            .iter()
            .find(|p| p.id.eq_ignore_ascii_case(role))
    }

    pub fn role_ids(&self) -> Vec<&str> {
        self.profiles.iter().map(|p| p.id.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_has_five_roles() {
        let catalog = RoleCatalog::builtin();
        assert_eq!(catalog.role_ids().len(), 5);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let catalog = RoleCatalog::builtin();
        assert!(catalog.get("dataScience").is_some());
        assert!(catalog.get("datascience").is_some());
        assert!(catalog.get("DATASCIENCE").is_some());
    }

    #[test]
    fn test_unknown_role_returns_none() {
        let catalog = RoleCatalog::builtin();
        assert!(catalog.get("astronaut").is_none());
    }

    #[test]
    fn test_multi_word_phrases_present() {
        let catalog = RoleCatalog::builtin();
        let ds = catalog.get("dataScience").unwrap();
        assert!(ds.contains("machine learning"));
        assert!(ds.contains("data analysis"));
        assert!(!ds.contains("analysis"));
    }
}
