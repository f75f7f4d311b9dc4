//! Role heuristic: does a posting look like a technical / R&D position?
//!
//! Permissive inclusion over the whole text, strict exclusion over the title
//! only; a developer role "working with Marketing" must not be rejected
//! because the body mentions an excluded function.

const DEV_KEYWORDS: &[&str] = &[
    "developer",
    "software engineer",
    "backend",
    "frontend",
    "full stack",
    "full-stack",
    "devops",
    "data engineer",
    "machine learning engineer",
    "ml engineer",
    "research engineer",
    "r&d",
    "rd engineer",
    "mobile developer",
    "android developer",
    "ios developer",
    "site reliability",
    "sre",
    "platform engineer",
    "cloud engineer",
];

const NON_DEV_EXCLUDE: &[&str] = &[
    "sales",
    "marketing",
    "hr",
    "recruiter",
    "finance",
    "accountant",
    "legal",
    "designer",
    "ux",
    "ui",
    "customer success",
    "support",
    "success manager",
];

/// Outcome of the role gate: the verdict plus a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleVerdict {
    pub is_dev: bool,
    pub reason: String,
}

/// Decide whether the posting is a development/R&D role.
///
/// Exclusion keywords are checked against the title only and take precedence;
/// inclusion keywords are checked against title + summary + description,
/// case-insensitively, by substring.
pub fn is_dev_role(
    title: Option<&str>,
    description: Option<&str>,
    summary: Option<&str>,
) -> RoleVerdict {
    let title_lower = title.unwrap_or_default().to_lowercase();

    for excluded in NON_DEV_EXCLUDE {
        if title_lower.contains(excluded) {
            return RoleVerdict {
                is_dev: false,
                reason: format!("non-development role ({excluded})"),
            };
        }
    }

    let blob = [title, summary, description]
        .iter()
        .filter_map(|part| *part)
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("\n");

    for keyword in DEV_KEYWORDS {
        if blob.contains(keyword) {
            return RoleVerdict {
                is_dev: true,
                reason: "development role".to_string(),
            };
        }
    }

    RoleVerdict {
        is_dev: false,
        reason: "not recognized as a development role".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_in_title_passes() {
        let verdict = is_dev_role(Some("Senior Backend Developer"), None, None);
        assert!(verdict.is_dev);
    }

    #[test]
    fn keyword_in_description_passes() {
        let verdict = is_dev_role(
            Some("Engineer"),
            Some("Join our team as a DevOps specialist"),
            None,
        );
        assert!(verdict.is_dev);
    }

    #[test]
    fn exclusion_in_title_wins_over_inclusion_in_body() {
        let verdict = is_dev_role(
            Some("Sales Manager"),
            Some("You will work closely with our backend developers"),
            None,
        );
        assert!(!verdict.is_dev);
        assert!(verdict.reason.contains("sales"));
    }

    #[test]
    fn excluded_function_in_body_only_does_not_reject() {
        let verdict = is_dev_role(
            Some("Full Stack Developer"),
            Some("Collaborates with marketing on campaign tooling"),
            None,
        );
        assert!(verdict.is_dev);
    }

    #[test]
    fn unrelated_role_is_rejected() {
        let verdict = is_dev_role(Some("Office Administrator"), Some("General admin"), None);
        assert!(!verdict.is_dev);
    }

    #[test]
    fn missing_everything_is_rejected() {
        assert!(!is_dev_role(None, None, None).is_dev);
    }
}
