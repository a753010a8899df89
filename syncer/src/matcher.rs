use client::types::{TestCase, TestResult};
use std::collections::BTreeSet;

/// Result statuses a user wants pushed to the test plan, stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusFilter {
    statuses: BTreeSet<String>,
}

impl StatusFilter {
    pub fn passed_only() -> Self {
        Self::from_statuses(["passed"])
    }

    pub fn passed_and_failed() -> Self {
        Self::from_statuses(["passed", "failed"])
    }

    pub fn all() -> Self {
        Self::from_statuses(["passed", "failed", "notexecuted", "skipped"])
    }

    pub fn from_statuses<I, S>(statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            statuses: statuses
                .into_iter()
                .map(|s| s.as_ref().trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// Menu choice from the interactive prompt: `1`, `2`, anything else means all.
    pub fn from_choice(choice: &str) -> Self {
        match choice.trim() {
            "1" => Self::passed_only(),
            "2" => Self::passed_and_failed(),
            _ => Self::all(),
        }
    }

    pub fn allows(&self, status: &str) -> bool {
        self.statuses.contains(&status.to_lowercase())
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.statuses.iter().map(String::as_str)
    }
}

impl Default for StatusFilter {
    fn default() -> Self {
        Self::all()
    }
}

/// First result, in iteration order, whose status passes `filter` and whose
/// name contains the test case id. Earlier results shadow later ones.
pub fn find_match<'r>(
    test_case: &TestCase,
    results: &'r [TestResult],
    filter: &StatusFilter,
) -> Option<&'r TestResult> {
    results
        .iter()
        .find(|r| filter.allows(&r.status) && r.name.contains(&test_case.id_str))
}

#[cfg(test)]
mod tests {
    use super::*;
    use client::types::Outcome;

    fn case_with_key(key: &str) -> TestCase {
        let mut case = TestCase::new(101, 1);
        case.id_str = key.to_string();
        case
    }

    #[test]
    fn test_matches_id_substring() {
        let results = vec![TestResult::new("TC-101 login", "Passed")];
        let case = case_with_key("TC-101");

        let matched = find_match(&case, &results, &StatusFilter::all()).unwrap();
        assert_eq!(matched.name, "TC-101 login");
        assert_eq!(Outcome::from_status(&matched.status), Outcome::Passed);
    }

    #[test]
    fn test_disallowed_status_is_not_selected() {
        let results = vec![TestResult::new("TC-101 login", "skipped")];
        let case = case_with_key("TC-101");

        assert!(find_match(&case, &results, &StatusFilter::passed_and_failed()).is_none());
    }

    #[test]
    fn test_first_match_wins() {
        let case = case_with_key("TC-101");
        let first = TestResult::new("TC-101 login (chrome)", "failed");
        let second = TestResult::new("TC-101 login (firefox)", "passed");

        let results = vec![first.clone(), second.clone()];
        let matched = find_match(&case, &results, &StatusFilter::all()).unwrap();
        assert_eq!(matched, &first);

        let reversed = vec![second.clone(), first];
        let matched = find_match(&case, &reversed, &StatusFilter::all()).unwrap();
        assert_eq!(matched, &second);
    }

    #[test]
    fn test_filtered_result_does_not_shadow_later_match() {
        let case = case_with_key("TC-101");
        let results = vec![
            TestResult::new("TC-101 login", "skipped"),
            TestResult::new("TC-101 login retry", "passed"),
        ];

        let matched = find_match(&case, &results, &StatusFilter::passed_only()).unwrap();
        assert_eq!(matched.name, "TC-101 login retry");
    }

    #[test]
    fn test_status_filter_is_case_insensitive() {
        let filter = StatusFilter::from_statuses(["PASSED", " Failed "]);
        assert!(filter.allows("passed"));
        assert!(filter.allows("FAILED"));
        assert!(!filter.allows("skipped"));
        assert_eq!(filter.iter().collect::<Vec<_>>(), vec!["failed", "passed"]);
    }

    #[test]
    fn test_status_filter_from_choice() {
        assert_eq!(StatusFilter::from_choice("1"), StatusFilter::passed_only());
        assert_eq!(StatusFilter::from_choice(" 2 "), StatusFilter::passed_and_failed());
        assert_eq!(StatusFilter::from_choice("3"), StatusFilter::all());
        assert_eq!(StatusFilter::from_choice(""), StatusFilter::all());
    }

    #[test]
    fn test_empty_filter_matches_nothing() {
        let filter = StatusFilter::from_statuses(Vec::<String>::new());
        assert!(filter.is_empty());

        let results = vec![TestResult::new("101", "passed")];
        assert!(find_match(&TestCase::new(101, 1), &results, &filter).is_none());
    }
}
