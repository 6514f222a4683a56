use crate::artifacts::branch::INVALID_BRANCH_NAME_REGEX;
use anyhow::Context;

const REF_PREFIX: &str = "refs/heads/";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct BranchName(String);

impl BranchName {
    pub fn try_parse(name: String) -> anyhow::Result<Self> {
        let name = name
            .strip_prefix(REF_PREFIX)
            .map(str::to_string)
            .unwrap_or(name);

        if name.is_empty() {
            anyhow::bail!("branch name cannot be empty");
        }

        let re = regex::Regex::new(INVALID_BRANCH_NAME_REGEX)
            .with_context(|| format!("invalid branch name regex: {INVALID_BRANCH_NAME_REGEX}"))?;

        if re.is_match(&name) {
            anyhow::bail!("invalid branch name: {}", name);
        } else {
            Ok(Self(name))
        }
    }

    /// Fully qualified reference, e.g. `refs/heads/main`
    pub fn full_ref(&self) -> String {
        format!("{REF_PREFIX}{}", self.0)
    }

    /// Name usable as a single file name component
    ///
    /// `%` and `/` are percent-encoded, so distinct branches never share a stem.
    pub fn file_stem(&self) -> String {
        self.0.replace('%', "%25").replace('/', "%2F")
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::proptest;

    proptest! {
        #[test]
        fn test_is_valid_branch_name_with_slashes(
            prefix in "[a-zA-Z0-9_-]+",
            suffix in "[a-zA-Z0-9_-]+"
        ) {
            // Valid names can have slashes: feature/branch-name
            let branch_name = format!("{}/{}", prefix, suffix);
            assert!(BranchName::try_parse(branch_name).is_ok());
        }

        #[test]
        fn test_is_invalid_branch_name_with_consecutive_dots(
            prefix in "[a-zA-Z0-9_-]+",
            suffix in "[a-zA-Z0-9_-]+"
        ) {
            // Invalid: consecutive dots
            let branch_name = format!("{}..{}", prefix, suffix);
            assert!(BranchName::try_parse(branch_name).is_err());
        }

        #[test]
        fn test_is_invalid_branch_name_with_special_chars(
            prefix in "[a-zA-Z0-9_-]+",
            suffix in "[a-zA-Z0-9_-]+",
            special_char in r"[\*:\?\[\\^~ ]"
        ) {
            let branch_name = format!("{}{}{}", prefix, special_char, suffix);
            assert!(BranchName::try_parse(branch_name).is_err());
        }
    }

    #[test]
    fn test_full_ref_prefix_is_accepted_and_stripped() {
        let name = BranchName::try_parse("refs/heads/feature/x".to_string()).unwrap();
        assert_eq!(name.as_ref(), "feature/x");
        assert_eq!(name.full_ref(), "refs/heads/feature/x");
        assert_eq!(name.file_stem(), "feature%2Fx");
    }

    #[test]
    fn test_file_stems_of_distinct_branches_differ() {
        let stems = ["feature/x", "feature-x", "feature%2Fx", "feature%x"]
            .map(|name| BranchName::try_parse(name.to_string()).unwrap().file_stem());

        assert_eq!(stems, ["feature%2Fx", "feature-x", "feature%252Fx", "feature%25x"]);
    }

    #[test]
    fn test_is_invalid_branch_name_empty() {
        assert!(BranchName::try_parse("".to_string()).is_err());
        assert!(BranchName::try_parse("refs/heads/".to_string()).is_err());
    }
}
