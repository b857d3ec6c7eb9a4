use std::collections::HashSet;

use crate::models::InterestsInput;

/// Separator accepted when interests arrive as a single string
pub const INTEREST_SEPARATOR: char = ',';

/// Normalize interests into an ordered set of trimmed tags.
///
/// Empty tags are dropped and duplicates keep their first position.
pub fn normalize_interests(input: InterestsInput) -> Vec<String> {
    match input {
        InterestsInput::Delimited(text) => normalize_tags(text.split(INTEREST_SEPARATOR)),
        InterestsInput::List(tags) => normalize_tags(tags.iter().map(String::as_str)),
    }
}

pub fn normalize_tags<'a, I>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    tags.into_iter()
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .filter(|tag| seen.insert(*tag))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delimited_duplicates_collapse() {
        let tags = normalize_interests(InterestsInput::Delimited("Travel, Music, Travel".into()));
        assert_eq!(tags, vec!["Travel", "Music"]);
    }

    #[test]
    fn test_list_is_trimmed_and_ordered() {
        let tags = normalize_interests(InterestsInput::List(vec![
            " Yoga".into(),
            "Art ".into(),
            "".into(),
            "Yoga".into(),
            "Dance".into(),
        ]));
        assert_eq!(tags, vec!["Yoga", "Art", "Dance"]);
    }

    #[test]
    fn test_blank_input_is_empty() {
        assert!(normalize_interests(InterestsInput::Delimited(" , ,".into())).is_empty());
    }

    #[test]
    fn test_tags_are_case_sensitive() {
        let tags = normalize_tags(["Music", "music"]);
        assert_eq!(tags, vec!["Music", "music"]);
    }
}
