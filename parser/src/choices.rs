//! Choice resolution.

use std::collections::HashMap;

use command_args_core::ChoicesResolution;

use crate::metadata::OptionChoices;

/// Rewrites values that match a choice to the choice's display name.
///
/// Matching is case-insensitive against the choice name, and against the
/// choice value too when `can_use_directly_value` is set. Values without a
/// match are left untouched.
pub(crate) fn resolve_choices(
    choices: &[OptionChoices],
    values: &mut HashMap<&str, String>,
    settings: ChoicesResolution,
) {
    for table in choices {
        let Some(value) = values.get_mut(table.option.as_str()) else {
            continue;
        };

        let finder = value.to_lowercase();
        if let Some(name) = table.find(&finder, settings.can_use_directly_value) {
            *value = name.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Vec<OptionChoices> {
        vec![OptionChoices::new(
            "choice",
            [
                ("Ganyu", "Ganyu Supremacy"),
                ("Penwin", "Penwi Squad"),
                ("Arlecchino", "The Knave"),
            ],
        )]
    }

    #[test]
    fn test_matches_name_case_insensitively() {
        let mut values = HashMap::from([("choice", "gAnYu".to_string())]);
        resolve_choices(&table(), &mut values, ChoicesResolution::default());
        assert_eq!(values["choice"], "Ganyu");
    }

    #[test]
    fn test_matches_value_only_when_allowed() {
        let mut values = HashMap::from([("choice", "the knave".to_string())]);
        resolve_choices(
            &table(),
            &mut values,
            ChoicesResolution {
                can_use_directly_value: false,
            },
        );
        assert_eq!(values["choice"], "the knave");

        resolve_choices(&table(), &mut values, ChoicesResolution::default());
        assert_eq!(values["choice"], "Arlecchino");
    }

    #[test]
    fn test_unknown_value_is_kept() {
        let mut values = HashMap::from([("choice", "Furina".to_string())]);
        resolve_choices(&table(), &mut values, ChoicesResolution::default());
        assert_eq!(values["choice"], "Furina");
    }

    #[test]
    fn test_name_match_wins_over_value_match() {
        let choices = vec![OptionChoices::new("choice", [("Knight", "Squire"), ("Squire", "Page")])];
        let mut values = HashMap::from([("choice", "SQUIRE".to_string())]);
        resolve_choices(&choices, &mut values, ChoicesResolution::default());
        assert_eq!(values["choice"], "Squire");
    }
}
