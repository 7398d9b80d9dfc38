//! Property-based tests for the query compiler.

#[cfg(test)]
mod tests {
    use crate::query::{compile, EntityKind, RecognizedKeywords};
    use proptest::prelude::*;

    fn keywords() -> RecognizedKeywords {
        RecognizedKeywords::from_slugs(["name", "price"])
    }

    /// Space-joined words without colons. Quotes may be unbalanced.
    fn words() -> impl Strategy<Value = String> {
        prop::collection::vec("[a-zA-Z0-9\"]{1,8}", 0..6).prop_map(|words| words.join(" "))
    }

    proptest! {
        #[test]
        fn test_colon_free_query_is_returned_trimmed(raw in "[^:]{0,40}") {
            let compiled = compile(&raw, &keywords());
            let trimmed = raw.trim();
            assert_eq!(compiled.query.as_deref(), (!trimmed.is_empty()).then_some(trimmed));
            assert_eq!(compiled.filter, None);
            assert_eq!(compiled.kind, None);
        }

        #[test]
        fn test_is_asset_keeps_remaining_text(
            text in words(),
            gap in "[ \t]{1,3}",
            tail in "[ \t]{0,3}",
        ) {
            let compiled = compile(&format!("is:asset{}{}{}", gap, text, tail), &keywords());
            assert_eq!(compiled.kind, Some(EntityKind::Asset));
            assert_eq!(compiled.query.as_deref(), (!text.is_empty()).then_some(text.as_str()));
            assert_eq!(compiled.filter, None);
        }

        #[test]
        fn test_free_text_recompiles_to_itself(raw in "[a-z \t\":]{0,40}") {
            let first = compile(&raw, &keywords());
            if let Some(text) = first.query {
                let second = compile(&text, &keywords());
                assert_eq!(second.query.as_deref(), Some(text.as_str()));
                assert_eq!(second.filter, None);
                assert_eq!(second.kind, None);
            }
        }

        #[test]
        fn test_unrecognized_pair_stays_in_text(
            keyword in "[a-z]{1,6}",
            value in "[a-zA-Z0-9]{1,6}",
            open in "[a-z]{0,5}",
            tail in "[ \t]{0,3}",
        ) {
            prop_assume!(!["is", "name", "price"].contains(&keyword.as_str()));

            let raw = format!("is:tag {}:{} name:x \"{}{}", keyword, value, open, tail);
            let compiled = compile(&raw, &keywords());
            assert_eq!(
                compiled.query,
                Some(format!("{}:{} \"{}", keyword, value, open))
            );
            assert_eq!(compiled.filter.as_deref(), Some("name = \"x\""));
            assert_eq!(compiled.kind, Some(EntityKind::Tag));
        }
    }
}
