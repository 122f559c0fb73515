use crate::config::ExtractRules;
use crate::extract::{self, strip_boilerplate};

fn markers() -> Vec<String> {
    ExtractRules::default().boilerplate_markers
}

#[cfg(test)]
mod stripping {
    use super::*;

    #[test]
    fn test_strips_from_first_match_to_end() {
        let text = "Useful content here. Login to mark as read and then more junk";
        let stripped = strip_boilerplate(text, &markers());
        assert_eq!(stripped, "Useful content here.");
    }

    #[test]
    fn test_earliest_marker_wins() {
        let text = "Intro. Join the discussion below. Login to mark as read";
        let stripped = strip_boilerplate(text, &markers());
        assert_eq!(stripped, "Intro.");
    }

    #[test]
    fn test_no_marker_is_a_no_op() {
        let text = "Nothing boilerplate about this text";
        assert_eq!(strip_boilerplate(text, &markers()), text);
    }

    #[test]
    fn test_stripping_is_idempotent() {
        let text = "Body text. All rights reserved 2024, Example Inc.";
        let once = strip_boilerplate(text, &markers());
        let twice = strip_boilerplate(&once, &markers());
        assert_eq!(once, twice);
        assert_eq!(once, "Body text.");
    }

    #[test]
    fn test_marker_at_start_strips_everything() {
        let text = "Login to mark as read";
        assert_eq!(strip_boilerplate(text, &markers()), "");
    }
}

#[cfg(test)]
mod end_to_end {
    use super::*;

    fn filler(words: usize) -> String {
        vec!["content"; words].join(" ")
    }

    #[test]
    fn test_trailing_boilerplate_blocks_dropped() {
        let html = format!(
            r#"<html><body><article>
               <p>Real lesson text. {}</p>
               <p>Login to mark as read</p>
               <p>Completely unrelated trailing text</p>
               </article></body></html>"#,
            filler(40)
        );

        let page = extract::extract(
            &html,
            "https://example.com/learn/a",
            &ExtractRules::default(),
        );
        assert!(page.body.starts_with("Real lesson text."));
        assert!(!page.body.contains("Login to mark as read"));
        assert!(!page.body.contains("unrelated trailing"));
        assert_eq!(page.blocks.len(), 1);
    }

    #[test]
    fn test_marker_mid_block_keeps_leading_part() {
        let html = format!(
            r#"<html><body><article>
               <p>{} Keep this. Join the discussion with other readers</p>
               </article></body></html>"#,
            filler(40)
        );

        let page = extract::extract(
            &html,
            "https://example.com/learn/a",
            &ExtractRules::default(),
        );
        assert!(page.body.ends_with("Keep this."));
        assert!(!page.body.contains("discussion"));
    }

    #[test]
    fn test_custom_marker_set_is_honored() {
        let rules = ExtractRules {
            boilerplate_markers: vec!["Questions".to_string()],
            ..ExtractRules::default()
        };
        let html = format!(
            "<html><body><article><p>{} Questions welcome</p></article></body></html>",
            filler(40)
        );

        let page = extract::extract(&html, "https://example.com/learn/a", &rules);
        assert!(!page.body.contains("Questions"));
    }
}
