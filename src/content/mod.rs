/*!
 * Content rules
 * Field checks, list compaction, media links and listing buckets shared by
 * every document type.
 */
pub mod grouping;
pub mod lists;
pub mod media;

use crate::error::ValidationErrors;

/// Sanitize HTML content using ammonia
pub fn sanitize_html(html: &str) -> String {
    ammonia::clean(html)
}

/// Take a required string field, recording an error when it is absent or blank.
pub fn required(errors: &mut ValidationErrors, field: &str, value: Option<String>) -> String {
    match lists::non_blank(value) {
        Some(v) => v,
        None => {
            errors.add(field, "is required");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_records_missing_and_blank() {
        let mut errors = ValidationErrors::new();
        assert_eq!(required(&mut errors, "title", Some(" X ".into())), "X");
        required(&mut errors, "name", None);
        required(&mut errors, "review", Some("   ".into()));
        let fields: Vec<&str> = errors.fields().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "review"]);
    }

    #[test]
    fn test_sanitize_html_strips_scripts() {
        let clean = sanitize_html("<p>Hi</p><script>alert(1)</script>");
        assert!(clean.contains("<p>Hi</p>"));
        assert!(!clean.contains("script"));
    }
}
