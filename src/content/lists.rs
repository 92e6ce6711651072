//! Rules shared by every repeatable list field (photos, videos, paragraphs...).

/// An entry the admin editor left empty.
pub trait Blank {
    fn is_blank(&self) -> bool;
}

impl Blank for String {
    fn is_blank(&self) -> bool {
        self.trim().is_empty()
    }
}

/// Drop blank entries, keeping the order of the rest.
pub fn compact<T: Blank>(items: Vec<T>) -> Vec<T> {
    items.into_iter().filter(|item| !item.is_blank()).collect()
}

/// Trim a string field; blank becomes `None`.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
