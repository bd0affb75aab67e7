use typedconf_types::{ConfigTree, KeyDialect};

use super::KeyCombinationStrategy;

/// Joins keys with a fixed delimiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelimitedKeyCombination {
    delimiter: String,
}

impl DelimitedKeyCombination {
    pub fn new(delimiter: impl Into<String>) -> Self {
        Self {
            delimiter: delimiter.into(),
        }
    }

    pub fn dot() -> Self {
        Self::new(".")
    }

    pub fn slash() -> Self {
        Self::new("/")
    }
}

impl KeyCombinationStrategy for DelimitedKeyCombination {
    fn combine(&self, base: &str, local: &str, _tree: &dyn ConfigTree) -> String {
        combine_delimited(base, local, &self.delimiter)
    }
}

/// Picks the delimiter from the store's key dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmartKeyCombination;

impl KeyCombinationStrategy for SmartKeyCombination {
    fn combine(&self, base: &str, local: &str, tree: &dyn ConfigTree) -> String {
        match tree.dialect() {
            KeyDialect::Delimited(delimiter) => combine_delimited(base, local, &delimiter),
            KeyDialect::XPath => combine_delimited(base, local, "/"),
            KeyDialect::Other => combine_delimited(base, local, "."),
        }
    }
}

/// Joins `base` and `local` with exactly one `delimiter` between them.
///
/// A blank base yields `local` and a blank local yields `base`. Attribute keys (`[@name]`) attach
/// directly to the base node.
pub fn combine_delimited(base: &str, local: &str, delimiter: &str) -> String {
    if base.trim().is_empty() {
        return local.to_string();
    }
    if local.trim().is_empty() {
        return base.to_string();
    }
    let base_delimited = base.ends_with(delimiter);
    let local_delimited = local.starts_with(delimiter);
    if base_delimited && local_delimited {
        return format!("{base}{}", &local[delimiter.len()..]);
    }
    if base_delimited || local_delimited || local.starts_with("[@") {
        return format!("{base}{local}");
    }
    format!("{base}{delimiter}{local}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combines_with_exactly_one_delimiter() {
        assert_eq!(combine_delimited("", "doors", "."), "doors");
        assert_eq!(combine_delimited("  ", "doors", "."), "doors");
        assert_eq!(combine_delimited("car", "doors", "."), "car.doors");
        assert_eq!(combine_delimited("car.", "doors", "."), "car.doors");
        assert_eq!(combine_delimited("car", ".doors", "."), "car.doors");
        assert_eq!(combine_delimited("car.", ".doors", "."), "car.doors");
        assert_eq!(combine_delimited("car/", "/doors", "/"), "car/doors");
        assert_eq!(combine_delimited("car", "doors", "::"), "car::doors");
    }

    #[test]
    fn attributes_attach_to_the_base_node() {
        assert_eq!(combine_delimited("car", "[@name]", "."), "car[@name]");
    }

    #[test]
    fn blank_local_keeps_the_base() {
        assert_eq!(combine_delimited("car", "", "."), "car");
    }
}
