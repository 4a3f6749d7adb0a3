//! Violation descriptors handed to code-fix providers
//!
//! Rule checks are external producers; the engine only consumes what they
//! report. A descriptor is immutable once built.

use std::collections::BTreeMap;
use std::fmt;

use rowan::TextRange;

/// Well-known descriptor property keys
pub mod property_keys {
    /// Present (any value) when the reporting rule decided no fix is safe
    pub const NO_CODE_FIX: &str = "noCodeFix";
    /// Canonical replacement text computed by the rule
    pub const EXPECTED_TEXT: &str = "expectedText";
    /// Name of the member the violation refers to
    pub const MEMBER_NAME: &str = "memberName";
}

/// One reported style violation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ViolationDescriptor {
    rule_id: String,
    location: TextRange,
    properties: BTreeMap<String, String>,
}

impl ViolationDescriptor {
    pub fn new(rule_id: impl Into<String>, location: TextRange) -> Self {
        Self {
            rule_id: rule_id.into(),
            location,
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn rule_id(&self) -> &str {
        &self.rule_id
    }

    pub fn location(&self) -> TextRange {
        self.location
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// The producer flagged this violation as not safely fixable
    pub fn no_code_fix(&self) -> bool {
        self.properties.contains_key(property_keys::NO_CODE_FIX)
    }

    pub fn expected_text(&self) -> Option<&str> {
        self.property(property_keys::EXPECTED_TEXT)
    }

    pub fn member_name(&self) -> Option<&str> {
        self.property(property_keys::MEMBER_NAME)
    }
}

impl fmt::Display for ViolationDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at {}..{}",
            self.rule_id,
            u32::from(self.location.start()),
            u32::from(self.location.end())
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_bag() {
        let range = TextRange::new(4.into(), 9.into());
        let descriptor = ViolationDescriptor::new("SA1200", range)
            .with_property(property_keys::NO_CODE_FIX, "")
            .with_property(property_keys::EXPECTED_TEXT, "System");

        assert!(descriptor.no_code_fix());
        assert_eq!(descriptor.expected_text(), Some("System"));
        assert_eq!(descriptor.member_name(), None);
        assert_eq!(descriptor.to_string(), "SA1200 at 4..9");
    }
}
