use serde::{Deserialize, Serialize};
use crate::error::{ReclaimError, Result};

/// QRS filter comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    /// Substring of
    So,
    /// Starts with
    Sw,
    /// Ends with
    Ew,
}

impl FilterOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Ne => "ne",
            FilterOp::Gt => "gt",
            FilterOp::Ge => "ge",
            FilterOp::Lt => "lt",
            FilterOp::Le => "le",
            FilterOp::So => "so",
            FilterOp::Sw => "sw",
            FilterOp::Ew => "ew",
        }
    }
}

impl std::fmt::Display for FilterOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single `<property> <op> '<value>'` filter expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    property: String,
    op: FilterOp,
    value: String,
}

impl Filter {
    /// Property paths are limited to `[A-Za-z0-9_.]` so they can't break out of the expression.
    pub fn new(property: &str, op: FilterOp, value: &str) -> Result<Self> {
        let valid = !property.is_empty()
            && property
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');

        if !valid {
            return Err(ReclaimError::Config(format!(
                "Invalid filter property: '{}'",
                property
            )));
        }

        Ok(Self {
            property: property.to_string(),
            op,
            value: value.to_string(),
        })
    }

    pub fn eq(property: &str, value: &str) -> Result<Self> {
        Self::new(property, FilterOp::Eq, value)
    }

    /// Unencoded expression; single quotes inside the value are doubled
    pub fn expression(&self) -> String {
        format!(
            "{} {} '{}'",
            self.property,
            self.op,
            self.value.replace('\'', "''")
        )
    }

    /// Percent-encoded `filter=...` query parameter
    pub fn to_query_param(&self) -> String {
        format!("filter={}", urlencoding::encode(&self.expression()))
    }
}

impl std::fmt::Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.expression())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expression_format() {
        let filter = Filter::eq("name", "sa_repository").unwrap();
        assert_eq!(filter.expression(), "name eq 'sa_repository'");
    }

    #[test]
    fn test_quotes_are_escaped() {
        let filter = Filter::new("user.name", FilterOp::Sw, "o'brien").unwrap();
        assert_eq!(filter.expression(), "user.name sw 'o''brien'");
    }

    #[test]
    fn test_query_param_is_percent_encoded() {
        let filter = Filter::eq("name", "a&b=c").unwrap();
        let param = filter.to_query_param();

        assert_eq!(param, "filter=name%20eq%20%27a%26b%3Dc%27");
        let decoded = urlencoding::decode(param.trim_start_matches("filter=")).unwrap();
        assert_eq!(decoded, "name eq 'a&b=c'");
    }

    #[test]
    fn test_rejects_injected_property() {
        assert!(Filter::eq("name eq 'x' or id", "y").is_err());
        assert!(Filter::eq("", "y").is_err());
    }
}
