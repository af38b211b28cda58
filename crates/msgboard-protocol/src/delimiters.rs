use crate::error::ProtocolError;

/// Separates fields within a triple or a command's arguments.
pub const FIELD_DELIMITER: &str = "}+{";

/// Separates batched payload groups under one command word.
pub const MESSAGE_SEPARATOR: &str = "}#{";

/// Ends every request and response.
pub const TRANSMISSION_TERMINATOR: &str = "}}&{{";

/// The three literal sequences of the wire grammar.
///
/// None may be empty and none may be a prefix of another, otherwise
/// tokenizing would be ambiguous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiters {
    field: String,
    separator: String,
    terminator: String,
}

impl Delimiters {
    pub fn new(
        field: impl Into<String>,
        separator: impl Into<String>,
        terminator: impl Into<String>,
    ) -> Result<Self, ProtocolError> {
        let delims = Self {
            field: field.into(),
            separator: separator.into(),
            terminator: terminator.into(),
        };
        delims.validate()?;
        Ok(delims)
    }

    fn validate(&self) -> Result<(), ProtocolError> {
        let named = [
            ("field delimiter", &self.field),
            ("message separator", &self.separator),
            ("transmission terminator", &self.terminator),
        ];

        for (name, value) in named {
            if value.is_empty() {
                return Err(ProtocolError::EmptyDelimiter { name });
            }
        }

        for (i, (shorter, shorter_value)) in named.iter().enumerate() {
            for (j, (longer, longer_value)) in named.iter().enumerate() {
                if i != j && longer_value.starts_with(shorter_value.as_str()) {
                    return Err(ProtocolError::AmbiguousDelimiters {
                        shorter: *shorter,
                        shorter_value: shorter_value.to_string(),
                        longer: *longer,
                        longer_value: longer_value.to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    pub fn terminator(&self) -> &str {
        &self.terminator
    }
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            field: FIELD_DELIMITER.to_string(),
            separator: MESSAGE_SEPARATOR.to_string(),
            terminator: TRANSMISSION_TERMINATOR.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let defaults = Delimiters::default();
        assert!(defaults.validate().is_ok());
        assert_eq!(defaults.field(), "}+{");
        assert_eq!(defaults.separator(), "}#{");
        assert_eq!(defaults.terminator(), "}}&{{");
    }

    #[test]
    fn rejects_empty_sequence() {
        let err = Delimiters::new("|", "", "\n").unwrap_err();
        assert_eq!(
            err,
            ProtocolError::EmptyDelimiter {
                name: "message separator"
            }
        );
    }

    #[test]
    fn rejects_prefix_overlap() {
        let err = Delimiters::new("|", "||", "\n").unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::AmbiguousDelimiters {
                shorter: "field delimiter",
                longer: "message separator",
                ..
            }
        ));
    }

    #[test]
    fn rejects_identical_sequences() {
        assert!(Delimiters::new("|", "#", "|").is_err());
    }

    #[test]
    fn accepts_custom_distinct_sequences() {
        let delims = Delimiters::new("|", "#", "\n").expect("distinct sequences are valid");
        assert_eq!(delims.terminator(), "\n");
    }
}
