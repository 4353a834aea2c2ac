use crate::error::ReferenceError;
use std::fmt;

/// A parsed field reference: an optional module key and a field id.
///
/// `"Applicant.age"` refers to field `age` of module `Applicant`; `"age"` refers to
/// the current module. Only the first `.` separates, so `"Applicant.address.city"`
/// is field `address.city` of module `Applicant`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldReference {
    pub module_key: Option<String>,
    pub field_id: String,
}

impl FieldReference {
    pub fn parse(reference: &str) -> Result<Self, ReferenceError> {
        if reference.trim().is_empty() {
            return Err(ReferenceError::InvalidReference(reference.to_string()));
        }

        match reference.find('.') {
            Some(dot) if dot > 0 && dot < reference.len() - 1 => Ok(Self {
                module_key: Some(reference[..dot].to_string()),
                field_id: reference[dot + 1..].to_string(),
            }),
            _ => Ok(Self {
                module_key: None,
                field_id: reference.to_string(),
            }),
        }
    }

    pub fn is_qualified(&self) -> bool {
        self.module_key.is_some()
    }
}

impl fmt::Display for FieldReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.module_key {
            Some(module) => write!(f, "{}.{}", module, self.field_id),
            None => write!(f, "{}", self.field_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unqualified_reference() {
        let r = FieldReference::parse("age").unwrap();
        assert_eq!(r.module_key, None);
        assert_eq!(r.field_id, "age");
    }

    #[test]
    fn test_qualified_reference_splits_on_first_dot() {
        let r = FieldReference::parse("Applicant.address.city").unwrap();
        assert_eq!(r.module_key.as_deref(), Some("Applicant"));
        assert_eq!(r.field_id, "address.city");
        assert_eq!(r.to_string(), "Applicant.address.city");
    }

    #[test]
    fn test_leading_or_trailing_dot_is_not_a_separator() {
        let leading = FieldReference::parse(".age").unwrap();
        assert_eq!(leading.module_key, None);
        assert_eq!(leading.field_id, ".age");

        let trailing = FieldReference::parse("Applicant.").unwrap();
        assert_eq!(trailing.module_key, None);
        assert_eq!(trailing.field_id, "Applicant.");
    }

    #[test]
    fn test_blank_reference_is_invalid() {
        assert!(matches!(
            FieldReference::parse(""),
            Err(ReferenceError::InvalidReference(_))
        ));
        assert!(FieldReference::parse("   ").is_err());
    }
}
