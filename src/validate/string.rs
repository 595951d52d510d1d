use once_cell::sync::Lazy;
use regex::Regex;

use crate::ast::StringRule;

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^(([^<>()\[\]\\.,;:\s@"]+(\.[^<>()\[\]\\.,;:\s@"]+)*)|(".+"))@((\[[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\])|(([a-zA-Z\-0-9]+\.)+[a-zA-Z]{2,}))$"#,
    )
    .expect("email pattern is valid")
});

/// Canonical 8-4-4-4-12 grouping, either case.
static UUID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("uuid pattern is valid")
});

pub fn is_email(s: &str) -> bool {
    EMAIL.is_match(s)
}

pub fn is_uuid(s: &str) -> bool {
    UUID.is_match(s)
}

/// Length in Unicode scalar values.
fn length(s: &str) -> f64 {
    s.chars().count() as f64
}

/// `Err` carries the diagnostic message.
pub fn check(s: &str, rule: &StringRule) -> Result<(), String> {
    match *rule {
        StringRule::Email if !is_email(s) => Err("Invalid email address".to_string()),
        StringRule::Uuid if !is_uuid(s) => Err("String is not a valid uuid".to_string()),
        StringRule::Min(min) if length(s) < min => Err(format!("String length must be at least {min}")),
        StringRule::Max(max) if length(s) > max => Err(format!("String length must not exceed {max}")),
        StringRule::Length(len) if length(s) != len => Err(format!("String length must equal {len}")),
        StringRule::Email | StringRule::Uuid | StringRule::Min(_) | StringRule::Max(_) | StringRule::Length(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_addresses() {
        for ok in ["a@b.co", "first.last@example.com", "\"odd name\"@example.org", "x@[127.0.0.1]"] {
            assert!(is_email(ok), "{ok}");
        }
        for bad in ["", "plain", "a@b", "a b@example.com", "a@@example.com", "a@example.c"] {
            assert!(!is_email(bad), "{bad}");
        }
    }

    #[test]
    fn uuids() {
        assert!(is_uuid("e1839888-6967-49c8-9134-eab4e0894436"));
        assert!(is_uuid("E1839888-6967-49C8-9134-EAB4E0894436"));
        assert!(!is_uuid("e1839888-696749c8-9134-eab4e0894436"));
        assert!(!is_uuid("e1839888-6967-49c8-9134-eab4e089443"));
        assert!(!is_uuid("g1839888-6967-49c8-9134-eab4e0894436"));
    }

    #[test]
    fn length_rules() {
        let len4 = StringRule::Length(4.0);
        assert!(check("abcd", &len4).is_ok());
        assert_eq!(check("abc", &len4).unwrap_err(), "String length must equal 4");
        assert!(check("abcde", &len4).is_err());

        assert!(check("ab", &StringRule::Min(2.0)).is_ok());
        assert_eq!(check("a", &StringRule::Min(2.0)).unwrap_err(), "String length must be at least 2");
        assert!(check("ab", &StringRule::Max(2.0)).is_ok());
        assert_eq!(check("abc", &StringRule::Max(2.0)).unwrap_err(), "String length must not exceed 2");
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        assert!(check("αβγ", &StringRule::Length(3.0)).is_ok());
    }
}
