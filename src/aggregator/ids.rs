//! Account id parsing and validation.

use crate::domain::GatewayError;

pub const MAX_ID_LEN: usize = 64;

/// Accept 1-64 chars of `[A-Za-z0-9_.-]`.
pub fn validate_account_id(account_id: &str) -> Result<(), GatewayError> {
    if account_id.is_empty() {
        return Err(GatewayError::Validation("account id must not be empty".into()));
    }
    if account_id.len() > MAX_ID_LEN {
        return Err(GatewayError::Validation(format!(
            "account id exceeds {MAX_ID_LEN} characters"
        )));
    }
    if let Some(bad) = account_id
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')))
    {
        return Err(GatewayError::Validation(format!(
            "account id '{account_id}' contains invalid character {bad:?}"
        )));
    }
    Ok(())
}

/// Split `a,b,c`, trimming whitespace and dropping empty segments.
pub fn parse_id_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_conventional_ids() {
        for id in ["BNK-1001", "CC-2001", "leg.5001", "x_1"] {
            assert!(validate_account_id(id).is_ok(), "{id}");
        }
    }

    #[test]
    fn rejects_malformed_ids() {
        let too_long = "A".repeat(MAX_ID_LEN + 1);
        for id in ["", "BNK 1", "BNK/1", "../etc", "ÄCC-1", too_long.as_str()] {
            assert!(validate_account_id(id).is_err(), "{id}");
        }
        assert!(validate_account_id(&"A".repeat(MAX_ID_LEN)).is_ok());
    }

    #[test]
    fn parses_comma_separated_list() {
        assert_eq!(parse_id_list(" BNK-1, ,LN-2,,CC-3 "), vec!["BNK-1", "LN-2", "CC-3"]);
        assert!(parse_id_list(" , ").is_empty());
    }
}
