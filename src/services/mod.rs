pub mod blog;
pub mod categories;
pub mod orders;
pub mod products;
pub mod slides;
pub mod trusted_companies;
pub mod users;

use crate::errors::ServiceError;
use uuid::Uuid;

/// Ids arrive as free text (query strings, path segments). Anything that is
/// not a UUID cannot match a row, so it reads as "not found".
pub fn parse_id(raw: &str, not_found: &str) -> Result<Uuid, ServiceError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ServiceError::NotFound(not_found.to_string()))
}

/// Trimmed value, or `None` when blank.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trimmed required field; `message` when missing or blank.
pub(crate) fn required(value: Option<String>, message: &str) -> Result<String, ServiceError> {
    non_blank(value).ok_or_else(|| ServiceError::ValidationError(message.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn malformed_ids_read_as_not_found() {
        assert_matches!(
            parse_id("not-a-uuid", "Category not found"),
            Err(ServiceError::NotFound(msg)) if msg == "Category not found"
        );
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&format!(" {id} "), "x").unwrap(), id);
    }

    #[test]
    fn required_trims_and_rejects_blank() {
        assert_eq!(required(Some("  Laptops ".into()), "x").unwrap(), "Laptops");
        assert_matches!(required(Some("   ".into()), "Name is required"), Err(ServiceError::ValidationError(m)) if m == "Name is required");
        assert!(required(None, "x").is_err());
        assert_eq!(non_blank(Some(" ".into())), None);
    }
}
