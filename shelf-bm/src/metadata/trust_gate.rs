//! Metadata trust gate
//!
//! A provider record is usable only when it says it found the book and the
//! identifier it claims to have read matches the requested one exactly (after
//! cleaning). There is no override: a near miss is a different book.

use super::ProviderRecord;
use crate::isbn;

/// Shortest claimed identifier accepted (the 10-character form)
pub const MIN_CLAIMED_LEN: usize = 10;

/// Outcome of the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustVerdict {
    /// Record may be shown to the user
    Trusted,
    /// Provider reported no confident match
    NotFound,
    /// Claimed identifier missing, too short, or different from the request
    IsbnMismatch,
}

impl TrustVerdict {
    pub fn is_trusted(self) -> bool {
        self == TrustVerdict::Trusted
    }
}

/// Evaluate `record` against the cleaned requested identifier
pub fn evaluate(requested: &str, record: &ProviderRecord) -> TrustVerdict {
    if !record.found {
        return TrustVerdict::NotFound;
    }

    let claimed = record
        .source_isbn
        .as_deref()
        .map(isbn::strip)
        .unwrap_or_default();

    if claimed.is_empty()
        || claimed.len() < MIN_CLAIMED_LEN
        || !isbn::same_identifier(&claimed, requested)
    {
        return TrustVerdict::IsbnMismatch;
    }

    TrustVerdict::Trusted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plausible_record(source_isbn: Option<&str>) -> ProviderRecord {
        ProviderRecord {
            found: true,
            source_isbn: source_isbn.map(str::to_string),
            title: Some("Kuyucakli Yusuf".to_string()),
            author: Some("Sabahattin Ali".to_string()),
            publisher: Some("YKY".to_string()),
            page_count: Some(224),
            published_date: Some("2014".to_string()),
            description: Some("A novel.".to_string()),
            categories: vec!["Roman".to_string()],
        }
    }

    #[test]
    fn test_matching_identifier_is_trusted() {
        let record = plausible_record(Some("978-605-080-000-1"));
        assert_eq!(evaluate("9786050800001", &record), TrustVerdict::Trusted);
    }

    #[test]
    fn test_off_by_one_identifier_is_rejected() {
        let record = plausible_record(Some("9786050800002"));
        assert_eq!(evaluate("9786050800001", &record), TrustVerdict::IsbnMismatch);
    }

    #[test]
    fn test_not_found_is_rejected_even_with_matching_identifier() {
        let mut record = plausible_record(Some("9786050800001"));
        record.found = false;
        assert_eq!(evaluate("9786050800001", &record), TrustVerdict::NotFound);
    }

    #[test]
    fn test_missing_or_short_claim_is_rejected() {
        assert_eq!(
            evaluate("9786050800001", &plausible_record(None)),
            TrustVerdict::IsbnMismatch
        );
        assert_eq!(
            evaluate("9786050800001", &plausible_record(Some("n/a"))),
            TrustVerdict::IsbnMismatch
        );
        // Short identifiers never pass, even when equal to a short request
        assert_eq!(evaluate("12345", &plausible_record(Some("12345"))), TrustVerdict::IsbnMismatch);
    }

    #[test]
    fn test_alternate_form_is_not_the_requested_form() {
        let record = plausible_record(Some("6050800006"));
        assert_eq!(evaluate("9786050800001", &record), TrustVerdict::IsbnMismatch);
    }

    #[test]
    fn test_x_terminator_case_insensitive() {
        let record = plausible_record(Some("0-8044-2957-x"));
        assert!(evaluate("080442957X", &record).is_trusted());
    }

    #[test]
    fn test_empty_record_is_rejected() {
        assert_eq!(
            evaluate("9786050800001", &ProviderRecord::default()),
            TrustVerdict::NotFound
        );
    }
}
