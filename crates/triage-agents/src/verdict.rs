//! Approval detection on reviewer replies.
//!
//! The reviewer's output format is unconstrained natural language, so
//! approval is a case-sensitive substring check for a fixed marker;
//! deliberately crude, and kept that way on purpose. Absence of the
//! marker means "not approved", never an error.

/// The literal token the reviewer emits to approve a patch.
pub const APPROVAL_MARKER: &str = "LGTM";

/// Alias the reviewer sometimes emits instead of (or alongside) the token.
pub const APPROVAL_ALIAS: &str = "\u{1F44D}"; // 👍

/// Whether `reply` signals approval. Position in the text is irrelevant;
/// the check is idempotent.
pub fn is_approved(reply: &str) -> bool {
    reply.contains(APPROVAL_MARKER) || reply.contains(APPROVAL_ALIAS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_anywhere_approves() {
        assert!(is_approved("LGTM"));
        assert!(is_approved("Looks solid. LGTM!"));
        assert!(is_approved("LGTM - ship it, minor nits inline"));
    }

    #[test]
    fn test_alias_approves() {
        assert!(is_approved("👍"));
        assert!(is_approved("LGTM 👍"));
    }

    #[test]
    fn test_absence_is_not_approved() {
        assert!(!is_approved(""));
        assert!(!is_approved("The patch does not handle the empty case."));
    }

    #[test]
    fn test_check_is_case_sensitive() {
        assert!(!is_approved("lgtm"));
        assert!(!is_approved("Lgtm overall but fix the loop bound"));
    }

    #[test]
    fn test_idempotent() {
        let reply = "Nice work. LGTM";
        assert_eq!(is_approved(reply), is_approved(reply));
    }
}
