//! Queue-name permission check for mutating emoji operations.

const APPLICANT_TOKEN: &str = "DASHBOARD_QUEUE";
const RECIPIENT_TOKEN: &str = "CORE_QUEUE";

/// Identity pair carried by a mutating request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionRequest<'a> {
    pub applicant: &'a str,
    pub recipient: &'a str,
}

fn contains_ignore_case(haystack: &str, token: &str) -> bool {
    haystack.to_ascii_uppercase().contains(token)
}

/// True iff the applicant names the dashboard queue and the recipient the core queue.
pub fn check_authorization(req: &PermissionRequest<'_>) -> bool {
    contains_ignore_case(req.applicant, APPLICANT_TOKEN) && contains_ignore_case(req.recipient, RECIPIENT_TOKEN)
}
