//! IATI codelists and link templates used by the transformations.

/// All monetary totals are expressed in this currency; conversion
/// happens in the upstream ingest.
pub const CURRENCY_USD: &str = "USD";

/// Transaction types that represent genuine fund movement: Incoming
/// Funds, Outgoing Commitment, Disbursement, Expenditure and Incoming
/// Commitment. Only these qualify for the coarse FUNDS aggregation.
pub const FUND_TRANSACTION_TYPES: &[&str] = &["1", "2", "3", "4", "11"];

/// Human-readable name for an IATI transaction-type code.
pub fn transaction_type_name(code: &str) -> Option<&'static str> {
    match code {
        "1" => Some("Incoming Funds"),
        "2" => Some("Outgoing Commitment"),
        "3" => Some("Disbursement"),
        "4" => Some("Expenditure"),
        "5" => Some("Interest Payment"),
        "6" => Some("Loan Repayment"),
        "7" => Some("Reimbursement"),
        "8" => Some("Purchase of Equity"),
        "9" => Some("Sale of Equity"),
        "10" => Some("Credit Guarantee"),
        "11" => Some("Incoming Commitment"),
        "12" => Some("Outgoing Pledge"),
        "13" => Some("Incoming Pledge"),
        _ => None,
    }
}

/// d-portal view of a published activity.
pub fn activity_dportal_link(iatiidentifier: &str) -> String {
    format!("http://d-portal.org/q.html?aid={iatiidentifier}")
}

/// d-portal view of a publishing organisation.
pub fn organisation_dportal_link(organisationidentifier: &str) -> String {
    format!("http://d-portal.org/ctrack.html?publisher={organisationidentifier}#view=main")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_type_names() {
        assert_eq!(transaction_type_name("3"), Some("Disbursement"));
        assert_eq!(transaction_type_name("11"), Some("Incoming Commitment"));
        assert_eq!(transaction_type_name("99"), None);
    }

    #[test]
    fn test_fund_types_are_known_codes() {
        for code in FUND_TRANSACTION_TYPES {
            assert!(transaction_type_name(code).is_some());
        }
    }

    #[test]
    fn test_dportal_links() {
        assert_eq!(
            activity_dportal_link("GB-1-A1"),
            "http://d-portal.org/q.html?aid=GB-1-A1"
        );
        assert!(organisation_dportal_link("GB-1").contains("publisher=GB-1"));
    }
}
