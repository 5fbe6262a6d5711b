//! Payment type normalization.
//!
//! Source exports record how a customer paid in free Korean text. The mobile
//! app only understands three values, so everything is folded onto those.

use serde::Serialize;
use std::fmt;

/// Canonical payment method stored by the mobile app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    #[default]
    Cash,
    Card,
    Transfer,
}

impl PaymentType {
    /// Map a human-entered payment descriptor onto a canonical value.
    ///
    /// Unknown and empty descriptors fall back to [`PaymentType::Cash`].
    pub fn from_source_text(text: &str) -> Self {
        match text.trim() {
            "현금" => PaymentType::Cash,
            "카드" => PaymentType::Card,
            "송금" | "계좌이체" | "이체" | "무통장입금" => PaymentType::Transfer,
            _ => PaymentType::Cash,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::Cash => "cash",
            PaymentType::Card => "card",
            PaymentType::Transfer => "transfer",
        }
    }
}

impl fmt::Display for PaymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_descriptors() {
        assert_eq!(PaymentType::from_source_text("현금"), PaymentType::Cash);
        assert_eq!(PaymentType::from_source_text("카드"), PaymentType::Card);
        for transfer in ["송금", "계좌이체", "이체", "무통장입금"] {
            assert_eq!(PaymentType::from_source_text(transfer), PaymentType::Transfer);
        }
    }

    #[test]
    fn test_descriptor_is_trimmed() {
        assert_eq!(PaymentType::from_source_text("  카드 "), PaymentType::Card);
    }

    #[test]
    fn test_unknown_falls_back_to_cash() {
        assert_eq!(PaymentType::from_source_text(""), PaymentType::Cash);
        assert_eq!(PaymentType::from_source_text("card"), PaymentType::Cash);
        assert_eq!(PaymentType::from_source_text("상품권"), PaymentType::Cash);
    }

    #[test]
    fn test_canonical_strings() {
        assert_eq!(PaymentType::Transfer.to_string(), "transfer");
        assert_eq!(
            serde_json::to_string(&PaymentType::Card).unwrap(),
            "\"card\""
        );
    }
}
