//! Phone number normalization for outbound messaging.
//!
//! Member phone numbers are entered free-form (spaces, dashes, optional
//! leading `+`, with or without a country code). Messaging providers expect
//! an E.164-like `+<country><national>` string, so [`normalize_phone`]
//! canonicalizes leniently and only rejects numbers that are clearly too
//! short to dial.

/// Default country calling code for this deployment (India).
pub const DEFAULT_COUNTRY_CODE: &str = "91";

/// Length of a bare national number without country code.
pub const NATIONAL_NUMBER_LENGTH: usize = 10;

/// Minimum digit count of a normalized number.
pub const MIN_PHONE_DIGITS: usize = 10;

/// Error returned when a phone number cannot be made dispatchable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PhoneError {
    #[error("Invalid phone number '{raw}': only {digits} digits after normalization")]
    InvalidPhoneNumber { raw: String, digits: usize },
}

/// Country-prefix rules used by [`normalize_phone`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneRules {
    /// Prepended to bare national numbers.
    pub default_country_code: String,
    /// Digit count of a bare national number.
    pub national_length: usize,
    /// `(prefix, total_length)` pairs recognised as already carrying a country code.
    pub known_prefixes: Vec<(String, usize)>,
    /// Numbers with fewer digits than this are rejected.
    pub min_digits: usize,
}

impl PhoneRules {
    /// Rules for a deployment whose default country code is `country_code`.
    ///
    /// The default code is always recognised at `code + national` length;
    /// North American `1` + 10 digits is recognised as well.
    pub fn with_country_code(country_code: &str) -> Self {
        let code = country_code.trim().trim_start_matches('+').to_string();
        let mut known_prefixes = vec![(code.clone(), code.len() + NATIONAL_NUMBER_LENGTH)];
        if code != "1" {
            known_prefixes.push(("1".to_string(), 1 + NATIONAL_NUMBER_LENGTH));
        }
        Self {
            default_country_code: code,
            national_length: NATIONAL_NUMBER_LENGTH,
            known_prefixes,
            min_digits: MIN_PHONE_DIGITS,
        }
    }
}

impl Default for PhoneRules {
    fn default() -> Self {
        Self::with_country_code(DEFAULT_COUNTRY_CODE)
    }
}

/// Canonicalize a free-form phone string into `+<countrycode><number>` shape.
///
/// 1. Strip every non-digit character.
/// 2. A recognised country prefix at its expected length gets a `+`.
/// 3. A bare national number gets `+<default country code>`.
/// 4. Anything else gets a `+` as a last resort.
///
/// No dialability check is made beyond the minimum digit count.
///
/// # Examples
///
/// ```
/// use gymflow_core::phone::{normalize_phone, PhoneRules};
///
/// let rules = PhoneRules::default();
/// assert_eq!(normalize_phone("98765 43210", &rules).unwrap(), "+919876543210");
/// assert_eq!(normalize_phone("+91-98765-43210", &rules).unwrap(), "+919876543210");
/// assert!(normalize_phone("12345", &rules).is_err());
/// ```
pub fn normalize_phone(raw: &str, rules: &PhoneRules) -> Result<String, PhoneError> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();

    let has_known_prefix = rules
        .known_prefixes
        .iter()
        .any(|(prefix, len)| digits.len() == *len && digits.starts_with(prefix.as_str()));

    let normalized = if has_known_prefix {
        format!("+{digits}")
    } else if digits.len() == rules.national_length {
        format!("+{}{digits}", rules.default_country_code)
    } else {
        format!("+{digits}")
    };

    let digit_count = normalized.len() - 1;
    if digit_count < rules.min_digits {
        return Err(PhoneError::InvalidPhoneNumber {
            raw: raw.to_string(),
            digits: digit_count,
        });
    }

    Ok(normalized)
}
