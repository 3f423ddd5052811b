use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PhoneError {
    #[error("phone number must contain only digits, spaces, dashes or parentheses")]
    InvalidCharacters,
    #[error("phone number must be a 10-digit Indian mobile number")]
    InvalidLength,
    #[error("mobile numbers start with 6, 7, 8 or 9")]
    InvalidPrefix,
}

/// Normalise an Indian mobile number to E.164 (`+91XXXXXXXXXX`).
///
/// Accepts the bare 10 digits or the same digits prefixed by `0`, `91` or `+91`.
pub fn normalize_phone(raw: &str) -> Result<String, PhoneError> {
    let trimmed = raw.trim();
    let (plus, rest) = match trimmed.strip_prefix('+') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };

    let mut digits = String::with_capacity(rest.len());
    for ch in rest.chars() {
        match ch {
            '0'..='9' => digits.push(ch),
            ' ' | '-' | '(' | ')' | '.' => {}
            _ => return Err(PhoneError::InvalidCharacters),
        }
    }

    let national = match digits.len() {
        10 if !plus => digits.as_str(),
        11 if !plus && digits.starts_with('0') => &digits[1..],
        12 if digits.starts_with("91") => &digits[2..],
        _ => return Err(PhoneError::InvalidLength),
    };

    match national.as_bytes().first() {
        Some(b'6'..=b'9') => Ok(format!("+91{national}")),
        _ => Err(PhoneError::InvalidPrefix),
    }
}

/// `+91******3210` style rendering for logs and responses.
pub fn mask_phone(e164: &str) -> String {
    let visible = e164.len().saturating_sub(4);
    let (head, tail) = e164.split_at(visible);
    let prefix: String = head.chars().take(3).collect();
    let hidden = head.chars().count().saturating_sub(3);
    format!("{prefix}{}{tail}", "*".repeat(hidden))
}
