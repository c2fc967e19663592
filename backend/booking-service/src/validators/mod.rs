/// Input validation rules shared by the handlers
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use validator::ValidateEmail;

static PHONE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9\s\-+()]*$").expect("phone pattern is valid"));

/// Shortest accepted phone number or hotline, separators included
pub const MIN_PHONE_LEN: usize = 10;

pub fn validate_email(email: &str) -> bool {
    email.validate_email()
}

/// Digits, spaces, `-`, `+` and parentheses; at least ten characters.
pub fn validate_phone(phone: &str) -> bool {
    phone.len() >= MIN_PHONE_LEN && PHONE_PATTERN.is_match(phone)
}

/// Registration passwords: 8..=255 chars with a lowercase letter, an
/// uppercase letter and a digit.
pub fn validate_password(password: &str) -> bool {
    if password.len() < 8 || password.len() > 255 {
        return false;
    }

    let has_lower = password.chars().any(|c| c.is_lowercase());
    has_lower && validate_profile_password(password)
}

/// Looser rule applied when a profile is edited.
pub fn validate_profile_password(password: &str) -> bool {
    let has_upper = password.chars().any(|c| c.is_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    has_upper && has_digit
}

pub fn validate_gender(gender: i16) -> bool {
    matches!(gender, 0 | 1)
}

pub fn validate_date_of_birth(date_of_birth: NaiveDate, today: NaiveDate) -> bool {
    date_of_birth < today
}

/// Price filter used by hotel search.
pub fn validate_price_range(min_price: f64, max_price: f64) -> Result<(), String> {
    if min_price < 0.0 || max_price < 0.0 {
        return Err("Prices must not be negative".to_string());
    }
    if min_price == 0.0 && max_price == 0.0 {
        return Err("Price range must not be empty".to_string());
    }
    if min_price == max_price {
        return Err("Min price and max price must differ".to_string());
    }
    if min_price > max_price {
        return Err("Min price must be less than max price".to_string());
    }
    Ok(())
}

/// Minimum-rating filter for hotel search.
pub fn validate_rating_filter(rating: f64) -> bool {
    (0.0..=5.0).contains(&rating)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("guest@example.com"));
        assert!(!validate_email("guest@"));
        assert!(!validate_email("not-an-email"));
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("+84 (236) 123-4567"));
        assert!(validate_phone("0905123456"));
        assert!(!validate_phone("090512345"));
        assert!(!validate_phone("0905-ABC-4567"));
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("Sunny1Beach"));
        assert!(!validate_password("sunny1beach"));
        assert!(!validate_password("SUNNY1BEACH"));
        assert!(!validate_password("SunnyBeach"));
        assert!(!validate_password("Sun1"));
    }

    #[test]
    fn test_validate_profile_password() {
        assert!(validate_profile_password("BEACH2024"));
        assert!(!validate_profile_password("beach2024"));
        assert!(!validate_profile_password("Beach"));
    }

    #[test]
    fn test_validate_gender() {
        assert!(validate_gender(0));
        assert!(validate_gender(1));
        assert!(!validate_gender(2));
    }

    #[test]
    fn test_validate_date_of_birth() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert!(validate_date_of_birth(
            NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            today
        ));
        assert!(!validate_date_of_birth(today, today));
    }

    #[test]
    fn test_validate_price_range() {
        assert!(validate_price_range(50.0, 200.0).is_ok());
        assert!(validate_price_range(0.0, 100.0).is_ok());
        assert!(validate_price_range(-1.0, 100.0).is_err());
        assert!(validate_price_range(0.0, 0.0).is_err());
        assert!(validate_price_range(100.0, 100.0).is_err());
        assert!(validate_price_range(200.0, 50.0).is_err());
    }

    #[test]
    fn test_validate_ratings() {
        assert!(validate_rating_filter(0.0));
        assert!(validate_rating_filter(4.5));
        assert!(!validate_rating_filter(5.5));
    }
}
