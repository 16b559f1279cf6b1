// ── Field validators ──
//
// Shared by CSV import and the typed create operations. Each validator
// takes the column it validates so the error it returns is already
// attributed; import adds the row number.

use chrono::NaiveDate;
use url::Url;

use crate::error::FieldError;

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_SLUG: &str =
    "Enter a valid 'slug' consisting of letters, numbers, underscores or hyphens.";
pub const INVALID_URL: &str = "Enter a valid URL.";
pub const INVALID_DATE: &str = "Enter a valid date.";
pub const INVALID_NUMBER: &str = "Enter a whole number.";

pub const ASN_MIN: u64 = 1;
pub const ASN_MAX: u64 = 4_294_967_295;

/// Trimmed text, at most `limit` characters. Empty is an error when `required`.
pub fn text(column: &str, raw: &str, limit: usize, required: bool) -> Result<String, FieldError> {
    let value = raw.trim();
    if value.is_empty() && required {
        return Err(FieldError::new(column, REQUIRED));
    }
    let len = value.chars().count();
    if len > limit {
        return Err(FieldError::new(
            column,
            format!("Ensure this value has at most {limit} characters (it has {len})."),
        ));
    }
    Ok(value.to_owned())
}

/// Required slug: letters, digits, underscores and hyphens only.
pub fn slug(column: &str, raw: &str, limit: usize) -> Result<String, FieldError> {
    let value = text(column, raw, limit, true)?;
    if value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        Ok(value)
    } else {
        Err(FieldError::new(column, INVALID_SLUG))
    }
}

/// Optional non-negative integer bounded by `min..=max`.
pub fn bounded(column: &str, raw: &str, min: u64, max: u64) -> Result<Option<u64>, FieldError> {
    let value = raw.trim();
    if value.is_empty() {
        return Ok(None);
    }
    let number: i128 = value
        .parse()
        .map_err(|_| FieldError::new(column, INVALID_NUMBER))?;
    if number < i128::from(min) {
        return Err(FieldError::new(
            column,
            format!("Ensure this value is greater than or equal to {min}."),
        ));
    }
    if number > i128::from(max) {
        return Err(FieldError::new(
            column,
            format!("Ensure this value is less than or equal to {max}."),
        ));
    }
    u64::try_from(number)
        .map(Some)
        .map_err(|_| FieldError::new(column, INVALID_NUMBER))
}

/// Optional autonomous system number.
pub fn asn(column: &str, raw: &str) -> Result<Option<u32>, FieldError> {
    bounded(column, raw, ASN_MIN, ASN_MAX)?
        .map(|n| u32::try_from(n).map_err(|_| FieldError::new(column, INVALID_NUMBER)))
        .transpose()
}

/// Optional rate or speed in Kbps.
pub fn kbps(column: &str, raw: &str) -> Result<Option<u32>, FieldError> {
    bounded(column, raw, 0, u64::from(u32::MAX))?
        .map(|n| u32::try_from(n).map_err(|_| FieldError::new(column, INVALID_NUMBER)))
        .transpose()
}

/// Optional absolute http(s) URL.
pub fn url(column: &str, raw: &str, limit: usize) -> Result<String, FieldError> {
    let value = text(column, raw, limit, false)?;
    if value.is_empty() {
        return Ok(value);
    }
    match Url::parse(&value) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.has_host() => {
            Ok(value)
        }
        _ => Err(FieldError::new(column, INVALID_URL)),
    }
}

/// Optional `YYYY-MM-DD` date.
pub fn date(column: &str, raw: &str) -> Result<Option<NaiveDate>, FieldError> {
    let value = raw.trim();
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| FieldError::new(column, INVALID_DATE))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn message<T: std::fmt::Debug>(result: Result<T, FieldError>) -> String {
        result.unwrap_err().message
    }

    #[test]
    fn text_trims_and_enforces_limits() {
        assert_eq!(text("name", "  Zayo ", 50, true).unwrap(), "Zayo");
        assert_eq!(message(text("name", "   ", 50, true)), REQUIRED);
        assert_eq!(text("comments", "", 50, false).unwrap(), "");
        assert_eq!(
            message(text("account", &"x".repeat(31), 30, false)),
            "Ensure this value has at most 30 characters (it has 31)."
        );
    }

    #[test]
    fn slug_rejects_spaces_and_punctuation() {
        assert_eq!(slug("slug", "level-3_us", 50).unwrap(), "level-3_us");
        assert_eq!(message(slug("slug", "level 3", 50)), INVALID_SLUG);
        assert_eq!(message(slug("slug", "zayo!", 50)), INVALID_SLUG);
        assert_eq!(message(slug("slug", "", 50)), REQUIRED);
    }

    #[test]
    fn asn_range_is_inclusive() {
        assert_eq!(asn("asn", "").unwrap(), None);
        assert_eq!(asn("asn", "1").unwrap(), Some(1));
        assert_eq!(asn("asn", "4294967295").unwrap(), Some(u32::MAX));
        assert_eq!(
            message(asn("asn", "0")),
            "Ensure this value is greater than or equal to 1."
        );
        assert_eq!(
            message(asn("asn", "4294967296")),
            "Ensure this value is less than or equal to 4294967295."
        );
        assert_eq!(message(asn("asn", "AS6461")), INVALID_NUMBER);
    }

    #[test]
    fn kbps_rejects_negative_values() {
        assert_eq!(kbps("commit_rate", "10000").unwrap(), Some(10_000));
        assert_eq!(
            message(kbps("commit_rate", "-5")),
            "Ensure this value is greater than or equal to 0."
        );
    }

    #[test]
    fn url_requires_http_scheme_and_host() {
        assert_eq!(
            url("portal_url", "https://portal.zayo.com/", 200).unwrap(),
            "https://portal.zayo.com/"
        );
        assert_eq!(url("portal_url", "", 200).unwrap(), "");
        assert_eq!(message(url("portal_url", "ftp://zayo.com", 200)), INVALID_URL);
        assert_eq!(message(url("portal_url", "portal.zayo.com", 200)), INVALID_URL);
    }

    #[test]
    fn date_uses_iso_format() {
        assert_eq!(
            date("install_date", "2016-03-01").unwrap(),
            NaiveDate::from_ymd_opt(2016, 3, 1)
        );
        assert_eq!(date("install_date", " ").unwrap(), None);
        assert_eq!(message(date("install_date", "03/01/2016")), INVALID_DATE);
        assert_eq!(message(date("install_date", "2016-02-30")), INVALID_DATE);
    }
}
