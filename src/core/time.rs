use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, PrimitiveDateTime};

/// Current UTC time as a `PrimitiveDateTime` (what the database stores).
pub(crate) fn primitive_now_utc() -> PrimitiveDateTime {
    to_primitive_utc(OffsetDateTime::now_utc())
}

/// Normalizes any offset datetime to UTC and drops the offset.
pub(crate) fn to_primitive_utc(value: OffsetDateTime) -> PrimitiveDateTime {
    let utc = value.to_offset(time::UtcOffset::UTC);
    PrimitiveDateTime::new(utc.date(), utc.time())
}

/// Formats a stored UTC datetime as RFC 3339 with a `Z` suffix.
pub(crate) fn format_primitive(value: PrimitiveDateTime) -> String {
    value
        .assume_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn to_primitive_utc_normalizes_offset() {
        let moscow = datetime!(2025-03-01 12:00:00 +3);
        let primitive = to_primitive_utc(moscow);
        assert_eq!(primitive, datetime!(2025-03-01 09:00:00));
    }

    #[test]
    fn format_primitive_appends_zulu() {
        let value = datetime!(2025-03-01 09:30:00);
        assert_eq!(format_primitive(value), "2025-03-01T09:30:00Z");
    }
}
