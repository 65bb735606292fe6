/// Builds a certificate serial from the school year and a per-year sequence,
/// e.g. `HR-2025-2026-000042`. The database keeps a unique index on the
/// serial; this format keeps serials sortable within a year.
pub fn serial_number(school_year: &str, sequence: i64) -> String {
    format!("HR-{}-{:06}", school_year, sequence)
}

/// Extracts the sequence component of a serial issued for `school_year`,
/// used to continue numbering from the highest serial already on record.
pub fn serial_sequence(serial: &str, school_year: &str) -> Option<i64> {
    let prefix = format!("HR-{}-", school_year);
    serial.strip_prefix(&prefix)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serials_embed_year_and_padded_sequence() {
        assert_eq!(serial_number("2025-2026", 7), "HR-2025-2026-000007");
        assert_eq!(serial_number("2025-2026", 123456), "HR-2025-2026-123456");
    }

    #[test]
    fn sequence_round_trips_through_the_serial() {
        let serial = serial_number("2025-2026", 42);
        assert_eq!(serial_sequence(&serial, "2025-2026"), Some(42));
    }

    #[test]
    fn sequence_rejects_other_years_and_garbage() {
        assert_eq!(serial_sequence("HR-2025-2026-000001", "2024-2025"), None);
        assert_eq!(serial_sequence("HR-2025-2026-xyz", "2025-2026"), None);
    }
}
