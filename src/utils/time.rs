use chrono::NaiveDate;

/// Checks whether the closed ranges `[a_begin, a_end]` and `[b_begin, b_end]` share at least one
/// point. Both ranges are expected to be ordered, this is not checked.
pub fn intervals_intersect<T: PartialOrd>(a_begin: T, a_end: T, b_begin: T, b_end: T) -> bool {
    a_begin <= b_end && b_begin <= a_end
}

/// Subtracts `days` calendar days from `date`, saturating at the earliest representable date.
pub fn days_before(date: NaiveDate, days: u32) -> NaiveDate {
    date.checked_sub_days(chrono::Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MIN)
}
