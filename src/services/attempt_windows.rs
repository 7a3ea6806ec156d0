use time::{Duration, PrimitiveDateTime};

/// Hard deadline for an attempt: the timer runs out or the quiz window
/// closes, whichever comes first. A quiz without a timer is bounded by
/// its close instant alone.
pub(crate) fn attempt_deadline(
    started_at: PrimitiveDateTime,
    closes_at: PrimitiveDateTime,
    duration_minutes: Option<i32>,
) -> PrimitiveDateTime {
    match duration_minutes {
        Some(minutes) => {
            let timer_deadline = started_at + Duration::minutes(minutes as i64);
            if timer_deadline < closes_at {
                timer_deadline
            } else {
                closes_at
            }
        }
        None => closes_at,
    }
}

/// The deadline instant itself is still acceptable; only strictly-later
/// actions are rejected.
pub(crate) fn is_past(now: PrimitiveDateTime, deadline: PrimitiveDateTime) -> bool {
    now > deadline
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn timer_deadline_wins_when_shorter_than_window() {
        let started = datetime!(2025-03-01 10:00:00);
        let closes = datetime!(2025-03-01 12:00:00);
        let deadline = attempt_deadline(started, closes, Some(30));
        assert_eq!(deadline, datetime!(2025-03-01 10:30:00));
    }

    #[test]
    fn window_close_wins_when_timer_overruns_it() {
        let started = datetime!(2025-03-01 11:45:00);
        let closes = datetime!(2025-03-01 12:00:00);
        let deadline = attempt_deadline(started, closes, Some(30));
        assert_eq!(deadline, closes);
    }

    #[test]
    fn untimed_quiz_is_bounded_by_close() {
        let started = datetime!(2025-03-01 10:00:00);
        let closes = datetime!(2025-03-01 12:00:00);
        assert_eq!(attempt_deadline(started, closes, None), closes);
    }

    #[test]
    fn deadline_instant_is_not_past() {
        let deadline = datetime!(2025-03-01 12:00:00);
        assert!(!is_past(deadline, deadline));
        assert!(is_past(deadline + Duration::seconds(1), deadline));
    }

}
