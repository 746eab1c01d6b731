use chrono::{DateTime, Datelike, Months, Utc};
use serde::{Deserialize, Serialize};

use super::enums::billing_cycles::BillingCycle;

/// Half-open `[start, end)` window covered by a single order and its activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingPeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BillingPeriod {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

/// End of the period starting at `start_date`.
///
/// Adds whole calendar months, keeping the day of month and clamping to the last day when the
/// target month is shorter (Jan 31 + 1 month = last day of February).
pub fn compute_end_date(start_date: DateTime<Utc>, cycle: BillingCycle) -> DateTime<Utc> {
    shift_by_cycles(start_date, cycle, 1)
}

/// The period of a subscription anchored at `anchor` that contains `now`.
///
/// Boundaries are always derived from the anchor, so a subscription started on the 31st keeps
/// returning to the 31st instead of drifting to the 28th after February. Returns `None` while
/// `now` is before the anchor.
pub fn current_period(
    anchor: DateTime<Utc>,
    cycle: BillingCycle,
    now: DateTime<Utc>,
) -> Option<BillingPeriod> {
    if now < anchor {
        return None;
    }

    let elapsed_months =
        (now.year() - anchor.year()) * 12 + now.month() as i32 - anchor.month() as i32;
    let mut index = u32::try_from(elapsed_months.max(0)).unwrap_or(0) / cycle.months();

    // Clamped boundaries can land after `now` late in the month.
    while index > 0 && shift_by_cycles(anchor, cycle, index) > now {
        index -= 1;
    }
    loop {
        let next = shift_by_cycles(anchor, cycle, index + 1);
        if next > now || next == DateTime::<Utc>::MAX_UTC {
            break;
        }
        index += 1;
    }

    Some(BillingPeriod {
        start: shift_by_cycles(anchor, cycle, index),
        end: shift_by_cycles(anchor, cycle, index + 1),
    })
}

fn shift_by_cycles(anchor: DateTime<Utc>, cycle: BillingCycle, cycles: u32) -> DateTime<Utc> {
    cycles
        .checked_mul(cycle.months())
        .and_then(|months| anchor.checked_add_months(Months::new(months)))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
