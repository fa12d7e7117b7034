//! Signed effect of a request on an employee's day and hour balances.
//!
//! Everything here is pure; applying and reversing the result exactly once
//! per state change is the lifecycle engine's job.

use std::ops::{Add, Neg, Sub};

use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::request::{Request, RequestKind};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Impact {
    #[schema(value_type = String, example = "-3")]
    pub delta_days: Decimal,
    #[schema(value_type = String, example = "0")]
    pub delta_hours: Decimal,
}

impl Impact {
    pub const ZERO: Impact = Impact {
        delta_days: Decimal::ZERO,
        delta_hours: Decimal::ZERO,
    };

    pub fn is_zero(&self) -> bool {
        self.delta_days.is_zero() && self.delta_hours.is_zero()
    }
}

/// `Decimal` keeps the sign of a zero, which would surface as `"-0"`.
fn unsigned_zero(d: Decimal) -> Decimal {
    if d.is_zero() { Decimal::ZERO } else { d }
}

impl Add for Impact {
    type Output = Impact;

    fn add(self, rhs: Impact) -> Impact {
        Impact {
            delta_days: unsigned_zero(self.delta_days + rhs.delta_days),
            delta_hours: unsigned_zero(self.delta_hours + rhs.delta_hours),
        }
    }
}

impl Sub for Impact {
    type Output = Impact;

    fn sub(self, rhs: Impact) -> Impact {
        self + (-rhs)
    }
}

impl Neg for Impact {
    type Output = Impact;

    fn neg(self) -> Impact {
        Impact {
            delta_days: unsigned_zero(-self.delta_days),
            delta_hours: unsigned_zero(-self.delta_hours),
        }
    }
}

/// Number of calendar days covered by `start..=end`, in either order.
pub fn inclusive_day_count(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days().abs() + 1
}

/// Lenient date parsing for user-supplied strings: `YYYY-MM-DD` or an
/// RFC 3339 timestamp. Anything else is `None`.
pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|d| d.date_naive()))
}

/// Computes the ledger impact of one request.
///
/// `subtracts_days` is the catalog flag of the request's type; unknown types
/// pass `false`. A missing `start` (an unparseable date upstream) yields no
/// day effect.
pub fn compute_impact(
    subtracts_days: bool,
    kind: &RequestKind,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    hours: Option<Decimal>,
) -> Impact {
    let hours = hours.unwrap_or_default();
    let mut impact = Impact::ZERO;

    if subtracts_days {
        if let Some(start) = start {
            let days = inclusive_day_count(start, end.unwrap_or(start));
            impact.delta_days = -Decimal::from(days);
        }
    }

    match kind {
        RequestKind::Leave(_) => {}
        RequestKind::OvertimeEarn | RequestKind::AdjustmentOvertime => {
            impact.delta_hours = hours;
        }
        RequestKind::OvertimePay | RequestKind::OvertimeSpendDays => {
            impact.delta_hours = -hours;
        }
        // the single number field carries the day count for manual corrections
        RequestKind::AdjustmentDays => impact.delta_days = hours,
        RequestKind::WorkedHoliday => impact.delta_days = Decimal::ONE,
    }

    Impact {
        delta_days: unsigned_zero(impact.delta_days),
        delta_hours: unsigned_zero(impact.delta_hours),
    }
}

/// Impact of a stored request, using the day-subtraction flag captured when
/// it was filed so later catalog edits cannot skew a reversal.
pub fn request_impact(request: &Request) -> Impact {
    compute_impact(
        request.subtracts_days,
        &request.kind,
        Some(request.start_date),
        request.end_date,
        request.hours,
    )
}

/// Impact currently reflected in the employee's balances for `request`.
pub fn active_impact(request: &Request) -> Impact {
    if request.balance_effect_active() {
        request_impact(request)
    } else {
        Impact::ZERO
    }
}
