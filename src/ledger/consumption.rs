//! Partial draw-down of earned overtime.
//!
//! A source record's `consumed_hours` always equals the sum of `hours_used`
//! over every non-rejected consuming request that references it. The
//! lifecycle engine keeps that true by handing this module the usage being
//! released and the usage being drawn for each operation, and committing the
//! resulting source updates together with the request change.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use tracing::warn;

use super::lifecycle::LedgerEngine;
use crate::error::{LedgerResult, ValidationError};
use crate::model::request::{
    CONSUMPTION_EPSILON, MAX_HOURS_SCALE, OvertimeUsage, Request, RequestFilter, RequestKind,
    RequestStatus,
};
use crate::store::ConsumptionWrite;

fn ensure_storable(value: Decimal) -> Result<(), ValidationError> {
    if value.normalize().scale() > MAX_HOURS_SCALE {
        return Err(ValidationError::TooPrecise {
            value,
            max_scale: MAX_HOURS_SCALE,
        });
    }
    Ok(())
}

/// Checks a draft's usage list and derives the request's hours from it.
///
/// With usage entries present the hours are their sum; a stated `hours`
/// that disagrees is rejected. Without usage the stated hours stand. Every
/// amount must fit the store's four fractional digits, otherwise a later
/// reversal would not cancel what was applied.
pub fn resolve_usage(
    kind: &RequestKind,
    hours: Option<Decimal>,
    usage: Option<Vec<OvertimeUsage>>,
) -> Result<(Option<Decimal>, Option<Vec<OvertimeUsage>>), ValidationError> {
    if let Some(hours) = hours {
        ensure_storable(hours)?;
    }
    for entry in usage.iter().flatten() {
        ensure_storable(entry.hours_used)?;
    }

    let usage = match usage {
        Some(usage) if !usage.is_empty() => usage,
        _ => return Ok((hours, None)),
    };

    if !kind.consumes_overtime() {
        return Err(ValidationError::UsageNotAllowed(kind.type_id().to_string()));
    }

    if let Some(entry) = usage.iter().find(|u| u.hours_used <= Decimal::ZERO) {
        return Err(ValidationError::NonPositiveUsage(entry.source_id.clone()));
    }

    let usage_total: Decimal = usage.iter().map(|u| u.hours_used).sum();
    if let Some(hours) = hours {
        if hours != usage_total {
            return Err(ValidationError::UsageSumMismatch { hours, usage_total });
        }
    }

    Ok((Some(usage_total), Some(usage)))
}

fn totals(usage: &[OvertimeUsage]) -> BTreeMap<&str, Decimal> {
    let mut totals = BTreeMap::new();
    for u in usage {
        *totals.entry(u.source_id.as_str()).or_insert(Decimal::ZERO) += u.hours_used;
    }
    totals
}

/// Whether an earn record can still be drawn from.
pub fn has_capacity(record: &Request) -> bool {
    record.status == RequestStatus::Approved
        && record.kind.is_overtime_source()
        && record.remaining_hours() > CONSUMPTION_EPSILON
}

impl LedgerEngine {
    /// Approved earn and worked-holiday records of `employee_id` that still
    /// have hours left to draw.
    pub async fn list_available_overtime_sources(
        &self,
        employee_id: &str,
    ) -> LedgerResult<Vec<Request>> {
        let filter = RequestFilter::for_employee(employee_id).with_status(RequestStatus::Approved);
        let records = self.store.list_requests(&filter).await?;
        Ok(records.into_iter().filter(has_capacity).collect())
    }

    /// Computes the new `consumed_hours` of every source touched when
    /// `release` is given back and `draw` is taken, validating each draw
    /// against the source's remaining capacity.
    pub(super) async fn plan_consumption(
        &self,
        employee_id: &str,
        release: &[OvertimeUsage],
        draw: &[OvertimeUsage],
    ) -> LedgerResult<Vec<ConsumptionWrite>> {
        let released = totals(release);
        let drawn = totals(draw);
        let sources: BTreeSet<&str> = released.keys().chain(drawn.keys()).copied().collect();

        let mut writes = Vec::new();
        for source_id in sources {
            let give_back = released.get(source_id).copied().unwrap_or_default();
            let take = drawn.get(source_id).copied().unwrap_or_default();
            if give_back == take {
                continue;
            }

            let Some(source) = self.store.get_request(source_id).await? else {
                if take.is_zero() {
                    warn!(source_id, "Released usage references a missing source");
                    continue;
                }
                return Err(ValidationError::UnknownSource(source_id.to_string()).into());
            };

            if !take.is_zero() {
                let eligible = source.status == RequestStatus::Approved
                    && source.kind.is_overtime_source()
                    && source.employee_id == employee_id;
                if !eligible {
                    return Err(ValidationError::IneligibleSource(source_id.to_string()).into());
                }

                let remaining = source.remaining_hours() + give_back;
                if remaining <= CONSUMPTION_EPSILON || take > remaining {
                    return Err(ValidationError::OverAllocation {
                        source_id: source_id.to_string(),
                        requested: take,
                        remaining,
                    }
                    .into());
                }
            }

            let consumed_hours = (source.consumed_hours - give_back + take).max(Decimal::ZERO);
            writes.push(ConsumptionWrite {
                source_id: source_id.to_string(),
                consumed_hours,
            });
        }

        Ok(writes)
    }
}
