use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::warn;

use super::impact::{Impact, compute_impact};
use crate::model::{
    leave_type::LeaveTypeConfig,
    request::{RequestDraft, RequestKind},
};

/// Snapshot of the configured leave types. Lookups never fail: an unknown
/// id simply has no day-subtraction effect and is labelled with the raw id.
#[derive(Debug, Clone, Default)]
pub struct LeaveTypeCatalog {
    types: HashMap<String, LeaveTypeConfig>,
}

impl LeaveTypeCatalog {
    pub fn new(types: impl IntoIterator<Item = LeaveTypeConfig>) -> Self {
        Self {
            types: types.into_iter().map(|t| (t.id.clone(), t)).collect(),
        }
    }

    pub fn resolve_type(&self, type_id: &str) -> Option<&LeaveTypeConfig> {
        self.types.get(type_id)
    }

    pub fn all(&self) -> Vec<LeaveTypeConfig> {
        let mut types: Vec<_> = self.types.values().cloned().collect();
        types.sort_by(|a, b| a.id.cmp(&b.id));
        types
    }

    pub fn label_for(&self, kind: &RequestKind) -> String {
        if let Some(t) = self.resolve_type(kind.type_id()) {
            return t.label.clone();
        }
        match kind.builtin_label() {
            Some(label) => label.to_string(),
            None => {
                warn!(type_id = %kind.type_id(), "Unknown leave type, falling back to raw id");
                kind.type_id().to_string()
            }
        }
    }

    /// Whether requests of `type_id` deduct calendar days. Unknown ids never do.
    pub fn subtracts_days(&self, type_id: &str) -> bool {
        self.resolve_type(type_id).is_some_and(|t| t.subtracts_days)
    }

    pub fn impact_of(
        &self,
        kind: &RequestKind,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        hours: Option<Decimal>,
    ) -> Impact {
        compute_impact(self.subtracts_days(kind.type_id()), kind, start, end, hours)
    }

    /// Overwrites the draft's dates when its type pins them.
    pub fn apply_fixed_range(&self, draft: &mut RequestDraft) {
        if let Some(range) = self
            .resolve_type(&draft.type_id)
            .and_then(|t| t.fixed_range)
        {
            draft.start_date = range.start;
            draft.end_date = Some(range.end);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::leave_type::FixedRange;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn catalog() -> LeaveTypeCatalog {
        LeaveTypeCatalog::new([
            LeaveTypeConfig {
                id: "VACATION".into(),
                label: "Vacation".into(),
                subtracts_days: true,
                fixed_range: None,
            },
            LeaveTypeConfig {
                id: "XMAS".into(),
                label: "Christmas shutdown".into(),
                subtracts_days: true,
                fixed_range: Some(FixedRange {
                    start: day("2024-12-24"),
                    end: day("2024-12-26"),
                }),
            },
        ])
    }

    #[test]
    fn labels_fall_back_to_builtin_then_raw_id() {
        let c = catalog();
        assert_eq!(c.label_for(&RequestKind::from_type_id("VACATION")), "Vacation");
        assert_eq!(c.label_for(&RequestKind::OvertimeEarn), "Overtime earned");
        assert_eq!(c.label_for(&RequestKind::from_type_id("GHOST")), "GHOST");
    }

    #[test]
    fn fixed_range_overrides_requested_dates() {
        let c = catalog();
        let mut draft = RequestDraft {
            type_id: "XMAS".into(),
            start_date: day("2024-01-01"),
            end_date: None,
            hours: None,
            reason: None,
            overtime_usage: None,
        };
        c.apply_fixed_range(&mut draft);
        assert_eq!(draft.start_date, day("2024-12-24"));
        assert_eq!(draft.end_date, Some(day("2024-12-26")));
    }

    #[test]
    fn only_configured_subtracting_types_deduct_days() {
        let c = catalog();
        assert!(c.subtracts_days("VACATION"));
        assert!(!c.subtracts_days("GHOST"));
        assert!(!c.subtracts_days("OVERTIME_EARN"));
    }

    #[test]
    fn lookups_are_repeatable() {
        let c = catalog();
        assert_eq!(c.resolve_type("VACATION"), c.resolve_type("VACATION"));
        assert!(c.resolve_type("GHOST").is_none());
    }
}
