//! Weekly timetable normalization.
//!
//! The weekly payload lists every referenced entity once (`elements`) and lets
//! each period point at them by `(type, id)`. Ids are only unique within a
//! type, so resolution goes through a two-level index built per call.

use std::collections::HashMap;
use tracing::info;

use crate::error::{Error, Result};
use crate::helpers::time::parse_compact_date_time;
use crate::models::school::TimetableEntry;
use crate::models::untis::{ElementType, RawEntity, RawPeriod};

/// Entities of one payload keyed by type code, then by id.
#[derive(Debug, Default)]
pub struct EntityIndex<'a> {
    by_type: HashMap<i64, HashMap<i64, &'a RawEntity>>,
}

impl<'a> EntityIndex<'a> {
    /// Index `entities`. The first entity seen for a `(type, id)` pair wins.
    pub fn build(entities: &'a [RawEntity]) -> Self {
        let mut by_type: HashMap<i64, HashMap<i64, &'a RawEntity>> = HashMap::new();
        for entity in entities {
            by_type
                .entry(entity.element_type)
                .or_default()
                .entry(entity.id)
                .or_insert(entity);
        }
        Self { by_type }
    }

    pub fn get(&self, element_type: i64, id: i64) -> Option<&'a RawEntity> {
        self.by_type.get(&element_type)?.get(&id).copied()
    }

    /// Number of distinct `(type, id)` pairs.
    pub fn len(&self) -> usize {
        self.by_type.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn resolve_subject(period: &RawPeriod, index: &EntityIndex<'_>) -> Result<String> {
    let subject_type = ElementType::Subject.code();
    let reference = period
        .elements
        .iter()
        .find(|element| element.element_type == subject_type);

    let Some(reference) = reference else {
        return Err(Error::MissingReference {
            element_type: subject_type,
            id: None,
            date: period.date.to_string(),
        });
    };

    let entity = index
        .get(subject_type, reference.id)
        .ok_or_else(|| Error::MissingReference {
            element_type: subject_type,
            id: Some(reference.id),
            date: period.date.to_string(),
        })?;

    entity
        .name
        .clone()
        .ok_or_else(|| Error::protocol(format!("subject {} has no 'name'", entity.id)))
}

/// Resolve `periods` against `entities` into entries sorted by start time.
///
/// Periods starting at the same instant keep their payload order.
pub fn normalize_week(
    entities: &[RawEntity],
    periods: &[RawPeriod],
    hour_offset: i64,
) -> Result<Vec<TimetableEntry>> {
    let index = EntityIndex::build(entities);
    info!(
        "Indexed {} timetable elements, resolving {} periods",
        index.len(),
        periods.len()
    );

    let mut entries = periods
        .iter()
        .map(|period| -> Result<TimetableEntry> {
            Ok(TimetableEntry {
                start_date: parse_compact_date_time(&period.date, &period.start_time, hour_offset)?,
                end_date: parse_compact_date_time(&period.date, &period.end_time, hour_offset)?,
                subject: resolve_subject(period, &index)?,
                cancelled: period.is_cancelled(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    entries.sort_by_key(|entry| entry.start_date);
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::untis::{CompactValue, ElementRef, PeriodFlags};
    use chrono::NaiveDate;

    fn entity(element_type: i64, id: i64, name: &str) -> RawEntity {
        RawEntity {
            element_type,
            id,
            name: Some(name.to_string()),
            long_name: None,
            display_name: None,
        }
    }

    fn period(date: i64, start: i64, end: i64, refs: &[(i64, i64)]) -> RawPeriod {
        RawPeriod {
            id: None,
            date: CompactValue::Number(date),
            start_time: CompactValue::Number(start),
            end_time: CompactValue::Number(end),
            elements: refs
                .iter()
                .map(|&(element_type, id)| ElementRef { element_type, id })
                .collect(),
            flags: None,
        }
    }

    #[test]
    fn resolves_single_period() {
        let entities = vec![entity(3, 9, "Math")];
        let periods = vec![period(20230911, 800, 845, &[(3, 9)])];

        let entries = normalize_week(&entities, &periods, 1).unwrap();

        let day = NaiveDate::from_ymd_opt(2023, 9, 11).unwrap();
        assert_eq!(
            entries,
            vec![TimetableEntry {
                start_date: day.and_hms_opt(9, 0, 0).unwrap(),
                end_date: day.and_hms_opt(9, 45, 0).unwrap(),
                subject: "Math".to_string(),
                cancelled: false,
            }]
        );
    }

    #[test]
    fn ids_are_scoped_by_type() {
        let entities = vec![
            entity(1, 9, "5b"),
            entity(2, 9, "SMI"),
            entity(3, 9, "Math"),
            entity(4, 9, "R101"),
        ];
        let periods = vec![period(20230911, 800, 845, &[(1, 9), (2, 9), (4, 9), (3, 9)])];

        let entries = normalize_week(&entities, &periods, 1).unwrap();
        assert_eq!(entries[0].subject, "Math");
    }

    #[test]
    fn first_duplicate_wins() {
        let entities = vec![entity(3, 9, "Math"), entity(3, 9, "Physics")];
        let index = EntityIndex::build(&entities);
        assert_eq!(index.get(3, 9).unwrap().name.as_deref(), Some("Math"));
        assert_eq!(index.len(), 1);
        assert!(!index.is_empty());
        assert!(index.get(2, 9).is_none());
        assert!(EntityIndex::build(&[]).is_empty());
    }

    #[test]
    fn nameless_non_subject_entities_are_fine() {
        let mut teacher = entity(2, 1, "SMI");
        teacher.name = None;
        let entities = vec![teacher, entity(3, 9, "Math")];
        let periods = vec![period(20230911, 800, 845, &[(2, 1), (3, 9)])];

        let entries = normalize_week(&entities, &periods, 1).unwrap();
        assert_eq!(entries[0].subject, "Math");
    }

    #[test]
    fn nameless_subject_is_an_error() {
        let mut subject = entity(3, 9, "Math");
        subject.name = None;
        let periods = vec![period(20230911, 800, 845, &[(3, 9)])];

        let err = normalize_week(&[subject], &periods, 1).unwrap_err();
        assert!(matches!(err, Error::Protocol(msg) if msg.contains("subject 9")));
    }

    #[test]
    fn sorted_by_start_and_stable() {
        let entities = vec![entity(3, 1, "Art"), entity(3, 2, "Biology"), entity(3, 3, "Chemistry")];
        let periods = vec![
            period(20230912, 800, 845, &[(3, 1)]),
            period(20230911, 1000, 1045, &[(3, 2)]),
            period(20230911, 1000, 1130, &[(3, 3)]),
        ];

        let entries = normalize_week(&entities, &periods, 1).unwrap();
        let subjects: Vec<_> = entries.iter().map(|e| e.subject.as_str()).collect();
        assert_eq!(subjects, ["Biology", "Chemistry", "Art"]);
    }

    #[test]
    fn missing_subject_reference_is_an_error() {
        let entities = vec![entity(3, 9, "Math"), entity(4, 1, "R101")];
        let periods = vec![period(20230911, 800, 845, &[(4, 1)])];

        let err = normalize_week(&entities, &periods, 1).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingReference { element_type: 3, id: None, .. }
        ));
    }

    #[test]
    fn unknown_subject_id_is_an_error() {
        let entities = vec![entity(3, 9, "Math")];
        let periods = vec![period(20230911, 800, 845, &[(3, 10)])];

        let err = normalize_week(&entities, &periods, 1).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingReference { element_type: 3, id: Some(10), .. }
        ));
    }

    #[test]
    fn cancellation_flag_is_read() {
        let entities = vec![entity(3, 9, "Math")];
        let mut cancelled = period(20230911, 800, 845, &[(3, 9)]);
        cancelled.flags = Some(PeriodFlags {
            standard: None,
            cancelled: Some(true),
        });

        let entries = normalize_week(&entities, &[cancelled], 1).unwrap();
        assert!(entries[0].cancelled);
    }

    #[test]
    fn empty_payload_is_empty_week() {
        assert!(normalize_week(&[], &[], 1).unwrap().is_empty());
    }

    #[test]
    fn normalizing_twice_is_identical() {
        let entities = vec![entity(3, 1, "Art"), entity(3, 2, "Biology")];
        let periods = vec![
            period(20230913, 1000, 1045, &[(3, 2)]),
            period(20230911, 800, 845, &[(3, 1)]),
        ];

        let first = normalize_week(&entities, &periods, 1).unwrap();
        let second = normalize_week(&entities, &periods, 1).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn malformed_time_surfaces() {
        let entities = vec![entity(3, 9, "Math")];
        let periods = vec![period(20230911, 899, 945, &[(3, 9)])];

        let err = normalize_week(&entities, &periods, 1).unwrap_err();
        assert!(matches!(err, Error::MalformedTime(_)));
    }
}
