use chrono::NaiveDateTime;
use serde::Serialize;
use std::convert::TryFrom;

use crate::error::{Error, Result};
use crate::helpers::time::{parse_compact_date, parse_compact_date_time};
use crate::models::untis::{RawAbsence, RawSchoolYear};

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Absence {
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    pub excused: bool,
}

impl Absence {
    pub fn from_raw(raw: &RawAbsence, hour_offset: i64) -> Result<Self> {
        Ok(Absence {
            start_date: parse_compact_date_time(&raw.start_date, &raw.start_time, hour_offset)?,
            end_date: parse_compact_date_time(&raw.end_date, &raw.end_time, hour_offset)?,
            excused: raw.is_excused,
        })
    }
}

/// School year bounds. Both dates carry no time of day.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SchoolYear {
    pub name: String,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
}

impl TryFrom<RawSchoolYear> for SchoolYear {
    type Error = Error;

    fn try_from(raw: RawSchoolYear) -> Result<Self> {
        let name = raw
            .name
            .ok_or_else(|| Error::protocol("school year is missing 'name'"))?;
        let start = raw
            .start_date
            .ok_or_else(|| Error::protocol("school year is missing 'startDate'"))?;
        let end = raw
            .end_date
            .ok_or_else(|| Error::protocol("school year is missing 'endDate'"))?;

        Ok(SchoolYear {
            name,
            start_date: parse_compact_date(start)?,
            end_date: parse_compact_date(end)?,
        })
    }
}

/// One resolved class period of a weekly timetable.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct TimetableEntry {
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    pub subject: String,
    pub cancelled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::untis::CompactValue;
    use chrono::NaiveDate;

    #[test]
    fn school_year_requires_every_field() {
        let raw = RawSchoolYear {
            id: Some(7),
            name: Some("2023/2024".to_string()),
            start_date: Some(CompactValue::Number(20230911)),
            end_date: None,
        };
        let err = SchoolYear::try_from(raw).unwrap_err();
        assert!(matches!(err, Error::Protocol(msg) if msg.contains("endDate")));
    }

    #[test]
    fn school_year_dates_are_date_only() {
        let raw = RawSchoolYear {
            id: Some(7),
            name: Some("2023/2024".to_string()),
            start_date: Some(CompactValue::Number(20230911)),
            end_date: Some(CompactValue::Text("20240719".to_string())),
        };
        let year = SchoolYear::try_from(raw).unwrap();
        assert_eq!(year.name, "2023/2024");
        assert_eq!(year.start_date, NaiveDate::from_ymd_opt(2023, 9, 11).unwrap().and_hms_opt(0, 0, 0).unwrap());
        assert_eq!(year.end_date, NaiveDate::from_ymd_opt(2024, 7, 19).unwrap().and_hms_opt(0, 0, 0).unwrap());
    }

    #[test]
    fn absence_passes_excused_through() {
        let raw = RawAbsence {
            id: Some(1),
            start_date: CompactValue::Number(20230914),
            start_time: CompactValue::Number(755),
            end_date: CompactValue::Number(20230914),
            end_time: CompactValue::Number(1230),
            is_excused: true,
        };
        let absence = Absence::from_raw(&raw, 1).unwrap();
        let day = NaiveDate::from_ymd_opt(2023, 9, 14).unwrap();
        assert_eq!(absence.start_date, day.and_hms_opt(8, 55, 0).unwrap());
        assert_eq!(absence.end_date, day.and_hms_opt(13, 30, 0).unwrap());
        assert!(absence.excused);
    }
}
