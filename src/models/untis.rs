//! Wire schema for the WebUntis JSON-RPC and REST responses this client reads.
//!
//! Every response is deserialized into these structs at the boundary. Fields
//! the client depends on but the service may omit are `Option` so their
//! absence becomes a `Protocol` error with a clear message instead of a
//! generic decode failure.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A compact date or time, sent by the service either as a number or as a string.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum CompactValue {
    Number(i64),
    Text(String),
}

impl fmt::Display for CompactValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompactValue::Number(n) => write!(f, "{n}"),
            CompactValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for CompactValue {
    fn from(value: i64) -> Self {
        CompactValue::Number(value)
    }
}

/// Entity type codes used by `elements` and element references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    Class,
    Teacher,
    Subject,
    Room,
    Student,
}

impl ElementType {
    pub const fn code(self) -> i64 {
        match self {
            ElementType::Class => 1,
            ElementType::Teacher => 2,
            ElementType::Subject => 3,
            ElementType::Room => 4,
            ElementType::Student => 5,
        }
    }

    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(ElementType::Class),
            2 => Some(ElementType::Teacher),
            3 => Some(ElementType::Subject),
            4 => Some(ElementType::Room),
            5 => Some(ElementType::Student),
            _ => None,
        }
    }
}

// JSON-RPC

#[derive(Deserialize, Debug)]
pub struct RpcResponse<T> {
    pub result: Option<T>,
    pub error: Option<RpcError>,
}

#[derive(Deserialize, Debug)]
pub struct RpcError {
    pub code: Option<i64>,
    pub message: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AuthResult {
    pub session_id: Option<String>,
    pub person_id: Option<i64>,
    pub person_type: Option<i64>,
    pub klasse_id: Option<i64>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RawSchoolYear {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub start_date: Option<CompactValue>,
    pub end_date: Option<CompactValue>,
}

// REST: absences

#[derive(Deserialize, Debug)]
pub struct AbsencesResponse {
    pub data: Option<AbsencesData>,
}

#[derive(Deserialize, Debug)]
pub struct AbsencesData {
    pub absences: Option<Vec<RawAbsence>>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawAbsence {
    pub id: Option<i64>,
    pub start_date: CompactValue,
    pub start_time: CompactValue,
    pub end_date: CompactValue,
    pub end_time: CompactValue,
    #[serde(default)]
    pub is_excused: bool,
}

// REST: weekly timetable

#[derive(Deserialize, Debug)]
pub struct WeeklyTimetableResponse {
    pub data: Option<WeeklyTimetableEnvelope>,
}

#[derive(Deserialize, Debug)]
pub struct WeeklyTimetableEnvelope {
    pub result: Option<WeeklyTimetableResult>,
}

#[derive(Deserialize, Debug)]
pub struct WeeklyTimetableResult {
    pub data: Option<WeeklyTimetableData>,
}

/// `elementPeriods` and `elements` are required; an empty map or list is an empty week.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyTimetableData {
    #[serde(default)]
    pub element_ids: Vec<i64>,
    /// Periods grouped by the id of the element the timetable was requested for.
    pub element_periods: HashMap<String, Vec<RawPeriod>>,
    pub elements: Vec<RawEntity>,
}

impl WeeklyTimetableData {
    pub fn periods_for(&self, element_id: i64) -> &[RawPeriod] {
        self.element_periods
            .get(&element_id.to_string())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// One entity of the weekly payload. Ids are unique only within a type.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RawEntity {
    #[serde(rename = "type")]
    pub element_type: i64,
    pub id: i64,
    /// Only subject names are read; other entity types may omit it.
    pub name: Option<String>,
    pub long_name: Option<String>,
    #[serde(rename = "displayname")]
    pub display_name: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementRef {
    #[serde(rename = "type")]
    pub element_type: i64,
    pub id: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RawPeriod {
    pub id: Option<i64>,
    pub date: CompactValue,
    pub start_time: CompactValue,
    pub end_time: CompactValue,
    #[serde(default)]
    pub elements: Vec<ElementRef>,
    #[serde(rename = "is")]
    pub flags: Option<PeriodFlags>,
}

impl RawPeriod {
    pub fn is_cancelled(&self) -> bool {
        self.flags
            .as_ref()
            .and_then(|flags| flags.cancelled)
            .unwrap_or(false)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct PeriodFlags {
    pub standard: Option<bool>,
    pub cancelled: Option<bool>,
}
