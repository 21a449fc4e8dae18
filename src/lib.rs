//! WebUntis Client Library
//!
//! This library authenticates against a WebUntis school server and reads
//! absences, the current school year and weekly timetables, translating the
//! service's compact date/time numbers and its denormalized timetable payload
//! into plain typed values.

pub mod error;
pub mod helpers;
pub mod models;
pub mod service;
pub mod session;

pub use error::{Error, Result};
pub use service::{ClientConfig, UntisClient, DEFAULT_HOUR_OFFSET};
pub use session::Session;

// Re-export key types for convenience
pub use helpers::timetable::{normalize_week, EntityIndex};
pub use helpers::transport::{HttpMethod, HttpRequest, HttpRequester, HttpResponse, ReqwestRequester};
pub use models::school::{Absence, SchoolYear, TimetableEntry};
pub use models::untis::{ElementRef, ElementType, RawEntity, RawPeriod};
