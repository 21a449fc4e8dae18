pub mod request;
pub mod time;
pub mod timetable;
pub mod transport;
