use chrono::NaiveDate;
use serde_json::json;
use tracing::{info, warn};

use crate::{
    error::{Error, Result},
    helpers::{
        request::{rest_request, rpc_request, rpc_result, send_json, RpcEnvelope},
        time::{format_compact_date, week_start},
        timetable::normalize_week,
        transport::{HttpRequester, ReqwestRequester},
    },
    models::{
        school::{Absence, SchoolYear, TimetableEntry},
        untis::{
            AbsencesResponse, AuthResult, ElementType, RawSchoolYear, RpcResponse,
            WeeklyTimetableResponse,
        },
    },
    session::{Credentials, Session},
};

/// Hours added to every decoded time of day.
///
/// Matches what the live service has been observed to need relative to its
/// local-time encoding. Revalidate against the target server before relying on it.
pub const DEFAULT_HOUR_OFFSET: i64 = 1;

/// Length of the session ids the service currently issues.
pub const EXPECTED_SESSION_TOKEN_LEN: usize = 32;

const ABSENCES_PATH: &str = "api/classreg/absences/students";
const WEEKLY_TIMETABLE_PATH: &str = "api/public/timetable/weekly/data";

/// Configuration for the WebUntis client
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Service root, e.g. `https://mese.webuntis.com/WebUntis`.
    pub base_url: String,
    pub hour_offset: i64,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            hour_offset: DEFAULT_HOUR_OFFSET,
        }
    }

    pub fn with_hour_offset(mut self, hour_offset: i64) -> Self {
        self.hour_offset = hour_offset;
        self
    }
}

/// Read-only WebUntis client for one school session.
///
/// Holds its own `Session`; several clients can live side by side in one
/// process. Operations other than `authenticate` take `&self` and never
/// touch the session, so they may run concurrently.
pub struct UntisClient<R = ReqwestRequester> {
    requester: R,
    config: ClientConfig,
    session: Session,
}

impl UntisClient<ReqwestRequester> {
    /// Create a client backed by a fresh reqwest HTTP client.
    pub fn init(config: ClientConfig) -> Result<Self> {
        Ok(Self::new(ReqwestRequester::init()?, config))
    }
}

impl<R: HttpRequester> UntisClient<R> {
    pub fn new(requester: R, config: ClientConfig) -> Self {
        info!("Creating new UntisClient for {}", config.base_url);
        Self {
            requester,
            config,
            session: Session::default(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_established()
    }

    /// Log in and store the issued session on this client.
    ///
    /// A client authenticates once; signing in again needs a new client.
    pub async fn authenticate(
        &mut self,
        school: &str,
        username: &str,
        password: &str,
    ) -> Result<Credentials<'_>> {
        if school.is_empty() || username.is_empty() || password.is_empty() {
            return Err(Error::invalid_argument(
                "school, username and password are required",
            ));
        }
        if self.session.is_established() {
            return Err(Error::invalid_argument(
                "session already established, create a new client to sign in again",
            ));
        }

        info!("Authenticating user {} at school {}", username, school);

        let envelope = RpcEnvelope::new(
            "authenticate",
            Some(json!({ "user": username, "password": password })),
        );
        let request = rpc_request(&self.config.base_url, school, &envelope, None)?;
        let response: RpcResponse<AuthResult> = send_json(&self.requester, request).await?;
        let auth = rpc_result(response, "authenticate")?;

        let session_token = auth
            .session_id
            .ok_or_else(|| Error::protocol("authenticate response is missing 'sessionId'"))?;
        let person_id = auth
            .person_id
            .ok_or_else(|| Error::protocol("authenticate response is missing 'personId'"))?;

        if session_token.len() != EXPECTED_SESSION_TOKEN_LEN {
            warn!(
                "Session token has unexpected length {} (expected {})",
                session_token.len(),
                EXPECTED_SESSION_TOKEN_LEN
            );
        }

        self.session.establish(school, person_id, session_token);
        info!("Authenticated as person {}", person_id);

        self.session.credentials()
    }

    /// Absences of the signed-in student between `start` and `end`, inclusive.
    pub async fn get_absences(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Absence>> {
        let credentials = self.session.credentials()?;
        if start > end {
            return Err(Error::invalid_argument(format!(
                "absence range starts after it ends ({start} > {end})"
            )));
        }

        info!("Fetching absences from {} to {}", start, end);

        let params = [
            ("studentId", credentials.person_id.to_string()),
            ("excuseStatusId", "-1".to_string()),
            ("includeTodaysAbsence", "true".to_string()),
            ("startDate", format_compact_date(start, "")),
            ("endDate", format_compact_date(end, "")),
        ];
        let request = rest_request(&self.config.base_url, ABSENCES_PATH, &params, &credentials)?;
        let response: AbsencesResponse = send_json(&self.requester, request).await?;

        let raw_absences = response
            .data
            .ok_or_else(|| Error::protocol("absences response is missing 'data'"))?
            .absences
            .ok_or_else(|| Error::protocol("absences response is missing 'data.absences'"))?;

        let absences = raw_absences
            .iter()
            .map(|raw| Absence::from_raw(raw, self.config.hour_offset))
            .collect::<Result<Vec<_>>>()?;

        info!("Successfully parsed {} absences", absences.len());
        Ok(absences)
    }

    pub async fn get_current_schoolyear(&self) -> Result<SchoolYear> {
        let credentials = self.session.credentials()?;

        info!("Fetching current school year");

        let envelope = RpcEnvelope::new("getCurrentSchoolyear", None);
        let request = rpc_request(
            &self.config.base_url,
            credentials.school,
            &envelope,
            Some(&credentials),
        )?;
        let response: RpcResponse<RawSchoolYear> = send_json(&self.requester, request).await?;
        let school_year = SchoolYear::try_from(rpc_result(response, "getCurrentSchoolyear")?)?;

        info!(
            "Current school year {} runs {} to {}",
            school_year.name, school_year.start_date, school_year.end_date
        );
        Ok(school_year)
    }

    /// Timetable of the ISO week (Monday start) containing `date`.
    pub async fn get_timetable_week(&self, date: NaiveDate) -> Result<Vec<TimetableEntry>> {
        let credentials = self.session.credentials()?;
        let monday = week_start(date);

        info!("Fetching timetable for week starting {}", monday);

        let params = [
            ("elementType", ElementType::Student.code().to_string()),
            ("elementId", credentials.person_id.to_string()),
            ("date", format_compact_date(monday, "-")),
            ("formatId", "1".to_string()),
        ];
        let request = rest_request(
            &self.config.base_url,
            WEEKLY_TIMETABLE_PATH,
            &params,
            &credentials,
        )?;
        let response: WeeklyTimetableResponse = send_json(&self.requester, request).await?;

        let data = response
            .data
            .and_then(|envelope| envelope.result)
            .and_then(|result| result.data)
            .ok_or_else(|| Error::protocol("timetable response is missing 'data.result.data'"))?;

        let entries = normalize_week(
            &data.elements,
            data.periods_for(credentials.person_id),
            self.config.hour_offset,
        )?;

        info!("Successfully resolved {} timetable entries", entries.len());
        Ok(entries)
    }
}
