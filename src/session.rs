use std::fmt;

use crate::error::{Error, Result};

/// Authentication state of one client.
///
/// Starts empty and is filled once by a successful `authenticate` call.
#[derive(Clone, Default)]
pub struct Session {
    school: String,
    person_id: Option<i64>,
    session_token: Option<String>,
}

/// Borrowed view of an established session.
#[derive(Clone, Copy)]
pub struct Credentials<'a> {
    pub school: &'a str,
    pub person_id: i64,
    pub session_token: &'a str,
}

impl Session {
    pub(crate) fn establish(&mut self, school: &str, person_id: i64, session_token: String) {
        self.school = school.to_string();
        self.person_id = Some(person_id);
        self.session_token = Some(session_token);
    }

    pub fn school(&self) -> &str {
        &self.school
    }

    pub fn person_id(&self) -> Option<i64> {
        self.person_id
    }

    pub fn is_established(&self) -> bool {
        self.person_id.is_some() && self.session_token.is_some()
    }

    /// Fails with `Unauthenticated` unless both person id and token are present.
    pub fn credentials(&self) -> Result<Credentials<'_>> {
        match (self.person_id, self.session_token.as_deref()) {
            (Some(person_id), Some(session_token)) => Ok(Credentials {
                school: &self.school,
                person_id,
                session_token,
            }),
            _ => Err(Error::Unauthenticated),
        }
    }
}

// The token never shows up in logs.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("school", &self.school)
            .field("person_id", &self.person_id)
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl fmt::Debug for Credentials<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("school", &self.school)
            .field("person_id", &self.person_id)
            .finish_non_exhaustive()
    }
}
