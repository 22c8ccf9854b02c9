use chrono_tz::Tz;

/// Who is acting on the catalog and from where.
///
/// Built once per request at the HTTP boundary and passed explicitly into
/// every service call that persists or presents data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub user_id: Option<i64>,
    pub ip: Option<String>,
    pub timezone: Option<Tz>,
}

impl RequestContext {
    /// Context for background work with no acting user or client
    pub fn system() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = Some(timezone);
        self
    }

    /// The caller's timezone, or `fallback` when the request did not name one
    pub fn timezone_or(&self, fallback: Tz) -> Tz {
        self.timezone.unwrap_or(fallback)
    }
}
