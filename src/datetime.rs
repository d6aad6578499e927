//! The BSON datetime type.

use std::{
    fmt::{self, Display},
    time::SystemTime,
};

use chrono::{LocalResult, TimeZone, Utc};

/// A BSON datetime: a UTC instant with millisecond precision, stored as the
/// number of non-leap milliseconds since January 1, 1970 0:00:00 UTC.
///
/// Conversions from [`chrono::DateTime`] normalize zone-aware values to UTC
/// by their offset; naive values fed through [`crate::Bson`] conversions are
/// taken to already be in UTC. The naive view of a decoded value is
/// `dt.to_chrono().naive_utc()`.
#[derive(Eq, PartialEq, Ord, PartialOrd, Hash, Copy, Clone)]
pub struct DateTime(i64);

impl DateTime {
    /// The latest possible date that can be represented in BSON.
    pub const MAX: Self = Self::from_millis(i64::MAX);

    /// The earliest possible date that can be represented in BSON.
    pub const MIN: Self = Self::from_millis(i64::MIN);

    /// Makes a new [`DateTime`] from the number of non-leap milliseconds
    /// since the Unix epoch.
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns a [`DateTime`] which corresponds to the current date and time.
    pub fn now() -> DateTime {
        Self::from_system_time(SystemTime::now())
    }

    /// Converts the given [`chrono::DateTime`] into a [`DateTime`],
    /// truncating it to millisecond precision and normalizing to UTC.
    pub fn from_chrono<T: TimeZone>(dt: chrono::DateTime<T>) -> Self {
        Self::from_millis(dt.timestamp_millis())
    }

    /// Converts this [`DateTime`] to a [`chrono::DateTime<Utc>`].
    ///
    /// Not every BSON datetime can be represented as a [`chrono::DateTime`];
    /// for such dates, [`chrono::DateTime::MIN_UTC`] or
    /// [`chrono::DateTime::MAX_UTC`] is returned, whichever is closer.
    pub fn to_chrono(self) -> chrono::DateTime<Utc> {
        match Utc.timestamp_millis_opt(self.0) {
            LocalResult::Single(dt) => dt,
            _ => {
                if self.0 < 0 {
                    chrono::DateTime::<Utc>::MIN_UTC
                } else {
                    chrono::DateTime::<Utc>::MAX_UTC
                }
            }
        }
    }

    /// Converts the given [`SystemTime`] to a [`DateTime`], truncating to
    /// millisecond precision.
    pub fn from_system_time(st: SystemTime) -> Self {
        match st.duration_since(SystemTime::UNIX_EPOCH) {
            Ok(duration) => Self::from_millis(duration.as_millis() as i64),
            // Before the epoch.
            Err(err) => Self::from_millis(-(err.duration().as_millis() as i64)),
        }
    }

    /// Returns the number of non-leap milliseconds since the Unix epoch.
    pub const fn timestamp_millis(self) -> i64 {
        self.0
    }
}

impl From<SystemTime> for DateTime {
    fn from(st: SystemTime) -> Self {
        Self::from_system_time(st)
    }
}

impl<T: TimeZone> From<chrono::DateTime<T>> for DateTime {
    fn from(dt: chrono::DateTime<T>) -> Self {
        Self::from_chrono(dt)
    }
}

impl Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_chrono().format("%Y-%m-%dT%H:%M:%S%.3fZ"))
    }
}

impl fmt::Debug for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "DateTime({})", self)
    }
}
