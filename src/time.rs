use diesel::backend::Backend;
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::{Text, Timestamp};
use diesel::sqlite::Sqlite;
use serde::{Deserialize, Serialize};
use std::ops::Deref;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::serde::rfc3339;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};
use tracing::debug;

pub struct Timer<'a> {
    name: &'a str,
    start: std::time::Instant,
}

impl<'a> Timer<'a> {
    pub fn new(name: &'a str) -> Self {
        Self {
            name,
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for Timer<'_> {
    fn drop(&mut self) {
        let elapsed_time = self.start.elapsed();
        let time_in_s = elapsed_time.as_secs_f32();
        match elapsed_time.as_nanos().checked_ilog10().unwrap_or(0) {
            0..3 => debug!("{} took {:.1}ns", self.name, time_in_s * 1e9),
            3..6 => debug!("{} took {:.1}μs", self.name, time_in_s * 1e6),
            6..9 => debug!("{} took {:.1}ms", self.name, time_in_s * 1e3),
            9.. => debug!("{} took {:.1}s", self.name, time_in_s),
        }
    }
}

// A wrapper for time::OffsetDateTime that serializes/deserializes according to RFC 3339.
// Stored in SQLite as fixed-width UTC text so that text order matches time order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Timestamp)]
pub struct DateTime(#[serde(with = "rfc3339")] OffsetDateTime);

impl DateTime {
    pub fn now() -> Self {
        OffsetDateTime::now_utc().into()
    }
}

impl Deref for DateTime {
    type Target = OffsetDateTime;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<OffsetDateTime> for DateTime {
    fn from(value: OffsetDateTime) -> Self {
        DateTime(value.to_offset(UtcOffset::UTC))
    }
}

const STORAGE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]Z");
// Format of SQLite's own CURRENT_TIMESTAMP, accepted for rows written outside the server
const SQLITE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

impl ToSql<Timestamp, Sqlite> for DateTime {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
        let text = self.0.to_offset(UtcOffset::UTC).format(STORAGE_FORMAT)?;
        out.set_value(text);
        Ok(IsNull::No)
    }
}

impl FromSql<Timestamp, Sqlite> for DateTime {
    fn from_sql(bytes: <Sqlite as Backend>::RawValue<'_>) -> deserialize::Result<Self> {
        let text = <String as FromSql<Text, Sqlite>>::from_sql(bytes)?;
        PrimitiveDateTime::parse(&text, STORAGE_FORMAT)
            .or_else(|_| PrimitiveDateTime::parse(&text, SQLITE_FORMAT))
            .map(PrimitiveDateTime::assume_utc)
            .map(Self)
            .map_err(Box::from)
    }
}
