//! Conversions between calendar values and Unix epoch integers.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone};

/// Whole seconds since the epoch, truncated toward zero; `0` when absent.
#[must_use]
pub fn datetime_to_utc_unix<Tz: TimeZone>(value: Option<&DateTime<Tz>>) -> i64 {
    value.map_or(0, whole_seconds)
}

/// Epoch milliseconds at whole-second precision; `None` when absent.
#[must_use]
pub fn datetime_to_utc_unix_ms<Tz: TimeZone>(value: Option<&DateTime<Tz>>) -> Option<i64> {
    value.map(|value| whole_seconds(value).saturating_mul(1000))
}

/// Epoch milliseconds to a datetime in `tz`. Zero means "unset" and yields
/// `None`, as do values outside chrono's range.
#[must_use]
pub fn utc_unix_ms_to_datetime<Tz: TimeZone>(millis: i64, tz: &Tz) -> Option<DateTime<Tz>> {
    if millis == 0 {
        return None;
    }
    DateTime::from_timestamp_millis(millis).map(|utc| utc.with_timezone(tz))
}

/// Local midnight of `date` in `tz` (the earlier instant when midnight is
/// ambiguous, `None` when it does not exist).
#[must_use]
pub fn date_to_datetime<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(&date.and_time(NaiveTime::MIN))
        .earliest()
}

fn whole_seconds<Tz: TimeZone>(value: &DateTime<Tz>) -> i64 {
    let seconds = value.timestamp();
    if seconds < 0 && value.timestamp_subsec_nanos() > 0 {
        seconds + 1
    } else {
        seconds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Timelike, Utc};

    #[test]
    fn epoch_conversions_drop_sub_second_precision() -> anyhow::Result<()> {
        let value = DateTime::from_timestamp_millis(1_700_000_000_750)
            .ok_or_else(|| anyhow::anyhow!("out of range"))?;
        assert_eq!(datetime_to_utc_unix(Some(&value)), 1_700_000_000);
        assert_eq!(datetime_to_utc_unix_ms(Some(&value)), Some(1_700_000_000_000));
        assert_eq!(datetime_to_utc_unix::<Utc>(None), 0);
        assert_eq!(datetime_to_utc_unix_ms::<Utc>(None), None);
        Ok(())
    }

    #[test]
    fn pre_epoch_values_truncate_toward_zero() -> anyhow::Result<()> {
        let value =
            DateTime::from_timestamp_millis(-1_500).ok_or_else(|| anyhow::anyhow!("out of range"))?;
        assert_eq!(datetime_to_utc_unix(Some(&value)), -1);
        Ok(())
    }

    #[test]
    fn millis_round_trip_into_a_timezone() -> anyhow::Result<()> {
        let tz = FixedOffset::east_opt(7 * 3600).ok_or_else(|| anyhow::anyhow!("bad offset"))?;
        let value = utc_unix_ms_to_datetime(86_400_000, &tz)
            .ok_or_else(|| anyhow::anyhow!("missing datetime"))?;
        assert_eq!(value.hour(), 7);
        assert_eq!(datetime_to_utc_unix_ms(Some(&value)), Some(86_400_000));
        assert!(utc_unix_ms_to_datetime(0, &tz).is_none());
        Ok(())
    }

    #[test]
    fn date_becomes_local_midnight() -> anyhow::Result<()> {
        let tz = FixedOffset::east_opt(3600).ok_or_else(|| anyhow::anyhow!("bad offset"))?;
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).ok_or_else(|| anyhow::anyhow!("bad date"))?;
        let value = date_to_datetime(date, &tz).ok_or_else(|| anyhow::anyhow!("no midnight"))?;
        assert_eq!(value.date_naive(), date);
        assert_eq!(value.hour(), 0);
        assert_eq!(datetime_to_utc_unix(Some(&value)) % 86_400, 23 * 3600);
        Ok(())
    }
}
