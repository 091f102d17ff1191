//! Validated calendar time and its conversions.
//!
//! [`CalendarTime`] holds a calendar instant as individual fields, each kept
//! inside its legal range by the setters. It converts to and from:
//!
//! - a linear unix timestamp (seconds since 1970-01-01T00:00:00 UTC), and
//! - a [`BrokenDownTime`], the `struct tm` shaped form used at the hardware
//!   boundary.
//!
//! # Day-of-month validation
//!
//! The day is only checked against `1..=31`, independently of month and leap
//! year, so dates such as February 30 are accepted. Conversions treat the
//! overflow the way `mktime` does and roll forward into the next month:
//! 2023-02-30 has the same unix time as 2023-03-02.
//!
//! # Leap seconds
//!
//! A second value of 60 is accepted. The unix time sums seconds linearly, so
//! `23:59:60` maps to `00:00:00` of the following day.

use core::fmt;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike, Weekday};

/// Offset between the `tm_year` field and the absolute year.
pub const TM_YEAR_BASE: i32 = 1900;

const UNIX_EPOCH_DAYS_FROM_CE: i64 = 719_163;
const SECONDS_PER_DAY: i64 = 86_400;

/// Errors reported when a calendar field is out of range.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimeError {
    /// Day of month outside 1-31
    InvalidDay,
    /// Month ordinal outside 0-11
    InvalidMonth,
    /// Year outside the representable calendar range
    InvalidYear,
    /// Hour outside 0-23
    InvalidHour,
    /// Minute outside 0-59
    InvalidMinute,
    /// Second outside 0-60
    InvalidSecond,
    /// Day of week ordinal outside 0-6
    InvalidDayOfWeek,
    /// The value has no calendar equivalent (e.g. a timestamp out of range)
    Unrepresentable,
}

/// Month of the year, zero based like `tm_mon`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Month {
    Jan = 0,
    Feb,
    Mar,
    Apr,
    May,
    Jun,
    Jul,
    Aug,
    Sep,
    Oct,
    Nov,
    Dec,
}

impl Month {
    /// Calendar month number, 1 (January) to 12 (December).
    #[must_use]
    pub fn number(self) -> u32 {
        self as u32 + 1
    }
}

impl TryFrom<u8> for Month {
    type Error = TimeError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        let month = match v {
            0 => Month::Jan,
            1 => Month::Feb,
            2 => Month::Mar,
            3 => Month::Apr,
            4 => Month::May,
            5 => Month::Jun,
            6 => Month::Jul,
            7 => Month::Aug,
            8 => Month::Sep,
            9 => Month::Oct,
            10 => Month::Nov,
            11 => Month::Dec,
            _ => return Err(TimeError::InvalidMonth),
        };
        Ok(month)
    }
}

impl From<Month> for u8 {
    fn from(v: Month) -> Self {
        v as u8
    }
}

/// Day of the week, Sunday based like `tm_wday`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DayOfWeek {
    Sunday = 0,
    Monday = 1,
    Tuesday = 2,
    Wednesday = 3,
    Thursday = 4,
    Friday = 5,
    Saturday = 6,
}

impl TryFrom<u8> for DayOfWeek {
    type Error = TimeError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        let day = match v {
            0 => DayOfWeek::Sunday,
            1 => DayOfWeek::Monday,
            2 => DayOfWeek::Tuesday,
            3 => DayOfWeek::Wednesday,
            4 => DayOfWeek::Thursday,
            5 => DayOfWeek::Friday,
            6 => DayOfWeek::Saturday,
            _ => return Err(TimeError::InvalidDayOfWeek),
        };
        Ok(day)
    }
}

impl From<DayOfWeek> for u8 {
    fn from(v: DayOfWeek) -> Self {
        v as u8
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(v: Weekday) -> Self {
        match v {
            Weekday::Sun => DayOfWeek::Sunday,
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
        }
    }
}

/// Daylight saving time flag.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SaveLight {
    #[default]
    Inactive = 0,
    Active = 1,
}

impl SaveLight {
    /// Interprets a `tm_isdst` value; only positive values mean active.
    ///
    /// Zero and the negative "unknown" values both map to
    /// [`SaveLight::Inactive`], so a `tm` read back through
    /// [`CalendarTime::tm_time`] always carries `isdst` 0 or 1.
    #[must_use]
    pub fn from_isdst(isdst: i32) -> Self {
        if isdst > 0 {
            SaveLight::Active
        } else {
            SaveLight::Inactive
        }
    }
}

/// Broken-down time, laid out like C's `struct tm`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BrokenDownTime {
    /// Seconds after the minute (0-60)
    pub sec: i32,
    /// Minutes after the hour (0-59)
    pub min: i32,
    /// Hours since midnight (0-23)
    pub hour: i32,
    /// Day of the month (1-31)
    pub mday: i32,
    /// Months since January (0-11)
    pub mon: i32,
    /// Years since 1900
    pub year: i32,
    /// Days since Sunday (0-6)
    pub wday: i32,
    /// Days since January 1 (0-365)
    pub yday: i32,
    /// Daylight saving time flag
    pub isdst: i32,
}

/// A validated calendar instant.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalendarTime {
    day: u8,
    month: Month,
    year: i32,
    hours: u8,
    minutes: u8,
    seconds: u8,
    day_of_week: DayOfWeek,
    save_light: SaveLight,
}

fn check_day(day: u8) -> Result<u8, TimeError> {
    if (1..=31).contains(&day) {
        Ok(day)
    } else {
        Err(TimeError::InvalidDay)
    }
}

fn check_year(year: i32) -> Result<i32, TimeError> {
    // Both ends of the year must exist so any month/day overflow stays representable.
    if NaiveDate::from_ymd_opt(year, 1, 1).is_some() && NaiveDate::from_ymd_opt(year, 12, 31).is_some() {
        Ok(year)
    } else {
        Err(TimeError::InvalidYear)
    }
}

fn check_hour(hour: u8) -> Result<u8, TimeError> {
    if hour <= 23 {
        Ok(hour)
    } else {
        Err(TimeError::InvalidHour)
    }
}

fn check_minute(minute: u8) -> Result<u8, TimeError> {
    if minute <= 59 {
        Ok(minute)
    } else {
        Err(TimeError::InvalidMinute)
    }
}

fn check_second(second: u8) -> Result<u8, TimeError> {
    if second <= 60 {
        Ok(second)
    } else {
        Err(TimeError::InvalidSecond)
    }
}

impl CalendarTime {
    /// Creates a calendar time from explicit field values.
    ///
    /// # Errors
    ///
    /// Returns the error of the first field that is out of range.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        day: u8,
        month: Month,
        year: i32,
        hours: u8,
        minutes: u8,
        seconds: u8,
        day_of_week: DayOfWeek,
        save_light: SaveLight,
    ) -> Result<Self, TimeError> {
        Ok(Self {
            day: check_day(day)?,
            month,
            year: check_year(year)?,
            hours: check_hour(hours)?,
            minutes: check_minute(minutes)?,
            seconds: check_second(seconds)?,
            day_of_week,
            save_light,
        })
    }

    /// Creates a calendar time from seconds since the unix epoch.
    ///
    /// The day of week is derived from the date and daylight saving is
    /// inactive.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::Unrepresentable`] if the timestamp is outside the
    /// calendar range.
    pub fn from_unix_time(timestamp: i64) -> Result<Self, TimeError> {
        let datetime = DateTime::from_timestamp(timestamp, 0).ok_or(TimeError::Unrepresentable)?;
        Self::try_from(datetime.naive_utc())
    }

    /// Sets the day of the month (1-31).
    ///
    /// The day is not checked against the month; overflow such as February
    /// 30 is carried into the next month by the conversions.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::InvalidDay`] outside 1-31; the stored day is left
    /// unchanged.
    pub fn set_day_of_month(&mut self, day: u8) -> Result<(), TimeError> {
        self.day = check_day(day)?;
        Ok(())
    }

    pub fn set_month_of_year(&mut self, month: Month) {
        self.month = month;
    }

    /// Sets the absolute year (e.g. 2022).
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::InvalidYear`] if the year is outside the calendar
    /// range; the stored year is left unchanged.
    pub fn set_year(&mut self, year: i32) -> Result<(), TimeError> {
        self.year = check_year(year)?;
        Ok(())
    }

    /// Sets the hour (0-23).
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::InvalidHour`] above 23; the stored hour is left
    /// unchanged.
    pub fn set_hour(&mut self, hour: u8) -> Result<(), TimeError> {
        self.hours = check_hour(hour)?;
        Ok(())
    }

    /// Sets the minute (0-59).
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::InvalidMinute`] above 59; the stored minute is
    /// left unchanged.
    pub fn set_minute(&mut self, minute: u8) -> Result<(), TimeError> {
        self.minutes = check_minute(minute)?;
        Ok(())
    }

    /// Sets the second (0-60); 60 is accepted for a leap second.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::InvalidSecond`] above 60; the stored second is
    /// left unchanged.
    pub fn set_second(&mut self, second: u8) -> Result<(), TimeError> {
        self.seconds = check_second(second)?;
        Ok(())
    }

    pub fn set_day_of_week(&mut self, day_of_week: DayOfWeek) {
        self.day_of_week = day_of_week;
    }

    pub fn set_save_light(&mut self, save_light: SaveLight) {
        self.save_light = save_light;
    }

    /// Replaces every field from a broken-down time.
    ///
    /// `yday` is ignored since it is derived from the other fields.
    ///
    /// # Errors
    ///
    /// Returns the error of the first invalid field. Nothing is written
    /// unless every field is valid.
    pub fn set_tm(&mut self, tm: &BrokenDownTime) -> Result<(), TimeError> {
        *self = Self::try_from(tm)?;
        Ok(())
    }

    #[must_use]
    pub fn day_of_month(&self) -> u8 {
        self.day
    }

    #[must_use]
    pub fn month(&self) -> Month {
        self.month
    }

    #[must_use]
    pub fn year(&self) -> i32 {
        self.year
    }

    #[must_use]
    pub fn hour(&self) -> u8 {
        self.hours
    }

    #[must_use]
    pub fn minute(&self) -> u8 {
        self.minutes
    }

    #[must_use]
    pub fn second(&self) -> u8 {
        self.seconds
    }

    #[must_use]
    pub fn day_of_week(&self) -> DayOfWeek {
        self.day_of_week
    }

    #[must_use]
    pub fn save_light(&self) -> SaveLight {
        self.save_light
    }

    fn first_of_month(&self) -> NaiveDate {
        // the year is range checked on every write, so this always exists
        NaiveDate::from_ymd_opt(self.year, self.month.number(), 1).unwrap_or_default()
    }

    /// Seconds since 1970-01-01T00:00:00 UTC.
    ///
    /// Uses the proleptic Gregorian calendar with no time zone or daylight
    /// saving correction. Day overflow past the end of the month rolls into
    /// the following month.
    #[must_use]
    pub fn unix_time(&self) -> i64 {
        let days = i64::from(self.first_of_month().num_days_from_ce()) - UNIX_EPOCH_DAYS_FROM_CE
            + i64::from(self.day - 1);
        days * SECONDS_PER_DAY
            + i64::from(self.hours) * 3600
            + i64::from(self.minutes) * 60
            + i64::from(self.seconds)
    }

    /// The broken-down equivalent of this time.
    #[must_use]
    pub fn tm_time(&self) -> BrokenDownTime {
        let yday = self.first_of_month().ordinal0() + u32::from(self.day - 1);
        BrokenDownTime {
            sec: i32::from(self.seconds),
            min: i32::from(self.minutes),
            hour: i32::from(self.hours),
            mday: i32::from(self.day),
            mon: i32::from(u8::from(self.month)),
            year: self.year - TM_YEAR_BASE,
            wday: i32::from(u8::from(self.day_of_week)),
            yday: yday as i32,
            isdst: self.save_light as i32,
        }
    }
}

impl Default for CalendarTime {
    /// 2000-01-01 00:00:00, a Saturday, daylight saving inactive.
    fn default() -> Self {
        Self {
            day: 1,
            month: Month::Jan,
            year: 2000,
            hours: 0,
            minutes: 0,
            seconds: 0,
            day_of_week: DayOfWeek::Saturday,
            save_light: SaveLight::Inactive,
        }
    }
}

impl TryFrom<&BrokenDownTime> for CalendarTime {
    type Error = TimeError;

    fn try_from(tm: &BrokenDownTime) -> Result<Self, Self::Error> {
        let day = u8::try_from(tm.mday).map_err(|_| TimeError::InvalidDay)?;
        let month = u8::try_from(tm.mon)
            .map_err(|_| TimeError::InvalidMonth)
            .and_then(Month::try_from)?;
        let year = tm
            .year
            .checked_add(TM_YEAR_BASE)
            .ok_or(TimeError::InvalidYear)?;
        let hours = u8::try_from(tm.hour).map_err(|_| TimeError::InvalidHour)?;
        let minutes = u8::try_from(tm.min).map_err(|_| TimeError::InvalidMinute)?;
        let seconds = u8::try_from(tm.sec).map_err(|_| TimeError::InvalidSecond)?;
        let day_of_week = u8::try_from(tm.wday)
            .map_err(|_| TimeError::InvalidDayOfWeek)
            .and_then(DayOfWeek::try_from)?;
        Self::new(
            day,
            month,
            year,
            hours,
            minutes,
            seconds,
            day_of_week,
            SaveLight::from_isdst(tm.isdst),
        )
    }
}

impl From<CalendarTime> for BrokenDownTime {
    fn from(time: CalendarTime) -> Self {
        time.tm_time()
    }
}

impl TryFrom<NaiveDateTime> for CalendarTime {
    type Error = TimeError;

    /// Converts a chrono date time; chrono's leap second representation
    /// becomes second 60.
    fn try_from(datetime: NaiveDateTime) -> Result<Self, Self::Error> {
        let leap = datetime.nanosecond() >= 1_000_000_000;
        let second = datetime.second() + u32::from(leap);
        let narrow = |v: u32| u8::try_from(v).map_err(|_| TimeError::Unrepresentable);
        let month = u8::try_from(datetime.month0())
            .map_err(|_| TimeError::Unrepresentable)
            .and_then(Month::try_from)?;
        Self::new(
            narrow(datetime.day())?,
            month,
            datetime.year(),
            narrow(datetime.hour())?,
            narrow(datetime.minute())?,
            narrow(second)?,
            datetime.weekday().into(),
            SaveLight::Inactive,
        )
    }
}

impl fmt::Display for CalendarTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year,
            self.month.number(),
            self.day,
            self.hours,
            self.minutes,
            self.seconds
        )
    }
}
