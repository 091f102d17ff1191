//! Alarm match masks.
//!
//! An [`AlarmMask`] selects which calendar fields take part in an alarm
//! comparison. It stores no field values; those come from the
//! [`CalendarTime`] the alarm is armed with. A field whose bit is clear is
//! "don't care", so an empty mask matches every tick.
//!
//! ```
//! use rtclock::alarm::AlarmMask;
//!
//! // fire at hh:mm = 07:30 every day, whatever the seconds
//! let mut mask = AlarmMask::default();
//! mask.add_match_hour();
//! mask.add_match_minute();
//! assert!(mask.is_matching_hour());
//! assert!(!mask.is_matching_second());
//! ```

use bitfield::bitfield;

use crate::time::CalendarTime;

bitfield! {
    /// Set of calendar fields an alarm must match, one bit per field.
    #[derive(Clone, Copy, Default, PartialEq, Eq)]
    pub struct AlarmMask(u8);
    impl Debug;
    second, set_second: 0;
    minute, set_minute: 1;
    hour, set_hour: 2;
    day, set_day: 3;
    month, set_month: 4;
    year, set_year: 5;
    day_of_week, set_day_of_week: 6;
}

// Generates add_match_<field>, remove_match_<field> and is_matching_<field>
// for each field bit
macro_rules! match_fields {
    ($($field:ident),+) => {
        impl AlarmMask {
            $(
                paste::paste! {
                    #[doc = concat!("Requires the `", stringify!($field), "` field to match.")]
                    pub fn [< add_match_ $field >](&mut self) {
                        self.[< set_ $field >](true);
                    }

                    #[doc = concat!("Stops comparing the `", stringify!($field), "` field.")]
                    pub fn [< remove_match_ $field >](&mut self) {
                        self.[< set_ $field >](false);
                    }

                    #[doc = concat!("Whether the `", stringify!($field), "` field must match.")]
                    #[must_use]
                    pub fn [< is_matching_ $field >](&self) -> bool {
                        self.$field()
                    }
                }
            )+
        }
    };
}

match_fields!(second, minute, hour, day, month, year, day_of_week);

impl AlarmMask {
    /// Bits that correspond to a calendar field.
    pub const FIELDS: u8 = 0x7F;

    /// Creates a mask from raw bits; bits above the seven fields are dropped.
    #[must_use]
    pub fn from_bits(bits: u8) -> Self {
        AlarmMask(bits & Self::FIELDS)
    }

    #[must_use]
    pub fn bits(&self) -> u8 {
        self.0
    }

    /// True when no field is selected, i.e. the alarm would fire on every tick.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Evaluates the alarm predicate: every selected field of `now` equals
    /// the same field of `alarm`.
    #[must_use]
    pub fn matches(&self, alarm: &CalendarTime, now: &CalendarTime) -> bool {
        (!self.second() || alarm.second() == now.second())
            && (!self.minute() || alarm.minute() == now.minute())
            && (!self.hour() || alarm.hour() == now.hour())
            && (!self.day() || alarm.day_of_month() == now.day_of_month())
            && (!self.month() || alarm.month() == now.month())
            && (!self.year() || alarm.year() == now.year())
            && (!self.day_of_week() || alarm.day_of_week() == now.day_of_week())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for AlarmMask {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "AlarmMask(");
        if self.is_empty() {
            defmt::write!(f, "every tick");
        }
        if self.second() {
            defmt::write!(f, " sec");
        }
        if self.minute() {
            defmt::write!(f, " min");
        }
        if self.hour() {
            defmt::write!(f, " hour");
        }
        if self.day() {
            defmt::write!(f, " day");
        }
        if self.month() {
            defmt::write!(f, " month");
        }
        if self.year() {
            defmt::write!(f, " year");
        }
        if self.day_of_week() {
            defmt::write!(f, " dow");
        }
        defmt::write!(f, ")");
    }
}
