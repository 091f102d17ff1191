//! # rtclock
//!
//! A `no_std` real-time clock abstraction.
//!
//! - [`CalendarTime`]: a validated calendar date and time with conversions to
//!   and from Unix time, broken-down `tm` records and [`chrono`] values.
//! - [`AlarmMask`]: the set of calendar fields an alarm compares.
//! - [`ClockController`]: owns an [`RtcPeripheral`], serves consistent time
//!   snapshots and keeps at most one periodic and one alarm callback.
//! - [`I2cRtc`]: a peripheral backend for DS3231-layout I2C clocks built on
//!   `embedded-hal` 1.0.
//!
//! ## Example
//!
//! ```rust,ignore
//! use rtclock::{i2c, AlarmMask, CalendarTime, ClockController, I2cRtc, Month};
//! use rtclock::{DayOfWeek, SaveLight};
//!
//! fn on_alarm() {
//!     // runs in interrupt context
//! }
//!
//! let rtc = I2cRtc::new(i2c_bus, &i2c::Config::default());
//! let mut clock = ClockController::new(rtc);
//! clock.begin()?;
//!
//! let boot = CalendarTime::new(14, Month::Mar, 2024, 15, 30, 0, DayOfWeek::Thursday, SaveLight::Inactive)?;
//! // keeps the running time if the clock survived on battery
//! let _ = clock.set_time_if_not_running(&boot);
//!
//! let mut mask = AlarmMask::default();
//! mask.add_match_second();
//! mask.add_match_minute();
//! mask.add_match_hour();
//! clock.set_alarm_callback(on_alarm, &boot, mask)?;
//!
//! // from the INT pin handler
//! clock.dispatch(rtclock::TriggerKind::Alarm);
//! ```
//!
//! ## Features
//!
//! - `log`: log through the [`log`](https://docs.rs/log) facade
//! - `defmt`: log through [`defmt`](https://docs.rs/defmt) and derive
//!   `defmt::Format` for the public types
#![no_std]

#[macro_use]
mod fmt;

pub mod alarm;
pub mod clock;
pub mod i2c;
pub mod registers;
pub mod time;

pub use alarm::AlarmMask;
pub use clock::{
    Callback, ClockController, ClockError, Config, Period, Registration, RtcPeripheral, Trigger,
    TriggerKind,
};
pub use i2c::{I2cRtc, I2cRtcError};
pub use time::{BrokenDownTime, CalendarTime, DayOfWeek, Month, SaveLight, TimeError};
