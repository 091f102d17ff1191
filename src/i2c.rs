//! [`RtcPeripheral`] backend for I2C clocks with the DS3231 register layout.
//!
//! # Capabilities
//!
//! - Time is kept as BCD in seven registers. The years 2000-2199 are
//!   covered using the century bit, and leap seconds are not stored.
//! - The periodic interrupt is the 1 Hz square wave, so only
//!   [`Period::OnceEvery1Sec`] can be armed. The INT/SQW pin is shared: arming
//!   the square wave switches the pin away from alarm interrupts, and arming
//!   an alarm switches it back.
//! - Alarms use Alarm 1. The comparator only supports these nested patterns:
//!   - every second (empty mask)
//!   - second
//!   - minute + second
//!   - hour + minute + second
//!   - hour + minute + second plus either the day of month or the day of week
//!
//!   [`I2cRtc::supports_alarm`](RtcPeripheral::supports_alarm) reports any
//!   other mask, including any mask on month or year, as unsupported. The
//!   controller then disarms Alarm 1 and leaves matching to
//!   [`ClockController::check_alarm`](crate::clock::ClockController::check_alarm);
//!   calling `arm_alarm` directly with such a mask returns
//!   [`I2cRtcError::Unsupported`].

use embedded_hal::i2c::I2c;

use crate::alarm::AlarmMask;
use crate::clock::{Period, RtcPeripheral, TriggerKind};
use crate::registers::{
    from_bcd, to_bcd, AlarmDayDate, Control, DayDateSelect, Hours, InterruptControl, Month,
    Oscillator, RegAddr, SquareWaveFrequency, Status, TimeRepresentation, ALARM_MASK_BIT,
};
use crate::time::{BrokenDownTime, CalendarTime, DayOfWeek, SaveLight, TimeError};

/// Default 7-bit bus address.
pub const DEFAULT_ADDRESS: u8 = 0x68;

const FIRST_YEAR: i32 = 2000;
const LAST_YEAR: i32 = 2199;

/// Backend configuration.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// 7-bit bus address
    pub address: u8,
    /// Keep the square wave running while on battery power
    pub battery_backed_square_wave: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            battery_backed_square_wave: false,
        }
    }
}

/// Errors reported by [`I2cRtc`].
#[derive(Debug, PartialEq)]
pub enum I2cRtcError<E> {
    /// Bus error
    I2c(E),
    /// A register held a value that is not a valid time
    InvalidRegister,
    /// The time cannot be stored by the chip (year outside 2000-2199 or a leap second)
    OutOfRange,
    /// The requested cadence or alarm mask has no hardware equivalent
    Unsupported,
}

impl<E> From<E> for I2cRtcError<E> {
    fn from(e: E) -> Self {
        I2cRtcError::I2c(e)
    }
}

/// Decodes the seven timekeeping registers.
fn decode_time<E>(data: &[u8; 7]) -> Result<BrokenDownTime, I2cRtcError<E>> {
    let bcd = |raw: u8| from_bcd(raw).ok_or(I2cRtcError::InvalidRegister);

    let seconds = bcd(data[0] & 0x7F)?;
    let minutes = bcd(data[1] & 0x7F)?;
    let hours = Hours(data[2]);
    let hour = match hours.time_representation() {
        TimeRepresentation::TwentyFourHour => bcd(hours.bcd24())?,
        TimeRepresentation::TwelveHour => match bcd(hours.bcd12())? {
            h @ 1..=12 => h % 12 + if hours.pm() { 12 } else { 0 },
            _ => return Err(I2cRtcError::InvalidRegister),
        },
    };
    // weekday register counts 1-7 from Sunday
    let day_of_week = (data[3] & 0x07)
        .checked_sub(1)
        .ok_or(I2cRtcError::InvalidRegister)
        .and_then(|d| DayOfWeek::try_from(d).map_err(|_| I2cRtcError::InvalidRegister))?;
    let date = bcd(data[4] & 0x3F)?;
    let month = Month(data[5]);
    let month_of_year = bcd(month.bcd())?
        .checked_sub(1)
        .ok_or(I2cRtcError::InvalidRegister)
        .and_then(|m| {
            crate::time::Month::try_from(m).map_err(|_| I2cRtcError::InvalidRegister)
        })?;
    let year = FIRST_YEAR + i32::from(bcd(data[6])?) + if month.century() { 100 } else { 0 };

    let time = CalendarTime::new(
        date,
        month_of_year,
        year,
        hour,
        minutes,
        seconds,
        day_of_week,
        SaveLight::Inactive,
    )
    .map_err(|_| I2cRtcError::InvalidRegister)?;
    Ok(time.tm_time())
}

/// Encodes a broken-down time into the seven timekeeping registers, 24-hour mode.
fn encode_time<E>(tm: &BrokenDownTime) -> Result<[u8; 7], I2cRtcError<E>> {
    let time = CalendarTime::try_from(tm).map_err(|e| match e {
        TimeError::InvalidYear => I2cRtcError::OutOfRange,
        _ => I2cRtcError::InvalidRegister,
    })?;
    if !(FIRST_YEAR..=LAST_YEAR).contains(&time.year()) {
        error!("rtc: year {} outside 2000-2199", time.year());
        return Err(I2cRtcError::OutOfRange);
    }
    let bcd = |value: u8, max: u8| to_bcd(value, max).ok_or(I2cRtcError::OutOfRange);

    let mut hours = Hours::default();
    hours.set_time_representation(TimeRepresentation::TwentyFourHour);
    hours.set_bcd24(bcd(time.hour(), 23)?);

    let offset = time.year() - FIRST_YEAR;
    let mut month = Month::default();
    month.set_bcd(bcd(time.month().number() as u8, 12)?);
    month.set_century(offset >= 100);

    Ok([
        bcd(time.second(), 59)?,
        bcd(time.minute(), 59)?,
        hours.into(),
        u8::from(time.day_of_week()) + 1,
        bcd(time.day_of_month(), 31)?,
        month.into(),
        bcd((offset % 100) as u8, 99)?,
    ])
}

/// Whether Alarm 1 can compare exactly the fields in `mask`.
fn alarm1_supports(mask: AlarmMask) -> bool {
    let second = mask.is_matching_second();
    let minute = mask.is_matching_minute();
    let hour = mask.is_matching_hour();
    let date = mask.is_matching_day();
    let weekday = mask.is_matching_day_of_week();
    let day = date || weekday;

    let nested = (second || !minute) && (minute || !hour) && (hour || !day);
    nested && !(date && weekday) && !mask.is_matching_month() && !mask.is_matching_year()
}

/// Encodes the Alarm 1 registers for `time` compared on the fields in `mask`.
fn encode_alarm<E>(time: &CalendarTime, mask: AlarmMask) -> Result<[u8; 4], I2cRtcError<E>> {
    if !alarm1_supports(mask) {
        warn!("rtc: alarm mask {:?} has no Alarm 1 equivalent", mask);
        return Err(I2cRtcError::Unsupported);
    }
    let second = mask.is_matching_second();
    let minute = mask.is_matching_minute();
    let date = mask.is_matching_day();
    let weekday = mask.is_matching_day_of_week();

    let field = |matching: bool, value: u8, max: u8| -> Result<u8, I2cRtcError<E>> {
        if matching {
            to_bcd(value, max).ok_or(I2cRtcError::OutOfRange)
        } else {
            Ok(ALARM_MASK_BIT)
        }
    };

    let mut hours = Hours::default();
    if mask.is_matching_hour() {
        hours.set_time_representation(TimeRepresentation::TwentyFourHour);
        hours.set_bcd24(field(true, time.hour(), 23)?);
    } else {
        hours.set_alarm_mask(true);
    }

    let mut day_date = AlarmDayDate::default();
    if weekday {
        day_date.set_day_date_select(DayDateSelect::Day);
        day_date.set_value(u8::from(time.day_of_week()) + 1);
    } else if date {
        day_date.set_day_date_select(DayDateSelect::Date);
        day_date.set_value(field(true, time.day_of_month(), 31)?);
    } else {
        day_date.set_alarm_mask(true);
    }

    Ok([
        field(second, time.second(), 59)?,
        field(minute, time.minute(), 59)?,
        hours.into(),
        day_date.into(),
    ])
}

/// I2C real-time clock backend.
pub struct I2cRtc<I2C: I2c> {
    i2c: I2C,
    config: Config,
}

// Single register read/write accessors
macro_rules! register_access {
    ($(($name:ident, $regaddr:expr, $typ:ty)),+) => {
        $(
            paste::paste! {
                fn $name(&mut self) -> Result<$typ, I2cRtcError<I2C::Error>> {
                    let mut data = [0];
                    self.i2c
                        .write_read(self.config.address, &[$regaddr as u8], &mut data)?;
                    Ok(<$typ>::from(data[0]))
                }

                fn [< set_ $name >](&mut self, value: $typ) -> Result<(), I2cRtcError<I2C::Error>> {
                    self.i2c
                        .write(self.config.address, &[$regaddr as u8, value.into()])?;
                    Ok(())
                }
            }
        )+
    };
}

impl<I2C: I2c> I2cRtc<I2C> {
    pub fn new(i2c: I2C, config: &Config) -> Self {
        Self {
            i2c,
            config: *config,
        }
    }

    /// Gives the bus back.
    pub fn release(self) -> I2C {
        self.i2c
    }

    register_access!(
        (control, RegAddr::Control, Control),
        (status, RegAddr::ControlStatus, Status)
    );

    fn clear_status_flags(
        &mut self,
        oscillator_stop: bool,
        alarm1: bool,
    ) -> Result<(), I2cRtcError<I2C::Error>> {
        let mut status = self.status()?;
        if oscillator_stop {
            status.set_oscillator_stop_flag(false);
        }
        if alarm1 {
            status.set_alarm1_flag(false);
        }
        self.set_status(status)
    }
}

impl<I2C: I2c> RtcPeripheral for I2cRtc<I2C> {
    type Error = I2cRtcError<I2C::Error>;

    fn init(&mut self) -> Result<(), Self::Error> {
        let mut control = self.control()?;
        control.set_oscillator_enable(Oscillator::Enabled);
        control.set_battery_backed_square_wave(self.config.battery_backed_square_wave);
        control.set_interrupt_control(InterruptControl::Interrupt);
        debug!("rtc: writing control {:?}", control);
        self.set_control(control)
    }

    fn is_running(&mut self) -> Result<bool, Self::Error> {
        Ok(self.control()?.oscillator_enable() == Oscillator::Enabled)
    }

    fn has_valid_time(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.status()?.oscillator_stop_flag())
    }

    fn read_time(&mut self) -> Result<BrokenDownTime, Self::Error> {
        let mut data = [0; 7];
        self.i2c
            .write_read(self.config.address, &[RegAddr::Seconds as u8], &mut data)?;
        decode_time(&data)
    }

    fn write_time(&mut self, time: &BrokenDownTime) -> Result<(), Self::Error> {
        let data = encode_time(time)?;
        self.i2c.write(
            self.config.address,
            &[
                RegAddr::Seconds as u8,
                data[0],
                data[1],
                data[2],
                data[3],
                data[4],
                data[5],
                data[6],
            ],
        )?;
        self.clear_status_flags(true, false)
    }

    fn arm_periodic(&mut self, period: Period) -> Result<(), Self::Error> {
        if period != Period::OnceEvery1Sec {
            warn!("rtc: periodic rate {:?} not available", period);
            return Err(I2cRtcError::Unsupported);
        }
        let mut control = self.control()?;
        control.set_square_wave_frequency(SquareWaveFrequency::Hz1);
        control.set_interrupt_control(InterruptControl::SquareWave);
        self.set_control(control)
    }

    fn supports_alarm(&self, mask: AlarmMask) -> bool {
        alarm1_supports(mask)
    }

    fn arm_alarm(&mut self, time: &CalendarTime, mask: AlarmMask) -> Result<(), Self::Error> {
        let data = encode_alarm(time, mask)?;
        self.i2c.write(
            self.config.address,
            &[RegAddr::Alarm1Seconds as u8, data[0], data[1], data[2], data[3]],
        )?;
        self.clear_status_flags(false, true)?;
        let mut control = self.control()?;
        control.set_interrupt_control(InterruptControl::Interrupt);
        control.set_alarm1_interrupt_enable(true);
        self.set_control(control)
    }

    fn disarm(&mut self, kind: TriggerKind) -> Result<(), Self::Error> {
        let mut control = self.control()?;
        match kind {
            TriggerKind::Periodic => {
                control.set_interrupt_control(InterruptControl::Interrupt);
                self.set_control(control)
            }
            TriggerKind::Alarm => {
                control.set_alarm1_interrupt_enable(false);
                self.set_control(control)?;
                self.clear_status_flags(false, true)
            }
        }
    }
}
