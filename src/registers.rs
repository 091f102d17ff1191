//! Register map and bitfields for DS3231-layout I2C real-time clocks.
//!
//! Only the registers the [`I2cRtc`](crate::i2c::I2cRtc) backend touches are
//! modelled: the seven timekeeping registers, the Alarm 1 block, and the
//! control and status registers. Plain BCD registers are handled with
//! [`to_bcd`] and [`from_bcd`]; registers with control bits get a bitfield.

use bitfield::bitfield;

/// Register addresses.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegAddr {
    /// Seconds register, first of the 7 byte time block
    Seconds = 0x00,
    /// Alarm 1 seconds register, first of the 4 byte alarm block
    Alarm1Seconds = 0x07,
    /// Control register
    Control = 0x0E,
    /// Control/Status register
    ControlStatus = 0x0F,
}

/// Mask bit (AxMy) of an alarm register; set means "don't compare".
pub const ALARM_MASK_BIT: u8 = 0x80;

/// Encodes `value` as packed BCD, or `None` when it exceeds `max`.
#[must_use]
pub fn to_bcd(value: u8, max: u8) -> Option<u8> {
    if value > max || value > 99 {
        return None;
    }
    Some(((value / 10) << 4) | (value % 10))
}

/// Decodes a packed BCD byte, or `None` when either nibble is not a digit.
#[must_use]
pub fn from_bcd(raw: u8) -> Option<u8> {
    let tens = raw >> 4;
    let ones = raw & 0x0F;
    if tens > 9 || ones > 9 {
        return None;
    }
    Some(tens * 10 + ones)
}

/// Hour format selected by bit 6 of the hours register.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimeRepresentation {
    /// 24-hour format (0-23)
    TwentyFourHour = 0,
    /// 12-hour format (1-12 + AM/PM)
    TwelveHour = 1,
}
impl From<u8> for TimeRepresentation {
    fn from(v: u8) -> Self {
        if v & 0x01 == 0 {
            TimeRepresentation::TwentyFourHour
        } else {
            TimeRepresentation::TwelveHour
        }
    }
}
impl From<TimeRepresentation> for u8 {
    fn from(v: TimeRepresentation) -> Self {
        v as u8
    }
}

/// Oscillator control; the EOSC bit is active low.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Oscillator {
    Enabled = 0,
    Disabled = 1,
}
impl From<u8> for Oscillator {
    fn from(v: u8) -> Self {
        if v & 0x01 == 0 {
            Oscillator::Enabled
        } else {
            Oscillator::Disabled
        }
    }
}
impl From<Oscillator> for u8 {
    fn from(v: Oscillator) -> Self {
        v as u8
    }
}

/// Function of the INT/SQW pin.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterruptControl {
    /// Square wave output
    SquareWave = 0,
    /// Alarm interrupt output
    Interrupt = 1,
}
impl From<u8> for InterruptControl {
    fn from(v: u8) -> Self {
        if v & 0x01 == 0 {
            InterruptControl::SquareWave
        } else {
            InterruptControl::Interrupt
        }
    }
}
impl From<InterruptControl> for u8 {
    fn from(v: InterruptControl) -> Self {
        v as u8
    }
}

/// Square wave output frequency.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SquareWaveFrequency {
    Hz1 = 0b00,
    Hz1024 = 0b01,
    Hz4096 = 0b10,
    Hz8192 = 0b11,
}
impl From<u8> for SquareWaveFrequency {
    fn from(v: u8) -> Self {
        match v & 0b11 {
            0b00 => SquareWaveFrequency::Hz1,
            0b01 => SquareWaveFrequency::Hz1024,
            0b10 => SquareWaveFrequency::Hz4096,
            _ => SquareWaveFrequency::Hz8192,
        }
    }
}
impl From<SquareWaveFrequency> for u8 {
    fn from(v: SquareWaveFrequency) -> Self {
        v as u8
    }
}

/// DY/DT bit of the alarm day/date register.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DayDateSelect {
    /// Compare against the date of the month (1-31)
    Date = 0,
    /// Compare against the day of the week (1-7, 1 = Sunday)
    Day = 1,
}
impl From<u8> for DayDateSelect {
    fn from(v: u8) -> Self {
        if v & 0x01 == 0 {
            DayDateSelect::Date
        } else {
            DayDateSelect::Day
        }
    }
}
impl From<DayDateSelect> for u8 {
    fn from(v: DayDateSelect) -> Self {
        v as u8
    }
}

// From<u8> / Into<u8> for the raw register wrappers
macro_rules! from_register_u8 {
    ($($typ:ident),+) => {
        $(
            impl From<u8> for $typ {
                fn from(v: u8) -> Self {
                    $typ(v)
                }
            }
            impl From<$typ> for u8 {
                fn from(v: $typ) -> Self {
                    v.0
                }
            }
        )+
    };
}

bitfield! {
    /// Hours register.
    #[derive(Clone, Copy, Default, PartialEq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Hours(u8);
    impl Debug;
    /// Alarm mask bit (alarm registers only)
    pub _, set_alarm_mask: 7;
    /// Hour format
    pub from into TimeRepresentation, time_representation, set_time_representation: 6, 6;
    /// PM flag in 12-hour mode
    pub pm, _: 5;
    /// BCD hour, 6 bits in 24-hour mode
    pub bcd24, set_bcd24: 5, 0;
    /// BCD hour, 5 bits in 12-hour mode
    pub bcd12, _: 4, 0;
}

bitfield! {
    /// Month register with the century flag.
    #[derive(Clone, Copy, Default, PartialEq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Month(u8);
    impl Debug;
    /// Set once the year register wraps from 99 to 00
    pub century, set_century: 7;
    /// BCD month (1-12)
    pub bcd, set_bcd: 4, 0;
}

bitfield! {
    /// Control register.
    #[derive(Clone, Copy, Default, PartialEq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Control(u8);
    impl Debug;
    /// Oscillator enable (EOSC, active low)
    pub from into Oscillator, oscillator_enable, set_oscillator_enable: 7, 7;
    /// Square wave output while on battery power
    pub battery_backed_square_wave, set_battery_backed_square_wave: 6;
    /// Square wave frequency
    pub from into SquareWaveFrequency, square_wave_frequency, set_square_wave_frequency: 4, 3;
    /// INT/SQW pin function
    pub from into InterruptControl, interrupt_control, set_interrupt_control: 2, 2;
    /// Alarm 2 interrupt enable
    pub alarm2_interrupt_enable, set_alarm2_interrupt_enable: 1;
    /// Alarm 1 interrupt enable
    pub alarm1_interrupt_enable, set_alarm1_interrupt_enable: 0;
}

bitfield! {
    /// Status register.
    #[derive(Clone, Copy, Default, PartialEq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Status(u8);
    impl Debug;
    /// Oscillator stop flag; set after power loss until the time is rewritten
    pub oscillator_stop_flag, set_oscillator_stop_flag: 7;
    /// Alarm 2 triggered
    pub alarm2_flag, set_alarm2_flag: 1;
    /// Alarm 1 triggered
    pub alarm1_flag, set_alarm1_flag: 0;
}

bitfield! {
    /// Alarm day/date register.
    #[derive(Clone, Copy, Default, PartialEq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct AlarmDayDate(u8);
    impl Debug;
    /// Alarm mask bit (A1M4)
    pub _, set_alarm_mask: 7;
    /// Day of week or date of month
    pub from into DayDateSelect, day_date_select, set_day_date_select: 6, 6;
    /// Weekday (1-7) when DY/DT = 1, BCD date when DY/DT = 0
    pub value, set_value: 5, 0;
}

from_register_u8!(Hours, Month, Control, Status, AlarmDayDate);
