//! The clock facade and its hardware boundary.
//!
//! [`ClockController`] owns a [`RtcPeripheral`] and is the only path through
//! which the clock is read, written, or has callbacks armed. Because every
//! entry point takes `&mut self`, access to the single peripheral is
//! serialized by ownership. To reach the controller from an interrupt
//! handler, wrap it in a `critical_section::Mutex<RefCell<_>>`.
//!
//! # Callbacks
//!
//! A callback is registered together with its trigger, either
//! [`Trigger::Periodic`] or [`Trigger::Alarm`]. The controller keeps one slot
//! per [`TriggerKind`], so at most one periodic and one alarm callback are
//! armed at any time. Registering again replaces the previous entry. The
//! platform's interrupt handler calls [`ClockController::dispatch`] to run
//! the callback for the trigger that fired.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut clock = ClockController::new(I2cRtc::new(i2c, &i2c::Config::default()));
//! clock.begin()?;
//! clock.set_time_if_not_running(&build_time)?;
//!
//! let mut mask = AlarmMask::default();
//! mask.add_match_hour();
//! mask.add_match_minute();
//! clock.set_alarm_callback(wake_up, &seven_thirty, mask)?;
//! ```

use crate::alarm::AlarmMask;
use crate::time::{BrokenDownTime, CalendarTime, TimeError};

/// Callback invoked from the platform's interrupt context.
pub type Callback = fn();

/// Rate at which a periodic callback fires.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Period {
    OnceEvery2Sec,
    OnceEvery1Sec,
    N2TimesEverySec,
    N4TimesEverySec,
    N8TimesEverySec,
    N16TimesEverySec,
    N32TimesEverySec,
    N64TimesEverySec,
    N128TimesEverySec,
    N256TimesEverySec,
}

impl Period {
    /// Number of callbacks in a two second window (1 to 512).
    #[must_use]
    pub fn per_two_seconds(self) -> u16 {
        1 << (self as u16)
    }
}

/// Which registration slot a trigger occupies.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TriggerKind {
    Periodic = 0,
    Alarm = 1,
}

impl TriggerKind {
    fn slot(self) -> usize {
        self as usize
    }
}

/// Condition under which a registered callback fires.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Trigger {
    /// Fire at a fixed cadence
    Periodic(Period),
    /// Fire when the live clock equals `time` on every field selected by `mask`
    Alarm { time: CalendarTime, mask: AlarmMask },
}

impl Trigger {
    #[must_use]
    pub fn kind(&self) -> TriggerKind {
        match self {
            Trigger::Periodic(_) => TriggerKind::Periodic,
            Trigger::Alarm { .. } => TriggerKind::Alarm,
        }
    }
}

/// A callback together with its trigger.
#[derive(Copy, Clone, Debug)]
pub struct Registration {
    callback: Callback,
    trigger: Trigger,
}

impl Registration {
    #[must_use]
    pub fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    #[must_use]
    pub fn callback(&self) -> Callback {
        self.callback
    }
}

/// Operations the hardware layer provides to the controller.
///
/// Implementations program the real peripheral; the controller never touches
/// registers itself.
pub trait RtcPeripheral {
    type Error: core::fmt::Debug;

    /// Powers up and configures the peripheral. Called once by
    /// [`ClockController::begin`].
    fn init(&mut self) -> Result<(), Self::Error>;

    /// Whether the oscillator is running and the clock is counting.
    fn is_running(&mut self) -> Result<bool, Self::Error>;

    /// Whether the clock holds a time that was set since it last lost power.
    fn has_valid_time(&mut self) -> Result<bool, Self::Error>;

    /// Reads all calendar registers once. The controller takes care of
    /// rereading when fields roll over mid-read.
    fn read_time(&mut self) -> Result<BrokenDownTime, Self::Error>;

    /// Writes all calendar registers and marks the time as valid.
    fn write_time(&mut self, time: &BrokenDownTime) -> Result<(), Self::Error>;

    /// Starts the periodic interrupt at the given cadence.
    fn arm_periodic(&mut self, period: Period) -> Result<(), Self::Error>;

    /// Whether the alarm comparator can match on exactly the fields in
    /// `mask`. Other masks are matched in software by
    /// [`ClockController::check_alarm`].
    fn supports_alarm(&self, _mask: AlarmMask) -> bool {
        true
    }

    /// Programs the alarm comparator. Only called with masks accepted by
    /// [`RtcPeripheral::supports_alarm`].
    fn arm_alarm(&mut self, time: &CalendarTime, mask: AlarmMask) -> Result<(), Self::Error>;

    /// Stops the interrupt source of the given kind.
    fn disarm(&mut self, kind: TriggerKind) -> Result<(), Self::Error>;
}

/// Errors reported by [`ClockController`].
#[derive(Debug, PartialEq)]
pub enum ClockError<E> {
    /// [`ClockController::begin`] has not succeeded yet
    NotInitialized,
    /// The clock already keeps a valid time and was not overwritten
    AlreadyRunning,
    /// Consecutive reads never agreed, e.g. the clock kept rolling over
    InconsistentRead,
    /// The peripheral returned a value that is not a valid calendar time
    InvalidTime(TimeError),
    /// The peripheral reported an error
    Peripheral(E),
}

impl<E> From<TimeError> for ClockError<E> {
    fn from(e: TimeError) -> Self {
        ClockError::InvalidTime(e)
    }
}

/// Controller configuration.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Maximum number of register reads spent looking for two consecutive
    /// identical snapshots. Values below 2 are treated as 2.
    pub read_attempts: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self { read_attempts: 3 }
    }
}

/// Real-time clock facade.
pub struct ClockController<P: RtcPeripheral> {
    peripheral: P,
    config: Config,
    initialized: bool,
    registrations: [Option<Registration>; 2],
}

impl<P: RtcPeripheral> ClockController<P> {
    pub fn new(peripheral: P) -> Self {
        Self::with_config(peripheral, &Config::default())
    }

    pub fn with_config(peripheral: P, config: &Config) -> Self {
        Self {
            peripheral,
            config: *config,
            initialized: false,
            registrations: [None, None],
        }
    }

    /// Gives the peripheral back, dropping any registrations.
    pub fn release(self) -> P {
        self.peripheral
    }

    /// Initializes the peripheral. Later calls succeed without touching the
    /// hardware again.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::Peripheral`] if initialization fails; `begin`
    /// may then be retried.
    pub fn begin(&mut self) -> Result<(), ClockError<P::Error>> {
        if self.initialized {
            return Ok(());
        }
        self.peripheral.init().map_err(ClockError::Peripheral)?;
        self.initialized = true;
        debug!("rtc: peripheral initialized");
        Ok(())
    }

    /// Whether the controller is initialized and the oscillator is counting.
    pub fn is_running(&mut self) -> bool {
        if !self.initialized {
            return false;
        }
        match self.peripheral.is_running() {
            Ok(running) => running,
            Err(_) => {
                warn!("rtc: unable to query oscillator state");
                false
            }
        }
    }

    fn ensure_initialized(&self) -> Result<(), ClockError<P::Error>> {
        if self.initialized {
            Ok(())
        } else {
            Err(ClockError::NotInitialized)
        }
    }

    fn read_consistent(&mut self) -> Result<BrokenDownTime, ClockError<P::Error>> {
        let attempts = self.config.read_attempts.max(2);
        let mut previous = self.peripheral.read_time().map_err(ClockError::Peripheral)?;
        for _ in 1..attempts {
            let current = self.peripheral.read_time().map_err(ClockError::Peripheral)?;
            if current == previous {
                return Ok(current);
            }
            debug!("rtc: clock moved during read, reading again");
            previous = current;
        }
        error!("rtc: no consistent snapshot after {} reads", attempts);
        Err(ClockError::InconsistentRead)
    }

    /// Reads the current time.
    ///
    /// # Errors
    ///
    /// Fails when not initialized, when no consistent snapshot could be
    /// taken, or when the hardware holds an invalid time.
    pub fn now(&mut self) -> Result<CalendarTime, ClockError<P::Error>> {
        self.ensure_initialized()?;
        let snapshot = self.read_consistent()?;
        Ok(CalendarTime::try_from(&snapshot)?)
    }

    /// Reads the current time into `time`; `time` is untouched on failure.
    ///
    /// # Errors
    ///
    /// See [`ClockController::now`].
    pub fn get_time(&mut self, time: &mut CalendarTime) -> Result<(), ClockError<P::Error>> {
        *time = self.now()?;
        Ok(())
    }

    /// Writes `time` to the clock.
    ///
    /// # Errors
    ///
    /// Fails when not initialized or when the peripheral rejects the value.
    pub fn set_time(&mut self, time: &CalendarTime) -> Result<(), ClockError<P::Error>> {
        self.ensure_initialized()?;
        self.peripheral
            .write_time(&time.tm_time())
            .map_err(ClockError::Peripheral)?;
        debug!("rtc: time set to {}", time.unix_time());
        Ok(())
    }

    /// Writes `time` only if the clock does not already hold a valid time,
    /// so a clock tracking wall time is never clobbered.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::AlreadyRunning`] if a valid time is present; the
    /// hardware is left untouched.
    pub fn set_time_if_not_running(
        &mut self,
        time: &CalendarTime,
    ) -> Result<(), ClockError<P::Error>> {
        self.ensure_initialized()?;
        if self
            .peripheral
            .has_valid_time()
            .map_err(ClockError::Peripheral)?
        {
            debug!("rtc: keeping running clock, time not written");
            return Err(ClockError::AlreadyRunning);
        }
        self.set_time(time)
    }

    fn install(&mut self, registration: Registration) {
        let kind = registration.trigger.kind();
        if self.registrations[kind.slot()]
            .replace(registration)
            .is_some()
        {
            debug!("rtc: replaced {:?} callback", kind);
        } else {
            debug!("rtc: armed {:?} callback", kind);
        }
    }

    /// Arms `callback` at the given cadence, replacing any periodic callback.
    ///
    /// # Errors
    ///
    /// Fails when not initialized or when the peripheral cannot produce the
    /// cadence; the previous registration stays in place.
    pub fn set_periodic_callback(
        &mut self,
        callback: Callback,
        period: Period,
    ) -> Result<(), ClockError<P::Error>> {
        self.ensure_initialized()?;
        self.peripheral
            .arm_periodic(period)
            .map_err(ClockError::Peripheral)?;
        self.install(Registration {
            callback,
            trigger: Trigger::Periodic(period),
        });
        Ok(())
    }

    /// Arms `callback` to fire when the clock matches `time` on every field
    /// selected by `mask`, replacing any alarm callback.
    ///
    /// An empty mask matches every tick. When the peripheral cannot compare
    /// the fields in `mask` its comparator is disarmed and the alarm is only
    /// matched by [`ClockController::check_alarm`], which the application
    /// then calls on each tick (e.g. from a periodic callback).
    ///
    /// # Errors
    ///
    /// Fails when not initialized or when the peripheral fails to program the
    /// comparison; the previous registration stays in place.
    pub fn set_alarm_callback(
        &mut self,
        callback: Callback,
        time: &CalendarTime,
        mask: AlarmMask,
    ) -> Result<(), ClockError<P::Error>> {
        self.ensure_initialized()?;
        if mask.is_empty() {
            warn!("rtc: alarm mask is empty, alarm fires on every tick");
        }
        if self.peripheral.supports_alarm(mask) {
            self.peripheral
                .arm_alarm(time, mask)
                .map_err(ClockError::Peripheral)?;
        } else {
            debug!("rtc: alarm mask {:?} matched in software", mask);
            self.peripheral
                .disarm(TriggerKind::Alarm)
                .map_err(ClockError::Peripheral)?;
        }
        self.install(Registration {
            callback,
            trigger: Trigger::Alarm { time: *time, mask },
        });
        Ok(())
    }

    fn clear(&mut self, kind: TriggerKind) -> Result<(), ClockError<P::Error>> {
        self.ensure_initialized()?;
        self.peripheral.disarm(kind).map_err(ClockError::Peripheral)?;
        self.registrations[kind.slot()] = None;
        Ok(())
    }

    /// Stops and forgets the periodic callback.
    pub fn clear_periodic_callback(&mut self) -> Result<(), ClockError<P::Error>> {
        self.clear(TriggerKind::Periodic)
    }

    /// Stops and forgets the alarm callback.
    pub fn clear_alarm_callback(&mut self) -> Result<(), ClockError<P::Error>> {
        self.clear(TriggerKind::Alarm)
    }

    /// The active registration of the given kind, if any.
    #[must_use]
    pub fn registration(&self, kind: TriggerKind) -> Option<&Registration> {
        self.registrations[kind.slot()].as_ref()
    }

    /// Runs the callback registered for `kind`. Meant to be called from the
    /// platform's interrupt handler; returns whether a callback ran.
    pub fn dispatch(&self, kind: TriggerKind) -> bool {
        match self.registration(kind) {
            Some(registration) => {
                (registration.callback)();
                true
            }
            None => false,
        }
    }

    /// Evaluates the armed alarm against `now` in software and dispatches it
    /// on a match. For platforms whose comparator cannot match every field.
    pub fn check_alarm(&self, now: &CalendarTime) -> bool {
        match self.registration(TriggerKind::Alarm) {
            Some(Registration {
                callback,
                trigger: Trigger::Alarm { time, mask },
            }) if mask.matches(time, now) => {
                callback();
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::{DayOfWeek, Month, SaveLight};
    use core::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, PartialEq)]
    struct FakeError;

    #[derive(Default)]
    struct FakeRtc {
        time: BrokenDownTime,
        valid: bool,
        running: bool,
        init_calls: usize,
        fail_init: bool,
        reads: usize,
        torn_reads: usize,
        writes: usize,
        periodic: Option<Period>,
        alarm: Option<(CalendarTime, AlarmMask)>,
    }

    impl RtcPeripheral for FakeRtc {
        type Error = FakeError;

        fn init(&mut self) -> Result<(), FakeError> {
            self.init_calls += 1;
            if self.fail_init {
                return Err(FakeError);
            }
            self.running = true;
            Ok(())
        }

        fn is_running(&mut self) -> Result<bool, FakeError> {
            Ok(self.running)
        }

        fn has_valid_time(&mut self) -> Result<bool, FakeError> {
            Ok(self.valid)
        }

        fn read_time(&mut self) -> Result<BrokenDownTime, FakeError> {
            self.reads += 1;
            if self.torn_reads > 0 {
                // every torn read reports a different second
                self.torn_reads -= 1;
                let mut torn = self.time;
                torn.sec = (self.reads % 60) as i32;
                return Ok(torn);
            }
            Ok(self.time)
        }

        fn write_time(&mut self, time: &BrokenDownTime) -> Result<(), FakeError> {
            self.writes += 1;
            self.time = *time;
            self.valid = true;
            Ok(())
        }

        fn arm_periodic(&mut self, period: Period) -> Result<(), FakeError> {
            if period == Period::N256TimesEverySec {
                return Err(FakeError);
            }
            self.periodic = Some(period);
            Ok(())
        }

        fn supports_alarm(&self, mask: AlarmMask) -> bool {
            !mask.is_matching_year()
        }

        fn arm_alarm(&mut self, time: &CalendarTime, mask: AlarmMask) -> Result<(), FakeError> {
            self.alarm = Some((*time, mask));
            Ok(())
        }

        fn disarm(&mut self, kind: TriggerKind) -> Result<(), FakeError> {
            match kind {
                TriggerKind::Periodic => self.periodic = None,
                TriggerKind::Alarm => self.alarm = None,
            }
            Ok(())
        }
    }

    fn sample_time() -> CalendarTime {
        CalendarTime::new(
            14,
            Month::Mar,
            2024,
            15,
            30,
            0,
            DayOfWeek::Thursday,
            SaveLight::Inactive,
        )
        .unwrap()
    }

    fn started() -> ClockController<FakeRtc> {
        let mut clock = ClockController::new(FakeRtc {
            time: sample_time().tm_time(),
            ..FakeRtc::default()
        });
        clock.begin().unwrap();
        clock
    }

    #[test]
    fn test_begin_is_idempotent() {
        let mut clock = ClockController::new(FakeRtc::default());
        assert!(!clock.is_running());
        assert!(clock.begin().is_ok());
        assert!(clock.is_running());
        assert!(clock.begin().is_ok());
        assert!(clock.is_running());
        assert_eq!(clock.release().init_calls, 1);
    }

    #[test]
    fn test_begin_failure_can_be_retried() {
        let mut clock = ClockController::new(FakeRtc {
            fail_init: true,
            ..FakeRtc::default()
        });
        assert_eq!(clock.begin(), Err(ClockError::Peripheral(FakeError)));
        assert!(!clock.is_running());
        assert_eq!(clock.now(), Err(ClockError::NotInitialized));

        let mut rtc = clock.release();
        rtc.fail_init = false;
        let mut clock = ClockController::new(rtc);
        assert!(clock.begin().is_ok());
    }

    fn never_called() {}

    #[test]
    fn test_operations_fail_before_begin() {
        let mut clock = ClockController::new(FakeRtc::default());
        let mut time = CalendarTime::default();
        let t = sample_time();

        assert_eq!(clock.get_time(&mut time), Err(ClockError::NotInitialized));
        assert_eq!(time, CalendarTime::default());
        assert_eq!(clock.set_time(&t), Err(ClockError::NotInitialized));
        assert_eq!(
            clock.set_time_if_not_running(&t),
            Err(ClockError::NotInitialized)
        );
        assert_eq!(
            clock.set_periodic_callback(never_called, Period::OnceEvery1Sec),
            Err(ClockError::NotInitialized)
        );
        assert_eq!(
            clock.set_alarm_callback(never_called, &t, AlarmMask::default()),
            Err(ClockError::NotInitialized)
        );
        assert_eq!(
            clock.clear_alarm_callback(),
            Err(ClockError::NotInitialized)
        );

        let rtc = clock.release();
        assert_eq!(rtc.init_calls, 0);
        assert_eq!(rtc.reads, 0);
        assert_eq!(rtc.writes, 0);
        assert!(rtc.periodic.is_none());
        assert!(rtc.alarm.is_none());
    }

    #[test]
    fn test_get_time() {
        let mut clock = started();
        let mut time = CalendarTime::default();
        assert!(clock.get_time(&mut time).is_ok());
        assert_eq!(time, sample_time());
    }

    #[test]
    fn test_get_time_rereads_torn_snapshot() {
        let mut clock = started();
        clock.peripheral.torn_reads = 1;
        assert_eq!(clock.now(), Ok(sample_time()));
        assert_eq!(clock.peripheral.reads, 3);
    }

    #[test]
    fn test_get_time_gives_up_when_never_consistent() {
        let mut clock = ClockController::with_config(
            FakeRtc {
                time: sample_time().tm_time(),
                torn_reads: usize::MAX,
                ..FakeRtc::default()
            },
            &Config { read_attempts: 4 },
        );
        clock.begin().unwrap();
        let mut time = CalendarTime::default();
        assert_eq!(
            clock.get_time(&mut time),
            Err(ClockError::InconsistentRead)
        );
        assert_eq!(time, CalendarTime::default());
        assert_eq!(clock.peripheral.reads, 4);
    }

    #[test]
    fn test_get_time_rejects_invalid_hardware_value() {
        let mut clock = started();
        clock.peripheral.time.hour = 25;
        assert_eq!(
            clock.now(),
            Err(ClockError::InvalidTime(TimeError::InvalidHour))
        );
    }

    #[test]
    fn test_set_time_overwrites() {
        let mut clock = started();
        let mut t = sample_time();
        t.set_year(2031).unwrap();
        assert!(clock.set_time(&t).is_ok());
        assert!(clock.set_time(&t).is_ok());
        assert_eq!(clock.peripheral.writes, 2);
        assert_eq!(clock.now(), Ok(t));
    }

    #[test]
    fn test_set_time_if_not_running_only_once() {
        let mut clock = started();
        let first = sample_time();
        let mut second = first;
        second.set_hour(3).unwrap();

        assert!(clock.set_time_if_not_running(&first).is_ok());
        assert_eq!(
            clock.set_time_if_not_running(&second),
            Err(ClockError::AlreadyRunning)
        );
        assert_eq!(clock.peripheral.writes, 1);
        assert_eq!(clock.now(), Ok(first));
    }

    static PERIODIC_A: AtomicUsize = AtomicUsize::new(0);
    static PERIODIC_B: AtomicUsize = AtomicUsize::new(0);

    fn periodic_a() {
        PERIODIC_A.fetch_add(1, Ordering::SeqCst);
    }

    fn periodic_b() {
        PERIODIC_B.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn test_periodic_callback_replaces_previous() {
        let mut clock = started();
        assert!(!clock.dispatch(TriggerKind::Periodic));

        clock
            .set_periodic_callback(periodic_a, Period::OnceEvery2Sec)
            .unwrap();
        assert!(clock.dispatch(TriggerKind::Periodic));
        assert_eq!(PERIODIC_A.load(Ordering::SeqCst), 1);

        clock
            .set_periodic_callback(periodic_b, Period::N4TimesEverySec)
            .unwrap();
        assert_eq!(clock.peripheral.periodic, Some(Period::N4TimesEverySec));
        assert!(clock.dispatch(TriggerKind::Periodic));
        assert_eq!(PERIODIC_A.load(Ordering::SeqCst), 1);
        assert_eq!(PERIODIC_B.load(Ordering::SeqCst), 1);
        assert_eq!(
            clock.registration(TriggerKind::Periodic).unwrap().trigger(),
            &Trigger::Periodic(Period::N4TimesEverySec)
        );

        // the alarm slot is untouched by periodic registrations
        assert!(clock.registration(TriggerKind::Alarm).is_none());
        assert!(!clock.dispatch(TriggerKind::Alarm));
    }

    #[test]
    fn test_failed_arming_keeps_previous_registration() {
        let mut clock = started();
        clock
            .set_periodic_callback(never_called, Period::OnceEvery1Sec)
            .unwrap();
        assert_eq!(
            clock.set_periodic_callback(never_called, Period::N256TimesEverySec),
            Err(ClockError::Peripheral(FakeError))
        );
        assert_eq!(
            clock.registration(TriggerKind::Periodic).unwrap().trigger(),
            &Trigger::Periodic(Period::OnceEvery1Sec)
        );
    }

    static ALARMS: AtomicUsize = AtomicUsize::new(0);

    fn on_alarm() {
        ALARMS.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn test_alarm_hour_minute_match() {
        let mut clock = started();
        let mut alarm_time = CalendarTime::default();
        alarm_time.set_hour(7).unwrap();
        alarm_time.set_minute(30).unwrap();
        let mut mask = AlarmMask::default();
        mask.add_match_hour();
        mask.add_match_minute();

        clock.set_alarm_callback(on_alarm, &alarm_time, mask).unwrap();
        assert_eq!(clock.peripheral.alarm, Some((alarm_time, mask)));

        let mut now = sample_time();
        assert!(!clock.check_alarm(&now));
        now.set_hour(7).unwrap();
        now.set_minute(30).unwrap();
        now.set_second(17).unwrap();
        now.set_day_of_week(DayOfWeek::Monday);
        assert!(clock.check_alarm(&now));
        assert_eq!(ALARMS.load(Ordering::SeqCst), 1);

        clock.clear_alarm_callback().unwrap();
        assert!(clock.peripheral.alarm.is_none());
        assert!(!clock.check_alarm(&now));
        assert_eq!(ALARMS.load(Ordering::SeqCst), 1);
    }

    static YEARLY_ALARMS: AtomicUsize = AtomicUsize::new(0);

    fn on_yearly_alarm() {
        YEARLY_ALARMS.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn test_alarm_without_hardware_support_matches_in_software() {
        let mut clock = started();
        let t = sample_time();
        let mut second = AlarmMask::default();
        second.add_match_second();
        clock.set_alarm_callback(never_called, &t, second).unwrap();
        assert!(clock.peripheral.alarm.is_some());

        let mut yearly = AlarmMask::default();
        yearly.add_match_year();
        yearly.add_match_hour();
        clock.set_alarm_callback(on_yearly_alarm, &t, yearly).unwrap();
        // the comparator is released instead of left on the old alarm
        assert!(clock.peripheral.alarm.is_none());
        assert_eq!(
            clock.registration(TriggerKind::Alarm).unwrap().trigger(),
            &Trigger::Alarm { time: t, mask: yearly }
        );

        let mut now = t;
        now.set_minute(2).unwrap();
        assert!(clock.check_alarm(&now));
        now.set_year(2025).unwrap();
        assert!(!clock.check_alarm(&now));
        assert_eq!(YEARLY_ALARMS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_alarm_registration_is_replaced() {
        let mut clock = started();
        let t = sample_time();
        let mut mask = AlarmMask::default();
        mask.add_match_second();
        clock.set_alarm_callback(never_called, &t, mask).unwrap();
        clock
            .set_alarm_callback(never_called, &t, AlarmMask::default())
            .unwrap();
        match clock.registration(TriggerKind::Alarm).unwrap().trigger() {
            Trigger::Alarm { mask, .. } => assert!(mask.is_empty()),
            other => panic!("unexpected trigger {:?}", other),
        }
    }

    #[test]
    fn test_period_rates() {
        assert_eq!(Period::OnceEvery2Sec.per_two_seconds(), 1);
        assert_eq!(Period::OnceEvery1Sec.per_two_seconds(), 2);
        assert_eq!(Period::N2TimesEverySec.per_two_seconds(), 4);
        assert_eq!(Period::N256TimesEverySec.per_two_seconds(), 512);
    }
}
