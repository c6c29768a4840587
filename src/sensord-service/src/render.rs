//! Human-readable snapshot lines.

use core::fmt;

use sensord_log::Logger;
use sensord_sensors::{Aht20Sample, Ina226Sample, Sample, SensorType};

/// Logs one line describing the cached sample `data` of `sensor_type`.
///
/// Known types get their fields rendered in physical units; anything else, including a known
/// type whose bytes do not decode, gets a generic line.
pub(crate) fn render_sample(log: &dyn Logger, sensor_type: SensorType, data: &[u8]) {
    match sensor_type {
        SensorType::Ina226 => {
            if let Ok(s) = Ina226Sample::decode(data) {
                log.info(format_args!(
                    "[sensor] INA226: V={}mV I={}mA P={}mW",
                    s.bus_mv, s.current_ma, s.power_mw
                ));
                return;
            }
        }
        SensorType::Aht20 => {
            if let Ok(s) = Aht20Sample::decode(data) {
                log.info(format_args!(
                    "[sensor] AHT20: T={}C RH={}%",
                    Milli(s.temp_mc),
                    Permille(s.rh_permille)
                ));
                return;
            }
        }
        SensorType::Custom(_) => {}
    }

    log.info(format_args!("[sensor] {sensor_type} sample updated"));
}

/// Logs that no entry holds a valid sample yet.
pub(crate) fn render_waiting(log: &dyn Logger) {
    log.info(format_args!("[sensor] waiting for first valid samples"));
}

/// Thousandths, rendered as a decimal with three fraction digits.
struct Milli(i32);

impl fmt::Display for Milli {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:03}", abs / 1000, abs % 1000)
    }
}

/// Per-mille, rendered as a percentage with one fraction digit.
struct Permille(i32);

impl fmt::Display for Permille {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{}", abs / 10, abs % 10)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::{string::String, sync::Mutex, vec::Vec};

    use sensord_log::Logger;

    /// Logger keeping every line, errors suffixed with their code.
    #[derive(Default)]
    pub(crate) struct Recorder {
        lines: Mutex<Vec<String>>,
    }

    impl Recorder {
        pub(crate) const fn new() -> Self {
            Self {
                lines: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn count(&self, prefix: &str) -> usize {
            self.lines
                .lock()
                .unwrap()
                .iter()
                .filter(|line| line.starts_with(prefix))
                .count()
        }

        pub(crate) fn lines(&self) -> Vec<String> {
            self.lines.lock().unwrap().clone()
        }
    }

    impl Logger for Recorder {
        fn info(&self, message: core::fmt::Arguments<'_>) {
            self.lines.lock().unwrap().push(message.to_string());
        }

        fn error(&self, message: core::fmt::Arguments<'_>, code: i32) {
            self.lines
                .lock()
                .unwrap()
                .push(format!("{message} err={code}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{testing::Recorder, *};

    #[test]
    fn known_types_render_physical_units() {
        let log = Recorder::default();

        let mut buf = [0u8; 20];
        Ina226Sample {
            bus_mv: 12_034,
            current_ma: -15,
            power_mw: 180,
            timestamp_ms: 1,
        }
        .encode(&mut buf)
        .unwrap();
        render_sample(&log, SensorType::Ina226, &buf);

        Aht20Sample {
            temp_mc: -1_005,
            rh_permille: 457,
            timestamp_ms: 1,
        }
        .encode(&mut buf)
        .unwrap();
        render_sample(&log, SensorType::Aht20, &buf);

        assert_eq!(
            log.lines(),
            [
                "[sensor] INA226: V=12034mV I=-15mA P=180mW",
                "[sensor] AHT20: T=-1.005C RH=45.7%",
            ]
        );
    }

    #[test]
    fn other_types_render_generic_line() {
        let log = Recorder::default();

        render_sample(&log, SensorType::Custom(3), &[0x55; 4]);
        // Too short to decode.
        render_sample(&log, SensorType::Ina226, &[0; 4]);
        render_waiting(&log);

        assert_eq!(
            log.lines(),
            [
                "[sensor] custom#3 sample updated",
                "[sensor] INA226 sample updated",
                "[sensor] waiting for first valid samples",
            ]
        );
    }

    #[test]
    fn fixed_point_rendering() {
        assert_eq!(Milli(21_500).to_string(), "21.500");
        assert_eq!(Milli(-7).to_string(), "-0.007");
        assert_eq!(Milli(i32::MIN).to_string(), "-2147483.648");
        assert_eq!(Permille(1000).to_string(), "100.0");
        assert_eq!(Permille(5).to_string(), "0.5");
    }
}
