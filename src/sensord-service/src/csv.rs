//! CSV layout of the persisted sensor log.

use core::fmt::{self, Write as _};

use heapless::String;
use sensord_sensors::{Aht20Sample, Ina226Sample};

use crate::CalendarTime;

/// First line of every sensor log file.
pub const CSV_HEADER: &str = "timestamp,bus_mv,current_ma,power_mw,temp_mc,rh_permille\n";

/// Value written for fields without a sample.
pub const MISSING: i32 = -1;

/// Capacity of a formatted row; the longest possible row is 80 bytes.
pub const ROW_CAPACITY: usize = 96;

/// Capacity of a log file path.
pub const PATH_CAPACITY: usize = 128;

/// Formats one row, `\n` terminated.
///
/// Fields of absent samples, and the timestamp when the clock is unavailable, are written as
/// [`MISSING`].
///
/// # Errors
///
/// Never fails in practice; the error type reflects the bounded buffer.
pub fn format_row(
    timestamp: Option<CalendarTime>,
    ina226: Option<&Ina226Sample>,
    aht20: Option<&Aht20Sample>,
) -> Result<String<ROW_CAPACITY>, fmt::Error> {
    let mut row = String::new();

    match timestamp {
        Some(timestamp) => write!(row, "{timestamp}")?,
        None => write!(row, "{MISSING}")?,
    }

    let (bus_mv, current_ma, power_mw) = ina226.map_or((MISSING, MISSING, MISSING), |s| {
        (s.bus_mv, s.current_ma, s.power_mw)
    });
    let (temp_mc, rh_permille) = aht20.map_or((MISSING, MISSING), |s| (s.temp_mc, s.rh_permille));

    writeln!(
        row,
        ",{bus_mv},{current_ma},{power_mw},{temp_mc},{rh_permille}"
    )?;
    Ok(row)
}

/// Builds the path of the log file of a run started at `started`:
/// `{dir}/{prefix}_{YYYYMMDD}_{HHMMSS}.csv`.
///
/// # Errors
///
/// Fails if the path exceeds [`PATH_CAPACITY`].
pub fn log_path(
    dir: &str,
    prefix: &str,
    started: &CalendarTime,
) -> Result<String<PATH_CAPACITY>, fmt::Error> {
    let mut path = String::new();
    write!(
        path,
        "{}/{prefix}_{}.csv",
        dir.trim_end_matches('/'),
        started.compact()
    )?;
    Ok(path)
}
