use core::fmt;

/// A message sink that services report their progress and failures to.
///
/// Implementations are fire-and-forget: they must not block indefinitely, and they have no way
/// of reporting failure to the caller.
pub trait Logger: Send + Sync {
    /// Logs an informational message.
    fn info(&self, message: fmt::Arguments<'_>);

    /// Logs an error message together with a (negative, errno-style) error code.
    fn error(&self, message: fmt::Arguments<'_>, code: i32);
}

/// [`Logger`] forwarding to this crate's log macros, and thus to the selected backend.
#[derive(Debug, Default, Copy, Clone)]
pub struct SystemLogger;

impl SystemLogger {
    /// Creates a new [`SystemLogger`].
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Logger for SystemLogger {
    fn info(&self, message: fmt::Arguments<'_>) {
        #[cfg(feature = "defmt")]
        crate::info!("{}", defmt::Display2Format(&message));
        #[cfg(not(feature = "defmt"))]
        crate::info!("{}", message);
    }

    fn error(&self, message: fmt::Arguments<'_>, code: i32) {
        #[cfg(feature = "defmt")]
        crate::error!("{} err={}", defmt::Display2Format(&message), code);
        #[cfg(not(feature = "defmt"))]
        crate::error!("{} err={}", message, code);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_logger_is_usable_as_trait_object() {
        static LOG: SystemLogger = SystemLogger::new();
        let log: &'static dyn Logger = &LOG;
        log.info(format_args!("sensor service starting"));
        log.error(format_args!("sensor sample failed type={}", 1), -19);
    }
}
