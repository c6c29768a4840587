//! Build-time configuration read from environment variables.
//!
//! The macros expand to `const`-evaluable expressions, so they can initialize `const` and
//! `static` items. A variable that is set but cannot be parsed aborts the build.

pub use {const_panic, konst};

macro_rules! define_env_with_default_macro {
    ($macro_name:ident, $parse_fn_name:ident, $output_type_name:literal) => {
        #[doc = concat!("Reads an environment variable at build time and parses it as ", $output_type_name, ", or falls back to the given default.")]
        ///
        /// The third argument documents the setting and is included in the build error when
        /// parsing fails.
        #[macro_export]
        macro_rules! $macro_name {
            ($env_var:literal, $default:expr, $doc:literal) => {
                if let Some(str_value) = option_env!($env_var) {
                    if let Ok(value) = $crate::env::konst::primitive::$parse_fn_name(str_value) {
                        value
                    } else {
                        $crate::env::const_panic::concat_panic!(
                            "Could not parse environment variable `",
                            $env_var,
                            "=",
                            str_value,
                            "` (",
                            $doc,
                            ") as ",
                            $output_type_name,
                        );
                    }
                } else {
                    $default
                }
            };
        }
    };
}

define_env_with_default_macro!(usize_from_env_or, parse_usize, "a usize");
define_env_with_default_macro!(u64_from_env_or, parse_u64, "a u64");

/// Reads an environment variable at build time, or falls back to the given default.
#[macro_export]
macro_rules! str_from_env_or {
    ($env_var:literal, $default:expr, $doc:literal) => {
        if let Some(str_value) = option_env!($env_var) {
            str_value
        } else {
            $default
        }
    };
}

#[cfg(test)]
mod tests {
    const STACKSIZE: usize =
        usize_from_env_or!("CONFIG_SENSORD_UTILS_TEST_UNSET", 2048, "test stack size");
    const PERIOD_MS: u64 = u64_from_env_or!("CONFIG_SENSORD_UTILS_TEST_UNSET", 250, "test period");
    const DIR: &str = str_from_env_or!("CONFIG_SENSORD_UTILS_TEST_UNSET", "/SD:", "test dir");

    #[test]
    fn unset_variables_use_defaults() {
        assert_eq!(STACKSIZE, 2048);
        assert_eq!(PERIOD_MS, 250);
        assert_eq!(DIR, "/SD:");
    }
}
