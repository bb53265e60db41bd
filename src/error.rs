/*
 * Errors and the one fatal path.
 *
 * Nothing in the panel retries a failed synchronisation primitive. Failures
 * that leave the system in an unknown state go through `fatal`, which puts a
 * diagnostic on the log before halting, instead of spinning silently.
 */

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    Init(&'static str),
    Spawn(&'static str),
    /// A blocking receive gave up before an event arrived.
    TimedOut,
    Peripheral(&'static str),
    /// A single transition produced more effects than the effect buffer holds.
    EffectOverflow,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Init(what) => write!(f, "failed to initialise {what}"),
            Error::Spawn(what) => write!(f, "failed to spawn {what}"),
            Error::TimedOut => f.write_str("timed out waiting for an event"),
            Error::Peripheral(what) => write!(f, "transfer failed on {what}"),
            Error::EffectOverflow => f.write_str("effect buffer overflow"),
        }
    }
}

impl core::error::Error for Error {}

/// Reports `error` and halts. Used wherever the system cannot continue.
#[cold]
pub fn fatal(error: Error) -> ! {
    error!("fatal: {}", error);
    panic!("fatal: {}", error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "fatal: failed to spawn ui task")]
    fn fatal_panics_with_context() {
        fatal(Error::Spawn("ui task"));
    }

    #[test]
    fn display_names_the_peripheral() {
        assert_eq!(
            Error::Peripheral("spi1").to_string(),
            "transfer failed on spi1"
        );
    }
}
