//! Command-line surface of the relay tool: `TARGET_PWR NUM_EVENTS`.
//!
//! Parsing is kept free of `std` so firmware shells can reuse it; the host
//! binary only forwards `std::env::args` and maps errors to exit codes.
use crate::config::{RelayConfig, RelayConfigBuilder};
use crate::error::{ConfigError, UsageError};

/// Process exit status on success.
pub const EXIT_SUCCESS: i32 = 0;
/// Process exit status on usage or setup errors.
pub const EXIT_FAILURE: i32 = 1;

pub const USAGE: &str = "\
Usage: can-mitm TARGET_PWR NUM_EVENTS

Relay CAN traffic from channel A (port 0) to channel B (port 1),
overwriting the first four data bytes of every clean frame.

  TARGET_PWR: 1 turns on target power, 0 does not
  NUM_EVENTS: Number of events to process before exiting.  If this is
              set to zero, the capture will continue indefinitely
";

/// Parsed positional arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RelayArgs {
    /// Any non-zero value powers the target.
    pub target_power: bool,
    /// Frame budget; `0` means unbounded.
    pub max_events: u64,
}

impl RelayArgs {
    /// Parse the positional arguments (program name excluded).
    ///
    /// Extra arguments are ignored.
    ///
    /// # Example
    ///
    /// ```
    /// use can_mitm::cli::RelayArgs;
    ///
    /// let args = RelayArgs::parse(["1", "10"]).unwrap();
    /// assert!(args.target_power);
    /// assert_eq!(args.max_events, 10);
    ///
    /// assert!(RelayArgs::parse(["1"]).is_err());
    /// ```
    pub fn parse<'a, I>(args: I) -> Result<Self, UsageError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut args = args.into_iter();
        let (power, events) = match (args.next(), args.next()) {
            (Some(power), Some(events)) => (power, events),
            (Some(_), None) => return Err(UsageError::MissingArguments { found: 1 }),
            _ => return Err(UsageError::MissingArguments { found: 0 }),
        };

        let power: i64 = power
            .trim()
            .parse()
            .map_err(|_| UsageError::InvalidNumber { position: 1 })?;
        let max_events: u64 = events
            .trim()
            .parse()
            .map_err(|_| UsageError::InvalidNumber { position: 2 })?;

        Ok(Self {
            target_power: power != 0,
            max_events,
        })
    }

    /// Builder seeded with the parsed arguments and the adapter defaults.
    pub fn to_builder(&self) -> RelayConfigBuilder {
        RelayConfig::builder()
            .target_power(self.target_power)
            .max_events(self.max_events)
    }

    pub fn to_config(&self) -> Result<RelayConfig, ConfigError> {
        self.to_builder().build()
    }
}
