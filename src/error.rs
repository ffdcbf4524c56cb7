use core::fmt;

/// Errors returned by the driver, generic over the bus error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<E> {
    /// Bus transaction failed. A no-acknowledge here means no device answered
    /// at the configured address (wrong address pins or wiring fault).
    I2c(E),
    /// Response checksum did not match the received data bytes.
    Checksum { expected: u8, received: u8 },
    /// Requested periodic measurement interval is out of range.
    InvalidPeriodicInterval,
    /// Requested resolution is outside the supported 8..=14 bits.
    InvalidResolution,
}

impl<E> From<E> for Error<E> {
    fn from(err: E) -> Self {
        Error::I2c(err)
    }
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::I2c(err) => write!(f, "i2c transaction failed: {err:?}"),
            Error::Checksum { expected, received } => write!(
                f,
                "response checksum mismatch: expected 0x{expected:02X}, received 0x{received:02X}"
            ),
            Error::InvalidPeriodicInterval => {
                write!(f, "periodic measurement interval out of range")
            }
            Error::InvalidResolution => write!(f, "measurement resolution must be 8..=14 bits"),
        }
    }
}

impl<E: fmt::Debug> core::error::Error for Error<E> {}
