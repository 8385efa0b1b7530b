//! Synthesizer error types
//!
//! All validation happens before a table is written or the timer is armed,
//! so these are only ever returned from the foreground (`start`, setters).
//! The tick path has no error type.

/// Error returned by parameter setters and the start operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthError {
    /// E11: Frequency is not a finite, positive number
    InvalidFrequency,
    /// E12: Amplitude is negative, non-finite or above the voltage reference
    InvalidAmplitude,
    /// E13: Sample count is zero or exceeds the table capacity
    SampleCountOutOfRange,
    /// E14: Derived tick interval is shorter than the timer can deliver
    IntervalTooShort,
    /// E15: Derived tick interval is not finite or longer than the timer accepts
    IntervalTooLong,
    /// E21: `begin()` has not been called
    NotInitialized,
    /// E22: Periodic source refused to arm
    Timer,
}

impl SynthError {
    /// Get error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidFrequency => "E11",
            Self::InvalidAmplitude => "E12",
            Self::SampleCountOutOfRange => "E13",
            Self::IntervalTooShort => "E14",
            Self::IntervalTooLong => "E15",
            Self::NotInitialized => "E21",
            Self::Timer => "E22",
        }
    }

    /// Get error message
    pub fn message(&self) -> &'static str {
        match self {
            Self::InvalidFrequency => "frequency must be > 0",
            Self::InvalidAmplitude => "amplitude outside output range",
            Self::SampleCountOutOfRange => "sample count outside table capacity",
            Self::IntervalTooShort => "tick interval too short for timer",
            Self::IntervalTooLong => "tick interval too long for timer",
            Self::NotInitialized => "engine not initialized",
            Self::Timer => "timer error",
        }
    }

    /// True for errors caused by the requested parameters.
    ///
    /// Retrying with the same parameters will fail the same way.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidFrequency
                | Self::InvalidAmplitude
                | Self::SampleCountOutOfRange
                | Self::IntervalTooShort
                | Self::IntervalTooLong
        )
    }
}

impl core::fmt::Display for SynthError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}
