//! Conversions between milliseconds and the `ATIME`/`PTIME`/`WTIME` register
//! format.
//!
//! All three timing registers count down from 256: the register holds
//! `256 - cycles`, where one cycle is 2.72 ms, or 32 ms for the wait timer
//! when `WLONG` is set.

/// Shortest time the encoders accept. Smaller requests are raised to this.
pub const MIN_TIME_MS: u16 = 3;

/// Longest wait time that still fits the 2.72 ms time base. Anything above
/// this switches the wait timer to the 32 ms base.
pub const LONG_WAIT_THRESHOLD_MS: u16 = 696;

const MAX_CYCLES: u16 = 255;

/// Time base of a timing register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum TimeBase {
    /// 2.72 ms per cycle
    Short,
    /// 32 ms per cycle, wait timer with `WLONG` set
    Long,
}

impl TimeBase {
    /// Time base the wait timer needs for `ms`.
    pub fn for_wait(ms: u16) -> Self {
        if ms > LONG_WAIT_THRESHOLD_MS {
            TimeBase::Long
        } else {
            TimeBase::Short
        }
    }

    /// Duration of one cycle in milliseconds
    pub fn cycle_ms(self) -> f32 {
        match self {
            TimeBase::Short => 2.72,
            TimeBase::Long => 32.0,
        }
    }

    /// Cycles per millisecond used by [`encode`](Self::encode).
    ///
    /// The short base factor is truncated below `1 / 2.72`, so requests
    /// falling exactly halfway between two cycle counts (34 ms, 102 ms, ...)
    /// round down.
    pub fn cycles_per_ms(self) -> f32 {
        match self {
            TimeBase::Short => 0.367647,
            TimeBase::Long => 0.03125,
        }
    }

    /// Convert `ms` into a register value.
    ///
    /// The 2.72 ms base clamps the request to at least [`MIN_TIME_MS`]; the
    /// cycle count is clamped to 255.
    pub fn encode(self, ms: u16) -> u8 {
        let ms = match self {
            TimeBase::Short => ms.max(MIN_TIME_MS),
            TimeBase::Long => ms,
        };
        let cycles = libm::roundf(f32::from(ms) * self.cycles_per_ms()) as u16;
        // 256 - 0 wraps to 0, which the chip treats as 256 cycles
        (256 - cycles.min(MAX_CYCLES)) as u8
    }

    /// Convert a register value back into milliseconds, rounded to the
    /// nearest millisecond.
    pub fn decode(self, value: u8) -> u16 {
        let cycles = 256 - u16::from(value);
        libm::roundf(f32::from(cycles) * self.cycle_ms()) as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_encode_known_values() {
        // 100 ms / 2.72 = 36.76 -> 37 cycles
        assert_eq!(TimeBase::Short.encode(100), 219);
        // 696 ms / 2.72 = 255.9 -> clamped to 255 cycles
        assert_eq!(TimeBase::Short.encode(696), 1);
        assert_eq!(TimeBase::Short.encode(3), 255);
    }

    #[test]
    fn test_short_encode_rounds_half_cycles_down() {
        // 34 ms is exactly 12.5 cycles -> 12
        assert_eq!(TimeBase::Short.encode(34), 244);
        // 102 ms is exactly 37.5 cycles -> 37
        assert_eq!(TimeBase::Short.encode(102), 219);
        assert_eq!(TimeBase::Short.encode(646), 19);
    }

    #[test]
    fn test_short_encode_clamps_low_input() {
        for ms in 0..MIN_TIME_MS {
            assert_eq!(TimeBase::Short.encode(ms), TimeBase::Short.encode(MIN_TIME_MS));
        }
    }

    #[test]
    fn test_encode_clamps_cycle_count() {
        assert_eq!(TimeBase::Short.encode(u16::MAX), 1);
        assert_eq!(TimeBase::Short.encode(2000), 1);
        assert_eq!(TimeBase::Long.encode(u16::MAX), 1);
        // 8160 ms is exactly 255 long cycles
        assert_eq!(TimeBase::Long.encode(8160), 1);
        assert_eq!(TimeBase::Long.encode(9000), 1);
    }

    #[test]
    fn test_decode_known_values() {
        assert_eq!(TimeBase::Short.decode(0xFF), 3);
        assert_eq!(TimeBase::Short.decode(0xDB), 101);
        assert_eq!(TimeBase::Short.decode(0x01), 694);
        assert_eq!(TimeBase::Long.decode(0xFF), 32);
        assert_eq!(TimeBase::Long.decode(0x01), 8160);
    }

    #[test]
    fn test_short_round_trip_within_one_cycle() {
        for ms in MIN_TIME_MS..=LONG_WAIT_THRESHOLD_MS {
            let decoded = TimeBase::Short.decode(TimeBase::Short.encode(ms));
            let diff = f32::from(decoded.abs_diff(ms));
            assert!(diff <= TimeBase::Short.cycle_ms(), "{} ms decoded as {} ms", ms, decoded);
        }
    }

    #[test]
    fn test_long_round_trip_within_one_cycle() {
        for ms in (LONG_WAIT_THRESHOLD_MS + 1)..=8160 {
            let decoded = TimeBase::Long.decode(TimeBase::Long.encode(ms));
            let diff = f32::from(decoded.abs_diff(ms));
            assert!(diff <= TimeBase::Long.cycle_ms(), "{} ms decoded as {} ms", ms, decoded);
        }
    }

    #[test]
    fn test_wait_time_base_switches_above_threshold() {
        assert_eq!(TimeBase::for_wait(696), TimeBase::Short);
        assert_eq!(TimeBase::for_wait(697), TimeBase::Long);
        assert_eq!(TimeBase::for_wait(0), TimeBase::Short);
    }
}
