//! Independent-source waveform expressions.
//!
//! Each type renders through `Display` into the exact text the external
//! simulator parses, so a waveform can be passed straight to
//! [`crate::netlist::element`] as the element value.

use std::fmt;

/// `PULSE(...)` waveform: low value, high value, delay, rise time, fall
/// time, on time, period, optional cycle count.
///
/// A missing period defaults to one full cycle, `rise + width + fall +
/// delay`. A missing cycle count means the source runs forever; the
/// rendered text then keeps the separator space before the closing
/// parenthesis, matching what the simulator's own netlist editor emits.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pulse {
    pub off: f64,
    pub on: f64,
    pub delay: f64,
    pub rise: f64,
    pub fall: f64,
    pub width: f64,
    pub period: Option<f64>,
    pub cycles: Option<u32>,
}

impl fmt::Display for Pulse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let period = self
            .period
            .unwrap_or(self.rise + self.width + self.fall + self.delay);
        write!(
            f,
            "PULSE({} {} {} {} {} {} {} {})",
            self.off,
            self.on,
            self.delay,
            self.rise,
            self.fall,
            self.width,
            period,
            OptionalCount(self.cycles)
        )
    }
}

/// `SINE(...)` waveform: offset, amplitude, frequency, delay, damping
/// factor, phase in degrees, optional cycle count.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sine {
    pub offset: f64,
    pub amplitude: f64,
    pub freq: f64,
    pub delay: f64,
    pub damping: f64,
    pub phase_deg: f64,
    pub cycles: Option<u32>,
}

impl fmt::Display for Sine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SINE({} {} {} {} {} {} {})",
            self.offset,
            self.amplitude,
            self.freq,
            self.delay,
            self.damping,
            self.phase_deg,
            OptionalCount(self.cycles)
        )
    }
}

/// `PWL(...)` piecewise-linear waveform: `(time, value)` breakpoints,
/// interleaved and space-joined.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pwl(pub Vec<(f64, f64)>);

impl fmt::Display for Pwl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let points: Vec<String> = self
            .0
            .iter()
            .map(|(time, value)| format!("{} {}", time, value))
            .collect();
        write!(f, "PWL({})", points.join(" "))
    }
}

/// Renders a cycle count, or nothing when absent.
struct OptionalCount(Option<u32>);

impl fmt::Display for OptionalCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(count) => write!(f, "{}", count),
            None => Ok(()),
        }
    }
}
