//! Constructors for the common statement shapes.
//!
//! Pure formatting, no merge logic. Field order and optional-field elision
//! follow what the external simulator accepts. Values are anything
//! displayable, so both numbers and pre-formatted strings like `"10n"`
//! work.

use std::fmt::Display;

use crate::netlist::statement::Statement;

/// `.PARAM name=value` definition.
pub fn param(name: impl Display, value: impl Display) -> Statement {
    Statement::new(format!(".PARAM {}={}", name, value))
}

/// `.FUNC` definition. The simulator rejects whitespace inside the
/// definition body, so all spaces are stripped from it.
pub fn func(definition: impl Display) -> Statement {
    Statement::new(format!(".FUNC {}", definition.to_string().replace(' ', "")))
}

/// `.ic name=value` initial-condition card.
pub fn initial_condition(name: impl Display, value: impl Display) -> Statement {
    Statement::new(format!(".ic {}={}", name, value))
}

/// Element line: name, cathode node, anode node, value. The value may be a
/// plain number or a waveform expression such as
/// [`crate::netlist::Pulse`].
pub fn element(
    name: impl Display,
    cathode: impl Display,
    anode: impl Display,
    value: impl Display,
) -> Statement {
    Statement::new(format!("{} {} {} {}", name, cathode, anode, value))
}

/// `.tran` transient-analysis card. `steady` appends the simulator's
/// stop-on-steady-state flag.
pub fn transient(
    stop: impl Display,
    start: impl Display,
    max_step: impl Display,
    steady: bool,
) -> Statement {
    let mut text = format!(".tran 0 {} {} {}", stop, start, max_step);
    if steady {
        text.push_str(" steady");
    }
    Statement::new(text)
}
