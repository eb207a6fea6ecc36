//! Operator command decoding.
//!
//! The wire format is a short ASCII string:
//!
//! | Input | Command |
//! |---|---|
//! | `F<n>` / `B<n>` | drive forward / backward `n` cm |
//! | `L<n>` / `R<n>` | rotate left / right `n` degrees |
//! | `STOP` | stop and leave autonomous mode |
//! | `AUTO_NAV` / `AUTO_OFF` | enable / disable autonomous mode |
//!
//! Decoding never fails: anything unrecognised becomes a stop.

use ebug_types::{Command, CommandKind};
use tracing::warn;

/// Decode one command string.
///
/// Whitespace is trimmed first. Prefixes are checked in the order `F`, `B`,
/// `L`, `R`, so `"FORWARD"` is a forward command with magnitude 0.
///
/// ```rust
/// use ebug_middleware::command::parse_command;
/// use ebug_types::CommandKind;
///
/// assert_eq!(parse_command(" F10 ").kind(), CommandKind::Forward);
/// assert_eq!(parse_command("R45").magnitude(), 45);
/// assert_eq!(parse_command("DANCE").kind(), CommandKind::Stop);
/// ```
pub fn parse_command(raw: &str) -> Command {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Command::stop();
    }

    let prefixed = [
        ('F', CommandKind::Forward),
        ('B', CommandKind::Backward),
        ('L', CommandKind::TurnLeft),
        ('R', CommandKind::TurnRight),
    ];
    for (prefix, kind) in prefixed {
        if let Some(rest) = trimmed.strip_prefix(prefix) {
            return Command::new(kind, leading_int(rest));
        }
    }

    match trimmed {
        "STOP" => Command::stop(),
        "AUTO_NAV" => Command::new(CommandKind::AutonomyOn, 0),
        "AUTO_OFF" => Command::new(CommandKind::AutonomyOff, 0),
        other => {
            warn!(input = other, "Unknown command");
            Command::stop()
        }
    }
}

/// The signed integer at the start of `s`, or 0 if there is none.
/// Saturates at the `i32` bounds.
fn leading_int(s: &str) -> i32 {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let mut value: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        value = (value * 10 + i64::from(b - b'0')).min(i64::from(i32::MAX) + 1);
    }
    if negative {
        value = -value;
    }
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(raw: &str) -> (CommandKind, i32) {
        let cmd = parse_command(raw);
        (cmd.kind(), cmd.magnitude())
    }

    #[test]
    fn motion_commands_carry_magnitude() {
        assert_eq!(parsed("F10"), (CommandKind::Forward, 10));
        assert_eq!(parsed("B15"), (CommandKind::Backward, 15));
        assert_eq!(parsed("L90"), (CommandKind::TurnLeft, 90));
        assert_eq!(parsed("R45"), (CommandKind::TurnRight, 45));
    }

    #[test]
    fn keywords_are_exact() {
        assert_eq!(parsed("STOP"), (CommandKind::Stop, 0));
        assert_eq!(parsed("AUTO_NAV"), (CommandKind::AutonomyOn, 0));
        assert_eq!(parsed("AUTO_OFF"), (CommandKind::AutonomyOff, 0));
        assert_eq!(parsed("auto_nav"), (CommandKind::Stop, 0));
    }

    #[test]
    fn whitespace_is_trimmed() {
        assert_eq!(parsed("  L30\r\n"), (CommandKind::TurnLeft, 30));
        assert_eq!(parsed("\tSTOP "), (CommandKind::Stop, 0));
    }

    #[test]
    fn empty_and_unknown_become_stop() {
        assert_eq!(parsed(""), (CommandKind::Stop, 0));
        assert_eq!(parsed("   "), (CommandKind::Stop, 0));
        assert_eq!(parsed("JUMP"), (CommandKind::Stop, 0));
    }

    #[test]
    fn prefix_wins_over_keyword_shape() {
        assert_eq!(parsed("FORWARD"), (CommandKind::Forward, 0));
        assert_eq!(parsed("RIGHT90"), (CommandKind::TurnRight, 0));
        assert_eq!(parsed("BACK"), (CommandKind::Backward, 0));
    }

    #[test]
    fn magnitude_takes_leading_signed_integer() {
        assert_eq!(parsed("F-5"), (CommandKind::Forward, -5));
        assert_eq!(parsed("F 12cm"), (CommandKind::Forward, 12));
        assert_eq!(parsed("R12.7"), (CommandKind::TurnRight, 12));
        assert_eq!(parsed("F99999999999"), (CommandKind::Forward, i32::MAX));
    }
}
