use std::fmt;
use std::str::FromStr;

/// A legal action string understood by the native kernel (spec §6.2).
///
/// Three ASCII forms: `*(X,Y)` moves the current player's token to cell
/// (X,Y); `H(X,Y)` places a horizontal wall at grid intersection (X,Y);
/// `V(X,Y)` places a vertical wall at (X,Y). The Turn Router never parses
/// this — only the kernel (here, [`crate::Kernel`] implementors) does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Move(u8, u8),
    WallHorizontal(u8, u8),
    WallVertical(u8, u8),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Move(x, y) => write!(f, "*({},{})", x, y),
            Action::WallHorizontal(x, y) => write!(f, "H({},{})", x, y),
            Action::WallVertical(x, y) => write!(f, "V({},{})", x, y),
        }
    }
}

/// Parse error for a malformed action string. The kernel reports this as
/// its own `InvalidAction` reason; it is not a protocol-layer concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionParseError(pub String);

impl fmt::Display for ActionParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed action string: {}", self.0)
    }
}
impl std::error::Error for ActionParseError {}

impl FromStr for Action {
    type Err = ActionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fail = || ActionParseError(s.to_string());
        let (tag, rest) = s.split_at_checked(1).ok_or_else(fail)?;
        let rest = rest.strip_prefix('(').ok_or_else(fail)?;
        let rest = rest.strip_suffix(')').ok_or_else(fail)?;
        let (x, y) = rest.split_once(',').ok_or_else(fail)?;
        let x: u8 = x.trim().parse().map_err(|_| fail())?;
        let y: u8 = y.trim().parse().map_err(|_| fail())?;
        match tag {
            "*" => Ok(Action::Move(x, y)),
            "H" => Ok(Action::WallHorizontal(x, y)),
            "V" => Ok(Action::WallVertical(x, y)),
            _ => Err(fail()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_move() {
        let a = Action::Move(4, 1);
        assert_eq!(a.to_string().parse::<Action>().unwrap(), a);
    }

    #[test]
    fn round_trips_walls() {
        let h = Action::WallHorizontal(3, 2);
        let v = Action::WallVertical(0, 7);
        assert_eq!(h.to_string(), "H(3,2)");
        assert_eq!(v.to_string(), "V(0,7)");
        assert_eq!(h.to_string().parse::<Action>().unwrap(), h);
        assert_eq!(v.to_string().parse::<Action>().unwrap(), v);
    }

    #[test]
    fn rejects_malformed_strings() {
        assert!("*(4,1".parse::<Action>().is_err());
        assert!("Q(4,1)".parse::<Action>().is_err());
        assert!("*(four,1)".parse::<Action>().is_err());
        assert!("".parse::<Action>().is_err());
        assert!("é(4,1)".parse::<Action>().is_err());
    }
}
