#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    StartSwap,
    Cancel,
    Help,
    Status,
    Hello,
}

/// Parse a chat line into a command. A leading `/` is optional, case is ignored
/// and anything after the first word (e.g. `/help@SomeBot`) is discarded.
pub fn parse_command(text: &str) -> Option<Command> {
    let word = text.split_whitespace().next()?;
    let word = word.strip_prefix('/').unwrap_or(word);
    let word = word.split('@').next().unwrap_or(word).to_ascii_lowercase();
    match word.as_str() {
        "start-swap" | "start_swap" | "swap" | "start" => Some(Command::StartSwap),
        "cancel" => Some(Command::Cancel),
        "help" => Some(Command::Help),
        "status" => Some(Command::Status),
        "hello" => Some(Command::Hello),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_aliases_and_ignores_case() {
        assert_eq!(parse_command("/start-swap"), Some(Command::StartSwap));
        assert_eq!(parse_command("SWAP"), Some(Command::StartSwap));
        assert_eq!(parse_command("/start now"), Some(Command::StartSwap));
        assert_eq!(parse_command("/Cancel"), Some(Command::Cancel));
        assert_eq!(parse_command("/help@FaceSwapBot"), Some(Command::Help));
        assert_eq!(parse_command("  status "), Some(Command::Status));
        assert_eq!(parse_command("/hello"), Some(Command::Hello));
    }

    #[test]
    fn rejects_unknown_and_empty_lines() {
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("   "), None);
        assert_eq!(parse_command("/swapp"), None);
        assert_eq!(parse_command("what now?"), None);
    }
}
