//! Command parsing for the command line

/// Parsed command from the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Quit the application: :q or :quit
    Quit,
    /// Show help: :help or :h
    Help,
    /// Follow a link: :goto faq, :goto #anchor, :goto faq.md#login
    Goto(String),
    /// Copy a link to the current heading: :copy-link
    CopyLink,
    /// Copy the Nth code block of the section: :copy-code 2
    CopyCode(usize),
    /// Store the assistant API key: :assistant-key <api-key>
    AssistantKey(String),
    /// Switch the assistant model: :assistant-model <haiku|sonnet|opus>
    AssistantModel(String),
    /// Start a new assistant conversation: :assistant-clear
    AssistantClear,
    /// Ask the assistant a question: :ask <question>
    Ask(String),
    /// Toggle the table of contents: :toc
    Toc,
    /// Clear message: (empty command)
    Nop,
}

/// Result of parsing a command
#[derive(Debug, PartialEq, Eq)]
pub enum ParseResult {
    /// Successfully parsed command
    Ok(Command),
    /// Unknown command
    UnknownCommand(String),
    /// Command needs an argument
    MissingArgument(String),
    /// Argument present but unusable
    InvalidArgument { command: String, argument: String },
}

/// Parse a command string (without the leading :)
pub fn parse_command(input: &str) -> ParseResult {
    let input = input.trim();

    if input.is_empty() {
        return ParseResult::Ok(Command::Nop);
    }

    let mut parts = input.splitn(2, char::is_whitespace);
    let cmd = parts.next().unwrap_or("");
    let args = parts.next().map(|s| s.trim()).unwrap_or("");

    let with_arg = |name: &str, build: fn(String) -> Command| {
        if args.is_empty() {
            ParseResult::MissingArgument(name.to_string())
        } else {
            ParseResult::Ok(build(args.to_string()))
        }
    };

    match cmd.to_lowercase().as_str() {
        "quit" | "q" => ParseResult::Ok(Command::Quit),
        "help" | "h" | "?" => ParseResult::Ok(Command::Help),
        "goto" | "g" | "open" => with_arg("goto", Command::Goto),
        "copy-link" | "cl" => ParseResult::Ok(Command::CopyLink),
        "copy-code" | "cc" => {
            if args.is_empty() {
                return ParseResult::Ok(Command::CopyCode(1));
            }
            match args.parse::<usize>() {
                Ok(n) if n > 0 => ParseResult::Ok(Command::CopyCode(n)),
                _ => ParseResult::InvalidArgument {
                    command: "copy-code".to_string(),
                    argument: args.to_string(),
                },
            }
        }
        "assistant-key" | "ak" => with_arg("assistant-key", Command::AssistantKey),
        "assistant-model" | "am" => with_arg("assistant-model", Command::AssistantModel),
        "assistant-clear" | "ac" => ParseResult::Ok(Command::AssistantClear),
        "ask" => with_arg("ask", Command::Ask),
        "toc" => ParseResult::Ok(Command::Toc),
        _ => ParseResult::UnknownCommand(cmd.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_empty() {
        assert_eq!(parse_command(""), ParseResult::Ok(Command::Nop));
        assert_eq!(parse_command("   "), ParseResult::Ok(Command::Nop));
    }

    #[test]
    fn parse_quit_aliases() {
        assert_eq!(parse_command("q"), ParseResult::Ok(Command::Quit));
        assert_eq!(parse_command("QUIT"), ParseResult::Ok(Command::Quit));
    }

    #[test]
    fn parse_goto_keeps_argument() {
        assert_eq!(
            parse_command("goto faq.md#login"),
            ParseResult::Ok(Command::Goto("faq.md#login".into()))
        );
        assert_eq!(parse_command("g #setup"), ParseResult::Ok(Command::Goto("#setup".into())));
        assert_eq!(parse_command("goto"), ParseResult::MissingArgument("goto".into()));
    }

    #[test]
    fn parse_copy_code_index() {
        assert_eq!(parse_command("copy-code"), ParseResult::Ok(Command::CopyCode(1)));
        assert_eq!(parse_command("cc 3"), ParseResult::Ok(Command::CopyCode(3)));
        assert_eq!(
            parse_command("copy-code zero"),
            ParseResult::InvalidArgument { command: "copy-code".into(), argument: "zero".into() }
        );
        assert!(matches!(parse_command("copy-code 0"), ParseResult::InvalidArgument { .. }));
    }

    #[test]
    fn parse_assistant_commands() {
        assert_eq!(
            parse_command("assistant-key sk-ant-xyz"),
            ParseResult::Ok(Command::AssistantKey("sk-ant-xyz".into()))
        );
        assert_eq!(
            parse_command("am sonnet"),
            ParseResult::Ok(Command::AssistantModel("sonnet".into()))
        );
        assert_eq!(parse_command("assistant-clear"), ParseResult::Ok(Command::AssistantClear));
        assert_eq!(
            parse_command("ask how do I reset my password?"),
            ParseResult::Ok(Command::Ask("how do I reset my password?".into()))
        );
        assert_eq!(parse_command("ask"), ParseResult::MissingArgument("ask".into()));
    }

    #[test]
    fn parse_unknown() {
        assert_eq!(parse_command("frobnicate"), ParseResult::UnknownCommand("frobnicate".into()));
    }
}
