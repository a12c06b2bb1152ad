//! REPL command parsing.
//!
//! Commands start with `/`; anything else is free text whose meaning depends
//! on the current screen (a wizard answer or a chat turn).

use std::str::FromStr;

use timemachine_core::diary::EmotionFilter;

/// Command names offered for completion, in help order.
pub const COMMAND_NAMES: &[&str] = &[
    "/login", "/signup", "/logout", "/new", "/diary", "/filter", "/view", "/delete", "/save",
    "/back", "/end", "/extend", "/status", "/help", "/quit",
];

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login,
    SignUp,
    Logout,
    New,
    Diary,
    Filter(EmotionFilter),
    /// 1-based index into the diary list as last shown
    View(usize),
    Delete(usize),
    Save,
    Back,
    End,
    Extend,
    Status,
    Help,
    Quit,
    Text(String),
}

/// Why a line starting with `/` was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    Unknown(String),
    MissingArgument(&'static str),
    InvalidArgument(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown(name) => write!(f, "알 수 없는 명령입니다: {} (/help 참고)", name),
            Self::MissingArgument(usage) => write!(f, "사용법: {}", usage),
            Self::InvalidArgument(arg) => write!(f, "잘못된 값입니다: {}", arg),
        }
    }
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else {
            return Ok(Self::Text(line.to_string()));
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };
        match name.to_ascii_lowercase().as_str() {
            "login" => Ok(Self::Login),
            "signup" => Ok(Self::SignUp),
            "logout" => Ok(Self::Logout),
            "new" => Ok(Self::New),
            "diary" => Ok(Self::Diary),
            "filter" => {
                if arg.is_empty() {
                    return Err(ParseError::MissingArgument("/filter <감정|all>"));
                }
                arg.parse()
                    .map(Self::Filter)
                    .map_err(|_| ParseError::InvalidArgument(arg.to_string()))
            }
            "view" => parse_index(arg, "/view <번호>").map(Self::View),
            "delete" => parse_index(arg, "/delete <번호>").map(Self::Delete),
            "save" => Ok(Self::Save),
            "back" => Ok(Self::Back),
            "end" => Ok(Self::End),
            "extend" => Ok(Self::Extend),
            "status" => Ok(Self::Status),
            "help" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            _ => Err(ParseError::Unknown(format!("/{}", name))),
        }
    }
}

fn parse_index(arg: &str, usage: &'static str) -> Result<usize, ParseError> {
    if arg.is_empty() {
        return Err(ParseError::MissingArgument(usage));
    }
    match arg.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ParseError::InvalidArgument(arg.to_string())),
    }
}

/// Whether a confirmation answer means yes.
pub fn is_yes(answer: &str) -> bool {
    matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes" | "네" | "예" | "응"
    )
}
