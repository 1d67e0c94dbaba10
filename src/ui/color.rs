//! Color and formatting utilities for terminal output

pub struct Colors;

impl Colors {
    pub const RESET: &'static str = "\x1b[0m";
    pub const BOLD: &'static str = "\x1b[1m";
    pub const DIM: &'static str = "\x1b[2m";

    pub const CYAN: &'static str = "\x1b[36m";

    // Bright colors
    pub const BRIGHT_RED: &'static str = "\x1b[91m";
    pub const BRIGHT_GREEN: &'static str = "\x1b[92m";
    pub const BRIGHT_YELLOW: &'static str = "\x1b[93m";
    pub const BRIGHT_CYAN: &'static str = "\x1b[96m";
    pub const BRIGHT_WHITE: &'static str = "\x1b[97m";
}

/// Apply color to text if terminal supports it
pub fn colorize(text: &str, color: &str) -> String {
    colorize_if(text, color, supports_formatting())
}

/// Apply color to text when `enabled`
pub fn colorize_if(text: &str, color: &str, enabled: bool) -> String {
    if enabled {
        format!("{}{}{}", color, text, Colors::RESET)
    } else {
        text.to_string()
    }
}

/// Bold variant of [`colorize`]
pub fn bold(text: &str, color: &str) -> String {
    if supports_formatting() {
        format!("{}{}{}{}", color, Colors::BOLD, text, Colors::RESET)
    } else {
        text.to_string()
    }
}

/// Check if the current environment supports ANSI colors and emojis
pub fn supports_formatting() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }

    // Disable formatting when running tests
    if cfg!(test) {
        return false;
    }

    match std::env::var("TERM") {
        Ok(term) => !term.is_empty() && term != "dumb",
        Err(_) => false,
    }
}
