#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Info,
    Success,
    Warning,
    Failure,
}

impl Tone {
    pub fn color_code(&self) -> &'static str {
        match self {
            Tone::Info => "\x1b[36m",    // Cyan
            Tone::Success => "\x1b[32m", // Green
            Tone::Warning => "\x1b[33m", // Yellow
            Tone::Failure => "\x1b[31m", // Red
        }
    }

    pub fn reset_color() -> &'static str {
        "\x1b[0m"
    }
}

pub fn paint(text: &str, tone: Tone, color: bool) -> String {
    if color {
        format!("{}{}{}", tone.color_code(), text, Tone::reset_color())
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_mode_leaves_text_alone() {
        assert_eq!(paint("[+] OPEN", Tone::Success, false), "[+] OPEN");
        assert_eq!(paint("x", Tone::Failure, true), "\x1b[31mx\x1b[0m");
    }
}
