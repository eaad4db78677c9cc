use anyhow::{Result, anyhow};
use directories::ProjectDirs;

pub fn trim_line(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

pub fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

pub fn strip_controls_and_escapes(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            // ANSI escape sequence (ESC … letter)
            '\x1b' => {
                while let Some(&next) = chars.peek() {
                    chars.next();
                    if next.is_ascii_alphabetic() {
                        break;
                    }
                }
            }
            c if c.is_control() => {}
            c => out.push(c),
        }
    }

    out.trim().to_string()
}

pub fn get_data_dir() -> Result<std::path::PathBuf> {
    let proj_dirs = ProjectDirs::from("", "", "flashgen")
        .ok_or_else(|| anyhow!("Could not determine project directory"))?;

    let data_dir = proj_dirs.data_dir();
    std::fs::create_dir_all(data_dir)?;

    Ok(data_dir.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_controls_and_escapes() {
        assert_eq!(strip_controls_and_escapes("\x1b[1mHello\x1b[0m"), "Hello");
        assert_eq!(strip_controls_and_escapes("sk-\u{7}abc\n"), "sk-abc");
    }

    #[test]
    fn test_trim_line() {
        assert_eq!(trim_line("  topic "), Some("topic"));
        assert_eq!(trim_line(" \t"), None);
    }

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize("card", 1), "1 card");
        assert_eq!(pluralize("card", 0), "0 cards");
        assert_eq!(pluralize("flashcard", 10), "10 flashcards");
    }
}
