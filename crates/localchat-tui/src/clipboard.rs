//! Copying code blocks to the system clipboard.
//!
//! Uses the platform clipboard through `arboard`. When no platform
//! clipboard can be opened (SSH sessions, headless hosts) the text goes out
//! as an OSC 52 terminal escape instead.

use std::io::{self, Write};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{debug, error};

/// Lazily opened handle on the system clipboard.
///
/// The handle is kept for the life of the app: on X11 and Wayland the copied
/// text is only served while the owning `arboard::Clipboard` exists.
#[derive(Default)]
pub struct Clipboard {
    system: Option<arboard::Clipboard>,
}

impl Clipboard {
    /// Copy `text`, falling back to OSC 52 when the platform clipboard is
    /// unavailable.
    pub fn copy(&mut self, text: &str) -> Result<(), String> {
        if self.system.is_none() {
            match arboard::Clipboard::new() {
                Ok(clipboard) => self.system = Some(clipboard),
                Err(e) => {
                    debug!(error = %e, "System clipboard unavailable, using OSC 52");
                    return write_osc52(&mut io::stdout().lock(), text).map_err(|e| {
                        let err_msg = format!("Failed to write clipboard escape: {}", e);
                        error!("{}", err_msg);
                        err_msg
                    });
                }
            }
        }

        let Some(clipboard) = self.system.as_mut() else {
            return Err("Clipboard not initialized".to_string());
        };
        clipboard.set_text(text.to_owned()).map_err(|e| {
            let err_msg = format!("Failed to set clipboard text: {}", e);
            error!("{}", err_msg);
            err_msg
        })
    }
}

/// The escape sequence that asks the terminal to put `text` on the
/// system clipboard.
pub fn osc52_sequence(text: &str) -> String {
    format!("\x1b]52;c;{}\x07", STANDARD.encode(text))
}

fn write_osc52<W: Write>(out: &mut W, text: &str) -> io::Result<()> {
    out.write_all(osc52_sequence(text).as_bytes())?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_osc52_sequence() {
        assert_eq!(osc52_sequence("hi"), "\x1b]52;c;aGk=\x07");
    }

    #[test]
    fn test_osc52_multiline_utf8() {
        let seq = osc52_sequence("fn main() {}\n// é");
        assert!(seq.starts_with("\x1b]52;c;"));
        assert!(seq.ends_with('\x07'));
        let payload = &seq["\x1b]52;c;".len()..seq.len() - 1];
        let decoded = STANDARD.decode(payload).unwrap();
        assert_eq!(String::from_utf8(decoded).unwrap(), "fn main() {}\n// é");
    }

    #[test]
    fn test_fallback_writes_whole_sequence() {
        let mut out = Vec::new();
        write_osc52(&mut out, "let x = 1;").unwrap();
        assert_eq!(out, osc52_sequence("let x = 1;").into_bytes());
    }
}
