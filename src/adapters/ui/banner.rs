//! Startup banner: "VOTE-SYNC" in figlet with a vertical gradient.

use crossterm::ExecutableCommand;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use figlet_rs::FIGfont;
use std::io::{Write, stdout};

/// Upvote orange (#ff4500).
const UPVOTE_ORANGE: (u8, u8, u8) = (0xff, 0x45, 0x00);
/// Downvote periwinkle (#7193ff).
const DOWNVOTE_BLUE: (u8, u8, u8) = (0x71, 0x93, 0xff);

/// Linear interpolation between two RGB colors. `t` in [0.0, 1.0].
fn lerp_rgb(a: (u8, u8, u8), b: (u8, u8, u8), t: f64) -> (u8, u8, u8) {
    let r = (f64::from(a.0) * (1.0 - t) + f64::from(b.0) * t).round() as u8;
    let g = (f64::from(a.1) * (1.0 - t) + f64::from(b.1) * t).round() as u8;
    let bl = (f64::from(a.2) * (1.0 - t) + f64::from(b.2) * t).round() as u8;
    (r, g, bl)
}

fn banner_art() -> String {
    FIGfont::standard()
        .ok()
        .and_then(|font| font.convert("VOTE-SYNC").map(|f| f.to_string()))
        .unwrap_or_else(|| "VOTE-SYNC".to_string())
}

pub fn print_welcome() {
    let mut out = stdout();
    let art = banner_art();
    let lines: Vec<&str> = art.lines().collect();
    let total = lines.len().max(1);

    for (i, line) in lines.iter().enumerate() {
        let t = if total <= 1 {
            1.0
        } else {
            i as f64 / (total - 1) as f64
        };
        let (r, g, b) = lerp_rgb(UPVOTE_ORANGE, DOWNVOTE_BLUE, t);
        let _ = out.execute(SetForegroundColor(Color::Rgb { r, g, b }));
        let _ = out.execute(Print(line));
        let _ = out.execute(Print("\r\n"));
        let _ = out.execute(ResetColor);
    }

    let _ = out.execute(SetForegroundColor(Color::Rgb {
        r: UPVOTE_ORANGE.0,
        g: UPVOTE_ORANGE.1,
        b: UPVOTE_ORANGE.2,
    }));
    let _ = out.execute(Print(format!("v{}\r\n", env!("CARGO_PKG_VERSION"))));
    let _ = out.execute(ResetColor);
    let _ = out.flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp_endpoints() {
        assert_eq!(lerp_rgb(UPVOTE_ORANGE, DOWNVOTE_BLUE, 0.0), UPVOTE_ORANGE);
        assert_eq!(lerp_rgb(UPVOTE_ORANGE, DOWNVOTE_BLUE, 1.0), DOWNVOTE_BLUE);
    }

    #[test]
    fn test_banner_art_not_empty() {
        assert!(!banner_art().trim().is_empty());
    }
}
