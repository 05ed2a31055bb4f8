//! Marketing front page. Static content plus the collapsible mobile menu.

use std::fmt::Write as _;

pub const BRAND: &str = "VideoForge";

pub const NAV_ITEMS: [&str; 3] = ["Features", "Pricing", "Sign In"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hero {
    pub title: &'static str,
    pub accent: &'static str,
    pub tagline: &'static str,
    pub call_to_action: &'static str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Feature {
    pub title: &'static str,
    pub description: &'static str,
}

pub const HERO: Hero = Hero {
    title: "Professional Video Editing",
    accent: "Made Simple",
    tagline: "Edit your videos like a pro with our intuitive online video editor. \
              Cut, trim, add effects, and share your creations in minutes.",
    call_to_action: "Start Editing",
};

pub const FEATURES_HEADING: &str = "Powerful Feature";

pub const FEATURES: [Feature; 6] = [
    Feature {
        title: "Cut and Trim",
        description: "Precisely trim your videos and remove unwanted sections with \
                      frame-accurate controls.",
    },
    Feature {
        title: "Multiple Tracks",
        description: "Work with multiple video and audio tracks for complex compositions.",
    },
    Feature {
        title: "Audio Editing",
        description: "Add background music, adjust volume levels, and apply audio effects.",
    },
    Feature {
        title: "Easy Upload",
        description: "Upload your videos directly from your device or import from cloud storage.",
    },
    Feature {
        title: "Share Instantly",
        description: "Export and share your videos directly to social media platforms.",
    },
    Feature {
        title: "Auto-Save",
        description: "Never lose your progress with automatic project saving and version history.",
    },
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LandingView {
    pub menu_open: bool,
}

impl LandingView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle_menu(&mut self) {
        self.menu_open = !self.menu_open;
    }

    pub fn nav_items(&self) -> &'static [&'static str] {
        &NAV_ITEMS
    }

    /// Entries of the collapsed mobile menu; empty while it is closed.
    pub fn mobile_menu_items(&self) -> &'static [&'static str] {
        if self.menu_open { &NAV_ITEMS } else { &[] }
    }

    pub fn hero(&self) -> &'static Hero {
        &HERO
    }

    pub fn features(&self) -> &'static [Feature] {
        &FEATURES
    }

    /// Plain-text page, wrapped at `width` columns.
    pub fn render_text(&self, width: usize) -> String {
        let width = width.max(20);
        let mut out = String::new();
        let _ = writeln!(out, "{BRAND}  [{}]", self.nav_items().join(" | "));
        if self.menu_open {
            for item in self.mobile_menu_items() {
                let _ = writeln!(out, "  - {item}");
            }
        }
        out.push('\n');
        let _ = writeln!(out, "{}", HERO.title);
        let _ = writeln!(out, "{}", HERO.accent);
        for line in wrap(HERO.tagline, width) {
            let _ = writeln!(out, "{line}");
        }
        let _ = writeln!(out, "[ {} ]", HERO.call_to_action);
        out.push('\n');
        let _ = writeln!(out, "{FEATURES_HEADING}");
        for feature in &FEATURES {
            let _ = writeln!(out, "* {}", feature.title);
            for line in wrap(feature.description, width.saturating_sub(2)) {
                let _ = writeln!(out, "  {line}");
            }
        }
        out
    }
}

fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        if !line.is_empty() && line.len() + 1 + word.len() > width {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggling_twice_restores_visibility() {
        for start in [false, true] {
            let mut view = LandingView { menu_open: start };
            view.toggle_menu();
            assert_ne!(view.menu_open, start);
            view.toggle_menu();
            assert_eq!(view.menu_open, start);
        }
    }

    #[test]
    fn mobile_menu_follows_flag() {
        let mut view = LandingView::new();
        assert!(view.mobile_menu_items().is_empty());
        view.toggle_menu();
        assert_eq!(view.mobile_menu_items(), view.nav_items());
    }

    #[test]
    fn six_features_are_listed() {
        let view = LandingView::new();
        assert_eq!(view.features().len(), 6);
        assert_eq!(view.features()[0].title, "Cut and Trim");
        assert_eq!(view.hero().call_to_action, "Start Editing");
    }

    #[test]
    fn text_rendering_wraps_and_shows_menu_when_open() {
        let mut view = LandingView::new();
        let closed = view.render_text(40);
        assert!(closed.contains("Professional Video Editing"));
        assert!(!closed.contains("  - Pricing"));
        assert!(closed.lines().all(|l| l.len() <= 60));

        view.toggle_menu();
        assert!(view.render_text(40).contains("  - Pricing"));
    }

    #[test]
    fn wrap_never_splits_words() {
        let lines = wrap("alpha beta gamma delta", 11);
        assert_eq!(lines, ["alpha beta", "gamma delta"]);
    }
}
