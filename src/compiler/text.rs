//! Dialogue text effects: the decoration stack and `$define` substitutions.

/// The fixed set of decorations `$deco` can push. Each wraps dialogue
/// text in the matching Ren'Py text tag pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoration {
    Bold,
    Italic,
    Strikethrough,
    Underline,
}

impl Decoration {
    /// Accepts the short or the long token (`b` / `bold`, …).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "b" | "bold" => Some(Self::Bold),
            "i" | "italic" => Some(Self::Italic),
            "s" | "strikethrough" => Some(Self::Strikethrough),
            "u" | "underline" => Some(Self::Underline),
            _ => None,
        }
    }

    pub fn open(self) -> &'static str {
        match self {
            Self::Bold => "{b}",
            Self::Italic => "{i}",
            Self::Strikethrough => "{s}",
            Self::Underline => "{u}",
        }
    }

    pub fn close(self) -> &'static str {
        match self {
            Self::Bold => "{/b}",
            Self::Italic => "{/i}",
            Self::Strikethrough => "{/s}",
            Self::Underline => "{/u}",
        }
    }
}

/// Wrap `message` in every active decoration (the first pushed ends up
/// innermost), then run every substitution over the built string in
/// definition order, replacing all occurrences.
pub fn apply_effects(
    message: &str,
    decorations: &[Decoration],
    substitutions: &[(String, String)],
) -> String {
    let mut text = message.to_string();
    for deco in decorations {
        text = format!("{}{}{}", deco.open(), text, deco.close());
    }
    for (token, replacement) in substitutions {
        text = text.replace(token, replacement);
    }
    text
}
