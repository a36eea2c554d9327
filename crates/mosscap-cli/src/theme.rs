use ratatui::style::Color;

#[derive(Clone, Debug)]
pub struct Theme {
    pub name: &'static str,
    pub fg: Color,
    pub accent: Color,
    pub muted: Color,
    pub error: Color,
    pub user_color: Color,
    pub assistant_color: Color,
    pub notice_color: Color,
    pub border: Color,
}

impl Theme {
    /// Soft greens, the default.
    pub fn moss() -> Self {
        Self {
            name: "moss",
            fg: Color::Rgb(214, 222, 204),
            accent: Color::Rgb(143, 188, 107),
            muted: Color::Rgb(110, 122, 100),
            error: Color::Rgb(224, 108, 117),
            user_color: Color::Rgb(152, 195, 221),
            assistant_color: Color::Rgb(143, 188, 107),
            notice_color: Color::Rgb(214, 180, 110),
            border: Color::Rgb(70, 84, 62),
        }
    }

    pub fn dark() -> Self {
        Self {
            name: "dark",
            fg: Color::Rgb(220, 220, 220),
            accent: Color::Rgb(122, 162, 247),
            muted: Color::Rgb(100, 100, 100),
            error: Color::Rgb(247, 118, 142),
            user_color: Color::Cyan,
            assistant_color: Color::Green,
            notice_color: Color::Yellow,
            border: Color::Rgb(60, 60, 60),
        }
    }

    pub fn plain() -> Self {
        Self {
            name: "plain",
            fg: Color::Reset,
            accent: Color::Reset,
            muted: Color::DarkGray,
            error: Color::Red,
            user_color: Color::Reset,
            assistant_color: Color::Reset,
            notice_color: Color::Reset,
            border: Color::Reset,
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "moss" => Some(Self::moss()),
            "dark" => Some(Self::dark()),
            "plain" => Some(Self::plain()),
            _ => None,
        }
    }

    /// Like [`Theme::by_name`], falling back to the default theme.
    pub fn by_name_or_default(name: &str) -> Self {
        Self::by_name(name).unwrap_or_else(Self::moss)
    }

    pub fn all_names() -> &'static [&'static str] {
        &["moss", "dark", "plain"]
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::moss()
    }
}
