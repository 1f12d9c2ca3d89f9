pub const THEME_KEY: &str = "jungle-theme";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    pub fn toggle_label(self) -> String {
        let next = self.toggled().as_str();
        format!("Switch to {next} mode")
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::Light => "☀",
            Self::Dark => "☾",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettingsAction {
    ToggleTheme,
    ToggleMute,
}

/// Site-wide toggles shared by the header buttons, the audio element and the
/// themed layers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Settings {
    pub theme: Theme,
    pub muted: bool,
}

impl Settings {
    pub fn new(theme: Theme) -> Self {
        Self {
            theme,
            muted: false,
        }
    }

    pub fn apply(self, action: SettingsAction) -> Self {
        match action {
            SettingsAction::ToggleTheme => Self {
                theme: self.theme.toggled(),
                ..self
            },
            SettingsAction::ToggleMute => Self {
                muted: !self.muted,
                ..self
            },
        }
    }

    pub fn mute_label(&self) -> &'static str {
        if self.muted {
            "Unmute sounds"
        } else {
            "Mute sounds"
        }
    }

    pub fn mute_icon(&self) -> &'static str {
        if self.muted {
            "🔇"
        } else {
            "🔊"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_strings_round_trip() {
        for theme in [Theme::Light, Theme::Dark] {
            assert_eq!(Theme::from_str(theme.as_str()), Some(theme));
        }
        assert_eq!(Theme::from_str("sepia"), None);
        assert_eq!(Theme::Light.toggle_label(), "Switch to dark mode");
    }

    #[test]
    fn starts_unmuted() {
        let settings = Settings::new(Theme::Dark);
        assert!(!settings.muted);
        assert_eq!(settings.theme, Theme::Dark);
        assert_eq!(settings.mute_label(), "Mute sounds");
    }

    #[test]
    fn actions_touch_only_their_field() {
        let settings = Settings::new(Theme::Light);

        let themed = settings.apply(SettingsAction::ToggleTheme);
        assert_eq!(themed.theme, Theme::Dark);
        assert!(!themed.muted);

        let muted = themed.apply(SettingsAction::ToggleMute);
        assert_eq!(muted.theme, Theme::Dark);
        assert!(muted.muted);
        assert_eq!(muted.mute_label(), "Unmute sounds");

        assert_eq!(
            muted
                .apply(SettingsAction::ToggleMute)
                .apply(SettingsAction::ToggleTheme),
            settings
        );
    }
}
