use conf_hero_protocol::ThemeToken;

/// Resolved RGBA color for egui rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl ResolvedColor {
    const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_color32(self) -> egui::Color32 {
        egui::Color32::from_rgba_unmultiplied(self.r, self.g, self.b, self.a)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeMode {
    Dark,
    Light,
}

impl ThemeMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }

    pub fn visuals(self) -> egui::Visuals {
        match self {
            Self::Dark => egui::Visuals::dark(),
            Self::Light => egui::Visuals::light(),
        }
    }
}

pub fn resolve(token: ThemeToken, mode: ThemeMode) -> egui::Color32 {
    match mode {
        ThemeMode::Dark => resolve_dark(token),
        ThemeMode::Light => resolve_light(token),
    }
    .to_color32()
}

fn resolve_light(token: ThemeToken) -> ResolvedColor {
    // Tailwind teal/gray
    use ThemeToken::*;
    match token {
        Background => ResolvedColor::rgb(0xff, 0xff, 0xff),
        Surface => ResolvedColor::rgb(0xf9, 0xfa, 0xfb), // gray-50
        Border => ResolvedColor::rgb(0xe5, 0xe7, 0xeb),  // gray-200

        CopyBoxFill => ResolvedColor::rgba(0x14, 0xb8, 0xa5, 44), // teal-500 @ 17%
        CopyTitle => ResolvedColor::rgb(0x13, 0x4e, 0x4a),        // teal-900
        CopyBody => ResolvedColor::rgb(0x11, 0x18, 0x27),         // gray-900
        ButtonFill => ResolvedColor::rgb(0xff, 0xff, 0xff),
        ButtonText => ResolvedColor::rgb(0x13, 0x4e, 0x4a),

        ArrowFill => ResolvedColor::rgba(0, 0, 0, 51),
        ArrowIcon => ResolvedColor::rgb(0xff, 0xff, 0xff),
        DotActive => ResolvedColor::rgb(0x5e, 0xea, 0xd4), // teal-300
        DotInactive => ResolvedColor::rgba(0xcc, 0xfb, 0xf1, 102), // teal-100 @ 40%
        SlidePlaceholder => ResolvedColor::rgb(0xf0, 0xfd, 0xfa), // teal-50

        TickerBackground => ResolvedColor::rgb(0x11, 0x5e, 0x59), // teal-800
        TickerBorder => ResolvedColor::rgb(0x13, 0x4e, 0x4a),
        TickerText => ResolvedColor::rgb(0xf0, 0xfd, 0xfa),

        LinkBarBackground => ResolvedColor::rgb(0xf9, 0xfa, 0xfb),
        LinkBarText => ResolvedColor::rgb(0x4b, 0x55, 0x63), // gray-600
        LinkFill => ResolvedColor::rgb(0xff, 0xff, 0xff),
        LinkText => ResolvedColor::rgb(0x11, 0x5e, 0x59),
    }
}

fn resolve_dark(token: ThemeToken) -> ResolvedColor {
    use ThemeToken::*;
    match token {
        Background => ResolvedColor::rgb(0x04, 0x2f, 0x2e), // teal-950
        Surface => ResolvedColor::rgb(0x11, 0x18, 0x27),
        Border => ResolvedColor::rgb(0x37, 0x41, 0x51),

        CopyBoxFill => ResolvedColor::rgba(0x04, 0x2f, 0x2e, 170),
        CopyTitle => ResolvedColor::rgb(0x99, 0xf6, 0xe4), // teal-200
        CopyBody => ResolvedColor::rgb(0xe5, 0xe7, 0xeb),
        ButtonFill => ResolvedColor::rgb(0x0f, 0x76, 0x6e), // teal-700
        ButtonText => ResolvedColor::rgb(0xf0, 0xfd, 0xfa),

        ArrowFill => ResolvedColor::rgba(0, 0, 0, 90),
        ArrowIcon => ResolvedColor::rgb(0xff, 0xff, 0xff),
        DotActive => ResolvedColor::rgb(0x5e, 0xea, 0xd4),
        DotInactive => ResolvedColor::rgba(0xcc, 0xfb, 0xf1, 70),
        SlidePlaceholder => ResolvedColor::rgb(0x13, 0x4e, 0x4a),

        TickerBackground => ResolvedColor::rgb(0x13, 0x4e, 0x4a),
        TickerBorder => ResolvedColor::rgb(0x0f, 0x76, 0x6e),
        TickerText => ResolvedColor::rgb(0xcc, 0xfb, 0xf1),

        LinkBarBackground => ResolvedColor::rgb(0x11, 0x18, 0x27),
        LinkBarText => ResolvedColor::rgb(0x9c, 0xa3, 0xaf), // gray-400
        LinkFill => ResolvedColor::rgb(0x1f, 0x29, 0x37),
        LinkText => ResolvedColor::rgb(0x5e, 0xea, 0xd4),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_box_is_translucent_in_both_modes() {
        for mode in [ThemeMode::Light, ThemeMode::Dark] {
            assert!(resolve(ThemeToken::CopyBoxFill, mode).a() < 255);
        }
    }

    #[test]
    fn toggling_twice_is_identity() {
        assert_eq!(ThemeMode::Dark.toggled(), ThemeMode::Light);
        assert_eq!(ThemeMode::Light.toggled().toggled(), ThemeMode::Light);
    }
}
