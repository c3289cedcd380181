/// Requested video quality, mapped to a yt-dlp format selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quality {
    P1080,
    P720,
    P480,
    P360,
    #[default]
    Best,
}

impl Quality {
    /// Parse an inbound label. Anything unrecognised means `Best`.
    pub fn parse(label: &str) -> Self {
        match label.trim() {
            "1080p" => Self::P1080,
            "720p" => Self::P720,
            "480p" => Self::P480,
            "360p" => Self::P360,
            _ => Self::Best,
        }
    }

    pub fn max_height(&self) -> Option<u32> {
        match self {
            Self::P1080 => Some(1080),
            Self::P720 => Some(720),
            Self::P480 => Some(480),
            Self::P360 => Some(360),
            Self::Best => None,
        }
    }

    /// Value for `-f`.
    pub fn format_selector(&self) -> String {
        match self.max_height() {
            Some(height) => format!("best[height<={}]", height),
            None => "best".to_string(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::P1080 => "1080p",
            Self::P720 => "720p",
            Self::P480 => "480p",
            Self::P360 => "360p",
            Self::Best => "best",
        }
    }
}
