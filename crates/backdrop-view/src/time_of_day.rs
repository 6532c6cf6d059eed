use backdrop_core::QualifierStyle;

/// Coarse time-of-day label used to bias the photo query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeOfDay {
    Night,
    Morning,
    Noon,
    Evening,
    Day,
}

impl TimeOfDay {
    /// Classify a local hour. Hours past 23 wrap around.
    pub fn classify(hour: u32, style: QualifierStyle) -> Self {
        let hour = hour % 24;
        match style {
            QualifierStyle::FourPart => match hour {
                5..=10 => Self::Morning,
                11..=16 => Self::Noon,
                17..=20 => Self::Evening,
                _ => Self::Night,
            },
            QualifierStyle::DayNight => {
                if hour > 12 {
                    Self::Night
                } else {
                    Self::Day
                }
            }
        }
    }

    /// Query term for the photo service
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Night => "night",
            Self::Morning => "morning",
            Self::Noon => "noon",
            Self::Evening => "evening",
            Self::Day => "day",
        }
    }
}

impl std::fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
