pub mod guess;

use std::fmt;

use chrono::NaiveDateTime;

/// Which candidate supplied the resolved date (for reporting).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSource {
    Origin,
    Filename,
    Digitized,
    Taken,
}

impl fmt::Display for DateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DateSource::Origin => "EXIF DateTimeOriginal",
            DateSource::Filename => "filename",
            DateSource::Digitized => "EXIF DateTimeDigitized",
            DateSource::Taken => "EXIF DateTime",
        };
        f.write_str(name)
    }
}

/// The up-to-four dates a single photo can offer. Any of them may be absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateCandidates {
    pub origin: Option<NaiveDateTime>,
    pub filename: Option<NaiveDateTime>,
    pub digitized: Option<NaiveDateTime>,
    pub taken: Option<NaiveDateTime>,
}

impl DateCandidates {
    /// Pick the date to write back, in fixed priority order:
    /// origin > filename > digitized > taken. Absence everywhere is a
    /// normal outcome, not an error.
    pub fn resolve(&self) -> Option<(NaiveDateTime, DateSource)> {
        if let Some(date) = self.origin {
            return Some((date, DateSource::Origin));
        }
        if let Some(date) = self.filename {
            return Some((date, DateSource::Filename));
        }
        if let Some(date) = self.digitized {
            return Some((date, DateSource::Digitized));
        }
        self.taken.map(|date| (date, DateSource::Taken))
    }
}
