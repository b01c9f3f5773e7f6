use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// A non-drop-frame timecode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timecode {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
    pub frames: u32,
}

impl Timecode {
    /// The timecode of an absolute frame count at `fps` frames per second. Hours wrap at 24.
    pub fn from_frame_count(total_frames: u64, fps: u32) -> Self {
        let fps = u64::from(fps.max(1));
        let total_seconds = total_frames / fps;

        Self {
            hours: ((total_seconds / 3600) % 24) as u32,
            minutes: ((total_seconds / 60) % 60) as u32,
            seconds: (total_seconds % 60) as u32,
            frames: (total_frames % fps) as u32,
        }
    }

    /// Parse `HH:MM:SS:FF` and check the frame count is below `fps`.
    pub fn parse_for_rate(text: &str, fps: u32) -> Result<Self, Error> {
        let tc: Timecode = text.parse()?;
        if tc.frames >= fps {
            return Err(Error::InvalidTimecode(format!("{text} (frame {} at {fps} fps)", tc.frames)));
        }
        Ok(tc)
    }

    /// The absolute frame count this timecode represents at `fps` frames per second.
    pub fn to_frame_count(&self, fps: u32) -> u64 {
        let seconds = u64::from(self.hours) * 3600 + u64::from(self.minutes) * 60 + u64::from(self.seconds);
        seconds * u64::from(fps) + u64::from(self.frames)
    }
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds, self.frames)
    }
}

impl FromStr for Timecode {
    type Err = Error;

    /// Parse `HH:MM:SS:FF`. The frame count is not checked against any frame rate, use
    /// [`Timecode::parse_for_rate`] for that.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidTimecode(s.to_string());

        let parts = s
            .split(':')
            .map(|part| part.trim().parse::<u32>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>, _>>()?;

        match parts.as_slice() {
            &[hours, minutes, seconds, frames] if hours < 24 && minutes < 60 && seconds < 60 => Ok(Self {
                hours,
                minutes,
                seconds,
                frames,
            }),
            _ => Err(invalid()),
        }
    }
}
