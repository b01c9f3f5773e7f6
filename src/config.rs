//! Project files.
//!
//! A project is a TOML document naming the output system and files, optional level and filter
//! settings, the source standard, and a list of sections. Each section is a still frame (an
//! image file, a raw YUV422 or RGB30 frame, a test card or a flat colour) held for a number of
//! frames, with optional LaserDisc numbering.
//!
//! ```toml
//! name = "bars"
//! description = "Colour bars with CAV picture numbers"
//!
//! [output]
//! system = "pal"
//! filename = "bars"
//!
//! [laserdisc]
//! standard = "iec60857-1986"
//!
//! [[sections]]
//! name = "lead in"
//! colour = [0, 0, 0]
//! duration = 50
//! area = "lead-in"
//!
//! [[sections]]
//! test-card = "colour-bars"
//! duration = 250
//! picture-start = 1
//!
//! [[sections]]
//! yuv422 = "slate.yuv"
//! duration = 100
//! picture-start = 251
//! ```

use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::line::EncoderOptions;
use crate::metadata::DEFAULT_DECODER;
use crate::params::{LevelOverrides, VideoParameters, VideoSystem};
use crate::source::TestCard;
use crate::standard::SourceVideoStandard;
use crate::timecode::Timecode;
use crate::vbi::{DiscArea, MAX_CHAPTER};

/// A whole project file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ProjectConfig {
    pub name: String,
    /// Stored as the capture notes of the metadata database.
    pub description: String,
    pub output: OutputConfig,
    pub levels: LevelOverrides,
    pub filter: FilterConfig,
    pub laserdisc: LaserdiscConfig,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct OutputConfig {
    pub system: VideoSystem,
    /// Output path without extension.
    pub filename: PathBuf,
    /// Write separate luma and chroma files instead of one composite file.
    pub yc: bool,
    /// Name Y/C files `.tbc` and `_chroma.tbc` instead of `.tbcy` and `.tbcc`.
    pub legacy_names: bool,
    /// VITC time of the first output frame, `HH:MM:SS:FF`.
    pub vitc_start: Option<String>,
    /// Write the `.db` metadata database next to the output.
    pub metadata: bool,
    /// Decoder name recorded in the metadata.
    pub decoder: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            system: VideoSystem::Pal,
            filename: PathBuf::from("output"),
            yc: false,
            legacy_names: false,
            vitc_start: None,
            metadata: true,
            decoder: DEFAULT_DECODER.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct FilterConfig {
    pub chroma: bool,
    pub luma: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            chroma: true,
            luma: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct LaserdiscConfig {
    pub standard: SourceVideoStandard,
}

/// One still source held for `duration` frames.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Section {
    pub name: Option<String>,
    /// Image file, relative to the project file.
    pub png: Option<PathBuf>,
    /// Raw Y'CbCr 4:2:2 frame, relative to the project file.
    pub yuv422: Option<PathBuf>,
    /// Raw 10-bit RGB frame, relative to the project file.
    pub rgb30: Option<PathBuf>,
    /// Generated test picture.
    pub test_card: Option<TestCard>,
    /// Flat RGB fill.
    pub colour: Option<[u8; 3]>,
    /// Length in frames.
    pub duration: u64,
    pub area: DiscArea,
    /// CAV picture number of the section's first frame.
    pub picture_start: Option<i64>,
    /// CLV chapter number.
    pub chapter: Option<i64>,
    /// CLV programme time of the section's first frame, `HH:MM:SS:FF`.
    pub timecode_start: Option<String>,
}

/// Where a section's frames come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionSource {
    Image(PathBuf),
    Yuv422(PathBuf),
    Rgb30(PathBuf),
    TestCard(TestCard),
    Colour([u8; 3]),
}

/// How a programme section numbers its frames in the VBI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Numbering {
    None,
    Cav { picture_start: i64 },
    ClvChapter(i64),
    ClvTimecode(Timecode),
}

impl Section {
    /// A readable name for log messages.
    pub fn label(&self, index: usize) -> String {
        self.name.clone().unwrap_or_else(|| format!("section {}", index + 1))
    }

    /// The section's source. Exactly one of `png`, `yuv422`, `rgb30`, `test-card` and `colour`
    /// must be set.
    pub fn source(&self) -> Result<SectionSource> {
        let mut sources = [
            self.png.clone().map(SectionSource::Image),
            self.yuv422.clone().map(SectionSource::Yuv422),
            self.rgb30.clone().map(SectionSource::Rgb30),
            self.test_card.map(SectionSource::TestCard),
            self.colour.map(SectionSource::Colour),
        ]
        .into_iter()
        .flatten();

        match (sources.next(), sources.next()) {
            (Some(source), None) => Ok(source),
            (Some(_), Some(_)) => Err(Error::config("a section takes only one of png, yuv422, rgb30, test-card or colour")),
            (None, _) => Err(Error::config("a section needs a png, yuv422, rgb30, test-card or colour")),
        }
    }

    fn source_paths_mut(&mut self) -> impl Iterator<Item = &mut PathBuf> {
        [&mut self.png, &mut self.yuv422, &mut self.rgb30].into_iter().flatten()
    }

    /// The section's numbering. A picture start wins over a chapter, which wins over a
    /// timecode.
    pub fn numbering(&self) -> Result<Numbering> {
        if let Some(picture_start) = self.picture_start {
            return Ok(Numbering::Cav { picture_start });
        }
        if let Some(chapter) = self.chapter {
            return Ok(Numbering::ClvChapter(chapter));
        }
        if let Some(timecode) = &self.timecode_start {
            return Ok(Numbering::ClvTimecode(timecode.parse()?));
        }
        Ok(Numbering::None)
    }
}

impl ProjectConfig {
    /// Parse a project from TOML text and check it.
    pub fn parse(text: &str) -> Result<Self> {
        let config: ProjectConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a project file. Relative image paths and the output path are resolved against the
    /// file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&text)?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        config.output.filename = base.join(&config.output.filename);
        for section in &mut config.sections {
            for path in section.source_paths_mut() {
                *path = base.join(&*path);
            }
        }
        Ok(config)
    }

    /// Check everything that can be checked without touching the sources.
    pub fn validate(&self) -> Result<()> {
        if self.sections.is_empty() {
            return Err(Error::config("the project has no sections"));
        }
        if self.output.filename.as_os_str().is_empty() {
            return Err(Error::config("the output filename is empty"));
        }

        let system = self.output.system;
        let standard = self.laserdisc.standard;
        match standard {
            SourceVideoStandard::Iec60857_1986 if system != VideoSystem::Pal => {
                return Err(Error::config(format!("{standard} is a PAL standard but the output is {system}")));
            }
            SourceVideoStandard::Iec60856_1986 if system != VideoSystem::Ntsc => {
                return Err(Error::config(format!("{standard} is an NTSC standard but the output is {system}")));
            }
            _ => {}
        }

        let fps = system.frame_rate();
        if let Some(start) = &self.output.vitc_start {
            Timecode::parse_for_rate(start, fps)?;
        }

        for (index, section) in self.sections.iter().enumerate() {
            let label = section.label(index);
            section.source()?;
            if section.duration == 0 {
                return Err(Error::config(format!("{label} has no duration")));
            }
            match section.numbering()? {
                Numbering::Cav { picture_start } if picture_start <= 0 => {
                    return Err(Error::out_of_range("picture number", picture_start));
                }
                Numbering::ClvChapter(chapter) if !(1..=MAX_CHAPTER).contains(&chapter) => {
                    return Err(Error::out_of_range("chapter", chapter));
                }
                Numbering::ClvTimecode(start) if start.frames >= fps => {
                    return Err(Error::InvalidTimecode(format!("{start} (frame {} at {fps} fps)", start.frames)));
                }
                Numbering::None => {}
                _ if !standard.supports_vbi(system) => {
                    warn!("{label} has LaserDisc numbering but {standard} carries no VBI data, it will be ignored");
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// The signal parameters with any level overrides applied.
    pub fn video_parameters(&self) -> VideoParameters {
        VideoParameters::for_system(self.output.system).with_levels(&self.levels)
    }

    /// Encoder options implied by the standard, filters and VITC start.
    pub fn encoder_options(&self) -> Result<EncoderOptions> {
        let standard = self.laserdisc.standard;
        let fps = self.output.system.frame_rate();
        let vitc_start_frame = match &self.output.vitc_start {
            Some(start) => Timecode::parse_for_rate(start, fps)?.to_frame_count(fps),
            None => 0,
        };

        Ok(EncoderOptions {
            vits: standard.supports_vits(),
            vitc: standard.supports_vitc(),
            vitc_start_frame,
            filter_chroma: self.filter.chroma,
            filter_luma: self.filter.luma,
        })
    }

    /// Total frames over all sections.
    pub fn total_frames(&self) -> u64 {
        self.sections.iter().map(|section| section.duration).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROJECT: &str = r#"
        name = "test"

        [output]
        system = "ntsc"
        filename = "out/test"
        yc = true

        [levels]
        white = 51000

        [filter]
        luma = true

        [laserdisc]
        standard = "iec60856-1986"

        [[sections]]
        colour = [0, 0, 0]
        duration = 30
        area = "lead-in"

        [[sections]]
        name = "bars"
        png = "bars.png"
        duration = 60
        picture-start = 1

        [[sections]]
        colour = [255, 255, 255]
        duration = 10
        timecode-start = "00:01:00:00"
    "#;

    #[test]
    fn parses_a_full_project() {
        let config = ProjectConfig::parse(PROJECT).unwrap();
        assert_eq!(config.name, "test");
        assert_eq!(config.output.system, VideoSystem::Ntsc);
        assert!(config.output.yc);
        assert!(!config.output.legacy_names);
        assert_eq!(config.levels.white, Some(51000));
        assert_eq!(config.filter, FilterConfig { chroma: true, luma: true });
        assert_eq!(config.sections.len(), 3);
        assert_eq!(config.sections[0].area, DiscArea::LeadIn);
        assert_eq!(config.sections[1].label(1), "bars");
        assert_eq!(config.sections[2].label(2), "section 3");
        assert_eq!(config.total_frames(), 100);
    }

    #[test]
    fn sections_resolve_sources_and_numbering() {
        let config = ProjectConfig::parse(PROJECT).unwrap();
        assert_eq!(config.sections[0].source().unwrap(), SectionSource::Colour([0, 0, 0]));
        assert_eq!(config.sections[0].numbering().unwrap(), Numbering::None);
        assert_eq!(config.sections[1].numbering().unwrap(), Numbering::Cav { picture_start: 1 });
        assert_eq!(
            config.sections[2].numbering().unwrap(),
            Numbering::ClvTimecode(Timecode {
                hours: 0,
                minutes: 1,
                seconds: 0,
                frames: 0,
            })
        );
    }

    #[test]
    fn derives_parameters_and_options() {
        let config = ProjectConfig::parse(PROJECT).unwrap();
        let params = config.video_parameters();
        assert_eq!(params.white_level, 51000);
        assert_eq!(params.black_level, 0x4680);

        let options = config.encoder_options().unwrap();
        assert!(options.vits);
        assert!(!options.vitc);
        assert!(options.filter_luma);
    }

    #[test]
    fn defaults_fill_missing_tables() {
        let config = ProjectConfig::parse("[[sections]]\ncolour = [1, 2, 3]\nduration = 1\n").unwrap();
        assert_eq!(config.output, OutputConfig::default());
        assert_eq!(config.filter, FilterConfig::default());
        assert_eq!(config.laserdisc.standard, SourceVideoStandard::None);
        assert_eq!(config.encoder_options().unwrap(), EncoderOptions::default());
    }

    #[test]
    fn vitc_start_sets_the_first_frame() {
        let text = "[output]\nvitc-start = \"00:00:02:05\"\n[laserdisc]\nstandard = \"consumer-tape\"\n[[sections]]\ncolour = [0, 0, 0]\nduration = 1\n";
        let options = ProjectConfig::parse(text).unwrap().encoder_options().unwrap();
        assert!(options.vitc);
        assert_eq!(options.vitc_start_frame, 55);
    }

    #[test]
    fn rejects_bad_projects() {
        assert!(matches!(ProjectConfig::parse(""), Err(Error::Config(_))));
        assert!(matches!(ProjectConfig::parse("[output]\nsystem = \"secam\"\n"), Err(Error::Toml(_))));
        assert!(matches!(ProjectConfig::parse("bogus = 1\n"), Err(Error::Toml(_))));

        let both = "[[sections]]\npng = \"a.png\"\ncolour = [0, 0, 0]\nduration = 1\n";
        assert!(matches!(ProjectConfig::parse(both), Err(Error::Config(_))));

        let empty = "[[sections]]\ncolour = [0, 0, 0]\n";
        assert!(matches!(ProjectConfig::parse(empty), Err(Error::Config(_))));

        let chapter = "[[sections]]\ncolour = [0, 0, 0]\nduration = 1\nchapter = 80\n";
        assert!(matches!(ProjectConfig::parse(chapter), Err(Error::OutOfRange { .. })));

        let mismatch = "[laserdisc]\nstandard = \"iec60857-1986\"\n[output]\nsystem = \"ntsc\"\n[[sections]]\ncolour = [0, 0, 0]\nduration = 1\n";
        assert!(matches!(ProjectConfig::parse(mismatch), Err(Error::Config(_))));

        let timecode = "[[sections]]\ncolour = [0, 0, 0]\nduration = 1\ntimecode-start = \"1:2\"\n";
        assert!(matches!(ProjectConfig::parse(timecode), Err(Error::InvalidTimecode(_))));

        let sources = "[[sections]]\ntest-card = \"colour-bars\"\nyuv422 = \"a.yuv\"\nduration = 1\n";
        assert!(matches!(ProjectConfig::parse(sources), Err(Error::Config(_))));
    }

    #[test]
    fn timecode_frames_must_fit_the_frame_rate() {
        let vitc = "[output]\nvitc-start = \"00:00:00:99\"\n[[sections]]\ncolour = [0, 0, 0]\nduration = 1\n";
        assert!(matches!(ProjectConfig::parse(vitc), Err(Error::InvalidTimecode(_))));

        // 25 frames is one too many for PAL but fine for NTSC.
        let clv = |system: &str| {
            format!("[output]\nsystem = \"{system}\"\n[[sections]]\ncolour = [0, 0, 0]\nduration = 1\ntimecode-start = \"00:00:00:25\"\n")
        };
        assert!(matches!(ProjectConfig::parse(&clv("pal")), Err(Error::InvalidTimecode(_))));
        assert!(ProjectConfig::parse(&clv("ntsc")).is_ok());
    }

    #[test]
    fn raw_and_generated_sources() {
        let text = "[[sections]]\nyuv422 = \"slate.yuv\"\nduration = 1\n[[sections]]\nrgb30 = \"card.rgb\"\nduration = 1\n[[sections]]\ntest-card = \"colour-bars\"\nduration = 1\n";
        let config = ProjectConfig::parse(text).unwrap();
        assert_eq!(config.sections[0].source().unwrap(), SectionSource::Yuv422(PathBuf::from("slate.yuv")));
        assert_eq!(config.sections[1].source().unwrap(), SectionSource::Rgb30(PathBuf::from("card.rgb")));
        assert_eq!(config.sections[2].source().unwrap(), SectionSource::TestCard(TestCard::ColourBars));
        assert!(config.output.metadata);
        assert_eq!(config.output.decoder, DEFAULT_DECODER);
    }

    #[test]
    fn load_resolves_paths_against_the_project() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.toml");
        std::fs::write(&path, PROJECT).unwrap();

        let config = ProjectConfig::load(&path).unwrap();
        assert_eq!(config.output.filename, dir.path().join("out/test"));
        assert_eq!(config.sections[1].png.as_deref(), Some(dir.path().join("bars.png").as_path()));

        let raw = "[[sections]]\nyuv422 = \"frames/slate.yuv\"\nduration = 1\n";
        std::fs::write(&path, raw).unwrap();
        let config = ProjectConfig::load(&path).unwrap();
        assert_eq!(config.sections[0].yuv422.as_deref(), Some(dir.path().join("frames/slate.yuv").as_path()));
    }
}
