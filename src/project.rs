//! Runs a project: resolves each frame's source and VBI data, encodes frames in parallel
//! batches, writes them out in order and records the capture in a metadata database.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::biphase::MAX_PICTURE_NUMBER;
use crate::config::{Numbering, ProjectConfig, Section, SectionSource};
use crate::encoder::Encoder;
use crate::error::Result;
use crate::field::Frame;
use crate::frame_buffer::FrameBuffer;
use crate::metadata::{metadata_path, CaptureMetadata, MetadataWriter};
use crate::source::{flat_colour, load_png, load_rgb30, load_yuv422, test_card};
use crate::tbc::{composite_path, yc_paths, TbcWriter, YcTbcWriter};
use crate::timecode::Timecode;
use crate::vbi::{DiscArea, VbiPayload};

/// What a run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeSummary {
    pub frames: u64,
    pub fields: u64,
    pub outputs: Vec<PathBuf>,
    /// The metadata database, unless it was turned off.
    pub metadata: Option<PathBuf>,
}

enum EncodedFrame {
    Composite(Frame),
    Yc { luma: Frame, chroma: Frame },
}

enum Output {
    Composite(TbcWriter<BufWriter<File>>),
    Yc(YcTbcWriter<BufWriter<File>>),
}

impl Output {
    fn write(&mut self, frame: &EncodedFrame) -> Result<()> {
        match (self, frame) {
            (Output::Composite(writer), EncodedFrame::Composite(frame)) => writer.write_frame(frame),
            (Output::Yc(writer), EncodedFrame::Yc { luma, chroma }) => writer.write_frame(luma, chroma),
            // The runner builds both from the same `yc` flag.
            _ => unreachable!("output kind does not match the encoded frame"),
        }
    }

    fn finish(self) -> Result<u64> {
        match self {
            Output::Composite(writer) => {
                let fields = writer.fields_written();
                writer.finish()?;
                Ok(fields)
            }
            Output::Yc(writer) => {
                let fields = writer.fields_written();
                writer.finish()?;
                Ok(fields)
            }
        }
    }
}

/// Encodes a loaded project.
pub struct ProjectRunner {
    config: ProjectConfig,
    encoder: Encoder,
    frame_limit: Option<u64>,
}

impl ProjectRunner {
    pub fn new(config: ProjectConfig) -> Result<Self> {
        config.validate()?;
        let encoder = Encoder::new(&config.video_parameters(), config.encoder_options()?);

        Ok(Self {
            config,
            encoder,
            frame_limit: None,
        })
    }

    /// Stop after `limit` frames in total.
    pub fn with_frame_limit(mut self, limit: Option<u64>) -> Self {
        self.frame_limit = limit;
        self
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// The files a run writes.
    pub fn output_paths(&self) -> Vec<PathBuf> {
        let base = &self.config.output.filename;
        if self.config.output.yc {
            let (luma, chroma) = yc_paths(base, self.config.output.legacy_names);
            vec![luma, chroma]
        }
        else {
            vec![composite_path(base)]
        }
    }

    /// The VBI words for frame `index` of a section, or `None` when the frame carries no
    /// LaserDisc data.
    pub fn frame_payload(&self, section: &Section, index: u64) -> Result<Option<VbiPayload>> {
        let system = self.config.output.system;
        if !self.config.laserdisc.standard.supports_vbi(system) {
            return Ok(None);
        }
        if section.area != DiscArea::Programme {
            return Ok(VbiPayload::for_area(section.area));
        }

        let payload = match section.numbering()? {
            Numbering::None => None,
            Numbering::Cav { picture_start } => {
                let index = i64::try_from(index).unwrap_or(i64::MAX);
                Some(VbiPayload::cav(picture_start.saturating_add(index))?)
            }
            Numbering::ClvChapter(chapter) => Some(VbiPayload::clv_chapter(chapter)?),
            Numbering::ClvTimecode(start) => {
                let fps = system.frame_rate();
                let tc = Timecode::from_frame_count(start.to_frame_count(fps) + index, fps);
                Some(VbiPayload::clv_timecode(&tc))
            }
        };
        Ok(payload)
    }

    fn load_source(&self, section: &Section) -> Result<FrameBuffer> {
        let params = self.encoder.params();
        match section.source()? {
            SectionSource::Image(path) => load_png(&path, params),
            SectionSource::Yuv422(path) => load_yuv422(&path, params),
            SectionSource::Rgb30(path) => load_rgb30(&path, params),
            SectionSource::TestCard(card) => test_card(card, params),
            SectionSource::Colour(rgb) => flat_colour(rgb, params),
        }
    }

    fn encode(&self, source: &FrameBuffer, frame_number: u64, vbi: Option<&VbiPayload>) -> Result<EncodedFrame> {
        if self.config.output.yc {
            let (luma, chroma) = self.encoder.encode_frame_yc(source, frame_number, vbi)?;
            Ok(EncodedFrame::Yc { luma, chroma })
        }
        else {
            Ok(EncodedFrame::Composite(self.encoder.encode_frame(source, frame_number, vbi)?))
        }
    }

    fn create_output(&self) -> Result<Output> {
        let base = &self.config.output.filename;
        if let Some(dir) = base.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }

        Ok(if self.config.output.yc {
            Output::Yc(YcTbcWriter::create(base, self.config.output.legacy_names)?)
        }
        else {
            Output::Composite(TbcWriter::create(&composite_path(base))?)
        })
    }

    fn write_metadata(&self, metadata: &CaptureMetadata, tbc: &std::path::Path) -> Result<PathBuf> {
        let path = metadata_path(tbc);
        MetadataWriter::create(&path)?.write(metadata)?;
        info!("Wrote metadata for {} fields to {}", metadata.field_count(), path.display());
        Ok(path)
    }

    /// Encode every section and write the output files.
    pub fn run(&self) -> Result<EncodeSummary> {
        let params = self.encoder.params();
        let total = self.config.total_frames();
        info!(
            "Encoding {} as {} ({}x{} per field, {} frames in {} sections)",
            if self.config.name.is_empty() { "project" } else { self.config.name.as_str() },
            params.system,
            params.field_width,
            params.field_height,
            self.frame_limit.map_or(total, |limit| limit.min(total)),
            self.config.sections.len()
        );

        let mut output = self.create_output()?;
        let mut metadata = CaptureMetadata::new(params, &self.config.output.decoder, &self.config.description);
        let batch_size = rayon::current_num_threads().max(1);
        let mut frame_number = 0u64;

        for (index, section) in self.config.sections.iter().enumerate() {
            let remaining = self.frame_limit.map_or(u64::MAX, |limit| limit.saturating_sub(frame_number));
            let frames = section.duration.min(remaining);
            if frames == 0 {
                break;
            }

            info!("{}: {} frames from frame {}", section.label(index), frames, frame_number);
            if let Numbering::Cav { picture_start } = section.numbering()? {
                let last = picture_start.saturating_add(i64::try_from(frames - 1).unwrap_or(i64::MAX));
                if last > i64::from(MAX_PICTURE_NUMBER) {
                    warn!("{}: picture numbers past {} are clamped", section.label(index), MAX_PICTURE_NUMBER);
                }
            }

            let source = self.load_source(section)?;
            let payloads = (0..frames)
                .map(|i| self.frame_payload(section, i))
                .collect::<Result<Vec<_>>>()?;

            let indices: Vec<u64> = (0..frames).collect();
            for batch in indices.chunks(batch_size) {
                let encoded = batch
                    .par_iter()
                    .map(|&i| self.encode(&source, frame_number + i, payloads[i as usize].as_ref()))
                    .collect::<Result<Vec<_>>>()?;

                for (&i, frame) in batch.iter().zip(&encoded) {
                    if let Some(payload) = &payloads[i as usize] {
                        debug!("frame {}: VBI {:X?}", frame_number + i, payload.words());
                    }
                    output.write(frame)?;
                    metadata.push_frame(payloads[i as usize].as_ref());
                }
            }

            frame_number += frames;
        }

        let fields = output.finish()?;
        let outputs = self.output_paths();
        info!("Wrote {} frames to {}", frame_number, outputs[0].display());

        let metadata = if self.config.output.metadata {
            Some(self.write_metadata(&metadata, &outputs[0])?)
        }
        else {
            None
        };

        Ok(EncodeSummary {
            frames: frame_number,
            fields,
            outputs,
            metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputConfig;
    use crate::params::VideoSystem;
    use crate::standard::SourceVideoStandard;

    fn project(system: VideoSystem, standard: SourceVideoStandard, sections: Vec<Section>) -> ProjectConfig {
        let mut config = ProjectConfig {
            output: OutputConfig {
                system,
                ..Default::default()
            },
            sections,
            ..Default::default()
        };
        config.laserdisc.standard = standard;
        config
    }

    fn colour_section(duration: u64) -> Section {
        Section {
            colour: Some([128, 64, 32]),
            duration,
            ..Default::default()
        }
    }

    #[test]
    fn cav_numbers_count_up_from_the_start() {
        let section = Section {
            picture_start: Some(10),
            ..colour_section(5)
        };
        let runner = ProjectRunner::new(project(VideoSystem::Pal, SourceVideoStandard::Iec60857_1986, vec![section.clone()])).unwrap();

        assert_eq!(runner.frame_payload(&section, 0).unwrap(), Some(VbiPayload::cav(10).unwrap()));
        assert_eq!(runner.frame_payload(&section, 4).unwrap(), Some(VbiPayload::cav(14).unwrap()));
    }

    #[test]
    fn huge_picture_starts_clamp_instead_of_overflowing() {
        let dir = tempfile::tempdir().unwrap();
        let section = Section {
            picture_start: Some(i64::MAX),
            ..colour_section(2)
        };
        let mut config = project(VideoSystem::Pal, SourceVideoStandard::Iec60857_1986, vec![section.clone()]);
        config.output.filename = dir.path().join("big");
        config.output.metadata = false;

        let runner = ProjectRunner::new(config).unwrap();
        let clamped = Some(VbiPayload::cav(i64::from(MAX_PICTURE_NUMBER)).unwrap());
        assert_eq!(runner.frame_payload(&section, 1).unwrap(), clamped);
        assert_eq!(runner.frame_payload(&section, u64::MAX).unwrap(), clamped);

        let summary = runner.run().unwrap();
        assert_eq!(summary.frames, 2);
        assert_eq!(summary.metadata, None);
    }

    #[test]
    fn disc_areas_override_numbering() {
        let section = Section {
            area: DiscArea::LeadOut,
            chapter: Some(3),
            ..colour_section(5)
        };
        let runner = ProjectRunner::new(project(VideoSystem::Ntsc, SourceVideoStandard::Iec60856_1986, vec![section.clone()])).unwrap();
        assert_eq!(runner.frame_payload(&section, 2).unwrap(), Some(VbiPayload::lead_out()));
    }

    #[test]
    fn clv_timecode_advances_per_frame() {
        let section = Section {
            timecode_start: Some("00:00:59:29".to_string()),
            ..colour_section(5)
        };
        let runner = ProjectRunner::new(project(VideoSystem::Ntsc, SourceVideoStandard::Iec60856_1986, vec![section.clone()])).unwrap();

        let tc = Timecode {
            hours: 0,
            minutes: 1,
            seconds: 0,
            frames: 0,
        };
        assert_eq!(runner.frame_payload(&section, 1).unwrap(), Some(VbiPayload::clv_timecode(&tc)));
    }

    #[test]
    fn no_vbi_without_a_laserdisc_standard() {
        let section = Section {
            picture_start: Some(1),
            ..colour_section(5)
        };
        let runner = ProjectRunner::new(project(VideoSystem::Pal, SourceVideoStandard::ConsumerTape, vec![section.clone()])).unwrap();
        assert_eq!(runner.frame_payload(&section, 0).unwrap(), None);
    }

    #[test]
    fn writes_composite_frames_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = project(VideoSystem::Pal, SourceVideoStandard::Iec60857_1986, vec![
            Section {
                picture_start: Some(1),
                ..colour_section(3)
            },
            colour_section(2),
        ]);
        config.output.filename = dir.path().join("nested/out");

        let runner = ProjectRunner::new(config).unwrap();
        let summary = runner.run().unwrap();
        assert_eq!(summary.frames, 5);
        assert_eq!(summary.fields, 10);
        assert_eq!(summary.outputs, vec![dir.path().join("nested/out.tbc")]);
        assert_eq!(summary.metadata, Some(dir.path().join("nested/out.tbc.db")));

        let bytes = std::fs::read(&summary.outputs[0]).unwrap();
        let field_bytes = 1135 * 313 * 2;
        assert_eq!(bytes.len(), 10 * field_bytes);

        // Field 2 (frame 1) as the encoder produces it directly.
        let params = runner.encoder.params().clone();
        let source = flat_colour([128, 64, 32], &params).unwrap();
        let payload = VbiPayload::cav(2).unwrap();
        let field = runner.encoder.encode_field(&source, 2, Some(&payload)).unwrap();
        let written: Vec<u16> = bytes[2 * field_bytes..3 * field_bytes]
            .chunks_exact(2)
            .map(|b| u16::from_le_bytes([b[0], b[1]]))
            .collect();
        assert_eq!(written, field.samples());
    }

    #[test]
    fn metadata_lists_every_written_field() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = project(VideoSystem::Pal, SourceVideoStandard::Iec60857_1986, vec![
            Section {
                picture_start: Some(7),
                ..colour_section(2)
            },
            Section {
                test_card: Some(crate::source::TestCard::ColourBars),
                colour: None,
                ..colour_section(1)
            },
        ]);
        config.output.filename = dir.path().join("disc");
        config.output.decoder = "unit".to_string();
        config.description = "two sections".to_string();

        let summary = ProjectRunner::new(config).unwrap().run().unwrap();
        let path = summary.metadata.unwrap();
        let conn = rusqlite::Connection::open(&path).unwrap();

        let (decoder, notes, system): (String, String, String) = conn
            .query_row("SELECT decoder, capture_notes, system FROM capture", [], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })
            .unwrap();
        assert_eq!((decoder.as_str(), notes.as_str(), system.as_str()), ("unit", "two sections", "PAL"));

        let fields: i64 = conn.query_row("SELECT COUNT(*) FROM field_record", [], |row| row.get(0)).unwrap();
        assert_eq!(fields, 6);
        // Only the CAV section carries VBI.
        let vbi: i64 = conn.query_row("SELECT COUNT(*) FROM vbi", [], |row| row.get(0)).unwrap();
        assert_eq!(vbi, 4);
    }

    #[test]
    fn frame_limit_and_yc_output() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = project(VideoSystem::Ntsc, SourceVideoStandard::None, vec![colour_section(4), colour_section(4)]);
        config.output.filename = dir.path().join("clip");
        config.output.yc = true;
        config.output.legacy_names = true;

        let summary = ProjectRunner::new(config).unwrap().with_frame_limit(Some(5)).run().unwrap();
        assert_eq!(summary.frames, 5);
        assert_eq!(summary.fields, 10);

        let luma = std::fs::metadata(dir.path().join("clip.tbc")).unwrap().len();
        let chroma = std::fs::metadata(dir.path().join("clip_chroma.tbc")).unwrap().len();
        assert_eq!(luma, 10 * 910 * 263 * 2);
        assert_eq!(chroma, luma);
    }
}
