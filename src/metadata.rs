//! Capture metadata in the SQLite layout ld-decode tools read next to a TBC file: one capture
//! row describing the signal, one record per field, and the VBI words of each field that
//! carries them.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use log::debug;
use rusqlite::{params, Connection};

use crate::burst::ColorBurst;
use crate::error::Result;
use crate::params::{VideoParameters, VideoSystem};
use crate::vbi::VbiPayload;

/// Decoder name recorded when the project doesn't set one.
pub const DEFAULT_DECODER: &str = "tbc-encoder";

const SCHEMA: &str = "
    DROP TABLE IF EXISTS vbi;
    DROP TABLE IF EXISTS field_record;
    DROP TABLE IF EXISTS capture;

    PRAGMA user_version = 1;

    CREATE TABLE capture (
        capture_id INTEGER PRIMARY KEY,
        system TEXT NOT NULL CHECK (system IN ('NTSC','PAL','PAL_M')),
        decoder TEXT NOT NULL,
        git_branch TEXT,
        git_commit TEXT,
        video_sample_rate REAL,
        active_video_start INTEGER,
        active_video_end INTEGER,
        field_width INTEGER,
        field_height INTEGER,
        number_of_sequential_fields INTEGER,
        colour_burst_start INTEGER,
        colour_burst_end INTEGER,
        is_mapped INTEGER CHECK (is_mapped IN (0,1)),
        is_subcarrier_locked INTEGER CHECK (is_subcarrier_locked IN (0,1)),
        is_widescreen INTEGER CHECK (is_widescreen IN (0,1)),
        white_16b_ire INTEGER,
        black_16b_ire INTEGER,
        blanking_16b_ire INTEGER,
        capture_notes TEXT
    );

    CREATE TABLE field_record (
        capture_id INTEGER NOT NULL REFERENCES capture(capture_id) ON DELETE CASCADE,
        field_id INTEGER NOT NULL,
        audio_samples INTEGER,
        decode_faults INTEGER,
        disk_loc REAL,
        efm_t_values INTEGER,
        field_phase_id INTEGER,
        file_loc INTEGER,
        is_first_field INTEGER CHECK (is_first_field IN (0,1)),
        median_burst_ire REAL,
        pad INTEGER CHECK (pad IN (0,1)),
        sync_conf INTEGER,
        ntsc_is_fm_code_data_valid INTEGER CHECK (ntsc_is_fm_code_data_valid IN (0,1)),
        ntsc_fm_code_data INTEGER,
        ntsc_field_flag INTEGER CHECK (ntsc_field_flag IN (0,1)),
        ntsc_is_video_id_data_valid INTEGER CHECK (ntsc_is_video_id_data_valid IN (0,1)),
        ntsc_video_id_data INTEGER,
        ntsc_white_flag INTEGER CHECK (ntsc_white_flag IN (0,1)),
        PRIMARY KEY (capture_id, field_id)
    );

    CREATE TABLE vbi (
        capture_id INTEGER NOT NULL REFERENCES capture(capture_id) ON DELETE CASCADE,
        field_id INTEGER NOT NULL,
        vbi0 INTEGER,
        vbi1 INTEGER,
        vbi2 INTEGER,
        PRIMARY KEY (capture_id, field_id)
    );
";

const CAPTURE_ID: i64 = 1;

/// The metadata file for a TBC file: its full name with `.db` appended.
pub fn metadata_path(tbc: &Path) -> PathBuf {
    let mut name = OsString::from(tbc.as_os_str());
    name.push(".db");
    PathBuf::from(name)
}

/// One row of the field table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRecord {
    pub field_id: u64,
    /// Position in the colour framing sequence.
    pub phase_id: u64,
    pub is_first_field: bool,
    /// Sample offset of the field in the TBC file.
    pub file_loc: u64,
}

impl FieldRecord {
    pub fn new(params: &VideoParameters, field_id: u64) -> Self {
        Self {
            field_id,
            phase_id: field_id % params.system.color_framing_fields(),
            is_first_field: field_id % 2 == 0,
            file_loc: field_id * params.field_len() as u64,
        }
    }
}

/// Everything written to the metadata database for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureMetadata {
    pub params: VideoParameters,
    pub decoder: String,
    pub notes: String,
    /// The VBI payload of every field written, in order.
    vbi: Vec<Option<VbiPayload>>,
}

impl CaptureMetadata {
    pub fn new(params: &VideoParameters, decoder: impl Into<String>, notes: impl Into<String>) -> Self {
        Self {
            params: params.clone(),
            decoder: decoder.into(),
            notes: notes.into(),
            vbi: Vec::new(),
        }
    }

    /// Record a frame: two fields carrying the same VBI payload.
    pub fn push_frame(&mut self, vbi: Option<&VbiPayload>) {
        self.vbi.push(vbi.copied());
        self.vbi.push(vbi.copied());
    }

    pub fn field_count(&self) -> u64 {
        self.vbi.len() as u64
    }

    pub fn fields(&self) -> impl Iterator<Item = FieldRecord> + '_ {
        (0..self.field_count()).map(|id| FieldRecord::new(&self.params, id))
    }

    /// The VBI words of a field, with missing lines as zero. `None` when the field has no VBI.
    pub fn vbi_words(&self, field_id: u64) -> Option<[u32; 3]> {
        let payload = self.vbi.get(field_id as usize).copied().flatten()?;
        Some(payload.words().map(|word| word.unwrap_or(0)))
    }
}

/// Writes [`CaptureMetadata`] to a fresh SQLite database.
pub struct MetadataWriter {
    conn: Connection,
}

impl MetadataWriter {
    /// Create the database at `path`, replacing any existing file.
    pub fn create(path: &Path) -> Result<Self> {
        match std::fs::remove_file(path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(e.into()),
            _ => {}
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Write the capture, its field records and the VBI table in one transaction.
    pub fn write(&mut self, metadata: &CaptureMetadata) -> Result<()> {
        let video = &metadata.params;
        let ntsc = video.system == VideoSystem::Ntsc;
        let burst_ire = 100.0 * ColorBurst::new(video).amplitude() / video.ire_span();

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO capture (capture_id, system, decoder, git_branch, git_commit, video_sample_rate,
                active_video_start, active_video_end, field_width, field_height, number_of_sequential_fields,
                colour_burst_start, colour_burst_end, is_mapped, is_subcarrier_locked, is_widescreen,
                white_16b_ire, black_16b_ire, blanking_16b_ire, capture_notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)",
            params![
                CAPTURE_ID,
                video.system.to_string(),
                metadata.decoder,
                "main",
                concat!("v", env!("CARGO_PKG_VERSION")),
                video.sample_rate,
                video.active_video_start as i64,
                video.active_video_end as i64,
                video.field_width as i64,
                video.field_height as i64,
                metadata.field_count() as i64,
                video.colour_burst_start as i64,
                video.colour_burst_end as i64,
                false,
                true,
                false,
                i64::from(video.white_level),
                i64::from(video.black_level),
                i64::from(video.blanking_level),
                metadata.notes,
            ],
        )?;

        {
            let mut insert_field = tx.prepare(
                "INSERT INTO field_record (capture_id, field_id, audio_samples, decode_faults, disk_loc,
                    efm_t_values, field_phase_id, file_loc, is_first_field, median_burst_ire, pad, sync_conf,
                    ntsc_is_fm_code_data_valid, ntsc_fm_code_data, ntsc_field_flag,
                    ntsc_is_video_id_data_valid, ntsc_video_id_data, ntsc_white_flag)
                 VALUES (?1, ?2, 0, 0, ?3, 0, ?4, ?5, ?6, ?7, 0, 100, ?8, ?9, ?10, ?8, ?9, ?8)",
            )?;
            let mut insert_vbi = tx.prepare("INSERT INTO vbi (capture_id, field_id, vbi0, vbi1, vbi2) VALUES (?1, ?2, ?3, ?4, ?5)")?;

            for field in metadata.fields() {
                let id = field.field_id as i64;
                insert_field.execute(params![
                    CAPTURE_ID,
                    id,
                    id as f64,
                    field.phase_id as i64,
                    field.file_loc as i64,
                    field.is_first_field,
                    burst_ire,
                    ntsc.then_some(false),
                    ntsc.then_some(0i64),
                    ntsc.then_some(field.is_first_field),
                ])?;

                if let Some([vbi0, vbi1, vbi2]) = metadata.vbi_words(field.field_id) {
                    insert_vbi.execute(params![CAPTURE_ID, id, i64::from(vbi0), i64::from(vbi1), i64::from(vbi2)])?;
                }
            }
        }

        tx.commit()?;
        debug!("Wrote metadata for {} fields", metadata.field_count());
        Ok(())
    }
}
