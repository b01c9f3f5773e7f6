//! Raw TBC output: fields of little-endian 16-bit samples, one after another, with no header.

use byteorder::{LittleEndian, WriteBytesExt};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::field::{Field, Frame};

/// Writer for one stream of fields.
pub struct TbcWriter<W: Write> {
    writer: W,
    fields: u64,
}

impl TbcWriter<BufWriter<File>> {
    /// Create (or truncate) a TBC file.
    pub fn create(path: &Path) -> Result<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> TbcWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, fields: 0 }
    }

    pub fn write_field(&mut self, field: &Field) -> Result<()> {
        for &sample in field.samples() {
            self.writer.write_u16::<LittleEndian>(sample)?;
        }
        self.fields += 1;
        Ok(())
    }

    /// Write both fields of a frame, first field first.
    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        for field in frame.fields() {
            self.write_field(field)?;
        }
        Ok(())
    }

    pub fn fields_written(&self) -> u64 {
        self.fields
    }

    /// Flush and hand back the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// The composite output path for a base name.
pub fn composite_path(base: &Path) -> PathBuf {
    base.with_extension("tbc")
}

/// The luma and chroma output paths for a base name: `.tbcy` and `.tbcc`, or `.tbc` and
/// `_chroma.tbc` in the older naming.
pub fn yc_paths(base: &Path, legacy_names: bool) -> (PathBuf, PathBuf) {
    if legacy_names {
        let stem = base.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        (base.with_extension("tbc"), base.with_file_name(format!("{stem}_chroma.tbc")))
    }
    else {
        (base.with_extension("tbcy"), base.with_extension("tbcc"))
    }
}

/// Writer for a pair of luma and chroma streams.
pub struct YcTbcWriter<W: Write> {
    luma: TbcWriter<W>,
    chroma: TbcWriter<W>,
}

impl YcTbcWriter<BufWriter<File>> {
    pub fn create(base: &Path, legacy_names: bool) -> Result<Self> {
        let (luma, chroma) = yc_paths(base, legacy_names);
        Ok(Self::new(TbcWriter::create(&luma)?, TbcWriter::create(&chroma)?))
    }
}

impl<W: Write> YcTbcWriter<W> {
    pub fn new(luma: TbcWriter<W>, chroma: TbcWriter<W>) -> Self {
        Self { luma, chroma }
    }

    pub fn write_frame(&mut self, luma: &Frame, chroma: &Frame) -> Result<()> {
        self.luma.write_frame(luma)?;
        self.chroma.write_frame(chroma)
    }

    pub fn fields_written(&self) -> u64 {
        self.luma.fields_written()
    }

    /// Flush both streams and hand back `(luma, chroma)`.
    pub fn finish(self) -> Result<(W, W)> {
        Ok((self.luma.finish()?, self.chroma.finish()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(first: u16, second: u16) -> Frame {
        Frame::new(Field::new(3, 2, first), Field::new(3, 2, second))
    }

    #[test]
    fn fields_are_little_endian_and_in_order() {
        let mut writer = TbcWriter::new(Vec::new());
        writer.write_frame(&frame(0x0102, 0xA0B0)).unwrap();
        assert_eq!(writer.fields_written(), 2);

        let bytes = writer.finish().unwrap();
        assert_eq!(bytes.len(), 2 * 6 * 2);
        assert_eq!(&bytes[..4], &[0x02, 0x01, 0x02, 0x01]);
        assert_eq!(&bytes[12..14], &[0xB0, 0xA0]);
    }

    #[test]
    fn output_names() {
        let base = Path::new("out/disc");
        assert_eq!(composite_path(base), PathBuf::from("out/disc.tbc"));
        assert_eq!(yc_paths(base, false), (PathBuf::from("out/disc.tbcy"), PathBuf::from("out/disc.tbcc")));
        assert_eq!(yc_paths(base, true), (PathBuf::from("out/disc.tbc"), PathBuf::from("out/disc_chroma.tbc")));
    }

    #[test]
    fn yc_writer_creates_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("clip");

        let mut writer = YcTbcWriter::create(&base, false).unwrap();
        writer.write_frame(&frame(1, 2), &frame(3, 4)).unwrap();
        writer.write_frame(&frame(1, 2), &frame(3, 4)).unwrap();
        assert_eq!(writer.fields_written(), 4);
        writer.finish().unwrap();

        let luma = std::fs::read(dir.path().join("clip.tbcy")).unwrap();
        let chroma = std::fs::read(dir.path().join("clip.tbcc")).unwrap();
        assert_eq!(luma.len(), 4 * 6 * 2);
        assert_eq!(chroma.len(), luma.len());
        assert_eq!(&chroma[..2], &[3, 0]);
    }
}
