use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use little_exif::exif_tag::ExifTag;
use little_exif::metadata::Metadata;

/// EXIF text-date convention: colon separators, second precision, no zone.
pub const EXIF_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Read/write access to the three EXIF date fields of one image.
///
/// A backend is the per-file image handle: opened at the start of a file's
/// processing and released when it goes out of scope. Reads reflect the
/// original file; `write_dates` operates on the copy at `dest`.
pub trait MetadataBackend {
    fn origin_date(&self) -> Option<NaiveDateTime>;
    fn taken_date(&self) -> Option<NaiveDateTime>;
    fn digitized_date(&self) -> Option<NaiveDateTime>;

    /// Write `date` into the EXIF of the copy at `dest`: DateTimeOriginal
    /// and DateTime unconditionally, DateTimeDigitized only if the original
    /// image carried one. Fails when `dest` has no EXIF block to extend.
    fn write_dates(&self, dest: &Path, date: NaiveDateTime) -> Result<()>;
}

/// Open the backend selected on the command line.
pub fn open_backend(kind: &str, path: &Path) -> Result<Box<dyn MetadataBackend>> {
    match kind {
        "exif-rs" => Ok(Box::new(ExifRsBackend::open(path)?)),
        "little-exif" => Ok(Box::new(LittleExifBackend::open(path)?)),
        other => bail!("unknown metadata backend {:?} (expected exif-rs or little-exif)", other),
    }
}

/// Default backend: reads via kamadak-exif, writes via little_exif.
pub struct ExifRsBackend {
    origin: Option<NaiveDateTime>,
    taken: Option<NaiveDateTime>,
    digitized: Option<NaiveDateTime>,
}

impl ExifRsBackend {
    pub fn open(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let mut buf = BufReader::new(file);
        // A container without EXIF reads as all-absent candidates; anything
        // actually corrupt surfaces later, at write time.
        let Ok(exif) = exif::Reader::new().read_from_container(&mut buf) else {
            return Ok(Self { origin: None, taken: None, digitized: None });
        };
        Ok(Self {
            origin: read_date_field(&exif, exif::Tag::DateTimeOriginal),
            taken: read_date_field(&exif, exif::Tag::DateTime),
            digitized: read_date_field(&exif, exif::Tag::DateTimeDigitized),
        })
    }
}

impl MetadataBackend for ExifRsBackend {
    fn origin_date(&self) -> Option<NaiveDateTime> {
        self.origin
    }

    fn taken_date(&self) -> Option<NaiveDateTime> {
        self.taken
    }

    fn digitized_date(&self) -> Option<NaiveDateTime> {
        self.digitized
    }

    fn write_dates(&self, dest: &Path, date: NaiveDateTime) -> Result<()> {
        write_exif_dates(dest, date, self.digitized.is_some())
    }
}

/// Alternate backend: reads and writes via little_exif.
pub struct LittleExifBackend {
    origin: Option<NaiveDateTime>,
    taken: Option<NaiveDateTime>,
    digitized: Option<NaiveDateTime>,
}

impl LittleExifBackend {
    pub fn open(path: &Path) -> Result<Self> {
        let Ok(meta) = Metadata::new_from_path(path) else {
            return Ok(Self { origin: None, taken: None, digitized: None });
        };
        Ok(Self {
            origin: tag_date(&meta, ExifTag::DateTimeOriginal(String::new())),
            taken: tag_date(&meta, ExifTag::ModifyDate(String::new())),
            digitized: tag_date(&meta, ExifTag::CreateDate(String::new())),
        })
    }
}

impl MetadataBackend for LittleExifBackend {
    fn origin_date(&self) -> Option<NaiveDateTime> {
        self.origin
    }

    fn taken_date(&self) -> Option<NaiveDateTime> {
        self.taken
    }

    fn digitized_date(&self) -> Option<NaiveDateTime> {
        self.digitized
    }

    fn write_dates(&self, dest: &Path, date: NaiveDateTime) -> Result<()> {
        write_exif_dates(dest, date, self.digitized.is_some())
    }
}

fn write_exif_dates(dest: &Path, date: NaiveDateTime, digitized_present: bool) -> Result<()> {
    // Tags can only be written into an existing EXIF block; a file with zero
    // metadata fields cannot have dates fabricated into it.
    let mut meta = Metadata::new_from_path(dest).with_context(|| {
        format!(
            "{}: no EXIF metadata to extend, cannot write dates",
            dest.display()
        )
    })?;
    if meta.get_ifds().is_empty() {
        bail!(
            "{}: EXIF metadata holds zero fields, cannot write dates",
            dest.display()
        );
    }

    // The codec appends the terminating NUL the EXIF ASCII type requires.
    let stamp = date.format(EXIF_DATE_FORMAT).to_string();
    meta.set_tag(ExifTag::DateTimeOriginal(stamp.clone()));
    meta.set_tag(ExifTag::ModifyDate(stamp.clone()));
    if digitized_present {
        meta.set_tag(ExifTag::CreateDate(stamp));
    }

    meta.write_to_file(dest)
        .with_context(|| format!("writing EXIF dates to {}", dest.display()))
}

fn read_date_field(exif: &exif::Exif, tag: exif::Tag) -> Option<NaiveDateTime> {
    let field = exif.get_field(tag, exif::In::PRIMARY)?;
    parse_exif_datetime(&field.display_value().to_string())
}

fn tag_date(meta: &Metadata, probe: ExifTag) -> Option<NaiveDateTime> {
    match meta.get_tag(&probe).next()? {
        ExifTag::DateTimeOriginal(raw)
        | ExifTag::ModifyDate(raw)
        | ExifTag::CreateDate(raw) => parse_exif_datetime(raw),
        _ => None,
    }
}

/// Parse an EXIF datetime string. Cameras are sloppy about separators, so
/// normalize them before parsing; a bare date falls back to midnight.
pub fn parse_exif_datetime(s: &str) -> Option<NaiveDateTime> {
    let cleaned = s
        .trim_matches(|c: char| c == '\0' || c.is_whitespace())
        .replace('-', ":")
        .replace('/', ":")
        .replace('\\', ":")
        .replace('.', ":");

    if let Ok(dt) = NaiveDateTime::parse_from_str(&cleaned, EXIF_DATE_FORMAT) {
        return Some(dt);
    }

    if let Ok(d) = chrono::NaiveDate::parse_from_str(cleaned.split(' ').next()?, "%Y:%m:%d") {
        return Some(d.and_hms_opt(0, 0, 0)?);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{jpeg_without_exif, jpeg_with_exif};
    use chrono::NaiveDate;

    fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn parses_standard_exif_datetime() {
        assert_eq!(
            parse_exif_datetime("2023:07:04 14:30:00"),
            Some(dt(2023, 7, 4, 14, 30, 0))
        );
    }

    #[test]
    fn parses_dashed_variant_and_trailing_nul() {
        // kamadak-exif displays the date portion with dashes
        assert_eq!(
            parse_exif_datetime("2023-07-04 14:30:00"),
            Some(dt(2023, 7, 4, 14, 30, 0))
        );
        assert_eq!(
            parse_exif_datetime("2023:07:04 14:30:00\0"),
            Some(dt(2023, 7, 4, 14, 30, 0))
        );
    }

    #[test]
    fn date_only_falls_back_to_midnight() {
        assert_eq!(
            parse_exif_datetime("2023:07:04"),
            Some(dt(2023, 7, 4, 0, 0, 0))
        );
    }

    #[test]
    fn garbage_is_none() {
        assert_eq!(parse_exif_datetime("not a date"), None);
        assert_eq!(parse_exif_datetime(""), None);
    }

    #[test]
    fn roundtrip_written_dates_reread_identically() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("photo.jpg");
        jpeg_with_exif(
            &src,
            vec![ExifTag::DateTimeOriginal("2001:01:01 00:00:00".to_string())],
        );

        let backend = ExifRsBackend::open(&src).unwrap();
        assert_eq!(backend.origin_date(), Some(dt(2001, 1, 1, 0, 0, 0)));

        let dest = dir.path().join("photo_edit.jpg");
        std::fs::copy(&src, &dest).unwrap();
        let date = dt(2023, 7, 4, 14, 30, 0);
        backend.write_dates(&dest, date).unwrap();

        let reread = ExifRsBackend::open(&dest).unwrap();
        assert_eq!(reread.origin_date(), Some(date));
        assert_eq!(reread.taken_date(), Some(date));
    }

    #[test]
    fn digitized_is_never_fabricated() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("photo.jpg");
        jpeg_with_exif(
            &src,
            vec![ExifTag::DateTimeOriginal("2001:01:01 00:00:00".to_string())],
        );

        let backend = ExifRsBackend::open(&src).unwrap();
        let dest = dir.path().join("photo_edit.jpg");
        std::fs::copy(&src, &dest).unwrap();
        backend.write_dates(&dest, dt(2023, 7, 4, 14, 30, 0)).unwrap();

        let reread = ExifRsBackend::open(&dest).unwrap();
        assert_eq!(reread.digitized_date(), None);
    }

    #[test]
    fn digitized_is_updated_when_already_present() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("photo.jpg");
        jpeg_with_exif(
            &src,
            vec![
                ExifTag::DateTimeOriginal("2001:01:01 00:00:00".to_string()),
                ExifTag::CreateDate("2002:02:02 00:00:00".to_string()),
            ],
        );

        let backend = ExifRsBackend::open(&src).unwrap();
        let dest = dir.path().join("photo_edit.jpg");
        std::fs::copy(&src, &dest).unwrap();
        let date = dt(2023, 7, 4, 14, 30, 0);
        backend.write_dates(&dest, date).unwrap();

        let reread = ExifRsBackend::open(&dest).unwrap();
        assert_eq!(reread.digitized_date(), Some(date));
    }

    #[test]
    fn writing_into_zero_metadata_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("bare.jpg");
        jpeg_without_exif(&src);

        let backend = ExifRsBackend::open(&src).unwrap();
        assert_eq!(backend.origin_date(), None);

        let dest = dir.path().join("bare_edit.jpg");
        std::fs::copy(&src, &dest).unwrap();
        assert!(backend.write_dates(&dest, dt(2023, 7, 4, 14, 30, 0)).is_err());
    }

    #[test]
    fn little_exif_backend_reads_the_same_dates() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("photo.jpg");
        jpeg_with_exif(
            &src,
            vec![
                ExifTag::DateTimeOriginal("2001:01:01 00:00:00".to_string()),
                ExifTag::ModifyDate("2002:02:02 00:00:00".to_string()),
            ],
        );

        let backend = LittleExifBackend::open(&src).unwrap();
        assert_eq!(backend.origin_date(), Some(dt(2001, 1, 1, 0, 0, 0)));
        assert_eq!(backend.taken_date(), Some(dt(2002, 2, 2, 0, 0, 0)));
        assert_eq!(backend.digitized_date(), None);
    }

    #[test]
    fn unknown_backend_kind_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("photo.jpg");
        jpeg_without_exif(&src);
        assert!(open_backend("exiftool", &src).is_err());
    }
}
