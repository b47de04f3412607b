//! Object-file and archive writer (§6 Object file header / Archive format,
//! `dumpobj` in spec terms — a pure serializer of finalized symbols).
//!
//! Writes always use the binary export variant (§9 Open Question 3): the
//! reader in `importer::mod` accepts both `$$\n` and `$$B\n`, but nothing in
//! this crate ever emits the legacy textual form.

use crate::export::{encode, ExportData, ExportFormat};
use crate::importer::archive::write_pkgdef_member;

/// Everything needed to write an object file header (§6: "Line 1: `go
/// object <GOOS> <GOARCH> <version> <experiments>`").
pub struct ObjectMeta {
    pub os: String,
    pub arch: String,
    pub version: String,
    pub experiments: String,
    pub safe: bool,
}

/// Serializes a complete object file body: header line(s), optional `safe`
/// marker, blank line, then the `$$B\n ... $$\n` export framing.
pub fn write_object(meta: &ObjectMeta, data: &ExportData) -> Result<Vec<u8>, crate::export::ExportCodecError> {
    let mut out = String::new();
    out.push_str(&format!(
        "go object {} {} {} {}\n",
        meta.os, meta.arch, meta.version, meta.experiments
    ));
    if meta.safe {
        out.push_str("safe\n");
    }
    out.push('\n');
    out.push_str("$$B\n");

    let mut bytes = out.into_bytes();
    bytes.extend_from_slice(&encode(data, ExportFormat::Binary)?);
    bytes.extend_from_slice(b"$$\n");
    Ok(bytes)
}

/// Wraps `write_object`'s output in a single-member Unix ar archive whose
/// first (only) member is `__.PKGDEF` (§6: "First member for
/// compiler-emitted archives is `__.PKGDEF`").
pub fn write_archive(
    meta: &ObjectMeta,
    data: &ExportData,
) -> Result<Vec<u8>, crate::export::ExportCodecError> {
    let object_bytes = write_object(meta, data)?;
    Ok(write_pkgdef_member(&object_bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::{self, archive};

    fn sample_meta() -> ObjectMeta {
        ObjectMeta {
            os: "linux".to_string(),
            arch: "amd64".to_string(),
            version: "go1.21".to_string(),
            experiments: "none".to_string(),
            safe: false,
        }
    }

    #[test]
    fn written_object_round_trips_through_the_import_reader() {
        let meta = sample_meta();
        let data = ExportData {
            import_path: "main".to_string(),
            ..Default::default()
        };
        let bytes = write_object(&meta, &data).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        let header = importer::parse_header(&text).unwrap().unwrap();
        assert_eq!(header.os, "linux");
        assert_eq!(header.arch, "amd64");

        let decoded = importer::read_body(&text).unwrap();
        assert_eq!(decoded.import_path, "main");
    }

    #[test]
    fn written_archive_wraps_a_single_pkgdef_member() {
        let meta = sample_meta();
        let data = ExportData::default();
        let archive_bytes = write_archive(&meta, &data).unwrap();
        assert!(archive::is_archive(&archive_bytes));
        let member = archive::first_member(&archive_bytes).unwrap();
        assert_eq!(member.name, "__.PKGDEF");
    }

    #[test]
    fn safe_flag_is_recorded_in_header() {
        let mut meta = sample_meta();
        meta.safe = true;
        let bytes = write_object(&meta, &ExportData::default()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let header = importer::parse_header(&text).unwrap().unwrap();
        assert!(header.safe);
    }
}
