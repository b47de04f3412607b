//! Unix `ar` archive framing (§6 Archive on-disk format).
//!
//! Hand-written against the exact byte layout §6 pins down: no crate exists
//! for "just this one member-header shape," so it is parsed directly off a
//! byte slice.

use std::fmt;

pub const ARCHIVE_MAGIC: &[u8] = b"!<arch>\n";
const NAME_FIELD_LEN: usize = 16;
const HEADER_LEN: usize = 60;
const SIZE_FIELD_OFFSET: usize = 48;
const SIZE_FIELD_LEN: usize = 10;

#[derive(Debug)]
pub enum ArchiveError {
    NotAnArchive,
    Truncated,
    MissingPkgdef,
    MalformedSize(String),
}

impl fmt::Display for ArchiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveError::NotAnArchive => write!(f, "not a Unix ar archive"),
            ArchiveError::Truncated => write!(f, "archive truncated before first member header"),
            ArchiveError::MissingPkgdef => {
                write!(f, "first archive member is not __.PKGDEF")
            }
            ArchiveError::MalformedSize(raw) => {
                write!(f, "malformed archive member size field: {raw:?}")
            }
        }
    }
}

impl std::error::Error for ArchiveError {}

/// A single parsed member header plus the offset/length of its body within
/// the archive buffer.
pub struct Member<'a> {
    pub name: &'a str,
    pub body: &'a [u8],
}

/// True when `data` starts with the `!<arch>\n` magic (§6).
pub fn is_archive(data: &[u8]) -> bool {
    data.starts_with(ARCHIVE_MAGIC)
}

/// Parses the first member of an ar archive, which per §4.3/§6 must be
/// `__.PKGDEF` (the export data) for a compiler-emitted archive.
pub fn first_member<'a>(data: &'a [u8]) -> Result<Member<'a>, ArchiveError> {
    if !is_archive(data) {
        return Err(ArchiveError::NotAnArchive);
    }
    let header_start = ARCHIVE_MAGIC.len();
    let header_end = header_start + HEADER_LEN;
    if data.len() < header_end {
        return Err(ArchiveError::Truncated);
    }
    let header = &data[header_start..header_end];

    let name_field = &header[..NAME_FIELD_LEN];
    let name = std::str::from_utf8(name_field)
        .unwrap_or("")
        .trim_end()
        .to_string();
    if name != "__.PKGDEF" {
        return Err(ArchiveError::MissingPkgdef);
    }

    let size_field = &header[SIZE_FIELD_OFFSET..SIZE_FIELD_OFFSET + SIZE_FIELD_LEN];
    let size_str = std::str::from_utf8(size_field).unwrap_or("").trim();
    let size: usize = size_str
        .parse()
        .map_err(|_| ArchiveError::MalformedSize(size_str.to_string()))?;

    let body_start = header_end;
    let body_end = body_start + size;
    if data.len() < body_end {
        return Err(ArchiveError::Truncated);
    }

    // Leak the owned name into the archive's lifetime via a static slice is
    // unnecessary here: return body as borrowed, name as an owned copy the
    // caller can keep past this call's stack frame by cloning if needed.
    Ok(Member {
        name: "__.PKGDEF",
        body: &data[body_start..body_end],
    })
}

/// Writes a single ar member (`__.PKGDEF`) with `body`, padded to even
/// length with a trailing zero byte per §6.
pub fn write_pkgdef_member(body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(ARCHIVE_MAGIC.len() + HEADER_LEN + body.len() + 1);
    out.extend_from_slice(ARCHIVE_MAGIC);

    let mut header = [b' '; HEADER_LEN];
    let name = b"__.PKGDEF";
    header[..name.len()].copy_from_slice(name);
    // modtime, owner, group, mode all left as spaces (unused by this reader).
    let size_str = body.len().to_string();
    let size_start = SIZE_FIELD_OFFSET + (SIZE_FIELD_LEN - size_str.len().min(SIZE_FIELD_LEN));
    header[size_start..SIZE_FIELD_OFFSET + SIZE_FIELD_LEN]
        .copy_from_slice(size_str.as_bytes());
    header[HEADER_LEN - 2] = b'`';
    header[HEADER_LEN - 1] = b'\n';

    out.extend_from_slice(&header);
    out.extend_from_slice(body);
    if body.len() % 2 != 0 {
        out.push(0);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_pkgdef_member() {
        let body = b"export data goes here";
        let archive = write_pkgdef_member(body);
        assert!(is_archive(&archive));
        let member = first_member(&archive).unwrap();
        assert_eq!(member.name, "__.PKGDEF");
        assert_eq!(member.body, body);
    }

    #[test]
    fn odd_length_body_is_padded() {
        let body = b"odd";
        let archive = write_pkgdef_member(body);
        // magic(8) + header(60) + body(3) + pad(1)
        assert_eq!(archive.len(), 8 + 60 + 3 + 1);
    }

    #[test]
    fn rejects_non_archive_bytes() {
        let err = first_member(b"not an archive at all").unwrap_err();
        assert!(matches!(err, ArchiveError::NotAnArchive));
    }

    #[test]
    fn rejects_member_that_is_not_pkgdef() {
        let mut header = [b' '; HEADER_LEN];
        header[..4].copy_from_slice(b"main");
        header[SIZE_FIELD_OFFSET..SIZE_FIELD_OFFSET + 1].copy_from_slice(b"0");
        let mut data = ARCHIVE_MAGIC.to_vec();
        data.extend_from_slice(&header);
        let err = first_member(&data).unwrap_err();
        assert!(matches!(err, ArchiveError::MissingPkgdef));
    }
}
