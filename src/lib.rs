//! Codec for the cpio NEWC and CRC archive formats.
//!
//! [`CpioWriter`] serializes a sequence of [`CpioEntry`] records into an
//! archive byte stream, [`CpioReader`] lazily decodes one back. The codec
//! works on abstract entries and `std::io` streams only; walking a
//! filesystem, extracting to disk, and compression are a caller's job.

mod defs;

use defs::{BLOCK_LEN, CPIO_FIELD_LEN, CPIO_HEADER_LEN, CPIO_MAGIC_LEN};

use std::fmt;
use std::io::{ErrorKind, Read, Write};
use std::str::from_utf8;

use fallible_iterator::FallibleIterator;
use tracing::{debug, trace};

/// Error type for encoding and decoding cpio archives
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("unsupported magic {found:?} at offset {offset:#x}")]
    UnsupportedMagic { offset: u64, found: [u8; 6] },

    #[error("field '{field}' at offset {offset:#x} is not 8 hex digits")]
    InvalidHexField { offset: u64, field: &'static str },

    #[error("value {value:#x} of field '{field}' does not fit in 32 bits")]
    IntegerOverflow { field: &'static str, value: u64 },

    #[error("truncated {what} at offset {offset:#x}: wanted {wanted} bytes, got {got}")]
    TruncatedContent {
        offset: u64,
        what: &'static str,
        wanted: usize,
        got: usize,
    },

    #[error("entry name starting at offset {offset:#x} is not null-terminated")]
    NameSizeMismatch { offset: u64 },

    /// The offset is relative to the start of the archive when decoding and
    /// relative to the start of the path string when building an entry.
    #[error("invalid path encoding at offset {offset:#x}: {reason}")]
    InvalidPathEncoding { offset: u64, reason: String },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// The two supported cpio header formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpioFormat {
    Newc,
    Crc,
}

impl CpioFormat {
    pub(crate) fn magic(&self) -> &'static [u8] {
        match self {
            CpioFormat::Newc => defs::NEWC_MAGIC,
            CpioFormat::Crc => defs::CRC_MAGIC,
        }
    }

    pub(crate) fn from_magic(magic: &[u8]) -> Option<CpioFormat> {
        if magic == defs::NEWC_MAGIC {
            Some(CpioFormat::Newc)
        } else if magic == defs::CRC_MAGIC {
            Some(CpioFormat::Crc)
        } else {
            None
        }
    }
}

/// Convert the file permissions portion of a file mode to a representative string
fn mode_perm_to_str(mode: u32, shift: usize) -> String {
    let mode = (mode >> shift) & 0o7;
    let mut perm_string = String::new();

    if mode & defs::MODE_R != 0 {
        perm_string.push('r');
    } else {
        perm_string.push('-');
    }

    if mode & defs::MODE_W != 0 {
        perm_string.push('w');
    } else {
        perm_string.push('-');
    }

    if mode & defs::MODE_X != 0 {
        perm_string.push('x');
    } else {
        perm_string.push('-');
    }

    perm_string
}

/// Convert the octal representation of a file mode to a representative string
fn mode_to_str(mode: u32) -> String {
    let mut mode_str = String::new();

    match mode & defs::S_IFMT {
        defs::S_IFSOCK => mode_str.push('s'),
        defs::S_IFLNK  => mode_str.push('l'),
        defs::S_IFREG  => mode_str.push('-'),
        defs::S_IFBLK  => mode_str.push('b'),
        defs::S_IFDIR  => mode_str.push('d'),
        defs::S_IFCHR  => mode_str.push('c'),
        defs::S_IFIFO  => mode_str.push('p'),
        _ => mode_str.push('?'),
    }

    mode_str.push_str(&mode_perm_to_str(mode, 6));
    mode_str.push_str(&mode_perm_to_str(mode, 3));
    mode_str.push_str(&mode_perm_to_str(mode, 0));

    mode_str
}

/// Sum of the content bytes, wrapping modulo 2^32
///
/// This is the value the CRC format stores for regular files. Despite the
/// name it is an additive sum, not a cyclic redundancy check.
pub fn content_checksum(content: &[u8]) -> u32 {
    let mut res = 0u32;
    for b in content {
        res = res.wrapping_add(*b as u32);
    }
    res
}

/// Zero bytes needed to advance `offset` to the next four byte boundary
fn pad_len(offset: u64) -> usize {
    ((4 - (offset % 4)) % 4) as usize
}

fn checked_u32(field: &'static str, value: u64) -> Result<u32, Error> {
    if value > u64::from(u32::MAX) {
        return Err(Error::IntegerOverflow { field, value });
    }
    Ok(value as u32)
}

/// The checksum an entry stores on the wire: the content sum for regular
/// files in CRC archives, zero for everything else
fn structural_checksum(format: CpioFormat, mode: u32, content: &[u8]) -> u32 {
    match format {
        CpioFormat::Newc => 0,
        CpioFormat::Crc => {
            if mode & defs::S_IFMT == defs::S_IFREG {
                content_checksum(content)
            } else {
                0
            }
        }
    }
}

/// One archive record
///
/// Entries are immutable values: the encode path constructs them through
/// [`CpioEntryBuilder`], the decode path through [`CpioReader`]. For
/// symlinks the content holds the target path bytes, for directories it is
/// empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpioEntry {
    format: CpioFormat,
    ino: u32,
    mode: u32,
    uid: u32,
    gid: u32,
    nlink: u32,
    mtime: u32,
    devmajor: u32,
    devminor: u32,
    rdevmajor: u32,
    rdevminor: u32,
    checksum: u32,
    path: String,
    content: Vec<u8>,
}

impl CpioEntry {
    pub fn format(&self) -> CpioFormat {
        self.format
    }

    pub fn ino(&self) -> u32 {
        self.ino
    }

    pub fn mode(&self) -> u32 {
        self.mode
    }

    pub fn uid(&self) -> u32 {
        self.uid
    }

    pub fn gid(&self) -> u32 {
        self.gid
    }

    pub fn nlink(&self) -> u32 {
        self.nlink
    }

    pub fn mtime(&self) -> u32 {
        self.mtime
    }

    pub fn devmajor(&self) -> u32 {
        self.devmajor
    }

    pub fn devminor(&self) -> u32 {
        self.devminor
    }

    pub fn rdevmajor(&self) -> u32 {
        self.rdevmajor
    }

    pub fn rdevminor(&self) -> u32 {
        self.rdevminor
    }

    /// Stored checksum, kept verbatim when decoded from an archive
    pub fn checksum(&self) -> u32 {
        self.checksum
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Number of content bytes
    pub fn filesize(&self) -> u32 {
        self.content.len() as u32
    }

    /// Length of the path plus its terminating null
    pub fn namesize(&self) -> u32 {
        self.path.len() as u32 + 1
    }

    pub fn is_link(&self) -> bool {
        self.mode & defs::S_IFMT == defs::S_IFLNK
    }

    pub fn is_dir(&self) -> bool {
        self.mode & defs::S_IFMT == defs::S_IFDIR
    }

    pub fn is_reg(&self) -> bool {
        self.mode & defs::S_IFMT == defs::S_IFREG
    }

    pub fn is_sock(&self) -> bool {
        self.mode & defs::S_IFMT == defs::S_IFSOCK
    }

    pub fn is_fifo(&self) -> bool {
        self.mode & defs::S_IFMT == defs::S_IFIFO
    }

    pub fn is_blk(&self) -> bool {
        self.mode & defs::S_IFMT == defs::S_IFBLK
    }

    pub fn is_chr(&self) -> bool {
        self.mode & defs::S_IFMT == defs::S_IFCHR
    }

    /// Compare the stored checksum against one recomputed from the content
    ///
    /// The reader never verifies checksums itself so corrupt archives stay
    /// readable; a caller that cares about integrity checks here.
    pub fn verify_checksum(&self) -> bool {
        self.checksum == structural_checksum(self.format, self.mode, &self.content)
    }
}

impl fmt::Display for CpioEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:>2} {:>4} {:>4} {:>8} {}",
            mode_to_str(self.mode),
            self.nlink,
            self.uid,
            self.gid,
            self.filesize(),
            self.path,
        )?;

        if self.is_link() {
            write!(f, " -> {}", String::from_utf8_lossy(&self.content))?;
        }

        Ok(())
    }
}

/// Builder for archive entries on the encode path
///
/// Numeric fields default to zero. `build` validates the entry and computes
/// its checksum; a caller-supplied checksum never enters the archive.
pub struct CpioEntryBuilder {
    format: CpioFormat,
    path: String,
    ino: u32,
    mode: u32,
    uid: u32,
    gid: u32,
    nlink: u32,
    mtime: u32,
    devmajor: u32,
    devminor: u32,
    rdevmajor: u32,
    rdevminor: u32,
    content: Vec<u8>,
}

impl CpioEntryBuilder {
    pub fn new(format: CpioFormat, path: &str) -> Self {
        CpioEntryBuilder {
            format,
            path: path.to_string(),
            ino: 0,
            mode: 0,
            uid: 0,
            gid: 0,
            nlink: 0,
            mtime: 0,
            devmajor: 0,
            devminor: 0,
            rdevmajor: 0,
            rdevminor: 0,
            content: vec![],
        }
    }

    pub fn ino(mut self, ino: u32) -> Self {
        self.ino = ino;
        self
    }

    pub fn mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }

    pub fn uid(mut self, uid: u32) -> Self {
        self.uid = uid;
        self
    }

    pub fn gid(mut self, gid: u32) -> Self {
        self.gid = gid;
        self
    }

    pub fn nlink(mut self, nlink: u32) -> Self {
        self.nlink = nlink;
        self
    }

    pub fn mtime(mut self, mtime: u32) -> Self {
        self.mtime = mtime;
        self
    }

    pub fn devmajor(mut self, devmajor: u32) -> Self {
        self.devmajor = devmajor;
        self
    }

    pub fn devminor(mut self, devminor: u32) -> Self {
        self.devminor = devminor;
        self
    }

    pub fn rdevmajor(mut self, rdevmajor: u32) -> Self {
        self.rdevmajor = rdevmajor;
        self
    }

    pub fn rdevminor(mut self, rdevminor: u32) -> Self {
        self.rdevminor = rdevminor;
        self
    }

    /// File bytes for a regular file, target path bytes for a symlink
    pub fn content(mut self, content: Vec<u8>) -> Self {
        self.content = content;
        self
    }

    pub fn build(self) -> Result<CpioEntry, Error> {
        if let Some(idx) = self.path.bytes().position(|b| b == 0) {
            return Err(Error::InvalidPathEncoding {
                offset: idx as u64,
                reason: String::from("path contains an embedded null byte"),
            });
        }

        checked_u32("namesize", self.path.len() as u64 + 1)?;
        checked_u32("filesize", self.content.len() as u64)?;

        let checksum = structural_checksum(self.format, self.mode, &self.content);

        Ok(CpioEntry {
            format: self.format,
            ino: self.ino,
            mode: self.mode,
            uid: self.uid,
            gid: self.gid,
            nlink: self.nlink,
            mtime: self.mtime,
            devmajor: self.devmajor,
            devminor: self.devminor,
            rdevmajor: self.rdevmajor,
            rdevminor: self.rdevminor,
            checksum,
            path: self.path,
            content: self.content,
        })
    }
}

/// Fixed-width header fields of one entry, in wire order
#[derive(Debug)]
struct RawHeader {
    format: CpioFormat,
    ino: u32,
    mode: u32,
    uid: u32,
    gid: u32,
    nlink: u32,
    mtime: u32,
    filesize: u32,
    devmajor: u32,
    devminor: u32,
    rdevmajor: u32,
    rdevminor: u32,
    namesize: u32,
    check: u32,
}

/// Decode the 8 hex digit field at `index` within a raw entry header that
/// starts at absolute offset `base`
fn hex_field(raw: &[u8], index: usize, field: &'static str, base: u64) -> Result<u32, Error> {
    let start = CPIO_MAGIC_LEN + index * CPIO_FIELD_LEN;
    let bytes = &raw[start..start + CPIO_FIELD_LEN];
    let offset = base + start as u64;

    // from_str_radix alone would also accept a leading sign
    if !bytes.iter().all(|b| b.is_ascii_hexdigit()) {
        return Err(Error::InvalidHexField { offset, field });
    }

    let text = from_utf8(bytes).map_err(|_| Error::InvalidHexField { offset, field })?;
    u32::from_str_radix(text, 16).map_err(|_| Error::InvalidHexField { offset, field })
}

impl RawHeader {
    fn from_entry(entry: &CpioEntry) -> Result<RawHeader, Error> {
        Ok(RawHeader {
            format: entry.format,
            ino: entry.ino,
            mode: entry.mode,
            uid: entry.uid,
            gid: entry.gid,
            nlink: entry.nlink,
            mtime: entry.mtime,
            filesize: checked_u32("filesize", entry.content.len() as u64)?,
            devmajor: entry.devmajor,
            devminor: entry.devminor,
            rdevmajor: entry.rdevmajor,
            rdevminor: entry.rdevminor,
            namesize: checked_u32("namesize", entry.path.len() as u64 + 1)?,
            check: structural_checksum(entry.format, entry.mode, &entry.content),
        })
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.format.magic().to_vec();

        let mut fields = String::new();
        fields.push_str(&format!("{:08x}", self.ino));
        fields.push_str(&format!("{:08x}", self.mode));
        fields.push_str(&format!("{:08x}", self.uid));
        fields.push_str(&format!("{:08x}", self.gid));
        fields.push_str(&format!("{:08x}", self.nlink));
        fields.push_str(&format!("{:08x}", self.mtime));
        fields.push_str(&format!("{:08x}", self.filesize));
        fields.push_str(&format!("{:08x}", self.devmajor));
        fields.push_str(&format!("{:08x}", self.devminor));
        fields.push_str(&format!("{:08x}", self.rdevmajor));
        fields.push_str(&format!("{:08x}", self.rdevminor));
        fields.push_str(&format!("{:08x}", self.namesize));
        fields.push_str(&format!("{:08x}", self.check));

        out.extend_from_slice(fields.as_bytes());
        out
    }

    /// Parse the 110 header bytes of an entry starting at absolute offset `base`
    fn parse(raw: &[u8], base: u64) -> Result<RawHeader, Error> {
        let mut found = [0u8; CPIO_MAGIC_LEN];
        found.copy_from_slice(&raw[..CPIO_MAGIC_LEN]);

        let format = CpioFormat::from_magic(&found)
            .ok_or(Error::UnsupportedMagic { offset: base, found })?;

        Ok(RawHeader {
            format,
            ino: hex_field(raw, 0, "ino", base)?,
            mode: hex_field(raw, 1, "mode", base)?,
            uid: hex_field(raw, 2, "uid", base)?,
            gid: hex_field(raw, 3, "gid", base)?,
            nlink: hex_field(raw, 4, "nlink", base)?,
            mtime: hex_field(raw, 5, "mtime", base)?,
            filesize: hex_field(raw, 6, "filesize", base)?,
            devmajor: hex_field(raw, 7, "devmajor", base)?,
            devminor: hex_field(raw, 8, "devminor", base)?,
            rdevmajor: hex_field(raw, 9, "rdevmajor", base)?,
            rdevminor: hex_field(raw, 10, "rdevminor", base)?,
            namesize: hex_field(raw, 11, "namesize", base)?,
            check: hex_field(raw, 12, "check", base)?,
        })
    }
}

/// Validate decoded path bytes, already stripped of the terminating null
fn parse_path(name: Vec<u8>, offset: u64) -> Result<String, Error> {
    if name.contains(&0) {
        return Err(Error::InvalidPathEncoding {
            offset,
            reason: String::from("path contains an embedded null byte"),
        });
    }

    String::from_utf8(name).map_err(|e| Error::InvalidPathEncoding {
        offset,
        reason: e.to_string(),
    })
}

/// Lazily decodes entries from a cpio archive
///
/// A single forward pass over the source, ending once the trailer entry is
/// seen; everything past the trailer is consumed and discarded. Decoding a
/// stream twice takes a fresh reader over a fresh source.
pub struct CpioReader<R: Read> {
    source: R,
    offset: u64,
    trailer_seen: bool,
}

impl<R: Read> CpioReader<R> {
    pub fn new(source: R) -> Self {
        CpioReader {
            source,
            offset: 0,
            trailer_seen: false,
        }
    }

    /// Absolute offset of the next unread byte
    pub fn offset(&self) -> u64 {
        self.offset
    }

    fn fill(&mut self, buf: &mut [u8], what: &'static str) -> Result<(), Error> {
        let start = self.offset;
        let mut got = 0;

        while got < buf.len() {
            match self.source.read(&mut buf[got..]) {
                Ok(0) => {
                    return Err(Error::TruncatedContent {
                        offset: start,
                        what,
                        wanted: buf.len(),
                        got,
                    })
                }
                Ok(n) => {
                    got += n;
                    self.offset += n as u64;
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::IoError(e)),
            }
        }

        Ok(())
    }

    /// Consume alignment padding without validating its contents
    fn skip_padding(&mut self) -> Result<(), Error> {
        let pad = pad_len(self.offset);
        if pad > 0 {
            let mut scratch = [0u8; 3];
            self.fill(&mut scratch[..pad], "alignment padding")?;
        }
        Ok(())
    }

    /// Discard whatever follows the trailer, including the block padding
    fn drain(&mut self) -> Result<(), Error> {
        let mut scratch = [0u8; 512];
        loop {
            match self.source.read(&mut scratch) {
                Ok(0) => return Ok(()),
                Ok(n) => self.offset += n as u64,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::IoError(e)),
            }
        }
    }
}

impl<R: Read> FallibleIterator for CpioReader<R> {
    type Item = CpioEntry;
    type Error = Error;

    fn next(&mut self) -> Result<Option<Self::Item>, Self::Error> {
        if self.trailer_seen {
            return Ok(None);
        }

        let header_offset = self.offset;
        let mut raw = [0u8; CPIO_HEADER_LEN];
        self.fill(&mut raw, "entry header")?;
        let header = RawHeader::parse(&raw, header_offset)?;

        let name_offset = self.offset;
        if header.namesize == 0 {
            return Err(Error::NameSizeMismatch { offset: name_offset });
        }

        let mut name = vec![0u8; header.namesize as usize];
        self.fill(&mut name, "entry name")?;

        match name.pop() {
            Some(0) => {}
            _ => return Err(Error::NameSizeMismatch { offset: name_offset }),
        }
        let path = parse_path(name, name_offset)?;

        if path == defs::TRAILER_NAME && header.filesize == 0 {
            trace!("trailer at offset {:#x}", header_offset);
            self.trailer_seen = true;
            self.drain()?;
            return Ok(None);
        }

        self.skip_padding()?;

        let mut content = vec![0u8; header.filesize as usize];
        self.fill(&mut content, "file content")?;
        self.skip_padding()?;

        trace!("read entry {} at offset {:#x}", path, header_offset);

        Ok(Some(CpioEntry {
            format: header.format,
            ino: header.ino,
            mode: header.mode,
            uid: header.uid,
            gid: header.gid,
            nlink: header.nlink,
            mtime: header.mtime,
            devmajor: header.devmajor,
            devminor: header.devminor,
            rdevmajor: header.rdevmajor,
            rdevminor: header.rdevminor,
            checksum: header.check,
            path,
            content,
        }))
    }
}

/// Streams entries into a cpio archive
///
/// The writer tracks the absolute output offset so alignment padding is
/// computed against the start of the archive, not per entry. The format
/// given at construction stamps the trailer's magic.
pub struct CpioWriter<W: Write> {
    sink: W,
    format: CpioFormat,
    written: u64,
}

impl<W: Write> CpioWriter<W> {
    pub fn new(sink: W, format: CpioFormat) -> Self {
        CpioWriter {
            sink,
            format,
            written: 0,
        }
    }

    /// Total bytes written to the sink so far
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Append one entry to the archive
    ///
    /// The entry block is assembled in memory first, so on error nothing has
    /// been written to the sink for this entry.
    pub fn write_entry(&mut self, entry: &CpioEntry) -> Result<(), Error> {
        let header = RawHeader::from_entry(entry)?;

        let mut entry_data = header.to_bytes();

        // null-terminated path
        entry_data.extend_from_slice(entry.path.as_bytes());
        entry_data.push(0);

        // pad to four byte alignment before the start of the content
        let pad = pad_len(self.written + entry_data.len() as u64);
        entry_data.resize(entry_data.len() + pad, 0);

        entry_data.extend_from_slice(&entry.content);

        // pad to four byte alignment at the end of the content
        let pad = pad_len(self.written + entry_data.len() as u64);
        entry_data.resize(entry_data.len() + pad, 0);

        self.sink.write_all(&entry_data)?;
        self.written += entry_data.len() as u64;

        trace!(
            "wrote entry {} ({} content bytes)",
            entry.path,
            entry.content.len()
        );

        Ok(())
    }

    /// Write the trailer entry and pad the archive to a 0x200 byte boundary
    ///
    /// Consumes the writer so no entry can follow the trailer. Returns the
    /// total number of bytes the archive occupies.
    pub fn finish(mut self) -> Result<u64, Error> {
        let mut trailer = self.format.magic().to_vec();
        trailer.extend_from_slice(defs::TRAILER);

        let pad = pad_len(self.written + trailer.len() as u64);
        trailer.resize(trailer.len() + pad, 0);

        self.sink.write_all(&trailer)?;
        self.written += trailer.len() as u64;

        // pad the archive out to the next full block
        let block_pad = (BLOCK_LEN - self.written % BLOCK_LEN) % BLOCK_LEN;
        if block_pad != 0 {
            self.sink.write_all(&vec![0u8; block_pad as usize])?;
            self.written += block_pad;
        }

        self.sink.flush()?;
        debug!("finished archive, {} bytes total", self.written);

        Ok(self.written)
    }
}

/// Encode `entries` as a cpio archive written to `sink`
///
/// Returns the total number of bytes written, including the trailer and the
/// final block padding.
pub fn encode<W, I>(format: CpioFormat, entries: I, sink: W) -> Result<u64, Error>
where
    W: Write,
    I: IntoIterator<Item = CpioEntry>,
{
    let mut writer = CpioWriter::new(sink, format);
    for entry in entries {
        writer.write_entry(&entry)?;
    }
    writer.finish()
}

/// Decode a cpio archive from `source`
///
/// Returns a lazy iterator over the entries; the trailer terminates it.
pub fn decode<R: Read>(source: R) -> CpioReader<R> {
    CpioReader::new(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_header(magic: &[u8], fields: [&str; 13]) -> Vec<u8> {
        let mut raw = magic.to_vec();
        for field in fields {
            raw.extend_from_slice(field.as_bytes());
        }
        assert_eq!(raw.len(), CPIO_HEADER_LEN);
        raw
    }

    #[test]
    fn pad_len_cycles_every_four_bytes() {
        assert_eq!(pad_len(0), 0);
        assert_eq!(pad_len(1), 3);
        assert_eq!(pad_len(2), 2);
        assert_eq!(pad_len(3), 1);
        assert_eq!(pad_len(4), 0);
        assert_eq!(pad_len(110), 2);
        assert_eq!(pad_len(120), 0);
    }

    #[test]
    fn checked_u32_limits() {
        assert_eq!(checked_u32("mtime", 0xffff_ffff).unwrap(), 0xffff_ffff);

        let err = checked_u32("mtime", 0x1_0000_0000).unwrap_err();
        assert!(matches!(
            err,
            Error::IntegerOverflow {
                field: "mtime",
                value: 0x1_0000_0000,
            }
        ));
    }

    #[test]
    fn checksum_sums_bytes() {
        assert_eq!(content_checksum(&[]), 0);
        assert_eq!(content_checksum(&[0x01, 0x02, 0x03]), 6);
        assert_eq!(content_checksum(&[0xff, 0xff]), 0x1fe);
    }

    #[test]
    fn checksum_wraps_modulo_32_bits() {
        // 16843010 * 255 = 0x1000000fe
        let content = vec![0xffu8; 16_843_010];
        assert_eq!(content_checksum(&content), 0xfe);
    }

    #[test]
    fn header_round_trips_through_bytes() {
        let entry = CpioEntryBuilder::new(CpioFormat::Newc, "a")
            .ino(7)
            .mode(0o100644)
            .mtime(0xffff_ffff)
            .content(b"xy".to_vec())
            .build()
            .unwrap();

        let raw = RawHeader::from_entry(&entry).unwrap().to_bytes();
        assert_eq!(raw.len(), CPIO_HEADER_LEN);

        let parsed = RawHeader::parse(&raw, 0).unwrap();
        assert_eq!(parsed.format, CpioFormat::Newc);
        assert_eq!(parsed.ino, 7);
        assert_eq!(parsed.mode, 0o100644);
        assert_eq!(parsed.mtime, 0xffff_ffff);
        assert_eq!(parsed.filesize, 2);
        assert_eq!(parsed.namesize, 2);
    }

    #[test]
    fn parse_rejects_unknown_magic() {
        let raw = raw_header(b"070703", ["00000000"; 13]);
        let err = RawHeader::parse(&raw, 0x400).unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedMagic {
                offset: 0x400,
                found: [b'0', b'7', b'0', b'7', b'0', b'3'],
            }
        ));
    }

    #[test]
    fn parse_rejects_non_hex_field_bytes() {
        let mut fields = ["00000000"; 13];
        fields[1] = "0000zz00";
        let raw = raw_header(b"070701", fields);

        let err = RawHeader::parse(&raw, 0).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidHexField {
                offset: 14,
                field: "mode",
            }
        ));
    }

    #[test]
    fn parse_rejects_signed_field() {
        // a '+' sign is not a hex digit even though integer parsing takes it
        let mut fields = ["00000000"; 13];
        fields[0] = "+0000001";
        let raw = raw_header(b"070701", fields);

        let err = RawHeader::parse(&raw, 0).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidHexField {
                offset: 6,
                field: "ino",
            }
        ));
    }

    #[test]
    fn parse_accepts_uppercase_hex() {
        let mut fields = ["00000000"; 13];
        fields[5] = "DEADBEEF";
        let raw = raw_header(b"070701", fields);

        let parsed = RawHeader::parse(&raw, 0).unwrap();
        assert_eq!(parsed.mtime, 0xdead_beef);
    }

    #[test]
    fn mode_strings_match_ls_output() {
        assert_eq!(mode_to_str(0o100644), "-rw-r--r--");
        assert_eq!(mode_to_str(0o100777), "-rwxrwxrwx");
        assert_eq!(mode_to_str(0o040755), "drwxr-xr-x");
        assert_eq!(mode_to_str(0o120777), "lrwxrwxrwx");
        assert_eq!(mode_to_str(0), "?---------");
    }

    #[test]
    fn kind_predicates_follow_mode_bits() {
        let kind = |mode: u32| {
            CpioEntryBuilder::new(CpioFormat::Newc, "k")
                .mode(mode)
                .build()
                .unwrap()
        };

        assert!(kind(0o100644).is_reg());
        assert!(kind(0o040755).is_dir());
        assert!(kind(0o120777).is_link());
        assert!(kind(0o140644).is_sock());
        assert!(kind(0o010644).is_fifo());
        assert!(kind(0o060644).is_blk());
        assert!(kind(0o020644).is_chr());
        assert!(!kind(0o100644).is_dir());
    }

    #[test]
    fn builder_rejects_embedded_null_in_path() {
        let err = CpioEntryBuilder::new(CpioFormat::Newc, "a\0b")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPathEncoding { offset: 1, .. }));
    }

    #[test]
    fn builder_zeroes_checksum_outside_crc_regular_files() {
        let newc_file = CpioEntryBuilder::new(CpioFormat::Newc, "f")
            .mode(0o100644)
            .content(vec![1, 2, 3])
            .build()
            .unwrap();
        assert_eq!(newc_file.checksum(), 0);

        let crc_link = CpioEntryBuilder::new(CpioFormat::Crc, "l")
            .mode(0o120777)
            .content(b"target".to_vec())
            .build()
            .unwrap();
        assert_eq!(crc_link.checksum(), 0);

        let crc_file = CpioEntryBuilder::new(CpioFormat::Crc, "f")
            .mode(0o100644)
            .content(vec![1, 2, 3])
            .build()
            .unwrap();
        assert_eq!(crc_file.checksum(), 6);
        assert!(crc_file.verify_checksum());
    }

    #[test]
    fn display_renders_ls_style_lines() {
        let file = CpioEntryBuilder::new(CpioFormat::Newc, "etc/passwd")
            .mode(0o100644)
            .nlink(1)
            .content(b"root\n".to_vec())
            .build()
            .unwrap();
        assert_eq!(
            file.to_string(),
            "-rw-r--r--  1    0    0        5 etc/passwd"
        );

        let link = CpioEntryBuilder::new(CpioFormat::Newc, "bin/sh")
            .mode(0o120777)
            .nlink(1)
            .content(b"dash".to_vec())
            .build()
            .unwrap();
        assert_eq!(
            link.to_string(),
            "lrwxrwxrwx  1    0    0        4 bin/sh -> dash"
        );
    }
}
