pub(crate) const NEWC_MAGIC: &[u8] = b"070701";
pub(crate) const CRC_MAGIC: &[u8]  = b"070702";

/// Name of the sentinel entry that terminates an archive
pub(crate) const TRAILER_NAME: &str = "TRAILER!!!";

/// Header fields and null-terminated name of the trailer entry, everything
/// after the magic, as historical cpio implementations emit it
pub(crate) const TRAILER: &[u8] = b"00000000000000000000000000000000000000010000000000000000000000000000000000000000000000000000000B00000000TRAILER!!!\0";

pub(crate) const CPIO_MAGIC_LEN: usize = 6;
pub(crate) const CPIO_FIELD_LEN: usize = 8;

/// Total size of a NEWC/CRC cpio entry header
pub(crate) const CPIO_HEADER_LEN: usize = 110;

/// Finished archives are zero padded out to a multiple of this block size
pub(crate) const BLOCK_LEN: u64 = 0x200;

/// POSIX file mode constants
pub(crate) const S_IFMT   : u32 = 0o170000; // bit mask file type bit field
pub(crate) const S_IFSOCK : u32 = 0o140000; // socket
pub(crate) const S_IFLNK  : u32 = 0o120000; // symbolic link
pub(crate) const S_IFREG  : u32 = 0o100000; // regular file
pub(crate) const S_IFBLK  : u32 = 0o060000; // block device
pub(crate) const S_IFDIR  : u32 = 0o040000; // directory
pub(crate) const S_IFCHR  : u32 = 0o020000; // character device
pub(crate) const S_IFIFO  : u32 = 0o010000; // FIFO
pub(crate) const MODE_R: u32 = 0o04;
pub(crate) const MODE_W: u32 = 0o02;
pub(crate) const MODE_X: u32 = 0o01;
