//! # Pager
//!
//! Seek-addressed page I/O over the single data file. Every read and
//! write covers exactly one page's extent; there are no partial-page
//! writes. The file grows only through [`Pager::append_page`].
//!
//! A file length that is not an exact multiple of the page size means the
//! file was created with a different block factor (or record width) —
//! reported as [`StoreError::FormatMismatch`] at open time, and as
//! [`StoreError::CorruptFile`] if observed later during operation.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use super::{page_size, Page};
use crate::error::{Result, StoreError};

#[derive(Debug)]
pub struct Pager {
    file: File,
    path: PathBuf,
    block_factor: usize,
    page_size: u64,
}

impl Pager {
    /// Opens (creating if absent) the data file at `path`.
    pub fn open(path: &Path, block_factor: usize) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let pager = Self {
            file,
            path: path.to_path_buf(),
            block_factor,
            page_size: page_size(block_factor) as u64,
        };

        let len = pager.file.metadata()?.len();
        if len % pager.page_size != 0 {
            return Err(StoreError::FormatMismatch {
                path: pager.path,
                reason: format!(
                    "file length {} is not a multiple of page size {} (block factor {})",
                    len, pager.page_size, block_factor
                ),
            });
        }

        Ok(pager)
    }

    pub fn block_factor(&self) -> usize {
        self.block_factor
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Total pages in the file: `file_len / page_size`.
    pub fn page_count(&mut self) -> Result<u32> {
        let len = self.file.metadata()?.len();
        if len % self.page_size != 0 {
            return Err(StoreError::CorruptFile {
                path: self.path.clone(),
                reason: format!(
                    "file length {} is not a multiple of page size {}",
                    len, self.page_size
                ),
            });
        }
        Ok((len / self.page_size) as u32)
    }

    /// Reads and decodes page `page_no`.
    pub fn read_page(&mut self, page_no: u32) -> Result<Page> {
        self.check_bounds(page_no)?;

        self.file
            .seek(SeekFrom::Start(page_no as u64 * self.page_size))?;
        let mut buf = vec![0u8; self.page_size as usize];
        self.file.read_exact(&mut buf)?;

        Page::decode(&buf, self.block_factor, page_no)
    }

    /// Overwrites page `page_no` in place.
    pub fn write_page(&mut self, page_no: u32, page: &Page) -> Result<()> {
        self.check_bounds(page_no)?;

        let buf = page.encode(self.block_factor)?;
        self.file
            .seek(SeekFrom::Start(page_no as u64 * self.page_size))?;
        self.file.write_all(&buf)?;

        Ok(())
    }

    /// Writes `page` at the end of the file and returns its page number.
    pub fn append_page(&mut self, page: &Page) -> Result<u32> {
        let page_no = self.page_count()?;

        let buf = page.encode(self.block_factor)?;
        self.file.seek(SeekFrom::End(0))?;
        self.file.write_all(&buf)?;

        Ok(page_no)
    }

    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    fn check_bounds(&mut self, page_no: u32) -> Result<()> {
        let page_count = self.page_count()?;
        if page_no >= page_count {
            return Err(StoreError::OutOfRange {
                page_no,
                page_count,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use crate::storage::NO_NEXT_PAGE;
    use tempfile::tempdir;

    fn rec(id: i32) -> Record {
        Record::new(id, "pager-test", 1, 1.0, "2024-01-01")
    }

    #[test]
    fn empty_file_has_zero_pages() {
        let dir = tempdir().unwrap();
        let mut pager = Pager::open(&dir.path().join("data.dat"), 3).unwrap();

        assert_eq!(pager.page_count().unwrap(), 0);
    }

    #[test]
    fn append_returns_sequential_page_numbers() {
        let dir = tempdir().unwrap();
        let mut pager = Pager::open(&dir.path().join("data.dat"), 3).unwrap();

        let page = Page::new(vec![rec(1)], NO_NEXT_PAGE);
        assert_eq!(pager.append_page(&page).unwrap(), 0);
        assert_eq!(pager.append_page(&page).unwrap(), 1);
        assert_eq!(pager.append_page(&page).unwrap(), 2);
        assert_eq!(pager.page_count().unwrap(), 3);
    }

    #[test]
    fn write_then_read_roundtrip() {
        let dir = tempdir().unwrap();
        let mut pager = Pager::open(&dir.path().join("data.dat"), 3).unwrap();

        pager.append_page(&Page::new(vec![rec(1)], NO_NEXT_PAGE)).unwrap();
        pager.append_page(&Page::new(vec![rec(2)], NO_NEXT_PAGE)).unwrap();

        let replacement = Page::new(vec![rec(5), rec(6)], 0);
        pager.write_page(1, &replacement).unwrap();

        assert_eq!(pager.read_page(1).unwrap(), replacement);
        // page 0 untouched
        assert_eq!(pager.read_page(0).unwrap().records()[0].id, 1);
    }

    #[test]
    fn read_beyond_end_is_out_of_range() {
        let dir = tempdir().unwrap();
        let mut pager = Pager::open(&dir.path().join("data.dat"), 3).unwrap();
        pager.append_page(&Page::new(vec![rec(1)], NO_NEXT_PAGE)).unwrap();

        let err = pager.read_page(1).unwrap_err();
        assert!(matches!(
            err,
            StoreError::OutOfRange {
                page_no: 1,
                page_count: 1
            }
        ));
    }

    #[test]
    fn write_beyond_end_is_out_of_range() {
        let dir = tempdir().unwrap();
        let mut pager = Pager::open(&dir.path().join("data.dat"), 3).unwrap();

        let err = pager
            .write_page(0, &Page::new(vec![rec(1)], NO_NEXT_PAGE))
            .unwrap_err();
        assert!(matches!(err, StoreError::OutOfRange { .. }));
    }

    #[test]
    fn open_rejects_length_from_other_block_factor() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.dat");

        let mut pager = Pager::open(&path, 3).unwrap();
        pager.append_page(&Page::new(vec![rec(1)], NO_NEXT_PAGE)).unwrap();
        drop(pager);

        let err = Pager::open(&path, 4).unwrap_err();
        assert!(matches!(err, StoreError::FormatMismatch { .. }));
    }

    #[test]
    fn torn_file_is_corrupt_during_operation() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.dat");

        let mut pager = Pager::open(&path, 3).unwrap();
        pager.append_page(&Page::new(vec![rec(1)], NO_NEXT_PAGE)).unwrap();

        // chop the file mid-page behind the pager's back
        let full = std::fs::metadata(&path).unwrap().len();
        let file = OpenOptions::new().write(true).open(&path).unwrap();
        file.set_len(full - 10).unwrap();

        let err = pager.page_count().unwrap_err();
        assert!(matches!(err, StoreError::CorruptFile { .. }));
    }
}
