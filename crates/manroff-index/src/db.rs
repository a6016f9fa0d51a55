//! The two-file on-disk database.
//!
//! The keyword file is a duplicate-allowing ordered map: entries sorted
//! by raw key bytes, each carrying an 8-byte value of class-mask and
//! record number, both little-endian on every host. The record file is
//! a dense 1-based store of five nil-terminated fields per record:
//! filename, section, title, architecture-or-empty, description.
//!
//! Writers stage into `~`-suffixed shadow files and atomically rename
//! over the real names on commit, so a concurrent reader observes either
//! the old pair or the new pair, never a torn state.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use memchr::memchr;
use thiserror::Error;
use tracing::debug;

use crate::classes::KeyMask;

/// Keyword-file name inside the index directory.
pub const KEYWORD_DB: &str = "manual.db";

/// Record-file name inside the index directory.
pub const RECORD_DB: &str = "manual.index";

/// Suffix of the staging files.
pub const SHADOW_SUFFIX: &str = "~";

const KEYWORD_MAGIC: &[u8; 4] = b"mrdb";
const RECORD_MAGIC: &[u8; 4] = b"mrix";
const FORMAT_VERSION: u32 = 1;

/// Database access failures.
#[derive(Debug, Error)]
pub enum DbError {
    /// Underlying file operation failed.
    #[error("database I/O on {path}: {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// OS error.
        #[source]
        source: std::io::Error,
    },
    /// The file contents do not follow the format.
    #[error("corrupt database {path}: {reason}")]
    Corrupt {
        /// File involved.
        path: PathBuf,
        /// What was wrong.
        reason: String,
    },
}

fn io_err(path: &Path, source: std::io::Error) -> DbError {
    DbError::Io { path: path.to_path_buf(), source }
}

/// One manual's metadata row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    /// 1-based dense record number.
    pub rec: u32,
    /// Filename relative to the index directory.
    pub file: String,
    /// Manual section as written.
    pub sec: String,
    /// Manual title.
    pub title: String,
    /// Architecture, empty when generic.
    pub arch: String,
    /// One-line description.
    pub desc: String,
}

/// In-memory staging area flushed to the file pair on commit.
#[derive(Debug, Default)]
pub struct DbStage {
    /// key bytes -> (mask, record) pairs in insertion order per key.
    keywords: BTreeMap<Vec<u8>, Vec<(KeyMask, u32)>>,
    records: Vec<Record>,
}

impl DbStage {
    /// An empty stage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of staged records.
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Append a record, returning its 1-based number.
    pub fn push_record(&mut self, mut record: Record) -> u32 {
        let rec = self.records.len() as u32 + 1;
        record.rec = rec;
        self.records.push(record);
        rec
    }

    /// Stage one keyword entry.
    pub fn push_keyword(&mut self, key: &str, mask: KeyMask, rec: u32) {
        if key.is_empty() {
            return;
        }
        self.keywords.entry(key.as_bytes().to_vec()).or_default().push((mask, rec));
    }

    fn write_keywords<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        let count: usize = self.keywords.values().map(Vec::len).sum();
        out.write_all(KEYWORD_MAGIC)?;
        out.write_all(&FORMAT_VERSION.to_le_bytes())?;
        out.write_all(&(count as u32).to_le_bytes())?;
        out.write_all(&0u32.to_le_bytes())?;
        for (key, entries) in &self.keywords {
            for &(mask, rec) in entries {
                out.write_all(&(key.len() as u32).to_le_bytes())?;
                out.write_all(key)?;
                out.write_all(&mask.0.to_le_bytes())?;
                out.write_all(&rec.to_le_bytes())?;
            }
        }
        Ok(())
    }

    fn write_records<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        out.write_all(RECORD_MAGIC)?;
        out.write_all(&FORMAT_VERSION.to_le_bytes())?;
        out.write_all(&(self.records.len() as u32).to_le_bytes())?;
        out.write_all(&0u32.to_le_bytes())?;
        for record in &self.records {
            let mut value = Vec::new();
            for field in
                [&record.file, &record.sec, &record.title, &record.arch, &record.desc]
            {
                value.extend_from_slice(field.as_bytes());
                value.push(0);
            }
            out.write_all(&(value.len() as u32).to_le_bytes())?;
            out.write_all(&value)?;
        }
        Ok(())
    }

    /// Write both shadow files and atomically publish them.
    pub fn commit(&self, dir: &Path) -> Result<(), DbError> {
        let db_path = dir.join(KEYWORD_DB);
        let idx_path = dir.join(RECORD_DB);
        let db_shadow = shadow_path(&db_path);
        let idx_shadow = shadow_path(&idx_path);

        let mut out = BufWriter::new(
            File::create(&db_shadow).map_err(|e| io_err(&db_shadow, e))?,
        );
        self.write_keywords(&mut out).map_err(|e| io_err(&db_shadow, e))?;
        out.into_inner()
            .map_err(|e| io_err(&db_shadow, e.into_error()))?
            .sync_all()
            .map_err(|e| io_err(&db_shadow, e))?;

        let mut out = BufWriter::new(
            File::create(&idx_shadow).map_err(|e| io_err(&idx_shadow, e))?,
        );
        self.write_records(&mut out).map_err(|e| io_err(&idx_shadow, e))?;
        out.into_inner()
            .map_err(|e| io_err(&idx_shadow, e.into_error()))?
            .sync_all()
            .map_err(|e| io_err(&idx_shadow, e))?;

        fs::rename(&db_shadow, &db_path).map_err(|e| io_err(&db_path, e))?;
        fs::rename(&idx_shadow, &idx_path).map_err(|e| io_err(&idx_path, e))?;
        debug!(records = self.records.len(), dir = %dir.display(), "database published");
        Ok(())
    }
}

fn shadow_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(SHADOW_SUFFIX);
    PathBuf::from(name)
}

/// One keyword-file entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordEntry {
    /// Normalized keyword bytes.
    pub key: Vec<u8>,
    /// Class mask.
    pub mask: KeyMask,
    /// 1-based record number.
    pub rec: u32,
}

/// Read-only view of a published database pair.
#[derive(Debug)]
pub struct DbReader {
    keywords: Vec<KeywordEntry>,
    records: Vec<Record>,
}

impl DbReader {
    /// Open the pair inside `dir`.
    pub fn open(dir: &Path) -> Result<Self, DbError> {
        let keywords = read_keywords(&dir.join(KEYWORD_DB))?;
        let records = read_records(&dir.join(RECORD_DB))?;
        Ok(DbReader { keywords, records })
    }

    /// Keyword entries in key order.
    pub fn keywords(&self) -> &[KeywordEntry] {
        &self.keywords
    }

    /// All records, dense from record number 1.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Record by its 1-based number.
    pub fn record(&self, rec: u32) -> Option<&Record> {
        rec.checked_sub(1).and_then(|i| self.records.get(i as usize))
    }
}

fn read_all(path: &Path) -> Result<Vec<u8>, DbError> {
    let mut buf = Vec::new();
    File::open(path)
        .and_then(|mut f| f.read_to_end(&mut buf))
        .map_err(|e| io_err(path, e))?;
    Ok(buf)
}

fn corrupt(path: &Path, reason: &str) -> DbError {
    DbError::Corrupt { path: path.to_path_buf(), reason: reason.to_string() }
}

fn header<'a>(
    path: &Path,
    data: &'a [u8],
    magic: &[u8; 4],
) -> Result<(u32, &'a [u8]), DbError> {
    if data.len() < 16 || &data[..4] != magic {
        return Err(corrupt(path, "bad magic"));
    }
    let version = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
    if version != FORMAT_VERSION {
        return Err(corrupt(path, "unsupported format version"));
    }
    let count = u32::from_le_bytes([data[8], data[9], data[10], data[11]]);
    Ok((count, &data[16..]))
}

fn take_u32(path: &Path, data: &mut &[u8]) -> Result<u32, DbError> {
    if data.len() < 4 {
        return Err(corrupt(path, "truncated entry"));
    }
    let v = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    *data = &data[4..];
    Ok(v)
}

fn read_keywords(path: &Path) -> Result<Vec<KeywordEntry>, DbError> {
    let data = read_all(path)?;
    let (count, mut rest) = header(path, &data, KEYWORD_MAGIC)?;
    let mut entries = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let klen = take_u32(path, &mut rest)? as usize;
        if rest.len() < klen + 8 {
            return Err(corrupt(path, "truncated keyword"));
        }
        let key = rest[..klen].to_vec();
        rest = &rest[klen..];
        let mask = KeyMask(take_u32(path, &mut rest)?);
        let rec = take_u32(path, &mut rest)?;
        entries.push(KeywordEntry { key, mask, rec });
    }
    Ok(entries)
}

fn read_records(path: &Path) -> Result<Vec<Record>, DbError> {
    let data = read_all(path)?;
    let (count, mut rest) = header(path, &data, RECORD_MAGIC)?;
    let mut records = Vec::with_capacity(count as usize);
    for i in 0..count {
        let vlen = take_u32(path, &mut rest)? as usize;
        if rest.len() < vlen {
            return Err(corrupt(path, "truncated record"));
        }
        let mut value = &rest[..vlen];
        rest = &rest[vlen..];

        let mut field = |what: &str| -> Result<String, DbError> {
            let end = memchr(0, value)
                .ok_or_else(|| corrupt(path, &format!("unterminated {what}")))?;
            let s = String::from_utf8_lossy(&value[..end]).into_owned();
            value = &value[end + 1..];
            Ok(s)
        };
        let record = Record {
            rec: i + 1,
            file: field("filename")?,
            sec: field("section")?,
            title: field("title")?,
            arch: field("architecture")?,
            desc: field("description")?,
        };
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_stage() -> DbStage {
        let mut stage = DbStage::new();
        let rec = stage.push_record(Record {
            rec: 0,
            file: "cat.1".into(),
            sec: "1".into(),
            title: "CAT".into(),
            arch: String::new(),
            desc: "concatenate files".into(),
        });
        stage.push_keyword("cat", KeyMask::NAME.union(KeyMask::UTILITY), rec);
        stage.push_keyword("concatenate files", KeyMask::DESC, rec);
        stage
    }

    #[test]
    fn round_trip_through_files() {
        let dir = tempfile::tempdir().unwrap();
        sample_stage().commit(dir.path()).unwrap();

        let reader = DbReader::open(dir.path()).unwrap();
        assert_eq!(reader.records().len(), 1);
        let record = reader.record(1).unwrap();
        assert_eq!(record.title, "CAT");
        assert_eq!(record.arch, "");

        let entry = reader
            .keywords()
            .iter()
            .find(|e| e.key == b"cat")
            .unwrap();
        assert_eq!(entry.mask, KeyMask::NAME.union(KeyMask::UTILITY));
        assert_eq!(entry.rec, 1);
    }

    #[test]
    fn keywords_are_sorted_by_key_bytes() {
        let mut stage = DbStage::new();
        let rec = stage.push_record(Record::default());
        stage.push_keyword("zeta", KeyMask::NAME, rec);
        stage.push_keyword("alpha", KeyMask::NAME, rec);
        let dir = tempfile::tempdir().unwrap();
        stage.commit(dir.path()).unwrap();

        let reader = DbReader::open(dir.path()).unwrap();
        let keys: Vec<&[u8]> = reader.keywords().iter().map(|e| e.key.as_slice()).collect();
        assert_eq!(keys, vec![b"alpha".as_slice(), b"zeta".as_slice()]);
    }

    #[test]
    fn value_layout_is_mask_then_recno_little_endian() {
        let dir = tempfile::tempdir().unwrap();
        sample_stage().commit(dir.path()).unwrap();
        let data = std::fs::read(dir.path().join(KEYWORD_DB)).unwrap();
        // Header, then the first (lexicographically smallest) key "cat".
        let klen = u32::from_le_bytes(data[16..20].try_into().unwrap()) as usize;
        assert_eq!(&data[20..20 + klen], b"cat");
        let mask = u32::from_le_bytes(data[20 + klen..24 + klen].try_into().unwrap());
        let rec = u32::from_le_bytes(data[24 + klen..28 + klen].try_into().unwrap());
        assert_eq!(mask, KeyMask::NAME.union(KeyMask::UTILITY).0);
        assert_eq!(rec, 1);
    }

    #[test]
    fn commit_is_idempotent_and_byte_identical() {
        let dir_a = tempfile::tempdir().unwrap();
        let dir_b = tempfile::tempdir().unwrap();
        sample_stage().commit(dir_a.path()).unwrap();
        sample_stage().commit(dir_b.path()).unwrap();
        for name in [KEYWORD_DB, RECORD_DB] {
            let a = std::fs::read(dir_a.path().join(name)).unwrap();
            let b = std::fs::read(dir_b.path().join(name)).unwrap();
            assert_eq!(a, b, "{name} differs between identical runs");
        }
    }

    #[test]
    fn no_shadow_files_survive_commit() {
        let dir = tempfile::tempdir().unwrap();
        sample_stage().commit(dir.path()).unwrap();
        assert!(!dir.path().join(format!("{KEYWORD_DB}{SHADOW_SUFFIX}")).exists());
        assert!(!dir.path().join(format!("{RECORD_DB}{SHADOW_SUFFIX}")).exists());
    }

    #[test]
    fn corrupt_magic_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        sample_stage().commit(dir.path()).unwrap();
        std::fs::write(dir.path().join(KEYWORD_DB), b"junk").unwrap();
        assert!(matches!(DbReader::open(dir.path()), Err(DbError::Corrupt { .. })));
    }
}
