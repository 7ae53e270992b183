// src/table/store.rs
use std::fs::{self, File};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};

use encoding_rs::{Encoding, WINDOWS_1251};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::config::consts::{STORE_SEP, TABLE_ENCODING, TABLE_EXT};
use crate::csv::{parse_rows, rows_to_string};
use crate::error::StoreError;

use super::{merge, schema, Observation, Table};

/// Directory of per-category table files (`<dir>/<table id>.csv`), all in one
/// text encoding.
#[derive(Clone, Debug)]
pub struct TableStore {
    dir: PathBuf,
    encoding: &'static Encoding,
}

impl TableStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let encoding = Encoding::for_label(TABLE_ENCODING.as_bytes()).unwrap_or(WINDOWS_1251);
        Self { dir: dir.into(), encoding }
    }

    /// Read and write tables in the encoding named by `label`
    /// (`windows-1251`, `cp1251`, `utf-8`, ...).
    ///
    /// Only ASCII-compatible encodings are accepted: the separator, quotes
    /// and newlines must stay single bytes.
    pub fn with_encoding(mut self, label: &str) -> Result<Self, StoreError> {
        let label = label.trim();
        self.encoding = Encoding::for_label(label.as_bytes())
            .filter(|e| e.is_ascii_compatible())
            .ok_or_else(|| StoreError::UnknownEncoding(s!(label)))?;
        Ok(self)
    }

    pub fn encoding(&self) -> &'static Encoding { self.encoding }

    pub fn path(&self, table_id: &str) -> PathBuf {
        self.dir.join(format!("{table_id}.{TABLE_EXT}"))
    }

    pub fn exists(&self, table_id: &str) -> bool {
        self.path(table_id).is_file()
    }

    /// Read and validate the whole table.
    pub fn load(&self, table_id: &str) -> Result<Table, StoreError> {
        let path = self.path(table_id);
        let bytes = fs::read(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StoreError::NotFound(path.clone()),
            _ => StoreError::io(&path, e),
        })?;
        let text = self.decode(&path, &bytes);

        let mut rows = parse_rows(&text, STORE_SEP).into_iter();
        let header = rows.next().ok_or_else(|| StoreError::EmptyHeader(path.clone()))?;
        let table = Table::from_rows(header, rows)?;
        debug!(table = table_id, rows = table.len(), width = table.header_width(), "loaded");
        Ok(table)
    }

    /// Only the first row; does not read past the header line.
    pub fn header(&self, table_id: &str) -> Result<Vec<String>, StoreError> {
        let path = self.path(table_id);
        let file = File::open(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StoreError::NotFound(path.clone()),
            _ => StoreError::io(&path, e),
        })?;
        let mut reader = BufReader::new(file);
        let mut line = Vec::new();
        loop {
            line.clear();
            let n = reader.read_until(b'\n', &mut line).map_err(|e| StoreError::io(&path, e))?;
            if n == 0 {
                return Err(StoreError::EmptyHeader(path));
            }
            // Header cells never hold newlines, so one physical line is one row.
            let text = self.decode(&path, &line);
            if let Some(header) = parse_rows(&text, STORE_SEP).into_iter().next() {
                return Ok(header);
            }
        }
    }

    /// Rewrite the full table.
    ///
    /// Rows go to a temp file in the same directory which then replaces the
    /// destination, so a crash mid-write leaves the previous table intact.
    pub fn save(&self, table_id: &str, table: &Table) -> Result<(), StoreError> {
        let path = self.path(table_id);
        self.ensure_dir()?;

        let text = rows_to_string(table.all_rows(), STORE_SEP);
        let (bytes, _, unmappable) = self.encoding.encode(&text);
        if unmappable {
            warn!(table = table_id, encoding = self.encoding.name(), "characters outside the encoding written as numeric references");
        }

        let dir = if self.dir.as_os_str().is_empty() { Path::new(".") } else { self.dir.as_path() };
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
        tmp.write_all(&bytes).map_err(|e| StoreError::io(tmp.path(), e))?;
        tmp.as_file().sync_all().map_err(|e| StoreError::io(tmp.path(), e))?;
        tmp.persist(&path).map_err(|e| StoreError::Persist { path: path.clone(), source: e.error })?;

        debug!(table = table_id, rows = table.len(), "saved");
        Ok(())
    }

    /// Write a brand-new table: header `["", timestamp, blanks(width - 1)]`,
    /// then the first batch.
    ///
    /// The batch goes through the merge against that single-run header, so a
    /// well-formed batch lands verbatim and a key repeated inside it keeps
    /// its first occurrence only.
    pub fn create(
        &self,
        table_id: &str,
        width: usize,
        timestamp: &str,
        initial: Vec<Observation>,
    ) -> Result<Table, StoreError> {
        let mut table = Table::with_header(schema::initial_header(width, timestamp));
        merge(&mut table, initial, width)?;
        self.save(table_id, &table)?;
        Ok(table)
    }

    /// Undecodable bytes become U+FFFD; a BOM, if any, picks the encoding.
    fn decode(&self, path: &Path, bytes: &[u8]) -> String {
        let (text, used, malformed) = self.encoding.decode(bytes);
        if malformed {
            warn!(path = %path.display(), encoding = used.name(), "undecodable bytes replaced");
        }
        text.into_owned()
    }

    fn ensure_dir(&self) -> Result<(), StoreError> {
        if self.dir.as_os_str().is_empty() || self.dir.is_dir() {
            return Ok(());
        }
        fs::create_dir_all(&self.dir).map_err(|e| StoreError::io(&self.dir, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(key: &str, v: &str) -> Observation {
        Observation::new(key, cells![v])
    }

    #[test]
    fn load_missing_table_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = TableStore::new(dir.path());
        assert!(matches!(store.load("courses"), Err(StoreError::NotFound(_))));
        assert!(matches!(store.header("courses"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn create_then_load_and_header() {
        let dir = tempfile::tempdir().unwrap();
        let store = TableStore::new(dir.path().join("nested"));
        store.create("courses", 1, "T1", vec![obs("/c/1", "10"), obs("/c/2", "7")]).unwrap();

        let text = fs::read_to_string(store.path("courses")).unwrap();
        assert_eq!(text, ",T1\n/c/1,10\n/c/2,7\n");

        assert_eq!(store.header("courses").unwrap(), cells!["", "T1"]);
        let t = store.load("courses").unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(t.get("/c/2"), Some(&cells!["/c/2", "7"][..]));
    }

    #[test]
    fn save_overwrites_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = TableStore::new(dir.path());
        let mut t = store.create("authors", 2, "T1", vec![
            Observation::new("Ann", cells!["5", "1"]),
        ]).unwrap();
        t = schema::begin_new_run(t, 2, "T2");
        merge(&mut t, vec![Observation::new("Ann", cells!["6", "2"])], 2).unwrap();
        store.save("authors", &t).unwrap();

        let text = fs::read_to_string(store.path("authors")).unwrap();
        assert_eq!(text, ",T1,,T2,\nAnn,5,1,6,2\n");
    }

    #[test]
    fn load_rejects_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = TableStore::new(dir.path());
        fs::write(store.path("threads"), "").unwrap();
        assert!(matches!(store.load("threads"), Err(StoreError::EmptyHeader(p)) if p == store.path("threads")));
        assert!(matches!(store.header("threads"), Err(StoreError::EmptyHeader(_))));
    }

    #[test]
    fn cp1251_table_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = TableStore::new(dir.path()).with_encoding("cp1251").unwrap();
        let (bytes, _, _) = WINDOWS_1251.encode(",T1,\nИван Петров,5,1\n");
        fs::write(store.path("authors"), &bytes).unwrap();

        let mut t = store.load("authors").unwrap();
        assert_eq!(t.get("Иван Петров"), Some(&cells!["Иван Петров", "5", "1"][..]));
        assert_eq!(store.header("authors").unwrap(), cells!["", "T1", ""]);

        t = schema::begin_new_run(t, 2, "T2");
        merge(&mut t, vec![Observation::new("Иван Петров", cells!["6", "2"])], 2).unwrap();
        store.save("authors", &t).unwrap();

        let written = fs::read(store.path("authors")).unwrap();
        let (expected, _, _) = WINDOWS_1251.encode(",T1,,T2,\nИван Петров,5,1,6,2\n");
        assert_eq!(written, expected.into_owned());
    }

    #[test]
    fn utf8_store_writes_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let store = TableStore::new(dir.path()).with_encoding("utf-8").unwrap();
        store.create("authors", 2, "T1", vec![Observation::new("Ёжик", cells!["1", "2"])]).unwrap();
        assert_eq!(fs::read_to_string(store.path("authors")).unwrap(), ",T1,\nЁжик,1,2\n");
        assert!(store.load("authors").unwrap().get("Ёжик").is_some());
    }

    #[test]
    fn unknown_or_wide_encodings_are_refused() {
        let store = TableStore::new("csv");
        assert!(matches!(store.clone().with_encoding("klingon"), Err(StoreError::UnknownEncoding(_))));
        assert!(matches!(store.with_encoding("utf-16le"), Err(StoreError::UnknownEncoding(_))));
    }
}
