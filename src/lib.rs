mod cli;
mod error;
mod report;

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use crc::{Crc, CRC_32_BZIP2};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use cli::run;
pub use error::{StoreError, ToolError};
pub use report::render;

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_BZIP2);

const TAG_INT: u8 = 0;
const TAG_FLOAT: u8 = 1;
const TAG_STR: u8 = 2;
const TAG_RAW: u8 = 3;

/// Value kind selected by a `set` type flag. Chooses both the parse
/// rule for the value token and the mutator invoked on the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    Int,
    Float,
    Str,
    Raw,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Raw(Vec<u8>),
}

impl Value {
    fn kind_tag(&self) -> u8 {
        match self {
            Value::Int(_) => TAG_INT,
            Value::Float(_) => TAG_FLOAT,
            Value::Str(_) => TAG_STR,
            Value::Raw(_) => TAG_RAW,
        }
    }

    fn payload(&self) -> Vec<u8> {
        match self {
            Value::Int(v) => v.to_le_bytes().to_vec(),
            Value::Float(v) => v.to_le_bytes().to_vec(),
            Value::Str(s) => s.as_bytes().to_vec(),
            Value::Raw(b) => b.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub name: String,
    pub value: Value,
}

/// Typed key-value record set backed by a checksummed binary file.
///
/// Records iterate in insertion order; setting an existing name
/// overwrites its value in place without changing its position.
#[derive(Debug, Default)]
pub struct BinStore {
    records: Vec<Record>,
}

impl BinStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load<P>(path: P) -> Result<Self, StoreError>
    where
        P: AsRef<Path>,
    {
        let f = File::open(path.as_ref())?;
        let store = Self::load_from(BufReader::new(f))?;
        debug!(
            path = %path.as_ref().display(),
            records = store.len(),
            "loaded store"
        );
        Ok(store)
    }

    pub fn load_from<R>(mut r: R) -> Result<Self, StoreError>
    where
        R: Read,
    {
        let mut records: Vec<Record> = Vec::new();

        loop {
            // EOF is only clean on a record boundary; running out of
            // bytes anywhere past the checksum field is corruption.
            let mut checksum_buf = [0u8; 4];
            match r.read_exact(&mut checksum_buf) {
                Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => break,
                other => other?,
            }
            let saved_checksum = u32::from_le_bytes(checksum_buf);

            let record = Self::read_record(&mut r, saved_checksum)?;
            match records.iter_mut().find(|existing| existing.name == record.name) {
                Some(existing) => existing.value = record.value,
                None => records.push(record),
            }
        }

        Ok(Self { records })
    }

    fn read_record<R>(r: &mut R, saved_checksum: u32) -> Result<Record, StoreError>
    where
        R: Read,
    {
        let name_len = r.read_u32::<LittleEndian>()?;
        let kind_tag = r.read_u8()?;
        let payload_len = r.read_u32::<LittleEndian>()?;

        let mut name = vec![0u8; name_len as usize];
        r.read_exact(&mut name)?;
        let mut payload = vec![0u8; payload_len as usize];
        r.read_exact(&mut payload)?;

        let mut checked = Vec::with_capacity(name.len() + 1 + payload.len());
        checked.extend_from_slice(&name);
        checked.push(kind_tag);
        checked.extend_from_slice(&payload);

        let checksum = CRC32.checksum(&checked);
        if checksum != saved_checksum {
            return Err(StoreError::Corrupt {
                expected: saved_checksum,
                found: checksum,
            });
        }

        let name = String::from_utf8(name).map_err(|_| StoreError::BadName)?;
        let mut numeric = &payload[..];
        let value = match kind_tag {
            TAG_INT => Value::Int(numeric.read_i64::<LittleEndian>()?),
            TAG_FLOAT => Value::Float(numeric.read_f64::<LittleEndian>()?),
            TAG_STR => Value::Str(String::from_utf8(payload).map_err(|_| StoreError::BadName)?),
            TAG_RAW => Value::Raw(payload),
            other => return Err(StoreError::BadKindTag(other)),
        };

        Ok(Record { name, value })
    }

    pub fn save<P>(&self, path: P) -> Result<(), StoreError>
    where
        P: AsRef<Path>,
    {
        let f = File::create(path.as_ref())?;
        let mut w = BufWriter::new(f);

        for record in &self.records {
            Self::write_record(&mut w, record)?;
        }
        w.flush()?;

        debug!(
            path = %path.as_ref().display(),
            records = self.len(),
            "saved store"
        );
        Ok(())
    }

    fn write_record<W>(w: &mut W, record: &Record) -> Result<(), StoreError>
    where
        W: Write,
    {
        let name = record.name.as_bytes();
        let payload = record.value.payload();

        let mut checked = Vec::with_capacity(name.len() + 1 + payload.len());
        checked.extend_from_slice(name);
        checked.push(record.value.kind_tag());
        checked.extend_from_slice(&payload);

        let checksum = CRC32.checksum(&checked);

        // To keep consistent byte ordering between file systems use explicit
        // endian for writing to files
        w.write_u32::<LittleEndian>(checksum)?;
        w.write_u32::<LittleEndian>(name.len() as u32)?;
        w.write_u8(record.value.kind_tag())?;
        w.write_u32::<LittleEndian>(payload.len() as u32)?;
        w.write_all(name)?;
        w.write_all(&payload)?;

        Ok(())
    }

    pub fn key_exists(&self, name: &str) -> bool {
        self.records.iter().any(|r| r.name == name)
    }

    pub fn get_key(&self, name: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.name == name)
    }

    pub fn set(&mut self, name: &str, value: Value) {
        match self.records.iter_mut().find(|r| r.name == name) {
            Some(record) => record.value = value,
            None => self.records.push(Record {
                name: name.to_string(),
                value,
            }),
        }
    }

    pub fn set_int(&mut self, name: &str, value: i64) {
        self.set(name, Value::Int(value));
    }

    pub fn set_float(&mut self, name: &str, value: f64) {
        self.set(name, Value::Float(value));
    }

    pub fn set_string(&mut self, name: &str, value: &str) {
        self.set(name, Value::Str(value.to_string()));
    }

    pub fn set_raw(&mut self, name: &str, value: Vec<u8>) {
        self.set(name, Value::Raw(value));
    }

    pub fn delete_key(&mut self, name: &str) -> bool {
        let before = self.records.len();
        self.records.retain(|r| r.name != name);
        self.records.len() != before
    }

    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
