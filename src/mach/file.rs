use crate::error;
use crate::lang::Error;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::convert::TryFrom;
use std::path::PathBuf;
use std::rc::Rc;
use tracing::debug;

type Result<T> = std::result::Result<T, Error>;

const BINARY_MAGIC: u8 = 0xFF;
const PROTECTED_MAGIC: u8 = 0xFE;

/// How a program file is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Ascii,
    Binary,
    Protected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Input,
    Output,
    Append,
    Random,
}

impl Mode {
    /// Mode letter of the first OPEN syntax.
    pub fn from_letter(s: &str) -> Option<Mode> {
        match s.to_ascii_uppercase().as_str() {
            "I" => Some(Mode::Input),
            "O" => Some(Mode::Output),
            "A" => Some(Mode::Append),
            "R" => Some(Mode::Random),
            _ => None,
        }
    }
}

/// ## An open file

pub trait FileHandle {
    fn filetype(&self) -> FileType;
    fn mode(&self) -> Mode;
    /// Remaining contents.
    fn read(&mut self) -> Result<Vec<u8>>;
    /// Next line without its line ending; `None` at end of file.
    fn read_line(&mut self) -> Result<Option<String>>;
    fn write(&mut self, bytes: &[u8]) -> Result<()>;
    fn write_line(&mut self, line: &str) -> Result<()> {
        self.write(line.as_bytes())?;
        self.write(b"\r\n")
    }
    fn eof(&self) -> bool;
    fn close(&mut self) -> Result<()>;
}

/// Something files can be opened on.
pub trait Device {
    fn open(&mut self, name: &str, filetype: FileType, mode: Mode) -> Result<Box<dyn FileHandle>>;
}

enum Sink {
    Memory(Rc<RefCell<HashMap<String, Vec<u8>>>>, String),
    Disk(PathBuf),
    Closed,
}

/// File contents held in memory and written out on close.
struct BufferedFile {
    filetype: FileType,
    mode: Mode,
    data: Vec<u8>,
    pos: usize,
    sink: Sink,
}

impl BufferedFile {
    fn open_input(contents: Vec<u8>) -> BufferedFile {
        let (filetype, skip) = match contents.first() {
            Some(&BINARY_MAGIC) => (FileType::Binary, 1),
            Some(&PROTECTED_MAGIC) => (FileType::Protected, 1),
            _ => (FileType::Ascii, 0),
        };
        BufferedFile {
            filetype,
            mode: Mode::Input,
            data: contents,
            pos: skip,
            sink: Sink::Closed,
        }
    }

    fn open_output(filetype: FileType, mode: Mode, existing: Vec<u8>, sink: Sink) -> BufferedFile {
        let mut data = existing;
        match filetype {
            FileType::Binary => data.push(BINARY_MAGIC),
            FileType::Protected => data.push(PROTECTED_MAGIC),
            FileType::Ascii => {}
        }
        let pos = data.len();
        BufferedFile {
            filetype,
            mode,
            data,
            pos,
            sink,
        }
    }
}

impl FileHandle for BufferedFile {
    fn filetype(&self) -> FileType {
        self.filetype
    }

    fn mode(&self) -> Mode {
        self.mode
    }

    fn read(&mut self) -> Result<Vec<u8>> {
        let rest = self.data.get(self.pos..).unwrap_or(&[]).to_vec();
        self.pos = self.data.len();
        Ok(rest)
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        if self.eof() {
            return Ok(None);
        }
        let rest = &self.data[self.pos..];
        let end = rest
            .iter()
            .position(|&c| c == b'\n' || c == b'\r' || c == 0x1A)
            .unwrap_or(rest.len());
        let line = String::from_utf8_lossy(&rest[..end]).into_owned();
        let mut next = self.pos + end;
        match self.data.get(next) {
            Some(b'\r') => {
                next += 1;
                if self.data.get(next) == Some(&b'\n') {
                    next += 1;
                }
            }
            Some(b'\n') => next += 1,
            _ => {}
        }
        self.pos = next;
        Ok(Some(line))
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        if self.mode == Mode::Input {
            return Err(error!(BadFileMode));
        }
        self.data.extend_from_slice(bytes);
        self.pos = self.data.len();
        Ok(())
    }

    fn eof(&self) -> bool {
        match self.data.get(self.pos) {
            None | Some(0x1A) => true,
            _ => false,
        }
    }

    fn close(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.sink, Sink::Closed) {
            Sink::Memory(store, name) => {
                store.borrow_mut().insert(name, self.data.clone());
            }
            Sink::Disk(path) => {
                debug!(path = %path.display(), bytes = self.data.len(), "writing file");
                std::fs::write(path, &self.data)?;
            }
            Sink::Closed => {}
        }
        Ok(())
    }
}

/// Files kept in a shared map, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryDevice {
    files: Rc<RefCell<HashMap<String, Vec<u8>>>>,
}

impl MemoryDevice {
    pub fn new() -> MemoryDevice {
        MemoryDevice::default()
    }

    pub fn insert(&self, name: &str, contents: &[u8]) {
        self.files
            .borrow_mut()
            .insert(name.to_ascii_uppercase(), contents.to_vec());
    }

    pub fn contents(&self, name: &str) -> Option<Vec<u8>> {
        self.files.borrow().get(&name.to_ascii_uppercase()).cloned()
    }
}

impl Device for MemoryDevice {
    fn open(&mut self, name: &str, filetype: FileType, mode: Mode) -> Result<Box<dyn FileHandle>> {
        let key = name.to_ascii_uppercase();
        let existing = self.files.borrow().get(&key).cloned();
        match mode {
            Mode::Input => match existing {
                Some(contents) => Ok(Box::new(BufferedFile::open_input(contents))),
                None => Err(error!(FileNotFound)),
            },
            Mode::Append => {
                let sink = Sink::Memory(self.files.clone(), key);
                let existing = existing.unwrap_or_default();
                Ok(Box::new(BufferedFile::open_output(filetype, mode, existing, sink)))
            }
            Mode::Output | Mode::Random => {
                let sink = Sink::Memory(self.files.clone(), key);
                Ok(Box::new(BufferedFile::open_output(filetype, mode, vec![], sink)))
            }
        }
    }
}

/// Files in a directory of the host file system.
#[derive(Debug, Clone)]
pub struct DiskDevice {
    root: PathBuf,
}

impl DiskDevice {
    pub fn new<P: Into<PathBuf>>(root: P) -> DiskDevice {
        DiskDevice { root: root.into() }
    }
}

impl Device for DiskDevice {
    fn open(&mut self, name: &str, filetype: FileType, mode: Mode) -> Result<Box<dyn FileHandle>> {
        if name.is_empty() || name.contains('\0') {
            return Err(error!(BadFileName));
        }
        let path = self.root.join(name);
        debug!(path = %path.display(), ?mode, "opening file");
        match mode {
            Mode::Input => {
                let contents = std::fs::read(&path)?;
                Ok(Box::new(BufferedFile::open_input(contents)))
            }
            Mode::Append => {
                let existing = match std::fs::read(&path) {
                    Ok(contents) => contents,
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => vec![],
                    Err(e) => return Err(e.into()),
                };
                Ok(Box::new(BufferedFile::open_output(
                    filetype,
                    mode,
                    existing,
                    Sink::Disk(path),
                )))
            }
            Mode::Output | Mode::Random => Ok(Box::new(BufferedFile::open_output(
                filetype,
                mode,
                vec![],
                Sink::Disk(path),
            ))),
        }
    }
}

/// ## Table of open files

pub struct Files {
    files: BTreeMap<u8, Box<dyn FileHandle>>,
    max_files: u8,
    device: Box<dyn Device>,
}

impl std::fmt::Debug for Files {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Files {{ open: {:?} }}", self.files.keys().collect::<Vec<_>>())
    }
}

impl Files {
    pub fn new(device: Box<dyn Device>, max_files: u8) -> Files {
        Files {
            files: BTreeMap::new(),
            max_files,
            device,
        }
    }

    /// Opens and registers a numbered file.
    pub fn open(&mut self, number: i16, name: &str, filetype: FileType, mode: Mode) -> Result<()> {
        if name.is_empty() || number < 1 || number > self.max_files as i16 {
            return Err(error!(BadFileNumber));
        }
        let number = number as u8;
        if self.files.contains_key(&number) {
            return Err(error!(FileAlreadyOpen));
        }
        let file = self.device.open(name, filetype, mode)?;
        self.files.insert(number, file);
        Ok(())
    }

    /// Opens a file that is not registered under a number, as LOAD and
    /// SAVE do.
    pub fn open_unnumbered(
        &mut self,
        name: &str,
        filetype: FileType,
        mode: Mode,
    ) -> Result<Box<dyn FileHandle>> {
        if name.is_empty() {
            return Err(error!(BadFileNumber));
        }
        self.device.open(name, filetype, mode)
    }

    pub fn get(&mut self, number: i16, modes: &[Mode]) -> Result<&mut dyn FileHandle> {
        let number = match u8::try_from(number) {
            Ok(n) => n,
            Err(_) => return Err(error!(BadFileNumber)),
        };
        match self.files.get_mut(&number) {
            None => Err(error!(BadFileNumber)),
            Some(file) => {
                if modes.contains(&file.mode()) {
                    Ok(file.as_mut())
                } else {
                    Err(error!(BadFileMode))
                }
            }
        }
    }

    pub fn close(&mut self, number: i16) -> Result<()> {
        if let Ok(number) = u8::try_from(number) {
            if let Some(mut file) = self.files.remove(&number) {
                file.close()?;
            }
        }
        Ok(())
    }

    pub fn close_all(&mut self) -> Result<()> {
        let mut result = Ok(());
        for (_, mut file) in std::mem::take(&mut self.files) {
            if let Err(e) = file.close() {
                result = Err(e);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_numbers() {
        let device = MemoryDevice::new();
        let mut files = Files::new(Box::new(device), 3);
        assert_eq!(
            files.open(4, "A", FileType::Ascii, Mode::Output),
            Err(error!(BadFileNumber))
        );
        files.open(1, "A", FileType::Ascii, Mode::Output).unwrap();
        assert_eq!(
            files.open(1, "B", FileType::Ascii, Mode::Output),
            Err(error!(FileAlreadyOpen))
        );
        assert!(files.get(1, &[Mode::Input]).is_err());
        assert!(files.get(2, &[Mode::Output]).is_err());
    }

    #[test]
    fn test_write_then_read_lines() {
        let device = MemoryDevice::new();
        let mut files = Files::new(Box::new(device.clone()), 3);
        files.open(1, "data", FileType::Ascii, Mode::Output).unwrap();
        files.get(1, &[Mode::Output]).unwrap().write_line("ONE").unwrap();
        files.get(1, &[Mode::Output]).unwrap().write_line("TWO").unwrap();
        files.close(1).unwrap();
        assert_eq!(device.contents("DATA"), Some(b"ONE\r\nTWO\r\n".to_vec()));
        files.open(2, "data", FileType::Ascii, Mode::Input).unwrap();
        let f = files.get(2, &[Mode::Input]).unwrap();
        assert_eq!(f.read_line(), Ok(Some("ONE".to_string())));
        assert_eq!(f.read_line(), Ok(Some("TWO".to_string())));
        assert!(f.eof());
        assert_eq!(f.read_line(), Ok(None));
    }

    #[test]
    fn test_magic_bytes() {
        let device = MemoryDevice::new();
        let mut dev = device.clone();
        let mut f = dev.open("P", FileType::Protected, Mode::Output).unwrap();
        f.write(&[1, 2]).unwrap();
        f.close().unwrap();
        assert_eq!(device.contents("P"), Some(vec![0xFE, 1, 2]));
        let mut f = dev.open("P", FileType::Ascii, Mode::Input).unwrap();
        assert_eq!(f.filetype(), FileType::Protected);
        assert_eq!(f.read(), Ok(vec![1, 2]));
    }
}
