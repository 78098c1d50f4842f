use super::file::{FileHandle, FileType};
use super::Config;
use crate::error;
use crate::lang::{protect, token, Error, Reader, Tokeniser};
use std::collections::BTreeMap;
use tracing::{debug, warn};

type Result<T> = std::result::Result<T, Error>;

/// Index key of the end of the program.
pub const END_OF_PROGRAM: u32 = 65536;

/// Result of RENUM: the old to new line mapping and every jump to a line
/// that does not exist, with the line it appears in.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Renumbered {
    pub mapping: BTreeMap<u32, u32>,
    pub undefined: Vec<(u16, Option<u32>)>,
}

/// ## Tokenised program memory
///
/// The program is one byte stream. Each line is `\0`, the two byte memory
/// address of the next line, the two byte line number and the tokens.
/// The stream ends with `\0\0\0`. The line number index maps every line
/// to the offset of its leading `\0` and is kept in step with the stream
/// by every edit.

#[derive(Debug)]
pub struct Program {
    bytecode: Vec<u8>,
    line_numbers: BTreeMap<u32, usize>,
    protected: bool,
    last_stored: Option<u32>,
    max_list_line: u32,
    allow_protect: bool,
    allow_code_poke: bool,
    code_start: usize,
    tokeniser: Tokeniser,
}

impl Default for Program {
    fn default() -> Program {
        Program::new(&Config::default())
    }
}

impl Program {
    pub fn new(config: &Config) -> Program {
        let mut program = Program {
            bytecode: vec![],
            line_numbers: BTreeMap::new(),
            protected: false,
            last_stored: None,
            max_list_line: config.max_list_line,
            allow_protect: config.allow_protect,
            allow_code_poke: config.allow_code_poke,
            code_start: config.code_start,
            tokeniser: Tokeniser::new(config.debug),
        };
        program.erase();
        program
    }

    pub fn erase(&mut self) {
        self.bytecode = vec![0, 0, 0];
        self.line_numbers.clear();
        self.line_numbers.insert(END_OF_PROGRAM, 0);
        self.protected = false;
        self.last_stored = None;
    }

    pub fn bytecode(&self) -> &[u8] {
        &self.bytecode
    }

    pub fn tokeniser(&self) -> &Tokeniser {
        &self.tokeniser
    }

    pub fn is_protected(&self) -> bool {
        self.protected
    }

    pub fn last_stored(&self) -> Option<u32> {
        self.last_stored
    }

    pub fn code_start(&self) -> usize {
        self.code_start
    }

    pub fn line_offset(&self, line_number: u32) -> Option<usize> {
        self.line_numbers.get(&line_number).copied()
    }

    pub fn contains_line(&self, line_number: u32) -> bool {
        line_number < END_OF_PROGRAM && self.line_numbers.contains_key(&line_number)
    }

    pub fn end_offset(&self) -> usize {
        self.line_offset(END_OF_PROGRAM).unwrap_or(0)
    }

    /// Line numbers in ascending order, without the end marker.
    pub fn line_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.line_numbers
            .keys()
            .copied()
            .filter(|n| *n < END_OF_PROGRAM)
    }

    /// The line holding the byte at `pos`: the highest numbered line that
    /// starts at or before it.
    pub fn get_line_number(&self, pos: usize) -> Option<u32> {
        self.line_numbers
            .iter()
            .filter(|(_, &offset)| offset <= pos)
            .map(|(&n, _)| n)
            .max()
    }

    /// Inserts, replaces or deletes one tokenised line. A line with
    /// nothing after its number deletes.
    pub fn store_line(&mut self, line: &[u8]) -> Result<()> {
        if self.protected {
            return Err(error!(IllegalFunctionCall));
        }
        let mut r = Reader::at(line, 1);
        let line_number = match r.parse_line_number() {
            Some(n) => n as u32,
            None => return Err(error!(SyntaxError)),
        };
        let empty = matches!(r.skip_white(), None | Some(0));
        let (pos, after, deletable) = self.find_range(line_number, line_number);
        if empty && deletable.is_empty() {
            return Err(error!(UndefinedLine));
        }
        let body = if empty { vec![] } else { line.to_vec() };
        let delta = body.len() as isize - (after - pos) as isize;
        self.bytecode.splice(pos..after, body);
        self.shift_index(&deletable, line_number, delta);
        if !empty {
            self.line_numbers.insert(line_number, pos);
        }
        self.relink(pos);
        self.last_stored = Some(line_number);
        debug!(line_number, delete = empty, "stored line");
        Ok(())
    }

    /// Removes the lines in `from..=to`. The defaults are the first line
    /// and 65535.
    pub fn delete(&mut self, from: Option<u32>, to: Option<u32>) -> Result<()> {
        let from = match from {
            Some(n) => n,
            None => self.line_numbers.keys().next().copied().unwrap_or(0),
        };
        let to = to.unwrap_or(65535);
        let (start, after, deletable) = self.find_range(from, to);
        if deletable.is_empty() {
            return Err(error!(IllegalFunctionCall));
        }
        self.bytecode.drain(start..after);
        self.shift_index(&deletable, to, -((after - start) as isize));
        self.relink(start);
        debug!(from, to, count = deletable.len(), "deleted lines");
        Ok(())
    }

    fn find_range(&self, from: u32, to: u32) -> (usize, usize, Vec<u32>) {
        let after = self
            .line_numbers
            .range(to.saturating_add(1)..)
            .next()
            .map(|(_, &p)| p)
            .unwrap_or(self.bytecode.len());
        if from > to {
            return (after, after, vec![]);
        }
        let deletable: Vec<u32> = self.line_numbers.range(from..=to).map(|(&n, _)| n).collect();
        let start = match deletable.first() {
            Some(n) => self.line_offset(*n).unwrap_or(after),
            None => after,
        };
        (start, after, deletable)
    }

    fn shift_index(&mut self, deletable: &[u32], above: u32, delta: isize) {
        for n in deletable {
            self.line_numbers.remove(n);
        }
        for (_, offset) in self.line_numbers.range_mut(above.saturating_add(1)..) {
            *offset = (*offset as isize + delta) as usize;
        }
    }

    /// Rewrites the next line addresses of every line from `pos` on.
    fn relink(&mut self, mut pos: usize) {
        loop {
            let mut r = Reader::at(&self.bytecode, pos + 1);
            if r.parse_line_number().is_none() {
                break;
            }
            if r.skip_to(&[0]).is_none() {
                break;
            }
            let next = r.pos();
            let addr = ((self.code_start + 1 + next) & 0xFFFF) as u16;
            self.bytecode[pos + 1..pos + 3].copy_from_slice(&addr.to_le_bytes());
            pos = next;
        }
    }

    /// Scans the whole stream to rebuild the index and the next line
    /// addresses, then seals the end.
    pub fn rebuild_index(&mut self) {
        let mut index = BTreeMap::new();
        let mut pos = 0;
        loop {
            let mut r = Reader::at(&self.bytecode, pos + 1);
            let line_number = match r.parse_line_number() {
                Some(n) => n as u32,
                None => break,
            };
            index.insert(line_number, pos);
            r.skip_to(&[0]);
            pos = r.pos();
        }
        self.bytecode.truncate(pos);
        self.bytecode.extend_from_slice(&[0, 0, 0]);
        index.insert(END_OF_PROGRAM, pos);
        self.line_numbers = index;
        self.relink(0);
        debug!(lines = self.line_numbers.len() - 1, "rebuilt line index");
    }

    /// Renumbers lines from `start` on, beginning at `new` in increments
    /// of `step`, and rewrites the jumps to them.
    pub fn renum(&mut self, new: Option<u32>, start: Option<u32>, step: Option<u32>) -> Result<Renumbered> {
        let mut next = new.unwrap_or(10);
        let start = start.unwrap_or(0);
        let step = step.unwrap_or(10);
        if let Some((&below, _)) = self.line_numbers.range(..start).next_back() {
            if next <= below {
                return Err(error!(IllegalFunctionCall));
            }
        }
        let old_lines: Vec<u32> = self
            .line_numbers
            .range(start..END_OF_PROGRAM)
            .map(|(&n, _)| n)
            .collect();
        if step == 0 && old_lines.len() > 1 {
            return Err(error!(IllegalFunctionCall));
        }
        let mut renumbered = Renumbered::default();
        for old in old_lines {
            if old < 65535 && next > 65529 {
                return Err(error!(IllegalFunctionCall));
            }
            renumbered.mapping.insert(old, next);
            next += step;
        }
        for (old, new) in &renumbered.mapping {
            if let Some(offset) = self.line_offset(*old) {
                let new = (*new as u16).to_le_bytes();
                self.bytecode[offset + 3..offset + 5].copy_from_slice(&new);
            }
        }
        let mut pos = 0;
        loop {
            let mut r = Reader::at(&self.bytecode, pos);
            if r.skip_to_read(&[token::T_UINT]).is_none() {
                break;
            }
            let at = r.pos();
            let jump = match r.read_u16() {
                Some(n) => n,
                None => break,
            };
            pos = at + 2;
            if jump == 0 && preceded_by_error_goto(&self.bytecode, at - 1) {
                continue;
            }
            let target = match renumbered.mapping.get(&(jump as u32)) {
                Some(&n) => n as u16,
                None => {
                    if !self.line_numbers.contains_key(&(jump as u32)) {
                        let line = self
                            .get_line_number(at - 1)
                            .map(|n| renumbered.mapping.get(&n).copied().unwrap_or(n));
                        warn!(jump, ?line, "renumbered program jumps to undefined line");
                        renumbered.undefined.push((jump, line));
                    }
                    jump
                }
            };
            self.bytecode[at..at + 2].copy_from_slice(&target.to_le_bytes());
        }
        let mut index = BTreeMap::new();
        for (&n, &offset) in &self.line_numbers {
            let n = renumbered.mapping.get(&n).copied().unwrap_or(n);
            index.insert(n, offset);
        }
        self.line_numbers = index;
        if let Some((_, &last)) = renumbered.mapping.iter().next_back() {
            self.last_stored = Some(last);
        }
        Ok(renumbered)
    }

    /// Replaces the program with the contents of `file`.
    pub fn load(&mut self, file: &mut dyn FileHandle, rebuild: bool) -> Result<()> {
        self.erase();
        let filetype = file.filetype();
        match filetype {
            FileType::Binary => {
                let data = file.read()?;
                self.bytecode.truncate(1);
                self.bytecode.extend(data);
            }
            FileType::Protected => {
                let data = protect::unprotect(&file.read()?);
                self.bytecode.truncate(1);
                self.bytecode.extend(data);
                self.protected = self.allow_protect;
            }
            FileType::Ascii => self.merge(file)?,
        }
        if rebuild && filetype != FileType::Ascii {
            self.rebuild_index();
        }
        Ok(())
    }

    /// Adds the numbered lines of a text file to the program.
    pub fn merge(&mut self, file: &mut dyn FileHandle) -> Result<()> {
        while let Some(line) = file.read_line()? {
            let tokens = self.tokeniser.tokenise_line(&line);
            match tokens.first() {
                Some(0) => self.store_line(&tokens)?,
                Some(_) => {
                    if !token::is_end_statement(Reader::at(&tokens, 1).skip_white()) {
                        return Err(error!(DirectStatementInFile));
                    }
                }
                None => {}
            }
        }
        Ok(())
    }

    pub fn save(&self, file: &mut dyn FileHandle) -> Result<()> {
        let filetype = file.filetype();
        if self.protected && filetype != FileType::Protected {
            return Err(error!(IllegalFunctionCall));
        }
        let body = self.bytecode.get(1..).unwrap_or(&[]);
        match filetype {
            FileType::Binary => file.write(body),
            FileType::Protected => file.write(&protect::protect(body)),
            FileType::Ascii => {
                let mut r = Reader::at(&self.bytecode, 1);
                loop {
                    let line = self.tokeniser.detokenise_line(&mut r, None);
                    match line.line_number {
                        Some(n) if n as u32 <= self.max_list_line => {
                            file.write_line(&String::from_utf8_lossy(&line.text))?
                        }
                        _ => break,
                    }
                }
                Ok(())
            }
        }
    }

    /// Text of the lines numbered `from..=to`, in the order they are stored.
    pub fn list_lines(&self, from: Option<u32>, to: Option<u32>) -> Result<Vec<String>> {
        if self.protected {
            return Err(error!(IllegalFunctionCall));
        }
        let from = from.unwrap_or(0);
        let to = to.unwrap_or(self.max_list_line).min(self.max_list_line);
        if from > to {
            return Ok(vec![]);
        }
        let mut offsets: Vec<usize> = self
            .line_numbers
            .range(from..=to)
            .filter(|(&n, _)| n < END_OF_PROGRAM)
            .map(|(_, &p)| p)
            .collect();
        offsets.sort_unstable();
        Ok(offsets
            .into_iter()
            .map(|p| {
                let mut r = Reader::at(&self.bytecode, p + 1);
                let line = self.tokeniser.detokenise_line(&mut r, None);
                String::from_utf8_lossy(&line.text).into_owned()
            })
            .collect())
    }

    /// Text of one line and the column matching byte offset `bytepos`.
    pub fn edit(&self, line_number: u32, bytepos: Option<usize>) -> Result<(String, usize)> {
        if self.protected {
            return Err(error!(IllegalFunctionCall));
        }
        let offset = match self.line_offset(line_number) {
            Some(offset) if line_number < END_OF_PROGRAM => offset,
            _ => return Err(error!(UndefinedLine)),
        };
        let mut r = Reader::at(&self.bytecode, offset + 1);
        let line = self.tokeniser.detokenise_line(&mut r, bytepos);
        Ok((String::from_utf8_lossy(&line.text).into_owned(), line.text_pos))
    }

    pub fn peek_byte(&self, address: usize) -> Option<u8> {
        address
            .checked_sub(self.code_start)
            .and_then(|offset| self.bytecode.get(offset))
            .copied()
    }

    pub fn poke_byte(&mut self, address: usize, value: u8) {
        if !self.allow_code_poke {
            warn!(address, "ignored POKE into program code");
            return;
        }
        let offset = match address.checked_sub(self.code_start) {
            Some(offset) => offset,
            None => return,
        };
        if offset >= self.bytecode.len() {
            self.bytecode.resize(offset, 0);
            self.bytecode.push(value);
        } else {
            self.bytecode[offset] = value;
        }
        self.rebuild_index();
    }
}

/// The jump number token at `pos` follows `ERROR GOTO`, spaces allowed.
fn preceded_by_error_goto(code: &[u8], pos: usize) -> bool {
    let mut i = pos;
    let mut previous = || {
        while i > 0 {
            i -= 1;
            if !token::WHITESPACE.contains(&code[i]) {
                return Some(code[i]);
            }
        }
        None
    };
    previous() == Some(token::GOTO) && previous() == Some(token::ERROR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mach::file::{Device, MemoryDevice, Mode};

    fn program(lines: &[&str]) -> Program {
        let mut p = Program::default();
        for line in lines {
            let tokens = p.tokeniser().tokenise_line(line);
            p.store_line(&tokens).unwrap();
        }
        p
    }

    fn check_index(p: &Program) {
        let code = p.bytecode();
        for (&n, &offset) in &p.line_numbers {
            assert_eq!(code[offset], 0);
            if n == END_OF_PROGRAM {
                assert_eq!(&code[offset..offset + 3], &[0, 0, 0]);
                continue;
            }
            let mut r = Reader::at(code, offset + 1);
            assert_eq!(r.parse_line_number(), Some(n as u16));
            r.skip_to(&[0]);
            let addr = u16::from_le_bytes([code[offset + 1], code[offset + 2]]) as usize;
            assert_eq!(addr, p.code_start() + 1 + r.pos());
        }
    }

    #[test]
    fn test_insert_replace_delete() {
        let mut p = program(&["20 PRINT 2", "10 PRINT 1", "30 PRINT 3"]);
        check_index(&p);
        assert_eq!(p.list_lines(None, None).unwrap(), ["10 PRINT 1", "20 PRINT 2", "30 PRINT 3"]);
        let t = p.tokeniser().tokenise_line("20 PRINT \"TWENTY\"");
        p.store_line(&t).unwrap();
        check_index(&p);
        let t = p.tokeniser().tokenise_line("10");
        p.store_line(&t).unwrap();
        check_index(&p);
        assert_eq!(p.list_lines(None, None).unwrap(), ["20 PRINT \"TWENTY\"", "30 PRINT 3"]);
        assert_eq!(p.last_stored(), Some(10));
        let t = p.tokeniser().tokenise_line("15");
        assert_eq!(p.store_line(&t), Err(error!(UndefinedLine)));
    }

    #[test]
    fn test_erase() {
        let mut p = program(&["10 END"]);
        p.erase();
        assert_eq!(p.bytecode(), &[0, 0, 0]);
        assert_eq!(p.end_offset(), 0);
        assert_eq!(p.line_numbers().count(), 0);
    }

    #[test]
    fn test_delete_range() {
        let mut p = program(&["10 A=1", "20 A=2", "30 A=3", "40 A=4"]);
        p.delete(Some(20), Some(30)).unwrap();
        check_index(&p);
        assert_eq!(p.line_numbers().collect::<Vec<_>>(), [10, 40]);
        assert_eq!(p.delete(Some(20), Some(30)), Err(error!(IllegalFunctionCall)));
        p.delete(None, None).unwrap();
        assert_eq!(p.bytecode(), &[0, 0, 0]);
    }

    #[test]
    fn test_get_line_number() {
        let p = program(&["10 A=1", "20 A=2"]);
        let at20 = p.line_offset(20).unwrap();
        assert_eq!(p.get_line_number(at20 + 5), Some(20));
        assert_eq!(p.get_line_number(at20 - 1), Some(10));
    }

    #[test]
    fn test_edit_cursor() {
        let p = program(&["10 PRINT ABC"]);
        let at10 = p.line_offset(10).unwrap();
        let cursor = |target| p.edit(10, Some(at10 + target)).unwrap().1;
        assert_eq!(p.edit(10, None).unwrap().0, "10 PRINT ABC");
        for target in 5..=7 {
            assert_eq!(cursor(target), 9);
        }
        assert_eq!(cursor(8), 10);
        assert_eq!(cursor(9), 11);
    }

    #[test]
    fn test_renum_identity() {
        let mut p = program(&["10 GOTO 30", "20 GOSUB 10", "30 END"]);
        let before = p.bytecode().to_vec();
        let r = p.renum(None, None, None).unwrap();
        assert_eq!(r.mapping.into_iter().collect::<Vec<_>>(), [(10, 10), (20, 20), (30, 30)]);
        assert!(r.undefined.is_empty());
        assert_eq!(p.bytecode(), &before[..]);
    }

    #[test]
    fn test_renum_rewrites_jumps() {
        let mut p = program(&["1 GOTO 3", "2 ON ERROR GOTO 0", "3 IF A THEN 1 ELSE 99"]);
        let r = p.renum(Some(100), None, Some(5)).unwrap();
        assert_eq!(r.undefined, [(99, Some(110))]);
        check_index(&p);
        assert_eq!(
            p.list_lines(None, None).unwrap(),
            ["100 GOTO 110", "105 ON ERROR GOTO 0", "110 IF A THEN 100 ELSE 99"]
        );
        assert_eq!(p.last_stored(), Some(110));
    }

    #[test]
    fn test_renum_limits() {
        let mut p = program(&["10 A=1", "20 A=2"]);
        assert_eq!(p.renum(Some(65529), None, None), Err(error!(IllegalFunctionCall)));
        assert_eq!(p.renum(Some(5), Some(20), None), Err(error!(IllegalFunctionCall)));
        p.renum(Some(15), Some(20), None).unwrap();
        assert_eq!(p.line_numbers().collect::<Vec<_>>(), [10, 15]);
    }

    #[test]
    fn test_binary_and_protected_round_trip() {
        let p = program(&["10 PRINT \"HI\"", "20 GOTO 10"]);
        let mut device = MemoryDevice::new();
        for (name, filetype) in [("B", FileType::Binary), ("P", FileType::Protected)].iter() {
            let mut f = device.open(name, *filetype, Mode::Output).unwrap();
            p.save(f.as_mut()).unwrap();
            f.close().unwrap();
            let mut f = device.open(name, FileType::Ascii, Mode::Input).unwrap();
            let mut q = Program::default();
            q.load(f.as_mut(), true).unwrap();
            check_index(&q);
            assert_eq!(q.bytecode(), p.bytecode());
            assert!(!q.is_protected());
        }
    }

    #[test]
    fn test_protected_program_is_locked() {
        let mut p = Program::new(&Config::new().allow_protect(true));
        let t = p.tokeniser().tokenise_line("10 END");
        p.store_line(&t).unwrap();
        let mut device = MemoryDevice::new();
        let mut f = device.open("P", FileType::Protected, Mode::Output).unwrap();
        p.save(f.as_mut()).unwrap();
        f.close().unwrap();
        let mut f = device.open("P", FileType::Ascii, Mode::Input).unwrap();
        p.load(f.as_mut(), true).unwrap();
        assert!(p.is_protected());
        assert_eq!(p.list_lines(None, None), Err(error!(IllegalFunctionCall)));
        assert_eq!(p.store_line(&t), Err(error!(IllegalFunctionCall)));
        let mut f = device.open("A", FileType::Ascii, Mode::Output).unwrap();
        assert_eq!(p.save(f.as_mut()), Err(error!(IllegalFunctionCall)));
    }

    #[test]
    fn test_ascii_save_and_merge() {
        let p = program(&["10 PRINT 1", "20 'COMMENT"]);
        let mut device = MemoryDevice::new();
        let mut f = device.open("A", FileType::Ascii, Mode::Output).unwrap();
        p.save(f.as_mut()).unwrap();
        f.close().unwrap();
        assert_eq!(device.contents("A").unwrap(), b"10 PRINT 1\r\n20 'COMMENT\r\n".to_vec());
        let mut q = program(&["15 END"]);
        let mut f = device.open("A", FileType::Ascii, Mode::Input).unwrap();
        q.merge(f.as_mut()).unwrap();
        assert_eq!(q.list_lines(None, None).unwrap(), ["10 PRINT 1", "15 END", "20 'COMMENT"]);
        device.insert("D", b"10 END\r\nPRINT\r\n");
        let mut f = device.open("D", FileType::Ascii, Mode::Input).unwrap();
        assert_eq!(q.load(f.as_mut(), true), Err(error!(DirectStatementInFile)));
    }

    #[test]
    fn test_list_range_and_limit() {
        let p = program(&["10 A=1", "20 A=2", "30 A=3"]);
        assert_eq!(p.list_lines(Some(15), None).unwrap(), ["20 A=2", "30 A=3"]);
        let mut q = Program::new(&Config::new().max_list_line(20));
        for line in &["10 A=1", "30 A=3"] {
            let t = q.tokeniser().tokenise_line(line);
            q.store_line(&t).unwrap();
        }
        assert_eq!(q.list_lines(None, Some(40)).unwrap(), ["10 A=1"]);
        assert_eq!(p.list_lines(Some(20), Some(10)).unwrap(), Vec::<String>::new());
        assert_eq!(p.edit(20, None).unwrap().0, "20 A=2");
        assert_eq!(p.edit(25, None), Err(error!(UndefinedLine)));
    }

    #[test]
    fn test_peek_and_poke() {
        let mut p = program(&["10 A=1"]);
        let start = p.code_start();
        assert_eq!(p.peek_byte(start + 3), Some(10));
        p.poke_byte(start + 3, 20);
        assert_eq!(p.peek_byte(start + 3), Some(10));
        let mut q = Program::new(&Config::new().allow_code_poke(true));
        let t = q.tokeniser().tokenise_line("10 A=1");
        q.store_line(&t).unwrap();
        q.poke_byte(start + 3, 20);
        assert_eq!(q.line_numbers().collect::<Vec<_>>(), [20]);
        check_index(&q);
    }
}
