/// ## Interpreter settings

#[derive(Clone, Debug)]
pub struct Config {
    /// Lines above this number are hidden from LIST and SAVE ,A
    pub(crate) max_list_line: u32,
    /// Protected programs may be loaded and then neither listed nor saved
    pub(crate) allow_protect: bool,
    /// POKE into program memory changes the program
    pub(crate) allow_code_poke: bool,
    /// Memory address of the program's first byte
    pub(crate) code_start: usize,
    /// Highest file number for OPEN
    pub(crate) max_files: u8,
    /// Recognise the DEBUG keyword
    pub(crate) debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_list_line: 65530,
            allow_protect: false,
            allow_code_poke: false,
            code_start: 0x126E,
            max_files: 3,
            debug: false,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_list_line(mut self, value: u32) -> Self {
        self.max_list_line = value;
        self
    }

    pub fn allow_protect(mut self, value: bool) -> Self {
        self.allow_protect = value;
        self
    }

    pub fn allow_code_poke(mut self, value: bool) -> Self {
        self.allow_code_poke = value;
        self
    }

    pub fn code_start(mut self, value: usize) -> Self {
        self.code_start = value;
        self
    }

    pub fn max_files(mut self, value: u8) -> Self {
        self.max_files = value;
        self
    }

    pub fn debug(mut self, value: bool) -> Self {
        self.debug = value;
        self
    }
}
