/// State of one event trap, such as a timer or key press handler.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Trap {
    pub enabled: bool,
    pub stopped: bool,
    pub triggered: bool,
    pub gosub: Option<u16>,
}

/// ## Event traps checked between statements
///
/// Traps are registered by whatever drives the interpreter. A triggered,
/// enabled and not stopped trap with a handler line causes a GOSUB to that
/// line before the next statement runs. The trap stays stopped until the
/// handler returns.

#[derive(Debug, Default)]
pub struct Events {
    traps: Vec<Trap>,
    suspend_all: bool,
    active: bool,
}

impl Events {
    pub fn new() -> Events {
        Events::default()
    }

    /// Registers a trap and returns its index.
    pub fn add(&mut self, gosub: Option<u16>) -> usize {
        self.traps.push(Trap {
            gosub,
            ..Trap::default()
        });
        self.traps.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&Trap> {
        self.traps.get(index)
    }

    pub fn set_gosub(&mut self, index: usize, gosub: Option<u16>) {
        if let Some(trap) = self.traps.get_mut(index) {
            trap.gosub = gosub;
        }
    }

    /// ON enables, OFF disables, STOP holds triggers until enabled again.
    pub fn command(&mut self, index: usize, enabled: bool, stopped: bool) {
        if let Some(trap) = self.traps.get_mut(index) {
            trap.enabled = enabled;
            trap.stopped = stopped;
            if !enabled {
                trap.triggered = false;
            }
        }
    }

    pub fn trigger(&mut self, index: usize) {
        if let Some(trap) = self.traps.get_mut(index) {
            if trap.enabled || trap.stopped {
                trap.triggered = true;
            }
        }
    }

    pub fn suspend(&mut self, suspend: bool) {
        self.suspend_all = suspend;
    }

    pub fn is_suspended(&self) -> bool {
        self.suspend_all
    }

    /// Traps only fire while a program runs.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Disables every trap, as RUN and CLEAR do.
    pub fn reset(&mut self) {
        for trap in self.traps.iter_mut() {
            *trap = Trap {
                gosub: trap.gosub,
                ..Trap::default()
            };
        }
        self.suspend_all = false;
    }

    /// Takes the first trap ready to fire and stops it until its handler
    /// returns.
    pub(crate) fn next_pending(&mut self) -> Option<(usize, u16)> {
        if self.suspend_all || !self.active {
            return None;
        }
        for (index, trap) in self.traps.iter_mut().enumerate() {
            if trap.enabled && trap.triggered && !trap.stopped {
                if let Some(line) = trap.gosub {
                    trap.triggered = false;
                    trap.stopped = true;
                    return Some((index, line));
                }
            }
        }
        None
    }

    /// Handler for the trap has returned.
    pub(crate) fn release(&mut self, index: usize) {
        if let Some(trap) = self.traps.get_mut(index) {
            trap.stopped = false;
        }
    }
}
