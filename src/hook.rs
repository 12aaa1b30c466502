//! Hook delimiter configuration: [`HookPair`] and [`HookConfig`].
//!
//! A `HookConfig` is the per-source record of which byte strings open a
//! macro, close it, escape a byte, and (in multi-hook mode) suspend a
//! hook-end match. It is deep-copied onto every newly pushed `InputSource`
//! from its parent.

use crate::error::{MucglyError, Result};

/// Maximum number of entries a multi-hook table may hold.
pub const MAX_MULTI_HOOKS: usize = 127;

/// One `(begin, end, suspend?)` delimiter triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookPair {
    pub beg: Vec<u8>,
    pub end: Vec<u8>,
    pub susp: Option<Vec<u8>>,
}

impl HookPair {
    pub fn new(beg: impl Into<Vec<u8>>, end: impl Into<Vec<u8>>, susp: Option<Vec<u8>>) -> Self {
        HookPair { beg: beg.into(), end: end.into(), susp }
    }
}

/// Which delimiter slot a single-mode mutation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookSlot {
    Beg,
    End,
    Esc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum HookMode {
    Single(HookPair),
    Multi(Vec<HookPair>),
}

/// Per-source delimiter configuration, plus the derived first-byte bitmap
/// used to screen most input bytes away from the hook-matching probes in
/// O(1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookConfig {
    mode: HookMode,
    esc: Vec<u8>,
    eater: Option<Vec<u8>>,
    esc_eq_beg: bool,
    esc_eq_end: bool,
    bitmap: [bool; 256],
}

impl HookConfig {
    /// The baked-in defaults: `hookbeg="-<"`, `hookend=">-"`, `hookesc="\"`,
    /// no eater, single mode.
    pub fn default_template() -> Self {
        let mut cfg = HookConfig {
            mode: HookMode::Single(HookPair::new(b"-<".to_vec(), b">-".to_vec(), None)),
            esc: b"\\".to_vec(),
            eater: None,
            esc_eq_beg: false,
            esc_eq_end: false,
            bitmap: [false; 256],
        };
        cfg.recompute();
        cfg
    }

    pub fn is_multi(&self) -> bool {
        matches!(self.mode, HookMode::Multi(_))
    }

    pub fn esc(&self) -> &[u8] {
        &self.esc
    }

    pub fn eater(&self) -> Option<&[u8]> {
        self.eater.as_deref()
    }

    pub fn esc_eq_beg(&self) -> bool {
        self.esc_eq_beg
    }

    pub fn esc_eq_end(&self) -> bool {
        self.esc_eq_end
    }

    /// The single-mode delimiter pair. `None` in multi mode.
    pub fn single_pair(&self) -> Option<&HookPair> {
        match &self.mode {
            HookMode::Single(pair) => Some(pair),
            HookMode::Multi(_) => None,
        }
    }

    pub fn hookbeg(&self) -> Option<&[u8]> {
        self.single_pair().map(|p| p.beg.as_slice())
    }

    pub fn hookend(&self) -> Option<&[u8]> {
        self.single_pair().map(|p| p.end.as_slice())
    }

    /// Candidate begin delimiters in match-priority order: the one pair in
    /// single mode, or the multi-hook vector in insertion order.
    pub fn beg_candidates(&self) -> Vec<&HookPair> {
        match &self.mode {
            HookMode::Single(pair) => vec![pair],
            HookMode::Multi(pairs) => pairs.iter().collect(),
        }
    }

    pub fn bitmap_has(&self, byte: u8) -> bool {
        self.bitmap[byte as usize]
    }

    /// `true` if `d[0]`'s bit is set, for every delimiter reachable from the
    /// current configuration. Used by tests to check invariant 3 of the
    /// testable-properties list.
    #[cfg(test)]
    fn bitmap_is_complete(&self) -> bool {
        let mut expected = [false; 256];
        for pair in self.beg_candidates() {
            expected[pair.beg[0] as usize] = true;
            expected[pair.end[0] as usize] = true;
            if let Some(susp) = &pair.susp {
                expected[susp[0] as usize] = true;
            }
        }
        expected[self.esc[0] as usize] = true;
        expected == self.bitmap
    }

    fn recompute(&mut self) {
        self.bitmap = [false; 256];
        match &self.mode {
            HookMode::Single(pair) => {
                self.bitmap[pair.beg[0] as usize] = true;
                self.bitmap[pair.end[0] as usize] = true;
                self.esc_eq_beg = self.esc == pair.beg;
                self.esc_eq_end = self.esc == pair.end;
            }
            HookMode::Multi(pairs) => {
                for pair in pairs {
                    self.bitmap[pair.beg[0] as usize] = true;
                    self.bitmap[pair.end[0] as usize] = true;
                    if let Some(susp) = &pair.susp {
                        self.bitmap[susp[0] as usize] = true;
                    }
                }
                self.esc_eq_beg = false;
                self.esc_eq_end = false;
            }
        }
        self.bitmap[self.esc[0] as usize] = true;
    }

    /// Set one of `beg`/`end`/`esc`. Setting `beg` or `end` while in multi
    /// mode drops back to single mode, clearing the multi-hook vector.
    pub fn set_hook(&mut self, slot: HookSlot, value: Vec<u8>) -> Result<()> {
        match slot {
            HookSlot::Esc => {
                if let HookMode::Multi(pairs) = &self.mode {
                    if pairs.iter().any(|p| p.beg == value || p.end == value) {
                        return Err(MucglyError::MultiHookEscConflict);
                    }
                }
                self.esc = value;
            }
            HookSlot::Beg => {
                let pair = self.collapse_to_single();
                pair.beg = value;
            }
            HookSlot::End => {
                let pair = self.collapse_to_single();
                pair.end = value;
            }
        }
        self.recompute();
        Ok(())
    }

    /// Set both `beg` and `end` at once.
    pub fn set_hook_pair(&mut self, beg: Vec<u8>, end: Vec<u8>) -> Result<()> {
        let pair = self.collapse_to_single();
        pair.beg = beg;
        pair.end = end;
        self.recompute();
        Ok(())
    }

    /// If already in multi mode, leave it untouched; otherwise this is a
    /// no-op collapse (single stays single) — the method exists to give
    /// `set_hook`/`set_hook_pair` a single mutable `HookPair` to write into,
    /// allocating a fresh single pair if the config was somehow left in a
    /// malformed state.
    fn collapse_to_single(&mut self) -> &mut HookPair {
        if let HookMode::Multi(_) = &self.mode {
            self.mode = HookMode::Single(HookPair::new(Vec::new(), Vec::new(), None));
        }
        match &mut self.mode {
            HookMode::Single(pair) => pair,
            HookMode::Multi(_) => unreachable!(),
        }
    }

    pub fn set_eater(&mut self, value: Option<Vec<u8>>) {
        self.eater = value;
    }

    /// Append a multi-hook entry, switching to multi mode on the first call.
    pub fn add_multi(&mut self, beg: Vec<u8>, end: Vec<u8>, susp: Option<Vec<u8>>) -> Result<()> {
        if self.esc == beg || self.esc == end {
            return Err(MucglyError::MultiHookEscConflict);
        }
        if let HookMode::Single(_) = &self.mode {
            self.mode = HookMode::Multi(Vec::new());
        }
        let pairs = match &mut self.mode {
            HookMode::Multi(pairs) => pairs,
            HookMode::Single(_) => unreachable!(),
        };
        if pairs.len() >= MAX_MULTI_HOOKS {
            return Err(MucglyError::MultiHookLimitExceeded);
        }
        pairs.push(HookPair::new(beg, end, susp));
        self.recompute();
        Ok(())
    }
}
