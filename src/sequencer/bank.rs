// Pattern banks - four independent patterns plus the shared accent row

use super::instrument::Instrument;
use super::pattern::{AccentPattern, Pattern, StepIndex};

/// Number of pattern banks
pub const NUM_BANKS: usize = 4;

/// Fixed set of banks addressed by index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BankSet {
    banks: [Pattern; NUM_BANKS],
}

impl BankSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, bank: usize) -> Option<&Pattern> {
        self.banks.get(bank)
    }

    pub fn get_mut(&mut self, bank: usize) -> Option<&mut Pattern> {
        self.banks.get_mut(bank)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pattern> {
        self.banks.iter()
    }
}

/// Every pattern of the machine
///
/// Owned by the transport controller; the scheduler only ever sees
/// immutable copies of the current bank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternStore {
    banks: BankSet,
    accents: AccentPattern,
}

impl PatternStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(banks: BankSet, accents: AccentPattern) -> Self {
        Self { banks, accents }
    }

    pub fn banks(&self) -> &BankSet {
        &self.banks
    }

    pub fn bank(&self, bank: usize) -> Option<&Pattern> {
        self.banks.get(bank)
    }

    pub fn accents(&self) -> &AccentPattern {
        &self.accents
    }

    /// Flip one pad, returns the new cell value
    ///
    /// None when the bank or step is out of range (nothing changes).
    pub fn toggle_pad(
        &mut self,
        bank: usize,
        instrument: Instrument,
        step: StepIndex,
    ) -> Option<bool> {
        self.banks.get_mut(bank)?.row_mut(instrument).toggle(step)
    }

    /// Flip one accent cell, returns the new value
    pub fn toggle_accent(&mut self, step: StepIndex) -> Option<bool> {
        self.accents.toggle(step)
    }

    /// Zero one instrument row of a bank
    pub fn clear_row(&mut self, bank: usize, instrument: Instrument) {
        if let Some(pattern) = self.banks.get_mut(bank) {
            pattern.row_mut(instrument).clear();
        }
    }

    /// Zero every row of a bank and the accent row
    ///
    /// Other banks are untouched.
    pub fn clear_bank(&mut self, bank: usize) {
        if let Some(pattern) = self.banks.get_mut(bank) {
            pattern.clear();
            self.accents.clear();
        }
    }
}
