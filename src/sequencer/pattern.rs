// Pattern - on/off steps per instrument for one bar of sixteenths

use super::instrument::Instrument;

/// Number of steps in one bar
pub const STEPS: usize = 16;

/// Index of a step inside the bar, in `0..STEPS`
pub type StepIndex = usize;

/// One row of sixteen on/off cells
///
/// Rows have a fixed length: edits flip cells in place and out-of-range
/// steps are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepRow([bool; STEPS]);

impl StepRow {
    pub const fn new() -> Self {
        Self([false; STEPS])
    }

    /// Build a row from any bool sequence, padding or truncating to STEPS
    pub fn from_cells<I: IntoIterator<Item = bool>>(cells: I) -> Self {
        let mut row = Self::new();
        for (slot, value) in row.0.iter_mut().zip(cells) {
            *slot = value;
        }
        row
    }

    #[inline]
    pub fn get(&self, step: StepIndex) -> bool {
        self.0.get(step).copied().unwrap_or(false)
    }

    pub fn set(&mut self, step: StepIndex, on: bool) {
        if let Some(cell) = self.0.get_mut(step) {
            *cell = on;
        }
    }

    /// Flip one cell, returns the new value (None when step is out of range)
    pub fn toggle(&mut self, step: StepIndex) -> Option<bool> {
        let cell = self.0.get_mut(step)?;
        *cell = !*cell;
        Some(*cell)
    }

    pub fn clear(&mut self) {
        self.0 = [false; STEPS];
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|on| !on)
    }

    pub fn active_steps(&self) -> impl Iterator<Item = StepIndex> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(step, &on)| on.then_some(step))
    }

    pub fn cells(&self) -> &[bool; STEPS] {
        &self.0
    }
}

/// Accent row shared by every instrument of every bank
pub type AccentPattern = StepRow;

/// One row per catalog instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pattern {
    rows: [StepRow; Instrument::COUNT],
}

impl Pattern {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row(&self, instrument: Instrument) -> &StepRow {
        &self.rows[instrument.index()]
    }

    pub fn row_mut(&mut self, instrument: Instrument) -> &mut StepRow {
        &mut self.rows[instrument.index()]
    }

    #[inline]
    pub fn is_active(&self, instrument: Instrument, step: StepIndex) -> bool {
        self.row(instrument).get(step)
    }

    /// Instruments sounding on `step`, in catalog order
    pub fn instruments_at(&self, step: StepIndex) -> impl Iterator<Item = Instrument> + '_ {
        Instrument::ALL
            .into_iter()
            .filter(move |&instrument| self.is_active(instrument, step))
    }

    pub fn clear(&mut self) {
        for row in &mut self.rows {
            row.clear();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(StepRow::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_flips_and_restores() {
        let mut row = StepRow::new();
        assert_eq!(row.toggle(3), Some(true));
        assert!(row.get(3));
        assert_eq!(row.toggle(3), Some(false));
        assert!(row.is_empty());
    }

    #[test]
    fn test_out_of_range_step_is_ignored() {
        let mut row = StepRow::new();
        assert_eq!(row.toggle(STEPS), None);
        row.set(99, true);
        assert!(!row.get(99));
        assert!(row.is_empty());
    }

    #[test]
    fn test_from_cells_pads_and_truncates() {
        let short = StepRow::from_cells([true, false, true]);
        assert!(short.get(0) && short.get(2));
        assert_eq!(short.active_steps().count(), 2);

        let long = StepRow::from_cells(std::iter::repeat(true).take(40));
        assert_eq!(long.active_steps().count(), STEPS);
    }

    #[test]
    fn test_instruments_at_follows_catalog_order() {
        let mut pattern = Pattern::new();
        pattern.row_mut(Instrument::Ride).set(4, true);
        pattern.row_mut(Instrument::Kick).set(4, true);
        pattern.row_mut(Instrument::Snare).set(5, true);

        let at_four: Vec<_> = pattern.instruments_at(4).collect();
        assert_eq!(at_four, vec![Instrument::Kick, Instrument::Ride]);
    }

    #[test]
    fn test_pattern_clear() {
        let mut pattern = Pattern::new();
        pattern.row_mut(Instrument::Hat).set(0, true);
        assert!(!pattern.is_empty());
        pattern.clear();
        assert!(pattern.is_empty());
    }
}
