use std::fmt;

/// Record counts shown beside a list.
///
/// `total` comes from the item-count side channel and is informational only;
/// pagination never consults it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordCounter {
    pub total: usize,
    pub loaded: usize,
    pub shown: usize,
    pub selected: usize,
}

impl RecordCounter {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl fmt::Display for RecordCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} total, {} loaded, {} shown",
            self.total, self.loaded, self.shown
        )?;
        if self.selected > 0 {
            write!(f, ", {} selected", self.selected)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_hides_zero_selection() {
        let mut counter = RecordCounter {
            total: 40,
            loaded: 20,
            shown: 3,
            selected: 0,
        };
        assert_eq!(counter.to_string(), "40 total, 20 loaded, 3 shown");
        counter.selected = 2;
        assert_eq!(counter.to_string(), "40 total, 20 loaded, 3 shown, 2 selected");
    }

    #[test]
    fn reset_zeroes_everything() {
        let mut counter = RecordCounter {
            total: 1,
            loaded: 2,
            shown: 3,
            selected: 4,
        };
        counter.reset();
        assert_eq!(counter, RecordCounter::default());
    }
}
