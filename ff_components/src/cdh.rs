use crate::clock::{ClockGenerator, Component};

/// On-board computer. Runs every tick and counts its cycles.
#[derive(Clone, Debug, Default)]
pub struct OnBoardComputer {
    cycle_count: u64,
}

impl OnBoardComputer {
    pub const NAME: &'static str = "OBC";

    pub fn new(clock: &mut ClockGenerator) -> Self {
        clock.register(Self::NAME, 1);
        Self::default()
    }

    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }
}

impl Component for OnBoardComputer {
    fn prescaler(&self) -> u64 {
        1
    }

    fn main_routine(&mut self, _count: u64) {
        self.cycle_count += 1;
    }
}
