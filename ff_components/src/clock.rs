/// Counts component ticks and records which components run at which rate.
#[derive(Clone, Debug, Default)]
pub struct ClockGenerator {
    timer_count: u64,
    registrations: Vec<ClockRegistration>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClockRegistration {
    pub name: String,
    pub prescaler: u64,
}

impl ClockGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &str, prescaler: u64) {
        log::debug!("'{name}' registered with prescaler {prescaler}");
        self.registrations.push(ClockRegistration {
            name: name.to_string(),
            prescaler,
        });
    }

    pub fn registrations(&self) -> &[ClockRegistration] {
        &self.registrations
    }

    pub fn timer_count(&self) -> u64 {
        self.timer_count
    }

    pub fn tick(&mut self) {
        self.timer_count += 1;
    }
}

/// True when a component with `prescaler` runs on tick `count`.
pub fn is_due(count: u64, prescaler: u64) -> bool {
    count % prescaler.max(1) == 0
}

/// A component run by the clock every `prescaler` ticks.
pub trait Component {
    fn prescaler(&self) -> u64;
    fn main_routine(&mut self, count: u64);

    fn tick(&mut self, count: u64) {
        if is_due(count, self.prescaler()) {
            self.main_routine(count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        prescaler: u64,
        runs: Vec<u64>,
    }

    impl Component for Counter {
        fn prescaler(&self) -> u64 {
            self.prescaler
        }

        fn main_routine(&mut self, count: u64) {
            self.runs.push(count);
        }
    }

    #[test]
    fn test_component_runs_every_prescaler_ticks() {
        let mut clock = ClockGenerator::new();
        let mut counter = Counter {
            prescaler: 3,
            runs: Vec::new(),
        };
        clock.register("counter", counter.prescaler);
        for _ in 0..10 {
            counter.tick(clock.timer_count());
            clock.tick();
        }
        assert_eq!(counter.runs, vec![0, 3, 6, 9]);
        assert_eq!(clock.timer_count(), 10);
        assert_eq!(
            clock.registrations(),
            &[ClockRegistration {
                name: "counter".to_string(),
                prescaler: 3
            }]
        );
    }

    #[test]
    fn test_zero_prescaler_runs_every_tick() {
        assert!((0..5).all(|count| is_due(count, 0)));
    }
}
