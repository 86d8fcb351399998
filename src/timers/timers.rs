use std::collections::BTreeMap;
use std::io::Write;
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct PhaseTimer {
    start: Option<Instant>,
    elapsed: Duration,
    children: PhaseMap,
}

impl PhaseTimer {
    fn start(&mut self) {
        self.start = Some(Instant::now());
    }

    fn stop(&mut self) {
        if let Some(instant) = self.start.take() {
            self.elapsed += instant.elapsed();
        }
    }

    // bank the running time and pause every running descendant
    fn suspend(&mut self) {
        if let Some(instant) = self.start {
            self.elapsed += instant.elapsed();
            self.children.suspend();
        }
    }

    fn resume(&mut self) {
        if self.start.is_some() {
            self.start = Some(Instant::now());
            self.children.resume();
        }
    }
}

// ordered so that printed reports are stable
#[derive(Debug, Default)]
struct PhaseMap(BTreeMap<&'static str, PhaseTimer>);

impl PhaseMap {
    fn start(&mut self, key: &'static str) {
        self.0.entry(key).or_default().start();
    }

    fn suspend(&mut self) {
        self.0.values_mut().for_each(|t| t.suspend());
    }

    fn resume(&mut self) {
        self.0.values_mut().for_each(|t| t.resume());
    }

    fn find(&self, key: &str) -> Option<&PhaseTimer> {
        self.0
            .get(key)
            .or_else(|| self.0.values().find_map(|t| t.children.find(key)))
    }

    fn total_time(&self) -> Duration {
        self.0.values().map(|t| t.elapsed).sum()
    }

    fn print(&self, out: &mut impl Write, depth: usize) -> std::io::Result<()> {
        for (key, t) in self.0.iter() {
            writeln!(out, "{:indent$}{} : {:?}", "", key, t.elapsed, indent = 4 * depth)?;
            t.children.print(out, depth + 1)?;
        }
        Ok(())
    }
}

/// Nested wall clock timers for the phases of a solve.
///
/// A timer started while another is running becomes its child, so the
/// report mirrors the call structure (e.g. `solve` containing `x-update`
/// and `consensus`).
#[derive(Default, Debug)]
pub struct Timers {
    stack: Vec<&'static str>,
    phases: PhaseMap,
}

impl Timers {
    fn active_children(&mut self) -> &mut PhaseMap {
        let mut map = &mut self.phases;
        for &key in self.stack.iter() {
            map = &mut map.0.entry(key).or_default().children;
        }
        map
    }

    pub fn reset_timer(&mut self, key: &'static str) {
        self.phases.0.remove(key);
    }

    pub fn start_as_current(&mut self, key: &'static str) {
        self.active_children().start(key);
        self.stack.push(key);
    }

    pub fn stop_current(&mut self) {
        if let Some(key) = self.stack.pop() {
            if let Some(t) = self.active_children().0.get_mut(key) {
                t.stop();
            }
        }
    }

    pub fn suspend(&mut self) {
        self.phases.suspend();
    }

    pub fn resume(&mut self) {
        self.phases.resume();
    }

    /// Accumulated time of the first timer named `key` at any depth.
    /// Zero if no such timer has run.
    pub fn get_time(&self, key: &str) -> Duration {
        self.phases.find(key).map_or(Duration::ZERO, |t| t.elapsed)
    }

    pub fn total_time(&self) -> Duration {
        self.phases.total_time()
    }

    pub fn print(&self, out: &mut impl Write) -> std::io::Result<()> {
        self.phases.print(out, 0)
    }
}

// NB: the body must not return early (e.g. through `?`), or the timer
// is left running on the stack.
macro_rules! timeit {
    ($timer:ident => $key:literal; $($tt:tt)+) => {

        $timer.start_as_current($key);
        $(
            $tt
        )+
        $timer.stop_current();
    }
}
pub(crate) use timeit;

macro_rules! notimeit {
    ($timer:ident; $($tt:tt)+) => {

        $timer.suspend();
        $(
            $tt
        )+
        $timer.resume();
    }
}
pub(crate) use notimeit;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_timers() {
        let mut timers = Timers::default();
        timeit! {timers => "solve"; {
            timeit!{timers => "x-update"; {
                std::thread::sleep(Duration::from_millis(2));
            }}
            notimeit!{timers; {
                std::thread::sleep(Duration::from_millis(2));
            }}
        }}

        let outer = timers.get_time("solve");
        let inner = timers.get_time("x-update");
        assert!(inner >= Duration::from_millis(2));
        assert!(outer >= inner);
        assert_eq!(timers.total_time(), outer);
        assert_eq!(timers.get_time("missing"), Duration::ZERO);

        let mut buf = Vec::new();
        timers.print(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("solve"));
        assert!(text.contains("    x-update"));
    }
}
