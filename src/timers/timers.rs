use super::Instant;
use std::collections::HashMap;
use std::io::Write;
use std::ops::{Deref, DerefMut};
use std::time::Duration;

#[derive(Debug, Default)]
struct InnerTimer {
    start: Option<Instant>,
    elapsed: Duration,
    subtimers: SubTimersMap,
}

impl InnerTimer {
    fn start(&mut self) {
        self.start = Some(Instant::now());
    }

    fn stop(&mut self) {
        if let Some(instant) = self.start.take() {
            self.elapsed += instant.elapsed();
        }
    }
}

#[derive(Debug, Default)]
struct SubTimersMap(HashMap<&'static str, InnerTimer>);

impl Deref for SubTimersMap {
    type Target = HashMap<&'static str, InnerTimer>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
impl DerefMut for SubTimersMap {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl SubTimersMap {
    fn start_subtimer(&mut self, key: &'static str) {
        let t = self.0.entry(key).or_default();
        t.start();
    }

    fn total_time(&self) -> Duration {
        self.values()
            .fold(Duration::ZERO, |acc, t| acc + t.elapsed)
    }

    fn print(&self, out: &mut dyn Write, depth: u8) -> std::io::Result<()> {
        // sorted so that output is stable between runs
        let mut keys: Vec<_> = self.keys().collect();
        keys.sort();
        for key in keys {
            let val = &self[*key];
            let tabs = format!("{: <1$}", "", 4 * depth as usize);
            writeln!(out, "{}{:} : {:?}", tabs, *key, val.elapsed)?;
            val.subtimers.print(out, depth + 1)?;
        }
        Ok(())
    }
}

/// A stack of named, nestable timers.   Use with the `timeit!` macro.
#[derive(Default, Debug)]
pub(crate) struct Timers {
    stack: Vec<&'static str>,
    subtimers: SubTimersMap,
}

impl Timers {
    fn mut_active_timer(&mut self) -> Option<&mut InnerTimer> {
        let (first, rest) = self.stack.split_first()?;

        //first one gets special treatment since self is not
        //an InnerTimer and a common trait would be overkill
        let mut active_timer = self.subtimers.get_mut(first)?;
        for key in rest {
            active_timer = active_timer.subtimers.get_mut(key)?;
        }
        Some(active_timer)
    }

    pub(crate) fn start_as_current(&mut self, key: &'static str) {
        if let Some(active) = self.mut_active_timer() {
            // child of current active timer
            active.subtimers.start_subtimer(key);
        } else {
            // nothing active, create one at root
            self.subtimers.start_subtimer(key);
        }
        self.stack.push(key);
    }

    pub(crate) fn stop_current(&mut self) {
        if let Some(active) = self.mut_active_timer() {
            active.stop();
        }
        self.stack.pop();
    }

    /// Elapsed time of a root level timer
    #[cfg(test)]
    pub(crate) fn elapsed(&self, key: &'static str) -> Duration {
        self.subtimers.get(key).map_or(Duration::ZERO, |t| t.elapsed)
    }

    pub(crate) fn total_time(&self) -> Duration {
        self.subtimers.total_time()
    }

    pub(crate) fn print(&self, out: &mut dyn Write) -> std::io::Result<()> {
        self.subtimers.print(out, 0)
    }
}

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

#[test]
fn test_nested_timers() {
    let mut timers = Timers::default();

    timeit! {timers => "analysis"; {
        timeit! {timers => "kernel"; {
            std::thread::sleep(Duration::from_millis(2));
        }}
        timeit! {timers => "level_order"; {}}
    }}

    assert!(timers.elapsed("analysis") >= Duration::from_millis(2));
    assert_eq!(timers.elapsed("kernel"), Duration::ZERO); // not a root timer
    assert_eq!(timers.total_time(), timers.elapsed("analysis"));

    let mut out = Vec::new();
    timers.print(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("analysis : "));
    assert!(text.contains("    kernel : "));
    assert!(text.contains("    level_order : "));
}
