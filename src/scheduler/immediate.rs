use super::{Scheduler, Task};

/// Runs every task inline, on the thread that schedules it.
///
/// Useful for deterministic tests. Long continuation chains settled on an
/// `Immediate` scheduler run recursively on the settling thread's stack.
#[derive(Debug, Clone, Copy, Default)]
pub struct Immediate;

impl Scheduler for Immediate {
    fn schedule(&self, task: Task) {
        task();
    }
}
