#[derive(Debug)]
struct Pending<T> {
    due: f64,
    task: T,
}

/// Deferred tasks, due on the engine clock.
///
/// Tasks own their payload. Popping or draining a task moves it out, so a
/// task can only ever be handed back once.
#[derive(Debug)]
pub struct Scheduler<T> {
    pending: Vec<Pending<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
        }
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: f64, task: T) {
        // Sorted by due time; ties keep scheduling order.
        let index = self.pending.partition_point(|p| p.due <= due);
        self.pending.insert(index, Pending { due, task });
    }

    /// Take every task due at or before `now`, earliest first.
    pub fn pop_due(&mut self, now: f64) -> Vec<T> {
        let count = self.pending.partition_point(|p| p.due <= now);
        self.pending.drain(..count).map(|p| p.task).collect()
    }

    /// Take every pending task regardless of due time. Drained tasks never fire.
    pub fn drain(&mut self) -> Vec<T> {
        self.pending.drain(..).map(|p| p.task).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, &T)> {
        self.pending.iter().map(|p| (p.due, &p.task))
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_in_due_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(0.5, "late");
        scheduler.schedule(0.1, "early");
        scheduler.schedule(0.3, "middle");

        assert_eq!(scheduler.pop_due(0.4), vec!["early", "middle"]);
        assert_eq!(scheduler.len(), 1);
    }

    #[test]
    fn tasks_fire_at_most_once() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(0.2, 7);

        assert!(scheduler.pop_due(0.1).is_empty());
        assert_eq!(scheduler.pop_due(0.2), vec![7]);
        assert!(scheduler.pop_due(10.0).is_empty());
        assert!(scheduler.is_empty());
    }

    #[test]
    fn equal_due_times_keep_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(0.2, 'a');
        scheduler.schedule(0.2, 'b');
        scheduler.schedule(0.1, 'c');

        let due: Vec<_> = scheduler.iter().map(|(due, &t)| (due, t)).collect();
        assert_eq!(due, vec![(0.1, 'c'), (0.2, 'a'), (0.2, 'b')]);
    }

    #[test]
    fn drained_tasks_never_fire() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(0.2, 'a');
        scheduler.schedule(0.4, 'b');

        assert_eq!(scheduler.drain(), vec!['a', 'b']);
        assert!(scheduler.pop_due(1.0).is_empty());
    }
}
