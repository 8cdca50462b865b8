//! Priority buckets for display
//!
//! Grouping trusts the stored priority of each task; it never re-derives.
//! Tasks with a missing or unknown stored priority fall into `low`.

use crate::task::{Priority, Task};

/// Active tasks bucketed by stored priority, input order preserved per bucket
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PriorityGroups {
    critical: Vec<Task>,
    high: Vec<Task>,
    medium: Vec<Task>,
    low: Vec<Task>,
}

impl PriorityGroups {
    pub fn from_tasks<'a, I>(tasks: I) -> Self
    where
        I: IntoIterator<Item = &'a Task>,
    {
        let mut groups = Self::default();
        for task in tasks.into_iter().filter(|t| t.is_active()) {
            let tier = task.stored_priority().unwrap_or(Priority::Low);
            groups.bucket_mut(tier).push(task.clone());
        }
        groups
    }

    pub fn bucket(&self, priority: Priority) -> &[Task] {
        match priority {
            Priority::Critical => &self.critical,
            Priority::High => &self.high,
            Priority::Medium => &self.medium,
            Priority::Low => &self.low,
        }
    }

    fn bucket_mut(&mut self, priority: Priority) -> &mut Vec<Task> {
        match priority {
            Priority::Critical => &mut self.critical,
            Priority::High => &mut self.high,
            Priority::Medium => &mut self.medium,
            Priority::Low => &mut self.low,
        }
    }

    /// Bucket sizes in tier order
    pub fn counts(&self) -> [(Priority, usize); 4] {
        Priority::ALL.map(|p| (p, self.bucket(p).len()))
    }

    pub fn total(&self) -> usize {
        Priority::ALL.iter().map(|p| self.bucket(*p).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Iterate buckets from critical to low
    pub fn iter(&self) -> impl Iterator<Item = (Priority, &[Task])> {
        Priority::ALL.into_iter().map(move |p| (p, self.bucket(p)))
    }
}
