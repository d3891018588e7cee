use std::fmt;

use fxhash::FxHashMap;

use crate::{
    Access, Command, CommandList, FenceHandle, ImageHandle, QueueClass,
    Submission,
};

/// Position of a submission within its queue, counting from one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Stamp {
    pub queue: QueueClass,
    pub seq: u64,
}

impl fmt::Display for Stamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} submission #{}", self.queue, self.seq)
    }
}

/// For each queue, how many of its submissions are known to complete before
/// some point of execution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Clock([u64; 3]);

impl Clock {
    fn join(&mut self, other: &Clock) {
        for (lhs, rhs) in self.0.iter_mut().zip(other.0) {
            *lhs = (*lhs).max(rhs);
        }
    }

    fn covers(&self, stamp: Stamp) -> bool {
        stamp.seq <= self.0[stamp.queue.index()]
    }
}

/// Submission accessing an image that an earlier, unordered submission
/// accesses as well.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hazard {
    pub image: ImageHandle,
    pub previous: Stamp,
}

#[derive(Debug, Default)]
struct ImageAccesses {
    write: Option<Stamp>,

    /// Latest read of each queue since `write`.
    reads: [Option<Stamp>; 3],
}

/// Happens-before bookkeeping of submissions across queues.
///
/// Submissions of the same queue are ordered one after another; across
/// queues only semaphores order them, and the host learns about completed
/// work through fences and idle waits. Two submissions touching the same
/// image (at least one of them writing) must be ordered somehow.
#[derive(Debug, Default)]
pub struct Timeline {
    submitted: [u64; 3],

    /// Clock of the latest submission of each queue, itself included.
    queues: [Clock; 3],

    /// Work the host has seen completing.
    retired: Clock,

    semaphores: FxHashMap<u32, Clock>,
    fences: FxHashMap<u32, Clock>,
    images: FxHashMap<ImageHandle, ImageAccesses>,
}

impl Timeline {
    /// Returns what the submission is ordered after, making sure that covers
    /// every earlier conflicting access.
    pub fn check(
        &self,
        queue: QueueClass,
        commands: &CommandList,
        submission: &Submission,
    ) -> Result<Clock, Hazard> {
        let mut clock = self.queues[queue.index()];

        clock.join(&self.retired);

        for semaphore in &submission.wait_on {
            if let Some(signal) = self.semaphores.get(&semaphore.0) {
                clock.join(signal);
            }
        }

        for (image, access) in Self::accesses(commands) {
            let Some(record) = self.images.get(&image) else {
                continue;
            };

            let reads = match access {
                Access::ReadOnly => &[][..],
                Access::ReadWrite => &record.reads[..],
            };

            let unordered = record
                .write
                .iter()
                .chain(reads.iter().flatten())
                .find(|&&stamp| !clock.covers(stamp));

            if let Some(&previous) = unordered {
                return Err(Hazard { image, previous });
            }
        }

        Ok(clock)
    }

    /// Registers a submission that passed [`Self::check()`].
    pub fn record(
        &mut self,
        queue: QueueClass,
        commands: &CommandList,
        submission: &Submission,
        mut clock: Clock,
    ) {
        let seq = self.submitted[queue.index()] + 1;
        let stamp = Stamp { queue, seq };

        clock.0[queue.index()] = seq;

        for (image, access) in Self::accesses(commands) {
            let record = self.images.entry(image).or_default();

            match access {
                Access::ReadOnly => {
                    record.reads[queue.index()] = Some(stamp);
                }
                Access::ReadWrite => {
                    *record = ImageAccesses {
                        write: Some(stamp),
                        reads: Default::default(),
                    };
                }
            }
        }

        for semaphore in &submission.wait_on {
            self.semaphores.remove(&semaphore.0);
        }

        for semaphore in &submission.signal {
            self.semaphores.insert(semaphore.0, clock);
        }

        if let Some(fence) = submission.fence {
            self.fences.insert(fence.0, clock);
        }

        self.submitted[queue.index()] = seq;
        self.queues[queue.index()] = clock;
    }

    /// Marks everything the fence's submission was ordered after as done.
    pub fn fence_signaled(&mut self, fence: FenceHandle) {
        if let Some(clock) = self.fences.get(&fence.0) {
            self.retired.join(clock);
        }
    }

    /// Marks everything submitted so far as done.
    pub fn idle(&mut self) {
        self.retired = Clock(self.submitted);
    }

    pub fn forget(&mut self, image: ImageHandle) {
        self.images.remove(&image);
    }

    /// Returns strongest access of each image the list touches.
    fn accesses(commands: &CommandList) -> FxHashMap<ImageHandle, Access> {
        let mut accesses = FxHashMap::default();

        let mut access = |image: ImageHandle, access: Access| {
            let entry = accesses.entry(image).or_insert(access);

            if access == Access::ReadWrite {
                *entry = Access::ReadWrite;
            }
        };

        for command in &commands.commands {
            match command {
                Command::Dispatch(dispatch) => {
                    for &image in &dispatch.reads {
                        access(image, Access::ReadOnly);
                    }

                    for &image in &dispatch.writes {
                        access(image, Access::ReadWrite);
                    }
                }

                Command::Upload { image, .. }
                | Command::Clear { image, .. } => {
                    access(*image, Access::ReadWrite);
                }

                Command::Barrier(_)
                | Command::PushLabel(_)
                | Command::PopLabel => {}
            }
        }

        accesses
    }
}
