//! # Task record.
//!
//! A [`Task`] identifies one submitted unit of work: the id assigned at
//! submission, the [`JobRef`] to call, and the [`Args`] to call it with.
//! Tasks are immutable; a worker consumes each one exactly once via
//! [`Task::into_parts`].

use std::fmt;

use crate::tasks::{Args, JobRef, TaskId};

/// One submitted unit of work.
///
/// Displays as `<Task #ID: name(args)>`:
/// ```
/// use tokio_util::sync::CancellationToken;
/// use taskfactory::{Args, JobFn, JobRef, Task, TaskError};
///
/// let job: JobRef = JobFn::arc("resize", |_a: Args, _c: CancellationToken| async {
///     Ok::<_, TaskError>(())
/// });
/// let task = Task::new(3, job, Args::new().arg("img.png").kwarg("width", 640));
/// assert_eq!(task.to_string(), r#"<Task #3: resize("img.png", width=640)>"#);
/// ```
#[derive(Clone)]
pub struct Task {
    id: TaskId,
    job: JobRef,
    args: Args,
}

impl Task {
    pub fn new(id: TaskId, job: JobRef, args: Args) -> Self {
        Self { id, job, args }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn job(&self) -> &JobRef {
        &self.job
    }

    pub fn args(&self) -> &Args {
        &self.args
    }

    /// Name of the job this task calls.
    pub fn name(&self) -> &str {
        self.job.name()
    }

    /// Consumes the task, yielding what a worker needs to execute it.
    pub fn into_parts(self) -> (TaskId, JobRef, Args) {
        (self.id, self.job, self.args)
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Task #{}: {}({})>", self.id, self.job.name(), self.args)
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("job", &self.job.name())
            .field("args", &self.args)
            .finish()
    }
}
