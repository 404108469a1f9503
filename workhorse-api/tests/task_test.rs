use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use workhorse_api::{task_fn, CancellationToken, StatusProvider, Task, TaskContext, TaskError};

struct Countdown {
    remaining: AtomicUsize,
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "countdown({})", self.remaining.load(Ordering::SeqCst))
    }
}

impl Task for Countdown {
    fn run(&self, ctx: &TaskContext) -> Result<(), TaskError> {
        if ctx.is_cancelled() {
            return Err(TaskError::unrecoverable("cancelled"));
        }
        match self.remaining.fetch_sub(1, Ordering::SeqCst) {
            1 => Ok(()),
            _ => Err(TaskError::recoverable("not there yet")),
        }
    }
}

#[test]
fn test_task_can_be_rerun_with_interior_state() {
    let task = Countdown { remaining: AtomicUsize::new(3) };
    let ctx = TaskContext::new("worker-0", CancellationToken::new());

    assert!(task.run(&ctx).unwrap_err().is_recoverable());
    assert_eq!(task.to_string(), "countdown(2)");
    assert!(task.run(&ctx).is_err());
    assert!(task.run(&ctx).is_ok());
}

#[test]
fn test_context_observes_cancellation() {
    let token = CancellationToken::new();
    let ctx = TaskContext::new("worker-1", token.clone());
    let task = Countdown { remaining: AtomicUsize::new(1) };

    token.cancel();

    assert!(ctx.is_cancelled());
    assert!(ctx.cancellation_token().is_cancelled());
    let err = task.run(&ctx).unwrap_err();
    assert!(!err.is_recoverable());
    assert_eq!(ctx.worker(), "worker-1");
}

#[test]
fn test_fn_task_label_and_debug() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let task = task_fn("closure-task", move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    task.run(&TaskContext::new("t", CancellationToken::new())).unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(task.to_string(), "closure-task");
    assert_eq!(format!("{:?}", task), "FnTask { label: \"closure-task\" }");
}

#[test]
fn test_boxed_tasks_keep_label() {
    let tasks: Vec<Box<dyn Task>> = vec![
        Box::new(task_fn("one", |_| Ok(()))),
        Box::new(Countdown { remaining: AtomicUsize::new(1) }),
    ];
    let labels: Vec<String> = tasks.iter().map(|t| t.to_string()).collect();
    assert_eq!(labels, vec!["one", "countdown(1)"]);
}

#[test]
fn test_closure_status_provider() {
    let provider = |status: &mut String| status.push_str("all good");
    assert_eq!(provider.render_status(), "all good");
}
