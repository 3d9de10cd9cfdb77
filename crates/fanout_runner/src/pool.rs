use std::collections::BTreeSet;
use std::ffi::{OsStr, OsString};
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::thread::JoinHandle;
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender, never, select, unbounded};
use fanout_collector::UnitId;
use fanout_report::{ErrorKind, Outcome};

use crate::protocol::{RunRequest, parse_outcome_line};

/// How to launch one worker process. Each worker additionally receives
/// `--worker-id <N>`.
#[derive(Debug, Clone)]
pub struct WorkerCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

impl WorkerCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|arg| arg.as_ref().to_os_string()));
        self
    }

    fn command(&self, worker_id: usize) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg("--worker-id")
            .arg(worker_id.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        command
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("Failed to start any of the {requested} worker processes")]
    NoWorkers {
        requested: usize,
        #[source]
        source: io::Error,
    },
}

/// A handle to the eventual outcome of one submitted unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(usize);

struct Job {
    ticket: Ticket,
    unit: UnitId,
}

enum DrainEvent {
    Outcome(Ticket, Outcome),
    DispatchersGone,
    Interrupted,
    InterruptClosed,
}

struct Worker {
    id: usize,
    child: Child,
    dispatcher: Option<JoinHandle<()>>,
}

/// A fixed set of long-lived worker processes fed from one shared queue.
///
/// Every worker has a dispatcher thread that takes the next unit from the
/// queue only when its worker is idle, so fast workers naturally take more
/// of the work. A worker that dies loses only the unit it was running.
pub struct WorkerPool {
    jobs: Option<Sender<Job>>,
    queue: Receiver<Job>,
    results: Receiver<(Ticket, Outcome)>,
    workers: Vec<Worker>,
    pending: BTreeSet<Ticket>,
    next_ticket: usize,
}

impl WorkerPool {
    /// Launches `count` workers. Workers that fail to start are logged and
    /// skipped; failing to start any worker at all is an error.
    pub fn start(count: usize, command: &WorkerCommand) -> Result<Self, PoolError> {
        let (jobs_tx, jobs_rx) = unbounded::<Job>();
        let (results_tx, results_rx) = unbounded();

        let mut workers = Vec::with_capacity(count);
        let mut last_error = None;

        for id in 0..count {
            match spawn_worker(id, command, &jobs_rx, &results_tx) {
                Ok(worker) => workers.push(worker),
                Err(err) => {
                    tracing::warn!("Failed to start worker {id}: {err}");
                    last_error = Some(err);
                }
            }
        }

        if workers.is_empty() {
            return Err(PoolError::NoWorkers {
                requested: count,
                source: last_error
                    .unwrap_or_else(|| io::Error::other("no workers were requested")),
            });
        }

        tracing::debug!(workers = workers.len(), "Started worker pool");

        Ok(Self {
            jobs: Some(jobs_tx),
            queue: jobs_rx,
            results: results_rx,
            workers,
            pending: BTreeSet::new(),
            next_ticket: 0,
        })
    }

    /// Queues `unit` for the next idle worker.
    ///
    /// Units submitted after [`drain`](Self::drain) are never run and are
    /// left out of later drains.
    pub fn submit(&mut self, unit: UnitId) -> Ticket {
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;

        if let Some(jobs) = &self.jobs {
            // The pool keeps its own receiver alive, so sending cannot fail.
            if jobs.send(Job { ticket, unit }).is_ok() {
                self.pending.insert(ticket);
            }
        } else {
            tracing::warn!(unit = %unit, "Ignoring submission to a drained pool");
        }

        ticket
    }

    /// Closes submission and waits until every submitted unit has an
    /// outcome.
    ///
    /// Units whose worker can no longer run them (because every worker has
    /// died) are reported as [`ErrorKind::Incomplete`]. A message on
    /// `interrupt` abandons the wait: all workers are killed and every unit
    /// still outstanding becomes incomplete.
    pub fn drain(&mut self, interrupt: &Receiver<()>) -> Vec<(Ticket, Outcome)> {
        self.jobs = None;

        let mut watch_interrupt = true;
        let mut outcomes = Vec::with_capacity(self.pending.len());

        while !self.pending.is_empty() {
            let interrupt_rx = if watch_interrupt {
                interrupt.clone()
            } else {
                never()
            };

            let event = select! {
                recv(self.results) -> message => match message {
                    Ok((ticket, outcome)) => DrainEvent::Outcome(ticket, outcome),
                    Err(_) => DrainEvent::DispatchersGone,
                },
                recv(interrupt_rx) -> message => match message {
                    Ok(()) => DrainEvent::Interrupted,
                    Err(_) => DrainEvent::InterruptClosed,
                },
            };

            match event {
                DrainEvent::Outcome(ticket, outcome) => {
                    if self.pending.remove(&ticket) {
                        outcomes.push((ticket, outcome));
                    }
                }
                DrainEvent::DispatchersGone => break,
                DrainEvent::Interrupted => {
                    tracing::debug!("Interrupted, killing workers");
                    self.discard_queued();
                    self.kill();
                    break;
                }
                DrainEvent::InterruptClosed => watch_interrupt = false,
            }
        }

        for ticket in std::mem::take(&mut self.pending) {
            outcomes.push((ticket, Outcome::incomplete()));
        }

        outcomes
    }

    /// Stops every worker after its current unit. Queued units that have not
    /// started are discarded.
    pub fn shutdown(mut self) {
        self.jobs = None;
        self.discard_queued();

        for mut worker in std::mem::take(&mut self.workers) {
            if let Some(dispatcher) = worker.dispatcher.take() {
                if dispatcher.join().is_err() {
                    tracing::warn!("Dispatcher for worker {} panicked", worker.id);
                }
            }
            match worker.child.wait() {
                Ok(status) => tracing::debug!(worker = worker.id, %status, "Worker exited"),
                Err(err) => tracing::warn!("Failed to wait for worker {}: {err}", worker.id),
            }
        }
    }

    fn discard_queued(&self) {
        let discarded = self.queue.try_iter().count();
        if discarded > 0 {
            tracing::debug!(discarded, "Discarded queued tests");
        }
    }

    fn kill(&mut self) {
        for worker in &mut self.workers {
            if let Err(err) = worker.child.kill() {
                tracing::debug!("Failed to kill worker {}: {err}", worker.id);
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if self.workers.is_empty() {
            return;
        }

        self.jobs = None;
        self.discard_queued();
        self.kill();

        for mut worker in std::mem::take(&mut self.workers) {
            let _ = worker.child.wait();
            if let Some(dispatcher) = worker.dispatcher.take() {
                let _ = dispatcher.join();
            }
        }
    }
}

fn spawn_worker(
    id: usize,
    command: &WorkerCommand,
    jobs: &Receiver<Job>,
    results: &Sender<(Ticket, Outcome)>,
) -> io::Result<Worker> {
    let mut child = command.command(id).spawn()?;

    let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
        let _ = child.kill();
        let _ = child.wait();
        return Err(io::Error::other("worker stdio was not captured"));
    };

    let jobs = jobs.clone();
    let results = results.clone();
    let dispatcher = std::thread::Builder::new()
        .name(format!("fanout-dispatch-{id}"))
        .spawn(move || dispatch(id, &jobs, &results, stdin, stdout));

    match dispatcher {
        Ok(dispatcher) => Ok(Worker {
            id,
            child,
            dispatcher: Some(dispatcher),
        }),
        Err(err) => {
            let _ = child.kill();
            let _ = child.wait();
            Err(err)
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum ExchangeError {
    #[error("failed to send the test: {0}")]
    Write(#[source] io::Error),

    #[error("failed to read the result: {0}")]
    Read(#[source] io::Error),

    #[error("the worker exited before reporting a result")]
    Closed,

    #[error("the worker sent a malformed result: {0}")]
    Malformed(#[source] serde_json::Error),
}

/// Feeds one worker until the queue closes or the worker dies.
fn dispatch(
    worker_id: usize,
    jobs: &Receiver<Job>,
    results: &Sender<(Ticket, Outcome)>,
    mut stdin: ChildStdin,
    stdout: ChildStdout,
) {
    let mut stdout = BufReader::new(stdout);

    for job in jobs {
        let started = Instant::now();
        tracing::debug!(worker = worker_id, unit = %job.unit, "Dispatching");

        match exchange(&mut stdin, &mut stdout, &job.unit) {
            Ok(outcome) => {
                if results.send((job.ticket, outcome)).is_err() {
                    return;
                }
            }
            Err(err) => {
                tracing::warn!(worker = worker_id, unit = %job.unit, "Worker lost: {err}");
                let outcome = Outcome::errored(
                    ErrorKind::WorkerLost,
                    format!("Worker {worker_id} was lost while running this test: {err}"),
                )
                .with_elapsed(started.elapsed());
                let _ = results.send((job.ticket, outcome));
                return;
            }
        }
    }

    tracing::debug!(worker = worker_id, "Queue closed");
}

fn exchange(
    stdin: &mut ChildStdin,
    stdout: &mut BufReader<ChildStdout>,
    unit: &UnitId,
) -> Result<Outcome, ExchangeError> {
    let request = RunRequest { unit: unit.clone() }
        .to_line()
        .map_err(ExchangeError::Malformed)?;
    stdin
        .write_all(request.as_bytes())
        .and_then(|()| stdin.flush())
        .map_err(ExchangeError::Write)?;

    let mut line = String::new();
    loop {
        line.clear();
        let read = stdout.read_line(&mut line).map_err(ExchangeError::Read)?;
        if read == 0 {
            return Err(ExchangeError::Closed);
        }

        match parse_outcome_line(&line) {
            Some(outcome) => return outcome.map_err(ExchangeError::Malformed),
            None => tracing::debug!(unit = %unit, "Worker output: {}", line.trim_end()),
        }
    }
}
