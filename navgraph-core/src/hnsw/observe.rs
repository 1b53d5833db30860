//! Diagnostic sinks for per-iteration traversal state.

use std::io::{self, Write};

use super::types::Neighbour;

/// State of a layer traversal after expanding one candidate.
#[derive(Clone, Debug, PartialEq)]
pub struct IterationSnapshot {
    /// Layer being traversed.
    pub layer: usize,
    /// Zero-based expansion counter within the traversal call.
    pub iteration: usize,
    /// Candidate whose adjacency was just expanded.
    pub expanded: Neighbour,
    /// Ids visited so far, ascending.
    pub visited: Vec<usize>,
    /// Ids still waiting in the frontier, nearest first.
    pub frontier: Vec<usize>,
    /// Ids currently accepted into the result, nearest first.
    pub found: Vec<usize>,
}

/// Receives one [`IterationSnapshot`] per traversal iteration.
///
/// Observers are passed explicitly into a search; nothing is recorded when
/// none is supplied.
pub trait TraversalObserver {
    /// Called after a candidate's neighbours have been evaluated.
    fn on_iteration(&mut self, snapshot: &IterationSnapshot);
}

impl<F> TraversalObserver for F
where
    F: FnMut(&IterationSnapshot),
{
    fn on_iteration(&mut self, snapshot: &IterationSnapshot) {
        self(snapshot);
    }
}

/// Writes snapshots as plain text, one block per iteration.
///
/// The first write failure is retained and later snapshots are dropped;
/// [`WriterObserver::finish`] reports it.
///
/// # Examples
/// ```
/// use navgraph_core::{IterationSnapshot, Neighbour, TraversalObserver, WriterObserver};
///
/// let mut observer = WriterObserver::new(Vec::new());
/// observer.on_iteration(&IterationSnapshot {
///     layer: 0,
///     iteration: 0,
///     expanded: Neighbour { id: 2, distance: 1.5 },
///     visited: vec![1, 2],
///     frontier: vec![1],
///     found: vec![2, 1],
/// });
/// let text = String::from_utf8(observer.finish()?).expect("utf-8 output");
/// assert!(text.contains("visited: 1 2"));
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug)]
pub struct WriterObserver<W: Write> {
    writer: W,
    failure: Option<io::Error>,
}

impl<W: Write> WriterObserver<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            failure: None,
        }
    }

    /// Flushes and returns the writer, or the first error encountered.
    ///
    /// # Errors
    /// Returns the first I/O error raised while writing snapshots.
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(err) = self.failure.take() {
            return Err(err);
        }
        self.writer.flush()?;
        Ok(self.writer)
    }

    fn write_snapshot(&mut self, snapshot: &IterationSnapshot) -> io::Result<()> {
        writeln!(
            self.writer,
            "layer {} iteration {} expanded {} ({})",
            snapshot.layer, snapshot.iteration, snapshot.expanded.id, snapshot.expanded.distance
        )?;
        write_ids(&mut self.writer, "visited", &snapshot.visited)?;
        write_ids(&mut self.writer, "frontier", &snapshot.frontier)?;
        write_ids(&mut self.writer, "found", &snapshot.found)
    }
}

impl<W: Write> TraversalObserver for WriterObserver<W> {
    fn on_iteration(&mut self, snapshot: &IterationSnapshot) {
        if self.failure.is_some() {
            return;
        }
        if let Err(err) = self.write_snapshot(snapshot) {
            self.failure = Some(err);
        }
    }
}

fn write_ids(writer: &mut impl Write, label: &str, ids: &[usize]) -> io::Result<()> {
    write!(writer, "{label}:")?;
    for id in ids {
        write!(writer, " {id}")?;
    }
    writeln!(writer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn snapshot() -> IterationSnapshot {
        IterationSnapshot {
            layer: 1,
            iteration: 3,
            expanded: Neighbour { id: 4, distance: 0.25 },
            visited: vec![0, 4, 9],
            frontier: vec![9],
            found: vec![4, 0],
        }
    }

    #[test]
    fn writer_observer_renders_each_section() {
        let mut observer = WriterObserver::new(Vec::new());
        observer.on_iteration(&snapshot());
        let text = String::from_utf8(observer.finish().expect("write succeeds"))
            .expect("utf-8 output");
        assert_eq!(
            text,
            "layer 1 iteration 3 expanded 4 (0.25)\nvisited: 0 4 9\nfrontier: 9\nfound: 4 0\n"
        );
    }

    #[test]
    fn writer_observer_reports_first_failure() {
        let mut observer = WriterObserver::new(FailingWriter);
        observer.on_iteration(&snapshot());
        observer.on_iteration(&snapshot());
        let err = observer.finish().expect_err("failure must surface");
        assert_eq!(err.to_string(), "disk full");
    }

    #[test]
    fn closures_observe_snapshots() {
        let mut seen = Vec::new();
        let mut observer = |snapshot: &IterationSnapshot| seen.push(snapshot.iteration);
        observer.on_iteration(&snapshot());
        assert_eq!(seen, vec![3]);
    }
}
