use std::time::{Duration, Instant};

/// A named point in time.
#[derive(Debug, Copy, Clone)]
pub struct Mark {
    pub name: &'static str,
    pub at: Instant,
}

/// Elapsed time between two consecutive marks.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PerfSpan {
    pub from: &'static str,
    pub to: &'static str,
    pub duration: Duration,
}

/// Ordered list of performance marks.
///
/// Marks are host-side wall-clock timestamps. They bracket CPU work (resource
/// creation, encoding, submission), not GPU execution.
#[derive(Debug, Clone, Default)]
pub struct PerfMarks {
    marks: Vec<Mark>,
}

impl PerfMarks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a mark at the current instant.
    pub fn mark(&mut self, name: &'static str) {
        self.marks.push(Mark {
            name,
            at: Instant::now(),
        });
    }

    pub fn marks(&self) -> &[Mark] {
        &self.marks
    }

    /// Time from the first mark named `from` to the first mark named `to` at or
    /// after it. Measuring a mark against itself gives zero.
    pub fn measure(&self, from: &str, to: &str) -> Option<Duration> {
        let start = self.marks.iter().position(|m| m.name == from)?;
        let end = self.marks[start..].iter().find(|m| m.name == to)?;
        Some(end.at.saturating_duration_since(self.marks[start].at))
    }

    /// Durations between each pair of consecutive marks, in recording order.
    pub fn spans(&self) -> Vec<PerfSpan> {
        self.marks
            .windows(2)
            .map(|w| PerfSpan {
                from: w[0].name,
                to: w[1].name,
                duration: w[1].at.saturating_duration_since(w[0].at),
            })
            .collect()
    }

    /// Time from the first to the last mark.
    pub fn total(&self) -> Duration {
        match (self.marks.first(), self.marks.last()) {
            (Some(first), Some(last)) => last.at.saturating_duration_since(first.at),
            _ => Duration::ZERO,
        }
    }

    /// Logs every span at debug level, followed by the total.
    pub fn log_summary(&self, label: &str) {
        for span in self.spans() {
            log::debug!("{label}: {} -> {}: {:?}", span.from, span.to, span.duration);
        }
        log::debug!("{label}: total {:?}", self.total());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_marks_have_no_spans() {
        let marks = PerfMarks::new();
        assert!(marks.spans().is_empty());
        assert_eq!(marks.total(), Duration::ZERO);
    }

    #[test]
    fn spans_follow_recording_order() {
        let mut marks = PerfMarks::new();
        marks.mark("start");
        marks.mark("middle");
        marks.mark("end");

        let spans = marks.spans();
        assert_eq!(spans.len(), 2);
        assert_eq!((spans[0].from, spans[0].to), ("start", "middle"));
        assert_eq!((spans[1].from, spans[1].to), ("middle", "end"));

        let sum: Duration = spans.iter().map(|s| s.duration).sum();
        assert_eq!(sum, marks.total());
    }

    #[test]
    fn measure_unknown_mark_is_none() {
        let mut marks = PerfMarks::new();
        marks.mark("start");
        assert!(marks.measure("start", "missing").is_none());
        assert!(marks.measure("missing", "start").is_none());
    }

    #[test]
    fn measure_only_looks_forward() {
        let mut marks = PerfMarks::new();
        marks.mark("a");
        marks.mark("b");
        // `a` is never recorded after `b`.
        assert!(marks.measure("b", "a").is_none());
        assert!(marks.measure("a", "b").is_some());
    }

    #[test]
    fn measure_same_mark_is_zero() {
        let mut marks = PerfMarks::new();
        marks.mark("a");
        assert_eq!(marks.measure("a", "a"), Some(Duration::ZERO));
    }
}
