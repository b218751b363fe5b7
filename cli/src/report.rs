//! Plain-text formatting for CLI output.

use std::fmt;
use std::time::Duration;

use zpdf::{PageInfo, TextSpan};

/// One line per page: index, size, rotation, orientation.
pub fn page_table(pages: &[PageInfo]) -> Vec<String> {
    pages
        .iter()
        .enumerate()
        .map(|(i, info)| {
            format!(
                "{:>5}  {:>8.1} x {:<8.1} {:>4}°  {}",
                i,
                info.width,
                info.height,
                info.rotation,
                if info.is_landscape() {
                    "landscape"
                } else {
                    "portrait"
                }
            )
        })
        .collect()
}

/// One line per span: box, font size, text.
pub fn span_lines(spans: &[TextSpan]) -> Vec<String> {
    spans
        .iter()
        .map(|s| {
            format!(
                "({:7.1}, {:7.1}) - ({:7.1}, {:7.1})  {:5.1}pt  {}",
                s.x0, s.y0, s.x1, s.y1, s.font_size, s.text
            )
        })
        .collect()
}

/// Timing of a parallel against a sequential extraction.
#[derive(Debug, Clone, Copy)]
pub struct Comparison {
    pub parallel: Duration,
    pub sequential: Duration,
}

impl Comparison {
    pub fn new(parallel: Duration, sequential: Duration) -> Self {
        Self {
            parallel,
            sequential,
        }
    }

    /// Sequential time divided by parallel time, if parallel took any time.
    pub fn speedup(&self) -> Option<f64> {
        let parallel = self.parallel.as_secs_f64();
        (parallel > 0.0).then(|| self.sequential.as_secs_f64() / parallel)
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Parallel:   {:.1}ms", self.parallel.as_secs_f64() * 1000.0)?;
        writeln!(f, "Sequential: {:.1}ms", self.sequential.as_secs_f64() * 1000.0)?;
        match self.speedup() {
            Some(speedup) => write!(f, "Speedup:    {:.1}x", speedup),
            None => write!(f, "Speedup:    n/a"),
        }
    }
}
