//! A filter that includes a random percentage of all blobs.
//!
//! Trees are always shown. Each blob is shown with a probability of `p` percent, and hard-omitted
//! otherwise. The percentage is the filter argument, as in `extension:rand=5`.

use std::fmt;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::filter::{init, Filter};
use crate::trace::Sink;
use crate::{Decision, OmitDirective, Repository, Situation, Visit};

/// The percentage used if the argument is unparsable or out of range.
pub const DEFAULT_PERCENTAGE: u8 = 1;

/// Emit a progress line each time this many objects were visited.
pub const PROGRESS_INTERVAL: u64 = 100_000;

/// Parse `argument` as percentage in `0..=100`, or return `None`.
pub fn parse_percentage(argument: &str) -> Option<u8> {
    argument
        .trim()
        .parse::<i64>()
        .ok()
        .and_then(|value| u8::try_from(value).ok())
        .filter(|value| *value <= 100)
}

/// Object counts accumulated over a traversal.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counts {
    /// The amount of blobs visited.
    pub blobs: u64,
    /// The amount of trees entered.
    pub trees: u64,
    /// The amount of blobs that were shown.
    pub matches: u64,
}

impl Counts {
    /// All objects visited.
    pub fn total(&self) -> u64 {
        self.blobs + self.trees
    }
}

/// What is reported when the filter is finalized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    /// The final counts.
    pub counts: Counts,
    /// The time between initialization and finalization.
    pub elapsed: Duration,
}

impl Summary {
    /// Objects per second, or `None` if nothing was visited or no time passed.
    pub fn rate(&self) -> Option<f64> {
        let secs = self.elapsed.as_secs_f64();
        (self.counts.total() > 0 && secs > 0.0).then(|| self.counts.total() as f64 / secs)
    }

    /// Microseconds per object, or `None` if nothing was visited.
    pub fn average_micros(&self) -> Option<f64> {
        (self.counts.total() > 0).then(|| self.elapsed.as_secs_f64() * 1e6 / self.counts.total() as f64)
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Counts { blobs, trees, matches } = self.counts;
        write!(
            f,
            "done: count={} (blob={blobs} tree={trees}) matched={matches} elapsed={:.6}s",
            self.counts.total(),
            self.elapsed.as_secs_f64()
        )?;
        match self.rate() {
            Some(rate) => write!(f, " rate={rate:.1}/s")?,
            None => f.write_str(" rate=n/a")?,
        }
        match self.average_micros() {
            Some(average) => write!(f, " average={average:.1}us"),
            None => f.write_str(" average=n/a"),
        }
    }
}

/// The sampling filter, owning its counters and random number generator.
#[derive(Debug)]
pub struct Sample {
    percentage: u8,
    counts: Counts,
    rng: StdRng,
    started_at: Instant,
}

impl Sample {
    /// Sample `percentage` percent of blobs, with a generator seeded from the operating system.
    ///
    /// Values above 100 are clamped.
    pub fn new(percentage: u8) -> Self {
        Self::with_rng(percentage, StdRng::from_entropy())
    }

    /// Sample `percentage` percent of blobs with a reproducible sequence of decisions.
    pub fn with_seed(percentage: u8, seed: u64) -> Self {
        Self::with_rng(percentage, StdRng::seed_from_u64(seed))
    }

    fn with_rng(percentage: u8, rng: StdRng) -> Self {
        Sample {
            percentage: percentage.min(100),
            counts: Counts::default(),
            rng,
            started_at: Instant::now(),
        }
    }

    /// The effective percentage.
    pub fn percentage(&self) -> u8 {
        self.percentage
    }

    /// The counts so far.
    pub fn counts(&self) -> Counts {
        self.counts
    }

    /// The summary as it would be reported right now.
    pub fn summary(&self) -> Summary {
        Summary {
            counts: self.counts,
            elapsed: self.started_at.elapsed(),
        }
    }

    fn progress(&self, trace: &mut dyn Sink) {
        let total = self.counts.total();
        if total % PROGRESS_INTERVAL == 0 {
            trace.info(format_args!("{total}..."));
        }
    }
}

impl Filter for Sample {
    fn init(_repo: &Repository<'_>, argument: &str, trace: &mut dyn Sink) -> Result<Self, init::Error> {
        let percentage = parse_percentage(argument).unwrap_or_else(|| {
            trace.warn(format_args!("invalid match %: {argument}"));
            DEFAULT_PERCENTAGE
        });
        trace.info(format_args!("matching {percentage}%"));
        Ok(Sample::new(percentage))
    }

    fn decide(
        &mut self,
        _repo: &Repository<'_>,
        visit: &Visit<'_>,
        omit: &mut OmitDirective,
        trace: &mut dyn Sink,
    ) -> Decision {
        match visit.situation {
            Situation::BeginTree => {
                self.counts.trees += 1;
                self.progress(trace);
                Decision::SHOW
            }
            Situation::EndTree => Decision::ZERO,
            Situation::Blob => {
                self.counts.blobs += 1;
                self.progress(trace);
                if self.rng.gen_range(0..100u8) < self.percentage {
                    self.counts.matches += 1;
                    trace.trace(format_args!("match: {} {}", visit.object.id.to_hex(), visit.path));
                    Decision::SHOW
                } else {
                    // hard omit
                    *omit = OmitDirective::Omit;
                    Decision::MARK_SEEN
                }
            }
        }
    }

    fn finalize(self, _repo: &Repository<'_>, trace: &mut dyn Sink) {
        trace.info(format_args!("{}", self.summary()));
    }
}
