//! The lifecycle contract every filter implements, and its type-erased form.
//!
//! A [`Filter`] is initialized once per traversal from the argument of the filter specification,
//! asked for a [`Decision`] for every unresolved visitation, and finalized once at the end.
//! [`EntryPoints`] erase the concrete filter type into three plain function pointers operating on an
//! opaque [`Context`], which is what the extension table and profile libraries hand out.

use std::any::Any;
use std::fmt;

use crate::trace::{Level, Sink};
use crate::{Decision, OmitDirective, Repository, Situation, Visit};

/// The opaque, filter-owned state of a single traversal.
pub type Context = Box<dyn Any + Send>;

/// Creates the context of a traversal from the filter argument.
pub type InitFn = fn(&Repository<'_>, &str, &mut dyn Sink) -> Result<Context, init::Error>;
/// Decides about a single visitation.
pub type DecideFn = fn(&Repository<'_>, &Visit<'_>, &mut OmitDirective, &mut Context, &mut dyn Sink) -> Decision;
/// Consumes the context once the traversal is complete.
pub type FreeFn = fn(&Repository<'_>, Context, &mut dyn Sink);

///
pub mod init {
    /// The error returned if a filter cannot be set up.
    ///
    /// A malformed argument is not an error, filters substitute a default and emit a warning instead.
    #[derive(Debug, thiserror::Error)]
    pub enum Error {
        #[error("could not allocate filter state: {message}")]
        Resource { message: String },
        #[error("filter initialization returned status {status}")]
        Status { status: i32 },
        #[error(transparent)]
        Other(#[from] Box<dyn std::error::Error + Send + Sync>),
    }
}

/// A filter deciding which objects of a traversal are shown and which are omitted.
///
/// Calls are strictly sequential for a single instance. Distinct instances may be used from
/// different threads at the same time, so implementations must not share mutable state.
pub trait Filter: Send + 'static {
    /// Create the per-traversal state from `argument`, the text after `=` in the filter specification.
    fn init(repo: &Repository<'_>, argument: &str, trace: &mut dyn Sink) -> Result<Self, init::Error>
    where
        Self: Sized;

    /// Decide about `visit`, possibly editing the omit set through `omit` if the visit is a blob.
    ///
    /// Trees must be marked as seen and shown on [`Situation::BeginTree`], and [`Situation::EndTree`]
    /// answers [`Decision::ZERO`] unless the filter has something to do when leaving a tree.
    fn decide(
        &mut self,
        repo: &Repository<'_>,
        visit: &Visit<'_>,
        omit: &mut OmitDirective,
        trace: &mut dyn Sink,
    ) -> Decision;

    /// Release all state after the last decision. This cannot fail as the traversal is already complete.
    fn finalize(self, repo: &Repository<'_>, trace: &mut dyn Sink)
    where
        Self: Sized;
}

/// The three entry points of a filter, shared by static extensions and dynamically bound profiles.
#[derive(Clone, Copy)]
pub struct EntryPoints {
    /// Create the context.
    pub init: InitFn,
    /// Decide about one visitation.
    pub decide: DecideFn,
    /// Consume the context.
    pub free: FreeFn,
}

impl EntryPoints {
    /// Erase the filter `F` into its entry points.
    pub const fn of<F: Filter>() -> Self {
        EntryPoints {
            init: init_erased::<F>,
            decide: decide_erased::<F>,
            free: free_erased::<F>,
        }
    }
}

impl fmt::Debug for EntryPoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryPoints")
            .field("init", &(self.init as *const ()))
            .field("decide", &(self.decide as *const ()))
            .field("free", &(self.free as *const ()))
            .finish()
    }
}

fn init_erased<F: Filter>(repo: &Repository<'_>, argument: &str, trace: &mut dyn Sink) -> Result<Context, init::Error> {
    F::init(repo, argument, trace).map(|filter| Box::new(filter) as Context)
}

fn decide_erased<F: Filter>(
    repo: &Repository<'_>,
    visit: &Visit<'_>,
    omit: &mut OmitDirective,
    context: &mut Context,
    trace: &mut dyn Sink,
) -> Decision {
    match context.downcast_mut::<F>() {
        Some(filter) => filter.decide(repo, visit, omit, trace),
        None => protocol_violation(
            trace,
            format_args!("context was not created by {}", std::any::type_name::<F>()),
        ),
    }
}

fn free_erased<F: Filter>(repo: &Repository<'_>, context: Context, trace: &mut dyn Sink) {
    match context.downcast::<F>() {
        Ok(filter) => F::finalize(*filter, repo, trace),
        Err(_) => protocol_violation(
            trace,
            format_args!("context was not created by {}", std::any::type_name::<F>()),
        ),
    }
}

/// Report a mismatch between engine and filter and abort the process.
///
/// There is no safe way to continue a traversal past this point, and no cleanup is promised on this path.
pub(crate) fn protocol_violation(trace: &mut dyn Sink, message: fmt::Arguments<'_>) -> ! {
    trace.emit(Level::Error, message);
    std::process::abort()
}

/// A filter that shows every object and never touches the omit set.
#[derive(Debug, Default, Clone, Copy)]
pub struct Noop;

impl Filter for Noop {
    fn init(_repo: &Repository<'_>, _argument: &str, _trace: &mut dyn Sink) -> Result<Self, init::Error> {
        Ok(Noop)
    }

    fn decide(
        &mut self,
        _repo: &Repository<'_>,
        visit: &Visit<'_>,
        _omit: &mut OmitDirective,
        _trace: &mut dyn Sink,
    ) -> Decision {
        match visit.situation {
            Situation::BeginTree | Situation::Blob => Decision::SHOW,
            Situation::EndTree => Decision::ZERO,
        }
    }

    fn finalize(self, _repo: &Repository<'_>, _trace: &mut dyn Sink) {}
}
