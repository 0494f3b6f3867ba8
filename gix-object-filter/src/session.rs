//! Drive a bound filter through exactly one traversal.

use std::sync::Arc;

use bstr::BStr;
use gix_hash::oid;

use crate::filter::{self, init, Context, EntryPoints};
use crate::profile::Library;
use crate::trace::{Level, Sink};
use crate::{Decision, Object, OmitDirective, Repository, Situation, Visit};

/// A filter that was initialized for a single traversal.
///
/// Creating a session calls the `init` entry point, [`Session::decide()`] calls `decide`, and
/// [`Session::finalize()`] or dropping the session calls `free` exactly once. No decision can be
/// requested before initialization succeeded or after finalization.
pub struct Session<'repo, S: Sink> {
    repo: Repository<'repo>,
    entry_points: EntryPoints,
    context: Option<Context>,
    trace: S,
    decisions: u64,
    /// Keeps the code behind `entry_points` available for as long as the context lives.
    _library: Option<Arc<dyn Library>>,
}

impl<'repo, S: Sink> Session<'repo, S> {
    /// Initialize the filter behind `entry_points` with `argument`, writing diagnostics to `trace`.
    ///
    /// If initialization fails, nothing else will be called.
    pub fn start(
        repo: Repository<'repo>,
        entry_points: EntryPoints,
        argument: &str,
        mut trace: S,
    ) -> Result<Self, init::Error> {
        let context = (entry_points.init)(&repo, argument, &mut trace)?;
        Ok(Session {
            repo,
            entry_points,
            context: Some(context),
            trace,
            decisions: 0,
            _library: None,
        })
    }

    pub(crate) fn keep_alive(mut self, library: Option<Arc<dyn Library>>) -> Self {
        self._library = library;
        self
    }

    /// Ask the filter about `visit` and return its decision along with the omit directive.
    ///
    /// The omit directive is only meaningful for blobs. It starts out as [`OmitDirective::Ignore`].
    pub fn decide(&mut self, visit: &Visit<'_>) -> (Decision, OmitDirective) {
        let mut omit = OmitDirective::default();
        let decision = match self.context.as_mut() {
            Some(context) => {
                (self.entry_points.decide)(&self.repo, visit, &mut omit, context, &mut self.trace)
            }
            // Unreachable as long as `finalize()` consumes the session, kept to uphold the type-state.
            None => filter::protocol_violation(&mut self.trace, format_args!("decision requested after finalization")),
        };
        self.decisions += 1;
        if decision.is_empty() && visit.situation != Situation::EndTree {
            self.trace.emit(
                Level::Debug,
                format_args!("empty decision for {} {}", visit.situation, visit.object.id),
            );
        }
        if visit.situation != Situation::Blob {
            omit = OmitDirective::Ignore;
        }
        (decision, omit)
    }

    /// Like [`decide()`](Self::decide()), but for engines that transmit the situation as raw value.
    ///
    /// A value outside of the known situations means engine and filter disagree about the protocol,
    /// which aborts the process.
    pub fn decide_raw(
        &mut self,
        situation: u32,
        id: &oid,
        path: &BStr,
        filename: &BStr,
    ) -> (Decision, OmitDirective) {
        let situation = match Situation::try_from(situation) {
            Ok(situation) => situation,
            Err(err) => filter::protocol_violation(&mut self.trace, format_args!("{err}")),
        };
        let kind = match situation {
            Situation::BeginTree | Situation::EndTree => gix_object::Kind::Tree,
            Situation::Blob => gix_object::Kind::Blob,
        };
        self.decide(&Visit {
            situation,
            object: Object { id, kind },
            path,
            filename,
        })
    }

    /// The amount of decisions made so far.
    pub fn decisions(&self) -> u64 {
        self.decisions
    }

    /// The repository this session runs in.
    pub fn repository(&self) -> &Repository<'repo> {
        &self.repo
    }

    /// Access the diagnostic sink.
    pub fn trace(&self) -> &S {
        &self.trace
    }

    /// Finalize the filter, releasing its context.
    pub fn finalize(mut self) {
        self.free();
    }

    fn free(&mut self) {
        if let Some(context) = self.context.take() {
            (self.entry_points.free)(&self.repo, context, &mut self.trace);
        }
    }
}

impl<S: Sink> Drop for Session<'_, S> {
    fn drop(&mut self) {
        self.free();
    }
}

impl<S: Sink> std::fmt::Debug for Session<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("repo", &self.repo)
            .field("entry_points", &self.entry_points)
            .field("finalized", &self.context.is_none())
            .field("decisions", &self.decisions)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use bstr::ByteSlice;

    use super::*;
    use crate::filter::Filter;
    use crate::trace::Recorder;

    thread_local! {
        static CALLS: RefCell<Vec<&'static str>> = const { RefCell::new(Vec::new()) };
    }

    fn record(call: &'static str) {
        CALLS.with(|calls| calls.borrow_mut().push(call));
    }

    fn calls() -> Vec<&'static str> {
        CALLS.with(|calls| calls.borrow_mut().drain(..).collect())
    }

    /// Answers `ZERO` for everything if initialized with `zero`.
    struct Counting {
        zero: bool,
    }

    impl Filter for Counting {
        fn init(_: &Repository<'_>, argument: &str, _: &mut dyn Sink) -> Result<Self, init::Error> {
            record("init");
            if argument == "fail" {
                return Err(init::Error::Status { status: -1 });
            }
            Ok(Counting { zero: argument == "zero" })
        }

        fn decide(&mut self, _: &Repository<'_>, visit: &Visit<'_>, omit: &mut OmitDirective, _: &mut dyn Sink) -> Decision {
            record("decide");
            // Try to smuggle an omit directive through a tree visit.
            *omit = OmitDirective::Omit;
            match visit.situation {
                Situation::EndTree => Decision::ZERO,
                _ if self.zero => Decision::ZERO,
                _ => Decision::MARK_SEEN,
            }
        }

        fn finalize(self, _: &Repository<'_>, _: &mut dyn Sink) {
            record("finalize");
        }
    }

    fn repo() -> Repository<'static> {
        Repository::new(".git", gix_hash::Kind::Sha1)
    }

    #[test]
    fn finalize_happens_once_after_all_decisions() {
        let id = gix_hash::ObjectId::empty_tree(gix_hash::Kind::Sha1);
        let mut rec = Recorder::default();
        let mut session = Session::start(repo(), EntryPoints::of::<Counting>(), "", &mut rec).unwrap();
        session.decide(&Visit::begin_tree(&id, b"".as_bstr(), b"".as_bstr()));
        session.decide(&Visit::end_tree(&id, b"".as_bstr(), b"".as_bstr()));
        assert_eq!(session.decisions(), 2);
        session.finalize();

        assert_eq!(calls(), ["init", "decide", "decide", "finalize"]);
    }

    #[test]
    fn dropping_a_session_finalizes_it() {
        let session = Session::start(repo(), EntryPoints::of::<Counting>(), "", Recorder::default()).unwrap();
        drop(session);
        assert_eq!(calls(), ["init", "finalize"]);
    }

    #[test]
    fn failed_init_calls_nothing_else() {
        let err = Session::start(repo(), EntryPoints::of::<Counting>(), "fail", Recorder::default()).unwrap_err();
        assert!(matches!(err, init::Error::Status { status: -1 }));
        assert_eq!(calls(), ["init"]);
    }

    #[test]
    fn empty_decisions_outside_of_end_tree_are_reported() {
        let id = gix_hash::ObjectId::empty_blob(gix_hash::Kind::Sha1);
        let mut rec = Recorder::default();
        let mut session = Session::start(repo(), EntryPoints::of::<Counting>(), "zero", &mut rec).unwrap();
        session.decide(&Visit::begin_tree(&id, b"t".as_bstr(), b"t".as_bstr()));
        session.decide(&Visit::blob(&id, b"t/f".as_bstr(), b"f".as_bstr()));
        session.decide(&Visit::end_tree(&id, b"t".as_bstr(), b"t".as_bstr()));
        session.finalize();
        calls();

        let lines: Vec<_> = rec.at(Level::Debug).map(|line| line.message.as_str()).collect();
        assert_eq!(lines, [format!("empty decision for begin-tree {id}"), format!("empty decision for blob {id}")]);
    }

    #[test]
    fn omit_directives_only_apply_to_blobs() {
        let id = gix_hash::ObjectId::empty_blob(gix_hash::Kind::Sha1);
        let mut session = Session::start(repo(), EntryPoints::of::<Counting>(), "", Recorder::default()).unwrap();

        let (_, omit) = session.decide(&Visit::begin_tree(&id, b"t".as_bstr(), b"t".as_bstr()));
        assert_eq!(omit, OmitDirective::Ignore);
        let (decision, omit) = session.decide_raw(Situation::Blob.to_raw(), &id, b"t/f".as_bstr(), b"f".as_bstr());
        assert_eq!(decision, Decision::MARK_SEEN);
        assert_eq!(omit, OmitDirective::Omit);
        session.finalize();
        calls();
    }
}
