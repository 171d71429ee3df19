/// A domain event recorded by the journal.
///
/// Events are:
/// - **immutable** (treat them as facts)
/// - designed to be **append-only**
/// - carriers of the full post-mutation payload a subscriber needs to
///   reconstruct state without re-querying
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name (e.g. "identity.user.added").
    fn kind(&self) -> &'static str;
}
