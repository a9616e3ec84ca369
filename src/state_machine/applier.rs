use bytes::Bytes;

/// LocalStateMachineApplier is the application specific view of applying the replicated log in
/// sequential consistent order.
pub trait LocalStateMachineApplier {
    /// apply_committed_entry is called only when its guaranteed that the provided entry has been
    /// committed (i.e. replicated to a majority). Because of this guarantee, you will never need
    /// to reverse an entry once you've been asked to apply it. Note: Entry here is synonymous with
    /// a state transition.
    ///
    /// Applying must be deterministic: every replica applies the same entries in the same order and
    /// must end up with the same state and the same output for each entry. The output of the
    /// leader's replica is returned to the client that submitted the entry.
    fn apply_committed_entry(&mut self, entry: Bytes) -> StateMachineOutput;
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StateMachineOutput {
    Data(Bytes),
    NoData,
}
