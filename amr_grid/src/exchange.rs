/// The bulk-synchronous `exchange` primitive: given per-target payloads,
/// deliver them and return messages addressed to this block. One round of
/// the round-coordinator protocol is exactly one call to this.
///
/// `M` is whatever per-round message type the engine chooses to send; this
/// crate never constructs one, it only states the shape the driver must
/// support. A real backend round-trips through MPI or a thread-pool
/// bulk-synchronous fabric; `memory::InMemoryExchange` is the in-process
/// reference used by `amr_engine`'s own tests.
pub trait Exchange<M> {
    /// Sends `outgoing[i] = (target_gid, messages)` and returns every
    /// `(sender_gid, message)` pair addressed to `self_gid` that arrived
    /// this round — from any block, not just ones `self_gid` sent to.
    fn exchange(&mut self, self_gid: i32, outgoing: Vec<(i32, M)>) -> Vec<(i32, M)>;
}
