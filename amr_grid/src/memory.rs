//! Minimal in-memory backends for the traits in this crate, used by
//! `amr_engine`'s integration tests to stand up small scenarios without a
//! real simulation checkpoint or MPI runtime. Not meant for production use
//! — real backends are external collaborators.
use std::cell::RefCell;
use std::collections::HashMap;

use amr_core::Value;

use crate::{BoxBounds, Exchange, GridError, GridReader, GridResult};

/// A grid reader backed by plain in-memory buffers, one per gid.
pub struct InMemoryGrid<V> {
    boxes: HashMap<i32, (BoxBounds, Vec<V>)>,
}

impl<V: Value> InMemoryGrid<V> {
    pub fn new() -> Self {
        InMemoryGrid {
            boxes: HashMap::new(),
        }
    }

    pub fn insert(&mut self, gid: i32, bounds: BoxBounds, values: Vec<V>) {
        assert_eq!(values.len() as u64, bounds.len());
        self.boxes.insert(gid, (bounds, values));
    }
}

impl<V: Value> Default for InMemoryGrid<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Value> GridReader<V> for InMemoryGrid<V> {
    fn read_box(&self, gid: i32, bounds: &BoxBounds, out: &mut [V]) -> GridResult<()> {
        let (stored_bounds, values) =
            self.boxes.get(&gid).ok_or_else(|| GridError::ReadFailure {
                gid,
                reason: "no data registered for gid".to_string(),
            })?;
        if stored_bounds != bounds {
            return Err(GridError::ReadFailure {
                gid,
                reason: "requested bounds do not match registered box".to_string(),
            });
        }
        out.copy_from_slice(values);
        Ok(())
    }
}

/// A shared mailroom every block in a single-process test takes a handle
/// to. Messages posted via `exchange` in round `r` are visible to the
/// recipient's `exchange` call in round `r` once the sender has already
/// posted them — callers are responsible for posting before draining
/// (mirroring the driver contract: send, then receive, per round).
pub struct Mailroom<M> {
    inboxes: RefCell<HashMap<i32, Vec<(i32, M)>>>,
}

impl<M> Mailroom<M> {
    pub fn new() -> Self {
        Mailroom {
            inboxes: RefCell::new(HashMap::new()),
        }
    }

    pub fn handle(&self, gid: i32) -> MailroomHandle<'_, M> {
        MailroomHandle { room: self, gid }
    }
}

impl<M> Default for Mailroom<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// A per-block view onto a shared `Mailroom`.
pub struct MailroomHandle<'a, M> {
    room: &'a Mailroom<M>,
    gid: i32,
}

impl<'a, M> Exchange<M> for MailroomHandle<'a, M> {
    fn exchange(&mut self, self_gid: i32, outgoing: Vec<(i32, M)>) -> Vec<(i32, M)> {
        debug_assert_eq!(self_gid, self.gid);
        {
            let mut inboxes = self.room.inboxes.borrow_mut();
            for (target, msg) in outgoing {
                inboxes.entry(target).or_default().push((self_gid, msg));
            }
        }
        self.room
            .inboxes
            .borrow_mut()
            .remove(&self.gid)
            .unwrap_or_default()
    }
}
