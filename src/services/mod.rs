// Service module exports

pub mod clock;
pub mod interaction;
pub mod moves;
pub mod reconcile;
pub mod recurrence;
pub mod remote;
pub mod session;
pub mod signals;
pub mod sync;
