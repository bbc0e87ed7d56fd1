/*!
 * Observer Module
 * Normalizes raw backend change events into scoped, batched change records
 */

mod engine;
mod observation;
mod sink;
mod types;

pub use observation::{FileSystemObserver, ObserveOptions, ObserverCallback};
pub use sink::ChangeSink;
pub use types::{ChangeRecord, ChangeType, EntryType, RawChange, RawChangeType};

pub(crate) use observation::{Observation, ObservationId, ObserverInner};
