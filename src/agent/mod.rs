/*!
 * Agent Module
 * Explicit execution context: two FIFO task queues, microtasks and
 * batched observer delivery on a single cooperative scheduler
 */

mod promise;
mod scheduler;

pub use promise::Promise;
pub use scheduler::Agent;

pub(crate) use promise::promise;
