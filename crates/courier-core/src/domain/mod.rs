//! Domain model (ids, items, bounded queue state, events, errors).

pub mod errors;
pub mod events;
pub mod ids;
pub mod item;
pub mod queue_state;

pub use self::errors::{CourierError, Result};
pub use self::events::QueueEvent;
pub use self::ids::ItemId;
pub use self::item::QueueItem;
pub use self::queue_state::QueueState;
