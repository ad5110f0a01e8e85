pub mod ids;
pub mod media_store;
pub mod memento;
pub mod message;
pub mod selection;
pub mod slice;

pub use ids::*;
pub use media_store::*;
pub use memento::*;
pub use message::*;
pub use selection::*;
pub use slice::*;
