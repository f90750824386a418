//! Resource and collection layer over a caller-supplied [`Connection`].
//!
//! A [`Collection`] pairs an [`ObjectSchema`](crate::schema::ObjectSchema)
//! with its endpoint and turns [`ModelObject`](crate::object::ModelObject)
//! changes into API calls: full bodies on create, changes-only bodies on
//! update.

pub mod change_log;
pub mod collection;
pub mod connection;


pub use change_log::{ChangeLogEntry, add_change_log_note, change_log};
pub use collection::Collection;
pub use connection::Connection;
