//! timer is the core module of the library, it provides the deadline-ordered
//! heap, the task records it orders, and the table that owns those records.

pub mod heap;
pub mod table;
pub mod task;
