//! Background tasks for the HTTP presentation layer

mod keep_alive;

pub use keep_alive::spawn_keep_alive_task;
