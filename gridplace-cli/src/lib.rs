//! Headless stand-ins for the canvas host, storage and UI transport, used
//! by the `gridplace` binary to run placements from a terminal.
#![allow(missing_docs)]

pub mod headless;
pub mod sink;
pub mod store;

pub use headless::{HeadlessCanvas, Scene, SceneNode};
pub use sink::JsonLinesSink;
pub use store::JsonFileStore;
