//! Typed views over normalized components and interface modules.

mod component;
mod interface;

pub use component::ComponentView;
pub use interface::InterfaceView;
