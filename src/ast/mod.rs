//! Normalized structures built from raw parse trees.
//!
//! Every optional grammar field gets its default here, so consumers never
//! need presence checks: method decorators default to `""`, `throws` to
//! `"nothing"`, parameter decorators to `"none"`, transports to ICE.

mod component;
mod module;
mod statemachine;

pub use component::{CommKind, Communication, Component, Gui, Language, Transport};
pub use module::{
    import_basename, import_stem, Field, Interface, Method, MethodDecorator, Module, Param,
    ParamDecorator, Throws, TypeBody, TypeDef, TypeKind,
};
pub use statemachine::{
    Machine, MachineContents, StateMachine, SubMachine, Transition, DEFAULT_MACHINE,
};
