use std::sync::Arc;

use crate::ast::{Interface, Method, Module, TypeDef};

/// Read-only navigation over one interface module.
#[derive(Debug, Clone)]
pub struct InterfaceView {
    module: Arc<Module>,
}

impl InterfaceView {
    pub fn new(module: Arc<Module>) -> Self {
        Self { module }
    }

    pub fn module(&self) -> &Arc<Module> {
        &self.module
    }

    /// Declared module name, e.g. `RoboCompCamera`.
    pub fn module_name(&self) -> &str {
        &self.module.name
    }

    /// Pool key, e.g. `Camera`.
    pub fn file_name(&self) -> String {
        self.module.pool_key()
    }

    pub fn interfaces(&self) -> &[Interface] {
        &self.module.interfaces
    }

    pub fn interface(&self, name: &str) -> Option<&Interface> {
        self.module.interface(name)
    }

    /// Methods of `interface`, sorted by name. Empty if it is not declared here.
    pub fn methods<'s>(&'s self, interface: &str) -> impl Iterator<Item = &'s Method> + 's {
        self.module
            .interface(interface)
            .into_iter()
            .flat_map(|i| i.methods.values())
    }

    pub fn types(&self) -> &[TypeDef] {
        &self.module.types
    }

    pub fn structs(&self) -> impl Iterator<Item = &TypeDef> {
        self.module.structs()
    }

    pub fn sequences(&self) -> impl Iterator<Item = &TypeDef> {
        self.module.sequences()
    }

    pub fn imports(&self) -> &[String] {
        &self.module.imports
    }

    pub fn recursive_imports(&self) -> &[String] {
        &self.module.recursive_imports
    }

    /// Usable as a topic: every interface has exactly one method, returning
    /// `void`, with no `out` parameters.
    pub fn is_valid_pubsub(&self) -> bool {
        self.module.interfaces.iter().all(|interface| {
            interface.methods.len() == 1
                && interface.methods.values().all(|m| {
                    m.return_type == "void" && !m.params.iter().any(|p| p.decorator.is_out())
                })
        })
    }

    /// Usable for remote calls: some interface has at least one method.
    pub fn is_valid_rpc(&self) -> bool {
        self.module.interfaces.iter().any(|i| !i.methods.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::parse_module;

    fn view(input: &str) -> InterfaceView {
        InterfaceView::new(Arc::new(parse_module(input, None).unwrap()))
    }

    #[test]
    fn test_pubsub_validity() {
        assert!(view("module T { interface T { void push(int x); }; };").is_valid_pubsub());
        assert!(!view("module T { interface T { int push(int x); }; };").is_valid_pubsub());
        assert!(!view("module T { interface T { void push(out int x); }; };").is_valid_pubsub());
        assert!(!view("module T { interface T { void a(); void b(); }; };").is_valid_pubsub());
    }

    #[test]
    fn test_rpc_validity() {
        assert!(view("module R { interface R { int get(); }; };").is_valid_rpc());
        assert!(!view("module R { interface R { }; };").is_valid_rpc());
        assert!(!view("module R { };").is_valid_rpc());
    }

    #[test]
    fn test_navigation() {
        let v = view(
            "module RoboCompCam { struct S { int a; }; interface Cam { void b(); void a(); }; };",
        );
        assert_eq!(v.module_name(), "RoboCompCam");
        let names: Vec<_> = v.methods("Cam").map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(v.methods("Missing").count(), 0);
        assert_eq!(v.structs().next().unwrap().qualified_name(), "RoboCompCam/S");
    }
}
