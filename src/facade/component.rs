use std::borrow::Cow;

use tracing::error;

use super::InterfaceView;
use crate::ast::{CommKind, Communication, Component, Language, StateMachine};
use crate::error::Result;
use crate::pool::ModulePool;

/// Navigation over a component, answering interface questions through the
/// module pool.
#[derive(Debug, Clone, Copy)]
pub struct ComponentView<'a> {
    component: &'a Component,
    pool: &'a ModulePool,
}

impl<'a> ComponentView<'a> {
    pub fn new(component: &'a Component, pool: &'a ModulePool) -> Self {
        Self { component, pool }
    }

    pub fn component(&self) -> &'a Component {
        self.component
    }

    pub fn name(&self) -> &'a str {
        &self.component.name
    }

    pub fn language(&self) -> Language {
        self.component.language
    }

    pub fn communications(&self, kind: CommKind) -> &'a [Communication] {
        self.component.communications(kind)
    }

    /// Every referenced interface: requires, implements, subscribesTo,
    /// then publishes.
    pub fn required_interfaces(&self) -> impl Iterator<Item = &'a Communication> + 'a {
        let c = self.component;
        c.requires
            .iter()
            .chain(&c.implements)
            .chain(&c.subscribes_to)
            .chain(&c.publishes)
    }

    pub fn is_agm_agent(&self) -> bool {
        self.component.has_option("agmagent")
    }

    pub fn is_agm2_agent(&self) -> bool {
        self.component.has_option("agm2agent") || self.component.has_option("agm2agentros")
    }

    pub fn ice_interface_names(&self) -> &'a [String] {
        &self.component.ice_interfaces
    }

    pub fn ros_interface_names(&self) -> &'a [String] {
        &self.component.ros_interfaces
    }

    pub fn uses_ros(&self) -> bool {
        self.component.using_ros
    }

    /// Check every referenced interface is declared by some pooled module.
    pub fn validate_interfaces(&self) -> Result<()> {
        for comm in self.required_interfaces() {
            if let Err(e) = self.pool.require_provider(&comm.name) {
                error!(component = %self.component.name, interface = %comm.name, "interface not found in the pool");
                return Err(e);
            }
        }
        Ok(())
    }

    /// The module declaring `interface`, wrapped for navigation.
    pub fn interface_view(&self, interface: &str) -> Result<InterfaceView> {
        self.pool.require_provider(interface).map(InterfaceView::new)
    }

    /// Each entry of one clause with the module providing it.
    pub fn interface_views(&self, kind: CommKind) -> Result<Vec<(&'a Communication, InterfaceView)>> {
        self.communications(kind)
            .iter()
            .map(|comm| Ok((comm, self.interface_view(&comm.name)?)))
            .collect()
    }

    /// The component's own state machine, or the built-in one.
    pub fn statemachine_or_default(&self) -> Cow<'a, StateMachine> {
        match &self.component.statemachine {
            Some(sm) => Cow::Borrowed(sm),
            None => Cow::Owned(StateMachine::builtin()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Transport;
    use crate::dsl;
    use crate::error::DslError;
    use crate::pool::PoolConfig;
    use tempfile::TempDir;

    fn setup(cdsl: &str) -> (TempDir, ModulePool, Component) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("Laser.idsl"),
            "module RoboCompLaser { interface Laser { int getData(out float d); }; };",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("Topic.idsl"),
            "module RoboCompTopic { interface Topic { void push(int v); }; };",
        )
        .unwrap();
        let pool = ModulePool::new(PoolConfig::isolated([dir.path()]));
        let component = Component::from_tree(dsl::parse_component(cdsl).unwrap(), None).unwrap();
        pool.resolve_imports(&component.imports).unwrap();
        (dir, pool, component)
    }

    #[test]
    fn test_required_interfaces_order() {
        let (_dir, pool, comp) = setup(
            r#"import "Laser.idsl"; import "Topic.idsl";
component c {
    communications { publishes Topic; requires Laser(ros); };
    language cpp;
};"#,
        );
        let view = ComponentView::new(&comp, &pool);
        let names: Vec<_> = view.required_interfaces().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Laser", "Topic"]);
        assert!(view.uses_ros());
        assert_eq!(view.ros_interface_names().to_vec(), vec!["Laser"]);
        assert_eq!(view.communications(CommKind::Requires)[0].transport, Transport::Ros);
        assert!(view.validate_interfaces().is_ok());

        let views = view.interface_views(CommKind::Publishes).unwrap();
        assert!(views[0].1.is_valid_pubsub());
        assert_eq!(views[0].1.module_name(), "RoboCompTopic");
    }

    #[test]
    fn test_missing_interface() {
        let (_dir, pool, comp) = setup(
            r#"import "Laser.idsl";
component c {
    communications { requires Laser, Camera; };
    language cpp;
};"#,
        );
        let view = ComponentView::new(&comp, &pool);
        match view.validate_interfaces().unwrap_err() {
            DslError::InterfaceNotFound { name, known } => {
                assert_eq!(name, "Camera");
                assert_eq!(known, vec!["Laser"]);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_default_statemachine() {
        let (_dir, pool, comp) = setup("component c { communications { }; language python; };");
        let view = ComponentView::new(&comp, &pool);
        assert!(!view.is_agm_agent());
        assert!(view.statemachine_or_default().is_default());
        assert_eq!(view.language(), Language::Python);
    }
}
