//! Normalized hierarchical state machines (`.smdsl`).

use std::collections::HashSet;
use std::path::PathBuf;

use serde::Serialize;
use tracing::debug;

use crate::dsl::tree::{RawMachineBody, SmdslTree};
use crate::error::{DslError, Result};

/// Name of the convention machine every component gets when it does not
/// bring its own.
pub const DEFAULT_MACHINE: &str = "defaultMachine";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub src: String,
    pub dests: Vec<String>,
}

/// States and transitions of one machine level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MachineContents {
    /// `None` when the body has no `states` clause
    pub states: Option<Vec<String>>,
    /// Always set on the top-level machine; optional on sub-machines
    #[serde(rename = "initialstate")]
    pub initial_state: Option<String>,
    #[serde(rename = "finalstate")]
    pub final_state: Option<String>,
    pub transitions: Vec<Transition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Machine {
    pub name: String,
    /// True for the built-in convention machine
    pub default: bool,
    pub contents: MachineContents,
}

/// A machine nested inside a state of an enclosing machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubMachine {
    pub parent: String,
    pub parallel: bool,
    pub contents: MachineContents,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateMachine {
    pub machine: Machine,
    pub substates: Vec<SubMachine>,
    #[serde(rename = "filename")]
    pub file_path: Option<PathBuf>,
}

impl MachineContents {
    fn from_raw(raw: RawMachineBody, owner: &str) -> Result<Self> {
        if let Some(states) = &raw.states {
            let mut seen = HashSet::new();
            for state in states {
                if !seen.insert(state.as_str()) {
                    return Err(DslError::DuplicateState {
                        machine: owner.to_string(),
                        state: state.clone(),
                    });
                }
            }
        }
        Ok(Self {
            states: raw.states,
            initial_state: raw.initial_state,
            final_state: raw.end_state,
            transitions: raw
                .transitions
                .into_iter()
                .map(|t| Transition {
                    src: t.src,
                    dests: t.dests,
                })
                .collect(),
        })
    }

    /// Every state this level names: declared, initial and final.
    pub fn all_states(&self) -> impl Iterator<Item = &str> {
        self.states
            .iter()
            .flatten()
            .map(String::as_str)
            .chain(self.initial_state.as_deref())
            .chain(self.final_state.as_deref())
    }
}

impl StateMachine {
    /// Build a state machine from its raw parse tree.
    pub fn from_tree(tree: SmdslTree, file_path: Option<PathBuf>) -> Result<Self> {
        let name = tree.machine.name;
        debug!(machine = %name, substates = tree.substates.len(), "building state machine");

        let contents = MachineContents::from_raw(tree.machine.body, &name)?;
        let substates = tree
            .substates
            .into_iter()
            .map(|sub| {
                Ok(SubMachine {
                    contents: MachineContents::from_raw(sub.body, &sub.parent)?,
                    parent: sub.parent,
                    parallel: sub.parallel,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let machine = Self {
            machine: Machine {
                default: name == DEFAULT_MACHINE,
                name,
                contents,
            },
            substates,
            file_path,
        };
        machine.check_parents()?;
        Ok(machine)
    }

    /// The convention machine: `initialize => compute`, `compute` looping,
    /// with `emergency` and `restore` as recovery states.
    pub fn builtin() -> Self {
        let t = |src: &str, dests: &[&str]| Transition {
            src: src.to_string(),
            dests: dests.iter().map(|d| d.to_string()).collect(),
        };
        Self {
            machine: Machine {
                name: DEFAULT_MACHINE.to_string(),
                default: true,
                contents: MachineContents {
                    states: Some(vec![
                        "compute".to_string(),
                        "emergency".to_string(),
                        "restore".to_string(),
                    ]),
                    initial_state: Some("initialize".to_string()),
                    final_state: None,
                    transitions: vec![
                        t("initialize", &["compute"]),
                        t("compute", &["compute", "emergency"]),
                        t("emergency", &["restore"]),
                        t("restore", &["compute"]),
                    ],
                },
            },
            substates: Vec::new(),
            file_path: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.machine.name
    }

    pub fn is_default(&self) -> bool {
        self.machine.default
    }

    fn known_states(&self) -> HashSet<&str> {
        self.machine
            .contents
            .all_states()
            .chain(self.substates.iter().flat_map(|s| s.contents.all_states()))
            .collect()
    }

    fn check_parents(&self) -> Result<()> {
        let known = self.known_states();
        for sub in &self.substates {
            if !known.contains(sub.parent.as_str()) {
                return Err(DslError::UndeclaredState {
                    machine: self.machine.name.clone(),
                    state: sub.parent.clone(),
                });
            }
        }
        Ok(())
    }
}
