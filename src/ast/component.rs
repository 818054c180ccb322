//! Normalized component descriptions (`.cdsl`).

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use tracing::debug;

use super::module::import_basename;
use super::statemachine::StateMachine;
use crate::dsl::tree::{CdslTree, RawCommEntry};
use crate::error::{DslError, Result};

/// Middleware a communication entry runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    #[default]
    Ice,
    Ros,
}

impl Transport {
    /// Classify an optional transport tag. No tag means ICE; the two known
    /// tags are matched case-insensitively.
    pub fn classify(interface: &str, tag: Option<&str>) -> Result<Self> {
        match tag {
            None => Ok(Self::Ice),
            Some(t) if t.eq_ignore_ascii_case("ice") => Ok(Self::Ice),
            Some(t) if t.eq_ignore_ascii_case("ros") => Ok(Self::Ros),
            Some(t) => Err(DslError::invalid_transport(interface, t)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ice => "ice",
            Self::Ros => "ros",
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One interface reference inside a communication clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Communication {
    pub name: String,
    pub transport: Transport,
}

impl Communication {
    pub fn new(name: impl Into<String>, transport: Transport) -> Self {
        Self {
            name: name.into(),
            transport,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Cpp,
    Cpp11,
    Python,
}

impl Language {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "cpp" => Some(Self::Cpp),
            "cpp11" => Some(Self::Cpp11),
            "python" => Some(Self::Python),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cpp => "cpp",
            Self::Cpp11 => "cpp11",
            Self::Python => "python",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Gui {
    pub library: String,
    pub widget: String,
}

/// Which communication clause an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommKind {
    Implements,
    Requires,
    SubscribesTo,
    Publishes,
}

impl CommKind {
    pub const ALL: [CommKind; 4] = [
        CommKind::Implements,
        CommKind::Requires,
        CommKind::SubscribesTo,
        CommKind::Publishes,
    ];

    fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "implements" => Some(Self::Implements),
            "requires" => Some(Self::Requires),
            "subscribesTo" => Some(Self::SubscribesTo),
            "publishes" => Some(Self::Publishes),
            _ => None,
        }
    }
}

const AGM1_IMPORTS: [&str; 4] = [
    "AGMExecutive.idsl",
    "AGMCommonBehavior.idsl",
    "AGMWorldModel.idsl",
    "AGMExecutiveTopic.idsl",
];
const AGM1_ICE_INTERFACES: [&str; 4] = [
    "AGMCommonBehavior",
    "AGMExecutive",
    "AGMExecutiveTopic",
    "AGMWorldModel",
];
const AGM2_IMPORTS: [&str; 1] = ["AGM2.idsl"];

/// A generatable component, after normalization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Component {
    pub name: String,
    pub file_path: Option<PathBuf>,
    pub language: Language,
    /// Import basenames, convention imports included, sorted and unique
    pub imports: Vec<String>,
    /// Filled in once the imports have been resolved by the pool
    pub recursive_imports: Vec<String>,
    pub implements: Vec<Communication>,
    pub requires: Vec<Communication>,
    #[serde(rename = "subscribesTo")]
    pub subscribes_to: Vec<Communication>,
    pub publishes: Vec<Communication>,
    /// Lower-cased, in declaration order
    pub options: Vec<String>,
    pub gui: Option<Gui>,
    pub statemachine_path: Option<String>,
    pub statemachine_visual: bool,
    /// Loaded by the factory from `statemachine_path`
    pub statemachine: Option<StateMachine>,
    pub innermodelviewer: bool,
    pub ice_interfaces: Vec<String>,
    pub ros_interfaces: Vec<String>,
    #[serde(rename = "usingROS")]
    pub using_ros: bool,
}

fn push_unique(list: &mut Vec<String>, name: &str) {
    if !list.iter().any(|n| n == name) {
        list.push(name.to_string());
    }
}

fn prepend_if_absent(list: &mut Vec<Communication>, name: &str, transport: Transport) {
    if !list.iter().any(|c| c.name == name) {
        list.insert(0, Communication::new(name, transport));
    }
}

impl Component {
    /// Build a component from its raw parse tree.
    pub fn from_tree(tree: CdslTree, file_path: Option<PathBuf>) -> Result<Self> {
        let raw = tree.component;
        debug!(component = %raw.name, "building component");

        let mut options: Vec<String> = Vec::new();
        for option in &raw.options {
            push_unique(&mut options, &option.to_ascii_lowercase());
        }
        let has = |flag: &str| options.iter().any(|o| o == flag);
        let agm1 = has("agmagent");
        let agm2_ros = has("agm2agentros");
        let agm2 = agm2_ros || has("agm2agent");

        let mut imports: Vec<String> = tree
            .imports
            .iter()
            .map(|import| import_basename(&import.path))
            .collect();
        if agm1 {
            imports.extend(AGM1_IMPORTS.iter().map(|s| s.to_string()));
        }
        if agm2 {
            imports.extend(AGM2_IMPORTS.iter().map(|s| s.to_string()));
        }
        imports.sort();
        imports.dedup();

        let language = Language::parse(&raw.language).ok_or_else(|| DslError::Parse {
            line: raw.line,
            text: String::new(),
            message: format!("unsupported language '{}'", raw.language),
        })?;

        let mut component = Self {
            name: raw.name,
            file_path,
            language,
            imports,
            recursive_imports: Vec::new(),
            implements: Vec::new(),
            requires: Vec::new(),
            subscribes_to: Vec::new(),
            publishes: Vec::new(),
            innermodelviewer: raw.innermodelviewer.unwrap_or(false) || has("innermodelviewer"),
            options: Vec::new(),
            gui: raw.gui.map(|g| Gui {
                library: g.library,
                widget: g.widget,
            }),
            statemachine_visual: raw.statemachine.as_ref().map_or(false, |sm| sm.visual),
            statemachine_path: raw.statemachine.map(|sm| sm.path),
            statemachine: None,
            ice_interfaces: Vec::new(),
            ros_interfaces: Vec::new(),
            using_ros: false,
        };

        for kind in CommKind::ALL {
            let mut entries: Vec<&RawCommEntry> = raw
                .communications
                .iter()
                .filter(|clause| CommKind::from_keyword(&clause.keyword) == Some(kind))
                .flat_map(|clause| clause.entries.iter())
                .collect();
            entries.sort_by(|a, b| a.name.cmp(&b.name));

            for entry in entries {
                let transport = Transport::classify(&entry.name, entry.transport.as_deref())?;
                match transport {
                    Transport::Ice => push_unique(&mut component.ice_interfaces, &entry.name),
                    Transport::Ros => {
                        push_unique(&mut component.ros_interfaces, &entry.name);
                        component.using_ros = true;
                    }
                }
                component
                    .communications_mut(kind)
                    .push(Communication::new(entry.name.clone(), transport));
            }
        }

        if agm1 {
            component.apply_agm1_conventions();
        }
        if agm2 {
            component.apply_agm2_conventions(if agm2_ros { Transport::Ros } else { Transport::Ice });
        }
        component.options = options;

        Ok(component)
    }

    fn apply_agm1_conventions(&mut self) {
        for name in AGM1_ICE_INTERFACES {
            push_unique(&mut self.ice_interfaces, name);
        }
        prepend_if_absent(&mut self.implements, "AGMCommonBehavior", Transport::Ice);
        prepend_if_absent(&mut self.requires, "AGMExecutive", Transport::Ice);
        prepend_if_absent(&mut self.subscribes_to, "AGMExecutiveTopic", Transport::Ice);
    }

    fn apply_agm2_conventions(&mut self, transport: Transport) {
        if transport == Transport::Ros {
            self.using_ros = true;
        }
        let names = match transport {
            Transport::Ice => &mut self.ice_interfaces,
            Transport::Ros => &mut self.ros_interfaces,
        };
        for name in ["AGMDSRService", "AGMDSRTopic", "AGMExecutiveTopic"] {
            push_unique(names, name);
        }
        prepend_if_absent(&mut self.requires, "AGMDSRService", transport);
        for name in ["AGMExecutiveTopic", "AGMDSRTopic"] {
            prepend_if_absent(&mut self.subscribes_to, name, transport);
        }
    }

    pub fn communications(&self, kind: CommKind) -> &[Communication] {
        match kind {
            CommKind::Implements => &self.implements,
            CommKind::Requires => &self.requires,
            CommKind::SubscribesTo => &self.subscribes_to,
            CommKind::Publishes => &self.publishes,
        }
    }

    fn communications_mut(&mut self, kind: CommKind) -> &mut Vec<Communication> {
        match kind {
            CommKind::Implements => &mut self.implements,
            CommKind::Requires => &mut self.requires,
            CommKind::SubscribesTo => &mut self.subscribes_to,
            CommKind::Publishes => &mut self.publishes,
        }
    }

    pub fn has_option(&self, option: &str) -> bool {
        let option = option.to_ascii_lowercase();
        self.options.iter().any(|o| *o == option)
    }
}
