//! Raw parse trees produced by the grammar rules.
//!
//! These mirror the source text closely: optional grammar fields stay
//! optional here and only get their defaults during normalization
//! (see [`crate::ast`]).

/// Raw result of parsing a file in any dialect.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseTree {
    Interface(IdslTree),
    Component(CdslTree),
    StateMachine(SmdslTree),
}

/// An `import "path";` line.
#[derive(Debug, Clone, PartialEq)]
pub struct RawImport {
    pub path: String,
    pub line: usize,
}

// ============ Interface dialect ============

#[derive(Debug, Clone, PartialEq)]
pub struct IdslTree {
    pub imports: Vec<RawImport>,
    pub module: RawModule,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawModule {
    pub name: String,
    pub line: usize,
    pub contents: Vec<RawContent>,
}

/// One declaration inside a `module { ... }` block.
#[derive(Debug, Clone, PartialEq)]
pub enum RawContent {
    Struct { name: String, fields: Vec<RawField> },
    Exception { name: String, fields: Vec<RawField> },
    /// Enumerator list kept verbatim
    Enum { name: String, content: String },
    Sequence { name: String, element: String },
    Dictionary { name: String, key: String, value: String },
    Interface(RawInterface),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawField {
    pub type_name: String,
    pub name: String,
    pub default: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawInterface {
    pub name: String,
    pub line: usize,
    pub methods: Vec<RawMethod>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawMethod {
    pub decorator: Option<String>,
    pub return_type: String,
    pub name: String,
    pub params: Vec<RawParam>,
    pub throws: Option<Vec<String>>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawParam {
    pub out: bool,
    pub type_name: String,
    pub name: String,
}

// ============ Component dialect ============

#[derive(Debug, Clone, PartialEq)]
pub struct CdslTree {
    pub imports: Vec<RawImport>,
    pub component: RawComponent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawComponent {
    pub name: String,
    pub line: usize,
    pub communications: Vec<RawCommClause>,
    pub language: String,
    pub gui: Option<RawGui>,
    pub options: Vec<String>,
    /// `InnerModelViewer true;`
    pub innermodelviewer: Option<bool>,
    pub statemachine: Option<RawStateMachineRef>,
}

/// `implements A, B(ros);` and friends.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCommClause {
    /// Clause keyword as written (`implements`, `requires`, ...)
    pub keyword: String,
    pub entries: Vec<RawCommEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawCommEntry {
    pub name: String,
    pub transport: Option<String>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawGui {
    pub library: String,
    pub widget: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawStateMachineRef {
    pub path: String,
    pub visual: bool,
}

// ============ State machine dialect ============

#[derive(Debug, Clone, PartialEq)]
pub struct SmdslTree {
    pub machine: RawMachine,
    pub substates: Vec<RawSubMachine>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawMachine {
    pub name: String,
    pub line: usize,
    pub body: RawMachineBody,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawSubMachine {
    pub parent: String,
    pub parallel: bool,
    pub line: usize,
    pub body: RawMachineBody,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawMachineBody {
    pub states: Option<Vec<String>>,
    pub initial_state: Option<String>,
    pub end_state: Option<String>,
    pub transitions: Vec<RawTransition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawTransition {
    pub src: String,
    pub dests: Vec<String>,
    pub line: usize,
}
