//! The third pipeline phase: walking an `AST` directly against a `Scope`
//! (no bytecode step). `evaluator` holds the dispatch table; `builtins`,
//! `json`, `logging`, and `fileref` are the native collaborators a program
//! reaches by calling a name the evaluator recognizes before it ever
//! consults user-defined scope.

pub mod builtins;
pub mod evaluator;
pub mod fileref;
pub mod json;
pub mod logging;
