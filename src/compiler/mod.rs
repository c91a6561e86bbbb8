// Each step in the front end turns one datatype into another:
// ~> Source (string)
// -> Tokens  : lex.rs
// -> AST     : parse.rs
// ~> Evaluate (the eval module walks the AST directly, no bytecode step)

pub mod lex;
pub mod parse;

pub mod token;
pub mod ast;

pub mod syntax;
