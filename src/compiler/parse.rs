use std::rc::Rc;

use crate::common::{source::Source, span::{Span, Spanned}};
use crate::compiler::{
    ast::{BinOp, ConnectiveKind, Param, QuantifierKind, Relation, UnOp, AST},
    syntax::Syntax,
    token::{Keyword, Punct, Token},
};

/// Recursive-descent parser with a Pratt-style precedence ladder for binary
/// operators (assignment < implication < or < and < equality < comparison <
/// additive < multiplicative < unary < primary). A single `in_logic` flag,
/// set while parsing a quantifier body, switches the equality/comparison and
/// and/or tiers over to the formal-logic node kinds (`MathEquation`,
/// `LogicalConnective`) instead of the ordinary `BinaryOp`.
pub struct Parser {
    tokens: Vec<Spanned<Token>>,
    index: usize,
    source: Rc<Source>,
    in_logic: bool,
}

impl Parser {
    pub fn parse(tokens: Vec<Spanned<Token>>, source: Rc<Source>) -> Result<Spanned<AST>, Syntax> {
        let mut parser = Parser { tokens, index: 0, source, in_logic: false };
        let start = parser.current_span();
        let mut statements = vec![];
        while !parser.at_eof() {
            statements.push(parser.statement()?);
        }
        let span = Span::combine(&start, &parser.current_span());
        Ok(Spanned::new(AST::compound(statements), span))
    }

    // -- token-stream primitives -------------------------------------------

    fn peek(&self) -> &Token {
        &self.tokens[self.index].item
    }

    fn current_span(&self) -> Span {
        self.tokens[self.index].span.clone()
    }

    fn previous_span(&self) -> Span {
        self.tokens[self.index.saturating_sub(1)].span.clone()
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek(), Token::Eof)
    }

    fn advance(&mut self) -> Spanned<Token> {
        let current = self.tokens[self.index].clone();
        if self.index + 1 < self.tokens.len() {
            self.index += 1;
        }
        current
    }

    fn check_punct(&self, p: Punct) -> bool {
        matches!(self.peek(), Token::Punct(q) if *q == p)
    }

    fn check_keyword(&self, k: Keyword) -> bool {
        matches!(self.peek(), Token::Keyword(q) if *q == k)
    }

    fn eat_punct(&mut self, p: Punct) -> bool {
        if self.check_punct(p) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, k: Keyword) -> bool {
        if self.check_keyword(k) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, p: Punct) -> Result<Span, Syntax> {
        if self.check_punct(p) {
            Ok(self.advance().span)
        } else {
            Err(self.unexpected(&format!("'{}'", Token::Punct(p))))
        }
    }

    fn expect_keyword(&mut self, k: Keyword) -> Result<Span, Syntax> {
        if self.check_keyword(k) {
            Ok(self.advance().span)
        } else {
            Err(self.unexpected(&format!("'{}'", Token::Keyword(k))))
        }
    }

    fn expect_ident(&mut self) -> Result<(String, Span), Syntax> {
        match self.peek().clone() {
            Token::Ident(name) => {
                let span = self.advance().span;
                Ok((name, span))
            }
            _ => Err(self.unexpected("an identifier")),
        }
    }

    fn unexpected(&self, expected: &str) -> Syntax {
        Syntax::error_with_hint(
            &format!("unexpected {}", self.peek()),
            &self.current_span(),
            &format!("expected {}", expected),
        )
    }

    // -- statements ----------------------------------------------------------

    fn statement(&mut self) -> Result<Spanned<AST>, Syntax> {
        match self.peek().clone() {
            Token::Keyword(Keyword::Set) => self.var_def_or_assignment(),
            Token::Keyword(Keyword::Function) => self.function_def(),
            Token::Keyword(Keyword::Class) => self.class_def(),
            Token::Keyword(Keyword::If) => self.if_stmt(),
            Token::Keyword(Keyword::While) => self.while_stmt(),
            Token::Keyword(Keyword::For) => self.for_stmt(),
            Token::Keyword(Keyword::Return) => self.return_stmt(),
            Token::Keyword(Keyword::Throw) => self.throw_stmt(),
            Token::Keyword(Keyword::Try) => self.try_stmt(),
            Token::Keyword(Keyword::Import) => self.import_stmt(),
            Token::Keyword(Keyword::Export) => self.export_stmt(),
            _ => self.expr(),
        }
    }

    fn block(&mut self) -> Result<Spanned<AST>, Syntax> {
        let start = self.expect_punct(Punct::LBrace)?;
        let mut statements = vec![];
        while !self.check_punct(Punct::RBrace) && !self.at_eof() {
            statements.push(self.statement()?);
        }
        let end = self.expect_punct(Punct::RBrace)?;
        Ok(Spanned::new(AST::compound(statements), Span::combine(&start, &end)))
    }

    /// `set IDENT expr` (a binding) or `set IDENT(.prop)+ expr` / `set
    /// @path(.prop)* expr` (a dotted/file assignment). No `=` sign: the
    /// `set`-prefixed form never uses one, unlike a bare `lvalue = rvalue`
    /// expression statement.
    fn var_def_or_assignment(&mut self) -> Result<Spanned<AST>, Syntax> {
        let start = self.expect_keyword(Keyword::Set)?;

        if self.check_punct(Punct::At) {
            let (path, property_path) = self.file_target()?;
            let value = self.expr()?;
            let span = Span::combine(&start, &value.span);
            return Ok(Spanned::new(
                AST::FilePut { path: Box::new(path), property_path, value: Box::new(value) },
                span,
            ));
        }

        let (name, name_span) = self.expect_ident()?;
        let mut properties = vec![];
        while self.eat_punct(Punct::Dot) {
            properties.push(self.expect_ident()?.0);
        }

        let value = self.expr()?;
        let span = Span::combine(&start, &value.span);

        if properties.is_empty() {
            return Ok(Spanned::new(AST::VariableDefinition { name, value: Box::new(value) }, span));
        }

        let mut lvalue = Spanned::new(AST::Variable(name), name_span.clone());
        for property in properties {
            let property_span = lvalue.span.clone();
            lvalue = Spanned::new(
                AST::PropertyAccess { object: Box::new(lvalue), property },
                property_span,
            );
        }
        Ok(Spanned::new(AST::Assignment { lvalue: Box::new(lvalue), rvalue: Box::new(value) }, span))
    }

    fn params(&mut self) -> Result<Vec<Param>, Syntax> {
        self.expect_punct(Punct::LParen)?;
        let mut params = vec![];
        while !self.check_punct(Punct::RParen) {
            if self.eat_punct(Punct::Ellipsis) {
                params.push(Param::Spread(self.expect_ident()?.0));
            } else {
                params.push(Param::Named(self.expect_ident()?.0));
            }
            if !self.eat_punct(Punct::Comma) {
                break;
            }
        }
        self.expect_punct(Punct::RParen)?;
        Ok(params)
    }

    fn function_def(&mut self) -> Result<Spanned<AST>, Syntax> {
        let start = self.expect_keyword(Keyword::Function)?;
        let (name, _) = self.expect_ident()?;
        let params = self.params()?;
        let body = self.block()?;
        let span = Span::combine(&start, &body.span);
        Ok(Spanned::new(AST::FunctionDefinition { name: Some(name), params, body: Box::new(body) }, span))
    }

    fn class_def(&mut self) -> Result<Spanned<AST>, Syntax> {
        let start = self.expect_keyword(Keyword::Class)?;
        let (name, _) = self.expect_ident()?;
        let parent = if self.eat_keyword(Keyword::Extends) { Some(self.expect_ident()?.0) } else { None };

        self.expect_punct(Punct::LBrace)?;
        let mut methods = vec![];
        while !self.check_punct(Punct::RBrace) && !self.at_eof() {
            methods.push(self.function_def()?);
        }
        let end = self.expect_punct(Punct::RBrace)?;

        Ok(Spanned::new(
            AST::ClassDefinition { name, parent, methods },
            Span::combine(&start, &end),
        ))
    }

    fn if_stmt(&mut self) -> Result<Spanned<AST>, Syntax> {
        let start = self.expect_keyword(Keyword::If)?;
        let condition = self.expr()?;
        let then_branch = self.block()?;
        let (else_branch, end) = if self.eat_keyword(Keyword::Else) {
            let branch = if self.check_keyword(Keyword::If) { self.if_stmt()? } else { self.block()? };
            let span = branch.span.clone();
            (Some(Box::new(branch)), span)
        } else {
            let span = then_branch.span.clone();
            (None, span)
        };
        Ok(Spanned::new(
            AST::If { condition: Box::new(condition), then_branch: Box::new(then_branch), else_branch },
            Span::combine(&start, &end),
        ))
    }

    fn while_stmt(&mut self) -> Result<Spanned<AST>, Syntax> {
        let start = self.expect_keyword(Keyword::While)?;
        let condition = self.expr()?;
        let body = self.block()?;
        let span = Span::combine(&start, &body.span);
        Ok(Spanned::new(AST::While { condition: Box::new(condition), body: Box::new(body) }, span))
    }

    fn for_stmt(&mut self) -> Result<Spanned<AST>, Syntax> {
        let start = self.expect_keyword(Keyword::For)?;
        let (variable, _) = self.expect_ident()?;
        self.expect_keyword(Keyword::In)?;
        let iterable = self.expr()?;
        let body = self.block()?;
        let span = Span::combine(&start, &body.span);
        Ok(Spanned::new(AST::For { variable, iterable: Box::new(iterable), body: Box::new(body) }, span))
    }

    fn return_stmt(&mut self) -> Result<Spanned<AST>, Syntax> {
        let start = self.expect_keyword(Keyword::Return)?;
        if self.starts_statement_boundary() {
            return Ok(Spanned::new(AST::Return(None), start));
        }
        let value = self.expr()?;
        let span = Span::combine(&start, &value.span);
        Ok(Spanned::new(AST::Return(Some(Box::new(value))), span))
    }

    fn throw_stmt(&mut self) -> Result<Spanned<AST>, Syntax> {
        let start = self.expect_keyword(Keyword::Throw)?;
        let value = self.expr()?;
        let span = Span::combine(&start, &value.span);
        Ok(Spanned::new(AST::Throw(Box::new(value)), span))
    }

    fn try_stmt(&mut self) -> Result<Spanned<AST>, Syntax> {
        let start = self.expect_keyword(Keyword::Try)?;
        let try_body = self.block()?;
        self.expect_keyword(Keyword::Catch)?;
        self.expect_punct(Punct::LParen)?;
        let (exception_var, _) = self.expect_ident()?;
        self.expect_punct(Punct::RParen)?;
        let catch_body = self.block()?;
        let span = Span::combine(&start, &catch_body.span);
        Ok(Spanned::new(
            AST::TryCatch { try_body: Box::new(try_body), exception_var, catch_body: Box::new(catch_body) },
            span,
        ))
    }

    /// `import "path"` or `import "path" { a, b }`.
    fn import_stmt(&mut self) -> Result<Spanned<AST>, Syntax> {
        let start = self.expect_keyword(Keyword::Import)?;
        let path_span = self.current_span();
        let path = match self.peek().clone() {
            Token::String(s) => {
                self.advance();
                s
            }
            _ => return Err(self.unexpected("a string literal module path")),
        };
        let mut bindings = vec![];
        let mut end = path_span;
        if self.check_punct(Punct::LBrace) {
            self.advance();
            while !self.check_punct(Punct::RBrace) {
                bindings.push(self.expect_ident()?.0);
                if !self.eat_punct(Punct::Comma) {
                    break;
                }
            }
            end = self.expect_punct(Punct::RBrace)?;
        }
        Ok(Spanned::new(AST::Import { path, bindings }, Span::combine(&start, &end)))
    }

    fn export_stmt(&mut self) -> Result<Spanned<AST>, Syntax> {
        let start = self.expect_keyword(Keyword::Export)?;
        let (name, end) = self.expect_ident()?;
        Ok(Spanned::new(AST::Export { name }, Span::combine(&start, &end)))
    }

    /// Heuristic used only by `return` to decide whether a value follows:
    /// true at a block/statement boundary or EOF.
    fn starts_statement_boundary(&self) -> bool {
        self.at_eof() || self.check_punct(Punct::RBrace) || self.check_punct(Punct::Semi)
    }

    // -- expressions -----------------------------------------------------

    fn expr(&mut self) -> Result<Spanned<AST>, Syntax> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Spanned<AST>, Syntax> {
        let lvalue = self.implication()?;

        if !self.in_logic && self.check_punct(Punct::Assign) {
            if !matches!(lvalue.item, AST::Variable(_) | AST::PropertyAccess { .. }) {
                return Err(Syntax::error("invalid assignment target", &lvalue.span));
            }
            self.advance();
            let rvalue = self.assignment()?;
            let span = Span::combine(&lvalue.span, &rvalue.span);
            return Ok(Spanned::new(
                AST::Assignment { lvalue: Box::new(lvalue), rvalue: Box::new(rvalue) },
                span,
            ));
        }

        Ok(lvalue)
    }

    /// `→`/`⇒` or the `implies`/`iff` keywords (material implication /
    /// biconditional), logic-context only.
    fn implication(&mut self) -> Result<Spanned<AST>, Syntax> {
        let mut left = self.or()?;
        while self.in_logic
            && (self.check_punct(Punct::Arrow)
                || self.check_punct(Punct::FatArrow)
                || self.check_keyword(Keyword::Implies)
                || self.check_keyword(Keyword::Iff))
        {
            let kind = if self.check_punct(Punct::Arrow) || self.check_keyword(Keyword::Implies) {
                ConnectiveKind::Implies
            } else {
                ConnectiveKind::Iff
            };
            self.advance();
            let right = self.or()?;
            let span = Span::combine(&left.span, &right.span);
            left = Spanned::new(AST::LogicalConnective { kind, operands: vec![left, right] }, span);
        }
        Ok(left)
    }

    fn or(&mut self) -> Result<Spanned<AST>, Syntax> {
        let mut left = self.and()?;
        loop {
            let matches = self.check_keyword(Keyword::Or)
                || (self.in_logic && (self.check_punct(Punct::LogOr) || self.check_punct(Punct::Oplus)));
            if !matches {
                break;
            }
            self.advance();
            let right = self.and()?;
            let span = Span::combine(&left.span, &right.span);
            left = if self.in_logic {
                Spanned::new(AST::LogicalConnective { kind: ConnectiveKind::Or, operands: vec![left, right] }, span)
            } else {
                Spanned::new(AST::BinaryOp { op: BinOp::Or, left: Box::new(left), right: Box::new(right) }, span)
            };
        }
        Ok(left)
    }

    fn and(&mut self) -> Result<Spanned<AST>, Syntax> {
        let mut left = self.equality()?;
        loop {
            let matches = self.check_keyword(Keyword::And)
                || (self.in_logic && (self.check_punct(Punct::LogAnd) || self.check_punct(Punct::Otimes)));
            if !matches {
                break;
            }
            self.advance();
            let right = self.equality()?;
            let span = Span::combine(&left.span, &right.span);
            left = if self.in_logic {
                Spanned::new(AST::LogicalConnective { kind: ConnectiveKind::And, operands: vec![left, right] }, span)
            } else {
                Spanned::new(AST::BinaryOp { op: BinOp::And, left: Box::new(left), right: Box::new(right) }, span)
            };
        }
        Ok(left)
    }

    fn equality(&mut self) -> Result<Spanned<AST>, Syntax> {
        let mut left = self.comparison()?;
        loop {
            let (op, relation) = if self.in_logic && self.check_punct(Punct::Assign) {
                (None, Some(Relation::Eq))
            } else if self.check_punct(Punct::Eq) {
                (Some(BinOp::Eq), Some(Relation::Eq))
            } else if self.check_punct(Punct::NotEq) {
                (Some(BinOp::NotEq), Some(Relation::NotEq))
            } else {
                break;
            };
            self.advance();
            let right = self.comparison()?;
            let span = Span::combine(&left.span, &right.span);
            left = match (self.in_logic, op) {
                (true, _) => Spanned::new(
                    AST::MathEquation { relation: relation.unwrap(), left: Box::new(left), right: Box::new(right) },
                    span,
                ),
                (false, Some(op)) => {
                    Spanned::new(AST::BinaryOp { op, left: Box::new(left), right: Box::new(right) }, span)
                }
                _ => unreachable!("non-logic equality must have a BinOp"),
            };
        }
        Ok(left)
    }

    fn comparison(&mut self) -> Result<Spanned<AST>, Syntax> {
        let mut left = self.additive()?;
        loop {
            let (op, relation) = if self.check_punct(Punct::Lt) {
                (BinOp::Lt, Relation::Lt)
            } else if self.check_punct(Punct::Gt) {
                (BinOp::Gt, Relation::Gt)
            } else if self.check_punct(Punct::LtEq) {
                (BinOp::LtEq, Relation::LtEq)
            } else if self.check_punct(Punct::GtEq) {
                (BinOp::GtEq, Relation::GtEq)
            } else {
                break;
            };
            self.advance();
            let right = self.additive()?;
            let span = Span::combine(&left.span, &right.span);
            left = if self.in_logic {
                Spanned::new(AST::MathEquation { relation, left: Box::new(left), right: Box::new(right) }, span)
            } else {
                Spanned::new(AST::BinaryOp { op, left: Box::new(left), right: Box::new(right) }, span)
            };
        }
        Ok(left)
    }

    fn additive(&mut self) -> Result<Spanned<AST>, Syntax> {
        let mut left = self.multiplicative()?;
        loop {
            let op = if self.check_punct(Punct::Plus) {
                BinOp::Add
            } else if self.check_punct(Punct::Minus) {
                BinOp::Sub
            } else {
                break;
            };
            self.advance();
            let right = self.multiplicative()?;
            let span = Span::combine(&left.span, &right.span);
            left = Spanned::new(AST::BinaryOp { op, left: Box::new(left), right: Box::new(right) }, span);
        }
        Ok(left)
    }

    fn multiplicative(&mut self) -> Result<Spanned<AST>, Syntax> {
        let mut left = self.unary()?;
        loop {
            let op = if self.check_punct(Punct::Star) {
                BinOp::Mul
            } else if self.check_punct(Punct::Slash) {
                BinOp::Div
            } else if self.check_punct(Punct::Percent) {
                BinOp::Mod
            } else {
                break;
            };
            self.advance();
            let right = self.unary()?;
            let span = Span::combine(&left.span, &right.span);
            left = Spanned::new(AST::BinaryOp { op, left: Box::new(left), right: Box::new(right) }, span);
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Spanned<AST>, Syntax> {
        if self.check_punct(Punct::Minus) {
            let start = self.advance().span;
            let operand = self.unary()?;
            let span = Span::combine(&start, &operand.span);
            return Ok(Spanned::new(AST::UnaryOp { op: UnOp::Neg, operand: Box::new(operand) }, span));
        }
        if self.check_keyword(Keyword::Not) {
            let start = self.advance().span;
            let operand = self.unary()?;
            let span = Span::combine(&start, &operand.span);
            return Ok(if self.in_logic {
                Spanned::new(AST::LogicalConnective { kind: ConnectiveKind::Not, operands: vec![operand] }, span)
            } else {
                Spanned::new(AST::UnaryOp { op: UnOp::Not, operand: Box::new(operand) }, span)
            });
        }
        if self.in_logic && self.check_punct(Punct::LogNot) {
            let start = self.advance().span;
            let operand = self.unary()?;
            let span = Span::combine(&start, &operand.span);
            return Ok(Spanned::new(AST::LogicalConnective { kind: ConnectiveKind::Not, operands: vec![operand] }, span));
        }
        self.call()
    }

    fn call(&mut self) -> Result<Spanned<AST>, Syntax> {
        let mut expr = self.primary()?;
        loop {
            if self.check_punct(Punct::LParen) {
                let (args, end) = self.arguments()?;
                let span = Span::combine(&expr.span, &end);
                expr = Spanned::new(AST::FunctionCall { callee: Box::new(expr), args }, span);
            } else if self.eat_punct(Punct::Dot) {
                let (property, end) = self.expect_ident()?;
                let span = Span::combine(&expr.span, &end);
                expr = Spanned::new(AST::PropertyAccess { object: Box::new(expr), property }, span);
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn arguments(&mut self) -> Result<(Vec<Spanned<AST>>, Span), Syntax> {
        self.expect_punct(Punct::LParen)?;
        let mut args = vec![];
        while !self.check_punct(Punct::RParen) {
            if self.check_punct(Punct::Ellipsis) {
                let start = self.advance().span;
                let inner = self.expr()?;
                let span = Span::combine(&start, &inner.span);
                args.push(Spanned::new(AST::Spread(Box::new(inner)), span));
            } else {
                args.push(self.expr()?);
            }
            if !self.eat_punct(Punct::Comma) {
                break;
            }
        }
        let end = self.expect_punct(Punct::RParen)?;
        Ok((args, end))
    }

    fn primary(&mut self) -> Result<Spanned<AST>, Syntax> {
        let span = self.current_span();
        match self.peek().clone() {
            Token::Number(n) => {
                self.advance();
                Ok(Spanned::new(AST::Number(n), span))
            }
            Token::String(s) => {
                self.advance();
                Ok(Spanned::new(AST::String(s), span))
            }
            Token::Keyword(Keyword::True) => {
                self.advance();
                Ok(Spanned::new(AST::Boolean(true), span))
            }
            Token::Keyword(Keyword::False) => {
                self.advance();
                Ok(Spanned::new(AST::Boolean(false), span))
            }
            Token::Keyword(Keyword::Null) => {
                self.advance();
                Ok(Spanned::new(AST::Null, span))
            }
            Token::Keyword(Keyword::Undecidable) => {
                self.advance();
                Ok(Spanned::new(AST::Undecidable, span))
            }
            Token::Keyword(Keyword::Print) => {
                self.advance();
                let callee = Spanned::new(AST::Variable("print".to_string()), span.clone());
                let (args, end) = self.arguments()?;
                Ok(Spanned::new(AST::FunctionCall { callee: Box::new(callee), args }, Span::combine(&span, &end)))
            }
            Token::Keyword(Keyword::Function) => self.function_like(),
            Token::Keyword(Keyword::New) => self.new_expr(),
            Token::Keyword(Keyword::Forall) | Token::Punct(Punct::ForallGlyph) => {
                self.quantifier(QuantifierKind::Universal)
            }
            Token::Keyword(Keyword::Exists) | Token::Punct(Punct::ExistsGlyph) => {
                self.quantifier(QuantifierKind::Existential)
            }
            Token::Punct(Punct::At) => self.file_reference_expr(),
            Token::Punct(Punct::LParen) => {
                self.advance();
                let inner = self.expr()?;
                self.expect_punct(Punct::RParen)?;
                Ok(inner)
            }
            Token::Punct(Punct::LBracket) => self.array_literal(),
            Token::Punct(Punct::LBrace) => self.object_literal(),
            Token::Ident(name) => {
                self.advance();
                if self.in_logic
                    && name.chars().next().is_some_and(|c| c.is_uppercase())
                    && self.check_punct(Punct::LParen)
                {
                    let (args, end) = self.arguments()?;
                    return Ok(Spanned::new(
                        AST::LogicalPredicate { name, args },
                        Span::combine(&span, &end),
                    ));
                }
                Ok(Spanned::new(AST::Variable(name), span))
            }
            _ => Err(self.unexpected("an expression")),
        }
    }

    /// `function (params) block` as an anonymous expression (`Lambda`),
    /// distinguished from the named `function-def` statement only by the
    /// absence of a name before the parameter list.
    fn function_like(&mut self) -> Result<Spanned<AST>, Syntax> {
        let start = self.expect_keyword(Keyword::Function)?;
        if let Token::Ident(_) = self.peek() {
            let (name, _) = self.expect_ident()?;
            let params = self.params()?;
            let body = self.block()?;
            let span = Span::combine(&start, &body.span);
            return Ok(Spanned::new(
                AST::FunctionDefinition { name: Some(name), params, body: Box::new(body) },
                span,
            ));
        }
        let params = self.params()?;
        let body = self.block()?;
        let span = Span::combine(&start, &body.span);
        Ok(Spanned::new(AST::Lambda { params, body: Box::new(body) }, span))
    }

    fn new_expr(&mut self) -> Result<Spanned<AST>, Syntax> {
        let start = self.expect_keyword(Keyword::New)?;
        let (class_name, _) = self.expect_ident()?;
        let (args, end) = self.arguments()?;
        Ok(Spanned::new(AST::New { class_name, args }, Span::combine(&start, &end)))
    }

    /// `forall x in D : body` / `exists x in D : body`. `body` is parsed in
    /// logic context; `D` is an ordinary expression.
    fn quantifier(&mut self, kind: QuantifierKind) -> Result<Spanned<AST>, Syntax> {
        let start = self.advance().span; // 'forall' / 'exists'
        let (variable, _) = self.expect_ident()?;
        let domain = if self.eat_keyword(Keyword::In) { Some(Box::new(self.expr()?)) } else { None };
        self.expect_punct(Punct::Colon)?;

        let was_logic = self.in_logic;
        self.in_logic = true;
        let body = self.expr();
        self.in_logic = was_logic;
        let body = body?;

        let span = Span::combine(&start, &body.span);
        Ok(Spanned::new(AST::LogicalQuantifier { kind, variable, domain, body: Box::new(body) }, span))
    }

    /// `@ident(.prop)*` (static path) or `@(expr)(.prop)*` (dynamic path).
    fn file_target(&mut self) -> Result<(Spanned<AST>, Vec<String>), Syntax> {
        self.expect_punct(Punct::At)?;
        let path = if self.eat_punct(Punct::LParen) {
            let inner = self.expr()?;
            self.expect_punct(Punct::RParen)?;
            inner
        } else {
            let (name, span) = self.expect_ident()?;
            Spanned::new(AST::String(name), span)
        };
        let mut property_path = vec![];
        while self.eat_punct(Punct::Dot) {
            property_path.push(self.expect_ident()?.0);
        }
        Ok((path, property_path))
    }

    fn file_reference_expr(&mut self) -> Result<Spanned<AST>, Syntax> {
        let start = self.current_span();
        let (path, property_path) = self.file_target()?;
        let end = path.span.clone();
        let span = Span::combine(&start, &end);
        match path.item {
            AST::String(p) => Ok(Spanned::new(AST::FileReference { path: p, property_path }, span)),
            other => Ok(Spanned::new(
                AST::FileGet { path: Box::new(Spanned::new(other, end)), property_path },
                span,
            )),
        }
    }

    fn array_literal(&mut self) -> Result<Spanned<AST>, Syntax> {
        let start = self.expect_punct(Punct::LBracket)?;
        let mut elements = vec![];
        while !self.check_punct(Punct::RBracket) {
            if self.check_punct(Punct::Ellipsis) {
                let spread_start = self.advance().span;
                let inner = self.expr()?;
                let span = Span::combine(&spread_start, &inner.span);
                elements.push(Spanned::new(AST::Spread(Box::new(inner)), span));
            } else {
                elements.push(self.expr()?);
            }
            if !self.eat_punct(Punct::Comma) {
                break;
            }
        }
        let end = self.expect_punct(Punct::RBracket)?;
        Ok(Spanned::new(AST::Array(elements), Span::combine(&start, &end)))
    }

    fn object_literal(&mut self) -> Result<Spanned<AST>, Syntax> {
        let start = self.expect_punct(Punct::LBrace)?;
        let mut entries = vec![];
        while !self.check_punct(Punct::RBrace) {
            let key = match self.peek().clone() {
                Token::Ident(name) => {
                    self.advance();
                    name
                }
                Token::String(s) => {
                    self.advance();
                    s
                }
                _ => return Err(self.unexpected("an object key")),
            };
            self.expect_punct(Punct::Colon)?;
            let value = self.expr()?;
            entries.push((key, value));
            if !self.eat_punct(Punct::Comma) {
                break;
            }
        }
        let end = self.expect_punct(Punct::RBrace)?;
        Ok(Spanned::new(AST::Object(entries), Span::combine(&start, &end)))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::compiler::lex::Lexer;

    fn parse(src: &str) -> Spanned<AST> {
        let source = Source::source(src);
        let tokens = Lexer::lex(Rc::clone(&source)).unwrap();
        Parser::parse(tokens, source).unwrap()
    }

    #[test]
    fn parses_a_var_def() {
        let ast = parse("set x 10");
        match ast.item {
            AST::Compound(stmts) => match &stmts[0].item {
                AST::VariableDefinition { name, .. } => assert_eq!(name, "x"),
                other => panic!("expected a var-def, got {:?}", other),
            },
            other => panic!("expected a compound, got {:?}", other),
        }
    }

    #[test]
    fn dotted_set_produces_an_assignment_to_a_property_access() {
        let ast = parse("set o.b.c 9");
        match ast.item {
            AST::Compound(stmts) => match &stmts[0].item {
                AST::Assignment { lvalue, .. } => match &lvalue.item {
                    AST::PropertyAccess { property, .. } => assert_eq!(property, "c"),
                    other => panic!("expected a property access, got {:?}", other),
                },
                other => panic!("expected an assignment, got {:?}", other),
            },
            other => panic!("expected a compound, got {:?}", other),
        }
    }

    #[test]
    fn bare_assignment_requires_a_valid_lvalue() {
        let source = Source::source("1 = 2");
        let tokens = Lexer::lex(Rc::clone(&source)).unwrap();
        assert!(Parser::parse(tokens, source).is_err());
    }

    #[test]
    fn precedence_binds_multiplication_tighter_than_addition() {
        let ast = parse("1 + 2 * 3");
        match ast.item {
            AST::Compound(stmts) => match &stmts[0].item {
                AST::BinaryOp { op: BinOp::Add, right, .. } => {
                    assert!(matches!(right.item, AST::BinaryOp { op: BinOp::Mul, .. }));
                }
                other => panic!("expected a top-level addition, got {:?}", other),
            },
            other => panic!("expected a compound, got {:?}", other),
        }
    }

    #[test]
    fn quantifier_body_enables_predicate_parsing() {
        let ast = parse("forall x in xs : Even(x)");
        match ast.item {
            AST::Compound(stmts) => match &stmts[0].item {
                AST::LogicalQuantifier { kind: QuantifierKind::Universal, body, .. } => {
                    assert!(matches!(body.item, AST::LogicalPredicate { .. }));
                }
                other => panic!("expected a quantifier, got {:?}", other),
            },
            other => panic!("expected a compound, got {:?}", other),
        }
    }

    #[test]
    fn file_reference_with_static_path() {
        let ast = parse("@config.host");
        match ast.item {
            AST::Compound(stmts) => match &stmts[0].item {
                AST::FileReference { path, property_path } => {
                    assert_eq!(path, "config");
                    assert_eq!(property_path, &vec!["host".to_string()]);
                }
                other => panic!("expected a file reference, got {:?}", other),
            },
            other => panic!("expected a compound, got {:?}", other),
        }
    }

    #[test]
    fn lambda_without_a_name() {
        let ast = parse("set f function(x) { return x }");
        match ast.item {
            AST::Compound(stmts) => match &stmts[0].item {
                AST::VariableDefinition { value, .. } => assert!(matches!(value.item, AST::Lambda { .. })),
                other => panic!("expected a var-def, got {:?}", other),
            },
            other => panic!("expected a compound, got {:?}", other),
        }
    }

    #[test]
    fn array_literal_with_spread() {
        let ast = parse("[1, ...rest]");
        match ast.item {
            AST::Compound(stmts) => match &stmts[0].item {
                AST::Array(elements) => {
                    assert_eq!(elements.len(), 2);
                    assert!(matches!(elements[1].item, AST::Spread(_)));
                }
                other => panic!("expected an array, got {:?}", other),
            },
            other => panic!("expected a compound, got {:?}", other),
        }
    }
}
