//! Recursive-descent parser: turns a token stream into a `Module`. Grammar
//! and dispatch tables are ported from the reference implementation's
//! `Parser` class.

use num::bigint::BigInt;

use crate::error::{LlirError, Result, SyntaxError};
use crate::function::Function;
use crate::global::Global;
use crate::instruction::{self, Instruction};
use crate::lexer::{self, Token};
use crate::module::Module;
use crate::ref_id::Ref;
use crate::term::{self, Tag, Term};
use crate::types::{self, Kind, Type};
use crate::util;

/// Modifier keywords that may precede a global or function signature; this
/// crate has nowhere to record them, so they are recognized and discarded.
const IGNORED_MODIFIERS: &[&str] = &[
    "private",
    "internal",
    "external",
    "common",
    "weak",
    "weak_odr",
    "linkonce",
    "linkonce_odr",
    "appending",
    "extern_weak",
    "available_externally",
    "dso_local",
    "dso_preemptable",
    "unnamed_addr",
    "local_unnamed_addr",
    "constant",
];

struct Parser<'a> {
    path: &'a str,
    toks: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn line(&self) -> usize {
        self.toks.get(self.pos).map(|t| t.line).unwrap_or_else(|| self.toks.last().map(|t| t.line).unwrap_or(1))
    }

    fn cur(&self) -> &str {
        self.toks.get(self.pos).map(|t| t.text.as_str()).unwrap_or("")
    }

    fn at_end(&self) -> bool {
        self.pos >= self.toks.len()
    }

    fn advance(&mut self) -> String {
        let t = self.cur().to_string();
        self.pos += 1;
        t
    }

    fn eat_newlines(&mut self) {
        while self.cur() == "\n" {
            self.pos += 1;
        }
    }

    fn unexpected_eof(&self) -> LlirError {
        SyntaxError::UnexpectedEof { path: self.path.to_string() }.into()
    }

    fn unexpected(&self, expected: impl Into<String>) -> LlirError {
        SyntaxError::UnexpectedToken {
            path: self.path.to_string(),
            line: self.line(),
            expected: expected.into(),
            token: util::describe_token(self.cur()),
        }
        .into()
    }

    fn malformed(&self, construct: impl Into<String>) -> LlirError {
        SyntaxError::MalformedConstruct {
            path: self.path.to_string(),
            line: self.line(),
            construct: construct.into(),
            token: util::describe_token(self.cur()),
        }
        .into()
    }

    fn expect(&mut self, text: &str) -> Result<()> {
        if self.at_end() {
            return Err(self.unexpected_eof());
        }
        if self.cur() != text {
            return Err(self.unexpected(format!("'{text}'")));
        }
        self.pos += 1;
        Ok(())
    }

    fn check(&self, text: &str) -> bool {
        self.cur() == text
    }

    fn skip_modifiers(&mut self) {
        while IGNORED_MODIFIERS.contains(&self.cur()) {
            self.pos += 1;
        }
    }

    fn ref_from_token(&self, tok: &str) -> Result<Ref> {
        let name = util::unwrap(tok, self.path, self.line())?;
        if !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Ref::num(name.parse().expect("validated as all-digit")))
        } else {
            Ok(Ref::name(name))
        }
    }

    /// Parses a `%name`/`@name`/`$name` token into a bare `Ref`, consuming it.
    fn sigiled_ref(&mut self, sigil: char) -> Result<Ref> {
        if !self.cur().starts_with(sigil) {
            return Err(self.unexpected(format!("'{sigil}' reference")));
        }
        let tok = self.advance();
        self.ref_from_token(&tok)
    }

    // --- Types ----------------------------------------------------------

    fn parse_type(&mut self) -> Result<Type> {
        if self.at_end() {
            return Err(self.unexpected_eof());
        }
        match self.cur() {
            "void" => {
                self.pos += 1;
                Ok(types::void_ty())
            }
            "float" => {
                self.pos += 1;
                Ok(types::float_ty())
            }
            "double" => {
                self.pos += 1;
                Ok(types::double_ty())
            }
            "ptr" => {
                self.pos += 1;
                Ok(types::ptr_ty())
            }
            "[" => {
                self.pos += 1;
                let n = self.parse_u64()?;
                self.expect("x")?;
                let elem = self.parse_type()?;
                self.expect("]")?;
                Ok(types::array_ty(n, elem))
            }
            "<" => {
                self.pos += 1;
                let n = self.parse_u64()?;
                self.expect("x")?;
                let elem = self.parse_type()?;
                self.expect(">")?;
                Ok(types::vec_ty(n, elem))
            }
            "{" => {
                self.pos += 1;
                let mut fields = Vec::new();
                if !self.check("}") {
                    loop {
                        fields.push(self.parse_type()?);
                        if self.check(",") {
                            self.pos += 1;
                            continue;
                        }
                        break;
                    }
                }
                self.expect("}")?;
                Ok(types::struct_ty(fields))
            }
            s if s.starts_with('i') && s.len() > 1 && s[1..].bytes().all(|b| b.is_ascii_digit()) => {
                let bits: u32 = s[1..].parse().map_err(|_| self.malformed("integer type"))?;
                self.pos += 1;
                Ok(types::int_ty(bits))
            }
            _ => Err(self.unexpected("a type")),
        }
    }

    fn parse_u64(&mut self) -> Result<u64> {
        let tok = self.cur().to_string();
        let v: u64 = tok.parse().map_err(|_| self.malformed("integer literal"))?;
        self.pos += 1;
        Ok(v)
    }

    // --- Expressions / operands ------------------------------------------

    /// Parses a bare value given its already-known type `ty` (the common
    /// `<type> <value>` shape has already consumed the type).
    fn parse_value(&mut self, ty: Type) -> Result<Term> {
        if self.at_end() {
            return Err(self.unexpected_eof());
        }
        let tok = self.cur().to_string();
        match tok.as_str() {
            "true" => {
                self.pos += 1;
                Ok(term::true_const())
            }
            "false" => {
                self.pos += 1;
                Ok(term::false_const())
            }
            "null" => {
                self.pos += 1;
                Ok(term::null_ptr(ty))
            }
            "zeroinitializer" => {
                self.pos += 1;
                Ok(Term::zero_of(ty))
            }
            "[" => self.parse_array_literal(ty),
            "<" => self.parse_vec_literal(ty),
            "struct" => self.parse_struct_literal(ty),
            _ if tok.starts_with('%') => {
                let r = self.sigiled_ref('%')?;
                Ok(term::var(ty, r))
            }
            _ if tok.starts_with('@') => {
                let r = self.sigiled_ref('@')?;
                Ok(term::global_ref(ty, r))
            }
            _ if tok.starts_with("c\"") => {
                self.pos += 1;
                let bytes = util::unwrap(&tok, self.path, self.line())?;
                let elems = bytes.bytes().map(|b| term::int_const(types::int_ty(8), b as i64)).collect();
                Ok(term::array(types::int_ty(8), elems))
            }
            _ => self.parse_numeric_literal(&tok, ty),
        }
    }

    fn parse_numeric_literal(&mut self, tok: &str, ty: Type) -> Result<Term> {
        let looks_float = tok.contains('.') || tok.contains('e') || tok.contains('E') || tok == "inf" || tok == "nan";
        if looks_float || ty.is_float() {
            self.pos += 1;
            return Ok(term::float_const(ty, tok));
        }
        let value: BigInt = tok.parse().map_err(|_| self.malformed("integer literal"))?;
        self.pos += 1;
        Ok(term::int_const(ty, value))
    }

    fn parse_array_literal(&mut self, ty: Type) -> Result<Term> {
        self.expect("[")?;
        let elem_ty = ty.component(0).ok_or_else(|| self.malformed("array literal against non-array type"))?;
        let mut elems = Vec::new();
        if !self.check("]") {
            loop {
                self.parse_type()?;
                elems.push(self.parse_value(elem_ty.clone())?);
                if self.check(",") {
                    self.pos += 1;
                    continue;
                }
                break;
            }
        }
        self.expect("]")?;
        Ok(term::array(elem_ty, elems))
    }

    fn parse_vec_literal(&mut self, ty: Type) -> Result<Term> {
        self.expect("<")?;
        let elem_ty = ty.component(0).ok_or_else(|| self.malformed("vector literal against non-vector type"))?;
        let mut elems = Vec::new();
        if !self.check(">") {
            loop {
                self.parse_type()?;
                elems.push(self.parse_value(elem_ty.clone())?);
                if self.check(",") {
                    self.pos += 1;
                    continue;
                }
                break;
            }
        }
        self.expect(">")?;
        Ok(term::vector(elem_ty, elems))
    }

    fn parse_struct_literal(&mut self, ty: Type) -> Result<Term> {
        self.expect("struct")?;
        self.expect("(")?;
        let mut fields = Vec::new();
        let mut i = 0usize;
        if !self.check(")") {
            loop {
                let field_ty = ty.component(i).ok_or_else(|| self.malformed("struct literal field count"))?;
                self.parse_type()?;
                fields.push(self.parse_value(field_ty)?);
                i += 1;
                if self.check(",") {
                    self.pos += 1;
                    continue;
                }
                break;
            }
        }
        self.expect(")")?;
        Ok(term::tuple(ty, fields))
    }

    /// The common `<type> <value>` operand shape.
    fn typed_operand(&mut self) -> Result<Term> {
        let ty = self.parse_type()?;
        self.parse_value(ty)
    }

    fn label_operand(&mut self) -> Result<Term> {
        self.expect("label")?;
        let r = self.sigiled_ref('%')?;
        Ok(term::label(r))
    }

    // --- rval dispatch (the right-hand side of `%x = ...`) ---------------

    fn parse_rval(&mut self) -> Result<Term> {
        let mnemonic = self.cur().to_string();
        match mnemonic.as_str() {
            "add" | "sub" | "mul" | "udiv" | "sdiv" | "urem" | "srem" | "and" | "or" | "xor" | "shl" | "lshr"
            | "ashr" | "fadd" | "fsub" | "fmul" | "fdiv" | "frem" => {
                self.pos += 1;
                let ty = self.parse_type()?;
                let a = self.parse_value(ty.clone())?;
                self.expect(",")?;
                let b = self.parse_value(ty)?;
                Ok(Self::build_binop(&mnemonic, a, b))
            }
            "icmp" => {
                self.pos += 1;
                let pred = self.advance();
                let ty = self.parse_type()?;
                let a = self.parse_value(ty.clone())?;
                self.expect(",")?;
                let b = self.parse_value(ty)?;
                self.build_icmp(&pred, a, b)
            }
            "fcmp" => {
                self.pos += 1;
                let pred = self.advance();
                let ty = self.parse_type()?;
                let a = self.parse_value(ty.clone())?;
                self.expect(",")?;
                let b = self.parse_value(ty)?;
                self.build_fcmp(&pred, a, b)
            }
            "fneg" => {
                self.pos += 1;
                let ty = self.parse_type()?;
                let a = self.parse_value(ty)?;
                Ok(term::fneg(a))
            }
            "not" => {
                self.pos += 1;
                let ty = self.parse_type()?;
                let a = self.parse_value(ty)?;
                Ok(term::not(a))
            }
            "load" => {
                self.pos += 1;
                let ty = self.parse_type()?;
                self.expect(",")?;
                self.expect("ptr")?;
                let ptr = self.parse_value(types::ptr_ty())?;
                Ok(term::load(ty, ptr))
            }
            "zext" | "trunc" | "bitcast" | "ptrtoint" | "inttoptr" | "fptrunc" | "fpext" | "fptoui" | "uitofp"
            | "sext" | "fptosi" | "sitofp" => {
                self.pos += 1;
                let src_ty = self.parse_type()?;
                let a = self.parse_value(src_ty)?;
                self.expect("to")?;
                let dst_ty = self.parse_type()?;
                if matches!(mnemonic, "sext" | "fptosi" | "sitofp") {
                    Ok(term::scast(dst_ty, a))
                } else {
                    Ok(term::cast(dst_ty, a))
                }
            }
            "getelementptr" => {
                self.pos += 1;
                if self.check("inbounds") {
                    self.pos += 1;
                }
                let mut cur_ty = self.parse_type()?;
                self.expect(",")?;
                self.expect("ptr")?;
                let mut base = self.parse_value(types::ptr_ty())?;
                loop {
                    self.expect(",")?;
                    let idx_ty = self.parse_type()?;
                    let idx = self.parse_value(idx_ty)?;
                    let witness = Term::zero_of(cur_ty.clone());
                    if cur_ty.kind() == Kind::Struct {
                        use num::ToPrimitive;
                        let field_index = idx
                            .int_val()
                            .and_then(|v| v.to_u32())
                            .ok_or_else(|| self.malformed("struct index in getelementptr"))?
                            as usize;
                        cur_ty = cur_ty
                            .component(field_index)
                            .ok_or_else(|| self.malformed("struct field index out of range"))?;
                        base = term::field_ptr(witness, base, idx);
                    } else {
                        cur_ty = cur_ty.component(0).unwrap_or_else(|| cur_ty.clone());
                        base = term::element_ptr(witness, base, idx);
                    }
                    if !self.check(",") {
                        break;
                    }
                }
                Ok(base)
            }
            "call" => self.parse_call(),
            _ => Err(self.unexpected("an instruction opcode")),
        }
    }

    fn build_binop(mnemonic: &str, a: Term, b: Term) -> Term {
        match mnemonic {
            "add" => term::add(a, b),
            "sub" => term::sub(a, b),
            "mul" => term::mul(a, b),
            "udiv" => term::udiv(a, b),
            "sdiv" => term::sdiv(a, b),
            "urem" => term::urem(a, b),
            "srem" => term::srem(a, b),
            "and" => term::and(a, b),
            "or" => term::or(a, b),
            "xor" => term::xor(a, b),
            "shl" => term::shl(a, b),
            "lshr" => term::lshr(a, b),
            "ashr" => term::ashr(a, b),
            "fadd" => term::fadd(a, b),
            "fsub" => term::fsub(a, b),
            "fmul" => term::fmul(a, b),
            "fdiv" => term::fdiv(a, b),
            "frem" => term::frem(a, b),
            _ => unreachable!("dispatched from parse_rval's own match arm"),
        }
    }

    /// `icmp`'s ten LLVM predicates collapse onto this crate's five integer
    /// comparison tags via operand swaps (`ugt`/`uge`/`sgt`/`sge`) and
    /// negation (`ne`) — there is no dedicated "not equal" or "greater"
    /// tag.
    fn build_icmp(&mut self, pred: &str, a: Term, b: Term) -> Result<Term> {
        Ok(match pred {
            "eq" => term::eq(a, b),
            "ne" => term::not(term::eq(a, b)),
            "ult" => term::ult(a, b),
            "ule" => term::ule(a, b),
            "ugt" => term::ult(b, a),
            "uge" => term::ule(b, a),
            "slt" => term::slt(a, b),
            "sle" => term::sle(a, b),
            "sgt" => term::slt(b, a),
            "sge" => term::sle(b, a),
            _ => return Err(self.malformed("icmp predicate")),
        })
    }

    /// `fcmp`'s ordered/unordered predicate pairs both collapse onto the
    /// same ordered tag (`FEq`/`FLt`/`FLe`): this crate has no NaN-aware
    /// unordered comparison, so `ueq`/`uno`-family predicates are treated
    /// as their ordered counterpart.
    fn build_fcmp(&mut self, pred: &str, a: Term, b: Term) -> Result<Term> {
        Ok(match pred {
            "oeq" | "ueq" => term::feq(a, b),
            "one" | "une" => term::not(term::feq(a, b)),
            "olt" | "ult" => term::flt(a, b),
            "ole" | "ule" => term::fle(a, b),
            "ogt" | "ugt" => term::flt(b, a),
            "oge" | "uge" => term::fle(b, a),
            _ => return Err(self.malformed("fcmp predicate")),
        })
    }

    fn parse_call(&mut self) -> Result<Term> {
        self.expect("call")?;
        let rty = self.parse_type()?;
        let callee_is_global = self.cur().starts_with('@');
        let callee_ref = if callee_is_global { self.sigiled_ref('@')? } else { self.sigiled_ref('%')? };
        self.expect("(")?;
        let mut args = Vec::new();
        let mut arg_tys = Vec::new();
        if !self.check(")") {
            loop {
                let ty = self.parse_type()?;
                let v = self.parse_value(ty.clone())?;
                arg_tys.push(ty);
                args.push(v);
                if self.check(",") {
                    self.pos += 1;
                    continue;
                }
                break;
            }
        }
        self.expect(")")?;
        let fn_ty = types::fn_ty(rty, arg_tys);
        let callee = if callee_is_global { term::global_ref(fn_ty, callee_ref) } else { term::var(fn_ty, callee_ref) };
        Ok(term::call(callee, args))
    }

    // --- Instructions -----------------------------------------------------

    fn parse_instruction(&mut self) -> Result<Instruction> {
        if self.cur().ends_with(':') && !self.cur().starts_with('%') {
            let tok = self.advance();
            let label_text = &tok[..tok.len() - 1];
            let r = self.ref_from_token(label_text)?;
            return Ok(instruction::block(r));
        }

        match self.cur() {
            "ret" => {
                self.pos += 1;
                if self.check("void") {
                    self.pos += 1;
                    return Ok(instruction::ret_void());
                }
                let v = self.typed_operand()?;
                Ok(instruction::ret(v))
            }
            "br" => {
                self.pos += 1;
                if self.check("label") {
                    let target = self.label_operand()?;
                    return Ok(instruction::jmp(target));
                }
                self.expect("i1")?;
                let cond = self.parse_value(types::bool_ty())?;
                self.expect(",")?;
                let if_true = self.label_operand()?;
                self.expect(",")?;
                let if_false = self.label_operand()?;
                Ok(instruction::br(cond, if_true, if_false))
            }
            "store" => {
                self.pos += 1;
                let value = self.typed_operand()?;
                self.expect(",")?;
                let ptr = self.typed_operand()?;
                Ok(instruction::store(value, ptr))
            }
            "switch" => {
                self.pos += 1;
                let ty = self.parse_type()?;
                let value = self.parse_value(ty.clone())?;
                self.expect(",")?;
                let default_label = self.label_operand()?;
                self.expect("[")?;
                self.eat_newlines();
                let mut cases = Vec::new();
                while !self.check("]") {
                    self.parse_type()?;
                    let case_val = self.parse_value(ty.clone())?;
                    self.expect(",")?;
                    let case_label = self.label_operand()?;
                    cases.push((case_val, case_label));
                    self.eat_newlines();
                }
                self.expect("]")?;
                Ok(instruction::switch(value, default_label, cases))
            }
            "unreachable" => {
                self.pos += 1;
                Ok(instruction::unreachable())
            }
            "call" => {
                let v = self.parse_call()?;
                Ok(instruction::drop(v))
            }
            _ if self.cur().starts_with('%') => self.parse_assignment(),
            _ => Err(self.unexpected("an instruction")),
        }
    }

    fn parse_assignment(&mut self) -> Result<Instruction> {
        let target_ref = self.sigiled_ref('%')?;
        self.expect("=")?;
        match self.cur() {
            "alloca" => {
                self.pos += 1;
                let ty = self.parse_type()?;
                let ptr = term::var(types::ptr_ty(), target_ref);
                let witness = Term::zero_of(ty.clone());
                let count = if self.check(",") {
                    self.pos += 1;
                    self.typed_operand()?
                } else {
                    term::int_const(types::int_ty(64), 1)
                };
                Ok(instruction::alloca(ptr, witness, count))
            }
            "phi" => {
                self.pos += 1;
                let ty = self.parse_type()?;
                let target = term::var(ty.clone(), target_ref);
                let mut incoming = Vec::new();
                loop {
                    self.expect("[")?;
                    let value = self.parse_value(ty.clone())?;
                    self.expect(",")?;
                    let label = self.label_operand()?;
                    self.expect("]")?;
                    incoming.push((value, label));
                    if self.check(",") {
                        self.pos += 1;
                        continue;
                    }
                    break;
                }
                Ok(instruction::phi(target, incoming))
            }
            _ => {
                let rhs = self.parse_rval()?;
                let lhs = term::var(rhs.ty(), target_ref);
                Ok(instruction::assign(lhs, rhs))
            }
        }
    }

    // --- Functions ----------------------------------------------------

    fn parse_params(&mut self) -> Result<Vec<Term>> {
        self.expect("(")?;
        let mut params = Vec::new();
        if !self.check(")") {
            loop {
                if self.check("...") {
                    self.pos += 1;
                    params.push(term::array(types::int_ty(8), Vec::new()));
                    break;
                }
                let ty = self.parse_type()?;
                if self.cur().starts_with('%') {
                    let r = self.sigiled_ref('%')?;
                    params.push(term::var(ty, r));
                } else {
                    params.push(term::var(ty, Ref::num(params.len() as u64)));
                }
                if self.check(",") {
                    self.pos += 1;
                    continue;
                }
                break;
            }
        }
        self.expect(")")?;
        Ok(params)
    }

    fn parse_function(&mut self, is_definition: bool) -> Result<Function> {
        self.skip_modifiers();
        let rty = self.parse_type()?;
        let reference = self.sigiled_ref('@')?;
        let params = self.parse_params()?;
        if !is_definition {
            return Ok(Function::new(rty, reference, params, Vec::new()));
        }
        self.expect("{")?;
        self.eat_newlines();
        let mut body = Vec::new();
        while !self.check("}") {
            body.push(self.parse_instruction()?);
            self.eat_newlines();
        }
        self.expect("}")?;
        Ok(Function::new(rty, reference, params, body))
    }

    // --- Top level --------------------------------------------------------

    fn parse_global(&mut self) -> Result<Global> {
        let reference = self.sigiled_ref('@')?;
        self.expect("=")?;
        self.skip_modifiers();
        self.expect("global")?;
        let ty = self.parse_type()?;
        let initializer = if self.check("\n") { None } else { Some(self.parse_value(ty.clone())?) };
        Ok(Global::new(ty, reference, initializer))
    }

    fn parse_module(&mut self) -> Result<Module> {
        let mut m = Module::new();
        self.eat_newlines();
        while !self.at_end() {
            match self.cur() {
                "target" => {
                    self.pos += 1;
                    let which = self.advance();
                    self.expect("=")?;
                    let text_tok = self.advance();
                    let text = util::unwrap(&text_tok, self.path, self.line())?;
                    match which.as_str() {
                        "datalayout" => m.datalayout = text,
                        "triple" => m.triple = text,
                        _ => return Err(self.malformed("target directive")),
                    }
                }
                s if s.starts_with('$') => {
                    let r = self.sigiled_ref('$')?;
                    self.expect("=")?;
                    self.expect("comdat")?;
                    self.expect("any")?;
                    m.comdats.push(r);
                }
                "declare" => {
                    self.pos += 1;
                    m.decls.push(self.parse_function(false)?);
                }
                "define" => {
                    self.pos += 1;
                    m.defs.push(self.parse_function(true)?);
                }
                s if s.starts_with('@') => {
                    m.globals.push(self.parse_global()?);
                }
                _ => return Err(self.unexpected("a top-level directive")),
            }
            self.eat_newlines();
        }
        Ok(m)
    }
}

/// Parses `text` (attributed to `path` for diagnostics) into a `Module`.
pub fn parse(path: &str, text: &str) -> Result<Module> {
    let toks = lexer::tokenize(path, text)?;
    let mut p = Parser { path, toks, pos: 0 };
    p.parse_module()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_target_and_global() {
        let text = "target triple = \"x86_64\"\n@g = global i32 5\n";
        let m = parse("t.ll", text).unwrap();
        assert_eq!(m.triple, "x86_64");
        assert_eq!(m.globals.len(), 1);
        assert_eq!(m.globals[0].reference(), &Ref::name("g"));
    }

    #[test]
    fn parses_declare_and_define() {
        let text = "declare i32 @ext(i32)\ndefine i32 @f(i32 %x) {\nentry:\n  ret i32 %x\n}\n";
        let m = parse("t.ll", text).unwrap();
        assert_eq!(m.decls.len(), 1);
        assert_eq!(m.defs.len(), 1);
        assert!(!m.defs[0].is_declaration());
    }

    #[test]
    fn parses_arithmetic_and_round_trips_through_printer() {
        let text = "define i32 @f(i32 %x, i32 %y) {\nentry:\n  %z = add i32 %x, %y\n  ret i32 %z\n}\n";
        let m = parse("t.ll", text).unwrap();
        let printed = crate::printer::print_module(&m);
        let reparsed = parse("t.ll", &printed).unwrap();
        assert_eq!(m.defs[0].body(), reparsed.defs[0].body());
    }

    #[test]
    fn icmp_sgt_swaps_operands_onto_slt() {
        let text = "define i1 @f(i32 %x, i32 %y) {\nentry:\n  %c = icmp sgt i32 %x, %y\n  ret i1 %c\n}\n";
        let m = parse("t.ll", text).unwrap();
        let rhs = m.defs[0].get(1).get(1);
        assert_eq!(rhs.tag(), Tag::SLt);
        assert_eq!(rhs.get(0), &term::var(types::int_ty(32), Ref::name("y")));
        assert_eq!(rhs.get(1), &term::var(types::int_ty(32), Ref::name("x")));
    }

    #[test]
    fn getelementptr_folds_struct_field_index() {
        let text =
            "define ptr @f(ptr %p) {\nentry:\n  %q = getelementptr inbounds {i32, i8}, ptr %p, i32 1\n  ret ptr %q\n}\n";
        let m = parse("t.ll", text).unwrap();
        let rhs = m.defs[0].get(1).get(1);
        assert_eq!(rhs.tag(), Tag::FieldPtr);
    }

    #[test]
    fn unknown_opcode_is_a_syntax_error() {
        let text = "define i32 @f() {\nentry:\n  %x = bogus i32 0\n  ret i32 %x\n}\n";
        assert!(parse("t.ll", text).is_err());
    }
}
