use super::environment::{EnvEntry, Environments, TypeInfo};
use super::{Result, SemAnalysisError};
use crate::ast::*;

/// Walks the program building the [Environments] table and checking that
/// every identifier is used according to its category and, for calls, with
/// the declared arity. Types unify trivially (everything is `int`), so this
/// pass degenerates into category and arity checks. All diagnostics are
/// collected; the first one is surfaced.
struct TypeChecker {
    env: Environments,
    errors: Vec<SemAnalysisError>,
}

impl TypeChecker {
    fn new() -> Self {
        Self {
            env: Environments::new(),
            errors: Vec::new(),
        }
    }

    fn error(&mut self, err: SemAnalysisError) {
        self.errors.push(err);
    }

    fn check_fundecl(&mut self, dec: &FunDecl) {
        let known = self
            .env
            .get_global(&dec.name)
            .map(|entry| entry.type_info.clone());
        match known {
            None => {
                let entry =
                    EnvEntry::function(dec.name.clone(), dec.params.len(), dec.body.is_some());
                self.env.set(dec.name.clone(), entry);
            }
            Some(TypeInfo::Int) => {
                self.error(SemAnalysisError::FunctionRedeclaredAsVariable(
                    dec.name.clone(),
                ));
            }
            Some(TypeInfo::Fun {
                num_params,
                is_defined,
            }) => {
                if num_params != dec.params.len() {
                    self.error(SemAnalysisError::IncompatibleFunDec(dec.name.clone()));
                } else if is_defined && dec.body.is_some() {
                    self.error(SemAnalysisError::FunctionRedefinition(dec.name.clone()));
                } else if dec.body.is_some() {
                    self.env.mark_function_defined(&dec.name);
                }
            }
        }

        if let Some(body) = &dec.body {
            self.env.begin_block();
            for param in &dec.params {
                self.env
                    .set(param.clone(), EnvEntry::parameter(param.clone()));
            }
            self.check_block(body);
            self.env.end_block();
        }
    }

    fn check_vardecl(&mut self, dec: &VarDecl) {
        self.env
            .set(dec.name.clone(), EnvEntry::variable(dec.name.clone()));
        if let Some(init) = &dec.init {
            self.check_exp(init);
        }
    }

    fn check_declaration(&mut self, dec: &Declaration) {
        match dec {
            Declaration::Var(vardec) => self.check_vardecl(vardec),
            Declaration::Fun(fundec) => self.check_fundecl(fundec),
        }
    }

    fn check_block(&mut self, block: &Block) {
        for item in &block.items {
            match item {
                BlockItem::S(st) => self.check_statement(st),
                BlockItem::D(dec) => self.check_declaration(dec),
            }
        }
    }

    fn check_statement(&mut self, st: &Statement) {
        use Statement as S;
        match st {
            S::Return(exp) | S::Exp(exp) => self.check_exp(exp),
            S::If(if_st) => {
                self.check_exp(&if_st.condition);
                self.check_statement(&if_st.then);
                if let Some(els) = &if_st.els {
                    self.check_statement(els);
                }
            }
            S::Compound(block) => {
                self.env.begin_block();
                self.check_block(block);
                self.env.end_block();
            }
            S::While(While {
                condition, body, ..
            })
            | S::DoWhile(DoWhile {
                condition, body, ..
            }) => {
                self.check_exp(condition);
                self.check_statement(body);
            }
            S::For(for_st) => {
                self.env.begin_block();
                match &for_st.init {
                    ForInit::Decl(dec) => self.check_vardecl(dec),
                    ForInit::Exp(Some(exp)) => self.check_exp(exp),
                    ForInit::Exp(None) => (),
                }
                if let Some(condition) = &for_st.condition {
                    self.check_exp(condition);
                }
                if let Some(post) = &for_st.post {
                    self.check_exp(post);
                }
                self.check_statement(&for_st.body);
                self.env.end_block();
            }
            S::Switch(switch) => {
                self.check_exp(&switch.ctrl);
                self.check_statement(&switch.body);
            }
            S::Case(case) => {
                if let Some(value) = &case.value {
                    self.check_exp(value);
                }
            }
            S::Goto(_) | S::Label(_) | S::Break(_) | S::Continue(_) | S::Null => (),
        }
    }

    fn check_variable_use(&mut self, name: &Identifier) {
        let names_a_function = self.env.get(name).is_some_and(EnvEntry::is_function);
        if names_a_function {
            self.error(SemAnalysisError::FunctionNameAsVariable(name.clone()));
        }
    }

    fn check_exp(&mut self, exp: &Exp) {
        match exp {
            Exp::Constant(_) => (),
            Exp::Var(name) | Exp::PostfixIncDec(_, name) => self.check_variable_use(name),
            Exp::Call(callee, args) => {
                let known = self
                    .env
                    .get(callee)
                    .map(|entry| (entry.is_function(), entry.type_info.clone()));
                match known {
                    Some((false, _)) => {
                        self.error(SemAnalysisError::VariableCall(callee.clone()));
                    }
                    Some((true, TypeInfo::Fun { num_params, .. })) if num_params != args.len() => {
                        self.error(SemAnalysisError::ExpectedArgsCountButGot(
                            num_params,
                            args.len(),
                            callee.clone(),
                        ));
                    }
                    // Unknown callees are reported by identifier resolution.
                    _ => (),
                }
                for arg in args {
                    self.check_exp(arg);
                }
            }
            Exp::Unary(_, inner) => self.check_exp(inner),
            Exp::Binary(_, left, right) | Exp::Assignment(left, right) => {
                self.check_exp(left);
                self.check_exp(right);
            }
            Exp::Conditional(cond) => {
                self.check_exp(&cond.condition);
                self.check_exp(&cond.then);
                self.check_exp(&cond.els);
            }
        }
    }
}

/// On success returns the environments so later phases can tell internally
/// defined functions from externally linked ones.
pub fn check_types(ast: &Ast) -> Result<Environments> {
    let mut checker = TypeChecker::new();
    for dec in &ast.declarations {
        checker.check_fundecl(dec);
    }

    match checker.errors.into_iter().next() {
        Some(first) => Err(first),
        None => Ok(checker.env),
    }
}
