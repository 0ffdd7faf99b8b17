use super::environment::{EnvEntry, Environments};
use super::{Result, SemAnalysisError};
use crate::ast::*;
use crate::names::NameFactory;

use std::collections::{HashMap, HashSet};

/// Rewrites the program so every bound identifier carries a globally unique
/// name: variables and parameters become `tmp.<n>`, labels get a per-name
/// counter, function names keep their linker identity. `goto X` and `X:`
/// agree on the unique name regardless of which is met first.
struct Resolver<'a> {
    names: &'a mut NameFactory,
    env: Environments,
    label_map: HashMap<Identifier, Identifier>,
    function_nesting: u32,
}

impl Resolver<'_> {
    fn resolve_label(&mut self, name: Identifier) -> Identifier {
        if let Some(unique) = self.label_map.get(&name) {
            return unique.clone();
        }
        let unique = self.names.label_name(&name);
        self.label_map.insert(name, unique.clone());
        unique
    }

    fn resolve_exp(&mut self, exp: Exp) -> Result<Exp> {
        match exp {
            Exp::Constant(_) => Ok(exp),
            Exp::Var(name) => self
                .env
                .get(&name)
                .map(|entry| Exp::Var(entry.unique_name.clone()))
                .ok_or(SemAnalysisError::VariableNotDeclared(name)),
            Exp::PostfixIncDec(op, name) => self
                .env
                .get(&name)
                .map(|entry| Exp::PostfixIncDec(op, entry.unique_name.clone()))
                .ok_or(SemAnalysisError::VariableNotDeclared(name)),
            Exp::Call(callee, args) => {
                match self.env.get(&callee) {
                    None => return Err(SemAnalysisError::UndeclaredFunction(callee)),
                    Some(entry) if !entry.is_function() => {
                        return Err(SemAnalysisError::VariableCall(callee))
                    }
                    Some(_) => (),
                }
                let args = args
                    .into_iter()
                    .map(|arg| self.resolve_exp(arg))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Exp::Call(callee, args))
            }
            Exp::Unary(op, inner) => {
                let inner = self.resolve_exp(*inner).map(Box::new)?;
                Ok(Exp::Unary(op, inner))
            }
            Exp::Binary(op, left, right) => {
                let left = self.resolve_exp(*left).map(Box::new)?;
                let right = self.resolve_exp(*right).map(Box::new)?;
                Ok(Exp::Binary(op, left, right))
            }
            Exp::Assignment(left, right) => {
                let left = self.resolve_exp(*left)?;
                if !left.is_var() {
                    return Err(SemAnalysisError::WrongLvalue(left));
                }
                let right = self.resolve_exp(*right).map(Box::new)?;
                Ok(Exp::Assignment(Box::new(left), right))
            }
            Exp::Conditional(cond) => {
                let condition = self.resolve_exp(*cond.condition).map(Box::new)?;
                let then = self.resolve_exp(*cond.then).map(Box::new)?;
                let els = self.resolve_exp(*cond.els).map(Box::new)?;
                Ok(Exp::Conditional(Conditional {
                    condition,
                    then,
                    els,
                }))
            }
        }
    }

    fn resolve_optional_exp(&mut self, exp: Option<Exp>) -> Result<Option<Exp>> {
        exp.map(|exp| self.resolve_exp(exp)).transpose()
    }

    fn resolve_vardecl(&mut self, dec: VarDecl) -> Result<VarDecl> {
        let shadows_param = self
            .env
            .get_enclosing_scope(&dec.name)
            .is_some_and(EnvEntry::is_parameter);
        if self.env.get_current_scope(&dec.name).is_some() || shadows_param {
            return Err(SemAnalysisError::IdentifierRedeclaration(dec.name));
        }

        let unique_name = self.names.var_name();
        self.env
            .set(dec.name, EnvEntry::variable(unique_name.clone()));

        // The name is in scope inside its own initializer, as in C.
        let init = self.resolve_optional_exp(dec.init)?;

        Ok(VarDecl {
            name: unique_name,
            init,
        })
    }

    fn resolve_fundecl(&mut self, dec: FunDecl) -> Result<FunDecl> {
        let mut param_set = HashSet::new();
        for param in &dec.params {
            if !param_set.insert(param.clone()) {
                return Err(SemAnalysisError::DuplicateParamNames(dec.name));
            }
        }

        if dec.body.is_some() && self.function_nesting > 0 {
            return Err(SemAnalysisError::LocalFunDefinition(dec.name));
        }

        if let Some(entry) = self.env.get_current_scope(&dec.name) {
            if !entry.is_function() {
                return Err(SemAnalysisError::DuplicateDeclaration(dec.name));
            }
        }
        let entry = EnvEntry::function(dec.name.clone(), dec.params.len(), dec.body.is_some());
        self.env.set(dec.name.clone(), entry);

        if dec.body.is_none() {
            return Ok(dec);
        }

        self.label_map.clear();
        self.env.begin_block();
        self.function_nesting += 1;

        let mut params = Vec::with_capacity(dec.params.len());
        for param in dec.params {
            let unique_name = self.names.var_name();
            self.env
                .set(param, EnvEntry::parameter(unique_name.clone()));
            params.push(unique_name);
        }

        let body = dec.body.map(|block| self.resolve_block(block)).transpose();

        self.function_nesting -= 1;
        self.env.end_block();

        Ok(FunDecl {
            name: dec.name,
            params,
            body: body?,
        })
    }

    fn resolve_declaration(&mut self, dec: Declaration) -> Result<Declaration> {
        match dec {
            Declaration::Var(vardec) => self.resolve_vardecl(vardec).map(Declaration::Var),
            Declaration::Fun(fundec) => self.resolve_fundecl(fundec).map(Declaration::Fun),
        }
    }

    fn resolve_block(&mut self, block: Block) -> Result<Block> {
        self.env.begin_block();
        let items = block
            .items
            .into_iter()
            .map(|item| match item {
                BlockItem::S(st) => self.resolve_statement(st).map(BlockItem::S),
                BlockItem::D(dec) => self.resolve_declaration(dec).map(BlockItem::D),
            })
            .collect::<Result<BlockItems>>();
        self.env.end_block();

        Ok(Block { items: items? })
    }

    fn resolve_statement(&mut self, st: Statement) -> Result<Statement> {
        use Statement as S;
        match st {
            S::Return(exp) => self.resolve_exp(exp).map(S::Return),
            S::Exp(exp) => self.resolve_exp(exp).map(S::Exp),
            S::If(mut if_st) => {
                if_st.condition = self.resolve_exp(if_st.condition)?;
                if_st.then = self.resolve_statement(*if_st.then).map(Box::new)?;
                if_st.els = if_st
                    .els
                    .map(|els| self.resolve_statement(*els).map(Box::new))
                    .transpose()?;
                Ok(S::If(if_st))
            }
            S::Compound(block) => self.resolve_block(block).map(S::Compound),
            S::Goto(target) => Ok(S::Goto(self.resolve_label(target))),
            S::Label(name) => Ok(S::Label(self.resolve_label(name))),
            S::While(mut while_st) => {
                while_st.condition = self.resolve_exp(while_st.condition)?;
                while_st.body = self.resolve_statement(*while_st.body).map(Box::new)?;
                Ok(S::While(while_st))
            }
            S::DoWhile(mut dowhile) => {
                dowhile.body = self.resolve_statement(*dowhile.body).map(Box::new)?;
                dowhile.condition = self.resolve_exp(dowhile.condition)?;
                Ok(S::DoWhile(dowhile))
            }
            S::For(mut for_st) => {
                // The for header opens its own scope enclosing the body.
                self.env.begin_block();
                for_st.init = match for_st.init {
                    ForInit::Decl(dec) => self.resolve_vardecl(dec).map(ForInit::Decl)?,
                    ForInit::Exp(exp) => self.resolve_optional_exp(exp).map(ForInit::Exp)?,
                };
                for_st.condition = self.resolve_optional_exp(for_st.condition)?;
                for_st.post = self.resolve_optional_exp(for_st.post)?;
                let body = self.resolve_statement(*for_st.body).map(Box::new);
                self.env.end_block();
                for_st.body = body?;
                Ok(S::For(for_st))
            }
            S::Switch(mut switch) => {
                switch.ctrl = self.resolve_exp(switch.ctrl)?;
                switch.body = self.resolve_statement(*switch.body).map(Box::new)?;
                Ok(S::Switch(switch))
            }
            // Case values are integer literals, nothing to resolve.
            S::Case(_) | S::Break(_) | S::Continue(_) | S::Null => Ok(st),
        }
    }
}

pub fn resolve_identifiers(ast: Ast, names: &mut NameFactory) -> Result<Ast> {
    let Ast { declarations } = ast;
    let mut resolver = Resolver {
        names,
        env: Environments::new(),
        label_map: HashMap::new(),
        function_nesting: 0,
    };

    let declarations = declarations
        .into_iter()
        .map(|dec| resolver.resolve_fundecl(dec))
        .collect::<Result<Vec<_>>>()?;

    Ok(Ast { declarations })
}
