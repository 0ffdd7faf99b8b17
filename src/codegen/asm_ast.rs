use crate::ast::Identifier;
use crate::tacky::{TBinaryOp, TUnaryOp, TValue};

#[derive(Debug, PartialEq)]
pub struct AsmAst {
    pub functions: Vec<AsmFunction>,
}

pub type AsmInstructions = Vec<AsmInstruction>;

#[derive(Debug, PartialEq)]
pub struct AsmFunction {
    pub name: Identifier,
    pub body: AsmInstructions,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AsmInstruction {
    Mov(Operand, Operand),
    Unary(AsmUnaryOp, Operand),
    Binary(AsmBinaryOp, Operand, Operand),
    Cmp(Operand, Operand),
    Idiv(Operand),
    Cdq,
    Jmp(Identifier),
    JmpCC(Condition, Identifier),
    SetCC(Condition, Operand),
    Label(Identifier),
    AllocStack(i64),
    DeallocStack(i64),
    Push(Operand),
    Call(Identifier),
    Ret,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Condition {
    E,
    NE,
    G,
    GE,
    L,
    LE,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AsmUnaryOp {
    Neg,
    Not,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AsmBinaryOp {
    Add,
    Sub,
    Mul,
    And,
    Or,
    Xor,
    Shl,
    Shr,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    Imm(i64),
    Reg(Register),
    Pseudo(Identifier),
    Stack(i32),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Register {
    AX,
    CX,
    DX,
    DI,
    SI,
    R8,
    R9,
    R10,
    R11,
}

impl Operand {
    #[inline]
    pub fn is_mem(&self) -> bool {
        matches!(self, Self::Stack(_))
    }

    #[inline]
    pub fn is_reg(&self) -> bool {
        matches!(self, Self::Reg(_))
    }

    #[inline]
    pub fn is_imm(&self) -> bool {
        matches!(self, Self::Imm(_))
    }

    #[inline]
    pub fn is_pseudo(&self) -> bool {
        matches!(self, Self::Pseudo(_))
    }
}

impl AsmBinaryOp {
    #[inline]
    pub fn is_shift(self) -> bool {
        matches!(self, Self::Shl | Self::Shr)
    }
}

// Predicates driving the legalization table; one per forbidden operand
// form.
impl AsmInstruction {
    pub fn mem_operands(&self) -> bool {
        match self {
            Self::Binary(AsmBinaryOp::Mul, _, _) => false,
            Self::Mov(src, dst) | Self::Cmp(src, dst) | Self::Binary(_, src, dst) => {
                src.is_mem() && dst.is_mem()
            }
            _ => false,
        }
    }

    pub fn is_shift_count_in_mem(&self) -> bool {
        matches!(self, Self::Binary(op, count, _) if op.is_shift() && count.is_mem())
    }

    pub fn is_mul_sndmem(&self) -> bool {
        matches!(self, Self::Binary(AsmBinaryOp::Mul, _, dst) if dst.is_mem())
    }

    pub fn is_idiv_constant(&self) -> bool {
        matches!(self, Self::Idiv(operand) if operand.is_imm())
    }

    pub fn is_cmp_sndimm(&self) -> bool {
        matches!(self, Self::Cmp(_, dst) if dst.is_imm())
    }

    pub fn is_binary_sndimm(&self) -> bool {
        matches!(
            self,
            Self::Binary(
                AsmBinaryOp::Add
                    | AsmBinaryOp::Sub
                    | AsmBinaryOp::And
                    | AsmBinaryOp::Or
                    | AsmBinaryOp::Xor,
                _,
                dst,
            ) if dst.is_imm()
        )
    }
}

impl From<TValue> for Operand {
    fn from(value: TValue) -> Self {
        match value {
            TValue::Constant(c) => Self::Imm(i64::from(c)),
            TValue::Var(id) => Self::Pseudo(id),
        }
    }
}

impl From<TUnaryOp> for AsmUnaryOp {
    fn from(value: TUnaryOp) -> Self {
        match value {
            TUnaryOp::Complement => Self::Not,
            TUnaryOp::Negate => Self::Neg,
            TUnaryOp::LogicalNot => unreachable!("lowered through cmp/setcc"),
        }
    }
}

impl From<TBinaryOp> for AsmBinaryOp {
    fn from(value: TBinaryOp) -> Self {
        match value {
            TBinaryOp::Add => Self::Add,
            TBinaryOp::Subtract => Self::Sub,
            TBinaryOp::Multiply => Self::Mul,
            TBinaryOp::BitAnd => Self::And,
            TBinaryOp::BitOr => Self::Or,
            TBinaryOp::BitXor => Self::Xor,
            TBinaryOp::ShiftLeft => Self::Shl,
            TBinaryOp::ShiftRight => Self::Shr,
            _ => unreachable!("divisions, comparisons and logical markers have their own lowering"),
        }
    }
}

impl From<TBinaryOp> for Condition {
    fn from(value: TBinaryOp) -> Self {
        match value {
            TBinaryOp::IsEqual => Self::E,
            TBinaryOp::IsNotEqual => Self::NE,
            TBinaryOp::IsGreaterThan => Self::G,
            TBinaryOp::IsGreaterOrEqual => Self::GE,
            TBinaryOp::IsLessThan => Self::L,
            TBinaryOp::IsLessOrEqual => Self::LE,
            _ => unreachable!("only relational operators map to condition codes"),
        }
    }
}
