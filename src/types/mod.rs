//! 型システム
//!
//! 意味解析済みの型を一意化して保持する。構造的に等しい型は常に同じ
//! [`TypeId`]を返すため、型の同値判定はハンドル比較だけで済む。
//! 修飾付きの型は修飾なしの正規型を指す`canonical`を持ち、
//! 同値判定は正規型同士で行う。

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::ast::{ArraySpecId, DeclId};

pub use crate::ast::TypeSpec;

/// 一意化された型へのハンドル。
///
/// 同じ[`TypeAuthority`]から得たハンドル同士なら、`==`が構造的同値と
/// 一致する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeId(u32);

impl TypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// 組み込み型の種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuiltinSpec {
    Integer,
    Real,
    DoublePrecision,
    Complex,
    Character,
    Logical,
}

/// 属性・INTENT・アクセス指定をまとめたビットマスク。
///
/// 下位13ビットが属性フラグ、続く2ビットがINTENT、さらに2ビットが
/// アクセス指定。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Qualifiers(u32);

/// 属性フラグ
pub mod attr {
    pub const ALLOCATABLE: u32 = 1 << 0;
    pub const ASYNCHRONOUS: u32 = 1 << 1;
    pub const DIMENSION: u32 = 1 << 2;
    pub const EXTERNAL: u32 = 1 << 3;
    pub const INTRINSIC: u32 = 1 << 4;
    pub const OPTIONAL: u32 = 1 << 5;
    pub const PARAMETER: u32 = 1 << 6;
    pub const POINTER: u32 = 1 << 7;
    pub const PROTECTED: u32 = 1 << 8;
    pub const SAVE: u32 = 1 << 9;
    pub const TARGET: u32 = 1 << 10;
    pub const VALUE: u32 = 1 << 11;
    pub const VOLATILE: u32 = 1 << 12;
}

const INTENT_SHIFT: u32 = 13;
const INTENT_MASK: u32 = 0b11 << INTENT_SHIFT;
const ACCESS_SHIFT: u32 = 15;
const ACCESS_MASK: u32 = 0b11 << ACCESS_SHIFT;

/// INTENT指定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntentSpec {
    None,
    In,
    Out,
    InOut,
}

/// アクセス指定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessSpec {
    None,
    Public,
    Private,
}

impl Qualifiers {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn add_attr(&mut self, flag: u32) {
        self.0 |= flag & !(INTENT_MASK | ACCESS_MASK);
    }

    pub fn has_attr(self, flag: u32) -> bool {
        self.0 & flag != 0
    }

    pub fn set_intent(&mut self, intent: IntentSpec) {
        self.0 = (self.0 & !INTENT_MASK) | ((intent as u32) << INTENT_SHIFT);
    }

    pub fn intent(self) -> IntentSpec {
        match (self.0 & INTENT_MASK) >> INTENT_SHIFT {
            0 => IntentSpec::None,
            1 => IntentSpec::In,
            2 => IntentSpec::Out,
            _ => IntentSpec::InOut,
        }
    }

    pub fn set_access(&mut self, access: AccessSpec) {
        self.0 = (self.0 & !ACCESS_MASK) | ((access as u32) << ACCESS_SHIFT);
    }

    pub fn access(self) -> AccessSpec {
        match (self.0 & ACCESS_MASK) >> ACCESS_SHIFT {
            0 => AccessSpec::None,
            1 => AccessSpec::Public,
            _ => AccessSpec::Private,
        }
    }

    /// 両方の修飾を合わせる。INTENT・アクセスは`self`側が優先。
    pub fn union(self, other: Qualifiers) -> Qualifiers {
        let mut merged = Qualifiers(self.0 | (other.0 & !(INTENT_MASK | ACCESS_MASK)));
        if self.0 & INTENT_MASK == 0 {
            merged.0 |= other.0 & INTENT_MASK;
        }
        if self.0 & ACCESS_MASK == 0 {
            merged.0 |= other.0 & ACCESS_MASK;
        }
        merged
    }
}

/// 型の構造。一意化のキーとしてそのまま使われる。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeKind {
    Builtin(BuiltinSpec),
    /// 長さ付き文字型。`None`は既定長（長さ1）。
    Character { len: Option<i64> },
    /// POINTER属性の実体が指す型。`rank`は0でスカラー。
    Pointer { base: TypeId, rank: u32 },
    /// 配列型。次元指定はアリーナ上の境界指定ノードを参照し、
    /// 明示形状と引継ぎ形状は範囲が一致しても別の型になる。
    Array {
        base: TypeId,
        dims: Vec<ArraySpecId>,
    },
    /// 派生型。定義宣言ごとに別の型。
    Record(DeclId),
    /// 修飾付きの型。`base`は常に非修飾の正規型で、入れ子にはならない。
    Qualified {
        base: TypeId,
        quals: Qualifiers,
        /// 評価済みのKIND選択子。
        kind: Option<i64>,
    },
}

#[derive(Debug)]
struct Type {
    kind: TypeKind,
    canonical: TypeId,
}

/// 型の一意化テーブル。
///
/// 生成済みの型を構造キーで引き、未知の構造だけを登録する。
/// ハンドルはこのテーブルが生きている限り有効で、型は削除されない。
#[derive(Debug)]
pub struct TypeAuthority {
    types: Vec<Type>,
    uniqued: IndexMap<TypeKind, TypeId>,
    integer_ty: TypeId,
    real_ty: TypeId,
    double_precision_ty: TypeId,
    complex_ty: TypeId,
    character_ty: TypeId,
    logical_ty: TypeId,
}

impl TypeAuthority {
    pub fn new() -> Self {
        let mut authority = Self {
            types: Vec::new(),
            uniqued: IndexMap::new(),
            integer_ty: TypeId(0),
            real_ty: TypeId(0),
            double_precision_ty: TypeId(0),
            complex_ty: TypeId(0),
            character_ty: TypeId(0),
            logical_ty: TypeId(0),
        };
        authority.integer_ty = authority.intern(TypeKind::Builtin(BuiltinSpec::Integer));
        authority.real_ty = authority.intern(TypeKind::Builtin(BuiltinSpec::Real));
        authority.double_precision_ty =
            authority.intern(TypeKind::Builtin(BuiltinSpec::DoublePrecision));
        authority.complex_ty = authority.intern(TypeKind::Builtin(BuiltinSpec::Complex));
        authority.character_ty = authority.intern(TypeKind::Builtin(BuiltinSpec::Character));
        authority.logical_ty = authority.intern(TypeKind::Builtin(BuiltinSpec::Logical));
        authority
    }

    fn intern(&mut self, kind: TypeKind) -> TypeId {
        if let Some(&id) = self.uniqued.get(&kind) {
            return id;
        }
        log::debug!("uniquing new type: {:?}", kind);
        let id = TypeId(self.types.len() as u32);
        let canonical = match &kind {
            TypeKind::Qualified { base, .. } => self.canonical(*base),
            _ => id,
        };
        self.types.push(Type {
            kind: kind.clone(),
            canonical,
        });
        self.uniqued.insert(kind, id);
        id
    }

    // 組み込み型のシングルトン

    pub fn integer_type(&self) -> TypeId {
        self.integer_ty
    }

    pub fn real_type(&self) -> TypeId {
        self.real_ty
    }

    pub fn double_precision_type(&self) -> TypeId {
        self.double_precision_ty
    }

    pub fn complex_type(&self) -> TypeId {
        self.complex_ty
    }

    pub fn character_type(&self) -> TypeId {
        self.character_ty
    }

    pub fn logical_type(&self) -> TypeId {
        self.logical_ty
    }

    pub fn get_builtin(&self, spec: BuiltinSpec) -> TypeId {
        match spec {
            BuiltinSpec::Integer => self.integer_ty,
            BuiltinSpec::Real => self.real_ty,
            BuiltinSpec::DoublePrecision => self.double_precision_ty,
            BuiltinSpec::Complex => self.complex_ty,
            BuiltinSpec::Character => self.character_ty,
            BuiltinSpec::Logical => self.logical_ty,
        }
    }

    /// 長さ付き文字型を返す。既定長は組み込みのCHARACTERそのもの。
    pub fn get_character(&mut self, len: Option<i64>) -> TypeId {
        match len {
            None => self.character_ty,
            Some(_) => self.intern(TypeKind::Character { len }),
        }
    }

    pub fn get_pointer(&mut self, base: TypeId, rank: u32) -> TypeId {
        self.intern(TypeKind::Pointer { base, rank })
    }

    pub fn get_array(&mut self, base: TypeId, dims: Vec<ArraySpecId>) -> TypeId {
        self.intern(TypeKind::Array { base, dims })
    }

    pub fn get_record(&mut self, decl: DeclId) -> TypeId {
        self.intern(TypeKind::Record(decl))
    }

    /// 修飾付きの型を返す。`base`が既に修飾付きなら修飾をまとめ、
    /// 入れ子のQualifiedは作らない。修飾もKINDも無ければ`base`を返す。
    pub fn get_qualified(
        &mut self,
        base: TypeId,
        quals: Qualifiers,
        kind: Option<i64>,
    ) -> TypeId {
        let (base, quals, kind) = match &self.types[base.index()].kind {
            TypeKind::Qualified {
                base: inner,
                quals: inner_quals,
                kind: inner_kind,
            } => (*inner, quals.union(*inner_quals), kind.or(*inner_kind)),
            _ => (base, quals, kind),
        };
        if quals.is_empty() && kind.is_none() {
            return base;
        }
        self.intern(TypeKind::Qualified { base, quals, kind })
    }

    pub fn kind(&self, id: TypeId) -> &TypeKind {
        &self.types[id.index()].kind
    }

    /// 修飾を剥がした正規型を返す。
    pub fn canonical(&self, id: TypeId) -> TypeId {
        self.types[id.index()].canonical
    }

    pub fn is_canonical(&self, id: TypeId) -> bool {
        self.types[id.index()].canonical == id
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    fn canonical_kind(&self, id: TypeId) -> &TypeKind {
        &self.types[self.canonical(id).index()].kind
    }

    // 型の分類述語。修飾は無視して正規型で判定する。

    pub fn is_integer_type(&self, id: TypeId) -> bool {
        matches!(
            self.canonical_kind(id),
            TypeKind::Builtin(BuiltinSpec::Integer)
        )
    }

    pub fn is_real_type(&self, id: TypeId) -> bool {
        matches!(
            self.canonical_kind(id),
            TypeKind::Builtin(BuiltinSpec::Real) | TypeKind::Builtin(BuiltinSpec::DoublePrecision)
        )
    }

    pub fn is_double_precision_type(&self, id: TypeId) -> bool {
        matches!(
            self.canonical_kind(id),
            TypeKind::Builtin(BuiltinSpec::DoublePrecision)
        )
    }

    pub fn is_complex_type(&self, id: TypeId) -> bool {
        matches!(
            self.canonical_kind(id),
            TypeKind::Builtin(BuiltinSpec::Complex)
        )
    }

    pub fn is_character_type(&self, id: TypeId) -> bool {
        matches!(
            self.canonical_kind(id),
            TypeKind::Builtin(BuiltinSpec::Character) | TypeKind::Character { .. }
        )
    }

    pub fn is_logical_type(&self, id: TypeId) -> bool {
        matches!(
            self.canonical_kind(id),
            TypeKind::Builtin(BuiltinSpec::Logical)
        )
    }

    pub fn is_numeric_type(&self, id: TypeId) -> bool {
        self.is_integer_type(id) || self.is_real_type(id) || self.is_complex_type(id)
    }

    pub fn is_array_type(&self, id: TypeId) -> bool {
        matches!(self.canonical_kind(id), TypeKind::Array { .. })
    }

    pub fn is_record_type(&self, id: TypeId) -> bool {
        matches!(self.canonical_kind(id), TypeKind::Record(_))
    }

    /// 配列型の要素型を返す。
    pub fn element_type(&self, id: TypeId) -> Option<TypeId> {
        match self.canonical_kind(id) {
            TypeKind::Array { base, .. } => Some(*base),
            _ => None,
        }
    }

    /// 配列型の次元数を返す。
    pub fn array_rank(&self, id: TypeId) -> Option<usize> {
        match self.canonical_kind(id) {
            TypeKind::Array { dims, .. } => Some(dims.len()),
            _ => None,
        }
    }
}

impl Default for TypeAuthority {
    fn default() -> Self {
        Self::new()
    }
}
