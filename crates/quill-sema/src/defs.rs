// defs.rs
//
// The definition graph: one arena record per declaration the program
// contains, plus the definitions the analyzer synthesizes (default
// constructors, template instances). Records carry back-edges to their
// enclosing scope/definition and forward-edges to the AST they came from.

use std::rc::Rc;

use quill_ast::{Declaration, ParamFlags};
use quill_identity::{DefnId, ModuleId, ScopeId, Span, Symbol};

use crate::ir::Expr;
use crate::passes::{Pass, PassState};
use crate::types::{CompositeKind, TypeId, TypeIdVec};

/// The kind of a definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefnKind {
    Module,
    Namespace,
    TypeDef,
    Var,
    Let,
    Property,
    Indexer,
    Function,
    Macro,
    Parameter,
    ExplicitImport,
}

impl DefnKind {
    /// Only these kinds may have several same-named definitions in one
    /// scope.
    pub fn is_overloadable(self) -> bool {
        matches!(self, DefnKind::Function | DefnKind::Macro | DefnKind::Indexer)
    }

    pub fn is_value(self) -> bool {
        matches!(
            self,
            DefnKind::Var | DefnKind::Let | DefnKind::Parameter | DefnKind::Function
        )
    }
}

/// Modifier traits, a bitset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Traits(u16);

impl Traits {
    pub const FINAL: Traits = Traits(1 << 0);
    pub const ABSTRACT: Traits = Traits(1 << 1);
    pub const UNDEF: Traits = Traits(1 << 2);
    pub const READONLY: Traits = Traits(1 << 3);
    pub const SYNTHETIC: Traits = Traits(1 << 4);
    pub const SINGULAR: Traits = Traits(1 << 5);
    pub const CTOR: Traits = Traits(1 << 6);
    pub const OVERRIDE: Traits = Traits(1 << 7);
    pub const EXTERN: Traits = Traits(1 << 8);
    pub const INTRINSIC: Traits = Traits(1 << 9);
    pub const NONREFLECTIVE: Traits = Traits(1 << 10);

    pub fn contains(self, t: Traits) -> bool {
        self.0 & t.0 == t.0
    }

    pub fn add(&mut self, t: Traits) {
        self.0 |= t.0;
    }

    pub fn with(mut self, t: Traits) -> Self {
        self.add(t);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

impl From<quill_ast::Visibility> for Visibility {
    fn from(v: quill_ast::Visibility) -> Self {
        match v {
            quill_ast::Visibility::Public => Visibility::Public,
            quill_ast::Visibility::Protected => Visibility::Protected,
            quill_ast::Visibility::Private => Visibility::Private,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageClass {
    #[default]
    Global,
    Static,
    Instance,
    Local,
}

/// A dispatch table for one implemented interface: parallel in length and
/// order to the interface's own instance-method table.
#[derive(Debug, Clone)]
pub struct InterfaceTable {
    pub interface: TypeId,
    pub methods: Vec<DefnId>,
}

/// Analysis results for a composite type, filled in by the class
/// analyzer's passes.
#[derive(Debug, Clone, Default)]
pub struct CompositeInfo {
    /// Base list; after BaseTypes the primary base (if any) is first.
    pub bases: Vec<TypeId>,
    pub primary_base: Option<TypeId>,
    /// Instance field slots. Slot 0 holds None as the reserved super slot
    /// when a primary base exists.
    pub instance_fields: Vec<Option<DefnId>>,
    pub static_fields: Vec<DefnId>,
    /// The instance-method table; always begins with a copy of the
    /// super's table so dispatch indices stay stable in subclasses.
    pub instance_methods: Vec<DefnId>,
    pub interfaces: Vec<InterfaceTable>,
    /// Static `coerce` methods collected by the Converter pass.
    pub coercers: Vec<DefnId>,
    pub constructors: Vec<DefnId>,
    pub default_constructor: Option<DefnId>,
}

impl CompositeInfo {
    pub fn find_itable(&self, interface: TypeId) -> Option<&InterfaceTable> {
        self.interfaces.iter().find(|t| t.interface == interface)
    }

    /// Number of instance fields including inherited ones.
    pub fn recursive_field_count(&self) -> usize {
        self.instance_fields.len()
    }
}

/// Payload for a TypeDef definition.
#[derive(Debug, Clone, Default)]
pub struct TypeDefData {
    /// The registry type this definition denotes.
    pub ty: Option<TypeId>,
    /// Member scope, created during ScopeCreation.
    pub scope: Option<ScopeId>,
    /// Composite analysis results; None for enums and aliases.
    pub composite: Option<CompositeInfo>,
    /// For aliases: the resolved target, filled lazily.
    pub aliased: Option<TypeId>,
}

/// Payload for Var/Let/Parameter definitions.
#[derive(Debug, Clone)]
pub struct ValueData {
    pub ty: Option<TypeId>,
    pub init: Option<Expr>,
    /// Field slot within the declaring type; -1 until assigned.
    pub member_index: i32,
    /// Field slot including inherited fields.
    pub recursive_index: i32,
    pub param_flags: ParamFlags,
}

impl Default for ValueData {
    fn default() -> Self {
        Self {
            ty: None,
            init: None,
            member_index: -1,
            recursive_index: -1,
            param_flags: ParamFlags::default(),
        }
    }
}

/// Payload for Function/Macro definitions.
#[derive(Debug, Clone, Default)]
pub struct FunctionData {
    /// The interned Function type, once signature resolution ran.
    pub ftype: Option<TypeId>,
    pub params: Vec<DefnId>,
    pub body: Option<Vec<Expr>>,
    /// Position in the declaring class's instance-method table; -1 until
    /// assigned.
    pub dispatch_index: i32,
    pub overridden: Vec<DefnId>,
    /// For property accessors: the owning property.
    pub property: Option<DefnId>,
}

impl FunctionData {
    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }
}

/// Payload for Property/Indexer definitions.
#[derive(Debug, Clone, Default)]
pub struct PropertyData {
    pub ty: Option<TypeId>,
    pub getter: Option<DefnId>,
    pub setter: Option<DefnId>,
}

/// Payload for Module and Namespace definitions.
#[derive(Debug, Clone, Default)]
pub struct SpaceData {
    pub scope: Option<ScopeId>,
    /// Module path, empty for namespaces.
    pub path: String,
}

/// Payload for explicit imports.
#[derive(Debug, Clone)]
pub struct ImportData {
    pub target: quill_ast::AstPtr,
    pub resolved: Option<DefnId>,
    pub unpack: bool,
}

/// Kind-specific payload of a definition.
#[derive(Debug, Clone)]
pub enum DefnDetail {
    Space(SpaceData),
    Type(TypeDefData),
    Value(ValueData),
    Function(FunctionData),
    Property(PropertyData),
    Import(ImportData),
}

/// Record of which template produced an instance, and with what bindings.
#[derive(Debug, Clone)]
pub struct TemplateInstanceRecord {
    pub template: DefnId,
    pub args: TypeIdVec,
}

/// One definition.
#[derive(Debug, Clone)]
pub struct Defn {
    pub id: DefnId,
    pub kind: DefnKind,
    pub name: Symbol,
    pub module: ModuleId,
    pub parent: Option<DefnId>,
    pub span: Span,
    pub traits: Traits,
    pub visibility: Visibility,
    pub storage: StorageClass,
    /// The declaration this came from; None for synthesized definitions.
    pub ast: Option<Rc<Declaration>>,
    pub attributes: Vec<quill_ast::AstPtr>,
    pub passes: PassState,
    /// Set when this definition is a template.
    pub template: Option<quill_identity::TemplateId>,
    /// Set when this definition was instantiated from a template.
    pub template_instance: Option<TemplateInstanceRecord>,
    /// Lazily-computed linkage name.
    pub linkage_name: Option<String>,
    pub detail: DefnDetail,
}

impl Defn {
    pub fn is_template(&self) -> bool {
        self.template.is_some()
    }

    pub fn is_template_instance(&self) -> bool {
        self.template_instance.is_some()
    }

    pub fn has_trait(&self, t: Traits) -> bool {
        self.traits.contains(t)
    }

    pub fn add_trait(&mut self, t: Traits) {
        self.traits.add(t);
    }

    pub fn copy_trait(&mut self, from: &Defn, t: Traits) {
        if from.has_trait(t) {
            self.traits.add(t);
        }
    }

    pub fn is_ctor(&self) -> bool {
        self.has_trait(Traits::CTOR)
    }

    pub fn is_final(&self) -> bool {
        self.has_trait(Traits::FINAL)
    }

    pub fn is_abstract(&self) -> bool {
        self.has_trait(Traits::ABSTRACT)
    }

    /// A definition is singular when it carries no unbound type variables:
    /// not a template, and not a member of one.
    pub fn is_singular(&self) -> bool {
        self.has_trait(Traits::SINGULAR)
    }

    pub fn as_type(&self) -> Option<&TypeDefData> {
        match &self.detail {
            DefnDetail::Type(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_type_mut(&mut self) -> Option<&mut TypeDefData> {
        match &mut self.detail {
            DefnDetail::Type(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<&ValueData> {
        match &self.detail {
            DefnDetail::Value(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_value_mut(&mut self) -> Option<&mut ValueData> {
        match &mut self.detail {
            DefnDetail::Value(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionData> {
        match &self.detail {
            DefnDetail::Function(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_function_mut(&mut self) -> Option<&mut FunctionData> {
        match &mut self.detail {
            DefnDetail::Function(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_property(&self) -> Option<&PropertyData> {
        match &self.detail {
            DefnDetail::Property(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_property_mut(&mut self) -> Option<&mut PropertyData> {
        match &mut self.detail {
            DefnDetail::Property(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_space(&self) -> Option<&SpaceData> {
        match &self.detail {
            DefnDetail::Space(d) => Some(d),
            _ => None,
        }
    }
}

/// Arena of all definitions in a compilation.
#[derive(Debug, Default)]
pub struct DefGraph {
    defns: Vec<Defn>,
}

impl DefGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.defns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defns.is_empty()
    }

    /// Allocate a definition. The builder closure receives the assigned id
    /// so parent/child links can be recorded immediately.
    pub fn alloc(&mut self, build: impl FnOnce(DefnId) -> Defn) -> DefnId {
        let id = DefnId::new(self.defns.len() as u32);
        let defn = build(id);
        debug_assert_eq!(defn.id, id);
        self.defns.push(defn);
        id
    }

    pub fn get(&self, id: DefnId) -> &Defn {
        &self.defns[id.index() as usize]
    }

    pub fn get_mut(&mut self, id: DefnId) -> &mut Defn {
        &mut self.defns[id.index() as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Defn> {
        self.defns.iter()
    }

    // ========================================================================
    // Typed accessors used across the analyzer
    // ========================================================================

    /// The registry type a TypeDef denotes, if assigned.
    pub fn type_of(&self, id: DefnId) -> Option<TypeId> {
        self.get(id).as_type().and_then(|d| d.ty)
    }

    /// The member scope of a TypeDef or Namespace/Module.
    pub fn member_scope(&self, id: DefnId) -> Option<ScopeId> {
        match &self.get(id).detail {
            DefnDetail::Type(d) => d.scope,
            DefnDetail::Space(d) => d.scope,
            _ => None,
        }
    }

    /// The resolved target of an alias definition.
    pub fn alias_target(&self, id: DefnId) -> Option<TypeId> {
        self.get(id).as_type().and_then(|d| d.aliased)
    }

    /// Composite analysis results for a TypeDef.
    pub fn composite_info(&self, id: DefnId) -> Option<&CompositeInfo> {
        self.get(id).as_type().and_then(|d| d.composite.as_ref())
    }

    pub fn composite_info_mut(&mut self, id: DefnId) -> Option<&mut CompositeInfo> {
        self.get_mut(id)
            .as_type_mut()
            .and_then(|d| d.composite.as_mut())
    }

    /// The declared composite kind, read back from the registry type.
    pub fn composite_kind(
        &self,
        registry: &crate::types::TypeRegistry,
        id: DefnId,
    ) -> Option<CompositeKind> {
        self.type_of(id)
            .and_then(|ty| registry.as_composite(ty))
            .map(|(kind, _)| kind)
    }

    /// The interned function type of a Function definition.
    pub fn function_type(&self, id: DefnId) -> Option<TypeId> {
        self.get(id).as_function().and_then(|d| d.ftype)
    }

    /// The resolved type of a Var/Let/Parameter/Property.
    pub fn value_type(&self, id: DefnId) -> Option<TypeId> {
        match &self.get(id).detail {
            DefnDetail::Value(d) => d.ty,
            DefnDetail::Property(d) => d.ty,
            _ => None,
        }
    }

    /// Coercers recorded on a composite by the Converter pass.
    pub fn coercers(&self, id: DefnId) -> &[DefnId] {
        self.composite_info(id)
            .map(|info| info.coercers.as_slice())
            .unwrap_or(&[])
    }

    pub fn converter_pass_finished(&self, id: DefnId) -> bool {
        self.get(id).passes.is_finished(Pass::Converter)
    }

    /// Walk up enclosing definitions to the nearest TypeDef.
    pub fn enclosing_type(&self, id: DefnId) -> Option<DefnId> {
        let mut current = self.get(id).parent;
        while let Some(parent) = current {
            if self.get(parent).kind == DefnKind::TypeDef {
                return Some(parent);
            }
            current = self.get(parent).parent;
        }
        None
    }

    /// True when the definition sits anywhere inside a template.
    pub fn is_template_member(&self, id: DefnId) -> bool {
        let mut current = self.get(id).parent;
        while let Some(parent) = current {
            if self.get(parent).is_template() {
                return true;
            }
            current = self.get(parent).parent;
        }
        false
    }
}
