//! The output side: primitive DDL commands and the flat sequence the
//! compiler emits.

use serde::{Deserialize, Serialize};
use sdlc_types::QualName;

use crate::ast::{
    AbstractAnnotationDecl, AbstractConstraintDecl, AccessPolicy, AliasDecl, Annotation,
    ConcreteConstraint, ConcreteIndex, FunctionDecl, GlobalDecl, ObjectTypeDecl, Pointer,
    ScalarTypeDecl,
};

/// The payload of one DDL command: an AST subtree identical in shape to the
/// corresponding input node, tagged with enough context (owner name, for
/// sub-entities) to stand alone as an `Alter*` command when nested.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum DdlNode {
    Module,
    ObjectType(ObjectTypeDecl),
    ScalarType(ScalarTypeDecl),
    Pointer { owner: QualName, pointer: Pointer },
    ConcreteConstraint { subject: QualName, constraint: ConcreteConstraint },
    ConcreteIndex { owner: QualName, index: ConcreteIndex },
    AccessPolicy { owner: QualName, policy: AccessPolicy },
    AnnotationValue { owner: QualName, annotation: Annotation },
    Alias(AliasDecl),
    Global(GlobalDecl),
    Function(FunctionDecl),
    AbstractConstraint(AbstractConstraintDecl),
    AbstractAnnotation(AbstractAnnotationDecl),
}

/// Whether a command creates a schema object for the first time or alters
/// one created earlier in the same sequence (a nested declaration's
/// enclosing `Alter*` wrapper).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DdlKind {
    CreateModule,
    Create,
    Alter,
}

/// One emitted command.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ddl {
    pub name: QualName,
    pub kind: DdlKind,
    pub node: DdlNode,
    /// Set on `Create` commands appearing under a nested context, so a
    /// downstream executor knows to alter-or-create idempotently.
    pub sdl_alter_if_exists: bool,
}

impl Ddl {
    pub fn create_module(name: QualName) -> Self {
        Ddl {
            name,
            kind: DdlKind::CreateModule,
            node: DdlNode::Module,
            sdl_alter_if_exists: false,
        }
    }
}
