//! Visitor over the syntax node set.
//!
//! Every `visit_*` method defaults to the matching `walk_*` function, so an
//! implementation only overrides the node kinds it cares about and calls
//! `walk_*` itself when it still wants to descend.

use crate::syntax::{
    ArrayLiteral, Call, ClassDecl, Decorator, Identifier, Literal, MethodDecl, Node,
    ParameterDecl, PropertyAssignment, SourceFile,
};

pub trait Visitor {
    fn visit_node(&mut self, node: &Node) {
        walk_node(self, node);
    }

    fn visit_decorator(&mut self, decorator: &Decorator) {
        walk_decorator(self, decorator);
    }

    fn visit_call(&mut self, call: &Call) {
        walk_call(self, call);
    }

    fn visit_array(&mut self, array: &ArrayLiteral) {
        walk_array(self, array);
    }

    fn visit_identifier(&mut self, _identifier: &Identifier) {}

    fn visit_property(&mut self, property: &PropertyAssignment) {
        walk_property(self, property);
    }

    fn visit_literal(&mut self, _literal: &Literal) {}

    fn visit_parameter(&mut self, parameter: &ParameterDecl) {
        walk_parameter(self, parameter);
    }

    fn visit_method(&mut self, method: &MethodDecl) {
        walk_method(self, method);
    }
}

pub fn walk_node<V: Visitor + ?Sized>(visitor: &mut V, node: &Node) {
    match node {
        Node::Call(call) => visitor.visit_call(call),
        Node::Array(array) => visitor.visit_array(array),
        Node::Identifier(identifier) => visitor.visit_identifier(identifier),
        Node::Property(property) => visitor.visit_property(property),
        Node::Literal(literal) => visitor.visit_literal(literal),
    }
}

pub fn walk_decorator<V: Visitor + ?Sized>(visitor: &mut V, decorator: &Decorator) {
    visitor.visit_node(&decorator.expression);
}

pub fn walk_call<V: Visitor + ?Sized>(visitor: &mut V, call: &Call) {
    for argument in &call.arguments.items {
        visitor.visit_node(&argument.node);
    }
    for segment in &call.chain {
        visitor.visit_call(segment);
    }
}

pub fn walk_array<V: Visitor + ?Sized>(visitor: &mut V, array: &ArrayLiteral) {
    for element in &array.elements {
        visitor.visit_node(element);
    }
}

pub fn walk_property<V: Visitor + ?Sized>(visitor: &mut V, property: &PropertyAssignment) {
    visitor.visit_node(&property.value);
}

pub fn walk_parameter<V: Visitor + ?Sized>(visitor: &mut V, parameter: &ParameterDecl) {
    for decorator in &parameter.decorators {
        visitor.visit_decorator(decorator);
    }
}

/// Method decorators first, then each parameter in order.
pub fn walk_method<V: Visitor + ?Sized>(visitor: &mut V, method: &MethodDecl) {
    for decorator in &method.decorators {
        visitor.visit_decorator(decorator);
    }
    for parameter in &method.parameters {
        visitor.visit_parameter(parameter);
    }
}

pub fn walk_class<V: Visitor + ?Sized>(visitor: &mut V, class: &ClassDecl) {
    for decorator in &class.decorators {
        visitor.visit_decorator(decorator);
    }
    for method in &class.methods {
        visitor.visit_method(method);
    }
}

/// Module-level property assignments, then every class.
pub fn walk_source<V: Visitor + ?Sized>(visitor: &mut V, source: &SourceFile) {
    for property in &source.properties {
        visitor.visit_property(property);
    }
    for class in &source.classes {
        walk_class(visitor, class);
    }
}
