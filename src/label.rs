use swc_core::ecma::ast::*;

/// Names of the enclosing declarations, innermost last. Visitors push when they
/// enter a labelled node and pop when they leave it.
#[derive(Debug, Default)]
pub struct LabelStack {
    names: Vec<Option<String>>,
}

impl LabelStack {
    pub fn push(&mut self, name: Option<String>) {
        self.names.push(name);
    }

    pub fn pop(&mut self) {
        self.names.pop();
    }

    /// Label of the innermost named declaration.
    pub fn current(&self) -> Option<&str> {
        self.names.iter().rev().find_map(|name| name.as_deref())
    }
}

pub fn declarator_label(decl: &VarDeclarator) -> Option<String> {
    match &decl.name {
        Pat::Ident(binding) => Some(binding.id.sym.to_string()),
        _ => None,
    }
}

pub fn prop_label(key: &PropName) -> Option<String> {
    match key {
        PropName::Ident(ident) => Some(ident.sym.to_string()),
        PropName::Str(s) => Some(s.value.to_string()),
        _ => None,
    }
}

/// Implements the label-tracking `visit_mut_*` methods for a visitor with a
/// `labels: LabelStack` field.
macro_rules! track_labels {
    () => {
        fn visit_mut_var_declarator(&mut self, n: &mut VarDeclarator) {
            self.labels.push($crate::label::declarator_label(n));
            n.visit_mut_children_with(self);
            self.labels.pop();
        }

        fn visit_mut_key_value_prop(&mut self, n: &mut KeyValueProp) {
            self.labels.push($crate::label::prop_label(&n.key));
            n.visit_mut_children_with(self);
            self.labels.pop();
        }

        fn visit_mut_fn_decl(&mut self, n: &mut FnDecl) {
            self.labels.push(Some(n.ident.sym.to_string()));
            n.visit_mut_children_with(self);
            self.labels.pop();
        }

        fn visit_mut_class_decl(&mut self, n: &mut ClassDecl) {
            self.labels.push(Some(n.ident.sym.to_string()));
            n.visit_mut_children_with(self);
            self.labels.pop();
        }
    };
}
pub(crate) use track_labels;
