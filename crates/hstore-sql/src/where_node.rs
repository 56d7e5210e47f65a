//! WHERE tree for [`Query`](crate::Query).

use hstore_query::{Connector, HStoreConstraint, Param, WhereTree};

#[derive(Debug, Clone, PartialEq)]
pub enum WhereChild {
    Node(WhereNode),
    Constraint(HStoreConstraint),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereNode {
    connector: Connector,
    negated: bool,
    children: Vec<WhereChild>,
}

impl WhereNode {
    pub fn connector(&self) -> Connector {
        self.connector
    }

    pub fn children(&self) -> &[WhereChild] {
        &self.children
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Nodes with fewer than two children adopt `connector`. Under a
    /// different connector the current contents are pushed down one level.
    fn add(&mut self, child: WhereChild, connector: Connector) {
        if self.children.len() < 2 {
            self.connector = connector;
        }
        if self.connector != connector {
            let pushed_down = WhereNode {
                connector: self.connector,
                negated: self.negated,
                children: std::mem::take(&mut self.children),
            };
            self.connector = connector;
            self.negated = false;
            self.children = vec![WhereChild::Node(pushed_down), child];
            return;
        }
        match child {
            // Same-connector (or single-child) plain nodes are flattened.
            WhereChild::Node(node)
                if !node.negated
                    && (node.connector == connector || node.children.len() == 1) =>
            {
                self.children.extend(node.children);
            }
            child => self.children.push(child),
        }
    }

    pub fn as_sql(&self, quote: &dyn Fn(&str) -> String) -> (String, Vec<Param>) {
        let mut parts = Vec::new();
        let mut params = Vec::new();
        for child in &self.children {
            let (sql, child_params) = match child {
                WhereChild::Constraint(constraint) => constraint.as_sql(quote),
                WhereChild::Node(node) => {
                    let (sql, p) = node.as_sql(quote);
                    if sql.is_empty() {
                        continue;
                    }
                    if node.is_compound() {
                        (format!("({sql})"), p)
                    } else {
                        (sql, p)
                    }
                }
            };
            parts.push(sql);
            params.extend(child_params);
        }
        let sql = parts.join(&format!(" {} ", self.connector));
        if self.negated && !sql.is_empty() {
            (format!("NOT ({sql})"), params)
        } else {
            (sql, params)
        }
    }

    fn is_compound(&self) -> bool {
        !self.negated && self.children.len() > 1
    }
}

impl WhereTree for WhereNode {
    fn add_node(&mut self, node: Self, connector: Connector) {
        if node.is_empty() {
            return;
        }
        self.add(WhereChild::Node(node), connector);
    }

    fn add_constraint(&mut self, constraint: HStoreConstraint, connector: Connector) {
        self.add(WhereChild::Constraint(constraint), connector);
    }

    /// Negate everything added so far; later additions stay outside.
    fn negate(&mut self) {
        let negated = WhereNode {
            connector: self.connector,
            negated: !self.negated,
            children: std::mem::take(&mut self.children),
        };
        self.connector = Connector::And;
        self.negated = false;
        self.children = vec![WhereChild::Node(negated)];
    }
}
