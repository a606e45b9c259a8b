//! Visitor over filter trees, used to translate them into a backend's own filter dialect.

use crate::{BinaryOp, Expr, Literal, UnaryOp};

pub trait Visitor<T> {
    fn visit_ident(&mut self, name: &str) -> T;

    fn visit_literal(&mut self, value: &Literal) -> T;

    fn visit_list(&mut self, items: &[Literal]) -> T;

    fn visit_index(&mut self, target: &Expr, index: &Literal) -> T;

    fn visit_unary(&mut self, op: UnaryOp, operand: &Expr) -> T;

    fn visit_binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr) -> T;
}

/// Dispatches `expr` to the matching visitor method. Visitors recurse by calling `walk`
/// on child nodes themselves, so they control traversal order.
pub fn walk<T, V>(visitor: &mut V, expr: &Expr) -> T
where
    V: Visitor<T> + ?Sized,
{
    match expr {
        Expr::Ident { name } => visitor.visit_ident(name),
        Expr::Literal { value } => visitor.visit_literal(value),
        Expr::List { items } => visitor.visit_list(items),
        Expr::Index { target, index } => visitor.visit_index(target, index),
        Expr::Unary { op, operand } => visitor.visit_unary(*op, operand),
        Expr::Binary { op, left, right } => visitor.visit_binary(*op, left, right),
    }
}

impl Expr {
    pub fn accept<T, V>(&self, visitor: &mut V) -> T
    where
        V: Visitor<T> + ?Sized,
    {
        walk(visitor, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    /// Renders a filter as a parameterized SQL `WHERE` clause.
    #[derive(Default)]
    struct SqlWhere {
        params: Vec<Literal>,
    }

    impl Visitor<String> for SqlWhere {
        fn visit_ident(&mut self, name: &str) -> String {
            format!("\"{name}\"")
        }

        fn visit_literal(&mut self, value: &Literal) -> String {
            self.params.push(value.clone());
            format!("${}", self.params.len())
        }

        fn visit_list(&mut self, items: &[Literal]) -> String {
            let placeholders = items
                .iter()
                .map(|item| self.visit_literal(item))
                .collect::<Vec<_>>();
            format!("({})", placeholders.join(", "))
        }

        fn visit_index(&mut self, target: &Expr, index: &Literal) -> String {
            let target = walk(self, target);
            let index = self.visit_literal(index);
            format!("{target}->{index}")
        }

        fn visit_unary(&mut self, _op: UnaryOp, operand: &Expr) -> String {
            format!("NOT ({})", walk(self, operand))
        }

        fn visit_binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr) -> String {
            let left = walk(self, left);
            let right = walk(self, right);
            if op.is_logical() {
                format!("({left} {op} {right})")
            } else if op == BinaryOp::Eq {
                format!("{left} = {right}")
            } else if op == BinaryOp::Ne {
                format!("{left} <> {right}")
            } else {
                format!("{left} {op} {right}")
            }
        }
    }

    #[derive(Default)]
    struct Identifiers(Vec<String>);

    impl Visitor<()> for Identifiers {
        fn visit_ident(&mut self, name: &str) {
            self.0.push(name.to_string());
        }

        fn visit_literal(&mut self, _value: &Literal) {}

        fn visit_list(&mut self, _items: &[Literal]) {}

        fn visit_index(&mut self, target: &Expr, _index: &Literal) {
            walk(self, target);
        }

        fn visit_unary(&mut self, _op: UnaryOp, operand: &Expr) {
            walk(self, operand);
        }

        fn visit_binary(&mut self, _op: BinaryOp, left: &Expr, right: &Expr) {
            walk(self, left);
            walk(self, right);
        }
    }

    #[test]
    fn translates_to_another_dialect() {
        let expr = parse("genre IN ('drama', 'noir') AND NOT year < 1950").expect("parse");
        let mut sql = SqlWhere::default();

        let clause = expr.accept(&mut sql);

        assert_eq!(clause, "(\"genre\" IN ($1, $2) AND NOT (\"year\" < $3))");
        assert_eq!(
            sql.params,
            vec![
                Literal::from("drama"),
                Literal::from("noir"),
                Literal::from(1950)
            ]
        );
    }

    #[test]
    fn collects_identifiers_in_source_order() {
        let expr = parse("a == 1 OR (b[0] != 2 AND c)").expect("parse");
        let mut identifiers = Identifiers::default();

        walk(&mut identifiers, &expr);

        assert_eq!(identifiers.0, vec!["a", "b", "c"]);
    }
}
