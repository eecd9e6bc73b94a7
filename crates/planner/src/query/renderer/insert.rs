use crate::query::{
    ast::insert::{ConflictAction, Insert, OnConflict},
    renderer::{Render, Renderer},
};

impl Render for Insert {
    fn render(&self, r: &mut Renderer) {
        r.sql.push_str("INSERT INTO ");
        r.render_table_ref(&self.table);
        let columns = quoted(r, &self.columns);
        r.sql.push_str(&format!(" ({columns}) VALUES ("));
        for (i, expr) in self.row.iter().enumerate() {
            if i > 0 {
                r.sql.push_str(", ");
            }
            expr.render(r);
        }
        r.sql.push(')');

        if let Some(on_conflict) = &self.on_conflict {
            on_conflict.render(r);
        }
    }
}

impl Render for OnConflict {
    fn render(&self, r: &mut Renderer) {
        let keys = quoted(r, &self.keys);
        r.sql.push_str(&format!(" ON CONFLICT ({keys})"));

        match &self.action {
            ConflictAction::UpdateFromExcluded(columns) if !columns.is_empty() => {
                let assignments: Vec<String> = columns
                    .iter()
                    .map(|column| {
                        let column = r.dialect.quote_identifier(column);
                        format!("{column} = EXCLUDED.{column}")
                    })
                    .collect();
                r.sql.push_str(" DO UPDATE SET ");
                r.sql.push_str(&assignments.join(", "));
            }
            _ => r.sql.push_str(" DO NOTHING"),
        }
    }
}

fn quoted(r: &Renderer, names: &[String]) -> String {
    names
        .iter()
        .map(|name| r.dialect.quote_identifier(name))
        .collect::<Vec<_>>()
        .join(", ")
}
