use std::collections::HashMap;

use lumitree_core::{FlattenedItem, NodeId};
use lumitree_store::model::NodeRecord;

/// Render flattened rows as indented text lines, one per visible node.
pub fn render_outline(records: &[NodeRecord], items: &[FlattenedItem]) -> Vec<String> {
    let by_id: HashMap<NodeId, &NodeRecord> = records.iter().map(|r| (r.id, r)).collect();

    items
        .iter()
        .map(|item| {
            let icon = if item.is_container {
                if item.collapsed { "\u{25B6} " } else { "\u{25BC} " }
            } else {
                "\u{25CF} "
            };
            let (name, kind) = by_id
                .get(&item.id)
                .map_or(("?", "?"), |r| (r.name.as_str(), r.kind.as_str()));
            format!(
                "{}{}{} [{}] #{}",
                "  ".repeat(item.depth),
                icon,
                name,
                kind,
                item.id
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use lumitree_core::{build_tree, flatten};
    use lumitree_store::db::open_memory_db;
    use lumitree_store::model::{self, NodeKind};

    #[test]
    fn test_render_outline() {
        let conn = open_memory_db().unwrap();
        model::init_db(&conn).unwrap();
        let folder = model::add_record(&conn, None, "Porch", NodeKind::Folder).unwrap();
        let eaves = model::add_record(&conn, Some(folder), "Eaves", NodeKind::LightString).unwrap();

        let records = model::list_records(&conn).unwrap();
        let tree = build_tree(&records);

        let collapsed = render_outline(&records, &flatten(&tree, &HashSet::new()));
        assert_eq!(collapsed, vec![format!("\u{25B6} Porch [folder] #{folder}")]);

        let expanded: HashSet<NodeId> = [folder].into_iter().collect();
        let lines = render_outline(&records, &flatten(&tree, &expanded));
        assert_eq!(
            lines,
            vec![
                format!("\u{25BC} Porch [folder] #{folder}"),
                format!("  \u{25CF} Eaves [light_string] #{eaves}"),
            ]
        );
    }
}
