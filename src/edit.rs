//! Sidebar Edits
//!
//! Structural edits on the computed tree: adding and removing references,
//! creating, renaming and dissolving groups. Like moves, each returns a new
//! tree and leaves the input untouched.

use crate::error::{DomainError, DomainResult};
use crate::models::{ChildEntry, ComputedTree, Entry, Group, Reference};
use crate::tree::{contains_reference, group_index};

/// Append a reference at the root
pub fn add_reference(tree: &ComputedTree, reference: Reference) -> DomainResult<ComputedTree> {
    if contains_reference(tree, &reference.id) {
        return Err(DomainError::Conflict(format!(
            "Reference {} is already in the sidebar",
            reference.id
        )));
    }
    let mut next = tree.clone();
    next.push(Entry::Reference(reference));
    Ok(next)
}

/// Append an empty group
pub fn add_group(tree: &ComputedTree, id: &str, name: &str) -> DomainResult<ComputedTree> {
    // ':' would split the group segment of child ids
    if id.is_empty() || id.contains(':') {
        return Err(DomainError::InvalidInput(format!("Invalid group id {:?}", id)));
    }
    let name = validate_name(name)?;
    if group_index(tree, id).is_some() {
        return Err(DomainError::Conflict(format!("Group {} already exists", id)));
    }
    let mut next = tree.clone();
    next.push(Entry::Group(Group::new(id, name)));
    Ok(next)
}

pub fn rename_group(tree: &ComputedTree, id: &str, name: &str) -> DomainResult<ComputedTree> {
    let name = validate_name(name)?;
    let idx = group_index(tree, id).ok_or_else(|| group_not_found(id))?;
    let mut next = tree.clone();
    if let Some(group) = next[idx].as_group_mut() {
        group.name = name.to_string();
    }
    Ok(next)
}

/// Dissolve a group; its children take its place in the root list, in order
pub fn remove_group(tree: &ComputedTree, id: &str) -> DomainResult<ComputedTree> {
    let idx = group_index(tree, id).ok_or_else(|| group_not_found(id))?;
    let mut next = tree.clone();
    let released: Vec<Entry> = match next.remove(idx) {
        Entry::Group(group) => group.children.into_iter().map(Entry::from).collect(),
        other => vec![other],
    };
    next.splice(idx..idx, released);
    Ok(next)
}

/// Remove a reference from the root or from whichever group holds it
pub fn remove_reference(tree: &ComputedTree, id: &str) -> DomainResult<ComputedTree> {
    if !contains_reference(tree, id) {
        return Err(DomainError::NotFound(format!("Reference {} not in sidebar", id)));
    }
    let next = tree
        .iter()
        .filter(|entry| !matches!(entry, Entry::Reference(r) if r.id == id))
        .cloned()
        .map(|mut entry| {
            if let Entry::Group(group) = &mut entry {
                group
                    .children
                    .retain(|child| !matches!(child, ChildEntry::Reference(r) if r.id == id));
            }
            entry
        })
        .collect();
    Ok(next)
}

fn validate_name(name: &str) -> DomainResult<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::InvalidInput("Group name cannot be empty".into()));
    }
    Ok(trimmed)
}

fn group_not_found(id: &str) -> DomainError {
    DomainError::NotFound(format!("Group {} not found", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BuiltinKey, ReferenceInfo};
    use crate::tree::find_group;

    fn reference(id: &str) -> Reference {
        Reference::new(id, ReferenceInfo::new(format!("Filter {}", id)))
    }

    fn tree() -> ComputedTree {
        vec![
            Entry::Builtin { key: BuiltinKey::All },
            Entry::Group(Group {
                id: "g1".to_string(),
                name: "Work".to_string(),
                children: vec![
                    ChildEntry::Reference(reference("3")),
                    ChildEntry::Builtin { key: BuiltinKey::Trash },
                ],
            }),
            Entry::Reference(reference("7")),
        ]
    }

    #[test]
    fn test_add_reference() {
        let next = add_reference(&tree(), reference("8")).unwrap();
        assert_eq!(next.last(), Some(&Entry::Reference(reference("8"))));

        assert!(matches!(add_reference(&tree(), reference("7")), Err(DomainError::Conflict(_))));
        assert!(matches!(add_reference(&tree(), reference("3")), Err(DomainError::Conflict(_))));
    }

    #[test]
    fn test_add_group_validation() {
        let next = add_group(&tree(), "g2", "  Personal ").unwrap();
        assert_eq!(find_group(&next, "g2").unwrap().name, "Personal");

        assert!(matches!(add_group(&tree(), "", "X"), Err(DomainError::InvalidInput(_))));
        assert!(matches!(add_group(&tree(), "a:b", "X"), Err(DomainError::InvalidInput(_))));
        assert!(matches!(add_group(&tree(), "g2", "   "), Err(DomainError::InvalidInput(_))));
        assert!(matches!(add_group(&tree(), "g1", "Again"), Err(DomainError::Conflict(_))));
    }

    #[test]
    fn test_rename_group() {
        let next = rename_group(&tree(), "g1", "Projects").unwrap();
        assert_eq!(find_group(&next, "g1").unwrap().name, "Projects");
        assert_eq!(find_group(&next, "g1").unwrap().children.len(), 2);

        assert!(matches!(rename_group(&tree(), "nope", "X"), Err(DomainError::NotFound(_))));
    }

    #[test]
    fn test_remove_group_releases_children_in_place() {
        let next = remove_group(&tree(), "g1").unwrap();
        assert_eq!(
            next,
            vec![
                Entry::Builtin { key: BuiltinKey::All },
                Entry::Reference(reference("3")),
                Entry::Builtin { key: BuiltinKey::Trash },
                Entry::Reference(reference("7")),
            ]
        );
        assert!(matches!(remove_group(&tree(), "g9"), Err(DomainError::NotFound(_))));
    }

    #[test]
    fn test_remove_reference_anywhere() {
        let next = remove_reference(&tree(), "3").unwrap();
        assert_eq!(
            find_group(&next, "g1").unwrap().children,
            vec![ChildEntry::Builtin { key: BuiltinKey::Trash }]
        );

        let next = remove_reference(&tree(), "7").unwrap();
        assert_eq!(next.len(), 2);

        assert!(matches!(remove_reference(&tree(), "42"), Err(DomainError::NotFound(_))));
    }
}
