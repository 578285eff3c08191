//! Group display formatting

use crate::models::Group;

/// Format groups as a table
pub fn format_group_list(groups: &[Group]) -> String {
    if groups.is_empty() {
        return "No groups found.".to_string();
    }

    let name_width = groups
        .iter()
        .map(|g| g.name.len())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<12}  {:<name_width$}  {:<8}  {:>7}  {}\n",
        "ID",
        "Name",
        "Currency",
        "Members",
        "Status",
        name_width = name_width,
    ));
    output.push_str(&format!(
        "{:-<12}  {:-<name_width$}  {:-<8}  {:->7}  {:-<8}\n",
        "",
        "",
        "",
        "",
        "",
        name_width = name_width,
    ));

    for group in groups {
        output.push_str(&format!(
            "{:<12}  {:<name_width$}  {:<8}  {:>7}  {}\n",
            group.id.to_string(),
            group.name,
            group.currency,
            group.members.len(),
            if group.archived { "Archived" } else { "" },
            name_width = name_width,
        ));
    }

    output
}

/// Format a single group's details
pub fn format_group_details(group: &Group) -> String {
    let mut output = String::new();

    output.push_str(&format!("Group: {}\n", group.name));
    output.push_str(&format!("  ID:         {}\n", group.id));
    output.push_str(&format!("  Currency:   {}\n", group.currency));
    output.push_str(&format!("  Created by: {}\n", group.created_by));
    output.push_str(&format!(
        "  Created:    {}\n",
        group.created_at.format("%Y-%m-%d %H:%M UTC")
    ));
    if group.archived {
        output.push_str("  Archived:   Yes\n");
    }
    output.push_str("  Members:\n");
    for member in &group.members {
        output.push_str(&format!("    - {}\n", member));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ParticipantKey;

    #[test]
    fn test_empty_list() {
        assert_eq!(format_group_list(&[]), "No groups found.");
    }

    #[test]
    fn test_list_marks_archived() {
        let mut group = Group::new("Flat", "EUR", ParticipantKey::new("a"), Vec::new());
        group.archived = true;
        let output = format_group_list(&[group]);
        assert!(output.contains("Flat"));
        assert!(output.contains("Archived"));
    }
}
