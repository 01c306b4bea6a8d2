//! Plain-text rendering of the roster.

use itertools::Itertools as _;

use super::RowView;

const HEADERS: [&str; 5] = ["Name", "Email", "Role", "Change role", "Delete"];

pub fn render(rows: &[RowView<'_>]) -> String {
    let cells = rows.iter().map(cells).collect::<Vec<_>>();

    let widths = HEADERS.map(str::len);
    let widths = cells.iter().fold(widths, |mut widths, line| {
        for (width, cell) in widths.iter_mut().zip(line) {
            *width = (*width).max(cell.chars().count());
        }
        widths
    });

    let format_line = |line: &[String]| {
        line.iter()
            .zip(widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let header = format_line(&HEADERS.map(String::from));
    let separator = widths.iter().map(|width| "-".repeat(*width)).join("-+-");

    [header, separator]
        .into_iter()
        .chain(cells.iter().map(|line| format_line(line)))
        .join("\n")
}

fn cells(row: &RowView<'_>) -> [String; 5] {
    let name = if row.is_self {
        format!("{} (you)", row.user.name)
    } else {
        row.user.name.clone()
    };
    let change_role = if row.role_select_disabled {
        "-".to_string()
    } else {
        row.enabled_roles().join(", ")
    };
    let delete = if row.delete_disabled { "-" } else { "yes" };

    [
        name,
        row.user.email.clone(),
        row.user.role.to_string(),
        change_role,
        delete.to_string(),
    ]
}
