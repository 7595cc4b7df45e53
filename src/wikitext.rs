use crate::settings::Profile;
use crate::results::{value, Binding, ResultSet, ALIAS_VAR, DESCRIPTION_VAR, ENTITY_VAR, LABEL_VAR};

/// Returned instead of a table when the result set has no bindings list.
pub const NO_RESULTS: &str = "Nenhum resultado encontrado";

/// Column variables in cell order.
const COLUMNS: [&str; 4] = [ENTITY_VAR, LABEL_VAR, DESCRIPTION_VAR, ALIAS_VAR];

/// Table markup for one profile.
#[derive(Debug, Clone, PartialEq)]
pub struct TableFormat {
    pub attributes: String,
    pub caption: String,
    pub headers: [String; 4],
    /// Cell text for absent or empty values.
    pub missing: String,
}

impl TableFormat {
    pub fn for_profile(profile: Profile) -> Self {
        let (attributes, missing) = match profile {
            Profile::Plain => (r#"class="wikitable""#, "N/A"),
            Profile::Linked => (r#"class="wikitable sortable" style="width:100%""#, ""),
        };
        Self {
            attributes: attributes.to_string(),
            caption: "Resultados da Consulta".to_string(),
            headers: ["Entidade", "Rótulo", "Descrição", "Alias"].map(String::from),
            missing: missing.to_string(),
        }
    }
}

/// Render `results` as a wikitext table, or [`NO_RESULTS`] when there is
/// nothing to tabulate.
pub fn render(results: Option<&ResultSet>, format: &TableFormat) -> String {
    let Some(bindings) = results.and_then(ResultSet::bindings) else {
        return NO_RESULTS.to_string();
    };

    let mut lines = Vec::with_capacity(6 + bindings.len() * 5 + 1);
    lines.push(format!("{{| {}", format.attributes));
    lines.push(format!("|+ {}", format.caption));
    lines.extend(format.headers.iter().map(|h| format!("! {}", h)));

    for binding in bindings {
        lines.push("|-".to_string());
        lines.extend(row_cells(binding, &format.missing).map(|c| format!("| {}", c)));
    }

    lines.push("|}".to_string());
    lines.join("\n")
}

fn row_cells<'a>(binding: &'a Binding, missing: &'a str) -> impl Iterator<Item = &'a str> {
    COLUMNS
        .into_iter()
        .map(move |var| value(binding, var).unwrap_or(missing))
}
