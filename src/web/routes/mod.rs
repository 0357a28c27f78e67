pub mod ingredient_routes;
pub mod recipe_routes;
pub mod tag_routes;
pub mod user_routes;

use crate::web::error::AppError;
use crate::web::models::NameInput;

/// Trims a required text field and rejects blanks, DRF-style.
pub(crate) fn clean_required(field: &str, raw: &str) -> Result<String, AppError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(AppError::InvalidInput(format!(
            "{field}: this field may not be blank."
        )));
    }
    Ok(value.to_owned())
}

/// Validates a nested name list; every entry must be non-blank.
pub(crate) fn clean_names(field: &str, items: Vec<NameInput>) -> Result<Vec<String>, AppError> {
    items
        .into_iter()
        .map(|item| clean_required(field, &item.name))
        .collect()
}

/// Parses a comma-separated ID list filter value, e.g. `tags_in=1,3`.
pub(crate) fn parse_id_list(field: &str, raw: &str) -> Result<Vec<i32>, AppError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i32>().map_err(|_| {
                AppError::InvalidInput(format!("{field}: enter a valid list of numbers."))
            })
        })
        .collect()
}

/// Query-string boolean accepting both `1` and `true` spellings.
pub(crate) fn parse_bool_flag(raw: Option<&str>) -> bool {
    matches!(
        raw.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1") | Some("true")
    )
}
