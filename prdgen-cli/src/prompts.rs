use anyhow::Result;
use inquire::{Confirm, Select, Text};

use prdgen_core::{
    Requirement, RequirementCategory, RequirementPriority, RequirementStatus, RequirementUpdate,
};

/// Prompts for the fields of a new requirement
///
/// Values already given on the command line are preselected.
pub fn prompt_new_requirement(
    category: Option<RequirementCategory>,
    priority: Option<RequirementPriority>,
) -> Result<(RequirementCategory, String, RequirementPriority)> {
    let description = Text::new("Description:").prompt()?;
    let category = Select::new("Category:", RequirementCategory::all().to_vec())
        .with_starting_cursor(starting_cursor(RequirementCategory::all(), category, 0))
        .prompt()?;
    let priority = Select::new("Priority:", RequirementPriority::all().to_vec())
        .with_starting_cursor(starting_cursor(RequirementPriority::all(), priority, 1))
        .prompt()?;
    Ok((category, description, priority))
}

/// Prompts for every editable field, starting from the current values
pub fn prompt_requirement_update(req: &Requirement) -> Result<RequirementUpdate> {
    let description = Text::new("Description:")
        .with_initial_value(&req.description)
        .prompt()?;
    let category = Select::new("Category:", RequirementCategory::all().to_vec())
        .with_starting_cursor(position(RequirementCategory::all(), &req.category))
        .prompt()?;
    let priority = Select::new("Priority:", RequirementPriority::all().to_vec())
        .with_starting_cursor(position(RequirementPriority::all(), &req.priority))
        .prompt()?;
    let status = Select::new("Status:", RequirementStatus::all().to_vec())
        .with_starting_cursor(position(RequirementStatus::all(), &req.status))
        .prompt()?;

    Ok(RequirementUpdate {
        category: Some(category),
        description: Some(description),
        priority: Some(priority),
        status: Some(status),
    })
}

/// Yes/no question defaulting to no
pub fn confirm(message: &str) -> Result<bool> {
    Ok(Confirm::new(message).with_default(false).prompt()?)
}

fn position<T: PartialEq>(options: &[T], current: &T) -> usize {
    options.iter().position(|o| o == current).unwrap_or(0)
}

/// Cursor on `preset` when given, otherwise on `default`
fn starting_cursor<T: PartialEq>(options: &[T], preset: Option<T>, default: usize) -> usize {
    preset.map_or(default, |value| position(options, &value))
}
