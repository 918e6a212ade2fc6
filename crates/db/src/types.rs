use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

#[derive(
    Clone,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    EnumString,
    Display,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TimelineAction {
    #[sea_orm(string_value = "created")]
    Created,
    #[sea_orm(string_value = "updated")]
    Updated,
    #[sea_orm(string_value = "moved")]
    Moved,
    #[sea_orm(string_value = "commented")]
    Commented,
    #[sea_orm(string_value = "categories_updated")]
    CategoriesUpdated,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::TimelineAction;

    #[test]
    fn timeline_action_round_trips_through_strings() {
        for action in [
            TimelineAction::Created,
            TimelineAction::Updated,
            TimelineAction::Moved,
            TimelineAction::Commented,
            TimelineAction::CategoriesUpdated,
        ] {
            let tag = action.to_string();
            assert_eq!(TimelineAction::from_str(&tag).unwrap(), action);
        }
    }

    #[test]
    fn categories_updated_uses_snake_case_tag() {
        assert_eq!(
            TimelineAction::CategoriesUpdated.to_string(),
            "categories_updated"
        );
    }
}
