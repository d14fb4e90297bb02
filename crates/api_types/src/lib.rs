use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Plugin kind as it appears in URLs (`pro`, `alt`). The form choices
/// `PRO` / `ALT` are accepted too.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginType {
    #[serde(alias = "PRO")]
    Pro,
    #[serde(alias = "ALT")]
    Alt,
}

pub mod catalog {
    use super::*;

    /// Query string of `GET /plugins`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CatalogParams {
        pub tab: Option<String>,
        /// Category or subcategory slug.
        pub category: Option<String>,
        pub q: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PluginSummary {
        pub id: i32,
        pub kind: PluginType,
        pub name: String,
        pub date_released: NaiveDate,
        /// USD.
        pub price: i32,
        pub description: String,
        /// Megabytes.
        pub size: f64,
        pub size_display: String,
        pub download_link: String,
        /// Resolved image URL, never empty.
        pub image: String,
        pub rating: f64,
        pub url: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SubcategoryItem {
        pub id: i32,
        pub name: String,
        pub slug: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryItem {
        pub id: i32,
        pub name: String,
        pub slug: String,
        pub subcategories: Vec<SubcategoryItem>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CatalogPage {
        pub tab: PluginType,
        pub category: Option<String>,
        pub active_parent: Option<String>,
        pub q: Option<String>,
        /// Set for asynchronous fetches, which only need the plugin list.
        pub partial: bool,
        pub plugins: Vec<PluginSummary>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub categories: Option<Vec<CategoryItem>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SubcategoryLabel {
        pub name: String,
        pub slug: String,
        pub category: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AudioDemo {
        pub title: String,
        pub url: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LinkedPlugin {
        pub kind: PluginType,
        pub id: i32,
        pub name: String,
        pub url: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PluginDetail {
        pub plugin: PluginSummary,
        pub subcategories: Vec<SubcategoryLabel>,
        pub demos: Vec<AudioDemo>,
        /// Alternatives of a Pro plugin, or the Pro plugins an Alternative replaces.
        pub linked: Vec<LinkedPlugin>,
        /// The requesting user's own score, when authenticated and rated.
        pub user_rating: Option<f64>,
        pub rating_count: u64,
    }
}

pub mod search {
    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct SearchParams {
        pub q: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SearchResult {
        pub name: String,
        pub category: String,
        /// `Free` or `Pro/Paid`.
        #[serde(rename = "type")]
        pub kind: String,
        pub image: String,
        pub url: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SearchResponse {
        pub results: Vec<SearchResult>,
    }
}

pub mod rating {
    use super::*;

    /// A score sent either as a JSON number or as a numeric string.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(untagged)]
    pub enum ScoreInput {
        Number(f64),
        Text(String),
    }

    impl ScoreInput {
        pub fn value(&self) -> Option<f64> {
            match self {
                Self::Number(value) => Some(*value),
                Self::Text(text) => text.trim().parse().ok(),
            }
        }
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RateRequest {
        #[serde(default)]
        pub score: Option<ScoreInput>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RateResponse {
        pub success: bool,
        pub new_average: f64,
    }
}

pub mod staff {
    use super::*;

    /// A file upload carried inline as base64.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct Upload {
        pub file_name: String,
        pub content_base64: String,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct DemoSlot {
        pub title: Option<String>,
        pub file: Option<Upload>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PluginForm {
        pub plugin_type: PluginType,
        pub plugin_name: String,
        pub date_released: NaiveDate,
        /// Subcategory ids.
        pub subcategory: Vec<i32>,
        pub price: i32,
        pub description: String,
        pub size: f64,
        pub download_link: String,
        pub image: Option<Upload>,
        /// Only used for Alternative plugins.
        #[serde(default)]
        pub link_to_pro_plugins: Vec<i32>,
        /// Up to three demo slots.
        #[serde(default)]
        pub audio_demos: Vec<DemoSlot>,
        pub suggestion_id: Option<i32>,
    }

    /// Body of `POST /staff/dashboard`: exactly one of the two markers.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum DashboardAction {
        SubmitPlugin(PluginForm),
        RejectSuggestion { suggestion_id: i32 },
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DashboardResponse {
        pub success: bool,
        pub message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub plugin_id: Option<i32>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PluginChoice {
        pub id: i32,
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Dashboard {
        pub categories: Vec<catalog::CategoryItem>,
        /// Choices for `link_to_pro_plugins`, ordered by name.
        pub pro_plugins: Vec<PluginChoice>,
        pub pending_suggestions: Vec<profile::Suggestion>,
        pub my_plugins: Vec<catalog::PluginSummary>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DeletePlugin {
        pub plugin_id: i32,
        pub plugin_type: PluginType,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DeleteResponse {
        pub success: bool,
        pub message: String,
    }
}

pub mod profile {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SuggestionNew {
        pub name: String,
        pub suggested_type: PluginType,
        pub link: String,
        pub description: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Suggestion {
        pub id: i32,
        pub name: String,
        pub suggested_type: PluginType,
        pub link: String,
        pub description: String,
        /// `PENDING`, `APPROVED` or `REJECTED`.
        pub status: String,
        pub submitted_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Profile {
        pub username: String,
        pub suggestions: Vec<Suggestion>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SuggestionCreated {
        pub success: bool,
        pub suggestion: Suggestion,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plugin_type_accepts_url_tags_and_form_choices() {
        let pro: PluginType = serde_json::from_str("\"pro\"").unwrap();
        let alt: PluginType = serde_json::from_str("\"ALT\"").unwrap();
        assert_eq!(pro, PluginType::Pro);
        assert_eq!(alt, PluginType::Alt);
        assert_eq!(serde_json::to_string(&PluginType::Alt).unwrap(), "\"alt\"");
    }

    #[test]
    fn score_accepts_numbers_and_numeric_strings() {
        let body: rating::RateRequest = serde_json::from_str(r#"{"score": 4.5}"#).unwrap();
        assert_eq!(body.score.and_then(|s| s.value()), Some(4.5));

        let body: rating::RateRequest = serde_json::from_str(r#"{"score": "3"}"#).unwrap();
        assert_eq!(body.score.and_then(|s| s.value()), Some(3.0));

        let body: rating::RateRequest = serde_json::from_str(r#"{"score": "loud"}"#).unwrap();
        assert_eq!(body.score.and_then(|s| s.value()), None);

        let body: rating::RateRequest = serde_json::from_str("{}").unwrap();
        assert!(body.score.is_none());
    }

    #[test]
    fn dashboard_action_is_keyed_by_marker() {
        let action: staff::DashboardAction =
            serde_json::from_str(r#"{"reject_suggestion": {"suggestion_id": 7}}"#).unwrap();
        assert!(matches!(
            action,
            staff::DashboardAction::RejectSuggestion { suggestion_id: 7 }
        ));

        let both = r#"{"reject_suggestion": {"suggestion_id": 7}, "submit_plugin": {}}"#;
        assert!(serde_json::from_str::<staff::DashboardAction>(both).is_err());
    }

    #[test]
    fn partial_page_omits_categories() {
        let page = catalog::CatalogPage {
            tab: PluginType::Pro,
            category: None,
            active_parent: None,
            q: None,
            partial: true,
            plugins: Vec::new(),
            categories: None,
        };
        let json = serde_json::to_value(&page).unwrap();
        assert!(json.get("categories").is_none());
        assert_eq!(json["partial"], true);
    }
}
