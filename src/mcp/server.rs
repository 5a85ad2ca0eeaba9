//! SnackTrack MCP Server Implementation
//!
//! Implements the MCP server with all SnackTrack tools.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::db::Database;
use crate::models::{DogCreate, DogUpdate, Sex, WeightEntryCreate};
use crate::nutrition::{ActivityLevel, Composition};
use crate::tools::dashboard;
use crate::tools::dogs;
use crate::tools::foods::{self, FoodInput};
use crate::tools::intakes;
use crate::tools::reports;
use crate::tools::status::StatusTracker;
use crate::tools::weights;

/// SnackTrack MCP Service
#[derive(Clone)]
pub struct SnackTrackService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    database: Database,
    tool_router: ToolRouter<SnackTrackService>,
}

impl SnackTrackService {
    pub fn new(database_path: PathBuf, database: Database) -> Self {
        Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(database_path))),
            database,
            tool_router: Self::tool_router(),
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| McpError::internal_error(e.to_string(), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

fn parse_activity_level(value: &str) -> Result<ActivityLevel, McpError> {
    ActivityLevel::from_str(value).ok_or_else(|| {
        let levels: Vec<&str> = ActivityLevel::ALL.iter().map(|l| l.as_str()).collect();
        McpError::invalid_params(
            format!("Invalid activity_level '{}'. Use one of: {}", value, levels.join(", ")),
            None,
        )
    })
}

// ============================================================================
// Dog Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddDogParams {
    pub name: String,
    /// Body weight in kg
    pub weight_kg: f64,
    /// very_low, low, normal, high or very_high
    #[serde(default = "default_activity_level")]
    pub activity_level: String,
    /// YYYY-MM-DD
    pub birth_date: Option<String>,
    pub breed: Option<String>,
    /// male, female or unknown
    pub sex: Option<String>,
    pub target_weight_kg: Option<f64>,
    pub image_path: Option<String>,
}

fn default_activity_level() -> String { "normal".to_string() }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DogIdParams {
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateDogParams {
    pub id: i64,
    pub name: Option<String>,
    pub weight_kg: Option<f64>,
    pub activity_level: Option<String>,
    pub birth_date: Option<String>,
    pub breed: Option<String>,
    pub sex: Option<String>,
    pub target_weight_kg: Option<f64>,
    pub image_path: Option<String>,
}

// ============================================================================
// Food Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct FoodParams {
    /// EAN-13, EAN-8 or UPC-A barcode
    pub ean: Option<String>,
    #[serde(default)]
    pub brand: String,
    pub product: String,
    /// Crude protein in g/100g
    pub protein: f64,
    /// Crude fat in g/100g
    pub fat: f64,
    /// Crude fiber in g/100g
    #[serde(default)]
    pub crude_fiber: f64,
    /// Crude ash in g/100g
    #[serde(default)]
    pub raw_ash: f64,
    /// Moisture in g/100g
    #[serde(default)]
    pub moisture: f64,
    /// Additive name to amount, e.g. {"Vitamin D3": "1500 IE"}
    #[serde(default)]
    pub additives: BTreeMap<String, String>,
    pub image_url: Option<String>,
}

impl From<FoodParams> for FoodInput {
    fn from(p: FoodParams) -> Self {
        Self {
            ean: p.ean,
            brand: p.brand,
            product: p.product,
            composition: Composition::new(p.protein, p.fat, p.crude_fiber, p.raw_ash, p.moisture),
            additives: p.additives,
            image_url: p.image_url,
        }
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct FoodIdParams {
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct BarcodeParams {
    /// Scanned barcode digits
    pub ean: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchFoodsParams {
    pub query: String,
    #[serde(default = "default_search_limit")]
    pub limit: i64,
}

fn default_search_limit() -> i64 { 20 }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListFoodsParams {
    #[serde(default = "default_list_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_list_limit() -> i64 { 50 }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListSubmissionsParams {
    /// pending, approved or rejected
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ReviewSubmissionParams {
    pub id: i64,
    /// true to approve and publish, false to reject
    pub approve: bool,
}

// ============================================================================
// Intake Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LogFoodIntakeParams {
    pub dog_id: i64,
    pub food_id: i64,
    pub amount_grams: f64,
    /// Local time YYYY-MM-DDTHH:MM:SS, defaults to now
    pub timestamp: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LogManualIntakeParams {
    pub dog_id: i64,
    pub food_name: String,
    pub amount_grams: f64,
    pub calories: i32,
    pub timestamp: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DogDayParams {
    pub dog_id: i64,
    /// YYYY-MM-DD, defaults to today
    pub date: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RecalculateIntakesParams {
    pub dog_id: i64,
    /// YYYY-MM-DD
    pub date: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct EntryIdParams {
    pub id: i64,
}

// ============================================================================
// Weight Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddWeightParams {
    pub dog_id: i64,
    pub weight_kg: f64,
    pub timestamp: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct WeightHistoryParams {
    pub dog_id: i64,
    /// Newest N entries; all when omitted
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GenerateReportParams {
    pub dog_id: i64,
    /// YYYY-MM-DD
    pub start_date: String,
    /// YYYY-MM-DD
    pub end_date: String,
    /// Full path of the PDF to write
    pub output_path: String,
}

// ============================================================================
// Tool Router
// ============================================================================

#[tool_router]
impl SnackTrackService {
    // --- Status ---

    #[tool(description = "Get the current status of the SnackTrack service including build info, database status, and process information")]
    async fn snacktrack_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        let status = tracker.get_status();
        let json = serde_json::to_string_pretty(&status)
            .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Get instructions for tracking a dog's feedings and weight. Call this when starting a session or when unsure how the calorie math works.")]
    fn tracking_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::TRACKING_INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(TRACKING_INSTRUCTIONS)]))
    }

    // --- Dogs ---

    #[tool(description = "Add a dog profile. Returns the profile with its derived daily calorie need.")]
    fn add_dog(&self, Parameters(p): Parameters<AddDogParams>) -> Result<CallToolResult, McpError> {
        let data = DogCreate {
            name: p.name,
            birth_date: p.birth_date,
            breed: p.breed.unwrap_or_default(),
            sex: p.sex.as_deref().map(Sex::from_str).unwrap_or_default(),
            weight_kg: p.weight_kg,
            target_weight_kg: p.target_weight_kg,
            activity_level: parse_activity_level(&p.activity_level)?,
            image_path: p.image_path,
        };
        let result = dogs::add_dog(&self.database, data).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Get a dog profile with age, activity factor and daily calorie need")]
    fn get_dog(&self, Parameters(p): Parameters<DogIdParams>) -> Result<CallToolResult, McpError> {
        let result = dogs::get_dog(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Some(dog) => serde_json::to_string_pretty(&dog),
            None => Ok(format!(r#"{{"error": "Dog not found", "id": {}}}"#, p.id)),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "List all dogs with their daily calorie need")]
    fn list_dogs(&self) -> Result<CallToolResult, McpError> {
        let result = dogs::list_dogs(&self.database).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Update a dog profile. Only the provided fields change.")]
    fn update_dog(&self, Parameters(p): Parameters<UpdateDogParams>) -> Result<CallToolResult, McpError> {
        let activity_level = match p.activity_level.as_deref() {
            Some(level) => Some(parse_activity_level(level)?),
            None => None,
        };
        let data = DogUpdate {
            name: p.name,
            birth_date: p.birth_date,
            breed: p.breed,
            sex: p.sex.as_deref().map(Sex::from_str),
            weight_kg: p.weight_kg,
            target_weight_kg: p.target_weight_kg,
            activity_level,
            image_path: p.image_path,
        };
        let result = dogs::update_dog(&self.database, p.id, data).map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Some(dog) => serde_json::to_string_pretty(&dog),
            None => Ok(format!(r#"{{"error": "Dog not found", "id": {}}}"#, p.id)),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Delete a dog together with its feedings and weight history")]
    fn delete_dog(&self, Parameters(p): Parameters<DogIdParams>) -> Result<CallToolResult, McpError> {
        let result = dogs::delete_dog(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    // --- Foods ---

    #[tool(description = "Add a food from its package label (values per 100 g). Carbohydrate and kcal/100g are derived.")]
    fn add_food(&self, Parameters(p): Parameters<FoodParams>) -> Result<CallToolResult, McpError> {
        let result = foods::add_food(&self.database, p.into()).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Get a food with derived carbohydrate, energy density and number of logged feedings")]
    fn get_food(&self, Parameters(p): Parameters<FoodIdParams>) -> Result<CallToolResult, McpError> {
        let result = foods::get_food(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Some(food) => serde_json::to_string_pretty(&food),
            None => Ok(format!(r#"{{"error": "Food not found", "id": {}}}"#, p.id)),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Look up a food by scanned barcode (EAN-13, EAN-8 or UPC-A). Returns found=false when unknown.")]
    fn lookup_food_by_barcode(&self, Parameters(p): Parameters<BarcodeParams>) -> Result<CallToolResult, McpError> {
        let result = foods::lookup_food_by_barcode(&self.database, &p.ean)
            .map_err(|e| McpError::invalid_params(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Search foods by product name or brand")]
    fn search_foods(&self, Parameters(p): Parameters<SearchFoodsParams>) -> Result<CallToolResult, McpError> {
        let result = foods::search_foods(&self.database, &p.query, p.limit).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "List foods with pagination")]
    fn list_foods(&self, Parameters(p): Parameters<ListFoodsParams>) -> Result<CallToolResult, McpError> {
        let result = foods::list_foods(&self.database, p.limit, p.offset).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Delete a food. Feedings already logged keep their calories.")]
    fn delete_food(&self, Parameters(p): Parameters<FoodIdParams>) -> Result<CallToolResult, McpError> {
        let result = foods::delete_food(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Submit a food for review instead of adding it directly")]
    fn submit_food(&self, Parameters(p): Parameters<FoodParams>) -> Result<CallToolResult, McpError> {
        let result = foods::submit_food(&self.database, p.into()).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "List food submissions, optionally filtered by status (pending, approved, rejected)")]
    fn list_food_submissions(&self, Parameters(p): Parameters<ListSubmissionsParams>) -> Result<CallToolResult, McpError> {
        let result = foods::list_food_submissions(&self.database, p.status.as_deref())
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Approve (adds the food to the database) or reject a pending food submission")]
    fn review_food_submission(&self, Parameters(p): Parameters<ReviewSubmissionParams>) -> Result<CallToolResult, McpError> {
        let result = foods::review_food_submission(&self.database, p.id, p.approve)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    // --- Intakes ---

    #[tool(description = "Log a feeding of a database food. Calories and macros are derived from the food and amount.")]
    fn log_food_intake(&self, Parameters(p): Parameters<LogFoodIntakeParams>) -> Result<CallToolResult, McpError> {
        let result = intakes::log_food_intake(&self.database, p.dog_id, p.food_id, p.amount_grams, p.timestamp, p.note)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Log a feeding with calories entered by hand (treats, table scraps)")]
    fn log_manual_intake(&self, Parameters(p): Parameters<LogManualIntakeParams>) -> Result<CallToolResult, McpError> {
        let result = intakes::log_manual_intake(&self.database, p.dog_id, &p.food_name, p.amount_grams, p.calories, p.timestamp, p.note)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "List a dog's feedings for one day with the calorie total")]
    fn list_intakes_for_day(&self, Parameters(p): Parameters<DogDayParams>) -> Result<CallToolResult, McpError> {
        let result = intakes::list_intakes_for_day(&self.database, p.dog_id, p.date.as_deref())
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Delete a logged feeding")]
    fn delete_intake(&self, Parameters(p): Parameters<EntryIdParams>) -> Result<CallToolResult, McpError> {
        let result = intakes::delete_intake(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Re-derive calories of a day's database-food feedings after correcting a food's label")]
    fn recalculate_intakes_for_day(&self, Parameters(p): Parameters<RecalculateIntakesParams>) -> Result<CallToolResult, McpError> {
        let result = intakes::recalculate_intakes_for_day(&self.database, p.dog_id, &p.date)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    // --- Dashboard ---

    #[tool(description = "Daily summary: consumed calories, daily need, remaining calories (negative when overfed) and the day's feedings")]
    fn daily_summary(&self, Parameters(p): Parameters<DogDayParams>) -> Result<CallToolResult, McpError> {
        let result = dashboard::daily_summary(&self.database, p.dog_id, p.date.as_deref())
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    // --- Weights ---

    #[tool(description = "Record a weigh-in. Updates the dog's current weight unless a later entry exists.")]
    fn add_weight_entry(&self, Parameters(p): Parameters<AddWeightParams>) -> Result<CallToolResult, McpError> {
        let data = WeightEntryCreate {
            dog_id: p.dog_id,
            weight_kg: p.weight_kg,
            timestamp: p.timestamp,
            note: p.note,
        };
        let result = weights::add_weight_entry(&self.database, data).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Weight history, newest first, with change between weigh-ins and distance to target")]
    fn get_weight_history(&self, Parameters(p): Parameters<WeightHistoryParams>) -> Result<CallToolResult, McpError> {
        let result = weights::get_weight_history(&self.database, p.dog_id, p.limit)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Delete a weight entry")]
    fn delete_weight_entry(&self, Parameters(p): Parameters<EntryIdParams>) -> Result<CallToolResult, McpError> {
        let result = weights::delete_weight_entry(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    // --- Reports ---

    #[tool(description = "Generate a PDF report with a weight trend chart and a per-day calories vs. need table")]
    fn generate_weight_report(&self, Parameters(p): Parameters<GenerateReportParams>) -> Result<CallToolResult, McpError> {
        let result = reports::generate_weight_report(&self.database, p.dog_id, &p.start_date, &p.end_date, &p.output_path)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }
}

#[tool_handler]
impl ServerHandler for SnackTrackService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "snacktrack".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("SnackTrack".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "SnackTrack - Dog nutrition and weight tracking. \
                 IMPORTANT: Call tracking_instructions first for the calorie formulas and workflow. \
                 Dogs: add/get/list/update/delete_dog (daily_calorie_need is derived from weight and activity). \
                 Foods: add/get/search/list/delete_food, lookup_food_by_barcode, \
                 submit_food/list_food_submissions/review_food_submission. \
                 Feedings: log_food_intake, log_manual_intake, list_intakes_for_day, delete_intake, recalculate_intakes_for_day. \
                 Dashboard: daily_summary. \
                 Weight: add_weight_entry, get_weight_history, delete_weight_entry, generate_weight_report."
                    .into(),
            ),
        }
    }
}
