//! Food MCP Tools
//!
//! Tools for the food database: barcode lookup, search, and user submissions.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::db::Database;
use crate::models::{Food, FoodCreate, FoodSubmission, SubmissionStatus};
use crate::nutrition::{normalize_ean, BarcodeFormat, Composition};

/// Food data as entered by a user (barcode not yet normalized)
#[derive(Debug, Clone, Default)]
pub struct FoodInput {
    pub ean: Option<String>,
    pub brand: String,
    pub product: String,
    pub composition: Composition,
    pub additives: BTreeMap<String, String>,
    pub image_url: Option<String>,
}

/// Full food detail with derived values
#[derive(Debug, Serialize)]
pub struct FoodDetail {
    pub id: i64,
    pub ean: Option<String>,
    pub brand: String,
    pub product: String,
    pub protein: f64,
    pub fat: f64,
    pub crude_fiber: f64,
    pub raw_ash: f64,
    pub moisture: f64,
    pub carbs: f64,
    pub kcal_per_100g: f64,
    pub additives: BTreeMap<String, String>,
    pub image_url: Option<String>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intake_count: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl FoodDetail {
    pub fn from_food(food: Food, intake_count: Option<i64>) -> Self {
        let warnings = composition_warnings(&food.composition);
        Self {
            carbs: food.carbs(),
            kcal_per_100g: food.kcal_per_100g(),
            id: food.id,
            ean: food.ean,
            brand: food.brand,
            product: food.product,
            protein: food.composition.protein,
            fat: food.composition.fat,
            crude_fiber: food.composition.crude_fiber,
            raw_ash: food.composition.raw_ash,
            moisture: food.composition.moisture,
            additives: food.additives,
            image_url: food.image_url,
            created_at: food.created_at,
            intake_count,
            warnings,
        }
    }
}

/// Summary of a food for search results
#[derive(Debug, Serialize)]
pub struct FoodSummary {
    pub id: i64,
    pub ean: Option<String>,
    pub brand: String,
    pub product: String,
    pub kcal_per_100g: f64,
}

impl From<&Food> for FoodSummary {
    fn from(food: &Food) -> Self {
        Self {
            id: food.id,
            ean: food.ean.clone(),
            brand: food.brand.clone(),
            product: food.product.clone(),
            kcal_per_100g: food.kcal_per_100g(),
        }
    }
}

/// Response for search_foods
#[derive(Debug, Serialize)]
pub struct SearchFoodsResponse {
    pub items: Vec<FoodSummary>,
    pub total: usize,
}

/// Response for list_foods
#[derive(Debug, Serialize)]
pub struct ListFoodsResponse {
    pub items: Vec<FoodSummary>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Response for lookup_food_by_barcode
#[derive(Debug, Serialize)]
pub struct BarcodeLookupResponse {
    pub found: bool,
    pub ean: String,
    pub format: BarcodeFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub food: Option<FoodDetail>,
}

/// Response for delete_food
#[derive(Debug, Serialize)]
pub struct DeleteFoodResponse {
    pub success: bool,
    pub deleted_id: i64,
    pub detached_intakes: i64,
}

/// Submission summary
#[derive(Debug, Serialize)]
pub struct SubmissionDetail {
    pub id: i64,
    pub ean: Option<String>,
    pub brand: String,
    pub product: String,
    pub kcal_per_100g: f64,
    pub status: SubmissionStatus,
    pub food_id: Option<i64>,
    pub submitted_at: String,
    pub reviewed_at: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl From<FoodSubmission> for SubmissionDetail {
    fn from(s: FoodSubmission) -> Self {
        Self {
            kcal_per_100g: s.composition.kcal_per_100g(),
            warnings: composition_warnings(&s.composition),
            id: s.id,
            ean: s.ean,
            brand: s.brand,
            product: s.product,
            status: s.status,
            food_id: s.food_id,
            submitted_at: s.submitted_at,
            reviewed_at: s.reviewed_at,
        }
    }
}

/// Response for list_food_submissions
#[derive(Debug, Serialize)]
pub struct ListSubmissionsResponse {
    pub submissions: Vec<SubmissionDetail>,
    pub count: usize,
}

/// Response for review_food_submission
#[derive(Debug, Serialize)]
pub struct ReviewSubmissionResponse {
    pub submission: SubmissionDetail,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub food: Option<FoodDetail>,
}

fn composition_warnings(composition: &Composition) -> Vec<String> {
    let mut warnings = Vec::new();
    if composition.exceeds_total() {
        warnings.push(format!(
            "Label fractions sum to {:.1} g per 100 g; carbohydrate is negative ({:.1} g)",
            composition.labelled_total(),
            composition.carbs()
        ));
    }
    warnings
}

/// Validate user input and canonicalize the barcode
fn prepare(input: FoodInput) -> Result<FoodCreate, String> {
    let product = input.product.trim();
    if product.is_empty() {
        return Err("Product name cannot be empty".to_string());
    }
    input.composition.validate().map_err(|e| e.to_string())?;

    let ean = match input.ean.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Some(normalize_ean(raw).map_err(|e| e.to_string())?.code),
        None => None,
    };

    Ok(FoodCreate {
        ean,
        brand: input.brand.trim().to_string(),
        product: product.to_string(),
        composition: input.composition,
        additives: input.additives,
        image_url: input.image_url,
    })
}

/// Add a food directly to the database
pub fn add_food(db: &Database, input: FoodInput) -> Result<FoodDetail, String> {
    let data = prepare(input)?;
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    if let Some(ref ean) = data.ean {
        let existing = Food::get_by_ean(&conn, ean).map_err(|e| format!("Failed to check barcode: {}", e))?;
        if let Some(existing) = existing {
            return Err(format!("Barcode {} already belongs to food {} ({})", ean, existing.id, existing.display_name()));
        }
    }

    let food = Food::create(&conn, &data).map_err(|e| format!("Failed to create food: {}", e))?;
    info!(food_id = food.id, product = %food.product, "Food added");
    if food.composition.exceeds_total() {
        warn!(food_id = food.id, "Food label sums above 100 g per 100 g");
    }

    Ok(FoodDetail::from_food(food, None))
}

/// Get a food with derived values and usage
pub fn get_food(db: &Database, id: i64) -> Result<Option<FoodDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let food = Food::get_by_id(&conn, id).map_err(|e| format!("Failed to get food: {}", e))?;
    match food {
        Some(food) => {
            let count = Food::get_intake_count(&conn, id).map_err(|e| format!("Failed to count intakes: {}", e))?;
            Ok(Some(FoodDetail::from_food(food, Some(count))))
        }
        None => Ok(None),
    }
}

/// Look up a food by a scanned barcode
pub fn lookup_food_by_barcode(db: &Database, raw: &str) -> Result<BarcodeLookupResponse, String> {
    let ean = normalize_ean(raw).map_err(|e| format!("Invalid barcode: {}", e))?;
    debug!(ean = %ean.code, format = ean.format.as_str(), "Barcode normalized");
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let food = Food::get_by_ean(&conn, &ean.code).map_err(|e| format!("Failed to look up barcode: {}", e))?;

    Ok(BarcodeLookupResponse {
        found: food.is_some(),
        ean: ean.code,
        format: ean.format,
        food: food.map(|f| FoodDetail::from_food(f, None)),
    })
}

/// Search foods by product or brand
pub fn search_foods(db: &Database, query: &str, limit: i64) -> Result<SearchFoodsResponse, String> {
    let limit = limit.clamp(1, 100);
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let foods = Food::search(&conn, query, limit).map_err(|e| format!("Search failed: {}", e))?;

    let items: Vec<FoodSummary> = foods.iter().map(FoodSummary::from).collect();
    let total = items.len();
    Ok(SearchFoodsResponse { items, total })
}

/// List foods with pagination
pub fn list_foods(db: &Database, limit: i64, offset: i64) -> Result<ListFoodsResponse, String> {
    let limit = limit.clamp(1, 200);
    let offset = offset.max(0);
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let foods = Food::list(&conn, limit, offset).map_err(|e| format!("Failed to list foods: {}", e))?;
    let total = Food::count(&conn).map_err(|e| format!("Failed to count foods: {}", e))?;

    Ok(ListFoodsResponse {
        items: foods.iter().map(FoodSummary::from).collect(),
        total,
        limit,
        offset,
    })
}

/// Delete a food; logged intakes are kept as unlinked entries
pub fn delete_food(db: &Database, id: i64) -> Result<DeleteFoodResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let detached = Food::get_intake_count(&conn, id).map_err(|e| format!("Failed to count intakes: {}", e))?;
    let deleted = Food::delete(&conn, id).map_err(|e| format!("Failed to delete food: {}", e))?;
    if !deleted {
        return Err(format!("Food {} not found", id));
    }
    Ok(DeleteFoodResponse {
        success: true,
        deleted_id: id,
        detached_intakes: detached,
    })
}

/// Submit a food proposal for review
pub fn submit_food(db: &Database, input: FoodInput) -> Result<SubmissionDetail, String> {
    let data = prepare(input)?;
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let submission = FoodSubmission::create(&conn, &data)
        .map_err(|e| format!("Failed to submit food: {}", e))?;
    info!(submission_id = submission.id, product = %submission.product, "Food submitted for review");
    Ok(submission.into())
}

/// List submissions, optionally by status
pub fn list_food_submissions(db: &Database, status: Option<&str>) -> Result<ListSubmissionsResponse, String> {
    let status = match status {
        Some(s) => Some(SubmissionStatus::from_str(s).ok_or_else(|| {
            format!("Invalid status '{}'. Use pending, approved or rejected", s)
        })?),
        None => None,
    };

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let submissions = FoodSubmission::list(&conn, status)
        .map_err(|e| format!("Failed to list submissions: {}", e))?;

    let submissions: Vec<SubmissionDetail> = submissions.into_iter().map(Into::into).collect();
    let count = submissions.len();
    Ok(ListSubmissionsResponse { submissions, count })
}

/// Approve or reject a pending submission
pub fn review_food_submission(db: &Database, id: i64, approve: bool) -> Result<ReviewSubmissionResponse, String> {
    if approve {
        let (submission, food) = db
            .with_conn_mut(|conn| FoodSubmission::approve(conn, id))
            .map_err(|e| format!("Failed to approve submission: {}", e))?;
        info!(submission_id = id, food_id = food.id, "Food submission approved");
        Ok(ReviewSubmissionResponse {
            submission: submission.into(),
            food: Some(FoodDetail::from_food(food, None)),
        })
    } else {
        let submission = db
            .with_conn(|conn| FoodSubmission::reject(conn, id))
            .map_err(|e| format!("Failed to reject submission: {}", e))?;
        info!(submission_id = id, "Food submission rejected");
        Ok(ReviewSubmissionResponse {
            submission: submission.into(),
            food: None,
        })
    }
}
