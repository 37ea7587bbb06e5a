//! API Routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::assignment_engine::RegistrationOutcome;
use crate::camp_registry::{CreateCampRequest, UpdateCampRequest};
use crate::error::Error;
use crate::geo::{self, search, Coordinate};
use crate::models::ApiResponse;
use crate::refugee_registry::{CreateRefugeeRequest, UpdateRefugeeRequest};
use crate::state::AppState;

/// Create API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(super::health_check))
        // Camps
        .route("/api/camps", get(list_camps))
        .route("/api/camps", post(create_camp))
        .route("/api/camps/available", get(list_available_camps))
        .route("/api/camps/:id", get(get_camp))
        .route("/api/camps/:id", put(update_camp))
        .route("/api/camps/:id", delete(delete_camp))
        .route("/api/camps/:id/connect/:target_id", post(connect_camps))
        // Refugees
        .route("/api/refugees", get(list_refugees))
        .route("/api/refugees", post(create_refugee))
        .route("/api/refugees/:id", get(get_refugee))
        .route("/api/refugees/:id", put(update_refugee))
        .route("/api/refugees/:id", delete(delete_refugee))
        // Assignment
        .route("/api/assignment/geocode", post(geocode_address))
        .route("/api/assignment/reverse-geocode", post(reverse_geocode))
        .route("/api/assignment/calculate-distance", post(calculate_distance))
        .route("/api/assignment/nearest-camps", post(nearest_camps))
        .route("/api/assignment/assign-refugee", post(assign_refugee))
        .route("/api/assignment/release-refugee", post(release_refugee))
        .route("/api/assignment/register-and-assign", post(register_and_assign))
        .with_state(state)
}

// ============================================================================
// Camps
// ============================================================================

async fn list_camps(State(state): State<AppState>) -> crate::Result<impl IntoResponse> {
    let camps = state.camps.list().await?;
    Ok(Json(ApiResponse::success(camps)))
}

async fn create_camp(
    State(state): State<AppState>,
    Json(req): Json<CreateCampRequest>,
) -> crate::Result<impl IntoResponse> {
    let camp = state.camps.create(req).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(camp))))
}

async fn list_available_camps(State(state): State<AppState>) -> crate::Result<impl IntoResponse> {
    let camps = state.camps.list_available().await?;
    Ok(Json(ApiResponse::success(camps)))
}

async fn get_camp(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> crate::Result<impl IntoResponse> {
    let camp = state.camps.get(id).await?;
    Ok(Json(ApiResponse::success(camp)))
}

async fn update_camp(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCampRequest>,
) -> crate::Result<impl IntoResponse> {
    let camp = state.camps.update(id, req).await?;
    Ok(Json(ApiResponse::success(camp)))
}

async fn delete_camp(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> crate::Result<impl IntoResponse> {
    state.camps.delete(id).await?;
    Ok(Json(ApiResponse::success(json!({}))))
}

async fn connect_camps(
    State(state): State<AppState>,
    Path((id, target_id)): Path<(Uuid, Uuid)>,
) -> crate::Result<impl IntoResponse> {
    let (camp, target) = state.camp_graph.connect(id, target_id).await?;
    Ok(Json(ApiResponse::success(json!({
        "camp": camp,
        "target": target,
    }))))
}

// ============================================================================
// Refugees
// ============================================================================

/// Refugee registration with an explicit coordinate
#[derive(Debug, Deserialize)]
struct RegisterRefugeeBody {
    #[serde(flatten)]
    refugee: CreateRefugeeRequest,
    latitude: f64,
    longitude: f64,
}

async fn list_refugees(State(state): State<AppState>) -> crate::Result<impl IntoResponse> {
    let refugees = state.refugees.list().await?;
    Ok(Json(ApiResponse::success(refugees)))
}

async fn create_refugee(
    State(state): State<AppState>,
    Json(body): Json<RegisterRefugeeBody>,
) -> crate::Result<impl IntoResponse> {
    let coordinate = Coordinate::new(body.latitude, body.longitude)?;
    let refugee = state.refugees.create(body.refugee, coordinate).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(refugee))))
}

async fn get_refugee(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> crate::Result<impl IntoResponse> {
    let refugee = state.refugees.get(id).await?;
    Ok(Json(ApiResponse::success(refugee)))
}

async fn update_refugee(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateRefugeeRequest>,
) -> crate::Result<impl IntoResponse> {
    let refugee = state.refugees.update(id, req).await?;
    Ok(Json(ApiResponse::success(refugee)))
}

/// Deletion goes through the engine's discharge flow so reserved camp
/// capacity is returned before the record disappears
async fn delete_refugee(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> crate::Result<impl IntoResponse> {
    state.assignment.discharge(id).await?;
    Ok(Json(ApiResponse::success(json!({}))))
}

// ============================================================================
// Assignment
// ============================================================================

#[derive(Debug, Deserialize)]
struct GeocodeBody {
    address: String,
}

#[derive(Debug, Deserialize)]
struct ReverseGeocodeBody {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct DistanceBody {
    lat1: f64,
    lon1: f64,
    lat2: f64,
    lon2: f64,
}

#[derive(Debug, Deserialize)]
struct NearestCampsBody {
    latitude: Option<f64>,
    longitude: Option<f64>,
    address: Option<String>,
    #[serde(default = "default_nearest_count")]
    count: usize,
}

fn default_nearest_count() -> usize {
    5
}

#[derive(Debug, Deserialize)]
struct AssignRefugeeBody {
    refugee_id: Uuid,
}

async fn geocode_address(
    State(state): State<AppState>,
    Json(body): Json<GeocodeBody>,
) -> crate::Result<impl IntoResponse> {
    let location = state.geocoder.resolve(&body.address).await?;
    Ok(Json(ApiResponse::success(location)))
}

async fn reverse_geocode(
    State(state): State<AppState>,
    Json(body): Json<ReverseGeocodeBody>,
) -> crate::Result<impl IntoResponse> {
    let coordinate = Coordinate::new(body.latitude, body.longitude)?;
    let display_name = state.geocoder.reverse(coordinate).await?;
    Ok(Json(ApiResponse::success(json!({
        "display_name": display_name,
    }))))
}

async fn calculate_distance(
    Json(body): Json<DistanceBody>,
) -> crate::Result<impl IntoResponse> {
    let a = Coordinate::new(body.lat1, body.lon1)?;
    let b = Coordinate::new(body.lat2, body.lon2)?;
    let distance_km = (geo::distance_km(a, b) * 100.0).round() / 100.0;
    Ok(Json(ApiResponse::success(json!({
        "distance_km": distance_km,
        "unit": "kilometers",
    }))))
}

/// Rank open camps by distance from a point (or a geocoded address)
async fn nearest_camps(
    State(state): State<AppState>,
    Json(body): Json<NearestCampsBody>,
) -> crate::Result<impl IntoResponse> {
    let point = match (body.latitude, body.longitude) {
        (Some(lat), Some(lon)) => Coordinate::new(lat, lon)?,
        _ => match &body.address {
            Some(address) => state.geocoder.resolve(address).await?.coordinate,
            None => {
                return Err(Error::Validation(
                    "provide either coordinates or an address".to_string(),
                ));
            }
        },
    };

    let camps = state.camps.list_available().await?;
    if camps.is_empty() {
        return Err(Error::NoCampsAvailable);
    }

    let ranked = search::top_n(point, camps, body.count);
    Ok(Json(ApiResponse::success(json!({
        "search_location": point,
        "count": ranked.len(),
        "camps": ranked,
    }))))
}

async fn assign_refugee(
    State(state): State<AppState>,
    Json(body): Json<AssignRefugeeBody>,
) -> crate::Result<impl IntoResponse> {
    let result = state.assignment.assign(body.refugee_id).await?;
    Ok(Json(ApiResponse::success(result)))
}

/// Manual un-assignment: return the camp capacity, keep the record pending
async fn release_refugee(
    State(state): State<AppState>,
    Json(body): Json<AssignRefugeeBody>,
) -> crate::Result<impl IntoResponse> {
    let refugee = state.assignment.release(body.refugee_id).await?;
    Ok(Json(ApiResponse::success(refugee)))
}

/// Geocode the address, register the refugee, then try to place them
async fn register_and_assign(
    State(state): State<AppState>,
    Json(mut req): Json<CreateRefugeeRequest>,
) -> crate::Result<impl IntoResponse> {
    let location = state.geocoder.resolve(&req.address).await?;
    if let Some(display_name) = &location.display_name {
        req.address = display_name.clone();
    }

    let outcome = state
        .assignment
        .register_and_assign(req, location.coordinate)
        .await?;

    let body = match outcome {
        RegistrationOutcome::Assigned(result) => json!({
            "refugee": result.refugee,
            "camp": result.camp,
            "distance_km": result.distance_km,
        }),
        RegistrationOutcome::Pending(refugee) => json!({
            "refugee": refugee,
            "camp": null,
        }),
    };
    Ok((StatusCode::CREATED, Json(ApiResponse::success(body))))
}
