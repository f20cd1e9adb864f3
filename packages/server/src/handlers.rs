//! HTTP handler functions for the collision map API.

use actix_web::{HttpResponse, web};
use collision_map_collision_models::{Borough, FilterConfig};
use collision_map_hotspots::{derive_hotspots, summary};
use collision_map_hotspots_models::SEVERITY_TIERS;
use collision_map_records::stats::compute_stats;
use collision_map_server_models::{
    ApiCrash, ApiCrashDetail, ApiCrashPage, ApiError, ApiHealth, ApiHotspot, ApiHotspotDetail,
    ApiLocationResults,
    DEFAULT_PAGE_LIMIT, DEFAULT_SEARCH_RADIUS_METERS, DEFAULT_TOP_LIMIT, HotspotQueryParams,
    LocationSearchParams, PageParams, TopQueryParams,
};

use crate::AppState;

/// `GET /api/health`
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        record_count: state.store.len() as u64,
        hotspot_count: state.summaries.len() as u64,
    })
}

/// `GET /api/boroughs`
///
/// Returns the borough names accepted by the `borough` filter.
pub async fn boroughs() -> HttpResponse {
    let names: Vec<String> = Borough::all().iter().map(ToString::to_string).collect();
    HttpResponse::Ok().json(names)
}

/// `GET /api/legend`
///
/// Returns the severity tier table, most severe first.
pub async fn legend() -> HttpResponse {
    HttpResponse::Ok().json(SEVERITY_TIERS)
}

/// `GET /api/crashes`
///
/// Lists records matching the filter, paged with `limit` and `offset`.
pub async fn crashes(
    state: web::Data<AppState>,
    filter: web::Query<FilterConfig>,
    page: web::Query<PageParams>,
) -> HttpResponse {
    let matching = state.store.filtered(&filter);
    let limit = page.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    let offset = page.offset.unwrap_or(0);

    let crashes: Vec<ApiCrash> = matching
        .iter()
        .skip(offset)
        .take(limit)
        .map(|record| ApiCrash::from(*record))
        .collect();

    HttpResponse::Ok().json(ApiCrashPage {
        total: matching.len() as u64,
        limit,
        offset,
        crashes,
    })
}

/// `GET /api/crashes/{id}`
pub async fn crash_detail(state: web::Data<AppState>, path: web::Path<i64>) -> HttpResponse {
    let id = path.into_inner();
    state.store.get(id).map_or_else(
        || HttpResponse::NotFound().json(ApiError::new("Crash not found")),
        |record| HttpResponse::Ok().json(ApiCrashDetail::from(record)),
    )
}

/// `GET /api/crashes/stats`
///
/// Totals and per-borough breakdown over the filtered records.
pub async fn crash_stats(
    state: web::Data<AppState>,
    filter: web::Query<FilterConfig>,
) -> HttpResponse {
    let matching = state.store.filtered(&filter);
    HttpResponse::Ok().json(compute_stats(&matching))
}

/// `GET /api/crashes/search`
///
/// Records within `radius` meters (default 1000) of `lat`/`lon`.
pub async fn search_by_location(
    state: web::Data<AppState>,
    params: web::Query<LocationSearchParams>,
) -> HttpResponse {
    let (Some(lat), Some(lon)) = (params.lat.as_deref(), params.lon.as_deref()) else {
        return HttpResponse::BadRequest()
            .json(ApiError::new("Latitude and longitude are required"));
    };

    let parsed = (
        lat.trim().parse::<f64>(),
        lon.trim().parse::<f64>(),
        params
            .radius
            .as_deref()
            .map_or(Ok(DEFAULT_SEARCH_RADIUS_METERS), |r| r.trim().parse::<f64>()),
    );
    let (Ok(lat), Ok(lon), Ok(radius)) = parsed else {
        return HttpResponse::BadRequest().json(ApiError::new("Invalid coordinate values"));
    };

    match state.store.search_by_location(lat, lon, radius) {
        Ok(records) => HttpResponse::Ok().json(ApiLocationResults {
            count: records.len() as u64,
            results: records.into_iter().map(ApiCrash::from).collect(),
        }),
        Err(e) => {
            log::debug!("Rejected location search: {e}");
            HttpResponse::BadRequest().json(ApiError::new(e.to_string()))
        }
    }
}

/// `GET /api/hotspots`
///
/// Precomputed hotspots meeting the optional minimums, most severe first.
pub async fn hotspots(
    state: web::Data<AppState>,
    params: web::Query<HotspotQueryParams>,
) -> HttpResponse {
    let hotspots: Vec<ApiHotspot> =
        summary::filter_summaries(&state.summaries, params.min_crashes, params.min_severity)
            .into_iter()
            .map(ApiHotspot::from)
            .collect();
    HttpResponse::Ok().json(hotspots)
}

/// `GET /api/hotspots/top`
pub async fn top_hotspots(
    state: web::Data<AppState>,
    params: web::Query<TopQueryParams>,
) -> HttpResponse {
    let limit = params.limit.unwrap_or(DEFAULT_TOP_LIMIT);
    let hotspots: Vec<ApiHotspot> = summary::top_severity(&state.summaries, limit)
        .into_iter()
        .map(ApiHotspot::from)
        .collect();
    HttpResponse::Ok().json(hotspots)
}

/// `GET /api/hotspots/{id}`
pub async fn hotspot_detail(state: web::Data<AppState>, path: web::Path<u32>) -> HttpResponse {
    let id = path.into_inner();
    summary::find(&state.summaries, id).map_or_else(
        || HttpResponse::NotFound().json(ApiError::new("Hotspot not found")),
        |hotspot| HttpResponse::Ok().json(ApiHotspotDetail::from(hotspot)),
    )
}

/// `GET /api/hotspots/derived`
///
/// Runs the full pipeline for the filter: totals, displayable hotspots,
/// and the analyzed record count.
pub async fn derived_hotspots(
    state: web::Data<AppState>,
    filter: web::Query<FilterConfig>,
) -> HttpResponse {
    HttpResponse::Ok().json(derive_hotspots(state.store.records(), &filter))
}
