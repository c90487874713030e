// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Structured data extraction from Avito pages.
//!
//! Avito pages carry their data as JSON assigned to
//! `window.__staticRouterHydrationData` in an inline script. Extraction
//! is a regex capture plus a `serde_json` parse; the interesting payload
//! sits under `loaderData`, whose entry key varies by page type.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::models::listing::listing_type;
use crate::models::{House, Listing};

fn hydration_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)window\.__staticRouterHydrationData\s*=\s*(\{.+?\})\s*;\s*</script>")
            .expect("hydration regex")
    })
}

fn title_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // "1-к. квартира, 37,5 м², 8/10 эт."
    RE.get_or_init(|| Regex::new(r"(\d+)-к.*?(\d+[.,]?\d*)\s*м.*?(\d+)/(\d+)").expect("title regex"))
}

/// Extract the hydration JSON object from page HTML.
pub fn extract_hydration_data(html: &str) -> Option<Value> {
    let captures = hydration_re().captures(html)?;
    match serde_json::from_str(&captures[1]) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to parse hydration JSON");
            None
        }
    }
}

/// Locate the page's loader data inside the hydration structure.
fn loader_data(hydration: &Value) -> Option<&Value> {
    let loader = hydration.get("loaderData")?.as_object()?;
    for key in ["catalog-or-main-or-item", "root"] {
        if let Some(data) = loader.get(key) {
            return Some(data);
        }
    }
    loader.values().next()
}

// ─── Search page ─────────────────────────────────────────────────

/// Listing summary extracted from a search results page.
#[derive(Debug, Clone)]
pub struct SearchItem {
    pub item_id: i64,
    pub title: String,
    pub price: Option<i32>,
    pub listing_type: String,
    pub address: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub rooms: Option<i32>,
    pub area: Option<f32>,
    pub floor: Option<i32>,
    pub total_floors: Option<i32>,
    pub url: Option<String>,
}

impl SearchItem {
    /// Build the storable listing row. Items from the rent category that
    /// could not be classified from their price postfix default to
    /// long-term rent.
    pub fn into_listing(mut self, category: &str) -> Listing {
        if category == "rent" && self.listing_type == listing_type::SALE {
            self.listing_type = listing_type::RENT_LONG.to_string();
        }

        Listing {
            item_id: self.item_id,
            address_id: None,
            title: Some(self.title),
            price: self.price,
            listing_type: Some(self.listing_type),
            address: self.address,
            lat: self.lat,
            lng: self.lng,
            rooms: self.rooms,
            area: self.area,
            floor: self.floor,
            total_floors: self.total_floors,
            url: self.url,
            raw_data: None,
            first_seen_at: None,
            last_seen_at: None,
        }
    }
}

/// Parse a search results page into listing summaries.
///
/// `base_url` is prefixed to each item's `urlPath` to form absolute
/// listing URLs.
pub fn parse_search_page(html: &str, base_url: &str) -> Vec<SearchItem> {
    let Some(hydration) = extract_hydration_data(html) else {
        tracing::warn!("No hydration data found on search page");
        return Vec::new();
    };

    let Some(loader) = loader_data(&hydration) else {
        return Vec::new();
    };

    let raw_items = loader
        .pointer("/searchResult/items")
        .and_then(Value::as_array)
        .filter(|items| !items.is_empty())
        .or_else(|| loader.get("items").and_then(Value::as_array));

    let Some(raw_items) = raw_items else {
        return Vec::new();
    };

    raw_items
        .iter()
        .filter_map(|item| parse_search_item(item, base_url))
        .collect()
}

fn parse_search_item(item: &Value, base_url: &str) -> Option<SearchItem> {
    let item_id = item.get("id").and_then(Value::as_i64)?;

    // Price and its postfix ("₽ в месяц" → "/мес" style markers)
    let price_detail = item.get("priceDetailed").or_else(|| item.get("price"));
    let (price, price_text) = match price_detail {
        Some(Value::Object(detail)) => (
            detail.get("value").and_then(Value::as_i64),
            detail
                .get("postfix")
                .and_then(Value::as_str)
                .unwrap_or_default(),
        ),
        Some(Value::Number(n)) => (n.as_i64(), ""),
        _ => (None, ""),
    };

    let listing_type = classify_listing_type(price_text);

    // Coordinates
    let geo = item.get("geo");
    let coords = geo
        .and_then(|g| g.get("coords").or_else(|| g.get("coordinates")))
        .and_then(Value::as_object);
    let lat = coords.and_then(|c| c.get("lat")).and_then(Value::as_f64);
    let lng = coords
        .and_then(|c| c.get("lng").or_else(|| c.get("lon")))
        .and_then(Value::as_f64);

    // Address: first geo reference with content, then flat fields
    let address = geo
        .and_then(|g| g.get("geoReferences"))
        .and_then(Value::as_array)
        .and_then(|refs| {
            refs.iter()
                .filter_map(|r| r.get("content").and_then(Value::as_str))
                .next()
        })
        .or_else(|| item.get("address").and_then(Value::as_str))
        .or_else(|| item.pointer("/location/name").and_then(Value::as_str))
        .map(str::to_string);

    let title = item
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let (rooms, area, floor, total_floors) = parse_title(&title);

    let url = item
        .get("urlPath")
        .and_then(Value::as_str)
        .filter(|p| !p.is_empty())
        .map(|p| format!("{}{}", base_url, p));

    Some(SearchItem {
        item_id,
        title,
        price: price.and_then(|p| i32::try_from(p).ok()),
        listing_type: listing_type.to_string(),
        address,
        lat,
        lng,
        rooms,
        area,
        floor,
        total_floors,
        url,
    })
}

/// Classify a listing from its price postfix.
fn classify_listing_type(price_text: &str) -> &'static str {
    if price_text.contains("/мес") {
        listing_type::RENT_LONG
    } else if price_text.contains("/сут") {
        listing_type::RENT_SHORT
    } else {
        listing_type::SALE
    }
}

/// Parse rooms/area/floors out of a title like
/// "1-к. квартира, 37,5 м², 8/10 эт." (decimal comma accepted).
fn parse_title(title: &str) -> (Option<i32>, Option<f32>, Option<i32>, Option<i32>) {
    let Some(captures) = title_re().captures(title) else {
        return (None, None, None, None);
    };

    let rooms = captures[1].parse().ok();
    let area = captures[2].replace(',', ".").parse().ok();
    let floor = captures[3].parse().ok();
    let total_floors = captures[4].parse().ok();
    (rooms, area, floor, total_floors)
}

// ─── Listing page ────────────────────────────────────────────────

/// Details extracted from a single listing page, primarily the link to
/// the house catalog page.
#[derive(Debug, Clone)]
pub struct ListingDetail {
    pub address_id: Option<i32>,
    pub slug: Option<String>,
    pub address: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    /// House parameter block shown on the listing (label → value), with
    /// `_rating` / `_address_id` from the rating preview.
    pub house_params: Map<String, Value>,
    pub item_id: Option<i64>,
    pub title: Option<String>,
    pub price: Option<i64>,
}

/// Parse a listing page, extracting the house catalog link and params.
pub fn parse_listing_page(html: &str) -> Option<ListingDetail> {
    let hydration = extract_hydration_data(html)?;
    let loader = loader_data(&hydration)?;
    let item = loader.pointer("/buyerItem/item")?;
    if item.as_object().map_or(true, |obj| obj.is_empty()) {
        return None;
    }

    // "/catalog/houses/yoshkar-ola/{slug}/{address_id}"
    let (address_id, slug) = item
        .get("houseCatalogPageUrl")
        .and_then(Value::as_str)
        .map(parse_house_catalog_url)
        .unwrap_or((None, None));

    let coords = item.pointer("/geo/coords").and_then(Value::as_object);
    let lat = coords.and_then(|c| c.get("lat")).and_then(Value::as_f64);
    let lng = coords.and_then(|c| c.get("lng")).and_then(Value::as_f64);

    let mut house_params = Map::new();
    if let Some(hp_data) = item.pointer("/houseParams/data") {
        if let Some(items) = hp_data.get("items").and_then(Value::as_array) {
            for hp_item in items {
                let title = hp_item.get("title").and_then(Value::as_str).unwrap_or("");
                let description = hp_item
                    .get("description")
                    .and_then(Value::as_str)
                    .unwrap_or("");
                if !title.is_empty() && !description.is_empty() {
                    house_params.insert(title.to_string(), Value::String(description.to_string()));
                }
            }
        }
        if let Some(rating_preview) = hp_data.get("ratingPreview").and_then(Value::as_object) {
            house_params.insert(
                "_rating".to_string(),
                rating_preview.get("scoreValue").cloned().unwrap_or(Value::Null),
            );
            house_params.insert(
                "_address_id".to_string(),
                rating_preview.get("addressId").cloned().unwrap_or(Value::Null),
            );
        }
    }

    Some(ListingDetail {
        address_id,
        slug,
        address: item.get("address").and_then(Value::as_str).map(str::to_string),
        lat,
        lng,
        house_params,
        item_id: item.get("id").and_then(Value::as_i64),
        title: item.get("title").and_then(Value::as_str).map(str::to_string),
        price: item.get("price").and_then(Value::as_i64),
    })
}

/// Split `(address_id, slug)` off the trailing segments of a house
/// catalog URL.
fn parse_house_catalog_url(url: &str) -> (Option<i32>, Option<String>) {
    let parts: Vec<&str> = url.trim_end_matches('/').split('/').collect();
    if parts.len() < 2 {
        return (None, None);
    }
    match parts[parts.len() - 1].parse::<i32>() {
        Ok(address_id) => (Some(address_id), Some(parts[parts.len() - 2].to_string())),
        Err(_) => (None, None),
    }
}

// ─── House catalog page ──────────────────────────────────────────

/// Building characteristics extracted from a house catalog page.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HouseDetails {
    pub build_year: Option<String>,
    pub floors: Option<String>,
    pub heating: Option<String>,
    pub hot_water: Option<String>,
    pub cold_water: Option<String>,
    pub electricity: Option<String>,
    pub gas: Option<String>,
    pub sewerage: Option<String>,
    pub ventilation: Option<String>,
    pub passenger_lift: Option<String>,
    pub freight_lift: Option<String>,
    pub house_type: Option<String>,
    pub floor_type: Option<String>,
    pub foundation: Option<String>,
    pub energy_class: Option<String>,
    pub playground: Option<String>,
    pub sports_ground: Option<String>,
    pub parking: Option<String>,
    pub rating: Option<f32>,
    pub review_count: Option<i32>,
    pub price_min: Option<i32>,
    pub price_max: Option<i32>,
    pub active_listings: Option<i32>,
}

impl HouseDetails {
    /// Assign a labelled value to its field. Returns false for labels
    /// that are not tracked.
    fn set_field(&mut self, label: &str, value: String) -> bool {
        let slot = match label {
            "Год постройки" => &mut self.build_year,
            "Этажей" => &mut self.floors,
            "Отопление" => &mut self.heating,
            "Горячее водоснабжение" => &mut self.hot_water,
            "Холодное водоснабжение" => &mut self.cold_water,
            "Электроснабжение" => &mut self.electricity,
            "Газоснабжение" => &mut self.gas,
            "Канализация" => &mut self.sewerage,
            "Система вентиляции" => &mut self.ventilation,
            "Пассажирский лифт" => &mut self.passenger_lift,
            "Грузовой лифт" => &mut self.freight_lift,
            "Тип дома" => &mut self.house_type,
            "Перекрытия" => &mut self.floor_type,
            "Фундамент" => &mut self.foundation,
            "Класс энергоэффективности" => &mut self.energy_class,
            "Детская площадка" => &mut self.playground,
            "Спортивная площадка" => &mut self.sports_ground,
            "Парковка" => &mut self.parking,
            _ => return false,
        };
        *slot = Some(value);
        true
    }

    fn has_characteristics(&self) -> bool {
        self.build_year.is_some()
            || self.floors.is_some()
            || self.heating.is_some()
            || self.hot_water.is_some()
            || self.cold_water.is_some()
            || self.electricity.is_some()
            || self.gas.is_some()
            || self.sewerage.is_some()
            || self.ventilation.is_some()
            || self.passenger_lift.is_some()
            || self.freight_lift.is_some()
            || self.house_type.is_some()
            || self.floor_type.is_some()
            || self.foundation.is_some()
            || self.energy_class.is_some()
            || self.playground.is_some()
            || self.sports_ground.is_some()
            || self.parking.is_some()
    }

    fn is_empty(&self) -> bool {
        !self.has_characteristics()
            && self.rating.is_none()
            && self.review_count.is_none()
            && self.price_min.is_none()
            && self.price_max.is_none()
            && self.active_listings.is_none()
    }

    /// Build the storable house row, keeping the extracted payload in
    /// `raw_data` for reprocessing.
    pub fn into_house(self, address_id: i32, slug: Option<String>) -> House {
        let raw_data = serde_json::to_value(&self).ok();
        House {
            address_id,
            slug,
            address: None,
            lat: None,
            lng: None,
            build_year: self.build_year,
            floors: self.floors,
            heating: self.heating,
            hot_water: self.hot_water,
            cold_water: self.cold_water,
            electricity: self.electricity,
            gas: self.gas,
            sewerage: self.sewerage,
            ventilation: self.ventilation,
            passenger_lift: self.passenger_lift,
            freight_lift: self.freight_lift,
            house_type: self.house_type,
            floor_type: self.floor_type,
            foundation: self.foundation,
            energy_class: self.energy_class,
            playground: self.playground,
            sports_ground: self.sports_ground,
            parking: self.parking,
            rating: self.rating,
            review_count: self.review_count,
            price_min: self.price_min,
            price_max: self.price_max,
            active_listings: self.active_listings,
            raw_data,
            created_at: None,
            updated_at: None,
        }
    }
}

/// Parse a house catalog page for full building characteristics.
pub fn parse_house_page(html: &str) -> Option<HouseDetails> {
    let Some(hydration) = extract_hydration_data(html) else {
        tracing::warn!("No hydration data on house page");
        return None;
    };
    let loader = loader_data(&hydration)?;

    let mut details = HouseDetails::default();

    // Primary location: houseInfo items and sections
    let house_info = loader
        .get("houseInfo")
        .or_else(|| loader.get("house"))
        .or_else(|| loader.get("aboutHouse"));
    if let Some(info) = house_info.filter(|v| v.is_object()) {
        extract_fields_from_items(info.get("items"), &mut details);
        extract_fields_from_sections(info.get("sections"), &mut details);
    }

    // Fallback: the about-house block layout
    if !details.has_characteristics() {
        let about_block = loader
            .get("aboutHouseBlock")
            .or_else(|| loader.get("aboutHouse"));
        if let Some(block) = about_block.filter(|v| v.is_object()) {
            extract_fields_from_sections(block.get("sections"), &mut details);
        }
    }

    // Last resort: bounded deep search over the whole loader payload
    if !details.has_characteristics() {
        deep_search_fields(loader, 0, &mut details);
    }

    if let Some(rating) = loader
        .get("rating")
        .or_else(|| loader.get("houseRating"))
        .and_then(Value::as_object)
    {
        details.rating = rating
            .get("value")
            .or_else(|| rating.get("score"))
            .and_then(Value::as_f64)
            .map(|v| v as f32);
        details.review_count = rating
            .get("count")
            .or_else(|| rating.get("reviewCount"))
            .and_then(Value::as_i64)
            .and_then(|v| i32::try_from(v).ok());
    }

    if let Some(price_range) = loader
        .get("priceRange")
        .or_else(|| loader.get("priceSummary"))
        .and_then(Value::as_object)
    {
        details.price_min = price_range
            .get("min")
            .or_else(|| price_range.get("minPrice"))
            .and_then(Value::as_i64)
            .and_then(|v| i32::try_from(v).ok());
        details.price_max = price_range
            .get("max")
            .or_else(|| price_range.get("maxPrice"))
            .and_then(Value::as_i64)
            .and_then(|v| i32::try_from(v).ok());
    }

    match loader.get("listings").or_else(|| loader.get("activeListings")) {
        Some(Value::Object(listings)) => {
            details.active_listings = listings
                .get("total")
                .or_else(|| listings.get("count"))
                .and_then(Value::as_i64)
                .and_then(|v| i32::try_from(v).ok());
        }
        Some(Value::Array(listings)) => {
            details.active_listings = i32::try_from(listings.len()).ok();
        }
        _ => {}
    }

    if details.is_empty() {
        None
    } else {
        Some(details)
    }
}

/// Labelled value from a characteristics item: title/name/label paired
/// with value/description/text.
fn labelled_value(item: &Value) -> Option<(&str, String)> {
    let label = item
        .get("title")
        .or_else(|| item.get("name"))
        .or_else(|| item.get("label"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())?;

    let value = item
        .get("value")
        .or_else(|| item.get("description"))
        .or_else(|| item.get("text"))
        .and_then(value_as_string)
        .filter(|s| !s.is_empty())?;

    Some((label, value))
}

fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn extract_fields_from_items(items: Option<&Value>, details: &mut HouseDetails) {
    let Some(items) = items.and_then(Value::as_array) else {
        return;
    };
    for item in items {
        if let Some((label, value)) = labelled_value(item) {
            details.set_field(label, value);
        }
    }
}

fn extract_fields_from_sections(sections: Option<&Value>, details: &mut HouseDetails) {
    let Some(sections) = sections.and_then(Value::as_array) else {
        return;
    };
    for section in sections {
        extract_fields_from_items(section.get("items"), details);
    }
}

const DEEP_SEARCH_MAX_DEPTH: u32 = 5;

/// Walk the loader payload looking for labelled characteristic values
/// anywhere in the structure. Depth-bounded.
fn deep_search_fields(value: &Value, depth: u32, details: &mut HouseDetails) {
    if depth > DEEP_SEARCH_MAX_DEPTH {
        return;
    }

    match value {
        Value::Object(map) => {
            if let Some((label, extracted)) = labelled_value(value) {
                if details.set_field(label, extracted) {
                    return;
                }
            }
            for child in map.values() {
                deep_search_fields(child, depth + 1, details);
            }
        }
        Value::Array(items) => {
            for item in items {
                deep_search_fields(item, depth + 1, details);
            }
        }
        _ => {}
    }
}
