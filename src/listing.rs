//! Property edit commands.
//!
//! Each edit tab of a property maps to one command with its own field set
//! and validation. Commands are sent whole; there is no partial merging of
//! payloads.

use crate::cascade::Selection;
use crate::config::WilayahSettings;
use crate::error::{FetchError, ListingError, ValidationError};
use crate::region::Level;
use crate::session::SessionStore;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

const MAX_TITLE_CHARS: usize = 150;
const MAX_DESCRIPTION_CHARS: usize = 5000;
const MAX_ROOMS: u8 = 99;
const MAX_FACILITIES: usize = 50;
const MAX_FACILITY_CHARS: usize = 60;
const MAX_IMAGES: usize = 30;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingType {
    Sale,
    Rent,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    House,
    Apartment,
    Land,
    Shophouse,
    Warehouse,
    Office,
    Villa,
}

/// Title, price, type and location of a property.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpdatePropertyCore {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: u64,
    pub listing: ListingType,
    pub kind: PropertyKind,
    #[serde(default)]
    pub address: String,
    pub province: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub village: Option<String>,
}

impl UpdatePropertyCore {
    pub fn new(title: impl Into<String>, price: u64, listing: ListingType, kind: PropertyKind) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            price,
            listing,
            kind,
            address: String::new(),
            province: None,
            district: None,
            city: None,
            village: None,
        }
    }

    /// Copy the region codes chosen in a cascade.
    pub fn with_region(mut self, selection: &Selection) -> Self {
        self.province = selection.get(Level::Province).map(str::to_string);
        self.district = selection.get(Level::District).map(str::to_string);
        self.city = selection.get(Level::City).map(str::to_string);
        self.village = selection.get(Level::Village).map(str::to_string);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ValidationError::new("title", "must not be empty"));
        }
        if title.chars().count() > MAX_TITLE_CHARS {
            return Err(ValidationError::new(
                "title",
                format!("must be at most {} characters", MAX_TITLE_CHARS),
            ));
        }
        if self.description.chars().count() > MAX_DESCRIPTION_CHARS {
            return Err(ValidationError::new(
                "description",
                format!("must be at most {} characters", MAX_DESCRIPTION_CHARS),
            ));
        }
        if self.price == 0 {
            return Err(ValidationError::new("price", "must be greater than zero"));
        }

        let codes = [&self.province, &self.district, &self.city, &self.village];
        for (level, code) in Level::ALL.into_iter().zip(codes) {
            if code.as_deref().is_some_and(|c| c.trim().is_empty()) {
                return Err(ValidationError::new(
                    field_name(level),
                    "must be omitted rather than empty",
                ));
            }
            let Some(parent) = level.parent() else {
                continue;
            };
            if code.is_some() && codes[parent.index()].is_none() {
                return Err(ValidationError::new(
                    field_name(level),
                    format!("requires a {} to be selected", parent),
                ));
            }
        }
        Ok(())
    }
}

fn field_name(level: Level) -> &'static str {
    match level {
        Level::Province => "province",
        Level::District => "district",
        Level::City => "city",
        Level::Village => "village",
    }
}

/// Rooms, areas and legal details.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdatePropertySpecification {
    pub bedrooms: u8,
    pub bathrooms: u8,
    pub floors: u8,
    /// Square metres.
    pub land_area: Option<u32>,
    /// Square metres.
    pub building_area: Option<u32>,
    pub certificate: Option<String>,
    pub electricity_watt: Option<u32>,
}

impl UpdatePropertySpecification {
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            ("bedrooms", self.bedrooms),
            ("bathrooms", self.bathrooms),
            ("floors", self.floors),
        ] {
            if value > MAX_ROOMS {
                return Err(ValidationError::new(
                    field,
                    format!("must be at most {}", MAX_ROOMS),
                ));
            }
        }
        if self.land_area == Some(0) {
            return Err(ValidationError::new("land_area", "must be greater than zero"));
        }
        if self.building_area == Some(0) {
            return Err(ValidationError::new(
                "building_area",
                "must be greater than zero",
            ));
        }
        if self.building_area.is_some() && self.floors == 0 {
            return Err(ValidationError::new(
                "floors",
                "a building needs at least one floor",
            ));
        }
        if self.electricity_watt == Some(0) {
            return Err(ValidationError::new(
                "electricity_watt",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Facilities offered with the property.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdatePropertyFacility {
    pub facilities: Vec<String>,
}

impl UpdatePropertyFacility {
    /// Trims names and drops empty entries and case-insensitive duplicates,
    /// keeping the first spelling.
    pub fn new<I, T>(facilities: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut seen = HashSet::new();
        let facilities = facilities
            .into_iter()
            .map(|f| f.into().trim().to_string())
            .filter(|f| !f.is_empty() && seen.insert(f.to_lowercase()))
            .collect();
        Self { facilities }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.facilities.is_empty() {
            return Err(ValidationError::new("facilities", "must not be empty"));
        }
        if self.facilities.len() > MAX_FACILITIES {
            return Err(ValidationError::new(
                "facilities",
                format!("at most {} entries", MAX_FACILITIES),
            ));
        }
        let mut seen = HashSet::new();
        for facility in &self.facilities {
            let name = facility.trim();
            if name.is_empty() {
                return Err(ValidationError::new("facilities", "names must not be blank"));
            }
            if name.chars().count() > MAX_FACILITY_CHARS {
                return Err(ValidationError::new(
                    "facilities",
                    format!("'{}' exceeds {} characters", name, MAX_FACILITY_CHARS),
                ));
            }
            if !seen.insert(name.to_lowercase()) {
                return Err(ValidationError::new(
                    "facilities",
                    format!("'{}' appears more than once", name),
                ));
            }
        }
        Ok(())
    }
}

/// Photo gallery, with the index of the cover image.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpdatePropertyImages {
    pub images: Vec<String>,
    #[serde(default)]
    pub cover: usize,
}

impl UpdatePropertyImages {
    pub fn new(images: Vec<String>) -> Self {
        Self { images, cover: 0 }
    }

    pub fn with_cover(mut self, cover: usize) -> Self {
        self.cover = cover;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.images.is_empty() {
            return Err(ValidationError::new("images", "at least one image is required"));
        }
        if self.images.len() > MAX_IMAGES {
            return Err(ValidationError::new(
                "images",
                format!("at most {} images", MAX_IMAGES),
            ));
        }
        let mut seen = HashSet::new();
        for image in &self.images {
            let url = Url::parse(image)
                .map_err(|e| ValidationError::new("images", format!("'{}': {}", image, e)))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(ValidationError::new(
                    "images",
                    format!("'{}' must be an http(s) URL", image),
                ));
            }
            if !seen.insert(image.as_str()) {
                return Err(ValidationError::new(
                    "images",
                    format!("'{}' appears more than once", image),
                ));
            }
        }
        if self.cover >= self.images.len() {
            return Err(ValidationError::new(
                "cover",
                format!("index {} is out of range", self.cover),
            ));
        }
        Ok(())
    }
}

/// Any property edit.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyCommand {
    Core(UpdatePropertyCore),
    Specification(UpdatePropertySpecification),
    Facility(UpdatePropertyFacility),
    Images(UpdatePropertyImages),
}

impl PropertyCommand {
    /// Path segment under `properties/<id>/`.
    pub fn segment(&self) -> &'static str {
        match self {
            PropertyCommand::Core(_) => "core",
            PropertyCommand::Specification(_) => "specification",
            PropertyCommand::Facility(_) => "facility",
            PropertyCommand::Images(_) => "images",
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            PropertyCommand::Core(cmd) => cmd.validate(),
            PropertyCommand::Specification(cmd) => cmd.validate(),
            PropertyCommand::Facility(cmd) => cmd.validate(),
            PropertyCommand::Images(cmd) => cmd.validate(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        match self {
            PropertyCommand::Core(cmd) => serde_json::to_vec(cmd),
            PropertyCommand::Specification(cmd) => serde_json::to_vec(cmd),
            PropertyCommand::Facility(cmd) => serde_json::to_vec(cmd),
            PropertyCommand::Images(cmd) => serde_json::to_vec(cmd),
        }
    }
}

impl From<UpdatePropertyCore> for PropertyCommand {
    fn from(cmd: UpdatePropertyCore) -> Self {
        PropertyCommand::Core(cmd)
    }
}

impl From<UpdatePropertySpecification> for PropertyCommand {
    fn from(cmd: UpdatePropertySpecification) -> Self {
        PropertyCommand::Specification(cmd)
    }
}

impl From<UpdatePropertyFacility> for PropertyCommand {
    fn from(cmd: UpdatePropertyFacility) -> Self {
        PropertyCommand::Facility(cmd)
    }
}

impl From<UpdatePropertyImages> for PropertyCommand {
    fn from(cmd: UpdatePropertyImages) -> Self {
        PropertyCommand::Images(cmd)
    }
}

/// Sends property commands to `PUT <base>/properties/<id>/<segment>`.
#[derive(Debug, Clone)]
pub struct ListingClient {
    http: reqwest::Client,
    base: Url,
}

impl ListingClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let base = Url::parse(base_url)
            .map_err(|e| FetchError::invalid_query(format!("bad base URL '{}': {}", base_url, e)))?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::transport(e.to_string()))?;
        Ok(Self { http, base })
    }

    pub fn from_settings(settings: &WilayahSettings) -> Result<Self, FetchError> {
        Self::new(
            &settings.api_base_url,
            Duration::from_millis(settings.request_timeout_ms),
        )
    }

    pub fn command_url(&self, property_id: &str, command: &PropertyCommand) -> Result<Url, FetchError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::invalid_query("base URL cannot carry a path"))?
            .pop_if_empty()
            .extend(["properties", property_id, command.segment()]);
        Ok(url)
    }

    /// Validate and send a command on behalf of the signed-in user.
    pub async fn apply(
        &self,
        property_id: &str,
        command: &PropertyCommand,
        sessions: &SessionStore,
    ) -> Result<(), ListingError> {
        command.validate()?;
        let session = sessions.current().ok_or(ListingError::Unauthenticated)?;

        let url = self.command_url(property_id, command)?;
        let body = command
            .to_json()
            .map_err(|e| FetchError::invalid_query(e.to_string()))?;

        let response = self
            .http
            .put(url.clone())
            .header(AUTHORIZATION, session.bearer())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| FetchError::transport(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            log::warn!(
                target: "wilayah::session",
                "Session for user {} was rejected",
                session.user_id
            );
            return Err(ListingError::Unauthenticated);
        }
        if !status.is_success() {
            return Err(FetchError::http(status.as_u16(), url.as_str()).into());
        }
        log::debug!(
            target: "wilayah::listing",
            "Applied {} update to property {}",
            command.segment(),
            property_id
        );
        Ok(())
    }
}
